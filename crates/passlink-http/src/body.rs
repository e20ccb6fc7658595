//! Body of every login response.
//!
//! A redirect carries nothing. A rejection or an introspection endpoint
//! carries a few bytes of text or JSON, held in memory as a single frame.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;

/// Body of a login response.
#[derive(Debug, Default)]
pub enum LinkResponseBody {
    /// A short text or JSON payload.
    Payload(Full<Bytes>),
    /// No body, as on a `302`.
    #[default]
    Empty,
}

impl LinkResponseBody {
    /// No body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// A text payload.
    #[must_use]
    pub fn from_string(text: impl Into<String>) -> Self {
        Self::Payload(Full::new(Bytes::from(text.into())))
    }
}

impl From<String> for LinkResponseBody {
    fn from(text: String) -> Self {
        Self::from_string(text)
    }
}

impl Body for LinkResponseBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        let Self::Payload(payload) = self.get_mut() else {
            return Poll::Ready(None);
        };
        Pin::new(payload).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Payload(payload) => payload.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Payload(payload) => payload.size_hint(),
            Self::Empty => SizeHint::with_exact(0),
        }
    }
}
