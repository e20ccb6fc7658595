//! Core types, configuration, and time source for PassLink.
//!
//! This crate provides the building blocks shared by the link signer, the
//! verification guard, and the HTTP layer: the process-wide immutable
//! [`PassLinkConfig`], the signing [`Secret`], and the injectable [`Clock`]
//! used for every expiry computation.

mod clock;
mod config;
mod error;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PassLinkConfig;
pub use error::{PassLinkError, PassLinkResult};
pub use types::Secret;
