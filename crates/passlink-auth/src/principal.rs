//! Principal capability traits and an in-memory provider.
//!
//! The guard never knows how principals are stored. It asks a
//! [`PrincipalProvider`] for the identifier embedded in the link path, and the
//! provider hands back any type implementing [`Authenticatable`].

use std::collections::HashMap;

/// An identity that can be named in a login link.
pub trait Authenticatable {
    /// The identifier embedded in the link path and passed back to
    /// [`PrincipalProvider::find_by_id`].
    fn unique_key(&self) -> String;
}

/// Lookup of principals by the identifier embedded in a link.
///
/// Implementations may back this with a database, a directory service, or
/// any other store. Lookups happen once per verified link and are never
/// retried by the guard.
pub trait PrincipalProvider: Send + Sync {
    /// The principal type this provider resolves.
    type Principal: Authenticatable;

    /// Find the principal with the given unique key.
    fn find_by_id(&self, id: &str) -> Option<Self::Principal>;
}

/// An in-memory principal provider backed by a `HashMap`.
///
/// Suitable for testing and development environments.
///
/// # Examples
///
/// ```
/// use passlink_auth::principal::{Authenticatable, PrincipalProvider, StaticPrincipalProvider};
///
/// #[derive(Debug, Clone)]
/// struct User(u64);
///
/// impl Authenticatable for User {
///     fn unique_key(&self) -> String {
///         self.0.to_string()
///     }
/// }
///
/// let provider = StaticPrincipalProvider::new(vec![User(1), User(2)]);
/// assert!(provider.find_by_id("2").is_some());
/// assert!(provider.find_by_id("3").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct StaticPrincipalProvider<P> {
    principals: HashMap<String, P>,
}

impl<P: Authenticatable> StaticPrincipalProvider<P> {
    /// Create a provider keyed by each principal's [`Authenticatable::unique_key`].
    pub fn new(principals: impl IntoIterator<Item = P>) -> Self {
        Self {
            principals: principals
                .into_iter()
                .map(|p| (p.unique_key(), p))
                .collect(),
        }
    }

    /// Number of principals held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Whether the provider holds no principals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl<P> PrincipalProvider for StaticPrincipalProvider<P>
where
    P: Authenticatable + Clone + Send + Sync,
{
    type Principal = P;

    fn find_by_id(&self, id: &str) -> Option<P> {
        self.principals.get(id).cloned()
    }
}
