use std::collections::BTreeSet;
use std::fmt;

/// Decides which asserted identities may act as administrators.
///
/// The gate only consults this after the token signature and the
/// `isAdmin` flag have both checked out.
pub trait IdentityPolicy: Send + Sync + fmt::Debug {
    fn is_authorized(&self, username: &str) -> bool;
}

/// Fixed set of admin usernames, matched exactly (case-sensitive).
///
/// The stock deployment configures a single entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedAdmins {
    usernames: BTreeSet<String>,
}

impl AuthorizedAdmins {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usernames: usernames.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(username: impl Into<String>) -> Self {
        Self::new([username.into()])
    }

    pub fn len(&self) -> usize {
        self.usernames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }
}

impl IdentityPolicy for AuthorizedAdmins {
    fn is_authorized(&self, username: &str) -> bool {
        self.usernames.contains(username)
    }
}
