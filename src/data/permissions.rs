//! Permission codes granted to users.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::data::DataError;

/// The set of permission codes held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    /// Exact membership test; there is no hierarchy or wildcard matching.
    pub fn includes(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DataError>;

    /// Grant `codes` to the user. Granting a code twice is a no-op.
    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_is_exact() {
        let perms: Permissions = ["movies:read", "movies:write"].into_iter().collect();
        assert!(perms.includes("movies:read"));
        assert!(!perms.includes("movies:*"));
        assert!(!perms.includes("movies"));
        assert_eq!(perms.len(), 2);
    }
}
