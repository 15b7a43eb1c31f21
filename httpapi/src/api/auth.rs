use crate::identity::User;
use std::collections::HashSet;

/// Authentication requirement declared by an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequirement {
    /// No identity needed
    Open,
    /// Any resolved identity is enough
    AnyAuthenticated,
    /// The identity must hold at least one of the listed scopes.
    /// An empty set accepts any resolved identity.
    RequiresAnyScope(HashSet<String>),
}

/// Outcome of evaluating an [`AuthRequirement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl AuthRequirement {
    /// Require any one of the given scopes
    pub fn any_scope<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequiresAnyScope(scopes.into_iter().map(Into::into).collect())
    }

    /// Decide whether `user` satisfies this requirement
    pub fn evaluate(&self, user: Option<&User>) -> Decision {
        let allowed = match (self, user) {
            (AuthRequirement::Open, _) => true,
            (_, None) => false,
            (AuthRequirement::AnyAuthenticated, Some(_)) => true,
            (AuthRequirement::RequiresAnyScope(required), Some(user)) => {
                required.is_empty() || user.scopes.iter().any(|s| required.contains(s))
            }
        };

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}
