//! Mapping from internal failure kinds to what a client may observe.
//!
//! | failure | outcome |
//! |---|---|
//! | `Unauthenticated` | redirect to login |
//! | `NoRole`, `Forbidden` | redirect to the neutral landing page |
//! | `ScopeMismatch` | not found, indistinguishable from a missing resource |
//! | `DataAccessFailure` | same as `Forbidden` |

use crate::AuthzError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Denial {
    RedirectToLogin,
    RedirectToLanding,
    NotFound,
}

impl From<&AuthzError> for Denial {
    fn from(err: &AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => Denial::RedirectToLogin,
            AuthzError::NoRole | AuthzError::Forbidden | AuthzError::DataAccessFailure(_) => {
                Denial::RedirectToLanding
            }
            AuthzError::ScopeMismatch => Denial::NotFound,
        }
    }
}

/// Where redirects point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialPolicy {
    login_path: String,
    landing_path: String,
}

impl Default for DenialPolicy {
    fn default() -> Self {
        Self::new("/login", "/")
    }
}

impl DenialPolicy {
    pub fn new(login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            landing_path: landing_path.into(),
        }
    }

    /// Classify `err` and log the internal kind. The kind goes to logs only.
    pub fn deny(&self, err: &AuthzError) -> Denial {
        let denial = Denial::from(err);
        match err {
            AuthzError::DataAccessFailure(msg) => {
                tracing::warn!(error = %msg, "authorization failed closed on data access error")
            }
            other => tracing::debug!(kind = other.kind(), outcome = ?denial, "access denied"),
        }
        denial
    }

    /// Redirect target for `denial`, or `None` when the outcome is not-found.
    pub fn location(&self, denial: Denial) -> Option<&str> {
        match denial {
            Denial::RedirectToLogin => Some(&self.login_path),
            Denial::RedirectToLanding => Some(&self.landing_path),
            Denial::NotFound => None,
        }
    }
}
