use thiserror::Error;

/// Internal authorization failure kinds.
///
/// These are never rendered to clients; the transport layer maps them through
/// [`crate::Denial`] first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("no active role assignment")]
    NoRole,

    #[error("forbidden")]
    Forbidden,

    #[error("tenant scope mismatch")]
    ScopeMismatch,

    #[error("data access failure: {0}")]
    DataAccessFailure(String),
}

impl AuthzError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::Unauthenticated => "unauthenticated",
            AuthzError::NoRole => "no_role",
            AuthzError::Forbidden => "forbidden",
            AuthzError::ScopeMismatch => "scope_mismatch",
            AuthzError::DataAccessFailure(_) => "data_access_failure",
        }
    }
}
