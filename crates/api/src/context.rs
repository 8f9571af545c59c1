use bookwell_auth::Principal;

/// Identity of the caller for one request.
///
/// Always present on admin routes; anonymous when no valid token was sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    principal: Principal,
}

impl RequestIdentity {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }
}
