use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error};

use crate::event::Event;
use crate::identity::{IdentityClaimPolicy, VerifiedIdentity};
use crate::session::VerificationSession;

const DEFAULT_INVITATION_LINK_CLAIM: &str = "invitationLink";

/// Optional check before trusting result claims: the claims must reference
/// the invitation link created in this session, so a callback replayed
/// against a different invitation is rejected.
#[derive(Debug, Clone)]
pub struct ValidateInvitationLink {
    invitation_link_claim: String,
}

impl ValidateInvitationLink {
    pub fn new() -> Self {
        Self {
            invitation_link_claim: DEFAULT_INVITATION_LINK_CLAIM.to_string(),
        }
    }

    /// Override the name of the claim carrying the invitation link.
    pub fn with_invitation_link_claim(mut self, claim: impl Into<String>) -> Self {
        self.invitation_link_claim = claim.into();
        self
    }

    /// Compare the invitation link claim against the authentication URI
    /// stored when the invitation was created. Either side being absent is a
    /// mismatch.
    pub fn execute(&self, session: &VerificationSession) -> Event {
        debug!("validating invitation link");
        let expected = session.authentication_uri();
        let received = session
            .result_claims()
            .get(&self.invitation_link_claim)
            .and_then(Value::as_str);

        match (expected, received) {
            (Some(expected), Some(received)) if expected == received => Event::Proceed,
            (expected, received) => {
                error!(
                    "mismatch between original invitation link {expected:?} and one received with response {received:?}"
                );
                Event::InviteLinkValidationFailure
            }
        }
    }
}

impl Default for ValidateInvitationLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage 4: build the verified identity from the result claims.
///
/// Which claim becomes the canonical identifier and which claims become
/// attributes is decided by the configured
/// [`IdentityClaimPolicy`](crate::identity::IdentityClaimPolicy). A claim
/// set yielding no identifier principal is not an error here; the
/// orchestrator decides whether that is fatal.
#[derive(Debug, Clone)]
pub struct ValidateAuthentication {
    policy: IdentityClaimPolicy,
}

impl ValidateAuthentication {
    pub fn builder() -> ValidateAuthenticationBuilder {
        ValidateAuthenticationBuilder::default()
    }

    /// Run the stage against `session`.
    pub fn execute(&self, session: &VerificationSession) -> (Event, Option<VerifiedIdentity>) {
        if session.result_claims().is_empty() {
            error!("no result claims in session");
            return (Event::InvalidContext, None);
        }

        debug!("validating Candour authentication");
        let identity = self.policy.build_identity(session.result_claims());
        (Event::Proceed, Some(identity))
    }
}

/// Builder struct for [ValidateAuthentication].
#[derive(Debug, Default)]
pub struct ValidateAuthenticationBuilder {
    claim_source_ids: Vec<String>,
}

impl ValidateAuthenticationBuilder {
    pub fn build(self) -> Result<ValidateAuthentication> {
        let policy = IdentityClaimPolicy::new(self.claim_source_ids)?;
        Ok(ValidateAuthentication { policy })
    }

    /// Set the claims to read the identifier from, in order of preference.
    /// At least one is required.
    pub fn with_claim_source_ids(mut self, ids: Vec<String>) -> Self {
        self.claim_source_ids = ids;
        self
    }
}
