use std::collections::HashMap;

use serde_json::Value;

/// Mutable state shared by the protocol stages for one end-user verification
/// attempt.
///
/// A session belongs to exactly one in-flight authentication attempt and is
/// owned by the orchestrator, which drives the stages strictly in sequence
/// against it. Each stage requires the state written by its predecessor; a
/// stage that finds that state missing reports
/// [`Event::InvalidContext`](crate::event::Event::InvalidContext) instead of
/// proceeding with partial state.
#[derive(Debug, Clone, Default)]
pub struct VerificationSession {
    callback_uri: Option<String>,
    authentication_uri: Option<String>,
    invitation_response: Option<String>,
    provider_session_id: Option<String>,
    result_claims: HashMap<String, Value>,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative path the provider redirects the browser back to. Set by the
    /// caller before the invitation is created.
    pub fn callback_uri(&self) -> Option<&str> {
        self.callback_uri.as_deref()
    }

    pub fn set_callback_uri(&mut self, uri: impl Into<String>) {
        self.callback_uri = Some(uri.into());
    }

    /// URL the end user is redirected to: the provider's verification UI on
    /// success, or the error-proceed URL when invitation creation failed.
    pub fn authentication_uri(&self) -> Option<&str> {
        self.authentication_uri.as_deref()
    }

    pub fn set_authentication_uri(&mut self, uri: impl Into<String>) {
        self.authentication_uri = Some(uri.into());
    }

    /// Raw invitation success body, retained for audit and diagnostics.
    pub fn invitation_response(&self) -> Option<&str> {
        self.invitation_response.as_deref()
    }

    pub fn set_invitation_response(&mut self, response: impl Into<String>) {
        self.invitation_response = Some(response.into());
    }

    /// Provider-side id of the verification session, extracted from the
    /// redirect back.
    pub fn provider_session_id(&self) -> Option<&str> {
        self.provider_session_id.as_deref()
    }

    pub fn set_provider_session_id(&mut self, id: impl Into<String>) {
        self.provider_session_id = Some(id.into());
    }

    /// Result claims fetched from the provider. Empty until the claim fetch
    /// stage has run.
    pub fn result_claims(&self) -> &HashMap<String, Value> {
        &self.result_claims
    }

    pub fn set_result_claims(&mut self, claims: HashMap<String, Value>) {
        self.result_claims = claims;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_empty() {
        let session = VerificationSession::new();
        assert!(session.callback_uri().is_none());
        assert!(session.authentication_uri().is_none());
        assert!(session.invitation_response().is_none());
        assert!(session.provider_session_id().is_none());
        assert!(session.result_claims().is_empty());
    }

    #[test]
    fn stores_stage_state() {
        let mut session = VerificationSession::new();
        session.set_callback_uri("/idp/profile/Authn/Candour");
        session.set_authentication_uri("https://verify.example.com/abc");
        session.set_provider_session_id("abc123");
        session.set_result_claims(HashMap::from([("firstName".to_string(), json!("Ada"))]));

        assert_eq!(session.callback_uri(), Some("/idp/profile/Authn/Candour"));
        assert_eq!(
            session.authentication_uri(),
            Some("https://verify.example.com/abc")
        );
        assert_eq!(session.provider_session_id(), Some("abc123"));
        assert_eq!(session.result_claims()["firstName"], json!("Ada"));
    }
}
