use anyhow::{bail, Result};
use tracing::{debug, error};
use url::Url;

use crate::core::invitation::{InvitationRequestPayload, InvitationSuccessResponse};
use crate::event::Event;
use crate::session::VerificationSession;

use super::CandourApi;

/// Flow-internal path prefix stripped from the callback URI when deriving
/// the error-proceed URL.
const DEFAULT_FLOW_PATH_PREFIX: &str = "idp/profile/";

/// Scheme, host and port of the HTTP request that started the attempt. Used
/// only to resolve the session's relative callback path into an absolute
/// URL.
#[derive(Debug, Clone)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }
}

/// Stage 1: create a verification invitation and point the browser at it.
///
/// On success the session's `authentication_uri` holds the provider's
/// redirect target and `invitation_response` the raw response body. On every
/// failure with a meaningful continuation, `authentication_uri` is instead
/// set to the error-proceed URL so the browser flow can still terminate
/// gracefully.
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    api: CandourApi,
    payload: InvitationRequestPayload,
    flow_path_prefix: String,
}

impl CreateInvitation {
    pub fn builder() -> CreateInvitationBuilder {
        CreateInvitationBuilder::default()
    }

    /// Run the stage against `session`.
    ///
    /// The session must carry the relative callback path; `origin` resolves
    /// it into the absolute URL the provider redirects back to.
    pub async fn execute(
        &self,
        session: &mut VerificationSession,
        origin: &RequestOrigin,
    ) -> Event {
        let Some(callback_path) = session.callback_uri().map(str::to_owned) else {
            error!("no callback uri in session");
            return Event::InvalidContext;
        };

        let callback_url = match build_callback_url(origin, &callback_path) {
            Ok(url) => url,
            Err(e) => {
                error!("failed to build callback url: {e}");
                session.set_authentication_uri(self.error_proceed_uri(&callback_path));
                return Event::InvalidContext;
            }
        };

        let mut payload = self.payload.clone();
        payload.callback_url = Some(callback_url);

        let response = match self.api.execute(self.api.invitation_request(payload)).await {
            Ok(response) => response,
            Err(e) => {
                error!("invitation request failed: {e:#}");
                session.set_authentication_uri(self.error_proceed_uri(&callback_path));
                return Event::ApiCommFailure;
            }
        };

        if !response.indicates_success() {
            error!(
                "invitation response indicates error, status code {}, payload {}",
                response.code(),
                response.payload()
            );
            session.set_authentication_uri(self.error_proceed_uri(&callback_path));
            return Event::ApiRespFailure;
        }

        let redirect_url = match InvitationSuccessResponse::parse(response.payload()) {
            Ok(InvitationSuccessResponse {
                redirect_url: Some(url),
                ..
            }) => url,
            Ok(_) => {
                error!("invitation response has no redirect url");
                session.set_authentication_uri(self.error_proceed_uri(&callback_path));
                return Event::ApiRespMalformed;
            }
            Err(e) => {
                error!("invitation response parsing failed: {e}");
                session.set_authentication_uri(self.error_proceed_uri(&callback_path));
                return Event::ApiRespMalformed;
            }
        };

        session.set_invitation_response(response.payload());
        session.set_authentication_uri(redirect_url);
        debug!("invitation created");
        Event::Proceed
    }

    /// The callback URI with the flow-internal path prefix removed, so an
    /// external redirect lands on the next flow action instead of a dead
    /// end.
    fn error_proceed_uri(&self, callback_uri: &str) -> String {
        callback_uri.replacen(&self.flow_path_prefix, "", 1)
    }
}

/// Resolve the relative callback path against the request origin. The
/// default port for `http` and `https` is dropped; any other port is kept.
fn build_callback_url(origin: &RequestOrigin, path: &str) -> Result<String> {
    let path = if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    };
    let url = Url::parse(&format!(
        "{}://{}:{}{}",
        origin.scheme, origin.host, origin.port, path
    ))?;
    if !url.has_host() {
        bail!("callback url has no host");
    }
    Ok(url.to_string())
}

/// Builder struct for [CreateInvitation].
#[derive(Debug, Default)]
pub struct CreateInvitationBuilder {
    api: Option<CandourApi>,
    payload: Option<InvitationRequestPayload>,
    flow_path_prefix: Option<String>,
}

impl CreateInvitationBuilder {
    pub fn build(self) -> Result<CreateInvitation> {
        let Some(api) = self.api else {
            bail!("api access is required, see `with_api`")
        };

        let Some(payload) = self.payload else {
            bail!("invitation payload is required, see `with_payload`")
        };

        Ok(CreateInvitation {
            api,
            payload,
            flow_path_prefix: self
                .flow_path_prefix
                .unwrap_or_else(|| DEFAULT_FLOW_PATH_PREFIX.to_string()),
        })
    }

    pub fn with_api(mut self, api: CandourApi) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the invitation payload template. The callback URL is filled in
    /// per session at execution time.
    pub fn with_payload(mut self, payload: InvitationRequestPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Override the flow-internal path prefix used to derive the
    /// error-proceed URL.
    pub fn with_flow_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.flow_path_prefix = Some(prefix.into());
        self
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use async_trait::async_trait;
    use http::{Request, Response};

    use super::*;
    use crate::core::util::AsyncHttpClient;

    const SUCCESS_BODY: &str = r#"{
        "redirectUrl": "https://verify.example.com/session/abc123",
        "verificationSessionId": "abc123",
        "timestamp": "2025-03-01T12:00:00.000Z",
        "validUntil": "2025-03-01T12:10:00.000Z"
    }"#;

    /// Answers every request with one canned response and records the
    /// request for assertions.
    #[derive(Debug)]
    struct StubClient {
        status: u16,
        body: String,
        seen: Mutex<Option<Request<Vec<u8>>>>,
    }

    impl StubClient {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl AsyncHttpClient for StubClient {
        async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(Response::builder()
                .status(self.status)
                .body(self.body.clone().into_bytes())?)
        }
    }

    #[derive(Debug)]
    struct FailingClient;

    #[async_trait]
    impl AsyncHttpClient for FailingClient {
        async fn execute(&self, _request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
            bail!("connection refused")
        }
    }

    fn stage(client: Arc<dyn AsyncHttpClient + Send + Sync>) -> CreateInvitation {
        let api = CandourApi::builder()
            .with_api_uri("https://api.example.com/v1/session".parse().unwrap())
            .with_client_public_key("publicKey")
            .with_client_hmac_key("hmacKey")
            .with_http_client(client)
            .build()
            .unwrap();
        CreateInvitation::builder()
            .with_api(api)
            .with_payload(InvitationRequestPayload::default())
            .build()
            .unwrap()
    }

    fn session() -> VerificationSession {
        let mut session = VerificationSession::new();
        session.set_callback_uri("/idp/profile/Authn/Candour");
        session
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("https", "sp.example.org", 443)
    }

    #[test]
    fn build_requires_api_and_payload() {
        let error = CreateInvitation::builder().build().unwrap_err();
        assert!(error.to_string().contains("api access is required"));

        let api = CandourApi::builder()
            .with_api_uri("https://api.example.com/v1/session".parse().unwrap())
            .with_client_public_key("publicKey")
            .with_client_hmac_key("hmacKey")
            .with_http_client(Arc::new(FailingClient))
            .build()
            .unwrap();
        let error = CreateInvitation::builder().with_api(api).build().unwrap_err();
        assert!(error.to_string().contains("invitation payload is required"));
    }

    #[tokio::test]
    async fn success_stores_redirect_and_raw_response() {
        let client = StubClient::new(200, SUCCESS_BODY);
        let stage = stage(client.clone());
        let mut session = session();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::Proceed);
        assert_eq!(
            session.authentication_uri(),
            Some("https://verify.example.com/session/abc123")
        );
        assert_eq!(session.invitation_response(), Some(SUCCESS_BODY));

        let request = client.seen.lock().unwrap().take().unwrap();
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        assert_eq!(
            body["callbackUrl"],
            "https://sp.example.org/idp/profile/Authn/Candour"
        );
    }

    #[tokio::test]
    async fn default_https_port_is_dropped_from_callback() {
        let client = StubClient::new(200, SUCCESS_BODY);
        let stage = stage(client.clone());
        let mut session = session();

        stage.execute(&mut session, &origin()).await;

        let request = client.seen.lock().unwrap().take().unwrap();
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        let callback = body["callbackUrl"].as_str().unwrap();
        assert!(!callback.contains(":443"));
    }

    #[tokio::test]
    async fn default_http_port_is_dropped_from_callback() {
        let client = StubClient::new(200, SUCCESS_BODY);
        let stage = stage(client.clone());
        let mut session = session();

        stage
            .execute(&mut session, &RequestOrigin::new("http", "sp.example.org", 80))
            .await;

        let request = client.seen.lock().unwrap().take().unwrap();
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        assert_eq!(
            body["callbackUrl"],
            "http://sp.example.org/idp/profile/Authn/Candour"
        );
    }

    #[tokio::test]
    async fn explicit_port_is_kept_in_callback() {
        let client = StubClient::new(200, SUCCESS_BODY);
        let stage = stage(client.clone());
        let mut session = session();

        stage
            .execute(
                &mut session,
                &RequestOrigin::new("http", "sp.example.org", 8080),
            )
            .await;

        let request = client.seen.lock().unwrap().take().unwrap();
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        assert_eq!(
            body["callbackUrl"],
            "http://sp.example.org:8080/idp/profile/Authn/Candour"
        );
    }

    #[tokio::test]
    async fn rejection_sets_error_proceed_uri() {
        let stage = stage(StubClient::new(400, "Something bad happened"));
        let mut session = session();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::ApiRespFailure);
        assert_eq!(session.authentication_uri(), Some("/Authn/Candour"));
        assert!(session.invitation_response().is_none());
    }

    #[tokio::test]
    async fn malformed_body_sets_error_proceed_uri() {
        let stage = stage(StubClient::new(200, "Something bad happened"));
        let mut session = session();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::ApiRespMalformed);
        assert_eq!(session.authentication_uri(), Some("/Authn/Candour"));
    }

    #[tokio::test]
    async fn success_without_redirect_url_is_malformed() {
        let stage = stage(StubClient::new(200, r#"{"verificationSessionId":"abc123"}"#));
        let mut session = session();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::ApiRespMalformed);
    }

    #[tokio::test]
    async fn transport_failure_sets_error_proceed_uri() {
        let stage = stage(Arc::new(FailingClient));
        let mut session = session();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::ApiCommFailure);
        assert_eq!(session.authentication_uri(), Some("/Authn/Candour"));
    }

    #[tokio::test]
    async fn missing_callback_uri_is_a_context_error() {
        let stage = stage(StubClient::new(200, SUCCESS_BODY));
        let mut session = VerificationSession::new();

        let event = stage.execute(&mut session, &origin()).await;

        assert_eq!(event, Event::InvalidContext);
        assert!(session.authentication_uri().is_none());
    }
}
