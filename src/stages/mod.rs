//! The protocol stages driven by the hosting flow orchestrator, in order:
//! [`CreateInvitation`], [`ExtractRedirectResult`], [`FetchResultClaims`],
//! [`ValidateAuthentication`] (optionally preceded by
//! [`ValidateInvitationLink`]).
//!
//! A stage is configured once through its builder and is immutable
//! afterwards, so one stage value can serve many concurrent sessions. The
//! [`VerificationSession`](crate::session::VerificationSession) a stage
//! mutates is exclusively owned by the caller for the duration of the
//! attempt.

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use url::Url;

use crate::core::invitation::InvitationRequestPayload;
use crate::core::request::{CandourRequest, WirePayload};
use crate::core::response::CandourResponse;
use crate::core::util::AsyncHttpClient;

mod create_invitation;
mod extract_redirect_result;
mod fetch_result_claims;
mod validate_authentication;

pub use create_invitation::{CreateInvitation, CreateInvitationBuilder, RequestOrigin};
pub use extract_redirect_result::{
    ExtractRedirectResult, ExtractRedirectResultBuilder, RedirectParams,
};
pub use fetch_result_claims::{ClaimsError, FetchResultClaims, FetchResultClaimsBuilder};
pub use validate_authentication::{
    ValidateAuthentication, ValidateAuthenticationBuilder, ValidateInvitationLink,
};

/// Shared configuration for the stages that call the Candour API: the
/// endpoint, the client key pair, and the HTTP client used for outbound
/// calls.
#[derive(Clone)]
pub struct CandourApi {
    api_uri: Url,
    client_public_key: String,
    client_hmac_key: String,
    http_client: Arc<dyn AsyncHttpClient + Send + Sync>,
}

impl CandourApi {
    pub fn builder() -> CandourApiBuilder {
        CandourApiBuilder::default()
    }

    pub(crate) fn invitation_request(
        &self,
        payload: InvitationRequestPayload,
    ) -> CandourRequest<InvitationRequestPayload> {
        CandourRequest::invitation(
            self.api_uri.clone(),
            self.client_public_key.clone(),
            self.client_hmac_key.clone(),
            payload,
        )
    }

    pub(crate) fn result_request(&self, session_id: String) -> CandourRequest<String> {
        CandourRequest::result(
            self.api_uri.clone(),
            self.client_public_key.clone(),
            self.client_hmac_key.clone(),
            session_id,
        )
    }

    /// Send a signed request and wrap the raw response. There are no
    /// retries; a transport or signing failure surfaces immediately.
    pub(crate) async fn execute<P: WirePayload>(
        &self,
        request: CandourRequest<P>,
    ) -> Result<CandourResponse> {
        let http_request = request.into_http_request()?;
        let response = self.http_client.execute(http_request).await?;
        Ok(CandourResponse::from_http(response))
    }
}

impl fmt::Debug for CandourApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the hmac key stays out of debug output
        f.debug_struct("CandourApi")
            .field("api_uri", &self.api_uri.as_str())
            .field("client_public_key", &self.client_public_key)
            .finish_non_exhaustive()
    }
}

/// Builder struct for [CandourApi].
#[derive(Default)]
pub struct CandourApiBuilder {
    api_uri: Option<Url>,
    client_public_key: Option<String>,
    client_hmac_key: Option<String>,
    http_client: Option<Arc<dyn AsyncHttpClient + Send + Sync>>,
}

impl CandourApiBuilder {
    pub fn build(self) -> Result<CandourApi> {
        let Self {
            api_uri,
            client_public_key,
            client_hmac_key,
            http_client,
        } = self;

        let Some(api_uri) = api_uri else {
            bail!("api uri is required, see `with_api_uri`")
        };

        let Some(client_public_key) = client_public_key else {
            bail!("client public key is required, see `with_client_public_key`")
        };

        let Some(client_hmac_key) = client_hmac_key else {
            bail!("client hmac key is required, see `with_client_hmac_key`")
        };

        let Some(http_client) = http_client else {
            bail!("http client is required, see `with_http_client`")
        };

        Ok(CandourApi {
            api_uri,
            client_public_key,
            client_hmac_key,
            http_client,
        })
    }

    /// Set the Candour API endpoint requests are sent to.
    pub fn with_api_uri(mut self, uri: Url) -> Self {
        self.api_uri = Some(uri);
        self
    }

    /// Set the client public key, sent verbatim with every request.
    pub fn with_client_public_key(mut self, key: impl Into<String>) -> Self {
        self.client_public_key = Some(key.into());
        self
    }

    /// Set the client secret key used for request signatures.
    pub fn with_client_hmac_key(mut self, key: impl Into<String>) -> Self {
        self.client_hmac_key = Some(key.into());
        self
    }

    /// Set the HTTP client used for outbound calls.
    pub fn with_http_client(mut self, client: Arc<dyn AsyncHttpClient + Send + Sync>) -> Self {
        self.http_client = Some(client);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_requires_every_field() {
        let error = CandourApi::builder().build().unwrap_err();
        assert!(error.to_string().contains("api uri is required"));

        let error = CandourApi::builder()
            .with_api_uri("https://api.example.com/v1/session".parse().unwrap())
            .build()
            .unwrap_err();
        assert!(error.to_string().contains("client public key is required"));
    }

    #[test]
    fn debug_output_redacts_the_hmac_key() {
        struct NoopClient;

        #[async_trait::async_trait]
        impl AsyncHttpClient for NoopClient {
            async fn execute(
                &self,
                _request: http::Request<Vec<u8>>,
            ) -> Result<http::Response<Vec<u8>>> {
                bail!("unused")
            }
        }

        let api = CandourApi::builder()
            .with_api_uri("https://api.example.com/v1/session".parse().unwrap())
            .with_client_public_key("public")
            .with_client_hmac_key("topsecret")
            .with_http_client(Arc::new(NoopClient))
            .build()
            .unwrap();

        let debug = format!("{api:?}");
        assert!(debug.contains("public"));
        assert!(!debug.contains("topsecret"));
    }
}
