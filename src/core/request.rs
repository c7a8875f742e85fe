use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use http::{header::CONTENT_TYPE, Method, Request};
use sha2::Sha256;
use url::Url;

use super::invitation::InvitationRequestPayload;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the client public key.
pub const AUTH_CLIENT_HEADER: &str = "X-AUTH-CLIENT";
/// Header carrying the payload signature.
pub const HMAC_SIGNATURE_HEADER: &str = "X-HMAC-SIGNATURE";

/// A payload that can be frozen to the exact string that is signed and
/// transmitted.
pub trait WirePayload {
    fn wire_string(&self) -> Result<String>;
}

impl WirePayload for String {
    fn wire_string(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// An outbound request to the Candour API, authenticated with the client
/// public key and an HMAC-SHA256 signature over the frozen payload.
#[derive(Debug, Clone)]
pub struct CandourRequest<P> {
    api_uri: Url,
    public_key: String,
    hmac_key: String,
    method: Method,
    payload: P,
}

impl CandourRequest<InvitationRequestPayload> {
    /// An invitation creation request: `POST {apiBase}` with the payload as
    /// the JSON body.
    pub fn invitation(
        api_uri: Url,
        public_key: impl Into<String>,
        hmac_key: impl Into<String>,
        payload: InvitationRequestPayload,
    ) -> Self {
        Self {
            api_uri,
            public_key: public_key.into(),
            hmac_key: hmac_key.into(),
            method: Method::POST,
            payload,
        }
    }
}

impl CandourRequest<String> {
    /// A result claim fetch: `GET {apiBase}/{sessionId}` with the raw
    /// session id as the signed payload.
    pub fn result(
        api_uri: Url,
        public_key: impl Into<String>,
        hmac_key: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            api_uri,
            public_key: public_key.into(),
            hmac_key: hmac_key.into(),
            method: Method::GET,
            payload: session_id.into(),
        }
    }
}

impl<P: WirePayload> CandourRequest<P> {
    /// Freeze the payload and build the signed HTTP request.
    ///
    /// The signature always covers the frozen payload: for GET requests the
    /// payload travels as the last path segment of the target URI, for POST
    /// requests as the body.
    pub fn into_http_request(self) -> Result<Request<Vec<u8>>> {
        let frozen = self.payload.wire_string()?;
        let signature = hmac_hex(&self.hmac_key, &frozen);

        let (builder, body) = if self.method == Method::GET {
            let uri = format!("{}/{}", self.api_uri, frozen);
            (Request::get(uri), Vec::new())
        } else {
            (Request::post(self.api_uri.as_str()), frozen.into_bytes())
        };

        builder
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_CLIENT_HEADER, &self.public_key)
            .header(HMAC_SIGNATURE_HEADER, signature)
            .body(body)
            .context("failed to build Candour API request")
    }
}

/// Lowercase hex HMAC-SHA256 of the payload under the client secret key.
fn hmac_hex(key: &str, payload: &str) -> String {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
