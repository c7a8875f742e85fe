use std::collections::HashMap;

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{debug, error};

use crate::event::Event;
use crate::session::VerificationSession;

use super::CandourApi;

/// Why a claim response body was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    /// The body is not a JSON object at all.
    #[error("result claims are not a JSON object: {0}")]
    Json(#[from] serde_json::Error),

    /// The object nests further objects or arrays; claims must be a single
    /// level of string, number, boolean or null values.
    #[error("claim `{0}` has a nested value")]
    NestedValue(String),
}

/// Stage 3: fetch the result claims for the provider session captured from
/// the redirect back.
///
/// The session id is the signed payload of a GET request, travelling as the
/// last path segment. On success the parsed claim map is stored in the
/// session, null values included; consumers of the map skip nulls when
/// building attributes.
#[derive(Debug, Clone)]
pub struct FetchResultClaims {
    api: CandourApi,
}

impl FetchResultClaims {
    pub fn builder() -> FetchResultClaimsBuilder {
        FetchResultClaimsBuilder::default()
    }

    /// Run the stage against `session`.
    pub async fn execute(&self, session: &mut VerificationSession) -> Event {
        let Some(session_id) = session.provider_session_id().map(str::to_owned) else {
            error!("no provider session id in session");
            return Event::InvalidContext;
        };

        let response = match self.api.execute(self.api.result_request(session_id)).await {
            Ok(response) => response,
            Err(e) => {
                error!("result request failed: {e:#}");
                return Event::ApiCommFailure;
            }
        };

        if !response.indicates_success() {
            error!(
                "result response indicates error, status code {}, payload {}",
                response.code(),
                response.payload()
            );
            return Event::ApiRespFailure;
        }

        let claims = match parse_result_claims(response.payload()) {
            Ok(claims) => claims,
            Err(e) => {
                error!("result response parsing failed: {e}");
                return Event::ApiRespMalformed;
            }
        };

        debug!("received {} result claims", claims.len());
        session.set_result_claims(claims);
        Event::Proceed
    }
}

/// Result claims are a flat JSON object: string, number, boolean or null
/// values only.
fn parse_result_claims(payload: &str) -> Result<HashMap<String, Value>, ClaimsError> {
    let claims: HashMap<String, Value> = serde_json::from_str(payload)?;
    for (name, value) in &claims {
        if value.is_object() || value.is_array() {
            return Err(ClaimsError::NestedValue(name.clone()));
        }
    }
    Ok(claims)
}

/// Builder struct for [FetchResultClaims].
#[derive(Debug, Default)]
pub struct FetchResultClaimsBuilder {
    api: Option<CandourApi>,
}

impl FetchResultClaimsBuilder {
    pub fn build(self) -> Result<FetchResultClaims> {
        let Some(api) = self.api else {
            bail!("api access is required, see `with_api`")
        };
        Ok(FetchResultClaims { api })
    }

    pub fn with_api(mut self, api: CandourApi) -> Self {
        self.api = Some(api);
        self
    }
}
