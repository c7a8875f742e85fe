use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::{debug, error};

use crate::event::Event;
use crate::session::VerificationSession;

const DEFAULT_STATUS_PARAMETER: &str = "status";
const DEFAULT_SESSION_ID_PARAMETER: &str = "sessionId";
const DEFAULT_STATUS_SUCCESS_VALUE: &str = "success";

/// Query parameters carried by the provider's redirect back to the relying
/// application.
#[derive(Debug, Clone, Default)]
pub struct RedirectParams(HashMap<String, String>);

impl RedirectParams {
    /// Parse from a raw query string, without the leading `?`.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query).map(Self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for RedirectParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stage 2: classify the redirect back from the provider and capture the
/// provider session id.
///
/// A status equal to the configured success value together with a session id
/// proceeds; a recognized non-success status maps to its configured
/// cancellation event; anything else is a malformed redirect. The session id
/// is only stored on success.
#[derive(Debug, Clone)]
pub struct ExtractRedirectResult {
    status_parameter: String,
    session_id_parameter: String,
    status_success_value: String,
    mapped_statuses: HashMap<String, Event>,
}

impl ExtractRedirectResult {
    pub fn builder() -> ExtractRedirectResultBuilder {
        ExtractRedirectResultBuilder::default()
    }

    /// Run the stage against `session` with the callback's query parameters.
    pub fn execute(&self, session: &mut VerificationSession, params: &RedirectParams) -> Event {
        let status = params.get(&self.status_parameter);
        if status != Some(self.status_success_value.as_str()) {
            error!(
                "redirect status '{}' does not indicate success",
                status.unwrap_or("<absent>")
            );
            return status
                .and_then(|s| self.mapped_statuses.get(s).copied())
                .unwrap_or(Event::RedirectRespMalformed);
        }

        let Some(session_id) = params.get(&self.session_id_parameter) else {
            error!("redirect response session id is absent");
            return Event::RedirectRespMalformed;
        };

        session.set_provider_session_id(session_id);
        debug!("provider session id set as {session_id}");
        Event::Proceed
    }
}

/// Builder struct for [ExtractRedirectResult].
#[derive(Debug, Default)]
pub struct ExtractRedirectResultBuilder {
    status_parameter: Option<String>,
    session_id_parameter: Option<String>,
    status_success_value: Option<String>,
    mapped_statuses: Option<HashMap<String, Event>>,
}

impl ExtractRedirectResultBuilder {
    pub fn build(self) -> Result<ExtractRedirectResult> {
        let Some(mapped_statuses) = self.mapped_statuses else {
            bail!("mapped statuses are required, see `with_mapped_statuses`")
        };

        Ok(ExtractRedirectResult {
            status_parameter: self
                .status_parameter
                .unwrap_or_else(|| DEFAULT_STATUS_PARAMETER.to_string()),
            session_id_parameter: self
                .session_id_parameter
                .unwrap_or_else(|| DEFAULT_SESSION_ID_PARAMETER.to_string()),
            status_success_value: self
                .status_success_value
                .unwrap_or_else(|| DEFAULT_STATUS_SUCCESS_VALUE.to_string()),
            mapped_statuses,
        })
    }

    /// Override the name of the status query parameter.
    pub fn with_status_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.status_parameter = Some(parameter.into());
        self
    }

    /// Override the name of the session id query parameter.
    pub fn with_session_id_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.session_id_parameter = Some(parameter.into());
        self
    }

    /// Override the status value that indicates success.
    pub fn with_status_success_value(mut self, value: impl Into<String>) -> Self {
        self.status_success_value = Some(value.into());
        self
    }

    /// Set the mapping from non-success status values to the events they
    /// resolve to.
    pub fn with_mapped_statuses(mut self, mapping: HashMap<String, Event>) -> Self {
        self.mapped_statuses = Some(mapping);
        self
    }
}
