use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::WirePayload;

/// Wire format for `timestamp` and `validUntil`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// The payload of an invitation creation request.
///
/// Every transmitted field is optional: `None` is omitted from the wire so
/// the provider applies its own defaults. `timestamp` and `validUntil` are
/// stamped into the wire form when the payload is frozen for signing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequestPayload {
    /// How long the invitation stays valid. Feeds `validUntil`; not itself
    /// transmitted.
    #[serde(skip)]
    pub invitation_validity: Duration,
    /// How many verification tries the user is allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tries: Option<u32>,
    /// Absolute URL the provider redirects the browser back to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Server-to-server callback URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_post_endpoint: Option<String>,
    pub allowed_verification_methods: AllowedVerificationMethods,
    pub allowed_verification_documents: AllowedVerificationDocuments,
    /// Which result properties the provider should return.
    pub result_properties: ResultProperties,
    /// Known user data the provider matches the verification result against.
    pub user: User,
    /// Which of the user matches must be strictly enforced.
    pub enforce_values: EnforceValues,
}

impl Default for InvitationRequestPayload {
    fn default() -> Self {
        Self {
            invitation_validity: Duration::minutes(10),
            tries: Some(5),
            callback_url: None,
            callback_post_endpoint: None,
            allowed_verification_methods: AllowedVerificationMethods::default(),
            allowed_verification_documents: AllowedVerificationDocuments::default(),
            result_properties: ResultProperties::default(),
            user: User::default(),
            enforce_values: EnforceValues::default(),
        }
    }
}

impl InvitationRequestPayload {
    fn stamp(&self, now: DateTime<Utc>) -> (String, String) {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let valid_until = (now + self.invitation_validity)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        (timestamp, valid_until)
    }
}

impl WirePayload for InvitationRequestPayload {
    fn wire_string(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            let (timestamp, valid_until) = self.stamp(Utc::now());
            fields.insert("timestamp".to_string(), timestamp.into());
            fields.insert("validUntil".to_string(), valid_until.into());
        }
        Ok(serde_json::to_string(&value)?)
    }
}

/// Verification methods the user may pick from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedVerificationMethods {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_web: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfid_app: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_app: Option<bool>,
}

/// Identity documents the user may verify with.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedVerificationDocuments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_card: Option<bool>,
}

/// Result properties to request from the provider and the matchers to apply.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_score: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_identification_number: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document_type: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_expiration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_issuer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_mrz_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_other_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_chip_image: Option<bool>,
}

/// Known user data for the provider to match the verification result
/// against.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_identification_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuing_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// Which user matches must hold for the verification to pass, and the
/// minimum name-similarity score.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforceValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_identification_number: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuing_country: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<bool>,
    /// Minimum name-similarity score, 1 to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_score: Option<u8>,
}

/// Success payload of an invitation creation response.
///
/// Unknown fields from the provider are tolerated and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvitationSuccessResponse {
    /// URL the end user is redirected to for the verification itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

impl InvitationSuccessResponse {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
