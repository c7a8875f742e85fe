use std::collections::HashMap;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::utils::NonEmptyVec;

/// The single claim value chosen to represent who the verified user is for
/// downstream authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPrincipal {
    name: String,
}

impl IdentifierPrincipal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named fact about the verified identity, exposed with its value's string
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAttribute {
    pub name: String,
    pub value: String,
}

/// Identity assembled from the result claims of one verification attempt.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    identifier: Option<IdentifierPrincipal>,
    attributes: Vec<IdentityAttribute>,
}

impl VerifiedIdentity {
    pub fn identifier(&self) -> Option<&IdentifierPrincipal> {
        self.identifier.as_ref()
    }

    pub fn attributes(&self) -> &[IdentityAttribute] {
        &self.attributes
    }

    /// Whether canonicalization of this identity can run at all. Evaluated
    /// by the orchestrator before resolving the canonical name.
    pub fn has_identifier(&self) -> bool {
        self.identifier.is_some()
    }

    /// Canonical principal name for downstream authentication.
    pub fn canonical_name(&self) -> Option<&str> {
        self.identifier.as_ref().map(IdentifierPrincipal::name)
    }
}

/// Decides which result claim becomes the canonical subject identifier and
/// which claims are exposed as attributes.
#[derive(Debug, Clone)]
pub struct IdentityClaimPolicy {
    claim_source_ids: NonEmptyVec<String>,
}

impl IdentityClaimPolicy {
    /// `ids` are the claims to read the identifier from, in order of
    /// preference. The list may not be empty.
    pub fn new(ids: Vec<String>) -> Result<Self> {
        let Some(claim_source_ids) = NonEmptyVec::maybe_new(ids) else {
            bail!("claim source ids are required and may not be empty")
        };
        Ok(Self { claim_source_ids })
    }

    /// Build the identity for a set of result claims.
    ///
    /// The first preferred claim that is present with a string value becomes
    /// the identifier principal; later candidates are not considered even if
    /// also present. Independently, every non-null claim (the identifier
    /// claim included) becomes an attribute; claims with null values are
    /// dropped. Yielding no identifier is not an error at this layer.
    pub fn build_identity(&self, claims: &HashMap<String, Value>) -> VerifiedIdentity {
        let identifier = self.claim_source_ids.iter().find_map(|id| match claims.get(id) {
            Some(Value::String(name)) => Some(IdentifierPrincipal::new(name.clone())),
            _ => None,
        });

        let attributes = claims
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| IdentityAttribute {
                name: name.clone(),
                value: value_string(value),
            })
            .collect();

        VerifiedIdentity {
            identifier,
            attributes,
        }
    }
}

/// String form of a claim value, without JSON quoting for strings.
fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
