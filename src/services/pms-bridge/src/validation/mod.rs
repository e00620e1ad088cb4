//! Feed schema validation
//!
//! Tenants may supply a JSON Schema (`schema.json`) and/or an XSD (`schema.xsd`). The
//! schema consulted for a feed is chosen by the feed's leading character; plain text
//! feeds are never validated. Validation functions never fail: malformed payloads and
//! malformed schemas are reported as an invalid outcome with a descriptive message.

pub mod xsd;

pub use xsd::XsdSchema;

use crate::error::BridgeResult;
use crate::models::{ContentKind, SchemaKind, TenantCode};
use crate::tenant::TenantStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Result of validating one payload against one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid<S: Into<String>>(error: S) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Schema check for a tenant feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    /// No schema applies: text content, or the tenant has none for this content kind
    Absent,
    Valid,
    Invalid(String),
}

/// Validate a JSON payload against JSON Schema text.
///
/// All violations are reported, joined with `"; "`.
pub fn validate_json(payload: &str, schema: &str) -> ValidationOutcome {
    let schema: Value = match serde_json::from_str(schema) {
        Ok(schema) => schema,
        Err(e) => return ValidationOutcome::invalid(format!("JSON validation error: {}", e)),
    };
    let instance: Value = match serde_json::from_str(payload) {
        Ok(instance) => instance,
        Err(e) => return ValidationOutcome::invalid(format!("JSON validation error: {}", e)),
    };

    let compiled = match jsonschema::JSONSchema::compile(&schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            return ValidationOutcome::invalid(format!(
                "JSON validation error: invalid schema: {}",
                e
            ))
        }
    };

    let outcome = match compiled.validate(&instance) {
        Ok(()) => ValidationOutcome::valid(),
        Err(errors) => ValidationOutcome::invalid(
            errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        ),
    };
    outcome
}

/// Validate an XML payload against XSD text, reporting the first violation
pub fn validate_xml(payload: &str, schema: &str) -> ValidationOutcome {
    let schema = match XsdSchema::parse(schema) {
        Ok(schema) => schema,
        Err(e) => return ValidationOutcome::invalid(format!("XML validation error: {}", e)),
    };
    let doc = match roxmltree::Document::parse(payload) {
        Ok(doc) => doc,
        Err(e) => return ValidationOutcome::invalid(format!("XML validation error: {}", e)),
    };

    match schema.validate(&doc) {
        Ok(()) => ValidationOutcome::valid(),
        Err(violation) => ValidationOutcome::invalid(violation),
    }
}

/// Check that schema text compiles before it is stored for a tenant
pub fn compile_schema(kind: SchemaKind, schema: &str) -> Result<(), String> {
    match kind {
        SchemaKind::Json => {
            let value: Value = serde_json::from_str(schema).map_err(|e| e.to_string())?;
            let compiled = jsonschema::JSONSchema::compile(&value)
                .map(|_| ())
                .map_err(|e| e.to_string());
            compiled
        }
        SchemaKind::Xsd => XsdSchema::parse(schema).map(|_| ()),
    }
}

/// Looks up tenant schemas and checks feeds against them
#[derive(Clone)]
pub struct SchemaValidator {
    store: Arc<dyn TenantStore>,
}

impl SchemaValidator {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Check a feed against the tenant schema matching its content kind
    pub async fn check(&self, code: &TenantCode, feed: &str) -> BridgeResult<SchemaCheck> {
        let Some(kind) = ContentKind::detect(feed).schema_kind() else {
            return Ok(SchemaCheck::Absent);
        };

        let Some(schema) = self.store.load_schema(code, kind).await? else {
            debug!(tenant_code = %code, kind = ?kind, "No tenant schema, skipping validation");
            return Ok(SchemaCheck::Absent);
        };

        let outcome = match kind {
            SchemaKind::Json => validate_json(feed, &schema),
            SchemaKind::Xsd => validate_xml(feed, &schema),
        };

        if outcome.is_valid {
            Ok(SchemaCheck::Valid)
        } else {
            Ok(SchemaCheck::Invalid(outcome.error.unwrap_or_default()))
        }
    }
}
