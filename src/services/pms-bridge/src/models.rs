//! Data models for the PMS Bridge Service
//!
//! Tenant configuration documents are persisted as camelCase JSON so that files written
//! by earlier onboarding tooling keep loading unchanged.

use crate::error::{BridgeError, BridgeResult};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static TENANT_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("tenant code pattern is valid"));

/// Timestamp layout used in mapping and manifest documents
pub const DOCUMENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Version stamped on freshly deployed mapping sets
pub const DEPLOYMENT_VERSION: &str = "1.0.0";

/// Validated tenant (PMS) code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantCode(String);

impl TenantCode {
    /// Parse a tenant code, rejecting anything outside `[A-Za-z0-9_-]+`
    pub fn parse(code: &str) -> BridgeResult<Self> {
        if TENANT_CODE_PATTERN.is_match(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(BridgeError::invalid_tenant_code(code))
        }
    }

    pub fn is_valid(code: &str) -> bool {
        TENANT_CODE_PATTERN.is_match(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One field rename rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub source_field: String,
    pub target_field: String,
    #[serde(default)]
    pub confidence: f64,
}

impl FieldMapping {
    pub fn new<S1: Into<String>, S2: Into<String>>(source: S1, target: S2, confidence: f64) -> Self {
        Self {
            source_field: source.into(),
            target_field: target.into(),
            confidence,
        }
    }
}

/// Contents of `mapping.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    pub pms_code: String,
    #[serde(default)]
    pub pms_name: Option<String>,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    pub deployment_id: String,
    pub pms_code: String,
    #[serde(default)]
    pub pms_name: String,
    pub status: String,
    pub deployed_at: String,
    #[serde(default)]
    pub mappings_count: usize,
    pub endpoint: String,
    pub version: String,
}

/// Per-tenant processing counters, persisted as `stats.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub records_processed: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Schema flavour a tenant may supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Json,
    Xsd,
}

impl SchemaKind {
    pub fn file_name(self) -> &'static str {
        match self {
            SchemaKind::Json => "schema.json",
            SchemaKind::Xsd => "schema.xsd",
        }
    }

    pub fn parse(kind: &str) -> BridgeResult<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "json" => Ok(SchemaKind::Json),
            "xsd" | "xml" => Ok(SchemaKind::Xsd),
            other => Err(BridgeError::validation(
                "kind",
                format!("Unknown schema kind '{}', expected 'json' or 'xsd'", other),
            )),
        }
    }
}

/// Payload shape inferred from the first non-whitespace character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Xml,
    Text,
}

impl ContentKind {
    pub fn detect(payload: &str) -> Self {
        match payload.trim_start().chars().next() {
            Some('{') => ContentKind::Json,
            Some('<') => ContentKind::Xml,
            _ => ContentKind::Text,
        }
    }

    /// Schema flavour consulted for this content, if any
    pub fn schema_kind(self) -> Option<SchemaKind> {
        match self {
            ContentKind::Json => Some(SchemaKind::Json),
            ContentKind::Xml => Some(SchemaKind::Xsd),
            ContentKind::Text => None,
        }
    }
}

/// Everything stored for one onboarded PMS
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub code: TenantCode,
    pub name: Option<String>,
    pub mappings: Vec<FieldMapping>,
    pub json_schema: Option<String>,
    pub xml_schema: Option<String>,
    pub stats: Stats,
}

/// Inbound feed submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[serde(default)]
    pub feed_data: String,
}

/// Successful feed submission result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub translated_data: String,
    pub delivery_status: Option<String>,
}

/// Dry-run translation request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTranslationRequest {
    #[serde(default)]
    pub test_data: String,
}

/// Dry-run translation result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTranslationResponse {
    pub success: bool,
    pub translator: String,
    pub translated_data: String,
    pub timestamp: DateTime<Utc>,
}

/// Deployment of a mapping set
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub pms_code: String,
    #[serde(default)]
    pub pms_name: String,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
}

/// Deployment outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub success: bool,
    pub message: String,
    pub deployment_id: String,
    pub endpoint: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("acme")]
    #[case("ACME_prod-2")]
    #[case("samplepms")]
    #[case("a")]
    fn test_valid_tenant_codes(#[case] code: &str) {
        let parsed = TenantCode::parse(code).unwrap();
        assert_eq!(parsed.as_str(), code);
    }

    #[rstest]
    #[case("")]
    #[case("acme corp")]
    #[case("../etc")]
    #[case("acme/east")]
    #[case("héllo")]
    #[case("acme\n")]
    fn test_invalid_tenant_codes(#[case] code: &str) {
        assert!(matches!(
            TenantCode::parse(code),
            Err(BridgeError::InvalidTenantCode { .. })
        ));
    }

    #[test]
    fn test_code_keeps_its_case() {
        let code = TenantCode::parse("SamplePMS").unwrap();
        assert_eq!(code.to_string(), "SamplePMS");
    }

    #[rstest]
    #[case("{\"a\":1}", ContentKind::Json)]
    #[case("  \n\t{}", ContentKind::Json)]
    #[case("<Root/>", ContentKind::Xml)]
    #[case("\r\n <?xml version=\"1.0\"?><a/>", ContentKind::Xml)]
    #[case("[1,2,3]", ContentKind::Text)]
    #[case("plain text", ContentKind::Text)]
    #[case("", ContentKind::Text)]
    fn test_content_detection(#[case] payload: &str, #[case] expected: ContentKind) {
        assert_eq!(ContentKind::detect(payload), expected);
    }

    #[test]
    fn test_mapping_document_reads_camel_case() {
        let raw = r#"{
            "pmsCode": "acme",
            "pmsName": "Acme PMS",
            "mappings": [
                { "sourceField": "roomType", "targetField": "InvCode", "confidence": 0.95 }
            ],
            "deployedAt": "2024-01-01 10:00:00.000",
            "version": "1.0.0"
        }"#;
        let doc: MappingDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.pms_code, "acme");
        assert_eq!(doc.mappings[0].target_field, "InvCode");
    }

    #[test]
    fn test_stats_serialization_shape() {
        let stats = Stats {
            records_processed: 2,
            errors: 1,
            last_sync: None,
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["recordsProcessed"], 2);
        assert_eq!(value["errors"], 1);
        assert!(value["lastSync"].is_null());
    }

    #[test]
    fn test_schema_kind_parse() {
        assert_eq!(SchemaKind::parse("JSON").unwrap(), SchemaKind::Json);
        assert_eq!(SchemaKind::parse("xsd").unwrap(), SchemaKind::Xsd);
        assert!(SchemaKind::parse("yaml").is_err());
        assert_eq!(SchemaKind::Xsd.file_name(), "schema.xsd");
    }
}
