//! Mapping translation engine
//!
//! Renames fields of a JSON or XML feed according to a tenant's deployed mappings.
//! Translation never fails: anything that cannot be parsed, and any feed that is
//! neither JSON nor XML, becomes the placeholder
//! `"Translated data for {code}: {feed}"`.
//!
//! JSON feeds are parsed as an object and re-serialized (pretty printed) with renamed
//! keys; key order is not preserved. A rename onto a name that another field of the
//! record also ends up with is treated as unmappable. XML feeds are rewritten textually: every exact
//! `<source>` / `</source>` tag is replaced, one mapping at a time, in mapping order.
//! Tags carrying attributes, self-closing tags and namespaced names are left untouched.

use super::{PmsTranslator, TranslationError};
use crate::models::{ContentKind, FieldMapping};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Fallback text for feeds the engine cannot map
pub fn placeholder(code: &str, feed: &str) -> String {
    format!("Translated data for {}: {}", code, feed)
}

/// Per-request translator built from a tenant's mapping table
#[derive(Debug, Clone)]
pub struct MappingTranslator {
    code: String,
    /// Rename rules in mapping order, one per source field
    rules: Vec<(String, String)>,
    lookup: HashMap<String, String>,
}

impl MappingTranslator {
    /// Build from `(source, target)` pairs; for repeated sources the first pair wins
    pub fn new<C, I, S, T>(code: C, rules: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashMap::new();
        for (source, target) in rules {
            let (source, target) = (source.into(), target.into());
            if lookup.contains_key(&source) {
                continue;
            }
            lookup.insert(source.clone(), target.clone());
            ordered.push((source, target));
        }

        Self {
            code: code.into(),
            rules: ordered,
            lookup,
        }
    }

    pub fn from_mappings<C: Into<String>>(code: C, mappings: &[FieldMapping]) -> Self {
        Self::new(
            code,
            mappings
                .iter()
                .map(|m| (m.source_field.as_str(), m.target_field.as_str())),
        )
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Apply the mapping table to a feed
    pub fn apply(&self, feed: &str) -> String {
        match ContentKind::detect(feed) {
            ContentKind::Json => self
                .apply_json(feed)
                .unwrap_or_else(|| placeholder(&self.code, feed)),
            ContentKind::Xml => self
                .apply_xml(feed)
                .unwrap_or_else(|| placeholder(&self.code, feed)),
            ContentKind::Text => placeholder(&self.code, feed),
        }
    }

    fn apply_json(&self, feed: &str) -> Option<String> {
        let record: Map<String, Value> = match serde_json::from_str(feed) {
            Ok(record) => record,
            Err(e) => {
                debug!(pms_code = %self.code, error = %e, "Feed is not a JSON object");
                return None;
            }
        };

        let mut renamed = Map::with_capacity(record.len());
        for (key, value) in record {
            let name = self.lookup.get(&key).cloned().unwrap_or(key);
            if renamed.contains_key(&name) {
                // Two fields would land on one name and a value would be lost
                debug!(
                    pms_code = %self.code,
                    field = %name,
                    "Mapped field collides with another field"
                );
                return None;
            }
            renamed.insert(name, value);
        }

        serde_json::to_string_pretty(&Value::Object(renamed)).ok()
    }

    fn apply_xml(&self, feed: &str) -> Option<String> {
        if let Err(e) = roxmltree::Document::parse(feed) {
            debug!(pms_code = %self.code, error = %e, "Feed is not well-formed XML");
            return None;
        }

        let mut output = feed.to_string();
        for (source, target) in &self.rules {
            output = output
                .replace(&format!("<{}>", source), &format!("<{}>", target))
                .replace(&format!("</{}>", source), &format!("</{}>", target));
        }
        Some(output)
    }
}

#[async_trait]
impl PmsTranslator for MappingTranslator {
    fn pms_code(&self) -> &str {
        &self.code
    }

    async fn translate_to_canonical(&self, payload: &str) -> Result<String, TranslationError> {
        Ok(self.apply(payload))
    }
}
