//! Reference plugin for the `samplepms` tenant
//!
//! Wraps the raw feed in an `RGBridgeMessage` envelope without inspecting it.

use crate::translator::{PmsTranslator, TranslationError};
use async_trait::async_trait;
use std::sync::Arc;

pub const PMS_CODE: &str = "samplepms";

#[derive(Debug, Default)]
pub struct SamplePmsTranslator;

pub fn create() -> Result<Arc<dyn PmsTranslator>, TranslationError> {
    Ok(Arc::new(SamplePmsTranslator))
}

#[async_trait]
impl PmsTranslator for SamplePmsTranslator {
    fn pms_code(&self) -> &str {
        PMS_CODE
    }

    async fn translate_to_canonical(&self, payload: &str) -> Result<String, TranslationError> {
        Ok(format!(
            "<RGBridgeMessage>Translated from {}: {}</RGBridgeMessage>",
            PMS_CODE, payload
        ))
    }
}
