//! PMS feed translators
//!
//! A translator turns a raw PMS feed into an RGBridge payload. Two kinds exist:
//!
//! - **Plugins**: compiled into the binary and listed in
//!   [`plugins::BUILTIN_TRANSLATORS`]. Each declares the tenant code it serves.
//! - **Mapping fallback**: a [`MappingTranslator`] built per request from the tenant's
//!   deployed field mappings.
//!
//! The [`TranslatorRegistry`] is built once at startup and resolves plugins by tenant
//! code; the feed pipeline falls back to mappings when no plugin is registered.

pub mod mapping;
pub mod plugins;
pub mod registry;

pub use mapping::MappingTranslator;
pub use registry::{TranslatorFactory, TranslatorRegistration, TranslatorRegistry};

use async_trait::async_trait;
use thiserror::Error;

/// Translator failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// The translator could not be built
    #[error("Translator construction failed: {0}")]
    Construction(String),

    /// The feed could not be translated
    #[error("Translation failed: {0}")]
    Failed(String),
}

/// Capability shared by every translator
#[async_trait]
pub trait PmsTranslator: Send + Sync {
    /// Tenant code this translator serves
    fn pms_code(&self) -> &str;

    /// Translate a raw feed into its RGBridge form
    async fn translate_to_canonical(&self, payload: &str) -> Result<String, TranslationError>;
}
