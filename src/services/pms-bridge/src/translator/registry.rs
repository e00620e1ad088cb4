//! Translator registry
//!
//! Built once from an explicit registration table and read-only afterwards, so it can be
//! shared between request handlers behind an `Arc` without further synchronization.

use super::{plugins, PmsTranslator, TranslationError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Constructor for a compiled-in translator
pub type TranslatorFactory = fn() -> Result<Arc<dyn PmsTranslator>, TranslationError>;

/// One entry of a registration table
#[derive(Clone, Copy)]
pub struct TranslatorRegistration {
    /// Implementation name, used in logs only
    pub name: &'static str,
    pub factory: TranslatorFactory,
}

impl fmt::Debug for TranslatorRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorRegistration")
            .field("name", &self.name)
            .finish()
    }
}

/// Plugin translators indexed by lower-cased tenant code
#[derive(Default)]
pub struct TranslatorRegistry {
    translators: HashMap<String, Arc<dyn PmsTranslator>>,
}

impl TranslatorRegistry {
    /// Registry over the translators compiled into this binary
    pub fn builtin() -> Self {
        Self::from_registrations(plugins::BUILTIN_TRANSLATORS)
    }

    /// Build a registry by invoking every factory in the table.
    ///
    /// A factory that fails or yields a blank code is logged and skipped. When two
    /// translators declare the same code the first one stays registered.
    pub fn from_registrations(registrations: &[TranslatorRegistration]) -> Self {
        let mut translators: HashMap<String, Arc<dyn PmsTranslator>> = HashMap::new();

        for registration in registrations {
            let translator = match (registration.factory)() {
                Ok(translator) => translator,
                Err(e) => {
                    error!(
                        translator = registration.name,
                        error = %e,
                        "Failed to instantiate translator"
                    );
                    continue;
                }
            };

            let code = translator.pms_code().trim().to_lowercase();
            if code.is_empty() {
                warn!(
                    translator = registration.name,
                    "Translator does not declare a PMS code, skipping"
                );
                continue;
            }

            if translators.contains_key(&code) {
                warn!(
                    translator = registration.name,
                    pms_code = %code,
                    "Duplicate translator for PMS code"
                );
                continue;
            }

            info!(
                translator = registration.name,
                pms_code = %code,
                "Registered PMS translator"
            );
            translators.insert(code, translator);
        }

        Self { translators }
    }

    /// Plugin translator for a tenant code, matched case-insensitively
    pub fn resolve(&self, pms_code: &str) -> Option<Arc<dyn PmsTranslator>> {
        let key = pms_code.trim();
        if key.is_empty() {
            return None;
        }
        self.translators.get(&key.to_lowercase()).cloned()
    }

    /// Registered codes in sorted order
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.translators.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}
