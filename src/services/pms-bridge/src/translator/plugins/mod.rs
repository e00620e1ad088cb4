//! Translators compiled into the service
//!
//! Add a plugin by implementing [`PmsTranslator`](super::PmsTranslator) in its own
//! module and appending a [`TranslatorRegistration`] to [`BUILTIN_TRANSLATORS`].

pub mod samplepms;

use super::TranslatorRegistration;

/// Registration table scanned once when the registry is built
pub const BUILTIN_TRANSLATORS: &[TranslatorRegistration] = &[TranslatorRegistration {
    name: "SamplePmsTranslator",
    factory: samplepms::create,
}];
