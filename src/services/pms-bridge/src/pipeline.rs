//! Feed processing pipeline
//!
//! One call of [`FeedProcessor::process`] moves a feed through
//! `Received -> Validated -> Translated -> Delivered | DeliverySkipped -> Recorded`.
//! Every outcome for a well-formed tenant code is counted in the tenant's stats before
//! the call returns. Malformed tenant codes are rejected before any I/O.

use crate::delivery::RgbridgeSender;
use crate::error::{BridgeError, BridgeResult};
use crate::models::{ContentKind, FeedResponse, TenantCode, TestTranslationResponse};
use crate::tenant::{StatsTracker, TenantStore};
use crate::translator::{MappingTranslator, TranslatorRegistry};
use crate::validation::{SchemaCheck, SchemaValidator};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Pipeline stage, used as a structured log field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStage {
    Received,
    Validated,
    Translated,
    Delivered,
    DeliverySkipped,
    Recorded,
}

impl FeedStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedStage::Received => "received",
            FeedStage::Validated => "validated",
            FeedStage::Translated => "translated",
            FeedStage::Delivered => "delivered",
            FeedStage::DeliverySkipped => "delivery_skipped",
            FeedStage::Recorded => "recorded",
        }
    }
}

impl fmt::Display for FeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorKind {
    Plugin,
    Mapping,
}

impl TranslatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TranslatorKind::Plugin => "plugin",
            TranslatorKind::Mapping => "mapping",
        }
    }
}

/// Translated feed together with the path that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub output: String,
    pub translator: TranslatorKind,
}

/// Orchestrates validation, translation, delivery and stats for inbound feeds
pub struct FeedProcessor {
    registry: Arc<TranslatorRegistry>,
    store: Arc<dyn TenantStore>,
    validator: SchemaValidator,
    sender: Arc<RgbridgeSender>,
    stats: Arc<StatsTracker>,
}

impl FeedProcessor {
    pub fn new(
        registry: Arc<TranslatorRegistry>,
        store: Arc<dyn TenantStore>,
        sender: Arc<RgbridgeSender>,
    ) -> Self {
        Self {
            validator: SchemaValidator::new(store.clone()),
            stats: Arc::new(StatsTracker::new(store.clone())),
            registry,
            store,
            sender,
        }
    }

    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Process one inbound feed for a tenant
    #[instrument(skip(self, feed), fields(tenant_code = %raw_code, feed_len = feed.len()))]
    pub async fn process(&self, raw_code: &str, feed: &str) -> BridgeResult<FeedResponse> {
        debug!(stage = %FeedStage::Received, "Feed received");

        if feed.trim().is_empty() {
            return Err(self.reject(raw_code, BridgeError::EmptyFeed).await);
        }
        let code = TenantCode::parse(raw_code)?;

        match self.run(&code, feed).await {
            Ok(response) => {
                self.record_success(&code).await;
                info!(
                    stage = %FeedStage::Recorded,
                    delivered = response.delivery_status.is_some(),
                    "Feed processed"
                );
                Ok(response)
            }
            Err(e) => {
                if e.is_input_error() {
                    warn!(error = %e, "Feed rejected");
                } else {
                    error!(error = %e, "Feed processing failed");
                }
                self.record_error(&code).await;
                Err(e)
            }
        }
    }

    /// Count a request that failed before its feed could be read
    pub async fn reject(&self, raw_code: &str, error: BridgeError) -> BridgeError {
        // Only a well-formed code may address a tenant directory
        if let Ok(code) = TenantCode::parse(raw_code) {
            self.record_error(&code).await;
        }
        error
    }

    /// Validate and translate a sample feed without delivery or stats
    #[instrument(skip(self, feed), fields(tenant_code = %raw_code, feed_len = feed.len()))]
    pub async fn preview(&self, raw_code: &str, feed: &str) -> BridgeResult<TestTranslationResponse> {
        if feed.trim().is_empty() {
            return Err(BridgeError::EmptyFeed);
        }
        let code = TenantCode::parse(raw_code)?;
        let translation = self.validate_and_translate(&code, feed).await?;

        Ok(TestTranslationResponse {
            success: true,
            translator: translation.translator.as_str().to_string(),
            translated_data: translation.output,
            timestamp: Utc::now(),
        })
    }

    async fn run(&self, code: &TenantCode, feed: &str) -> BridgeResult<FeedResponse> {
        let translation = self.validate_and_translate(code, feed).await?;

        let delivery_status = if ContentKind::detect(&translation.output) == ContentKind::Xml {
            let result = self.sender.send_xml(&translation.output).await;
            info!(
                stage = %FeedStage::Delivered,
                success = result.success,
                attempts = result.attempts.len(),
                "Delivery finished"
            );
            Some(result.status_message())
        } else {
            debug!(stage = %FeedStage::DeliverySkipped, "Translated output is not XML");
            None
        };

        Ok(FeedResponse {
            translated_data: translation.output,
            delivery_status,
        })
    }

    async fn validate_and_translate(
        &self,
        code: &TenantCode,
        feed: &str,
    ) -> BridgeResult<Translation> {
        match self.validator.check(code, feed).await? {
            SchemaCheck::Invalid(message) => return Err(BridgeError::schema_validation(message)),
            check => debug!(stage = %FeedStage::Validated, ?check, "Schema check passed"),
        }

        let translation = self.translate(code, feed).await?;
        debug!(
            stage = %FeedStage::Translated,
            translator = translation.translator.as_str(),
            "Feed translated"
        );
        Ok(translation)
    }

    /// Plugin translator when one is registered, the tenant's mappings otherwise
    pub async fn translate(&self, code: &TenantCode, feed: &str) -> BridgeResult<Translation> {
        if let Some(plugin) = self.registry.resolve(code.as_str()) {
            let output = plugin
                .translate_to_canonical(feed)
                .await
                .map_err(|e| BridgeError::translation(code.as_str(), e.to_string()))?;
            return Ok(Translation {
                output,
                translator: TranslatorKind::Plugin,
            });
        }

        let mappings = self.store.load_mappings(code).await?;
        let translator = MappingTranslator::from_mappings(code.as_str(), &mappings);
        Ok(Translation {
            output: translator.apply(feed),
            translator: TranslatorKind::Mapping,
        })
    }

    async fn record_success(&self, code: &TenantCode) {
        if let Err(e) = self.stats.record_success(code).await {
            error!(tenant_code = %code, error = %e, "Failed to persist stats");
        }
    }

    async fn record_error(&self, code: &TenantCode) {
        if let Err(e) = self.stats.record_error(code).await {
            error!(tenant_code = %code, error = %e, "Failed to persist stats");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{DeliveryTransport, TransportResponse};
    use crate::models::{DeployRequest, FieldMapping, SchemaKind};
    use crate::tenant::FsTenantStore;
    use crate::translator::{PmsTranslator, TranslationError, TranslatorRegistration};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct CountingTransport {
        posts: AtomicUsize,
    }

    #[async_trait]
    impl DeliveryTransport for CountingTransport {
        async fn post(&self, _payload: &str) -> BridgeResult<TransportResponse> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(TransportResponse {
                status: 200,
                body: "ok".to_string(),
            })
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl PmsTranslator for FailingTranslator {
        fn pms_code(&self) -> &str {
            "brokenpms"
        }

        async fn translate_to_canonical(&self, _payload: &str) -> Result<String, TranslationError> {
            Err(TranslationError::Failed("upstream format changed".to_string()))
        }
    }

    fn failing() -> Result<Arc<dyn PmsTranslator>, TranslationError> {
        Ok(Arc::new(FailingTranslator))
    }

    struct Fixture {
        _dir: TempDir,
        store: Arc<FsTenantStore>,
        transport: Arc<CountingTransport>,
        processor: FeedProcessor,
    }

    impl Fixture {
        fn new(registry: TranslatorRegistry) -> Self {
            let dir = tempdir().unwrap();
            let store = Arc::new(FsTenantStore::new(dir.path()));
            let transport = Arc::new(CountingTransport::default());
            let sender = Arc::new(RgbridgeSender::new(
                transport.clone(),
                3,
                Duration::from_millis(1),
            ));
            let processor = FeedProcessor::new(Arc::new(registry), store.clone(), sender);
            Self {
                _dir: dir,
                store,
                transport,
                processor,
            }
        }

        async fn deploy(&self, code: &str, mappings: &[(&str, &str)]) {
            self.store
                .deploy(&DeployRequest {
                    pms_code: code.to_string(),
                    pms_name: String::new(),
                    mappings: mappings
                        .iter()
                        .map(|(s, t)| FieldMapping::new(*s, *t, 0.9))
                        .collect(),
                })
                .await
                .unwrap();
        }

        async fn stats(&self, code: &str) -> (u64, u64) {
            let stats = self
                .processor
                .stats()
                .snapshot(&TenantCode::parse(code).unwrap())
                .await
                .unwrap();
            (stats.records_processed, stats.errors)
        }

        fn posts(&self) -> usize {
            self.transport.posts.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_json_feed_is_mapped_and_not_delivered() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());
        fixture.deploy("acme", &[("roomType", "InvCode")]).await;

        let response = fixture
            .processor
            .process("acme", r#"{"roomType":"Suite","guest":"Jo"}"#)
            .await
            .unwrap();

        let translated: Value = serde_json::from_str(&response.translated_data).unwrap();
        assert_eq!(translated, json!({"InvCode": "Suite", "guest": "Jo"}));
        assert_eq!(response.delivery_status, None);
        assert_eq!(fixture.posts(), 0);
        assert_eq!(fixture.stats("acme").await, (1, 0));
    }

    #[tokio::test]
    async fn test_xml_output_is_delivered() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());
        fixture.deploy("acme", &[("roomType", "InvCode")]).await;

        let response = fixture
            .processor
            .process("acme", "<Res><roomType>Suite</roomType></Res>")
            .await
            .unwrap();

        assert_eq!(response.translated_data, "<Res><InvCode>Suite</InvCode></Res>");
        assert_eq!(response.delivery_status.as_deref(), Some("Delivered to RGBridge"));
        assert_eq!(fixture.posts(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_counts_error_without_translation() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());

        let error = fixture.processor.process("acme", "  \n ").await.unwrap_err();
        assert!(matches!(error, BridgeError::EmptyFeed));
        assert_eq!(fixture.stats("acme").await, (0, 1));
        assert_eq!(fixture.posts(), 0);
    }

    #[tokio::test]
    async fn test_invalid_code_touches_nothing() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());

        let error = fixture
            .processor
            .process("../acme", "<Res/>")
            .await
            .unwrap_err();
        assert!(matches!(error, BridgeError::InvalidTenantCode { .. }));

        let error = fixture.processor.process("bad code", "").await.unwrap_err();
        assert!(matches!(error, BridgeError::EmptyFeed));

        assert_eq!(fixture.posts(), 0);
        assert_eq!(std::fs::read_dir(fixture.store.root()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_schema_violation_rejects_feed() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());
        let acme = TenantCode::parse("acme").unwrap();
        fixture
            .store
            .save_schema(&acme, SchemaKind::Json, r#"{"type":"object","required":["roomType"]}"#)
            .await
            .unwrap();

        let error = fixture
            .processor
            .process("acme", r#"{"guest":"Jo"}"#)
            .await
            .unwrap_err();

        assert!(matches!(error, BridgeError::SchemaValidation { .. }));
        assert!(error.to_string().contains("roomType"));
        assert_eq!(fixture.stats("acme").await, (0, 1));
        assert_eq!(fixture.posts(), 0);
    }

    #[tokio::test]
    async fn test_plugin_takes_precedence_over_mappings() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());
        fixture.deploy("SamplePMS", &[("roomType", "InvCode")]).await;

        let response = fixture
            .processor
            .process("SamplePMS", r#"{"roomType":"Suite"}"#)
            .await
            .unwrap();

        assert_eq!(
            response.translated_data,
            r#"<RGBridgeMessage>Translated from samplepms: {"roomType":"Suite"}</RGBridgeMessage>"#
        );
        assert_eq!(fixture.posts(), 1);
        assert_eq!(fixture.stats("SamplePMS").await, (1, 0));
    }

    #[tokio::test]
    async fn test_unknown_tenant_passes_through_unmapped() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());

        let response = fixture
            .processor
            .process("newcomer", "plain text feed")
            .await
            .unwrap();

        assert_eq!(
            response.translated_data,
            "Translated data for newcomer: plain text feed"
        );
        assert_eq!(response.delivery_status, None);
        assert_eq!(fixture.stats("newcomer").await, (1, 0));
    }

    #[tokio::test]
    async fn test_plugin_failure_is_an_internal_error() {
        let registry = TranslatorRegistry::from_registrations(&[TranslatorRegistration {
            name: "Failing",
            factory: failing,
        }]);
        let fixture = Fixture::new(registry);

        let error = fixture
            .processor
            .process("brokenpms", "<Res/>")
            .await
            .unwrap_err();

        assert_eq!(error.error_code(), "INTERNAL_ERROR");
        assert_eq!(fixture.stats("brokenpms").await, (0, 1));
        assert_eq!(fixture.posts(), 0);
    }

    #[tokio::test]
    async fn test_preview_skips_delivery_and_stats() {
        let fixture = Fixture::new(TranslatorRegistry::builtin());

        let preview = fixture
            .processor
            .preview("samplepms", "<Res/>")
            .await
            .unwrap();
        assert!(preview.success);
        assert_eq!(preview.translator, "plugin");

        let preview = fixture.processor.preview("acme", "text").await.unwrap();
        assert_eq!(preview.translator, "mapping");

        assert_eq!(fixture.posts(), 0);
        assert_eq!(fixture.stats("samplepms").await, (0, 0));
        assert!(matches!(
            fixture.processor.preview("acme", "").await,
            Err(BridgeError::EmptyFeed)
        ));
    }
}
