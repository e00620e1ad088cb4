//! Filesystem tenant store
//!
//! Each tenant owns a directory `{pms_root}/{code}/`:
//!
//! | file            | contents                                   |
//! |-----------------|--------------------------------------------|
//! | `mapping.json`  | deployed field mappings                    |
//! | `manifest.json` | deployment manifest                        |
//! | `schema.json`   | optional JSON Schema for JSON feeds        |
//! | `schema.xsd`    | optional XSD for XML feeds                 |
//! | `stats.json`    | processing counters                        |
//!
//! Files are addressed by path with no file-level locking; the last writer wins.
//! Every write replaces the file atomically.

use crate::error::{BridgeError, BridgeResult};
use crate::models::{
    DeployRequest, DeploymentManifest, FieldMapping, MappingDocument, SchemaKind, Stats,
    TenantCode, TenantConfig, DEPLOYMENT_VERSION, DOCUMENT_TIMESTAMP_FORMAT,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAPPING_FILE: &str = "mapping.json";
const MANIFEST_FILE: &str = "manifest.json";
const STATS_FILE: &str = "stats.json";

/// Tenant configuration access required by the feed pipeline
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Deployed mapping set; empty when the tenant or its mapping file is missing
    async fn load_mappings(&self, code: &TenantCode) -> BridgeResult<Vec<FieldMapping>>;

    /// Schema text of the given kind, `None` when the tenant has not supplied one
    async fn load_schema(&self, code: &TenantCode, kind: SchemaKind)
        -> BridgeResult<Option<String>>;

    /// Persisted counters; zeroed when none have been written yet
    async fn load_stats(&self, code: &TenantCode) -> BridgeResult<Stats>;

    /// Persist counters
    async fn save_stats(&self, code: &TenantCode, stats: &Stats) -> BridgeResult<()>;
}

/// Tenant store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsTenantStore {
    root: PathBuf,
}

impl FsTenantStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tenant_dir(&self, code: &TenantCode) -> PathBuf {
        self.root.join(code.as_str())
    }

    /// Deploy a mapping set, replacing any previous one, and write a fresh manifest
    pub async fn deploy(&self, request: &DeployRequest) -> BridgeResult<DeploymentManifest> {
        let code = TenantCode::parse(request.pms_code.trim())?;

        if request.mappings.is_empty() {
            return Err(BridgeError::validation(
                "mappings",
                "At least one mapping is required for deployment",
            ));
        }

        let mut seen = HashSet::with_capacity(request.mappings.len());
        for mapping in &request.mappings {
            if mapping.source_field.is_empty() || mapping.target_field.is_empty() {
                return Err(BridgeError::validation(
                    "mappings",
                    "Mapping source and target fields cannot be empty",
                ));
            }
            if !seen.insert(mapping.source_field.as_str()) {
                return Err(BridgeError::validation(
                    "mappings",
                    format!("Duplicate source field '{}'", mapping.source_field),
                ));
            }
        }

        let dir = self.tenant_dir(&code);
        fs::create_dir_all(&dir).await?;

        let deployed_at = Utc::now().format(DOCUMENT_TIMESTAMP_FORMAT).to_string();
        let pms_name = (!request.pms_name.trim().is_empty()).then(|| request.pms_name.clone());

        let document = MappingDocument {
            pms_code: code.to_string(),
            pms_name: pms_name.clone(),
            mappings: request.mappings.clone(),
            deployed_at: Some(deployed_at.clone()),
            version: Some(DEPLOYMENT_VERSION.to_string()),
        };
        write_json(&dir.join(MAPPING_FILE), &document).await?;

        let manifest = DeploymentManifest {
            deployment_id: Uuid::new_v4().to_string(),
            pms_code: code.to_string(),
            pms_name: pms_name.unwrap_or_default(),
            status: "active".to_string(),
            deployed_at,
            mappings_count: request.mappings.len(),
            endpoint: format!("/api/pms/{}", code),
            version: DEPLOYMENT_VERSION.to_string(),
        };
        write_json(&dir.join(MANIFEST_FILE), &manifest).await?;

        info!(
            tenant_code = %code,
            mappings = manifest.mappings_count,
            deployment_id = %manifest.deployment_id,
            "Deployed PMS mapping set"
        );

        Ok(manifest)
    }

    /// Manifest of one tenant
    pub async fn get_manifest(&self, code: &TenantCode) -> BridgeResult<DeploymentManifest> {
        let path = self.tenant_dir(code).join(MANIFEST_FILE);
        match read_optional(&path).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Err(BridgeError::tenant_not_found(code.as_str())),
        }
    }

    /// All readable manifests under the root; unreadable ones are skipped
    pub async fn list_manifests(&self) -> BridgeResult<Vec<DeploymentManifest>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut manifests = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path().join(MANIFEST_FILE);
            let Some(raw) = read_optional(&path).await? else {
                continue;
            };
            match serde_json::from_str::<DeploymentManifest>(&raw) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid manifest"),
            }
        }

        manifests.sort_by(|a, b| a.pms_code.cmp(&b.pms_code));
        Ok(manifests)
    }

    /// Replace the manifest of an existing tenant
    pub async fn update_manifest(
        &self,
        code: &TenantCode,
        manifest: &DeploymentManifest,
    ) -> BridgeResult<()> {
        let path = self.tenant_dir(code).join(MANIFEST_FILE);
        if !fs::try_exists(&path).await? {
            return Err(BridgeError::tenant_not_found(code.as_str()));
        }
        write_json(&path, manifest).await?;
        info!(tenant_code = %code, "Updated manifest");
        Ok(())
    }

    /// Remove a tenant with its mappings, schemas and stats
    pub async fn delete_tenant(&self, code: &TenantCode) -> BridgeResult<()> {
        let dir = self.tenant_dir(code);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(tenant_code = %code, "Deleted PMS integration folder");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BridgeError::tenant_not_found(code.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store or replace a tenant schema
    pub async fn save_schema(
        &self,
        code: &TenantCode,
        kind: SchemaKind,
        schema: &str,
    ) -> BridgeResult<()> {
        let dir = self.tenant_dir(code);
        fs::create_dir_all(&dir).await?;
        write_atomic(&dir.join(kind.file_name()), schema.as_bytes().to_vec()).await?;
        info!(tenant_code = %code, kind = ?kind, "Stored tenant schema");
        Ok(())
    }

    /// Assemble everything stored for a tenant
    pub async fn load_config(&self, code: &TenantCode) -> BridgeResult<TenantConfig> {
        if !fs::try_exists(self.tenant_dir(code)).await? {
            return Err(BridgeError::tenant_not_found(code.as_str()));
        }

        let document = self.load_mapping_document(code).await?;
        let name = document.as_ref().and_then(|doc| doc.pms_name.clone());
        let mappings = document.map(|doc| doc.mappings).unwrap_or_default();

        Ok(TenantConfig {
            code: code.clone(),
            name,
            mappings,
            json_schema: self.load_schema(code, SchemaKind::Json).await?,
            xml_schema: self.load_schema(code, SchemaKind::Xsd).await?,
            stats: self.load_stats(code).await?,
        })
    }

    async fn load_mapping_document(
        &self,
        code: &TenantCode,
    ) -> BridgeResult<Option<MappingDocument>> {
        let path = self.tenant_dir(code).join(MAPPING_FILE);
        match read_optional(&path).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TenantStore for FsTenantStore {
    async fn load_mappings(&self, code: &TenantCode) -> BridgeResult<Vec<FieldMapping>> {
        let mappings = self
            .load_mapping_document(code)
            .await?
            .map(|doc| doc.mappings)
            .unwrap_or_default();
        debug!(tenant_code = %code, count = mappings.len(), "Loaded mappings");
        Ok(mappings)
    }

    async fn load_schema(
        &self,
        code: &TenantCode,
        kind: SchemaKind,
    ) -> BridgeResult<Option<String>> {
        read_optional(&self.tenant_dir(code).join(kind.file_name())).await
    }

    async fn load_stats(&self, code: &TenantCode) -> BridgeResult<Stats> {
        let path = self.tenant_dir(code).join(STATS_FILE);
        match read_optional(&path).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Stats::default()),
        }
    }

    async fn save_stats(&self, code: &TenantCode, stats: &Stats) -> BridgeResult<()> {
        let dir = self.tenant_dir(code);
        fs::create_dir_all(&dir).await?;
        write_json(&dir.join(STATS_FILE), stats).await
    }
}

async fn read_optional(path: &Path) -> BridgeResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> BridgeResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, json).await
}

/// Write through a temporary sibling renamed into place, so readers see the old or the
/// new contents and never a truncated file
async fn write_atomic(path: &Path, contents: Vec<u8>) -> BridgeResult<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> BridgeResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| BridgeError::internal(format!("File write task failed: {}", e)))?
}
