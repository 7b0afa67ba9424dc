//! Versioning manifest generation.
//!
//! Scans `bundles/`, resolves every module's metadata and writes
//! `bundles/versioning.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fanout::{self, FailedModule, ModuleOutcome, SkippedModule};
use crate::fs;
use crate::metadata::{ProviderRegistry, SourceInfo};
use crate::paths::{ProjectDirs, RESERVED_TESTS_DIR};

/// One published module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    pub author: String,
    pub desc: String,
    pub website: String,
    pub version: String,
    pub icon: String,
    pub tags: Vec<String>,
    #[serde(rename = "websiteBaseURL")]
    pub website_base_url: String,
}

impl ManifestEntry {
    /// Build an entry from a module id and its declared metadata.
    pub fn new(id: impl Into<String>, info: SourceInfo) -> Self {
        Self {
            id: id.into(),
            name: info.name,
            author: info.author,
            desc: info.description,
            website: info.author_website,
            version: info.version,
            icon: info.icon,
            tags: info.tags,
            website_base_url: info.website_base_url,
        }
    }
}

/// The generated `versioning.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// ISO-8601 UTC build timestamp.
    pub build_time: String,
    pub sources: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create a manifest stamped with `build_time`.
    pub fn new(build_time: DateTime<Utc>, sources: Vec<ManifestEntry>) -> Self {
        Self {
            build_time: build_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            sources,
        }
    }

    /// Read a previously written manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::Descriptor {
            path: path.to_path_buf(),
            message: format!("cannot read manifest: {e}"),
        })?;
        serde_json::from_str(&json).map_err(|e| Error::Descriptor {
            path: path.to_path_buf(),
            message: format!("malformed manifest: {e}"),
        })
    }

    /// Write the manifest, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Output of the manifest phase.
#[derive(Debug)]
pub struct ManifestReport {
    /// Where the manifest was written.
    pub path: PathBuf,
    pub manifest: Manifest,
    pub skipped: Vec<SkippedModule>,
    pub failed: Vec<FailedModule>,
}

/// Module ids present in the bundle output.
pub fn discover_bundled_modules(dirs: &ProjectDirs) -> Result<Vec<String>> {
    let mut modules = Vec::new();
    for entry in fs::list_entries(&dirs.bundles_dir)? {
        if entry.name.starts_with('.') || entry.name == RESERVED_TESTS_DIR {
            continue;
        }
        if !entry.is_dir {
            tracing::debug!("Ignoring {} in bundle output: not a directory", entry.name);
            continue;
        }
        modules.push(entry.name);
    }
    Ok(modules)
}

/// Resolve and validate a single module's manifest entry.
///
/// A module without a bundled script is skipped.
pub fn scan_module(
    dirs: &ProjectDirs,
    registry: &ProviderRegistry,
    module_id: &str,
) -> Result<ModuleOutcome<ManifestEntry>> {
    let script = dirs.bundle_file(module_id);
    if !script.is_file() {
        return Ok(ModuleOutcome::Skipped(format!(
            "no bundled script at {}",
            script.display()
        )));
    }

    let info = registry.resolve(dirs, module_id)?;

    if !info.icon.is_empty() {
        let icon_path = dirs.bundle_includes(module_id).join(&info.icon);
        if !icon_path.is_file() {
            return Err(Error::MissingIcon {
                module: module_id.to_string(),
                icon: info.icon,
                path: icon_path,
            });
        }
    }

    Ok(ModuleOutcome::Done(ManifestEntry::new(module_id, info)))
}

/// Scan every bundled module and write the manifest.
pub fn generate(
    dirs: &ProjectDirs,
    registry: &ProviderRegistry,
    build_time: DateTime<Utc>,
) -> Result<ManifestReport> {
    let modules = discover_bundled_modules(dirs)?;
    tracing::info!("Generating manifest for {} modules", modules.len());

    let outcome = fanout::run_modules(&modules, |module| scan_module(dirs, registry, module));

    let manifest = Manifest::new(build_time, outcome.succeeded);
    std::fs::create_dir_all(&dirs.bundles_dir)?;
    let path = dirs.manifest_file();
    manifest.write(&path)?;

    Ok(ManifestReport {
        path,
        manifest,
        skipped: outcome.skipped,
        failed: outcome.failed,
    })
}
