//! Module metadata providers.
//!
//! A module describes itself with a [`SourceInfo`] record. Providers are
//! registered in a [`ProviderRegistry`] and asked in order; the first one
//! that recognises the module wins.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ToolCommand;
use crate::error::{Error, Result};
use crate::paths::ProjectDirs;
use crate::toolchain::{STANDALONE_NAME, resolve_program};

/// File name of the static metadata record inside `src/<id>/`.
pub const STATIC_INFO_FILE: &str = "info.json";

/// Metadata a module declares about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,

    #[serde(default)]
    pub author: String,

    #[serde(default, alias = "desc")]
    pub description: String,

    #[serde(default)]
    pub author_website: String,

    pub version: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default, alias = "sourceTags", deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,

    #[serde(default, rename = "websiteBaseURL")]
    pub website_base_url: String,
}

impl SourceInfo {
    /// Parse a record from JSON.
    pub fn from_json(module_id: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Metadata {
            module: module_id.to_string(),
            message: format!("invalid metadata record: {e}"),
        })
    }
}

/// Tags are declared either as plain text or as `{ text, type }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTag {
    Text(String),
    Object { text: String },
}

fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<RawTag>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|tag| match tag {
            RawTag::Text(text) | RawTag::Object { text } => text,
        })
        .collect())
}

/// A way of obtaining a module's [`SourceInfo`].
pub trait MetadataProvider: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &str;

    /// Load the record, or `Ok(None)` if this provider does not apply.
    fn load(&self, dirs: &ProjectDirs, module_id: &str) -> Result<Option<SourceInfo>>;
}

/// Reads `src/<id>/info.json`.
#[derive(Debug, Default, Clone)]
pub struct StaticInfoProvider;

impl MetadataProvider for StaticInfoProvider {
    fn name(&self) -> &str {
        "static record"
    }

    fn load(&self, dirs: &ProjectDirs, module_id: &str) -> Result<Option<SourceInfo>> {
        let path = dirs.src_dir.join(module_id).join(STATIC_INFO_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        SourceInfo::from_json(module_id, &json).map(Some)
    }
}

/// Script evaluated by Node.js to read the record out of a bundled module.
///
/// Looks for an exported `<id>Info` record first, then for an exported class
/// named `<id>`, which is instantiated without a host context.
const NODE_PROBE: &str = r#"
const [entry, id, globalName] = process.argv.slice(1);
const loaded = require(entry);
const scope = loaded[globalName] || loaded;
let info = scope[id + 'Info'];
if (!info && typeof scope[id] === 'function') {
  const source = new scope[id](null);
  info = {
    name: source.name,
    author: source.author,
    description: source.description,
    authorWebsite: source.authorWebsite,
    version: source.version,
    icon: source.icon,
    tags: source.sourceTags,
    websiteBaseURL: source.websiteBaseURL,
  };
}
if (!info) {
  console.error(`module exports neither ${id}Info nor a class named ${id}`);
  process.exit(2);
}
process.stdout.write(JSON.stringify(info));
"#;

/// Evaluates `bundles/<id>/source.js` with Node.js.
#[derive(Debug, Clone)]
pub struct NodeInfoProvider {
    node: ToolCommand,
}

impl NodeInfoProvider {
    pub fn new(node: ToolCommand) -> Self {
        Self { node }
    }

    fn probe(&self, cwd: &Path, script: &Path, module_id: &str) -> Result<SourceInfo> {
        resolve_program(&self.node)?;

        let script = script.to_string_lossy().into_owned();
        let output = self
            .node
            .command(cwd, ["-e", NODE_PROBE, script.as_str(), module_id, STANDALONE_NAME])
            .output()
            .map_err(|e| Error::Toolchain(format!("Failed to run {}: {}", self.node.display(), e)))?;

        if !output.status.success() {
            return Err(Error::Metadata {
                module: module_id.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        SourceInfo::from_json(module_id, &String::from_utf8_lossy(&output.stdout))
    }
}

impl MetadataProvider for NodeInfoProvider {
    fn name(&self) -> &str {
        "node"
    }

    fn load(&self, dirs: &ProjectDirs, module_id: &str) -> Result<Option<SourceInfo>> {
        let script = dirs.bundle_file(module_id);
        if !script.is_file() {
            return Ok(None);
        }
        self.probe(&dirs.root, &script, module_id).map(Some)
    }
}

/// Ordered set of metadata providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Static records first, then Node.js evaluation of the bundle.
    pub fn with_defaults(node: ToolCommand) -> Self {
        Self::new()
            .with(StaticInfoProvider)
            .with(NodeInfoProvider::new(node))
    }

    /// Append a provider.
    pub fn with(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Ask each provider in turn for the module's record.
    pub fn resolve(&self, dirs: &ProjectDirs, module_id: &str) -> Result<SourceInfo> {
        for provider in &self.providers {
            if let Some(info) = provider.load(dirs, module_id)? {
                tracing::debug!("Metadata for {} read via {}", module_id, provider.name());
                return Ok(info);
            }
        }

        Err(Error::Metadata {
            module: module_id.to_string(),
            message: "no metadata provider recognised the module".to_string(),
        })
    }
}
