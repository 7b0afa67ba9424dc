//! Project directory layout.
//!
//! Provides the single source of truth for every path the pipeline reads or
//! writes, so that components never consult the process working directory.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs;

/// Name of the intermediate compile output directory.
pub const BUILD_DIR_NAME: &str = ".extrepo-build";

/// Name of the final output directory.
pub const BUNDLES_DIR_NAME: &str = "bundles";

/// Name of the per-module asset directory.
pub const INCLUDES_DIR_NAME: &str = "includes";

/// File name of the bundled script inside `bundles/<id>/`.
pub const BUNDLE_FILE_NAME: &str = "source.js";

/// File name of the manifest inside `bundles/`.
pub const MANIFEST_FILE_NAME: &str = "versioning.json";

/// File name of the homepage inside `bundles/`.
pub const HOMEPAGE_FILE_NAME: &str = "index.html";

/// Directory entry that is never treated as a module.
pub const RESERVED_TESTS_DIR: &str = "tests";

/// Directory structure of an extension repository project.
///
/// ```text
/// project/
/// ├── package.json
/// ├── src/
/// │   └── <id>/
/// │       ├── <id>.ts
/// │       └── includes/
/// ├── .extrepo-build/   # compiler output, removed after bundling
/// └── bundles/
///     ├── <id>/
///     │   ├── source.js
///     │   └── includes/
///     ├── versioning.json
///     └── index.html
/// ```
#[derive(Debug, Clone)]
pub struct ProjectDirs {
    /// Project root.
    pub root: PathBuf,

    /// Module sources (`src/`).
    pub src_dir: PathBuf,

    /// Intermediate compiler output.
    pub build_dir: PathBuf,

    /// Final bundle output.
    pub bundles_dir: PathBuf,

    /// Project descriptor (`package.json`).
    pub package_file: PathBuf,
}

impl ProjectDirs {
    /// Derive the layout from a project root. Touches nothing on disk.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            src_dir: root.join("src"),
            build_dir: root.join(BUILD_DIR_NAME),
            bundles_dir: root.join(BUNDLES_DIR_NAME),
            package_file: root.join("package.json"),
            root,
        }
    }

    /// Compiled entry point of a module in the intermediate tree.
    pub fn compiled_entry(&self, module_id: &str) -> PathBuf {
        self.build_dir
            .join(module_id)
            .join(format!("{module_id}.js"))
    }

    /// Pre-compile asset directory of a module.
    pub fn source_includes(&self, module_id: &str) -> PathBuf {
        self.src_dir.join(module_id).join(INCLUDES_DIR_NAME)
    }

    /// Output directory of a module.
    pub fn module_bundle_dir(&self, module_id: &str) -> PathBuf {
        self.bundles_dir.join(module_id)
    }

    /// Bundled script of a module.
    pub fn bundle_file(&self, module_id: &str) -> PathBuf {
        self.module_bundle_dir(module_id).join(BUNDLE_FILE_NAME)
    }

    /// Copied asset directory of a module.
    pub fn bundle_includes(&self, module_id: &str) -> PathBuf {
        self.module_bundle_dir(module_id).join(INCLUDES_DIR_NAME)
    }

    /// Path of the generated manifest.
    pub fn manifest_file(&self) -> PathBuf {
        self.bundles_dir.join(MANIFEST_FILE_NAME)
    }

    /// Path of the generated homepage.
    pub fn homepage_file(&self) -> PathBuf {
        self.bundles_dir.join(HOMEPAGE_FILE_NAME)
    }

    /// Remove every previous artifact and recreate the output directories.
    pub fn clean(&self) -> Result<()> {
        fs::delete_tree(&self.build_dir)?;
        fs::delete_tree(&self.bundles_dir)?;

        std::fs::create_dir_all(&self.build_dir)?;
        std::fs::create_dir_all(&self.bundles_dir)?;

        Ok(())
    }

    /// Remove the intermediate compiler output.
    pub fn remove_build_dir(&self) -> Result<()> {
        fs::delete_tree(&self.build_dir)
    }
}
