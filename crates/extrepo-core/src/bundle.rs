//! Per-module bundling.
//!
//! Turns every compiled module of the intermediate tree into
//! `bundles/<id>/source.js` and copies its assets next to it.

use std::path::PathBuf;

use crate::error::Result;
use crate::fanout::{self, ModuleOutcome, PhaseOutcome};
use crate::fs;
use crate::paths::{ProjectDirs, RESERVED_TESTS_DIR};
use crate::toolchain::Bundler;

/// A module that was bundled successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledModule {
    /// Module id.
    pub id: String,

    /// Path of the bundled script.
    pub script: PathBuf,

    /// Whether an `includes/` directory was copied.
    pub has_includes: bool,
}

/// Find the module ids present in the intermediate build tree.
pub fn discover_compiled_modules(dirs: &ProjectDirs) -> Result<Vec<String>> {
    let mut modules = Vec::new();
    for entry in fs::list_entries(&dirs.build_dir)? {
        if !entry.is_dir {
            tracing::debug!("Ignoring {} in build output: not a directory", entry.name);
            continue;
        }
        if entry.name == RESERVED_TESTS_DIR {
            continue;
        }
        modules.push(entry.name);
    }
    Ok(modules)
}

/// Bundle one module.
pub fn bundle_module(
    dirs: &ProjectDirs,
    bundler: &dyn Bundler,
    module_id: &str,
) -> Result<ModuleOutcome<BundledModule>> {
    let entry = dirs.compiled_entry(module_id);
    if !entry.is_file() {
        return Ok(ModuleOutcome::Skipped(format!(
            "no compiled entry point at {}",
            entry.display()
        )));
    }

    let dest = dirs.module_bundle_dir(module_id);
    std::fs::create_dir_all(&dest)?;

    let script = dirs.bundle_file(module_id);
    tracing::debug!("Bundling {} into {}", module_id, script.display());
    if let Err(e) = bundler.bundle(module_id, &entry, &script) {
        fs::delete_tree(&dest)?;
        return Err(e);
    }

    let includes = dirs.source_includes(module_id);
    let has_includes = includes.is_dir();
    fs::copy_tree(&includes, dirs.bundle_includes(module_id))?;

    Ok(ModuleOutcome::Done(BundledModule {
        id: module_id.to_string(),
        script,
        has_includes,
    }))
}

/// Bundle every compiled module concurrently.
pub fn bundle_all(dirs: &ProjectDirs, bundler: &dyn Bundler) -> Result<PhaseOutcome<BundledModule>> {
    let modules = discover_compiled_modules(dirs)?;
    tracing::info!("Bundling {} modules", modules.len());

    Ok(fanout::run_modules(&modules, |module| {
        bundle_module(dirs, bundler, module)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::path::Path;
    use tempfile::TempDir;

    /// Writes the entry point verbatim as the bundle.
    struct CopyBundler;

    impl Bundler for CopyBundler {
        fn bundle(&self, module_id: &str, entry: &Path, output: &Path) -> Result<()> {
            if module_id == "Broken" {
                return Err(Error::Bundle {
                    module: module_id.to_string(),
                    message: "syntax error".to_string(),
                });
            }
            std::fs::copy(entry, output)?;
            Ok(())
        }
    }

    fn compiled(dirs: &ProjectDirs, id: &str) {
        let entry = dirs.compiled_entry(id);
        std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
        std::fs::write(entry, format!("exports.{id} = {{}};")).unwrap();
    }

    #[test]
    fn test_discover_skips_files_and_tests() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());
        compiled(&dirs, "Alpha");
        std::fs::create_dir_all(dirs.build_dir.join("tests")).unwrap();
        std::fs::write(dirs.build_dir.join("index.js"), "").unwrap();

        assert_eq!(discover_compiled_modules(&dirs).unwrap(), ["Alpha"]);
    }

    #[test]
    fn test_bundle_all() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());

        compiled(&dirs, "Alpha");
        compiled(&dirs, "Broken");
        // Compiled directory without an entry point.
        std::fs::create_dir_all(dirs.build_dir.join("Empty")).unwrap();

        std::fs::create_dir_all(dirs.source_includes("Alpha")).unwrap();
        std::fs::write(dirs.source_includes("Alpha").join("icon.png"), "png").unwrap();

        let outcome = bundle_all(&dirs, &CopyBundler).unwrap();

        assert_eq!(outcome.succeeded.len(), 1);
        let alpha = &outcome.succeeded[0];
        assert_eq!(alpha.id, "Alpha");
        assert!(alpha.has_includes);
        assert!(alpha.script.exists());
        assert!(dirs.bundle_includes("Alpha").join("icon.png").exists());

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].module, "Empty");
        assert!(!dirs.module_bundle_dir("Empty").exists());

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].module, "Broken");
        assert!(!dirs.module_bundle_dir("Broken").exists());
    }

    #[test]
    fn test_module_without_includes() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());
        compiled(&dirs, "Bare");

        let outcome = bundle_module(&dirs, &CopyBundler, "Bare").unwrap();
        match outcome {
            ModuleOutcome::Done(module) => {
                assert!(!module.has_includes);
                assert!(!dirs.bundle_includes("Bare").exists());
            }
            ModuleOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }
}
