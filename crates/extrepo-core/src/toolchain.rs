//! External tool invocation.
//!
//! The pipeline never transpiles or bundles JavaScript itself; it drives the
//! project's own toolchain through the [`Compiler`] and [`Bundler`] seams.

use std::path::{Path, PathBuf};
use std::process::Output;

use crate::config::{CompileFailurePolicy, ToolCommand};
use crate::error::{Error, Result};
use crate::paths::ProjectDirs;

/// Global name the bundled script exposes its exports under.
pub const STANDALONE_NAME: &str = "Sources";

/// Runtime API wrapper provided by the host app, left out of every bundle.
pub const IGNORED_RUNTIME_MODULE: &str =
    "./node_modules/paperback-extensions-common/dist/APIWrapper.js";

/// Libraries the host app provides at load time.
pub const EXTERNAL_LIBRARIES: [&str; 3] = ["axios", "cheerio", "fs"];

/// Outcome of a compiler run that did not fail hard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    /// The compiler exited successfully.
    Success,
    /// The compiler reported errors but the pipeline continues.
    Degraded { message: String },
}

/// Transpiles the project's module sources into the intermediate tree.
pub trait Compiler: Send + Sync {
    /// Compile `dirs.src_dir` into `dirs.build_dir`.
    fn compile(&self, dirs: &ProjectDirs) -> Result<CompileStatus>;
}

/// Produces a standalone script for one module.
pub trait Bundler: Send + Sync {
    /// Bundle `entry` of `module_id` into `output`.
    fn bundle(&self, module_id: &str, entry: &Path, output: &Path) -> Result<()>;
}

/// [`Compiler`] that shells out to a TypeScript-compatible compiler.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: ToolCommand,
    policy: CompileFailurePolicy,
}

impl CommandCompiler {
    /// Create a compiler driver.
    pub fn new(command: ToolCommand, policy: CompileFailurePolicy) -> Self {
        Self { command, policy }
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, dirs: &ProjectDirs) -> Result<CompileStatus> {
        resolve_program(&self.command)?;

        let out_dir = dirs.build_dir.to_string_lossy().into_owned();
        tracing::debug!("Running {} --outDir {}", self.command.display(), out_dir);

        let output = self
            .command
            .command(&dirs.root, ["--outDir", out_dir.as_str()])
            .output()
            .map_err(|e| {
                Error::Toolchain(format!("Failed to run {}: {}", self.command.display(), e))
            })?;

        if output.status.success() {
            return Ok(CompileStatus::Success);
        }

        let message = failure_message(&output);
        match self.policy {
            CompileFailurePolicy::Abort => Err(Error::Compilation { message }),
            CompileFailurePolicy::Continue => {
                tracing::warn!("Compiler reported errors, continuing with partial output");
                Ok(CompileStatus::Degraded { message })
            }
        }
    }
}

/// [`Bundler`] that shells out to browserify.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    command: ToolCommand,
    cwd: PathBuf,
}

impl CommandBundler {
    /// Create a bundler driver running in the project root.
    pub fn new(command: ToolCommand, project_root: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: project_root.into(),
        }
    }

    /// Arguments passed after the configured command.
    pub fn bundle_args(entry: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            entry.to_string_lossy().into_owned(),
            "--standalone".to_string(),
            STANDALONE_NAME.to_string(),
            "--ignore".to_string(),
            IGNORED_RUNTIME_MODULE.to_string(),
        ];
        for lib in EXTERNAL_LIBRARIES {
            args.push("--external".to_string());
            args.push(lib.to_string());
        }
        args.push("--outfile".to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl Bundler for CommandBundler {
    fn bundle(&self, module_id: &str, entry: &Path, output: &Path) -> Result<()> {
        resolve_program(&self.command)?;

        let result = self
            .command
            .command(&self.cwd, Self::bundle_args(entry, output))
            .output()
            .map_err(|e| Error::Bundle {
                module: module_id.to_string(),
                message: format!("Failed to run {}: {}", self.command.display(), e),
            })?;

        if !result.status.success() {
            return Err(Error::Bundle {
                module: module_id.to_string(),
                message: failure_message(&result),
            });
        }

        Ok(())
    }
}

/// Make sure a command's program can be launched.
pub fn resolve_program(command: &ToolCommand) -> Result<PathBuf> {
    which::which(&command.program)
        .map_err(|_| Error::Toolchain(format!("{} not found in PATH", command.program)))
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    // tsc reports diagnostics on stdout.
    let detail = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };

    if detail.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}:\n{}", output.status, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundle_args() {
        let args = CommandBundler::bundle_args(
            Path::new("/b/Alpha/Alpha.js"),
            Path::new("/out/Alpha/source.js"),
        );

        assert_eq!(args[0], "/b/Alpha/Alpha.js");
        assert_eq!(args[1..3], ["--standalone", "Sources"]);
        assert_eq!(args[3..5], ["--ignore", IGNORED_RUNTIME_MODULE]);
        assert_eq!(
            args.iter().filter(|a| a.as_str() == "--external").count(),
            EXTERNAL_LIBRARIES.len()
        );
        assert_eq!(args[args.len() - 2..], ["--outfile", "/out/Alpha/source.js"]);
    }

    #[test]
    fn test_missing_program() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());
        let compiler = CommandCompiler::new(
            ToolCommand::new("extrepo-no-such-compiler", &[]),
            CompileFailurePolicy::Continue,
        );

        let err = compiler.compile(&dirs).unwrap_err();
        assert!(matches!(err, Error::Toolchain(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_policy() {
        let temp = TempDir::new().unwrap();
        let dirs = ProjectDirs::from_root(temp.path());

        let lenient = CommandCompiler::new(
            ToolCommand::new("false", &[]),
            CompileFailurePolicy::Continue,
        );
        assert!(matches!(
            lenient.compile(&dirs),
            Ok(CompileStatus::Degraded { .. })
        ));

        let strict = CommandCompiler::new(
            ToolCommand::new("false", &[]),
            CompileFailurePolicy::Abort,
        );
        assert!(matches!(
            strict.compile(&dirs),
            Err(Error::Compilation { .. })
        ));

        let ok = CommandCompiler::new(ToolCommand::new("true", &[]), CompileFailurePolicy::Abort);
        assert_eq!(ok.compile(&dirs).unwrap(), CompileStatus::Success);
    }
}
