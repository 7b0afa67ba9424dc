//! Pipeline configuration.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::paths::ProjectDirs;

/// Environment variable overriding the compiler command.
pub const COMPILER_ENV: &str = "EXTREPO_COMPILER";

/// Environment variable overriding the bundler command.
pub const BUNDLER_ENV: &str = "EXTREPO_BUNDLER";

/// Environment variable overriding the Node.js command.
pub const NODE_ENV: &str = "EXTREPO_NODE";

/// Environment variable selecting [`CompileFailurePolicy::Abort`].
pub const STRICT_COMPILE_ENV: &str = "EXTREPO_STRICT_COMPILE";

/// CI-provided `owner/repo` string.
pub const GITHUB_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";

/// An external command: program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program to execute (looked up in PATH).
    pub program: String,

    /// Arguments placed before the phase-specific ones.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a command from a program and its leading arguments.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Parse a whitespace-separated command line. Returns `None` when empty.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Build a [`Command`] running in `cwd` with the extra arguments appended.
    pub fn command<I, S>(&self, cwd: &Path, extra: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(cwd)
            .args(&self.args)
            .args(extra);
        cmd
    }

    /// Human readable form for log messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// External tools used by the pipeline.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// TypeScript compiler.
    pub compiler: ToolCommand,

    /// JavaScript bundler.
    pub bundler: ToolCommand,

    /// JavaScript runtime used to read metadata from bundled modules.
    pub node: ToolCommand,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            compiler: ToolCommand::new("npx", &["tsc"]),
            bundler: ToolCommand::new("npx", &["browserify"]),
            node: ToolCommand::new("node", &[]),
        }
    }
}

impl ToolConfig {
    /// Defaults overridden by any `EXTREPO_*` command variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |var: &str, default: ToolCommand| {
            lookup(var)
                .as_deref()
                .and_then(ToolCommand::parse)
                .unwrap_or(default)
        };

        Self {
            compiler: pick(COMPILER_ENV, defaults.compiler),
            bundler: pick(BUNDLER_ENV, defaults.bundler),
            node: pick(NODE_ENV, defaults.node),
        }
    }
}

/// What to do when the compiler exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileFailurePolicy {
    /// Log a warning and bundle whatever output exists.
    #[default]
    Continue,
    /// Stop the pipeline.
    Abort,
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Project layout.
    pub dirs: ProjectDirs,

    /// External tools.
    pub tools: ToolConfig,

    /// Compiler failure handling.
    pub compile_policy: CompileFailurePolicy,

    /// `owner/repo` used to derive the homepage base URL.
    pub github_repository: Option<String>,
}

impl PipelineConfig {
    /// Configuration with default tools and no environment input.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dirs: ProjectDirs::from_root(root),
            tools: ToolConfig::default(),
            compile_policy: CompileFailurePolicy::default(),
            github_repository: None,
        }
    }

    /// Configuration for `root` read from the process environment.
    pub fn from_env(root: impl AsRef<Path>) -> Self {
        Self::from_lookup(root, |var| std::env::var(var).ok())
    }

    /// Configuration for `root` read through an arbitrary variable lookup.
    pub fn from_lookup(root: impl AsRef<Path>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let strict = lookup(STRICT_COMPILE_ENV)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            dirs: ProjectDirs::from_root(root),
            tools: ToolConfig::from_lookup(&lookup),
            compile_policy: if strict {
                CompileFailurePolicy::Abort
            } else {
                CompileFailurePolicy::Continue
            },
            github_repository: lookup(GITHUB_REPOSITORY_ENV).filter(|v| !v.trim().is_empty()),
        }
    }
}
