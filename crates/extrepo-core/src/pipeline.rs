//! Repository build orchestration.
//!
//! Runs the phases in order, each behind a join barrier:
//!
//! ```text
//! clean ──► compile ──► bundle (per module) ──► manifest (per module) ──► homepage
//! ```
//!
//! The intermediate build tree is removed once bundling ends, whether or not
//! compiling and bundling succeeded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::bundle::{self, BundledModule};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fanout::{FailedModule, PhaseOutcome, SkippedModule};
use crate::homepage;
use crate::manifest::{self, Manifest};
use crate::metadata::ProviderRegistry;
use crate::toolchain::{Bundler, CommandBundler, CommandCompiler, CompileStatus, Compiler};

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clean,
    Compile,
    Bundle,
    Manifest,
    Homepage,
}

impl Phase {
    /// Human readable phase name.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Clean => "Cleaning output",
            Phase::Compile => "Transpiling project",
            Phase::Bundle => "Bundling modules",
            Phase::Manifest => "Generating manifest",
            Phase::Homepage => "Generating homepage",
        }
    }
}

/// Progress notifications emitted while the pipeline runs.
pub trait PipelineCallback: Send + Sync {
    /// Called when a phase starts.
    fn on_phase_started(&self, phase: Phase);

    /// Called when a phase finishes.
    fn on_phase_completed(&self, phase: Phase, elapsed: Duration);

    /// Called for every module left out of a phase on purpose.
    fn on_module_skipped(&self, phase: Phase, skipped: &SkippedModule);

    /// Called for every module whose task failed.
    fn on_module_failed(&self, phase: Phase, failed: &FailedModule);
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// How long each phase took.
    pub timings: Vec<(Phase, Duration)>,

    /// Compiler result.
    pub compile_status: CompileStatus,

    /// Modules with a bundle on disk.
    pub bundled: Vec<BundledModule>,

    /// Modules skipped by any phase.
    pub skipped: Vec<(Phase, SkippedModule)>,

    /// Modules failed by any phase.
    pub failed: Vec<(Phase, FailedModule)>,

    /// Path of the written manifest.
    pub manifest_path: PathBuf,

    /// The written manifest.
    pub manifest: Manifest,

    /// Path of the written homepage, if one was rendered.
    pub homepage_path: Option<PathBuf>,
}

impl PipelineReport {
    /// Total time across phases.
    pub fn total_time(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

/// The repository build.
pub struct Pipeline {
    config: PipelineConfig,
    compiler: Box<dyn Compiler>,
    bundler: Box<dyn Bundler>,
    registry: ProviderRegistry,
    callback: Option<Arc<dyn PipelineCallback>>,
}

impl Pipeline {
    /// Pipeline using the configured external tools.
    pub fn new(config: PipelineConfig) -> Self {
        let compiler = CommandCompiler::new(config.tools.compiler.clone(), config.compile_policy);
        let bundler = CommandBundler::new(config.tools.bundler.clone(), config.dirs.root.clone());
        let registry = ProviderRegistry::with_defaults(config.tools.node.clone());

        Self {
            config,
            compiler: Box::new(compiler),
            bundler: Box::new(bundler),
            registry,
            callback: None,
        }
    }

    /// Replace the compiler.
    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    /// Replace the bundler.
    pub fn with_bundler(mut self, bundler: impl Bundler + 'static) -> Self {
        self.bundler = Box::new(bundler);
        self
    }

    /// Replace the metadata providers.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the progress callback.
    pub fn set_callback(&mut self, callback: impl PipelineCallback + 'static) {
        self.callback = Some(Arc::new(callback));
    }

    /// Run every phase.
    ///
    /// Per-module problems are reported, not returned. An `Err` means a whole
    /// phase could not complete.
    pub fn run(&self) -> Result<PipelineReport> {
        let dirs = &self.config.dirs;
        let mut timings = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        self.phase(Phase::Clean, &mut timings, || dirs.clean())?;

        let built = self.compile_and_bundle(&mut timings);
        let cleanup = dirs.remove_build_dir();
        let (compile_status, bundles) = built?;
        cleanup?;
        self.record(Phase::Bundle, bundles.skipped, bundles.failed, &mut skipped, &mut failed);

        let report = self.phase(Phase::Manifest, &mut timings, || {
            manifest::generate(dirs, &self.registry, Utc::now())
        })?;
        self.record(Phase::Manifest, report.skipped, report.failed, &mut skipped, &mut failed);

        let homepage_path = self.phase(Phase::Homepage, &mut timings, || {
            homepage::generate(
                dirs,
                &report.path,
                self.config.github_repository.as_deref(),
            )
        })?;

        Ok(PipelineReport {
            timings,
            compile_status,
            bundled: bundles.succeeded,
            skipped,
            failed,
            manifest_path: report.path,
            manifest: report.manifest,
            homepage_path,
        })
    }

    fn compile_and_bundle(
        &self,
        timings: &mut Vec<(Phase, Duration)>,
    ) -> Result<(CompileStatus, PhaseOutcome<BundledModule>)> {
        let dirs = &self.config.dirs;
        let compile_status =
            self.phase(Phase::Compile, timings, || self.compiler.compile(dirs))?;
        let bundles = self.phase(Phase::Bundle, timings, || {
            bundle::bundle_all(dirs, self.bundler.as_ref())
        })?;
        Ok((compile_status, bundles))
    }

    fn phase<T>(
        &self,
        phase: Phase,
        timings: &mut Vec<(Phase, Duration)>,
        body: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if let Some(ref callback) = self.callback {
            callback.on_phase_started(phase);
        }

        let start = Instant::now();
        let result = body();
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => tracing::info!("{} finished in {:.2?}", phase.label(), elapsed),
            Err(e) => tracing::error!("{} failed after {:.2?}: {}", phase.label(), elapsed, e),
        }
        timings.push((phase, elapsed));

        if result.is_ok() {
            if let Some(ref callback) = self.callback {
                callback.on_phase_completed(phase, elapsed);
            }
        }

        result
    }

    fn record(
        &self,
        phase: Phase,
        phase_skipped: Vec<SkippedModule>,
        phase_failed: Vec<FailedModule>,
        skipped: &mut Vec<(Phase, SkippedModule)>,
        failed: &mut Vec<(Phase, FailedModule)>,
    ) {
        for module in phase_skipped {
            if let Some(ref callback) = self.callback {
                callback.on_module_skipped(phase, &module);
            }
            skipped.push((phase, module));
        }
        for module in phase_failed {
            if let Some(ref callback) = self.callback {
                callback.on_module_failed(phase, &module);
            }
            failed.push((phase, module));
        }
    }
}
