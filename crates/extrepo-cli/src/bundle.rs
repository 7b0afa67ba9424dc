//! Bundle command implementation for extrepo CLI.
//!
//! Builds the repository rooted at the current working directory.

use std::time::Duration;

use extrepo_core::{
    CompileStatus, FailedModule, Phase, Pipeline, PipelineCallback, PipelineConfig, SkippedModule,
};

use crate::colors;

/// Prints pipeline progress to the terminal.
pub struct ProgressCallback {
    /// Whether to show skip reasons.
    verbose: bool,
}

impl ProgressCallback {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl PipelineCallback for ProgressCallback {
    fn on_phase_started(&self, phase: Phase) {
        println!("{}  ◆ {}{} ...", colors::BLUE, phase.label(), colors::RESET);
    }

    fn on_phase_completed(&self, _phase: Phase, elapsed: Duration) {
        println!(
            "{}    ✓{} {}({:.2}s){}",
            colors::GREEN,
            colors::RESET,
            colors::DIM,
            elapsed.as_secs_f64(),
            colors::RESET
        );
    }

    fn on_module_skipped(&self, _phase: Phase, skipped: &SkippedModule) {
        if self.verbose {
            println!(
                "{}    ⚠ Skipped {}:{} {}",
                colors::YELLOW,
                skipped.module,
                colors::RESET,
                skipped.reason
            );
        } else {
            println!(
                "{}    ⚠ Skipped {}{}",
                colors::YELLOW,
                skipped.module,
                colors::RESET
            );
        }
    }

    fn on_module_failed(&self, _phase: Phase, failed: &FailedModule) {
        eprintln!(
            "{}    ✗ {}:{} {}",
            colors::RED,
            failed.module,
            colors::RESET,
            failed.error
        );
    }
}

/// Build the repository in the current directory.
pub fn execute(verbose: bool) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config = PipelineConfig::from_env(&root);

    println!(
        "\n{}extrepo{} - Building repository in {}{}{}\n",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        root.display(),
        colors::RESET
    );

    let mut pipeline = Pipeline::new(config);
    pipeline.set_callback(ProgressCallback::new(verbose));

    let report = pipeline.run()?;

    if let CompileStatus::Degraded { message } = &report.compile_status {
        eprintln!(
            "{}Compiler reported errors; bundled the output it produced.{}",
            colors::YELLOW,
            colors::RESET
        );
        if verbose {
            eprintln!("{message}");
        }
    }

    // Summary
    println!("\n{}", "─".repeat(50));
    println!(
        "{}Published:{} {} modules",
        colors::GREEN,
        colors::RESET,
        report.manifest.sources.len()
    );
    if !report.skipped.is_empty() {
        println!(
            "{}Skipped:{} {}",
            colors::YELLOW,
            colors::RESET,
            report.skipped.len()
        );
    }
    if !report.failed.is_empty() {
        println!(
            "{}Failed:{} {}",
            colors::RED,
            colors::RESET,
            report.failed.len()
        );
    }
    println!(
        "{}Manifest:{} {}",
        colors::DIM,
        colors::RESET,
        report.manifest_path.display()
    );
    if let Some(homepage) = &report.homepage_path {
        println!(
            "{}Homepage:{} {}",
            colors::DIM,
            colors::RESET,
            homepage.display()
        );
    }
    println!(
        "{}Time:{} {:.2}s",
        colors::DIM,
        colors::RESET,
        report.total_time().as_secs_f64()
    );

    Ok(())
}
