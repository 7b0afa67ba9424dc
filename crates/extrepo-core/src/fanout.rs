//! Per-module fan-out with a join barrier.
//!
//! Runs one task per module on rayon's pool and waits for all of them.
//! A failing module never cancels its siblings; every module settles into
//! exactly one of the succeeded, skipped or failed lists.

use rayon::prelude::*;

use crate::error::Error;

/// Result of processing a single module.
#[derive(Debug)]
pub enum ModuleOutcome<T> {
    /// The module was processed.
    Done(T),
    /// The module was intentionally left out.
    Skipped(String),
}

/// A module that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    pub module: String,
    pub reason: String,
}

/// A module whose task returned an error.
#[derive(Debug)]
pub struct FailedModule {
    pub module: String,
    pub error: Error,
}

/// Settled results of one phase, in input order.
#[derive(Debug)]
pub struct PhaseOutcome<T> {
    pub succeeded: Vec<T>,
    pub skipped: Vec<SkippedModule>,
    pub failed: Vec<FailedModule>,
}

impl<T> Default for PhaseOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Run `task` for every module id concurrently and collect the outcomes.
pub fn run_modules<T, F>(modules: &[String], task: F) -> PhaseOutcome<T>
where
    T: Send,
    F: Fn(&str) -> Result<ModuleOutcome<T>, Error> + Sync,
{
    let results: Vec<(&String, Result<ModuleOutcome<T>, Error>)> = modules
        .par_iter()
        .map(|module| (module, task(module)))
        .collect();

    let mut outcome = PhaseOutcome::default();
    for (module, result) in results {
        match result {
            Ok(ModuleOutcome::Done(value)) => outcome.succeeded.push(value),
            Ok(ModuleOutcome::Skipped(reason)) => {
                tracing::warn!("Skipping {}: {}", module, reason);
                outcome.skipped.push(SkippedModule {
                    module: module.clone(),
                    reason,
                });
            }
            Err(error) => {
                tracing::warn!("Module {} failed: {}", module, error);
                outcome.failed.push(FailedModule {
                    module: module.clone(),
                    error,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_partitions_results() {
        let modules = ids(&["Alpha", "Beta", "Gamma", "Delta"]);

        let outcome = run_modules(&modules, |module| match module {
            "Beta" => Ok(ModuleOutcome::Skipped("no entry point".to_string())),
            "Gamma" => Err(Error::Metadata {
                module: module.to_string(),
                message: "boom".to_string(),
            }),
            _ => Ok(ModuleOutcome::Done(module.to_lowercase())),
        });

        assert_eq!(outcome.succeeded, ["alpha", "delta"]);
        assert_eq!(outcome.skipped[0].module, "Beta");
        assert_eq!(outcome.failed[0].module, "Gamma");
    }

    #[test]
    fn test_preserves_input_order() {
        let modules: Vec<String> = (0..64).map(|i| format!("m{i:02}")).collect();

        let outcome = run_modules(&modules, |module| {
            // Uneven work so tasks finish out of order.
            let n: u64 = module[1..].parse().unwrap();
            std::thread::sleep(std::time::Duration::from_micros((64 - n) * 50));
            Ok(ModuleOutcome::Done(module.to_string()))
        });

        assert_eq!(outcome.succeeded, modules);
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let outcome: PhaseOutcome<()> = run_modules(&[], |_| Ok(ModuleOutcome::Done(())));
        assert!(outcome.succeeded.is_empty());
        assert!(outcome.skipped.is_empty() && outcome.failed.is_empty());
    }
}
