//! Core engine for building static extension repositories.
//!
//! This crate provides:
//! - Project layout and configuration
//! - Compiler and bundler invocation
//! - Concurrent per-module bundling
//! - Manifest generation from module metadata
//! - Static homepage rendering

pub mod bundle;
pub mod config;
pub mod error;
pub mod fanout;
pub mod fs;
pub mod homepage;
pub mod manifest;
pub mod metadata;
pub mod paths;
pub mod pipeline;
pub mod toolchain;

pub use config::{CompileFailurePolicy, PipelineConfig, ToolCommand, ToolConfig};
pub use error::{Error, Result};
pub use fanout::{FailedModule, ModuleOutcome, PhaseOutcome, SkippedModule};
pub use homepage::{ProjectDescriptor, RepositoryDescriptor, SourceListing};
pub use manifest::{Manifest, ManifestEntry};
pub use metadata::{MetadataProvider, ProviderRegistry, SourceInfo};
pub use paths::ProjectDirs;
pub use pipeline::{Phase, Pipeline, PipelineCallback, PipelineReport};
pub use toolchain::{Bundler, CompileStatus, Compiler};
