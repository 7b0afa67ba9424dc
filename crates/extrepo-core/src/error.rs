//! Error types for extrepo-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for extrepo-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in extrepo-core.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An external tool could not be found or launched.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// The compiler exited unsuccessfully.
    #[error("compilation failed: {message}")]
    Compilation { message: String },

    /// The bundler failed for a module.
    #[error("bundling failed for module {module}: {message}")]
    Bundle { module: String, message: String },

    /// Module metadata could not be resolved.
    #[error("metadata error for module {module}: {message}")]
    Metadata { module: String, message: String },

    /// The icon declared by a module is not among its copied assets.
    #[error("icon {icon} for module {module} not found at {}", path.display())]
    MissingIcon {
        module: String,
        icon: String,
        path: PathBuf,
    },

    /// The project descriptor or manifest is unusable.
    #[error("descriptor error at {}: {message}", path.display())]
    Descriptor { path: PathBuf, message: String },
}

impl Error {
    /// Render the error together with a recovery hint for the user.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::Toolchain(_) => Some(
                "make sure Node.js is installed and the project dependencies are present \
                 (npm install), or override the command via EXTREPO_COMPILER / \
                 EXTREPO_BUNDLER / EXTREPO_NODE",
            ),
            Error::Compilation { .. } => Some(
                "fix the compiler errors above, or unset EXTREPO_STRICT_COMPILE to bundle \
                 whatever output the compiler produced",
            ),
            Error::MissingIcon { .. } => {
                Some("place the icon file in the module's includes/ directory")
            }
            Error::Descriptor { .. } => Some("check that the file is valid JSON"),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}
