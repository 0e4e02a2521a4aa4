//! Starter Core - Shared library for the starter project generator
//!
//! Given a project name and a stack (template name), this library downloads
//! an archive holding every template, extracts the files under
//! `templates/<stack>/`, renders `{{ }}` variables in text files and writes
//! the result into a fresh project directory.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Archive fetching, template selection, rendering, writing
//! - **Layer 2: Workflow Orchestration** - `ProductConfig` trait and `ProjectGenerator`
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use starter_core::{ProjectGenerator, ProjectOptions, SilentProgress, TemplateFetcher};
//!
//! let fetcher = TemplateFetcher::from_config(&MyConfig)?;
//! let generator = ProjectGenerator::new(fetcher, std::env::current_dir()?);
//! generator
//!     .generate("my-app", &ProjectOptions::new("node-express-prisma"), &SilentProgress)
//!     .await?;
//! ```

pub mod error;
pub mod generator;
pub mod product;
pub mod progress;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use error::GenerateError;
pub use generator::{generate_from_archive, ProjectGenerator, ProjectOptions};
pub use product::ProductConfig;
pub use progress::{ProgressReporter, SilentProgress};
pub use templates::{
    list_templates, read_manifest, select_template, CollectedFile, TemplateFetcher,
    TemplateManifest, TemplateSource,
};

#[cfg(feature = "tui")]
pub use tui::run;

/// CLI version - used for template compatibility checking
/// Each binary should define its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = "0.1.0";
