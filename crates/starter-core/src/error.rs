//! Error types for the generation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a generation run.
///
/// Network and precondition failures happen before anything is written.
/// Render and write failures may leave a partially populated project
/// directory behind; callers are expected to clean it up.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Project name must not be empty")]
    EmptyProjectName,

    #[error("Invalid template name '{0}'")]
    InvalidTemplateName(String),

    #[error("Directory {} already exists!", .0.display())]
    DirectoryExists(PathBuf),

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch templates from {url}: HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Redirect from {url} has no Location header")]
    MissingLocation { url: String },

    #[error("Redirect target {url} redirected again to {location}")]
    TooManyRedirects { url: String, location: String },

    #[error("Timed out fetching templates from {url}")]
    Timeout { url: String },

    #[error("Failed to fetch templates from {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid redirect location '{location}'")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to read local templates from {}", .path.display())]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read template archive")]
    Archive(#[source] std::io::Error),

    #[error("Template archive contains unsafe path '{0}'")]
    UnsafePath(String),

    #[error("Template not found: no entries under '{namespace}'")]
    TemplateNotFound { namespace: String },

    #[error("Failed to parse template manifest '{path}'")]
    Manifest {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render template file '{path}'")]
    Render {
        path: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GenerateError>;
