//! Project generation pipeline
//!
//! fetch archive → select template files → render → write, one file at a
//! time in archive order. Nothing is written until the template is known to
//! exist in the archive.

use crate::error::{GenerateError, Result};
use crate::progress::ProgressReporter;
use crate::templates::archive::validate_template_name;
use crate::templates::{select_template, writer, RenderContext, Renderer, TemplateFetcher};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Options selected for a run; every field is visible to templates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectOptions {
    /// Template name, i.e. `templates/<stack>/` in the archive
    pub stack: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectOptions {
    pub fn new(stack: &str) -> Self {
        Self {
            stack: stack.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Add an extra template variable
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Fail unless `project_dir` is free to be created
pub async fn ensure_absent(project_dir: &Path) -> Result<()> {
    // An unreadable path is treated as taken
    let exists = fs::try_exists(project_dir).await.unwrap_or(true);
    if exists {
        return Err(GenerateError::DirectoryExists(project_dir.to_path_buf()));
    }
    Ok(())
}

/// Generates projects from a template source into a base directory
pub struct ProjectGenerator {
    fetcher: TemplateFetcher,
    base_dir: PathBuf,
}

impl ProjectGenerator {
    pub fn new(fetcher: TemplateFetcher, base_dir: PathBuf) -> Self {
        Self { fetcher, base_dir }
    }

    /// Directory a project named `project_name` is generated into
    pub fn project_dir(&self, project_name: &str) -> Result<PathBuf> {
        if project_name.trim().is_empty() {
            return Err(GenerateError::EmptyProjectName);
        }
        Ok(self.base_dir.join(project_name))
    }

    pub fn fetcher(&self) -> &TemplateFetcher {
        &self.fetcher
    }

    /// Fetch the archive and generate `project_name` from `options.stack`
    pub async fn generate(
        &self,
        project_name: &str,
        options: &ProjectOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let project_dir = self.project_dir(project_name)?;
        ensure_absent(&project_dir).await?;
        validate_template_name(&options.stack)?;

        let archive = self.fetcher.fetch_archive(reporter).await?;
        generate_from_archive(&archive, &project_dir, project_name, options, reporter).await
    }
}

/// Generate a project from already fetched archive bytes.
///
/// Errors after the project directory is created leave whatever was
/// already written in place.
pub async fn generate_from_archive(
    archive: &[u8],
    project_dir: &Path,
    project_name: &str,
    options: &ProjectOptions,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    ensure_absent(project_dir).await?;

    let files = select_template(archive, &options.stack)?;
    tracing::info!(
        stack = %options.stack,
        files = files.len(),
        dir = %project_dir.display(),
        "generating project"
    );

    fs::create_dir_all(project_dir)
        .await
        .map_err(|source| GenerateError::Write {
            path: project_dir.to_path_buf(),
            source,
        })?;

    let context = RenderContext::new(project_name, options);
    let renderer = Renderer::new();

    for file in &files {
        let content = renderer.render(file, &context)?;
        writer::write_file(project_dir, &file.relative_path, &content).await?;
        reporter.file_written(&file.relative_path);
    }

    Ok(())
}
