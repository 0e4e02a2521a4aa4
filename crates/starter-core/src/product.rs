//! Product configuration trait for CLI binaries
//!
//! A binary implements this trait to point the generator at its template
//! repository and to shape the messages shown around a run.

use crate::templates::TemplateManifest;

/// Configuration trait for CLI products
///
/// Each product defines:
/// - Product identity (name, display name)
/// - Where the template archive lives
/// - Environment variables that override those defaults
/// - Post-generation instructions
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Owner of the repository holding `templates/<name>/` folders
    fn template_owner(&self) -> &'static str;

    /// Repository holding `templates/<name>/` folders
    fn template_repo(&self) -> &'static str;

    /// Branch (or any ref) to download
    fn template_branch(&self) -> &'static str {
        "main"
    }

    /// Base URL of the repository hosting API
    fn api_base_url(&self) -> &'static str {
        "https://api.github.com"
    }

    /// Environment variable overriding the repository, as `owner/repo[@branch]`
    fn template_repo_env(&self) -> &'static str;

    /// Environment variable overriding the API base URL
    fn api_url_env(&self) -> &'static str;

    /// Environment variable holding an optional API token
    fn token_env(&self) -> &'static str {
        "GITHUB_TOKEN"
    }

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }

    /// Instructions printed after project creation
    fn next_steps(&self, project_name: &str, manifest: Option<&TemplateManifest>) -> Vec<String> {
        let mut steps = vec![format!("cd {}", project_name)];
        if let Some(manifest) = manifest {
            steps.extend(manifest.steps.iter().cloned());
        }
        steps
    }
}
