//! Charm-style CLI prompts using cliclack

use crate::generator::{self, ProjectGenerator, ProjectOptions};
use crate::product::ProductConfig;
use crate::progress::{format_bytes, CountingProgress, ProgressReporter};
use crate::templates::{
    self, version, writer, PackageJson, TemplateFetcher, TemplateManifest, MANIFEST_FILE,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Name of the project directory to create
    pub project_name: String,

    /// Local directory to use for templates instead of fetching from remote
    pub template_dir: Option<PathBuf>,

    /// Prebuilt template tarball to use instead of fetching from remote
    pub archive: Option<PathBuf>,

    /// Stack (template name) to use
    pub stack: Option<String>,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Spinner-backed progress for the download and write stages
struct SpinnerProgress<'a> {
    spinner: &'a cliclack::ProgressBar,
    counter: CountingProgress,
}

impl<'a> SpinnerProgress<'a> {
    fn new(spinner: &'a cliclack::ProgressBar) -> Self {
        Self {
            spinner,
            counter: CountingProgress::new(),
        }
    }
}

impl ProgressReporter for SpinnerProgress<'_> {
    fn downloaded(&self, total_bytes: u64) {
        self.counter.downloaded(total_bytes);
        self.spinner.set_message(format!(
            "Downloading templates... {}",
            format_bytes(total_bytes)
        ));
    }

    fn file_written(&self, relative_path: &str) {
        self.counter.file_written(relative_path);
        self.spinner.set_message(format!("Writing {}", relative_path));
    }
}

/// Run the CLI with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: CreateArgs, cli_version: &str) -> Result<()> {
    cliclack::intro(config.display_name())?;

    // Step 1: Refuse to touch an existing directory before any network activity
    let base_dir = std::env::current_dir().context("Failed to resolve current directory")?;
    let generator = ProjectGenerator::new(setup_fetcher(config, &args)?, base_dir);
    let project_dir = generator.project_dir(&args.project_name)?;
    generator::ensure_absent(&project_dir).await?;
    cliclack::log::info(format!("Creating project: {}", args.project_name))?;

    // Step 2: Download the template archive
    let archive = download_templates(generator.fetcher()).await?;

    // Step 3: Select stack
    let stack = select_stack(&archive, args.stack.as_deref(), args.yes)?;

    // Step 4: Load the manifest before anything is written; package.json depends on it
    let manifest = load_manifest(&archive, &stack)?;
    if let Some(warning) = manifest
        .as_ref()
        .and_then(|m| m.version.as_deref())
        .and_then(|v| version::check_compatibility(cli_version, v, config.upgrade_command()))
    {
        cliclack::log::warning(format!(
            "Version warning: {}",
            warning.lines().next().unwrap_or(&warning)
        ))?;
    }

    // Step 5: Create project
    let options = ProjectOptions::new(&stack);
    create_project(
        &archive,
        &project_dir,
        &args.project_name,
        &options,
        manifest.as_ref(),
    )
    .await?;

    // Step 6: Show next steps
    print_next_steps(config, &args.project_name, manifest.as_ref())?;

    Ok(())
}

fn setup_fetcher<C: ProductConfig>(config: &C, args: &CreateArgs) -> Result<TemplateFetcher> {
    let fetcher = match (&args.template_dir, &args.archive) {
        (Some(path), _) => {
            cliclack::log::info(format!("Using local templates from {}", path.display()))?;
            TemplateFetcher::from_local(path.clone(), config.user_agent())?
        }
        (None, Some(path)) => {
            cliclack::log::info(format!("Using template archive {}", path.display()))?;
            TemplateFetcher::new(
                templates::TemplateSource::archive(path.clone()),
                config.user_agent(),
            )?
        }
        (None, None) => {
            cliclack::log::info("Using remote templates")?;
            TemplateFetcher::from_config(config)?
        }
    };

    Ok(fetcher)
}

async fn download_templates(fetcher: &TemplateFetcher) -> Result<Vec<u8>> {
    let spinner = cliclack::spinner();
    spinner.start("Downloading templates...");

    let progress = SpinnerProgress::new(&spinner);
    match fetcher.fetch_archive(&progress).await {
        Ok(archive) => {
            spinner.stop(format!(
                "Templates downloaded ({})",
                format_bytes(progress.counter.bytes())
            ));
            Ok(archive)
        }
        Err(e) => {
            spinner.stop("Failed to download templates");
            Err(e.into())
        }
    }
}

/// Human-readable stack name: `node-express-prisma` → `Node + Express + Prisma`
pub fn stack_display_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

fn select_stack(archive: &[u8], specified: Option<&str>, yes: bool) -> Result<String> {
    let available = templates::list_templates(archive).context("Failed to read templates")?;

    // If a stack was specified via --stack flag, use it directly
    if let Some(stack) = specified {
        if !available.iter().any(|name| name == stack) {
            anyhow::bail!(
                "Template '{}' not found. Available templates: {}",
                stack,
                available.join(", ")
            );
        }
        cliclack::log::info(format!("Stack: {}", stack_display_name(stack)))?;
        return Ok(stack.to_string());
    }

    let Some(first) = available.first() else {
        anyhow::bail!("No templates found.");
    };

    // If only one template (or non-interactive), use it automatically
    if available.len() == 1 || yes {
        cliclack::log::info(format!("Using stack: {}", stack_display_name(first)))?;
        return Ok(first.clone());
    }

    let mut select = cliclack::select("Select your stack:");
    for name in &available {
        select = select.item(name.clone(), stack_display_name(name), name);
    }

    Ok(select.interact()?)
}

/// A missing manifest is fine; an unreadable one is fatal
fn load_manifest(archive: &[u8], stack: &str) -> Result<Option<TemplateManifest>> {
    templates::read_manifest(archive, stack)
        .with_context(|| format!("Template '{}' has an invalid {}", stack, MANIFEST_FILE))
}

/// Write package.json when the manifest declares scripts or dependencies
async fn write_package_json(
    project_dir: &Path,
    project_name: &str,
    manifest: Option<&TemplateManifest>,
) -> Result<bool> {
    let Some(manifest) = manifest.filter(|m| m.declares_package()) else {
        return Ok(false);
    };

    let package = PackageJson::new(project_name, manifest)
        .to_pretty_json()
        .context("Failed to serialize package.json")?;
    writer::write_file(project_dir, "package.json", package.as_bytes()).await?;
    Ok(true)
}

async fn create_project(
    archive: &[u8],
    project_dir: &Path,
    project_name: &str,
    options: &ProjectOptions,
    manifest: Option<&TemplateManifest>,
) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Creating project...");

    let progress = SpinnerProgress::new(&spinner);
    let result =
        generator::generate_from_archive(archive, project_dir, project_name, options, &progress)
            .await;

    if let Err(e) = result {
        spinner.stop("Failed creating project");
        if project_dir.exists() {
            cliclack::log::warning(format!(
                "{} may be incomplete; remove it before retrying",
                project_dir.display()
            ))?;
        }
        return Err(e.into());
    }

    let mut created = progress.counter.files();
    match write_package_json(project_dir, project_name, manifest).await {
        Ok(true) => created += 1,
        Ok(false) => {}
        Err(e) => {
            spinner.stop("Failed creating project");
            return Err(e);
        }
    }

    spinner.stop(format!(
        "Created {} files in {}",
        created,
        project_dir.display()
    ));

    Ok(())
}

fn print_next_steps<C: ProductConfig>(
    config: &C,
    project_name: &str,
    manifest: Option<&TemplateManifest>,
) -> Result<()> {
    let steps = config.next_steps(project_name, manifest);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::packer::TarballBuilder;

    fn archive_with_manifest(manifest: &str) -> Vec<u8> {
        let mut builder = TarballBuilder::new();
        builder
            .add_file("r/templates/api/index.js", b"require('express')")
            .unwrap();
        builder
            .add_file("r/templates/api/steps.json", manifest.as_bytes())
            .unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn test_malformed_manifest_stops_the_run() {
        let archive =
            archive_with_manifest(r#"{"scripts":{"dev":"node ."},"dependencies":{"express":"^4"},}"#);

        let err = load_manifest(&archive, "api").unwrap_err();
        assert!(err.to_string().contains("steps.json"));
    }

    #[tokio::test]
    async fn test_declared_package_is_written() {
        let archive =
            archive_with_manifest(r#"{"scripts":{"dev":"node ."},"dependencies":{"express":"^4"}}"#);
        let manifest = load_manifest(&archive, "api").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let written = write_package_json(dir.path(), "svc", manifest.as_ref())
            .await
            .unwrap();

        assert!(written);
        let package: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("package.json")).unwrap())
                .unwrap();
        assert_eq!(package["name"], "svc");
        assert_eq!(package["dependencies"]["express"], "^4");
    }

    #[tokio::test]
    async fn test_manifest_without_package_writes_nothing() {
        let archive = archive_with_manifest(r#"{"steps":["npm start"]}"#);
        let manifest = load_manifest(&archive, "api").unwrap();
        let dir = tempfile::tempdir().unwrap();

        assert!(!write_package_json(dir.path(), "svc", manifest.as_ref())
            .await
            .unwrap());
        assert!(!write_package_json(dir.path(), "svc", None).await.unwrap());
        assert!(!dir.path().join("package.json").exists());
    }

    #[test]
    fn test_stack_display_name() {
        assert_eq!(
            stack_display_name("node-express-prisma"),
            "Node + Express + Prisma"
        );
        assert_eq!(stack_display_name("react"), "React");
        assert_eq!(stack_display_name("vue--vite"), "Vue +  + Vite");
    }
}
