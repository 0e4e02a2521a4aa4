//! Template acquisition, extraction and rendering
//!
//! This module provides:
//! - Archive retrieval from a remote repository, a local folder or a tarball
//! - Lazy extraction of one template's files from the shared archive
//! - Text/binary classification and dotfile path mapping
//! - Variable substitution and file writing
//! - Template manifest types and version compatibility checking

pub mod archive;
pub mod classify;
pub mod fetcher;
pub mod manifest;
pub mod packer;
pub mod paths;
pub mod render;
pub mod version;
pub mod writer;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub use archive::{list_templates, read_manifest, select_template, CollectedFile, MANIFEST_FILE};
pub use fetcher::{RemoteRepo, TemplateFetcher, TemplateSource};
pub use manifest::{PackageJson, TemplateManifest};
pub use render::{RenderContext, Renderer};
pub use version::check_compatibility;

/// Pack a local templates directory into a tarball the `Archive` source can read
pub fn build_archive(template_dir: &Path, output: &Path) -> Result<()> {
    if !template_dir.is_dir() {
        anyhow::bail!("Template directory not found: {}", template_dir.display());
    }

    println!("{}", "Packing templates...".cyan().bold());
    println!();

    let bytes = packer::pack_templates_dir(template_dir)
        .with_context(|| format!("Failed to pack {}", template_dir.display()))?;

    let names = list_templates(&bytes).context("Failed to read packed archive")?;
    if names.is_empty() {
        eprintln!(
            "{} No template folders found in {}",
            "Warning:".yellow(),
            template_dir.display()
        );
    }
    for name in &names {
        println!("  {} {}", "->".blue(), name);
    }

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!();
    println!(
        "{} {} template(s) into {} ({} bytes)",
        "Packed".green().bold(),
        names.len(),
        output.display(),
        bytes.len()
    );

    Ok(())
}
