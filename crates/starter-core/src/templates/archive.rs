//! Template extraction from a gzip tarball holding every template
//!
//! The archive is decoded lazily: `tar` hands out one entry at a time and
//! skips over whatever content the previous entry left unread, so unrelated
//! entries are never buffered.

use super::classify;
use super::manifest::TemplateManifest;
use super::paths;
use crate::error::{GenerateError, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Component, Path};
use tar::{Archive, EntryType};

/// Reserved per-template manifest, never copied into the project
pub const MANIFEST_FILE: &str = "steps.json";

/// Path segments that are never copied
const IGNORED_SEGMENTS: &[&str] = &[".git", ".DS_Store"];

/// A template file selected from the archive, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Namespace-stripped path after the dotfile transform
    pub relative_path: String,
    pub content: Vec<u8>,
    pub is_text: bool,
}

/// Namespace prefix that scopes the archive to one template
pub fn namespace(template_name: &str) -> String {
    format!("templates/{}/", template_name)
}

/// A template name is a single path segment: not empty, no separators,
/// not `.` or `..`
pub fn validate_template_name(template_name: &str) -> Result<()> {
    let invalid = template_name.is_empty()
        || template_name == "."
        || template_name == ".."
        || template_name.contains(['/', '\\']);
    if invalid {
        return Err(GenerateError::InvalidTemplateName(template_name.to_string()));
    }
    Ok(())
}

fn open(bytes: &[u8]) -> Archive<GzDecoder<&[u8]>> {
    Archive::new(GzDecoder::new(bytes))
}

/// Return the part of `path` after the first occurrence of `namespace`
/// that starts on a segment boundary
fn strip_namespace<'a>(path: &'a str, namespace: &str) -> Option<&'a str> {
    path.match_indices(namespace)
        .find(|(idx, _)| *idx == 0 || path.as_bytes()[idx - 1] == b'/')
        .map(|(idx, _)| &path[idx + namespace.len()..])
}

fn is_ignored(relative_path: &str) -> bool {
    relative_path == MANIFEST_FILE
        || relative_path
            .split('/')
            .any(|segment| IGNORED_SEGMENTS.contains(&segment))
}

fn ensure_safe(relative_path: &str) -> Result<()> {
    let unsafe_component = Path::new(relative_path).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if unsafe_component {
        return Err(GenerateError::UnsafePath(relative_path.to_string()));
    }
    Ok(())
}

/// Entry path with directories always carrying a trailing slash
fn entry_path<R: Read>(entry: &tar::Entry<'_, R>) -> String {
    let mut path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
    if entry.header().entry_type().is_dir() && !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Collect every file belonging to `template_name`, in archive order.
///
/// Fails with [`GenerateError::TemplateNotFound`] when no entry at all sits
/// under the namespace. A template directory that exists but holds only
/// ignored entries yields an empty list.
pub fn select_template(bytes: &[u8], template_name: &str) -> Result<Vec<CollectedFile>> {
    validate_template_name(template_name)?;
    let namespace = namespace(template_name);
    let mut archive = open(bytes);
    let mut matched = false;
    let mut files = Vec::new();

    for entry in archive.entries().map_err(GenerateError::Archive)? {
        let mut entry = entry.map_err(GenerateError::Archive)?;
        let path = entry_path(&entry);

        let Some(relative) = strip_namespace(&path, &namespace) else {
            tracing::trace!(%path, "outside template namespace");
            continue;
        };
        matched = true;

        let entry_type = entry.header().entry_type();
        let is_dir = entry_type.is_dir() || relative.ends_with('/');
        if relative.is_empty() || is_dir || is_ignored(relative) {
            tracing::debug!(%path, "skipping template entry");
            continue;
        }
        if !(entry_type.is_file() || entry_type == EntryType::Continuous) {
            tracing::debug!(%path, ?entry_type, "skipping non-regular template entry");
            continue;
        }
        ensure_safe(relative)?;

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(GenerateError::Archive)?;

        let relative_path = paths::transform_path(relative);
        tracing::debug!(%relative_path, bytes = content.len(), "collected template file");
        files.push(CollectedFile {
            is_text: classify::is_text(relative),
            relative_path,
            content,
        });
    }

    if !matched {
        return Err(GenerateError::TemplateNotFound { namespace });
    }
    Ok(files)
}

/// Names of every template present in the archive, sorted
pub fn list_templates(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = open(bytes);
    let mut names = BTreeSet::new();

    for entry in archive.entries().map_err(GenerateError::Archive)? {
        let entry = entry.map_err(GenerateError::Archive)?;
        let path = entry_path(&entry);
        let segments: Vec<&str> = path.split('/').collect();

        if let Some(idx) = segments.iter().position(|s| *s == "templates") {
            // A name only counts when something (even a trailing slash) follows it
            if idx + 2 < segments.len() && !segments[idx + 1].is_empty() {
                names.insert(segments[idx + 1].to_string());
            }
        }
    }

    Ok(names.into_iter().collect())
}

/// Read and parse the template's manifest, if it ships one
pub fn read_manifest(bytes: &[u8], template_name: &str) -> Result<Option<TemplateManifest>> {
    validate_template_name(template_name)?;
    let namespace = namespace(template_name);
    let mut archive = open(bytes);

    for entry in archive.entries().map_err(GenerateError::Archive)? {
        let mut entry = entry.map_err(GenerateError::Archive)?;
        let path = entry_path(&entry);
        if strip_namespace(&path, &namespace) != Some(MANIFEST_FILE)
            || !entry.header().entry_type().is_file()
        {
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(GenerateError::Archive)?;
        let manifest = serde_json::from_slice(&content)
            .map_err(|source| GenerateError::Manifest { path, source })?;
        return Ok(Some(manifest));
    }

    Ok(None)
}
