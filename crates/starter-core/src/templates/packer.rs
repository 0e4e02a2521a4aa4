//! Building gzip tarballs in memory
//!
//! Used to pack local template folders into the same archive shape that the
//! remote source serves, so both go through one extraction path.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io;
use std::path::Path;
use tar::{Builder, EntryType, Header};
use walkdir::WalkDir;

/// Root segment used for locally packed archives, mirroring the
/// `<owner>-<repo>-<sha>/` root of a remote tarball
pub const LOCAL_ROOT: &str = "local";

/// Incremental gzip tarball writer
pub struct TarballBuilder {
    builder: Builder<GzEncoder<Vec<u8>>>,
}

impl TarballBuilder {
    pub fn new() -> Self {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        Self {
            builder: Builder::new(encoder),
        }
    }

    /// Append a regular file entry
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> io::Result<()> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        self.builder.append_data(&mut header, path, content)
    }

    /// Append a directory entry
    pub fn add_dir(&mut self, path: &str) -> io::Result<()> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_mtime(0);
        let path = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        self.builder.append_data(&mut header, path, io::empty())
    }

    /// Finish the archive and return the compressed bytes
    pub fn finish(self) -> io::Result<Vec<u8>> {
        self.builder.into_inner()?.finish()
    }
}

impl Default for TarballBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack a local templates directory (`<dir>/<name>/...`) into a tarball
/// rooted at `local/templates/`
pub fn pack_templates_dir(templates_dir: &Path) -> io::Result<Vec<u8>> {
    let mut tarball = TarballBuilder::new();
    let base = format!("{}/templates", LOCAL_ROOT);

    // Sorted so the packed output is reproducible
    for entry in WalkDir::new(templates_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(templates_dir)
            .map_err(io::Error::other)?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let archive_path = format!("{}/{}", base, relative);

        if entry.file_type().is_dir() {
            tarball.add_dir(&archive_path)?;
        } else if entry.file_type().is_file() {
            let content = std::fs::read(entry.path())?;
            tarball.add_file(&archive_path, &content)?;
        }
    }

    tarball.finish()
}
