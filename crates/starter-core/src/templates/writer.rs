//! Persisting rendered files

use crate::error::{GenerateError, Result};
use std::path::Path;
use tokio::fs;

/// Write `content` to `root/relative_path`, creating parent directories.
///
/// An existing file at the destination is overwritten.
pub async fn write_file(root: &Path, relative_path: &str, content: &[u8]) -> Result<()> {
    let target_path = root.join(relative_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| GenerateError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    fs::write(&target_path, content)
        .await
        .map_err(|source| GenerateError::Write {
            path: target_path,
            source,
        })
}
