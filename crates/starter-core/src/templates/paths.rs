//! On-disk path mapping for template entries

/// Map a template-relative path to its on-disk relative path.
///
/// Top-level files named `_name` become dotfiles (`.name`), so hidden files
/// can live visibly in the template repository. Nested paths pass through
/// unchanged: `src/_env` stays `src/_env`.
pub fn transform_path(relative_path: &str) -> String {
    match relative_path.strip_prefix('_') {
        Some(rest) if !relative_path.contains('/') => format!(".{}", rest),
        _ => relative_path.to_string(),
    }
}
