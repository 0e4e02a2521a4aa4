//! Text/binary classification by file extension

/// Extensions whose content goes through the template renderer
const TEXT_EXTENSIONS: &[&str] = &[
    // Template engines
    "hbs", "handlebars", "mustache", "ejs",
    // Scripts
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "vue", "svelte", "py", "rb", "php",
    "sh", "bash",
    // Structured data
    "json", "jsonc", "yaml", "yml", "toml", "xml", "ini", "env", "prisma", "graphql", "gql", "sql",
    // Markup
    "md", "mdx", "txt", "html", "htm",
    // Styling
    "css", "scss", "sass", "less",
];

/// Extension of the final path segment, if any.
///
/// A leading dot does not start an extension, so `.gitignore` has none.
pub fn extension(path: &str) -> Option<&str> {
    let filename = path.rsplit('/').next().unwrap_or(path);
    match filename.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&filename[idx + 1..]),
    }
}

/// Whether the file at `path` should be treated as template-able text
pub fn is_text(path: &str) -> bool {
    extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
}
