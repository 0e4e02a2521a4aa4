//! Variable substitution for template files

use super::archive::CollectedFile;
use crate::error::{GenerateError, Result};
use crate::generator::ProjectOptions;
use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Variables available to `{{ }}` expressions for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext(Value);

impl RenderContext {
    /// `projectName` plus every option field; option fields win on collision
    pub fn new(project_name: &str, options: &ProjectOptions) -> Self {
        let mut vars = Map::new();
        vars.insert(
            "projectName".to_string(),
            Value::String(project_name.to_string()),
        );
        vars.insert("stack".to_string(), Value::String(options.stack.clone()));
        vars.extend(options.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(Value::Object(vars))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Whether `text` holds both delimiter markers
fn has_markers(text: &str) -> bool {
    text.contains("{{") && text.contains("}}")
}

/// Renders collected files against a context
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Output is source code, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Final bytes for `file`.
    ///
    /// Binary files and marker-free text come back untouched. Text that is not
    /// valid UTF-8 is also passed through rather than lossily re-encoded.
    pub fn render<'a>(
        &self,
        file: &'a CollectedFile,
        context: &RenderContext,
    ) -> Result<Cow<'a, [u8]>> {
        if !file.is_text {
            return Ok(Cow::Borrowed(&file.content));
        }

        let text = match std::str::from_utf8(&file.content) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    path = %file.relative_path,
                    %err,
                    "text file is not valid UTF-8, copying verbatim"
                );
                return Ok(Cow::Borrowed(&file.content));
            }
        };

        if !has_markers(text) {
            return Ok(Cow::Borrowed(&file.content));
        }

        let rendered = self
            .handlebars
            .render_template(text, &context.0)
            .map_err(|source| GenerateError::Render {
                path: file.relative_path.clone(),
                source,
            })?;
        Ok(Cow::Owned(rendered.into_bytes()))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn text_file(path: &str, content: &str) -> CollectedFile {
        CollectedFile {
            relative_path: path.to_string(),
            content: content.as_bytes().to_vec(),
            is_text: true,
        }
    }

    fn context() -> RenderContext {
        RenderContext::new("myapp", &ProjectOptions::new("react"))
    }

    #[test]
    fn test_substitutes_known_variables() {
        let file = text_file("App.tsx", "Hello {{projectName}}");
        let out = Renderer::new().render(&file, &context()).unwrap();
        assert_eq!(out.as_ref(), b"Hello myapp");
    }

    #[test]
    fn test_unknown_variables_render_empty() {
        let file = text_file("a.md", "[{{missing}}] {{stack}}");
        let out = Renderer::new().render(&file, &context()).unwrap();
        assert_eq!(out.as_ref(), b"[] react");
    }

    #[test]
    fn test_no_markers_is_identity() {
        let content = "const a = { b: { c: 1 } };\n<div>&amp;</div>\n";
        let file = text_file("index.js", content);
        let out = Renderer::new().render(&file, &context()).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.as_ref(), content.as_bytes());
    }

    #[test]
    fn test_output_is_not_html_escaped() {
        let options = ProjectOptions::new("basic").with_option("title", "Tom & Jerry <3");
        let ctx = RenderContext::new("demo", &options);
        let file = text_file("index.html", "<h1>{{title}}</h1>");
        let out = Renderer::new().render(&file, &ctx).unwrap();
        assert_eq!(out.as_ref(), b"<h1>Tom & Jerry <3</h1>");
    }

    #[test]
    fn test_binary_is_passed_through() {
        let file = CollectedFile {
            relative_path: "logo.png".to_string(),
            content: vec![0x89, b'P', b'N', b'G', b'{', b'{', 0xff, b'}', b'}'],
            is_text: false,
        };
        let out = Renderer::new().render(&file, &context()).unwrap();
        assert_eq!(out.as_ref(), file.content.as_slice());
    }

    #[test]
    fn test_invalid_utf8_text_is_passed_through() {
        let file = CollectedFile {
            relative_path: "legacy.txt".to_string(),
            content: vec![b'{', b'{', b'x', b'}', b'}', 0xff, 0xfe],
            is_text: true,
        };
        let out = Renderer::new().render(&file, &context()).unwrap();
        assert_eq!(out.as_ref(), file.content.as_slice());
    }

    #[test]
    fn test_compile_error_names_the_file() {
        let file = text_file("broken.hbs", "{{#each items}} never closed");
        let err = Renderer::new().render(&file, &context()).unwrap_err();
        match err {
            GenerateError::Render { path, .. } => assert_eq!(path, "broken.hbs"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_options_override_project_name() {
        let mut extra = BTreeMap::new();
        extra.insert("projectName".to_string(), Value::from("override"));
        let options = ProjectOptions {
            stack: "basic".to_string(),
            extra,
        };
        let ctx = RenderContext::new("demo", &options);
        assert_eq!(ctx.get("projectName"), Some(&Value::from("override")));
        assert_eq!(ctx.get("stack"), Some(&Value::from("basic")));
    }
}
