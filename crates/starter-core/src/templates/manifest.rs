//! Template manifest (`steps.json`) and package manifest types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-template manifest (templates/<name>/steps.json)
///
/// Every field is optional; a template may ship `{}` or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateManifest {
    /// Display name of the template
    #[serde(default)]
    pub name: Option<String>,

    /// Description of what the template provides
    #[serde(default)]
    pub description: Option<String>,

    /// Minimum CLI version the template was written for
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Instructions printed after the project is created
    #[serde(default)]
    pub steps: Vec<String>,
}

impl TemplateManifest {
    /// Whether the template asks for a generated package.json
    pub fn declares_package(&self) -> bool {
        !(self.scripts.is_empty()
            && self.dependencies.is_empty()
            && self.dev_dependencies.is_empty())
    }
}

/// Generated package.json for node-based templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    pub name: String,
    pub version: String,
    pub description: String,
    pub main: String,
    pub scripts: BTreeMap<String, String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    pub fn new(project_name: &str, manifest: &TemplateManifest) -> Self {
        Self {
            name: project_name.to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
            main: "index.js".to_string(),
            scripts: manifest.scripts.clone(),
            dependencies: manifest.dependencies.clone(),
            dev_dependencies: manifest.dev_dependencies.clone(),
        }
    }

    /// Serialize with two-space indentation
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
