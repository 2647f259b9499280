//! Recipe file loading and structural validation.
//!
//! The serialization format is chosen strictly by file extension:
//! - `.yaml` / `.yml`: parsed to a JSON value first, then decoded
//! - `.json`: decoded directly
//!
//! Validation checks structure only (recipe present, parameters named).
//! Duplicate parameter names are legal; the last answer wins.

use super::resolver;
use super::types::ExecutableRecipe;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Load a recipe document from disk, picking the format by extension.
pub fn load_recipe_file(path: &Path) -> Result<ExecutableRecipe, String> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    // Reject before touching the file so the error names the real problem.
    if !matches!(ext.as_str(), "yaml" | "yml" | "json") {
        return Err(format!(
            "unsupported recipe file extension \"{}\": expected .yaml, .yml, or .json",
            if ext.is_empty() { String::new() } else { format!(".{}", ext) }
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read recipe file {}: {}", path.display(), e))?;

    match ext.as_str() {
        "json" => parse_recipe_json(&content),
        _ => parse_recipe_yaml(&content),
    }
}

/// Parse a recipe document from YAML.
pub fn parse_recipe_yaml(yaml: &str) -> Result<ExecutableRecipe, String> {
    // An empty YAML document is a recipe with nothing in it.
    if yaml.trim().is_empty() {
        return Ok(ExecutableRecipe::default());
    }
    let value: serde_json::Value = serde_yaml_ng::from_str(yaml)
        .map_err(|e| format!("failed to parse YAML recipe: {}", e))?;
    if value.is_null() {
        return Ok(ExecutableRecipe::default());
    }
    serde_json::from_value(value).map_err(|e| format!("invalid recipe: {}", e))
}

/// Parse a recipe document from JSON.
pub fn parse_recipe_json(json: &str) -> Result<ExecutableRecipe, String> {
    serde_json::from_str(json).map_err(|e| format!("failed to parse JSON recipe: {}", e))
}

/// Validate a parsed recipe document. Returns a list of errors (empty = valid).
pub fn validate_recipe(doc: &ExecutableRecipe) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(recipe) = doc.recipe.as_ref() else {
        errors.push(ValidationError {
            message: "recipe section is missing".to_string(),
        });
        return errors;
    };

    for source in resolver::user_input_sources(recipe) {
        for (idx, param) in source.source.entries.iter().enumerate() {
            if param.name.trim().is_empty() {
                errors.push(ValidationError {
                    message: format!("{}: parameter #{} has no name", source, idx + 1),
                });
            }
        }
    }

    errors
}
