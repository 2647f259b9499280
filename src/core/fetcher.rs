//! Recipe acquisition boundary.
//!
//! [`RecipeFetcher`] is the seam to wherever recipes come from. The shipped
//! implementation is a local registry: a directory of recipe files named by
//! recipe ID. A remote registry plugs in behind the same trait.

use super::parser;
use super::types::ExecutableRecipe;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Extensions tried, in order, when resolving an ID to a file.
pub const RECIPE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Fetch a recipe document by ID.
pub trait RecipeFetcher {
    fn fetch(&self, id: &str) -> Result<ExecutableRecipe, String>;
}

/// A directory of `<id>.yaml` / `<id>.yml` / `<id>.json` recipe files.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the first existing file for `id`.
    pub fn locate(&self, id: &str) -> Result<PathBuf, String> {
        validate_id(id)?;
        RECIPE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", id, ext)))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                format!(
                    "recipe '{}' not found in {} (tried .yaml, .yml, .json)",
                    id,
                    self.root.display()
                )
            })
    }
}

impl RecipeFetcher for LocalRegistry {
    fn fetch(&self, id: &str) -> Result<ExecutableRecipe, String> {
        let path = self.locate(id)?;
        debug!(id, path = %path.display(), "loading recipe from local registry");
        parser::load_recipe_file(&path)
    }
}

/// IDs are relative names; nested IDs (`team/recipe`) are allowed.
fn validate_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("recipe ID must not be empty".to_string());
    }
    let escapes = Path::new(id)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(format!("invalid recipe ID '{}': must be a relative name", id));
    }
    Ok(())
}
