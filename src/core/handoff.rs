//! Hand-off to the materializer: the generation context as JSON.

use super::types::{AnswerMap, EntryPoint, ExecutableRecipe, GenerationContext};
use std::path::Path;

/// Fill the entry point's IDE type from the command line when the recipe
/// leaves it empty. A recipe-declared IDE always wins.
pub fn apply_ide_default(doc: &mut ExecutableRecipe, ide: &str) {
    let entry_point = doc.entry_point.get_or_insert_with(EntryPoint::default);
    if entry_point.ide_type.is_empty() {
        entry_point.ide_type = ide.to_string();
    }
}

/// Render the generation context as pretty JSON.
pub fn render(answers: &AnswerMap, doc: &ExecutableRecipe) -> Result<String, String> {
    let ctx = GenerationContext {
        user_input: answers,
        recipe: doc,
    };
    serde_json::to_string_pretty(&ctx).map_err(|e| format!("JSON serialize error: {}", e))
}

/// Write the generation context atomically (temp file, then rename).
pub fn write(path: &Path, answers: &AnswerMap, doc: &ExecutableRecipe) -> Result<(), String> {
    let json = render(answers, doc)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json + "\n")
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}
