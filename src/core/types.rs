//! Recipe context model — the serde schema of an OpenSDD recipe document.
//!
//! Documents follow the protobuf-JSON shape. A `from` object (and each item of
//! a combined source) names its source kind with exactly one key, e.g.
//! `{"user_input": {...}}` or `{"text": "..."}`. Both `snake_case` and
//! `lowerCamelCase` keys are accepted.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Answers collected from the operator, keyed by parameter name.
pub type AnswerMap = IndexMap<String, String>;

// ============================================================================
// Top-level recipe document
// ============================================================================

/// A recipe file as stored on disk or served by a registry.
///
/// Fields this tool does not interpret are kept in `extra` so the document can
/// be handed to the materializer unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutableRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,

    #[serde(default, alias = "entryPoint", skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<EntryPoint>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reusable, named unit of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Values the recipe needs before it can run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recipe {
    /// Name for display: `name`, falling back to `id`.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.id.is_empty() {
            &self.id
        } else {
            "<unnamed>"
        }
    }
}

/// Where the target tool should be launched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    #[serde(default, alias = "ideType", skip_serializing_if = "String::is_empty")]
    pub ide_type: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Context
// ============================================================================

/// Ordered set of requirements. Entries are processed in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub entries: Vec<ContextEntry>,
}

/// One requirement within a context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Workspace path the materializer writes this entry to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Source of the value; `None` when the `from` object sets no kind
    #[serde(default, with = "oneof", skip_serializing_if = "Option::is_none")]
    pub from: Option<ContextSource>,
}

/// The `from` oneof of a context entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSource {
    UserInput(UserInputSource),
    Combined(CombinedSource),
    /// Any other kind (`text`, `cmd`, ...). Opaque to input collection.
    Other(OpaqueSource),
}

/// A requirement composed of several sub-sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedSource {
    #[serde(default)]
    pub items: Vec<CombinedItem>,
}

/// One item of a combined source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedItem {
    #[serde(with = "oneof")]
    pub source: Option<ItemSource>,
}

/// The oneof of a combined item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSource {
    UserInput(UserInputSource),
    Other(OpaqueSource),
}

/// A source kind this tool does not interpret, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueSource {
    /// The key as written in the document
    pub kind: String,
    pub value: Value,
}

/// A requirement satisfied by asking the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInputSource {
    #[serde(default)]
    pub entries: Vec<UserInputParameter>,
}

/// One named question. `name` is the answer key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInputParameter {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl ContextSource {
    /// Source kind key (`user_input`, `combined`, or the key as written).
    pub fn kind(&self) -> &str {
        match self {
            Self::UserInput(_) => "user_input",
            Self::Combined(_) => "combined",
            Self::Other(o) => &o.kind,
        }
    }
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

// ============================================================================
// Oneof (de)serialization
// ============================================================================

/// A closed sum decoded from a single-key JSON object.
trait OneOf: Sized {
    /// Whether `kind` is a variant this sum decodes itself.
    fn is_known(kind: &str) -> bool;
    fn from_kind(kind: &str, value: Value) -> Result<Self, String>;
    fn serialize_entry<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error>;
}

impl OneOf for ContextSource {
    fn is_known(kind: &str) -> bool {
        matches!(snake_case(kind).as_str(), "user_input" | "combined")
    }

    fn from_kind(kind: &str, value: Value) -> Result<Self, String> {
        match snake_case(kind).as_str() {
            "user_input" => serde_json::from_value(value)
                .map(Self::UserInput)
                .map_err(|e| format!("invalid user_input source: {}", e)),
            "combined" => serde_json::from_value(value)
                .map(Self::Combined)
                .map_err(|e| format!("invalid combined source: {}", e)),
            _ => Ok(Self::Other(OpaqueSource {
                kind: kind.to_string(),
                value,
            })),
        }
    }

    fn serialize_entry<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            Self::UserInput(ui) => map.serialize_entry("user_input", ui),
            Self::Combined(c) => map.serialize_entry("combined", c),
            Self::Other(o) => map.serialize_entry(&o.kind, &o.value),
        }
    }
}

impl OneOf for ItemSource {
    fn is_known(kind: &str) -> bool {
        snake_case(kind) == "user_input"
    }

    fn from_kind(kind: &str, value: Value) -> Result<Self, String> {
        match snake_case(kind).as_str() {
            "user_input" => serde_json::from_value(value)
                .map(Self::UserInput)
                .map_err(|e| format!("invalid user_input item: {}", e)),
            _ => Ok(Self::Other(OpaqueSource {
                kind: kind.to_string(),
                value,
            })),
        }
    }

    fn serialize_entry<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            Self::UserInput(ui) => map.serialize_entry("user_input", ui),
            Self::Other(o) => map.serialize_entry(&o.kind, &o.value),
        }
    }
}

/// `userInput` -> `user_input`; snake_case keys pass through.
fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

mod oneof {
    use super::OneOf;
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::{SerializeMap, Serializer};
    use serde_json::{Map, Value};

    pub(super) fn serialize<S, T>(source: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: OneOf,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(source) = source {
            source.serialize_entry(&mut map)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: OneOf,
    {
        let fields: Option<Map<String, Value>> = Option::deserialize(deserializer)?;
        let Some(fields) = fields else {
            return Ok(None);
        };

        let (mut known, mut unknown): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .partition(|(k, _)| T::is_known(k));

        if known.len() > 1 {
            return Err(de::Error::custom(format!(
                "oneof already set: both '{}' and '{}' given",
                known[0].0, known[1].0
            )));
        }

        // Unrecognized siblings of a known kind are dropped. A lone
        // unrecognized key is kept opaque so it survives the hand-off.
        let (kind, value) = match (known.pop(), unknown.len()) {
            (Some(entry), _) => entry,
            (None, 1) => unknown.remove(0),
            (None, _) => return Ok(None),
        };

        T::from_kind(&kind, value).map(Some).map_err(de::Error::custom)
    }
}

// ============================================================================
// Hand-off
// ============================================================================

/// Everything the materializer needs: the collected answers and the recipe.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationContext<'a> {
    pub user_input: &'a AnswerMap,
    pub recipe: &'a ExecutableRecipe,
}

// ============================================================================
// Provenance events
// ============================================================================

/// How a resolution run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Event in the JSONL resolution log. Answer values are never recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    ResolutionStarted {
        run_id: String,
        recipe: String,
    },
    InputCollected {
        run_id: String,
        name: String,
        skipped: bool,
    },
    ResolutionFinished {
        run_id: String,
        collected: usize,
        outcome: ResolutionOutcome,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: ResolutionEvent,
}

// ============================================================================
// Tests
// ============================================================================
