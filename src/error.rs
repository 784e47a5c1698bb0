//! Editor failure taxonomy.
//!
//! All failures are local and non-fatal: the editor keeps its in-memory state
//! and the user keeps working. Variants map 1:1 onto the ways the editor can
//! disappoint the user.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    /// A node type was requested that is not present in the catalog.
    DefinitionMissing(String),
    /// A wiring gesture ended on a disallowed anchor pairing.
    InvalidConnection { from: String, to: String },
    /// The progress stream errored other than a normal close.
    StreamFailure(String),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::DefinitionMissing(ty) => {
                write!(f, "no definition found for node type '{}'", ty)
            }
            EditorError::InvalidConnection { from, to } => {
                write!(f, "invalid connection: {} -> {}", from, to)
            }
            EditorError::StreamFailure(msg) => write!(f, "progress stream error: {}", msg),
        }
    }
}

impl std::error::Error for EditorError {}

#[cfg(target_arch = "wasm32")]
impl From<EditorError> for wasm_bindgen::JsValue {
    fn from(err: EditorError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
