//! Signature files.
//!
//! Scene and entity-type signatures are JSON objects flattened into dotted
//! string keys:
//!
//! ```json
//! { "attach": ["spatial", "kinematics/kinematic2d"],
//!   "x": { "_": 5, "speed": 2 } }
//! ```
//!
//! becomes `attach = "spatial kinematics/kinematic2d"`, `x = "5"` and
//! `x.speed = "2"`. The child key `_` carries the value of its parent key.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use engine_component::Signature;

use crate::error::SceneError;

/// Child key holding the value of the enclosing key itself.
pub const SELF_KEY: &str = "_";

/// Reads and flattens the signature file at `path`.
///
/// # Errors
///
/// [`SceneError`] when the file cannot be read, is not JSON, or its root is
/// not an object.
pub fn load(path: &Path) -> Result<Signature, SceneError> {
    let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let signature = parse(&text, path)?;
    debug!(path = %path.display(), keys = signature.len(), "signature loaded");
    Ok(signature)
}

/// Flattens a signature document. `path` is only used in errors.
///
/// # Errors
///
/// As [`load`], minus I/O.
pub fn parse(text: &str, path: &Path) -> Result<Signature, SceneError> {
    let root: Value = serde_json::from_str(text).map_err(|source| SceneError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !root.is_object() {
        return Err(SceneError::NotAnObject {
            path: path.to_path_buf(),
        });
    }
    let mut signature = Signature::new();
    flatten("", &root, &mut signature);
    Ok(signature)
}

fn flatten(prefix: &str, value: &Value, out: &mut Signature) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if key == SELF_KEY {
                    prefix.to_string()
                } else if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        _ if prefix.is_empty() => {
            debug!("top-level value without a key ignored");
        }
        _ => {
            out.insert(prefix, text(value));
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join(" "),
        Value::Object(_) => value.to_string(),
    }
}
