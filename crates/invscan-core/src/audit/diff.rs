use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Top-level keys of either value whose contents differ, compared deeply.
///
/// Anything that is not a JSON object contributes no keys.
pub fn changed_fields(old: Option<&Value>, new: Option<&Value>) -> BTreeSet<String> {
    let empty = Map::new();
    let old = old.and_then(Value::as_object).unwrap_or(&empty);
    let new = new.and_then(Value::as_object).unwrap_or(&empty);

    old.keys()
        .chain(new.keys())
        .filter(|key| old.get(key.as_str()) != new.get(key.as_str()))
        .cloned()
        .collect()
}
