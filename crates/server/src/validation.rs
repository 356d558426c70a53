use bluf_common::{BlufError, Result};
use serde_json::Value;

/// Check that every named field is present and not null
///
/// `a|b` accepts either field. Values are not inspected further; empty
/// content is rejected later by the summarizer.
pub fn require_fields(body: &Value, fields: &[&str]) -> Result<()> {
    let object = body
        .as_object()
        .ok_or_else(|| BlufError::invalid_input("request body must be a JSON object"))?;

    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|spec| {
            !spec
                .split('|')
                .any(|name| object.get(name).is_some_and(|v| !v.is_null()))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BlufError::invalid_input(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )))
    }
}
