use serde_json::{Map, Value};

use crate::error::TaskError;

use super::types::{Mode, NormalizedParams, TaskWorkItem, ThinkingSetting};

/// Validate an untyped request into typed, mode-tagged work items.
///
/// The first violation wins; nothing is collected from a request that fails.
pub fn normalize_params(
    raw: &Value,
    max_parallel_tasks: usize,
) -> Result<NormalizedParams, TaskError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| invalid("Request must be a JSON object"))?;

    let mode = match obj.get("type") {
        Some(Value::String(s)) => Mode::parse(s).ok_or_else(|| {
            invalid(format!(
                "Invalid type \"{s}\": expected one of single, chain, parallel"
            ))
        })?,
        Some(_) => return Err(invalid("`type` must be a string")),
        None => {
            return Err(invalid(
                "Missing `type`: expected one of single, chain, parallel",
            ))
        }
    };

    let raw_tasks = match obj.get("tasks") {
        Some(Value::Array(items)) => items,
        _ => return Err(invalid("`tasks` must be an array")),
    };

    check_task_count(mode, raw_tasks.len(), max_parallel_tasks)?;

    let model = optional_string(obj, "model").map_err(invalid)?;
    let thinking = optional_thinking(obj).map_err(invalid)?;

    let tasks = raw_tasks
        .iter()
        .enumerate()
        .map(|(i, item)| {
            normalize_item(item).map_err(|msg| invalid(format!("Task {}: {msg}", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedParams {
        mode,
        model,
        thinking,
        tasks,
    })
}

fn invalid(msg: impl Into<String>) -> TaskError {
    TaskError::Validation(msg.into())
}

fn check_task_count(mode: Mode, count: usize, max: usize) -> Result<(), TaskError> {
    match mode {
        Mode::Single if count != 1 => Err(invalid(format!(
            "Single mode requires exactly 1 task, got {count}"
        ))),
        Mode::Chain | Mode::Parallel if count == 0 || count > max => {
            let name = if mode == Mode::Chain { "Chain" } else { "Parallel" };
            Err(invalid(format!(
                "{name} mode requires between 1 and {max} tasks, got {count}"
            )))
        }
        _ => Ok(()),
    }
}

fn normalize_item(item: &Value) -> Result<TaskWorkItem, String> {
    let obj = item.as_object().ok_or("must be an object")?;

    let prompt = optional_string(obj, "prompt")?.unwrap_or_default();
    let skill = optional_string(obj, "skill")?.filter(|s| !s.trim().is_empty());
    if prompt.trim().is_empty() && skill.is_none() {
        return Err("requires a non-empty `prompt` or `skill`".to_string());
    }

    let model = optional_string(obj, "model")?;
    let thinking = optional_thinking(obj)?;

    let fork = match obj.get("fork") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err("`fork` must be a boolean".to_string()),
    };

    Ok(TaskWorkItem {
        prompt,
        skill,
        model,
        thinking,
        fork,
    })
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("`{key}` must be a string")),
    }
}

fn optional_thinking(obj: &Map<String, Value>) -> Result<Option<ThinkingSetting>, String> {
    let Some(raw) = optional_string(obj, "thinking")? else {
        return Ok(None);
    };
    ThinkingSetting::parse(&raw).map(Some).ok_or_else(|| {
        format!(
            "invalid thinking \"{raw}\" (expected one of {})",
            ThinkingSetting::accepted_values().join(", ")
        )
    })
}
