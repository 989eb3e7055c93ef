use serde::Serialize;

use crate::error::TaskError;
use crate::request::{TaskWorkItem, ThinkingLevel, ThinkingSetting};

use super::args::build_agent_args;
use super::model::ProviderModel;

/// What an item falls back to when it does not override a setting.
#[derive(Debug, Clone, Copy)]
pub struct ResolveDefaults<'a> {
    /// Request-level `model`.
    pub model: Option<&'a str>,
    /// Request-level `thinking`.
    pub thinking: Option<ThinkingSetting>,
    /// Caller's thinking level right now; what `inherit` means.
    pub inherited_thinking: ThinkingLevel,
    /// Caller's current session model.
    pub session_model: Option<&'a ProviderModel>,
    /// Built-in tools currently active for the caller.
    pub active_tools: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTaskConfig {
    pub thinking: ThinkingLevel,
    pub args: Vec<String>,
    /// `provider/modelId`, or `None` when the agent picks its own default.
    pub model_label: Option<String>,
}

/// Resolve one item's effective model, thinking level and agent flags.
///
/// Model: item > request default > session model > none. A model string that is
/// present but malformed is an error, never a silent fall-through.
/// Thinking: item > request default > inherit.
pub fn resolve_task_config(
    item: &TaskWorkItem,
    defaults: &ResolveDefaults<'_>,
) -> Result<ResolvedTaskConfig, TaskError> {
    let model = match item.model.as_deref().or(defaults.model) {
        Some(raw) => Some(ProviderModel::parse(raw)?),
        None => defaults.session_model.cloned(),
    };

    let thinking = match item
        .thinking
        .or(defaults.thinking)
        .unwrap_or(ThinkingSetting::Inherit)
    {
        ThinkingSetting::Inherit => defaults.inherited_thinking,
        ThinkingSetting::Level(level) => level,
    };

    let args = build_agent_args(model.as_ref(), thinking, defaults.active_tools);

    Ok(ResolvedTaskConfig {
        thinking,
        args,
        model_label: model.map(|m| m.label()),
    })
}
