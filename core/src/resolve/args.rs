use crate::request::ThinkingLevel;

use super::model::ProviderModel;

pub const NO_SESSION_FLAG: &str = "--no-session";
pub const SESSION_FLAG: &str = "--session";
pub const SESSION_DIR_FLAG: &str = "--session-dir";

/// Agent flags for a non-interactive, JSON-streaming run.
///
/// The prompt is not included; the runner appends it as the last positional.
/// An empty tool set turns tools off instead of falling back to the agent's
/// defaults, so a task never gets more tools than its caller has.
pub fn build_agent_args(
    model: Option<&ProviderModel>,
    thinking: ThinkingLevel,
    active_tools: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = ["--mode", "json", "-p", NO_SESSION_FLAG, "--no-extensions"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    if let Some(m) = model {
        args.push("--provider".into());
        args.push(m.provider.clone());
        args.push("--model".into());
        args.push(m.model_id.clone());
    }

    args.push("--thinking".into());
    args.push(thinking.as_str().into());

    if active_tools.is_empty() {
        args.push("--no-tools".into());
    } else {
        args.push("--tools".into());
        args.push(active_tools.join(","));
    }

    args
}
