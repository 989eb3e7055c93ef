use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::{TaskWorkItem, ThinkingLevel};

/// Exit code of a task that has not started.
pub const EXIT_PENDING: i32 = -2;
/// Exit code of a task whose process is live.
pub const EXIT_RUNNING: i32 = -1;

const STOP_ERROR: &str = "error";
const STOP_ABORTED: &str = "aborted";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Signal {
    Kill,
    Term,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub exit_code: i32,
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageRole {
    Assistant,
    User,
    ToolResult,
}

/// Cost is reported either as `{ "total": x }` or as a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageCost {
    Breakdown {
        #[serde(default)]
        total: f64,
    },
    Total(f64),
}

impl MessageCost {
    pub fn total(&self) -> f64 {
        match self {
            MessageCost::Breakdown { total } | MessageCost::Total(total) => *total,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub cache_read: u64,
    #[serde(default)]
    pub cache_write: u64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub cost: Option<MessageCost>,
}

impl MessageUsage {
    pub fn context_tokens(&self) -> u64 {
        self.total_tokens
            .unwrap_or(self.input + self.output + self.cache_read + self.cache_write)
    }
}

/// A completed message from the agent's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<MessageUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AgentMessage {
    /// Text parts of the message body, joined with newlines.
    pub fn text(&self) -> String {
        let body = self
            .content
            .as_ref()
            .or(self.output.as_ref())
            .or(self.summary.as_ref());
        match body {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub cost: f64,
    /// Context size as of the latest assistant message.
    pub context_tokens: u64,
    pub turns: u32,
}

impl UsageStats {
    pub fn add(&mut self, other: &UsageStats) {
        self.input += other.input;
        self.output += other.output;
        self.cache_read += other.cache_read;
        self.cache_write += other.cache_write;
        self.cost += other.cost;
        self.context_tokens += other.context_tokens;
        self.turns += other.turns;
    }

    /// Fold one assistant turn into the running totals.
    pub fn record_turn(&mut self, usage: Option<&MessageUsage>) {
        self.turns += 1;
        let Some(u) = usage else {
            return;
        };
        self.input += u.input;
        self.output += u.output;
        self.cache_read += u.cache_read;
        self.cache_write += u.cache_write;
        self.cost += u.cost.map(|c| c.total()).unwrap_or(0.0);
        self.context_tokens = u.context_tokens();
    }
}

/// Final text of a task: the text of the last assistant message.
pub fn final_output(messages: &[AgentMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant)
        .map(AgentMessage::text)
        .unwrap_or_default()
}

/// Field-wise sum. Zero results give all-zero stats.
pub fn aggregate_usage(results: &[SingleResult]) -> UsageStats {
    results.iter().fold(UsageStats::default(), |mut acc, r| {
        acc.add(&r.usage);
        acc
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

/// Everything known about one task. `exit_code` carries the lifecycle:
/// [`EXIT_PENDING`], [`EXIT_RUNNING`], 0 for a clean exit, >0 for failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResult {
    pub index: usize,
    pub prompt: String,
    pub skill: Option<String>,
    pub exit_code: i32,
    pub messages: Vec<AgentMessage>,
    pub stderr: String,
    pub usage: UsageStats,
    pub model: Option<String>,
    pub thinking: Option<ThinkingLevel>,
    pub stop_reason: Option<String>,
    pub error_message: Option<String>,
}

impl SingleResult {
    pub fn pending(index: usize, item: &TaskWorkItem) -> Self {
        Self {
            index,
            prompt: item.prompt.clone(),
            skill: item.skill.clone(),
            exit_code: EXIT_PENDING,
            messages: Vec::new(),
            stderr: String::new(),
            usage: UsageStats::default(),
            model: None,
            thinking: None,
            stop_reason: None,
            error_message: None,
        }
    }

    pub fn state(&self) -> TaskState {
        match self.exit_code {
            EXIT_PENDING => TaskState::Pending,
            EXIT_RUNNING => TaskState::Running,
            0 if !self.stopped_abnormally() => TaskState::Done,
            _ => TaskState::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state(), TaskState::Done | TaskState::Failed)
    }

    pub fn is_failed(&self) -> bool {
        self.state() == TaskState::Failed
    }

    pub fn is_aborted(&self) -> bool {
        self.stop_reason.as_deref() == Some(STOP_ABORTED)
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.stop_reason = Some(STOP_ABORTED.to_string());
    }

    pub(crate) fn stopped_abnormally(&self) -> bool {
        matches!(self.stop_reason.as_deref(), Some(STOP_ERROR | STOP_ABORTED))
    }

    pub fn output(&self) -> String {
        final_output(&self.messages)
    }

    /// Best available explanation of a failure.
    pub fn error_text(&self) -> String {
        if let Some(msg) = self.error_message.as_deref().filter(|m| !m.trim().is_empty()) {
            return msg.trim().to_string();
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        if self.is_aborted() {
            return "Task was aborted".to_string();
        }
        let output = self.output();
        if !output.trim().is_empty() {
            return output.trim().to_string();
        }
        format!("exit code {}", self.exit_code)
    }
}
