use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Chain,
    Parallel,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Single, Mode::Chain, Mode::Parallel];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Chain => "chain",
            Mode::Parallel => "parallel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasoning effort forwarded to the agent with `--thinking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    Off,
    Minimal,
    Low,
    Medium,
    High,
    Xhigh,
}

impl ThinkingLevel {
    pub const ALL: [ThinkingLevel; 6] = [
        ThinkingLevel::Off,
        ThinkingLevel::Minimal,
        ThinkingLevel::Low,
        ThinkingLevel::Medium,
        ThinkingLevel::High,
        ThinkingLevel::Xhigh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThinkingLevel::Off => "off",
            ThinkingLevel::Minimal => "minimal",
            ThinkingLevel::Low => "low",
            ThinkingLevel::Medium => "medium",
            ThinkingLevel::High => "high",
            ThinkingLevel::Xhigh => "xhigh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for ThinkingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A thinking override as written in a request: a level, or `inherit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThinkingSetting {
    /// Use the caller's thinking level at resolution time.
    Inherit,
    Level(ThinkingLevel),
}

impl ThinkingSetting {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "inherit" {
            return Some(Self::Inherit);
        }
        ThinkingLevel::parse(s).map(Self::Level)
    }

    /// Every accepted spelling, in display order.
    pub fn accepted_values() -> Vec<&'static str> {
        let mut out: Vec<&'static str> = ThinkingLevel::ALL.iter().map(|l| l.as_str()).collect();
        out.push("inherit");
        out
    }
}

/// One prompt to run in its own agent subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWorkItem {
    pub prompt: String,
    pub skill: Option<String>,
    pub model: Option<String>,
    pub thinking: Option<ThinkingSetting>,
    pub fork: bool,
}

impl TaskWorkItem {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            skill: None,
            model: None,
            thinking: None,
            fork: true,
        }
    }

    /// Copy of this item with a different prompt (chain steps).
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }

    /// Label for reports: the skill name if any, else the prompt.
    pub fn label(&self) -> &str {
        match self.skill.as_deref() {
            Some(skill) => skill,
            None => &self.prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedParams {
    pub mode: Mode,
    /// Shared default model for items without their own override.
    pub model: Option<String>,
    /// Shared default thinking for items without their own override.
    pub thinking: Option<ThinkingSetting>,
    pub tasks: Vec<TaskWorkItem>,
}

impl NormalizedParams {
    pub fn any_fork(&self) -> bool {
        self.tasks.iter().any(|t| t.fork)
    }
}
