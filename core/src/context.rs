use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::request::ThinkingLevel;
use crate::resolve::ProviderModel;
use crate::runner::{AbortSignal, RunnerPlugin};
use crate::skills::SkillCatalog;

/// Everything one top-level call needs from its caller.
///
/// Built fresh per call: the skill body cache and the abort signal are scoped
/// to that call.
pub struct ExecutionContext {
    pub runner: Arc<dyn RunnerPlugin>,
    pub config: RunnerConfig,
    pub skills: SkillCatalog,
    pub skill_list_limit: usize,
    /// The caller's persisted session log, copied for forked tasks.
    pub session_file: Option<PathBuf>,
    pub session_model: Option<ProviderModel>,
    pub active_tools: Vec<String>,
    pub inherited_thinking: ThinkingLevel,
    pub cwd: Option<PathBuf>,
    pub abort: AbortSignal,
}

impl ExecutionContext {
    pub fn new(runner: Arc<dyn RunnerPlugin>, config: RunnerConfig) -> Self {
        Self {
            runner,
            config,
            skills: SkillCatalog::default(),
            skill_list_limit: 10,
            session_file: None,
            session_model: None,
            active_tools: Vec::new(),
            inherited_thinking: ThinkingLevel::Medium,
            cwd: None,
            abort: AbortSignal::new(),
        }
    }

    pub fn with_skills(mut self, skills: SkillCatalog, list_limit: usize) -> Self {
        self.skills = skills;
        self.skill_list_limit = list_limit;
        self
    }

    pub fn with_session_file(mut self, path: Option<PathBuf>) -> Self {
        self.session_file = path;
        self
    }

    pub fn with_session_model(mut self, model: Option<ProviderModel>) -> Self {
        self.session_model = model;
        self
    }

    pub fn with_active_tools(mut self, tools: Vec<String>) -> Self {
        self.active_tools = tools;
        self
    }

    pub fn with_inherited_thinking(mut self, level: ThinkingLevel) -> Self {
        self.inherited_thinking = level;
        self
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_grace(&self) -> Duration {
        Duration::from_millis(self.config.abort_grace_ms)
    }
}
