use thiserror::Error;

/// Errors that end a top-level call before (or between) subprocess runs.
///
/// Failures of a running subprocess are not errors here; they are recorded on
/// the task's `SingleResult` and classified from its exit code and stop reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    ConfigResolution(String),

    #[error("{0}")]
    SkillResolution(String),

    #[error("{0}")]
    ForkPrerequisite(String),

    #[error("failed to prepare fork session: {0}")]
    ForkSetup(String),
}

impl TaskError {
    /// Short machine-friendly kind, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ConfigResolution(_) => "config_resolution",
            Self::SkillResolution(_) => "skill_resolution",
            Self::ForkPrerequisite(_) => "fork_prerequisite",
            Self::ForkSetup(_) => "fork_setup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_spawn_errors_carry_their_message_and_kind() {
        let cases = [
            (TaskError::Validation("bad".into()), "validation", "bad"),
            (TaskError::ConfigResolution("model".into()), "config_resolution", "model"),
            (TaskError::SkillResolution("skill".into()), "skill_resolution", "skill"),
            (TaskError::ForkPrerequisite("fork".into()), "fork_prerequisite", "fork"),
            (
                TaskError::ForkSetup("copy failed".into()),
                "fork_setup",
                "failed to prepare fork session: copy failed",
            ),
        ];
        for (err, kind, text) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.to_string(), text);
        }
    }
}
