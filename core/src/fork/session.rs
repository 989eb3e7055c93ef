use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::TaskError;
use crate::request::NormalizedParams;
use crate::resolve::{NO_SESSION_FLAG, SESSION_DIR_FLAG, SESSION_FLAG};

pub const SEED_FILE_NAME: &str = "seed.jsonl";

/// A temporary directory holding a copy of the caller's session log.
///
/// Owned by exactly one task. Dropping the handle removes the directory, so a
/// cancelled task future cleans up as well.
#[derive(Debug)]
pub struct ForkSession {
    dir: TempDir,
    seed_path: PathBuf,
}

impl ForkSession {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn seed_path(&self) -> &Path {
        &self.seed_path
    }
}

/// Copy `session_file` into a fresh temp dir. The source is only read.
pub async fn create_fork_session(session_file: &Path) -> Result<ForkSession, TaskError> {
    let dir = tempfile::Builder::new()
        .prefix("subagent-fork-")
        .tempdir()
        .map_err(|e| TaskError::ForkSetup(format!("create temp dir: {e}")))?;
    let seed_path = dir.path().join(SEED_FILE_NAME);

    // On failure `dir` drops here and removes itself.
    tokio::fs::copy(session_file, &seed_path)
        .await
        .map_err(|e| {
            TaskError::ForkSetup(format!("copy {}: {e}", session_file.display()))
        })?;

    tracing::debug!(dir = %dir.path().display(), source = %session_file.display(), "fork session created");
    Ok(ForkSession { dir, seed_path })
}

/// Best-effort removal. Never fails; a missing handle is a no-op.
pub fn cleanup_fork_session(session: Option<ForkSession>) {
    let Some(session) = session else {
        return;
    };
    let path = session.dir().to_path_buf();
    if let Err(e) = session.dir.close() {
        tracing::warn!(dir = %path.display(), error = %e, "fork session cleanup failed");
    } else {
        tracing::debug!(dir = %path.display(), "fork session removed");
    }
}

/// Fail the whole call up front if any item forks but there is no session log.
pub fn ensure_fork_prerequisites(
    params: &NormalizedParams,
    session_file: Option<&Path>,
) -> Result<(), TaskError> {
    if !params.any_fork() {
        return Ok(());
    }
    match session_file {
        Some(p) if p.is_file() => Ok(()),
        Some(p) => Err(TaskError::ForkPrerequisite(format!(
            "Cannot fork: session file {} does not exist. Set \"fork\": false to run without context.",
            p.display()
        ))),
        None => Err(TaskError::ForkPrerequisite(
            "Cannot fork: no session file is available. Set \"fork\": false to run without context."
                .to_string(),
        )),
    }
}

/// Swap the no-persistence flag for seed-file and session-dir flags.
pub fn apply_fork_args(args: &[String], session: &ForkSession) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 3);
    for arg in args {
        if arg == NO_SESSION_FLAG {
            out.push(SESSION_FLAG.to_string());
            out.push(session.seed_path().to_string_lossy().into_owned());
            out.push(SESSION_DIR_FLAG.to_string());
            out.push(session.dir().to_string_lossy().into_owned());
        } else {
            out.push(arg.clone());
        }
    }
    out
}
