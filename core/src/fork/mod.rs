//! Ephemeral copies of the caller's session log for forked tasks.

mod session;

pub use session::{
    apply_fork_args, cleanup_fork_session, create_fork_session, ensure_fork_prerequisites,
    ForkSession, SEED_FILE_NAME,
};
