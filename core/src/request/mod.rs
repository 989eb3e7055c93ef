mod normalize;
mod types;

pub use normalize::normalize_params;
pub use types::{Mode, NormalizedParams, TaskWorkItem, ThinkingLevel, ThinkingSetting};
