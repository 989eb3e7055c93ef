//! Skills: named, file-backed prompt templates that wrap a task prompt.

mod catalog;
mod prompt;

pub use catalog::{parse_frontmatter_field, strip_frontmatter, SkillCatalog, SkillProvider, SkillRecord};
pub use prompt::build_task_prompt;
