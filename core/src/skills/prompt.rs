use std::sync::Arc;

use crate::error::TaskError;
use crate::request::TaskWorkItem;

use super::catalog::{strip_frontmatter, SkillCatalog, SkillRecord};

/// Prompt sent to the agent for `item`: unchanged without a skill, otherwise
/// the skill body wrapped around the user prompt.
pub async fn build_task_prompt(
    item: &TaskWorkItem,
    catalog: &SkillCatalog,
    list_limit: usize,
) -> Result<String, TaskError> {
    let Some(name) = item.skill.as_deref() else {
        return Ok(item.prompt.clone());
    };

    let skill = catalog
        .find(name)
        .ok_or_else(|| unknown_skill(name, catalog, list_limit))?;
    let body = load_body(skill, catalog).await?;

    Ok(wrap_prompt(skill, &body, &item.prompt))
}

async fn load_body(skill: &SkillRecord, catalog: &SkillCatalog) -> Result<Arc<str>, TaskError> {
    if let Some(body) = catalog.cached_body(&skill.name) {
        return Ok(body);
    }

    let raw = tokio::fs::read_to_string(&skill.file_path)
        .await
        .map_err(|e| {
            TaskError::SkillResolution(format!(
                "Failed to read skill \"{}\" at {}: {e}",
                skill.name,
                skill.file_path.display()
            ))
        })?;
    tracing::debug!(skill = %skill.name, path = %skill.file_path.display(), "skill body loaded");
    Ok(catalog.store_body(&skill.name, strip_frontmatter(&raw).to_string()))
}

fn wrap_prompt(skill: &SkillRecord, body: &str, prompt: &str) -> String {
    format!(
        "Skill \"{name}\" loaded from {file}\nRelative paths in this skill are relative to {base}\n\n{body}\n\n---\n\n{prompt}",
        name = skill.name,
        file = skill.file_path.display(),
        base = skill.base_dir.display(),
        body = body.trim_end(),
    )
}

fn unknown_skill(name: &str, catalog: &SkillCatalog, limit: usize) -> TaskError {
    let names: Vec<&str> = catalog.skills().iter().map(|s| s.name.as_str()).collect();
    if names.is_empty() {
        return TaskError::SkillResolution(format!(
            "Unknown skill \"{name}\". No skills are available."
        ));
    }

    let mut listed = names.iter().take(limit).copied().collect::<Vec<_>>().join(", ");
    if names.len() > limit {
        listed.push_str(&format!(" (+{} more)", names.len() - limit));
    }
    TaskError::SkillResolution(format!(
        "Unknown skill \"{name}\". Available skills: {listed}"
    ))
}
