use std::collections::HashSet;
use std::path::{Path, PathBuf};

use subagent_core::api::{parse_frontmatter_field, SkillProvider, SkillRecord};

/// A directory scanned for skills, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct SkillRoot {
    pub source: String,
    pub dir: PathBuf,
}

impl SkillRoot {
    pub fn new(source: impl Into<String>, dir: &str) -> Self {
        Self {
            source: source.into(),
            dir: PathBuf::from(shellexpand::tilde(dir).into_owned()),
        }
    }
}

/// Finds `<root>/<name>/SKILL.md` files. The first root to define a name wins.
#[derive(Debug, Clone)]
pub struct FsSkillProvider {
    roots: Vec<SkillRoot>,
}

impl FsSkillProvider {
    pub fn new(roots: Vec<SkillRoot>) -> Self {
        Self { roots }
    }
}

impl SkillProvider for FsSkillProvider {
    fn discover(&self) -> anyhow::Result<Vec<SkillRecord>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for root in &self.roots {
            let pattern = root.dir.join("*").join("SKILL.md");
            let pattern = pattern.to_string_lossy();
            for entry in glob::glob(&pattern)? {
                let file_path = match entry {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "skill path unreadable");
                        continue;
                    }
                };
                let Some(record) = read_record(&root.source, &file_path) else {
                    continue;
                };
                if seen.insert(record.name.clone()) {
                    out.push(record);
                } else {
                    tracing::debug!(skill = %record.name, path = %file_path.display(), "shadowed skill skipped");
                }
            }
        }

        tracing::debug!(count = out.len(), "skills discovered");
        Ok(out)
    }
}

fn read_record(source: &str, file_path: &Path) -> Option<SkillRecord> {
    let base_dir = file_path.parent()?.to_path_buf();
    let dir_name = base_dir.file_name()?.to_string_lossy().into_owned();
    let name = std::fs::read_to_string(file_path)
        .ok()
        .and_then(|content| parse_frontmatter_field(&content, "name"))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(dir_name);

    Some(SkillRecord {
        name,
        source: source.to_string(),
        file_path: file_path.to_path_buf(),
        base_dir,
    })
}
