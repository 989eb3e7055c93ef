use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// A discovered skill file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    /// Where the skill came from (e.g. "user", "project").
    pub source: String,
    pub file_path: PathBuf,
    /// Directory that relative references inside the skill resolve against.
    pub base_dir: PathBuf,
}

/// Discovery collaborator: lists the skills available to this call.
pub trait SkillProvider: Send + Sync {
    fn discover(&self) -> anyhow::Result<Vec<SkillRecord>>;
}

/// Available skills plus a body cache that lives for one top-level call.
///
/// The cache is keyed by name only; an edit to a skill file during the call is
/// not picked up once the body has been loaded.
#[derive(Debug, Default)]
pub struct SkillCatalog {
    skills: Vec<SkillRecord>,
    bodies: Mutex<HashMap<String, Arc<str>>>,
}

impl SkillCatalog {
    pub fn new(skills: Vec<SkillRecord>) -> Self {
        Self {
            skills,
            bodies: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_provider(provider: &dyn SkillProvider) -> anyhow::Result<Self> {
        Ok(Self::new(provider.discover()?))
    }

    pub fn skills(&self) -> &[SkillRecord] {
        &self.skills
    }

    pub fn find(&self, name: &str) -> Option<&SkillRecord> {
        self.skills.iter().find(|s| s.name == name)
    }

    pub(crate) fn cached_body(&self, name: &str) -> Option<Arc<str>> {
        let bodies = self.bodies.lock().unwrap_or_else(|e| e.into_inner());
        bodies.get(name).cloned()
    }

    /// Store a freshly loaded body. If another task raced us, the first stored
    /// body wins and is returned.
    pub(crate) fn store_body(&self, name: &str, body: String) -> Arc<str> {
        let mut bodies = self.bodies.lock().unwrap_or_else(|e| e.into_inner());
        bodies
            .entry(name.to_string())
            .or_insert_with(|| Arc::from(body))
            .clone()
    }

    pub fn cached_len(&self) -> usize {
        self.bodies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Drop a leading `---` metadata block, if any.
pub fn strip_frontmatter(content: &str) -> &str {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return content;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return rest[offset..].trim_start_matches(['\r', '\n']);
        }
    }
    // Unterminated block: treat the whole file as body.
    content
}

/// Read `key: value` from a leading metadata block.
pub fn parse_frontmatter_field(content: &str, key: &str) -> Option<String> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    for line in rest.lines() {
        let line = line.trim_end();
        if line == "---" {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            if k.trim() == key {
                let v = v.trim().trim_matches(|c| c == '"' || c == '\'');
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_metadata_block() {
        let s = "---\nname: review\ndescription: x\n---\n\n# Review\nbody\n";
        assert_eq!(strip_frontmatter(s), "# Review\nbody\n");
        assert_eq!(strip_frontmatter("# Plain\n"), "# Plain\n");
        assert_eq!(strip_frontmatter("---\nnever closed\n"), "---\nnever closed\n");
    }

    #[test]
    fn reads_frontmatter_fields() {
        let s = "---\nname: \"review\"\ndescription: look closely\n---\nbody";
        assert_eq!(parse_frontmatter_field(s, "name").as_deref(), Some("review"));
        assert_eq!(
            parse_frontmatter_field(s, "description").as_deref(),
            Some("look closely")
        );
        assert_eq!(parse_frontmatter_field(s, "missing"), None);
        assert_eq!(parse_frontmatter_field("body only", "name"), None);
    }

    #[test]
    fn first_stored_body_wins() {
        let catalog = SkillCatalog::default();
        let a = catalog.store_body("s", "first".to_string());
        let b = catalog.store_body("s", "second".to_string());
        assert_eq!(&*a, "first");
        assert_eq!(&*b, "first");
        assert_eq!(catalog.cached_len(), 1);
    }
}
