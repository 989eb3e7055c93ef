use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default data directory: ~/.subagent
pub fn get_subagent_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".subagent"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.subagent/config.toml
    let user_config = get_subagent_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

// Environment variables win over every file.
fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Ok(v) = std::env::var("SUBAGENT_AGENT_BIN") {
        if !v.trim().is_empty() {
            cfg.runner.agent_bin = v;
        }
    }
    if let Ok(v) = std::env::var("SUBAGENT_MAX_PARALLEL") {
        if !v.trim().is_empty() {
            cfg.runner.max_parallel_tasks = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("SUBAGENT_MAX_PARALLEL: {e}"))?;
        }
    }
    if let Ok(v) = std::env::var("SUBAGENT_MAX_CONCURRENCY") {
        if !v.trim().is_empty() {
            cfg.runner.max_concurrency = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("SUBAGENT_MAX_CONCURRENCY: {e}"))?;
        }
    }
    Ok(())
}
