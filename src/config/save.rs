use crate::config::types::{Config, MAX_RECENT_PATHS, UserPreferences};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings(config: &Config) -> Result<()> {
    save_settings_to(config, Path::new(super::load::SETTINGS_FILE))
}

pub fn save_settings_to(config: &Config, path: &Path) -> Result<()> {
    let file = config.to_settings_file();
    let content = serde_json::to_string_pretty(&file).context("Failed to serialize settings")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

/// 更新最近使用的路徑
/// 將新路徑加入最前面，去重並限制數量
pub fn add_recent_path(preferences: &mut UserPreferences, path: &str) {
    preferences.recent_paths.retain(|p| p != path);
    preferences.recent_paths.insert(0, path.to_string());
    preferences.recent_paths.truncate(MAX_RECENT_PATHS);
}
