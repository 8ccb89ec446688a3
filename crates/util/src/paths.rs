use std::env;
use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

/// Location of a configuration file.
///
/// A non-blank `override_env` variable wins; otherwise the file lives under
/// `<config dir>/vro/<file_name>` (`~/.config/vro/...` on Linux).
pub fn config_file_path(override_env: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = env::var(override_env)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("vro").join(file_name)
}
