use std::path::PathBuf;

/// XDG app name used for config, cache and state directories.
pub const APP_NAME: &str = "open-codex";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Directory holding `config.toml`.
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default location of the user config file.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Directory where downloaded model weights are kept.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory for run logs.
pub fn state_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf()
    })
}

/// Used when no home directory can be determined (e.g. bare containers).
pub fn cache_dir_fallback() -> PathBuf {
    std::env::temp_dir().join(format!("{APP_NAME}-cache"))
}

pub fn state_dir_fallback() -> PathBuf {
    std::env::temp_dir().join(format!("{APP_NAME}-state"))
}
