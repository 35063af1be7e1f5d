use std::path::PathBuf;

const APP_DIR: &str = "tagalog";

/// Platform data directory: `$XDG_DATA_HOME`, else `$HOME/.local/share`.
pub fn data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|dir| !dir.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// Where this application keeps its records by default.
pub fn app_data_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(APP_DIR))
}
