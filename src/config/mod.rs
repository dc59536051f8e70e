mod types;

pub use types::Config;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::sort::SortError;

pub const CONFIG_FILE_NAME: &str = "gdsort.toml";

/// Load `path`, or the nearest `gdsort.toml` above the current directory.
///
/// Without any config file the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config, SortError> {
    match path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(found) => {
            debug!(path = %found.display(), "loading config");
            let content = std::fs::read_to_string(&found)?;
            parse_config(&content)
        }
        None => Ok(Config::default()),
    }
}

pub fn parse_config(content: &str) -> Result<Config, SortError> {
    toml::from_str(content).map_err(|e| SortError::Config(e.to_string()))
}

fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}
