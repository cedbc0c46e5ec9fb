//! Standard paths used by the pomodoro timer

use std::path::PathBuf;

/// Environment variable that relocates the data directory
pub const DATA_DIR_ENV: &str = "POMODORO_DATA_DIR";

/// Standard pomodoro paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/pomodoro)
    pub data: PathBuf,
    /// Config directory (~/.config/pomodoro)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("pomodoro"),
        };

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pomodoro");

        Self { data, config }
    }

    /// Runtime config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_config_dir() {
        let paths = Paths {
            data: PathBuf::from("/tmp/pomo/data"),
            config: PathBuf::from("/tmp/pomo/config"),
        };
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/pomo/config/config.json"));
    }

    #[test]
    fn test_default_dirs_end_in_pomodoro() {
        let paths = Paths::new();
        assert!(paths.config.ends_with("pomodoro"));
    }
}
