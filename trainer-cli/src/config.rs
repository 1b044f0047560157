//! Data directory resolution.
//!
//! Precedence:
//! 1. `OPENING_TRAINER_DATA_DIR` environment variable
//! 2. `$HOME/.config/opening-trainer/data`
//! 3. `./data` (development fallback)

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/opening-trainer/data";
const DEV_DATA_DIR: &str = "./data";

pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OPENING_TRAINER_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_nonempty() {
        assert!(!data_dir().as_os_str().is_empty());
    }
}
