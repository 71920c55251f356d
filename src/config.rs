use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable naming the store base directory.
pub const ENV_DIR: &str = "EXERCISES_DIR";

/// Resolve where the store lives: an explicit flag wins, then
/// `EXERCISES_DIR`, then an `exercises/` directory under the platform
/// data dir, with a relative `data/exercises` as the last resort.
pub fn resolve_base_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Ok(dir) = env::var(ENV_DIR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    match ProjectDirs::from("", "", "exstore") {
        Some(dirs) => dirs.data_dir().join("exercises"),
        None => PathBuf::from("data").join("exercises"),
    }
}
