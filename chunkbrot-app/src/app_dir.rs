//! Files ChunkBrot keeps next to its executable: the startup config and
//! exported PNGs.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "chunkbrot.json";

/// Where the executable lives, or the working directory when that is unknown.
pub fn exe_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

pub fn config_file() -> PathBuf {
    exe_directory().join(CONFIG_FILE)
}

/// Export target for a picture taken at `unix_secs`.
pub fn export_file_in(dir: &Path, unix_secs: u64) -> PathBuf {
    dir.join(format!("chunkbrot_{unix_secs}.png"))
}
