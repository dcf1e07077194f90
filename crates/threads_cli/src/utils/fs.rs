use crate::errors::ThreadsCLIError;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session";

/**
 * Gets the path to the ~/.threads directory
 *
 * @returns {PathBuf} path to ~/.threads
 */
pub fn get_storage_path() -> Result<PathBuf, ThreadsCLIError> {
    match std::env::var("HOME") {
        Ok(home) => Ok(Path::new(&home).join(".threads")),
        Err(_) => Err(ThreadsCLIError::FsError(String::from(
            "Couldn't find home directory",
        ))),
    }
}

/**
 * Store a session token, creating the directory if it does not exist
 *
 * @param dir - directory holding the session file
 * @param token - session JWT issued by the auth provider
 */
pub fn save_session(dir: &Path, token: &str) -> Result<PathBuf, ThreadsCLIError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ThreadsCLIError::FsError(e.to_string()))?;
    }
    let path = dir.join(SESSION_FILE);
    std::fs::write(&path, token.trim()).map_err(|e| ThreadsCLIError::FsError(e.to_string()))?;
    Ok(path)
}

/// Read the stored session token
pub fn read_session(dir: &Path) -> Result<String, ThreadsCLIError> {
    let path = dir.join(SESSION_FILE);
    if !path.exists() {
        return Err(ThreadsCLIError::NotLoggedIn);
    }
    let token = std::fs::read_to_string(path).map_err(|e| ThreadsCLIError::FsError(e.to_string()))?;
    match token.trim() {
        "" => Err(ThreadsCLIError::NotLoggedIn),
        token => Ok(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("threads_cli_{}_{}", name, std::process::id()))
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = scratch_dir("round_trip");
        save_session(&dir, " header.payload.signature\n").unwrap();
        assert_eq!(read_session(&dir).unwrap(), "header.payload.signature");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_session_means_logged_out() {
        let dir = scratch_dir("missing");
        assert!(matches!(read_session(&dir), Err(ThreadsCLIError::NotLoggedIn)));
    }
}
