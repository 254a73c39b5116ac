use std::path::PathBuf;

use super::error::{ConfigError, ConfigResult};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CLASSE_NUMERIQUE_CONFIG";
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file: `$CLASSE_NUMERIQUE_CONFIG` first, then the per-user config
/// directory unless `use_local`, then `./config.toml`.
pub fn find_config_file(use_local: bool) -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    let local = PathBuf::from(".").join(CONFIG_FILE);
    if use_local {
        return local;
    }

    user_config_file().filter(|p| p.exists()).unwrap_or(local)
}

#[cfg(unix)]
fn user_config_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(crate::APPLICATION_NAME)
            .join(CONFIG_FILE),
    )
}

#[cfg(windows)]
fn user_config_file() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    Some(PathBuf::from(appdata).join(crate::APPLICATION_NAME).join(CONFIG_FILE))
}

#[cfg(not(any(unix, windows)))]
fn user_config_file() -> Option<PathBuf> {
    None
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let path = find_config_file(use_local);

    tracing::trace!(path = %path.display(), "looking for config");
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let path = path.canonicalize()?;
    tracing::debug!(path = %path.display(), "using configuration file");
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod test {
    use std::{env, fs};

    use super::*;

    // tests touching the environment or the working directory must not run concurrently
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn local_lookup_ignores_user_dir() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::remove_var(CONFIG_PATH_ENV) };

        assert_eq!(find_config_file(true), PathBuf::from("./config.toml"));
    }

    #[test]
    fn env_override_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("ecole.toml");
        fs::write(&file, "[host]\nbindto = '0.0.0.0:80'").unwrap();

        unsafe { env::set_var(CONFIG_PATH_ENV, &file) };
        let found = find_config_file(true);
        let bytes = read_config(false);
        unsafe { env::remove_var(CONFIG_PATH_ENV) };

        assert_eq!(found, file);
        assert_eq!(bytes.unwrap(), b"[host]\nbindto = '0.0.0.0:80'");
    }

    #[cfg(unix)]
    #[test]
    fn user_dir_is_used_when_present() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::remove_var(CONFIG_PATH_ENV) };

        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join(".config").join(crate::APPLICATION_NAME);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("config.toml");
        fs::write(&file, "[app]\njwt = 'secret'").unwrap();

        let home = env::var_os("HOME");
        unsafe { env::set_var("HOME", temp_dir.path()) };
        let found = find_config_file(false);
        if let Some(home) = home {
            unsafe { env::set_var("HOME", home) };
        }

        assert_eq!(found, file);
    }

    #[test]
    fn missing_file_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var(CONFIG_PATH_ENV, "/nonexistent/classe-numerique.toml") };
        let result = read_config(true);
        unsafe { env::remove_var(CONFIG_PATH_ENV) };

        assert!(matches!(result, Err(ConfigError::ConfigNotFound)));
    }
}
