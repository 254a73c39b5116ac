use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_admin_password")]
    admin_password: String,
    #[serde(default = "default_session_hours")]
    session_hours: i64,
}

fn default_admin_password() -> String {
    "admin".to_string()
}

fn default_session_hours() -> i64 {
    24
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        Ok(toml::from_slice(bytes)?)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    #[inline]
    pub fn session_hours(&self) -> i64 {
        self.session_hours
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn repository_config_parses() {
        let config = Config::from_slice(include_bytes!("../../config.toml")).unwrap();
        assert_eq!(config.host().bindto(), "127.0.0.1:5000");
        assert!(config.app().docs());
    }

    #[test]
    fn optional_fields_have_defaults() {
        let config = Config::from_slice(
            b"[host]\nbindto = '0.0.0.0:8080'\n[app]\njwt = 's'\ndatabase_uri = 'postgres://db'\n",
        )
        .unwrap();

        assert!(!config.app().docs());
        assert_eq!(config.app().admin_password(), "admin");
        assert_eq!(config.app().session_hours(), 24);
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = Config::from_slice(b"[host]\nbindto = '0.0.0.0:8080'\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlDeError(_)));
    }
}
