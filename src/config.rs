//! Runtime settings.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`copdcare.toml`, or the path in `COPDCARE_CONFIG`), then environment
//! variables such as `COPDCARE_SERVER__PORT=8080`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "COPD Care";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_FILE: &str = "copdcare.toml";
pub const CONFIG_PATH_VAR: &str = "COPDCARE_CONFIG";
const ENV_PREFIX: &str = "COPDCARE";

pub const DEFAULT_PORT: u16 = 5000;
/// Idle time after which a login session is dropped: 15 minutes.
pub const DEFAULT_SESSION_INACTIVITY_SECS: i64 = 900;

/// Lowest PBKDF2 iteration count a deployment may configure.
pub const MIN_PASSWORD_ITERATIONS: u32 = 1_000;

/// `RUST_LOG` fallback.
pub fn default_log_filter() -> &'static str {
    "copdcare=info,copdcare_lib=info,tower_http=info"
}

/// Where user, patient and prediction files go when not configured.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("copdcare")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub dir: PathBuf,
    pub classifier: String,
    pub scaler: String,
    pub label_encoder: String,
}

impl Model {
    pub fn artifact_paths(&self) -> crate::prediction::ArtifactPaths {
        crate::prediction::ArtifactPaths::in_dir(
            &self.dir,
            &self.classifier,
            &self.scaler,
            &self.label_encoder,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub session_inactivity_secs: i64,
    /// Set the `Secure` cookie attribute; enable behind HTTPS.
    pub secure_cookie: bool,
    pub password_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Frontend {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Cors {
    /// Empty disables cross-origin access entirely.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub storage: Storage,
    pub model: Model,
    pub auth: Auth,
    pub frontend: Frontend,
    #[serde(default)]
    pub cors: Cors,
}

impl Settings {
    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| CONFIG_FILE.to_string());
        Self::defaults()?
            .add_source(
                File::with_name(&file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Defaults overlaid with one required TOML file; the environment is ignored.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.auth.password_iterations < MIN_PASSWORD_ITERATIONS {
            return Err(ConfigError::Message(format!(
                "auth.password_iterations must be at least {MIN_PASSWORD_ITERATIONS}, got {}",
                self.auth.password_iterations
            )));
        }
        if self.auth.session_inactivity_secs <= 0 {
            return Err(ConfigError::Message(format!(
                "auth.session_inactivity_secs must be positive, got {}",
                self.auth.session_inactivity_secs
            )));
        }
        Ok(self)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default(
                "storage.data_dir",
                default_data_dir().to_string_lossy().into_owned(),
            )?
            .set_default("model.dir", "models")?
            .set_default("model.classifier", "copd_rf_model.json")?
            .set_default("model.scaler", "scaler.json")?
            .set_default("model.label_encoder", "label_encoder.json")?
            .set_default("auth.session_inactivity_secs", DEFAULT_SESSION_INACTIVITY_SECS)?
            .set_default("auth.secure_cookie", false)?
            .set_default(
                "auth.password_iterations",
                i64::from(crate::crypto::PBKDF2_ITERATIONS),
            )?
            .set_default("frontend.dir", "frontend")?
            .set_default("cors.allowed_origins", Vec::<String>::new())
    }

    /// Settings rooted in a scratch directory with cheap password hashing.
    #[cfg(test)]
    pub(crate) fn for_tests(root: &Path) -> Self {
        Self {
            server: Server {
                host: "127.0.0.1".into(),
                port: 0,
            },
            storage: Storage {
                data_dir: root.join("data"),
            },
            model: Model {
                dir: root.join("models"),
                classifier: "copd_rf_model.json".into(),
                scaler: "scaler.json".into(),
                label_encoder: "label_encoder.json".into(),
            },
            auth: Auth {
                session_inactivity_secs: DEFAULT_SESSION_INACTIVITY_SECS,
                secure_cookie: false,
                password_iterations: MIN_PASSWORD_ITERATIONS,
            },
            frontend: Frontend {
                dir: root.join("frontend"),
            },
            cors: Cors::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copdcare.toml");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (_dir, path) = write_config("");
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.server.port, DEFAULT_PORT);
        assert_eq!(settings.server.bind_addr(), "127.0.0.1:5000");
        assert_eq!(settings.model.classifier, "copd_rf_model.json");
        assert_eq!(settings.auth.password_iterations, crate::crypto::PBKDF2_ITERATIONS);
        assert_eq!(settings.storage.data_dir, default_data_dir());
        assert!(settings.cors.allowed_origins.is_empty());
        assert!(!settings.auth.secure_cookie);
    }

    #[test]
    fn file_overrides_defaults() {
        let (_dir, path) = write_config(
            r#"
            [server]
            port = 8080

            [model]
            dir = "/srv/models"

            [cors]
            allowed_origins = ["https://clinic.example"]
            "#,
        );
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(
            settings.model.artifact_paths().scaler,
            Path::new("/srv/models/scaler.json")
        );
        assert_eq!(settings.cors.allowed_origins, vec!["https://clinic.example"]);
    }

    #[test]
    fn malformed_value_is_an_error() {
        let (_dir, path) = write_config("[server]\nport = \"not a port\"\n");
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn too_few_password_iterations_are_rejected() {
        for count in [0, 1, MIN_PASSWORD_ITERATIONS - 1] {
            let (_dir, path) = write_config(&format!("[auth]\npassword_iterations = {count}\n"));
            let err = Settings::from_file(&path).unwrap_err();
            assert!(err.to_string().contains("password_iterations"), "{err}");
        }

        let (_dir, path) = write_config(&format!(
            "[auth]\npassword_iterations = {MIN_PASSWORD_ITERATIONS}\n"
        ));
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.auth.password_iterations, MIN_PASSWORD_ITERATIONS);
    }

    #[test]
    fn non_positive_session_timeout_is_rejected() {
        let (_dir, path) = write_config("[auth]\nsession_inactivity_secs = 0\n");
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn default_data_dir_is_app_specific() {
        assert!(default_data_dir().ends_with("copdcare"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
