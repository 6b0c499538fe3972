use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config.toml", "resources/config.toml"];

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

/// Characters of the client id kept when it is shown in logs.
const VISIBLE_ID_PREFIX: usize = 4;

/// API credentials for one run. Never logged verbatim: `Debug` masks the
/// client id and redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Credentials {
    /// The client id cut to a short prefix, for log lines.
    pub fn masked_client_id(&self) -> String {
        let prefix: String = self.client_id.chars().take(VISIBLE_ID_PREFIX).collect();
        format!("{}***", prefix)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.masked_client_id())
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

pub trait ConfigLoader {
    fn load(&self) -> Result<Credentials, ConfigError>;
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(alias = "RedditAPI")]
    reddit_api: Option<RedditApiSection>,
}

#[derive(Debug, Default, Deserialize)]
struct RedditApiSection {
    client_id: Option<String>,
    client_secret: Option<String>,
    user_agent: Option<String>,
}

/// Loads credentials from a TOML file with a `[reddit_api]` table, with
/// optional `REDDIT_*` overrides layered on top.
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    candidates: Vec<PathBuf>,
    overrides: Vec<(String, String)>,
}

impl FileConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
            overrides: Vec::new(),
        }
    }

    /// Searches `config.toml`, then `resources/config.toml`, relative to `base`.
    pub fn with_default_paths(base: impl AsRef<Path>) -> Self {
        Self {
            candidates: DEFAULT_CONFIG_PATHS
                .iter()
                .map(|p| base.as_ref().join(p))
                .collect(),
            overrides: Vec::new(),
        }
    }

    /// Keeps only the `REDDIT_*` keys of `vars`.
    pub fn with_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.overrides = vars
            .into_iter()
            .filter(|(key, _)| {
                matches!(key.as_str(), ENV_CLIENT_ID | ENV_CLIENT_SECRET | ENV_USER_AGENT)
            })
            .collect();
        self
    }

    fn override_for(&self, key: &str) -> Option<String> {
        self.overrides
            .iter()
            .rev()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.clone())
    }

    fn read_file(&self) -> Result<Option<ConfigFile>, ConfigError> {
        let Some(path) = self.candidates.iter().find(|p| p.exists()) else {
            return Ok(None);
        };

        info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let parsed: ConfigFile = toml::from_str(&content)?;
        Ok(Some(parsed))
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<Credentials, ConfigError> {
        let env_id = self.override_for(ENV_CLIENT_ID);
        let env_secret = self.override_for(ENV_CLIENT_SECRET);
        let env_agent = self.override_for(ENV_USER_AGENT);
        let fully_overridden = env_id.is_some() && env_secret.is_some() && env_agent.is_some();

        let section = match self.read_file()? {
            Some(file) => file.reddit_api.unwrap_or_default(),
            None if fully_overridden => {
                debug!("No config file found, using environment credentials");
                RedditApiSection::default()
            }
            None => {
                let searched = self
                    .candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(ConfigError::FileNotFound { path: searched });
            }
        };

        Ok(Credentials {
            client_id: required("client_id", env_id.or(section.client_id))?,
            client_secret: required("client_secret", env_secret.or(section.client_secret))?,
            user_agent: required("user_agent", env_agent.or(section.user_agent))?,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            "[reddit_api]\nclient_id = \"id\"\nclient_secret = \"secret\"\nuser_agent = \"harvest/0.1\"\n",
        );

        let creds = FileConfigLoader::new(path).load().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.user_agent, "harvest/0.1");
    }

    #[test]
    fn test_legacy_section_name() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "resources/config.toml",
            "[RedditAPI]\nclient_id = \"id\"\nclient_secret = \"secret\"\nuser_agent = \"ua\"\n",
        );

        let creds = FileConfigLoader::with_default_paths(dir.path())
            .load()
            .unwrap();
        assert_eq!(creds.user_agent, "ua");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileConfigLoader::with_default_paths(dir.path()).load();
        match result {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.contains("config.toml"));
                assert!(path.contains("resources"));
            }
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_blank_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            "[reddit_api]\nclient_id = \"id\"\nclient_secret = \"  \"\nuser_agent = \"ua\"\n",
        );

        let result = FileConfigLoader::new(path).load();
        assert!(matches!(
            result,
            Err(ConfigError::MissingField { ref field }) if field == "client_secret"
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "config.toml", "[reddit_api\nclient_id = id\n");
        assert!(matches!(
            FileConfigLoader::new(path).load(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let vars = vec![
            (ENV_CLIENT_ID.to_string(), "env-id".to_string()),
            (ENV_CLIENT_SECRET.to_string(), "env-secret".to_string()),
            (ENV_USER_AGENT.to_string(), "env-ua".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];

        let creds = FileConfigLoader::with_default_paths(dir.path())
            .with_overrides(vars)
            .load()
            .unwrap();
        assert_eq!(creds.client_id, "env-id");
        assert_eq!(creds.user_agent, "env-ua");
    }

    #[test]
    fn test_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            "[reddit_api]\nclient_id = \"id\"\nclient_secret = \"secret\"\nuser_agent = \"ua\"\n",
        );

        let creds = FileConfigLoader::new(path)
            .with_overrides(vec![
                (ENV_USER_AGENT.to_string(), "other".to_string()),
                (ENV_CLIENT_ID.to_string(), "   ".to_string()),
            ])
            .load()
            .unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.user_agent, "other");
    }

    #[test]
    fn test_debug_masks_credentials() {
        let creds = Credentials {
            client_id: "abcdefghij".to_string(),
            client_secret: "hunter2".to_string(),
            user_agent: "ua".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("abcdefghij"));
        assert!(rendered.contains("abcd***"));
        assert!(rendered.contains("[redacted]"));

        let short = Credentials {
            client_id: "ab".to_string(),
            ..creds
        };
        assert_eq!(short.masked_client_id(), "ab***");
    }
}
