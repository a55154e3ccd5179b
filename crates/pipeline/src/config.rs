//! YAML configuration for the CLI.
//!
//! Secrets are never written into the file; sections name the environment
//! variable holding the value and resolution happens at load time.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use toolforge_codegen::ModelConfig;
use toolforge_deploy::{DeployConfig, HostingConfig};
use toolforge_source::{CodeHostConfig, ExplorerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("environment variable {0} (named by the config) is not set")]
    MissingEnv(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub model: ModelSection,
    pub hosting: HostingSection,
    #[serde(default)]
    pub code_host: CodeHostSection,
    #[serde(default)]
    pub deploy: DeploySection,
    #[serde(default)]
    pub scan: ScanSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSection {
    #[serde(default = "default_model_base")]
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HostingSection {
    #[serde(default = "default_hosting_base")]
    pub base_url: String,
    /// Environment variable holding the platform token.
    pub token_env: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodeHostSection {
    #[serde(default)]
    pub api_base: Option<String>,
    /// Environment variable holding an optional bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeploySection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_deploy_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_deploy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScanSection {
    #[serde(default)]
    pub allow_filesystem: bool,
}

fn default_model_base() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_model_name() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_model_timeout() -> u64 {
    120
}
fn default_hosting_base() -> String {
    "https://api.vercel.com".to_string()
}
fn default_poll_interval() -> u64 {
    3
}
fn default_deploy_timeout() -> u64 {
    300
}

impl PipelineConfig {
    /// Loads and parses the YAML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] / [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&body).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolves the model client configuration, reading the key from the
    /// named environment variable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEnv`].
    pub fn model_config(&self) -> Result<ModelConfig, ConfigError> {
        Ok(ModelConfig {
            base_url: self.model.base_url.clone(),
            api_key: require_env(&self.model.api_key_env)?,
            model: self.model.model.clone(),
            max_tokens: self.model.max_tokens,
            timeout: Duration::from_secs(self.model.timeout_secs),
        })
    }

    /// Resolves the hosting-platform configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEnv`].
    pub fn hosting_config(&self) -> Result<HostingConfig, ConfigError> {
        Ok(HostingConfig {
            base_url: self.hosting.base_url.clone(),
            token: require_env(&self.hosting.token_env)?,
        })
    }

    #[must_use]
    pub fn code_host_config(&self) -> CodeHostConfig {
        let mut config = CodeHostConfig::default();
        if let Some(api_base) = &self.code_host.api_base {
            config.api_base = api_base.clone();
        }
        config.token = self
            .code_host
            .token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok());
        config
    }

    #[must_use]
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            poll_interval: Duration::from_secs(self.deploy.poll_interval_secs),
            timeout: Duration::from_secs(self.deploy.timeout_secs),
            ..DeployConfig::default()
        }
    }

    #[must_use]
    pub fn explorer_config(&self) -> ExplorerConfig {
        ExplorerConfig::default()
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
model:
  apiKeyEnv: TF_TEST_MODEL_KEY
hosting:
  tokenEnv: TF_TEST_HOSTING_TOKEN
deploy:
  pollIntervalSecs: 1
  timeoutSecs: 30
scan:
  allowFilesystem: true
"#;

    #[test]
    fn defaults_fill_unset_sections() {
        let config: PipelineConfig = serde_yaml::from_str(SAMPLE).expect("parse");
        assert_eq!(config.model.base_url, "https://api.anthropic.com");
        assert_eq!(config.model.max_tokens, 8192);
        assert_eq!(config.hosting.base_url, "https://api.vercel.com");
        assert_eq!(config.deploy_config().poll_interval, Duration::from_secs(1));
        assert_eq!(config.deploy_config().timeout, Duration::from_secs(30));
        assert!(config.scan.allow_filesystem);
        assert!(config.code_host.api_base.is_none());
    }

    #[test]
    fn load_reads_a_yaml_file() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let config = PipelineConfig::load(file.path()).expect("load");
        assert_eq!(config.deploy.poll_interval_secs, 1);

        let err = PipelineConfig::load(std::path::Path::new("/nonexistent/toolforge.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_yaml::from_str::<PipelineConfig>(
            "model: {apiKeyEnv: K, typo: x}\nhosting: {tokenEnv: T}\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("typo"));
    }

    #[test]
    fn missing_env_is_a_distinct_error() {
        let config: PipelineConfig = serde_yaml::from_str(SAMPLE).expect("parse");
        // Deliberately unset variable name.
        let err = match config.model_config() {
            Err(e) => e,
            Ok(_) => return, // environment happened to define it; nothing to assert
        };
        assert!(matches!(err, ConfigError::MissingEnv(_)));
    }
}
