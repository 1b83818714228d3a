//! Backend configuration: one record per supported LLM service.

pub mod store;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

pub use store::ConfigStore;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".commitline/llm.config.yaml";

/// Environment variable to override the config file location.
pub const CONFIG_ENV_VAR: &str = "COMMITLINE_CONFIG";

/// Host used by `commitline setup` for the local backend.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Model used by `commitline setup` for the local backend.
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3:4b";

/// Settings for a single backend.
///
/// Which fields are required depends on the backend; validation happens when
/// the backend is constructed, not when the file is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(alias = "enable")]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Region for region-scoped backends (vertex).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// The full set of backend records as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: BackendConfig,
    pub gemini: BackendConfig,
    pub vertex: BackendConfig,
    pub anthropic: BackendConfig,
    pub openai: BackendConfig,
}

impl Config {
    /// The seed configuration: only the local backend, enabled.
    pub fn local_default() -> Self {
        Self {
            ollama: BackendConfig {
                enabled: true,
                host: Some(DEFAULT_OLLAMA_HOST.to_string()),
                model: Some(DEFAULT_OLLAMA_MODEL.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn record(&self, kind: BackendKind) -> &BackendConfig {
        match kind {
            BackendKind::Ollama => &self.ollama,
            BackendKind::Gemini => &self.gemini,
            BackendKind::Vertex => &self.vertex,
            BackendKind::Anthropic => &self.anthropic,
            BackendKind::OpenAi => &self.openai,
        }
    }

    #[cfg(test)]
    pub(crate) fn record_mut(&mut self, kind: BackendKind) -> &mut BackendConfig {
        match kind {
            BackendKind::Ollama => &mut self.ollama,
            BackendKind::Gemini => &mut self.gemini,
            BackendKind::Vertex => &mut self.vertex,
            BackendKind::Anthropic => &mut self.anthropic,
            BackendKind::OpenAi => &mut self.openai,
        }
    }
}

/// Resolve the config path: explicit flag, then `COMMITLINE_CONFIG`, then the default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match env::var(CONFIG_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_local_default_enables_only_ollama() {
        let config = Config::local_default();
        assert!(config.ollama.enabled);
        assert_eq!(config.ollama.host.as_deref(), Some(DEFAULT_OLLAMA_HOST));
        assert_eq!(config.ollama.model.as_deref(), Some(DEFAULT_OLLAMA_MODEL));
        for kind in &BackendKind::PRIORITY[1..] {
            assert!(!config.record(*kind).enabled, "{kind} should be disabled");
        }
    }

    #[test]
    fn test_deserialize_accepts_legacy_enable_key() {
        let yaml = "ollama:\n  enable: true\n  host: http://gpu-box:11434\n  model: llama3\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.ollama.enabled);
        assert_eq!(config.ollama.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.anthropic, BackendConfig::default());
    }

    #[test]
    fn test_deserialize_vertex_record() {
        let yaml = r#"
vertex:
  enabled: true
  model: gemini-2.0-flash
  api_key: ya29.token
  location: us-central1
  project: acme-prod
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let vertex = config.record(BackendKind::Vertex);
        assert!(vertex.enabled);
        assert_eq!(vertex.location.as_deref(), Some("us-central1"));
        assert_eq!(vertex.project.as_deref(), Some("acme-prod"));
    }

    #[test]
    fn test_serialize_omits_unset_fields() {
        let yaml = serde_yaml::to_string(&Config::local_default()).unwrap();
        assert!(yaml.contains("enabled: true"));
        assert!(!yaml.contains("api_key"));
    }

    #[test]
    fn test_record_mut_targets_matching_record() {
        let mut config = Config::default();
        config.record_mut(BackendKind::OpenAi).enabled = true;
        assert!(config.openai.enabled);
        assert!(!config.anthropic.enabled);
    }

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let path = resolve_config_path(Some(PathBuf::from("custom.yaml")));
        assert_eq!(path, PathBuf::from("custom.yaml"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        temp_env::with_var(CONFIG_ENV_VAR, Some("/tmp/llm.yaml"), || {
            assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/llm.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_default() {
        temp_env::with_var_unset(CONFIG_ENV_VAR, || {
            assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        });
    }
}
