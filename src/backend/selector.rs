//! First-match-wins backend selection.

use tracing::{debug, info};

use crate::config::{BackendConfig, Config, ConfigStore};
use crate::error::{BackendError, GenerationError};

use super::{AnthropicBackend, Backend, BackendKind, GeminiBackend, OllamaBackend, OpenAiBackend};

/// The first enabled backend in [`BackendKind::PRIORITY`] order.
pub fn first_enabled(config: &Config) -> Option<BackendKind> {
    BackendKind::PRIORITY
        .into_iter()
        .find(|kind| config.record(*kind).enabled)
}

/// Construct a backend from its config record.
pub fn build_backend(
    kind: BackendKind,
    record: &BackendConfig,
) -> Result<Box<dyn Backend>, BackendError> {
    let backend: Box<dyn Backend> = match kind {
        BackendKind::Ollama => Box::new(OllamaBackend::from_config(record)?),
        BackendKind::Gemini => Box::new(GeminiBackend::gemini(record)?),
        BackendKind::Vertex => Box::new(GeminiBackend::vertex(record)?),
        BackendKind::Anthropic => Box::new(AnthropicBackend::from_config(record)?),
        BackendKind::OpenAi => Box::new(OpenAiBackend::from_config(record)?),
    };
    Ok(backend)
}

/// Pick exactly one backend: the first enabled one, in priority order.
///
/// Other enabled backends are ignored, even if the chosen one fails to build.
pub fn select_backend(config: &Config) -> Result<Box<dyn Backend>, GenerationError> {
    let kind = first_enabled(config).ok_or(GenerationError::NoBackendEnabled)?;

    let ignored: Vec<&str> = BackendKind::PRIORITY
        .iter()
        .filter(|k| **k != kind && config.record(**k).enabled)
        .map(|k| k.as_str())
        .collect();
    if !ignored.is_empty() {
        debug!("Ignoring lower-priority enabled backends: {}", ignored.join(", "));
    }

    info!("Using {} backend", kind);
    build_backend(kind, config.record(kind)).map_err(GenerationError::BackendSetup)
}

/// Select from a store, failing fast with `ConfigMissing` if it was never set up.
pub fn select_from_store(store: &ConfigStore) -> Result<Box<dyn Backend>, GenerationError> {
    select_backend(store.config()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn enabled(model: &str) -> BackendConfig {
        BackendConfig {
            enabled: true,
            model: Some(model.to_string()),
            api_key: Some("secret".to_string()),
            location: Some("us-central1".to_string()),
            project: Some("acme".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_enabled_none() {
        assert_eq!(first_enabled(&Config::default()), None);
    }

    #[test]
    fn test_select_with_nothing_enabled() {
        let result = select_backend(&Config::default());
        assert!(matches!(result, Err(GenerationError::NoBackendEnabled)));
    }

    #[test]
    fn test_select_prefers_earlier_priority() {
        let config = Config {
            anthropic: enabled("claude-sonnet-4-5"),
            gemini: enabled("gemini-2.0-flash"),
            ..Default::default()
        };

        for _ in 0..5 {
            let backend = select_backend(&config).unwrap();
            assert_eq!(backend.kind(), BackendKind::Gemini);
        }
    }

    #[test]
    fn test_select_each_kind_alone() {
        for kind in BackendKind::PRIORITY {
            let mut config = Config::default();
            *config.record_mut(kind) = enabled("some-model");
            let backend = select_backend(&config).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn test_select_does_not_fall_through_on_bad_record() {
        // Ollama wins selection but lacks a model; OpenAI is never tried.
        let config = Config {
            ollama: BackendConfig {
                enabled: true,
                ..Default::default()
            },
            openai: enabled("gpt-4o-mini"),
            ..Default::default()
        };
        let result = select_backend(&config);
        assert!(matches!(
            result,
            Err(GenerationError::BackendSetup(BackendError::MissingSetting {
                backend: BackendKind::Ollama,
                field: "model"
            }))
        ));
    }

    #[test]
    fn test_select_from_unconfigured_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("missing.yaml")).unwrap();
        let result = select_from_store(&store);
        assert!(matches!(
            result,
            Err(GenerationError::ConfigMissing(ConfigError::Missing(_)))
        ));
    }

    #[test]
    fn test_select_from_configured_store() {
        let store = ConfigStore::from_config("unused.yaml", Config::local_default());
        let backend = select_from_store(&store).unwrap();
        assert_eq!(backend.kind(), BackendKind::Ollama);
    }
}
