/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::fs;

use crate::common;
use pairport::app_config::{Config, EngineVendor, ProviderConfig};
use pairport::errors::ConfigError;

#[test]
fn test_loadOrCreate_withoutFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.default_model, "s");
    assert_eq!(config.languages.source.extension, "agda");
    assert_eq!(config.languages.target.extension, "kind");
    assert!(config.validate().is_ok());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.models, config.models);
    Ok(())
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", r#"{ "default_model": "g", "shared_namespace": "Prelude/" }"#)?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.default_model, "g");
    assert_eq!(config.shared_namespace, "Prelude/");
    assert_eq!(config.model("g")?.vendor, EngineVendor::OpenAI);
    assert_eq!(config.providers.len(), 2);
    Ok(())
}

#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_model_withUnknownKey_shouldFail() {
    let config = Config::default();
    let err = config.model("zz").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownModel(ref key) if key == "zz"));
}

#[test]
fn test_validate_withSharedExtension_shouldFail() {
    let mut config = Config::default();
    config.languages.target.extension = config.languages.source.extension.clone();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_validate_withUnknownDefaultModel_shouldFail() {
    let config = Config {
        default_model: "nope".to_string(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::UnknownModel(_))));
}

#[test]
fn test_validate_withoutProviderForModel_shouldFail() {
    let mut config = Config::default();
    config.providers.retain(|p| p.vendor != EngineVendor::OpenAI);
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_readCredential_shouldTrimToken() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let token = common::create_test_file(dir.path(), "anthropic.token", "  sk-test-123\n")?;
    let provider = ProviderConfig {
        credential_file: token.to_string_lossy().to_string(),
        ..ProviderConfig::new(EngineVendor::Anthropic)
    };

    assert_eq!(provider.read_credential()?, "sk-test-123");
    Ok(())
}

#[test]
fn test_readCredential_withEmptyOrAbsentFile_shouldReportMissing() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let empty = common::create_test_file(dir.path(), "empty.token", "\n")?;

    for path in [empty, dir.path().join("absent.token")] {
        let provider = ProviderConfig {
            credential_file: path.to_string_lossy().to_string(),
            ..ProviderConfig::new(EngineVendor::OpenAI)
        };
        let err = provider.read_credential().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }
    Ok(())
}

#[test]
fn test_transcriptDir_withConfiguredDir_shouldUseIt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let config = common::test_config(dir.path());
    assert_eq!(config.transcript_dir(), dir.path());
    fs::create_dir_all(config.transcript_dir())?;
    Ok(())
}
