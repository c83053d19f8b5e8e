//! The one persisted secret: the Anthropic API key.
//!
//! The key lives in the `anthropic_api_key` slot of the settings file. It is read
//! once at startup and written when the user saves settings; callers pass the
//! loaded [`Credential`] explicitly to the completion client on every request.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;

pub const CREDENTIAL_ENV_VAR: &str = "ANTHROPIC_API_KEY";

/// Opaque API key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where a loaded credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Env,
    Config,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Env => "env",
            CredentialSource::Config => "config",
        }
    }
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored key, if any. An empty slot counts as absent.
    pub fn load(&self) -> Result<Option<Credential>> {
        let config = Config::load_from(&self.path)?;
        Ok(config
            .anthropic_api_key
            .filter(|key| !key.is_empty())
            .map(Credential::new))
    }

    /// Environment first, then the settings file.
    pub fn load_with_env(&self) -> Result<Option<(Credential, CredentialSource)>> {
        self.load_preferring(std::env::var(CREDENTIAL_ENV_VAR).ok())
    }

    fn load_preferring(&self, env_value: Option<String>) -> Result<Option<(Credential, CredentialSource)>> {
        match env_value {
            Some(key) if !key.is_empty() => Ok(Some((Credential::new(key), CredentialSource::Env))),
            _ => Ok(self.load()?.map(|c| (c, CredentialSource::Config))),
        }
    }

    /// Overwrite the slot, leaving every other setting untouched.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let mut config = Config::load_from(&self.path)?;
        config.anthropic_api_key = Some(credential.expose().to_string());
        config.save_to(&self.path)?;
        log::info!("Saved API key to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_survives_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        CredentialStore::at(&path).save(&Credential::new("sk-ant-one")).unwrap();
        CredentialStore::at(&path).save(&Credential::new("sk-ant-two")).unwrap();

        let loaded = CredentialStore::at(&path).load().unwrap();
        assert_eq!(loaded, Some(Credential::new("sk-ant-two")));
    }

    #[test]
    fn test_save_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config {
            model: Some("custom-model".to_string()),
            ..Config::default()
        }
        .save_to(&path)
        .unwrap();

        CredentialStore::at(&path).save(&Credential::new("k1")).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model(), "custom-model");
        assert_eq!(config.anthropic_api_key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_empty_slot_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        CredentialStore::at(&path).save(&Credential::new("")).unwrap();

        assert!(CredentialStore::at(&path).load().unwrap().is_none());
    }

    #[test]
    fn test_env_value_wins_over_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        store.save(&Credential::new("from-file")).unwrap();

        let loaded = store.load_preferring(Some("from-env".to_string())).unwrap();
        assert_eq!(loaded, Some((Credential::new("from-env"), CredentialSource::Env)));
    }

    #[test]
    fn test_empty_or_unset_env_value_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        store.save(&Credential::new("from-file")).unwrap();

        let expected = Some((Credential::new("from-file"), CredentialSource::Config));
        assert_eq!(store.load_preferring(Some(String::new())).unwrap(), expected);
        assert_eq!(store.load_preferring(None).unwrap(), expected);
    }

    #[test]
    fn test_no_key_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        assert!(store.load_preferring(Some(String::new())).unwrap().is_none());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let rendered = format!("{:?}", Credential::new("sk-ant-secret"));
        assert!(!rendered.contains("secret"));
    }
}
