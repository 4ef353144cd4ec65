use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_KEY";
pub const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const SYSTEM_PROMPT_VAR: &str = "AZURE_SYSTEM_PROMPT";
pub const SERVER_URL_VAR: &str = "SOUNDING_BOARD_URL";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Dave's AI advising partner for STEM professionals.";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Proxy settings, read from the environment once at start-up.
///
/// Required values are kept as `Option` so a partially configured server can
/// still run and answer with the credentials error.
#[derive(Debug, Clone, Default)]
pub struct AzureSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub system_prompt: Option<String>,
}

/// The three required values, all present
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub endpoint: &'a str,
    pub api_key: &'a str,
    pub deployment: &'a str,
}

impl AzureSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            endpoint: get(ENDPOINT_VAR),
            api_key: get(API_KEY_VAR),
            deployment: get(DEPLOYMENT_VAR),
            system_prompt: get(SYSTEM_PROMPT_VAR),
        }
    }

    pub fn credentials(&self) -> Option<Credentials<'_>> {
        Some(Credentials {
            endpoint: self.endpoint.as_deref()?,
            api_key: self.api_key.as_deref()?,
            deployment: self.deployment.as_deref()?,
        })
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Names of required variables that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENDPOINT_VAR, &self.endpoint),
            (API_KEY_VAR, &self.api_key),
            (DEPLOYMENT_VAR, &self.deployment),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Chat client settings stored in `~/.config/sounding-board/config.json`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: Option<String>,
    pub export_dir: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ClientConfig = serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Server URL: environment first, then the config file, then the default
    pub fn server_url(&self) -> String {
        std::env::var(SERVER_URL_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("sounding-board").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> AzureSettings {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AzureSettings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_complete_credentials() {
        let s = settings(&[
            (ENDPOINT_VAR, "https://example.openai.azure.com"),
            (API_KEY_VAR, "secret"),
            (DEPLOYMENT_VAR, "gpt-4o"),
        ]);
        let creds = s.credentials().unwrap();
        assert_eq!(creds.endpoint, "https://example.openai.azure.com");
        assert_eq!(creds.api_key, "secret");
        assert_eq!(creds.deployment, "gpt-4o");
        assert!(s.missing().is_empty());
    }

    #[test]
    fn test_any_missing_value_blocks_credentials() {
        let full = [
            (ENDPOINT_VAR, "https://example.openai.azure.com"),
            (API_KEY_VAR, "secret"),
            (DEPLOYMENT_VAR, "gpt-4o"),
        ];
        for skip in 0..full.len() {
            let vars: Vec<_> = full.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, v)| *v).collect();
            let s = settings(&vars);
            assert!(s.credentials().is_none());
            assert_eq!(s.missing(), vec![full[skip].0]);
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let s = settings(&[
            (ENDPOINT_VAR, "https://example.openai.azure.com"),
            (API_KEY_VAR, ""),
            (DEPLOYMENT_VAR, "gpt-4o"),
        ]);
        assert!(s.credentials().is_none());
    }

    #[test]
    fn test_system_prompt_default_and_override() {
        assert_eq!(settings(&[]).system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings(&[(SYSTEM_PROMPT_VAR, "")]).system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings(&[(SYSTEM_PROMPT_VAR, "Be brief.")]).system_prompt(), "Be brief.");
    }

    #[test]
    fn test_client_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, ClientConfig::new());
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_client_config_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "server_url": "http://10.0.0.2:3000", "export_dir": "/tmp/exports" }"#,
        )
        .unwrap();

        let loaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(loaded.server_url.as_deref(), Some("http://10.0.0.2:3000"));
        assert_eq!(loaded.export_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_client_config_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(ClientConfig::load_from(&path).is_err());
    }
}
