use anyhow::{Context, Result};
use dotenvy::dotenv;
use llm_client::{LlmClient, OLLAMA_BASE_URL, OPENAI_BASE_URL};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint for chat and verification models (Ollama by default)
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    /// Key for ICO extraction and embeddings
    pub openai_api_key: Option<String>,
    pub extraction_model: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            llm_base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            llm_api_key: lookup("LLM_API_KEY"),
            openai_api_key: lookup("OPENAI_API_KEY"),
            extraction_model: lookup("EXTRACTION_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            timeout: Duration::from_secs(
                lookup("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|| "120".to_string())
                    .parse()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }

    /// Client for the local chat and verifier models.
    pub fn chat_client(&self) -> Result<LlmClient> {
        LlmClient::ollama()
            .with_base_url(&self.llm_base_url)
            .with_api_key(self.llm_api_key.clone())
            .with_timeout(self.timeout)
            .context("Failed to build chat client")
    }

    /// Client for ICO extraction, evidence gathering and embeddings.
    pub fn evidence_client(&self) -> Result<LlmClient> {
        let api_key = self
            .openai_api_key
            .clone()
            .context("OPENAI_API_KEY must be set")?;

        LlmClient::new(api_key)
            .with_base_url(OPENAI_BASE_URL)
            .with_timeout(self.timeout)
            .context("Failed to build evidence client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.llm_base_url, OLLAMA_BASE_URL);
        assert_eq!(config.extraction_model, "gpt-3.5-turbo");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("LLM_BASE_URL", "http://gpu-box:11434/v1/"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("EMBEDDING_MODEL", "nomic-embed-text"),
        ])
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.embedding_model, "nomic-embed-text");
        assert_eq!(
            config.chat_client().unwrap().base_url(),
            "http://gpu-box:11434/v1"
        );
    }

    #[test]
    fn test_bad_timeout_rejected() {
        assert!(config(&[("LLM_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_evidence_client_needs_key() {
        assert!(config(&[]).unwrap().evidence_client().is_err());
        assert!(config(&[("OPENAI_API_KEY", "sk-test")])
            .unwrap()
            .evidence_client()
            .is_ok());
    }
}
