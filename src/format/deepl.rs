//! DeepL v2 API client implementing [`Translator`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::TranslationConfig;
use crate::core::errors::{KnxError, Result};
use crate::format::translate::Translator;

/// HTTP client for `POST /v2/translate`
pub struct DeepLTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: Vec<&'a str>,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
    #[serde(default)]
    #[allow(dead_code)]
    detected_source_language: Option<String>,
}

impl DeepLTranslator {
    /// Create a client for `endpoint` (e.g. `https://api-free.deepl.com/v2`)
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| KnxError::translation(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from configuration, reading the key from the environment.
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            KnxError::config_field(
                format!("{} environment variable not set", config.api_key_env),
                "translation.api_key_env",
            )
        })?;
        Self::new(
            config.api_endpoint.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn authorization(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    async fn error_from_response(response: reqwest::Response, action: &str) -> KnxError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        KnxError::translation_status(format!("DeepL {action} failed ({status}): {body}"), status)
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String> {
        let request = TranslateRequest {
            text: vec![text],
            target_lang,
            source_lang,
        };

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .header("Authorization", self.authorization())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "translate").await);
        }

        let body: TranslateResponse = response.json().await?;
        body.translations
            .into_iter()
            .next()
            .map(|translation| translation.text)
            .ok_or_else(|| KnxError::translation("No translations in DeepL response"))
    }

    async fn check_credential(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/usage", self.endpoint))
            .header("Authorization", self.authorization())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, "usage check").await)
        }
    }
}
