use async_trait::async_trait;
use digest_core::{DigestError, Narrator, NarratorConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::assembler::narrative_prompt;

#[derive(Debug, Serialize)]
struct NarrateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct NarrateResponse {
    text: String,
}

/// HTTP client for the hosted narrative endpoint.
#[derive(Clone)]
pub struct NarratorClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NarratorClient {
    pub fn new(config: &NarratorConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Narrator for NarratorClient {
    async fn narrate(&self, prompt: &str) -> Result<String, DigestError> {
        let mut request = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&NarrateRequest { prompt });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DigestError::Narrative(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DigestError::Narrative(format!(
                "Status: {}",
                response.status()
            )));
        }

        let parsed: NarrateResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Narrative(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// Ask the narrator for prose over the assembled report. The narrative step
/// is best-effort: no narrator configured, or any failure talking to it,
/// degrades to the base report so the batch always produces output.
pub async fn narrate_or_fallback(narrator: Option<&dyn Narrator>, base_report: &str) -> String {
    let Some(narrator) = narrator else {
        return base_report.to_string();
    };

    let prompt = narrative_prompt(base_report);
    match narrator.narrate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Narrator unavailable, falling back to base report: {}", e);
            base_report.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNarrator(Result<String, ()>);

    #[async_trait]
    impl Narrator for FixedNarrator {
        async fn narrate(&self, _prompt: &str) -> Result<String, DigestError> {
            self.0
                .clone()
                .map_err(|_| DigestError::Narrative("service down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fallback_without_narrator() {
        let out = narrate_or_fallback(None, "base").await;
        assert_eq!(out, "base");
    }

    #[tokio::test]
    async fn test_fallback_on_narrator_failure() {
        let narrator = FixedNarrator(Err(()));
        let out = narrate_or_fallback(Some(&narrator), "base").await;
        assert_eq!(out, "base");
    }

    #[tokio::test]
    async fn test_narrated_text_wins() {
        let narrator = FixedNarrator(Ok("polished prose".to_string()));
        let out = narrate_or_fallback(Some(&narrator), "base").await;
        assert_eq!(out, "polished prose");
    }
}
