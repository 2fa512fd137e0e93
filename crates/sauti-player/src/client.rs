//! HTTP client for the TTS service

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use sauti_core::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Synthesis request body, mirroring the service's form contract.
#[derive(Debug, Clone, Serialize)]
pub struct TtsRequest {
    pub text: String,
    pub voice_mode: String,
    #[serde(rename = "predefined_voice_id", skip_serializing_if = "Option::is_none")]
    pub predefined_voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_audio_filename: Option<String>,
    pub output_format: String,
    pub split_text: bool,
    pub chunk_size: u32,
    pub temperature: f32,
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub speed_factor: f32,
    pub seed: u32,
    pub language: String,
}

/// Client for the synthesis endpoints.
pub struct TtsClient {
    base_url: String,
    http: reqwest::Client,
}

impl TtsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Request streaming synthesis, yielding raw chunks as they arrive.
    pub fn stream(&self, request: TtsRequest) -> impl Stream<Item = Result<Bytes>> {
        let http = self.http.clone();
        let url = format!("{}/tts/stream", self.base_url);
        try_stream! {
            debug!("Streaming synthesis from {}", url);
            let response = http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Transport(format!("Request to {} failed: {}", url, e)))?;
            let response = check_status(response).await?;

            let mut chunks = response.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                let chunk =
                    chunk.map_err(|e| Error::Transport(format!("Stream interrupted: {}", e)))?;
                yield chunk;
            }
        }
    }

    /// Request batch synthesis and return the complete audio body.
    pub async fn generate(&self, request: TtsRequest) -> Result<Bytes> {
        let url = format!("{}/tts", self.base_url);
        debug!("Batch synthesis from {}", url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request to {} failed: {}", url, e)))?;
        let response = check_status(response).await?;
        response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))
    }
}

/// Turn a non-success response into an error, preferring the service's
/// own `detail` message when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(|d| d.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
    Err(Error::Transport(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TtsRequest {
        TtsRequest {
            text: "hello".to_string(),
            voice_mode: "predefined".to_string(),
            predefined_voice: Some("calm_female".to_string()),
            reference_audio_filename: None,
            output_format: "wav".to_string(),
            split_text: true,
            chunk_size: 120,
            temperature: 0.8,
            exaggeration: 0.5,
            cfg_weight: 0.5,
            speed_factor: 1.0,
            seed: 0,
            language: "en".to_string(),
        }
    }

    #[test]
    fn predefined_request_omits_the_clone_field() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["voice_mode"], "predefined");
        assert_eq!(json["predefined_voice_id"], "calm_female");
        assert!(json.get("reference_audio_filename").is_none());
        assert_eq!(json["chunk_size"], 120);
        assert_eq!(json["split_text"], true);
    }

    #[test]
    fn clone_request_carries_the_reference_file() {
        let mut request = request();
        request.voice_mode = "clone".to_string();
        request.predefined_voice = None;
        request.reference_audio_filename = Some("me.wav".to_string());

        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["voice_mode"], "clone");
        assert_eq!(json["reference_audio_filename"], "me.wav");
        assert!(json.get("predefined_voice_id").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = TtsClient::new("http://localhost:8004/");
        assert_eq!(client.base_url, "http://localhost:8004");
    }
}
