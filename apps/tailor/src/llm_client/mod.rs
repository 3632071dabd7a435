/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_TRANSIENT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("All {0} API keys exhausted (rate limited or invalid)")]
    KeysExhausted(usize),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Rotating pool of API keys. Free-tier keys rate-limit quickly, so the
/// client cycles through the pool and marks a key exhausted on 429 or 403.
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    exhausted: Vec<bool>,
    cursor: usize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        let exhausted = vec![false; keys.len()];
        KeyRing {
            keys,
            exhausted,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key the next call should use, or None when every key is spent.
    pub fn current(&self) -> Option<&str> {
        if self.exhausted.get(self.cursor).copied().unwrap_or(true) {
            return None;
        }
        self.keys.get(self.cursor).map(String::as_str)
    }

    /// Marks the current key exhausted and advances to the next live key.
    /// Returns false when none remain.
    pub fn mark_exhausted(&mut self) -> bool {
        if let Some(flag) = self.exhausted.get_mut(self.cursor) {
            *flag = true;
        }
        self.advance()
    }

    fn advance(&mut self) -> bool {
        for offset in 1..=self.keys.len() {
            let candidate = (self.cursor + offset) % self.keys.len();
            if !self.exhausted[candidate] {
                self.cursor = candidate;
                return true;
            }
        }
        false
    }

    pub fn remaining(&self) -> usize {
        self.exhausted.iter().filter(|spent| !**spent).count()
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl LlmResponse {
    /// Extracts the text of the first candidate part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

/// The single LLM client used by the generation pipeline. Wraps the Gemini
/// API with key rotation and structured output helpers.
pub struct LlmClient {
    client: Client,
    keys: KeyRing,
}

impl LlmClient {
    pub fn new(keys: Vec<String>) -> Result<Self, LlmError> {
        if keys.is_empty() {
            return Err(LlmError::KeysExhausted(0));
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            keys: KeyRing::new(keys),
        })
    }

    /// Makes a raw call to the Gemini API, returning the full response.
    ///
    /// Rate-limit responses (429/403) spend the current key and rotate;
    /// the loop only gives up on rotation once every key in the ring is
    /// exhausted. Transient failures (network errors, 5xx) retry with
    /// backoff against a separate budget that does not spend keys.
    pub async fn call(&mut self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            system_instruction: (!system.is_empty()).then(|| GeminiContent {
                parts: vec![GeminiPart { text: system }],
            }),
        };

        let mut transient_failures: u32 = 0;

        while let Some(key) = self.keys.current() {
            let url = format!("{GEMINI_API_URL}/{MODEL}:generateContent?key={key}");
            let response = match self.client.post(&url).json(&request_body).send().await {
                Ok(r) => r,
                Err(e) => {
                    transient_failures += 1;
                    if transient_failures >= MAX_TRANSIENT_RETRIES {
                        return Err(LlmError::Http(e));
                    }
                    backoff(transient_failures).await;
                    continue;
                }
            };

            let status = response.status().as_u16();
            match classify_status(status) {
                Disposition::Success => {
                    let llm_response: LlmResponse = response.json().await?;
                    debug!("LLM call succeeded");
                    return Ok(llm_response);
                }
                Disposition::RotateKey => {
                    let body = response.text().await.unwrap_or_default();
                    warn!(
                        "API key rate limited ({}), rotating ({} keys remaining): {}",
                        status,
                        self.keys.remaining().saturating_sub(1),
                        body
                    );
                    self.keys.mark_exhausted();
                }
                Disposition::Retry => {
                    let body = response.text().await.unwrap_or_default();
                    transient_failures += 1;
                    if transient_failures >= MAX_TRANSIENT_RETRIES {
                        return Err(LlmError::Api {
                            status,
                            message: body,
                        });
                    }
                    warn!("LLM API returned {}: {}", status, body);
                    backoff(transient_failures).await;
                }
                Disposition::Fatal => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(LlmError::Api {
                        status,
                        message: body,
                    });
                }
            }
        }

        Err(LlmError::KeysExhausted(self.keys.len()))
    }

    /// Convenience method that calls the LLM and deserializes the text
    /// response as JSON. The prompt must instruct the model to return
    /// valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &mut self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

/// What one HTTP status means for the call loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Success,
    /// Rate limit or quota rejection: spend this key, try the next one.
    RotateKey,
    /// Server-side failure: retry with backoff, same key.
    Retry,
    /// Client-side failure: no retry will help.
    Fatal,
}

fn classify_status(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        429 | 403 => Disposition::RotateKey,
        500..=599 => Disposition::Retry,
        _ => Disposition::Fatal,
    }
}

async fn backoff(failures: u32) {
    // Exponential backoff: 1s, 2s
    let delay = std::time::Duration::from_millis(1000 * (1 << (failures - 1)));
    warn!("transient LLM failure, retrying after {}ms...", delay.as_millis());
    tokio::time::sleep(delay).await;
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
