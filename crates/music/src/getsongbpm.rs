//! Client for the GetSongBPM search API, used as a tempo-only fallback.

use std::time::Duration;

use serde_json::Value;

pub const DEFAULT_API_URL: &str = "https://api.getsongbpm.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GetSongBpmApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetSongBpmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GetSongBPM API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl GetSongBpmApi {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Tempo of the best match for `song` (and `artist`, when known).
    ///
    /// `Ok(None)` means the search ran but found no usable tempo.
    pub async fn search_tempo(
        &self,
        song: &str,
        artist: Option<&str>,
    ) -> Result<Option<u32>, GetSongBpmError> {
        let lookup = match artist.filter(|a| !a.is_empty()) {
            Some(artist) => format!("{song} {artist}"),
            None => song.to_string(),
        };

        let response = self
            .client
            .get(format!("{}/search/", self.api_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("type", "song"),
                ("lookup", lookup.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GetSongBpmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let tempo = first_result_tempo(&body);
        tracing::debug!(lookup = %lookup, ?tempo, "GetSongBPM search");
        Ok(tempo)
    }
}

/// Tempo of the first search hit.
///
/// A miss comes back as `{"search": {"error": ...}}` rather than an empty
/// array, and tempos are usually strings.
fn first_result_tempo(body: &Value) -> Option<u32> {
    let first = body.get("search")?.as_array()?.first()?;
    let tempo = match first.get("tempo")? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    (tempo > 0.0).then(|| tempo as u32)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_tempo_is_parsed() {
        let body = json!({ "search": [{ "tempo": "128", "key_of": "Am" }, { "tempo": "90" }] });
        assert_eq!(first_result_tempo(&body), Some(128));
    }

    #[test]
    fn numeric_tempo_is_truncated() {
        let body = json!({ "search": [{ "tempo": 121.7 }] });
        assert_eq!(first_result_tempo(&body), Some(121));
    }

    #[test]
    fn no_result_object_is_none() {
        let body = json!({ "search": { "error": "no result" } });
        assert_eq!(first_result_tempo(&body), None);
    }

    #[test]
    fn empty_or_zero_tempo_is_none() {
        assert_eq!(first_result_tempo(&json!({ "search": [] })), None);
        assert_eq!(first_result_tempo(&json!({ "search": [{ "tempo": "" }] })), None);
        assert_eq!(first_result_tempo(&json!({ "search": [{ "tempo": "0" }] })), None);
    }
}
