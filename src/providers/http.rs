//! JSON-over-HTTP plumbing shared by the vendor adapters.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FlowError;

/// Vendor error envelope: `{"error": {"type": "...", "message": "..."}}`.
///
/// OpenAI and Anthropic both use this shape.
#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

/// POST `body` and decode a successful response into `R`.
///
/// Non-2xx responses become `FlowError::ProviderApi` carrying the vendor
/// message and the raw JSON body when there is one.
pub(crate) async fn post_json<B, R>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    body: &B,
) -> Result<R, FlowError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| FlowError::HttpError(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| FlowError::HttpError(e.to_string()))?;

    if !status.is_success() {
        return Err(api_error_from_body(provider, status, &text));
    }

    serde_json::from_str(&text)
        .map_err(|e| FlowError::ParseError(format!("Invalid {provider} response: {e}")))
}

fn api_error_from_body(provider: &str, status: reqwest::StatusCode, body: &str) -> FlowError {
    let details = serde_json::from_str::<Value>(body).ok();
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };
    FlowError::ProviderApi {
        provider: provider.to_string(),
        status: Some(status.as_u16()),
        message,
        details,
    }
}
