use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tokenscope_logging::{scope_debug, scope_warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    DispatchError, FailureKind, HealthStatus, TokenizeRequest, TokenizeResponse, TokenizerList,
};

pub const DEFAULT_BASE_URL: &str = "https://cohort3-code.onrender.com";
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(8000);

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub base_url: String,
    /// Client-side deadline for a whole request, body included. This is the
    /// only client timeout; reqwest runs without one of its own.
    pub deadline: Duration,
    pub max_bytes: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            deadline: DEFAULT_DEADLINE,
            max_bytes: 4 * 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sends one tokenize request. Fails with `Timeout` once the deadline
    /// passes (cancelling `cancel`), or `Cancelled` if someone else cancels it.
    async fn tokenize(
        &self,
        request: &TokenizeRequest,
        cancel: &CancellationToken,
    ) -> Result<TokenizeResponse, DispatchError>;

    async fn health(&self) -> Result<HealthStatus, DispatchError>;

    async fn list_tokenizers(&self) -> Result<TokenizerList, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDispatcher {
    settings: DispatchSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestDispatcher {
    pub fn new(settings: DispatchSettings) -> Result<Self, DispatchError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| DispatchError::new(FailureKind::Setup, err.to_string()))?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    pub fn endpoint(&self, path: &str) -> Url {
        endpoint_url(&self.base_url, path)
    }

    async fn with_deadline<T, F>(
        &self,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, DispatchError>> + Send,
    {
        // The sleep and the request future are dropped with the select, so
        // no timer survives the call on any path.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Err(DispatchError::new(FailureKind::Cancelled, "request cancelled"))
            }
            _ = tokio::time::sleep(self.settings.deadline) => {
                cancel.cancel();
                Err(DispatchError::new(
                    FailureKind::Timeout,
                    format!("no response within {} ms", self.settings.deadline.as_millis()),
                ))
            }
            result = work => result,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DispatchError> {
        let url = self.endpoint(path);
        scope_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_json(response).await
    }

    async fn post_tokenize(
        &self,
        request: &TokenizeRequest,
    ) -> Result<TokenizeResponse, DispatchError> {
        let url = self.endpoint("tokenize");
        let body = serde_json::to_vec(request)
            .map_err(|err| DispatchError::new(FailureKind::Decode, err.to_string()))?;
        scope_debug!(
            "POST {} tokenizer={} text_len={}",
            url,
            request.tokenizer,
            request.text.len()
        );
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            // Error bodies are best effort; any read or parse failure just
            // means there is no detail to show.
            let detail = self
                .read_body(response)
                .await
                .ok()
                .and_then(|body| error_detail(&body));
            let message = detail.clone().unwrap_or_else(|| status.to_string());
            return Err(DispatchError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    detail,
                },
                message,
            ));
        }

        let body = self.read_body(response).await?;
        serde_json::from_slice(&body).map_err(|err| {
            DispatchError::new(FailureKind::Decode, format!("invalid response body: {err}"))
        })
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, DispatchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Dispatcher for ReqwestDispatcher {
    async fn tokenize(
        &self,
        request: &TokenizeRequest,
        cancel: &CancellationToken,
    ) -> Result<TokenizeResponse, DispatchError> {
        let result = self.with_deadline(cancel, self.post_tokenize(request)).await;
        match &result {
            Ok(response) => scope_debug!(
                "tokenize ok tokenizer={} count={}",
                response.tokenizer,
                response.count
            ),
            Err(err) if err.kind == FailureKind::Cancelled => {
                scope_debug!("tokenize cancelled")
            }
            Err(err) => scope_warn!("tokenize failed: {} ({})", err.kind, err.message),
        }
        result
    }

    async fn health(&self) -> Result<HealthStatus, DispatchError> {
        let cancel = CancellationToken::new();
        self.with_deadline(&cancel, self.get_json("health")).await
    }

    async fn list_tokenizers(&self) -> Result<TokenizerList, DispatchError> {
        let cancel = CancellationToken::new();
        self.with_deadline(&cancel, self.get_json("tokenizers")).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, DispatchError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| DispatchError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(DispatchError::new(
            FailureKind::InvalidUrl,
            format!("{raw}: expected an http(s) base url"),
        ));
    }
    Ok(url)
}

/// Appends `path` below the base url's path, ignoring a trailing slash.
fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

/// Pulls a readable `detail` out of an error body, if there is one.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(detail) if detail.is_empty() => None,
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> DispatchError {
    DispatchError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

/// Transport failures are all `Network`. `Timeout` is reserved for the
/// deadline in `with_deadline`, so a timeout raised inside reqwest (a proxy or
/// OS-level one) is reported as an unhandled error instead.
fn map_reqwest_error(err: reqwest::Error) -> DispatchError {
    DispatchError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let base = parse_base_url("https://tokens.example.com").unwrap();
        assert_eq!(
            endpoint_url(&base, "tokenize").as_str(),
            "https://tokens.example.com/tokenize"
        );

        let base = parse_base_url("https://tokens.example.com/api/").unwrap();
        assert_eq!(
            endpoint_url(&base, "/health").as_str(),
            "https://tokens.example.com/api/health"
        );
    }

    #[test]
    fn base_url_must_be_http() {
        assert_eq!(
            parse_base_url("not a url").unwrap_err().kind,
            FailureKind::InvalidUrl
        );
        assert_eq!(
            parse_base_url("mailto:someone@example.com").unwrap_err().kind,
            FailureKind::InvalidUrl
        );
        assert!(parse_base_url(" http://127.0.0.1:8000 ").is_ok());
    }

    #[test]
    fn detail_is_extracted_when_present() {
        assert_eq!(
            error_detail(br#"{"detail":"tokenizer unavailable"}"#),
            Some("tokenizer unavailable".to_string())
        );
        assert_eq!(
            error_detail(br#"{"detail":[{"msg":"field required"}]}"#),
            Some(r#"[{"msg":"field required"}]"#.to_string())
        );
    }

    #[test]
    fn detail_tolerates_missing_or_malformed_bodies() {
        assert_eq!(error_detail(b""), None);
        assert_eq!(error_detail(b"<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_detail(br#"{"error":"x"}"#), None);
        assert_eq!(error_detail(br#"{"detail":null}"#), None);
        assert_eq!(error_detail(br#"{"detail":""}"#), None);
        assert_eq!(error_detail(b"[1,2]"), None);
    }

    #[tokio::test]
    async fn transport_timeouts_are_network_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let err = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap()
            .get(format!("{}/health", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let mapped = map_reqwest_error(err);
        assert_eq!(mapped.kind, FailureKind::Network);
    }
}
