//! Shared client utilities and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use torrpeddo_api::models::ProblemDetails;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
}

impl AppContext {
    /// Build a client that tags every request with `trace_id`.
    pub(crate) fn new(base_url: Url, timeout_secs: u64, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, base_url })
    }

    pub(crate) fn endpoint(&self, path: &str) -> CliResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))
    }

    /// Send `request` and decode a successful JSON body; failures become CLI errors.
    pub(crate) async fn send_json<T>(&self, path: &str, request: RequestBuilder) -> CliResult<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|err| CliError::failure(anyhow!("request to {path} failed: {err}")))?;
        if !response.status().is_success() {
            return Err(classify_problem(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse {path} response: {err}")))
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Request identifier for one CLI invocation.
#[must_use]
pub(crate) fn trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Classify an HTTP response into a CLI error.
pub(crate) async fn classify_problem(response: Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let body_text = String::from_utf8_lossy(&bytes).to_string();
    let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();

    let message = problem
        .as_ref()
        .and_then(|p| p.detail.clone())
        .unwrap_or_else(|| {
            problem
                .as_ref()
                .map_or_else(|| body_text.trim().to_string(), |p| p.title.clone())
        });

    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::CONFLICT
    ) {
        CliError::validation(message)
    } else {
        let detail = if let Some(problem) = problem {
            format!("{} (status {})", message, problem.status)
        } else if !body_text.is_empty() {
            format!("{message} (status {status})")
        } else {
            format!("request failed with status {status}")
        };
        CliError::failure(anyhow!(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn exit_codes_separate_validation_from_failure() {
        let validation = CliError::validation("bad input");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad input");

        let failure = CliError::failure(anyhow!("boom"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "boom");
        assert_eq!(failure.to_string(), "cli error");
    }

    #[test]
    fn trace_ids_are_valid_header_values() {
        let id = trace_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, trace_id());
        assert!(HeaderValue::from_str(&id).is_ok());
        assert!(parse_url("not a url").is_err());
    }

    #[tokio::test]
    async fn problem_documents_are_classified_by_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/conflict");
            then.status(409).json_body(json!({
                "type": "https://torrpeddo.dev/problems/conflict",
                "title": "Invalid transfer state",
                "status": 409,
                "detail": "cannot pause a failed transfer"
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(500).body("exploded");
        });

        let client = Client::new();
        let conflict = client.get(server.url("/conflict")).send().await?;
        let err = classify_problem(conflict).await;
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "cannot pause a failed transfer");

        let broken = client.get(server.url("/broken")).send().await?;
        let err = classify_problem(broken).await;
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("exploded"));
        Ok(())
    }

    #[tokio::test]
    async fn requests_carry_the_trace_header() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/health")
                .header(HEADER_REQUEST_ID, "trace-1");
            then.status(200).json_body(json!({ "ok": true }));
        });
        let ctx = AppContext::new(server.base_url().parse()?, 5, "trace-1")?;
        let url = ctx.endpoint("/health")?;
        let body: serde_json::Value = ctx.send_json("/health", ctx.client.get(url)).await?;
        assert_eq!(body["ok"], true);
        mock.assert();
        Ok(())
    }
}
