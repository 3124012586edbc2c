//! A model provider for the Gemini API, authenticated with an AI Studio
//! API key.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use quill_model::{
    ErrorKind, ModelInfo, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use io::{Chunks, Sse};
use proto::{ApiError, ErrorBody, ListModelsResponse};
use response::GeminiResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";
const LIST_MODELS_PAGE_SIZE: &str = "1000";

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_builder() || err.is_decode() {
            ErrorKind::Other
        } else {
            ErrorKind::Transport
        };
        Self::new(format!("{err}"), kind)
    }

    fn from_api_error(status: Option<StatusCode>, api_error: ApiError) -> Self {
        let status = status
            .or_else(|| StatusCode::from_u16(api_error.code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ErrorKind::Authentication
            }
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
            _ if api_error.is_invalid_api_key() => ErrorKind::Authentication,
            _ if api_error.status == "RESOURCE_EXHAUSTED" => {
                ErrorKind::RateLimitExceeded
            }
            _ => ErrorKind::Other,
        };
        let message = if api_error.message.is_empty() {
            format!("{status}")
        } else {
            api_error.message
        };
        Self::new(message, kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
///
/// Creating the provider performs no I/O, the API key is checked by the
/// service on the first request.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(API_KEY_HEADER, &self.config.api_key);
        match self.config.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let gemini_req = proto::create_request(req);
        let url = format!(
            "{}?alt=sse",
            self.config.method_url("streamGenerateContent")
        );
        debug!(model = %self.config.model, "sending generation request");
        let resp_fut = self
            .authorized(self.client.post(url))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&gemini_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(Error::from_reqwest)?;
            let resp = check_status(resp).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(GeminiResponse::from_sse(sse))
        }
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static
    {
        let this = self.clone();
        async move {
            let base = format!("{}/models", this.config.base_url);
            let mut models = vec![];
            let mut page_token: Option<String> = None;
            loop {
                let mut params = vec![("pageSize", LIST_MODELS_PAGE_SIZE)];
                if let Some(token) = &page_token {
                    params.push(("pageToken", token.as_str()));
                }
                let url = Url::parse_with_params(&base, &params).map_err(
                    |err| Error::new(format!("{err}"), ErrorKind::Other),
                )?;

                let resp = this
                    .authorized(this.client.get(url))
                    .send()
                    .await
                    .map_err(Error::from_reqwest)?;
                let page: ListModelsResponse = check_status(resp)
                    .await?
                    .json()
                    .await
                    .map_err(Error::from_reqwest)?;
                trace!("got {} models", page.models.len());

                models.extend(page.models.into_iter().map(ModelInfo::from));
                match page.next_page_token {
                    Some(token) if !token.is_empty() => {
                        page_token = Some(token)
                    }
                    _ => break,
                }
            }
            Ok(models)
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    debug!(%status, "request failed: {body}");
    let err = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(body) => Error::from_api_error(Some(status), body.error),
        Err(_) => Error::from_api_error(
            Some(status),
            ApiError {
                code: status.as_u16(),
                message: body,
                status: String::new(),
                details: vec![],
            },
        ),
    };
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, status: &str, reason: Option<&str>) -> ApiError {
        ApiError {
            code,
            message: "boom".to_owned(),
            status: status.to_owned(),
            details: reason
                .map(|r| proto::ErrorDetail {
                    reason: Some(r.to_owned()),
                })
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_error_classification() {
        let err = Error::from_api_error(
            Some(StatusCode::BAD_REQUEST),
            api_error(400, "INVALID_ARGUMENT", Some("API_KEY_INVALID")),
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "boom");

        let err = Error::from_api_error(
            Some(StatusCode::FORBIDDEN),
            api_error(403, "PERMISSION_DENIED", None),
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let err = Error::from_api_error(
            Some(StatusCode::TOO_MANY_REQUESTS),
            api_error(429, "RESOURCE_EXHAUSTED", None),
        );
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        let err = Error::from_api_error(
            Some(StatusCode::BAD_REQUEST),
            api_error(400, "INVALID_ARGUMENT", None),
        );
        assert_eq!(err.kind(), ErrorKind::Other);

        let err = Error::from_api_error(None, api_error(503, "UNAVAILABLE", None));
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_empty_message_falls_back_to_status() {
        let mut api_error = api_error(404, "NOT_FOUND", None);
        api_error.message.clear();
        let err =
            Error::from_api_error(Some(StatusCode::NOT_FOUND), api_error);
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn test_new_provider_keeps_config() {
        let config = GeminiConfigBuilder::with_api_key("k")
            .with_model("gemini-2.0-flash")
            .build();
        let provider = GeminiProvider::new(config.clone());
        assert_eq!(provider.config(), &config);
        assert_eq!(provider.config().model(), "gemini-2.0-flash");
    }
}
