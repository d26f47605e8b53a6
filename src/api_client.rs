use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::ticket::{CreatedTicket, Draft, PreviewContent, TicketRequest};

const PREVIEW_PATH: &str = "/preview-ticket";
const CREATE_PATH: &str = "/create-ticket";
const HEALTH_PATH: &str = "/health";

pub const PREVIEW_FAILED: &str = "Failed to generate preview";
pub const CONTENT_FAILED: &str = "Failed to generate content";
pub const CREATE_FAILED: &str = "Failed to create ticket";
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Errors surfaced by the ticket backend client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request never completed (connection refused, reset, ...).
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not the JSON we expected.
    #[error("{message}")]
    Parse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Non-2xx status; message is the server `detail` or a fallback.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// 2xx with `success: false`; message is the server `error` or a fallback.
    #[error("{message}")]
    Rejected { message: String },
}

impl ApiError {
    /// HTTP status for server-side failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse {
            message: err.to_string(),
            source: err,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreviewResponse {
    #[serde(default)]
    success: bool,
    generated_content: Option<PreviewContent>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    success: bool,
    jira_key: Option<String>,
    jira_url: Option<String>,
    error: Option<String>,
}

/// Backend and generator model status reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub ollama_host: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub model_available: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.model_available
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// `detail` may be a plain string or a structured validation error list.
fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// HTTP client for the ticket preview/create backend.
#[derive(Debug, Clone)]
pub struct TicketClient {
    base_url: String,
    client: ReqwestClient,
}

impl TicketClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: ReqwestClient::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Send a request and decode the body as JSON regardless of status.
    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<(StatusCode, Value), ApiError> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
        Ok(serde_json::from_value(body)?)
    }

    /// Ask the backend to generate a summary/description for a draft.
    pub async fn preview_ticket(&self, draft: &Draft) -> Result<PreviewContent, ApiError> {
        tracing::debug!(project = %draft.project, user_story = draft.user_story, "POST {}", PREVIEW_PATH);
        let req = self.request(Method::POST, PREVIEW_PATH).json(draft);
        let (status, body) = self.execute(req).await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: detail_message(&body).unwrap_or_else(|| PREVIEW_FAILED.to_string()),
            });
        }

        let parsed: PreviewResponse = Self::decode(body)?;
        match parsed.generated_content {
            Some(content) if parsed.success => Ok(content),
            _ => Err(ApiError::Rejected {
                message: non_empty(parsed.error).unwrap_or_else(|| CONTENT_FAILED.to_string()),
            }),
        }
    }

    /// Create the ticket in the tracker.
    pub async fn create_ticket(&self, ticket: &TicketRequest) -> Result<CreatedTicket, ApiError> {
        tracing::debug!(project = %ticket.project, "POST {}", CREATE_PATH);
        let req = self.request(Method::POST, CREATE_PATH).json(ticket);
        let (status, body) = self.execute(req).await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: detail_message(&body).unwrap_or_else(|| CREATE_FAILED.to_string()),
            });
        }

        let parsed: CreateResponse = Self::decode(body)?;
        if !parsed.success {
            return Err(ApiError::Rejected {
                message: non_empty(parsed.error).unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            });
        }

        Ok(CreatedTicket {
            jira_key: parsed.jira_key.unwrap_or_default(),
            jira_url: parsed.jira_url.unwrap_or_default(),
        })
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let req = self.request(Method::GET, HEALTH_PATH);
        let (status, body) = self.execute(req).await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: detail_message(&body).unwrap_or_else(|| format!("health check returned {}", status)),
            });
        }
        Self::decode(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft() -> Draft {
        Draft {
            username: "jdoe".to_string(),
            project: "HI".to_string(),
            prompt: "Please install samtools in softpack".to_string(),
            softpack_admin: false,
            user_story: true,
        }
    }

    fn ticket() -> TicketRequest {
        draft().ticket_request("Install samtools", "Install samtools 1.19 into softpack.")
    }

    #[tokio::test]
    async fn preview_success_returns_generated_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .and(body_json(json!({
                "username": "jdoe",
                "project": "HI",
                "prompt": "Please install samtools in softpack",
                "softpackAdmin": false,
                "userStory": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "generated_content": {
                    "summary": "Install samtools",
                    "description": "Install samtools 1.19 into softpack."
                },
                "error": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let content = client.preview_ticket(&draft()).await.expect("preview");

        assert_eq!(content.summary, "Install samtools");
        assert_eq!(content.description, "Install samtools 1.19 into softpack.");
    }

    #[tokio::test]
    async fn preview_success_false_surfaces_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "generated_content": null,
                "error": "Model gemma3:27b is not available on the Ollama server."
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();

        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(
            err.to_string(),
            "Model gemma3:27b is not available on the Ollama server."
        );
    }

    #[tokio::test]
    async fn preview_success_false_without_error_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();
        assert_eq!(err.to_string(), CONTENT_FAILED);
    }

    #[tokio::test]
    async fn preview_non_2xx_uses_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "detail": "Failed to parse Ollama response: EOF"
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "Failed to parse Ollama response: EOF");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn preview_non_2xx_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();
        assert_eq!(err.to_string(), PREVIEW_FAILED);
    }

    #[tokio::test]
    async fn structured_detail_is_rendered_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{ "loc": ["body", "prompt"], "msg": "field required" }]
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();
        assert!(err.to_string().contains("field required"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preview-ticket"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.preview_ticket(&draft()).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Grab a free port, then release it so nothing listens there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };

        let client = TicketClient::new(&format!("http://127.0.0.1:{}", port));
        let err = client.preview_ticket(&draft()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[tokio::test]
    async fn create_success_returns_key_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-ticket"))
            .and(body_json(json!({
                "username": "jdoe",
                "project": "HI",
                "summary": "Install samtools",
                "description": "Install samtools 1.19 into softpack.",
                "softpackAdmin": false,
                "userStory": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "jira_key": "HI-1234",
                "jira_url": "https://jira.sanger.ac.uk/browse/HI-1234",
                "error": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TicketClient::new(&format!("{}/", server.uri()));
        let created = client.create_ticket(&ticket()).await.expect("create");

        assert_eq!(created.jira_key, "HI-1234");
        assert_eq!(created.jira_url, "https://jira.sanger.ac.uk/browse/HI-1234");
    }

    #[tokio::test]
    async fn create_success_false_is_rejected_with_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-ticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "Field 'reporter' is invalid"
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.create_ticket(&ticket()).await.unwrap_err();

        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(err.to_string(), "Field 'reporter' is invalid");
    }

    #[tokio::test]
    async fn create_success_false_with_empty_error_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-ticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": ""
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.create_ticket(&ticket()).await.unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[tokio::test]
    async fn create_non_2xx_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-ticket"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "detail": null })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let err = client.create_ticket(&ticket()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(err.to_string(), CREATE_FAILED);
    }

    #[tokio::test]
    async fn health_reports_model_availability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy",
                "ollama_host": "http://ollama:11434",
                "default_model": "gemma3:27b",
                "model_available": true
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let health = client.health().await.expect("health");

        assert!(health.is_ready());
        assert_eq!(health.default_model.as_deref(), Some("gemma3:27b"));
    }

    #[tokio::test]
    async fn health_error_status_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "model_available": false,
                "error": "connection refused"
            })))
            .mount(&server)
            .await;

        let client = TicketClient::new(&server.uri());
        let health = client.health().await.expect("health");

        assert!(!health.is_ready());
        assert_eq!(health.error.as_deref(), Some("connection refused"));
    }
}
