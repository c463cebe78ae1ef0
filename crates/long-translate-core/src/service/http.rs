use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::{JobHandle, JobService, ResultStatus, TranslatedText, TranslationRequest};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};

/// Submit endpoint path
pub const SUBMIT_PATH: &str = "/v1/llm/translate";
/// Result endpoint path
pub const RESULT_PATH: &str = "/v1/llm/translate/result";

const USER_TOKEN_HEADER: &str = "x-user-token";

/// HTTP + JSON client for the long-translate service.
pub struct HttpJobService {
    client: Client,
    /// Base URL without trailing slash
    api_base: String,
    user_token: String,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    text: &'a str,
    language: &'a str,
}

/// On submit, `translation` carries the job id.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    translation: String,
}

#[derive(Debug, Serialize)]
struct ResultBody<'a> {
    md5: &'a str,
}

/// On result, `translation` carries the final text.
#[derive(Debug, Deserialize)]
struct ResultResponse {
    translation: String,
}

impl HttpJobService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_token: config.user_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.url(path);
        debug!("POST {}", url);

        self.client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(USER_TOKEN_HEADER, &self.user_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                Error::transport(&e)
            })
    }
}

async fn read_body(response: Response) -> Result<String> {
    response.text().await.map_err(|e| Error::transport(&e))
}

#[async_trait]
impl JobService for HttpJobService {
    fn name(&self) -> &'static str {
        "long-translate HTTP"
    }

    async fn submit(&self, request: &TranslationRequest) -> Result<JobHandle> {
        let body = SubmitBody {
            text: &request.payload.content,
            language: &request.language,
        };
        let response = self.post(SUBMIT_PATH, &body).await?;
        let status = response.status();

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Submit rejected: {} - {}", status, body);
            return Err(Error::ServiceRejected {
                status: status.as_u16(),
                body,
            });
        }

        let text = read_body(response).await?;
        let parsed: SubmitResponse = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("submit response: {e}")))?;

        if parsed.translation.is_empty() {
            return Err(Error::InvalidResponse("submit response has an empty job id".to_string()));
        }

        Ok(JobHandle::new(parsed.translation))
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultStatus> {
        let body = ResultBody { md5: handle.as_str() };
        let response = self.post(RESULT_PATH, &body).await?;

        match response.status().as_u16() {
            200 => {
                let text = read_body(response).await?;
                let parsed: ResultResponse = serde_json::from_str(&text)
                    .map_err(|e| Error::InvalidResponse(format!("result response: {e}")))?;
                Ok(ResultStatus::Ready(TranslatedText::new(parsed.translation)))
            }
            404 => Ok(ResultStatus::NotReady),
            status => {
                let body = response.text().await.unwrap_or_default();
                Ok(ResultStatus::Unexpected { status, body })
            }
        }
    }
}
