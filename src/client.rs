//! HTTP client for the hosted platform services.
//!
//! [`PlatformClient::connect`] performs the session login once and keeps the
//! bearer token for the life of the process; the client is then passed by
//! reference to everything that needs it. Request and response bodies are
//! typed records, and the model identifier and prompt travel as JSON fields,
//! never interpolated into a query body.
//!
//! There is deliberately no retry loop here: every failure is terminal for
//! the current interaction, and the only timeout is the explicit one set on
//! the underlying client from `platform.timeout_secs`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::models::{CategoryFilter, ModelId, SearchResponse};
use crate::platform::Platform;

/// Columns requested from the search service for every query.
pub const SEARCH_COLUMNS: [&str; 3] = ["chunk", "relative_path", "category"];

pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    search_service: String,
    stage: String,
    url_ttl_secs: u64,
    token: String,
}

impl PlatformClient {
    /// Establish the authenticated session and resolve the service handles.
    ///
    /// Called at most once per process, by the top-level orchestrator. On
    /// failure the caller keeps running and surfaces the error; nothing else
    /// may issue requests without a connected client.
    pub async fn connect(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.platform.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = config.platform.base_url.trim_end_matches('/').to_string();

        let body = LoginRequest {
            account: &config.credentials.account,
            user: &config.credentials.user,
            password: &config.credentials.password,
            role: &config.credentials.role,
            warehouse: &config.credentials.warehouse,
            database: &config.credentials.database,
            schema: &config.credentials.schema,
        };

        let resp = http
            .post(format!("{}/session/login", base_url))
            .json(&body)
            .send()
            .await
            .context("Session login request failed")?;
        let login: LoginResponse = expect_json(resp, "session login").await?;

        Ok(Self {
            http,
            base_url,
            search_service: config.platform.search_service.clone(),
            stage: config.platform.stage.clone(),
            url_ttl_secs: config.platform.url_ttl_secs,
            token: login.token,
        })
    }
}

#[async_trait]
impl Platform for PlatformClient {
    async fn list_categories(&self) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(format!(
                "{}/search/{}/categories",
                self.base_url, self.search_service
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Category request failed")?;
        let body: CategoriesResponse = expect_json(resp, "category listing").await?;
        Ok(body.categories)
    }

    async fn search(
        &self,
        query: &str,
        filter: &CategoryFilter,
        limit: usize,
    ) -> Result<SearchResponse> {
        let body = SearchRequest {
            query,
            columns: SEARCH_COLUMNS,
            filter: filter.to_filter_object(),
            limit,
        };
        let resp = self
            .http
            .post(format!(
                "{}/search/{}",
                self.base_url, self.search_service
            ))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Search request failed")?;
        expect_json(resp, "search").await
    }

    async fn complete(&self, model: &ModelId, prompt: &str) -> Result<Option<String>> {
        let body = CompleteRequest {
            model: model.as_str(),
            prompt,
        };
        let resp = self
            .http
            .post(format!("{}/complete", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Completion request failed")?;
        let body: CompleteResponse = expect_json(resp, "completion").await?;
        Ok(body.response)
    }

    async fn list_documents(&self) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(format!("{}/stage/{}/files", self.base_url, self.stage))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Document listing request failed")?;
        let body: FilesResponse = expect_json(resp, "document listing").await?;
        Ok(body.files)
    }

    async fn signed_url(&self, path: &str) -> Result<String> {
        let body = SignedUrlRequest {
            path,
            expires_in: self.url_ttl_secs,
        };
        let resp = self
            .http
            .post(format!(
                "{}/stage/{}/signed-url",
                self.base_url, self.stage
            ))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Signed URL request failed")?;
        let body: SignedUrlResponse = expect_json(resp, "URL signing").await?;
        Ok(body.url)
    }
}

/// Check the status and decode the JSON body, naming the operation in every
/// error path so the diagnostic reads "search failed with 403: ...".
async fn expect_json<T: DeserializeOwned>(resp: reqwest::Response, op: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("{} failed with {}: {}", op, status, body);
    }
    resp.json::<T>()
        .await
        .with_context(|| format!("{}: invalid response body", op))
}

// ============ Wire types ============

#[derive(Serialize)]
struct LoginRequest<'a> {
    account: &'a str,
    user: &'a str,
    password: &'a str,
    role: &'a str,
    warehouse: &'a str,
    database: &'a str,
    schema: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    columns: [&'static str; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    limit: usize,
}

#[derive(Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct CompleteResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Serialize)]
struct SignedUrlRequest<'a> {
    path: &'a str,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_all_omits_filter() {
        let body = SearchRequest {
            query: "lubricant",
            columns: SEARCH_COLUMNS,
            filter: CategoryFilter::All.to_filter_object(),
            limit: 3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("filter").is_none());
        assert_eq!(json["limit"], 3);
        assert_eq!(
            json["columns"],
            serde_json::json!(["chunk", "relative_path", "category"])
        );
    }

    #[test]
    fn test_search_request_category_carries_eq_filter() {
        let filter = CategoryFilter::Category("Bikes".to_string());
        let body = SearchRequest {
            query: "lubricant",
            columns: SEARCH_COLUMNS,
            filter: filter.to_filter_object(),
            limit: 3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["filter"],
            serde_json::json!({ "@eq": { "category": "Bikes" } })
        );
    }

    #[test]
    fn test_complete_response_missing_field_is_none() {
        let body: CompleteResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.response, None);

        let body: CompleteResponse =
            serde_json::from_str(r#"{"response": "Use the supplied oil."}"#).unwrap();
        assert_eq!(body.response.as_deref(), Some("Use the supplied oil."));
    }

    #[test]
    fn test_complete_request_binds_model_and_prompt_as_fields() {
        let body = CompleteRequest {
            model: ModelId::MistralLarge.as_str(),
            prompt: "Question:\nhello\nAnswer:",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistral-large");
        assert_eq!(json["prompt"], "Question:\nhello\nAnswer:");
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.is_empty());
    }
}
