//! GitHub REST implementation of the comment-store collaborator.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use waymark_core::{CommentPage, CommentStore, IssueComment, IssueRef, TransportError};

use crate::transport::{
    is_retryable_error, is_retryable_status, parse_retry_after, retry_delay, truncate_body,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
const ERROR_BODY_LIMIT: usize = 800;

/// Issue-comment client for the GitHub REST API.
///
/// Retries rate limits (429, honoring Retry-After), server errors, and
/// connection-level failures up to the configured attempt budget; everything
/// else maps straight to a [`TransportError`]. The token is expected to be
/// already obtained (a workflow's `GITHUB_TOKEN`, a PAT).
#[derive(Clone)]
pub struct GithubCommentClient {
    http: reqwest::Client,
    api_base: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubCommentClient {
    pub fn new(
        api_base: impl Into<String>,
        token: &str,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("waymark-comment-tracker"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        let api_base: String = api_base.into();
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    fn comments_url(&self, issue: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, issue.owner, issue.repo, issue.number
        )
    }

    fn comment_url(&self, issue: &IssueRef, comment_id: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/comments/{}",
            self.api_base, issue.owner, issue.repo, comment_id
        )
    }

    async fn request_json<T, F>(
        &self,
        operation: &'static str,
        mut request_builder: F,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            match request_builder().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(|error| {
                            TransportError::Request {
                                operation,
                                source: Box::new(error),
                            }
                        });
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts && is_retryable_status(status.as_u16()) {
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    return Err(TransportError::Status {
                        operation,
                        status: status.as_u16(),
                        detail: truncate_body(&body, ERROR_BODY_LIMIT),
                    });
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(TransportError::Request {
                        operation,
                        source: Box::new(error),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl CommentStore for GithubCommentClient {
    async fn list_comments(
        &self,
        issue: &IssueRef,
        page: u32,
    ) -> Result<CommentPage, TransportError> {
        let url = self.comments_url(issue);
        let page_value = page.to_string();
        let per_page_value = PER_PAGE.to_string();
        let items: Vec<IssueComment> = self
            .request_json("list issue comments", || {
                self.http.get(&url).query(&[
                    ("sort", "created"),
                    ("direction", "asc"),
                    ("per_page", per_page_value.as_str()),
                    ("page", page_value.as_str()),
                ])
            })
            .await?;
        // A short page is the last one; a full page may have more behind it.
        let has_next_page = items.len() == PER_PAGE;
        Ok(CommentPage {
            items,
            has_next_page,
        })
    }

    async fn create_comment(
        &self,
        issue: &IssueRef,
        body: &str,
    ) -> Result<IssueComment, TransportError> {
        let url = self.comments_url(issue);
        let payload = json!({ "body": body });
        self.request_json("create issue comment", || {
            self.http.post(&url).json(&payload)
        })
        .await
    }

    async fn update_comment(
        &self,
        issue: &IssueRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, TransportError> {
        let url = self.comment_url(issue, comment_id);
        let payload = json!({ "body": body });
        self.request_json("update issue comment", || {
            self.http.patch(&url).json(&payload)
        })
        .await
    }
}
