use async_trait::async_trait;
use reelix_contracts::client::{
    ClientError, ClientResult, FeedClient, InteractionClient,
};
use reelix_model::{
    ApiResponse, AuthToken, BlockCreatorRequest, Comment, CommentId,
    CommentPage, CreatorId, FeedItem, FeedSort, ItemId, PostCommentRequest,
    ReactionCounts, ReactionKind, ReactionRequest, ReactionState,
    ReportReason, ReportRequest, ReportTarget,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::infra::constants::{
    api::API_VERSION,
    routes::{segment, v1},
};

/// REST client for the shorts and interaction endpoints.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                ClientError::Network(format!("failed to build http client: {err}"))
            })?;

        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();

        tracing::info!(base_url = %base_url, "creating api client");

        Ok(Self {
            client,
            base_url,
            api_version: API_VERSION.to_string(),
        })
    }

    /// Build a versioned API URL.
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let path = path.as_ref().trim_start_matches('/');
        format!("{}/api/{}/{}", self.base_url, self.api_version, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(builder: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        builder.header(reqwest::header::AUTHORIZATION, token.bearer())
    }

    async fn send(request: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("request rejected with 401");
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.error.or(envelope.message))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body
                }
            });

        tracing::warn!(status = status.as_u16(), %message, "request failed");
        Err(ClientError::Server {
            status: Some(status.as_u16()),
            message,
        })
    }

    /// Execute a request and unwrap the `data` field of the envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let response = Self::send(request).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::InvalidPayload(err.to_string()))?;

        match envelope.data {
            Some(data) => Ok(data),
            None => Err(ClientError::InvalidPayload(
                envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "Empty response from server".to_string()),
            )),
        }
    }

    /// Execute a request whose body carries nothing the caller needs.
    async fn execute_empty(&self, request: RequestBuilder) -> ClientResult<()> {
        Self::send(request).await.map(|_| ())
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Network("request timed out".to_string())
    } else if err.is_decode() {
        ClientError::InvalidPayload(err.to_string())
    } else {
        ClientError::Network(err.to_string())
    }
}

#[async_trait]
impl FeedClient for HttpApiClient {
    async fn fetch_shorts_page(
        &self,
        page: u32,
        page_size: u32,
        sort: FeedSort,
    ) -> ClientResult<Vec<FeedItem>> {
        let request = self.client.get(self.build_url(v1::SHORTS)).query(&[
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
            ("sort", sort.as_query_value().to_string()),
        ]);
        self.execute(request).await
    }
}

#[async_trait]
impl InteractionClient for HttpApiClient {
    async fn fetch_reaction_state(
        &self,
        item_id: &ItemId,
        token: &AuthToken,
    ) -> ClientResult<ReactionState> {
        let url =
            self.build_url(v1::videos::reaction(&segment(item_id.as_str())));
        self.execute(Self::authorized(self.client.get(url), token))
            .await
    }

    async fn post_reaction(
        &self,
        item_id: &ItemId,
        kind: ReactionKind,
        token: &AuthToken,
    ) -> ClientResult<ReactionCounts> {
        let url =
            self.build_url(v1::videos::reaction(&segment(item_id.as_str())));
        let request = self.client.post(url).json(&ReactionRequest { kind });
        self.execute(Self::authorized(request, token)).await
    }

    async fn fetch_comments(
        &self,
        item_id: &ItemId,
        page: u32,
        page_size: u32,
    ) -> ClientResult<CommentPage> {
        let url =
            self.build_url(v1::videos::comments(&segment(item_id.as_str())));
        let request = self.client.get(url).query(&[
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
        ]);
        self.execute(request).await
    }

    async fn post_comment(
        &self,
        item_id: &ItemId,
        text: &str,
        token: &AuthToken,
    ) -> ClientResult<Comment> {
        let url =
            self.build_url(v1::videos::comments(&segment(item_id.as_str())));
        let request = self.client.post(url).json(&PostCommentRequest {
            text: text.to_string(),
        });
        self.execute(Self::authorized(request, token)).await
    }

    async fn post_comment_reaction(
        &self,
        comment_id: &CommentId,
        kind: ReactionKind,
        token: &AuthToken,
    ) -> ClientResult<ReactionCounts> {
        let url = self
            .build_url(v1::comments::reaction(&segment(comment_id.as_str())));
        let request = self.client.post(url).json(&ReactionRequest { kind });
        self.execute(Self::authorized(request, token)).await
    }

    async fn report_content(
        &self,
        target: &ReportTarget,
        reason: ReportReason,
        free_text: &str,
        token: &AuthToken,
    ) -> ClientResult<()> {
        let body = ReportRequest::new(target, reason, free_text);
        let request = self.client.post(self.build_url(v1::REPORTS)).json(&body);
        self.execute_empty(Self::authorized(request, token)).await
    }

    async fn block_creator(
        &self,
        creator_id: &CreatorId,
        reason_text: &str,
        token: &AuthToken,
    ) -> ClientResult<()> {
        let url =
            self.build_url(v1::creators::block(&segment(creator_id.as_str())));
        let request = self.client.post(url).json(&BlockCreatorRequest {
            reason: reason_text.to_string(),
        });
        self.execute_empty(Self::authorized(request, token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn client(base: &str) -> HttpApiClient {
        HttpApiClient::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn build_url_inserts_version_prefix_once() {
        let client = client("http://localhost:3000/");
        assert_eq!(
            client.build_url("/shorts"),
            "http://localhost:3000/api/v1/shorts"
        );
        assert_eq!(
            client.build_url("videos/a/reaction"),
            "http://localhost:3000/api/v1/videos/a/reaction"
        );
    }

    #[test]
    fn ids_are_percent_encoded_in_paths() {
        let client = client("https://api.example.com");
        let url =
            client.build_url(v1::videos::comments(&segment("a/b c")));
        assert_eq!(
            url,
            "https://api.example.com/api/v1/videos/a%2Fb+c/comments"
        );
    }
}
