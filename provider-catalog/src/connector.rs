//! Catalog API connector implementation
//!
//! Implements the `CatalogProvider` trait over any `HttpClient`.

use async_trait::async_trait;
use bridge_traits::catalog::{
    Asset, CatalogProvider, Collection, CollectionPage, MetadataMap, MetadataUpdate, MetadataView,
    SearchRequest, SearchResults,
};
use bridge_traits::http::{is_retryable_status, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_runtime::config::{SyncConfig, DEFAULT_OPERATION_TIMEOUT};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{self, CatalogError, Result};
use crate::types::{
    AssetMetadataResponse, AssetResponse, CollectionResponse, ContentsResponse, SearchResponse,
    ViewResponse,
};

const ASSETS_PATH: &str = "/API/assets/v1/assets";
const COLLECTIONS_PATH: &str = "/API/assets/v1/collections";
const METADATA_VIEWS_PATH: &str = "/API/metadata/v1/views";
const METADATA_ASSETS_PATH: &str = "/API/metadata/v1/assets";
const SEARCH_PATH: &str = "/API/search/v1/search/";

/// Catalog API connector
///
/// Every operation is one logical call bounded by the operation timeout.
/// Within that budget the connector:
///
/// - retries 429/500/503/504 up to `retry_attempts` more times, waiting the
///   full retry delay after a 429 and retrying 5xx immediately
/// - fails 401/403 at once with [`CatalogError::PermissionDenied`]
/// - treats a 200 whose payload has a non-null `errors` field as
///   [`CatalogError::Payload`]
/// - reports any other status as [`CatalogError::UnexpectedStatus`]
/// - retries transport failures only for operations that are safe to repeat
///
/// # Example
///
/// ```ignore
/// use provider_catalog::CatalogConnector;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let connector = CatalogConnector::from_config(http_client, &config);
/// let view = connector.get_metadata_view(&config.view_id).await?;
/// ```
pub struct CatalogConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    app_id: String,
    auth_token: String,
    operation_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl CatalogConnector {
    /// Create a connector with the default timeout and retry policy
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            auth_token: auth_token.into(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &SyncConfig) -> Self {
        Self::new(
            http_client,
            config.base_url.clone(),
            config.app_id.clone(),
            config.auth_token.clone(),
        )
        .with_operation_timeout(config.operation_timeout)
        .with_retry_policy(config.retry_policy())
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url).headers([
            ("App-ID", self.app_id.as_str()),
            ("Auth-Token", self.auth_token.as_str()),
            ("Accept", "application/json"),
            ("Content-Type", "application/json"),
        ])
    }

    fn timeout_error(&self, resource: &str) -> CatalogError {
        CatalogError::Timeout {
            resource: resource.to_string(),
            timeout: self.operation_timeout,
        }
    }

    /// Execute one logical operation with status triage and bounded retry.
    ///
    /// Transport failures are retried only for idempotent methods.
    async fn execute_with_retry(&self, resource: &str, request: HttpRequest) -> Result<HttpResponse> {
        let repeatable = request.method.is_idempotent();
        self.execute_with_policy(resource, request, repeatable).await
    }

    /// `repeatable` allows retrying transport failures; status-based retries
    /// apply to every operation.
    #[instrument(skip(self, resource, request), fields(resource = %resource, method = request.method.as_str()))]
    async fn execute_with_policy(
        &self,
        resource: &str,
        request: HttpRequest,
        repeatable: bool,
    ) -> Result<HttpResponse> {
        let deadline = Instant::now() + self.operation_timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(attempt, "Operation deadline reached before attempt");
                return Err(self.timeout_error(resource));
            }

            let call = self.http_client.execute(request.clone().timeout(remaining));
            let backoff = match tokio::time::timeout_at(deadline, call).await {
                Err(_) => {
                    warn!(attempt, "Operation deadline reached during attempt");
                    return Err(self.timeout_error(resource));
                }
                Ok(Err(e)) => {
                    if repeatable && e.is_transport() && attempt <= self.retry_policy.retry_attempts {
                        warn!(attempt, error = %e, "Transport failure, retrying");
                        self.retry_policy.retry_delay
                    } else {
                        warn!(attempt, error = %e, "Request failed");
                        return Err(error::from_bridge(resource, e, self.operation_timeout));
                    }
                }
                Ok(Ok(response)) => match response.status {
                    200 => {
                        debug!(attempt, "Request succeeded");
                        return Ok(response);
                    }
                    status @ (401 | 403) => {
                        warn!(status, "Permission denied");
                        return Err(CatalogError::PermissionDenied {
                            resource: resource.to_string(),
                            status,
                        });
                    }
                    status if is_retryable_status(status) => {
                        if attempt > self.retry_policy.retry_attempts {
                            warn!(status, attempt, "Retries exhausted");
                            return Err(CatalogError::RetriesExhausted {
                                resource: resource.to_string(),
                                status,
                                attempts: attempt,
                            });
                        }
                        let delay = self.retry_policy.delay_for(status);
                        warn!(
                            status,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable status, retrying"
                        );
                        delay
                    }
                    status => {
                        warn!(status, "Unexpected status");
                        return Err(CatalogError::UnexpectedStatus {
                            resource: resource.to_string(),
                            status,
                            body: response.text(),
                        });
                    }
                },
            };

            if !backoff.is_zero() {
                tokio::time::sleep_until(deadline.min(Instant::now() + backoff)).await;
            }
        }
    }

    /// Decode a 200 body, rejecting payloads that carry `errors`.
    fn decode<T: DeserializeOwned>(resource: &str, response: &HttpResponse) -> Result<T> {
        let value: Value = response.json().map_err(|e| CatalogError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })?;
        Self::check_payload_errors(resource, &value)?;

        serde_json::from_value(value).map_err(|e| CatalogError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    /// Write responses only need the `errors` check; an empty or non-JSON
    /// body is accepted.
    fn check_write_response(resource: &str, response: &HttpResponse) -> Result<()> {
        match response.json::<Value>() {
            Ok(value) => Self::check_payload_errors(resource, &value),
            Err(_) => Ok(()),
        }
    }

    fn check_payload_errors(resource: &str, value: &Value) -> Result<()> {
        match value.get("errors") {
            Some(errors) if !errors.is_null() => {
                warn!(resource, %errors, "Catalog payload carries errors");
                Err(CatalogError::Payload {
                    resource: resource.to_string(),
                    errors: errors.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn invalid_request(resource: &str, e: bridge_traits::BridgeError) -> CatalogError {
        CatalogError::InvalidRequest {
            resource: resource.to_string(),
            message: e.to_string(),
        }
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl CatalogProvider for CatalogConnector {
    #[instrument(skip(self))]
    async fn get_metadata_view(&self, view_id: &str) -> Result<MetadataView> {
        let resource = format!("metadata view {}", view_id);
        let url = self.url(&format!("{}/{}/", METADATA_VIEWS_PATH, segment(view_id)));

        let response = self
            .execute_with_retry(&resource, self.request(HttpMethod::Get, url))
            .await?;
        let view: MetadataView = Self::decode::<ViewResponse>(&resource, &response)?.into();

        info!(fields = view.fields.len(), "Fetched metadata view");
        Ok(view)
    }

    #[instrument(skip(self))]
    async fn get_collection_contents(
        &self,
        collection_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage> {
        let resource = format!("contents of collection {} (page {})", collection_id, page);
        let url = self.url(&format!("{}/{}/contents/", COLLECTIONS_PATH, segment(collection_id)));
        let request = self
            .request(HttpMethod::Get, url)
            .query("page", page)
            .query("per_page", per_page);

        let response = self.execute_with_retry(&resource, request).await?;
        let contents = Self::decode::<ContentsResponse>(&resource, &response)?.into_page(page);

        debug!(
            objects = contents.objects.len(),
            pages = contents.pages,
            "Fetched collection page"
        );
        Ok(contents)
    }

    #[instrument(skip(self))]
    async fn get_collection(&self, collection_id: &str) -> Result<Collection> {
        let resource = format!("collection {}", collection_id);
        let url = self.url(&format!("{}/{}/", COLLECTIONS_PATH, segment(collection_id)));

        let response = self
            .execute_with_retry(&resource, self.request(HttpMethod::Get, url))
            .await?;
        Ok(Self::decode::<CollectionResponse>(&resource, &response)?.into())
    }

    #[instrument(skip(self))]
    async fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        let resource = format!("asset {}", asset_id);
        let url = self.url(&format!("{}/{}/", ASSETS_PATH, segment(asset_id)));

        let response = self
            .execute_with_retry(&resource, self.request(HttpMethod::Get, url))
            .await?;
        Ok(Self::decode::<AssetResponse>(&resource, &response)?.into())
    }

    #[instrument(skip(self, title))]
    async fn patch_asset(&self, asset_id: &str, title: &str) -> Result<()> {
        let resource = format!("asset {}", asset_id);
        let url = self.url(&format!("{}/{}/", ASSETS_PATH, segment(asset_id)));
        let request = self
            .request(HttpMethod::Patch, url)
            .json(&json!({ "title": title }))
            .map_err(|e| Self::invalid_request(&resource, e))?;

        let response = self.execute_with_retry(&resource, request).await?;
        Self::check_write_response(&resource, &response)?;

        debug!("Updated asset title");
        Ok(())
    }

    #[instrument(skip(self, update), fields(fields = update.len()))]
    async fn update_metadata_in_asset(
        &self,
        view_id: &str,
        asset_id: &str,
        update: &MetadataUpdate,
    ) -> Result<()> {
        let resource = format!("metadata of asset {} in view {}", asset_id, view_id);
        let url = self.url(&format!(
            "{}/{}/views/{}/",
            METADATA_ASSETS_PATH,
            segment(asset_id),
            segment(view_id)
        ));
        let request = self
            .request(HttpMethod::Put, url)
            .json(update)
            .map_err(|e| Self::invalid_request(&resource, e))?;

        let response = self.execute_with_retry(&resource, request).await?;
        Self::check_write_response(&resource, &response)?;

        debug!("Updated asset metadata");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_asset_metadata(&self, view_id: &str, asset_id: &str) -> Result<MetadataMap> {
        let resource = format!("metadata of asset {} in view {}", asset_id, view_id);
        let url = self.url(&format!(
            "{}/{}/views/{}/",
            METADATA_ASSETS_PATH,
            segment(asset_id),
            segment(view_id)
        ));

        let response = self
            .execute_with_retry(&resource, self.request(HttpMethod::Get, url))
            .await?;
        Ok(Self::decode::<AssetMetadataResponse>(&resource, &response)?.into())
    }

    #[instrument(skip(self, request), fields(cursor = ?request.search_after))]
    async fn search(&self, request: &SearchRequest, per_page: u32) -> Result<SearchResults> {
        let resource = "search".to_string();
        let http_request = self
            .request(HttpMethod::Post, self.url(SEARCH_PATH))
            .query("per_page", per_page)
            .json(request)
            .map_err(|e| Self::invalid_request(&resource, e))?;

        // Search is a read-only POST, so transport failures may be retried.
        let response = self.execute_with_policy(&resource, http_request, true).await?;
        let results: SearchResults = Self::decode::<SearchResponse>(&resource, &response)?.into();

        debug!(hits = results.objects.len(), pages = results.pages, "Search page fetched");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use mockall::{mock, Sequence};

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse::new(status, body.to_string()))
    }

    fn connector(mock_http: MockHttpClient) -> CatalogConnector {
        CatalogConnector::new(Arc::new(mock_http), "https://catalog.test/", "app", "token")
    }

    const VIEW_BODY: &str = r#"{"name": "Delivery", "view_fields": [{"name": "title_note", "label": "Note"}], "errors": null}"#;

    #[tokio::test]
    async fn test_injects_headers_and_path() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "https://catalog.test/API/metadata/v1/views/v1/"
                    && req.headers.get("App-ID").map(String::as_str) == Some("app")
                    && req.headers.get("Auth-Token").map(String::as_str) == Some("token")
                    && req.headers.get("Accept").map(String::as_str) == Some("application/json")
                    && req.timeout.is_some_and(|t| t <= Duration::from_secs(30))
            })
            .times(1)
            .returning(|_| response(200, VIEW_BODY));

        let view = connector(mock_http).get_metadata_view("v1").await.unwrap();

        assert_eq!(view.name, "Delivery");
        assert_eq!(view.fields[0].label, "Note");
    }

    #[tokio::test]
    async fn test_contents_query_parameters() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.url == "https://catalog.test/API/assets/v1/collections/c1/contents/"
                    && req.query
                        == vec![
                            ("page".to_string(), "2".to_string()),
                            ("per_page".to_string(), "500".to_string()),
                        ]
            })
            .times(1)
            .returning(|_| response(200, r#"{"objects": [], "page": 2, "pages": 2}"#));

        let page = connector(mock_http)
            .get_collection_contents("c1", 2, 500)
            .await
            .unwrap();

        assert_eq!(page.page, 2);
        assert!(!page.has_more_after(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_ok_waits_full_delay() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(429, "slow down"));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(200, VIEW_BODY));

        let start = Instant::now();
        let view = connector(mock_http).get_metadata_view("v1").await.unwrap();

        assert_eq!(view.name, "Delivery");
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retries_immediately() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(503, "unavailable"));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(200, r#"{"id": "c1", "title": "Root"}"#));

        let start = Instant::now();
        let collection = connector(mock_http).get_collection("c1").await.unwrap();

        assert_eq!(collection.title, "Root");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| response(500, "boom"));

        let error = connector(mock_http)
            .with_retry_policy(RetryPolicy::new(2, Duration::from_secs(3)))
            .get_asset("a1")
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            CatalogError::RetriesExhausted {
                status: 500,
                attempts: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(401, "unauthorized"));

        let error = connector(mock_http).get_metadata_view("v1").await.unwrap_err();

        assert!(matches!(
            error,
            CatalogError::PermissionDenied { status: 401, ref resource } if resource == "metadata view v1"
        ));
    }

    #[tokio::test]
    async fn test_payload_errors_on_ok_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(200, r#"{"errors": ["view not shared"]}"#));

        let error = connector(mock_http).get_metadata_view("v1").await.unwrap_err();

        match error {
            CatalogError::Payload { errors, .. } => {
                assert_eq!(errors, serde_json::json!(["view not shared"]))
            }
            other => panic!("expected payload error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_status_carries_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(404, "no such asset"));

        let error = connector(mock_http).get_asset("a1").await.unwrap_err();

        assert!(matches!(
            error,
            CatalogError::UnexpectedStatus { status: 404, ref body, .. } if body == "no such asset"
        ));
    }

    #[tokio::test]
    async fn test_patch_is_not_retried_on_transport_failure() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Patch
                    && req.body.as_deref() == Some(br#"{"title":"My Clip"}"#.as_slice())
            })
            .times(1)
            .returning(|_| Err(BridgeError::Transport("connection reset".to_string())));

        let error = connector(mock_http)
            .patch_asset("a1", "My Clip")
            .await
            .unwrap_err();

        assert!(matches!(error, CatalogError::Transport { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_is_retried_on_transport_failure() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::Transport("connection refused".to_string())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(200, r#"{"id": "a1", "title": "Clip"}"#));

        let asset = connector(mock_http).get_asset("a1").await.unwrap();
        assert_eq!(asset.title, "Clip");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_is_retried_on_transport_failure() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::Transport("connection reset".to_string())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(200, r#"{"objects": [], "pages": 0}"#));

        let results = connector(mock_http)
            .search(&SearchRequest::collection_assets("c1"), 500)
            .await
            .unwrap();
        assert!(results.objects.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_update_uses_put_payload() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Put
                    && req.url == "https://catalog.test/API/metadata/v1/assets/a1/views/v1/"
                    && req.body.as_deref()
                        == Some(
                            br#"{"metadata_values":{"archived":{"field_values":[{"value":"false"}]}}}"#
                                .as_slice(),
                        )
            })
            .times(1)
            .returning(|_| response(200, r#"{"metadata_values": {}}"#));

        let mut update = MetadataUpdate::new();
        update.insert("archived", vec!["false".to_string()]);

        connector(mock_http)
            .update_metadata_in_asset("v1", "a1", &update)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_search_posts_body_with_page_size() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                let body: Value = serde_json::from_slice(req.body.as_deref().unwrap_or_default())
                    .unwrap_or(Value::Null);
                req.method == HttpMethod::Post
                    && req.url == "https://catalog.test/API/search/v1/search/"
                    && req.query == vec![("per_page".to_string(), "100".to_string())]
                    && body["filter"]["terms"][0]["value_in"][0] == "c1"
            })
            .times(1)
            .returning(|_| {
                response(
                    200,
                    r#"{"objects": [{"_sort": [5], "id": "a1", "object_type": "assets"}], "pages": 1}"#,
                )
            });

        let results = connector(mock_http)
            .search(&SearchRequest::collection_assets("c1"), 100)
            .await
            .unwrap();

        assert_eq!(results.objects.len(), 1);
        assert_eq!(results.next_search_after, Some(vec![serde_json::json!(5)]));
    }

    /// Client whose responses never arrive
    struct StalledClient;

    #[async_trait]
    impl HttpClient for StalledClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            response(200, "{}")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_deadline_bounds_a_stalled_call() {
        let connector = CatalogConnector::new(Arc::new(StalledClient), "https://catalog.test", "app", "token")
            .with_operation_timeout(Duration::from_secs(5));

        let start = Instant::now();
        let error = connector.get_collection("c1").await.unwrap_err();

        assert!(matches!(error, CatalogError::Timeout { timeout, .. } if timeout == Duration::from_secs(5)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_never_outlives_deadline() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(429, "slow down"));

        let start = Instant::now();
        let error = connector(mock_http)
            .with_operation_timeout(Duration::from_secs(2))
            .with_retry_policy(RetryPolicy::new(5, Duration::from_secs(3)))
            .get_asset("a1")
            .await
            .unwrap_err();

        assert!(matches!(error, CatalogError::Timeout { .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
