use reqwest::header::{AUTHORIZATION, CACHE_CONTROL};
use reqwest::{RequestBuilder, Response, Url};

use refresh_core::{JobId, JobSnapshot, ListQuery, Page, ParentItem};
use refresh_logging::refresh_debug;

use crate::wire::{decode_page, decode_status, decode_submit};
use crate::{ApiError, ClientSettings};

const SUBMIT_PATH: &str = "/refresh/async";
const STATUS_PATH: &str = "/refresh/status";

/// Submits refresh jobs and reads their status. Performs no retries.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    async fn submit_job(&self) -> Result<JobId, ApiError>;

    async fn fetch_status(&self, id: &JobId) -> Result<JobSnapshot, ApiError>;
}

/// Fetches one page of a cursor-paginated list.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        query: &ListQuery,
        cursor: Option<&str>,
    ) -> Result<Page<ParentItem>, ApiError>;
}

/// Everything the orchestrator needs from the backend.
pub trait RefreshApi: JobClient + PageFetcher {}

impl<T: JobClient + PageFetcher> RefreshApi for T {}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let token = settings.token.filter(|token| !token.is_empty());
        Ok(Self {
            client,
            base,
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl JobClient for ReqwestApi {
    async fn submit_job(&self) -> Result<JobId, ApiError> {
        let url = endpoint(&self.base, &["refresh", "async"]);
        let response = send(self.authorized(self.client.post(url))).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "POST",
                path: SUBMIT_PATH,
                status: status.as_u16(),
            });
        }
        let id = decode_submit(&read_body(response).await?)?;
        refresh_debug!("submitted refresh job id={}", id);
        Ok(id)
    }

    async fn fetch_status(&self, id: &JobId) -> Result<JobSnapshot, ApiError> {
        let url = endpoint(&self.base, &["refresh", "status", id.as_str()]);
        let request = self
            .authorized(self.client.get(url))
            .header(CACHE_CONTROL, "no-store");
        let response = send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "GET",
                path: STATUS_PATH,
                status: status.as_u16(),
            });
        }
        decode_status(&read_body(response).await?)
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestApi {
    async fn fetch_page(
        &self,
        query: &ListQuery,
        cursor: Option<&str>,
    ) -> Result<Page<ParentItem>, ApiError> {
        let url = page_url(&self.base, query, cursor);
        refresh_debug!("fetching page url={}", url);
        let response = send(self.client.get(url)).await?;
        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(ApiError::InvalidCursor);
        }
        if !status.is_success() {
            return Err(ApiError::PageStatus(status.as_u16()));
        }
        decode_page(&read_body(response).await?)
    }
}

/// Builds the list endpoint URL.
///
/// `cursor` is omitted when absent and `debug=true` is only added when the
/// query enables it; a disabled flag is never serialized.
pub fn page_url(base: &Url, query: &ListQuery, cursor: Option<&str>) -> Url {
    let mut url = endpoint(base, &["parents", &query.name]);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("limit", &query.page_size.to_string());
        if let Some(cursor) = cursor {
            pairs.append_pair("cursor", cursor);
        }
        if query.debug {
            pairs.append_pair("debug", "true");
        }
    }
    url
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    request.send().await.map_err(map_reqwest_error)
}

async fn read_body(response: Response) -> Result<Vec<u8>, ApiError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(map_reqwest_error)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout(err.to_string());
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    fn count_pairs(url: &Url, key: &str) -> usize {
        url.query_pairs().filter(|(k, _)| k == key).count()
    }

    #[test]
    fn disabled_debug_flag_is_not_serialized() {
        let url = page_url(&base(), &ListQuery::new("crypto"), Some("c1"));
        assert_eq!(count_pairs(&url, "debug"), 0);
        assert_eq!(url.as_str(), "http://localhost:8000/parents/crypto?limit=25&cursor=c1");
    }

    #[test]
    fn enabled_debug_flag_appears_once() {
        let query = ListQuery {
            debug: true,
            ..ListQuery::new("crypto")
        };
        let url = page_url(&base(), &query, Some("c1"));
        let debug: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "debug")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(debug, vec!["true".to_string()]);
    }

    #[test]
    fn absent_cursor_is_omitted() {
        let url = page_url(&base(), &ListQuery::new("crypto"), None);
        assert_eq!(count_pairs(&url, "cursor"), 0);
        assert_eq!(count_pairs(&url, "limit"), 1);
    }

    #[test]
    fn path_segments_are_encoded() {
        let url = page_url(&base(), &ListQuery::new("real world/assets"), None);
        assert_eq!(url.path(), "/parents/real%20world%2Fassets");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let base = Url::parse("http://example.com/api/").unwrap();
        let url = endpoint(&base, &["refresh", "async"]);
        assert_eq!(url.as_str(), "http://example.com/api/refresh/async");
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let api = ReqwestApi::new(ClientSettings {
            token: Some(String::new()),
            ..ClientSettings::default()
        })
        .unwrap();
        assert!(api.token.is_none());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ReqwestApi::new(ClientSettings {
            base_url: "not a url".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
