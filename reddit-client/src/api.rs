use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use harvest_core::{HarvestError, ListingSort, RedditApiError, SearchSort, ThreadHandle};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page the listing endpoints accept.
pub const MAX_PAGE_SIZE: usize = 100;

/// Largest batch `/api/morechildren` accepts.
pub const MAX_MORE_CHILDREN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub over_18: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditSubredditData {
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    pub subscribers: Option<u64>,
    pub subreddit_type: Option<String>,
    pub user_is_banned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub parent_id: String,
    pub author: Option<String>,
    pub body: Option<String>,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    pub replies: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    things: Vec<RedditListingChild<serde_json::Value>>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
    api_base: String,
}

impl RedditApiClient {
    pub fn new(
        http_client: Client,
        user_agent: String,
        api_base: String,
        rate_config: RateLimitConfig,
    ) -> Self {
        Self {
            http_client,
            rate_limiter: RateLimiter::new(rate_config),
            user_agent,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// HTTP client shared with the authenticator: timeout, user agent and no redirects.
    pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, HarvestError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(client)
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, HarvestError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent)
            .query(&[("raw_json", "1")])
            .query(query_params);

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(RedditApiError::RequestTimeout.into());
                }
                return Err(HarvestError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let err = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            // Unknown subreddits redirect to the search page.
            404 | 300..=399 => RedditApiError::NotFound {
                resource: endpoint.to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            },
        };
        Err(err.into())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, HarvestError> {
        let response = self
            .make_request(Method::GET, endpoint, access_token, query_params)
            .await?;

        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read body of {}: {}", endpoint, e);
            HarvestError::Network(e)
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            error!("Failed to parse response of {}: {}", endpoint, e);
            RedditApiError::InvalidResponse {
                details: format!("Failed to parse response of {}: {}", endpoint, e),
            }
            .into()
        })
    }

    pub async fn search_posts(
        &self,
        access_token: &str,
        keyword: &str,
        sort: SearchSort,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, HarvestError> {
        let limit_str = limit.to_string();
        let mut params = vec![
            ("q", keyword),
            ("sort", sort.as_str()),
            ("t", "all"),
            ("type", "link"),
            ("limit", limit_str.as_str()),
        ];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let listing: RedditListing<RedditPostData> =
            self.get_json("/search", access_token, &params).await?;

        info!(
            "Retrieved {} posts searching for '{}'",
            listing.data.children.len(),
            keyword
        );
        Ok(listing)
    }

    pub async fn get_post_info(
        &self,
        access_token: &str,
        fullname: &str,
    ) -> Result<RedditListing<RedditPostData>, HarvestError> {
        self.get_json("/api/info", access_token, &[("id", fullname)])
            .await
    }

    pub async fn get_subreddit_info(
        &self,
        access_token: &str,
        subreddit: &str,
    ) -> Result<RedditListingChild<RedditSubredditData>, HarvestError> {
        let endpoint = format!("/r/{}/about", subreddit);
        let info: RedditListingChild<RedditSubredditData> =
            self.get_json(&endpoint, access_token, &[]).await?;

        debug!("Retrieved info for r/{}", subreddit);
        Ok(info)
    }

    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        sort: ListingSort,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, HarvestError> {
        let endpoint = format!("/r/{}/{}", subreddit, sort.as_str());
        let limit_str = limit.to_string();
        let mut params = vec![("limit", limit_str.as_str())];
        if sort == ListingSort::Top {
            params.push(("t", "all"));
        }
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let listing: RedditListing<RedditPostData> =
            self.get_json(&endpoint, access_token, &params).await?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// The post listing followed by the comment listing.
    pub async fn get_comments(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<Vec<RedditListing<serde_json::Value>>, HarvestError> {
        let endpoint = format!("/comments/{}", post_id);
        self.get_json(&endpoint, access_token, &[]).await
    }

    pub async fn get_more_children(
        &self,
        access_token: &str,
        link_fullname: &str,
        children: &[String],
    ) -> Result<Vec<RedditListingChild<serde_json::Value>>, HarvestError> {
        let joined = children.join(",");
        let params = [
            ("api_type", "json"),
            ("link_id", link_fullname),
            ("children", joined.as_str()),
        ];

        let response: MoreChildrenResponse = self
            .get_json("/api/morechildren", access_token, &params)
            .await?;

        if !response.json.errors.is_empty() {
            return Err(RedditApiError::InvalidResponse {
                details: format!("morechildren returned errors: {:?}", response.json.errors),
            }
            .into());
        }

        Ok(response
            .json
            .data
            .map(|data| data.things)
            .unwrap_or_default())
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}

impl From<RedditPostData> for ThreadHandle {
    fn from(post_data: RedditPostData) -> Self {
        ThreadHandle::new(post_data.id, post_data.subreddit, post_data.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_client_creation() {
        let http = RedditApiClient::build_http_client("test-user-agent/1.0", Duration::from_secs(5))
            .unwrap();
        let client = RedditApiClient::new(
            http,
            "test-user-agent/1.0".to_string(),
            "https://oauth.reddit.com/".to_string(),
            RateLimitConfig::reddit_oauth(),
        );
        assert_eq!(client.user_agent, "test-user-agent/1.0");
        assert_eq!(client.api_base, "https://oauth.reddit.com");

        let status = client.get_rate_limit_status().await;
        assert!(status.available_tokens > 0);
    }

    #[test]
    fn test_post_data_conversion() {
        let post_data: RedditPostData = serde_json::from_value(serde_json::json!({
            "id": "test123",
            "title": "Test Post",
            "subreddit": "rust",
            "permalink": "/r/rust/comments/test123/test_post/",
            "num_comments": 5,
            "over_18": false,
            "score": 42
        }))
        .unwrap();

        let thread: ThreadHandle = post_data.into();
        assert_eq!(thread.id, "test123");
        assert_eq!(thread.title, "Test Post");
        assert_eq!(thread.community, "rust");
    }
}
