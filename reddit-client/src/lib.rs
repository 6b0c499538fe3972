pub mod api;
pub mod auth;
pub mod comments;
pub mod rate_limiter;


use api::{RedditApiClient, RedditListing, RedditPostData, MAX_MORE_CHILDREN, MAX_PAGE_SIZE};
use async_trait::async_trait;
use auth::{RedditAuthenticator, REDDIT_TOKEN_URL};
use harvest_core::{
    CommentNode, Community, Credentials, HarvestError, ListingSort, Platform, RedditApiError,
    SearchSort, ThreadHandle, ThreadReference,
};
use rate_limiter::RateLimitConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest community name Reddit allows.
const MAX_COMMUNITY_NAME_LEN: usize = 21;

#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub api_base: String,
    pub token_url: String,
    pub timeout: Duration,
    pub rate_limit: RateLimitConfig,
}

impl RedditClientConfig {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
            api_base: api::REDDIT_API_BASE.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit: RateLimitConfig::reddit_oauth(),
        }
    }

    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }
}

impl From<&Credentials> for RedditClientConfig {
    fn from(credentials: &Credentials) -> Self {
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.user_agent.clone(),
        )
    }
}

enum PostSource<'a> {
    Search { keyword: &'a str, sort: SearchSort },
    Community { name: &'a str, sort: ListingSort },
}

#[derive(Debug)]
pub struct RedditClient {
    api: RedditApiClient,
    auth: RedditAuthenticator,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, HarvestError> {
        let http_client = RedditApiClient::build_http_client(&config.user_agent, config.timeout)?;
        let auth = RedditAuthenticator::new(
            &config.client_id,
            &config.client_secret,
            &config.token_url,
            http_client.clone(),
        )?;
        let api = RedditApiClient::new(
            http_client,
            config.user_agent,
            config.api_base,
            config.rate_limit,
        );

        Ok(Self { api, auth })
    }

    pub async fn get_rate_limit_status(&self) -> rate_limiter::RateLimitStatus {
        self.api.get_rate_limit_status().await
    }

    async fn fetch_page(
        &self,
        token: &str,
        source: &PostSource<'_>,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, HarvestError> {
        match source {
            PostSource::Search { keyword, sort } => {
                self.api
                    .search_posts(token, keyword, *sort, page_size, after)
                    .await
            }
            PostSource::Community { name, sort } => {
                self.api
                    .get_subreddit_posts(token, name, *sort, page_size, after)
                    .await
            }
        }
    }

    /// Pages through a post listing until `limit` posts are collected or the
    /// listing runs out.
    async fn collect_posts(
        &self,
        source: PostSource<'_>,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        let mut threads = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
        let mut after: Option<String> = None;

        while threads.len() < limit {
            let token = self.auth.access_token().await?;
            let page_size = (limit - threads.len()).min(MAX_PAGE_SIZE);
            let listing = self
                .fetch_page(&token, &source, page_size, after.as_deref())
                .await?;

            let before = threads.len();
            threads.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .filter(|child| child.kind == "t3")
                    .map(|child| ThreadHandle::from(child.data))
                    .take(limit - before),
            );

            after = listing.data.after;
            if after.is_none() || threads.len() == before {
                break;
            }
        }

        debug!("Collected {} posts (limit {})", threads.len(), limit);
        Ok(threads)
    }
}

fn validate_community_name(name: &str) -> Result<(), HarvestError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_COMMUNITY_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RedditApiError::NotFound {
            resource: format!("r/{}", name),
        }
        .into())
    }
}

#[async_trait]
impl Platform for RedditClient {
    async fn search(
        &self,
        keyword: &str,
        sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        self.collect_posts(PostSource::Search { keyword, sort }, limit)
            .await
    }

    async fn get_thread(&self, reference: &ThreadReference) -> Result<ThreadHandle, HarvestError> {
        let token = self.auth.access_token().await?;
        let listing = self.api.get_post_info(&token, &reference.fullname()).await?;

        listing
            .data
            .children
            .into_iter()
            .find(|child| child.kind == "t3" && child.data.id == reference.id)
            .map(|child| ThreadHandle::from(child.data))
            .ok_or_else(|| {
                RedditApiError::NotFound {
                    resource: reference.fullname(),
                }
                .into()
            })
    }

    async fn get_community(&self, name: &str) -> Result<Community, HarvestError> {
        validate_community_name(name)?;
        let token = self.auth.access_token().await?;
        let about = self.api.get_subreddit_info(&token, name).await?;

        if about.kind != "t5" {
            return Err(RedditApiError::NotFound {
                resource: format!("r/{}", name),
            }
            .into());
        }

        let data = about.data;
        let private = data.subreddit_type.as_deref() == Some("private");
        if private || data.user_is_banned == Some(true) {
            warn!("r/{} is not accessible (type {:?})", name, data.subreddit_type);
            return Err(RedditApiError::Forbidden {
                resource: format!("r/{}", name),
            }
            .into());
        }

        Ok(Community {
            name: data.display_name,
            title: data.title,
            subscribers: data.subscribers,
        })
    }

    async fn community_listing(
        &self,
        community: &Community,
        sort: ListingSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        self.collect_posts(
            PostSource::Community {
                name: &community.name,
                sort,
            },
            limit,
        )
        .await
    }

    async fn comment_tree(
        &self,
        thread: &ThreadHandle,
        stub_expansion_budget: usize,
    ) -> Result<Vec<CommentNode>, HarvestError> {
        let token = self.auth.access_token().await?;
        let mut listings = self.api.get_comments(&token, &thread.id).await?;

        if listings.len() < 2 {
            return Err(RedditApiError::InvalidResponse {
                details: format!(
                    "expected post and comment listings for {}, got {}",
                    thread.id,
                    listings.len()
                ),
            }
            .into());
        }

        let comment_listing = listings.swap_remove(1);
        let mut forest = comments::decode_forest(comment_listing.data.children)?;

        if stub_expansion_budget > 0 {
            let link_fullname = format!("t3_{}", thread.id);
            for stub in comments::expandable_stubs(&forest, stub_expansion_budget) {
                let batch = &stub.children[..stub.children.len().min(MAX_MORE_CHILDREN)];
                let token = self.auth.access_token().await?;
                let things = self
                    .api
                    .get_more_children(&token, &link_fullname, batch)
                    .await?;
                let replacement = comments::rebuild_expansion(&stub, things)?;
                comments::splice_stub(&mut forest, &stub.id, replacement);
            }
        }

        info!(
            "Retrieved comment tree for {} ({} top-level nodes)",
            thread.id,
            forest.len()
        );
        Ok(forest)
    }
}
