use harvest_core::{HarvestError, RedditApiError};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError, TokenResponse,
    TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Application-only OAuth2 (client credentials grant). The token is fetched
/// on first use and cached until shortly before it expires.
#[derive(Debug)]
pub struct RedditAuthenticator {
    oauth_client: BasicClient,
    http_client: Client,
    token: Mutex<Option<RedditToken>>,
}

impl RedditAuthenticator {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        token_url: &str,
        http_client: Client,
    ) -> Result<Self, HarvestError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            HarvestError::Internal {
                message: format!("invalid authorize URL: {}", e),
            }
        })?;
        let token_url = TokenUrl::new(token_url.to_string()).map_err(|e| {
            HarvestError::invalid_argument(format!("invalid token URL '{}': {}", token_url, e))
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth_client,
            http_client,
            token: Mutex::new(None),
        })
    }

    pub async fn access_token(&self) -> Result<String, HarvestError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Reddit token expired, requesting a new one");
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn request_token(&self) -> Result<RedditToken, HarvestError> {
        info!("Requesting application-only Reddit token");
        let http_client = self.http_client.clone();

        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_oauth_request(http_client, request))
            .await
            .map_err(|e| {
                let reason = match &e {
                    RequestTokenError::ServerResponse(response) => response.to_string(),
                    other => other.to_string(),
                };
                error!("Reddit token request failed: {}", reason);
                RedditApiError::AuthenticationFailed { reason }
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        debug!("Reddit token valid for {:?}", lifetime);

        Ok(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
        })
    }
}

/// Runs an oauth2 token request over our own client so the configured
/// User-Agent is sent; Reddit throttles generic agents.
async fn send_oauth_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let fresh = RedditToken {
            access_token: "fresh".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(3600),
        };
        assert!(!fresh.is_expired());

        let nearly = RedditToken {
            access_token: "nearly".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(30),
        };
        assert!(nearly.is_expired());
    }

    #[test]
    fn test_invalid_token_url() {
        let result = RedditAuthenticator::new("id", "secret", "not a url", Client::new());
        assert!(matches!(result, Err(HarvestError::InvalidArgument { .. })));
    }
}
