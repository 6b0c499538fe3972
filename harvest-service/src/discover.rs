use harvest_core::{
    DiscoveryStrategy, HarvestError, ListingSort, Platform, SearchSort, ThreadHandle,
    ThreadReference,
};
use tracing::{debug, info};

/// Turns a [`DiscoveryStrategy`] into an ordered, bounded list of threads.
pub struct ThreadDiscoverer<'a, P: Platform + ?Sized> {
    platform: &'a P,
}

impl<'a, P: Platform + ?Sized> ThreadDiscoverer<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Returns at most `limit` threads for search and listing strategies and
    /// exactly one for a direct thread. Every error is fatal to the run.
    pub async fn discover(
        &self,
        strategy: &DiscoveryStrategy,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        let threads = match strategy {
            DiscoveryStrategy::Search {
                keyword,
                sort,
                limit,
            } => self.search(keyword, *sort, *limit).await?,
            DiscoveryStrategy::DirectThread { reference } => vec![self.direct(reference).await?],
            DiscoveryStrategy::Listing {
                community,
                sort,
                limit,
            } => self.listing(community, *sort, *limit).await?,
        };

        info!(
            strategy = strategy.name(),
            "Discovered {} thread(s)",
            threads.len()
        );
        Ok(threads)
    }

    async fn search(
        &self,
        keyword: &str,
        sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(HarvestError::invalid_argument("search keyword must not be empty"));
        }
        if limit == 0 {
            debug!("Post count is zero, skipping search");
            return Ok(Vec::new());
        }

        info!("Searching for keyword: {}", keyword);
        let mut threads = self.platform.search(keyword, sort, limit).await?;
        threads.truncate(limit);
        Ok(threads)
    }

    async fn direct(&self, reference: &str) -> Result<ThreadHandle, HarvestError> {
        let parsed = ThreadReference::parse(reference)?;

        info!("Fetching comments from post: {}", parsed);
        self.platform.get_thread(&parsed).await.map_err(|e| {
            if e.is_transport_failure() {
                e
            } else {
                HarvestError::ThreadNotFound {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    async fn listing(
        &self,
        community: &str,
        sort: ListingSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError> {
        let name = normalize_community(community);
        if name.is_empty() {
            return Err(HarvestError::invalid_argument("community name must not be empty"));
        }

        let unavailable = |e: HarvestError| {
            if e.is_transport_failure() {
                e
            } else {
                HarvestError::CommunityUnavailable {
                    community: name.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        info!("Fetching from subreddit: {}", name);
        let resolved = self.platform.get_community(name).await.map_err(unavailable)?;
        if limit == 0 {
            debug!("Post count is zero, skipping r/{} listing", resolved.name);
            return Ok(Vec::new());
        }

        let mut threads = self
            .platform
            .community_listing(&resolved, sort, limit)
            .await
            .map_err(unavailable)?;
        threads.truncate(limit);
        Ok(threads)
    }
}

/// Trims whitespace and an optional `r/` or `/r/` prefix.
fn normalize_community(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("/r/")
        .or_else(|| trimmed.strip_prefix("r/"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::normalize_community;

    #[test]
    fn test_normalize_community() {
        assert_eq!(normalize_community("  rust "), "rust");
        assert_eq!(normalize_community("r/rust"), "rust");
        assert_eq!(normalize_community("/r/rust/"), "rust");
        assert_eq!(normalize_community("   "), "");
    }
}
