use crate::error::HarvestError;
use crate::types::{CommentNode, Community, ListingSort, SearchSort, ThreadHandle, ThreadReference};
use async_trait::async_trait;

/// The capability surface the harvesting pipeline needs from a discussion
/// platform. Authentication, transport, rate limiting and pagination stay
/// behind it.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Up to `limit` threads matching `keyword` across all communities.
    async fn search(
        &self,
        keyword: &str,
        sort: SearchSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError>;

    async fn get_thread(&self, reference: &ThreadReference) -> Result<ThreadHandle, HarvestError>;

    async fn get_community(&self, name: &str) -> Result<Community, HarvestError>;

    /// Up to `limit` threads of `community` in `sort` order.
    async fn community_listing(
        &self,
        community: &Community,
        sort: ListingSort,
        limit: usize,
    ) -> Result<Vec<ThreadHandle>, HarvestError>;

    /// The thread's comment forest with at most `stub_expansion_budget`
    /// "load more" stubs resolved. Remaining stubs are left in place.
    async fn comment_tree(
        &self,
        thread: &ThreadHandle,
        stub_expansion_budget: usize,
    ) -> Result<Vec<CommentNode>, HarvestError>;
}
