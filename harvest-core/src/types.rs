use crate::error::HarvestError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// One discussion thread returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle {
    pub id: String,
    pub community: String,
    pub title: String,
}

impl ThreadHandle {
    pub fn new(
        id: impl Into<String>,
        community: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            community: community.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub name: String,
    pub title: String,
    pub subscribers: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub parent_id: String,
    pub author: Option<String>,
    pub body: Option<String>,
    pub replies: Vec<CommentNode>,
}

impl Comment {
    /// Body text worth emitting. Deleted and removed comments keep their
    /// place in the tree but carry only a placeholder.
    pub fn text(&self) -> Option<&str> {
        let body = self.body.as_deref()?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "[deleted]" || trimmed == "[removed]" {
            None
        } else {
            Some(body)
        }
    }
}

/// A "load more comments" placeholder referencing unfetched children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreStub {
    pub id: String,
    pub parent_id: String,
    pub count: u32,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentNode {
    Comment(Comment),
    Stub(MoreStub),
}

impl CommentNode {
    pub fn is_stub(&self) -> bool {
        matches!(self, CommentNode::Stub(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchSort {
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SearchSort {
    pub const ALL: [SearchSort; 5] = [
        SearchSort::Relevance,
        SearchSort::Hot,
        SearchSort::Top,
        SearchSort::New,
        SearchSort::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::Relevance => "relevance",
            SearchSort::Hot => "hot",
            SearchSort::Top => "top",
            SearchSort::New => "new",
            SearchSort::Comments => "comments",
        }
    }
}

impl fmt::Display for SearchSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchSort {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SearchSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == wanted)
            .ok_or_else(|| {
                HarvestError::invalid_argument(format!(
                    "unknown search sort '{}' (expected one of: relevance, hot, top, new, comments)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingSort {
    Hot,
    New,
    Top,
    Rising,
}

impl ListingSort {
    pub const ALL: [ListingSort; 4] = [
        ListingSort::Hot,
        ListingSort::New,
        ListingSort::Top,
        ListingSort::Rising,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingSort::Hot => "hot",
            ListingSort::New => "new",
            ListingSort::Top => "top",
            ListingSort::Rising => "rising",
        }
    }
}

impl fmt::Display for ListingSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingSort {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ListingSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == wanted)
            .ok_or_else(|| {
                HarvestError::invalid_argument(format!(
                    "unknown listing sort '{}' (expected one of: hot, new, top, rising)",
                    s
                ))
            })
    }
}

const MAX_THREAD_ID_LEN: usize = 13;

/// A parsed address of a single thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadReference {
    pub raw: String,
    pub id: String,
}

impl ThreadReference {
    /// Accepts thread URLs (`reddit.com/.../comments/<id>`, `redd.it/<id>`,
    /// with or without scheme) and `t3_<id>` fullnames.
    pub fn parse(reference: &str) -> Result<Self, HarvestError> {
        let raw = reference.trim();
        let not_found = |reason: &str| HarvestError::ThreadNotFound {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(not_found("empty reference"));
        }

        let id = if let Some(id) = raw.strip_prefix("t3_") {
            id.to_string()
        } else {
            let url = if raw.contains("://") {
                Url::parse(raw)
            } else {
                Url::parse(&format!("https://{}", raw))
            }
            .map_err(|e| not_found(&format!("not a valid URL: {}", e)))?;

            if !matches!(url.scheme(), "http" | "https") {
                return Err(not_found("unsupported URL scheme"));
            }

            let host = url
                .host_str()
                .ok_or_else(|| not_found("URL has no host"))?
                .to_ascii_lowercase();
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();

            if host == "redd.it" {
                segments
                    .first()
                    .map(|s| s.to_string())
                    .ok_or_else(|| not_found("short link has no thread id"))?
            } else if host == "reddit.com" || host.ends_with(".reddit.com") {
                segments
                    .iter()
                    .position(|seg| *seg == "comments")
                    .and_then(|idx| segments.get(idx + 1))
                    .map(|s| s.to_string())
                    .ok_or_else(|| not_found("URL does not point at a comments page"))?
            } else {
                return Err(not_found("not a Reddit URL"));
            }
        };

        if id.is_empty()
            || id.len() > MAX_THREAD_ID_LEN
            || !id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(not_found("malformed thread id"));
        }

        Ok(Self {
            raw: raw.to_string(),
            id: id.to_ascii_lowercase(),
        })
    }

    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

impl fmt::Display for ThreadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// How a run finds the threads it harvests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    Search {
        keyword: String,
        sort: SearchSort,
        limit: usize,
    },
    DirectThread {
        reference: String,
    },
    Listing {
        community: String,
        sort: ListingSort,
        limit: usize,
    },
}

impl DiscoveryStrategy {
    pub fn schema(&self) -> RowSchema {
        match self {
            DiscoveryStrategy::DirectThread { .. } => RowSchema::TitleComment,
            DiscoveryStrategy::Search { .. } | DiscoveryStrategy::Listing { .. } => {
                RowSchema::CommunityTitleComment
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiscoveryStrategy::Search { .. } => "search",
            DiscoveryStrategy::DirectThread { .. } => "direct_thread",
            DiscoveryStrategy::Listing { .. } => "listing",
        }
    }
}

/// Fixed column set of one run's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSchema {
    CommunityTitleComment,
    TitleComment,
}

impl RowSchema {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            RowSchema::CommunityTitleComment => &["Subreddit", "Post Title", "Comment"],
            RowSchema::TitleComment => &["Post Title", "Comment"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRow {
    pub community: String,
    pub title: String,
    pub comment: String,
}

impl HarvestRow {
    pub fn new(thread: &ThreadHandle, comment: impl Into<String>) -> Self {
        Self {
            community: thread.community.clone(),
            title: thread.title.clone(),
            comment: comment.into(),
        }
    }

    /// Cells in the column order of `schema`.
    pub fn record(&self, schema: RowSchema) -> Vec<&str> {
        match schema {
            RowSchema::CommunityTitleComment => vec![&self.community, &self.title, &self.comment],
            RowSchema::TitleComment => vec![&self.title, &self.comment],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!("relevance".parse::<SearchSort>().unwrap(), SearchSort::Relevance);
        assert_eq!(" Comments ".parse::<SearchSort>().unwrap(), SearchSort::Comments);
        assert_eq!("rising".parse::<ListingSort>().unwrap(), ListingSort::Rising);

        // The two sort sets differ on purpose.
        assert!("comments".parse::<ListingSort>().is_err());
        assert!("rising".parse::<SearchSort>().is_err());
        assert!(matches!(
            "best".parse::<ListingSort>(),
            Err(HarvestError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_thread_reference_urls() {
        let full = ThreadReference::parse(
            "https://www.reddit.com/r/rust/comments/1abcde/some_title/",
        )
        .unwrap();
        assert_eq!(full.id, "1abcde");
        assert_eq!(full.fullname(), "t3_1abcde");

        let old = ThreadReference::parse("old.reddit.com/r/rust/comments/XyZ12").unwrap();
        assert_eq!(old.id, "xyz12");

        let short = ThreadReference::parse("https://redd.it/abc123").unwrap();
        assert_eq!(short.id, "abc123");

        let fullname = ThreadReference::parse("t3_q1w2e3").unwrap();
        assert_eq!(fullname.id, "q1w2e3");
    }

    #[test]
    fn test_thread_reference_rejects_malformed() {
        for bad in [
            "",
            "   ",
            "not a url",
            "https://example.com/r/rust/comments/abc",
            "https://www.reddit.com/r/rust/",
            "ftp://reddit.com/comments/abc",
            "t3_",
            "https://www.reddit.com/comments/ab-cd",
        ] {
            let result = ThreadReference::parse(bad);
            assert!(
                matches!(result, Err(HarvestError::ThreadNotFound { .. })),
                "expected ThreadNotFound for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_schema_per_strategy() {
        let search = DiscoveryStrategy::Search {
            keyword: "rust".to_string(),
            sort: SearchSort::Relevance,
            limit: 2,
        };
        let direct = DiscoveryStrategy::DirectThread {
            reference: "t3_abc".to_string(),
        };
        assert_eq!(search.schema().header(), &["Subreddit", "Post Title", "Comment"]);
        assert_eq!(direct.schema().header(), &["Post Title", "Comment"]);

        let thread = ThreadHandle::new("abc", "rust", "Title");
        let row = HarvestRow::new(&thread, "body");
        assert_eq!(row.record(direct.schema()), vec!["Title", "body"]);
        assert_eq!(row.record(search.schema()), vec!["rust", "Title", "body"]);
    }

    #[test]
    fn test_comment_text_skips_placeholders() {
        let mut comment = Comment {
            id: "c1".to_string(),
            parent_id: "t3_abc".to_string(),
            author: None,
            body: Some("[deleted]".to_string()),
            replies: Vec::new(),
        };
        assert_eq!(comment.text(), None);

        comment.body = Some("  \n".to_string());
        assert_eq!(comment.text(), None);

        comment.body = None;
        assert_eq!(comment.text(), None);

        comment.body = Some("hello".to_string());
        assert_eq!(comment.text(), Some("hello"));
    }
}
