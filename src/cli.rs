use clap::{Parser, Subcommand};
use harvest_core::{DiscoveryStrategy, HarvestError, ListingSort, SearchSort};
use harvest_service::{HarvestRequest, Traversal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "thread-harvest")]
#[command(about = "Harvest Reddit comments into a CSV file", long_about = None)]
pub struct Cli {
    /// Credentials file (default: config.toml, then resources/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only emit direct replies to each thread
    #[arg(long, global = true)]
    pub top_level_only: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search all of Reddit for a keyword
    Search {
        keyword: String,
        post_count: usize,
        comments_per_post: usize,
        /// relevance, hot, top, new or comments
        sort_by: String,
        output_path: PathBuf,
    },
    /// Harvest a single thread by URL
    Post {
        /// Thread URL, redd.it link or t3_ fullname
        thread_reference: String,
        comments_per_post: usize,
        output_path: PathBuf,
    },
    /// Harvest posts from a subreddit listing
    Subreddit {
        community_name: String,
        post_count: usize,
        comments_per_post: usize,
        /// hot, new, top or rising
        sort_by: String,
        output_path: PathBuf,
    },
}

impl Cli {
    /// Validates the arguments into a request. Sorts are checked here, before
    /// any configuration or network access.
    pub fn into_request(self) -> Result<HarvestRequest, HarvestError> {
        let traversal = if self.top_level_only {
            Traversal::TopLevel
        } else {
            Traversal::AllReplies
        };

        let (strategy, comments_per_thread, output) = match self.command {
            Commands::Search {
                keyword,
                post_count,
                comments_per_post,
                sort_by,
                output_path,
            } => (
                DiscoveryStrategy::Search {
                    keyword,
                    sort: sort_by.parse::<SearchSort>()?,
                    limit: post_count,
                },
                comments_per_post,
                output_path,
            ),
            Commands::Post {
                thread_reference,
                comments_per_post,
                output_path,
            } => (
                DiscoveryStrategy::DirectThread {
                    reference: thread_reference,
                },
                comments_per_post,
                output_path,
            ),
            Commands::Subreddit {
                community_name,
                post_count,
                comments_per_post,
                sort_by,
                output_path,
            } => (
                DiscoveryStrategy::Listing {
                    community: community_name.trim().to_string(),
                    sort: sort_by.parse::<ListingSort>()?,
                    limit: post_count,
                },
                comments_per_post,
                output_path,
            ),
        };

        Ok(HarvestRequest {
            strategy,
            comments_per_thread,
            traversal,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<HarvestRequest, HarvestError> {
        Cli::try_parse_from(args).unwrap().into_request()
    }

    #[test]
    fn test_search_arguments() {
        let request =
            parse(&["thread-harvest", "search", "rust", "2", "3", "Top", "out.csv"]).unwrap();
        assert_eq!(
            request.strategy,
            DiscoveryStrategy::Search {
                keyword: "rust".to_string(),
                sort: SearchSort::Top,
                limit: 2,
            }
        );
        assert_eq!(request.comments_per_thread, 3);
        assert_eq!(request.traversal, Traversal::AllReplies);
        assert_eq!(request.output, PathBuf::from("out.csv"));
    }

    #[test]
    fn test_subreddit_with_global_flags() {
        let request = parse(&[
            "thread-harvest",
            "subreddit",
            "--top-level-only",
            "  rust ",
            "5",
            "0",
            "rising",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(request.traversal, Traversal::TopLevel);
        assert!(matches!(
            request.strategy,
            DiscoveryStrategy::Listing { ref community, sort: ListingSort::Rising, limit: 5 }
                if community == "rust"
        ));
    }

    #[test]
    fn test_post_arguments() {
        let cli = Cli::try_parse_from([
            "thread-harvest",
            "--config",
            "creds.toml",
            "post",
            "https://redd.it/abc123",
            "10",
            "thread.csv",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("creds.toml")));

        let request = cli.into_request().unwrap();
        assert_eq!(request.strategy.name(), "direct_thread");
        assert_eq!(request.comments_per_thread, 10);
    }

    #[test]
    fn test_sort_sets_are_validated() {
        let bad_search = parse(&["thread-harvest", "search", "rust", "2", "3", "rising", "o.csv"]);
        assert!(matches!(bad_search, Err(HarvestError::InvalidArgument { .. })));

        let bad_listing =
            parse(&["thread-harvest", "subreddit", "rust", "2", "3", "comments", "o.csv"]);
        assert!(matches!(bad_listing, Err(HarvestError::InvalidArgument { .. })));
    }

    #[test]
    fn test_usage_errors() {
        assert!(Cli::try_parse_from(["thread-harvest", "search", "rust", "2"]).is_err());
        assert!(
            Cli::try_parse_from(["thread-harvest", "search", "rust", "-1", "3", "top", "o.csv"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["thread-harvest", "post", "t3_abc", "many", "o.csv"]).is_err()
        );
    }
}
