use harvest_core::{CommentNode, CommentRetrievalFailure, Platform, ThreadHandle};
use tracing::debug;

/// "Load more" stubs resolved per thread. Zero keeps every thread to a
/// single comment-tree request; stubs are dropped.
pub const STUB_EXPANSION_BUDGET: usize = 0;

/// Which part of the comment tree a run emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Every loaded comment, depth-first, each comment before its replies.
    #[default]
    AllReplies,
    /// Only direct replies to the thread.
    TopLevel,
}

#[derive(Debug, Clone, Copy)]
pub struct CommentFlattener {
    max_comments: usize,
    traversal: Traversal,
}

impl CommentFlattener {
    pub fn new(max_comments: usize, traversal: Traversal) -> Self {
        Self {
            max_comments,
            traversal,
        }
    }

    /// Fetches the thread's comment tree and returns at most `max_comments`
    /// bodies. A fetch failure is scoped to this thread.
    pub async fn flatten<P: Platform + ?Sized>(
        &self,
        platform: &P,
        thread: &ThreadHandle,
    ) -> Result<Vec<String>, CommentRetrievalFailure> {
        if self.max_comments == 0 {
            return Ok(Vec::new());
        }

        let forest = platform
            .comment_tree(thread, STUB_EXPANSION_BUDGET)
            .await
            .map_err(|e| CommentRetrievalFailure::new(thread, &e))?;

        let bodies = self.flatten_forest(&forest);
        debug!("Flattened {} comment(s) from {}", bodies.len(), thread.id);
        Ok(bodies)
    }

    /// Walks the forest in pre-order without recursion, so reply depth is
    /// bounded only by memory.
    pub fn flatten_forest(&self, forest: &[CommentNode]) -> Vec<String> {
        let mut bodies = Vec::with_capacity(self.max_comments.min(forest.len()));
        let mut stack: Vec<std::slice::Iter<'_, CommentNode>> = vec![forest.iter()];

        while bodies.len() < self.max_comments {
            let Some(level) = stack.last_mut() else {
                break;
            };
            match level.next() {
                Some(CommentNode::Comment(comment)) => {
                    if let Some(text) = comment.text() {
                        bodies.push(text.to_string());
                    }
                    if self.traversal == Traversal::AllReplies && !comment.replies.is_empty() {
                        stack.push(comment.replies.iter());
                    }
                }
                Some(CommentNode::Stub(_)) => {}
                None => {
                    stack.pop();
                }
            }
        }
        bodies
    }
}
