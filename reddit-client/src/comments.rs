//! Decoding of Reddit comment listings into a [`CommentNode`] forest, and
//! splicing of expanded "load more" stubs back into it.

use crate::api::{RedditCommentData, RedditListing, RedditListingChild, RedditMoreData};
use harvest_core::{Comment, CommentNode, HarvestError, MoreStub, RedditApiError};
use serde_json::Value;

fn invalid(details: String) -> HarvestError {
    RedditApiError::InvalidResponse { details }.into()
}

/// Decodes the children of a comment listing. Kinds other than `t1` and
/// `more` are ignored.
pub fn decode_forest(
    children: Vec<RedditListingChild<Value>>,
) -> Result<Vec<CommentNode>, HarvestError> {
    let mut forest = Vec::with_capacity(children.len());
    for child in children {
        if let Some(node) = decode_node(child)? {
            forest.push(node);
        }
    }
    Ok(forest)
}

fn decode_node(child: RedditListingChild<Value>) -> Result<Option<CommentNode>, HarvestError> {
    match child.kind.as_str() {
        "t1" => {
            let data: RedditCommentData = serde_json::from_value(child.data)
                .map_err(|e| invalid(format!("malformed comment: {}", e)))?;
            let replies = match data.replies {
                Value::Object(_) => {
                    let listing: RedditListing<Value> = serde_json::from_value(data.replies)
                        .map_err(|e| invalid(format!("malformed replies of {}: {}", data.id, e)))?;
                    decode_forest(listing.data.children)?
                }
                _ => Vec::new(),
            };
            Ok(Some(CommentNode::Comment(Comment {
                id: data.id,
                parent_id: data.parent_id,
                author: data.author,
                body: data.body,
                replies,
            })))
        }
        "more" => {
            let data: RedditMoreData = serde_json::from_value(child.data)
                .map_err(|e| invalid(format!("malformed 'more' stub: {}", e)))?;
            Ok(Some(CommentNode::Stub(MoreStub {
                id: data.id,
                parent_id: data.parent_id,
                count: data.count,
                children: data.children,
            })))
        }
        _ => Ok(None),
    }
}

/// Stubs that `/api/morechildren` can resolve, in pre-order, at most `budget`.
///
/// "Continue this thread" stubs carry no child ids and are never selected.
pub fn expandable_stubs(forest: &[CommentNode], budget: usize) -> Vec<MoreStub> {
    let mut found = Vec::new();
    let mut stack: Vec<std::slice::Iter<'_, CommentNode>> = vec![forest.iter()];

    while let Some(level) = stack.last_mut() {
        if found.len() >= budget {
            break;
        }
        match level.next() {
            Some(CommentNode::Comment(comment)) => stack.push(comment.replies.iter()),
            Some(CommentNode::Stub(stub)) if !stub.children.is_empty() => found.push(stub.clone()),
            Some(CommentNode::Stub(_)) => {}
            None => {
                stack.pop();
            }
        }
    }
    found
}

/// Re-nests the flat things returned for `stub` under their parents.
///
/// Things hanging directly off the stub's parent form the replacement
/// sequence; ids beyond the single-request batch stay behind as a smaller stub.
pub fn rebuild_expansion(
    stub: &MoreStub,
    things: Vec<RedditListingChild<Value>>,
) -> Result<Vec<CommentNode>, HarvestError> {
    let flat = decode_forest(things)?;
    let mut replacement = attach(&stub.parent_id, &flat);

    if stub.children.len() > crate::api::MAX_MORE_CHILDREN {
        let remaining = stub.children[crate::api::MAX_MORE_CHILDREN..].to_vec();
        replacement.push(CommentNode::Stub(MoreStub {
            id: stub.id.clone(),
            parent_id: stub.parent_id.clone(),
            count: remaining.len() as u32,
            children: remaining,
        }));
    }
    Ok(replacement)
}

fn node_parent(node: &CommentNode) -> &str {
    match node {
        CommentNode::Comment(c) => &c.parent_id,
        CommentNode::Stub(s) => &s.parent_id,
    }
}

fn attach(parent_fullname: &str, flat: &[CommentNode]) -> Vec<CommentNode> {
    flat.iter()
        .filter(|node| node_parent(node) == parent_fullname)
        .map(|node| match node {
            CommentNode::Comment(comment) => {
                let mut comment = comment.clone();
                let own_fullname = format!("t1_{}", comment.id);
                comment.replies.extend(attach(&own_fullname, flat));
                CommentNode::Comment(comment)
            }
            CommentNode::Stub(stub) => CommentNode::Stub(stub.clone()),
        })
        .collect()
}

/// Replaces the stub with id `stub_id` by `replacement`. Returns false when
/// no such stub exists.
pub fn splice_stub(
    forest: &mut Vec<CommentNode>,
    stub_id: &str,
    replacement: Vec<CommentNode>,
) -> bool {
    let position = forest
        .iter()
        .position(|node| matches!(node, CommentNode::Stub(s) if s.id == stub_id));

    if let Some(idx) = position {
        forest.splice(idx..=idx, replacement);
        return true;
    }

    for node in forest.iter_mut() {
        if let CommentNode::Comment(comment) = node {
            if contains_stub(&comment.replies, stub_id) {
                return splice_stub(&mut comment.replies, stub_id, replacement);
            }
        }
    }
    false
}

fn contains_stub(forest: &[CommentNode], stub_id: &str) -> bool {
    forest.iter().any(|node| match node {
        CommentNode::Stub(s) => s.id == stub_id,
        CommentNode::Comment(c) => contains_stub(&c.replies, stub_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: &str, parent: &str, body: &str, replies: Value) -> Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "parent_id": parent,
                "author": "someone",
                "body": body,
                "replies": replies
            }
        })
    }

    fn more(id: &str, parent: &str, children: &[&str]) -> Value {
        json!({
            "kind": "more",
            "data": {
                "id": id,
                "parent_id": parent,
                "count": children.len(),
                "children": children
            }
        })
    }

    fn listing(children: Vec<Value>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children, "after": null, "before": null } })
    }

    fn decode(children: Vec<Value>) -> Vec<CommentNode> {
        let parsed: RedditListing<Value> = serde_json::from_value(listing(children)).unwrap();
        decode_forest(parsed.data.children).unwrap()
    }

    #[test]
    fn test_decode_nested_forest() {
        let forest = decode(vec![
            comment(
                "a",
                "t3_post",
                "first",
                listing(vec![
                    comment("a1", "t1_a", "reply", json!("")),
                    more("m1", "t1_a", &["a2", "a3"]),
                ]),
            ),
            comment("b", "t3_post", "second", json!("")),
            json!({ "kind": "t3", "data": {} }),
        ]);

        assert_eq!(forest.len(), 2);
        match &forest[0] {
            CommentNode::Comment(c) => {
                assert_eq!(c.body.as_deref(), Some("first"));
                assert_eq!(c.replies.len(), 2);
                assert!(c.replies[1].is_stub());
            }
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_comment_is_invalid_response() {
        let parsed: RedditListing<Value> = serde_json::from_value(listing(vec![json!({
            "kind": "t1",
            "data": { "body": "no ids" }
        })]))
        .unwrap();

        let result = decode_forest(parsed.data.children);
        assert!(matches!(
            result,
            Err(HarvestError::RedditApi(RedditApiError::InvalidResponse { .. }))
        ));
    }

    #[test]
    fn test_expandable_stubs_respects_budget_and_order() {
        let forest = decode(vec![
            comment(
                "a",
                "t3_post",
                "first",
                listing(vec![more("m1", "t1_a", &["x"])]),
            ),
            more("continue", "t3_post", &[]),
            more("m2", "t3_post", &["y", "z"]),
        ]);

        assert!(expandable_stubs(&forest, 0).is_empty());

        let one = expandable_stubs(&forest, 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, "m1");

        let all: Vec<String> = expandable_stubs(&forest, 10)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(all, vec!["m1", "m2"]);
    }

    #[test]
    fn test_rebuild_and_splice_expansion() {
        let mut forest = decode(vec![
            comment("a", "t3_post", "first", json!("")),
            more("m", "t3_post", &["b", "c", "b1"]),
        ]);
        let stub = expandable_stubs(&forest, 1).remove(0);

        let things: RedditListing<Value> = serde_json::from_value(listing(vec![
            comment("b", "t3_post", "second", json!("")),
            comment("b1", "t1_b", "reply to second", json!("")),
            comment("c", "t3_post", "third", json!("")),
        ]))
        .unwrap();

        let replacement = rebuild_expansion(&stub, things.data.children).unwrap();
        assert_eq!(replacement.len(), 2);
        assert!(splice_stub(&mut forest, &stub.id, replacement));

        assert_eq!(forest.len(), 3);
        assert!(forest.iter().all(|n| !n.is_stub()));
        match &forest[1] {
            CommentNode::Comment(c) => {
                assert_eq!(c.id, "b");
                assert_eq!(c.replies.len(), 1);
            }
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_splice_nested_stub() {
        let mut forest = decode(vec![
            comment("a", "t3_post", "first", json!("")),
            comment(
                "b",
                "t3_post",
                "second",
                listing(vec![more("deep", "t1_b", &["q"])]),
            ),
        ]);

        assert!(splice_stub(&mut forest, "deep", Vec::new()));
        assert!(!splice_stub(&mut forest, "deep", Vec::new()));
        match &forest[1] {
            CommentNode::Comment(c) => assert!(c.replies.is_empty()),
            other => panic!("Expected comment, got {:?}", other),
        }
    }
}
