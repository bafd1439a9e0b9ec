use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::comment::AuthoredComment;

// The model returned to the client when listing a post's comments
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentNode {
    pub id: i32,
    pub author: String,
    pub content: String,
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub depth: usize,

    /// Set on a root whose parent was not among the fetched comments.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub orphaned: bool,

    pub replies: Vec<CommentNode>,
}

/// Deepest level a reply is nested at. Replies further down the same branch
/// are listed as siblings at this depth, in thread order.
pub const MAX_REPLY_DEPTH: usize = 32;

/// Nests a flat list of one post's comments under their parents.
///
/// Roots and replies keep the relative order of the input, so chronological
/// input gives chronological threads. A comment whose parent is missing from
/// the input is kept as a root flagged `orphaned` rather than dropped, which
/// keeps partial pages renderable. Comments caught in a parent cycle are
/// surfaced the same way, with the cycle cut where it is first entered.
///
/// Nesting stops at [`MAX_REPLY_DEPTH`]; `parent_id` still names the real
/// parent of a comment that was lifted up.
pub fn build_comment_tree(comments: Vec<AuthoredComment>) -> Vec<CommentNode> {
    let n = comments.len();
    let index: HashMap<i32, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.comment.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<(usize, bool)> = Vec::new();

    for (i, c) in comments.iter().enumerate() {
        match c.comment.parent_id {
            None => roots.push((i, false)),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != i => children[parent].push(i),
                _ => roots.push((i, true)),
            },
        }
    }

    let mut placement = Placement::new(n);
    for (i, orphaned) in roots {
        placement.walk(i, orphaned, &children);
    }
    // whatever is left hangs off a parent cycle
    for i in 0..n {
        if !placement.visited[i] {
            placement.walk(i, true, &children);
        }
    }

    // pre-order puts every reply after its parent, so assembling in reverse
    // finishes all replies of a node before the node itself
    let mut slots: Vec<Option<AuthoredComment>> = comments.into_iter().map(Some).collect();
    let mut replies: Vec<Vec<CommentNode>> = vec![Vec::new(); n];
    let mut tree = Vec::new();

    for &i in placement.order.iter().rev() {
        let Some(AuthoredComment { comment, author }) = slots[i].take() else {
            continue;
        };

        let mut own_replies = std::mem::take(&mut replies[i]);
        own_replies.reverse();

        let node = CommentNode {
            id: comment.id,
            author,
            content: comment.content,
            parent_id: comment.parent_id,
            created_at: comment.created_at,
            depth: placement.depth[i],
            orphaned: placement.orphaned[i],
            replies: own_replies,
        };

        match placement.attach[i] {
            Some(parent) => replies[parent].push(node),
            None => tree.push(node),
        }
    }

    tree.reverse();
    tree
}

/// Where each comment ends up: the node it is listed under and its depth.
struct Placement {
    order: Vec<usize>,
    attach: Vec<Option<usize>>,
    depth: Vec<usize>,
    orphaned: Vec<bool>,
    visited: Vec<bool>,
}

impl Placement {
    fn new(n: usize) -> Self {
        Placement {
            order: Vec::with_capacity(n),
            attach: vec![None; n],
            depth: vec![0; n],
            orphaned: vec![false; n],
            visited: vec![false; n],
        }
    }

    fn walk(&mut self, root: usize, orphaned: bool, children: &[Vec<usize>]) {
        self.orphaned[root] = orphaned;
        let mut stack = vec![(root, None, 0)];

        while let Some((i, attach, depth)) = stack.pop() {
            if self.visited[i] {
                continue;
            }
            self.visited[i] = true;
            self.order.push(i);
            self.attach[i] = attach;
            self.depth[i] = depth;

            let below = if depth < MAX_REPLY_DEPTH {
                (Some(i), depth + 1)
            } else {
                (attach, depth)
            };
            for &child in children[i].iter().rev() {
                stack.push((child, below.0, below.1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comment::Comment;
    use chrono::NaiveDate;

    // Helper function to create a mock comment
    fn create_mock_comment(id: i32, parent_id: Option<i32>, minutes: i64) -> AuthoredComment {
        AuthoredComment {
            comment: Comment {
                id,
                post_id: 1,
                author_id: id,
                content: format!("Content for comment {}", id),
                parent_id,
                created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::TimeDelta::minutes(minutes),
            },
            author: format!("Author {}", id),
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<i32> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_build_comment_tree_with_no_comments() {
        let result = build_comment_tree(vec![]);
        assert!(result.is_empty(), "Expected no comments in the tree");
    }

    #[test]
    fn test_build_comment_tree_with_nested_replies() {
        let comments = vec![
            create_mock_comment(1, None, 0),
            create_mock_comment(2, Some(1), 1),
            create_mock_comment(3, Some(1), 2),
            create_mock_comment(4, Some(2), 3),
        ];

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![1], "Expected one root comment");
        let root = &result[0];
        assert_eq!(root.author, "Author 1");
        assert_eq!(ids(&root.replies), vec![2, 3]);
        assert_eq!(ids(&root.replies[0].replies), vec![4]);
        assert!(root.replies[1].replies.is_empty());
        assert_eq!(root.replies[0].replies[0].depth, 2);
        assert!(!root.orphaned);
    }

    #[test]
    fn test_replies_keep_input_order() {
        // replies arrive newest first; the builder must not re-sort them
        let comments = vec![
            create_mock_comment(10, None, 0),
            create_mock_comment(13, Some(10), 3),
            create_mock_comment(11, Some(10), 1),
            create_mock_comment(12, Some(10), 2),
            create_mock_comment(5, None, 4),
        ];

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![10, 5]);
        assert_eq!(ids(&result[0].replies), vec![13, 11, 12]);
    }

    #[test]
    fn test_reply_before_parent_in_input() {
        let comments = vec![
            create_mock_comment(2, Some(1), 1),
            create_mock_comment(1, None, 0),
        ];

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![1]);
        assert_eq!(ids(&result[0].replies), vec![2]);
    }

    #[test]
    fn test_orphaned_reply_becomes_flagged_root() {
        let comments = vec![
            create_mock_comment(1, None, 0),
            create_mock_comment(7, Some(99), 1),
            create_mock_comment(8, Some(7), 2),
        ];

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![1, 7]);
        assert!(!result[0].orphaned);
        assert!(result[1].orphaned);
        assert_eq!(result[1].parent_id, Some(99));
        assert_eq!(result[1].depth, 0);
        assert_eq!(ids(&result[1].replies), vec![8]);
        assert!(!result[1].replies[0].orphaned);
    }

    #[test]
    fn test_parent_cycle_does_not_loop() {
        let comments = vec![
            create_mock_comment(1, Some(2), 0),
            create_mock_comment(2, Some(1), 1),
            create_mock_comment(3, Some(3), 2),
        ];

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![3, 1]);
        assert!(result.iter().all(|n| n.orphaned));
        assert_eq!(ids(&result[1].replies), vec![2]);
        assert!(result[1].replies[0].replies.is_empty());
    }

    #[test]
    fn test_long_reply_chain_is_flattened_past_max_depth() {
        let len = 20_000;
        let comments = (1..=len)
            .map(|id| create_mock_comment(id, (id > 1).then(|| id - 1), id as i64))
            .collect();

        let result = build_comment_tree(comments);

        assert_eq!(ids(&result), vec![1]);
        let mut node = &result[0];
        for depth in 0..MAX_REPLY_DEPTH - 1 {
            assert_eq!(node.depth, depth);
            assert_eq!(node.replies.len(), 1);
            node = &node.replies[0];
        }

        // everything below the cap hangs off the last nested comment, in order
        let flattened = &node.replies;
        assert_eq!(flattened.len(), len as usize - MAX_REPLY_DEPTH);
        assert_eq!(flattened[0].id, MAX_REPLY_DEPTH as i32 + 1);
        assert_eq!(flattened.last().map(|n| n.id), Some(len));
        assert!(flattened.iter().all(|n| n.depth == MAX_REPLY_DEPTH));
        assert!(flattened.iter().all(|n| n.replies.is_empty()));
        assert_eq!(flattened[1].parent_id, Some(MAX_REPLY_DEPTH as i32 + 1));

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(&format!("\"id\":{len}")));
    }

    #[test]
    fn test_branches_below_max_depth_keep_thread_order() {
        let deepest = MAX_REPLY_DEPTH as i32 + 1;
        let mut comments: Vec<AuthoredComment> = (1..=deepest)
            .map(|id| create_mock_comment(id, (id > 1).then(|| id - 1), id as i64))
            .collect();
        // two replies under the capped comment, the first with its own reply
        comments.push(create_mock_comment(100, Some(deepest), 100));
        comments.push(create_mock_comment(101, Some(deepest), 101));
        comments.push(create_mock_comment(102, Some(100), 102));

        let result = build_comment_tree(comments);

        let mut node = &result[0];
        while node.depth < MAX_REPLY_DEPTH - 1 {
            node = &node.replies[0];
        }
        assert_eq!(ids(&node.replies), vec![deepest, 100, 102, 101]);
    }

    #[test]
    fn test_orphaned_flag_only_serialized_when_set() {
        let result = build_comment_tree(vec![
            create_mock_comment(1, None, 0),
            create_mock_comment(2, Some(42), 1),
        ]);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json[0].get("orphaned").is_none());
        assert_eq!(json[1]["orphaned"], true);
        assert_eq!(json[0]["replies"], serde_json::json!([]));
    }
}
