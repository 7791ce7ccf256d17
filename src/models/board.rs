use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardCategory {
    Notice,
    Free,
    Qna,
    Faq,
    Event,
}

impl BoardCategory {
    pub const ALL: [BoardCategory; 5] = [
        BoardCategory::Notice,
        BoardCategory::Free,
        BoardCategory::Qna,
        BoardCategory::Faq,
        BoardCategory::Event,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoardCategory::Notice => "NOTICE",
            BoardCategory::Free => "FREE",
            BoardCategory::Qna => "QNA",
            BoardCategory::Faq => "FAQ",
            BoardCategory::Event => "EVENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Active,
    Hidden,
    Deleted,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Active => "ACTIVE",
            PostStatus::Hidden => "HIDDEN",
            PostStatus::Deleted => "DELETED",
        }
    }
}

/// An announcement/discussion post. Deletion is a soft status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub category: BoardCategory,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub is_pinned: bool,
    pub is_featured: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub attachment_files: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a board post; `parent_id` points at the comment it replies
/// to. The relational parent reference is the single source of truth for
/// the reply structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub board_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub like_count: i64,
    pub is_secret: bool,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Builds the reply tree by grouping on parent_id, without recursive
/// traversal. Input is expected in creation order (parents before their
/// replies); a reply whose parent is missing from the input is surfaced as
/// a top-level comment rather than dropped.
pub fn build_reply_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let index: HashMap<String, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let mut slots: Vec<Option<CommentNode>> = comments
        .into_iter()
        .map(|comment| {
            Some(CommentNode {
                comment,
                replies: Vec::new(),
            })
        })
        .collect();

    // Walk newest-first so a node's own replies are already attached when
    // the node is moved under its parent.
    for i in (0..slots.len()).rev() {
        let parent_slot = slots[i]
            .as_ref()
            .and_then(|n| n.comment.parent_id.as_ref())
            .and_then(|pid| index.get(pid))
            .copied()
            .filter(|&p| p != i);

        if let Some(p) = parent_slot {
            if let Some(node) = slots[i].take() {
                match slots[p].as_mut() {
                    // insert at the front to keep creation order
                    Some(parent) => parent.replies.insert(0, node),
                    None => slots[i] = Some(node),
                }
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        let now = Utc::now();
        Comment {
            id: id.to_string(),
            board_id: "board-1".to_string(),
            parent_id: parent.map(str::to_string),
            author_id: "user-1".to_string(),
            content: format!("comment {}", id),
            like_count: 0,
            is_secret: false,
            status: PostStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn groups_replies_under_parents() {
        let tree = build_reply_tree(vec![
            comment("a", None),
            comment("b", None),
            comment("a1", Some("a")),
            comment("a2", Some("a")),
            comment("b1", Some("b")),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, "a");
        let a_replies: Vec<&str> = tree[0].replies.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(a_replies, vec!["a1", "a2"]);
        assert_eq!(tree[1].replies.len(), 1);
    }

    #[test]
    fn handles_nested_replies_without_recursion() {
        // deep chain: each reply answers the previous one
        let mut comments = vec![comment("c0", None)];
        for i in 1..200 {
            let parent = format!("c{}", i - 1);
            comments.push(comment(&format!("c{}", i), Some(&parent)));
        }

        let tree = build_reply_tree(comments);
        assert_eq!(tree.len(), 1);
        let mut depth = 0;
        let mut node = &tree[0];
        while let Some(next) = node.replies.first() {
            node = next;
            depth += 1;
        }
        assert_eq!(depth, 199);
    }

    #[test]
    fn orphaned_reply_becomes_top_level() {
        let tree = build_reply_tree(vec![comment("a", None), comment("x1", Some("gone"))]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_tree() {
        assert!(build_reply_tree(Vec::new()).is_empty());
    }
}
