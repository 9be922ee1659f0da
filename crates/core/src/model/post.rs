use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CommentId, PostId, UserId};

/// Maximum length of a post body in characters.
pub const MAX_POST_LEN: usize = 2000;
/// Maximum length of a comment body in characters.
pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PostError {
    #[error("body cannot be empty")]
    EmptyBody,

    #[error("body is {len} characters, maximum is {max}")]
    BodyTooLong { len: usize, max: usize },

    #[error("attachment URL is not a valid URL")]
    InvalidAttachmentUrl,
}

fn validated_body(body: String, max: usize) -> Result<String, PostError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(PostError::EmptyBody);
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(PostError::BodyTooLong { len, max });
    }
    Ok(trimmed.to_owned())
}

/// A learner's social feed post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    id: PostId,
    author: UserId,
    body: String,
    attachment_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl Post {
    /// Creates a new post.
    ///
    /// # Errors
    ///
    /// Returns `PostError` for an empty/oversized body or an invalid
    /// attachment URL.
    pub fn new(
        id: PostId,
        author: UserId,
        body: impl Into<String>,
        attachment_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PostError> {
        let body = validated_body(body.into(), MAX_POST_LEN)?;

        let attachment_url = attachment_url
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        if let Some(raw) = attachment_url.as_ref() {
            if Url::parse(raw).is_err() {
                return Err(PostError::InvalidAttachmentUrl);
            }
        }

        Ok(Self {
            id,
            author,
            body,
            attachment_url,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> PostId {
        self.id
    }

    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment_url.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    id: CommentId,
    post_id: PostId,
    author: UserId,
    body: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a new comment.
    ///
    /// # Errors
    ///
    /// Returns `PostError` for an empty or oversized body.
    pub fn new(
        id: CommentId,
        post_id: PostId,
        author: UserId,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PostError> {
        let body = validated_body(body.into(), MAX_COMMENT_LEN)?;

        Ok(Self {
            id,
            post_id,
            author,
            body,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CommentId {
        self.id
    }

    #[must_use]
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn post_rejects_empty_and_oversized_bodies() {
        let err = Post::new(PostId::new(1), UserId::new(1), "  ", None, fixed_now()).unwrap_err();
        assert_eq!(err, PostError::EmptyBody);

        let long = "가".repeat(MAX_POST_LEN + 1);
        let err = Post::new(PostId::new(1), UserId::new(1), long, None, fixed_now()).unwrap_err();
        assert_eq!(
            err,
            PostError::BodyTooLong {
                len: MAX_POST_LEN + 1,
                max: MAX_POST_LEN
            }
        );
    }

    #[test]
    fn post_validates_attachment_url() {
        let err = Post::new(
            PostId::new(1),
            UserId::new(1),
            "study notes",
            Some("nope".into()),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, PostError::InvalidAttachmentUrl);

        let post = Post::new(
            PostId::new(1),
            UserId::new(1),
            "study notes",
            Some("https://img.example.com/notes.png".into()),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(
            post.attachment_url(),
            Some("https://img.example.com/notes.png")
        );
    }

    #[test]
    fn comment_trims_body_and_enforces_limit() {
        let comment = Comment::new(
            CommentId::new(1),
            PostId::new(1),
            UserId::new(2),
            "  화이팅!  ",
            fixed_now(),
        )
        .unwrap();
        assert_eq!(comment.body(), "화이팅!");

        let long = "a".repeat(MAX_COMMENT_LEN + 1);
        let err = Comment::new(
            CommentId::new(1),
            PostId::new(1),
            UserId::new(2),
            long,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, PostError::BodyTooLong { .. }));
    }
}
