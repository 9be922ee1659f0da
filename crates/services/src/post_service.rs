use std::sync::Arc;

use baeum_core::Clock;
use baeum_core::gamification::XpReason;
use baeum_core::model::{Comment, CommentId, Post, PostId, UserId};
use storage::repository::{NewCommentRecord, NewPostRecord, PostRepository, StorageError};

use crate::error::PostServiceError;
use crate::gamification_service::GamificationService;

/// Thin validation-and-persistence layer for the social feed.
#[derive(Clone)]
pub struct PostService {
    clock: Clock,
    posts: Arc<dyn PostRepository>,
    gamification: GamificationService,
}

impl PostService {
    #[must_use]
    pub fn new(
        clock: Clock,
        posts: Arc<dyn PostRepository>,
        gamification: GamificationService,
    ) -> Self {
        Self {
            clock,
            posts,
            gamification,
        }
    }

    /// Create a feed post, awarding post XP.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::Post` for validation failures.
    pub async fn create_post(
        &self,
        author: UserId,
        body: String,
        attachment_url: Option<String>,
    ) -> Result<PostId, PostServiceError> {
        let now = self.clock.now();
        let post = Post::new(PostId::new(1), author, body, attachment_url, now)?;
        let post_id = self
            .posts
            .insert_post(NewPostRecord::from_post(&post))
            .await?;

        self.gamification
            .award(author, XpReason::PostCreated)
            .await?;

        Ok(post_id)
    }

    /// Posts newest-first, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::Storage` if repository access fails.
    pub async fn list_posts(&self, limit: u32) -> Result<Vec<Post>, PostServiceError> {
        let posts = self.posts.list_posts(limit).await?;
        Ok(posts)
    }

    /// Comment on an existing post.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::UnknownPost` for a dangling post ID and
    /// `PostServiceError::Post` for validation failures.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        author: UserId,
        body: String,
    ) -> Result<CommentId, PostServiceError> {
        let now = self.clock.now();
        let comment = Comment::new(CommentId::new(1), post_id, author, body, now)?;
        let comment_id = self
            .posts
            .insert_comment(NewCommentRecord::from_comment(&comment))
            .await
            .map_err(|e| match e {
                StorageError::NotFound => PostServiceError::UnknownPost,
                other => other.into(),
            })?;
        Ok(comment_id)
    }

    /// Comments of a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::Storage` if repository access fails.
    pub async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, PostServiceError> {
        let comments = self.posts.comments_for_post(post_id).await?;
        Ok(comments)
    }
}
