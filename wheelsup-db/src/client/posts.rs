use crate::client::{DbClient, Result};
use sqlx::query_scalar;
use time::OffsetDateTime;
use tracing::debug;
use wheelsup_common::model::{
    Id,
    comment::{CreateComment, PostCommentMarker},
    post::{CreatePost, PostMarker},
};

impl DbClient {
    pub async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let post_id = query_scalar::<_, i64>(
            "
            INSERT INTO posts (user_id, content, image_ref, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING post_id
            ",
        )
        .bind(post.author.get())
        .bind(post.content.get())
        .bind(post.image_ref.as_ref().map(|blob| blob.get()))
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        debug!(post_id, author = %post.author, "Created post");
        Ok(post_id.into())
    }

    /// Appends a comment to a post. Returns `None` if the post does not exist.
    pub async fn create_post_comment(
        &self,
        comment: &CreateComment<PostMarker>,
    ) -> Result<Option<Id<PostCommentMarker>>> {
        let comment_id = query_scalar::<_, i64>(
            "
            INSERT INTO comments (post_id, user_id, content, created_at)
            SELECT post_id, ?, ?, ? FROM posts WHERE post_id = ?
            RETURNING comment_id
            ",
        )
        .bind(comment.author.get())
        .bind(comment.content.get())
        .bind(OffsetDateTime::now_utc())
        .bind(comment.target.get())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(comment_id) = comment_id {
            debug!(comment_id, post_id = %comment.target, "Created comment");
        }
        Ok(comment_id.map(Into::into))
    }
}
