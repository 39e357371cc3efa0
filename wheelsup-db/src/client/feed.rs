use crate::{
    client::{DbClient, Result},
    record::{CommentRecord, PostRecord},
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use tracing::debug;
use wheelsup_common::model::{
    Id,
    comment::PostComment,
    feed::{FeedOrder, FeedScope, sort_recent_first},
    post::{EnrichedPost, PostMarker},
    user::UserMarker,
};

/// Selects posts with author name, like count and the viewer's like. The viewer id is bound
/// right after this fragment.
const POSTS_SELECT_HEAD: &str = "
    SELECT
        posts.post_id,
        posts.content,
        posts.image_ref,
        posts.created_at,
        users.user_id,
        users.name,
        (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.post_id) AS like_count,
        EXISTS (
            SELECT 1 FROM likes WHERE likes.post_id = posts.post_id AND likes.user_id = ";

const POSTS_SELECT_TAIL: &str = "
        ) AS liked_by_viewer
    FROM
        posts JOIN users ON users.user_id = posts.user_id";

enum PostFilter {
    Scope(FeedScope),
    Single(Id<PostMarker>),
}

impl DbClient {
    /// Assembles the posts in `scope` with like counts and comment threads.
    ///
    /// Posts, counts and comments are read in one transaction and therefore from one snapshot.
    pub async fn assemble_feed(
        &self,
        viewer: Option<Id<UserMarker>>,
        scope: FeedScope,
        order: FeedOrder,
    ) -> Result<Vec<EnrichedPost>> {
        let mut tx = self.pool.begin().await?;
        let mut posts = fetch_enriched(&mut tx, viewer, PostFilter::Scope(scope)).await?;
        tx.commit().await?;

        if order == FeedOrder::RecencyDescending {
            sort_recent_first(&mut posts);
        }

        debug!(?scope, ?order, posts = posts.len(), "Assembled feed");
        Ok(posts)
    }

    pub async fn enriched_post(
        &self,
        post_id: Id<PostMarker>,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Option<EnrichedPost>> {
        let mut tx = self.pool.begin().await?;
        let posts = fetch_enriched(&mut tx, viewer, PostFilter::Single(post_id)).await?;
        tx.commit().await?;

        Ok(posts.into_iter().next())
    }
}

async fn fetch_enriched(
    conn: &mut SqliteConnection,
    viewer: Option<Id<UserMarker>>,
    filter: PostFilter,
) -> Result<Vec<EnrichedPost>> {
    let mut builder = QueryBuilder::<Sqlite>::new(POSTS_SELECT_HEAD);
    builder
        .push_bind(viewer.map(Id::get))
        .push(POSTS_SELECT_TAIL);

    match filter {
        PostFilter::Scope(FeedScope::All) => {}
        PostFilter::Scope(FeedScope::ByAuthor(author)) => {
            builder.push(" WHERE posts.user_id = ").push_bind(author.get());
        }
        PostFilter::Scope(FeedScope::Random(limit)) => {
            builder
                .push(" ORDER BY RANDOM() LIMIT ")
                .push_bind(i64::from(limit));
        }
        PostFilter::Single(post_id) => {
            builder.push(" WHERE posts.post_id = ").push_bind(post_id.get());
        }
    }

    let records = builder
        .build_query_as::<PostRecord>()
        .fetch_all(&mut *conn)
        .await?;
    let mut posts = records
        .into_iter()
        .map(EnrichedPost::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let post_ids: Vec<i64> = posts.iter().map(|enriched| enriched.post.id.get()).collect();
    let mut threads = fetch_comment_threads(conn, &post_ids).await?;
    for enriched in &mut posts {
        if let Some(comments) = threads.remove(&enriched.post.id.get()) {
            enriched.comments = comments;
        }
    }

    Ok(posts)
}

/// Upper bound on post ids bound into one comment query. SQLite limits the number of host
/// parameters per statement.
const COMMENT_QUERY_IDS: usize = 900;

/// Comments of the given posts keyed by post id, each thread in creation order.
async fn fetch_comment_threads(
    conn: &mut SqliteConnection,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<PostComment>>> {
    let mut threads: HashMap<i64, Vec<PostComment>> = HashMap::new();

    // A thread never spans two chunks, so per-chunk ordering is the thread order.
    for chunk in post_ids.chunks(COMMENT_QUERY_IDS) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "
            SELECT
                comments.comment_id,
                comments.post_id AS parent_id,
                comments.content,
                comments.created_at,
                users.user_id,
                users.name
            FROM
                comments JOIN users ON users.user_id = comments.user_id
            WHERE
                comments.post_id IN (",
        );
        let mut ids = builder.separated(", ");
        for post_id in chunk {
            ids.push_bind(*post_id);
        }
        ids.push_unseparated(") ORDER BY comments.created_at, comments.comment_id");

        let records = builder
            .build_query_as::<CommentRecord>()
            .fetch_all(&mut *conn)
            .await?;

        for record in records {
            let post_id = record.parent_id;
            threads
                .entry(post_id)
                .or_default()
                .push(PostComment::try_from(record)?);
        }
    }

    Ok(threads)
}
