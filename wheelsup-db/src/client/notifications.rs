use crate::{
    client::{DbClient, Result},
    record::NotificationRecord,
};
use sqlx::{SqliteConnection, query_as, query_scalar};
use wheelsup_common::model::{
    Id,
    notification::{Notification, NotificationKind},
    user::UserMarker,
};

/// One statement per event source. Each binds the recipient once and yields rows already in
/// notification order.
const SOURCES: [(NotificationKind, &str); 3] = [
    (
        NotificationKind::Like,
        "
        SELECT
            posts.post_id, users.user_id, users.name, posts.created_at
        FROM
            likes
            JOIN posts ON posts.post_id = likes.post_id
            JOIN users ON users.user_id = likes.user_id
        WHERE
            posts.user_id = ?
        ORDER BY
            posts.created_at, posts.post_id, likes.user_id
        ",
    ),
    (
        NotificationKind::Comment,
        "
        SELECT
            posts.post_id, users.user_id, users.name, comments.created_at
        FROM
            comments
            JOIN posts ON posts.post_id = comments.post_id
            JOIN users ON users.user_id = comments.user_id
        WHERE
            posts.user_id = ?
        ORDER BY
            comments.created_at, comments.comment_id
        ",
    ),
    (
        NotificationKind::Follow,
        "
        SELECT
            NULL AS post_id, users.user_id, users.name, NULL AS created_at
        FROM
            follows
            JOIN users ON users.user_id = follows.follower_id
        WHERE
            follows.followee_id = ?
        ORDER BY
            follows.follower_id
        ",
    ),
];

impl DbClient {
    /// Everything that happened to `user`'s posts and account: likes, then comments, then
    /// follows. The recipient's own likes and comments are included.
    pub async fn notifications_for(&self, user: Id<UserMarker>) -> Result<Vec<Notification>> {
        let mut tx = self.pool.begin().await?;

        let mut notifications = Vec::new();
        for (kind, statement) in SOURCES {
            fetch_source(&mut tx, user, kind, statement, &mut notifications).await?;
        }

        tx.commit().await?;
        Ok(notifications)
    }

    /// Length of [`DbClient::notifications_for`] without materializing the events.
    pub async fn notification_count(&self, user: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "
            SELECT
                (SELECT COUNT(*) FROM likes JOIN posts ON posts.post_id = likes.post_id
                    WHERE posts.user_id = ?1)
                + (SELECT COUNT(*) FROM comments JOIN posts ON posts.post_id = comments.post_id
                    WHERE posts.user_id = ?1)
                + (SELECT COUNT(*) FROM follows WHERE follows.followee_id = ?1)
            ",
        )
        .bind(user.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.cast_unsigned())
    }
}

async fn fetch_source(
    conn: &mut SqliteConnection,
    user: Id<UserMarker>,
    kind: NotificationKind,
    statement: &'static str,
    notifications: &mut Vec<Notification>,
) -> Result<()> {
    let records = query_as::<_, NotificationRecord>(statement)
        .bind(user.get())
        .fetch_all(&mut *conn)
        .await?;

    for record in records {
        notifications.push(record.into_notification(kind)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::client::testing;
    use wheelsup_common::model::{notification::NotificationKind, presence::PresenceToggle};

    #[tokio::test]
    async fn sources_in_order() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;
        let b = testing::user(&db, "b").await;
        let c = testing::user(&db, "c").await;

        let hello = testing::post(&db, a, "Hello road").await;
        db.toggle_presence(PresenceToggle::Like { user: b, post: hello })
            .await
            .unwrap();
        testing::comment(&db, hello, c, "Nice rig").await;
        db.toggle_presence(PresenceToggle::Follow {
            follower: c,
            followee: a,
        })
        .await
        .unwrap();

        let notifications = db.notifications_for(a).await.unwrap();
        let summary: Vec<_> = notifications
            .iter()
            .map(|notification| (notification.kind, notification.actor.name.get()))
            .collect();
        assert_eq!(
            summary,
            [
                (NotificationKind::Like, "b"),
                (NotificationKind::Comment, "c"),
                (NotificationKind::Follow, "c"),
            ]
        );

        let like = &notifications[0];
        assert_eq!(like.subject_post, Some(hello));
        let post = db.enriched_post(hello, None).await.unwrap().unwrap();
        assert_eq!(like.timestamp, Some(post.post.created_at));

        let comment = &notifications[1];
        assert_eq!(comment.subject_post, Some(hello));
        assert_eq!(comment.timestamp, Some(post.comments[0].created_at));

        let follow = &notifications[2];
        assert!(follow.subject_post.is_none());
        assert!(follow.timestamp.is_none());

        assert_eq!(db.notification_count(a).await.unwrap(), 3);
        assert!(db.notifications_for(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_interactions_are_included() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;
        let post = testing::post(&db, a, "Hello road").await;

        db.toggle_presence(PresenceToggle::Like { user: a, post })
            .await
            .unwrap();
        testing::comment(&db, post, a, "Talking to myself").await;

        let notifications = db.notifications_for(a).await.unwrap();
        assert_eq!(notifications.len(), 2);
        assert!(notifications.iter().all(|notification| notification.actor.id == a));
    }

    #[tokio::test]
    async fn total_matches_sources_and_is_stable() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;
        let mut others = Vec::new();
        for name in ["u1", "u2", "u3"] {
            others.push(testing::user(&db, name).await);
        }

        let first = testing::post(&db, a, "first").await;
        let second = testing::post(&db, a, "second").await;
        for user in &others {
            db.toggle_presence(PresenceToggle::Like { user: *user, post: first })
                .await
                .unwrap();
            db.toggle_presence(PresenceToggle::Follow {
                follower: *user,
                followee: a,
            })
            .await
            .unwrap();
        }
        db.toggle_presence(PresenceToggle::Like {
            user: others[0],
            post: second,
        })
        .await
        .unwrap();
        testing::comment(&db, second, others[1], "one").await;
        testing::comment(&db, first, others[2], "two").await;

        let notifications = db.notifications_for(a).await.unwrap();
        let count_of = |kind| {
            notifications
                .iter()
                .filter(|notification| notification.kind == kind)
                .count()
        };
        assert_eq!(count_of(NotificationKind::Like), 4);
        assert_eq!(count_of(NotificationKind::Comment), 2);
        assert_eq!(count_of(NotificationKind::Follow), 3);
        assert_eq!(db.notification_count(a).await.unwrap(), 9);

        // Likes on the older post come first.
        assert_eq!(notifications[0].subject_post, Some(first));
        assert_eq!(notifications[3].subject_post, Some(second));

        assert_eq!(db.notifications_for(a).await.unwrap(), notifications);
    }
}
