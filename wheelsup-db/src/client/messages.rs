use crate::{
    client::{DbClient, Result},
    record::{MessageRecord, PartnerRecord},
};
use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;
use tracing::debug;
use wheelsup_common::model::{
    Id,
    message::{ConversationPartner, CreateMessage, Message, MessageMarker},
    user::UserMarker,
};

impl DbClient {
    /// Delivers a direct message. Returns `None` if the receiver does not exist.
    pub async fn send_message(&self, message: &CreateMessage) -> Result<Option<Id<MessageMarker>>> {
        let message_id = query_scalar::<_, i64>(
            "
            INSERT INTO messages (sender_id, receiver_id, content, created_at)
            SELECT ?, user_id, ?, ? FROM users WHERE user_id = ?
            RETURNING message_id
            ",
        )
        .bind(message.sender.get())
        .bind(message.text.get())
        .bind(OffsetDateTime::now_utc())
        .bind(message.receiver.get())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(message_id) = message_id {
            debug!(
                message_id,
                sender = %message.sender,
                receiver = %message.receiver,
                "Sent message"
            );
        }
        Ok(message_id.map(Into::into))
    }

    /// All messages between `a` and `b` in either direction, oldest first.
    pub async fn conversation(
        &self,
        a: Id<UserMarker>,
        b: Id<UserMarker>,
    ) -> Result<Vec<Message>> {
        let records = query_as::<_, MessageRecord>(
            "
            SELECT
                message_id, sender_id, receiver_id, content, created_at
            FROM
                messages
            WHERE
                (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY
                created_at, message_id
            ",
        )
        .bind(a.get())
        .bind(b.get())
        .fetch_all(&self.pool)
        .await?;

        let messages = records
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<_, _>>()?;
        Ok(messages)
    }

    /// Everyone `user` has exchanged messages with, most recent conversation first.
    pub async fn inbox(&self, user: Id<UserMarker>) -> Result<Vec<ConversationPartner>> {
        let records = query_as::<_, PartnerRecord>(
            "
            SELECT
                users.user_id, users.name, partners.last_message_at
            FROM
                (
                    SELECT
                        partner_id, MAX(created_at) AS last_message_at, MAX(message_id) AS last_id
                    FROM
                        (
                            SELECT receiver_id AS partner_id, created_at, message_id
                            FROM messages WHERE sender_id = ?1
                            UNION ALL
                            SELECT sender_id AS partner_id, created_at, message_id
                            FROM messages WHERE receiver_id = ?1
                        )
                    GROUP BY
                        partner_id
                ) AS partners
                JOIN users ON users.user_id = partners.partner_id
            ORDER BY
                partners.last_message_at DESC, partners.last_id DESC
            ",
        )
        .bind(user.get())
        .fetch_all(&self.pool)
        .await?;

        let partners = records
            .into_iter()
            .map(ConversationPartner::try_from)
            .collect::<Result<_, _>>()?;
        Ok(partners)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{DbClient, testing};
    use wheelsup_common::model::{
        Id,
        message::{CreateMessage, MessageText},
        user::UserMarker,
    };

    async fn send(db: &DbClient, sender: Id<UserMarker>, receiver: Id<UserMarker>, text: &str) {
        db.send_message(&CreateMessage {
            sender,
            receiver,
            text: MessageText::new(text).unwrap(),
        })
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn conversation_is_symmetric() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;
        let b = testing::user(&db, "b").await;
        let c = testing::user(&db, "c").await;

        send(&db, a, b, "Where are you parked?").await;
        send(&db, b, a, "North lot").await;
        send(&db, a, c, "Unrelated").await;
        send(&db, a, b, "On my way").await;

        let from_a = db.conversation(a, b).await.unwrap();
        let from_b = db.conversation(b, a).await.unwrap();
        assert_eq!(from_a, from_b);

        let texts: Vec<_> = from_a.iter().map(|message| message.text.get()).collect();
        assert_eq!(texts, ["Where are you parked?", "North lot", "On my way"]);
        assert_eq!(from_a[1].sender, b);
        assert_eq!(from_a[1].receiver, a);
    }

    #[tokio::test]
    async fn inbox_lists_partners_by_recency() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;
        let b = testing::user(&db, "b").await;
        let c = testing::user(&db, "c").await;

        send(&db, a, b, "hi b").await;
        send(&db, c, a, "hi a").await;
        send(&db, b, a, "hi again").await;

        let partners: Vec<_> = db
            .inbox(a)
            .await
            .unwrap()
            .into_iter()
            .map(|partner| partner.user.id)
            .collect();
        assert_eq!(partners, [b, c]);

        let of_c: Vec<_> = db
            .inbox(c)
            .await
            .unwrap()
            .into_iter()
            .map(|partner| partner.user.name.into_inner())
            .collect();
        assert_eq!(of_c, ["a"]);
    }

    #[tokio::test]
    async fn message_to_missing_user() {
        let db = testing::client().await;
        let a = testing::user(&db, "a").await;

        let sent = db
            .send_message(&CreateMessage {
                sender: a,
                receiver: Id::new(404),
                text: MessageText::new("Anyone?").unwrap(),
            })
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(db.inbox(a).await.unwrap().is_empty());
    }
}
