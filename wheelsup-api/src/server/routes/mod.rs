use crate::server::ServerRouter;

mod auth;
mod feed;
mod messages;
mod notifications;
mod posts;
mod trips;
mod uploads;
mod users;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(auth::routes())
        .merge(feed::routes())
        .merge(posts::routes())
        .merge(users::routes())
        .merge(trips::routes())
        .merge(messages::routes())
        .merge(notifications::routes())
        .merge(uploads::routes())
}

#[cfg(test)]
mod tests {
    use crate::server::{self, AuthConfig, ServerState, blob::LocalBlobStore};
    use axum::{
        Router,
        body::{Body, Bytes, to_bytes},
        http::{
            Method, Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
    };
    use serde_json::{Value, json};
    use std::{sync::Arc, time::Duration};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wheelsup_db::client::{DbClient, DbOptions};

    struct TestApp {
        router: Router,
        _uploads: TempDir,
    }

    impl TestApp {
        async fn new() -> Self {
            let db = DbClient::connect(&DbOptions {
                url: "sqlite::memory:".to_owned(),
                max_connections: 1,
                busy_timeout: Duration::from_secs(5),
            })
            .await
            .unwrap();
            let uploads = tempfile::tempdir().unwrap();
            let blob_store = LocalBlobStore::create(uploads.path().to_owned())
                .await
                .unwrap();

            let state = ServerState {
                db_client: Arc::new(db),
                blob_store: Arc::new(blob_store),
                auth: AuthConfig::default(),
            };

            Self {
                router: server::routes().with_state(state),
                _uploads: uploads,
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body)
        }

        async fn json(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let (status, body) = self.send(request).await;
            let body = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&body).unwrap()
            };
            (status, body)
        }

        /// Registers and signs in a user, returning its id and bearer token.
        async fn sign_up(&self, name: &str) -> (i64, String) {
            let email = format!("{}@wheelsup.test", name.to_lowercase());
            let (status, user) = self
                .json(
                    Method::POST,
                    "/auth/register",
                    None,
                    Some(json!({"email": email, "password": "hunter2", "name": name})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, session) = self
                .json(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(json!({"email": email, "password": "hunter2"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(session["user_id"], user["id"]);

            (
                user["id"].as_i64().unwrap(),
                session["token"].as_str().unwrap().to_owned(),
            )
        }
    }

    #[tokio::test]
    async fn account_lifecycle() {
        let app = TestApp::new().await;
        let (ada, token) = app.sign_up("Ada").await;

        let (status, _) = app
            .json(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"email": "ADA@wheelsup.test", "password": "other", "name": "Ada 2"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .json(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"email": "bo@wheelsup.test", "password": "", "name": "Bo"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, wrong_password) = app
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "ada@wheelsup.test", "password": "nope"})),
            )
            .await;
        let (_, unknown_email) = app
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "cy@wheelsup.test", "password": "hunter2"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);

        let (status, profile) = app
            .json(Method::GET, &format!("/users/{ada}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["name"], "Ada");
        assert_eq!(profile["follower_count"], 0);

        let (status, _) = app.json(Method::GET, "/users/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, user) = app
            .json(
                Method::PUT,
                "/users/me",
                Some(&token),
                Some(json!({"bio": "Full-time in a Sprinter"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["bio"], "Full-time in a Sprinter");

        let (status, _) = app
            .json(Method::PUT, "/users/me", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.json(Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, body) = app
            .json(Method::POST, "/auth/logout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = app
            .json(Method::POST, "/auth/logout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .json(Method::GET, "/notifications", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.json(Method::GET, "/feed", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn posts_presence_and_notifications() {
        let app = TestApp::new().await;
        let (ada, ada_token) = app.sign_up("Ada").await;
        let (bo, bo_token) = app.sign_up("Bo").await;

        let (status, _) = app.json(Method::POST, "/posts/1/like", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, post) = app
            .json(
                Method::POST,
                "/posts",
                Some(&ada_token),
                Some(json!({"content": "Hello road"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let post_id = post["id"].as_i64().unwrap();

        let (status, _) = app
            .json(Method::POST, "/posts", Some(&ada_token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, like) = app
            .json(
                Method::POST,
                &format!("/posts/{post_id}/like"),
                Some(&bo_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(like["active"], true);
        assert_eq!(like["count"], 1);

        let (status, _) = app
            .json(Method::POST, "/posts/99/like", Some(&bo_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, commented) = app
            .json(
                Method::POST,
                &format!("/posts/{post_id}/comments"),
                Some(&bo_token),
                Some(json!({"content": "Safe travels"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(commented["comments"][0]["content"], "Safe travels");

        let (status, _) = app
            .json(
                Method::POST,
                "/posts/99/comments",
                Some(&bo_token),
                Some(json!({"content": "Hello?"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, seen_by_bo) = app
            .json(Method::GET, &format!("/posts/{post_id}"), Some(&bo_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(seen_by_bo["like_count"], 1);
        assert_eq!(seen_by_bo["liked_by_viewer"], true);

        let (_, anonymous) = app
            .json(Method::GET, &format!("/posts/{post_id}"), None, None)
            .await;
        assert_eq!(anonymous["liked_by_viewer"], false);

        let (status, _) = app.json(Method::GET, "/posts/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, feed) = app.json(Method::GET, "/feed", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(feed.as_array().unwrap().len(), 1);

        let (status, _) = app
            .json(Method::GET, "/feed?order=unordered", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .json(Method::GET, "/feed?order=sideways", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, by_ada) = app
            .json(Method::GET, &format!("/users/{ada}/posts"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_ada[0]["id"], post_id);

        let (status, _) = app.json(Method::GET, "/users/99/posts", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, follow) = app
            .json(
                Method::POST,
                &format!("/users/{ada}/follow"),
                Some(&bo_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(follow["kind"], "follow");
        assert_eq!(follow["active"], true);

        let (status, _) = app
            .json(Method::POST, "/users/99/follow", Some(&bo_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, profile) = app
            .json(Method::GET, &format!("/users/{ada}"), Some(&bo_token), None)
            .await;
        assert_eq!(profile["follower_count"], 1);
        assert_eq!(profile["followed_by_viewer"], true);

        let (status, notifications) = app
            .json(Method::GET, "/notifications", Some(&ada_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let verbs: Vec<_> = notifications
            .as_array()
            .unwrap()
            .iter()
            .map(|notification| {
                assert_eq!(notification["actor"]["id"], bo);
                notification["verb"].as_str().unwrap()
            })
            .collect();
        assert_eq!(
            verbs,
            ["liked your post", "commented on your post", "followed you"]
        );

        let (status, count) = app
            .json(Method::GET, "/notifications/count", Some(&ada_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count, json!({"count": 3}));

        let (status, explore) = app.json(Method::GET, "/explore", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(explore["users"][0]["id"], bo);
        assert_eq!(explore["users"].as_array().unwrap().len(), 2);
        assert_eq!(explore["posts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trips_and_messages() {
        let app = TestApp::new().await;
        let (ada, ada_token) = app.sign_up("Ada").await;
        let (bo, bo_token) = app.sign_up("Bo").await;

        let draft = json!({"title": "Desert run", "date": "2025-09-01"});
        let (status, _) = app
            .json(Method::POST, "/trips", None, Some(draft.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, trip) = app
            .json(Method::POST, "/trips", Some(&ada_token), Some(draft))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(trip["date"], "2025-09-01");
        assert_eq!(trip["rsvp_count"], 0);
        let trip_id = trip["id"].as_i64().unwrap();

        let (status, rsvp) = app
            .json(
                Method::POST,
                &format!("/trips/{trip_id}/rsvp"),
                Some(&bo_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rsvp["active"], true);
        assert_eq!(rsvp["count"], 1);

        let (status, _) = app
            .json(Method::POST, "/trips/99/rsvp", Some(&bo_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, details) = app
            .json(
                Method::POST,
                &format!("/trips/{trip_id}/comments"),
                Some(&bo_token),
                Some(json!({"content": "Count me in"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(details["comments"][0]["content"], "Count me in");

        let (status, _) = app
            .json(
                Method::POST,
                "/trips/99/comments",
                Some(&bo_token),
                Some(json!({"content": "Count me in"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, board) = app.json(Method::GET, "/trips", Some(&bo_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board[0]["attending"], true);

        let (status, _) = app.json(Method::GET, "/trips/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, conversation) = app
            .json(
                Method::POST,
                &format!("/messages/{bo}"),
                Some(&ada_token),
                Some(json!({"text": "See you at the trailhead"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(conversation[0]["sender"], ada);

        let (status, _) = app
            .json(
                Method::POST,
                "/messages/99",
                Some(&ada_token),
                Some(json!({"text": "Anyone there?"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .json(Method::GET, "/messages/99", Some(&ada_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, from_bo) = app
            .json(Method::GET, &format!("/messages/{ada}"), Some(&bo_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(from_bo, conversation);

        let (status, inbox) = app.json(Method::GET, "/messages", Some(&bo_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inbox[0]["user"]["name"], "Ada");

        let (status, body) = app.json(Method::GET, "/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn upload_and_download() {
        let app = TestApp::new().await;
        let (_, token) = app.sign_up("Ada").await;

        let (status, _) = app
            .send(
                Request::post("/uploads?name=van.png")
                    .body(Body::from("png bytes"))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(
                Request::post("/uploads?name=my%20van.png")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from("png bytes"))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let upload: Value = serde_json::from_slice(&body).unwrap();
        let reference = upload["reference"].as_str().unwrap();
        assert!(reference.ends_with("-my_van.png"));

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/uploads/{reference}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        let contents = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&contents[..], b"png bytes");

        let (status, _) = app
            .send(
                Request::get("/uploads/0000000000000000-missing.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
