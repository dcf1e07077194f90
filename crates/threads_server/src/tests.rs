use crate::cache::PageCache;
use crate::config::CONFIG;
use crate::guards::SessionClaims;
use crate::mongo::ThreadsDB;
use crate::webhook::sign;
use crate::build_rocket;
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{json, Value};
use std::sync::Once;
use std::time::Duration;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::{CommentRequest, CreateThreadRequest, OnboardRequest};
use threads_common::http::responses::{
    CommunitiesPage, CommunityPage, FeedPage, OnboardingPage, ProfilePage, ReplyView, ThreadDetail,
    UserProfile, UsersPage,
};
use uuid::Uuid;

const SESSION_KEY: &str = "threads-test-session-key";
const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

static CONFIGURE: Once = Once::new();

fn configure() {
    CONFIGURE.call_once(|| {
        std::env::set_var("THREADS_SESSION_KEY", SESSION_KEY);
        std::env::set_var("THREADS_SESSION_ALGORITHM", "HS256");
        std::env::set_var("THREADS_WEBHOOK_SECRET", WEBHOOK_SECRET);
    });
}

fn session(user_id: &str) -> Header<'static> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &JwtHeader::default(),
        &claims,
        &EncodingKey::from_secret(SESSION_KEY.as_bytes()),
    )
    .unwrap();
    Header::new("Authorization", format!("Bearer {}", token))
}

struct ThreadsTestContext {
    client: Client,
    database_name: String,
}

impl ThreadsTestContext {
    async fn init() -> Self {
        configure();
        let database_name = format!("threads_test_{}", Uuid::new_v4().simple());
        let mongo = ThreadsDB::init(&CONFIG.mongodb_uri, &database_name)
            .await
            .unwrap();
        let rocket = build_rocket(mongo, PageCache::new(Duration::from_secs(60)));
        ThreadsTestContext {
            client: Client::tracked(rocket).await.unwrap(),
            database_name,
        }
    }

    /// Drop the throwaway database; responses borrowed from the client may still be alive
    async fn teardown(&self) {
        ThreadsDB::drop(&CONFIG.mongodb_uri, &self.database_name)
            .await
            .unwrap();
    }

    async fn onboard(&self, user_id: &str, username: &str) -> Status {
        let request = OnboardRequest {
            username: username.to_string(),
            name: format!("{} name", username),
            bio: Some(String::from("hello")),
            image: None,
            path: String::from("/onboarding"),
        };
        self.client
            .post("/user/onboard")
            .header(session(user_id))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await
            .status()
    }

    async fn post_thread(&self, user_id: &str, text: &str, community_id: Option<&str>) -> String {
        let request = CreateThreadRequest {
            text: text.to_string(),
            community_id: community_id.map(String::from),
            path: String::from("/"),
        };
        let res = self
            .client
            .post("/thread/create")
            .header(session(user_id))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Created);
        res.into_string().await.unwrap()
    }

    async fn reply(&self, user_id: &str, thread: &str, text: &str) -> LocalResponse<'_> {
        let request = CommentRequest {
            text: text.to_string(),
            path: format!("/thread/{}", thread),
        };
        self.client
            .post(format!("/thread/{}/comment", thread))
            .header(session(user_id))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await
    }

    async fn get_as(&self, user_id: &str, uri: String) -> LocalResponse<'_> {
        self.client.get(uri).header(session(user_id)).dispatch().await
    }

    async fn webhook(&self, body: Value) -> LocalResponse<'_> {
        let body = body.to_string();
        let msg_id = format!("msg_{}", Uuid::new_v4().simple());
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(WEBHOOK_SECRET, &msg_id, &timestamp, &body);
        self.client
            .post("/api/webhook/auth")
            .header(Header::new("svix-id", msg_id))
            .header(Header::new("svix-timestamp", timestamp))
            .header(Header::new("svix-signature", signature))
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await
    }

    async fn create_community(&self, id: &str, slug: &str, created_by: &str) -> Status {
        self.webhook(json!({
            "type": "organization.created",
            "data": { "id": id, "name": format!("{} name", slug), "slug": slug, "created_by": created_by }
        }))
        .await
        .status()
    }
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_health() {
    let context = ThreadsTestContext::init().await;
    let res = context.client.get("/health").dispatch().await;
    assert_eq!(res.status(), Status::Ok);
    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_pages_require_a_session() {
    let context = ThreadsTestContext::init().await;

    let res = context.client.get("/").dispatch().await;
    assert_eq!(res.status(), Status::Unauthorized);
    let error = res.into_json::<ThreadsServerError>().await.unwrap();
    assert_eq!(error, ThreadsServerError::MissingSession);

    let res = context
        .client
        .get("/")
        .header(Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::Unauthorized);
    let error = res.into_json::<ThreadsServerError>().await.unwrap();
    assert!(matches!(error, ThreadsServerError::InvalidSession(_)));

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_onboarding_gate() {
    let context = ThreadsTestContext::init().await;

    // no profile yet: every page but onboarding redirects
    let res = context.get_as("user_a", String::from("/")).await;
    assert_eq!(res.status(), Status::SeeOther);
    assert_eq!(res.headers().get_one("Location"), Some("/onboarding"));

    let res = context.get_as("user_a", String::from("/onboarding")).await;
    assert_eq!(res.status(), Status::Ok);
    let prefill = res.into_json::<OnboardingPage>().await.unwrap();
    assert_eq!(prefill.id, "user_a");
    assert!(!prefill.onboarded);

    assert_eq!(context.onboard("user_a", "Alice").await, Status::Created);

    let res = context.get_as("user_a", String::from("/onboarding")).await;
    let prefill = res.into_json::<OnboardingPage>().await.unwrap();
    assert_eq!(prefill.username, "alice");
    assert!(prefill.onboarded);

    let res = context.get_as("user_a", String::from("/")).await;
    assert_eq!(res.status(), Status::Ok);

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_onboard_validation_and_conflicts() {
    let context = ThreadsTestContext::init().await;

    assert_eq!(context.onboard("user_a", "al").await, Status::BadRequest);
    assert_eq!(context.onboard("user_a", "alice").await, Status::Created);
    // saving again updates the same profile
    assert_eq!(context.onboard("user_a", "alice").await, Status::Created);
    // usernames are unique case-insensitively
    assert_eq!(context.onboard("user_b", "ALICE").await, Status::Conflict);

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_threads_and_replies() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;
    context.onboard("user_b", "bob").await;

    let res = context
        .client
        .post("/thread/create")
        .header(session("user_a"))
        .header(ContentType::JSON)
        .body(json!({ "text": "hi", "path": "/" }).to_string())
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::BadRequest);
    let error = res.into_json::<ThreadsServerError>().await.unwrap();
    assert_eq!(error.to_string(), "Min 3 chars");

    let thread = context.post_thread("user_a", "first thread", None).await;
    let res = context.reply("user_b", &thread, "nice thread").await;
    assert_eq!(res.status(), Status::Created);
    let reply = res.into_string().await.unwrap();
    let res = context.reply("user_a", &reply, "thanks bob").await;
    assert_eq!(res.status(), Status::Created);

    let res = context.get_as("user_a", format!("/thread/{}", thread)).await;
    assert_eq!(res.status(), Status::Ok);
    let detail = res.into_json::<ThreadDetail>().await.unwrap();
    assert_eq!(detail.author.username, "alice");
    assert_eq!(detail.children.len(), 1);
    assert_eq!(detail.children[0].author.username, "bob");
    assert_eq!(detail.children[0].children.len(), 1);
    assert_eq!(detail.children[0].children[0].text, "thanks bob");

    // replies never show up in the feed
    let res = context.get_as("user_a", String::from("/")).await;
    let feed = res.into_json::<FeedPage>().await.unwrap();
    assert_eq!(feed.threads.len(), 1);
    assert_eq!(feed.threads[0].children.len(), 1);
    assert!(!feed.is_next);

    let res = context.reply("user_a", "not-an-id", "hello there").await;
    assert_eq!(res.status(), Status::BadRequest);
    let res = context
        .reply("user_a", "65f000000000000000000000", "hello there")
        .await;
    assert_eq!(res.status(), Status::NotFound);

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_activity_lists_replies_from_others() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;
    context.onboard("user_b", "bob").await;

    let thread = context.post_thread("user_a", "first thread", None).await;
    context.reply("user_a", &thread, "self reply").await;
    context.reply("user_b", &thread, "reply from bob").await;

    let res = context.get_as("user_a", String::from("/activity")).await;
    let activity = res.into_json::<Vec<ReplyView>>().await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].text, "reply from bob");
    assert_eq!(activity[0].parent_id.as_deref(), Some(thread.as_str()));

    let res = context.get_as("user_b", String::from("/activity")).await;
    let activity = res.into_json::<Vec<ReplyView>>().await.unwrap();
    assert!(activity.is_empty());

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_delete_thread_removes_the_subtree() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;
    context.onboard("user_b", "bob").await;

    let thread = context.post_thread("user_a", "doomed thread", None).await;
    let reply = context
        .reply("user_b", &thread, "reply one")
        .await
        .into_string()
        .await
        .unwrap();
    context.reply("user_a", &reply, "nested reply").await;

    let res = context
        .client
        .delete(format!("/thread/{}?path=/", thread))
        .header(session("user_b"))
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::Forbidden);

    let res = context
        .client
        .delete(format!("/thread/{}?path=/", thread))
        .header(session("user_a"))
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::Ok);
    let deleted = res.into_json::<Vec<String>>().await.unwrap();
    assert_eq!(deleted.len(), 3);

    let res = context.get_as("user_a", format!("/thread/{}", thread)).await;
    assert_eq!(res.status(), Status::NotFound);
    let res = context.get_as("user_a", String::from("/")).await;
    let feed = res.into_json::<FeedPage>().await.unwrap();
    assert!(feed.threads.is_empty());
    let res = context.get_as("user_a", String::from("/user/user_a")).await;
    let profile = res.into_json::<UserProfile>().await.unwrap();
    assert!(profile.threads.is_empty());

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_feed_cache_is_revalidated_by_path() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;

    let res = context.get_as("user_a", String::from("/")).await;
    let feed = res.into_json::<FeedPage>().await.unwrap();
    assert!(feed.threads.is_empty());

    // a post that revalidates another page leaves the cached feed in place
    let request = CreateThreadRequest {
        text: String::from("quiet post"),
        community_id: None,
        path: String::from("/profile/user_a"),
    };
    context
        .client
        .post("/thread/create")
        .header(session("user_a"))
        .header(ContentType::JSON)
        .body(serde_json::to_string(&request).unwrap())
        .dispatch()
        .await;
    let res = context.get_as("user_a", String::from("/")).await;
    let feed = res.into_json::<FeedPage>().await.unwrap();
    assert!(feed.threads.is_empty());

    context.post_thread("user_a", "loud post", None).await;
    let res = context.get_as("user_a", String::from("/")).await;
    let feed = res.into_json::<FeedPage>().await.unwrap();
    assert_eq!(feed.threads.len(), 2);
    assert_eq!(feed.threads[0].text, "loud post");

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_search_users() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;
    context.onboard("user_b", "bobby").await;
    context.onboard("user_c", "bob.c").await;

    let res = context.get_as("user_a", String::from("/search?q=BOB")).await;
    let page = res.into_json::<UsersPage>().await.unwrap();
    assert_eq!(page.users.len(), 2);

    // regex characters match literally
    let res = context.get_as("user_a", String::from("/search?q=b.b")).await;
    let page = res.into_json::<UsersPage>().await.unwrap();
    assert!(page.users.is_empty());

    // the searching user is never listed
    let res = context.get_as("user_a", String::from("/search")).await;
    let page = res.into_json::<UsersPage>().await.unwrap();
    assert_eq!(page.users.len(), 2);
    assert!(page.users.iter().all(|user| user.id != "user_a"));
    assert!(!page.is_next);

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_community_lifecycle_via_webhooks() {
    let context = ThreadsTestContext::init().await;
    context.onboard("user_a", "alice").await;
    context.onboard("user_b", "bob").await;

    assert_eq!(
        context.create_community("org_1", "rustaceans", "user_a").await,
        Status::Ok
    );
    assert_eq!(
        context.create_community("org_2", "rustaceans", "user_a").await,
        Status::Conflict
    );

    let membership = json!({
        "type": "organizationMembership.created",
        "data": {
            "organization": { "id": "org_1" },
            "public_user_data": { "user_id": "user_b" }
        }
    });
    assert_eq!(context.webhook(membership.clone()).await.status(), Status::Ok);
    assert_eq!(context.webhook(membership).await.status(), Status::Conflict);

    let thread = context
        .post_thread("user_b", "community thread", Some("org_1"))
        .await;

    let res = context.get_as("user_a", String::from("/communities/org_1")).await;
    let page = res.into_json::<CommunityPage>().await.unwrap();
    assert_eq!(page.details.created_by.id, "user_a");
    assert_eq!(page.details.members.len(), 2);
    assert_eq!(page.threads.len(), 1);
    assert_eq!(page.threads[0].oid.to_hex(), thread);

    let res = context.get_as("user_a", String::from("/communities?q=RUST")).await;
    let page = res.into_json::<CommunitiesPage>().await.unwrap();
    assert_eq!(page.communities.len(), 1);

    let res = context
        .webhook(json!({
            "type": "organizationMembership.deleted",
            "data": {
                "organization": { "id": "org_1" },
                "public_user_data": { "user_id": "user_b" }
            }
        }))
        .await;
    assert_eq!(res.status(), Status::Ok);
    let res = context.get_as("user_b", String::from("/user/user_b")).await;
    let profile = res.into_json::<UserProfile>().await.unwrap();
    assert!(profile.communities.is_empty());

    let res = context
        .webhook(json!({ "type": "organization.deleted", "data": { "id": "org_1" } }))
        .await;
    assert_eq!(res.status(), Status::Ok);
    let res = context.get_as("user_b", format!("/thread/{}", thread)).await;
    assert_eq!(res.status(), Status::NotFound);
    let res = context.get_as("user_b", String::from("/profile/user_b")).await;
    let page = res.into_json::<ProfilePage>().await.unwrap();
    assert!(page.threads.is_empty());

    context.teardown().await;
}

#[rocket::async_test]
#[ignore = "requires a running MongoDB instance"]
async fn test_webhook_rejects_unsigned_deliveries() {
    let context = ThreadsTestContext::init().await;

    let res = context
        .client
        .post("/api/webhook/auth")
        .header(ContentType::JSON)
        .body(r#"{"type":"organization.deleted","data":{"id":"org_1"}}"#)
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::BadRequest);

    let res = context
        .client
        .post("/api/webhook/auth")
        .header(Header::new("svix-id", "msg_1"))
        .header(Header::new(
            "svix-timestamp",
            chrono::Utc::now().timestamp().to_string(),
        ))
        .header(Header::new("svix-signature", "v1,bm90IGEgc2lnbmF0dXJl"))
        .header(ContentType::JSON)
        .body(r#"{"type":"organization.deleted","data":{"id":"org_1"}}"#)
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::Unauthorized);

    // unknown event types are acknowledged
    let res = context
        .webhook(json!({ "type": "session.created", "data": {} }))
        .await;
    assert_eq!(res.status(), Status::Ok);

    context.teardown().await;
}
