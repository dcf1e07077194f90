use super::onboarded_profile;
use crate::cache::PageCache;
use crate::catchers::ThreadsResponse;
use crate::guards::AuthenticatedUser;
use crate::mongo::ThreadsDB;
use crate::utils::parse_object_id;
use rocket::http::uri::Origin;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use threads_common::errors::ThreadsServerError;
use threads_common::http::responses::{
    CommunitiesPage, CommunityPage, FeedPage, OnboardingPage, ProfilePage, ReplyView, UsersPage,
};
use threads_common::utils::{PageRequest, SortOrder};
use threads_common::{FEED_PAGE_SIZE, SEARCH_PAGE_SIZE};

/**
 * Serve a page payload from the cache, loading and storing it on a miss
 *
 * @param origin - request uri; its path and query form the cache key
 * @param load - builds the payload, only awaited on a miss
 */
async fn through_cache<T: Serialize>(
    cache: &PageCache,
    origin: &Origin<'_>,
    load: impl Future<Output = Result<T, ThreadsResponse>>,
) -> Result<Json<Value>, ThreadsResponse> {
    let path = origin.path().as_str();
    let query = origin.query().map(|query| query.as_str()).unwrap_or("");
    if let Some(payload) = cache.get(path, query).await {
        return Ok(Json(payload));
    }
    let payload = serde_json::to_value(load.await?)
        .map_err(|e| ThreadsServerError::SerdeError(e.to_string()))?;
    cache.insert(path, query, payload.clone()).await;
    Ok(Json(payload))
}

#[get("/health")]
pub async fn health() -> &'static str {
    "Hello, world!"
}

/// Home feed of top level threads, newest first
#[get("/?<page>")]
pub async fn feed(
    user: AuthenticatedUser,
    page: Option<u64>,
    origin: &Origin<'_>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<Json<Value>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    through_cache(cache, origin, async {
        let page: FeedPage = db.fetch_posts(PageRequest::new(page, FEED_PAGE_SIZE)).await?;
        Ok::<_, ThreadsResponse>(page)
    })
    .await
}

/// Replies other users left on the signed in user's threads
#[get("/activity")]
pub async fn activity(
    user: AuthenticatedUser,
    db: &State<ThreadsDB>,
) -> Result<Json<Vec<ReplyView>>, ThreadsResponse> {
    let profile = onboarded_profile(db, &user).await?;
    Ok(Json(db.get_activity(&profile.oid).await?))
}

#[get("/search?<q>&<page>")]
pub async fn search(
    user: AuthenticatedUser,
    q: Option<String>,
    page: Option<u64>,
    db: &State<ThreadsDB>,
) -> Result<Json<UsersPage>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    let users = db
        .fetch_users(
            &user.0,
            q.as_deref().unwrap_or(""),
            PageRequest::new(page, SEARCH_PAGE_SIZE),
            SortOrder::Desc,
        )
        .await?;
    Ok(Json(users))
}

#[get("/communities?<q>&<page>")]
pub async fn communities(
    user: AuthenticatedUser,
    q: Option<String>,
    page: Option<u64>,
    db: &State<ThreadsDB>,
) -> Result<Json<CommunitiesPage>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    let communities = db
        .fetch_communities(
            q.as_deref().unwrap_or(""),
            PageRequest::new(page, SEARCH_PAGE_SIZE),
            SortOrder::Desc,
        )
        .await?;
    Ok(Json(communities))
}

/// A thread with two levels of replies
#[get("/thread/<id>")]
pub async fn thread(
    user: AuthenticatedUser,
    id: String,
    origin: &Origin<'_>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<Json<Value>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    let oid = parse_object_id(&id)?;
    through_cache(cache, origin, async {
        match db.fetch_thread_by_id(&oid).await? {
            Some(thread) => Ok::<_, ThreadsResponse>(thread),
            None => Err(ThreadsServerError::ThreadNotFound(id.clone()).into()),
        }
    })
    .await
}

/// A profile header with the threads the user posted
#[get("/profile/<id>")]
pub async fn profile(
    user: AuthenticatedUser,
    id: String,
    origin: &Origin<'_>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<Json<Value>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    through_cache(cache, origin, async {
        let profile = match db.fetch_user(&id).await? {
            Some(profile) => profile,
            None => return Err(ThreadsServerError::UserNotFound(id.clone()).into()),
        };
        let threads = db
            .fetch_user_posts(&id)
            .await?
            .map(|posts| posts.threads)
            .unwrap_or_default();
        Ok::<_, ThreadsResponse>(ProfilePage { profile, threads })
    })
    .await
}

/// A community header with its members and threads
#[get("/communities/<id>")]
pub async fn community(
    user: AuthenticatedUser,
    id: String,
    origin: &Origin<'_>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<Json<Value>, ThreadsResponse> {
    onboarded_profile(db, &user).await?;
    through_cache(cache, origin, async {
        let details = match db.fetch_community_details(&id).await? {
            Some(details) => details,
            None => return Err(ThreadsServerError::CommunityNotFound(id.clone()).into()),
        };
        let threads = db
            .fetch_community_posts(&id)
            .await?
            .map(|posts| posts.threads)
            .unwrap_or_default();
        Ok::<_, ThreadsResponse>(CommunityPage { details, threads })
    })
    .await
}

/// Prefill for the onboarding form; blank for identities without a profile
#[get("/onboarding")]
pub async fn onboarding(
    user: AuthenticatedUser,
    db: &State<ThreadsDB>,
) -> Result<Json<OnboardingPage>, ThreadsResponse> {
    let page = match db.fetch_user(&user.0).await? {
        Some(profile) => OnboardingPage::from(profile),
        None => OnboardingPage {
            id: user.0,
            ..Default::default()
        },
    };
    Ok(Json(page))
}
