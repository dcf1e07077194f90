use super::session_profile;
use crate::cache::PageCache;
use crate::catchers::{ErrorMessage, ThreadsResponse};
use crate::guards::AuthenticatedUser;
use crate::mongo::ThreadsDB;
use crate::utils::parse_object_id;
use rocket::serde::json::Json;
use rocket::State;
use threads_common::http::requests::{CommentRequest, CreateThreadRequest};
use threads_common::validation::validate_thread_text;

/// POST REQUESTS ///

/**
 * Post a new top level thread, optionally inside a community
 *
 * @param request - the CreateThreadRequest containing:
 *             * text: thread body, at least 3 characters
 *             * community_id: organization id of the community to post in
 *             * path: page to revalidate once posted
 * @return status:
 *             * 201 with the new thread id if success
 *             * 400 if the text is too short
 *             * 401 if the session is missing or invalid
 *             * 404 if the author or community does not exist
 *             * 500 if db fails or other unknown issue
 */
#[post("/create", format = "json", data = "<request>")]
pub async fn create_thread(
    user: AuthenticatedUser,
    request: Json<CreateThreadRequest>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<ThreadsResponse, ThreadsResponse> {
    if let Err(e) = validate_thread_text(&request.text) {
        return Err(ThreadsResponse::BadRequest(ErrorMessage(Some(e))));
    }
    let author = session_profile(db, &user).await?;
    let thread = db
        .create_thread(&request.text, &author.oid, request.community_id.as_deref())
        .await?;
    cache.revalidate(&request.path).await;
    Ok(ThreadsResponse::Created(thread.to_hex()))
}

/**
 * Reply to a thread
 *
 * @param id - hex _id of the thread replied to
 * @param request - the CommentRequest containing the reply text and the page to revalidate
 * @return status:
 *             * 201 with the reply id if success
 *             * 400 if the id is malformed or the text is too short
 *             * 401 if the session is missing or invalid
 *             * 404 if the thread or replying user does not exist
 *             * 500 if db fails or other unknown issue
 */
#[post("/<id>/comment", format = "json", data = "<request>")]
pub async fn add_comment(
    user: AuthenticatedUser,
    id: String,
    request: Json<CommentRequest>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<ThreadsResponse, ThreadsResponse> {
    let thread = parse_object_id(&id)?;
    if let Err(e) = validate_thread_text(&request.text) {
        return Err(ThreadsResponse::BadRequest(ErrorMessage(Some(e))));
    }
    let author = session_profile(db, &user).await?;
    let reply = db
        .add_comment_to_thread(&thread, &request.text, &author.oid)
        .await?;
    cache.revalidate(&request.path).await;
    Ok(ThreadsResponse::Created(reply.to_hex()))
}

/// DELETE REQUESTS ///

/**
 * Delete a thread authored by the signed in user along with all of its replies
 *
 * @param id - hex _id of the thread
 * @param path - page to revalidate once deleted
 * @return status:
 *             * 200 with the ids of every deleted thread
 *             * 400 if the id is malformed
 *             * 401 if the session is missing or invalid
 *             * 403 if the thread belongs to someone else
 *             * 404 if the thread does not exist
 *             * 500 if db fails or other unknown issue
 */
#[delete("/<id>?<path>")]
pub async fn delete_thread(
    user: AuthenticatedUser,
    id: String,
    path: Option<String>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<Json<Vec<String>>, ThreadsResponse> {
    let thread = parse_object_id(&id)?;
    let requester = session_profile(db, &user).await?;
    let deleted = db.delete_thread(&thread, &requester.oid).await?;
    if let Some(path) = path {
        cache.revalidate(&path).await;
    }
    Ok(Json(deleted.iter().map(|oid| oid.to_hex()).collect()))
}
