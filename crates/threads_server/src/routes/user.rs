use crate::cache::PageCache;
use crate::catchers::{ErrorMessage, ThreadsResponse};
use crate::guards::AuthenticatedUser;
use crate::mongo::ThreadsDB;
use rocket::serde::json::Json;
use rocket::State;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::OnboardRequest;
use threads_common::http::responses::{UserProfile, UserThreads};
use threads_common::validation::validate_profile;
use threads_common::PROFILE_EDIT_PATH;

/// POST REQUESTS ///

/**
 * Save the profile of the signed in user and mark them onboarded
 *
 * @param request - the OnboardRequest containing:
 *             * username: unique handle, stored lowercased
 *             * name: display name
 *             * bio: optional free text
 *             * image: optional avatar url
 *             * path: page the form was submitted from
 * @return status:
 *             * 201 if success
 *             * 400 if a field is too short or too long
 *             * 401 if the session is missing or invalid
 *             * 409 if the username belongs to another account
 *             * 500 if db fails or other unknown issue
 */
#[post("/onboard", format = "json", data = "<request>")]
pub async fn onboard(
    user: AuthenticatedUser,
    request: Json<OnboardRequest>,
    db: &State<ThreadsDB>,
    cache: &State<PageCache>,
) -> Result<ThreadsResponse, ThreadsResponse> {
    if let Err(e) = validate_profile(&request) {
        return Err(ThreadsResponse::BadRequest(ErrorMessage(Some(e))));
    }
    db.update_user(&user.0, &request).await?;
    if request.path == PROFILE_EDIT_PATH {
        cache.revalidate(&request.path).await;
    }
    Ok(ThreadsResponse::Created(user.0))
}

/// GET REQUESTS ///

/**
 * Return a profile with its communities
 *
 * @param id - identity id of the user
 * @return status:
 *             * 200 if success
 *             * 401 if the session is missing or invalid
 *             * 404 if no profile exists for the id
 *             * 500 if db fails or other unknown issue
 */
#[get("/<id>")]
pub async fn get_user(
    _user: AuthenticatedUser,
    id: String,
    db: &State<ThreadsDB>,
) -> Result<Json<UserProfile>, ThreadsResponse> {
    match db.fetch_user(&id).await? {
        Some(profile) => Ok(Json(profile)),
        None => Err(ThreadsServerError::UserNotFound(id).into()),
    }
}

#[get("/<id>/threads")]
pub async fn get_user_threads(
    _user: AuthenticatedUser,
    id: String,
    db: &State<ThreadsDB>,
) -> Result<Json<UserThreads>, ThreadsResponse> {
    match db.fetch_user_posts(&id).await? {
        Some(threads) => Ok(Json(threads)),
        None => Err(ThreadsServerError::UserNotFound(id).into()),
    }
}
