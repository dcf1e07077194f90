use crate::catchers::ThreadsResponse;
use crate::guards::AuthenticatedUser;
use crate::mongo::ThreadsDB;
use lazy_static::lazy_static;
use rocket::response::Redirect;
use rocket::route::Route;
use threads_common::errors::ThreadsServerError;
use threads_common::http::responses::UserProfile;
use threads_common::ONBOARDING_PATH;
mod page;
mod thread;
mod user;
mod webhook;

lazy_static! {
    pub(crate) static ref PAGE_ROUTES: Vec<Route> = routes![
        page::health,
        page::feed,
        page::activity,
        page::search,
        page::communities,
        page::thread,
        page::profile,
        page::community,
        page::onboarding
    ];
    pub(crate) static ref USER_ROUTES: Vec<Route> =
        routes![user::onboard, user::get_user, user::get_user_threads];
    pub(crate) static ref THREAD_ROUTES: Vec<Route> = routes![
        thread::create_thread,
        thread::add_comment,
        thread::delete_thread
    ];
    pub(crate) static ref WEBHOOK_ROUTES: Vec<Route> = routes![webhook::auth_webhook];
}

/**
 * Resolve the stored profile of the signed in user
 *
 * @returns - 404 if the identity never saved a profile
 */
pub(crate) async fn session_profile(
    db: &ThreadsDB,
    user: &AuthenticatedUser,
) -> Result<UserProfile, ThreadsResponse> {
    match db.fetch_user(&user.0).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(ThreadsServerError::UserNotFound(user.0.clone()).into()),
        Err(e) => Err(e.into()),
    }
}

/// Like `session_profile` but sends users without a finished profile to onboarding
pub(crate) async fn onboarded_profile(
    db: &ThreadsDB,
    user: &AuthenticatedUser,
) -> Result<UserProfile, ThreadsResponse> {
    match db.fetch_user(&user.0).await {
        Ok(Some(profile)) if profile.onboarded => Ok(profile),
        Ok(_) => Err(ThreadsResponse::Onboarding(Redirect::to(ONBOARDING_PATH))),
        Err(e) => Err(e.into()),
    }
}
