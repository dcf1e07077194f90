use crate::errors::ThreadsCLIError;
use lazy_static::lazy_static;
use reqwest::{redirect::Policy, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::{CommentRequest, CreateThreadRequest, OnboardRequest};
use threads_common::http::responses::{
    CommunitiesPage, CommunityPage, FeedPage, OnboardingPage, ReplyView, ThreadDetail, UserProfile,
    UsersPage,
};

lazy_static! {
    pub static ref SERVER_URL: String = String::from(env!("SERVER_URL"));
}

/**
 * Client that surfaces the onboarding redirect instead of following it
 */
fn client() -> Result<Client, ThreadsCLIError> {
    Ok(Client::builder().redirect(Policy::none()).build()?)
}

fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("Authorization", format!("Bearer {}", token))
}

/// Turn a non-success response into the error the server reported
async fn server_error(res: Response) -> ThreadsCLIError {
    let status = res.status();
    if status == StatusCode::SEE_OTHER {
        return ThreadsCLIError::NotOnboarded;
    }
    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => return ThreadsCLIError::from(e),
    };
    match serde_json::from_str::<ThreadsServerError>(&body) {
        Ok(error) => ThreadsCLIError::Server(error),
        Err(_) => ThreadsCLIError::UnexpectedStatus(status.as_u16(), body),
    }
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ThreadsCLIError> {
    match res.status() {
        StatusCode::OK => Ok(res.json::<T>().await?),
        _ => Err(server_error(res).await),
    }
}

async fn read_created(res: Response) -> Result<String, ThreadsCLIError> {
    match res.status() {
        StatusCode::CREATED => Ok(res.text().await?),
        _ => Err(server_error(res).await),
    }
}

/// GET REQUESTS ///

pub async fn health_req() -> Result<String, ThreadsCLIError> {
    let url = format!("{}/health", &**SERVER_URL);
    let res = client()?.get(&url).send().await?;
    match res.status() {
        StatusCode::OK => Ok(res.text().await?),
        _ => Err(server_error(res).await),
    }
}

/**
 * Makes an HTTP Request for the onboarding prefill of the session user
 *
 * @param token - session token
 * @returns - the stored profile, or blank fields with the identity id
 */
pub async fn get_onboarding_req(token: &str) -> Result<OnboardingPage, ThreadsCLIError> {
    let url = format!("{}/onboarding", &**SERVER_URL);
    let res = authorized(client()?.get(&url), token).send().await?;
    read_json(res).await
}

pub async fn get_user_req(token: &str, user_id: &str) -> Result<UserProfile, ThreadsCLIError> {
    let url = format!("{}/user/{}", &**SERVER_URL, user_id);
    let res = authorized(client()?.get(&url), token).send().await?;
    read_json(res).await
}

pub async fn get_feed_req(token: &str, page: u64) -> Result<FeedPage, ThreadsCLIError> {
    let url = format!("{}/", &**SERVER_URL);
    let res = authorized(client()?.get(&url), token)
        .query(&[("page", page)])
        .send()
        .await?;
    read_json(res).await
}

pub async fn get_thread_req(token: &str, thread: &str) -> Result<ThreadDetail, ThreadsCLIError> {
    let url = format!("{}/thread/{}", &**SERVER_URL, thread);
    let res = authorized(client()?.get(&url), token).send().await?;
    read_json(res).await
}

pub async fn get_activity_req(token: &str) -> Result<Vec<ReplyView>, ThreadsCLIError> {
    let url = format!("{}/activity", &**SERVER_URL);
    let res = authorized(client()?.get(&url), token).send().await?;
    read_json(res).await
}

pub async fn search_users_req(
    token: &str,
    query: &str,
    page: u64,
) -> Result<UsersPage, ThreadsCLIError> {
    let url = format!("{}/search", &**SERVER_URL);
    let res = authorized(client()?.get(&url), token)
        .query(&[("q", query.to_string()), ("page", page.to_string())])
        .send()
        .await?;
    read_json(res).await
}

pub async fn search_communities_req(
    token: &str,
    query: &str,
    page: u64,
) -> Result<CommunitiesPage, ThreadsCLIError> {
    let url = format!("{}/communities", &**SERVER_URL);
    let res = authorized(client()?.get(&url), token)
        .query(&[("q", query.to_string()), ("page", page.to_string())])
        .send()
        .await?;
    read_json(res).await
}

pub async fn get_community_req(token: &str, id: &str) -> Result<CommunityPage, ThreadsCLIError> {
    let url = format!("{}/communities/{}", &**SERVER_URL, id);
    let res = authorized(client()?.get(&url), token).send().await?;
    read_json(res).await
}

/// POST REQUESTS ///

/**
 * Makes an HTTP Request to save the profile of the session user
 *
 * @param body - the OnboardRequest to provide as the body of the http request
 * @returns - the identity id of the saved profile
 */
pub async fn onboard_req(token: &str, body: OnboardRequest) -> Result<String, ThreadsCLIError> {
    let url = format!("{}/user/onboard", &**SERVER_URL);
    let res = authorized(client()?.post(&url), token)
        .json(&body)
        .send()
        .await?;
    read_created(res).await
}

pub async fn create_thread_req(
    token: &str,
    body: CreateThreadRequest,
) -> Result<String, ThreadsCLIError> {
    let url = format!("{}/thread/create", &**SERVER_URL);
    let res = authorized(client()?.post(&url), token)
        .json(&body)
        .send()
        .await?;
    read_created(res).await
}

pub async fn comment_req(
    token: &str,
    thread: &str,
    body: CommentRequest,
) -> Result<String, ThreadsCLIError> {
    let url = format!("{}/thread/{}/comment", &**SERVER_URL, thread);
    let res = authorized(client()?.post(&url), token)
        .json(&body)
        .send()
        .await?;
    read_created(res).await
}

/// DELETE REQUESTS ///

/**
 * Makes an HTTP Request to delete a thread and its replies
 *
 * @param thread - hex id of the thread
 * @param path - page the server should revalidate
 * @returns - hex ids of every deleted thread
 */
pub async fn delete_thread_req(
    token: &str,
    thread: &str,
    path: &str,
) -> Result<Vec<String>, ThreadsCLIError> {
    let url = format!("{}/thread/{}", &**SERVER_URL, thread);
    let res = authorized(client()?.delete(&url), token)
        .query(&[("path", path)])
        .send()
        .await?;
    read_json(res).await
}
