use crate::errors::ThreadsCLIError;
use crate::http::{
    comment_req, create_thread_req, delete_thread_req, get_activity_req, get_community_req,
    get_feed_req, get_onboarding_req, get_thread_req, get_user_req, health_req, onboard_req,
    search_communities_req, search_users_req,
};
use crate::utils::fs::{get_storage_path, save_session};
use crate::utils::{format_reply, format_thread, format_threads, session_guard};
use threads_common::http::requests::{CommentRequest, CreateThreadRequest, OnboardRequest};
use threads_common::validation::{validate_profile, validate_thread_text};
use threads_common::PROFILE_EDIT_PATH;

/**
 * Check that the server is reachable
 */
pub async fn health() -> Result<String, ThreadsCLIError> {
    let message = health_req().await?;
    Ok(format!("Health check passed: {}", message))
}

/**
 * Store the session token issued by the auth provider
 *
 * @param token - session JWT
 */
pub async fn login(token: String) -> Result<String, ThreadsCLIError> {
    if token.trim().is_empty() {
        return Err(ThreadsCLIError::NoInput(String::from("token")));
    }
    let path = save_session(&get_storage_path()?, &token)?;
    Ok(format!("Session saved to {}", path.display()))
}

/**
 * Save the profile of the signed in user
 *
 * @param username - unique handle
 * @param name - display name
 */
pub async fn onboard(
    username: String,
    name: String,
    bio: Option<String>,
    image: Option<String>,
) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let body = OnboardRequest {
        username,
        name,
        bio,
        image,
        path: String::from(PROFILE_EDIT_PATH),
    };
    validate_profile(&body)?;
    let user_id = onboard_req(&token, body.clone()).await?;
    Ok(format!(
        "Success: saved profile @{} for {}",
        body.username.trim().to_lowercase(),
        user_id
    ))
}

/**
 * Print the profile of the signed in user
 */
pub async fn me() -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let prefill = get_onboarding_req(&token).await?;
    if !prefill.onboarded {
        return Err(ThreadsCLIError::NotOnboarded);
    }
    let profile = get_user_req(&token, &prefill.id).await?;
    let communities = profile
        .communities
        .iter()
        .map(|community| community.name.clone())
        .collect::<Vec<String>>();
    Ok(format!(
        "Id: {}\nUsername: @{}\nName: {}\nBio: {}\n# threads: {}\nCommunities: {}",
        profile.id,
        profile.username,
        profile.name,
        profile.bio.unwrap_or_default(),
        profile.threads.len(),
        match communities.is_empty() {
            true => String::from("none"),
            false => communities.join(", "),
        }
    ))
}

pub async fn post(text: String, community: Option<String>) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    validate_thread_text(&text)?;
    let body = CreateThreadRequest {
        text,
        community_id: community,
        path: String::from("/"),
    };
    let thread = create_thread_req(&token, body).await?;
    Ok(format!("Success: posted thread {}", thread))
}

pub async fn reply(thread: String, text: String) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    validate_thread_text(&text)?;
    let body = CommentRequest {
        text,
        path: format!("/thread/{}", thread),
    };
    let reply = comment_req(&token, &thread, body).await?;
    Ok(format!("Success: replied to {} with {}", thread, reply))
}

pub async fn delete(thread: String) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let deleted = delete_thread_req(&token, &thread, "/").await?;
    Ok(format!(
        "Success: deleted thread {} and {} replies",
        thread,
        deleted.len().saturating_sub(1)
    ))
}

pub async fn feed(page: u64) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let feed = get_feed_req(&token, page).await?;
    let mut output = format_threads(&feed.threads);
    if feed.is_next {
        output.push_str(&format!("\n\nMore threads: `threads feed --page {}`", page + 1));
    }
    Ok(output)
}

/**
 * Print a thread with two levels of replies
 *
 * @param id - hex id of the thread
 */
pub async fn thread(id: String) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let detail = get_thread_req(&token, &id).await?;
    let mut lines = vec![format!(
        "[{}] @{}: {}",
        detail.oid.to_hex(),
        detail.author.username,
        detail.text
    )];
    for child in detail.children.iter() {
        lines.push(String::new());
        lines.push(format_thread(child));
    }
    Ok(lines.join("\n"))
}

pub async fn search(query: Option<String>, page: u64) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let result = search_users_req(&token, query.as_deref().unwrap_or(""), page).await?;
    if result.users.is_empty() {
        return Ok(String::from("No users found"));
    }
    let mut lines: Vec<String> = result
        .users
        .iter()
        .map(|user| format!("@{} ({}) id: {}", user.username, user.name, user.id))
        .collect();
    if result.is_next {
        lines.push(format!("More results on page {}", page + 1));
    }
    Ok(lines.join("\n"))
}

pub async fn communities(query: Option<String>, page: u64) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let result = search_communities_req(&token, query.as_deref().unwrap_or(""), page).await?;
    if result.communities.is_empty() {
        return Ok(String::from("No communities found"));
    }
    let mut lines: Vec<String> = result
        .communities
        .iter()
        .map(|community| {
            format!(
                "{} (@{}) id: {}, {} members",
                community.name,
                community.username,
                community.id,
                community.members.len()
            )
        })
        .collect();
    if result.is_next {
        lines.push(format!("More results on page {}", page + 1));
    }
    Ok(lines.join("\n"))
}

pub async fn community(id: String) -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let page = get_community_req(&token, &id).await?;
    let members = page
        .details
        .members
        .iter()
        .map(|member| format!("@{}", member.username))
        .collect::<Vec<String>>();
    Ok(format!(
        "{} (@{})\nCreated by: @{}\nMembers: {}\n\n{}",
        page.details.name,
        page.details.username,
        page.details.created_by.username,
        members.join(", "),
        format_threads(&page.threads)
    ))
}

/**
 * Print the replies others left on your threads, newest first
 */
pub async fn activity() -> Result<String, ThreadsCLIError> {
    let token = session_guard()?;
    let replies = get_activity_req(&token).await?;
    match replies.is_empty() {
        true => Ok(String::from("No activity yet")),
        false => Ok(replies
            .iter()
            .map(format_reply)
            .collect::<Vec<String>>()
            .join("\n")),
    }
}
