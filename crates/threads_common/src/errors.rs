use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThreadsServerError {
    UserNotFound(String),
    CommunityNotFound(String),
    ThreadNotFound(String),
    UsernameExists(String),
    CommunityExists(String),
    AlreadyMember(String, String),
    NotThreadAuthor(String),
    TextTooShort(usize),
    FieldTooShort(String, usize),
    FieldTooLong(String, usize),
    InvalidObjectId(String),
    MissingSession,
    InvalidSession(String),
    WebhookSignature(String),
    SerdeError(String),
    MongoError(String),
    ConfigError(String),
    HeaderError(String),
    InternalError,
}

impl std::fmt::Display for ThreadsServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ThreadsServerError::UserNotFound(id) => write!(f, "User {} not found", id),
            ThreadsServerError::CommunityNotFound(id) => write!(f, "Community {} not found", id),
            ThreadsServerError::ThreadNotFound(id) => write!(f, "Thread {} not found", id),
            ThreadsServerError::UsernameExists(username) => {
                write!(f, "Username {} already used by another account", username)
            }
            ThreadsServerError::CommunityExists(username) => {
                write!(f, "Community username {} is already taken", username)
            }
            ThreadsServerError::AlreadyMember(user, community) => {
                write!(f, "User {} is already in community {}", user, community)
            }
            ThreadsServerError::NotThreadAuthor(id) => {
                write!(f, "Only the author can delete thread {}", id)
            }
            ThreadsServerError::TextTooShort(min) => write!(f, "Min {} chars", min),
            ThreadsServerError::FieldTooShort(field, min) => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            ThreadsServerError::FieldTooLong(field, max) => {
                write!(f, "{} must be at most {} characters", field, max)
            }
            ThreadsServerError::InvalidObjectId(id) => write!(f, "{} is not a valid id", id),
            ThreadsServerError::MissingSession => write!(f, "Missing session token"),
            ThreadsServerError::InvalidSession(msg) => write!(f, "Invalid session: {}", msg),
            ThreadsServerError::WebhookSignature(msg) => {
                write!(f, "Webhook verification failed: {}", msg)
            }
            ThreadsServerError::SerdeError(msg) => write!(f, "Failed to (de)serialize {}", msg),
            ThreadsServerError::MongoError(msg) => write!(f, "Mongo error: {}", msg),
            ThreadsServerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ThreadsServerError::HeaderError(msg) => write!(f, "HTTP error: bad header `{}`", msg),
            ThreadsServerError::InternalError => write!(f, "Unknown internal server error"),
        }
    }
}

impl std::error::Error for ThreadsServerError {}
