use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Redirect, Responder, Response};
use std::io::Cursor;
use threads_common::errors::ThreadsServerError;

#[derive(Responder)]
pub enum ThreadsResponse {
    #[response(status = 201)]
    Created(String),
    #[response(status = 400)]
    BadRequest(ErrorMessage),
    #[response(status = 401)]
    Unauthorized(ErrorMessage),
    #[response(status = 403)]
    Forbidden(ErrorMessage),
    #[response(status = 404)]
    NotFound(ErrorMessage),
    #[response(status = 409)]
    Conflict(ErrorMessage),
    #[response(status = 413)]
    TooLarge(String),
    #[response(status = 500)]
    InternalError(ErrorMessage),
    Onboarding(Redirect),
}

/// Error body; guards park one in request local state for the catchers to render
#[derive(Clone, Debug)]
pub struct ErrorMessage(pub Option<ThreadsServerError>);

impl<'r> Responder<'r, 'static> for ErrorMessage {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = match &self.0 {
            Some(error) => serde_json::to_string(error).map_err(|_| Status::InternalServerError)?,
            None => String::from("null"),
        };
        Response::build()
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

/// HTTP status an error is reported with
pub fn status_for(error: &ThreadsServerError) -> Status {
    match error {
        ThreadsServerError::UserNotFound(_)
        | ThreadsServerError::CommunityNotFound(_)
        | ThreadsServerError::ThreadNotFound(_) => Status::NotFound,
        ThreadsServerError::UsernameExists(_)
        | ThreadsServerError::CommunityExists(_)
        | ThreadsServerError::AlreadyMember(_, _) => Status::Conflict,
        ThreadsServerError::NotThreadAuthor(_) => Status::Forbidden,
        ThreadsServerError::TextTooShort(_)
        | ThreadsServerError::FieldTooShort(_, _)
        | ThreadsServerError::FieldTooLong(_, _)
        | ThreadsServerError::InvalidObjectId(_)
        | ThreadsServerError::SerdeError(_)
        | ThreadsServerError::HeaderError(_) => Status::BadRequest,
        ThreadsServerError::MissingSession
        | ThreadsServerError::InvalidSession(_)
        | ThreadsServerError::WebhookSignature(_) => Status::Unauthorized,
        ThreadsServerError::MongoError(_)
        | ThreadsServerError::ConfigError(_)
        | ThreadsServerError::InternalError => Status::InternalServerError,
    }
}

impl From<ThreadsServerError> for ThreadsResponse {
    fn from(error: ThreadsServerError) -> Self {
        let status = status_for(&error);
        if status == Status::InternalServerError {
            tracing::error!("{}", error);
        }
        let message = ErrorMessage(Some(error));
        match status.code {
            404 => ThreadsResponse::NotFound(message),
            409 => ThreadsResponse::Conflict(message),
            403 => ThreadsResponse::Forbidden(message),
            400 => ThreadsResponse::BadRequest(message),
            401 => ThreadsResponse::Unauthorized(message),
            _ => ThreadsResponse::InternalError(message),
        }
    }
}

#[catch(400)]
pub fn bad_request(req: &Request) -> ThreadsResponse {
    ThreadsResponse::BadRequest(req.local_cache(|| ErrorMessage(None)).clone())
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> ThreadsResponse {
    match req.local_cache(|| ErrorMessage(None)) {
        ErrorMessage(Some(error)) => ThreadsResponse::Unauthorized(ErrorMessage(Some(error.clone()))),
        ErrorMessage(None) => {
            ThreadsResponse::Unauthorized(ErrorMessage(Some(ThreadsServerError::MissingSession)))
        }
    }
}

#[catch(404)]
pub fn not_found(req: &Request) -> ThreadsResponse {
    ThreadsResponse::NotFound(req.local_cache(|| ErrorMessage(None)).clone())
}

#[catch(500)]
pub fn internal_error(req: &Request) -> ThreadsResponse {
    match req.local_cache(|| ErrorMessage(None)) {
        ErrorMessage(Some(error)) => ThreadsResponse::InternalError(ErrorMessage(Some(error.clone()))),
        ErrorMessage(None) => {
            ThreadsResponse::InternalError(ErrorMessage(Some(ThreadsServerError::InternalError)))
        }
    }
}
