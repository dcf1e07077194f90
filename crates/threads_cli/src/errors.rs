use threads_common::errors::ThreadsServerError;

#[derive(Debug)]
pub enum ThreadsCLIError {
    NotLoggedIn,
    NotOnboarded,
    NoInput(String),
    FsError(String),
    HttpError(String),
    Server(ThreadsServerError),
    UnexpectedStatus(u16, String),
}

impl std::fmt::Display for ThreadsCLIError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ThreadsCLIError::NotLoggedIn => {
                write!(f, "No session found, run `threads login <token>` first")
            }
            ThreadsCLIError::NotOnboarded => write!(
                f,
                "Profile is not set up yet, run `threads onboard <username> <name>` first"
            ),
            ThreadsCLIError::NoInput(msg) => write!(f, "Missing input: {}", msg),
            ThreadsCLIError::FsError(msg) => write!(f, "Filesystem error: {}", msg),
            ThreadsCLIError::HttpError(msg) => write!(f, "Request failed: {}", msg),
            ThreadsCLIError::Server(e) => write!(f, "{}", e),
            ThreadsCLIError::UnexpectedStatus(status, body) => {
                write!(f, "Server responded with {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for ThreadsCLIError {}

impl From<ThreadsServerError> for ThreadsCLIError {
    fn from(error: ThreadsServerError) -> Self {
        ThreadsCLIError::Server(error)
    }
}

impl From<reqwest::Error> for ThreadsCLIError {
    fn from(error: reqwest::Error) -> Self {
        ThreadsCLIError::HttpError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_display_as_is() {
        let error = ThreadsCLIError::from(ThreadsServerError::TextTooShort(3));
        assert_eq!(error.to_string(), "Min 3 chars");
    }
}
