use crate::errors::ThreadsServerError;
use crate::http::requests::OnboardRequest;
use crate::{MAX_BIO_CHARS, MAX_NAME_CHARS, MAX_USERNAME_CHARS, MIN_PROFILE_CHARS, MIN_TEXT_CHARS};

/// Thread and comment bodies share the same rule
pub fn validate_thread_text(text: &str) -> Result<(), ThreadsServerError> {
    match text.trim().chars().count() >= MIN_TEXT_CHARS {
        true => Ok(()),
        false => Err(ThreadsServerError::TextTooShort(MIN_TEXT_CHARS)),
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ThreadsServerError> {
    let length = value.trim().chars().count();
    if length < min {
        return Err(ThreadsServerError::FieldTooShort(field.to_string(), min));
    }
    if length > max {
        return Err(ThreadsServerError::FieldTooLong(field.to_string(), max));
    }
    Ok(())
}

pub fn validate_profile(request: &OnboardRequest) -> Result<(), ThreadsServerError> {
    check_length("name", &request.name, MIN_PROFILE_CHARS, MAX_NAME_CHARS)?;
    check_length("username", &request.username, MIN_PROFILE_CHARS, MAX_USERNAME_CHARS)?;
    if let Some(bio) = &request.bio {
        check_length("bio", bio, 0, MAX_BIO_CHARS)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, name: &str, bio: Option<&str>) -> OnboardRequest {
        OnboardRequest {
            username: username.to_string(),
            name: name.to_string(),
            bio: bio.map(String::from),
            image: None,
            path: String::new(),
        }
    }

    #[test]
    fn thread_text_needs_three_chars() {
        assert_eq!(
            validate_thread_text("hi"),
            Err(ThreadsServerError::TextTooShort(3))
        );
        assert_eq!(
            validate_thread_text("   a  "),
            Err(ThreadsServerError::TextTooShort(3))
        );
        assert!(validate_thread_text("hey").is_ok());
        // counted in characters, not bytes
        assert!(validate_thread_text("héé").is_ok());
    }

    #[test]
    fn profile_bounds() {
        assert!(validate_profile(&request("jsmith", "Jane Smith", Some("hello"))).is_ok());
        assert_eq!(
            validate_profile(&request("js", "Jane Smith", None)),
            Err(ThreadsServerError::FieldTooShort("username".into(), 3))
        );
        assert_eq!(
            validate_profile(&request(&"x".repeat(31), "Jane Smith", None)),
            Err(ThreadsServerError::FieldTooLong("username".into(), 30))
        );
        assert_eq!(
            validate_profile(&request("jsmith", "Jane", Some(&"b".repeat(1001)))),
            Err(ThreadsServerError::FieldTooLong("bio".into(), 1000))
        );
    }
}
