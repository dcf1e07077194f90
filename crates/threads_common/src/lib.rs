pub mod errors;
pub mod http;
pub mod models;
pub mod utils;
pub mod validation;

pub const MIN_TEXT_CHARS: usize = 3;
pub const MIN_PROFILE_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 30;
pub const MAX_NAME_CHARS: usize = 30;
pub const MAX_BIO_CHARS: usize = 1000;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const FEED_PAGE_SIZE: u64 = 30;
pub const SEARCH_PAGE_SIZE: u64 = 25;

/// Path whose cached page is revalidated after a profile edit
pub const PROFILE_EDIT_PATH: &str = "/profile/edit";
pub const ONBOARDING_PATH: &str = "/onboarding";
