pub mod community;
pub mod thread;
pub mod user;

pub use community::Community;
pub use thread::Thread;
pub use user::User;
