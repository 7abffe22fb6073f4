//! Authentication: signed session cookies, password hashing, the request
//! extractor that resolves a session, and the register/login/reset handlers.

pub mod current_session;
pub mod handlers;
pub mod password;
pub mod session;

pub use session::Session;
