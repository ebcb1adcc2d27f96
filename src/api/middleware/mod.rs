pub mod auth;
pub mod request_id;

pub use auth::{AdminAuth, SessionUser, session_from_request};
pub use request_id::{RequestId, RequestIdMiddleware};
