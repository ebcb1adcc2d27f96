pub mod admin;
pub mod health;
pub mod media;
pub mod portal;

pub use health::{AppStartTime, HealthService, health_routes};
pub use media::media_routes;
pub use portal::portal_routes;
