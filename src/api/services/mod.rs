pub mod health;
pub mod location;

pub use health::{AppStartTime, HealthService, health_routes};
pub use location::{LocationHandler, location_routes};
