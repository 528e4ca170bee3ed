// hertrade/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AuthenticatedProfile;
pub use routes::configure_app_routes;
