// hertrade/src/services/mod.rs

pub mod auth_service;
pub mod cart_service;
pub mod delivery_mock;
