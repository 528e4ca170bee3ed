// hertrade/src/lib.rs

//! HerTrade marketplace service: cart, checkout, order lifecycle and the SMS keyword relay for
//! suppliers without a smartphone.

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
