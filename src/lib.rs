// src/lib.rs

pub mod accounts;
pub mod activity;
pub mod config;
pub mod counter;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod state;
pub mod templates;
pub mod utils;

pub use routes::create_router;
