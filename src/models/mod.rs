// src/models/mod.rs

pub mod action;
pub mod image;
pub mod profile;
pub mod user;
