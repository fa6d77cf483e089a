// src/handlers/mod.rs

pub mod admin;
pub mod category;
pub mod quiz;
pub mod stats;
