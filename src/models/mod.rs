// src/models/mod.rs

pub mod answer;
pub mod category;
pub mod question;
