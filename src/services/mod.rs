// src/services/mod.rs

pub mod auth;
pub mod question_bank;
pub mod scoring;
