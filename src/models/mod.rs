// src/models/mod.rs

pub mod attempt;
pub mod quiz;
pub mod taxonomy;
pub mod user;
