pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod staging;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
