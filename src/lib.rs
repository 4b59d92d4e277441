pub mod auth;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod server;
pub mod services;
