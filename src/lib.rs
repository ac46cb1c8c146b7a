pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod session;
pub mod table;
