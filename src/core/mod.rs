pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod markdown;
pub mod message;
pub mod notify;
pub mod paths;
pub mod render;
pub mod session;
pub mod title;
pub mod transport;
