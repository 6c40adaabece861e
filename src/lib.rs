pub mod availability;
pub mod config;
pub mod console;
pub mod error;
pub mod extract;
pub mod filter;
pub mod http;
pub mod links;
pub mod mailer;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod user_agent;
