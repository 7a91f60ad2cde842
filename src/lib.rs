//! HoneyPath: a chat quiz bot that classifies users and logs the result.

pub mod bot;
pub mod channels;
pub mod config;
pub mod conversation;
pub mod error;
pub mod quiz;
pub mod session;
pub mod store;
