//! chatgate core library: configuration, the edge auth gate, and the LangGraph API gateway
//! used by the CLI.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod init;
