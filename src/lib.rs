//! Create a GitHub repository through an external service and confirm it exists.
//!
//! Two request paths share one flow: a direct REST call to an MCP endpoint
//! ([`mcp`]), or a messages request that hands a language model a
//! `create_repository` tool ([`anthropic`]). Either way the result is
//! checked by polling the public GitHub API ([`verify`]).

pub mod anthropic;
pub mod config;
pub mod error;
pub mod mcp;
pub mod repository;
pub mod verify;
pub mod workflow;
