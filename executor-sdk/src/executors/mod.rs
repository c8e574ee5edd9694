//! Reference executors
//!
//! Two backends ship with the SDK: an outbound HTTP call executor and an
//! allowlisted remote-command executor. Anything else plugs in through the
//! `Executor` trait and the registry.

pub mod command;
pub mod http;

pub use command::CommandExecutor;
pub use http::HttpExecutor;
