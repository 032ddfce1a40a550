//! Tool Gateway: single HTTP surface over the in-process tool registry and
//! the Tool Server Manager, for the sandboxed code interpreter to call into.

pub mod server;

pub use server::{build_router, serve, GatewayState};
