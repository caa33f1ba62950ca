//! Domains module containing business logic organized by bounded contexts.
//!
//! The server exposes a single capability, tools, each backed by an
//! upstream data API.

pub mod tools;
