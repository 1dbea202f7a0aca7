//! Agent-facing tools over the order resolver.
//!
//! A conversational agent calls tools by name with a JSON payload. This crate
//! exposes the order lookup as one such tool and keeps the registry that
//! dispatches to it. The resolver decides which order matched; the agent only
//! relays the structured result.

pub mod tools;
pub mod track_order;

pub use tools::{Tool, ToolError, ToolRegistry};
pub use track_order::TrackOrderTool;
