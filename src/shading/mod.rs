//! Shading graphs.
//!
//! - [`ShaderGraph`] - nodes, sockets with defaults, and links
//! - [`trace_upstream`] - nearest data source behind pass-through chains
//! - [`summarize`] / [`materialize`] - compact per-slot form and its inverse
//! - [`network_to_node`] / [`network_from_node`] - full `NodeGraph` form

mod graph;
mod network;
mod resolve;
mod summary;

pub use graph::{Link, ShaderGraph, ShaderNode, ShaderNodeKind, Socket};
pub use network::{network_from_node, network_to_node, NETWORK_TAG};
pub use resolve::{trace_upstream, Trace};
pub use summary::{
    materialize, summarize, summary_from_node, summary_to_node, PendingImage, Slot, SlotBinding, SLOTS, SUMMARY_TAG,
};
