//! Upstream data-source resolution through pass-through chains.

use std::collections::HashSet;

use tracing::debug;

use super::{Link, ShaderGraph};

/// Result of walking upstream from an input socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    /// Name of the source node.
    pub source: String,
    /// Output socket of the source feeding the chain.
    pub socket: String,
    /// Pass-through nodes crossed on the way, nearest first.
    pub through: Vec<String>,
}

/// Find the nearest genuine data source feeding `node.socket`.
///
/// Walks backward through pass-through nodes, continuing at each through
/// its highest-priority connected input. Returns `None` if the socket is
/// unconnected, the chain ends at a node that is neither a source nor a
/// pass-through, or any node is reached twice.
pub fn trace_upstream(graph: &ShaderGraph, node: &str, socket: &str) -> Option<Trace> {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(node);
    let mut through = Vec::new();
    let mut link: &Link = graph.incoming(node, socket)?;

    loop {
        let upstream = graph.node(&link.from_node)?;
        if !visited.insert(upstream.name.as_str()) {
            debug!(node = %upstream.name, "shader graph cycle, no source");
            return None;
        }
        if upstream.kind.is_source() {
            return Some(Trace {
                source: upstream.name.clone(),
                socket: link.from_socket.clone(),
                through,
            });
        }
        let inputs = upstream.kind.pass_through_inputs()?;
        through.push(upstream.name.clone());
        link = inputs
            .iter()
            .find_map(|input| graph.incoming(&upstream.name, input))?;
    }
}
