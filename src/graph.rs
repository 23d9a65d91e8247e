//! Reachability over the flow graph's edges.
//!
//! Both traversals gate on a visited set, so a graph that incorrectly
//! contains a directed cycle still terminates, bounded by the node count.

use crate::flow::Edge;
use ahash::AHashSet;
use std::collections::VecDeque;

/// All nodes from which data can flow into `node_id`, found by breadth-first
/// search over edges in the target-to-source direction. The result includes
/// `node_id` itself as the first element and is ordered nearest-first.
pub fn ancestors(node_id: &str, edges: &[Edge]) -> Vec<String> {
    traverse(node_id, edges, |edge, current| {
        (edge.target == current).then_some(edge.source.as_str())
    })
}

/// All nodes reachable from `node_id` following edge direction. Same contract
/// as [`ancestors`]: includes the start node, nearest-first.
pub fn descendants(node_id: &str, edges: &[Edge]) -> Vec<String> {
    traverse(node_id, edges, |edge, current| {
        (edge.source == current).then_some(edge.target.as_str())
    })
}

fn traverse<'a>(
    node_id: &str,
    edges: &'a [Edge],
    next: impl Fn(&'a Edge, &str) -> Option<&'a str>,
) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited = AHashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(node_id.to_string());

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        for edge in edges {
            if let Some(neighbor) = next(edge, &current) {
                if !visited.contains(neighbor) {
                    queue.push_back(neighbor.to_string());
                }
            }
        }
        order.push(current);
    }
    order
}
