// NetDesign: Multi-Layer Network Design Model
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Parses GML files from Topology Zoo

use super::NodeData;

use petgraph::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Parses the content of a GML file and returns the resulting graph.
/// The names will remain the same, except the same name occurs twice. In this case, we will append
/// a _N to the end, where N is a number starting from 1 (_1 is appended to the second occurence,
/// and _2 is appended to the third occurence, etc...). Spaces in names are replaced by `_`.
///
/// Parallel edges are merged into a single one, and self-loops are ignored.
pub fn parse_gml_graph(gml_str: &str) -> Result<Graph<NodeData, (), Undirected, u32>, GmlError> {
    let mut g: Graph<NodeData, (), Undirected, u32> = Graph::new_undirected();

    let mut current_state = CurrentState::NotStarted;

    let mut used_labels: HashMap<String, usize> = HashMap::new();
    let mut node_lookup: HashMap<usize, NodeIndex<u32>> = HashMap::new();

    for (i, line) in gml_str.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        current_state = match current_state {
            CurrentState::NotStarted => {
                if line == "graph [" {
                    CurrentState::None
                } else {
                    return Err(GmlError::UnexpectedToken { line: i, content: String::from(line) });
                }
            }
            CurrentState::None => {
                if line == "node [" {
                    CurrentState::Node(PartialNode::default())
                } else if line == "edge [" {
                    CurrentState::Edge { source: None, target: None }
                } else {
                    CurrentState::None
                }
            }
            CurrentState::Node(mut node) => {
                if let Some(number) = line.strip_prefix("id ") {
                    node.id = Some(number.trim().parse()?);
                    CurrentState::Node(node)
                } else if let Some(label) = line.strip_prefix("label ") {
                    let mut name: String = label.trim().trim_matches('"').replace(" ", "_");
                    // increment the num_used in the hashmap
                    let num_used = *used_labels.get(&name).unwrap_or(&0);
                    used_labels.insert(name.clone(), num_used + 1);
                    if num_used > 0 {
                        name.push_str(&format!("_{}", num_used));
                    }
                    node.name = Some(name);
                    CurrentState::Node(node)
                } else if let Some(value) = line.strip_prefix("Latitude ") {
                    node.latitude = Some(value.trim().parse()?);
                    CurrentState::Node(node)
                } else if let Some(value) = line.strip_prefix("Longitude ") {
                    node.longitude = Some(value.trim().parse()?);
                    CurrentState::Node(node)
                } else if let Some(value) = line.strip_prefix("Internal ") {
                    node.internal = match value.trim() {
                        "1" => Some(true),
                        "0" => Some(false),
                        _ => {
                            return Err(GmlError::UnexpectedToken {
                                line: i,
                                content: String::from(line),
                            })
                        }
                    };
                    CurrentState::Node(node)
                } else if line == "]" {
                    let name = node.name.ok_or(GmlError::NodeMissingLabel(i))?;
                    let id = node.id.ok_or(GmlError::NodeMissingId(i))?;
                    if node_lookup.contains_key(&id) {
                        return Err(GmlError::NodeIdNotUnique(i));
                    }
                    let node_idx = g.add_node(NodeData {
                        name,
                        latitude: node.latitude,
                        longitude: node.longitude,
                        internal: node.internal.unwrap_or(true),
                    });
                    node_lookup.insert(id, node_idx);
                    CurrentState::None
                } else {
                    CurrentState::Node(node)
                }
            }
            CurrentState::Edge { source, target } => {
                if let Some(number) = line.strip_prefix("source ") {
                    let source: Option<usize> = Some(number.trim().parse()?);
                    CurrentState::Edge { source, target }
                } else if let Some(number) = line.strip_prefix("target ") {
                    let target: Option<usize> = Some(number.trim().parse()?);
                    CurrentState::Edge { source, target }
                } else if line == "]" {
                    let source = source.ok_or(GmlError::EdgeMissingSource(i))?;
                    let source_idx =
                        node_lookup.get(&source).ok_or(GmlError::UnknownNodeId(source))?;
                    let target = target.ok_or(GmlError::EdgeMissingTarget(i))?;
                    let target_idx =
                        node_lookup.get(&target).ok_or(GmlError::UnknownNodeId(target))?;
                    // ignore duplicate links and self-loops
                    if source_idx != target_idx && !g.contains_edge(*source_idx, *target_idx) {
                        g.add_edge(*source_idx, *target_idx, ());
                    }
                    CurrentState::None
                } else {
                    CurrentState::Edge { source, target }
                }
            }
        };
    }

    Ok(g)
}

#[derive(Default)]
struct PartialNode {
    id: Option<usize>,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    internal: Option<bool>,
}

enum CurrentState {
    NotStarted,
    None,
    Node(PartialNode),
    Edge { source: Option<usize>, target: Option<usize> },
}

/// Error while parsing a GML file
#[derive(Debug, Error)]
pub enum GmlError {
    /// Io Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// Unexpected Token
    #[error("Unexpected Token on line {line}: {content}")]
    UnexpectedToken {
        /// Line number
        line: usize,
        /// Content of the line
        content: String,
    },
    /// ParseIntError
    #[error("Cannot parse an integer! {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    /// ParseFloatError
    #[error("Cannot parse a coordinate! {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    /// Unknown Node Id
    #[error("Unknown node id: {0}")]
    UnknownNodeId(usize),
    /// Node is missing an ID field
    #[error("Node is missing an ID field before line {0}!")]
    NodeMissingId(usize),
    /// Node is missing an label field
    #[error("Node is missing an label field before line {0}!")]
    NodeMissingLabel(usize),
    /// Duplicate Node Id
    #[error("Node ID is not unique on line {0}!")]
    NodeIdNotUnique(usize),
    /// Edge is missing the source field
    #[error("Edge is missing the source field before line {0}!")]
    EdgeMissingSource(usize),
    /// Edge is missing the target field
    #[error("Edge is missing the target field before line {0}!")]
    EdgeMissingTarget(usize),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_with_triangle_gml() {
        let filename = format!("{}/test_files/triangle.gml", env!("CARGO_MANIFEST_DIR"));
        let content = std::fs::read_to_string(filename).unwrap();
        let g = parse_gml_graph(&content).unwrap();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);

        assert_eq!(g.node_weight(0.into()).unwrap().name, "Zurich");
        assert_eq!(g.node_weight(1.into()).unwrap().name, "Geneva");
        assert_eq!(g.node_weight(2.into()).unwrap().name, "Basel");
        assert_eq!(g.node_weight(0.into()).unwrap().latitude, Some(47.37));
        assert_eq!(g.node_weight(0.into()).unwrap().longitude, Some(8.54));

        assert_eq!(g.edge_endpoints(0.into()), Some((0.into(), 1.into())));
        assert_eq!(g.edge_endpoints(1.into()), Some((1.into(), 2.into())));
        assert_eq!(g.edge_endpoints(2.into()), Some((0.into(), 2.into())));
    }

    #[test]
    fn test_duplicate_labels_and_edges() {
        let content = "graph [\n  node [\n    id 0\n    label \"New York\"\n  ]\n  node [\n    id 1\n    label \"New York\"\n  ]\n  edge [\n    source 0\n    target 1\n  ]\n  edge [\n    source 1\n    target 0\n  ]\n  edge [\n    source 1\n    target 1\n  ]\n]\n";
        let g = parse_gml_graph(content).unwrap();
        assert_eq!(g.node_weight(0.into()).unwrap().name, "New_York");
        assert_eq!(g.node_weight(1.into()).unwrap().name, "New_York_1");
        assert_eq!(g.node_weight(0.into()).unwrap().latitude, None);
        assert!(g.node_weight(0.into()).unwrap().internal);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_gml_graph("foo"), Err(GmlError::UnexpectedToken { .. })));
        let missing_label = "graph [\n  node [\n    id 0\n  ]\n]\n";
        assert!(matches!(parse_gml_graph(missing_label), Err(GmlError::NodeMissingLabel(_))));
        let unknown = "graph [\n  node [\n    id 0\n    label \"A\"\n  ]\n  edge [\n    source 0\n    target 4\n  ]\n]\n";
        assert!(matches!(parse_gml_graph(unknown), Err(GmlError::UnknownNodeId(4))));
    }
}
