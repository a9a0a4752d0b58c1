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

//! # Topology Zoo
//!
//! This module imports topologies from [TopologyZoo](http://www.topology-zoo.org/dataset.html)
//! (as `GML` files) into a [`NetworkModel`]. Every edge becomes a bidirectional pair of links,
//! whose length is the great-circle distance between the coordinates of the two nodes. Nodes are
//! placed at `(longitude, latitude)`.
//!
//! ```rust
//! use netdesign::topology_zoo::ZooTopology;
//! # fn main() -> Result<(), netdesign::Error> {
//! # let filename = format!("{}/test_files/triangle.gml", env!("CARGO_MANIFEST_DIR"));
//! let topo = ZooTopology::new(&filename)?;
//! let mut model = topo.build_model(100.0, None)?;
//! topo.add_uniform_traffic(&mut model, 1.0, 10.0, 42, None)?;
//! assert_eq!(model.get_demands(None)?.len(), 6);
//! # Ok(())
//! # }
//! ```

mod error;
mod gml_parser;

pub use error::ZooTopologyError;
pub use gml_parser::GmlError;

use crate::model::{DemandId, LayerId, NetworkModel, NodeId, DEFAULT_PROPAGATION_SPEED_KM_PER_S};
use gml_parser::parse_gml_graph;

use itertools::iproduct;
use log::*;
use petgraph::prelude::*;
use rand::prelude::*;
use std::collections::BTreeMap;
use std::fs::read_to_string;

/// Mean radius of the earth, in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Data of a node read from the GML file
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Name of the node (unique)
    pub name: String,
    /// Latitude in degrees, if known
    pub latitude: Option<f64>,
    /// Longitude in degrees, if known
    pub longitude: Option<f64>,
    /// Whether the node is internal to the network
    pub internal: bool,
}

/// Topology read from a Topology Zoo GML file
#[derive(Debug, Clone)]
pub struct ZooTopology {
    graph: Graph<NodeData, (), Undirected, u32>,
}

impl ZooTopology {
    /// Read the GML file and parse the topology.
    pub fn new(filename: impl AsRef<str>) -> Result<Self, ZooTopologyError> {
        let content = read_to_string(filename.as_ref()).map_err(GmlError::from)?;
        Self::from_gml_str(&content)
    }

    /// Parse the topology from the content of a GML file.
    pub fn from_gml_str(content: &str) -> Result<Self, ZooTopologyError> {
        let graph = parse_gml_graph(content)?;
        info!("Parsed topology with {} nodes and {} edges", graph.node_count(), graph.edge_count());
        Ok(Self { graph })
    }

    /// Number of nodes in the topology
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of (undirected) edges in the topology
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the data of all nodes, in the order of the GML file.
    pub fn get_nodes(&self) -> Vec<&NodeData> {
        self.graph.node_indices().map(|n| &self.graph[n]).collect()
    }

    /// Returns the data of the node with the given name
    pub fn get_node_by_name(&self, name: &str) -> Result<&NodeData, ZooTopologyError> {
        self.graph
            .node_indices()
            .map(|n| &self.graph[n])
            .find(|n| n.name == name)
            .ok_or_else(|| ZooTopologyError::NameNotFound(name.to_string()))
    }

    /// Build a network model from the topology. Every edge becomes a bidirectional link pair in the
    /// given layer (or the default layer of the new model) with the given capacity. Links between
    /// nodes without coordinates have zero length.
    pub fn build_model(
        &self,
        capacity: f64,
        layer_name: Option<&str>,
    ) -> Result<NetworkModel, ZooTopologyError> {
        let mut model = NetworkModel::new();
        let layer = model.get_default_layer();
        if let Some(name) = layer_name {
            model.set_layer_name(layer, name)?;
        }

        let mut lut: BTreeMap<NodeIndex<u32>, NodeId> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            let data = &self.graph[idx];
            let id = model.add_node(
                data.name.clone(),
                data.longitude.unwrap_or(0.0),
                data.latitude.unwrap_or(0.0),
            );
            lut.insert(idx, id);
        }

        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            let length_km = self.edge_length_km(a, b);
            model.add_link_bidirectional(
                lut[&a],
                lut[&b],
                capacity,
                length_km,
                DEFAULT_PROPAGATION_SPEED_KM_PER_S,
                Some(layer),
            )?;
        }

        Ok(model)
    }

    /// Replace the demands of the layer by a full mesh of demands, each with an offered traffic
    /// drawn uniformly from `[min_traffic, max_traffic)`. The same seed always generates the same
    /// traffic.
    pub fn add_uniform_traffic(
        &self,
        model: &mut NetworkModel,
        min_traffic: f64,
        max_traffic: f64,
        seed: u64,
        layer: Option<LayerId>,
    ) -> Result<Vec<DemandId>, ZooTopologyError> {
        if min_traffic.is_nan() || max_traffic.is_nan() || min_traffic <= 0.0 || max_traffic < min_traffic {
            return Err(ZooTopologyError::InvalidTrafficRange(min_traffic, max_traffic));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = model.get_nodes();
        let mut matrix: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
        for (a, b) in iproduct!(nodes.iter(), nodes.iter()).filter(|(a, b)| a != b) {
            let h = if max_traffic > min_traffic {
                rng.gen_range(min_traffic, max_traffic)
            } else {
                min_traffic
            };
            matrix.insert((*a, *b), h);
        }
        let demands = model.set_traffic_matrix(&matrix, layer)?;
        debug!("Generated {} demands with seed {}", demands.len(), seed);
        Ok(demands)
    }

    fn edge_length_km(&self, a: NodeIndex<u32>, b: NodeIndex<u32>) -> f64 {
        let (a, b) = (&self.graph[a], &self.graph[b]);
        match (a.latitude, a.longitude, b.latitude, b.longitude) {
            (Some(lat_a), Some(lon_a), Some(lat_b), Some(lon_b)) => {
                haversine_distance_km(lat_a, lon_a, lat_b, lon_b)
            }
            _ => {
                warn!("Missing coordinates of {} or {}, using zero length", a.name, b.name);
                0.0
            }
        }
    }
}

/// Great-circle distance (in km) between two points given by latitude and longitude in degrees.
pub fn haversine_distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let (phi_a, phi_b) = (lat_a.to_radians(), lat_b.to_radians());
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lon_b - lon_a).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
