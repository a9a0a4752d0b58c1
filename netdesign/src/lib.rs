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

#![deny(missing_docs)]

//! # NetDesign: Multi-Layer Network Design Model
//! This is a library for planning multi-layer telecommunication networks. It keeps an in-memory
//! model of nodes, links, traffic demands, routes, processing resources and shared risk groups,
//! spread over several network layers which can be coupled to each other (a link in an upper
//! layer can be realized by a demand of a lower layer).
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Model`](model)**: The network design model. See the main structure
//!   [`NetworkModel`](model::NetworkModel). Every mutation of the model keeps all
//!   back-references and derived values consistent, and either succeeds completely or leaves the
//!   model unchanged. The model also contains the coupling of layers, the conversion between
//!   source routing and hop-by-hop routing, the inter-layer propagation graph, and the failure
//!   analysis of shared risk groups.
//!
//! - **[`CandidatePaths`](candidate_paths)**: Computation of candidate paths, service chains and
//!   multicast trees, constrained by length, number of hops, delay and cost.
//!
//! - **[`ExampleNetworks`](example_networks)**: Collection of prepared models to test the
//!   library, including a multi-layer IP over WDM network and a service chain network.
//!
//! - **[`TopologyZoo`](topology_zoo::ZooTopology)**: Functions to generate a model from a
//!   topology downloaded from [TopologyZoo](http://www.topology-zoo.org/dataset.html) (as `GML`
//!   files). The traffic can be generated randomly.
//!
//! ## Features
//!
//! - *`check-consistency`*: If this feature is enabled, every mutation of the model runs the
//!   consistency checker afterwards, and panics if some cache is inconsistent.
//!
//! ## Usage
//!
//! ```
//! use netdesign::candidate_paths::CandidatePathOptions;
//! use netdesign::example_networks::{ExampleNetwork, TriangleNet};
//! use netdesign::Error;
//!
//! fn main() -> Result<(), Error> {
//!     // prepare the model
//!     let mut model = TriangleNet::model()?;
//!
//!     // compute two candidate paths for every demand
//!     let options = CandidatePathOptions::with_k(2);
//!     let cpl = model.compute_unicast_candidate_path_list(None, &options, None)?;
//!
//!     // route every demand over its shortest path
//!     for d in model.get_demands(None)? {
//!         let demand = model.get_demand(d)?;
//!         let h = demand.offered_traffic();
//!         let path = cpl[&(demand.ingress(), demand.egress())][0].clone();
//!         model.add_route(d, h, h, &path)?;
//!     }
//!
//!     assert_eq!(model.get_total_blocked_traffic(None)?, 0.0);
//!     model.check_caches_consistency()?;
//!     Ok(())
//! }
//! ```

pub mod candidate_paths;
pub mod example_networks;
pub mod model;
#[cfg(test)]
mod test;
pub mod topology_zoo;

mod error;
pub use error::Error;
