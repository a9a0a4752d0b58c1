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

use netdesign::candidate_paths::ServiceChainPathOptions;
use netdesign::example_networks::{ExampleNetwork, IpOverWdmNet, ServiceChainNet, TriangleNet};
use netdesign::model::{NetworkModel, NetworkModelError, RoutingType};
use netdesign::topology_zoo::ZooTopology;

use clap::{Subcommand, ValueEnum};
use log::*;
use std::error::Error;
use std::fmt;

/// Network to load
#[derive(Subcommand, Debug)]
pub enum NetworkSelection {
    /// Use a network from Topology Zoo, with random uniform traffic
    #[clap(name = "topology-zoo")]
    TopologyZoo {
        /// GML file to use
        gml_file: String,
        /// Random seed, to get reproducable traffic
        #[clap(short = 's', long, default_value = "42")]
        seed: u64,
        /// Capacity of every link
        #[clap(short = 'c', long, default_value = "100")]
        capacity: f64,
        /// Minimum offered traffic of every demand
        #[clap(long, default_value = "1")]
        min_traffic: f64,
        /// Maximum offered traffic of every demand
        #[clap(long, default_value = "10")]
        max_traffic: f64,
    },
    /// Use an example network, provided by netdesign
    #[clap(name = "example")]
    ExampleNetwork {
        /// Topology to use (from the example networks)
        #[clap(value_enum)]
        topology: Topology,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Topology {
    Triangle,
    IpOverWdm,
    ServiceChain,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topology::Triangle => write!(f, "Triangle"),
            Topology::IpOverWdm => write!(f, "IpOverWdm"),
            Topology::ServiceChain => write!(f, "ServiceChain"),
        }
    }
}

impl NetworkSelection {
    /// Build the selected network model
    pub fn model(&self) -> Result<NetworkModel, Box<dyn Error>> {
        match self {
            NetworkSelection::TopologyZoo { gml_file, seed, capacity, min_traffic, max_traffic } => {
                let topo = ZooTopology::new(gml_file)?;
                let mut model = topo.build_model(*capacity, None)?;
                topo.add_uniform_traffic(&mut model, *min_traffic, *max_traffic, *seed, None)?;
                Ok(model)
            }
            NetworkSelection::ExampleNetwork { topology } => Ok(match topology {
                Topology::Triangle => TriangleNet::model()?,
                Topology::IpOverWdm => IpOverWdmNet::model()?,
                Topology::ServiceChain => ServiceChainNet::model()?,
            }),
        }
    }

    /// Stringify the network
    pub fn repr(&self) -> String {
        match self {
            NetworkSelection::TopologyZoo { gml_file, seed, .. } => format!(
                "{}, s={}",
                gml_file.rsplit('/').next().unwrap_or(gml_file.as_str()),
                seed
            ),
            NetworkSelection::ExampleNetwork { topology } => topology.to_string(),
        }
    }
}

/// Route every demand without a route over its cheapest candidate path (or service chain), in all
/// layers with source routing. Returns the number of routes added.
pub fn route_unrouted_demands(model: &mut NetworkModel) -> Result<usize, NetworkModelError> {
    let mut num_routes = 0;
    for layer in model.get_layers() {
        if model.get_layer(layer)?.routing_type() != RoutingType::SourceRouting {
            continue;
        }
        let candidates = model.compute_unicast_candidate_service_chain_list(
            None,
            None,
            &ServiceChainPathOptions::with_k(1),
            Some(layer),
        )?;
        for (d, chains) in candidates {
            if !model.get_demand(d)?.routes().is_empty() {
                continue;
            }
            match chains.into_iter().next() {
                Some(path) => {
                    let h = model.get_demand(d)?.offered_traffic();
                    model.add_service_chain(d, h, vec![h; path.len()], path)?;
                    num_routes += 1;
                }
                None => warn!("No candidate path for {}", d),
            }
        }
    }
    Ok(num_routes)
}
