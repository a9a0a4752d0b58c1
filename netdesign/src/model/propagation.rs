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

//! # Inter-Layer Propagation Graph
//!
//! The inter-layer propagation graph (ILPG) captures how traffic elements depend on each other
//! across coupled layers. Starting from a set of initial links, demands and multicast flows, it
//! contains everything reachable by following the dependencies in one direction:
//!
//! - **Upwards** (towards the elements that use the initial ones): a link leads to every demand
//!   whose traffic traverses it, and to every multicast flow whose tree path traverses it. A
//!   demand (or multicast flow) leads to the upper layer link it is coupled to.
//! - **Downwards** (towards the elements the initial ones rely on): a link leads to the demand
//!   (or multicast flow) it is coupled to. A demand leads to every link its traffic traverses, and
//!   a multicast flow to every link on the tree paths towards its egress node.
//!
//! The layer coupling graph, used to keep the coupling of layers acyclic, is also built here.

use crate::model::element::demand_rules;
use crate::model::network_model::NetworkModel;
use crate::model::types::*;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, VecDeque};

/// Vertex of the inter-layer propagation graph.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum IlpgVertex {
    /// Unicast demand
    Demand(DemandId),
    /// Link
    Link(LinkId),
    /// Flow of a multicast demand from its ingress towards a single egress node
    MulticastFlow(MulticastDemandId, NodeId),
}

/// # Inter-Layer Propagation Graph
/// See the [module documentation](crate::model::propagation) for the rules used to build the
/// graph.
#[derive(Debug, Clone)]
pub struct InterLayerPropagationGraph {
    graph: DiGraphMap<IlpgVertex, ()>,
    initial_vertices: BTreeSet<IlpgVertex>,
    upwards: bool,
}

impl InterLayerPropagationGraph {
    /// Build the propagation graph starting from the given initial elements.
    pub fn new(
        model: &NetworkModel,
        initial_links: &BTreeSet<LinkId>,
        initial_demands: &BTreeSet<DemandId>,
        initial_multicast_flows: &BTreeSet<(MulticastDemandId, NodeId)>,
        upwards: bool,
    ) -> Result<Self, NetworkModelError> {
        let mut initial_vertices = BTreeSet::new();
        for l in initial_links.iter() {
            model.get_link(*l)?;
            initial_vertices.insert(IlpgVertex::Link(*l));
        }
        for d in initial_demands.iter() {
            model.get_demand(*d)?;
            initial_vertices.insert(IlpgVertex::Demand(*d));
        }
        for (d, e) in initial_multicast_flows.iter() {
            if !model.get_multicast_demand(*d)?.egress.contains(e) {
                return Err(NetworkModelError::ElementNotFound((*e).into()));
            }
            initial_vertices.insert(IlpgVertex::MulticastFlow(*d, *e));
        }

        let mut graph: DiGraphMap<IlpgVertex, ()> = DiGraphMap::new();
        let mut queue: VecDeque<IlpgVertex> = initial_vertices.iter().copied().collect();
        for v in initial_vertices.iter() {
            graph.add_node(*v);
        }
        while let Some(v) = queue.pop_front() {
            let next = if upwards {
                upwards_neighbors(model, v)?
            } else {
                downwards_neighbors(model, v)?
            };
            for w in next {
                if !graph.contains_node(w) {
                    queue.push_back(w);
                }
                graph.add_edge(v, w, ());
            }
        }

        Ok(Self { graph, initial_vertices, upwards })
    }

    /// Returns all links in the graph
    pub fn get_links_in_graph(&self) -> BTreeSet<LinkId> {
        self.graph
            .nodes()
            .filter_map(|v| match v {
                IlpgVertex::Link(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    /// Returns all unicast demands in the graph
    pub fn get_demands_in_graph(&self) -> BTreeSet<DemandId> {
        self.graph
            .nodes()
            .filter_map(|v| match v {
                IlpgVertex::Demand(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// Returns all multicast flows in the graph, as pairs of multicast demand and egress node.
    pub fn get_multicast_demand_flows_in_graph(&self) -> BTreeSet<(MulticastDemandId, NodeId)> {
        self.graph
            .nodes()
            .filter_map(|v| match v {
                IlpgVertex::MulticastFlow(d, n) => Some((d, n)),
                _ => None,
            })
            .collect()
    }

    /// Returns the vertices the graph was built from
    pub fn get_initial_vertices(&self) -> &BTreeSet<IlpgVertex> {
        &self.initial_vertices
    }

    /// Returns the underlying graph
    pub fn get_graph(&self) -> &DiGraphMap<IlpgVertex, ()> {
        &self.graph
    }

    /// Returns true if the graph was built upwards
    pub fn is_upwards(&self) -> bool {
        self.upwards
    }
}

fn upwards_neighbors(
    model: &NetworkModel,
    v: IlpgVertex,
) -> Result<Vec<IlpgVertex>, NetworkModelError> {
    let mut result = Vec::new();
    match v {
        IlpgVertex::Link(l) => {
            let link = model.get_link(l)?;
            let layer = model.get_layer(link.layer)?;
            match layer.routing_type {
                RoutingType::SourceRouting => {
                    for r in link.cache_traversing_routes.iter() {
                        result.push(IlpgVertex::Demand(model.get_route(*r)?.demand));
                    }
                }
                RoutingType::HopByHopRouting => {
                    for ((d, rule_link), f) in layer.forwarding_rules.iter() {
                        if *rule_link == l && *f > 0.0 {
                            result.push(IlpgVertex::Demand(*d));
                        }
                    }
                }
            }
            for t in link.cache_traversing_trees.iter() {
                let tree = model.get_multicast_tree(*t)?;
                for e in model.get_multicast_demand(tree.demand)?.egress.iter() {
                    if model.get_multicast_tree_path_to_egress(*t, *e)?.contains(&l) {
                        result.push(IlpgVertex::MulticastFlow(tree.demand, *e));
                    }
                }
            }
        }
        IlpgVertex::Demand(d) => {
            if let Some(l) = model.get_demand(d)?.coupled_upper_link {
                result.push(IlpgVertex::Link(l));
            }
        }
        IlpgVertex::MulticastFlow(d, e) => {
            if let Some(l) = model.get_multicast_demand(d)?.coupled_upper_links.get(&e) {
                result.push(IlpgVertex::Link(*l));
            }
        }
    }
    Ok(result)
}

fn downwards_neighbors(
    model: &NetworkModel,
    v: IlpgVertex,
) -> Result<Vec<IlpgVertex>, NetworkModelError> {
    let mut result = Vec::new();
    match v {
        IlpgVertex::Link(l) => match model.get_link(l)?.coupling {
            Some(LinkCoupling::Demand(d)) => result.push(IlpgVertex::Demand(d)),
            Some(LinkCoupling::MulticastDemand(d)) => {
                result.push(IlpgVertex::MulticastFlow(d, model.get_link(l)?.destination))
            }
            None => {}
        },
        IlpgVertex::Demand(d) => {
            let demand = model.get_demand(d)?;
            let layer = model.get_layer(demand.layer)?;
            match layer.routing_type {
                RoutingType::SourceRouting => {
                    for r in demand.cache_routes.iter() {
                        result.extend(model.get_route(*r)?.links().map(IlpgVertex::Link));
                    }
                }
                RoutingType::HopByHopRouting => {
                    for (l, f) in demand_rules(&layer.forwarding_rules, d) {
                        if f > 0.0 {
                            result.push(IlpgVertex::Link(l));
                        }
                    }
                }
            }
        }
        IlpgVertex::MulticastFlow(d, e) => {
            for t in model.get_multicast_demand(d)?.cache_trees.iter() {
                for l in model.get_multicast_tree_path_to_egress(*t, e)? {
                    result.push(IlpgVertex::Link(l));
                }
            }
        }
    }
    Ok(result)
}

impl NetworkModel {
    /// Build the inter-layer propagation graph of this model. See [`InterLayerPropagationGraph`].
    pub fn get_inter_layer_propagation_graph(
        &self,
        initial_links: &BTreeSet<LinkId>,
        initial_demands: &BTreeSet<DemandId>,
        initial_multicast_flows: &BTreeSet<(MulticastDemandId, NodeId)>,
        upwards: bool,
    ) -> Result<InterLayerPropagationGraph, NetworkModelError> {
        InterLayerPropagationGraph::new(
            self,
            initial_links,
            initial_demands,
            initial_multicast_flows,
            upwards,
        )
    }

    /// Returns the graph of coupled layers. There is an edge from an upper layer to a lower layer
    /// if some link of the upper layer is coupled to a demand of the lower layer.
    pub fn get_layer_coupling_graph(&self) -> DiGraphMap<LayerId, ()> {
        let mut graph = DiGraphMap::new();
        for l in self.layers.keys() {
            graph.add_node(*l);
        }
        for link in self.links.values() {
            let lower = match link.coupling {
                Some(LinkCoupling::Demand(d)) => self.demands.get(&d).map(|d| d.layer),
                Some(LinkCoupling::MulticastDemand(d)) => {
                    self.multicast_demands.get(&d).map(|d| d.layer)
                }
                None => None,
            };
            if let Some(lower) = lower {
                graph.add_edge(link.layer, lower, ());
            }
        }
        graph
    }

    /// Checks that coupling a link of the upper layer to a demand of the lower layer keeps the
    /// coupling of layers acyclic.
    pub fn check_layer_coupling(
        &self,
        upper_layer: LayerId,
        lower_layer: LayerId,
    ) -> Result<(), NetworkModelError> {
        self.get_layer(upper_layer)?;
        self.get_layer(lower_layer)?;
        if upper_layer == lower_layer {
            return Err(NetworkModelError::CouplingCycle(upper_layer, lower_layer));
        }
        let graph = self.get_layer_coupling_graph();
        if has_path_connecting(&graph, lower_layer, upper_layer, None) {
            return Err(NetworkModelError::CouplingCycle(upper_layer, lower_layer));
        }
        Ok(())
    }
}
