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

//! # Routing Types
//!
//! Every layer either uses source routing, where the traffic of each demand is carried by explicit
//! routes, or hop-by-hop routing, where each node splits the traffic of a demand among its
//! outgoing links according to forwarding rules (splitting factors).
//!
//! Forwarding rules of a demand may contain cycles. A cycle is *open* if traffic can leave it
//! again (towards the egress, or because some splitting factors sum up to less than one, such
//! that traffic is dropped). A cycle is *closed* if traffic entering it can never leave it. Rules
//! creating closed cycles are rejected.
//!
//! Switching the routing type converts the routing state of the entire layer at once, such that
//! the carried traffic of each demand stays the same. Hop-by-hop routing has no backup routes, and
//! every link is occupied by exactly the traffic it carries. Hence, backup routes are dropped when
//! switching to hop-by-hop routing, and a route occupying more (or less) capacity than it carries
//! is replaced by rules occupying its carried traffic. Without those, the occupied capacity of
//! each link stays the same as well.

use crate::model::element::{demand_rules, Demand};
use crate::model::network_model::NetworkModel;
use crate::model::printer;
use crate::model::types::*;

use log::*;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet};

impl NetworkModel {
    /// Set the splitting factor of a demand on a link. A factor of zero removes the rule. The
    /// layer must use hop-by-hop routing.
    pub fn set_forwarding_rule(
        &mut self,
        demand: DemandId,
        link: LinkId,
        splitting_factor: f64,
    ) -> Result<(), NetworkModelError> {
        let mut rules = BTreeMap::new();
        rules.insert((demand, link), splitting_factor);
        self.set_forwarding_rules(&rules)
    }

    /// Set many forwarding rules at once. Rules which are not mentioned are kept. Either all rules
    /// are applied, or none of them.
    pub fn set_forwarding_rules(
        &mut self,
        rules: &BTreeMap<(DemandId, LinkId), f64>,
    ) -> Result<(), NetworkModelError> {
        // collect the new rules of every affected demand
        let mut new_rules: BTreeMap<DemandId, BTreeMap<LinkId, f64>> = BTreeMap::new();
        for ((d, l), f) in rules.iter() {
            let demand = self.get_demand(*d)?;
            let link = self.get_link(*l)?;
            if link.layer != demand.layer {
                return Err(NetworkModelError::LayerMismatch((*d).into(), (*l).into()));
            }
            let layer = self.get_layer(demand.layer)?;
            if layer.routing_type != RoutingType::HopByHopRouting {
                return Err(NetworkModelError::WrongRoutingType(
                    demand.layer,
                    RoutingType::HopByHopRouting,
                ));
            }
            new_rules
                .entry(*d)
                .or_insert_with(|| demand_rules(&layer.forwarding_rules, *d))
                .insert(*l, *f);
        }
        for (d, r) in new_rules.iter_mut() {
            r.retain(|_, f| *f != 0.0);
            self.check_demand_rules(self.get_demand(*d)?, r)?;
        }

        // apply
        for (d, r) in new_rules {
            let layer = self.get_demand(d)?.layer;
            let layer = self.layer_mut(layer)?;
            layer.forwarding_rules.retain(|(x, _), _| *x != d);
            layer.forwarding_rules.extend(r.into_iter().map(|(l, f)| ((d, l), f)));
            trace!("Set forwarding rules of {}", d);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove the forwarding rule of a demand on a link.
    pub fn remove_forwarding_rule(
        &mut self,
        demand: DemandId,
        link: LinkId,
    ) -> Result<(), NetworkModelError> {
        self.set_forwarding_rule(demand, link, 0.0)
    }

    /// Remove all forwarding rules of the layer (or the default layer).
    pub fn remove_all_forwarding_rules(
        &mut self,
        layer: Option<LayerId>,
    ) -> Result<(), NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        self.layer_mut(layer)?.forwarding_rules.clear();
        self.after_mutation();
        Ok(())
    }

    /// Returns the splitting factor of the demand on the link, which is zero if there is no rule.
    pub fn get_forwarding_rule(&self, demand: DemandId, link: LinkId) -> Result<f64, NetworkModelError> {
        let d = self.get_demand(demand)?;
        self.get_link(link)?;
        Ok(self
            .get_layer(d.layer)?
            .forwarding_rules
            .get(&(demand, link))
            .copied()
            .unwrap_or(0.0))
    }

    /// Returns all forwarding rules of the layer (or the default layer).
    pub fn get_forwarding_rules(
        &self,
        layer: Option<LayerId>,
    ) -> Result<&BTreeMap<(DemandId, LinkId), f64>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(&self.get_layer(layer)?.forwarding_rules)
    }

    /// Returns the forwarding rules of a single demand, indexed by the link.
    pub fn get_demand_forwarding_rules(
        &self,
        demand: DemandId,
    ) -> Result<BTreeMap<LinkId, f64>, NetworkModelError> {
        let d = self.get_demand(demand)?;
        Ok(demand_rules(&self.get_layer(d.layer)?.forwarding_rules, demand))
    }

    /// Classify the routing of a demand. In source routing, the routing has open cycles if some
    /// route visits a node twice.
    pub fn get_demand_routing_cycle_type(
        &self,
        demand: DemandId,
    ) -> Result<RoutingCycleType, NetworkModelError> {
        let d = self.get_demand(demand)?;
        let layer = self.get_layer(d.layer)?;
        match layer.routing_type {
            RoutingType::HopByHopRouting => Ok(self.classify_forwarding_rules(
                d,
                &demand_rules(&layer.forwarding_rules, demand),
            )),
            RoutingType::SourceRouting => {
                for r in d.cache_routes.iter() {
                    let nodes = self.get_route_sequence_of_nodes(*r)?;
                    let unique: BTreeSet<&NodeId> = nodes.iter().collect();
                    if unique.len() != nodes.len() {
                        return Ok(RoutingCycleType::OpenCycles);
                    }
                }
                Ok(RoutingCycleType::Loopless)
            }
        }
    }

    /// Check the values of the forwarding rules of a demand: all factors must be in `[0, 1]`, the
    /// factors at each node must sum up to at most one, and there must not be a closed cycle.
    pub(crate) fn check_demand_rules(
        &self,
        d: &Demand,
        rules: &BTreeMap<LinkId, f64>,
    ) -> Result<(), NetworkModelError> {
        let mut sums: BTreeMap<NodeId, f64> = BTreeMap::new();
        for (l, f) in rules.iter() {
            let link = self.get_link(*l)?;
            if link.layer != d.layer {
                return Err(NetworkModelError::LayerMismatch(d.id.into(), (*l).into()));
            }
            if f.is_nan() || *f < 0.0 || *f > 1.0 {
                return Err(NetworkModelError::InvalidValue("splitting factor", *f));
            }
            *sums.entry(link.origin).or_default() += *f;
        }
        if let Some((n, s)) = sums.into_iter().find(|(_, s)| exceeds(*s, 1.0)) {
            return Err(NetworkModelError::ForwardingRulesExceedOne(d.id, n, s));
        }
        if self.classify_forwarding_rules(d, rules) == RoutingCycleType::ClosedCycles {
            return Err(NetworkModelError::ClosedCycleRouting(d.id));
        }
        Ok(())
    }

    /// Classify the cycles of the forwarding rules of a demand. Only links with a positive factor
    /// reachable from the ingress are considered, and rules at the egress are ignored. The failure
    /// state is not taken into account, since failures can only make traffic leave a cycle.
    pub(crate) fn classify_forwarding_rules(
        &self,
        d: &Demand,
        rules: &BTreeMap<LinkId, f64>,
    ) -> RoutingCycleType {
        let edges: Vec<(NodeId, NodeId, f64)> = rules
            .iter()
            .filter(|(_, f)| **f > 0.0)
            .filter_map(|(l, f)| self.links.get(l).map(|l| (l.origin, l.destination, *f)))
            .filter(|(o, _, _)| *o != d.egress)
            .collect();

        let mut reachable: BTreeSet<NodeId> = BTreeSet::new();
        reachable.insert(d.ingress);
        let mut stack = vec![d.ingress];
        while let Some(n) = stack.pop() {
            for (o, t, _) in edges.iter() {
                if *o == n && reachable.insert(*t) {
                    stack.push(*t);
                }
            }
        }

        let mut graph: DiGraphMap<NodeId, ()> = DiGraphMap::new();
        graph.add_node(d.ingress);
        for (o, t, _) in edges.iter().filter(|(o, _, _)| reachable.contains(o)) {
            graph.add_edge(*o, *t, ());
        }

        let mut result = RoutingCycleType::Loopless;
        for scc in tarjan_scc(&graph) {
            if scc.len() < 2 {
                continue;
            }
            let members: BTreeSet<NodeId> = scc.into_iter().collect();
            let closed = members.iter().all(|n| {
                let inside: f64 = edges
                    .iter()
                    .filter(|(o, t, _)| o == n && members.contains(t))
                    .map(|(_, _, f)| *f)
                    .sum();
                !exceeds(1.0, inside)
            });
            if closed {
                return RoutingCycleType::ClosedCycles;
            }
            result = RoutingCycleType::OpenCycles;
        }
        result
    }

    /// Returns all simple paths of the demand with a positive splitting factor on every link,
    /// together with the product of the splitting factors along the path.
    pub(crate) fn demand_paths_from_forwarding_rules(
        &self,
        demand: DemandId,
    ) -> Result<Vec<(Vec<LinkId>, f64)>, NetworkModelError> {
        let d = self.get_demand(demand)?;
        let rules = demand_rules(&self.get_layer(d.layer)?.forwarding_rules, demand);
        let mut out_links: BTreeMap<NodeId, Vec<(LinkId, NodeId, f64)>> = BTreeMap::new();
        for (l, f) in rules.iter().filter(|(_, f)| **f > 0.0) {
            let link = self.get_link(*l)?;
            out_links.entry(link.origin).or_default().push((*l, link.destination, *f));
        }

        let mut result = Vec::new();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        visited.insert(d.ingress);
        let mut path: Vec<LinkId> = Vec::new();
        simple_paths(d.ingress, d.egress, 1.0, &out_links, &mut visited, &mut path, &mut result);
        Ok(result)
    }

    /// Compute the forwarding rules equivalent to the routes of all demands in the layer. Backup
    /// routes are ignored. The splitting factor at the ingress is relative to the offered traffic,
    /// such that blocked traffic stays blocked.
    pub fn compute_forwarding_rules_from_routes(
        &self,
        layer: Option<LayerId>,
    ) -> Result<BTreeMap<(DemandId, LinkId), f64>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let mut rules = BTreeMap::new();
        for d in self.get_layer(layer)?.cache_demands.iter() {
            let demand = self.get_demand(*d)?;
            let mut link_flow: BTreeMap<LinkId, f64> = BTreeMap::new();
            for r in demand.cache_routes.iter() {
                let route = self.get_route(*r)?;
                if route.is_backup_route() {
                    continue;
                }
                for l in route.links() {
                    *link_flow.entry(l).or_default() += route.carried_traffic;
                }
            }
            let mut node_in: BTreeMap<NodeId, f64> = BTreeMap::new();
            let mut node_out: BTreeMap<NodeId, f64> = BTreeMap::new();
            for (l, flow) in link_flow.iter() {
                let link = self.get_link(*l)?;
                *node_in.entry(link.destination).or_default() += *flow;
                *node_out.entry(link.origin).or_default() += *flow;
            }
            for (l, flow) in link_flow.iter().filter(|(_, f)| **f > 0.0) {
                let origin = self.get_link(*l)?.origin;
                let incoming = node_in.get(&origin).copied().unwrap_or(0.0);
                let outgoing = node_out.get(&origin).copied().unwrap_or(0.0);
                let total = if origin == demand.ingress {
                    (demand.offered_traffic + incoming).max(outgoing)
                } else {
                    incoming.max(outgoing)
                };
                rules.insert((*d, *l), (flow / total).min(1.0));
            }
        }
        Ok(rules)
    }

    /// Compute the routes equivalent to the forwarding rules of all demands in the layer: one
    /// route for every simple path with a positive splitting factor on every link. Returns the
    /// demand, the links and the carried traffic of each route.
    pub fn compute_routes_from_forwarding_rules(
        &self,
        layer: Option<LayerId>,
    ) -> Result<Vec<(DemandId, Vec<LinkId>, f64)>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let mut routes = Vec::new();
        for d in self.get_layer(layer)?.cache_demands.iter() {
            let offered = self.get_demand(*d)?.offered_traffic;
            for (path, factor) in self.demand_paths_from_forwarding_rules(*d)? {
                let carried = offered * factor;
                if carried > 0.0 {
                    routes.push((*d, path, carried));
                }
            }
        }
        Ok(routes)
    }

    /// Switch the routing type of the layer (or the default layer), converting routes into
    /// forwarding rules or vice versa. Layers containing service chains cannot use hop-by-hop
    /// routing.
    pub fn set_routing_type(
        &mut self,
        routing_type: RoutingType,
        layer: Option<LayerId>,
    ) -> Result<(), NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        if self.get_layer(layer)?.routing_type == routing_type {
            return Ok(());
        }
        let mut new = self.clone();
        match routing_type {
            RoutingType::HopByHopRouting => {
                let demands = self.get_demands(Some(layer))?;
                if let Some(d) = demands.iter().find(|d| self.demands[*d].is_service_chain()) {
                    return Err(NetworkModelError::ServiceChainInHopByHop(*d));
                }
                let rules = self.compute_forwarding_rules_from_routes(Some(layer))?;
                for d in demands.iter() {
                    self.check_demand_rules(&self.demands[d], &demand_rules(&rules, *d))?;
                }
                for r in self.get_routes(Some(layer))? {
                    let route = &self.routes[&r];
                    if route.is_backup_route() {
                        warn!("Backup route {} is dropped.", printer::route(self, r)?);
                    } else if route.occupation.iter().any(|x| differs(*x, route.carried_traffic)) {
                        warn!(
                            "Route {} occupies a different capacity than it carries. Its links are occupied by the carried traffic only.",
                            printer::route(self, r)?
                        );
                    }
                    new.remove_route_internal(r);
                }
                let l = new.layer_mut(layer)?;
                l.forwarding_rules = rules;
                l.routing_type = RoutingType::HopByHopRouting;
            }
            RoutingType::SourceRouting => {
                for d in self.get_demands(Some(layer))? {
                    if self.get_demand_routing_cycle_type(d)? == RoutingCycleType::OpenCycles {
                        warn!(
                            "Forwarding rules of {} contain open cycles. Looping traffic is not converted to routes.",
                            printer::demand(self, d)?
                        );
                    }
                }
                let routes = self.compute_routes_from_forwarding_rules(Some(layer))?;
                let l = new.layer_mut(layer)?;
                l.forwarding_rules.clear();
                l.routing_type = RoutingType::SourceRouting;
                for (d, path, carried) in routes {
                    let occupation = vec![carried; path.len()];
                    let path = path.into_iter().map(PathElement::Link).collect();
                    new.insert_route(None, d, carried, path, occupation)?;
                }
            }
        }
        new.after_mutation();
        info!("Switched {} to {:?}", printer::element(self, layer.into())?, routing_type);
        *self = new;
        Ok(())
    }
}

// ********************
// * Helper Functions *
// ********************

fn simple_paths(
    current: NodeId,
    egress: NodeId,
    factor: f64,
    out_links: &BTreeMap<NodeId, Vec<(LinkId, NodeId, f64)>>,
    visited: &mut BTreeSet<NodeId>,
    path: &mut Vec<LinkId>,
    result: &mut Vec<(Vec<LinkId>, f64)>,
) {
    if current == egress {
        result.push((path.clone(), factor));
        return;
    }
    if let Some(links) = out_links.get(&current) {
        for (l, next, f) in links.iter() {
            if visited.insert(*next) {
                path.push(*l);
                simple_paths(*next, egress, factor * f, out_links, visited, path, result);
                path.pop();
                visited.remove(next);
            }
        }
    }
}
