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

//! # Consistency Checker
//!
//! Re-derives every cache and every derived value of the model from the forward state, and
//! compares it with the stored one. The check fails on the first difference, naming the cache
//! that drifted.

use crate::model::element::demand_rules;
use crate::model::network_model::NetworkModel;
use crate::model::types::*;

use petgraph::algo::is_cyclic_directed;
use std::collections::BTreeSet;

fn inconsistent(cache: &'static str, detail: String) -> NetworkModelError {
    NetworkModelError::InconsistentCache { cache, detail }
}

macro_rules! compare_cache {
    ($name:expr, $id:expr, $actual:expr, $expected:expr) => {
        if $actual != $expected {
            return Err(inconsistent(
                $name,
                format!("{}: stored {:?}, expected {:?}", $id, $actual, $expected),
            ));
        }
    };
}

impl NetworkModel {
    /// Check that all caches and derived values of the model are consistent with the forward
    /// state, and that all invariants hold. Returns an `InconsistentCache` error describing the
    /// first inconsistency found.
    pub fn check_caches_consistency(&self) -> Result<(), NetworkModelError> {
        self.check_identifiers()?;
        self.check_back_references()?;
        self.check_routes()?;
        self.check_multicast_trees()?;
        self.check_resources()?;
        self.check_coupling()?;
        self.check_forwarding_rules()?;
        self.check_bidirectional_pairs()?;
        self.check_derived_traffic()?;
        Ok(())
    }

    fn check_identifiers(&self) -> Result<(), NetworkModelError> {
        let mut ids: Vec<u64> = Vec::new();
        macro_rules! collect_ids {
            ($map:expr, $name:expr) => {
                for (k, v) in $map.iter() {
                    if *k != v.id {
                        return Err(inconsistent($name, format!("{} is stored as {}", v.id, k)));
                    }
                    ids.push(k.0);
                }
            };
        }
        collect_ids!(self.layers, "layers");
        collect_ids!(self.nodes, "nodes");
        collect_ids!(self.links, "links");
        collect_ids!(self.demands, "demands");
        collect_ids!(self.multicast_demands, "multicast demands");
        collect_ids!(self.routes, "routes");
        collect_ids!(self.multicast_trees, "multicast trees");
        collect_ids!(self.resources, "resources");
        collect_ids!(self.srgs, "shared risk groups");

        let unique: BTreeSet<u64> = ids.iter().copied().collect();
        if unique.len() != ids.len() {
            return Err(inconsistent("identifiers", "some id is used twice".to_string()));
        }
        if let Some(max) = unique.iter().next_back() {
            if *max >= self.next_id {
                return Err(inconsistent(
                    "identifiers",
                    format!("id {} is not below the next id {}", max, self.next_id),
                ));
            }
        }
        if !self.layers.contains_key(&self.default_layer) {
            return Err(inconsistent("default layer", format!("{} does not exist", self.default_layer)));
        }
        Ok(())
    }

    /// Build a copy of the model with all caches derived from the forward state.
    fn rebuilt_caches(&self) -> Result<NetworkModel, NetworkModelError> {
        let mut m = self.clone();
        for n in m.nodes.values_mut() {
            n.cache_out_links.clear();
            n.cache_in_links.clear();
            n.cache_out_demands.clear();
            n.cache_in_demands.clear();
            n.cache_out_multicast_demands.clear();
            n.cache_in_multicast_demands.clear();
            n.cache_resources.clear();
            n.cache_srgs.clear();
        }
        for l in m.links.values_mut() {
            l.cache_traversing_routes.clear();
            l.cache_traversing_trees.clear();
            l.cache_srgs.clear();
        }
        for d in m.demands.values_mut() {
            d.cache_routes.clear();
        }
        for d in m.multicast_demands.values_mut() {
            d.cache_trees.clear();
        }
        for r in m.routes.values_mut() {
            r.cache_primary_routes.clear();
        }
        for r in m.resources.values_mut() {
            r.cache_traversing_routes.clear();
            r.cache_upper_resources.clear();
        }
        for l in m.layers.values_mut() {
            l.cache_links.clear();
            l.cache_demands.clear();
            l.cache_multicast_demands.clear();
            l.cache_routes.clear();
            l.cache_multicast_trees.clear();
        }

        for l in self.links.values() {
            m.node_mut(l.origin)?.cache_out_links.insert(l.id);
            m.node_mut(l.destination)?.cache_in_links.insert(l.id);
            m.layer_mut(l.layer)?.cache_links.insert(l.id);
        }
        for d in self.demands.values() {
            m.node_mut(d.ingress)?.cache_out_demands.insert(d.id);
            m.node_mut(d.egress)?.cache_in_demands.insert(d.id);
            m.layer_mut(d.layer)?.cache_demands.insert(d.id);
        }
        for d in self.multicast_demands.values() {
            m.node_mut(d.ingress)?.cache_out_multicast_demands.insert(d.id);
            for e in d.egress.iter() {
                m.node_mut(*e)?.cache_in_multicast_demands.insert(d.id);
            }
            m.layer_mut(d.layer)?.cache_multicast_demands.insert(d.id);
        }
        for r in self.routes.values() {
            m.demand_mut(r.demand)?.cache_routes.insert(r.id);
            m.layer_mut(r.layer)?.cache_routes.insert(r.id);
            for elem in r.path.iter() {
                match elem {
                    PathElement::Link(l) => m.link_mut(*l)?.cache_traversing_routes.insert(r.id),
                    PathElement::Resource(x) => {
                        m.resource_mut(*x)?.cache_traversing_routes.insert(r.id)
                    }
                };
            }
            for b in r.backup_routes.iter() {
                m.route_mut(*b)?.cache_primary_routes.insert(r.id);
            }
        }
        for t in self.multicast_trees.values() {
            m.multicast_demand_mut(t.demand)?.cache_trees.insert(t.id);
            m.layer_mut(t.layer)?.cache_multicast_trees.insert(t.id);
            for l in t.links.iter() {
                m.link_mut(*l)?.cache_traversing_trees.insert(t.id);
            }
        }
        for r in self.resources.values() {
            m.node_mut(r.host)?.cache_resources.insert(r.id);
            for b in r.base_resources.keys() {
                m.resource_mut(*b)?.cache_upper_resources.insert(r.id);
            }
        }
        for s in self.srgs.values() {
            for n in s.nodes.iter() {
                m.node_mut(*n)?.cache_srgs.insert(s.id);
            }
            for l in s.links.iter() {
                m.link_mut(*l)?.cache_srgs.insert(s.id);
            }
        }
        Ok(m)
    }

    fn check_back_references(&self) -> Result<(), NetworkModelError> {
        let m = self
            .rebuilt_caches()
            .map_err(|e| inconsistent("forward references", e.to_string()))?;
        for (id, n) in self.nodes.iter() {
            let e = &m.nodes[id];
            compare_cache!("node outgoing links", id, n.cache_out_links, e.cache_out_links);
            compare_cache!("node incoming links", id, n.cache_in_links, e.cache_in_links);
            compare_cache!("node outgoing demands", id, n.cache_out_demands, e.cache_out_demands);
            compare_cache!("node incoming demands", id, n.cache_in_demands, e.cache_in_demands);
            compare_cache!(
                "node outgoing multicast demands",
                id,
                n.cache_out_multicast_demands,
                e.cache_out_multicast_demands
            );
            compare_cache!(
                "node incoming multicast demands",
                id,
                n.cache_in_multicast_demands,
                e.cache_in_multicast_demands
            );
            compare_cache!("node resources", id, n.cache_resources, e.cache_resources);
            compare_cache!("node shared risk groups", id, n.cache_srgs, e.cache_srgs);
        }
        for (id, l) in self.links.iter() {
            let e = &m.links[id];
            compare_cache!(
                "link traversing routes",
                id,
                l.cache_traversing_routes,
                e.cache_traversing_routes
            );
            compare_cache!(
                "link traversing trees",
                id,
                l.cache_traversing_trees,
                e.cache_traversing_trees
            );
            compare_cache!("link shared risk groups", id, l.cache_srgs, e.cache_srgs);
        }
        for (id, d) in self.demands.iter() {
            compare_cache!("demand routes", id, d.cache_routes, m.demands[id].cache_routes);
        }
        for (id, d) in self.multicast_demands.iter() {
            compare_cache!(
                "multicast demand trees",
                id,
                d.cache_trees,
                m.multicast_demands[id].cache_trees
            );
        }
        for (id, r) in self.routes.iter() {
            compare_cache!(
                "route primary routes",
                id,
                r.cache_primary_routes,
                m.routes[id].cache_primary_routes
            );
        }
        for (id, r) in self.resources.iter() {
            let e = &m.resources[id];
            compare_cache!(
                "resource traversing routes",
                id,
                r.cache_traversing_routes,
                e.cache_traversing_routes
            );
            compare_cache!(
                "resource upper resources",
                id,
                r.cache_upper_resources,
                e.cache_upper_resources
            );
        }
        for (id, l) in self.layers.iter() {
            let e = &m.layers[id];
            compare_cache!("layer links", id, l.cache_links, e.cache_links);
            compare_cache!("layer demands", id, l.cache_demands, e.cache_demands);
            compare_cache!(
                "layer multicast demands",
                id,
                l.cache_multicast_demands,
                e.cache_multicast_demands
            );
            compare_cache!("layer routes", id, l.cache_routes, e.cache_routes);
            compare_cache!(
                "layer multicast trees",
                id,
                l.cache_multicast_trees,
                e.cache_multicast_trees
            );
        }
        Ok(())
    }

    fn check_routes(&self) -> Result<(), NetworkModelError> {
        for (id, r) in self.routes.iter() {
            let d = self.get_demand(r.demand)?;
            if r.layer != d.layer {
                return Err(inconsistent("route layer", format!("{} is not in the layer of {}", id, d.id)));
            }
            if self.get_layer(r.layer)?.routing_type != RoutingType::SourceRouting {
                return Err(inconsistent(
                    "routes",
                    format!("{} exists in a layer with hop-by-hop routing", id),
                ));
            }
            if r.occupation.len() != r.path.len() {
                return Err(inconsistent(
                    "route occupation",
                    format!("{} has {} elements but {} values", id, r.path.len(), r.occupation.len()),
                ));
            }
            self.validate_path_for(d, &r.path)
                .map_err(|e| inconsistent("route path", format!("{}: {}", id, e)))?;
            for b in r.backup_routes.iter() {
                let backup = self.get_route(*b)?;
                if backup.demand != r.demand || !backup.backup_routes.is_empty() || *b == *id {
                    return Err(inconsistent("backup routes", format!("{} cannot be a backup of {}", b, id)));
                }
            }
            if !r.backup_routes.is_empty() && !r.cache_primary_routes.is_empty() {
                return Err(inconsistent(
                    "backup routes",
                    format!("{} is a backup route and has backup routes", id),
                ));
            }
        }
        Ok(())
    }

    fn check_multicast_trees(&self) -> Result<(), NetworkModelError> {
        for (id, t) in self.multicast_trees.iter() {
            if t.layer != self.get_multicast_demand(t.demand)?.layer {
                return Err(inconsistent("tree layer", format!("{} is not in the layer of its demand", id)));
            }
            self.validate_tree(t.demand, &t.links)
                .map_err(|e| inconsistent("multicast tree links", format!("{}: {}", id, e)))?;
        }
        Ok(())
    }

    fn check_resources(&self) -> Result<(), NetworkModelError> {
        for (id, r) in self.resources.iter() {
            for b in r.base_resources.keys() {
                if self.get_resource(*b)?.host != r.host {
                    return Err(inconsistent(
                        "base resources",
                        format!("{} and its base {} are hosted at different nodes", id, b),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_coupling(&self) -> Result<(), NetworkModelError> {
        for (id, l) in self.links.iter() {
            match l.coupling {
                Some(LinkCoupling::Demand(d)) => {
                    let demand = self.get_demand(d)?;
                    if demand.coupled_upper_link != Some(*id) {
                        return Err(inconsistent("coupling", format!("{} and {} are not symmetric", id, d)));
                    }
                    if demand.ingress != l.origin || demand.egress != l.destination {
                        return Err(inconsistent("coupling", format!("end nodes of {} and {} differ", id, d)));
                    }
                }
                Some(LinkCoupling::MulticastDemand(d)) => {
                    let demand = self.get_multicast_demand(d)?;
                    if demand.coupled_upper_links.get(&l.destination) != Some(id)
                        || demand.ingress != l.origin
                    {
                        return Err(inconsistent("coupling", format!("{} and {} are not symmetric", id, d)));
                    }
                }
                None => {}
            }
        }
        for (id, d) in self.demands.iter() {
            if let Some(l) = d.coupled_upper_link {
                if self.get_link(l)?.coupling != Some(LinkCoupling::Demand(*id)) {
                    return Err(inconsistent("coupling", format!("{} and {} are not symmetric", id, l)));
                }
            }
        }
        for (id, d) in self.multicast_demands.iter() {
            if d.is_coupled() {
                let destinations: BTreeSet<NodeId> = d.coupled_upper_links.keys().copied().collect();
                if destinations != d.egress {
                    return Err(inconsistent(
                        "coupling",
                        format!("{} is not coupled to one link per egress node", id),
                    ));
                }
                for l in d.coupled_upper_links.values() {
                    if self.get_link(*l)?.coupling != Some(LinkCoupling::MulticastDemand(*id)) {
                        return Err(inconsistent("coupling", format!("{} and {} are not symmetric", id, l)));
                    }
                }
            }
        }
        if is_cyclic_directed(&self.get_layer_coupling_graph()) {
            return Err(inconsistent("layer coupling", "the coupling of layers is cyclic".to_string()));
        }
        Ok(())
    }

    fn check_forwarding_rules(&self) -> Result<(), NetworkModelError> {
        for (id, layer) in self.layers.iter() {
            if layer.routing_type == RoutingType::SourceRouting {
                if !layer.forwarding_rules.is_empty() {
                    return Err(inconsistent(
                        "forwarding rules",
                        format!("{} uses source routing but has forwarding rules", id),
                    ));
                }
                continue;
            }
            for ((d, l), _) in layer.forwarding_rules.iter() {
                if self.get_demand(*d)?.layer != *id || self.get_link(*l)?.layer != *id {
                    return Err(inconsistent(
                        "forwarding rules",
                        format!("rule of {} on {} is not in {}", d, l, id),
                    ));
                }
            }
            for d in layer.cache_demands.iter() {
                let demand = self.get_demand(*d)?;
                self.check_demand_rules(demand, &demand_rules(&layer.forwarding_rules, *d))
                    .map_err(|e| inconsistent("forwarding rules", e.to_string()))?;
            }
        }
        Ok(())
    }

    fn check_bidirectional_pairs(&self) -> Result<(), NetworkModelError> {
        for (id, l) in self.links.iter() {
            if let Some(p) = l.bidirectional_pair {
                let pair = self.get_link(p)?;
                if pair.bidirectional_pair != Some(*id)
                    || pair.origin != l.destination
                    || pair.destination != l.origin
                    || pair.layer != l.layer
                {
                    return Err(inconsistent("bidirectional links", format!("{} and {}", id, p)));
                }
            }
        }
        for (id, d) in self.demands.iter() {
            if let Some(p) = d.bidirectional_pair {
                let pair = self.get_demand(p)?;
                if pair.bidirectional_pair != Some(*id)
                    || pair.ingress != d.egress
                    || pair.egress != d.ingress
                    || pair.layer != d.layer
                {
                    return Err(inconsistent("bidirectional demands", format!("{} and {}", id, p)));
                }
            }
        }
        Ok(())
    }

    fn check_derived_traffic(&self) -> Result<(), NetworkModelError> {
        let mut m = self.clone();
        m.refresh_traffic();
        for (id, r) in self.routes.iter() {
            compare_cache!("route failure state", id, r.is_down, m.routes[id].is_down);
        }
        for (id, t) in self.multicast_trees.iter() {
            compare_cache!("tree failure state", id, t.is_down, m.multicast_trees[id].is_down);
        }
        for (id, d) in self.demands.iter() {
            if differs(d.carried_traffic, m.demands[id].carried_traffic) {
                return Err(inconsistent(
                    "demand carried traffic",
                    format!("{}: stored {}, expected {}", id, d.carried_traffic, m.demands[id].carried_traffic),
                ));
            }
        }
        for (id, d) in self.multicast_demands.iter() {
            let expected = m.multicast_demands[id].carried_traffic;
            if differs(d.carried_traffic, expected) {
                return Err(inconsistent(
                    "multicast demand carried traffic",
                    format!("{}: stored {}, expected {}", id, d.carried_traffic, expected),
                ));
            }
        }
        for (id, l) in self.links.iter() {
            let e = &m.links[id];
            if differs(l.carried_traffic, e.carried_traffic) {
                return Err(inconsistent(
                    "link carried traffic",
                    format!("{}: stored {}, expected {}", id, l.carried_traffic, e.carried_traffic),
                ));
            }
            if differs(l.occupied_capacity, e.occupied_capacity) {
                return Err(inconsistent(
                    "link occupied capacity",
                    format!("{}: stored {}, expected {}", id, l.occupied_capacity, e.occupied_capacity),
                ));
            }
            if l.coupling.is_some() && differs(l.capacity, e.capacity) {
                return Err(inconsistent(
                    "coupled link capacity",
                    format!("{}: stored {}, expected {}", id, l.capacity, e.capacity),
                ));
            }
        }
        for (id, r) in self.resources.iter() {
            let expected = m.resources[id].occupied_capacity;
            if differs(r.occupied_capacity, expected) {
                return Err(inconsistent(
                    "resource occupied capacity",
                    format!("{}: stored {}, expected {}", id, r.occupied_capacity, expected),
                ));
            }
        }
        Ok(())
    }
}
