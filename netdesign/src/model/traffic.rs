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

//! # Derived Traffic State
//!
//! This module recomputes all values that are derived from the routing state: the failure state of
//! routes and trees, carried traffic of demands, occupied capacity of links and resources, and the
//! capacity of coupled links.
//!
//! In hop-by-hop routing, the traffic of a demand is described by the forwarding rules. Let `P` be
//! the matrix of splitting factors between nodes (with failed links removed and all rules at the
//! egress node ignored), and let `h` be the offered traffic. Then the traffic `x` entering every
//! node is the solution of
//!
//! ```text
//! (I - P)^T x = h e_ingress
//! ```
//!
//! Traffic sent over a failed link is lost, which can only make the system better conditioned.
//! The carried traffic is the traffic reaching the egress node.

use crate::model::element::demand_rules;
use crate::model::network_model::NetworkModel;
use crate::model::types::*;

use log::*;
use std::collections::{BTreeMap, BTreeSet};

impl NetworkModel {
    /// Recompute all derived traffic values of the model from scratch.
    pub(crate) fn refresh_traffic(&mut self) {
        // failure state of routes and trees
        let route_state: Vec<(RouteId, bool)> =
            self.routes.values().map(|r| (r.id, self.is_path_down(&r.path))).collect();
        for (r, is_down) in route_state {
            if let Some(r) = self.routes.get_mut(&r) {
                r.is_down = is_down;
            }
        }
        let tree_state: Vec<(MulticastTreeId, bool)> = self
            .multicast_trees
            .values()
            .map(|t| (t.id, t.links.iter().any(|l| !self.is_link_usable(*l))))
            .collect();
        for (t, is_down) in tree_state {
            if let Some(t) = self.multicast_trees.get_mut(&t) {
                t.is_down = is_down;
            }
        }

        let mut link_carried: BTreeMap<LinkId, f64> = BTreeMap::new();
        let mut link_occupied: BTreeMap<LinkId, f64> = BTreeMap::new();
        let mut resource_occupied: BTreeMap<ResourceId, f64> = BTreeMap::new();
        let mut demand_carried: BTreeMap<DemandId, f64> = BTreeMap::new();
        let mut mdemand_carried: BTreeMap<MulticastDemandId, f64> = BTreeMap::new();

        // source routing
        for r in self.routes.values().filter(|r| !r.is_down) {
            if r.cache_primary_routes.is_empty() {
                *demand_carried.entry(r.demand).or_default() += r.carried_traffic;
            }
            for (elem, occupied) in r.path.iter().zip(r.occupation.iter()) {
                match elem {
                    PathElement::Link(l) => {
                        *link_carried.entry(*l).or_default() += r.carried_traffic;
                        *link_occupied.entry(*l).or_default() += *occupied;
                    }
                    PathElement::Resource(res) => {
                        *resource_occupied.entry(*res).or_default() += *occupied;
                    }
                }
            }
        }

        // hop-by-hop routing
        for layer in self.layers.values().filter(|l| l.routing_type == RoutingType::HopByHopRouting) {
            for d in layer.cache_demands.iter() {
                let (carried, flows) = self.hop_by_hop_flows(*d, &demand_rules(&layer.forwarding_rules, *d));
                demand_carried.insert(*d, carried);
                for (l, flow) in flows {
                    *link_carried.entry(l).or_default() += flow;
                    *link_occupied.entry(l).or_default() += flow;
                }
            }
        }

        // multicast trees
        for t in self.multicast_trees.values().filter(|t| !t.is_down) {
            *mdemand_carried.entry(t.demand).or_default() += t.carried_traffic;
            for l in t.links.iter() {
                *link_carried.entry(*l).or_default() += t.carried_traffic;
                *link_occupied.entry(*l).or_default() += t.occupied_capacity;
            }
        }

        // resources occupied by upper resources
        for r in self.resources.values() {
            for (base, occupied) in r.base_resources.iter() {
                *resource_occupied.entry(*base).or_default() += *occupied;
            }
        }

        for d in self.demands.values_mut() {
            d.carried_traffic = demand_carried.get(&d.id).copied().unwrap_or(0.0);
        }
        for d in self.multicast_demands.values_mut() {
            d.carried_traffic = mdemand_carried.get(&d.id).copied().unwrap_or(0.0);
        }
        for r in self.resources.values_mut() {
            r.occupied_capacity = resource_occupied.get(&r.id).copied().unwrap_or(0.0);
        }
        let demands = &self.demands;
        let mdemands = &self.multicast_demands;
        for l in self.links.values_mut() {
            l.carried_traffic = link_carried.get(&l.id).copied().unwrap_or(0.0);
            l.occupied_capacity = link_occupied.get(&l.id).copied().unwrap_or(0.0);
            match l.coupling {
                Some(LinkCoupling::Demand(d)) => {
                    if let Some(d) = demands.get(&d) {
                        l.capacity = d.carried_traffic;
                    }
                }
                Some(LinkCoupling::MulticastDemand(d)) => {
                    if let Some(d) = mdemands.get(&d) {
                        l.capacity = d.carried_traffic;
                    }
                }
                None => {}
            }
        }
    }

    /// Returns true if the link and both its end nodes are up.
    pub(crate) fn is_link_usable(&self, link: LinkId) -> bool {
        match self.links.get(&link) {
            Some(l) => {
                l.is_up
                    && self.nodes.get(&l.origin).map(|n| n.is_up).unwrap_or(false)
                    && self.nodes.get(&l.destination).map(|n| n.is_up).unwrap_or(false)
            }
            None => false,
        }
    }

    fn is_path_down(&self, path: &[PathElement]) -> bool {
        path.iter().any(|e| match e {
            PathElement::Link(l) => !self.is_link_usable(*l),
            PathElement::Resource(r) => self
                .resources
                .get(r)
                .and_then(|r| self.nodes.get(&r.host))
                .map(|n| !n.is_up)
                .unwrap_or(true),
        })
    }

    /// Compute the carried traffic and the traffic on each link of a demand routed by the given
    /// forwarding rules, taking failures into account.
    pub(crate) fn hop_by_hop_flows(
        &self,
        demand: DemandId,
        rules: &BTreeMap<LinkId, f64>,
    ) -> (f64, BTreeMap<LinkId, f64>) {
        let d = match self.demands.get(&demand) {
            Some(d) => d,
            None => return (0.0, BTreeMap::new()),
        };
        let ingress_up = self.nodes.get(&d.ingress).map(|n| n.is_up).unwrap_or(false);
        if !ingress_up || d.offered_traffic == 0.0 {
            return (0.0, BTreeMap::new());
        }

        // effective rules: only usable links, and nothing leaves the egress
        let effective: BTreeMap<LinkId, (NodeId, NodeId, f64)> = rules
            .iter()
            .filter(|(l, f)| **f > 0.0 && self.is_link_usable(**l))
            .filter_map(|(l, f)| self.links.get(l).map(|link| (*l, (link.origin, link.destination, *f))))
            .filter(|(_, (o, _, _))| *o != d.egress)
            .collect();

        // nodes reachable from the ingress
        let mut reachable: BTreeSet<NodeId> = BTreeSet::new();
        let mut stack = vec![d.ingress];
        reachable.insert(d.ingress);
        while let Some(n) = stack.pop() {
            for (o, t, _) in effective.values() {
                if *o == n && reachable.insert(*t) {
                    stack.push(*t);
                }
            }
        }
        let index: BTreeMap<NodeId, usize> =
            reachable.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let size = index.len();

        // build (I - P)^T
        let mut a = vec![vec![0.0; size]; size];
        for (i, row) in a.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        for (o, t, f) in effective.values() {
            if let (Some(i), Some(j)) = (index.get(o), index.get(t)) {
                a[*j][*i] -= *f;
            }
        }
        let mut b = vec![0.0; size];
        b[index[&d.ingress]] = d.offered_traffic;

        let x = match solve_linear_system(a, b) {
            Some(x) => x,
            None => {
                warn!("Traffic of {} cannot be computed: routing contains a closed cycle", demand);
                return (0.0, BTreeMap::new());
            }
        };

        let flows = effective
            .iter()
            .filter_map(|(l, (o, _, f))| index.get(o).map(|i| (*l, x[*i] * f)))
            .collect();
        let carried = index.get(&d.egress).map(|i| x[*i]).unwrap_or(0.0);
        (carried, flows)
    }

    // ********************
    // * Traffic Queries  *
    // ********************

    /// Returns true if the occupied capacity of the link exceeds its capacity.
    pub fn is_link_oversubscribed(&self, link: LinkId) -> Result<bool, NetworkModelError> {
        Ok(self.get_link(link)?.is_oversubscribed())
    }

    /// Returns true if the occupied capacity of the resource exceeds its capacity.
    pub fn is_resource_oversubscribed(&self, resource: ResourceId) -> Result<bool, NetworkModelError> {
        Ok(self.get_resource(resource)?.is_oversubscribed())
    }

    /// Returns all oversubscribed links of the layer
    pub fn get_links_oversubscribed(
        &self,
        layer: Option<LayerId>,
    ) -> Result<Vec<LinkId>, NetworkModelError> {
        Ok(self
            .get_links(layer)?
            .into_iter()
            .filter(|l| self.links[l].is_oversubscribed())
            .collect())
    }

    /// Returns true if some of the offered traffic of the demand is not carried.
    pub fn is_demand_blocked(&self, demand: DemandId) -> Result<bool, NetworkModelError> {
        Ok(self.get_demand(demand)?.is_blocked())
    }

    /// Returns the offered traffic of the demand that is not carried.
    pub fn get_blocked_traffic(&self, demand: DemandId) -> Result<f64, NetworkModelError> {
        Ok(self.get_demand(demand)?.blocked_traffic())
    }

    /// Returns the sum of the offered traffic of all unicast demands in the layer.
    pub fn get_total_offered_traffic(&self, layer: Option<LayerId>) -> Result<f64, NetworkModelError> {
        Ok(self.get_demands(layer)?.iter().map(|d| self.demands[d].offered_traffic).sum())
    }

    /// Returns the sum of the carried traffic of all unicast demands in the layer.
    pub fn get_total_carried_traffic(&self, layer: Option<LayerId>) -> Result<f64, NetworkModelError> {
        Ok(self.get_demands(layer)?.iter().map(|d| self.demands[d].carried_traffic).sum())
    }

    /// Returns the sum of the blocked traffic of all unicast demands in the layer.
    pub fn get_total_blocked_traffic(&self, layer: Option<LayerId>) -> Result<f64, NetworkModelError> {
        Ok(self.get_demands(layer)?.iter().map(|d| self.demands[d].blocked_traffic()).sum())
    }

    /// Returns the highest utilization of all links in the layer.
    pub fn get_max_link_utilization(&self, layer: Option<LayerId>) -> Result<f64, NetworkModelError> {
        Ok(self
            .get_links(layer)?
            .iter()
            .map(|l| self.links[l].utilization())
            .fold(0.0, f64::max))
    }
}

// ********************
// * Helper Functions *
// ********************

/// Solve the system `a x = b` with Gaussian elimination and partial pivoting. Returns `None` if
/// the matrix is singular.
pub(crate) fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let (pivot_row, pivot) = select_pivot_row(&a, col)?;
        if pivot.abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);
        for row in col + 1..n {
            let coefficient = a[row][col] / a[col][col];
            if coefficient == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= coefficient * a[col][k];
            }
            b[row] -= coefficient * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let sum: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - sum) / a[row][row];
    }
    Some(x)
}

/// Returns the row (at or below `col`) with the largest absolute value in the column.
fn select_pivot_row(a: &[Vec<f64>], col: usize) -> Option<(usize, f64)> {
    (col..a.len())
        .map(|row| (row, a[row][col]))
        .max_by(|(_, x), (_, y)| x.abs().partial_cmp(&y.abs()).unwrap_or(std::cmp::Ordering::Equal))
}
