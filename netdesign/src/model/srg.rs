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

//! # Shared Risk Groups
//!
//! A shared risk group (SRG) is a set of nodes and links failing together. This module manages
//! the members of the groups, and computes the impact of a failure across all coupled layers.

use crate::model::element::SharedRiskGroup;
use crate::model::network_model::NetworkModel;
use crate::model::propagation::InterLayerPropagationGraph;
use crate::model::types::*;

use log::*;
use std::collections::BTreeSet;

impl NetworkModel {
    /// Add a node to a shared risk group
    pub fn add_node_to_srg(&mut self, srg: SrgId, node: NodeId) -> Result<(), NetworkModelError> {
        self.get_srg(srg)?;
        self.get_node(node)?;
        self.add_node_to_srg_internal(srg, node);
        Ok(())
    }

    /// Add a link to a shared risk group
    pub fn add_link_to_srg(&mut self, srg: SrgId, link: LinkId) -> Result<(), NetworkModelError> {
        self.get_srg(srg)?;
        self.get_link(link)?;
        self.add_link_to_srg_internal(srg, link);
        Ok(())
    }

    pub(crate) fn add_node_to_srg_internal(&mut self, srg: SrgId, node: NodeId) {
        if let (Some(s), Some(n)) = (self.srgs.get_mut(&srg), self.nodes.get_mut(&node)) {
            s.nodes.insert(node);
            n.cache_srgs.insert(srg);
        }
    }

    pub(crate) fn add_link_to_srg_internal(&mut self, srg: SrgId, link: LinkId) {
        if let (Some(s), Some(l)) = (self.srgs.get_mut(&srg), self.links.get_mut(&link)) {
            s.links.insert(link);
            l.cache_srgs.insert(srg);
        }
    }

    /// Remove a node from a shared risk group
    pub fn remove_node_from_srg(&mut self, srg: SrgId, node: NodeId) -> Result<(), NetworkModelError> {
        if !self.srg_mut(srg)?.nodes.remove(&node) {
            return Err(NetworkModelError::ElementNotFound(node.into()));
        }
        self.node_mut(node)?.cache_srgs.remove(&srg);
        Ok(())
    }

    /// Remove a link from a shared risk group
    pub fn remove_link_from_srg(&mut self, srg: SrgId, link: LinkId) -> Result<(), NetworkModelError> {
        if !self.srg_mut(srg)?.links.remove(&link) {
            return Err(NetworkModelError::ElementNotFound(link.into()));
        }
        self.link_mut(link)?.cache_srgs.remove(&srg);
        Ok(())
    }

    /// Set the mean time to fail (in hours)
    pub fn set_srg_mttf_hours(&mut self, srg: SrgId, mttf_hours: f64) -> Result<(), NetworkModelError> {
        check_non_negative("MTTF", mttf_hours)?;
        self.srg_mut(srg)?.mttf_hours = mttf_hours;
        Ok(())
    }

    /// Set the mean time to repair (in hours)
    pub fn set_srg_mttr_hours(&mut self, srg: SrgId, mttr_hours: f64) -> Result<(), NetworkModelError> {
        check_non_negative("MTTR", mttr_hours)?;
        self.srg_mut(srg)?.mttr_hours = mttr_hours;
        Ok(())
    }

    /// Returns the fraction of time the shared risk group is up.
    pub fn get_srg_availability(&self, srg: SrgId) -> Result<f64, NetworkModelError> {
        Ok(self.get_srg(srg)?.availability())
    }

    /// Set all members of the shared risk group down.
    pub fn set_srg_as_down(&mut self, srg: SrgId) -> Result<(), NetworkModelError> {
        self.set_srg_failure_state(srg, false)
    }

    /// Set all members of the shared risk group up.
    pub fn set_srg_as_up(&mut self, srg: SrgId) -> Result<(), NetworkModelError> {
        self.set_srg_failure_state(srg, true)
    }

    fn set_srg_failure_state(&mut self, srg: SrgId, is_up: bool) -> Result<(), NetworkModelError> {
        let s = self.get_srg(srg)?.clone();
        for n in s.nodes.iter() {
            self.node_mut(*n)?.is_up = is_up;
        }
        for l in s.links.iter() {
            self.link_mut(*l)?.is_up = is_up;
        }
        debug!("Set {} {}", srg, if is_up { "up" } else { "down" });
        self.after_mutation();
        Ok(())
    }

    /// Returns true if the shared risk group has members, and all of them are down.
    pub fn is_srg_down(&self, srg: SrgId) -> Result<bool, NetworkModelError> {
        Ok(self.srg_members_down(self.get_srg(srg)?))
    }

    /// Returns all shared risk groups which are down
    pub fn get_srgs_down(&self) -> BTreeSet<SrgId> {
        self.srgs.values().filter(|s| self.srg_members_down(s)).map(|s| s.id).collect()
    }

    fn srg_members_down(&self, s: &SharedRiskGroup) -> bool {
        if s.nodes.is_empty() && s.links.is_empty() {
            return false;
        }
        s.nodes.iter().all(|n| self.nodes.get(n).map(|n| !n.is_up).unwrap_or(false))
            && s.links.iter().all(|l| self.links.get(l).map(|l| !l.is_up).unwrap_or(false))
    }

    /// Create one shared risk group per link of the layer. If `join_bidirectional` is set, both
    /// links of a bidirectional pair share the same group.
    pub fn add_srgs_per_link(
        &mut self,
        layer: Option<LayerId>,
        mttf_hours: f64,
        mttr_hours: f64,
        join_bidirectional: bool,
    ) -> Result<Vec<SrgId>, NetworkModelError> {
        check_non_negative("MTTF", mttf_hours)?;
        check_non_negative("MTTR", mttr_hours)?;
        let mut done: BTreeSet<LinkId> = BTreeSet::new();
        let mut result = Vec::new();
        for l in self.get_links(layer)? {
            if done.contains(&l) {
                continue;
            }
            let srg = self.insert_srg(None, mttf_hours, mttr_hours)?;
            self.add_link_to_srg_internal(srg, l);
            done.insert(l);
            if join_bidirectional {
                if let Some(pair) = self.get_link(l)?.bidirectional_pair {
                    self.add_link_to_srg_internal(srg, pair);
                    done.insert(pair);
                }
            }
            result.push(srg);
        }
        info!("Added {} shared risk groups", result.len());
        Ok(result)
    }

    /// Create one shared risk group per node.
    pub fn add_srgs_per_node(
        &mut self,
        mttf_hours: f64,
        mttr_hours: f64,
    ) -> Result<Vec<SrgId>, NetworkModelError> {
        check_non_negative("MTTF", mttf_hours)?;
        check_non_negative("MTTR", mttr_hours)?;
        let mut result = Vec::new();
        for n in self.get_nodes() {
            let srg = self.insert_srg(None, mttf_hours, mttr_hours)?;
            self.add_node_to_srg_internal(srg, n);
            result.push(srg);
        }
        Ok(result)
    }

    /// Returns the propagation graph of a failure of the shared risk group. It starts at the links
    /// of the group, all links connected to nodes of the group, and all demands with routes
    /// traversing resources hosted at nodes of the group.
    fn srg_failure_graph(&self, srg: SrgId) -> Result<InterLayerPropagationGraph, NetworkModelError> {
        let s = self.get_srg(srg)?;
        let mut links: BTreeSet<LinkId> = s.links.clone();
        let mut demands: BTreeSet<DemandId> = BTreeSet::new();
        for n in s.nodes.iter() {
            let node = self.get_node(*n)?;
            links.extend(node.cache_out_links.iter().copied());
            links.extend(node.cache_in_links.iter().copied());
            for r in node.cache_resources.iter() {
                for route in self.get_resource(*r)?.cache_traversing_routes.iter() {
                    demands.insert(self.get_route(*route)?.demand);
                }
            }
        }
        InterLayerPropagationGraph::new(self, &links, &demands, &BTreeSet::new(), true)
    }

    /// Returns all links (of all layers) affected by a failure of the shared risk group. This
    /// includes the upper layer links whose coupled demands are affected.
    pub fn get_srg_affected_links_all_layers(
        &self,
        srg: SrgId,
    ) -> Result<BTreeSet<LinkId>, NetworkModelError> {
        Ok(self.srg_failure_graph(srg)?.get_links_in_graph())
    }

    /// Returns all unicast demands (of all layers) affected by a failure of the shared risk group.
    pub fn get_srg_affected_demands_all_layers(
        &self,
        srg: SrgId,
    ) -> Result<BTreeSet<DemandId>, NetworkModelError> {
        Ok(self.srg_failure_graph(srg)?.get_demands_in_graph())
    }

    /// Returns all routes (of all layers) traversing a link or resource affected by a failure of
    /// the shared risk group.
    pub fn get_srg_affected_routes_all_layers(
        &self,
        srg: SrgId,
    ) -> Result<BTreeSet<RouteId>, NetworkModelError> {
        let mut result = BTreeSet::new();
        for l in self.get_srg_affected_links_all_layers(srg)? {
            result.extend(self.get_link(l)?.cache_traversing_routes.iter().copied());
        }
        for n in self.get_srg(srg)?.nodes.iter() {
            for r in self.get_node(*n)?.cache_resources.iter() {
                result.extend(self.get_resource(*r)?.cache_traversing_routes.iter().copied());
            }
        }
        Ok(result)
    }

    /// Returns all multicast trees (of all layers) traversing a link affected by a failure of the
    /// shared risk group.
    pub fn get_srg_affected_multicast_trees_all_layers(
        &self,
        srg: SrgId,
    ) -> Result<BTreeSet<MulticastTreeId>, NetworkModelError> {
        let mut result = BTreeSet::new();
        for l in self.get_srg_affected_links_all_layers(srg)? {
            result.extend(self.get_link(l)?.cache_traversing_trees.iter().copied());
        }
        Ok(result)
    }
}
