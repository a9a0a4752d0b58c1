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

//! # Top-level Network Model
//!
//! This module contains the root aggregate of the network design. The [`NetworkModel`] owns every
//! element in a table keyed by its identifier. Elements refer to each other only by their ids,
//! which makes cloning the model equivalent to a deep copy.
//!
//! ## Mutation
//!
//! Every mutating method first validates the entire change, and only then applies it. Hence, if
//! a method returns an `Err`, the model is left unchanged. After each mutation, the derived
//! traffic state (carried traffic, occupied capacity, capacity of coupled links) is recomputed
//! (see [`NetworkModel::refresh_traffic`]). Operations which cannot be validated up front (like
//! merging two designs) are executed on a copy, which is swapped in when everything succeeded.
//!
//! ## Identifiers
//!
//! All identifiers are unique within the model, regardless of the element kind. They are never
//! reused after the element was removed, except when merging another design, where the ids of the
//! other design are kept if they are still free.

use crate::model::element::*;
use crate::model::printer;
use crate::model::types::*;

use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the default layer, which is created together with a new model.
pub const DEFAULT_LAYER_NAME: &str = "Layer 0";

/// Units used for the capacities and traffic of new layers.
pub const DEFAULT_UNITS: &str = "Gbps";

macro_rules! element_lookup {
    ($get:ident, $get_mut:ident, $map:ident, $id:ty, $t:ty, $doc:expr) => {
        #[doc = $doc]
        pub fn $get(&self, id: $id) -> Result<&$t, NetworkModelError> {
            self.$map.get(&id).ok_or(NetworkModelError::ElementNotFound(id.into()))
        }

        pub(crate) fn $get_mut(&mut self, id: $id) -> Result<&mut $t, NetworkModelError> {
            self.$map.get_mut(&id).ok_or(NetworkModelError::ElementNotFound(id.into()))
        }
    };
}

/// # Network Model
/// Multi-layer network design, consisting of nodes (shared among all layers), and per layer
/// links, unicast and multicast demands, routes and multicast trees. Additionally, the model
/// contains resources hosted at nodes and shared risk groups.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    pub(crate) next_id: u64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) layers: BTreeMap<LayerId, NetworkLayer>,
    pub(crate) default_layer: LayerId,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) links: BTreeMap<LinkId, Link>,
    pub(crate) demands: BTreeMap<DemandId, Demand>,
    pub(crate) multicast_demands: BTreeMap<MulticastDemandId, MulticastDemand>,
    pub(crate) routes: BTreeMap<RouteId, Route>,
    pub(crate) multicast_trees: BTreeMap<MulticastTreeId, MulticastTree>,
    pub(crate) resources: BTreeMap<ResourceId, Resource>,
    pub(crate) srgs: BTreeMap<SrgId, SharedRiskGroup>,
    pub(crate) planning_domains: BTreeSet<String>,
}

impl Default for NetworkModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkModel {
    /// Generate an empty model, containing a single (default) layer with source routing.
    pub fn new() -> Self {
        let layer = LayerId(0);
        let mut layers = BTreeMap::new();
        layers.insert(
            layer,
            NetworkLayer::new(
                layer,
                DEFAULT_LAYER_NAME.to_string(),
                String::new(),
                DEFAULT_UNITS.to_string(),
                DEFAULT_UNITS.to_string(),
            ),
        );
        Self {
            next_id: 1,
            name: String::new(),
            description: String::new(),
            layers,
            default_layer: layer,
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            demands: BTreeMap::new(),
            multicast_demands: BTreeMap::new(),
            routes: BTreeMap::new(),
            multicast_trees: BTreeMap::new(),
            resources: BTreeMap::new(),
            srgs: BTreeMap::new(),
            planning_domains: BTreeSet::new(),
        }
    }

    /// Name of the design
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name of the design
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Description of the design
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description of the design
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    // *********************
    // * Element Lookup    *
    // *********************

    element_lookup!(get_node, node_mut, nodes, NodeId, Node, "Returns a reference to the node");
    element_lookup!(get_link, link_mut, links, LinkId, Link, "Returns a reference to the link");
    element_lookup!(
        get_demand,
        demand_mut,
        demands,
        DemandId,
        Demand,
        "Returns a reference to the unicast demand"
    );
    element_lookup!(
        get_multicast_demand,
        multicast_demand_mut,
        multicast_demands,
        MulticastDemandId,
        MulticastDemand,
        "Returns a reference to the multicast demand"
    );
    element_lookup!(get_route, route_mut, routes, RouteId, Route, "Returns a reference to the route");
    element_lookup!(
        get_multicast_tree,
        multicast_tree_mut,
        multicast_trees,
        MulticastTreeId,
        MulticastTree,
        "Returns a reference to the multicast tree"
    );
    element_lookup!(
        get_resource,
        resource_mut,
        resources,
        ResourceId,
        Resource,
        "Returns a reference to the resource"
    );
    element_lookup!(
        get_srg,
        srg_mut,
        srgs,
        SrgId,
        SharedRiskGroup,
        "Returns a reference to the shared risk group"
    );
    element_lookup!(
        get_layer,
        layer_mut,
        layers,
        LayerId,
        NetworkLayer,
        "Returns a reference to the layer"
    );

    /// Returns the layer, or the default layer if `None` is given. Fails if the layer does not
    /// exist.
    pub fn resolve_layer(&self, layer: Option<LayerId>) -> Result<LayerId, NetworkModelError> {
        match layer {
            Some(l) => self.get_layer(l).map(|l| l.id),
            None => Ok(self.default_layer),
        }
    }

    /// Returns the default layer
    pub fn get_default_layer(&self) -> LayerId {
        self.default_layer
    }

    /// Returns all layers, ordered by their id.
    pub fn get_layers(&self) -> Vec<LayerId> {
        self.layers.keys().copied().collect()
    }

    /// Returns the number of layers
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns all nodes, ordered by their id.
    pub fn get_nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Returns the number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns all links of the layer (or the default layer).
    pub fn get_links(&self, layer: Option<LayerId>) -> Result<Vec<LinkId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(self.get_layer(layer)?.cache_links.iter().copied().collect())
    }

    /// Returns all unicast demands of the layer (or the default layer).
    pub fn get_demands(&self, layer: Option<LayerId>) -> Result<Vec<DemandId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(self.get_layer(layer)?.cache_demands.iter().copied().collect())
    }

    /// Returns all multicast demands of the layer (or the default layer).
    pub fn get_multicast_demands(
        &self,
        layer: Option<LayerId>,
    ) -> Result<Vec<MulticastDemandId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(self.get_layer(layer)?.cache_multicast_demands.iter().copied().collect())
    }

    /// Returns all routes of the layer (or the default layer).
    pub fn get_routes(&self, layer: Option<LayerId>) -> Result<Vec<RouteId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(self.get_layer(layer)?.cache_routes.iter().copied().collect())
    }

    /// Returns all multicast trees of the layer (or the default layer).
    pub fn get_multicast_trees(
        &self,
        layer: Option<LayerId>,
    ) -> Result<Vec<MulticastTreeId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        Ok(self.get_layer(layer)?.cache_multicast_trees.iter().copied().collect())
    }

    /// Returns all resources
    pub fn get_resources(&self) -> Vec<ResourceId> {
        self.resources.keys().copied().collect()
    }

    /// Returns all resources of the given type
    pub fn get_resources_of_type(&self, resource_type: &str) -> Vec<ResourceId> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .map(|r| r.id)
            .collect()
    }

    /// Returns all shared risk groups
    pub fn get_srgs(&self) -> Vec<SrgId> {
        self.srgs.keys().copied().collect()
    }

    /// Returns the first node with the given name
    pub fn get_node_by_name(&self, name: impl AsRef<str>) -> Result<NodeId, NetworkModelError> {
        self.nodes
            .values()
            .find(|n| n.name == name.as_ref())
            .map(|n| n.id)
            .ok_or_else(|| NetworkModelError::NameNotFound(name.as_ref().to_string()))
    }

    /// Returns the first layer with the given name
    pub fn get_layer_by_name(&self, name: impl AsRef<str>) -> Result<LayerId, NetworkModelError> {
        self.layers
            .values()
            .find(|l| l.name == name.as_ref())
            .map(|l| l.id)
            .ok_or_else(|| NetworkModelError::NameNotFound(name.as_ref().to_string()))
    }

    /// Returns all links from `origin` to `destination` in the given layer.
    pub fn get_node_pair_links(
        &self,
        origin: NodeId,
        destination: NodeId,
        layer: Option<LayerId>,
    ) -> Result<Vec<LinkId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        self.get_node(destination)?;
        Ok(self
            .get_node(origin)?
            .cache_out_links
            .iter()
            .filter(|l| self.links[*l].destination == destination && self.links[*l].layer == layer)
            .copied()
            .collect())
    }

    /// Returns all unicast demands from `ingress` to `egress` in the given layer.
    pub fn get_node_pair_demands(
        &self,
        ingress: NodeId,
        egress: NodeId,
        layer: Option<LayerId>,
    ) -> Result<Vec<DemandId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        self.get_node(egress)?;
        Ok(self
            .get_node(ingress)?
            .cache_out_demands
            .iter()
            .filter(|d| self.demands[*d].egress == egress && self.demands[*d].layer == layer)
            .copied()
            .collect())
    }

    /// Returns the kind of element that uses the raw identifier.
    pub fn get_network_element(&self, id: u64) -> Result<ElementId, NetworkModelError> {
        if self.nodes.contains_key(&NodeId(id)) {
            Ok(NodeId(id).into())
        } else if self.links.contains_key(&LinkId(id)) {
            Ok(LinkId(id).into())
        } else if self.demands.contains_key(&DemandId(id)) {
            Ok(DemandId(id).into())
        } else if self.multicast_demands.contains_key(&MulticastDemandId(id)) {
            Ok(MulticastDemandId(id).into())
        } else if self.routes.contains_key(&RouteId(id)) {
            Ok(RouteId(id).into())
        } else if self.multicast_trees.contains_key(&MulticastTreeId(id)) {
            Ok(MulticastTreeId(id).into())
        } else if self.resources.contains_key(&ResourceId(id)) {
            Ok(ResourceId(id).into())
        } else if self.srgs.contains_key(&SrgId(id)) {
            Ok(SrgId(id).into())
        } else if self.layers.contains_key(&LayerId(id)) {
            Ok(LayerId(id).into())
        } else {
            Err(NetworkModelError::UnknownElementId(id))
        }
    }

    /// Returns true if the element exists in the model
    pub fn contains(&self, element: ElementId) -> bool {
        self.element_data(element).is_ok()
    }

    /// Allocate a new identifier. If a preferred id is given and still free, it is used.
    fn allocate_id(&mut self, preferred: Option<u64>) -> u64 {
        match preferred {
            Some(id) if self.get_network_element(id).is_err() => {
                self.next_id = self.next_id.max(id + 1);
                id
            }
            _ => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        }
    }

    /// Recompute the derived state after a mutation.
    pub(crate) fn after_mutation(&mut self) {
        self.refresh_traffic();
        #[cfg(feature = "check-consistency")]
        self.assert_consistency();
    }

    #[cfg(feature = "check-consistency")]
    fn assert_consistency(&self) {
        if let Err(e) = self.check_caches_consistency() {
            panic!("Network model became inconsistent: {}", e);
        }
    }

    // ********************
    // * Layer Management *
    // ********************

    /// Add a new layer with source routing, and return its id.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        link_capacity_units: impl Into<String>,
        demand_traffic_units: impl Into<String>,
    ) -> LayerId {
        let id = LayerId(self.allocate_id(None));
        let layer = NetworkLayer::new(
            id,
            name.into(),
            description.into(),
            link_capacity_units.into(),
            demand_traffic_units.into(),
        );
        debug!("Add layer {}", layer.name);
        self.layers.insert(id, layer);
        id
    }

    /// Remove a layer together with all its links, demands, routes and trees. The last layer of
    /// the model cannot be removed.
    pub fn remove_layer(&mut self, layer: LayerId) -> Result<(), NetworkModelError> {
        self.get_layer(layer)?;
        if self.layers.len() == 1 {
            return Err(NetworkModelError::CannotRemoveLastLayer);
        }
        debug!("Remove layer {}", printer::element(self, layer.into())?);
        self.remove_layer_internal(layer);
        self.after_mutation();
        Ok(())
    }

    /// Change the default layer, which is used whenever no layer is given.
    pub fn set_default_layer(&mut self, layer: LayerId) -> Result<(), NetworkModelError> {
        self.get_layer(layer)?;
        self.default_layer = layer;
        Ok(())
    }

    /// Set the name of a layer
    pub fn set_layer_name(
        &mut self,
        layer: LayerId,
        name: impl Into<String>,
    ) -> Result<(), NetworkModelError> {
        self.layer_mut(layer)?.name = name.into();
        Ok(())
    }

    /// Set the description of a layer
    pub fn set_layer_description(
        &mut self,
        layer: LayerId,
        description: impl Into<String>,
    ) -> Result<(), NetworkModelError> {
        self.layer_mut(layer)?.description = description.into();
        Ok(())
    }

    /// Set the units of the link capacities and the demand traffic of a layer
    pub fn set_layer_units(
        &mut self,
        layer: LayerId,
        link_capacity_units: impl Into<String>,
        demand_traffic_units: impl Into<String>,
    ) -> Result<(), NetworkModelError> {
        let l = self.layer_mut(layer)?;
        l.link_capacity_units = link_capacity_units.into();
        l.demand_traffic_units = demand_traffic_units.into();
        Ok(())
    }

    // *********
    // * Nodes *
    // *********

    /// Add a new node at the given coordinates, and return its id.
    pub fn add_node<S: Into<String>>(&mut self, name: S, x: f64, y: f64) -> NodeId {
        let id = self.insert_node(None, name.into(), x, y);
        debug!("Add node {}", self.nodes[&id].name);
        id
    }

    pub(crate) fn insert_node(
        &mut self,
        preferred: Option<u64>,
        name: String,
        x: f64,
        y: f64,
    ) -> NodeId {
        let id = NodeId(self.allocate_id(preferred));
        self.nodes.insert(id, Node::new(id, name, x, y));
        id
    }

    /// Set the name of a node
    pub fn set_node_name(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
    ) -> Result<(), NetworkModelError> {
        self.node_mut(node)?.name = name.into();
        Ok(())
    }

    /// Set the coordinates of a node
    pub fn set_node_xy(&mut self, node: NodeId, x: f64, y: f64) -> Result<(), NetworkModelError> {
        let n = self.node_mut(node)?;
        n.x = x;
        n.y = y;
        Ok(())
    }

    /// Set (or clear) the site name of a node
    pub fn set_node_site(
        &mut self,
        node: NodeId,
        site: Option<String>,
    ) -> Result<(), NetworkModelError> {
        self.node_mut(node)?.site = site;
        Ok(())
    }

    /// Set the population of a node
    pub fn set_node_population(
        &mut self,
        node: NodeId,
        population: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("population", population)?;
        self.node_mut(node)?.population = population;
        Ok(())
    }

    /// Set (or clear) the icon URL of a node in the given layer
    pub fn set_node_icon(
        &mut self,
        node: NodeId,
        layer: LayerId,
        url: Option<String>,
    ) -> Result<(), NetworkModelError> {
        self.get_layer(layer)?;
        let n = self.node_mut(node)?;
        match url {
            Some(url) => n.icons.insert(layer, url),
            None => n.icons.remove(&layer),
        };
        Ok(())
    }

    /// Set the failure state of a node. A failed node makes all links starting or ending at it,
    /// and all resources hosted at it unable to carry traffic.
    pub fn set_node_failure_state(
        &mut self,
        node: NodeId,
        is_up: bool,
    ) -> Result<(), NetworkModelError> {
        self.node_mut(node)?.is_up = is_up;
        debug!("Set node {} {}", printer::node_name(self, node)?, if is_up { "up" } else { "down" });
        self.after_mutation();
        Ok(())
    }

    /// Remove a node, and all links, demands, multicast demands and resources connected to it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), NetworkModelError> {
        debug!("Remove node {}", printer::node_name(self, node)?);
        self.remove_node_internal(node);
        self.after_mutation();
        Ok(())
    }

    // *********
    // * Links *
    // *********

    /// Add a new link in the given layer (or the default layer), and return its id.
    pub fn add_link(
        &mut self,
        origin: NodeId,
        destination: NodeId,
        capacity: f64,
        length_km: f64,
        propagation_speed_km_per_s: f64,
        layer: Option<LayerId>,
    ) -> Result<LinkId, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let id = self.insert_link(
            None,
            layer,
            origin,
            destination,
            capacity,
            length_km,
            propagation_speed_km_per_s,
        )?;
        debug!("Add link {}", printer::link(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    /// Add two links in opposite directions with the same properties, forming a bidirectional
    /// pair.
    pub fn add_link_bidirectional(
        &mut self,
        a: NodeId,
        b: NodeId,
        capacity: f64,
        length_km: f64,
        propagation_speed_km_per_s: f64,
        layer: Option<LayerId>,
    ) -> Result<(LinkId, LinkId), NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        self.validate_link(layer, a, b, capacity, length_km, propagation_speed_km_per_s)?;
        let ab = self.insert_link(None, layer, a, b, capacity, length_km, propagation_speed_km_per_s)?;
        let ba = self.insert_link(None, layer, b, a, capacity, length_km, propagation_speed_km_per_s)?;
        self.link_mut(ab)?.bidirectional_pair = Some(ba);
        self.link_mut(ba)?.bidirectional_pair = Some(ab);
        debug!("Add bidirectional link {}", printer::link(self, ab)?);
        self.after_mutation();
        Ok((ab, ba))
    }

    fn validate_link(
        &self,
        layer: LayerId,
        origin: NodeId,
        destination: NodeId,
        capacity: f64,
        length_km: f64,
        propagation_speed_km_per_s: f64,
    ) -> Result<(), NetworkModelError> {
        self.get_layer(layer)?;
        self.get_node(origin)?;
        self.get_node(destination)?;
        if origin == destination {
            return Err(NetworkModelError::SelfLoop(origin));
        }
        check_non_negative("link capacity", capacity)?;
        check_non_negative("link length", length_km)?;
        if propagation_speed_km_per_s.is_nan() || propagation_speed_km_per_s <= 0.0 {
            return Err(NetworkModelError::InvalidValue(
                "propagation speed",
                propagation_speed_km_per_s,
            ));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_link(
        &mut self,
        preferred: Option<u64>,
        layer: LayerId,
        origin: NodeId,
        destination: NodeId,
        capacity: f64,
        length_km: f64,
        propagation_speed_km_per_s: f64,
    ) -> Result<LinkId, NetworkModelError> {
        self.validate_link(layer, origin, destination, capacity, length_km, propagation_speed_km_per_s)?;
        let id = LinkId(self.allocate_id(preferred));
        self.links.insert(
            id,
            Link {
                id,
                data: ElementData::default(),
                layer,
                origin,
                destination,
                capacity,
                length_km,
                propagation_speed_km_per_s,
                is_up: true,
                coupling: None,
                bidirectional_pair: None,
                carried_traffic: 0.0,
                occupied_capacity: 0.0,
                cache_traversing_routes: BTreeSet::new(),
                cache_traversing_trees: BTreeSet::new(),
                cache_srgs: BTreeSet::new(),
            },
        );
        self.node_mut(origin)?.cache_out_links.insert(id);
        self.node_mut(destination)?.cache_in_links.insert(id);
        self.layer_mut(layer)?.cache_links.insert(id);
        Ok(id)
    }

    /// Set the capacity of a link. The capacity of a coupled link follows the carried traffic of
    /// the coupled demand, and cannot be set.
    pub fn set_link_capacity(&mut self, link: LinkId, capacity: f64) -> Result<(), NetworkModelError> {
        check_non_negative("link capacity", capacity)?;
        let l = self.link_mut(link)?;
        if l.coupling.is_some() {
            return Err(NetworkModelError::CapacityIsCoupled(link));
        }
        l.capacity = capacity;
        self.after_mutation();
        Ok(())
    }

    /// Set the length of a link in km
    pub fn set_link_length_km(&mut self, link: LinkId, length_km: f64) -> Result<(), NetworkModelError> {
        check_non_negative("link length", length_km)?;
        self.link_mut(link)?.length_km = length_km;
        Ok(())
    }

    /// Set the propagation speed of a link in km/s
    pub fn set_link_propagation_speed(
        &mut self,
        link: LinkId,
        speed_km_per_s: f64,
    ) -> Result<(), NetworkModelError> {
        if speed_km_per_s.is_nan() || speed_km_per_s <= 0.0 {
            return Err(NetworkModelError::InvalidValue("propagation speed", speed_km_per_s));
        }
        self.link_mut(link)?.propagation_speed_km_per_s = speed_km_per_s;
        Ok(())
    }

    /// Set the failure state of a link.
    pub fn set_link_failure_state(&mut self, link: LinkId, is_up: bool) -> Result<(), NetworkModelError> {
        self.link_mut(link)?.is_up = is_up;
        debug!("Set link {} {}", printer::link(self, link)?, if is_up { "up" } else { "down" });
        self.after_mutation();
        Ok(())
    }

    /// Make two existing links a bidirectional pair. Both links must be in the same layer, connect
    /// the same nodes in opposite directions, and must not be paired yet.
    pub fn set_links_bidirectional_pair(&mut self, a: LinkId, b: LinkId) -> Result<(), NetworkModelError> {
        let la = self.get_link(a)?;
        let lb = self.get_link(b)?;
        if la.layer != lb.layer
            || la.origin != lb.destination
            || la.destination != lb.origin
            || la.bidirectional_pair.is_some()
            || lb.bidirectional_pair.is_some()
        {
            return Err(NetworkModelError::InvalidBidirectionalPair(a.into(), b.into()));
        }
        self.link_mut(a)?.bidirectional_pair = Some(b);
        self.link_mut(b)?.bidirectional_pair = Some(a);
        Ok(())
    }

    /// Remove a link, together with all routes and multicast trees traversing it. If the link is
    /// coupled, the coupling is broken.
    pub fn remove_link(&mut self, link: LinkId) -> Result<(), NetworkModelError> {
        debug!("Remove link {}", printer::link(self, link)?);
        self.remove_link_internal(link);
        self.after_mutation();
        Ok(())
    }

    // *******************
    // * Unicast Demands *
    // *******************

    /// Add a new unicast demand in the given layer (or the default layer).
    pub fn add_demand(
        &mut self,
        ingress: NodeId,
        egress: NodeId,
        offered_traffic: f64,
        recovery_type: RecoveryType,
        layer: Option<LayerId>,
    ) -> Result<DemandId, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let id = self.insert_demand(None, layer, ingress, egress, offered_traffic, recovery_type, Vec::new())?;
        debug!("Add demand {}", printer::demand(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    /// Add two demands in opposite directions with the same offered traffic, forming a
    /// bidirectional pair.
    pub fn add_demand_bidirectional(
        &mut self,
        a: NodeId,
        b: NodeId,
        offered_traffic: f64,
        recovery_type: RecoveryType,
        layer: Option<LayerId>,
    ) -> Result<(DemandId, DemandId), NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        self.validate_demand(layer, a, b, offered_traffic, &[])?;
        let ab = self.insert_demand(None, layer, a, b, offered_traffic, recovery_type, Vec::new())?;
        let ba = self.insert_demand(None, layer, b, a, offered_traffic, recovery_type, Vec::new())?;
        self.demand_mut(ab)?.bidirectional_pair = Some(ba);
        self.demand_mut(ba)?.bidirectional_pair = Some(ab);
        debug!("Add bidirectional demand {}", printer::demand(self, ab)?);
        self.after_mutation();
        Ok((ab, ba))
    }

    /// Add a new unicast demand, whose routes must traverse resources of the given types in the
    /// given order. The layer must use source routing.
    pub fn add_service_chain_demand(
        &mut self,
        ingress: NodeId,
        egress: NodeId,
        offered_traffic: f64,
        recovery_type: RecoveryType,
        service_chain_types: Vec<String>,
        layer: Option<LayerId>,
    ) -> Result<DemandId, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let id = self.insert_demand(
            None,
            layer,
            ingress,
            egress,
            offered_traffic,
            recovery_type,
            service_chain_types,
        )?;
        debug!("Add service chain demand {}", printer::demand(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    fn validate_demand(
        &self,
        layer: LayerId,
        ingress: NodeId,
        egress: NodeId,
        offered_traffic: f64,
        service_chain_types: &[String],
    ) -> Result<(), NetworkModelError> {
        let l = self.get_layer(layer)?;
        self.get_node(ingress)?;
        self.get_node(egress)?;
        if ingress == egress {
            return Err(NetworkModelError::SelfLoop(ingress));
        }
        check_non_negative("offered traffic", offered_traffic)?;
        if !service_chain_types.is_empty() && l.routing_type != RoutingType::SourceRouting {
            return Err(NetworkModelError::WrongRoutingType(layer, RoutingType::SourceRouting));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_demand(
        &mut self,
        preferred: Option<u64>,
        layer: LayerId,
        ingress: NodeId,
        egress: NodeId,
        offered_traffic: f64,
        recovery_type: RecoveryType,
        service_chain_types: Vec<String>,
    ) -> Result<DemandId, NetworkModelError> {
        self.validate_demand(layer, ingress, egress, offered_traffic, &service_chain_types)?;
        let id = DemandId(self.allocate_id(preferred));
        self.demands.insert(
            id,
            Demand {
                id,
                data: ElementData::default(),
                layer,
                ingress,
                egress,
                offered_traffic,
                recovery_type,
                service_chain_types,
                coupled_upper_link: None,
                bidirectional_pair: None,
                carried_traffic: 0.0,
                cache_routes: BTreeSet::new(),
            },
        );
        self.node_mut(ingress)?.cache_out_demands.insert(id);
        self.node_mut(egress)?.cache_in_demands.insert(id);
        self.layer_mut(layer)?.cache_demands.insert(id);
        Ok(id)
    }

    /// Set the offered traffic of a demand
    pub fn set_demand_offered_traffic(
        &mut self,
        demand: DemandId,
        offered_traffic: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("offered traffic", offered_traffic)?;
        self.demand_mut(demand)?.offered_traffic = offered_traffic;
        self.after_mutation();
        Ok(())
    }

    /// Set the intended recovery type of a demand
    pub fn set_demand_recovery_type(
        &mut self,
        demand: DemandId,
        recovery_type: RecoveryType,
    ) -> Result<(), NetworkModelError> {
        self.demand_mut(demand)?.recovery_type = recovery_type;
        Ok(())
    }

    /// Change the sequence of resource types of a demand. All existing routes of the demand must
    /// be valid for the new sequence.
    pub fn set_demand_service_chain_types(
        &mut self,
        demand: DemandId,
        service_chain_types: Vec<String>,
    ) -> Result<(), NetworkModelError> {
        let d = self.get_demand(demand)?;
        if !service_chain_types.is_empty()
            && self.get_layer(d.layer)?.routing_type != RoutingType::SourceRouting
        {
            return Err(NetworkModelError::ServiceChainInHopByHop(demand));
        }
        let mut tmp = d.clone();
        tmp.service_chain_types = service_chain_types;
        for r in d.cache_routes.iter() {
            self.validate_path_for(&tmp, &self.get_route(*r)?.path)?;
        }
        self.demand_mut(demand)?.service_chain_types = tmp.service_chain_types;
        Ok(())
    }

    /// Make two existing demands a bidirectional pair.
    pub fn set_demands_bidirectional_pair(
        &mut self,
        a: DemandId,
        b: DemandId,
    ) -> Result<(), NetworkModelError> {
        let da = self.get_demand(a)?;
        let db = self.get_demand(b)?;
        if da.layer != db.layer
            || da.ingress != db.egress
            || da.egress != db.ingress
            || da.bidirectional_pair.is_some()
            || db.bidirectional_pair.is_some()
        {
            return Err(NetworkModelError::InvalidBidirectionalPair(a.into(), b.into()));
        }
        self.demand_mut(a)?.bidirectional_pair = Some(b);
        self.demand_mut(b)?.bidirectional_pair = Some(a);
        Ok(())
    }

    /// Remove a demand, together with its routes and forwarding rules. If the demand is coupled,
    /// the coupling is broken.
    pub fn remove_demand(&mut self, demand: DemandId) -> Result<(), NetworkModelError> {
        debug!("Remove demand {}", printer::demand(self, demand)?);
        self.remove_demand_internal(demand);
        self.after_mutation();
        Ok(())
    }

    // *********************
    // * Multicast Demands *
    // *********************

    /// Add a new multicast demand in the given layer (or the default layer).
    pub fn add_multicast_demand(
        &mut self,
        ingress: NodeId,
        egress: BTreeSet<NodeId>,
        offered_traffic: f64,
        layer: Option<LayerId>,
    ) -> Result<MulticastDemandId, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let id = self.insert_multicast_demand(None, layer, ingress, egress, offered_traffic)?;
        debug!("Add multicast demand {}", printer::multicast_demand(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    pub(crate) fn insert_multicast_demand(
        &mut self,
        preferred: Option<u64>,
        layer: LayerId,
        ingress: NodeId,
        egress: BTreeSet<NodeId>,
        offered_traffic: f64,
    ) -> Result<MulticastDemandId, NetworkModelError> {
        self.get_layer(layer)?;
        self.get_node(ingress)?;
        for e in egress.iter() {
            self.get_node(*e)?;
        }
        if egress.contains(&ingress) {
            return Err(NetworkModelError::SelfLoop(ingress));
        }
        if egress.is_empty() {
            return Err(NetworkModelError::InvalidValue("number of egress nodes", 0.0));
        }
        check_non_negative("offered traffic", offered_traffic)?;
        let id = MulticastDemandId(self.allocate_id(preferred));
        for e in egress.iter() {
            self.node_mut(*e)?.cache_in_multicast_demands.insert(id);
        }
        self.node_mut(ingress)?.cache_out_multicast_demands.insert(id);
        self.layer_mut(layer)?.cache_multicast_demands.insert(id);
        self.multicast_demands.insert(
            id,
            MulticastDemand {
                id,
                data: ElementData::default(),
                layer,
                ingress,
                egress,
                offered_traffic,
                coupled_upper_links: BTreeMap::new(),
                carried_traffic: 0.0,
                cache_trees: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    /// Set the offered traffic of a multicast demand
    pub fn set_multicast_demand_offered_traffic(
        &mut self,
        demand: MulticastDemandId,
        offered_traffic: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("offered traffic", offered_traffic)?;
        self.multicast_demand_mut(demand)?.offered_traffic = offered_traffic;
        self.after_mutation();
        Ok(())
    }

    /// Remove a multicast demand together with its trees. If the demand is coupled, the coupling
    /// is broken.
    pub fn remove_multicast_demand(
        &mut self,
        demand: MulticastDemandId,
    ) -> Result<(), NetworkModelError> {
        debug!("Remove multicast demand {}", printer::multicast_demand(self, demand)?);
        self.remove_multicast_demand_internal(demand);
        self.after_mutation();
        Ok(())
    }

    // **********
    // * Routes *
    // **********

    /// Add a route over the given links, occupying the same capacity in every link.
    pub fn add_route(
        &mut self,
        demand: DemandId,
        carried_traffic: f64,
        occupied_capacity: f64,
        links: &[LinkId],
    ) -> Result<RouteId, NetworkModelError> {
        let path: Vec<PathElement> = links.iter().map(|l| PathElement::Link(*l)).collect();
        let occupation = vec![occupied_capacity; path.len()];
        let id = self.insert_route(None, demand, carried_traffic, path, occupation)?;
        debug!("Add route {}", printer::route(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    /// Add a route traversing links and resources. The occupation vector contains the capacity
    /// occupied in every element of the path (in the same order).
    pub fn add_service_chain(
        &mut self,
        demand: DemandId,
        carried_traffic: f64,
        occupation: Vec<f64>,
        path: Vec<PathElement>,
    ) -> Result<RouteId, NetworkModelError> {
        let id = self.insert_route(None, demand, carried_traffic, path, occupation)?;
        debug!("Add service chain {}", printer::route(self, id)?);
        self.after_mutation();
        Ok(id)
    }

    fn validate_route(
        &self,
        demand: DemandId,
        carried_traffic: f64,
        path: &[PathElement],
        occupation: &[f64],
    ) -> Result<(), NetworkModelError> {
        let d = self.get_demand(demand)?;
        if self.get_layer(d.layer)?.routing_type != RoutingType::SourceRouting {
            return Err(NetworkModelError::WrongRoutingType(d.layer, RoutingType::SourceRouting));
        }
        check_non_negative("carried traffic", carried_traffic)?;
        if occupation.len() != path.len() {
            return Err(NetworkModelError::OccupationLengthMismatch(path.len(), occupation.len()));
        }
        for o in occupation {
            check_non_negative("occupied capacity", *o)?;
        }
        self.validate_path_for(d, path)
    }

    pub(crate) fn insert_route(
        &mut self,
        preferred: Option<u64>,
        demand: DemandId,
        carried_traffic: f64,
        path: Vec<PathElement>,
        occupation: Vec<f64>,
    ) -> Result<RouteId, NetworkModelError> {
        self.validate_route(demand, carried_traffic, &path, &occupation)?;
        let layer = self.get_demand(demand)?.layer;
        let id = RouteId(self.allocate_id(preferred));
        self.register_route_path(id, &path);
        self.demand_mut(demand)?.cache_routes.insert(id);
        self.layer_mut(layer)?.cache_routes.insert(id);
        self.routes.insert(
            id,
            Route {
                id,
                data: ElementData::default(),
                layer,
                demand,
                initial_state: RouteState {
                    path: path.clone(),
                    occupation: occupation.clone(),
                    carried_traffic,
                },
                path,
                occupation,
                carried_traffic,
                backup_routes: Vec::new(),
                is_down: false,
                cache_primary_routes: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    /// Checks that the path is a walk from the ingress to the egress of the demand, traversing the
    /// resource types of its service chain in order.
    pub fn validate_path(&self, demand: DemandId, path: &[PathElement]) -> Result<(), NetworkModelError> {
        self.validate_path_for(self.get_demand(demand)?, path)
    }

    pub(crate) fn validate_path_for(
        &self,
        d: &Demand,
        path: &[PathElement],
    ) -> Result<(), NetworkModelError> {
        if path.is_empty() {
            return Err(NetworkModelError::InvalidPath(d.id, "the path is empty".to_string()));
        }
        let mut current = d.ingress;
        let mut chain = d.service_chain_types.iter();
        for elem in path {
            match *elem {
                PathElement::Link(l) => {
                    let link = self.get_link(l)?;
                    if link.layer != d.layer {
                        return Err(NetworkModelError::LayerMismatch(d.id.into(), l.into()));
                    }
                    if link.origin != current {
                        return Err(NetworkModelError::InvalidPath(
                            d.id,
                            format!("{} does not start at {}", l, current),
                        ));
                    }
                    current = link.destination;
                }
                PathElement::Resource(r) => {
                    let res = self.get_resource(r)?;
                    if res.host != current {
                        return Err(NetworkModelError::ResourceHostMismatch(r, current));
                    }
                    match chain.next() {
                        Some(t) if *t == res.resource_type => {}
                        _ => return Err(NetworkModelError::ServiceChainMismatch(d.id)),
                    }
                }
            }
        }
        if current != d.egress {
            Err(NetworkModelError::InvalidPath(
                d.id,
                format!("the path ends at {} instead of {}", current, d.egress),
            ))
        } else if chain.next().is_some() {
            Err(NetworkModelError::ServiceChainMismatch(d.id))
        } else {
            Ok(())
        }
    }

    fn register_route_path(&mut self, route: RouteId, path: &[PathElement]) {
        for elem in path {
            match elem {
                PathElement::Link(l) => {
                    if let Some(link) = self.links.get_mut(l) {
                        link.cache_traversing_routes.insert(route);
                    }
                }
                PathElement::Resource(r) => {
                    if let Some(res) = self.resources.get_mut(r) {
                        res.cache_traversing_routes.insert(route);
                    }
                }
            }
        }
    }

    fn unregister_route_path(&mut self, route: RouteId, path: &[PathElement]) {
        for elem in path {
            match elem {
                PathElement::Link(l) => {
                    if let Some(link) = self.links.get_mut(l) {
                        link.cache_traversing_routes.remove(&route);
                    }
                }
                PathElement::Resource(r) => {
                    if let Some(res) = self.resources.get_mut(r) {
                        res.cache_traversing_routes.remove(&route);
                    }
                }
            }
        }
    }

    /// Change the path of a route, together with the capacity it occupies in every element.
    pub fn set_route_path(
        &mut self,
        route: RouteId,
        path: Vec<PathElement>,
        occupation: Vec<f64>,
    ) -> Result<(), NetworkModelError> {
        let r = self.get_route(route)?;
        self.validate_route(r.demand, r.carried_traffic, &path, &occupation)?;
        self.replace_route_path(route, path, occupation)?;
        debug!("Change path of route {}", printer::route(self, route)?);
        self.after_mutation();
        Ok(())
    }

    fn replace_route_path(
        &mut self,
        route: RouteId,
        path: Vec<PathElement>,
        occupation: Vec<f64>,
    ) -> Result<(), NetworkModelError> {
        let old_path = std::mem::take(&mut self.route_mut(route)?.path);
        self.unregister_route_path(route, &old_path);
        self.register_route_path(route, &path);
        let r = self.route_mut(route)?;
        r.path = path;
        r.occupation = occupation;
        Ok(())
    }

    /// Set the carried traffic of a route, and the capacity it occupies in every element of its
    /// path.
    pub fn set_route_carried_traffic(
        &mut self,
        route: RouteId,
        carried_traffic: f64,
        occupied_capacity: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("carried traffic", carried_traffic)?;
        check_non_negative("occupied capacity", occupied_capacity)?;
        let r = self.route_mut(route)?;
        r.carried_traffic = carried_traffic;
        r.occupation = vec![occupied_capacity; r.path.len()];
        self.after_mutation();
        Ok(())
    }

    /// Set the carried traffic of a route, and the capacity it occupies in each element of its
    /// path individually.
    pub fn set_route_carried_traffic_and_occupation(
        &mut self,
        route: RouteId,
        carried_traffic: f64,
        occupation: Vec<f64>,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("carried traffic", carried_traffic)?;
        let r = self.get_route(route)?;
        if occupation.len() != r.path.len() {
            return Err(NetworkModelError::OccupationLengthMismatch(r.path.len(), occupation.len()));
        }
        for o in occupation.iter() {
            check_non_negative("occupied capacity", *o)?;
        }
        let r = self.route_mut(route)?;
        r.carried_traffic = carried_traffic;
        r.occupation = occupation;
        self.after_mutation();
        Ok(())
    }

    /// Returns the path, occupation and carried traffic the route had when it was created.
    pub fn get_route_initial_state(&self, route: RouteId) -> Result<&RouteState, NetworkModelError> {
        Ok(&self.get_route(route)?.initial_state)
    }

    /// Restore the path, occupation and carried traffic the route had when it was created. Fails
    /// if some element of the initial path does not exist anymore.
    pub fn revert_route_to_initial_state(&mut self, route: RouteId) -> Result<(), NetworkModelError> {
        let r = self.get_route(route)?;
        let initial = r.initial_state.clone();
        self.validate_route(r.demand, initial.carried_traffic, &initial.path, &initial.occupation)?;
        self.replace_route_path(route, initial.path, initial.occupation)?;
        self.route_mut(route)?.carried_traffic = initial.carried_traffic;
        debug!("Revert route {}", printer::route(self, route)?);
        self.after_mutation();
        Ok(())
    }

    /// Designate `backup` as a backup route of `primary`. Both routes must carry the same demand,
    /// the primary route must not be a backup itself, and the backup route must not have backup
    /// routes.
    pub fn add_backup_route(&mut self, primary: RouteId, backup: RouteId) -> Result<(), NetworkModelError> {
        let p = self.get_route(primary)?;
        let b = self.get_route(backup)?;
        if primary == backup
            || p.demand != b.demand
            || p.is_backup_route()
            || b.has_backup_routes()
            || p.backup_routes.contains(&backup)
        {
            return Err(NetworkModelError::InvalidBackupRoute(primary, backup));
        }
        self.route_mut(primary)?.backup_routes.push(backup);
        self.route_mut(backup)?.cache_primary_routes.insert(primary);
        debug!("Add {} as backup of {}", backup, primary);
        self.after_mutation();
        Ok(())
    }

    /// Remove `backup` from the backup routes of `primary`. The backup route itself is kept.
    pub fn remove_backup_route(
        &mut self,
        primary: RouteId,
        backup: RouteId,
    ) -> Result<(), NetworkModelError> {
        self.get_route(backup)?;
        if !self.get_route(primary)?.backup_routes.contains(&backup) {
            return Err(NetworkModelError::InvalidBackupRoute(primary, backup));
        }
        self.route_mut(primary)?.backup_routes.retain(|r| *r != backup);
        self.route_mut(backup)?.cache_primary_routes.remove(&primary);
        self.after_mutation();
        Ok(())
    }

    /// Remove a route. If the route is a backup of some other route, it is removed from its list
    /// of backup routes. If the route has backup routes, they are kept, but their backup
    /// relationship is removed.
    pub fn remove_route(&mut self, route: RouteId) -> Result<(), NetworkModelError> {
        debug!("Remove route {}", printer::route(self, route)?);
        self.remove_route_internal(route);
        self.after_mutation();
        Ok(())
    }

    /// Returns the total length of the route in km.
    pub fn get_route_length_km(&self, route: RouteId) -> Result<f64, NetworkModelError> {
        let mut length = 0.0;
        for l in self.get_route(route)?.links() {
            length += self.get_link(l)?.length_km;
        }
        Ok(length)
    }

    /// Returns the propagation delay of the route in milliseconds, including the processing delay
    /// of the traversed resources.
    pub fn get_route_propagation_delay_ms(&self, route: RouteId) -> Result<f64, NetworkModelError> {
        self.get_path_propagation_delay_ms(&self.get_route(route)?.path)
    }

    /// Returns the propagation delay of a path in milliseconds, including the processing delay of
    /// the traversed resources.
    pub fn get_path_propagation_delay_ms(&self, path: &[PathElement]) -> Result<f64, NetworkModelError> {
        let mut delay = 0.0;
        for elem in path {
            delay += match elem {
                PathElement::Link(l) => self.get_link(*l)?.propagation_delay_ms(),
                PathElement::Resource(r) => self.get_resource(*r)?.processing_delay_ms,
            };
        }
        Ok(delay)
    }

    /// Returns the sequence of nodes traversed by the route, including the ingress and egress.
    pub fn get_route_sequence_of_nodes(&self, route: RouteId) -> Result<Vec<NodeId>, NetworkModelError> {
        let r = self.get_route(route)?;
        let mut nodes = vec![self.get_demand(r.demand)?.ingress];
        for l in r.links() {
            nodes.push(self.get_link(l)?.destination);
        }
        Ok(nodes)
    }

    /// Returns the worst case propagation delay of the demand, which is the maximum delay over all
    /// routes (or, in hop-by-hop routing, over all paths with a positive splitting factor).
    pub fn get_demand_worst_case_propagation_delay_ms(
        &self,
        demand: DemandId,
    ) -> Result<f64, NetworkModelError> {
        let d = self.get_demand(demand)?;
        let mut worst: f64 = 0.0;
        match self.get_layer(d.layer)?.routing_type {
            RoutingType::SourceRouting => {
                for r in d.cache_routes.iter() {
                    worst = worst.max(self.get_route_propagation_delay_ms(*r)?);
                }
            }
            RoutingType::HopByHopRouting => {
                for (path, _) in self.demand_paths_from_forwarding_rules(demand)? {
                    let path: Vec<PathElement> = path.into_iter().map(PathElement::Link).collect();
                    worst = worst.max(self.get_path_propagation_delay_ms(&path)?);
                }
            }
        }
        Ok(worst)
    }

    // *******************
    // * Multicast Trees *
    // *******************

    /// Add a multicast tree carrying the multicast demand, occupying the same capacity in every
    /// link.
    pub fn add_multicast_tree(
        &mut self,
        demand: MulticastDemandId,
        carried_traffic: f64,
        occupied_capacity: f64,
        links: BTreeSet<LinkId>,
    ) -> Result<MulticastTreeId, NetworkModelError> {
        let id = self.insert_multicast_tree(None, demand, carried_traffic, occupied_capacity, links)?;
        debug!("Add multicast tree {}", printer::element(self, id.into())?);
        self.after_mutation();
        Ok(id)
    }

    pub(crate) fn insert_multicast_tree(
        &mut self,
        preferred: Option<u64>,
        demand: MulticastDemandId,
        carried_traffic: f64,
        occupied_capacity: f64,
        links: BTreeSet<LinkId>,
    ) -> Result<MulticastTreeId, NetworkModelError> {
        check_non_negative("carried traffic", carried_traffic)?;
        check_non_negative("occupied capacity", occupied_capacity)?;
        self.validate_tree(demand, &links)?;
        let layer = self.get_multicast_demand(demand)?.layer;
        let id = MulticastTreeId(self.allocate_id(preferred));
        for l in links.iter() {
            self.link_mut(*l)?.cache_traversing_trees.insert(id);
        }
        self.multicast_demand_mut(demand)?.cache_trees.insert(id);
        self.layer_mut(layer)?.cache_multicast_trees.insert(id);
        self.multicast_trees.insert(
            id,
            MulticastTree {
                id,
                data: ElementData::default(),
                layer,
                demand,
                initial_links: links.clone(),
                links,
                carried_traffic,
                occupied_capacity,
                is_down: false,
            },
        );
        Ok(id)
    }

    /// Checks that the links form a tree in the layer of the multicast demand, rooted at its
    /// ingress node, and reaching all of its egress nodes.
    pub fn validate_tree(
        &self,
        demand: MulticastDemandId,
        links: &BTreeSet<LinkId>,
    ) -> Result<(), NetworkModelError> {
        let d = self.get_multicast_demand(demand)?;
        let invalid = |msg: String| NetworkModelError::InvalidMulticastTree(demand, msg);
        let mut parent: BTreeMap<NodeId, LinkId> = BTreeMap::new();
        for l in links.iter() {
            let link = self.get_link(*l)?;
            if link.layer != d.layer {
                return Err(NetworkModelError::LayerMismatch(demand.into(), (*l).into()));
            }
            if link.destination == d.ingress {
                return Err(invalid(format!("{} enters the ingress node", l)));
            }
            if parent.insert(link.destination, *l).is_some() {
                return Err(invalid(format!("{} is entered twice", link.destination)));
            }
        }
        for node in parent.keys() {
            let mut current = *node;
            let mut steps = 0;
            while current != d.ingress {
                let link = parent
                    .get(&current)
                    .ok_or_else(|| invalid(format!("{} is not connected to the ingress", node)))?;
                current = self.get_link(*link)?.origin;
                steps += 1;
                if steps > parent.len() {
                    return Err(invalid("the links contain a cycle".to_string()));
                }
            }
        }
        match d.egress.iter().find(|e| !parent.contains_key(e)) {
            Some(e) => Err(invalid(format!("{} is not reached", e))),
            None => Ok(()),
        }
    }

    /// Returns the sequence of links of the tree from the ingress to the given egress node.
    pub fn get_multicast_tree_path_to_egress(
        &self,
        tree: MulticastTreeId,
        egress: NodeId,
    ) -> Result<Vec<LinkId>, NetworkModelError> {
        let t = self.get_multicast_tree(tree)?;
        let ingress = self.get_multicast_demand(t.demand)?.ingress;
        let parent: BTreeMap<NodeId, LinkId> = t
            .links
            .iter()
            .filter_map(|l| self.links.get(l).map(|link| (link.destination, *l)))
            .collect();
        let mut path = Vec::new();
        let mut current = egress;
        while current != ingress {
            let l = parent.get(&current).ok_or_else(|| {
                NetworkModelError::InvalidMulticastTree(t.demand, format!("{} is not reached", egress))
            })?;
            path.push(*l);
            current = self.get_link(*l)?.origin;
            if path.len() > parent.len() {
                return Err(NetworkModelError::InvalidMulticastTree(
                    t.demand,
                    "the links contain a cycle".to_string(),
                ));
            }
        }
        path.reverse();
        Ok(path)
    }

    /// Change the links of a multicast tree.
    pub fn set_multicast_tree_links(
        &mut self,
        tree: MulticastTreeId,
        links: BTreeSet<LinkId>,
    ) -> Result<(), NetworkModelError> {
        let demand = self.get_multicast_tree(tree)?.demand;
        self.validate_tree(demand, &links)?;
        self.replace_tree_links(tree, links)?;
        self.after_mutation();
        Ok(())
    }

    fn replace_tree_links(
        &mut self,
        tree: MulticastTreeId,
        links: BTreeSet<LinkId>,
    ) -> Result<(), NetworkModelError> {
        let old = std::mem::take(&mut self.multicast_tree_mut(tree)?.links);
        for l in old.iter() {
            if let Some(link) = self.links.get_mut(l) {
                link.cache_traversing_trees.remove(&tree);
            }
        }
        for l in links.iter() {
            self.link_mut(*l)?.cache_traversing_trees.insert(tree);
        }
        self.multicast_tree_mut(tree)?.links = links;
        Ok(())
    }

    /// Set the carried traffic of a multicast tree, and the capacity it occupies in each link.
    pub fn set_multicast_tree_carried_traffic(
        &mut self,
        tree: MulticastTreeId,
        carried_traffic: f64,
        occupied_capacity: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("carried traffic", carried_traffic)?;
        check_non_negative("occupied capacity", occupied_capacity)?;
        let t = self.multicast_tree_mut(tree)?;
        t.carried_traffic = carried_traffic;
        t.occupied_capacity = occupied_capacity;
        self.after_mutation();
        Ok(())
    }

    /// Restore the links the tree had when it was created.
    pub fn revert_multicast_tree_to_initial_state(
        &mut self,
        tree: MulticastTreeId,
    ) -> Result<(), NetworkModelError> {
        let t = self.get_multicast_tree(tree)?;
        let initial = t.initial_links.clone();
        self.validate_tree(t.demand, &initial)?;
        self.replace_tree_links(tree, initial)?;
        self.after_mutation();
        Ok(())
    }

    /// Remove a multicast tree
    pub fn remove_multicast_tree(&mut self, tree: MulticastTreeId) -> Result<(), NetworkModelError> {
        debug!("Remove multicast tree {}", printer::element(self, tree.into())?);
        self.remove_multicast_tree_internal(tree);
        self.after_mutation();
        Ok(())
    }

    // *************
    // * Resources *
    // *************

    /// Add a resource hosted at a node. The base resources must be hosted at the same node, and map
    /// to the capacity this resource occupies in them.
    #[allow(clippy::too_many_arguments)]
    pub fn add_resource(
        &mut self,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        host: NodeId,
        capacity: f64,
        capacity_units: impl Into<String>,
        base_resources: BTreeMap<ResourceId, f64>,
        processing_delay_ms: f64,
    ) -> Result<ResourceId, NetworkModelError> {
        let id = self.insert_resource(
            None,
            resource_type.into(),
            name.into(),
            host,
            capacity,
            capacity_units.into(),
            base_resources,
            processing_delay_ms,
        )?;
        debug!("Add resource {}", printer::element(self, id.into())?);
        self.after_mutation();
        Ok(id)
    }

    fn validate_base_resources(
        &self,
        host: NodeId,
        base_resources: &BTreeMap<ResourceId, f64>,
    ) -> Result<(), NetworkModelError> {
        for (r, occupation) in base_resources.iter() {
            if self.get_resource(*r)?.host != host {
                return Err(NetworkModelError::ResourceHostMismatch(*r, host));
            }
            check_non_negative("base resource occupation", *occupation)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_resource(
        &mut self,
        preferred: Option<u64>,
        resource_type: String,
        name: String,
        host: NodeId,
        capacity: f64,
        capacity_units: String,
        base_resources: BTreeMap<ResourceId, f64>,
        processing_delay_ms: f64,
    ) -> Result<ResourceId, NetworkModelError> {
        self.get_node(host)?;
        check_non_negative("resource capacity", capacity)?;
        check_non_negative("processing delay", processing_delay_ms)?;
        self.validate_base_resources(host, &base_resources)?;
        let id = ResourceId(self.allocate_id(preferred));
        for base in base_resources.keys() {
            self.resource_mut(*base)?.cache_upper_resources.insert(id);
        }
        self.node_mut(host)?.cache_resources.insert(id);
        self.resources.insert(
            id,
            Resource {
                id,
                data: ElementData::default(),
                resource_type,
                name,
                host,
                capacity,
                capacity_units,
                base_resources,
                processing_delay_ms,
                occupied_capacity: 0.0,
                cache_traversing_routes: BTreeSet::new(),
                cache_upper_resources: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    /// Set the capacity of a resource, and optionally the capacity it occupies in its base
    /// resources. The set of base resources can be changed, but never to include the resource
    /// itself or any resource occupying capacity in it.
    pub fn set_resource_capacity(
        &mut self,
        resource: ResourceId,
        capacity: f64,
        base_resources: Option<BTreeMap<ResourceId, f64>>,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("resource capacity", capacity)?;
        let r = self.get_resource(resource)?;
        if let Some(base) = base_resources.as_ref() {
            self.validate_base_resources(r.host, base)?;
            let uppers = self.upper_resources_recursive(resource);
            if let Some(b) = base.keys().find(|b| **b == resource || uppers.contains(b)) {
                return Err(NetworkModelError::ResourceHostMismatch(*b, r.host));
            }
        }
        if let Some(base) = base_resources {
            let old = std::mem::take(&mut self.resource_mut(resource)?.base_resources);
            for b in old.keys() {
                if let Some(b) = self.resources.get_mut(b) {
                    b.cache_upper_resources.remove(&resource);
                }
            }
            for b in base.keys() {
                self.resource_mut(*b)?.cache_upper_resources.insert(resource);
            }
            self.resource_mut(resource)?.base_resources = base;
        }
        self.resource_mut(resource)?.capacity = capacity;
        self.after_mutation();
        Ok(())
    }

    /// Set the processing delay of a resource
    pub fn set_resource_processing_delay(
        &mut self,
        resource: ResourceId,
        processing_delay_ms: f64,
    ) -> Result<(), NetworkModelError> {
        check_non_negative("processing delay", processing_delay_ms)?;
        self.resource_mut(resource)?.processing_delay_ms = processing_delay_ms;
        Ok(())
    }

    /// All resources that (transitively) occupy capacity in this resource.
    pub(crate) fn upper_resources_recursive(&self, resource: ResourceId) -> BTreeSet<ResourceId> {
        let mut result = BTreeSet::new();
        let mut stack = vec![resource];
        while let Some(r) = stack.pop() {
            if let Some(res) = self.resources.get(&r) {
                for upper in res.cache_upper_resources.iter() {
                    if result.insert(*upper) {
                        stack.push(*upper);
                    }
                }
            }
        }
        result
    }

    /// Remove a resource, all resources occupying capacity in it, and all routes traversing any of
    /// them.
    pub fn remove_resource(&mut self, resource: ResourceId) -> Result<(), NetworkModelError> {
        debug!("Remove resource {}", printer::element(self, resource.into())?);
        self.remove_resource_internal(resource);
        self.after_mutation();
        Ok(())
    }

    // **********************
    // * Shared Risk Groups *
    // **********************

    /// Add an empty shared risk group with the given mean time to fail and to repair (in hours).
    pub fn add_srg(&mut self, mttf_hours: f64, mttr_hours: f64) -> Result<SrgId, NetworkModelError> {
        let id = self.insert_srg(None, mttf_hours, mttr_hours)?;
        debug!("Add {}", id);
        Ok(id)
    }

    pub(crate) fn insert_srg(
        &mut self,
        preferred: Option<u64>,
        mttf_hours: f64,
        mttr_hours: f64,
    ) -> Result<SrgId, NetworkModelError> {
        check_non_negative("MTTF", mttf_hours)?;
        check_non_negative("MTTR", mttr_hours)?;
        let id = SrgId(self.allocate_id(preferred));
        self.srgs.insert(
            id,
            SharedRiskGroup {
                id,
                data: ElementData::default(),
                nodes: BTreeSet::new(),
                links: BTreeSet::new(),
                mttf_hours,
                mttr_hours,
            },
        );
        Ok(id)
    }

    /// Remove a shared risk group. Its members are not affected.
    pub fn remove_srg(&mut self, srg: SrgId) -> Result<(), NetworkModelError> {
        self.get_srg(srg)?;
        debug!("Remove {}", srg);
        self.remove_srg_internal(srg);
        Ok(())
    }

    // *****************************
    // * Generic Element Functions *
    // *****************************

    pub(crate) fn element_data(&self, element: ElementId) -> Result<&ElementData, NetworkModelError> {
        Ok(match element {
            ElementId::Node(x) => &self.get_node(x)?.data,
            ElementId::Link(x) => &self.get_link(x)?.data,
            ElementId::Demand(x) => &self.get_demand(x)?.data,
            ElementId::MulticastDemand(x) => &self.get_multicast_demand(x)?.data,
            ElementId::Route(x) => &self.get_route(x)?.data,
            ElementId::MulticastTree(x) => &self.get_multicast_tree(x)?.data,
            ElementId::Resource(x) => &self.get_resource(x)?.data,
            ElementId::Srg(x) => &self.get_srg(x)?.data,
            ElementId::Layer(x) => &self.get_layer(x)?.data,
        })
    }

    pub(crate) fn element_data_mut(
        &mut self,
        element: ElementId,
    ) -> Result<&mut ElementData, NetworkModelError> {
        Ok(match element {
            ElementId::Node(x) => &mut self.node_mut(x)?.data,
            ElementId::Link(x) => &mut self.link_mut(x)?.data,
            ElementId::Demand(x) => &mut self.demand_mut(x)?.data,
            ElementId::MulticastDemand(x) => &mut self.multicast_demand_mut(x)?.data,
            ElementId::Route(x) => &mut self.route_mut(x)?.data,
            ElementId::MulticastTree(x) => &mut self.multicast_tree_mut(x)?.data,
            ElementId::Resource(x) => &mut self.resource_mut(x)?.data,
            ElementId::Srg(x) => &mut self.srg_mut(x)?.data,
            ElementId::Layer(x) => &mut self.layer_mut(x)?.data,
        })
    }

    /// Set an attribute of any element, replacing the old value.
    pub fn set_attribute(
        &mut self,
        element: ElementId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), NetworkModelError> {
        self.element_data_mut(element)?.attributes.insert(key.into(), value.into());
        Ok(())
    }

    /// Returns the value of an attribute of any element
    pub fn get_attribute(
        &self,
        element: ElementId,
        key: &str,
    ) -> Result<Option<&str>, NetworkModelError> {
        Ok(self.element_data(element)?.attributes.get(key).map(|s| s.as_str()))
    }

    /// Returns all attributes of any element
    pub fn get_attributes(
        &self,
        element: ElementId,
    ) -> Result<&BTreeMap<String, String>, NetworkModelError> {
        Ok(&self.element_data(element)?.attributes)
    }

    /// Remove an attribute of any element, returning its old value.
    pub fn remove_attribute(
        &mut self,
        element: ElementId,
        key: &str,
    ) -> Result<Option<String>, NetworkModelError> {
        Ok(self.element_data_mut(element)?.attributes.remove(key))
    }

    /// Add a tag to any element. Returns false if the element already had this tag.
    pub fn add_tag(
        &mut self,
        element: ElementId,
        tag: impl Into<String>,
    ) -> Result<bool, NetworkModelError> {
        Ok(self.element_data_mut(element)?.tags.insert(tag.into()))
    }

    /// Remove a tag from any element. Returns false if the element did not have the tag.
    pub fn remove_tag(&mut self, element: ElementId, tag: &str) -> Result<bool, NetworkModelError> {
        Ok(self.element_data_mut(element)?.tags.remove(tag))
    }

    /// Returns true if the element has the tag
    pub fn has_tag(&self, element: ElementId, tag: &str) -> Result<bool, NetworkModelError> {
        Ok(self.element_data(element)?.tags.contains(tag))
    }

    /// Returns all elements with the given tag
    pub fn get_elements_with_tag(&self, tag: &str) -> Vec<ElementId> {
        self.all_elements()
            .into_iter()
            .filter(|e| self.element_data(*e).map(|d| d.tags.contains(tag)).unwrap_or(false))
            .collect()
    }

    /// Returns the id of every element in the model
    pub fn all_elements(&self) -> Vec<ElementId> {
        let mut result: Vec<ElementId> = Vec::new();
        result.extend(self.layers.keys().map(|x| ElementId::from(*x)));
        result.extend(self.nodes.keys().map(|x| ElementId::from(*x)));
        result.extend(self.links.keys().map(|x| ElementId::from(*x)));
        result.extend(self.demands.keys().map(|x| ElementId::from(*x)));
        result.extend(self.multicast_demands.keys().map(|x| ElementId::from(*x)));
        result.extend(self.routes.keys().map(|x| ElementId::from(*x)));
        result.extend(self.multicast_trees.keys().map(|x| ElementId::from(*x)));
        result.extend(self.resources.keys().map(|x| ElementId::from(*x)));
        result.extend(self.srgs.keys().map(|x| ElementId::from(*x)));
        result
    }

    /// Remove any element, cascading to all elements depending on it.
    pub fn remove(&mut self, element: ElementId) -> Result<(), NetworkModelError> {
        match element {
            ElementId::Node(x) => self.remove_node(x),
            ElementId::Link(x) => self.remove_link(x),
            ElementId::Demand(x) => self.remove_demand(x),
            ElementId::MulticastDemand(x) => self.remove_multicast_demand(x),
            ElementId::Route(x) => self.remove_route(x),
            ElementId::MulticastTree(x) => self.remove_multicast_tree(x),
            ElementId::Resource(x) => self.remove_resource(x),
            ElementId::Srg(x) => self.remove_srg(x),
            ElementId::Layer(x) => self.remove_layer(x),
        }
    }

    // ********************
    // * Planning Domains *
    // ********************

    /// Add a planning domain. Returns false if it already existed.
    pub fn add_planning_domain(&mut self, domain: impl Into<String>) -> bool {
        self.planning_domains.insert(domain.into())
    }

    /// Remove a planning domain from the model and all its nodes.
    pub fn remove_planning_domain(&mut self, domain: &str) -> Result<(), NetworkModelError> {
        if !self.planning_domains.remove(domain) {
            return Err(NetworkModelError::NameNotFound(domain.to_string()));
        }
        for n in self.nodes.values_mut() {
            n.planning_domains.remove(domain);
        }
        Ok(())
    }

    /// Returns all planning domains
    pub fn get_planning_domains(&self) -> &BTreeSet<String> {
        &self.planning_domains
    }

    /// Add a node to an existing planning domain.
    pub fn add_node_to_planning_domain(
        &mut self,
        node: NodeId,
        domain: &str,
    ) -> Result<(), NetworkModelError> {
        if !self.planning_domains.contains(domain) {
            return Err(NetworkModelError::NameNotFound(domain.to_string()));
        }
        self.node_mut(node)?.planning_domains.insert(domain.to_string());
        Ok(())
    }

    /// Remove a node from a planning domain.
    pub fn remove_node_from_planning_domain(
        &mut self,
        node: NodeId,
        domain: &str,
    ) -> Result<(), NetworkModelError> {
        if !self.node_mut(node)?.planning_domains.remove(domain) {
            return Err(NetworkModelError::NameNotFound(domain.to_string()));
        }
        Ok(())
    }

    /// Returns all nodes of a planning domain
    pub fn get_planning_domain_nodes(&self, domain: &str) -> Result<Vec<NodeId>, NetworkModelError> {
        if !self.planning_domains.contains(domain) {
            return Err(NetworkModelError::NameNotFound(domain.to_string()));
        }
        Ok(self.nodes.values().filter(|n| n.planning_domains.contains(domain)).map(|n| n.id).collect())
    }

    // ****************
    // * Bulk Setters *
    // ****************

    /// Set the offered traffic of many demands at once.
    pub fn set_demands_offered_traffic(
        &mut self,
        offered_traffic: &BTreeMap<DemandId, f64>,
    ) -> Result<(), NetworkModelError> {
        for (d, h) in offered_traffic.iter() {
            self.get_demand(*d)?;
            check_non_negative("offered traffic", *h)?;
        }
        for (d, h) in offered_traffic.iter() {
            self.demand_mut(*d)?.offered_traffic = *h;
        }
        self.after_mutation();
        Ok(())
    }

    /// Returns the offered traffic between every pair of nodes in the layer, summed over all
    /// unicast demands. Pairs without demands are not part of the matrix.
    pub fn get_traffic_matrix(
        &self,
        layer: Option<LayerId>,
    ) -> Result<BTreeMap<(NodeId, NodeId), f64>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let mut matrix = BTreeMap::new();
        for d in self.get_layer(layer)?.cache_demands.iter() {
            let d = self.get_demand(*d)?;
            *matrix.entry((d.ingress, d.egress)).or_insert(0.0) += d.offered_traffic;
        }
        Ok(matrix)
    }

    /// Replace all unicast demands of the layer by one demand for every positive entry of the
    /// traffic matrix. Returns the new demands.
    pub fn set_traffic_matrix(
        &mut self,
        matrix: &BTreeMap<(NodeId, NodeId), f64>,
        layer: Option<LayerId>,
    ) -> Result<Vec<DemandId>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        for ((a, b), h) in matrix.iter() {
            self.get_node(*a)?;
            self.get_node(*b)?;
            check_non_negative("offered traffic", *h)?;
            if a == b && *h > 0.0 {
                return Err(NetworkModelError::SelfLoop(*a));
            }
        }
        for d in self.get_demands(Some(layer))? {
            self.remove_demand_internal(d);
        }
        let mut result = Vec::new();
        for ((a, b), h) in matrix.iter().filter(|(_, h)| **h > 0.0) {
            result.push(self.insert_demand(
                None,
                layer,
                *a,
                *b,
                *h,
                RecoveryType::default(),
                Vec::new(),
            )?);
        }
        info!("Set traffic matrix with {} demands", result.len());
        self.after_mutation();
        Ok(result)
    }

    /// Set the failure state of many links and nodes at once. Elements are first set up, and then
    /// set down.
    pub fn set_links_and_nodes_failure_state(
        &mut self,
        links_to_set_up: &[LinkId],
        links_to_set_down: &[LinkId],
        nodes_to_set_up: &[NodeId],
        nodes_to_set_down: &[NodeId],
    ) -> Result<(), NetworkModelError> {
        for l in links_to_set_up.iter().chain(links_to_set_down.iter()) {
            self.get_link(*l)?;
        }
        for n in nodes_to_set_up.iter().chain(nodes_to_set_down.iter()) {
            self.get_node(*n)?;
        }
        for l in links_to_set_up {
            self.link_mut(*l)?.is_up = true;
        }
        for n in nodes_to_set_up {
            self.node_mut(*n)?.is_up = true;
        }
        for l in links_to_set_down {
            self.link_mut(*l)?.is_up = false;
        }
        for n in nodes_to_set_down {
            self.node_mut(*n)?.is_up = false;
        }
        self.after_mutation();
        Ok(())
    }

    /// Set the failure state of all nodes
    pub fn set_all_nodes_failure_state(&mut self, is_up: bool) {
        for n in self.nodes.values_mut() {
            n.is_up = is_up;
        }
        self.after_mutation();
    }

    /// Set the failure state of all links of a layer
    pub fn set_all_links_failure_state(
        &mut self,
        is_up: bool,
        layer: Option<LayerId>,
    ) -> Result<(), NetworkModelError> {
        for l in self.get_links(layer)? {
            self.link_mut(l)?.is_up = is_up;
        }
        self.after_mutation();
        Ok(())
    }

    /// Returns all nodes that are failed
    pub fn get_nodes_down(&self) -> Vec<NodeId> {
        self.nodes.values().filter(|n| !n.is_up).map(|n| n.id).collect()
    }

    /// Returns all links of the layer that are failed
    pub fn get_links_down(&self, layer: Option<LayerId>) -> Result<Vec<LinkId>, NetworkModelError> {
        Ok(self.get_links(layer)?.into_iter().filter(|l| !self.links[l].is_up).collect())
    }

    /// Remove all links of a layer
    pub fn remove_all_links(&mut self, layer: Option<LayerId>) -> Result<(), NetworkModelError> {
        for l in self.get_links(layer)? {
            self.remove_link_internal(l);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove all unicast demands of a layer
    pub fn remove_all_demands(&mut self, layer: Option<LayerId>) -> Result<(), NetworkModelError> {
        for d in self.get_demands(layer)? {
            self.remove_demand_internal(d);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove all multicast demands of a layer
    pub fn remove_all_multicast_demands(
        &mut self,
        layer: Option<LayerId>,
    ) -> Result<(), NetworkModelError> {
        for d in self.get_multicast_demands(layer)? {
            self.remove_multicast_demand_internal(d);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove all routes of a layer
    pub fn remove_all_routes(&mut self, layer: Option<LayerId>) -> Result<(), NetworkModelError> {
        for r in self.get_routes(layer)? {
            self.remove_route_internal(r);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove all multicast trees of a layer
    pub fn remove_all_multicast_trees(
        &mut self,
        layer: Option<LayerId>,
    ) -> Result<(), NetworkModelError> {
        for t in self.get_multicast_trees(layer)? {
            self.remove_multicast_tree_internal(t);
        }
        self.after_mutation();
        Ok(())
    }

    /// Remove all resources
    pub fn remove_all_resources(&mut self) {
        for r in self.get_resources() {
            self.remove_resource_internal(r);
        }
        self.after_mutation();
    }

    /// Remove all shared risk groups
    pub fn remove_all_srgs(&mut self) {
        for s in self.get_srgs() {
            self.remove_srg_internal(s);
        }
    }

    /// Remove everything from the model, leaving a single empty layer. Identifiers of removed
    /// elements are not reused.
    pub fn reset(&mut self) {
        let next_id = self.next_id;
        *self = Self::new();
        self.layers.clear();
        self.next_id = next_id;
        let layer = LayerId(self.allocate_id(None));
        self.layers.insert(
            layer,
            NetworkLayer::new(
                layer,
                DEFAULT_LAYER_NAME.to_string(),
                String::new(),
                DEFAULT_UNITS.to_string(),
                DEFAULT_UNITS.to_string(),
            ),
        );
        self.default_layer = layer;
        info!("Reset the network model");
    }

    // ***********************
    // * Whole Model Changes *
    // ***********************

    /// Returns a deep copy of the model, with all identifiers preserved.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Replace the content of this model by a deep copy of the other model.
    pub fn copy_from(&mut self, other: &NetworkModel) {
        *self = other.clone();
    }

    /// Replace the content of this model by the other model, taking ownership of its content.
    pub fn assign_from(&mut self, other: NetworkModel) {
        *self = other;
    }

    /// Returns true if both models are structurally equal, including all identifiers, attributes
    /// and derived values.
    pub fn is_deep_copy(&self, other: &NetworkModel) -> bool {
        self == other
    }

    /// Restrict the design to the given set of nodes. Nodes which the coupled links between them
    /// rely on in lower layers are kept as well (see [`InterLayerPropagationGraph`]). All other
    /// nodes are removed, together with everything depending on them.
    ///
    /// [`InterLayerPropagationGraph`]: crate::model::InterLayerPropagationGraph
    pub fn restrict_design(&mut self, nodes: &BTreeSet<NodeId>) -> Result<(), NetworkModelError> {
        for n in nodes.iter() {
            self.get_node(*n)?;
        }
        let keep = self.nodes_needed_by_coupling(nodes)?;
        let to_remove: Vec<NodeId> =
            self.nodes.keys().filter(|n| !keep.contains(n)).copied().collect();
        info!(
            "Restrict design to {} nodes ({} kept for coupled links), removing {}",
            nodes.len(),
            keep.len() - nodes.len(),
            to_remove.len()
        );
        for n in to_remove {
            self.remove_node_internal(n);
        }
        self.after_mutation();
        Ok(())
    }

    /// Extend the set of nodes by all nodes reachable downwards from the coupled links between
    /// them, until the set no longer changes.
    fn nodes_needed_by_coupling(
        &self,
        nodes: &BTreeSet<NodeId>,
    ) -> Result<BTreeSet<NodeId>, NetworkModelError> {
        let mut keep = nodes.clone();
        loop {
            let coupled: BTreeSet<LinkId> = self
                .links
                .values()
                .filter(|l| l.coupling.is_some())
                .filter(|l| keep.contains(&l.origin) && keep.contains(&l.destination))
                .map(|l| l.id)
                .collect();
            let ilpg = self.get_inter_layer_propagation_graph(
                &coupled,
                &BTreeSet::new(),
                &BTreeSet::new(),
                false,
            )?;
            let mut next = keep.clone();
            for l in ilpg.get_links_in_graph() {
                let link = self.get_link(l)?;
                next.insert(link.origin);
                next.insert(link.destination);
            }
            for d in ilpg.get_demands_in_graph() {
                let demand = self.get_demand(d)?;
                next.insert(demand.ingress);
                next.insert(demand.egress);
            }
            for (d, e) in ilpg.get_multicast_demand_flows_in_graph() {
                next.insert(self.get_multicast_demand(d)?.ingress);
                next.insert(e);
            }
            if next.len() == keep.len() {
                return Ok(keep);
            }
            keep = next;
        }
    }

    /// Add all elements of the other design to this design. Layers and nodes are matched by their
    /// name. All other elements are added, keeping their identifier if it is still free in this
    /// design. If the merge fails, this design is left unchanged.
    pub fn merge_into_this_design(&mut self, other: &NetworkModel) -> Result<(), NetworkModelError> {
        let mut merged = self.clone();

        let mut layer_map: BTreeMap<LayerId, LayerId> = BTreeMap::new();
        for (id, layer) in other.layers.iter() {
            let target = match merged.layers.values().find(|l| l.name == layer.name) {
                Some(existing) if existing.routing_type != layer.routing_type => {
                    return Err(NetworkModelError::MergeConflict(format!(
                        "layer {} uses {:?} and {:?}",
                        layer.name, existing.routing_type, layer.routing_type
                    )))
                }
                Some(existing) => existing.id,
                None => {
                    let new_id = LayerId(merged.allocate_id(Some(id.0)));
                    let mut new_layer = NetworkLayer::new(
                        new_id,
                        layer.name.clone(),
                        layer.description.clone(),
                        layer.link_capacity_units.clone(),
                        layer.demand_traffic_units.clone(),
                    );
                    new_layer.routing_type = layer.routing_type;
                    merged.layers.insert(new_id, new_layer);
                    new_id
                }
            };
            merge_data(&mut merged.layer_mut(target)?.data, &layer.data);
            layer_map.insert(*id, target);
        }

        let mut node_map: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for (id, node) in other.nodes.iter() {
            let target = match merged.get_node_by_name(&node.name) {
                Ok(existing) => existing,
                Err(_) => {
                    let new_id = merged.insert_node(Some(id.0), node.name.clone(), node.x, node.y);
                    let n = merged.node_mut(new_id)?;
                    n.site = node.site.clone();
                    n.population = node.population;
                    n.is_up = node.is_up;
                    n.icons = node
                        .icons
                        .iter()
                        .filter_map(|(l, url)| layer_map.get(l).map(|l| (*l, url.clone())))
                        .collect();
                    new_id
                }
            };
            let n = merged.node_mut(target)?;
            n.planning_domains.extend(node.planning_domains.iter().cloned());
            merge_data(&mut n.data, &node.data);
            node_map.insert(*id, target);
        }
        merged.planning_domains.extend(other.planning_domains.iter().cloned());
        let map_node = |n: &NodeId| {
            node_map.get(n).copied().ok_or(NetworkModelError::ElementNotFound((*n).into()))
        };
        let map_layer = |l: &LayerId| {
            layer_map.get(l).copied().ok_or(NetworkModelError::ElementNotFound((*l).into()))
        };

        // resources must be added after their base resources
        let mut resource_map: BTreeMap<ResourceId, ResourceId> = BTreeMap::new();
        let mut pending: Vec<&Resource> = other.resources.values().collect();
        while !pending.is_empty() {
            let (ready, waiting): (Vec<&Resource>, Vec<&Resource>) = pending
                .into_iter()
                .partition(|r| r.base_resources.keys().all(|b| resource_map.contains_key(b)));
            if ready.is_empty() {
                return Err(NetworkModelError::MergeConflict(
                    "base resources form a cycle".to_string(),
                ));
            }
            for r in ready {
                let base = r.base_resources.iter().map(|(b, o)| (resource_map[b], *o)).collect();
                let new_id = merged.insert_resource(
                    Some(r.id.0),
                    r.resource_type.clone(),
                    r.name.clone(),
                    map_node(&r.host)?,
                    r.capacity,
                    r.capacity_units.clone(),
                    base,
                    r.processing_delay_ms,
                )?;
                merged.resource_mut(new_id)?.data = r.data.clone();
                resource_map.insert(r.id, new_id);
            }
            pending = waiting;
        }

        let mut link_map: BTreeMap<LinkId, LinkId> = BTreeMap::new();
        for (id, l) in other.links.iter() {
            let new_id = merged.insert_link(
                Some(id.0),
                map_layer(&l.layer)?,
                map_node(&l.origin)?,
                map_node(&l.destination)?,
                l.capacity,
                l.length_km,
                l.propagation_speed_km_per_s,
            )?;
            let link = merged.link_mut(new_id)?;
            link.is_up = l.is_up;
            link.data = l.data.clone();
            link_map.insert(*id, new_id);
        }
        for (id, l) in other.links.iter() {
            if let Some(pair) = l.bidirectional_pair {
                merged.link_mut(link_map[id])?.bidirectional_pair = Some(link_map[&pair]);
            }
        }

        let mut demand_map: BTreeMap<DemandId, DemandId> = BTreeMap::new();
        for (id, d) in other.demands.iter() {
            let new_id = merged.insert_demand(
                Some(id.0),
                map_layer(&d.layer)?,
                map_node(&d.ingress)?,
                map_node(&d.egress)?,
                d.offered_traffic,
                d.recovery_type,
                d.service_chain_types.clone(),
            )?;
            merged.demand_mut(new_id)?.data = d.data.clone();
            demand_map.insert(*id, new_id);
        }
        for (id, d) in other.demands.iter() {
            if let Some(pair) = d.bidirectional_pair {
                merged.demand_mut(demand_map[id])?.bidirectional_pair = Some(demand_map[&pair]);
            }
        }

        let mut mdemand_map: BTreeMap<MulticastDemandId, MulticastDemandId> = BTreeMap::new();
        for (id, d) in other.multicast_demands.iter() {
            let egress = d.egress.iter().map(|n| map_node(n)).collect::<Result<_, _>>()?;
            let new_id = merged.insert_multicast_demand(
                Some(id.0),
                map_layer(&d.layer)?,
                map_node(&d.ingress)?,
                egress,
                d.offered_traffic,
            )?;
            merged.multicast_demand_mut(new_id)?.data = d.data.clone();
            mdemand_map.insert(*id, new_id);
        }

        let map_path = |path: &[PathElement]| -> Option<Vec<PathElement>> {
            path.iter()
                .map(|e| match e {
                    PathElement::Link(l) => link_map.get(l).map(|l| PathElement::Link(*l)),
                    PathElement::Resource(r) => {
                        resource_map.get(r).map(|r| PathElement::Resource(*r))
                    }
                })
                .collect()
        };
        let mut route_map: BTreeMap<RouteId, RouteId> = BTreeMap::new();
        for (id, r) in other.routes.iter() {
            let path = map_path(&r.path).ok_or(NetworkModelError::ElementNotFound((*id).into()))?;
            let new_id = merged.insert_route(
                Some(id.0),
                demand_map[&r.demand],
                r.carried_traffic,
                path,
                r.occupation.clone(),
            )?;
            let route = merged.route_mut(new_id)?;
            route.data = r.data.clone();
            if let Some(initial_path) = map_path(&r.initial_state.path) {
                route.initial_state = RouteState {
                    path: initial_path,
                    occupation: r.initial_state.occupation.clone(),
                    carried_traffic: r.initial_state.carried_traffic,
                };
            }
            route_map.insert(*id, new_id);
        }
        for (id, r) in other.routes.iter() {
            for b in r.backup_routes.iter() {
                merged.route_mut(route_map[id])?.backup_routes.push(route_map[b]);
                merged.route_mut(route_map[b])?.cache_primary_routes.insert(route_map[id]);
            }
        }

        for (id, t) in other.multicast_trees.iter() {
            let links = t.links.iter().map(|l| link_map[l]).collect();
            let new_id = merged.insert_multicast_tree(
                Some(id.0),
                mdemand_map[&t.demand],
                t.carried_traffic,
                t.occupied_capacity,
                links,
            )?;
            let tree = merged.multicast_tree_mut(new_id)?;
            tree.data = t.data.clone();
            if t.initial_links.iter().all(|l| link_map.contains_key(l)) {
                tree.initial_links = t.initial_links.iter().map(|l| link_map[l]).collect();
            }
        }

        for (id, s) in other.srgs.iter() {
            let new_id = merged.insert_srg(Some(id.0), s.mttf_hours, s.mttr_hours)?;
            merged.srg_mut(new_id)?.data = s.data.clone();
            for n in s.nodes.iter() {
                merged.add_node_to_srg_internal(new_id, node_map[n]);
            }
            for l in s.links.iter() {
                merged.add_link_to_srg_internal(new_id, link_map[l]);
            }
        }

        for l in other.links.values() {
            match l.coupling {
                Some(LinkCoupling::Demand(d)) => {
                    merged.couple_demand_internal(demand_map[&d], link_map[&l.id])?
                }
                Some(LinkCoupling::MulticastDemand(_)) | None => {}
            }
        }
        for d in other.multicast_demands.values().filter(|d| d.is_coupled()) {
            let links = d.coupled_upper_links.values().map(|l| link_map[l]).collect();
            merged.couple_multicast_demand_internal(mdemand_map[&d.id], links)?;
        }

        for (id, layer) in other.layers.iter() {
            let target = layer_map[id];
            for ((d, l), f) in layer.forwarding_rules.iter() {
                merged
                    .layer_mut(target)?
                    .forwarding_rules
                    .insert((demand_map[d], link_map[l]), *f);
            }
        }

        merged.after_mutation();
        info!(
            "Merged design with {} nodes and {} links into this design",
            other.nodes.len(),
            other.links.len()
        );
        *self = merged;
        Ok(())
    }

    // ***********************
    // * Removal (internals) *
    // ***********************

    pub(crate) fn remove_route_internal(&mut self, route: RouteId) {
        if let Some(r) = self.routes.remove(&route) {
            self.unregister_route_path(route, &r.path);
            if let Some(d) = self.demands.get_mut(&r.demand) {
                d.cache_routes.remove(&route);
            }
            if let Some(l) = self.layers.get_mut(&r.layer) {
                l.cache_routes.remove(&route);
            }
            for b in r.backup_routes.iter() {
                if let Some(b) = self.routes.get_mut(b) {
                    b.cache_primary_routes.remove(&route);
                }
            }
            for p in r.cache_primary_routes.iter() {
                if let Some(p) = self.routes.get_mut(p) {
                    p.backup_routes.retain(|x| *x != route);
                }
            }
            trace!("Removed {}", route);
        }
    }

    pub(crate) fn remove_multicast_tree_internal(&mut self, tree: MulticastTreeId) {
        if let Some(t) = self.multicast_trees.remove(&tree) {
            for l in t.links.iter() {
                if let Some(l) = self.links.get_mut(l) {
                    l.cache_traversing_trees.remove(&tree);
                }
            }
            if let Some(d) = self.multicast_demands.get_mut(&t.demand) {
                d.cache_trees.remove(&tree);
            }
            if let Some(l) = self.layers.get_mut(&t.layer) {
                l.cache_multicast_trees.remove(&tree);
            }
            trace!("Removed {}", tree);
        }
    }

    pub(crate) fn remove_demand_internal(&mut self, demand: DemandId) {
        let d = match self.demands.get(&demand) {
            Some(d) => d.clone(),
            None => return,
        };
        for r in d.cache_routes.iter() {
            self.remove_route_internal(*r);
        }
        if let Some(l) = d.coupled_upper_link.and_then(|l| self.links.get_mut(&l)) {
            l.coupling = None;
        }
        if let Some(pair) = d.bidirectional_pair.and_then(|p| self.demands.get_mut(&p)) {
            pair.bidirectional_pair = None;
        }
        if let Some(n) = self.nodes.get_mut(&d.ingress) {
            n.cache_out_demands.remove(&demand);
        }
        if let Some(n) = self.nodes.get_mut(&d.egress) {
            n.cache_in_demands.remove(&demand);
        }
        if let Some(l) = self.layers.get_mut(&d.layer) {
            l.cache_demands.remove(&demand);
            l.forwarding_rules.retain(|(x, _), _| *x != demand);
        }
        self.demands.remove(&demand);
        trace!("Removed {}", demand);
    }

    pub(crate) fn remove_multicast_demand_internal(&mut self, demand: MulticastDemandId) {
        let d = match self.multicast_demands.get(&demand) {
            Some(d) => d.clone(),
            None => return,
        };
        for t in d.cache_trees.iter() {
            self.remove_multicast_tree_internal(*t);
        }
        for l in d.coupled_upper_links.values() {
            if let Some(l) = self.links.get_mut(l) {
                l.coupling = None;
            }
        }
        if let Some(n) = self.nodes.get_mut(&d.ingress) {
            n.cache_out_multicast_demands.remove(&demand);
        }
        for e in d.egress.iter() {
            if let Some(n) = self.nodes.get_mut(e) {
                n.cache_in_multicast_demands.remove(&demand);
            }
        }
        if let Some(l) = self.layers.get_mut(&d.layer) {
            l.cache_multicast_demands.remove(&demand);
        }
        self.multicast_demands.remove(&demand);
        trace!("Removed {}", demand);
    }

    pub(crate) fn remove_link_internal(&mut self, link: LinkId) {
        let l = match self.links.get(&link) {
            Some(l) => l.clone(),
            None => return,
        };
        for r in l.cache_traversing_routes.iter() {
            self.remove_route_internal(*r);
        }
        for t in l.cache_traversing_trees.iter() {
            self.remove_multicast_tree_internal(*t);
        }
        match l.coupling {
            Some(LinkCoupling::Demand(d)) => {
                if let Some(d) = self.demands.get_mut(&d) {
                    d.coupled_upper_link = None;
                }
            }
            Some(LinkCoupling::MulticastDemand(d)) => self.decouple_multicast_demand_internal(d),
            None => {}
        }
        for s in l.cache_srgs.iter() {
            if let Some(s) = self.srgs.get_mut(s) {
                s.links.remove(&link);
            }
        }
        if let Some(pair) = l.bidirectional_pair.and_then(|p| self.links.get_mut(&p)) {
            pair.bidirectional_pair = None;
        }
        if let Some(n) = self.nodes.get_mut(&l.origin) {
            n.cache_out_links.remove(&link);
        }
        if let Some(n) = self.nodes.get_mut(&l.destination) {
            n.cache_in_links.remove(&link);
        }
        if let Some(layer) = self.layers.get_mut(&l.layer) {
            layer.cache_links.remove(&link);
            layer.forwarding_rules.retain(|(_, x), _| *x != link);
        }
        self.links.remove(&link);
        trace!("Removed {}", link);
    }

    pub(crate) fn remove_resource_internal(&mut self, resource: ResourceId) {
        let r = match self.resources.get(&resource) {
            Some(r) => r.clone(),
            None => return,
        };
        for upper in r.cache_upper_resources.iter() {
            self.remove_resource_internal(*upper);
        }
        for route in r.cache_traversing_routes.iter() {
            self.remove_route_internal(*route);
        }
        for base in r.base_resources.keys() {
            if let Some(base) = self.resources.get_mut(base) {
                base.cache_upper_resources.remove(&resource);
            }
        }
        if let Some(n) = self.nodes.get_mut(&r.host) {
            n.cache_resources.remove(&resource);
        }
        self.resources.remove(&resource);
        trace!("Removed {}", resource);
    }

    pub(crate) fn remove_node_internal(&mut self, node: NodeId) {
        let n = match self.nodes.get(&node) {
            Some(n) => n.clone(),
            None => return,
        };
        for l in n.cache_out_links.iter().chain(n.cache_in_links.iter()) {
            self.remove_link_internal(*l);
        }
        for d in n.cache_out_demands.iter().chain(n.cache_in_demands.iter()) {
            self.remove_demand_internal(*d);
        }
        for d in n.cache_out_multicast_demands.iter().chain(n.cache_in_multicast_demands.iter()) {
            self.remove_multicast_demand_internal(*d);
        }
        for r in n.cache_resources.iter() {
            self.remove_resource_internal(*r);
        }
        for s in n.cache_srgs.iter() {
            if let Some(s) = self.srgs.get_mut(s) {
                s.nodes.remove(&node);
            }
        }
        self.nodes.remove(&node);
        trace!("Removed {}", node);
    }

    pub(crate) fn remove_srg_internal(&mut self, srg: SrgId) {
        if let Some(s) = self.srgs.remove(&srg) {
            for n in s.nodes.iter() {
                if let Some(n) = self.nodes.get_mut(n) {
                    n.cache_srgs.remove(&srg);
                }
            }
            for l in s.links.iter() {
                if let Some(l) = self.links.get_mut(l) {
                    l.cache_srgs.remove(&srg);
                }
            }
        }
    }

    pub(crate) fn remove_layer_internal(&mut self, layer: LayerId) {
        let l = match self.layers.get(&layer) {
            Some(l) => l.clone(),
            None => return,
        };
        for d in l.cache_demands.iter() {
            self.remove_demand_internal(*d);
        }
        for d in l.cache_multicast_demands.iter() {
            self.remove_multicast_demand_internal(*d);
        }
        for link in l.cache_links.iter() {
            self.remove_link_internal(*link);
        }
        for n in self.nodes.values_mut() {
            n.icons.remove(&layer);
        }
        self.layers.remove(&layer);
        if self.default_layer == layer {
            if let Some(first) = self.layers.keys().next() {
                self.default_layer = *first;
            }
        }
        trace!("Removed {}", layer);
    }
}

/// Add the attributes and tags of `other` to `data`, keeping existing values.
fn merge_data(data: &mut ElementData, other: &ElementData) {
    for (k, v) in other.attributes.iter() {
        data.attributes.entry(k.clone()).or_insert_with(|| v.clone());
    }
    data.tags.extend(other.tags.iter().cloned());
}
