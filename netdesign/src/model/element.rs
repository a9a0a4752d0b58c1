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

//! # Network Elements
//!
//! This module contains the data of every element stored in the
//! [`NetworkModel`](crate::model::NetworkModel). Elements only hold identifiers of other
//! elements, never references. All fields are private to the crate, and elements can only be
//! changed through the methods of the model, which keep all back-references consistent.
//!
//! Every element has two kinds of fields: the *forward* state (which is set by the user), and
//! the *caches*, which are the inverse of some forward state of other elements (e.g., the set of
//! routes traversing a link). Caches are prefixed with `cache_`. Additionally, some elements
//! store *derived* traffic values (like the carried traffic of a demand), which are recomputed
//! after every mutation.

use crate::model::types::*;
use std::collections::{BTreeMap, BTreeSet};

/// Attributes and tags shared by all network elements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) tags: BTreeSet<String>,
}

/// Common interface of all network elements.
pub trait NetworkElement {
    /// Identifier of this element
    fn element_id(&self) -> ElementId;

    /// Attributes and tags of this element
    fn element_data(&self) -> &ElementData;

    /// Returns all attributes, ordered by their key
    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.element_data().attributes
    }

    /// Returns the value of a single attribute
    fn get_attribute(&self, key: &str) -> Option<&str> {
        self.element_data().attributes.get(key).map(|s| s.as_str())
    }

    /// Returns all tags
    fn tags(&self) -> &BTreeSet<String> {
        &self.element_data().tags
    }

    /// Returns true if the element has the given tag
    fn has_tag(&self, tag: &str) -> bool {
        self.element_data().tags.contains(tag)
    }
}

macro_rules! impl_network_element {
    ($t:ty) => {
        impl NetworkElement for $t {
            fn element_id(&self) -> ElementId {
                self.id.into()
            }

            fn element_data(&self) -> &ElementData {
                &self.data
            }
        }
    };
}

/// # Node
/// A node is shared among all layers. It stores the links and demands of all layers which start
/// or end at this node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) data: ElementData,
    pub(crate) name: String,
    pub(crate) site: Option<String>,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) population: f64,
    pub(crate) icons: BTreeMap<LayerId, String>,
    pub(crate) is_up: bool,
    pub(crate) planning_domains: BTreeSet<String>,
    pub(crate) cache_out_links: BTreeSet<LinkId>,
    pub(crate) cache_in_links: BTreeSet<LinkId>,
    pub(crate) cache_out_demands: BTreeSet<DemandId>,
    pub(crate) cache_in_demands: BTreeSet<DemandId>,
    pub(crate) cache_out_multicast_demands: BTreeSet<MulticastDemandId>,
    pub(crate) cache_in_multicast_demands: BTreeSet<MulticastDemandId>,
    pub(crate) cache_resources: BTreeSet<ResourceId>,
    pub(crate) cache_srgs: BTreeSet<SrgId>,
}

impl_network_element!(Node);

impl Node {
    pub(crate) fn new(id: NodeId, name: String, x: f64, y: f64) -> Self {
        Self {
            id,
            data: ElementData::default(),
            name,
            site: None,
            x,
            y,
            population: 0.0,
            icons: BTreeMap::new(),
            is_up: true,
            planning_domains: BTreeSet::new(),
            cache_out_links: BTreeSet::new(),
            cache_in_links: BTreeSet::new(),
            cache_out_demands: BTreeSet::new(),
            cache_in_demands: BTreeSet::new(),
            cache_out_multicast_demands: BTreeSet::new(),
            cache_in_multicast_demands: BTreeSet::new(),
            cache_resources: BTreeSet::new(),
            cache_srgs: BTreeSet::new(),
        }
    }

    /// Identifier of the node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the site, the node is located in
    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// Returns the coordinates `(x, y)` of the node
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Population of the node
    pub fn population(&self) -> f64 {
        self.population
    }

    /// Icon URL of the node in the given layer
    pub fn icon(&self, layer: LayerId) -> Option<&str> {
        self.icons.get(&layer).map(|s| s.as_str())
    }

    /// Returns true if the node is not failed
    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Returns true if the node is failed
    pub fn is_down(&self) -> bool {
        !self.is_up
    }

    /// Planning domains this node belongs to
    pub fn planning_domains(&self) -> &BTreeSet<String> {
        &self.planning_domains
    }

    /// Outgoing links of all layers
    pub fn outgoing_links(&self) -> &BTreeSet<LinkId> {
        &self.cache_out_links
    }

    /// Incoming links of all layers
    pub fn incoming_links(&self) -> &BTreeSet<LinkId> {
        &self.cache_in_links
    }

    /// Demands of all layers starting at this node
    pub fn outgoing_demands(&self) -> &BTreeSet<DemandId> {
        &self.cache_out_demands
    }

    /// Demands of all layers ending at this node
    pub fn incoming_demands(&self) -> &BTreeSet<DemandId> {
        &self.cache_in_demands
    }

    /// Multicast demands of all layers with this node as ingress
    pub fn outgoing_multicast_demands(&self) -> &BTreeSet<MulticastDemandId> {
        &self.cache_out_multicast_demands
    }

    /// Multicast demands of all layers with this node as one of the egress nodes
    pub fn incoming_multicast_demands(&self) -> &BTreeSet<MulticastDemandId> {
        &self.cache_in_multicast_demands
    }

    /// Resources hosted at this node
    pub fn resources(&self) -> &BTreeSet<ResourceId> {
        &self.cache_resources
    }

    /// Shared risk groups this node belongs to
    pub fn srgs(&self) -> &BTreeSet<SrgId> {
        &self.cache_srgs
    }
}

/// # Link
/// A unidirectional link of a single layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) data: ElementData,
    pub(crate) layer: LayerId,
    pub(crate) origin: NodeId,
    pub(crate) destination: NodeId,
    pub(crate) capacity: f64,
    pub(crate) length_km: f64,
    pub(crate) propagation_speed_km_per_s: f64,
    pub(crate) is_up: bool,
    pub(crate) coupling: Option<LinkCoupling>,
    pub(crate) bidirectional_pair: Option<LinkId>,
    pub(crate) carried_traffic: f64,
    pub(crate) occupied_capacity: f64,
    pub(crate) cache_traversing_routes: BTreeSet<RouteId>,
    pub(crate) cache_traversing_trees: BTreeSet<MulticastTreeId>,
    pub(crate) cache_srgs: BTreeSet<SrgId>,
}

impl_network_element!(Link);

impl Link {
    /// Identifier of the link
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Layer of the link
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Origin node
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Destination node
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Capacity of the link. For a coupled link, this is the carried traffic of the coupled
    /// demand.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Length in km
    pub fn length_km(&self) -> f64 {
        self.length_km
    }

    /// Propagation speed in km/s
    pub fn propagation_speed_km_per_s(&self) -> f64 {
        self.propagation_speed_km_per_s
    }

    /// Propagation delay in milliseconds
    pub fn propagation_delay_ms(&self) -> f64 {
        if self.propagation_speed_km_per_s == f64::INFINITY {
            0.0
        } else {
            1000.0 * self.length_km / self.propagation_speed_km_per_s
        }
    }

    /// Returns true if the link itself is not failed. Notice, that the link cannot carry traffic
    /// if one of its end nodes is failed.
    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Returns true if the link itself is failed.
    pub fn is_down(&self) -> bool {
        !self.is_up
    }

    /// Coupling of the link to a lower layer
    pub fn coupling(&self) -> Option<LinkCoupling> {
        self.coupling
    }

    /// Returns true if the link is coupled to a lower layer demand or multicast demand
    pub fn is_coupled(&self) -> bool {
        self.coupling.is_some()
    }

    /// Demand of the lower layer this link is coupled to
    pub fn coupled_demand(&self) -> Option<DemandId> {
        match self.coupling {
            Some(LinkCoupling::Demand(d)) => Some(d),
            _ => None,
        }
    }

    /// Multicast demand of the lower layer this link is coupled to
    pub fn coupled_multicast_demand(&self) -> Option<MulticastDemandId> {
        match self.coupling {
            Some(LinkCoupling::MulticastDemand(d)) => Some(d),
            _ => None,
        }
    }

    /// The opposite link of the bidirectional pair
    pub fn bidirectional_pair(&self) -> Option<LinkId> {
        self.bidirectional_pair
    }

    /// Traffic carried by the link
    pub fn carried_traffic(&self) -> f64 {
        self.carried_traffic
    }

    /// Capacity occupied by routes, trees, and forwarding rules
    pub fn occupied_capacity(&self) -> f64 {
        self.occupied_capacity
    }

    /// Ratio between occupied capacity and capacity.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0.0 {
            if self.occupied_capacity == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.occupied_capacity / self.capacity
        }
    }

    /// Returns true if the occupied capacity exceeds the capacity
    pub fn is_oversubscribed(&self) -> bool {
        self.occupied_capacity > self.capacity + PRECISION_FACTOR
    }

    /// Routes traversing this link
    pub fn traversing_routes(&self) -> &BTreeSet<RouteId> {
        &self.cache_traversing_routes
    }

    /// Multicast trees traversing this link
    pub fn traversing_trees(&self) -> &BTreeSet<MulticastTreeId> {
        &self.cache_traversing_trees
    }

    /// Shared risk groups this link belongs to
    pub fn srgs(&self) -> &BTreeSet<SrgId> {
        &self.cache_srgs
    }
}

/// # Unicast Demand
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    pub(crate) id: DemandId,
    pub(crate) data: ElementData,
    pub(crate) layer: LayerId,
    pub(crate) ingress: NodeId,
    pub(crate) egress: NodeId,
    pub(crate) offered_traffic: f64,
    pub(crate) recovery_type: RecoveryType,
    pub(crate) service_chain_types: Vec<String>,
    pub(crate) coupled_upper_link: Option<LinkId>,
    pub(crate) bidirectional_pair: Option<DemandId>,
    pub(crate) carried_traffic: f64,
    pub(crate) cache_routes: BTreeSet<RouteId>,
}

impl_network_element!(Demand);

impl Demand {
    /// Identifier of the demand
    pub fn id(&self) -> DemandId {
        self.id
    }

    /// Layer of the demand
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Ingress node
    pub fn ingress(&self) -> NodeId {
        self.ingress
    }

    /// Egress node
    pub fn egress(&self) -> NodeId {
        self.egress
    }

    /// Offered traffic
    pub fn offered_traffic(&self) -> f64 {
        self.offered_traffic
    }

    /// Traffic carried by the demand
    pub fn carried_traffic(&self) -> f64 {
        self.carried_traffic
    }

    /// Offered traffic that is not carried
    pub fn blocked_traffic(&self) -> f64 {
        (self.offered_traffic - self.carried_traffic).max(0.0)
    }

    /// Returns true if some offered traffic is not carried
    pub fn is_blocked(&self) -> bool {
        self.blocked_traffic() > PRECISION_FACTOR
    }

    /// Intended recovery type
    pub fn recovery_type(&self) -> RecoveryType {
        self.recovery_type
    }

    /// Sequence of resource types every route must traverse in that order.
    pub fn service_chain_types(&self) -> &[String] {
        &self.service_chain_types
    }

    /// Returns true if the demand must traverse resources
    pub fn is_service_chain(&self) -> bool {
        !self.service_chain_types.is_empty()
    }

    /// Link of an upper layer this demand is coupled to
    pub fn coupled_upper_link(&self) -> Option<LinkId> {
        self.coupled_upper_link
    }

    /// Returns true if the demand is coupled to an upper layer link
    pub fn is_coupled(&self) -> bool {
        self.coupled_upper_link.is_some()
    }

    /// The opposite demand of the bidirectional pair
    pub fn bidirectional_pair(&self) -> Option<DemandId> {
        self.bidirectional_pair
    }

    /// Routes of this demand (only in source routing)
    pub fn routes(&self) -> &BTreeSet<RouteId> {
        &self.cache_routes
    }
}

/// # Multicast Demand
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastDemand {
    pub(crate) id: MulticastDemandId,
    pub(crate) data: ElementData,
    pub(crate) layer: LayerId,
    pub(crate) ingress: NodeId,
    pub(crate) egress: BTreeSet<NodeId>,
    pub(crate) offered_traffic: f64,
    pub(crate) coupled_upper_links: BTreeMap<NodeId, LinkId>,
    pub(crate) carried_traffic: f64,
    pub(crate) cache_trees: BTreeSet<MulticastTreeId>,
}

impl_network_element!(MulticastDemand);

impl MulticastDemand {
    /// Identifier of the multicast demand
    pub fn id(&self) -> MulticastDemandId {
        self.id
    }

    /// Layer of the multicast demand
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Ingress node
    pub fn ingress(&self) -> NodeId {
        self.ingress
    }

    /// Egress nodes
    pub fn egress_nodes(&self) -> &BTreeSet<NodeId> {
        &self.egress
    }

    /// Offered traffic
    pub fn offered_traffic(&self) -> f64 {
        self.offered_traffic
    }

    /// Carried traffic (sum over all trees which are not failed)
    pub fn carried_traffic(&self) -> f64 {
        self.carried_traffic
    }

    /// Offered traffic that is not carried
    pub fn blocked_traffic(&self) -> f64 {
        (self.offered_traffic - self.carried_traffic).max(0.0)
    }

    /// Returns true if some offered traffic is not carried
    pub fn is_blocked(&self) -> bool {
        self.blocked_traffic() > PRECISION_FACTOR
    }

    /// Upper layer links this multicast demand is coupled to, indexed by their destination
    pub fn coupled_upper_links(&self) -> &BTreeMap<NodeId, LinkId> {
        &self.coupled_upper_links
    }

    /// Returns true if the multicast demand is coupled
    pub fn is_coupled(&self) -> bool {
        !self.coupled_upper_links.is_empty()
    }

    /// Multicast trees carrying this demand
    pub fn trees(&self) -> &BTreeSet<MulticastTreeId> {
        &self.cache_trees
    }
}

/// Snapshot of a route, taken when the route is created.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    pub(crate) path: Vec<PathElement>,
    pub(crate) occupation: Vec<f64>,
    pub(crate) carried_traffic: f64,
}

impl RouteState {
    /// Path of the route
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Occupied capacity in each path element
    pub fn occupation(&self) -> &[f64] {
        &self.occupation
    }

    /// Carried traffic
    pub fn carried_traffic(&self) -> f64 {
        self.carried_traffic
    }
}

/// # Route
/// A route carries (a part of) the traffic of a demand over a sequence of links and resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub(crate) id: RouteId,
    pub(crate) data: ElementData,
    pub(crate) layer: LayerId,
    pub(crate) demand: DemandId,
    pub(crate) path: Vec<PathElement>,
    pub(crate) occupation: Vec<f64>,
    pub(crate) carried_traffic: f64,
    pub(crate) backup_routes: Vec<RouteId>,
    pub(crate) initial_state: RouteState,
    pub(crate) is_down: bool,
    pub(crate) cache_primary_routes: BTreeSet<RouteId>,
}

impl_network_element!(Route);

impl Route {
    /// Identifier of the route
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Layer of the route
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Demand carried by this route
    pub fn demand(&self) -> DemandId {
        self.demand
    }

    /// Sequence of links and resources
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Sequence of links traversed (skipping resources)
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.path.iter().filter_map(|e| e.link())
    }

    /// Sequence of resources traversed (skipping links)
    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.path.iter().filter_map(|e| e.resource())
    }

    /// Capacity occupied in each element of the path, assuming the route is not failed.
    pub fn occupation_if_not_failing(&self) -> &[f64] {
        &self.occupation
    }

    /// Traffic carried, assuming the route is not failed
    pub fn carried_traffic_if_not_failing(&self) -> f64 {
        self.carried_traffic
    }

    /// Traffic carried by the route. This is zero if the route traverses a failed element.
    pub fn carried_traffic(&self) -> f64 {
        if self.is_down {
            0.0
        } else {
            self.carried_traffic
        }
    }

    /// Returns true if the route traverses a failed link or node
    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// Returns true if the route traverses no failed link or node
    pub fn is_up(&self) -> bool {
        !self.is_down
    }

    /// Routes designated as backup of this route
    pub fn backup_routes(&self) -> &[RouteId] {
        &self.backup_routes
    }

    /// Returns true if this route has backup routes
    pub fn has_backup_routes(&self) -> bool {
        !self.backup_routes.is_empty()
    }

    /// Routes this route is a backup of
    pub fn primary_routes(&self) -> &BTreeSet<RouteId> {
        &self.cache_primary_routes
    }

    /// Returns true if this route is a backup of some other route
    pub fn is_backup_route(&self) -> bool {
        !self.cache_primary_routes.is_empty()
    }

    /// State of the route at creation time
    pub fn initial_state(&self) -> &RouteState {
        &self.initial_state
    }
}

/// # Multicast Tree
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastTree {
    pub(crate) id: MulticastTreeId,
    pub(crate) data: ElementData,
    pub(crate) layer: LayerId,
    pub(crate) demand: MulticastDemandId,
    pub(crate) links: BTreeSet<LinkId>,
    pub(crate) carried_traffic: f64,
    pub(crate) occupied_capacity: f64,
    pub(crate) initial_links: BTreeSet<LinkId>,
    pub(crate) is_down: bool,
}

impl_network_element!(MulticastTree);

impl MulticastTree {
    /// Identifier of the tree
    pub fn id(&self) -> MulticastTreeId {
        self.id
    }

    /// Layer of the tree
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Multicast demand carried by this tree
    pub fn demand(&self) -> MulticastDemandId {
        self.demand
    }

    /// Links of the tree
    pub fn links(&self) -> &BTreeSet<LinkId> {
        &self.links
    }

    /// Links of the tree at creation time
    pub fn initial_links(&self) -> &BTreeSet<LinkId> {
        &self.initial_links
    }

    /// Traffic carried, assuming the tree is not failed
    pub fn carried_traffic_if_not_failing(&self) -> f64 {
        self.carried_traffic
    }

    /// Capacity occupied in each link, assuming the tree is not failed
    pub fn occupied_capacity_if_not_failing(&self) -> f64 {
        self.occupied_capacity
    }

    /// Traffic carried by the tree, zero if the tree is failed
    pub fn carried_traffic(&self) -> f64 {
        if self.is_down {
            0.0
        } else {
            self.carried_traffic
        }
    }

    /// Capacity occupied in each link, zero if the tree is failed
    pub fn occupied_capacity(&self) -> f64 {
        if self.is_down {
            0.0
        } else {
            self.occupied_capacity
        }
    }

    /// Returns true if the tree traverses a failed link or node
    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// Returns true if the tree traverses no failed link or node
    pub fn is_up(&self) -> bool {
        !self.is_down
    }
}

/// # Resource
/// Typed capacity pool hosted at a node (e.g., a virtual machine, or a firewall). A resource may
/// occupy capacity of other resources hosted at the same node (its base resources).
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub(crate) id: ResourceId,
    pub(crate) data: ElementData,
    pub(crate) resource_type: String,
    pub(crate) name: String,
    pub(crate) host: NodeId,
    pub(crate) capacity: f64,
    pub(crate) capacity_units: String,
    pub(crate) base_resources: BTreeMap<ResourceId, f64>,
    pub(crate) processing_delay_ms: f64,
    pub(crate) occupied_capacity: f64,
    pub(crate) cache_traversing_routes: BTreeSet<RouteId>,
    pub(crate) cache_upper_resources: BTreeSet<ResourceId>,
}

impl_network_element!(Resource);

impl Resource {
    /// Identifier of the resource
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Type of the resource
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host node
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Capacity of the resource
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Units in which the capacity is measured
    pub fn capacity_units(&self) -> &str {
        &self.capacity_units
    }

    /// Base resources, with the capacity occupied in each of them
    pub fn base_resources(&self) -> &BTreeMap<ResourceId, f64> {
        &self.base_resources
    }

    /// Processing delay in milliseconds, added to every route traversing the resource
    pub fn processing_delay_ms(&self) -> f64 {
        self.processing_delay_ms
    }

    /// Capacity occupied by routes and upper resources
    pub fn occupied_capacity(&self) -> f64 {
        self.occupied_capacity
    }

    /// Returns true if the occupied capacity exceeds the capacity
    pub fn is_oversubscribed(&self) -> bool {
        self.occupied_capacity > self.capacity + PRECISION_FACTOR
    }

    /// Routes traversing this resource
    pub fn traversing_routes(&self) -> &BTreeSet<RouteId> {
        &self.cache_traversing_routes
    }

    /// Resources which occupy capacity in this resource
    pub fn upper_resources(&self) -> &BTreeSet<ResourceId> {
        &self.cache_upper_resources
    }
}

/// # Shared Risk Group
#[derive(Debug, Clone, PartialEq)]
pub struct SharedRiskGroup {
    pub(crate) id: SrgId,
    pub(crate) data: ElementData,
    pub(crate) nodes: BTreeSet<NodeId>,
    pub(crate) links: BTreeSet<LinkId>,
    pub(crate) mttf_hours: f64,
    pub(crate) mttr_hours: f64,
}

impl_network_element!(SharedRiskGroup);

impl SharedRiskGroup {
    /// Identifier of the SRG
    pub fn id(&self) -> SrgId {
        self.id
    }

    /// Member nodes
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    /// Member links
    pub fn links(&self) -> &BTreeSet<LinkId> {
        &self.links
    }

    /// Mean time to fail in hours
    pub fn mttf_hours(&self) -> f64 {
        self.mttf_hours
    }

    /// Mean time to repair in hours
    pub fn mttr_hours(&self) -> f64 {
        self.mttr_hours
    }

    /// Fraction of time the SRG is up: `MTTF / (MTTF + MTTR)`.
    pub fn availability(&self) -> f64 {
        if self.mttf_hours + self.mttr_hours == 0.0 {
            1.0
        } else {
            self.mttf_hours / (self.mttf_hours + self.mttr_hours)
        }
    }
}

/// # Network Layer
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLayer {
    pub(crate) id: LayerId,
    pub(crate) data: ElementData,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) link_capacity_units: String,
    pub(crate) demand_traffic_units: String,
    pub(crate) routing_type: RoutingType,
    pub(crate) forwarding_rules: BTreeMap<(DemandId, LinkId), f64>,
    pub(crate) cache_links: BTreeSet<LinkId>,
    pub(crate) cache_demands: BTreeSet<DemandId>,
    pub(crate) cache_multicast_demands: BTreeSet<MulticastDemandId>,
    pub(crate) cache_routes: BTreeSet<RouteId>,
    pub(crate) cache_multicast_trees: BTreeSet<MulticastTreeId>,
}

impl_network_element!(NetworkLayer);

impl NetworkLayer {
    pub(crate) fn new(
        id: LayerId,
        name: String,
        description: String,
        link_capacity_units: String,
        demand_traffic_units: String,
    ) -> Self {
        Self {
            id,
            data: ElementData::default(),
            name,
            description,
            link_capacity_units,
            demand_traffic_units,
            routing_type: RoutingType::SourceRouting,
            forwarding_rules: BTreeMap::new(),
            cache_links: BTreeSet::new(),
            cache_demands: BTreeSet::new(),
            cache_multicast_demands: BTreeSet::new(),
            cache_routes: BTreeSet::new(),
            cache_multicast_trees: BTreeSet::new(),
        }
    }

    /// Identifier of the layer
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Name of the layer
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description of the layer
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Units of the link capacities
    pub fn link_capacity_units(&self) -> &str {
        &self.link_capacity_units
    }

    /// Units of the demand traffic
    pub fn demand_traffic_units(&self) -> &str {
        &self.demand_traffic_units
    }

    /// Routing type of the layer
    pub fn routing_type(&self) -> RoutingType {
        self.routing_type
    }

    /// All forwarding rules (only used in hop-by-hop routing)
    pub fn forwarding_rules(&self) -> &BTreeMap<(DemandId, LinkId), f64> {
        &self.forwarding_rules
    }

    /// Links of the layer
    pub fn links(&self) -> &BTreeSet<LinkId> {
        &self.cache_links
    }

    /// Demands of the layer
    pub fn demands(&self) -> &BTreeSet<DemandId> {
        &self.cache_demands
    }

    /// Multicast demands of the layer
    pub fn multicast_demands(&self) -> &BTreeSet<MulticastDemandId> {
        &self.cache_multicast_demands
    }

    /// Routes of the layer
    pub fn routes(&self) -> &BTreeSet<RouteId> {
        &self.cache_routes
    }

    /// Multicast trees of the layer
    pub fn multicast_trees(&self) -> &BTreeSet<MulticastTreeId> {
        &self.cache_multicast_trees
    }
}

/// Returns the forwarding rules of a single demand, indexed by the link.
pub(crate) fn demand_rules(
    rules: &BTreeMap<(DemandId, LinkId), f64>,
    demand: DemandId,
) -> BTreeMap<LinkId, f64> {
    rules
        .range((demand, LinkId(0))..=(demand, LinkId(u64::MAX)))
        .map(|((_, l), f)| (*l, *f))
        .collect()
}
