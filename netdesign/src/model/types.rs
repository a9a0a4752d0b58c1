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

//! Module containing all type definitions

use std::fmt;
use thiserror::Error;

/// Absolute tolerance when reporting oversubscribed elements and blocked traffic.
pub const PRECISION_FACTOR: f64 = 1e-3;

/// Relative tolerance when comparing computed values, like sums of splitting factors, path costs
/// or derived traffic.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Returns true if `a` is larger than `b` by more than the relative tolerance.
pub(crate) fn exceeds(a: f64, b: f64) -> bool {
    a - b > RELATIVE_TOLERANCE * (1.0 + a.abs().max(b.abs()))
}

/// Returns true if `a` and `b` differ by more than the relative tolerance.
pub(crate) fn differs(a: f64, b: f64) -> bool {
    exceeds(a, b) || exceeds(b, a)
}

/// Default propagation speed of a link (in km/s).
pub const DEFAULT_PROPAGATION_SPEED_KM_PER_S: f64 = 200_000.0;

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw (model-unique) identifier
            pub fn index(&self) -> u64 {
                self.0
            }
        }

        impl From<$name> for ElementId {
            fn from(id: $name) -> Self {
                ElementId::$variant(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($variant), self.0)
            }
        }
    };
}

element_id!(
    /// Node Identification
    NodeId,
    Node
);
element_id!(
    /// Link Identification
    LinkId,
    Link
);
element_id!(
    /// Unicast Demand Identification
    DemandId,
    Demand
);
element_id!(
    /// Multicast Demand Identification
    MulticastDemandId,
    MulticastDemand
);
element_id!(
    /// Route Identification
    RouteId,
    Route
);
element_id!(
    /// Multicast Tree Identification
    MulticastTreeId,
    MulticastTree
);
element_id!(
    /// Resource Identification
    ResourceId,
    Resource
);
element_id!(
    /// Shared Risk Group Identification
    SrgId,
    Srg
);
element_id!(
    /// Network Layer Identification
    LayerId,
    Layer
);

/// # Network Element
/// Closed enumeration of every kind of element stored in the
/// [`NetworkModel`](crate::model::NetworkModel). It is used wherever an operation applies to
/// any element, like attributes, tags, or removal.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum ElementId {
    /// Node
    Node(NodeId),
    /// Link
    Link(LinkId),
    /// Unicast Demand
    Demand(DemandId),
    /// Multicast Demand
    MulticastDemand(MulticastDemandId),
    /// Route
    Route(RouteId),
    /// Multicast Tree
    MulticastTree(MulticastTreeId),
    /// Resource
    Resource(ResourceId),
    /// Shared Risk Group
    Srg(SrgId),
    /// Network Layer
    Layer(LayerId),
}

impl ElementId {
    /// Returns the raw identifier of the element.
    pub fn index(&self) -> u64 {
        match self {
            Self::Node(x) => x.0,
            Self::Link(x) => x.0,
            Self::Demand(x) => x.0,
            Self::MulticastDemand(x) => x.0,
            Self::Route(x) => x.0,
            Self::MulticastTree(x) => x.0,
            Self::Resource(x) => x.0,
            Self::Srg(x) => x.0,
            Self::Layer(x) => x.0,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(x) => x.fmt(f),
            Self::Link(x) => x.fmt(f),
            Self::Demand(x) => x.fmt(f),
            Self::MulticastDemand(x) => x.fmt(f),
            Self::Route(x) => x.fmt(f),
            Self::MulticastTree(x) => x.fmt(f),
            Self::Resource(x) => x.fmt(f),
            Self::Srg(x) => x.fmt(f),
            Self::Layer(x) => x.fmt(f),
        }
    }
}

/// One element of the path of a route: either a link, or a resource that is traversed at the
/// node where the path currently is.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum PathElement {
    /// Traverse a link from its origin to its destination
    Link(LinkId),
    /// Traverse a resource hosted at the current node
    Resource(ResourceId),
}

impl PathElement {
    /// Returns the link, if the element is a link
    pub fn link(&self) -> Option<LinkId> {
        match self {
            Self::Link(l) => Some(*l),
            Self::Resource(_) => None,
        }
    }

    /// Returns the resource, if the element is a resource
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Self::Link(_) => None,
            Self::Resource(r) => Some(*r),
        }
    }

    /// Returns true if the element is a link
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

impl From<LinkId> for PathElement {
    fn from(l: LinkId) -> Self {
        Self::Link(l)
    }
}

impl From<ResourceId> for PathElement {
    fn from(r: ResourceId) -> Self {
        Self::Resource(r)
    }
}

/// Routing scheme of a layer
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum RoutingType {
    /// Traffic is carried by explicit routes
    SourceRouting,
    /// Traffic is carried by per-link forwarding rules (splitting factors)
    HopByHopRouting,
}

/// Classification of the forwarding rules of one demand in hop-by-hop routing.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum RoutingCycleType {
    /// No traffic can ever visit a node twice
    Loopless,
    /// Some cycles exist, but traffic can always leave them
    OpenCycles,
    /// Traffic entering some cycle can never leave it again
    ClosedCycles,
}

/// Recovery scheme that the planner intends for a demand.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum RecoveryType {
    /// No recovery
    None,
    /// 1+1 protection, traffic stays on the backup once switched
    ProtectionNoRevert,
    /// 1+1 protection, traffic returns to the primary once repaired
    ProtectionRevert,
    /// Routes are recomputed after a failure
    Restoration,
    /// Not specified
    NotSpecified,
}

impl Default for RecoveryType {
    fn default() -> Self {
        Self::NotSpecified
    }
}

/// Coupling of a link to a traffic element of a lower layer
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum LinkCoupling {
    /// The link is realized by a unicast demand
    Demand(DemandId),
    /// The link is realized by the flow of a multicast demand towards the link destination
    MulticastDemand(MulticastDemandId),
}

/// Errors of the network design model
#[derive(Error, Debug, PartialEq, Clone)]
pub enum NetworkModelError {
    /// The element does not exist (anymore) in the model
    #[error("Network element was not found: {0}")]
    ElementNotFound(ElementId),
    /// No element uses the raw identifier
    #[error("No network element has the id {0}")]
    UnknownElementId(u64),
    /// Name lookup failed
    #[error("Name was not found: {0}")]
    NameNotFound(String),
    /// Two elements must be in the same layer, but they are not
    #[error("Elements are not in the same layer: {0} and {1}")]
    LayerMismatch(ElementId, ElementId),
    /// Origin and destination of a link or demand are the same node
    #[error("Origin and destination must differ: {0}")]
    SelfLoop(NodeId),
    /// A value that must not be negative is negative (or not a number)
    #[error("Value for {0} must be a non-negative number, got {1}")]
    NegativeValue(&'static str, f64),
    /// Value outside of its valid range
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, f64),
    /// The path is not a connected walk from the ingress to the egress node
    #[error("Invalid path for {0}: {1}")]
    InvalidPath(DemandId, String),
    /// The resources traversed do not match the service chain of the demand
    #[error("Resources traversed by the path of {0} do not match its service chain")]
    ServiceChainMismatch(DemandId),
    /// Occupation vector and path have a different length
    #[error("Occupation vector has {1} entries, but the path has {0} elements")]
    OccupationLengthMismatch(usize, usize),
    /// The route cannot be a backup route of the other one
    #[error("{1} cannot be a backup route of {0}")]
    InvalidBackupRoute(RouteId, RouteId),
    /// The set of links is no valid tree for the multicast demand
    #[error("Invalid multicast tree for {0}: {1}")]
    InvalidMulticastTree(MulticastDemandId, String),
    /// The element is already coupled
    #[error("Element is already coupled: {0}")]
    AlreadyCoupled(ElementId),
    /// The element is not coupled
    #[error("Element is not coupled: {0}")]
    NotCoupled(ElementId),
    /// End nodes of the elements to couple do not match
    #[error("End nodes of {0} and {1} do not match")]
    CouplingEndpointMismatch(ElementId, ElementId),
    /// Coupling would make a layer depend on itself
    #[error("Coupling {0} on top of {1} would create a cycle of layers")]
    CouplingCycle(LayerId, LayerId),
    /// Capacity of a coupled link cannot be set
    #[error("Capacity of {0} follows the coupled traffic and cannot be set")]
    CapacityIsCoupled(LinkId),
    /// The operation is only available in a different routing type
    #[error("Operation not applicable: {0} does not use {1:?}")]
    WrongRoutingType(LayerId, RoutingType),
    /// Sum of splitting factors at a node exceeds one
    #[error("Forwarding rules of {0} at {1} sum up to {2}")]
    ForwardingRulesExceedOne(DemandId, NodeId, f64),
    /// The forwarding rules would create a closed routing cycle
    #[error("Forwarding rules of {0} would create a closed routing cycle")]
    ClosedCycleRouting(DemandId),
    /// Service chains can only be routed with source routing
    #[error("{0} is a service chain and cannot be routed hop-by-hop")]
    ServiceChainInHopByHop(DemandId),
    /// The two elements cannot be a bidirectional pair
    #[error("{0} and {1} cannot form a bidirectional pair")]
    InvalidBidirectionalPair(ElementId, ElementId),
    /// A resource is used at a node where it is not hosted
    #[error("{0} is not hosted at {1}")]
    ResourceHostMismatch(ResourceId, NodeId),
    /// The last layer cannot be removed
    #[error("Cannot remove the last layer of the model")]
    CannotRemoveLastLayer,
    /// Two designs cannot be merged
    #[error("Designs cannot be merged: {0}")]
    MergeConflict(String),
    /// The consistency checker found a drifted cache
    #[error("Inconsistent cache {cache}: {detail}")]
    InconsistentCache {
        /// Name of the cache
        cache: &'static str,
        /// Description of the first difference found
        detail: String,
    },
    /// Invalid option passed to an algorithm
    #[error("Invalid option {0}: {1}")]
    InvalidOption(String, String),
    /// The external multicast tree solver failed
    #[error("Multicast tree solver failed: {0}")]
    SolverError(String),
}

/// Returns an error if the value is negative or not a number.
pub(crate) fn check_non_negative(what: &'static str, value: f64) -> Result<(), NetworkModelError> {
    if value.is_nan() || value < 0.0 {
        Err(NetworkModelError::NegativeValue(what, value))
    } else {
        Ok(())
    }
}
