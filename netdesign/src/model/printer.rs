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

//! # Helper (printer) functions for the network model
//! Module containing helper functions to get formatted strings of network elements, with the names
//! of the nodes inserted.

use crate::model::network_model::NetworkModel;
use crate::model::types::*;

/// Returns the name of the node
pub fn node_name(model: &NetworkModel, node: NodeId) -> Result<&str, NetworkModelError> {
    Ok(model.get_node(node)?.name())
}

/// Returns the formatted string of a link, like `A -> B (Layer 0)`.
pub fn link(model: &NetworkModel, link: LinkId) -> Result<String, NetworkModelError> {
    let l = model.get_link(link)?;
    Ok(format!(
        "{} -> {} ({})",
        node_name(model, l.origin())?,
        node_name(model, l.destination())?,
        model.get_layer(l.layer())?.name()
    ))
}

/// Returns the formatted string of a unicast demand, like `A => B [10 Gbps]`.
pub fn demand(model: &NetworkModel, demand: DemandId) -> Result<String, NetworkModelError> {
    let d = model.get_demand(demand)?;
    let mut result = format!(
        "{} => {} [{} {}]",
        node_name(model, d.ingress())?,
        node_name(model, d.egress())?,
        d.offered_traffic(),
        model.get_layer(d.layer())?.demand_traffic_units()
    );
    if d.is_service_chain() {
        result.push_str(&format!(" via {}", d.service_chain_types().join(", ")));
    }
    Ok(result)
}

/// Returns the formatted string of a multicast demand, like `A => {B, C} [10 Gbps]`.
pub fn multicast_demand(
    model: &NetworkModel,
    demand: MulticastDemandId,
) -> Result<String, NetworkModelError> {
    let d = model.get_multicast_demand(demand)?;
    Ok(format!(
        "{} => {{{}}} [{} {}]",
        node_name(model, d.ingress())?,
        d.egress_nodes()
            .iter()
            .map(|n| node_name(model, *n))
            .collect::<Result<Vec<_>, _>>()?
            .join(", "),
        d.offered_traffic(),
        model.get_layer(d.layer())?.demand_traffic_units()
    ))
}

/// Returns the formatted string of a path, starting at the node `start`. Links are printed by
/// their destination, resources by their type and name in brackets.
pub fn path(
    model: &NetworkModel,
    start: NodeId,
    path: &[PathElement],
) -> Result<String, NetworkModelError> {
    let mut result = String::from(node_name(model, start)?);
    for elem in path {
        match elem {
            PathElement::Link(l) => {
                result.push_str(" -> ");
                result.push_str(node_name(model, model.get_link(*l)?.destination())?);
            }
            PathElement::Resource(r) => {
                let r = model.get_resource(*r)?;
                result.push_str(&format!(" -> [{}: {}]", r.resource_type(), r.name()));
            }
        }
    }
    Ok(result)
}

/// Returns the formatted string of a route, with its path and carried traffic.
pub fn route(model: &NetworkModel, route: RouteId) -> Result<String, NetworkModelError> {
    let r = model.get_route(route)?;
    let d = model.get_demand(r.demand())?;
    Ok(format!(
        "{}: {} [{}{}]",
        route,
        path(model, d.ingress(), r.path())?,
        r.carried_traffic(),
        if r.is_down() { ", down" } else { "" }
    ))
}

/// Returns the formatted string of any network element
pub fn element(model: &NetworkModel, element: ElementId) -> Result<String, NetworkModelError> {
    Ok(match element {
        ElementId::Node(n) => node_name(model, n)?.to_string(),
        ElementId::Link(l) => link(model, l)?,
        ElementId::Demand(d) => demand(model, d)?,
        ElementId::MulticastDemand(d) => multicast_demand(model, d)?,
        ElementId::Route(r) => route(model, r)?,
        ElementId::MulticastTree(t) => {
            let tree = model.get_multicast_tree(t)?;
            format!(
                "{}: {} with links {}",
                t,
                multicast_demand(model, tree.demand())?,
                tree.links()
                    .iter()
                    .map(|l| link(model, *l))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ")
            )
        }
        ElementId::Resource(r) => {
            let res = model.get_resource(r)?;
            format!(
                "{} {} at {} [{} {}]",
                res.resource_type(),
                res.name(),
                node_name(model, res.host())?,
                res.capacity(),
                res.capacity_units()
            )
        }
        ElementId::Srg(s) => {
            let srg = model.get_srg(s)?;
            format!("{} ({} nodes, {} links)", s, srg.nodes().len(), srg.links().len())
        }
        ElementId::Layer(l) => model.get_layer(l)?.name().to_string(),
    })
}
