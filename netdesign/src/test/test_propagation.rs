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

//! Test the inter-layer propagation graph and the layer coupling graph.

use crate::example_networks::{ExampleNetwork, IpOverWdmNet};
use crate::model::{
    DemandId, IlpgVertex, LayerId, LinkId, NetworkModel, NetworkModelError, NodeId, RoutingType,
};
use lazy_static::lazy_static;
use maplit::btreeset;
use std::collections::BTreeSet;

lazy_static! {
    static ref WDM: LayerId = LayerId(0);
    static ref IP: LayerId = LayerId(1);
    static ref A: NodeId = NodeId(2);
    static ref B: NodeId = NodeId(3);
    static ref C: NodeId = NodeId(4);
    static ref AB: LinkId = LinkId(6);
    static ref BA: LinkId = LinkId(7);
    static ref BC: LinkId = LinkId(8);
    static ref CB: LinkId = LinkId(9);
    static ref LP_AC: DemandId = DemandId(14);
    static ref LP_CA: DemandId = DemandId(15);
    static ref IP_AC: LinkId = LinkId(18);
    static ref IP_CA: LinkId = LinkId(19);
    static ref IP_DEMAND: DemandId = DemandId(20);
}

/// # Test network
///
/// ```text
///   IP:     A =============== C
///
///   WDM:    A ----- B ----- C
///           |               |
///           +------ D ------+
/// ```
fn get_test_net() -> NetworkModel {
    IpOverWdmNet::model().unwrap()
}

#[test]
fn test_upwards_propagation() {
    let m = get_test_net();
    let g = m
        .get_inter_layer_propagation_graph(&btreeset! {*AB}, &BTreeSet::new(), &BTreeSet::new(), true)
        .unwrap();
    assert!(g.is_upwards());
    assert_eq!(g.get_initial_vertices(), &btreeset! {IlpgVertex::Link(*AB)});
    assert_eq!(g.get_links_in_graph(), btreeset! {*AB, *IP_AC});
    assert_eq!(g.get_demands_in_graph(), btreeset! {*LP_AC, *IP_DEMAND});
    assert!(g.get_multicast_demand_flows_in_graph().is_empty());

    let graph = g.get_graph();
    assert!(graph.contains_edge(IlpgVertex::Link(*AB), IlpgVertex::Demand(*LP_AC)));
    assert!(graph.contains_edge(IlpgVertex::Demand(*LP_AC), IlpgVertex::Link(*IP_AC)));
    assert!(graph.contains_edge(IlpgVertex::Link(*IP_AC), IlpgVertex::Demand(*IP_DEMAND)));
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_downwards_propagation() {
    let m = get_test_net();
    let g = m
        .get_inter_layer_propagation_graph(
            &BTreeSet::new(),
            &btreeset! {*IP_DEMAND},
            &BTreeSet::new(),
            false,
        )
        .unwrap();
    assert!(!g.is_upwards());
    assert_eq!(g.get_links_in_graph(), btreeset! {*IP_AC, *AB, *BC});
    assert_eq!(g.get_demands_in_graph(), btreeset! {*IP_DEMAND, *LP_AC});

    // the reverse lightpath is reached from the reverse IP link
    let g = m
        .get_inter_layer_propagation_graph(&btreeset! {*IP_CA}, &BTreeSet::new(), &BTreeSet::new(), false)
        .unwrap();
    assert_eq!(g.get_links_in_graph(), btreeset! {*IP_CA, *CB, *BA});
    assert_eq!(g.get_demands_in_graph(), btreeset! {*LP_CA});
}

#[test]
fn test_propagation_hop_by_hop() {
    let mut m = get_test_net();
    m.set_routing_type(RoutingType::HopByHopRouting, Some(*IP)).unwrap();
    assert_eq!(m.get_forwarding_rule(*IP_DEMAND, *IP_AC), Ok(1.0));

    let up = m
        .get_inter_layer_propagation_graph(&btreeset! {*BC}, &BTreeSet::new(), &BTreeSet::new(), true)
        .unwrap();
    assert_eq!(up.get_demands_in_graph(), btreeset! {*LP_AC, *IP_DEMAND});

    let down = m
        .get_inter_layer_propagation_graph(
            &BTreeSet::new(),
            &btreeset! {*IP_DEMAND},
            &BTreeSet::new(),
            false,
        )
        .unwrap();
    assert_eq!(down.get_links_in_graph(), btreeset! {*IP_AC, *AB, *BC});
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_multicast_flows() {
    let mut m = get_test_net();
    let md = m.add_multicast_demand(*A, btreeset! {*B, *C}, 1.0, Some(*WDM)).unwrap();
    let tree = m.add_multicast_tree(md, 1.0, 1.0, btreeset! {*AB, *BC}).unwrap();
    assert_eq!(m.get_multicast_tree_path_to_egress(tree, *C).unwrap(), vec![*AB, *BC]);
    assert_eq!(m.get_multicast_tree_path_to_egress(tree, *B).unwrap(), vec![*AB]);

    let g = m
        .get_inter_layer_propagation_graph(&btreeset! {*BC}, &BTreeSet::new(), &BTreeSet::new(), true)
        .unwrap();
    assert_eq!(g.get_multicast_demand_flows_in_graph(), btreeset! {(md, *C)});

    let g = m
        .get_inter_layer_propagation_graph(&btreeset! {*AB}, &BTreeSet::new(), &BTreeSet::new(), true)
        .unwrap();
    assert_eq!(g.get_multicast_demand_flows_in_graph(), btreeset! {(md, *B), (md, *C)});

    let g = m
        .get_inter_layer_propagation_graph(&BTreeSet::new(), &BTreeSet::new(), &btreeset! {(md, *B)}, false)
        .unwrap();
    assert_eq!(g.get_links_in_graph(), btreeset! {*AB});

    // A is not an egress node of the multicast demand
    assert_eq!(
        m.get_inter_layer_propagation_graph(&BTreeSet::new(), &BTreeSet::new(), &btreeset! {(md, *A)}, true)
            .map(|g| g.get_links_in_graph()),
        Err(NetworkModelError::ElementNotFound((*A).into()))
    );
}

#[test]
fn test_layer_coupling_graph() {
    let m = get_test_net();
    let graph = m.get_layer_coupling_graph();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.contains_edge(*IP, *WDM));

    assert_eq!(m.check_layer_coupling(*IP, *WDM), Ok(()));
    assert_eq!(m.check_layer_coupling(*WDM, *IP), Err(NetworkModelError::CouplingCycle(*WDM, *IP)));
    assert_eq!(m.check_layer_coupling(*IP, *IP), Err(NetworkModelError::CouplingCycle(*IP, *IP)));
    assert!(m.check_layer_coupling(*IP, LayerId(100)).is_err());
}
