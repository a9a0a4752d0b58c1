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

//! Test shared risk groups and the failure analysis across layers.

use crate::example_networks::{ExampleNetwork, IpOverWdmNet};
use crate::model::{
    DemandId, LayerId, LinkId, NetworkModel, NetworkModelError, NodeId, RouteId, SrgId,
};
use assert_approx_eq::assert_approx_eq;
use lazy_static::lazy_static;
use maplit::btreeset;

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
    static ref CD: LinkId = LinkId(10);
    static ref LP_AC: DemandId = DemandId(14);
    static ref LP_CA: DemandId = DemandId(15);
    static ref R_LP_AC: RouteId = RouteId(16);
    static ref R_LP_CA: RouteId = RouteId(17);
    static ref IP_AC: LinkId = LinkId(18);
    static ref IP_CA: LinkId = LinkId(19);
    static ref IP_DEMAND: DemandId = DemandId(20);
    static ref R_IP: RouteId = RouteId(21);
    static ref SRG: SrgId = SrgId(22);
}

/// # Test network
///
/// The fiber between A and B (both directions) forms a single shared risk group.
///
/// ```text
///   IP:     A =============== C
///
///   WDM:    A ----- B ----- C
///           |               |
///           +------ D ------+
/// ```
fn get_test_net() -> NetworkModel {
    let mut m = IpOverWdmNet::model().unwrap();
    assert_eq!(*SRG, m.add_srg(1000.0, 10.0).unwrap());
    m.add_link_to_srg(*SRG, *AB).unwrap();
    m.add_link_to_srg(*SRG, *BA).unwrap();
    m
}

#[test]
fn test_srg_members() {
    let mut m = get_test_net();
    let srg = m.get_srg(*SRG).unwrap();
    assert_eq!(srg.links(), &btreeset! {*AB, *BA});
    assert!(srg.nodes().is_empty());
    assert_approx_eq!(m.get_srg_availability(*SRG).unwrap(), 1000.0 / 1010.0);
    assert_eq!(m.get_link(*AB).unwrap().srgs(), &btreeset! {*SRG});

    m.remove_link_from_srg(*SRG, *BA).unwrap();
    assert_eq!(
        m.remove_link_from_srg(*SRG, *BA),
        Err(NetworkModelError::ElementNotFound((*BA).into()))
    );
    assert!(m.get_link(*BA).unwrap().srgs().is_empty());
    assert!(m.add_srg(-1.0, 1.0).is_err());
    m.check_caches_consistency().unwrap();

    // removing a link removes it from the group
    m.remove_link(*AB).unwrap();
    assert!(m.get_srg(*SRG).unwrap().links().is_empty());
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_srg_failure() {
    let mut m = get_test_net();
    let before = m.copy();

    m.set_srg_as_down(*SRG).unwrap();
    assert!(m.is_srg_down(*SRG).unwrap());
    assert_eq!(m.get_srgs_down(), btreeset! {*SRG});
    assert_eq!(m.get_links_down(None).unwrap(), vec![*AB, *BA]);
    assert!(m.get_route(*R_LP_AC).unwrap().is_down());
    assert!(m.get_route(*R_LP_CA).unwrap().is_down());
    assert_eq!(m.get_demand(*LP_AC).unwrap().carried_traffic(), 0.0);
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), 0.0);
    assert_eq!(m.get_link(*IP_CA).unwrap().capacity(), 0.0);
    // the IP route is still up, but it is now oversubscribing the IP link
    assert!(m.get_route(*R_IP).unwrap().is_up());
    assert_eq!(m.get_links_oversubscribed(Some(*IP)).unwrap(), vec![*IP_AC]);
    m.check_caches_consistency().unwrap();

    m.set_srg_as_up(*SRG).unwrap();
    assert!(!m.is_srg_down(*SRG).unwrap());
    assert!(m.is_deep_copy(&before));
}

#[test]
fn test_partial_srg_failure() {
    let mut m = get_test_net();
    let empty = m.add_srg(1.0, 1.0).unwrap();
    assert!(!m.is_srg_down(empty).unwrap());

    m.set_link_failure_state(*AB, false).unwrap();
    assert!(!m.is_srg_down(*SRG).unwrap());
    assert!(m.get_srgs_down().is_empty());
    m.set_link_failure_state(*BA, false).unwrap();
    assert!(m.is_srg_down(*SRG).unwrap());

    // groups without members are never down
    assert_eq!(m.get_srgs_down(), btreeset! {*SRG});
    m.set_all_links_failure_state(false, None).unwrap();
    assert!(!m.get_srgs_down().contains(&empty));
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_srg_affected_elements() {
    let m = get_test_net();
    assert_eq!(
        m.get_srg_affected_links_all_layers(*SRG).unwrap(),
        btreeset! {*AB, *BA, *IP_AC, *IP_CA}
    );
    assert_eq!(
        m.get_srg_affected_demands_all_layers(*SRG).unwrap(),
        btreeset! {*LP_AC, *LP_CA, *IP_DEMAND}
    );
    assert_eq!(
        m.get_srg_affected_routes_all_layers(*SRG).unwrap(),
        btreeset! {*R_LP_AC, *R_LP_CA, *R_IP}
    );
    assert!(m.get_srg_affected_multicast_trees_all_layers(*SRG).unwrap().is_empty());
}

#[test]
fn test_srgs_per_node() {
    let mut m = get_test_net();
    let srgs = m.add_srgs_per_node(1000.0, 1.0).unwrap();
    assert_eq!(srgs.len(), 4);
    let srg_b = *m.get_node(*B).unwrap().srgs().iter().next().unwrap();

    // a failure of B affects everything routed over B
    assert_eq!(
        m.get_srg_affected_demands_all_layers(srg_b).unwrap(),
        btreeset! {*LP_AC, *LP_CA, *IP_DEMAND}
    );
    let links = m.get_srg_affected_links_all_layers(srg_b).unwrap();
    assert!(links.contains(&*BC) && links.contains(&*CB) && links.contains(&*IP_AC));
    assert!(!links.contains(&*CD));

    m.set_srg_as_down(srg_b).unwrap();
    assert_eq!(m.get_nodes_down(), vec![*B]);
    assert!(m.get_route(*R_LP_AC).unwrap().is_down());
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), 0.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_srgs_per_link() {
    let mut m = get_test_net();
    let joined = m.add_srgs_per_link(Some(*WDM), 1000.0, 1.0, true).unwrap();
    assert_eq!(joined.len(), 4);
    for s in joined.iter() {
        assert_eq!(m.get_srg(*s).unwrap().links().len(), 2);
    }
    let single = m.add_srgs_per_link(Some(*IP), 1000.0, 1.0, false).unwrap();
    assert_eq!(single.len(), 2);
    assert_eq!(m.get_srgs().len(), 7);
    assert_eq!(m.get_link(*AB).unwrap().srgs().len(), 2);
    m.check_caches_consistency().unwrap();

    m.remove_srg(*SRG).unwrap();
    assert_eq!(m.get_link(*AB).unwrap().srgs().len(), 1);
    m.check_caches_consistency().unwrap();
}
