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

//! Test hop-by-hop routing and the conversion between the routing types.

use crate::example_networks::{ExampleNetwork, ServiceChainNet};
use crate::model::{
    DemandId, LayerId, LinkId, NetworkModel, NetworkModelError, NodeId, RecoveryType,
    RoutingCycleType, RoutingType, DEFAULT_PROPAGATION_SPEED_KM_PER_S,
};
use assert_approx_eq::assert_approx_eq;
use lazy_static::lazy_static;
use maplit::btreemap;

lazy_static! {
    static ref LAYER: LayerId = LayerId(0);
    static ref A: NodeId = NodeId(1);
    static ref B: NodeId = NodeId(2);
    static ref C: NodeId = NodeId(3);
    static ref D: NodeId = NodeId(4);
    static ref AB: LinkId = LinkId(5);
    static ref BC: LinkId = LinkId(6);
    static ref CA: LinkId = LinkId(7);
    static ref AC: LinkId = LinkId(8);
    static ref BD: LinkId = LinkId(9);
    static ref CD: LinkId = LinkId(10);
    static ref AD: DemandId = DemandId(11);
}

/// # Test network
///
/// All links are unidirectional, with capacity 10 and a length of 100 km. A single demand from A
/// to D offers 5 units of traffic.
///
/// ```text
/// A ---> B ---> D
/// ^ \    |      ^
/// |  \   v      |
/// |   '> C -----'
/// '------'
/// ```
fn get_test_net() -> NetworkModel {
    let mut m = NetworkModel::new();
    let speed = DEFAULT_PROPAGATION_SPEED_KM_PER_S;

    assert_eq!(*A, m.add_node("A", 0.0, 1.0));
    assert_eq!(*B, m.add_node("B", 1.0, 1.0));
    assert_eq!(*C, m.add_node("C", 1.0, 0.0));
    assert_eq!(*D, m.add_node("D", 2.0, 1.0));

    assert_eq!(*AB, m.add_link(*A, *B, 10.0, 100.0, speed, None).unwrap());
    assert_eq!(*BC, m.add_link(*B, *C, 10.0, 100.0, speed, None).unwrap());
    assert_eq!(*CA, m.add_link(*C, *A, 10.0, 100.0, speed, None).unwrap());
    assert_eq!(*AC, m.add_link(*A, *C, 10.0, 100.0, speed, None).unwrap());
    assert_eq!(*BD, m.add_link(*B, *D, 10.0, 100.0, speed, None).unwrap());
    assert_eq!(*CD, m.add_link(*C, *D, 10.0, 100.0, speed, None).unwrap());

    assert_eq!(*AD, m.add_demand(*A, *D, 5.0, RecoveryType::None, None).unwrap());

    m
}

/// Test network in hop-by-hop routing, without any forwarding rules.
fn get_test_net_hop_by_hop() -> NetworkModel {
    let mut m = get_test_net();
    m.set_routing_type(RoutingType::HopByHopRouting, None).unwrap();
    assert!(m.get_forwarding_rules(None).unwrap().is_empty());
    m
}

/// Occupied capacity of every link
fn occupation(m: &NetworkModel) -> Vec<(LinkId, f64)> {
    m.get_links(None)
        .unwrap()
        .into_iter()
        .map(|l| (l, m.get_link(l).unwrap().occupied_capacity()))
        .collect()
}

fn assert_same_occupation(a: &[(LinkId, f64)], b: &[(LinkId, f64)]) {
    assert_eq!(a.len(), b.len());
    for ((la, xa), (lb, xb)) in a.iter().zip(b.iter()) {
        assert_eq!(la, lb);
        assert_approx_eq!(xa, xb);
    }
}

#[test]
fn test_round_trip_preserves_traffic() {
    let mut m = get_test_net();
    m.add_route(*AD, 2.0, 2.0, &[*AB, *BD]).unwrap();
    m.add_route(*AD, 3.0, 3.0, &[*AC, *CD]).unwrap();
    let before = occupation(&m);

    m.set_routing_type(RoutingType::HopByHopRouting, None).unwrap();
    assert_eq!(m.get_layer(*LAYER).unwrap().routing_type(), RoutingType::HopByHopRouting);
    assert!(m.get_routes(None).unwrap().is_empty());
    assert_approx_eq!(m.get_forwarding_rule(*AD, *AB).unwrap(), 0.4);
    assert_approx_eq!(m.get_forwarding_rule(*AD, *AC).unwrap(), 0.6);
    assert_approx_eq!(m.get_forwarding_rule(*AD, *BD).unwrap(), 1.0);
    assert_approx_eq!(m.get_forwarding_rule(*AD, *CD).unwrap(), 1.0);
    assert_eq!(m.get_forwarding_rule(*AD, *BC).unwrap(), 0.0);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 5.0);
    assert_same_occupation(&before, &occupation(&m));
    assert_eq!(m.get_demand_routing_cycle_type(*AD), Ok(RoutingCycleType::Loopless));
    m.check_caches_consistency().unwrap();

    m.set_routing_type(RoutingType::SourceRouting, None).unwrap();
    assert!(m.get_forwarding_rules(None).unwrap().is_empty());
    let routes = m.get_routes(None).unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(m.get_route(routes[0]).unwrap().links().collect::<Vec<_>>(), vec![*AB, *BD]);
    assert_approx_eq!(m.get_route(routes[0]).unwrap().carried_traffic(), 2.0);
    assert_approx_eq!(m.get_route(routes[1]).unwrap().carried_traffic(), 3.0);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 5.0);
    assert_same_occupation(&before, &occupation(&m));
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_round_trip_preserves_blocked_traffic() {
    let mut m = get_test_net();
    m.add_route(*AD, 4.0, 4.0, &[*AB, *BD]).unwrap();

    m.set_routing_type(RoutingType::HopByHopRouting, None).unwrap();
    assert_approx_eq!(m.get_forwarding_rule(*AD, *AB).unwrap(), 0.8);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 4.0);
    assert_approx_eq!(m.get_blocked_traffic(*AD).unwrap(), 1.0);

    m.set_routing_type(RoutingType::SourceRouting, None).unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 4.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_round_trip_normalizes_occupation() {
    let mut m = get_test_net();
    let primary = m.add_route(*AD, 2.0, 3.0, &[*AB, *BD]).unwrap();
    let backup = m.add_route(*AD, 2.0, 2.0, &[*AC, *CD]).unwrap();
    m.add_backup_route(primary, backup).unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.0);
    assert_approx_eq!(m.get_link(*AB).unwrap().occupied_capacity(), 3.0);
    assert_approx_eq!(m.get_link(*CD).unwrap().occupied_capacity(), 2.0);

    // the backup route is dropped, and the links only carry the traffic of the primary route
    m.set_routing_type(RoutingType::HopByHopRouting, None).unwrap();
    assert_approx_eq!(m.get_forwarding_rule(*AD, *AB).unwrap(), 0.4);
    assert_eq!(m.get_forwarding_rule(*AD, *AC).unwrap(), 0.0);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.0);
    assert_approx_eq!(m.get_link(*AB).unwrap().occupied_capacity(), 2.0);
    assert_approx_eq!(m.get_link(*BD).unwrap().occupied_capacity(), 2.0);
    assert_eq!(m.get_link(*AC).unwrap().occupied_capacity(), 0.0);
    assert_eq!(m.get_link(*CD).unwrap().occupied_capacity(), 0.0);
    m.check_caches_consistency().unwrap();

    m.set_routing_type(RoutingType::SourceRouting, None).unwrap();
    let routes = m.get_routes(None).unwrap();
    assert_eq!(routes.len(), 1);
    let route = m.get_route(routes[0]).unwrap();
    assert_eq!(route.links().collect::<Vec<_>>(), vec![*AB, *BD]);
    assert!(!route.has_backup_routes());
    assert_approx_eq!(route.carried_traffic(), 2.0);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.0);
    assert_approx_eq!(m.get_link(*AB).unwrap().occupied_capacity(), 2.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_hop_by_hop_traffic() {
    let mut m = get_test_net_hop_by_hop();
    m.set_forwarding_rules(&btreemap! {
        (*AD, *AB) => 0.5,
        (*AD, *AC) => 0.5,
        (*AD, *BD) => 1.0,
        (*AD, *CD) => 1.0,
    })
    .unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 5.0);
    assert_approx_eq!(m.get_link(*AB).unwrap().carried_traffic(), 2.5);
    assert_approx_eq!(m.get_link(*CD).unwrap().occupied_capacity(), 2.5);
    assert_approx_eq!(m.get_demand_worst_case_propagation_delay_ms(*AD).unwrap(), 1.0);

    // traffic sent over a failed link is lost
    m.set_link_failure_state(*BD, false).unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.5);
    assert_eq!(m.get_link(*BD).unwrap().carried_traffic(), 0.0);
    m.set_link_failure_state(*BD, true).unwrap();

    // removing a rule drops the traffic at that node
    m.remove_forwarding_rule(*AD, *CD).unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.5);
    assert_eq!(m.get_demand_forwarding_rules(*AD).unwrap().len(), 3);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_open_cycles() {
    let mut m = get_test_net_hop_by_hop();
    m.set_forwarding_rules(&btreemap! {
        (*AD, *AB) => 1.0,
        (*AD, *BC) => 0.5,
        (*AD, *BD) => 0.5,
        (*AD, *CA) => 1.0,
    })
    .unwrap();
    assert_eq!(m.get_demand_routing_cycle_type(*AD), Ok(RoutingCycleType::OpenCycles));
    // traffic loops through A -> B -> C -> A, and half of it leaves at B every time
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 5.0);
    assert_approx_eq!(m.get_link(*AB).unwrap().carried_traffic(), 10.0);
    assert_approx_eq!(m.get_link(*CA).unwrap().carried_traffic(), 5.0);
    assert!(!m.is_link_oversubscribed(*AB).unwrap());
    m.check_caches_consistency().unwrap();

    // only the simple path is converted into a route
    m.set_routing_type(RoutingType::SourceRouting, None).unwrap();
    let routes = m.get_routes(None).unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(m.get_route(routes[0]).unwrap().links().collect::<Vec<_>>(), vec![*AB, *BD]);
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 2.5);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_invalid_forwarding_rules() {
    let mut m = get_test_net_hop_by_hop();
    let before = m.copy();

    assert_eq!(
        m.set_forwarding_rules(&btreemap! {
            (*AD, *AB) => 1.0,
            (*AD, *BC) => 1.0,
            (*AD, *CA) => 1.0,
        }),
        Err(NetworkModelError::ClosedCycleRouting(*AD))
    );
    assert_eq!(
        m.set_forwarding_rules(&btreemap! {(*AD, *AB) => 0.7, (*AD, *AC) => 0.7}),
        Err(NetworkModelError::ForwardingRulesExceedOne(*AD, *A, 1.4))
    );
    assert!(matches!(
        m.set_forwarding_rules(&btreemap! {(*AD, *AB) => 0.5, (*AD, *AC) => 0.5005}),
        Err(NetworkModelError::ForwardingRulesExceedOne(_, _, _))
    ));
    assert_eq!(
        m.set_forwarding_rule(*AD, *AB, 1.5),
        Err(NetworkModelError::InvalidValue("splitting factor", 1.5))
    );
    assert_eq!(
        m.add_route(*AD, 1.0, 1.0, &[*AB, *BD]),
        Err(NetworkModelError::WrongRoutingType(*LAYER, RoutingType::SourceRouting))
    );
    assert!(m.is_deep_copy(&before));
    m.check_caches_consistency().unwrap();

    // rounding errors in the sum are tolerated
    m.set_forwarding_rules(&btreemap! {
        (*AD, *AB) => 0.1 + 0.2,
        (*AD, *AC) => 0.7,
        (*AD, *BD) => 1.0,
        (*AD, *CD) => 1.0,
    })
    .unwrap();
    assert_approx_eq!(m.get_demand(*AD).unwrap().carried_traffic(), 5.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_forwarding_rules_in_source_routing() {
    let mut m = get_test_net();
    assert_eq!(
        m.set_forwarding_rule(*AD, *AB, 1.0),
        Err(NetworkModelError::WrongRoutingType(*LAYER, RoutingType::HopByHopRouting))
    );
    let r = m.add_route(*AD, 5.0, 5.0, &[*AB, *BC, *CA, *AC, *CD]);
    // the route visits A and C twice, but never uses a link twice
    let r = r.unwrap();
    assert_eq!(m.get_route_sequence_of_nodes(r).unwrap(), vec![*A, *B, *C, *A, *C, *D]);
    assert_eq!(m.get_demand_routing_cycle_type(*AD), Ok(RoutingCycleType::OpenCycles));
}

#[test]
fn test_service_chain_in_hop_by_hop() {
    let mut m = ServiceChainNet::model().unwrap();
    let before = m.copy();
    let d = m.get_demands(None).unwrap()[0];
    assert_eq!(
        m.set_routing_type(RoutingType::HopByHopRouting, None),
        Err(NetworkModelError::ServiceChainInHopByHop(d))
    );
    assert!(m.is_deep_copy(&before));
}
