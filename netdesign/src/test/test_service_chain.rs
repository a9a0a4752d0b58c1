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

//! Test resources and service chains.

use crate::candidate_paths::ServiceChainPathOptions;
use crate::example_networks::{ExampleNetwork, ServiceChainNet};
use crate::model::{
    DemandId, LinkId, NetworkModel, NetworkModelError, NodeId, PathElement, RecoveryType,
    ResourceId, RouteId,
};
use assert_approx_eq::assert_approx_eq;
use lazy_static::lazy_static;
use maplit::btreemap;

lazy_static! {
    static ref A: NodeId = NodeId(1);
    static ref B: NodeId = NodeId(2);
    static ref C: NodeId = NodeId(3);
    static ref AB: LinkId = LinkId(4);
    static ref BA: LinkId = LinkId(5);
    static ref BC: LinkId = LinkId(6);
    static ref CB: LinkId = LinkId(7);
    static ref CPU: ResourceId = ResourceId(8);
    static ref FW: ResourceId = ResourceId(9);
    static ref NAT: ResourceId = ResourceId(10);
    static ref AC: DemandId = DemandId(11);
    static ref CHAIN: RouteId = RouteId(12);
}

/// # Test network
///
/// The demand from A to C must traverse a firewall (at B) and a NAT (at C). The firewall runs on
/// the server at B, occupying 2 of its 8 cores.
///
/// ```text
///            [CPU]
///            [FW]          [NAT]
///   A ------- B ------------ C
/// ```
fn get_test_net() -> NetworkModel {
    let m = ServiceChainNet::model().unwrap();
    assert_eq!(m.get_demands(None).unwrap(), vec![*AC]);
    assert_eq!(m.get_routes(None).unwrap(), vec![*CHAIN]);
    assert_eq!(m.get_resource(*FW).unwrap().base_resources(), &btreemap! {*CPU => 2.0});
    m
}

fn fw_nat_path() -> Vec<PathElement> {
    vec![
        PathElement::Link(*AB),
        PathElement::Resource(*FW),
        PathElement::Link(*BC),
        PathElement::Resource(*NAT),
    ]
}

#[test]
fn test_resource_occupation() {
    let m = get_test_net();
    let route = m.get_route(*CHAIN).unwrap();
    assert_eq!(route.links().collect::<Vec<_>>(), vec![*AB, *BC]);
    assert_eq!(route.resources().collect::<Vec<_>>(), vec![*FW, *NAT]);

    assert_eq!(m.get_resource(*FW).unwrap().occupied_capacity(), 2.0);
    assert_eq!(m.get_resource(*NAT).unwrap().occupied_capacity(), 2.0);
    // the firewall occupies its base resource, independent of the traffic
    assert_eq!(m.get_resource(*CPU).unwrap().occupied_capacity(), 2.0);
    assert_eq!(m.get_resource(*CPU).unwrap().upper_resources().len(), 1);
    assert_eq!(m.get_link(*AB).unwrap().occupied_capacity(), 2.0);
    assert_eq!(m.get_link(*BA).unwrap().occupied_capacity(), 0.0);
    assert_eq!(m.get_node(*B).unwrap().resources().len(), 2);
    assert_eq!(m.get_resources_of_type(ServiceChainNet::FIREWALL), vec![*FW]);

    // 0.25 ms per link, plus the processing delay of both resources
    assert_approx_eq!(m.get_route_propagation_delay_ms(*CHAIN).unwrap(), 1.25);
    assert_approx_eq!(m.get_demand_worst_case_propagation_delay_ms(*AC).unwrap(), 1.25);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_invalid_service_chains() {
    let mut m = get_test_net();
    let before = m.copy();
    let h = ServiceChainNet::TRAFFIC;

    // the NAT is skipped
    assert_eq!(
        m.add_service_chain(
            *AC,
            h,
            vec![h, h, h],
            vec![PathElement::Link(*AB), PathElement::Resource(*FW), PathElement::Link(*BC)],
        ),
        Err(NetworkModelError::ServiceChainMismatch(*AC))
    );
    // the resources are traversed in the wrong order
    assert_eq!(
        m.add_service_chain(
            *AC,
            h,
            vec![h, h, h, h, h],
            vec![
                PathElement::Link(*AB),
                PathElement::Link(*BC),
                PathElement::Resource(*NAT),
                PathElement::Link(*CB),
                PathElement::Resource(*FW),
            ],
        ),
        Err(NetworkModelError::ServiceChainMismatch(*AC))
    );
    // the firewall is used at a node where it is not hosted
    assert_eq!(
        m.add_service_chain(
            *AC,
            h,
            vec![h, h, h, h],
            vec![
                PathElement::Link(*AB),
                PathElement::Link(*BC),
                PathElement::Resource(*FW),
                PathElement::Resource(*NAT),
            ],
        ),
        Err(NetworkModelError::ResourceHostMismatch(*FW, *C))
    );
    // a plain route misses both resources
    assert_eq!(
        m.add_route(*AC, h, h, &[*AB, *BC]),
        Err(NetworkModelError::ServiceChainMismatch(*AC))
    );
    // the chain cannot be dropped while the route traverses resources
    assert_eq!(
        m.set_demand_service_chain_types(*AC, vec![]),
        Err(NetworkModelError::ServiceChainMismatch(*AC))
    );
    assert!(m.is_deep_copy(&before));

    m.add_service_chain(*AC, 1.0, vec![1.0; 4], fw_nat_path()).unwrap();
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_resource_oversubscription() {
    let mut m = get_test_net();
    assert!(!m.is_resource_oversubscribed(*FW).unwrap());

    m.add_service_chain(*AC, 4.0, vec![4.0; 4], fw_nat_path()).unwrap();
    assert_eq!(m.get_resource(*FW).unwrap().occupied_capacity(), 6.0);
    assert!(m.is_resource_oversubscribed(*FW).unwrap());
    assert!(m.is_resource_oversubscribed(*NAT).unwrap());
    assert!(!m.is_resource_oversubscribed(*CPU).unwrap());

    m.set_resource_capacity(*FW, 10.0, None).unwrap();
    assert!(!m.is_resource_oversubscribed(*FW).unwrap());

    // the firewall now needs all cores of the server
    m.set_resource_capacity(*FW, 10.0, Some(btreemap! {*CPU => 9.0})).unwrap();
    assert!(m.is_resource_oversubscribed(*CPU).unwrap());
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_base_resources() {
    let mut m = get_test_net();
    let before = m.copy();

    // the base resource must be hosted at the same node
    assert_eq!(
        m.add_resource("VPN", "vpn", *C, 5.0, "Gbps", btreemap! {*CPU => 1.0}, 0.0),
        Err(NetworkModelError::ResourceHostMismatch(*CPU, *C))
    );
    // the server cannot run on the firewall it is hosting
    assert!(m.set_resource_capacity(*CPU, 8.0, Some(btreemap! {*FW => 1.0})).is_err());
    assert!(m.is_deep_copy(&before));

    let vpn = m.add_resource("VPN", "vpn", *B, 5.0, "Gbps", btreemap! {*CPU => 3.0}, 0.0).unwrap();
    assert_eq!(m.get_resource(*CPU).unwrap().occupied_capacity(), 5.0);
    assert_eq!(m.get_resource(vpn).unwrap().host(), *B);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_remove_resource_cascades() {
    let mut m = get_test_net();
    m.remove_resource(*CPU).unwrap();
    assert!(m.get_resource(*CPU).is_err());
    assert!(m.get_resource(*FW).is_err());
    assert!(m.get_route(*CHAIN).is_err());
    assert_eq!(m.get_resources(), vec![*NAT]);
    assert_eq!(m.get_resource(*NAT).unwrap().occupied_capacity(), 0.0);
    assert_eq!(m.get_demand(*AC).unwrap().carried_traffic(), 0.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_host_failure() {
    let mut m = get_test_net();
    m.set_node_failure_state(*B, false).unwrap();
    assert!(m.get_route(*CHAIN).unwrap().is_down());
    assert_eq!(m.get_resource(*FW).unwrap().occupied_capacity(), 0.0);
    // the firewall still occupies its share of the server
    assert_eq!(m.get_resource(*CPU).unwrap().occupied_capacity(), 2.0);
    assert!(m.is_demand_blocked(*AC).unwrap());
    m.check_caches_consistency().unwrap();

    m.set_node_failure_state(*B, true).unwrap();
    assert_eq!(m.get_resource(*FW).unwrap().occupied_capacity(), 2.0);
    assert!(!m.is_demand_blocked(*AC).unwrap());
}

#[test]
fn test_service_chain_demand() {
    let mut m = get_test_net();
    let d = m
        .add_service_chain_demand(*C, *A, 1.0, RecoveryType::None, vec!["NAT".to_string()], None)
        .unwrap();
    assert!(m.get_demand(d).unwrap().is_service_chain());
    assert_eq!(m.get_demand(d).unwrap().service_chain_types().to_vec(), vec!["NAT".to_string()]);
    m.add_service_chain(
        d,
        1.0,
        vec![1.0; 3],
        vec![PathElement::Resource(*NAT), PathElement::Link(*CB), PathElement::Link(*BA)],
    )
    .unwrap();
    assert_eq!(m.get_resource(*NAT).unwrap().occupied_capacity(), 3.0);

    let chain = vec![ServiceChainNet::FIREWALL.to_string(), ServiceChainNet::NAT.to_string()];
    m.set_demand_service_chain_types(*AC, chain).unwrap();
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_candidate_service_chains() {
    let m = get_test_net();
    let candidates = m
        .compute_unicast_candidate_service_chain_list(None, None, &ServiceChainPathOptions::default(), None)
        .unwrap();
    assert_eq!(candidates, btreemap! {*AC => vec![fw_nat_path()]});

    let options =
        ServiceChainPathOptions { max_prop_delay_ms: Some(1.0), ..Default::default() };
    let candidates =
        m.compute_unicast_candidate_service_chain_list(None, None, &options, None).unwrap();
    assert!(candidates[&*AC].is_empty());
}
