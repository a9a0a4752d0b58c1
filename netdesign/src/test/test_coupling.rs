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

//! Test the coupling of layers on the IP over WDM example network.

use crate::example_networks::{ExampleNetwork, IpOverWdmNet};
use crate::model::{
    DemandId, LayerId, LinkId, NetworkModel, NetworkModelError, NodeId, RecoveryType, RouteId,
    DEFAULT_PROPAGATION_SPEED_KM_PER_S,
};
use lazy_static::lazy_static;
use maplit::btreeset;

lazy_static! {
    static ref WDM: LayerId = LayerId(0);
    static ref IP: LayerId = LayerId(1);
    static ref A: NodeId = NodeId(2);
    static ref B: NodeId = NodeId(3);
    static ref C: NodeId = NodeId(4);
    static ref D: NodeId = NodeId(5);
    static ref AB: LinkId = LinkId(6);
    static ref BA: LinkId = LinkId(7);
    static ref BC: LinkId = LinkId(8);
    static ref CB: LinkId = LinkId(9);
    static ref CD: LinkId = LinkId(10);
    static ref LP_AC: DemandId = DemandId(14);
    static ref LP_CA: DemandId = DemandId(15);
    static ref R_LP_AC: RouteId = RouteId(16);
    static ref IP_AC: LinkId = LinkId(18);
    static ref IP_CA: LinkId = LinkId(19);
    static ref IP_DEMAND: DemandId = DemandId(20);
    static ref R_IP: RouteId = RouteId(21);
}

const SPEED: f64 = DEFAULT_PROPAGATION_SPEED_KM_PER_S;

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
    let m = IpOverWdmNet::model().unwrap();
    assert_eq!(m.get_layer_by_name(IpOverWdmNet::WDM), Ok(*WDM));
    assert_eq!(m.get_layer_by_name(IpOverWdmNet::IP), Ok(*IP));
    assert_eq!(m.get_node_by_name("D"), Ok(*D));
    assert_eq!(m.get_link(*IP_AC).unwrap().coupled_demand(), Some(*LP_AC));
    assert_eq!(m.get_route(*R_IP).unwrap().demand(), *IP_DEMAND);
    m
}

#[test]
fn test_coupled_capacity() {
    let mut m = get_test_net();
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    assert_eq!(m.get_link(*IP_CA).unwrap().capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    assert_eq!(m.get_link(*IP_AC).unwrap().occupied_capacity(), IpOverWdmNet::IP_TRAFFIC);
    assert_eq!(m.get_demand(*LP_AC).unwrap().coupled_upper_link(), Some(*IP_AC));
    assert_eq!(m.get_link(*IP_AC).unwrap().bidirectional_pair(), Some(*IP_CA));
    assert_eq!(m.get_link(*IP_AC).unwrap().length_km(), 0.0);

    // the capacity follows the carried traffic of the lightpath
    m.set_route_carried_traffic(*R_LP_AC, 30.0, 30.0).unwrap();
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), 30.0);
    assert_eq!(m.set_link_capacity(*IP_AC, 50.0), Err(NetworkModelError::CapacityIsCoupled(*IP_AC)));
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_lower_layer_failure() {
    let mut m = get_test_net();
    let before = m.copy();

    m.set_link_failure_state(*AB, false).unwrap();
    assert!(m.get_route(*R_LP_AC).unwrap().is_down());
    assert_eq!(m.get_demand(*LP_AC).unwrap().carried_traffic(), 0.0);
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), 0.0);
    // the IP link itself is up, but it has no capacity anymore
    assert!(m.get_link(*IP_AC).unwrap().is_up());
    assert!(m.is_link_oversubscribed(*IP_AC).unwrap());
    assert_eq!(m.get_link(*IP_CA).unwrap().capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    m.check_caches_consistency().unwrap();

    m.set_link_failure_state(*AB, true).unwrap();
    assert!(m.is_deep_copy(&before));
}

#[test]
fn test_decouple_and_recouple() {
    let mut m = get_test_net();

    m.decouple_demand(*LP_AC).unwrap();
    assert!(!m.get_link(*IP_AC).unwrap().is_coupled());
    assert!(!m.get_demand(*LP_AC).unwrap().is_coupled());
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    assert_eq!(m.decouple_demand(*LP_AC), Err(NetworkModelError::NotCoupled((*LP_AC).into())));
    m.check_caches_consistency().unwrap();

    // the capacity is now independent of the lightpath
    m.set_route_carried_traffic(*R_LP_AC, 30.0, 30.0).unwrap();
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    m.set_link_capacity(*IP_AC, 100.0).unwrap();

    m.couple_link_to_lower_layer_demand(*IP_AC, *LP_AC).unwrap();
    assert_eq!(m.get_link(*IP_AC).unwrap().capacity(), 30.0);
    m.check_caches_consistency().unwrap();

    m.decouple_link(*IP_CA).unwrap();
    assert!(!m.get_demand(*LP_CA).unwrap().is_coupled());
    assert_eq!(m.decouple_link(*IP_CA), Err(NetworkModelError::NotCoupled((*IP_CA).into())));
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_coupling_cycle() {
    let mut m = get_test_net();
    let ip_ab = m.add_demand(*A, *B, 1.0, RecoveryType::None, Some(*IP)).unwrap();
    let before = m.copy();

    // IP already relies on WDM, so WDM cannot rely on IP
    assert_eq!(
        m.couple_demand_to_upper_layer_link(ip_ab, *AB),
        Err(NetworkModelError::CouplingCycle(*WDM, *IP))
    );
    assert_eq!(
        m.couple_demand_to_new_link_created(ip_ab, *WDM),
        Err(NetworkModelError::CouplingCycle(*WDM, *IP))
    );
    assert_eq!(
        m.couple_link_to_new_demand_created(*AB, *IP),
        Err(NetworkModelError::CouplingCycle(*WDM, *IP))
    );
    // a layer cannot rely on itself
    assert_eq!(
        m.couple_demand_to_new_link_created(ip_ab, *IP),
        Err(NetworkModelError::CouplingCycle(*IP, *IP))
    );
    assert!(m.is_deep_copy(&before));
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_invalid_coupling() {
    let mut m = get_test_net();
    let ip_ac = m.add_link(*A, *C, 10.0, 0.0, SPEED, Some(*IP)).unwrap();
    let wdm_ab = m.add_demand(*A, *B, 10.0, RecoveryType::None, Some(*WDM)).unwrap();
    let before = m.copy();

    assert_eq!(
        m.couple_demand_to_upper_layer_link(*LP_AC, ip_ac),
        Err(NetworkModelError::AlreadyCoupled((*LP_AC).into()))
    );
    assert_eq!(
        m.couple_demand_to_upper_layer_link(wdm_ab, *IP_AC),
        Err(NetworkModelError::AlreadyCoupled((*IP_AC).into()))
    );
    assert_eq!(
        m.couple_demand_to_upper_layer_link(wdm_ab, ip_ac),
        Err(NetworkModelError::CouplingEndpointMismatch(wdm_ab.into(), ip_ac.into()))
    );
    assert!(m.is_deep_copy(&before));
}

#[test]
fn test_couple_link_to_new_demand() {
    let mut m = get_test_net();
    let ip_bd = m.add_link(*B, *D, 10.0, 0.0, SPEED, Some(*IP)).unwrap();

    let lp = m.couple_link_to_new_demand_created(ip_bd, *WDM).unwrap();
    let demand = m.get_demand(lp).unwrap();
    assert_eq!(demand.layer(), *WDM);
    assert_eq!((demand.ingress(), demand.egress()), (*B, *D));
    assert_eq!(demand.offered_traffic(), 10.0);
    // not routed yet
    assert_eq!(m.get_link(ip_bd).unwrap().capacity(), 0.0);

    m.add_route(lp, 10.0, 10.0, &[*BC, *CD]).unwrap();
    assert_eq!(m.get_link(ip_bd).unwrap().capacity(), 10.0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_remove_coupled_demand() {
    let mut m = get_test_net();
    m.remove_demand(*LP_AC).unwrap();
    let link = m.get_link(*IP_AC).unwrap();
    assert!(!link.is_coupled());
    assert_eq!(link.capacity(), IpOverWdmNet::LIGHTPATH_TRAFFIC);
    assert_eq!(m.get_layer_coupling_graph().edge_count(), 1);
    m.check_caches_consistency().unwrap();

    m.remove_link(*IP_CA).unwrap();
    assert!(!m.get_demand(*LP_CA).unwrap().is_coupled());
    assert_eq!(m.get_layer_coupling_graph().edge_count(), 0);
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_multicast_coupling() {
    let mut m = get_test_net();
    let md = m.add_multicast_demand(*A, btreeset! {*B, *C}, 5.0, Some(*WDM)).unwrap();

    let links = m.couple_multicast_demand_to_new_links_created(md, *IP).unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(m.get_multicast_demand(md).unwrap().coupled_upper_links().len(), 2);
    for l in links.iter() {
        assert_eq!(m.get_link(*l).unwrap().coupled_multicast_demand(), Some(md));
        assert_eq!(m.get_link(*l).unwrap().capacity(), 0.0);
    }

    m.add_multicast_tree(md, 5.0, 5.0, btreeset! {*AB, *BC}).unwrap();
    for l in links.iter() {
        assert_eq!(m.get_link(*l).unwrap().capacity(), 5.0);
    }
    m.check_caches_consistency().unwrap();

    // decoupling one link decouples the whole multicast demand
    let first = *links.iter().next().unwrap();
    m.decouple_link(first).unwrap();
    assert!(!m.get_multicast_demand(md).unwrap().is_coupled());
    assert!(links.iter().all(|l| !m.get_link(*l).unwrap().is_coupled()));
    m.check_caches_consistency().unwrap();

    assert!(matches!(
        m.couple_multicast_demand(md, btreeset! {first}),
        Err(NetworkModelError::InvalidMulticastTree(_, _))
    ));
    m.couple_multicast_demand(md, links).unwrap();
    m.check_caches_consistency().unwrap();
}

#[test]
fn test_remove_lower_layer() {
    let mut m = get_test_net();
    m.remove_layer(*WDM).unwrap();
    assert_eq!(m.get_layers(), vec![*IP]);
    assert_eq!(m.get_default_layer(), *IP);
    assert!(!m.get_link(*IP_AC).unwrap().is_coupled());
    assert!(m.get_links(Some(*IP)).unwrap().contains(&*IP_CA));
    assert_eq!(m.get_links(None).unwrap(), vec![*IP_AC, *IP_CA]);
    assert!(m.get_link(*CB).is_err());
    assert!(m.get_link(*BA).is_err());
    m.check_caches_consistency().unwrap();
}
