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

//! # Service Chain Network

use super::ExampleNetwork;
use crate::model::{
    NetworkModel, NetworkModelError, PathElement, RecoveryType, DEFAULT_PROPAGATION_SPEED_KM_PER_S,
};

use maplit::btreemap;

/// # Service Chain
///
/// A line of three nodes `A -- B -- C` with bidirectional links of 50 km. Node `B` hosts a
/// server (`CPU`) with a virtual firewall (`FW`) running on it, and node `C` hosts a `NAT`. The
/// demand from `A` to `C` must traverse a firewall and then a NAT, and is routed as
/// `A -> B -> [FW] -> C -> [NAT]`.
#[derive(Debug)]
pub struct ServiceChainNet {}

impl ServiceChainNet {
    /// Type of the firewall resource
    pub const FIREWALL: &'static str = "FW";
    /// Type of the NAT resource
    pub const NAT: &'static str = "NAT";
    /// Type of the server hosting the firewall
    pub const CPU: &'static str = "CPU";
    /// Offered traffic of the service chain demand
    pub const TRAFFIC: f64 = 2.0;
}

impl ExampleNetwork for ServiceChainNet {
    fn model() -> Result<NetworkModel, NetworkModelError> {
        let mut m = NetworkModel::new();
        m.set_name("Service Chain");

        let a = m.add_node("A", 0.0, 0.0);
        let b = m.add_node("B", 1.0, 0.0);
        let c = m.add_node("C", 2.0, 0.0);

        let speed = DEFAULT_PROPAGATION_SPEED_KM_PER_S;
        let (ab, _) = m.add_link_bidirectional(a, b, 10.0, 50.0, speed, None)?;
        let (bc, _) = m.add_link_bidirectional(b, c, 10.0, 50.0, speed, None)?;

        let cpu = m.add_resource(Self::CPU, "server", b, 8.0, "cores", btreemap! {}, 0.0)?;
        let fw = m.add_resource(Self::FIREWALL, "firewall", b, 5.0, "Gbps", btreemap! {cpu => 2.0}, 0.5)?;
        let nat = m.add_resource(Self::NAT, "nat", c, 5.0, "Gbps", btreemap! {}, 0.25)?;

        let h = Self::TRAFFIC;
        let d = m.add_service_chain_demand(
            a,
            c,
            h,
            RecoveryType::None,
            vec![Self::FIREWALL.to_string(), Self::NAT.to_string()],
            None,
        )?;
        m.add_service_chain(
            d,
            h,
            vec![h, h, h, h],
            vec![
                PathElement::Link(ab),
                PathElement::Resource(fw),
                PathElement::Link(bc),
                PathElement::Resource(nat),
            ],
        )?;

        Ok(m)
    }
}
