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

//! # IP over WDM Network

use super::ExampleNetwork;
use crate::model::{NetworkModel, NetworkModelError, RecoveryType, DEFAULT_PROPAGATION_SPEED_KM_PER_S};

/// # IP over WDM
///
/// Two layers sharing four nodes. The lower `WDM` layer (the default layer) is a ring of
/// bidirectional fiber links of 100 km each. The upper `IP` layer has a single link pair between
/// `A` and `C`, each realized by a lightpath (a demand of the WDM layer) routed over `B`:
///
/// ```text
///   IP:     A =============== C
///
///   WDM:    A ----- B ----- C
///           |               |
///           +------ D ------+
/// ```
///
/// Each lightpath carries 40 Gbps, which therefore is the capacity of the IP links. The IP layer
/// carries one demand of 25 Gbps from `A` to `C`, routed over the IP link.
#[derive(Debug)]
pub struct IpOverWdmNet {}

impl IpOverWdmNet {
    /// Name of the lower layer
    pub const WDM: &'static str = "WDM";
    /// Name of the upper layer
    pub const IP: &'static str = "IP";
    /// Traffic carried by every lightpath
    pub const LIGHTPATH_TRAFFIC: f64 = 40.0;
    /// Offered traffic of the IP demand
    pub const IP_TRAFFIC: f64 = 25.0;
}

impl ExampleNetwork for IpOverWdmNet {
    fn model() -> Result<NetworkModel, NetworkModelError> {
        let mut m = NetworkModel::new();
        m.set_name("IP over WDM");

        let wdm = m.get_default_layer();
        m.set_layer_name(wdm, Self::WDM)?;
        m.set_layer_description(wdm, "Optical transport layer")?;
        let ip = m.add_layer(Self::IP, "IP layer", "Gbps", "Gbps");

        let a = m.add_node("A", 0.0, 1.0);
        let b = m.add_node("B", 1.0, 1.0);
        let c = m.add_node("C", 2.0, 1.0);
        let d = m.add_node("D", 1.0, 0.0);

        let speed = DEFAULT_PROPAGATION_SPEED_KM_PER_S;
        let (ab, ba) = m.add_link_bidirectional(a, b, 100.0, 100.0, speed, Some(wdm))?;
        let (bc, cb) = m.add_link_bidirectional(b, c, 100.0, 100.0, speed, Some(wdm))?;
        m.add_link_bidirectional(c, d, 100.0, 100.0, speed, Some(wdm))?;
        m.add_link_bidirectional(d, a, 100.0, 100.0, speed, Some(wdm))?;

        // lightpaths
        let h = Self::LIGHTPATH_TRAFFIC;
        let (lp_ac, lp_ca) = m.add_demand_bidirectional(a, c, h, RecoveryType::None, Some(wdm))?;
        m.add_route(lp_ac, h, h, &[ab, bc])?;
        m.add_route(lp_ca, h, h, &[cb, ba])?;

        // IP links realized by the lightpaths
        let ip_ac = m.couple_demand_to_new_link_created(lp_ac, ip)?;
        let ip_ca = m.couple_demand_to_new_link_created(lp_ca, ip)?;
        m.set_links_bidirectional_pair(ip_ac, ip_ca)?;

        // IP traffic
        let ip_demand = m.add_demand(a, c, Self::IP_TRAFFIC, RecoveryType::None, Some(ip))?;
        m.add_route(ip_demand, Self::IP_TRAFFIC, Self::IP_TRAFFIC, &[ip_ac])?;

        Ok(m)
    }
}
