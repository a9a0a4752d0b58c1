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

//! # Triangle Network

use super::ExampleNetwork;
use crate::model::{NetworkModel, NetworkModelError, RecoveryType, DEFAULT_PROPAGATION_SPEED_KM_PER_S};

use itertools::iproduct;

/// # Triangle
///
/// Three nodes `A`, `B` and `C`, connected by bidirectional links of 100 km and capacity 10. The
/// single layer carries a full mesh of unrouted demands, each offering one unit of traffic.
///
/// ```text
///        A
///       / \
///      /   \
///     B --- C
/// ```
#[derive(Debug)]
pub struct TriangleNet {}

impl TriangleNet {
    /// Capacity of every link
    pub const CAPACITY: f64 = 10.0;
    /// Length of every link in km
    pub const LENGTH_KM: f64 = 100.0;
}

impl ExampleNetwork for TriangleNet {
    fn model() -> Result<NetworkModel, NetworkModelError> {
        let mut m = NetworkModel::new();
        m.set_name("Triangle");

        let a = m.add_node("A", 0.5, 1.0);
        let b = m.add_node("B", 0.0, 0.0);
        let c = m.add_node("C", 1.0, 0.0);

        for (x, y) in &[(a, b), (b, c), (a, c)] {
            m.add_link_bidirectional(
                *x,
                *y,
                Self::CAPACITY,
                Self::LENGTH_KM,
                DEFAULT_PROPAGATION_SPEED_KM_PER_S,
                None,
            )?;
        }

        let nodes = [a, b, c];
        for (x, y) in iproduct!(nodes.iter(), nodes.iter()).filter(|(x, y)| x != y) {
            m.add_demand(*x, *y, 1.0, RecoveryType::None, None)?;
        }

        Ok(m)
    }
}
