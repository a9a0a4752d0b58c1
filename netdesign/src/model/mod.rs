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

#![deny(missing_docs, missing_debug_implementations)]

//! # Network Design Model
//!
//! This module contains the multi-layer network design model. The [`NetworkModel`] is an arena
//! owning every element of the design: layers, nodes, links, unicast and multicast demands,
//! routes, multicast trees, resources and shared risk groups. Elements only refer to each other
//! by their id, and every mutation goes through the model, which keeps all back-references and
//! derived values (carried traffic, occupied capacity, capacity of coupled links) up to date.
//!
//! Every mutating method either succeeds completely, or returns an error and leaves the model
//! unchanged. The method [`NetworkModel::check_caches_consistency`] re-derives all caches from
//! scratch and compares them with the stored ones.
//!
//! ## Example usage
//!
//! The following example builds a small triangle, routes a single demand over the two-hop
//! detour, and checks the resulting link occupation.
//!
//! ```rust
//! use netdesign::model::{NetworkModel, NetworkModelError, RecoveryType};
//!
//! fn main() -> Result<(), NetworkModelError> {
//!     let mut m = NetworkModel::new();
//!
//!     let a = m.add_node("A", 0.0, 0.0);
//!     let b = m.add_node("B", 1.0, 0.0);
//!     let c = m.add_node("C", 0.0, 1.0);
//!
//!     let ab = m.add_link(a, b, 10.0, 100.0, 200000.0, None)?;
//!     let bc = m.add_link(b, c, 10.0, 100.0, 200000.0, None)?;
//!     let _ac = m.add_link(a, c, 10.0, 100.0, 200000.0, None)?;
//!
//!     let d = m.add_demand(a, c, 4.0, RecoveryType::None, None)?;
//!     m.add_route(d, 4.0, 4.0, &[ab, bc])?;
//!
//!     assert_eq!(m.get_demand(d)?.carried_traffic(), 4.0);
//!     assert_eq!(m.get_link(ab)?.occupied_capacity(), 4.0);
//!     assert!(!m.is_link_oversubscribed(bc)?);
//!
//!     m.check_caches_consistency()?;
//!     Ok(())
//! }
//! ```

pub mod consistency;
pub mod coupling;
pub mod element;
mod network_model;
pub mod printer;
pub mod propagation;
pub mod routing;
pub mod srg;
pub mod traffic;
pub mod types;

pub use element::*;
pub use network_model::NetworkModel;
pub use propagation::{IlpgVertex, InterLayerPropagationGraph};
pub use types::*;
