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

//! Module that contains definitios for the error class

use thiserror::Error;

use super::gml_parser::GmlError;
use crate::model::NetworkModelError;

/// Error for ZooTopology
#[derive(Debug, Error)]
pub enum ZooTopologyError {
    /// Gml Parse Error
    #[error("Cannot parse GML file: {0}")]
    GmlParseError(#[from] GmlError),
    /// Error while building the network model
    #[error("Cannot build the network model: {0}")]
    NetworkModelError(#[from] NetworkModelError),
    /// Specified name could not be found
    #[error("Name not found: {0}")]
    NameNotFound(String),
    /// Invalid range for the random traffic
    #[error("Invalid traffic range: [{0}, {1}]")]
    InvalidTrafficRange(f64, f64),
}
