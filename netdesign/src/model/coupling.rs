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

//! # Coupling of Layers
//!
//! A link of an upper layer can be realized by a unicast demand of a lower layer (connecting the
//! same end nodes), or by the flow of a multicast demand towards the destination of the link. A
//! coupled link has no independent capacity: it always equals the carried traffic of the coupled
//! demand. After decoupling, the link keeps the last value as its own capacity.
//!
//! Layers must not depend on themselves. Before coupling, the layer coupling graph is checked for
//! a path from the lower layer back to the upper layer (see
//! [`NetworkModel::check_layer_coupling`]).

use crate::model::network_model::NetworkModel;
use crate::model::printer;
use crate::model::types::*;

use log::*;
use std::collections::{BTreeMap, BTreeSet};

impl NetworkModel {
    /// Couple a demand to a link of an upper layer. Both must connect the same nodes, and none of
    /// them may be coupled already.
    pub fn couple_demand_to_upper_layer_link(
        &mut self,
        demand: DemandId,
        link: LinkId,
    ) -> Result<(), NetworkModelError> {
        self.couple_demand_internal(demand, link)?;
        debug!("Couple {} to {}", printer::demand(self, demand)?, printer::link(self, link)?);
        self.after_mutation();
        Ok(())
    }

    /// Couple a link to a demand of a lower layer. This is equivalent to
    /// [`NetworkModel::couple_demand_to_upper_layer_link`].
    pub fn couple_link_to_lower_layer_demand(
        &mut self,
        link: LinkId,
        demand: DemandId,
    ) -> Result<(), NetworkModelError> {
        self.couple_demand_to_upper_layer_link(demand, link)
    }

    fn validate_demand_coupling(&self, demand: DemandId, link: LinkId) -> Result<(), NetworkModelError> {
        let d = self.get_demand(demand)?;
        let l = self.get_link(link)?;
        if d.coupled_upper_link.is_some() {
            return Err(NetworkModelError::AlreadyCoupled(demand.into()));
        }
        if l.coupling.is_some() {
            return Err(NetworkModelError::AlreadyCoupled(link.into()));
        }
        if d.ingress != l.origin || d.egress != l.destination {
            return Err(NetworkModelError::CouplingEndpointMismatch(demand.into(), link.into()));
        }
        self.check_layer_coupling(l.layer, d.layer)
    }

    pub(crate) fn couple_demand_internal(
        &mut self,
        demand: DemandId,
        link: LinkId,
    ) -> Result<(), NetworkModelError> {
        self.validate_demand_coupling(demand, link)?;
        self.demand_mut(demand)?.coupled_upper_link = Some(link);
        self.link_mut(link)?.coupling = Some(LinkCoupling::Demand(demand));
        Ok(())
    }

    /// Create a new link in the upper layer between the end nodes of the demand, and couple it to
    /// the demand. The new link has zero length.
    pub fn couple_demand_to_new_link_created(
        &mut self,
        demand: DemandId,
        upper_layer: LayerId,
    ) -> Result<LinkId, NetworkModelError> {
        let d = self.get_demand(demand)?;
        self.get_layer(upper_layer)?;
        if d.coupled_upper_link.is_some() {
            return Err(NetworkModelError::AlreadyCoupled(demand.into()));
        }
        self.check_layer_coupling(upper_layer, d.layer)?;
        let (ingress, egress) = (d.ingress, d.egress);
        let link = self.insert_link(
            None,
            upper_layer,
            ingress,
            egress,
            0.0,
            0.0,
            DEFAULT_PROPAGATION_SPEED_KM_PER_S,
        )?;
        self.couple_demand_internal(demand, link)?;
        debug!("Couple {} to new link {}", printer::demand(self, demand)?, link);
        self.after_mutation();
        Ok(link)
    }

    /// Create a new demand in the lower layer between the end nodes of the link, with the link
    /// capacity as offered traffic, and couple it to the link.
    pub fn couple_link_to_new_demand_created(
        &mut self,
        link: LinkId,
        lower_layer: LayerId,
    ) -> Result<DemandId, NetworkModelError> {
        let l = self.get_link(link)?;
        self.get_layer(lower_layer)?;
        if l.coupling.is_some() {
            return Err(NetworkModelError::AlreadyCoupled(link.into()));
        }
        self.check_layer_coupling(l.layer, lower_layer)?;
        let (origin, destination, capacity) = (l.origin, l.destination, l.capacity);
        let demand = self.insert_demand(
            None,
            lower_layer,
            origin,
            destination,
            capacity,
            RecoveryType::default(),
            Vec::new(),
        )?;
        self.couple_demand_internal(demand, link)?;
        debug!("Couple {} to new demand {}", printer::link(self, link)?, demand);
        self.after_mutation();
        Ok(demand)
    }

    /// Couple a multicast demand to a set of upper layer links: one link from the ingress node to
    /// every egress node.
    pub fn couple_multicast_demand(
        &mut self,
        demand: MulticastDemandId,
        links: BTreeSet<LinkId>,
    ) -> Result<(), NetworkModelError> {
        self.couple_multicast_demand_internal(demand, links)?;
        debug!("Couple {}", printer::multicast_demand(self, demand)?);
        self.after_mutation();
        Ok(())
    }

    pub(crate) fn couple_multicast_demand_internal(
        &mut self,
        demand: MulticastDemandId,
        links: BTreeSet<LinkId>,
    ) -> Result<(), NetworkModelError> {
        let d = self.get_multicast_demand(demand)?;
        if d.is_coupled() {
            return Err(NetworkModelError::AlreadyCoupled(demand.into()));
        }
        let mut upper_layer: Option<LayerId> = None;
        let mut by_destination: BTreeMap<NodeId, LinkId> = BTreeMap::new();
        for l in links.iter() {
            let link = self.get_link(*l)?;
            if link.coupling.is_some() {
                return Err(NetworkModelError::AlreadyCoupled((*l).into()));
            }
            match upper_layer {
                Some(layer) if layer != link.layer => {
                    return Err(NetworkModelError::LayerMismatch(demand.into(), (*l).into()))
                }
                _ => upper_layer = Some(link.layer),
            }
            if link.origin != d.ingress
                || !d.egress.contains(&link.destination)
                || by_destination.insert(link.destination, *l).is_some()
            {
                return Err(NetworkModelError::CouplingEndpointMismatch(demand.into(), (*l).into()));
            }
        }
        if let Some(e) = d.egress.iter().find(|e| !by_destination.contains_key(e)) {
            return Err(NetworkModelError::InvalidMulticastTree(
                demand,
                format!("no coupled link towards {}", e),
            ));
        }
        let upper_layer = upper_layer.ok_or(NetworkModelError::NotCoupled(demand.into()))?;
        self.check_layer_coupling(upper_layer, d.layer)?;

        for l in links.iter() {
            self.link_mut(*l)?.coupling = Some(LinkCoupling::MulticastDemand(demand));
        }
        self.multicast_demand_mut(demand)?.coupled_upper_links = by_destination;
        Ok(())
    }

    /// Create one link in the upper layer from the ingress to every egress node of the multicast
    /// demand, and couple them to it.
    pub fn couple_multicast_demand_to_new_links_created(
        &mut self,
        demand: MulticastDemandId,
        upper_layer: LayerId,
    ) -> Result<BTreeSet<LinkId>, NetworkModelError> {
        let d = self.get_multicast_demand(demand)?;
        self.get_layer(upper_layer)?;
        if d.is_coupled() {
            return Err(NetworkModelError::AlreadyCoupled(demand.into()));
        }
        self.check_layer_coupling(upper_layer, d.layer)?;
        let ingress = d.ingress;
        let egress: Vec<NodeId> = d.egress.iter().copied().collect();
        let mut links = BTreeSet::new();
        for e in egress {
            links.insert(self.insert_link(
                None,
                upper_layer,
                ingress,
                e,
                0.0,
                0.0,
                DEFAULT_PROPAGATION_SPEED_KM_PER_S,
            )?);
        }
        self.couple_multicast_demand_internal(demand, links.clone())?;
        debug!("Couple {} to new links", printer::multicast_demand(self, demand)?);
        self.after_mutation();
        Ok(links)
    }

    /// Break the coupling of a demand. The upper layer link keeps its current capacity.
    pub fn decouple_demand(&mut self, demand: DemandId) -> Result<(), NetworkModelError> {
        let link = self
            .get_demand(demand)?
            .coupled_upper_link
            .ok_or(NetworkModelError::NotCoupled(demand.into()))?;
        self.demand_mut(demand)?.coupled_upper_link = None;
        self.link_mut(link)?.coupling = None;
        debug!("Decouple {}", printer::demand(self, demand)?);
        self.after_mutation();
        Ok(())
    }

    /// Break the coupling of a link. If the link is coupled to a multicast demand, the coupling of
    /// the whole multicast demand is broken.
    pub fn decouple_link(&mut self, link: LinkId) -> Result<(), NetworkModelError> {
        match self.get_link(link)?.coupling {
            Some(LinkCoupling::Demand(d)) => self.decouple_demand(d),
            Some(LinkCoupling::MulticastDemand(d)) => self.decouple_multicast_demand(d),
            None => Err(NetworkModelError::NotCoupled(link.into())),
        }
    }

    /// Break the coupling of a multicast demand. All its links keep their current capacity.
    pub fn decouple_multicast_demand(
        &mut self,
        demand: MulticastDemandId,
    ) -> Result<(), NetworkModelError> {
        if !self.get_multicast_demand(demand)?.is_coupled() {
            return Err(NetworkModelError::NotCoupled(demand.into()));
        }
        self.decouple_multicast_demand_internal(demand);
        debug!("Decouple {}", printer::multicast_demand(self, demand)?);
        self.after_mutation();
        Ok(())
    }

    pub(crate) fn decouple_multicast_demand_internal(&mut self, demand: MulticastDemandId) {
        let links = match self.multicast_demands.get_mut(&demand) {
            Some(d) => std::mem::take(&mut d.coupled_upper_links),
            None => return,
        };
        for l in links.values() {
            if let Some(l) = self.links.get_mut(l) {
                l.coupling = None;
            }
        }
    }
}
