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

//! # Candidate Path Engine
//!
//! This module computes lists of candidate paths, which can be used to route the demands of a
//! layer. For every pair of nodes with a demand, up to `K` loopless paths are enumerated in
//! ascending order of cost. If no cost is given, every link has cost 1, and the cost of a path is
//! its number of hops. Ties are broken by the sequence of link ids.
//!
//! The search can be restricted by several optional limits (see [`CandidatePathOptions`]). These
//! options can be passed either as a typed struct, or as a map of parameter names to values (see
//! [`CandidatePathOptions::from_params`]). In the parameter map, a negative value means that the
//! limit is not applied.
//!
//! Service chains are computed similarly (see [`ServiceChainPathOptions`]): the path must
//! traverse resources of the types required by the demand, in the given order. From both lists,
//! pairs of disjoint paths for 1+1 protection can be derived (see [`DisjointType`]).
//!
//! Candidate multicast trees are computed by a [`MulticastTreeSolver`]. The library contains a
//! simple heuristic, the [`ShortestPathTreeSolver`].

mod k_shortest;
mod multicast;

pub use multicast::{MulticastTreeSolver, ShortestPathTreeSolver};

use crate::model::*;
use k_shortest::{k_shortest_paths, links_of, SearchBounds, SearchGraph};

use itertools::Itertools;
use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default number of candidate paths per node pair
pub const DEFAULT_K: usize = 3;

/// Options for computing unicast candidate paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePathOptions {
    /// Maximum number of paths per node pair (`K`)
    pub k: usize,
    /// Maximum length of a path in km (`maxLengthInKm`)
    pub max_length_km: Option<f64>,
    /// Maximum number of links of a path (`maxNumHops`)
    pub max_num_hops: Option<usize>,
    /// Maximum propagation delay of a path in ms (`maxPropDelayInMs`)
    pub max_prop_delay_ms: Option<f64>,
    /// Maximum cost of a path (`maxRouteCost`)
    pub max_route_cost: Option<f64>,
    /// Maximum cost of a path, relative to the cost of the shortest one
    /// (`maxRouteCostFactorRespectToShortestPath`)
    pub max_route_cost_factor_respect_to_shortest_path: Option<f64>,
    /// Maximum cost difference of a path compared to the shortest one
    /// (`maxRouteCostRespectToShortestPath`)
    pub max_route_cost_respect_to_shortest_path: Option<f64>,
}

impl Default for CandidatePathOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_length_km: None,
            max_num_hops: None,
            max_prop_delay_ms: None,
            max_route_cost: None,
            max_route_cost_factor_respect_to_shortest_path: None,
            max_route_cost_respect_to_shortest_path: None,
        }
    }
}

impl CandidatePathOptions {
    /// Create the options with the given `K`, and no limits.
    pub fn with_k(k: usize) -> Self {
        Self { k, ..Default::default() }
    }

    /// Parse the options from a map of parameter names to values. Parameters which are not in the
    /// map keep their default value. Unknown parameters or values which cannot be parsed result
    /// in [`NetworkModelError::InvalidOption`].
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, NetworkModelError> {
        let mut options = Self::default();
        for (key, value) in params.iter() {
            match key.as_str() {
                "K" => options.k = parse_k(key, value)?,
                "maxLengthInKm" => options.max_length_km = parse_limit(key, value)?,
                "maxNumHops" => options.max_num_hops = parse_limit(key, value)?.map(|x| x as usize),
                "maxPropDelayInMs" => options.max_prop_delay_ms = parse_limit(key, value)?,
                "maxRouteCost" => options.max_route_cost = parse_limit(key, value)?,
                "maxRouteCostFactorRespectToShortestPath" => {
                    options.max_route_cost_factor_respect_to_shortest_path =
                        parse_limit(key, value)?
                }
                "maxRouteCostRespectToShortestPath" => {
                    options.max_route_cost_respect_to_shortest_path = parse_limit(key, value)?
                }
                _ => return Err(unknown_option(key)),
            }
        }
        Ok(options)
    }

    fn bounds(&self) -> SearchBounds {
        SearchBounds {
            k: self.k,
            max_subpath_length_km: self.max_length_km,
            max_subpath_hops: self.max_num_hops,
            max_subpath_delay_ms: self.max_prop_delay_ms,
            max_delay_ms: None,
            max_cost: self.max_route_cost,
            max_cost_factor: self.max_route_cost_factor_respect_to_shortest_path,
            max_cost_additive: self.max_route_cost_respect_to_shortest_path,
        }
    }
}

/// Options for computing service chain candidates. A subpath is the sequence of links between two
/// consecutive resources of the chain (or the end nodes of the demand).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceChainPathOptions {
    /// Maximum number of service chains per demand (`K`)
    pub k: usize,
    /// Maximum length of each subpath in km (`maxLengthInKmPerSubpath`)
    pub max_length_km_per_subpath: Option<f64>,
    /// Maximum number of links of each subpath (`maxNumHopsPerSubpath`)
    pub max_num_hops_per_subpath: Option<usize>,
    /// Maximum propagation delay of each subpath in ms (`maxPropDelayInMsPerSubpath`)
    pub max_prop_delay_ms_per_subpath: Option<f64>,
    /// Maximum end-to-end delay including resource processing delay (`maxPropDelayInMs`)
    pub max_prop_delay_ms: Option<f64>,
    /// Maximum cost of a service chain (`maxCostServiceChain`)
    pub max_cost_service_chain: Option<f64>,
    /// Maximum cost relative to the cheapest service chain
    /// (`maxCostServiceChainFactorRespectToLowestCost`)
    pub max_cost_service_chain_factor_respect_to_lowest_cost: Option<f64>,
    /// Maximum cost difference compared to the cheapest service chain
    /// (`maxCostServiceChainRespectToLowestCost`)
    pub max_cost_service_chain_respect_to_lowest_cost: Option<f64>,
}

impl Default for ServiceChainPathOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_length_km_per_subpath: None,
            max_num_hops_per_subpath: None,
            max_prop_delay_ms_per_subpath: None,
            max_prop_delay_ms: None,
            max_cost_service_chain: None,
            max_cost_service_chain_factor_respect_to_lowest_cost: None,
            max_cost_service_chain_respect_to_lowest_cost: None,
        }
    }
}

impl ServiceChainPathOptions {
    /// Create the options with the given `K`, and no limits.
    pub fn with_k(k: usize) -> Self {
        Self { k, ..Default::default() }
    }

    /// Parse the options from a map of parameter names to values. See
    /// [`CandidatePathOptions::from_params`].
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, NetworkModelError> {
        let mut options = Self::default();
        for (key, value) in params.iter() {
            match key.as_str() {
                "K" => options.k = parse_k(key, value)?,
                "maxLengthInKmPerSubpath" => {
                    options.max_length_km_per_subpath = parse_limit(key, value)?
                }
                "maxNumHopsPerSubpath" => {
                    options.max_num_hops_per_subpath = parse_limit(key, value)?.map(|x| x as usize)
                }
                "maxPropDelayInMsPerSubpath" => {
                    options.max_prop_delay_ms_per_subpath = parse_limit(key, value)?
                }
                "maxPropDelayInMs" => options.max_prop_delay_ms = parse_limit(key, value)?,
                "maxCostServiceChain" => options.max_cost_service_chain = parse_limit(key, value)?,
                "maxCostServiceChainFactorRespectToLowestCost" => {
                    options.max_cost_service_chain_factor_respect_to_lowest_cost =
                        parse_limit(key, value)?
                }
                "maxCostServiceChainRespectToLowestCost" => {
                    options.max_cost_service_chain_respect_to_lowest_cost =
                        parse_limit(key, value)?
                }
                _ => return Err(unknown_option(key)),
            }
        }
        Ok(options)
    }

    fn bounds(&self) -> SearchBounds {
        SearchBounds {
            k: self.k,
            max_subpath_length_km: self.max_length_km_per_subpath,
            max_subpath_hops: self.max_num_hops_per_subpath,
            max_subpath_delay_ms: self.max_prop_delay_ms_per_subpath,
            max_delay_ms: self.max_prop_delay_ms,
            max_cost: self.max_cost_service_chain,
            max_cost_factor: self.max_cost_service_chain_factor_respect_to_lowest_cost,
            max_cost_additive: self.max_cost_service_chain_respect_to_lowest_cost,
        }
    }
}

/// Which elements two paths of a 1+1 pair must not share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisjointType {
    /// No common link, and no common shared risk group of any traversed link or intermediate node
    SrgDisjoint,
    /// No common link, and no common node (except the end nodes)
    LinkAndNodeDisjoint,
    /// No common link
    LinkDisjoint,
}

/// Candidate paths for every node pair with a demand
pub type CandidatePathList = BTreeMap<(NodeId, NodeId), Vec<Vec<LinkId>>>;

/// Candidate 1+1 path pairs (working path, backup path) for every node pair with a demand
pub type Candidate11PathList = BTreeMap<(NodeId, NodeId), Vec<(Vec<LinkId>, Vec<LinkId>)>>;

/// Candidate service chains for every demand
pub type CandidateServiceChainList = BTreeMap<DemandId, Vec<Vec<PathElement>>>;

/// Candidate 1+1 service chain pairs (working, backup) for every demand
pub type Candidate11ServiceChainList =
    BTreeMap<DemandId, Vec<(Vec<PathElement>, Vec<PathElement>)>>;

impl NetworkModel {
    /// Returns the cost of every link of the layer. Without explicit costs, every link has cost 1.
    /// Links missing in the given cost map are not used.
    fn layer_link_costs(
        &self,
        layer: LayerId,
        link_cost: Option<&BTreeMap<LinkId, f64>>,
    ) -> Result<BTreeMap<LinkId, f64>, NetworkModelError> {
        let mut result = BTreeMap::new();
        for l in self.get_links(Some(layer))? {
            match link_cost {
                Some(costs) => {
                    if let Some(c) = costs.get(&l) {
                        result.insert(l, *c);
                    }
                }
                None => {
                    result.insert(l, 1.0);
                }
            }
        }
        Ok(result)
    }

    /// Compute up to `K` loopless candidate paths for every node pair with a unicast demand in
    /// the layer. The paths are sorted by ascending cost.
    pub fn compute_unicast_candidate_path_list(
        &self,
        link_cost: Option<&BTreeMap<LinkId, f64>>,
        options: &CandidatePathOptions,
        layer: Option<LayerId>,
    ) -> Result<CandidatePathList, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let graph = SearchGraph::new(self, &self.layer_link_costs(layer, link_cost)?, &BTreeMap::new())?;
        let bounds = options.bounds();
        let mut result = CandidatePathList::new();
        for d in self.get_demands(Some(layer))? {
            let demand = self.get_demand(d)?;
            let pair = (demand.ingress(), demand.egress());
            if result.contains_key(&pair) {
                continue;
            }
            let paths = k_shortest_paths(&graph, pair.0, pair.1, &[], &bounds)
                .into_iter()
                .map(|(_, p)| links_of(&p))
                .collect();
            result.insert(pair, paths);
        }
        info!("Computed candidate paths for {} node pairs", result.len());
        Ok(result)
    }

    /// Compute up to `K` candidate service chains for every unicast demand of the layer. A service
    /// chain traverses the resources of the types required by the demand in the given order. For
    /// demands without required resources, this is a plain path. Resources without an entry in
    /// `resource_cost` have zero cost.
    pub fn compute_unicast_candidate_service_chain_list(
        &self,
        link_cost: Option<&BTreeMap<LinkId, f64>>,
        resource_cost: Option<&BTreeMap<ResourceId, f64>>,
        options: &ServiceChainPathOptions,
        layer: Option<LayerId>,
    ) -> Result<CandidateServiceChainList, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let empty = BTreeMap::new();
        let graph = SearchGraph::new(
            self,
            &self.layer_link_costs(layer, link_cost)?,
            resource_cost.unwrap_or(&empty),
        )?;
        let bounds = options.bounds();
        let mut result = CandidateServiceChainList::new();
        for d in self.get_demands(Some(layer))? {
            let demand = self.get_demand(d)?;
            let chains = k_shortest_paths(
                &graph,
                demand.ingress(),
                demand.egress(),
                demand.service_chain_types(),
                &bounds,
            )
            .into_iter()
            .map(|(_, p)| p)
            .collect();
            result.insert(d, chains);
        }
        info!("Computed candidate service chains for {} demands", result.len());
        Ok(result)
    }

    /// Derive 1+1 pairs from a candidate path list. For every node pair, each path is combined
    /// with every later path of the list which is disjoint to it.
    pub fn compute_unicast_candidate_11_path_list(
        &self,
        candidates: &CandidatePathList,
        disjoint_type: DisjointType,
    ) -> Result<Candidate11PathList, NetworkModelError> {
        let mut result = Candidate11PathList::new();
        for (pair, paths) in candidates.iter() {
            let as_elements: Vec<Vec<PathElement>> = paths
                .iter()
                .map(|p| p.iter().map(|l| PathElement::Link(*l)).collect())
                .collect();
            let mut pairs = Vec::new();
            for (i, j) in self.disjoint_pairs(&as_elements, disjoint_type)? {
                pairs.push((paths[i].clone(), paths[j].clone()));
            }
            result.insert(*pair, pairs);
        }
        Ok(result)
    }

    /// Derive 1+1 pairs from a candidate service chain list. Two chains sharing a resource are
    /// never disjoint.
    pub fn compute_unicast_candidate_11_service_chain_list(
        &self,
        candidates: &CandidateServiceChainList,
        disjoint_type: DisjointType,
    ) -> Result<Candidate11ServiceChainList, NetworkModelError> {
        let mut result = Candidate11ServiceChainList::new();
        for (d, chains) in candidates.iter() {
            let mut pairs = Vec::new();
            for (i, j) in self.disjoint_pairs(chains, disjoint_type)? {
                pairs.push((chains[i].clone(), chains[j].clone()));
            }
            result.insert(*d, pairs);
        }
        Ok(result)
    }

    /// Compute candidate multicast trees for every multicast demand of the layer, using the
    /// given solver. Every tree returned by the solver is validated.
    pub fn compute_multicast_candidate_path_list(
        &self,
        solver: &dyn MulticastTreeSolver,
        link_cost: Option<&BTreeMap<LinkId, f64>>,
        params: &HashMap<String, String>,
        layer: Option<LayerId>,
    ) -> Result<BTreeMap<MulticastDemandId, Vec<BTreeSet<LinkId>>>, NetworkModelError> {
        let layer = self.resolve_layer(layer)?;
        let costs = self.layer_link_costs(layer, link_cost)?;
        let mut result = BTreeMap::new();
        for d in self.get_multicast_demands(Some(layer))? {
            let trees = solver.compute_trees(self, d, &costs, params)?;
            for t in trees.iter() {
                self.validate_tree(d, t).map_err(|e| {
                    NetworkModelError::SolverError(format!("{} returned an invalid tree: {}", solver.name(), e))
                })?;
            }
            if trees.is_empty() {
                warn!("{} found no tree for {}", solver.name(), d);
            }
            result.insert(d, trees);
        }
        Ok(result)
    }

    fn disjoint_pairs(
        &self,
        paths: &[Vec<PathElement>],
        disjoint_type: DisjointType,
    ) -> Result<Vec<(usize, usize)>, NetworkModelError> {
        let mut footprints = Vec::with_capacity(paths.len());
        for p in paths {
            footprints.push(self.path_footprint(p, disjoint_type)?);
        }
        Ok((0..paths.len())
            .tuple_combinations()
            .filter(|(i, j)| footprints[*i].is_disjoint(&footprints[*j]))
            .collect())
    }

    /// Every element of the path that must not be shared by a disjoint path, as raw ids.
    fn path_footprint(
        &self,
        path: &[PathElement],
        disjoint_type: DisjointType,
    ) -> Result<BTreeSet<u64>, NetworkModelError> {
        let mut result = BTreeSet::new();
        let mut nodes: Vec<NodeId> = Vec::new();
        for elem in path {
            match elem {
                PathElement::Link(l) => {
                    let link = self.get_link(*l)?;
                    result.insert(l.index());
                    if nodes.is_empty() {
                        nodes.push(link.origin());
                    }
                    nodes.push(link.destination());
                    if disjoint_type == DisjointType::SrgDisjoint {
                        result.extend(link.srgs().iter().map(|s| s.index()));
                    }
                }
                PathElement::Resource(r) => {
                    result.insert(r.index());
                }
            }
        }
        // end nodes are shared by all paths of the same pair
        let intermediate = nodes.iter().skip(1).take(nodes.len().saturating_sub(2));
        for n in intermediate {
            match disjoint_type {
                DisjointType::LinkAndNodeDisjoint => {
                    result.insert(n.index());
                }
                DisjointType::SrgDisjoint => {
                    result.extend(self.get_node(*n)?.srgs().iter().map(|s| s.index()));
                }
                DisjointType::LinkDisjoint => {}
            }
        }
        Ok(result)
    }
}

// ********************
// * Helper Functions *
// ********************

fn parse_k(key: &str, value: &str) -> Result<usize, NetworkModelError> {
    match value.trim().parse::<usize>() {
        Ok(k) if k > 0 => Ok(k),
        _ => Err(NetworkModelError::InvalidOption(key.to_string(), value.to_string())),
    }
}

fn parse_limit(key: &str, value: &str) -> Result<Option<f64>, NetworkModelError> {
    let x: f64 = value
        .trim()
        .parse()
        .map_err(|_| NetworkModelError::InvalidOption(key.to_string(), value.to_string()))?;
    if x.is_nan() {
        Err(NetworkModelError::InvalidOption(key.to_string(), value.to_string()))
    } else if x < 0.0 {
        Ok(None)
    } else {
        Ok(Some(x))
    }
}

fn unknown_option(key: &str) -> NetworkModelError {
    NetworkModelError::InvalidOption(key.to_string(), "unknown option".to_string())
}
