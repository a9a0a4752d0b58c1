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

//! Candidate multicast trees

use super::k_shortest::{k_shortest_paths, links_of, SearchBounds, SearchGraph};
use super::{parse_k, parse_limit, unknown_option, DEFAULT_K};
use crate::model::{LinkId, MulticastDemandId, NetworkModel, NetworkModelError, NodeId, PathElement};

use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Solver computing candidate trees for a multicast demand. The solver is called with the cost of
/// every link it may use, and with a map of named options. It returns a list of link sets, each
/// forming a tree rooted at the ingress node and reaching all egress nodes.
pub trait MulticastTreeSolver {
    /// Name of the solver, used in log and error messages
    fn name(&self) -> &'static str;

    /// Compute the candidate trees for the given multicast demand.
    fn compute_trees(
        &self,
        model: &NetworkModel,
        demand: MulticastDemandId,
        link_cost: &BTreeMap<LinkId, f64>,
        params: &HashMap<String, String>,
    ) -> Result<Vec<BTreeSet<LinkId>>, NetworkModelError>;
}

/// Heuristic combining the candidate paths towards every egress node into trees. The `i`-th tree
/// is the union of the `i`-th shortest path towards every egress node (or the last one, if there
/// are less than `i` paths). Unions which do not form a tree are skipped.
///
/// Supported options (a negative value means no limit):
/// - `K`: maximum number of trees
/// - `maxCopyCapability`: maximum number of outgoing tree links at any node
/// - `maxTreeCost`: maximum sum of the cost of all links of the tree
/// - `maxE2ELengthInKm`: maximum length of the path from the ingress to each egress node
/// - `maxE2ENumHops`: maximum number of links from the ingress to each egress node
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestPathTreeSolver;

#[derive(Debug, Clone)]
struct TreeOptions {
    k: usize,
    max_copy_capability: Option<usize>,
    max_tree_cost: Option<f64>,
    max_e2e_length_km: Option<f64>,
    max_e2e_num_hops: Option<usize>,
}

impl TreeOptions {
    fn from_params(params: &HashMap<String, String>) -> Result<Self, NetworkModelError> {
        let mut options = Self {
            k: DEFAULT_K,
            max_copy_capability: None,
            max_tree_cost: None,
            max_e2e_length_km: None,
            max_e2e_num_hops: None,
        };
        for (key, value) in params.iter() {
            match key.as_str() {
                "K" => options.k = parse_k(key, value)?,
                "maxCopyCapability" => {
                    options.max_copy_capability = parse_limit(key, value)?.map(|x| x as usize)
                }
                "maxTreeCost" => options.max_tree_cost = parse_limit(key, value)?,
                "maxE2ELengthInKm" => options.max_e2e_length_km = parse_limit(key, value)?,
                "maxE2ENumHops" => {
                    options.max_e2e_num_hops = parse_limit(key, value)?.map(|x| x as usize)
                }
                _ => return Err(unknown_option(key)),
            }
        }
        Ok(options)
    }
}

impl MulticastTreeSolver for ShortestPathTreeSolver {
    fn name(&self) -> &'static str {
        "ShortestPathTreeSolver"
    }

    fn compute_trees(
        &self,
        model: &NetworkModel,
        demand: MulticastDemandId,
        link_cost: &BTreeMap<LinkId, f64>,
        params: &HashMap<String, String>,
    ) -> Result<Vec<BTreeSet<LinkId>>, NetworkModelError> {
        let options = TreeOptions::from_params(params)?;
        let d = model.get_multicast_demand(demand)?;
        let graph = SearchGraph::new(model, link_cost, &BTreeMap::new())?;
        let bounds = SearchBounds {
            k: options.k,
            max_subpath_length_km: options.max_e2e_length_km,
            max_subpath_hops: options.max_e2e_num_hops,
            max_subpath_delay_ms: None,
            max_delay_ms: None,
            max_cost: None,
            max_cost_factor: None,
            max_cost_additive: None,
        };

        let mut paths: BTreeMap<NodeId, Vec<Vec<LinkId>>> = BTreeMap::new();
        for e in d.egress_nodes().iter() {
            let p: Vec<Vec<LinkId>> = k_shortest_paths(&graph, d.ingress(), *e, &[], &bounds)
                .into_iter()
                .map(|(_, p)| links_of(&p))
                .collect();
            if p.is_empty() {
                debug!("No path from {} to {}, {} has no tree", d.ingress(), e, demand);
                return Ok(Vec::new());
            }
            paths.insert(*e, p);
        }

        let mut trees: Vec<BTreeSet<LinkId>> = Vec::new();
        for i in 0..options.k {
            let tree: BTreeSet<LinkId> = paths
                .values()
                .flat_map(|p| p[i.min(p.len() - 1)].iter().copied())
                .collect();
            if trees.contains(&tree) || model.validate_tree(demand, &tree).is_err() {
                continue;
            }
            if let Some(max_copy) = options.max_copy_capability {
                let mut copies: BTreeMap<NodeId, usize> = BTreeMap::new();
                for l in tree.iter() {
                    *copies.entry(model.get_link(*l)?.origin()).or_default() += 1;
                }
                if copies.values().any(|c| *c > max_copy) {
                    continue;
                }
            }
            if let Some(max_cost) = options.max_tree_cost {
                let elements: Vec<PathElement> = tree.iter().map(|l| PathElement::Link(*l)).collect();
                match graph.path_cost(&elements) {
                    Some(cost) if cost <= max_cost => {}
                    _ => continue,
                }
            }
            trees.push(tree);
        }
        debug!("Found {} candidate trees for {}", trees.len(), demand);
        Ok(trees)
    }
}
