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

//! Test the candidate path engine on the triangle network, and on some larger topologies.

use crate::candidate_paths::{
    CandidatePathOptions, DisjointType, MulticastTreeSolver, ServiceChainPathOptions,
    ShortestPathTreeSolver,
};
use crate::example_networks::{ExampleNetwork, ServiceChainNet, TriangleNet};
use crate::model::{
    LinkId, MulticastDemandId, NetworkModel, NetworkModelError, NodeId, RecoveryType,
    DEFAULT_PROPAGATION_SPEED_KM_PER_S,
};
use lazy_static::lazy_static;
use maplit::{btreemap, btreeset};
use std::collections::{BTreeMap, BTreeSet, HashMap};

lazy_static! {
    static ref A: NodeId = NodeId(1);
    static ref B: NodeId = NodeId(2);
    static ref C: NodeId = NodeId(3);
    static ref AB: LinkId = LinkId(4);
    static ref BA: LinkId = LinkId(5);
    static ref BC: LinkId = LinkId(6);
    static ref CB: LinkId = LinkId(7);
    static ref AC: LinkId = LinkId(8);
    static ref CA: LinkId = LinkId(9);
}

/// # Test network
///
/// All links have a length of 100 km, and every pair of nodes has a demand.
///
/// ```text
///        A
///       / \
///      /   \
///     B --- C
/// ```
fn get_test_net() -> NetworkModel {
    let m = TriangleNet::model().unwrap();
    assert_eq!(m.get_links(None).unwrap(), vec![*AB, *BA, *BC, *CB, *AC, *CA]);
    m
}

fn params(values: &[(&str, &str)]) -> HashMap<String, String> {
    values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn candidates_ac(
    m: &NetworkModel,
    cost: Option<&BTreeMap<LinkId, f64>>,
    options: &CandidatePathOptions,
) -> Vec<Vec<LinkId>> {
    let mut list = m.compute_unicast_candidate_path_list(cost, options, None).unwrap();
    assert_eq!(list.len(), 6);
    list.remove(&(*A, *C)).unwrap()
}

#[test]
fn test_k_shortest_paths() {
    let m = get_test_net();
    let options = CandidatePathOptions::default();
    assert_eq!(candidates_ac(&m, None, &options), vec![vec![*AC], vec![*AB, *BC]]);
    assert_eq!(candidates_ac(&m, None, &CandidatePathOptions::with_k(1)), vec![vec![*AC]]);

    let list = m.compute_unicast_candidate_path_list(None, &options, None).unwrap();
    assert_eq!(list[&(*C, *B)], vec![vec![*CB], vec![*CA, *AB]]);
}

#[test]
fn test_link_costs() {
    let m = get_test_net();
    let options = CandidatePathOptions::default();
    let mut cost: BTreeMap<LinkId, f64> =
        m.get_links(None).unwrap().into_iter().map(|l| (l, 1.0)).collect();
    cost.insert(*AC, 5.0);
    assert_eq!(candidates_ac(&m, Some(&cost), &options), vec![vec![*AB, *BC], vec![*AC]]);

    // links without a cost are not used
    cost.remove(&*AC);
    assert_eq!(candidates_ac(&m, Some(&cost), &options), vec![vec![*AB, *BC]]);

    cost.insert(*AC, -1.0);
    assert_eq!(
        m.compute_unicast_candidate_path_list(Some(&cost), &options, None),
        Err(NetworkModelError::NegativeValue("link cost", -1.0))
    );
}

#[test]
fn test_path_limits() {
    let m = get_test_net();
    let options = CandidatePathOptions::from_params(&params(&[("maxLengthInKm", "150")])).unwrap();
    assert_eq!(options.max_length_km, Some(150.0));
    assert_eq!(candidates_ac(&m, None, &options), vec![vec![*AC]]);

    let options = CandidatePathOptions::from_params(&params(&[(
        "maxRouteCostFactorRespectToShortestPath",
        "1.5",
    )]))
    .unwrap();
    assert_eq!(candidates_ac(&m, None, &options), vec![vec![*AC]]);

    let options = CandidatePathOptions::from_params(&params(&[("maxNumHops", "1")])).unwrap();
    assert_eq!(candidates_ac(&m, None, &options), vec![vec![*AC]]);

    // a negative value means no limit
    let options =
        CandidatePathOptions::from_params(&params(&[("K", "5"), ("maxLengthInKm", "-1")])).unwrap();
    assert_eq!(options, CandidatePathOptions::with_k(5));
    assert_eq!(candidates_ac(&m, None, &options).len(), 2);
}

#[test]
fn test_invalid_options() {
    assert_eq!(
        CandidatePathOptions::from_params(&params(&[("maxLength", "1")])),
        Err(NetworkModelError::InvalidOption("maxLength".to_string(), "unknown option".to_string()))
    );
    assert_eq!(
        CandidatePathOptions::from_params(&params(&[("K", "0")])),
        Err(NetworkModelError::InvalidOption("K".to_string(), "0".to_string()))
    );
    assert_eq!(
        CandidatePathOptions::from_params(&params(&[("maxRouteCost", "cheap")])),
        Err(NetworkModelError::InvalidOption("maxRouteCost".to_string(), "cheap".to_string()))
    );
    assert!(ServiceChainPathOptions::from_params(&params(&[("maxLengthInKm", "1")])).is_err());
    assert!(ServiceChainPathOptions::from_params(&params(&[("maxLengthInKmPerSubpath", "1")])).is_ok());
}

#[test]
fn test_11_paths() {
    let mut m = get_test_net();
    let candidates = m
        .compute_unicast_candidate_path_list(None, &CandidatePathOptions::with_k(2), None)
        .unwrap();
    for disjoint_type in [
        DisjointType::LinkDisjoint,
        DisjointType::LinkAndNodeDisjoint,
        DisjointType::SrgDisjoint,
    ] {
        let pairs = m.compute_unicast_candidate_11_path_list(&candidates, disjoint_type).unwrap();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[&(*A, *C)], vec![(vec![*AC], vec![*AB, *BC])]);
    }

    // both paths now share a risk
    let srg = m.add_srg(1000.0, 1.0).unwrap();
    m.add_link_to_srg(srg, *AC).unwrap();
    m.add_link_to_srg(srg, *AB).unwrap();
    let pairs = m.compute_unicast_candidate_11_path_list(&candidates, DisjointType::SrgDisjoint).unwrap();
    assert!(pairs[&(*A, *C)].is_empty());
    assert_eq!(pairs[&(*B, *C)].len(), 1);
    let pairs = m.compute_unicast_candidate_11_path_list(&candidates, DisjointType::LinkDisjoint).unwrap();
    assert_eq!(pairs[&(*A, *C)].len(), 1);
}

#[test]
fn test_11_service_chains() {
    let m = ServiceChainNet::model().unwrap();
    let candidates = m
        .compute_unicast_candidate_service_chain_list(None, None, &ServiceChainPathOptions::default(), None)
        .unwrap();
    assert_eq!(candidates.len(), 1);
    let pairs = m
        .compute_unicast_candidate_11_service_chain_list(&candidates, DisjointType::LinkDisjoint)
        .unwrap();
    assert!(pairs.values().all(|p| p.is_empty()));
}

#[test]
fn test_multicast_candidates() {
    let mut m = get_test_net();
    let md = m.add_multicast_demand(*A, btreeset! {*B, *C}, 1.0, None).unwrap();
    let solver = ShortestPathTreeSolver;

    let trees = m
        .compute_multicast_candidate_path_list(&solver, None, &params(&[("K", "2")]), None)
        .unwrap();
    assert_eq!(trees, btreemap! {md => vec![btreeset! {*AB, *AC}]});

    let trees = m
        .compute_multicast_candidate_path_list(&solver, None, &params(&[("maxCopyCapability", "1")]), None)
        .unwrap();
    assert!(trees[&md].is_empty());

    assert!(m
        .compute_multicast_candidate_path_list(&solver, None, &params(&[("maxLengthInKm", "1")]), None)
        .is_err());
}

/// Solver returning a tree which does not reach all egress nodes.
struct BrokenSolver;

impl MulticastTreeSolver for BrokenSolver {
    fn name(&self) -> &'static str {
        "BrokenSolver"
    }

    fn compute_trees(
        &self,
        _model: &NetworkModel,
        _demand: MulticastDemandId,
        _link_cost: &BTreeMap<LinkId, f64>,
        _params: &HashMap<String, String>,
    ) -> Result<Vec<BTreeSet<LinkId>>, NetworkModelError> {
        Ok(vec![btreeset! {*AB}])
    }
}

#[test]
fn test_invalid_solver_result() {
    let mut m = get_test_net();
    m.add_multicast_demand(*A, btreeset! {*B, *C}, 1.0, None).unwrap();
    assert!(matches!(
        m.compute_multicast_candidate_path_list(&BrokenSolver, None, &HashMap::new(), None),
        Err(NetworkModelError::SolverError(_))
    ));
}

#[test]
fn test_equal_cost_paths_ordered_by_link_ids() {
    // S -> {X, Y, Z} -> T, with two parallel links from Y to T
    let mut m = NetworkModel::new();
    let s = m.add_node("S", 0.0, 0.0);
    let x = m.add_node("X", 1.0, 1.0);
    let y = m.add_node("Y", 1.0, 0.0);
    let z = m.add_node("Z", 1.0, -1.0);
    let t = m.add_node("T", 2.0, 0.0);
    let speed = DEFAULT_PROPAGATION_SPEED_KM_PER_S;
    let sy = m.add_link(s, y, 10.0, 1.0, speed, None).unwrap();
    let yt = m.add_link(y, t, 10.0, 1.0, speed, None).unwrap();
    let sx = m.add_link(s, x, 10.0, 1.0, speed, None).unwrap();
    let xt = m.add_link(x, t, 10.0, 1.0, speed, None).unwrap();
    let sz = m.add_link(s, z, 10.0, 1.0, speed, None).unwrap();
    let zt = m.add_link(z, t, 10.0, 1.0, speed, None).unwrap();
    let yt2 = m.add_link(y, t, 10.0, 1.0, speed, None).unwrap();
    m.add_demand(s, t, 1.0, RecoveryType::None, None).unwrap();

    let list = m.compute_unicast_candidate_path_list(None, &CandidatePathOptions::with_k(4), None).unwrap();
    assert_eq!(list[&(s, t)], vec![vec![sy, yt], vec![sy, yt2], vec![sx, xt], vec![sz, zt]]);
    let list = m.compute_unicast_candidate_path_list(None, &CandidatePathOptions::with_k(2), None).unwrap();
    assert_eq!(list[&(s, t)], vec![vec![sy, yt], vec![sy, yt2]]);

    // a more expensive path goes last, regardless of its ids
    let mut cost: BTreeMap<LinkId, f64> = m.get_links(None).unwrap().into_iter().map(|l| (l, 1.0)).collect();
    cost.insert(yt, 2.0);
    let list = m
        .compute_unicast_candidate_path_list(Some(&cost), &CandidatePathOptions::with_k(4), None)
        .unwrap();
    assert_eq!(list[&(s, t)], vec![vec![sy, yt2], vec![sx, xt], vec![sz, zt], vec![sy, yt]]);
}

type GridLinks = BTreeMap<(usize, usize), LinkId>;

/// Square grid of `n x n` nodes, with bidirectional links of 1 km between horizontal and
/// vertical neighbors. Returns the nodes, and the links towards the right and downwards of each
/// node, indexed by (row, column).
fn grid(n: usize) -> (NetworkModel, Vec<Vec<NodeId>>, GridLinks, GridLinks) {
    let mut m = NetworkModel::new();
    let nodes: Vec<Vec<NodeId>> = (0..n)
        .map(|i| (0..n).map(|j| m.add_node(format!("n{}_{}", i, j), j as f64, i as f64)).collect())
        .collect();
    let mut right = BTreeMap::new();
    let mut down = BTreeMap::new();
    for i in 0..n {
        for j in 0..n {
            if j + 1 < n {
                let (l, _) = m
                    .add_link_bidirectional(nodes[i][j], nodes[i][j + 1], 10.0, 1.0, DEFAULT_PROPAGATION_SPEED_KM_PER_S, None)
                    .unwrap();
                right.insert((i, j), l);
            }
            if i + 1 < n {
                let (l, _) = m
                    .add_link_bidirectional(nodes[i][j], nodes[i + 1][j], 10.0, 1.0, DEFAULT_PROPAGATION_SPEED_KM_PER_S, None)
                    .unwrap();
                down.insert((i, j), l);
            }
        }
    }
    (m, nodes, right, down)
}

#[test]
fn test_grid_candidates() {
    let n = 10;
    let (mut m, nodes, right, down) = grid(n);
    let (src, dst) = (nodes[0][0], nodes[n - 1][n - 1]);
    m.add_demand(src, dst, 1.0, RecoveryType::None, None).unwrap();

    // follow a sequence of moves ('R'ight or 'D'own) starting at the top left corner
    let walk = |moves: &str| -> Vec<LinkId> {
        let (mut i, mut j) = (0, 0);
        moves
            .chars()
            .map(|c| match c {
                'R' => {
                    j += 1;
                    right[&(i, j - 1)]
                }
                _ => {
                    i += 1;
                    down[&(i - 1, j)]
                }
            })
            .collect()
    };

    // among all shortest paths, those with the smallest link ids come first
    let list = m.compute_unicast_candidate_path_list(None, &CandidatePathOptions::with_k(3), None).unwrap();
    assert_eq!(
        list[&(src, dst)],
        vec![walk("RRRRRRRRRDDDDDDDDD"), walk("RRRRRRRRDRDDDDDDDD"), walk("RRRRRRRRDDRDDDDDDD")]
    );

    // the hop limit admits exactly the shortest paths
    let options = CandidatePathOptions { max_num_hops: Some(18), ..CandidatePathOptions::with_k(3) };
    let list = m.compute_unicast_candidate_path_list(None, &options, None).unwrap();
    assert_eq!(list[&(src, dst)].len(), 3);
    assert!(list[&(src, dst)].iter().all(|p| p.len() == 18));

    let options = CandidatePathOptions { max_num_hops: Some(17), ..CandidatePathOptions::with_k(3) };
    let list = m.compute_unicast_candidate_path_list(None, &options, None).unwrap();
    assert!(list[&(src, dst)].is_empty());

    // no cost slack keeps the search among the shortest paths
    let options = CandidatePathOptions {
        max_route_cost_respect_to_shortest_path: Some(0.0),
        ..CandidatePathOptions::with_k(5)
    };
    let list = m.compute_unicast_candidate_path_list(None, &options, None).unwrap();
    assert_eq!(list[&(src, dst)].len(), 5);
}

/// # Ladder network
///
/// ```text
///     A --- B --- C
///     |     |     |
///     D --- E --- F
/// ```
#[test]
fn test_11_paths_ladder() {
    let mut m = NetworkModel::new();
    let a = m.add_node("A", 0.0, 0.0);
    let b = m.add_node("B", 1.0, 0.0);
    let c = m.add_node("C", 2.0, 0.0);
    let d = m.add_node("D", 0.0, 1.0);
    let e = m.add_node("E", 1.0, 1.0);
    let f = m.add_node("F", 2.0, 1.0);
    let mut link = |x: NodeId, y: NodeId| {
        m.add_link_bidirectional(x, y, 10.0, 100.0, DEFAULT_PROPAGATION_SPEED_KM_PER_S, None).unwrap()
    };
    let (ab, _) = link(a, b);
    let (bc, _) = link(b, c);
    let (de, _) = link(d, e);
    let (ef, _) = link(e, f);
    let (ad, _) = link(a, d);
    let (be, eb) = link(b, e);
    let (cf, _) = link(c, f);
    m.add_demand(a, f, 1.0, RecoveryType::None, None).unwrap();

    let candidates = m
        .compute_unicast_candidate_path_list(None, &CandidatePathOptions::with_k(5), None)
        .unwrap();
    let abcf = vec![ab, bc, cf];
    let abef = vec![ab, be, ef];
    let adef = vec![ad, de, ef];
    let adebcf = vec![ad, de, eb, bc, cf];
    assert_eq!(candidates[&(a, f)], vec![abcf.clone(), abef.clone(), adef.clone(), adebcf.clone()]);

    let pairs = m.compute_unicast_candidate_11_path_list(&candidates, DisjointType::LinkDisjoint).unwrap();
    assert_eq!(pairs[&(a, f)], vec![(abcf.clone(), adef.clone()), (abef.clone(), adebcf.clone())]);

    // B and E are traversed by both paths of the second pair
    let pairs =
        m.compute_unicast_candidate_11_path_list(&candidates, DisjointType::LinkAndNodeDisjoint).unwrap();
    assert_eq!(pairs[&(a, f)], vec![(abcf.clone(), adef.clone())]);

    // with C and D in a common risk group, only the second pair remains
    let srg = m.add_srg(1000.0, 1.0).unwrap();
    m.add_node_to_srg(srg, c).unwrap();
    m.add_node_to_srg(srg, d).unwrap();
    let pairs = m.compute_unicast_candidate_11_path_list(&candidates, DisjointType::SrgDisjoint).unwrap();
    assert_eq!(pairs[&(a, f)], vec![(abef, adebcf)]);
    m.check_caches_consistency().unwrap();
}
