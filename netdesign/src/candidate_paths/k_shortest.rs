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

//! # Constrained K-Shortest Paths
//!
//! Loopless paths are enumerated in ascending order of cost with Yen's algorithm. The search runs
//! on a graph of states `(node, stage)`, where the stage is the number of resources already
//! traversed. Links keep the stage, and a resource of the next required type moves the search to
//! the next stage at the same node. Without required resources, there is only one stage, and the
//! states are just the nodes.
//!
//! Every shortest path (and every spur path of Yen's algorithm) is computed with Dijkstra, where
//! ties are broken by the sequence of element ids. Hence, paths are found in the order of
//! (cost, element ids). Paths violating some bound (or using a link twice) are not returned, but
//! Yen's algorithm still deviates from them. Deviations are skipped if a lower bound (computed
//! backwards from the target) shows that no completion can satisfy the bounds.

use crate::model::{
    exceeds, LinkId, NetworkModel, NetworkModelError, NodeId, PathElement, ResourceId,
};

use log::*;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Limits applied while enumerating paths. Limits on subpaths are checked on every sequence of
/// links between two resources (or the end nodes). Without resources, the subpath is the whole
/// path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchBounds {
    pub k: usize,
    pub max_subpath_length_km: Option<f64>,
    pub max_subpath_hops: Option<usize>,
    pub max_subpath_delay_ms: Option<f64>,
    pub max_delay_ms: Option<f64>,
    pub max_cost: Option<f64>,
    pub max_cost_factor: Option<f64>,
    pub max_cost_additive: Option<f64>,
}

/// Outgoing edges of a layer, with all values needed during the search.
#[derive(Debug, Clone)]
pub(crate) struct SearchGraph {
    out_links: BTreeMap<NodeId, Vec<SearchLink>>,
    resources: BTreeMap<NodeId, Vec<SearchResource>>,
}

#[derive(Debug, Clone)]
struct SearchLink {
    id: LinkId,
    destination: NodeId,
    cost: f64,
    length_km: f64,
    delay_ms: f64,
}

#[derive(Debug, Clone)]
struct SearchResource {
    id: ResourceId,
    resource_type: String,
    cost: f64,
    delay_ms: f64,
}

impl SearchGraph {
    /// Prepare the search graph from the given links. Links without an entry in `link_cost` are
    /// ignored. Resources are added with their cost from `resource_cost` (zero if missing).
    pub fn new(
        model: &NetworkModel,
        link_cost: &BTreeMap<LinkId, f64>,
        resource_cost: &BTreeMap<ResourceId, f64>,
    ) -> Result<Self, NetworkModelError> {
        let mut out_links: BTreeMap<NodeId, Vec<SearchLink>> = BTreeMap::new();
        for (l, cost) in link_cost.iter() {
            if cost.is_nan() || *cost < 0.0 {
                return Err(NetworkModelError::NegativeValue("link cost", *cost));
            }
            let link = model.get_link(*l)?;
            out_links.entry(link.origin()).or_default().push(SearchLink {
                id: *l,
                destination: link.destination(),
                cost: *cost,
                length_km: link.length_km(),
                delay_ms: link.propagation_delay_ms(),
            });
        }
        let mut resources: BTreeMap<NodeId, Vec<SearchResource>> = BTreeMap::new();
        for r in model.get_resources() {
            let resource = model.get_resource(r)?;
            let cost = resource_cost.get(&r).copied().unwrap_or(0.0);
            if cost.is_nan() || cost < 0.0 {
                return Err(NetworkModelError::NegativeValue("resource cost", cost));
            }
            resources.entry(resource.host()).or_default().push(SearchResource {
                id: r,
                resource_type: resource.resource_type().to_string(),
                cost,
                delay_ms: resource.processing_delay_ms(),
            });
        }
        Ok(Self { out_links, resources })
    }

    /// Cost of a path, or `None` if some element is not part of the graph.
    pub fn path_cost(&self, path: &[PathElement]) -> Option<f64> {
        let mut cost = 0.0;
        for elem in path {
            cost += match elem {
                PathElement::Link(l) => {
                    self.out_links.values().flatten().find(|x| x.id == *l)?.cost
                }
                PathElement::Resource(r) => {
                    self.resources.values().flatten().find(|x| x.id == *r)?.cost
                }
            };
        }
        Some(cost)
    }
}

/// State of the search: the current node and the number of resources traversed.
type State = (NodeId, usize);

/// Edge of the state graph
#[derive(Debug, Clone, Copy)]
struct Step {
    element: PathElement,
    to: State,
    cost: f64,
    length_km: f64,
    delay_ms: f64,
}

/// Values accumulated along a path, needed to check the bounds.
#[derive(Debug, Clone, Copy, Default)]
struct Metrics {
    cost: f64,
    delay_ms: f64,
    subpath_length_km: f64,
    subpath_hops: usize,
    subpath_delay_ms: f64,
}

impl Metrics {
    fn step(mut self, s: &Step) -> Self {
        self.cost += s.cost;
        self.delay_ms += s.delay_ms;
        match s.element {
            PathElement::Link(_) => {
                self.subpath_length_km += s.length_km;
                self.subpath_hops += 1;
                self.subpath_delay_ms += s.delay_ms;
            }
            PathElement::Resource(_) => {
                self.subpath_length_km = 0.0;
                self.subpath_hops = 0;
                self.subpath_delay_ms = 0.0;
            }
        }
        self
    }

    fn within(&self, bounds: &SearchBounds) -> bool {
        bounds.max_subpath_length_km.map(|x| !exceeds(self.subpath_length_km, x)).unwrap_or(true)
            && bounds.max_subpath_hops.map(|x| self.subpath_hops <= x).unwrap_or(true)
            && bounds.max_subpath_delay_ms.map(|x| !exceeds(self.subpath_delay_ms, x)).unwrap_or(true)
            && bounds.max_delay_ms.map(|x| !exceeds(self.delay_ms, x)).unwrap_or(true)
            && bounds.max_cost.map(|x| !exceeds(self.cost, x)).unwrap_or(true)
    }
}

/// Lower bounds on the remaining values from each state towards the target. The subpath bounds
/// only reach until the end of the current subpath.
#[derive(Debug, Default)]
struct LowerBounds {
    cost: BTreeMap<State, f64>,
    delay_ms: BTreeMap<State, f64>,
    subpath_length_km: BTreeMap<State, f64>,
    subpath_hops: BTreeMap<State, f64>,
    subpath_delay_ms: BTreeMap<State, f64>,
}

/// State graph of a single search from `source` to `target`.
struct StateGraph<'a> {
    bounds: &'a SearchBounds,
    source: State,
    target: State,
    steps: BTreeMap<State, Vec<Step>>,
    lower: LowerBounds,
}

impl<'a> StateGraph<'a> {
    fn new(
        graph: &SearchGraph,
        source: NodeId,
        target: NodeId,
        service_chain: &[String],
        bounds: &'a SearchBounds,
    ) -> Self {
        let mut steps: BTreeMap<State, Vec<Step>> = BTreeMap::new();
        for stage in 0..=service_chain.len() {
            for (node, links) in graph.out_links.iter() {
                steps.entry((*node, stage)).or_default().extend(links.iter().map(|l| Step {
                    element: PathElement::Link(l.id),
                    to: (l.destination, stage),
                    cost: l.cost,
                    length_km: l.length_km,
                    delay_ms: l.delay_ms,
                }));
            }
            if let Some(next_type) = service_chain.get(stage) {
                for (node, resources) in graph.resources.iter() {
                    steps.entry((*node, stage)).or_default().extend(
                        resources.iter().filter(|r| &r.resource_type == next_type).map(|r| Step {
                            element: PathElement::Resource(r.id),
                            to: (*node, stage + 1),
                            cost: r.cost,
                            length_km: 0.0,
                            delay_ms: r.delay_ms,
                        }),
                    );
                }
            }
        }

        let target = (target, service_chain.len());
        let mut result = Self {
            bounds,
            source: (source, 0),
            target,
            steps,
            lower: LowerBounds::default(),
        };
        result.lower = result.lower_bounds();
        result
    }

    fn lower_bounds(&self) -> LowerBounds {
        let mut reverse: BTreeMap<State, Vec<(State, Step)>> = BTreeMap::new();
        for (from, steps) in self.steps.iter() {
            for s in steps.iter() {
                reverse.entry(s.to).or_default().push((*from, *s));
            }
        }

        // a subpath ends where the next resource is traversed, or at the target
        let mut subpath_ends: BTreeSet<State> = self
            .steps
            .iter()
            .filter(|(_, steps)| steps.iter().any(|s| !s.element.is_link()))
            .map(|(state, _)| *state)
            .collect();
        subpath_ends.insert(self.target);
        let target: BTreeSet<State> = std::iter::once(self.target).collect();
        let link = |s: &Step| s.element.is_link();

        LowerBounds {
            cost: reverse_dijkstra(&reverse, &target, |s| Some(s.cost)),
            delay_ms: reverse_dijkstra(&reverse, &target, |s| Some(s.delay_ms)),
            subpath_length_km: reverse_dijkstra(&reverse, &subpath_ends, |s| {
                Some(s.length_km).filter(|_| link(s))
            }),
            subpath_hops: reverse_dijkstra(&reverse, &subpath_ends, |s| {
                Some(1.0).filter(|_| link(s))
            }),
            subpath_delay_ms: reverse_dijkstra(&reverse, &subpath_ends, |s| {
                Some(s.delay_ms).filter(|_| link(s))
            }),
        }
    }

    /// Returns false if no path starting with a prefix of the given metrics, and continuing from
    /// `state` can satisfy the bounds.
    fn may_complete(&self, m: &Metrics, state: State, cost_limit: Option<f64>) -> bool {
        let lower = |map: &BTreeMap<State, f64>| map.get(&state).copied();
        let lb = &self.lower;
        let (cost, delay, length, hops, subpath_delay) = match (
            lower(&lb.cost),
            lower(&lb.delay_ms),
            lower(&lb.subpath_length_km),
            lower(&lb.subpath_hops),
            lower(&lb.subpath_delay_ms),
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => return false,
        };
        let b = self.bounds;
        cost_limit.map(|x| !exceeds(m.cost + cost, x)).unwrap_or(true)
            && b.max_delay_ms.map(|x| !exceeds(m.delay_ms + delay, x)).unwrap_or(true)
            && b.max_subpath_length_km.map(|x| !exceeds(m.subpath_length_km + length, x)).unwrap_or(true)
            && b.max_subpath_hops.map(|x| !exceeds(m.subpath_hops as f64 + hops, x as f64)).unwrap_or(true)
            && b.max_subpath_delay_ms
                .map(|x| !exceeds(m.subpath_delay_ms + subpath_delay, x))
                .unwrap_or(true)
    }

    /// Dijkstra from `from` to the target, avoiding the blocked states, and not leaving `from`
    /// over a blocked element. Among all paths of minimal cost, the one with the smallest sequence
    /// of element ids is returned.
    fn shortest_path(
        &self,
        from: State,
        blocked_states: &BTreeSet<State>,
        blocked_elements: &BTreeSet<PathElement>,
    ) -> Option<(f64, Vec<Step>)> {
        // labels: (parent label, step leading here)
        let mut labels: Vec<(usize, Option<Step>)> = vec![(0, None)];
        let mut settled: BTreeSet<State> = BTreeSet::new();
        let mut queue: BinaryHeap<Reverse<(OrderedFloat<f64>, Vec<u64>, usize)>> = BinaryHeap::new();
        queue.push(Reverse((OrderedFloat(0.0), Vec::new(), 0)));

        while let Some(Reverse((cost, key, idx))) = queue.pop() {
            let state = labels[idx].1.map(|s| s.to).unwrap_or(from);
            if !settled.insert(state) {
                continue;
            }
            if state == self.target {
                let mut path = Vec::new();
                let mut i = idx;
                while let (parent, Some(step)) = labels[i] {
                    path.push(step);
                    i = parent;
                }
                path.reverse();
                return Some((cost.0, path));
            }
            for s in self.steps.get(&state).into_iter().flatten() {
                if settled.contains(&s.to) || blocked_states.contains(&s.to) {
                    continue;
                }
                if state == from && blocked_elements.contains(&s.element) {
                    continue;
                }
                let mut next_key = key.clone();
                next_key.push(element_key(&s.element));
                queue.push(Reverse((OrderedFloat(cost.0 + s.cost), next_key, labels.len())));
                labels.push((idx, Some(*s)));
            }
        }
        None
    }
}

fn reverse_dijkstra(
    reverse: &BTreeMap<State, Vec<(State, Step)>>,
    targets: &BTreeSet<State>,
    weight: impl Fn(&Step) -> Option<f64>,
) -> BTreeMap<State, f64> {
    let mut dist: BTreeMap<State, f64> = BTreeMap::new();
    let mut queue: BinaryHeap<Reverse<(OrderedFloat<f64>, State)>> =
        targets.iter().map(|t| Reverse((OrderedFloat(0.0), *t))).collect();
    while let Some(Reverse((d, state))) = queue.pop() {
        if dist.contains_key(&state) {
            continue;
        }
        dist.insert(state, d.0);
        for (prev, step) in reverse.get(&state).into_iter().flatten() {
            if dist.contains_key(prev) {
                continue;
            }
            if let Some(w) = weight(step) {
                queue.push(Reverse((OrderedFloat(d.0 + w), *prev)));
            }
        }
    }
    dist
}

fn element_key(elem: &PathElement) -> u64 {
    match elem {
        PathElement::Link(l) => l.index(),
        PathElement::Resource(r) => r.index(),
    }
}

fn path_key(path: &[Step]) -> Vec<u64> {
    path.iter().map(|s| element_key(&s.element)).collect()
}

/// Metrics of the complete path, or `None` if it violates some bound or uses a link twice.
fn evaluate(path: &[Step], bounds: &SearchBounds) -> Option<Metrics> {
    let mut m = Metrics::default();
    let mut links: BTreeSet<LinkId> = BTreeSet::new();
    for s in path {
        if let PathElement::Link(l) = s.element {
            if !links.insert(l) {
                return None;
            }
        }
        m = m.step(s);
        if !m.within(bounds) {
            return None;
        }
    }
    Some(m)
}

/// Enumerate up to `k` loopless paths from `source` to `target`, traversing resources of the
/// given types in order. Returns the paths together with their cost, in ascending order of cost.
pub(crate) fn k_shortest_paths(
    graph: &SearchGraph,
    source: NodeId,
    target: NodeId,
    service_chain: &[String],
    bounds: &SearchBounds,
) -> Vec<(f64, Vec<PathElement>)> {
    let mut result: Vec<(f64, Vec<PathElement>)> = Vec::new();
    if bounds.k == 0 {
        return result;
    }
    let states = StateGraph::new(graph, source, target, service_chain, bounds);

    // upper bound on the cost, known as soon as the shortest path is found
    let mut cost_limit: Option<f64> = bounds.max_cost;
    if !states.may_complete(&Metrics::default(), states.source, cost_limit) {
        debug!("no candidate path from {} to {} within the bounds", source, target);
        return result;
    }

    // paths already deviated from, and candidates ordered by (cost, element ids)
    let mut found: Vec<Vec<Step>> = Vec::new();
    let mut seen: BTreeSet<Vec<u64>> = BTreeSet::new();
    let mut candidates: BTreeMap<Vec<u64>, Vec<Step>> = BTreeMap::new();
    let mut queue: BinaryHeap<Reverse<(OrderedFloat<f64>, Vec<u64>)>> = BinaryHeap::new();

    if let Some((cost, path)) = states.shortest_path(states.source, &BTreeSet::new(), &BTreeSet::new()) {
        let key = path_key(&path);
        seen.insert(key.clone());
        queue.push(Reverse((OrderedFloat(cost), key.clone())));
        candidates.insert(key, path);
    }

    while let Some(Reverse((cost, key))) = queue.pop() {
        if let Some(limit) = cost_limit {
            if exceeds(cost.0, limit) {
                break;
            }
        }
        let path = match candidates.remove(&key) {
            Some(p) => p,
            None => continue,
        };

        if let Some(m) = evaluate(&path, bounds) {
            trace!("found candidate path with cost {}", m.cost);
            if result.is_empty() {
                cost_limit = relative_limit(cost_limit, m.cost, bounds);
            }
            result.push((m.cost, path.iter().map(|s| s.element).collect()));
            if result.len() >= bounds.k {
                break;
            }
        }
        found.push(path);
        let path = &found[found.len() - 1];

        // deviate from the path at every state along it
        let mut root = Metrics::default();
        let mut root_states: BTreeSet<State> = BTreeSet::new();
        let mut root_links: BTreeSet<LinkId> = BTreeSet::new();
        let mut state = states.source;
        for i in 0..path.len() {
            if states.may_complete(&root, state, cost_limit) {
                let blocked: BTreeSet<PathElement> = found
                    .iter()
                    .filter(|p| p.len() > i)
                    .filter(|p| p[..i].iter().zip(path[..i].iter()).all(|(a, b)| a.element == b.element))
                    .map(|p| p[i].element)
                    .collect();
                if let Some((_, spur)) = states.shortest_path(state, &root_states, &blocked) {
                    let deviation: Vec<Step> = path[..i].iter().copied().chain(spur).collect();
                    let key = path_key(&deviation);
                    let cost: f64 = deviation.iter().map(|s| s.cost).sum();
                    if seen.insert(key.clone()) {
                        queue.push(Reverse((OrderedFloat(cost), key.clone())));
                        candidates.insert(key, deviation);
                    }
                }
            }

            // extend the root by one step
            let step = path[i];
            if let PathElement::Link(l) = step.element {
                if !root_links.insert(l) {
                    break;
                }
            }
            root_states.insert(state);
            root = root.step(&step);
            if !root.within(bounds) {
                break;
            }
            state = step.to;
        }
    }

    debug!("found {} candidate paths from {} to {}", result.len(), source, target);
    result
}

fn relative_limit(current: Option<f64>, shortest: f64, bounds: &SearchBounds) -> Option<f64> {
    let mut limit = current;
    let mut tighten = |x: f64| limit = Some(limit.map(|l| l.min(x)).unwrap_or(x));
    if let Some(factor) = bounds.max_cost_factor {
        tighten(shortest * factor);
    }
    if let Some(additive) = bounds.max_cost_additive {
        tighten(shortest + additive);
    }
    limit
}

/// Returns the links of a path consisting only of links.
pub(crate) fn links_of(path: &[PathElement]) -> Vec<LinkId> {
    path.iter().filter_map(|e| e.link()).collect()
}
