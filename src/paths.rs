// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Path queries over the finalised graph.
//!
//! Every query is a parent-map DFS. In tree-edge mode only the edge that
//! first discovers a vertex is recorded, so each reached vertex has exactly
//! one parent and walking parents yields the single path the DFS found. In
//! examine-edge mode every edge out of a discovered vertex is recorded and
//! all simple paths can be enumerated by backtracking over the map.
//!
//! All walks are iterative; the graph may be deep and may contain cycles.

use smallvec::SmallVec;
use std::collections::HashSet;

use crate::graph::Graph;
use crate::vertex::VertexId;

/// For each vertex, the vertices it was reached from during a DFS.
pub struct ParentMap {
    parents: Vec<SmallVec<[VertexId; 2]>>,
}

impl ParentMap {
    fn new(num_vertices: usize) -> Self {
        ParentMap {
            parents: vec![SmallVec::new(); num_vertices],
        }
    }

    fn add(&mut self, child: VertexId, parent: VertexId) {
        self.parents[child].push(parent);
    }

    pub fn parents(&self, v: VertexId) -> &[VertexId] {
        &self.parents[v]
    }
}

/// Walk the parent map from `finish` back to `start`. Returns the path in
/// finish-to-start order, or empty if `finish` was not reached.
fn determine_path(map: &ParentMap, start: VertexId, finish: VertexId) -> Vec<VertexId> {
    let mut path = vec![finish];
    let mut cur = finish;
    while cur != start {
        let parents = map.parents(cur);
        if parents.is_empty() {
            return Vec::new();
        }
        debug_assert_eq!(parents.len(), 1, "tree-edge DFS records a single parent");
        let next = parents[0];
        debug_assert!(!path.contains(&next), "parent walk revisited a vertex");
        path.push(next);
        cur = next;
    }
    path
}

/// Enumerate every simple path from `start` to `finish` by backtracking
/// over an examine-edge parent map. Paths are returned in start-to-finish
/// order. Exponential in the worst case.
fn determine_all_paths(
    map: &ParentMap,
    start: VertexId,
    finish: VertexId,
    num_vertices: usize,
) -> Vec<Vec<VertexId>> {
    let mut results = Vec::new();
    let mut on_path = vec![false; num_vertices];
    let mut path: Vec<VertexId> = vec![finish];
    let mut cursors: Vec<usize> = vec![0];
    on_path[finish] = true;

    while let Some(&v) = path.last() {
        if v == start {
            let mut found = path.clone();
            found.reverse();
            results.push(found);
            path.pop();
            cursors.pop();
            on_path[v] = false;
            continue;
        }
        let parents = map.parents(v);
        let cursor = cursors.last_mut().unwrap();
        if *cursor < parents.len() {
            let parent = parents[*cursor];
            *cursor += 1;
            if !on_path[parent] {
                path.push(parent);
                cursors.push(0);
                on_path[parent] = true;
            }
        } else {
            path.pop();
            cursors.pop();
            on_path[v] = false;
        }
    }
    results
}

impl Graph {
    /// DFS from `root`, recording parents. Vertices in the sorted `avoid`
    /// set and deleted vertices are invisible: not visited, not expanded.
    fn dfs_parent_map(
        &self,
        root: VertexId,
        all_paths: bool,
        avoid: &[VertexId],
        reverse: bool,
    ) -> ParentMap {
        let num_vertices = self.num_vertices();
        let mut map = ParentMap::new(num_vertices);
        let visible = |v: VertexId| {
            !self.vertex(v).is_deleted() && avoid.binary_search(&v).is_err()
        };
        if !visible(root) {
            return map;
        }
        let mut discovered = vec![false; num_vertices];
        let mut stack = vec![root];
        discovered[root] = true;
        while let Some(u) = stack.pop() {
            let adjacent = if reverse {
                self.in_edges(u)
            } else {
                self.out_edges(u)
            };
            for &w in adjacent {
                if !visible(w) {
                    continue;
                }
                if all_paths {
                    map.add(w, u);
                }
                if !discovered[w] {
                    discovered[w] = true;
                    if !all_paths {
                        map.add(w, u);
                    }
                    stack.push(w);
                }
            }
        }
        map
    }

    /// A single path visiting the waypoints in order, avoiding the sorted
    /// avoid set. Empty if any leg has no path. Which path is returned is
    /// determined by DFS discovery order.
    pub fn any_point_to_point(
        &self,
        waypoints: &[VertexId],
        avoid: &[VertexId],
    ) -> Vec<VertexId> {
        let mut path: Vec<VertexId> = Vec::new();
        for leg in waypoints.windows(2) {
            let map = self.dfs_parent_map(leg[0], false, avoid, false);
            let mut sub = determine_path(&map, leg[0], leg[1]);
            if sub.is_empty() {
                return Vec::new();
            }
            sub.reverse();
            // Drop the last element: it is the first element of the next
            // leg (or the final waypoint, appended below).
            path.extend_from_slice(&sub[..sub.len() - 1]);
        }
        path.push(*waypoints.last().unwrap());
        path
    }

    /// All simple paths visiting the waypoints in order: the Cartesian
    /// product of the per-leg path sets, with combinations that repeat a
    /// vertex discarded. Exponential in the worst case.
    pub fn all_point_to_point(
        &self,
        waypoints: &[VertexId],
        avoid: &[VertexId],
    ) -> Vec<Vec<VertexId>> {
        let mut stages: Vec<Vec<Vec<VertexId>>> = Vec::new();
        for leg in waypoints.windows(2) {
            let map = self.dfs_parent_map(leg[0], true, avoid, false);
            let paths = determine_all_paths(&map, leg[0], leg[1], self.num_vertices());
            if paths.is_empty() {
                return Vec::new();
            }
            stages.push(paths);
        }
        let multi_stage = stages.len() > 1;
        let mut results: Vec<Vec<VertexId>> = stages.remove(0);
        for stage in stages {
            let mut combined = Vec::with_capacity(results.len() * stage.len());
            for prefix in &results {
                for sub in &stage {
                    // The prefix ends with this leg's start waypoint.
                    let mut joined = prefix.clone();
                    joined.extend_from_slice(&sub[1..]);
                    combined.push(joined);
                }
            }
            results = combined;
        }
        if multi_stage {
            results.retain(|path| {
                let mut seen = HashSet::with_capacity(path.len());
                path.iter().all(|v| seen.insert(*v))
            });
        }
        results
    }

    /// All paths from `start` to every reachable end point.
    pub fn all_fan_out(&self, start: VertexId) -> Vec<Vec<VertexId>> {
        let map = self.dfs_parent_map(start, false, &[], false);
        let mut paths = Vec::new();
        for v in self.vertex_ids() {
            if !self.vertex(v).is_end_point() {
                continue;
            }
            let mut path = determine_path(&map, start, v);
            if !path.is_empty() {
                path.reverse();
                paths.push(path);
            }
        }
        paths
    }

    /// All paths from every start point that reaches `finish`. The DFS runs
    /// on the reversed graph; parent walks from each start point already
    /// run start-to-finish.
    pub fn all_fan_in(&self, finish: VertexId) -> Vec<Vec<VertexId>> {
        let map = self.dfs_parent_map(finish, false, &[], true);
        let mut paths = Vec::new();
        for v in self.vertex_ids() {
            if !self.vertex(v).is_start_point() {
                continue;
            }
            let path = determine_path(&map, finish, v);
            if !path.is_empty() {
                paths.push(path);
            }
        }
        paths
    }
}
