// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! The netlist graph: vertex arena, adjacency lists, post-ingest
//! transforms and name lookups.
//!
//! Vertices are stored in an arena indexed by [`VertexId`]; edges live in
//! per-vertex out/in adjacency lists. The graph is mutated by the XML
//! reader and the transform pass, then treated as immutable by every
//! query.

use std::io::Write;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::dtype::DTypeId;
use crate::error::Error;
use crate::pattern::NamePattern;
use crate::vertex::{AstKind, Direction, Location, Vertex, VertexId, VertexRole};

type AdjList = SmallVec<[VertexId; 4]>;

#[derive(Debug, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    out_edges: Vec<AdjList>,
    in_edges: Vec<AdjList>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.out_edges.iter().map(|adj| adj.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    pub fn out_edges(&self, v: VertexId) -> &[VertexId] {
        &self.out_edges[v]
    }

    pub fn in_edges(&self, v: VertexId) -> &[VertexId] {
        &self.in_edges[v]
    }

    pub fn vertex_ids(&self) -> std::ops::Range<VertexId> {
        0..self.vertices.len()
    }

    fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(vertex);
        self.out_edges.push(AdjList::new());
        self.in_edges.push(AdjList::new());
        id
    }

    //===------------------------------------------------------------------===//
    // Builder operations, used during ingestion.
    //===------------------------------------------------------------------===//

    #[allow(clippy::too_many_arguments)]
    pub fn add_var_vertex(
        &mut self,
        name: CompactString,
        dir: Direction,
        loc: Location,
        dtype: Option<DTypeId>,
        is_param: bool,
        param_value: Option<CompactString>,
        is_public: bool,
    ) -> VertexId {
        let is_top = !name.contains('.');
        self.push_vertex(Vertex {
            kind: AstKind::Var,
            name,
            dir,
            dtype,
            loc,
            is_param,
            param_value,
            is_public,
            is_top,
            is_alias_of_reg: false,
        })
    }

    pub fn add_logic_vertex(&mut self, kind: AstKind, loc: Location) -> VertexId {
        self.push_vertex(Vertex::new_logic(kind, loc))
    }

    /// Add a directed edge. Parallel edges are collapsed.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        if self.out_edges[from].contains(&to) {
            return;
        }
        self.out_edges[from].push(to);
        self.in_edges[to].push(from);
    }

    pub fn set_vertex_direction(&mut self, v: VertexId, dir: Direction) {
        self.vertices[v].dir = dir;
    }

    /// Mark a variable as the destination of a delayed assignment.
    pub fn mark_dst_reg(&mut self, v: VertexId) {
        self.vertices[v].kind = AstKind::DstReg;
    }

    //===------------------------------------------------------------------===//
    // Post-ingest transforms. Run once, before the first query.
    //===------------------------------------------------------------------===//

    /// Run the full transform pipeline: propagate register marks through
    /// alias assignments, split registers, flag alias variables, then check
    /// the invariants.
    pub fn apply_transforms(&mut self) {
        self.mark_alias_registers();
        self.split_reg_vertices();
        self.flag_reg_aliases();
        self.check_graph();
    }

    /// Propagate the register mark through `AssignAlias` nodes: a variable
    /// fed from a register via an alias assignment is the same storage under
    /// another name, so it must split like the register itself. Chained
    /// aliases are followed to a fixpoint.
    fn mark_alias_registers(&mut self) {
        let mut worklist: Vec<VertexId> = self
            .vertex_ids()
            .filter(|&v| self.vertices[v].is_dst_reg())
            .collect();
        while let Some(reg) = worklist.pop() {
            let mut found: Vec<VertexId> = Vec::new();
            for &logic in &self.out_edges[reg] {
                if self.vertices[logic].kind != AstKind::AssignAlias {
                    continue;
                }
                for &aliased in &self.out_edges[logic] {
                    if self.vertices[aliased].kind == AstKind::Var {
                        found.push(aliased);
                    }
                }
            }
            for aliased in found {
                self.vertices[aliased].kind = AstKind::DstReg;
                worklist.push(aliased);
            }
        }
    }

    /// Split every register into a source vertex carrying the fan-out and a
    /// destination vertex carrying the fan-in. Graph connectivity then
    /// follows combinational paths only.
    fn split_reg_vertices(&mut self) {
        let original_count = self.vertices.len();
        for v in 0..original_count {
            if !self.vertices[v].is_dst_reg() {
                continue;
            }
            let mut src_reg = self.vertices[v].clone();
            src_reg.kind = AstKind::SrcReg;
            let src = self.push_vertex(src_reg);
            // Move the out edges onto the source register.
            let moved = std::mem::take(&mut self.out_edges[v]);
            for &succ in &moved {
                for pred in self.in_edges[succ].iter_mut() {
                    if *pred == v {
                        *pred = src;
                    }
                }
            }
            self.out_edges[src] = moved;
        }
    }

    /// Flag variables connected to a register through an `AssignAlias`
    /// node, so register lookups can also match the aliased names the
    /// elaborator introduces. The forward direction (register feeding the
    /// alias) is already covered by [`Self::mark_alias_registers`]; this
    /// pass catches variables that feed a register through an alias.
    fn flag_reg_aliases(&mut self) {
        for v in self.vertex_ids() {
            if !self.vertices[v].is_dst_reg() {
                continue;
            }
            let mut found: Vec<VertexId> = Vec::new();
            for &logic in &self.in_edges[v] {
                if self.vertices[logic].kind != AstKind::AssignAlias {
                    continue;
                }
                for &aliased in &self.in_edges[logic] {
                    if matches!(self.vertices[aliased].kind, AstKind::Var | AstKind::SrcReg) {
                        found.push(aliased);
                    }
                }
            }
            for aliased in found {
                self.vertices[aliased].is_alias_of_reg = true;
            }
        }
    }

    /// Check the post-transform invariants and warn on violations. These
    /// are warnings rather than errors: upstream tools occasionally
    /// mis-mark vertices, eg delayed assignments to a field of a structure.
    fn check_graph(&self) {
        for v in self.vertex_ids() {
            let vertex = &self.vertices[v];
            if vertex.name.contains("__Vlvbound") {
                clilog::warn!("{} {} vertex in netlist", vertex.name, vertex.kind.as_str());
            }
            if vertex.is_src_reg() && !self.in_edges[v].is_empty() {
                clilog::warn!("source reg {} has in edges", vertex.name);
            }
            if vertex.is_dst_reg() && !self.out_edges[v].is_empty() {
                clilog::warn!("destination reg {} has out edges", vertex.name);
            }
        }
    }

    //===------------------------------------------------------------------===//
    // Lookups.
    //===------------------------------------------------------------------===//

    /// All vertices whose name matches the pattern and whose role matches
    /// the filter.
    pub fn matching_vertices(&self, pattern: &NamePattern, role: VertexRole) -> Vec<VertexId> {
        self.vertex_ids()
            .filter(|&v| {
                let vertex = &self.vertices[v];
                vertex.matches_role(role) && pattern.matches(vertex.name.as_str())
            })
            .collect()
    }

    /// Exact whole-name lookup, ignoring roles.
    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.vertex_ids()
            .find(|&v| !self.vertices[v].is_deleted() && self.vertices[v].name == name)
    }

    //===------------------------------------------------------------------===//
    // Export.
    //===------------------------------------------------------------------===//

    /// Write the graph in Graphviz dot format.
    pub fn write_dot(&self, out: &mut impl Write) -> Result<(), Error> {
        let io = |e: std::io::Error| Error::Io(format!("writing dot file: {}", e));
        writeln!(out, "digraph netlist {{").map_err(io)?;
        for v in self.vertex_ids() {
            let vertex = &self.vertices[v];
            writeln!(
                out,
                "{} [label=\"{}\", type=\"{}\"]",
                v,
                vertex.name,
                vertex.kind.as_str()
            )
            .map_err(io)?;
        }
        for v in self.vertex_ids() {
            for &succ in &self.out_edges[v] {
                writeln!(out, "{} -> {};", v, succ).map_err(io)?;
            }
        }
        writeln!(out, "}}").map_err(io)?;
        Ok(())
    }
}
