// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Public query facade over a finalised netlist.
//!
//! A [`Netlist`] is constructed from Verilator XML, transformed once, and
//! then queried read-only. Queries resolve user-supplied name patterns
//! to vertices with role filters, then run the path engine.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::dtype::DTypeRegistry;
use crate::error::Error;
use crate::graph::Graph;
use crate::options::{self, Options};
use crate::pattern::NamePattern;
use crate::vertex::{SourceFile, Vertex, VertexId, VertexRole};
use crate::xml_reader;

/// An ordered list of path waypoints `[start, through..., end]` plus an
/// unordered set of points to avoid, all as name patterns.
#[derive(Debug, Clone)]
pub struct Waypoints {
    points: Vec<String>,
    avoid_points: Vec<String>,
}

impl Waypoints {
    pub fn new(start: impl Into<String>, finish: impl Into<String>) -> Self {
        Waypoints {
            points: vec![start.into(), finish.into()],
            avoid_points: Vec::new(),
        }
    }

    /// Add a point the path must pass through, before the end point.
    pub fn add_through_point(&mut self, name: impl Into<String>) {
        let end = self.points.len() - 1;
        self.points.insert(end, name.into());
    }

    /// Add a point the path must not pass through.
    pub fn add_avoid_point(&mut self, name: impl Into<String>) {
        self.avoid_points.push(name.into());
    }

    pub fn points(&self) -> &[String] {
        &self.points
    }

    pub fn avoid_points(&self) -> &[String] {
        &self.avoid_points
    }
}

/// A parsed, transformed netlist and its query surface.
pub struct Netlist {
    graph: Graph,
    files: Vec<SourceFile>,
    dtypes: DTypeRegistry,
    options: Options,
}

impl Netlist {
    /// Read a Verilator XML file, build the graph and run the transforms.
    /// The matching options are captured from the process-wide
    /// configuration; see [`Netlist::set_options`] to override them.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Netlist, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_xml(&content)
    }

    /// Build a netlist from an XML string.
    pub fn from_xml(xml: &str) -> Result<Netlist, Error> {
        clilog::info!("parsing input XML");
        let mut graph = Graph::new();
        let mut files = Vec::new();
        let mut dtypes = DTypeRegistry::new();
        xml_reader::read_netlist(xml, &mut graph, &mut files, &mut dtypes)?;
        graph.apply_transforms();
        Ok(Netlist {
            graph,
            files,
            dtypes,
            options: options::global(),
        })
    }

    /// True when ingestion skipped a non-flat netlist.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    //===----------------------------------------------------------------===//
    // Vertex lookup.
    //===----------------------------------------------------------------===//

    fn multiple_matches(&self, ids: &[VertexId], name: &str, role: &str) -> Error {
        let mut msg = format!("multiple vertices matching {} pattern: {}", role, name);
        for &v in ids {
            let vertex = self.graph.vertex(v);
            msg.push_str(&format!("\n{} {}", vertex.name, vertex.kind.as_str()));
        }
        Error::MultipleMatches(msg)
    }

    fn unique_vertex(
        &self,
        name: &str,
        role: VertexRole,
        role_str: &str,
        match_any: bool,
    ) -> Result<Option<VertexId>, Error> {
        let pattern = NamePattern::compile(name, &self.options)?;
        let matches = self.graph.matching_vertices(&pattern, role);
        if match_any {
            return Ok(matches.first().copied());
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            _ => Err(self.multiple_matches(&matches, name, role_str)),
        }
    }

    pub fn get_start_vertex(&self, name: &str, match_any: bool) -> Result<Option<VertexId>, Error> {
        self.unique_vertex(name, VertexRole::StartPoint, "start point", match_any)
    }

    pub fn get_end_vertex(&self, name: &str, match_any: bool) -> Result<Option<VertexId>, Error> {
        self.unique_vertex(name, VertexRole::EndPoint, "end point", match_any)
    }

    pub fn get_mid_vertex(&self, name: &str, match_any: bool) -> Result<Option<VertexId>, Error> {
        self.unique_vertex(name, VertexRole::MidPoint, "mid point", match_any)
    }

    pub fn get_reg_vertex(&self, name: &str, match_any: bool) -> Result<Option<VertexId>, Error> {
        self.unique_vertex(name, VertexRole::Reg, "register", match_any)
    }

    pub fn get_reg_alias_vertex(
        &self,
        name: &str,
        match_any: bool,
    ) -> Result<Option<VertexId>, Error> {
        self.unique_vertex(name, VertexRole::RegAlias, "register alias", match_any)
    }

    //===----------------------------------------------------------------===//
    // Existence probes.
    //===----------------------------------------------------------------===//

    pub fn startpoint_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_start_vertex(name, false)?.is_some())
    }

    pub fn endpoint_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_end_vertex(name, false)?.is_some())
    }

    pub fn any_startpoint_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_start_vertex(name, true)?.is_some())
    }

    pub fn any_endpoint_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_end_vertex(name, true)?.is_some())
    }

    /// True if the name matches a register or a register alias.
    pub fn reg_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_reg_vertex(name, false)?.is_some()
            || self.get_reg_alias_vertex(name, false)?.is_some())
    }

    pub fn any_reg_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_reg_vertex(name, true)?.is_some()
            || self.get_reg_alias_vertex(name, true)?.is_some())
    }

    //===----------------------------------------------------------------===//
    // Waypoint resolution.
    //===----------------------------------------------------------------===//

    fn read_waypoints(&self, waypoints: &Waypoints) -> Result<Vec<VertexId>, Error> {
        let match_any = self.options.match_any;
        let points = waypoints.points();
        let mut ids = Vec::with_capacity(points.len());
        for (i, name) in points.iter().enumerate() {
            let vertex = if i == 0 {
                self.get_start_vertex(name, match_any)?.ok_or_else(|| {
                    Error::NotFound(format!("could not find start vertex matching {}", name))
                })?
            } else if i + 1 == points.len() {
                self.get_end_vertex(name, match_any)?.ok_or_else(|| {
                    Error::NotFound(format!("could not find end vertex matching {}", name))
                })?
            } else {
                self.get_mid_vertex(name, match_any)?.ok_or_else(|| {
                    Error::NotFound(format!("could not find through vertex {}", name))
                })?
            };
            ids.push(vertex);
        }
        Ok(ids)
    }

    fn read_avoid_points(&self, waypoints: &Waypoints) -> Result<Vec<VertexId>, Error> {
        let match_any = self.options.match_any;
        let mut ids = Vec::with_capacity(waypoints.avoid_points().len());
        for name in waypoints.avoid_points() {
            let vertex = self.get_mid_vertex(name, match_any)?.ok_or_else(|| {
                Error::NotFound(format!("could not find vertex to avoid {}", name))
            })?;
            ids.push(vertex);
        }
        // Sorted for binary-search membership during the DFS.
        ids.sort_unstable();
        Ok(ids)
    }

    //===----------------------------------------------------------------===//
    // Path queries.
    //===----------------------------------------------------------------===//

    fn vertex_refs(&self, ids: &[VertexId]) -> Vec<&Vertex> {
        ids.iter().map(|&v| self.graph.vertex(v)).collect()
    }

    pub fn path_exists(&self, waypoints: &Waypoints) -> Result<bool, Error> {
        let ids = self.read_waypoints(waypoints)?;
        let avoid = self.read_avoid_points(waypoints)?;
        Ok(!self.graph.any_point_to_point(&ids, &avoid).is_empty())
    }

    /// A single path through the waypoints, or empty if none exists.
    pub fn any_path(&self, waypoints: &Waypoints) -> Result<Vec<&Vertex>, Error> {
        let ids = self.read_waypoints(waypoints)?;
        let avoid = self.read_avoid_points(waypoints)?;
        Ok(self.vertex_refs(&self.graph.any_point_to_point(&ids, &avoid)))
    }

    /// All simple paths through the waypoints. Exponential in the worst
    /// case; prefer [`Netlist::any_path`] for large fan-in cones.
    pub fn all_paths(&self, waypoints: &Waypoints) -> Result<Vec<Vec<&Vertex>>, Error> {
        let ids = self.read_waypoints(waypoints)?;
        let avoid = self.read_avoid_points(waypoints)?;
        Ok(self
            .graph
            .all_point_to_point(&ids, &avoid)
            .iter()
            .map(|path| self.vertex_refs(path))
            .collect())
    }

    /// All paths from a start point to the end points it reaches.
    pub fn all_fan_out(&self, start_name: &str) -> Result<Vec<Vec<&Vertex>>, Error> {
        let vertex = self
            .get_start_vertex(start_name, self.options.match_any)?
            .ok_or_else(|| {
                Error::NotFound(format!("could not find start vertex {}", start_name))
            })?;
        Ok(self
            .graph
            .all_fan_out(vertex)
            .iter()
            .map(|path| self.vertex_refs(path))
            .collect())
    }

    /// All paths from the start points that reach an end point.
    pub fn all_fan_in(&self, end_name: &str) -> Result<Vec<Vec<&Vertex>>, Error> {
        let vertex = self
            .get_end_vertex(end_name, self.options.match_any)?
            .ok_or_else(|| Error::NotFound(format!("could not find end vertex {}", end_name)))?;
        Ok(self
            .graph
            .all_fan_in(vertex)
            .iter()
            .map(|path| self.vertex_refs(path))
            .collect())
    }

    //===----------------------------------------------------------------===//
    // Reporting.
    //===----------------------------------------------------------------===//

    /// All named vertices matching a pattern, sorted by name then kind.
    pub fn named_vertices(&self, pattern: &str) -> Result<Vec<&Vertex>, Error> {
        let pattern = NamePattern::compile(pattern, &self.options)?;
        let mut vertices: Vec<&Vertex> = self
            .graph
            .matching_vertices(&pattern, VertexRole::Named)
            .into_iter()
            .map(|v| self.graph.vertex(v))
            .collect();
        vertices.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });
        Ok(vertices)
    }

    /// Render a vertex's data type, `"none"` when it has no dtype.
    pub fn vertex_type_str(&self, vertex: &Vertex) -> String {
        match vertex.dtype {
            Some(dtype) => self.dtypes.type_str(dtype),
            None => "none".to_string(),
        }
    }

    /// The dtype string of the unique vertex matching a pattern.
    pub fn vertex_dtype_str(&self, name: &str, role: VertexRole) -> Result<String, Error> {
        let vertex = self
            .unique_vertex(name, role, "dtype", false)?
            .ok_or_else(|| Error::NotFound(format!("could not find vertex {}", name)))?;
        Ok(self.vertex_type_str(self.graph.vertex(vertex)))
    }

    /// The dtype width of the unique vertex matching a pattern.
    pub fn vertex_dtype_width(&self, name: &str, role: VertexRole) -> Result<u64, Error> {
        let vertex = self
            .unique_vertex(name, role, "dtype", false)?
            .ok_or_else(|| Error::NotFound(format!("could not find vertex {}", name)))?;
        let dtype = self.graph.vertex(vertex).dtype.ok_or_else(|| {
            Error::NotFound(format!("vertex {} has no dtype", name))
        })?;
        Ok(self.dtypes.width(dtype))
    }

    /// The width of a data type looked up by declared name.
    pub fn dtype_width(&self, name: &str) -> Result<u64, Error> {
        let dtype = self
            .dtypes
            .find_by_name(name)
            .ok_or_else(|| Error::NotFound(format!("could not find dtype {}", name)))?;
        Ok(self.dtypes.width(dtype))
    }

    /// `file:line` of a vertex's declaration, for reports.
    pub fn location_str(&self, vertex: &Vertex) -> String {
        match self.files.get(vertex.loc.file) {
            Some(file) => format!("{}:{}", file.filename, vertex.loc.start_line),
            None => "?".to_string(),
        }
    }

    /// Dump the graph in Graphviz dot format.
    pub fn dump_dot_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::Io(format!("unable to open {}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        self.graph.write_dot(&mut writer)?;
        clilog::info!("dot -Tpdf {} -o graph.pdf", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MatchMode;
    use crate::vertex::AstKind;

    fn fixture(module_body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<verilator_xml>
  <files><file id="a" filename="test.sv" language="1800-2017"/></files>
  <netlist>
    <module name="TOP" loc="a,1,1,1,1">{}</module>
    <typetable>
      <basicdtype id="1" name="logic" loc="a,1,1,1,1"/>
      <basicdtype id="2" name="logic" left="31" right="0" loc="a,1,1,1,1"/>
    </typetable>
  </netlist>
</verilator_xml>"#,
            module_body
        )
    }

    fn netlist(module_body: &str) -> Netlist {
        Netlist::from_xml(&fixture(module_body)).unwrap()
    }

    const ADDER: &str = r#"
      <var name="i_a" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="i_b" dtype_id="1" dir="input" loc="a,3,1,3,2"/>
      <var name="o_sum" dtype_id="1" dir="output" loc="a,4,1,4,2"/>
      <var name="o_co" dtype_id="1" dir="output" loc="a,5,1,5,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <contassign dtype_id="1" loc="a,7,1,7,9">
          <xor loc="a,7,1,7,9">
            <varref name="i_a" dtype_id="1" loc="a,7,1,7,2"/>
            <varref name="i_b" dtype_id="1" loc="a,7,4,7,5"/>
          </xor>
          <varref name="o_sum" dtype_id="1" loc="a,7,7,7,9"/>
        </contassign>
        <contassign dtype_id="1" loc="a,8,1,8,9">
          <and loc="a,8,1,8,9">
            <varref name="i_a" dtype_id="1" loc="a,8,1,8,2"/>
            <varref name="i_b" dtype_id="1" loc="a,8,4,8,5"/>
          </and>
          <varref name="o_co" dtype_id="1" loc="a,8,7,8,9"/>
        </contassign>
      </scope></topscope>
    "#;

    const ASSIGN_CHAIN: &str = r#"
      <var name="in" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="out" dtype_id="1" dir="output" loc="a,3,1,3,2"/>
      <var name="basic_assign_chain.a" dtype_id="1" loc="a,4,1,4,2"/>
      <var name="basic_assign_chain.b" dtype_id="1" loc="a,5,1,5,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <contassign dtype_id="1" loc="a,7,1,7,9">
          <varref name="in" dtype_id="1" loc="a,7,1,7,2"/>
          <varref name="a" dtype_id="1" loc="a,7,4,7,5"/>
        </contassign>
        <contassign dtype_id="1" loc="a,8,1,8,9">
          <varref name="a" dtype_id="1" loc="a,8,1,8,2"/>
          <varref name="b" dtype_id="1" loc="a,8,4,8,5"/>
        </contassign>
        <contassign dtype_id="1" loc="a,9,1,9,9">
          <varref name="b" dtype_id="1" loc="a,9,1,9,2"/>
          <varref name="out" dtype_id="1" loc="a,9,4,9,5"/>
        </contassign>
      </scope></topscope>
    "#;

    const FF_CHAIN: &str = r#"
      <var name="i_clk" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="in" dtype_id="1" dir="input" loc="a,3,1,3,2"/>
      <var name="out" dtype_id="1" dir="output" loc="a,4,1,4,2"/>
      <var name="basic_ff_chain.a" dtype_id="1" loc="a,5,1,5,2"/>
      <var name="basic_ff_chain.b" dtype_id="1" loc="a,6,1,6,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <always loc="a,8,1,10,1">
          <senitem loc="a,8,1,8,9">
            <varref name="i_clk" dtype_id="1" loc="a,8,1,8,5"/>
          </senitem>
          <assigndly dtype_id="1" loc="a,9,1,9,9">
            <varref name="in" dtype_id="1" loc="a,9,6,9,8"/>
            <varref name="a" dtype_id="1" loc="a,9,1,9,2"/>
          </assigndly>
        </always>
        <always loc="a,11,1,13,1">
          <senitem loc="a,11,1,11,9">
            <varref name="i_clk" dtype_id="1" loc="a,11,1,11,5"/>
          </senitem>
          <assigndly dtype_id="1" loc="a,12,1,12,9">
            <varref name="a" dtype_id="1" loc="a,12,6,12,8"/>
            <varref name="b" dtype_id="1" loc="a,12,1,12,2"/>
          </assigndly>
        </always>
        <contassign dtype_id="1" loc="a,14,1,14,9">
          <varref name="b" dtype_id="1" loc="a,14,6,14,8"/>
          <varref name="out" dtype_id="1" loc="a,14,1,14,4"/>
        </contassign>
      </scope></topscope>
    "#;

    const MULTIPLE_PATHS: &str = r#"
      <var name="in" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="out" dtype_id="1" dir="output" loc="a,3,1,3,2"/>
      <var name="multiple_paths.a" dtype_id="1" loc="a,4,1,4,2"/>
      <var name="multiple_paths.b" dtype_id="1" loc="a,5,1,5,2"/>
      <var name="multiple_paths.c" dtype_id="1" loc="a,6,1,6,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <contassign dtype_id="1" loc="a,8,1,8,9">
          <varref name="in" dtype_id="1" loc="a,8,1,8,2"/>
          <varref name="a" dtype_id="1" loc="a,8,4,8,5"/>
        </contassign>
        <contassign dtype_id="1" loc="a,9,1,9,9">
          <varref name="in" dtype_id="1" loc="a,9,1,9,2"/>
          <varref name="b" dtype_id="1" loc="a,9,4,9,5"/>
        </contassign>
        <contassign dtype_id="1" loc="a,10,1,10,9">
          <varref name="in" dtype_id="1" loc="a,10,1,10,2"/>
          <varref name="c" dtype_id="1" loc="a,10,4,10,5"/>
        </contassign>
        <contassign dtype_id="1" loc="a,11,1,11,9">
          <add loc="a,11,1,11,9">
            <varref name="a" dtype_id="1" loc="a,11,1,11,2"/>
            <varref name="b" dtype_id="1" loc="a,11,3,11,4"/>
            <varref name="c" dtype_id="1" loc="a,11,5,11,6"/>
          </add>
          <varref name="out" dtype_id="1" loc="a,11,8,11,9"/>
        </contassign>
      </scope></topscope>
    "#;

    const FAN_OUT_IN: &str = r#"
      <var name="i_clk" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="in" dtype_id="1" dir="input" loc="a,3,1,3,2"/>
      <var name="out" dtype_id="1" dir="output" loc="a,4,1,4,2"/>
      <var name="fan_out_in.a" dtype_id="1" loc="a,5,1,5,2"/>
      <var name="fan_out_in.b" dtype_id="1" loc="a,6,1,6,2"/>
      <var name="fan_out_in.c" dtype_id="1" loc="a,7,1,7,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <always loc="a,9,1,11,1">
          <senitem loc="a,9,1,9,9">
            <varref name="i_clk" dtype_id="1" loc="a,9,1,9,5"/>
          </senitem>
          <assigndly dtype_id="1" loc="a,10,1,10,9">
            <varref name="in" dtype_id="1" loc="a,10,6,10,8"/>
            <varref name="a" dtype_id="1" loc="a,10,1,10,2"/>
          </assigndly>
        </always>
        <always loc="a,12,1,14,1">
          <senitem loc="a,12,1,12,9">
            <varref name="i_clk" dtype_id="1" loc="a,12,1,12,5"/>
          </senitem>
          <assigndly dtype_id="1" loc="a,13,1,13,9">
            <varref name="in" dtype_id="1" loc="a,13,6,13,8"/>
            <varref name="b" dtype_id="1" loc="a,13,1,13,2"/>
          </assigndly>
        </always>
        <always loc="a,15,1,17,1">
          <senitem loc="a,15,1,15,9">
            <varref name="i_clk" dtype_id="1" loc="a,15,1,15,5"/>
          </senitem>
          <assigndly dtype_id="1" loc="a,16,1,16,9">
            <varref name="in" dtype_id="1" loc="a,16,6,16,8"/>
            <varref name="c" dtype_id="1" loc="a,16,1,16,2"/>
          </assigndly>
        </always>
        <contassign dtype_id="1" loc="a,18,1,18,9">
          <add loc="a,18,1,18,9">
            <varref name="a" dtype_id="1" loc="a,18,1,18,2"/>
            <varref name="b" dtype_id="1" loc="a,18,3,18,4"/>
            <varref name="c" dtype_id="1" loc="a,18,5,18,6"/>
          </add>
          <varref name="out" dtype_id="1" loc="a,18,8,18,9"/>
        </contassign>
      </scope></topscope>
    "#;

    const SELF_LOOP: &str = r#"
      <var name="i_clk" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="i_data" dtype_id="2" dir="input" loc="a,3,1,3,2"/>
      <var name="o_data" dtype_id="2" dir="output" loc="a,4,1,4,2"/>
      <var name="pipeline_no_loops.data_q" dtype_id="2" loc="a,5,1,5,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <always loc="a,7,1,9,1">
          <senitem loc="a,7,1,7,9">
            <varref name="i_clk" dtype_id="1" loc="a,7,1,7,5"/>
          </senitem>
          <assigndly dtype_id="2" loc="a,8,1,8,9">
            <concat loc="a,8,1,8,9">
              <varref name="data_q" dtype_id="2" loc="a,8,1,8,2"/>
              <varref name="i_data" dtype_id="2" loc="a,8,4,8,5"/>
            </concat>
            <varref name="data_q" dtype_id="2" loc="a,8,7,8,8"/>
          </assigndly>
        </always>
        <contassign dtype_id="2" loc="a,10,1,10,9">
          <varref name="data_q" dtype_id="2" loc="a,10,6,10,8"/>
          <varref name="o_data" dtype_id="2" loc="a,10,1,10,4"/>
        </contassign>
      </scope></topscope>
    "#;

    #[test]
    fn adder_paths_exist_input_to_output() {
        let netlist = netlist(ADDER);
        for start in ["i_a", "i_b"] {
            for end in ["o_sum", "o_co"] {
                assert!(
                    netlist.path_exists(&Waypoints::new(start, end)).unwrap(),
                    "{} -> {}",
                    start,
                    end
                );
                // The reverse direction is not a valid query: an output
                // port is not a start point.
                let err = netlist.path_exists(&Waypoints::new(end, start)).unwrap_err();
                assert!(matches!(err, Error::NotFound(_)));
            }
        }
    }

    #[test]
    fn assign_chain_any_path_report() {
        let netlist = netlist(ASSIGN_CHAIN);
        let path = netlist.any_path(&Waypoints::new("in", "out")).unwrap();
        assert_eq!(path.len(), 7);
        let expect = [
            (AstKind::Var, "in"),
            (AstKind::Assign, ""),
            (AstKind::Var, "basic_assign_chain.a"),
            (AstKind::Assign, ""),
            (AstKind::Var, "basic_assign_chain.b"),
            (AstKind::Assign, ""),
            (AstKind::Var, "out"),
        ];
        for (vertex, (kind, name)) in path.iter().zip(expect) {
            assert_eq!(vertex.kind, kind);
            assert_eq!(vertex.name, name);
        }
        assert_eq!(netlist.vertex_type_str(path[0]), "logic");
    }

    #[test]
    fn path_exists_iff_any_path_nonempty() {
        let netlist = netlist(ASSIGN_CHAIN);
        let forward = Waypoints::new("in", "out");
        assert_eq!(
            netlist.path_exists(&forward).unwrap(),
            !netlist.any_path(&forward).unwrap().is_empty()
        );
    }

    #[test]
    fn avoid_point_blocks_the_chain() {
        let netlist = netlist(ASSIGN_CHAIN);
        let mut waypoints = Waypoints::new("in", "out");
        waypoints.add_avoid_point("chain.a");
        assert!(!netlist.path_exists(&waypoints).unwrap());
        let path = netlist.any_path(&waypoints).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn ff_chain_register_paths() {
        let netlist = netlist(FF_CHAIN);
        // Into the first register.
        let path = netlist
            .any_path(&Waypoints::new("in", "basic_ff_chain.a"))
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].kind, AstKind::Var);
        assert_eq!(path[1].kind, AstKind::AssignDly);
        assert_eq!(path[2].kind, AstKind::DstReg);
        assert_eq!(path[2].name, "basic_ff_chain.a");

        // Register to register.
        let path = netlist
            .any_path(&Waypoints::new("basic_ff_chain.a", "basic_ff_chain.b"))
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].kind, AstKind::SrcReg);
        assert_eq!(path[0].name, "basic_ff_chain.a");
        assert_eq!(path[1].kind, AstKind::AssignDly);
        assert_eq!(path[2].kind, AstKind::DstReg);
        assert_eq!(path[2].name, "basic_ff_chain.b");

        // Out of the last register.
        let path = netlist
            .any_path(&Waypoints::new("basic_ff_chain.b", "out"))
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].kind, AstKind::SrcReg);
        assert_eq!(path[1].kind, AstKind::Assign);
        assert_eq!(path[2].name, "out");
    }

    #[test]
    fn ff_chain_probes() {
        let netlist = netlist(FF_CHAIN);
        // "in" also matches the source registers (the module prefix
        // contains the substring), so the single-match probe raises while
        // the any-match probe succeeds.
        assert!(netlist.any_startpoint_exists("in").unwrap());
        assert!(matches!(
            netlist.startpoint_exists("in"),
            Err(Error::MultipleMatches(_))
        ));
        assert!(netlist.startpoint_exists("i_clk").unwrap());
        assert!(netlist.endpoint_exists("out").unwrap());
        assert!(netlist.reg_exists("ff_chain.a").unwrap());
        assert!(netlist.reg_exists("ff_chain.b").unwrap());
        assert!(netlist.any_reg_exists("ff_chain.*").unwrap());
        assert!(!netlist.reg_exists("out").unwrap());
        assert!(!netlist.startpoint_exists("out").unwrap());
    }

    #[test]
    fn multiple_paths_enumeration() {
        let netlist = netlist(MULTIPLE_PATHS);
        let paths = netlist.all_paths(&Waypoints::new("in", "out")).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert_eq!(path[0].name, "in");
            assert_eq!(path.last().unwrap().name, "out");
            assert_eq!(path.len(), 5);
        }
        // The single path reported by any_path is one of them.
        let any = netlist.any_path(&Waypoints::new("in", "out")).unwrap();
        let names = |path: &[&Vertex]| {
            path.iter().map(|v| v.name.clone()).collect::<Vec<_>>()
        };
        assert!(paths.iter().any(|p| names(p) == names(&any)));
    }

    #[test]
    fn through_point_selects_a_branch() {
        let netlist = netlist(MULTIPLE_PATHS);
        let mut waypoints = Waypoints::new("in", "out");
        waypoints.add_through_point("paths.b");
        let path = netlist.any_path(&waypoints).unwrap();
        assert_eq!(path.len(), 5);
        assert!(path.iter().any(|v| v.name == "multiple_paths.b"));

        let paths = netlist.all_paths(&waypoints).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn fan_out_and_fan_in() {
        let netlist = netlist(FAN_OUT_IN);
        let fan_out = netlist.all_fan_out("in").unwrap();
        assert_eq!(fan_out.len(), 3);
        for path in &fan_out {
            assert_eq!(path[0].name, "in");
            assert_eq!(path.last().unwrap().kind, AstKind::DstReg);
        }
        let fan_in = netlist.all_fan_in("out").unwrap();
        assert_eq!(fan_in.len(), 3);
        for path in &fan_in {
            assert_eq!(path[0].kind, AstKind::SrcReg);
            assert_eq!(path.last().unwrap().name, "out");
        }
    }

    #[test]
    fn self_loop_register_path() {
        let netlist = netlist(SELF_LOOP);
        let path = netlist
            .any_path(&Waypoints::new("data_q", "data_q"))
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].kind, AstKind::SrcReg);
        assert_eq!(path[1].kind, AstKind::AssignDly);
        assert_eq!(path[2].kind, AstKind::DstReg);
        assert_eq!(path[0].name, "pipeline_no_loops.data_q");
        assert_eq!(netlist.vertex_type_str(path[0]), "[31:0] logic");
    }

    #[test]
    fn multi_match_policy() {
        let body = r#"
      <var name="i_clk" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="in" dtype_id="1" dir="input" loc="a,3,1,3,2"/>
      <var name="pipe.s1_data_q" dtype_id="1" loc="a,4,1,4,2"/>
      <var name="pipe.s2_data_q" dtype_id="1" loc="a,5,1,5,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <always loc="a,7,1,9,1">
          <assigndly dtype_id="1" loc="a,8,1,8,9">
            <varref name="in" dtype_id="1" loc="a,8,6,8,8"/>
            <varref name="s1_data_q" dtype_id="1" loc="a,8,1,8,2"/>
          </assigndly>
        </always>
        <always loc="a,10,1,12,1">
          <assigndly dtype_id="1" loc="a,11,1,11,9">
            <varref name="s1_data_q" dtype_id="1" loc="a,11,6,11,8"/>
            <varref name="s2_data_q" dtype_id="1" loc="a,11,1,11,2"/>
          </assigndly>
        </always>
      </scope></topscope>
    "#;
        let mut netlist = netlist(body);
        let err = netlist.get_reg_vertex("data_q", false).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("multiple vertices matching register pattern: data_q"));
        assert!(msg.contains("pipe.s1_data_q"));
        assert!(msg.contains("pipe.s2_data_q"));

        // match_any takes the first candidate instead.
        assert!(netlist.get_reg_vertex("data_q", true).unwrap().is_some());

        // Waypoint resolution follows the configured policy: first match
        // under the default, an error once match_any is switched off.
        assert!(netlist
            .path_exists(&Waypoints::new("in", "data_q"))
            .unwrap());
        let mut opts = *netlist.options();
        opts.match_any = false;
        netlist.set_options(opts);
        assert!(matches!(
            netlist.path_exists(&Waypoints::new("in", "data_q")),
            Err(Error::MultipleMatches(_))
        ));
    }

    #[test]
    fn register_alias_lookup() {
        let body = r#"
      <var name="i_clk" dtype_id="1" dir="input" loc="a,2,1,2,2"/>
      <var name="in" dtype_id="1" dir="input" loc="a,3,1,3,2"/>
      <var name="alias_top.q" dtype_id="1" loc="a,4,1,4,2"/>
      <var name="alias_top.shadow" dtype_id="1" loc="a,5,1,5,2"/>
      <topscope loc="a,1,1,1,1"><scope name="TOP" loc="a,1,1,1,1">
        <always loc="a,7,1,9,1">
          <assigndly dtype_id="1" loc="a,8,1,8,9">
            <varref name="in" dtype_id="1" loc="a,8,6,8,8"/>
            <varref name="q" dtype_id="1" loc="a,8,1,8,2"/>
          </assigndly>
        </always>
        <assignalias dtype_id="1" loc="a,10,1,10,9">
          <varref name="shadow" dtype_id="1" loc="a,10,6,10,8"/>
          <varref name="q" dtype_id="1" loc="a,10,1,10,2"/>
        </assignalias>
      </scope></topscope>
    "#;
        let netlist = netlist(body);
        assert!(netlist.reg_exists("alias_top.q").unwrap());
        // The shadow variable is not itself a register, but aliases one.
        assert!(netlist.get_reg_vertex("shadow", false).unwrap().is_none());
        assert!(netlist.reg_exists("shadow").unwrap());
    }

    #[test]
    fn named_vertices_sorted() {
        let netlist = netlist(ASSIGN_CHAIN);
        let vertices = netlist.named_vertices("*").unwrap();
        assert!(!vertices.is_empty());
        assert!(vertices.iter().all(|v| v.is_named()));
        for pair in vertices.windows(2) {
            assert!(pair[0].name <= pair[1].name);
        }
        // Logic vertices are unnamed and excluded.
        assert!(vertices.iter().all(|v| v.kind != AstKind::Assign));
    }

    #[test]
    fn exact_mode_requires_full_names() {
        let mut nl = netlist(ASSIGN_CHAIN);
        let mut opts = *nl.options();
        opts.match_mode = MatchMode::Exact;
        nl.set_options(opts);
        assert!(nl.get_mid_vertex("a", false).unwrap().is_none());
        assert!(nl
            .get_mid_vertex("basic_assign_chain.a", false)
            .unwrap()
            .is_some());
    }

    #[test]
    fn dtype_reporting() {
        let netlist = netlist(SELF_LOOP);
        assert_eq!(
            netlist
                .vertex_dtype_str("i_data", VertexRole::Any)
                .unwrap(),
            "[31:0] logic"
        );
        assert_eq!(
            netlist
                .vertex_dtype_width("i_data", VertexRole::Any)
                .unwrap(),
            32
        );
        assert_eq!(netlist.dtype_width("logic").unwrap(), 1);
        assert!(matches!(
            netlist.vertex_dtype_str("ghost", VertexRole::Any),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn dot_dump_lists_every_vertex() {
        let netlist = netlist(ASSIGN_CHAIN);
        let mut buf = Vec::new();
        netlist.graph().write_dot(&mut buf).unwrap();
        let dot = String::from_utf8(buf).unwrap();
        assert!(dot.contains("label=\"basic_assign_chain.a\""));
        assert!(dot.contains("type=\"ASSIGN\""));
    }
}
