// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Reader for Verilator XML netlists.
//!
//! The XML is tokenized by quick-xml into a small element tree, then a
//! visitor walks the tree and drives the graph builder: the file table,
//! the type table (scanned twice to resolve forward dtype ID references)
//! and the single flattened TOP module with its scope and logic nesting.

use std::collections::HashMap;

use compact_str::CompactString;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::dtype::{DType, DTypeRegistry, Member};
use crate::error::Error;
use crate::graph::Graph;
use crate::vertex::{AstKind, Direction, Location, SourceFile, VertexId};

/// Parse a Verilator XML netlist into the graph, file table and type
/// registry. A non-flat netlist (more than one module, or interfaces) is
/// skipped with a warning, leaving the graph empty.
pub fn read_netlist(
    xml: &str,
    graph: &mut Graph,
    files: &mut Vec<SourceFile>,
    dtypes: &mut DTypeRegistry,
) -> Result<(), Error> {
    let tree = parse_tree(xml)?;
    let root = tree.child("verilator_xml").ok_or_else(|| {
        Error::Xml("unexpected root node, expected <verilator_xml>".to_string())
    })?;
    let mut reader = NetlistReader {
        graph,
        files,
        dtypes,
        file_ids: HashMap::new(),
        vars: HashMap::new(),
        top_name: None,
        scope_depth: 0,
        logic_stack: Vec::new(),
        is_lvalue: false,
        is_delayed: false,
    };
    reader.read_root(root)
}

//===--------------------------------------------------------------------===//
// Element tree.
//===--------------------------------------------------------------------===//

#[derive(Debug, Default)]
struct XmlElem {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlElem>,
}

impl XmlElem {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require_attr(&self, key: &str) -> Result<&str, Error> {
        self.attr(key)
            .ok_or_else(|| Error::Xml(format!("<{}> missing {} attribute", self.name, key)))
    }

    fn child(&self, name: &str) -> Option<&XmlElem> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn element_from(start: &BytesStart) -> Result<XmlElem, Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr
            .map_err(|e| Error::Xml(format!("malformed attribute in <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("malformed attribute in <{}>: {}", name, e)))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(XmlElem {
        name,
        attrs,
        children: Vec::new(),
    })
}

/// Buffer the whole document into an element tree. Returns a synthetic
/// parent whose children are the document's top-level elements.
fn parse_tree(xml: &str) -> Result<XmlElem, Error> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlElem::default()];
    loop {
        match reader
            .read_event()
            .map_err(|e| Error::Xml(format!("malformed XML: {}", e)))?
        {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let elem = element_from(&start)?;
                stack.last_mut().unwrap().children.push(elem);
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(Error::Xml("unbalanced XML element".to_string()));
                }
                let elem = stack.pop().unwrap();
                stack.last_mut().unwrap().children.push(elem);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if stack.len() != 1 {
        return Err(Error::Xml("unbalanced XML element".to_string()));
    }
    Ok(stack.pop().unwrap())
}

/// Parse a constant value: decimal, or hex with a `'h`/`'sh` prefix (any
/// width before the `'` is ignored).
fn parse_const_value(value: &str) -> Result<u64, Error> {
    let bad = |_| Error::Xml(format!("malformed constant value: {}", value));
    if let Some(pos) = value.rfind("'sh") {
        return u64::from_str_radix(&value[pos + 3..], 16).map_err(bad);
    }
    if let Some(pos) = value.rfind("'h") {
        return u64::from_str_radix(&value[pos + 2..], 16).map_err(bad);
    }
    if value.contains('\'') {
        return Err(Error::Xml(format!(
            "unexpected constant type prefix: {}",
            value
        )));
    }
    value.parse::<u64>().map_err(bad)
}

//===--------------------------------------------------------------------===//
// Visitor.
//===--------------------------------------------------------------------===//

struct NetlistReader<'a> {
    graph: &'a mut Graph,
    files: &'a mut Vec<SourceFile>,
    dtypes: &'a mut DTypeRegistry,
    /// XML file ID to file table index.
    file_ids: HashMap<String, usize>,
    /// Canonical variable name to vertex.
    vars: HashMap<CompactString, VertexId>,
    /// Discovered from dotted name prefixes of module-level variables.
    top_name: Option<String>,
    scope_depth: usize,
    logic_stack: Vec<VertexId>,
    is_lvalue: bool,
    is_delayed: bool,
}

impl NetlistReader<'_> {
    fn read_root(&mut self, root: &XmlElem) -> Result<(), Error> {
        if let Some(files_node) = root.child("files") {
            for file in files_node.children.iter().filter(|c| c.name == "file") {
                let id = file.require_attr("id")?.to_string();
                let filename = file.require_attr("filename")?.to_string();
                let language = file.attr("language").unwrap_or("").to_string();
                self.file_ids.insert(id, self.files.len());
                self.files.push(SourceFile { filename, language });
            }
        }
        let netlist = root
            .child("netlist")
            .ok_or_else(|| Error::Xml("missing <netlist> section".to_string()))?;

        let module_count = netlist.children.iter().filter(|c| c.name == "module").count();
        let iface_count = netlist.children.iter().filter(|c| c.name == "iface").count();
        clilog::info!(
            "{} modules, {} interfaces in netlist",
            module_count,
            iface_count
        );

        // Two passes over the type table to resolve forward ID references.
        if let Some(typetable) = netlist.child("typetable") {
            self.visit_children(typetable)?;
            self.visit_children(typetable)?;
            clilog::info!("type table contains {} entries", self.dtypes.len());
        }

        if module_count == 1 && iface_count == 0 {
            let module = netlist.child("module").unwrap();
            let name = module.require_attr("name")?;
            if name != "TOP" {
                return Err(Error::Xml(format!("unexpected top module name: {}", name)));
            }
            self.visit_children(module)?;
            clilog::info!(
                "netlist contains {} vertices and {} edges",
                self.graph.num_vertices(),
                self.graph.num_edges()
            );
        } else {
            clilog::warn!("netlist is not flat, skipping modules");
        }
        Ok(())
    }

    fn visit_children(&mut self, node: &XmlElem) -> Result<(), Error> {
        for child in &node.children {
            self.dispatch(child)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, node: &XmlElem) -> Result<(), Error> {
        match node.name.as_str() {
            "always" | "alwayspublic" => self.statement(node, AstKind::Always),
            "assign" | "contassign" => self.statement(node, AstKind::Assign),
            "assignalias" => self.statement(node, AstKind::AssignAlias),
            "assigndly" => {
                self.is_delayed = true;
                let result = self.statement(node, AstKind::AssignDly);
                self.is_delayed = false;
                result
            }
            "assignw" => self.statement(node, AstKind::AssignW),
            "cfunc" => self.statement(node, AstKind::CFunc),
            "initial" => self.statement(node, AstKind::Initial),
            "instance" => self.statement(node, AstKind::Instance),
            "sengate" => self.statement(node, AstKind::SenGate),
            // A senitem inside a logic block contributes its references to
            // that block; a free-standing one opens its own vertex.
            "senitem" => {
                if self.logic_stack.is_empty() {
                    self.statement(node, AstKind::SenItem)
                } else {
                    self.visit_children(node)
                }
            }
            "scope" | "topscope" => self.scope(node),
            "var" => self.var(node).map(|_| ()),
            "varscope" => self.var_scope(node),
            "varref" => self.var_ref(node),
            "basicdtype" => self.basic_dtype(node),
            "refdtype" => self.ref_dtype(node),
            "packarraydtype" => self.array_dtype(node, true),
            "unpackarraydtype" => self.array_dtype(node, false),
            "structdtype" => self.aggregate_dtype(node, true),
            "uniondtype" => self.aggregate_dtype(node, false),
            "enumdtype" => self.enum_dtype(node),
            // Interfaces are not supported in flat netlists.
            "ifacerefdtype" => Ok(()),
            // Everything else is traversed transparently.
            _ => self.visit_children(node),
        }
    }

    //===----------------------------------------------------------------===//
    // Names and locations.
    //===----------------------------------------------------------------===//

    fn parse_loc(&self, loc: &str) -> Result<Location, Error> {
        let tokens: Vec<&str> = loc.split(',').collect();
        if tokens.len() != 5 {
            return Err(Error::Xml(format!("malformed location string: {}", loc)));
        }
        let field = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| Error::Xml(format!("malformed location string: {}", loc)))
        };
        Ok(Location {
            file: self
                .file_ids
                .get(tokens[0])
                .copied()
                .unwrap_or(usize::MAX),
            start_line: field(tokens[1])?,
            start_col: field(tokens[2])?,
            end_line: field(tokens[3])?,
            end_col: field(tokens[4])?,
        })
    }

    /// Canonicalise a name by prepending `<top>.` when it is not already
    /// prefixed, so declarations and references agree.
    fn add_top_prefix(&self, name: &str) -> String {
        match &self.top_name {
            Some(top) if !name.starts_with(top.as_str()) => format!("{}.{}", top, name),
            _ => name.to_string(),
        }
    }

    fn lookup_var(&self, name: &str) -> Option<VertexId> {
        if let Some(&vertex) = self.vars.get(name) {
            return Some(vertex);
        }
        self.vars.get(self.add_top_prefix(name).as_str()).copied()
    }

    //===----------------------------------------------------------------===//
    // Scopes, statements and references.
    //===----------------------------------------------------------------===//

    fn scope(&mut self, node: &XmlElem) -> Result<(), Error> {
        self.scope_depth += 1;
        let result = self.visit_children(node);
        self.scope_depth -= 1;
        result
    }

    fn statement(&mut self, node: &XmlElem, kind: AstKind) -> Result<(), Error> {
        // A statement must be inside a scope for its references to bind.
        if self.scope_depth == 0 {
            return Ok(());
        }
        let loc = self.parse_loc(node.require_attr("loc")?)?;
        let vertex = self.graph.add_logic_vertex(kind, loc);
        if let Some(&parent) = self.logic_stack.last() {
            self.graph.add_edge(parent, vertex);
        }
        self.logic_stack.push(vertex);
        let result = self.statement_children(node, kind);
        self.logic_stack.pop();
        result
    }

    fn statement_children(&mut self, node: &XmlElem, kind: AstKind) -> Result<(), Error> {
        let assign_like = matches!(
            kind,
            AstKind::Assign | AstKind::AssignAlias | AstKind::AssignDly | AstKind::AssignW
        );
        if assign_like {
            // The first child is the R-value, the last the L-value.
            if node.children.len() != 2 {
                return Err(Error::Xml(format!(
                    "<{}> has {} children, expected 2",
                    node.name,
                    node.children.len()
                )));
            }
            self.dispatch(&node.children[0])?;
            self.is_lvalue = true;
            let result = self.dispatch(&node.children[1]);
            self.is_lvalue = false;
            result
        } else {
            self.visit_children(node)
        }
    }

    fn var_ref(&mut self, node: &XmlElem) -> Result<(), Error> {
        if self.scope_depth == 0 {
            return Ok(());
        }
        let name = node.require_attr("name")?;
        let Some(&logic) = self.logic_stack.last() else {
            return Err(Error::Xml(format!("var {} not under a logic block", name)));
        };
        let var = self
            .lookup_var(name)
            .ok_or_else(|| Error::Xml(format!("var {} does not have a VAR_SCOPE", name)))?;
        if self.is_lvalue {
            self.graph.add_edge(logic, var);
            if self.is_delayed {
                // The target of a delayed assignment is a register.
                self.graph.mark_dst_reg(var);
            }
        } else {
            self.graph.add_edge(var, logic);
        }
        self.visit_children(node)
    }

    //===----------------------------------------------------------------===//
    // Variable declarations.
    //===----------------------------------------------------------------===//

    fn var(&mut self, node: &XmlElem) -> Result<VertexId, Error> {
        let name = node.require_attr("name")?;
        let loc = self.parse_loc(node.require_attr("loc")?)?;
        let dtype = node
            .attr("dtype_id")
            .and_then(|id| self.dtypes.lookup_xml_id(id));
        let dir = match node.attr("dir") {
            None => Direction::None,
            Some("input") => Direction::Input,
            Some("output") => Direction::Output,
            Some("inout") => Direction::Inout,
            Some(other) => {
                return Err(Error::Xml(format!("unknown direction: {}", other)));
            }
        };
        let mut is_param = false;
        let mut param_value = None;
        if node.attr("param").is_some() {
            let constant = node
                .children
                .first()
                .filter(|c| c.name == "const")
                .ok_or_else(|| Error::Xml(format!("expected const node under param {}", name)))?;
            is_param = true;
            param_value = Some(CompactString::from(constant.require_attr("name")?));
        }
        let is_public = node.attr("public").is_some();

        // Discover the top module name from the dotted prefixes of
        // module-level variable names; the XML does not state it directly.
        if self.scope_depth == 0 && !name.starts_with("__V") {
            if let Some(pos) = name.find('.') {
                let prefix = &name[..pos];
                match &self.top_name {
                    None => {
                        clilog::debug!("got top name {}", prefix);
                        self.top_name = Some(prefix.to_string());
                    }
                    Some(top) if top != prefix => {
                        return Err(Error::Xml(format!(
                            "name prefix of {} does not match top name {}",
                            name, top
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        let canonical = CompactString::from(self.add_top_prefix(name));
        let vertex = self.graph.add_var_vertex(
            canonical.clone(),
            dir,
            loc,
            dtype,
            is_param,
            param_value,
            is_public,
        );
        self.vars.entry(canonical).or_insert(vertex);

        // Restore the port connectivity the flattening destroyed: connect a
        // public port variable with its prefixed internal copy, both ways,
        // and copy the direction so both are identified as ports.
        if let Some(orig_name) = node.attr("origName") {
            if let Some(&public_vertex) = self.vars.get(orig_name) {
                if public_vertex != vertex
                    && self.graph.vertex(public_vertex).is_port()
                    && !is_param
                {
                    self.graph.add_edge(public_vertex, vertex);
                    self.graph.add_edge(vertex, public_vertex);
                    let dir = self.graph.vertex(public_vertex).dir;
                    self.graph.set_vertex_direction(vertex, dir);
                }
            }
        }
        Ok(vertex)
    }

    /// Verilator introduces some variables only as `varscope` nodes during
    /// its transformations; create them on first sight.
    fn var_scope(&mut self, node: &XmlElem) -> Result<(), Error> {
        let name = node.require_attr("name")?;
        if self.lookup_var(name).is_none() {
            self.var(node)?;
        }
        Ok(())
    }

    //===----------------------------------------------------------------===//
    // Type table.
    //===----------------------------------------------------------------===//

    fn visit_const(&self, node: &XmlElem) -> Result<u64, Error> {
        parse_const_value(node.require_attr("name")?)
    }

    /// A range has two const children; the first is the end (left) bound,
    /// the last the start (right) bound.
    fn visit_range(&self, node: &XmlElem) -> Result<(u64, u64), Error> {
        if node.children.len() != 2 {
            return Err(Error::Xml(format!(
                "<{}> range expects two const children",
                node.name
            )));
        }
        let end = self.visit_const(&node.children[0])?;
        let start = self.visit_const(&node.children[1])?;
        Ok((start, end))
    }

    fn basic_dtype(&mut self, node: &XmlElem) -> Result<(), Error> {
        let id = node.require_attr("id")?;
        if self.dtypes.contains_xml_id(id) {
            return Ok(());
        }
        let name = CompactString::from(node.require_attr("name")?);
        let range = match (node.attr("left"), node.attr("right")) {
            (Some(left), Some(right)) => {
                let bound = |s: &str| {
                    s.parse::<u64>()
                        .map_err(|_| Error::Xml(format!("malformed range bound: {}", s)))
                };
                Some((bound(left)?, bound(right)?))
            }
            _ => None,
        };
        self.dtypes.insert(id, DType::Basic { name, range });
        Ok(())
    }

    fn ref_dtype(&mut self, node: &XmlElem) -> Result<(), Error> {
        let id = node.require_attr("id")?;
        if !self.dtypes.contains_xml_id(id) {
            let name = CompactString::from(node.require_attr("name")?);
            self.dtypes.insert(id, DType::Ref { name, subtype: None });
        } else {
            // Second pass: the sub dtype declaration can occur after.
            let sub_id = node.require_attr("sub_dtype_id")?;
            let sub = self.dtypes.lookup_xml_id(sub_id).ok_or_else(|| {
                Error::Xml(format!("could not find ref sub dtype ID {}", sub_id))
            })?;
            let this = self.dtypes.lookup_xml_id(id).unwrap();
            self.dtypes.resolve_subtype(this, sub);
        }
        Ok(())
    }

    fn array_dtype(&mut self, node: &XmlElem, packed: bool) -> Result<(), Error> {
        let id = node.require_attr("id")?;
        if !self.dtypes.contains_xml_id(id) {
            if node.children.len() != 1 {
                return Err(Error::Xml(format!(
                    "<{}> expects one range child",
                    node.name
                )));
            }
            let (start, end) = self.visit_range(&node.children[0])?;
            self.dtypes.insert(
                id,
                DType::Array {
                    subtype: None,
                    start,
                    end,
                    packed,
                },
            );
        } else {
            let sub_id = node.require_attr("sub_dtype_id")?;
            let sub = self.dtypes.lookup_xml_id(sub_id).ok_or_else(|| {
                Error::Xml(format!("could not find array sub dtype ID {}", sub_id))
            })?;
            let this = self.dtypes.lookup_xml_id(id).unwrap();
            self.dtypes.resolve_subtype(this, sub);
        }
        Ok(())
    }

    fn aggregate_dtype(&mut self, node: &XmlElem, is_struct: bool) -> Result<(), Error> {
        let id = node.require_attr("id")?;
        if !self.dtypes.contains_xml_id(id) {
            // A struct or union defined inline with a declaration may be
            // unnamed.
            let name = node.attr("name").map(CompactString::from);
            let dtype = if is_struct {
                DType::Struct {
                    name,
                    members: Vec::new(),
                }
            } else {
                DType::Union {
                    name,
                    members: Vec::new(),
                }
            };
            self.dtypes.insert(id, dtype);
        } else {
            // Second pass: resolve the member dtypes.
            let this = self.dtypes.lookup_xml_id(id).unwrap();
            for child in &node.children {
                if child.name != "memberdtype" {
                    return Err(Error::Xml(format!(
                        "<{}> expects memberdtype children, found <{}>",
                        node.name, child.name
                    )));
                }
                let member_name = CompactString::from(child.require_attr("name")?);
                let sub_id = child.require_attr("sub_dtype_id")?;
                let sub = self.dtypes.lookup_xml_id(sub_id).ok_or_else(|| {
                    Error::Xml(format!("could not find member sub dtype ID {}", sub_id))
                })?;
                self.dtypes.push_member(
                    this,
                    Member {
                        name: member_name,
                        dtype: sub,
                    },
                );
            }
        }
        Ok(())
    }

    fn enum_dtype(&mut self, node: &XmlElem) -> Result<(), Error> {
        let id = node.require_attr("id")?;
        if !self.dtypes.contains_xml_id(id) {
            let name = CompactString::from(node.require_attr("name")?);
            let mut items = Vec::new();
            for child in &node.children {
                if child.name != "enumitem" {
                    return Err(Error::Xml(format!(
                        "<enumdtype> expects enumitem children, found <{}>",
                        child.name
                    )));
                }
                let item_name = CompactString::from(child.require_attr("name")?);
                let value_node = child.children.first().ok_or_else(|| {
                    Error::Xml(format!("enumitem {} missing const value", item_name))
                })?;
                items.push((item_name, self.visit_const(value_node)?));
            }
            self.dtypes.insert(
                id,
                DType::Enum {
                    name,
                    subtype: None,
                    items,
                },
            );
        } else {
            let sub_id = node.require_attr("sub_dtype_id")?;
            let sub = self.dtypes.lookup_xml_id(sub_id).ok_or_else(|| {
                Error::Xml(format!("could not find enum sub dtype ID {}", sub_id))
            })?;
            let this = self.dtypes.lookup_xml_id(id).unwrap();
            self.dtypes.resolve_subtype(this, sub);
        }
        Ok(())
    }
}
