// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Netlist graph vertices: variables, logic statements and split registers.

use compact_str::CompactString;

use crate::dtype::DTypeId;

/// Index of a vertex in the graph arena.
pub type VertexId = usize;

/// A source file referenced by vertex locations.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub language: String,
}

/// Source location of a declaration or statement.
///
/// `file` indexes the netlist file table; `usize::MAX` when unknown.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub file: usize,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            file: usize::MAX,
            start_line: 0,
            start_col: 0,
            end_line: 0,
            end_col: 0,
        }
    }
}

/// The AST kind of a vertex.
///
/// `SrcReg` and `DstReg` are derived kinds produced by the register split:
/// a register becomes a source vertex carrying its fan-out and a
/// destination vertex carrying its fan-in, so that every remaining path in
/// the graph is combinational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
    Var,
    SrcReg,
    DstReg,
    Assign,
    AssignAlias,
    AssignDly,
    AssignW,
    Always,
    Initial,
    Instance,
    SenItem,
    SenGate,
    CFunc,
    /// Tombstone for removed vertices; skipped by traversals and lookups.
    Deleted,
}

impl AstKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AstKind::Var => "VAR",
            AstKind::SrcReg => "SRC_REG",
            AstKind::DstReg => "DST_REG",
            AstKind::Assign => "ASSIGN",
            AstKind::AssignAlias => "ASSIGN_ALIAS",
            AstKind::AssignDly => "ASSIGN_DLY",
            AstKind::AssignW => "ASSIGN_W",
            AstKind::Always => "ALWAYS",
            AstKind::Initial => "INITIAL",
            AstKind::Instance => "INSTANCE",
            AstKind::SenItem => "SEN_ITEM",
            AstKind::SenGate => "SEN_GATE",
            AstKind::CFunc => "C_FUNC",
            AstKind::Deleted => "DELETED",
        }
    }

    pub fn is_logic(&self) -> bool {
        matches!(
            self,
            AstKind::Assign
                | AstKind::AssignAlias
                | AstKind::AssignDly
                | AstKind::AssignW
                | AstKind::Always
                | AstKind::Initial
                | AstKind::Instance
                | AstKind::SenItem
                | AstKind::SenGate
                | AstKind::CFunc
        )
    }
}

/// Port direction of a variable vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Input,
    Output,
    Inout,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "NONE",
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
            Direction::Inout => "INOUT",
        }
    }
}

/// Role filter applied by name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexRole {
    Any,
    StartPoint,
    EndPoint,
    MidPoint,
    Reg,
    RegAlias,
    Named,
}

/// A node in the netlist graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub kind: AstKind,
    /// Canonical hierarchical name; empty for pure logic vertices.
    pub name: CompactString,
    pub dir: Direction,
    pub dtype: Option<DTypeId>,
    pub loc: Location,
    pub is_param: bool,
    pub param_value: Option<CompactString>,
    pub is_public: bool,
    /// True for signals in the top scope (no hierarchy separator).
    pub is_top: bool,
    /// Set on variables that alias a register through an `AssignAlias`.
    pub is_alias_of_reg: bool,
}

impl Vertex {
    pub fn new_logic(kind: AstKind, loc: Location) -> Self {
        Vertex {
            kind,
            name: CompactString::default(),
            dir: Direction::None,
            dtype: None,
            loc,
            is_param: false,
            param_value: None,
            is_public: false,
            is_top: false,
            is_alias_of_reg: false,
        }
    }

    pub fn is_logic(&self) -> bool {
        self.kind.is_logic()
    }

    pub fn is_deleted(&self) -> bool {
        self.kind == AstKind::Deleted
    }

    pub fn is_src_reg(&self) -> bool {
        self.kind == AstKind::SrcReg
    }

    pub fn is_dst_reg(&self) -> bool {
        self.kind == AstKind::DstReg
    }

    pub fn is_reg(&self) -> bool {
        self.is_src_reg() || self.is_dst_reg()
    }

    pub fn is_port(&self) -> bool {
        self.dir != Direction::None
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty() && !self.is_deleted()
    }

    /// A path may start here: a top-level input port or a source register.
    pub fn is_start_point(&self) -> bool {
        (self.is_top && matches!(self.dir, Direction::Input | Direction::Inout))
            || self.is_src_reg()
    }

    /// A path may end here: a top-level output port or a destination
    /// register.
    pub fn is_end_point(&self) -> bool {
        (self.is_top && matches!(self.dir, Direction::Output | Direction::Inout))
            || self.is_dst_reg()
    }

    /// A path may be routed through or avoid here: any named variable,
    /// including ports and registers.
    pub fn is_mid_point(&self) -> bool {
        matches!(self.kind, AstKind::Var | AstKind::SrcReg | AstKind::DstReg) && !self.name.is_empty()
    }

    /// Role filter used by lookups. `Reg` deliberately matches only the
    /// destination half of a split register, so a register name resolves to
    /// a single vertex.
    pub fn matches_role(&self, role: VertexRole) -> bool {
        if self.is_deleted() {
            return false;
        }
        match role {
            VertexRole::Any => true,
            VertexRole::StartPoint => self.is_start_point(),
            VertexRole::EndPoint => self.is_end_point(),
            VertexRole::MidPoint => self.is_mid_point(),
            VertexRole::Reg => self.is_dst_reg(),
            VertexRole::RegAlias => self.is_alias_of_reg,
            VertexRole::Named => self.is_named(),
        }
    }
}
