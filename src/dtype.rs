// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Hardware data types and the forward-reference-safe type registry.
//!
//! The Verilator type table declares types by string ID and may reference
//! other types before they are declared. The registry supports the
//! two-pass scheme used by the reader: pass one registers shells (aggregate
//! members and subtype links missing), pass two resolves the deferred
//! references. After pass two the table is never mutated.

use compact_str::CompactString;
use indexmap::IndexMap;

/// Handle into the [`DTypeRegistry`].
pub type DTypeId = usize;

/// A named member of a struct or union.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: CompactString,
    pub dtype: DTypeId,
}

/// A hardware data type.
///
/// Subtype links are `None` while the type is a pass-one shell and are
/// filled in during pass two.
#[derive(Debug, Clone)]
pub enum DType {
    Basic {
        name: CompactString,
        /// Packed range `[left:right]`, absent for scalar types.
        range: Option<(u64, u64)>,
    },
    Ref {
        name: CompactString,
        subtype: Option<DTypeId>,
    },
    Array {
        subtype: Option<DTypeId>,
        start: u64,
        end: u64,
        packed: bool,
    },
    Struct {
        name: Option<CompactString>,
        members: Vec<Member>,
    },
    Union {
        name: Option<CompactString>,
        members: Vec<Member>,
    },
    Enum {
        name: CompactString,
        subtype: Option<DTypeId>,
        items: Vec<(CompactString, u64)>,
    },
}

impl DType {
    /// The declared name, if the type has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            DType::Basic { name, .. } | DType::Ref { name, .. } | DType::Enum { name, .. } => {
                Some(name.as_str())
            }
            DType::Struct { name, .. } | DType::Union { name, .. } => {
                name.as_ref().map(|n| n.as_str())
            }
            DType::Array { .. } => None,
        }
    }
}

/// Table of all data types in a netlist, addressable by XML string ID.
#[derive(Debug, Default)]
pub struct DTypeRegistry {
    dtypes: Vec<DType>,
    by_xml_id: IndexMap<CompactString, DTypeId>,
}

impl DTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dtypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dtypes.is_empty()
    }

    pub fn get(&self, id: DTypeId) -> &DType {
        &self.dtypes[id]
    }

    /// Register a pass-one shell under its XML ID.
    pub fn insert(&mut self, xml_id: &str, dtype: DType) -> DTypeId {
        let id = self.dtypes.len();
        self.dtypes.push(dtype);
        self.by_xml_id.insert(CompactString::from(xml_id), id);
        id
    }

    pub fn contains_xml_id(&self, xml_id: &str) -> bool {
        self.by_xml_id.contains_key(xml_id)
    }

    pub fn lookup_xml_id(&self, xml_id: &str) -> Option<DTypeId> {
        self.by_xml_id.get(xml_id).copied()
    }

    /// Pass-two resolution of a deferred subtype link (Ref, Array, Enum).
    pub fn resolve_subtype(&mut self, id: DTypeId, sub: DTypeId) {
        match &mut self.dtypes[id] {
            DType::Ref { subtype, .. }
            | DType::Array { subtype, .. }
            | DType::Enum { subtype, .. } => *subtype = Some(sub),
            _ => {}
        }
    }

    /// Pass-two member registration for structs and unions.
    pub fn push_member(&mut self, id: DTypeId, member: Member) {
        match &mut self.dtypes[id] {
            DType::Struct { members, .. } | DType::Union { members, .. } => members.push(member),
            _ => {}
        }
    }

    /// Find a type by declared name.
    pub fn find_by_name(&self, name: &str) -> Option<DTypeId> {
        self.dtypes.iter().position(|d| d.name() == Some(name))
    }

    /// Bit width of a type. An unresolved subtype link contributes zero.
    pub fn width(&self, id: DTypeId) -> u64 {
        match self.get(id) {
            DType::Basic { range, .. } => match range {
                Some((left, right)) => left.abs_diff(*right) + 1,
                None => 1,
            },
            DType::Ref { subtype, .. } | DType::Enum { subtype, .. } => {
                subtype.map(|s| self.width(s)).unwrap_or(0)
            }
            DType::Array {
                subtype, start, end, ..
            } => {
                let elements = end.abs_diff(*start) + 1;
                elements * subtype.map(|s| self.width(s)).unwrap_or(0)
            }
            DType::Struct { members, .. } => members.iter().map(|m| self.width(m.dtype)).sum(),
            DType::Union { members, .. } => members
                .iter()
                .map(|m| self.width(m.dtype))
                .max()
                .unwrap_or(0),
        }
    }

    /// Verilator-style rendering for path reports: packed ranges prefix the
    /// type name, unpacked ranges follow it, eg `[31:0] logic [8:0]`.
    pub fn type_str(&self, id: DTypeId) -> String {
        match self.get(id) {
            DType::Basic { name, range } => match range {
                Some((left, right)) => format!("[{}:{}] {}", left, right, name),
                None => name.to_string(),
            },
            DType::Ref { name, subtype } => match subtype {
                Some(sub) => self.type_str(*sub),
                None => name.to_string(),
            },
            DType::Array {
                subtype,
                start,
                end,
                packed,
            } => {
                let sub = subtype.map(|s| self.type_str(s)).unwrap_or_default();
                if *packed {
                    format!("[{}:{}] {}", end, start, sub)
                } else {
                    format!("{} [{}:{}]", sub, end, start)
                }
            }
            DType::Struct { name, .. } => match name {
                Some(name) => format!("struct {}", name),
                None => "struct".to_string(),
            },
            DType::Union { name, .. } => match name {
                Some(name) => format!("union {}", name),
                None => "union".to_string(),
            },
            DType::Enum { name, .. } => format!("enum {}", name),
        }
    }
}
