// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Error type shared by ingestion and query operations.

/// Failure kinds surfaced by the netlist reader and the query facade.
///
/// Every variant carries a human-readable message; callers are expected to
/// report it rather than dispatch on the payload.
#[derive(Debug)]
pub enum Error {
    /// File could not be read or written.
    Io(String),
    /// Malformed XML input or a schema violation in the netlist AST.
    Xml(String),
    /// A name pattern failed to compile.
    Pattern(String),
    /// A lookup expecting a single vertex matched several.
    MultipleMatches(String),
    /// A waypoint or name pattern resolved to no vertex.
    NotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::Xml(msg) => write!(f, "XML error: {}", msg),
            Error::Pattern(msg) => write!(f, "pattern error: {}", msg),
            Error::MultipleMatches(msg) => write!(f, "{}", msg),
            Error::NotFound(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
