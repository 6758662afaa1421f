// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Process-wide matching configuration.
//!
//! Name lookups behave according to an [`Options`] value: the match mode,
//! whether hierarchy markers are normalised away, and whether an ambiguous
//! pattern silently takes its first match. A netlist captures the global
//! options when it is constructed; the setters here are intended for
//! startup, before any netlist is loaded.

use std::sync::RwLock;

/// How a name pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole-name string equality.
    Exact,
    /// Regular expression, searched anywhere in the name.
    Regex,
    /// Shell glob (`?` one character, `*` any run), searched anywhere in
    /// the name.
    Wildcard,
}

/// Matching configuration read by the query entry points.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub match_mode: MatchMode,
    /// Treat `/`, `_` (and `.` in wildcard mode) as interchangeable, so the
    /// same signal can be addressed as `a/b/c`, `a.b.c` or `a_b_c`.
    pub ignore_hierarchy_markers: bool,
    /// Resolve an ambiguous pattern to its first match instead of raising.
    /// On by default: search-mode patterns routinely match a signal's
    /// aliases and register halves as well as the signal itself.
    pub match_any: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            match_mode: MatchMode::Wildcard,
            ignore_hierarchy_markers: true,
            match_any: true,
        }
    }
}

static GLOBAL: RwLock<Options> = RwLock::new(Options {
    match_mode: MatchMode::Wildcard,
    ignore_hierarchy_markers: true,
    match_any: true,
});

/// Snapshot of the process-wide options.
pub fn global() -> Options {
    *GLOBAL.read().unwrap()
}

pub fn set_match_mode(mode: MatchMode) {
    GLOBAL.write().unwrap().match_mode = mode;
}

pub fn set_ignore_hierarchy_markers(ignore: bool) {
    GLOBAL.write().unwrap().ignore_hierarchy_markers = ignore;
}

pub fn set_match_any(match_any: bool) {
    GLOBAL.write().unwrap().match_any = match_any;
}
