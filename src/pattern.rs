// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Name patterns: exact, regex and wildcard matching.

use regex::Regex;

use crate::error::Error;
use crate::options::{MatchMode, Options};

/// A compiled name pattern.
///
/// Regex and wildcard patterns use search semantics: they may match anywhere
/// inside a vertex name, so `data_q` finds `top.stage.data_q`. Exact
/// patterns compare the whole name.
#[derive(Debug)]
pub enum NamePattern {
    Exact(String),
    Search(Regex),
}

impl NamePattern {
    /// Compile a user-supplied pattern under the given options.
    pub fn compile(pattern: &str, options: &Options) -> Result<NamePattern, Error> {
        match options.match_mode {
            MatchMode::Exact => Ok(NamePattern::Exact(pattern.to_string())),
            MatchMode::Regex => {
                let mut src = pattern.to_string();
                if options.ignore_hierarchy_markers {
                    // '/' for hierarchical refs, '_' for flattened names.
                    src = src.replace(['/', '_'], ".");
                }
                let regex = Regex::new(&src).map_err(|e| {
                    Error::Pattern(format!("malformed regular expression: {}", e))
                })?;
                Ok(NamePattern::Search(regex))
            }
            MatchMode::Wildcard => {
                let mut src = pattern.to_string();
                if options.ignore_hierarchy_markers {
                    src = src.replace(['/', '_', '.'], "?");
                }
                let regex = Regex::new(&wildcard_to_regex(&src)).map_err(|e| {
                    Error::Pattern(format!("malformed wildcard pattern: {}", e))
                })?;
                Ok(NamePattern::Search(regex))
            }
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(pattern) => name == pattern,
            NamePattern::Search(regex) => regex.is_match(name),
        }
    }
}

/// Translate a shell glob into a regular expression. `?` matches exactly one
/// character and `*` any run of characters; everything else is literal.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    for ch in pattern.chars() {
        match ch {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            ch => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out
}
