// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! CLI for querying combinational paths in a Verilator XML netlist.

use std::path::PathBuf;

use clap::Parser;

use netpath::error::Error;
use netpath::netlist::{Netlist, Waypoints};
use netpath::options::{self, MatchMode};
use netpath::vertex::Vertex;

#[derive(Parser)]
#[command(name = "netpath", about = "netpath — combinational path queries over Verilator XML netlists")]
struct Cli {
    /// Netlist XML file produced by Verilator's --xml-only output.
    netlist_xml: PathBuf,

    /// Start point of a path query.
    #[clap(long)]
    from: Option<String>,

    /// End point of a path query.
    #[clap(long)]
    to: Option<String>,

    /// Points the path must pass through, in order.
    #[clap(long)]
    through: Vec<String>,

    /// Points the path must not pass through.
    #[clap(long)]
    avoid: Vec<String>,

    /// Enumerate all paths instead of reporting a single one.
    ///
    /// The number of simple paths can grow exponentially with design size;
    /// use with through/avoid points to constrain the search.
    #[clap(long)]
    all_paths: bool,

    /// Report all paths fanning out from a start point.
    #[clap(long)]
    fan_out: Option<String>,

    /// Report all paths fanning into an end point.
    #[clap(long)]
    fan_in: Option<String>,

    /// List named vertices matching a pattern ("*" for everything).
    #[clap(long)]
    dump_names: Option<String>,

    /// Write the netlist graph in Graphviz dot format.
    #[clap(long)]
    dump_dot: Option<PathBuf>,

    /// Interpret name patterns as regular expressions.
    #[clap(long, conflicts_with = "exact")]
    regex: bool,

    /// Match names exactly (default is shell-style wildcards).
    #[clap(long)]
    exact: bool,

    /// Keep `.`, `/` and `_` distinct in patterns instead of treating them
    /// as interchangeable hierarchy markers.
    #[clap(long)]
    keep_hierarchy_markers: bool,

    /// Resolve an ambiguous pattern to its first match instead of failing.
    #[clap(long)]
    match_any: bool,
}

fn print_path(netlist: &Netlist, path: &[&Vertex]) {
    for vertex in path {
        if vertex.is_logic() {
            println!("  {}", vertex.kind.as_str());
        } else {
            println!(
                "  {} {} {} {}",
                vertex.name,
                vertex.kind.as_str(),
                netlist.vertex_type_str(vertex),
                netlist.location_str(vertex)
            );
        }
    }
}

fn print_paths(netlist: &Netlist, paths: &[Vec<&Vertex>]) {
    for (i, path) in paths.iter().enumerate() {
        println!("path {}:", i);
        print_path(netlist, path);
    }
    println!("{} paths", paths.len());
}

fn run(args: &Cli) -> Result<(), Error> {
    if args.regex {
        options::set_match_mode(MatchMode::Regex);
    } else if args.exact {
        options::set_match_mode(MatchMode::Exact);
    }
    options::set_ignore_hierarchy_markers(!args.keep_hierarchy_markers);
    options::set_match_any(args.match_any);

    let netlist = Netlist::from_file(&args.netlist_xml)?;
    if netlist.is_empty() {
        clilog::warn!("netlist is empty, nothing to query");
        return Ok(());
    }

    if let Some(pattern) = &args.dump_names {
        for vertex in netlist.named_vertices(pattern)? {
            println!(
                "{} {} {} {} {}",
                vertex.name,
                vertex.kind.as_str(),
                vertex.dir.as_str(),
                netlist.vertex_type_str(vertex),
                netlist.location_str(vertex)
            );
        }
    }

    if let Some(path) = &args.dump_dot {
        netlist.dump_dot_file(path)?;
    }

    if let Some(start) = &args.fan_out {
        print_paths(&netlist, &netlist.all_fan_out(start)?);
    }

    if let Some(end) = &args.fan_in {
        print_paths(&netlist, &netlist.all_fan_in(end)?);
    }

    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        let mut waypoints = Waypoints::new(from.clone(), to.clone());
        for name in &args.through {
            waypoints.add_through_point(name.clone());
        }
        for name in &args.avoid {
            waypoints.add_avoid_point(name.clone());
        }
        if args.all_paths {
            print_paths(&netlist, &netlist.all_paths(&waypoints)?);
        } else {
            let path = netlist.any_path(&waypoints)?;
            if path.is_empty() {
                println!("no path found");
            } else {
                print_path(&netlist, &path);
            }
        }
    } else if args.from.is_some() || args.to.is_some() {
        return Err(Error::NotFound(
            "a path query needs both --from and --to".to_string(),
        ));
    }

    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = Cli::parse();
    if let Err(e) = run(&args) {
        clilog::error!("{}", e);
        std::process::exit(1);
    }
}
