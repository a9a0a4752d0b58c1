// NetDesign: Multi-Layer Network Design Model
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use netdesign::candidate_paths::{CandidatePathOptions, DisjointType};
use netdesign::example_networks::{ExampleNetwork, IpOverWdmNet};
use netdesign::model::{printer, LinkId, NetworkModel, NodeId, PathElement, RoutingType};

use clap::Parser;
use itertools::Itertools;
use log::*;
use std::collections::BTreeSet;
use std::error::Error;

mod network_selection;
use network_selection::*;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    // match on the action
    match args.cmd {
        MainCommand::Candidates { network, k, max_length_km, protection } => {
            candidates(network, k, max_length_km, protection)?
        }
        MainCommand::Failure { network, mttf_hours, mttr_hours } => {
            failure_analysis(network, mttf_hours, mttr_hours)?
        }
        MainCommand::Check { network } => check(network)?,
        MainCommand::Multilayer { hop_by_hop } => multilayer(hop_by_hop)?,
    }
    Ok(())
}

fn candidates(
    network: NetworkSelection,
    k: usize,
    max_length_km: Option<f64>,
    protection: bool,
) -> Result<(), Box<dyn Error>> {
    let model = network.model()?;
    let options = CandidatePathOptions { k, max_length_km, ..Default::default() };
    let cpl = model.compute_unicast_candidate_path_list(None, &options, None)?;
    info!("Candidate paths of {}:", network.repr());
    for ((a, _), paths) in cpl.iter() {
        for p in paths {
            println!("{}", format_links(&model, *a, p)?);
        }
    }

    if protection {
        let pairs = model.compute_unicast_candidate_11_path_list(&cpl, DisjointType::SrgDisjoint)?;
        for ((a, b), p) in pairs.iter() {
            println!(
                "{} => {}: {} disjoint pairs",
                printer::node_name(&model, *a)?,
                printer::node_name(&model, *b)?,
                p.len()
            );
        }
    }
    Ok(())
}

fn failure_analysis(
    network: NetworkSelection,
    mttf_hours: f64,
    mttr_hours: f64,
) -> Result<(), Box<dyn Error>> {
    let mut model = network.model()?;
    let num_routes = route_unrouted_demands(&mut model)?;
    info!("Added {} routes to {}", num_routes, network.repr());
    let srgs = model.add_srgs_per_link(None, mttf_hours, mttr_hours, true)?;

    for srg in srgs {
        let name = model
            .get_srg(srg)?
            .links()
            .iter()
            .map(|l| printer::link(&model, *l))
            .collect::<Result<Vec<_>, _>>()?
            .join(" & ");
        let links = model.get_srg_affected_links_all_layers(srg)?;
        model.set_srg_as_down(srg)?;
        let mut blocked = 0.0;
        let mut oversubscribed = 0;
        for layer in model.get_layers() {
            blocked += model.get_total_blocked_traffic(Some(layer))?;
            oversubscribed += model.get_links_oversubscribed(Some(layer))?.len();
        }
        println!(
            "{} (availability {:.5}): {} links affected, {} blocked, {} links oversubscribed",
            name,
            model.get_srg_availability(srg)?,
            links.len(),
            blocked,
            oversubscribed,
        );
        model.set_srg_as_up(srg)?;
    }
    Ok(())
}

fn check(network: NetworkSelection) -> Result<(), Box<dyn Error>> {
    let mut model = network.model()?;
    route_unrouted_demands(&mut model)?;
    model.check_caches_consistency()?;
    println!("{}: {} nodes", network.repr(), model.num_nodes());
    for layer in model.get_layers() {
        let l = model.get_layer(layer)?;
        println!(
            "  {} ({:?}): {} links, {} demands, offered {}, blocked {}, max utilization {:.3}",
            l.name(),
            l.routing_type(),
            model.get_links(Some(layer))?.len(),
            model.get_demands(Some(layer))?.len(),
            model.get_total_offered_traffic(Some(layer))?,
            model.get_total_blocked_traffic(Some(layer))?,
            model.get_max_link_utilization(Some(layer))?,
        );
    }
    Ok(())
}

fn multilayer(hop_by_hop: bool) -> Result<(), Box<dyn Error>> {
    let mut model = IpOverWdmNet::model()?;
    let wdm = model.get_layer_by_name(IpOverWdmNet::WDM)?;
    let ip = model.get_layer_by_name(IpOverWdmNet::IP)?;
    if hop_by_hop {
        model.set_routing_type(RoutingType::HopByHopRouting, Some(ip))?;
    }

    for (upper, lower) in model.get_layer_coupling_graph().all_edges().map(|(a, b, _)| (a, b)) {
        println!(
            "{} is realized by {}",
            model.get_layer(upper)?.name(),
            model.get_layer(lower)?.name()
        );
    }

    let mut done: BTreeSet<LinkId> = BTreeSet::new();
    for l in model.get_links(Some(wdm))? {
        if !done.insert(l) {
            continue;
        }
        let mut failed: BTreeSet<LinkId> = BTreeSet::new();
        failed.insert(l);
        if let Some(pair) = model.get_link(l)?.bidirectional_pair() {
            done.insert(pair);
            failed.insert(pair);
        }
        let ilpg =
            model.get_inter_layer_propagation_graph(&failed, &BTreeSet::new(), &BTreeSet::new(), true)?;
        let affected = ilpg
            .get_demands_in_graph()
            .into_iter()
            .map(|d| printer::demand(&model, d))
            .collect::<Result<Vec<_>, _>>()?;
        println!(
            "Failure of {}: {}",
            printer::link(&model, l)?,
            if affected.is_empty() {
                "no demand affected".to_string()
            } else {
                affected.iter().join(", ")
            }
        );
    }
    Ok(())
}

fn format_links(
    model: &NetworkModel,
    start: NodeId,
    links: &[LinkId],
) -> Result<String, Box<dyn Error>> {
    let path: Vec<PathElement> = links.iter().map(|l| PathElement::Link(*l)).collect();
    Ok(printer::path(model, start, &path)?)
}

/// This is the binary to inspect network designs. It loads a network (from Topology Zoo or the
/// example networks), and computes candidate paths, analyzes single failures, or prints the
/// coupling of layers.
#[derive(Parser, Debug)]
#[clap(name = "NetDesign (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(clap::Subcommand, Debug)]
enum MainCommand {
    /// Compute the candidate paths for every demand
    #[clap(name = "candidates")]
    Candidates {
        /// Network to use
        #[clap(subcommand)]
        network: NetworkSelection,
        /// Maximum number of paths per node pair
        #[clap(short = 'k', long, default_value = "3")]
        k: usize,
        /// Maximum length of every path in km
        #[clap(short = 'l', long)]
        max_length_km: Option<f64>,
        /// Also compute SRG-disjoint 1+1 pairs
        #[clap(short = 'p', long)]
        protection: bool,
    },
    /// Route all demands over their shortest path, and analyze the failure of every link pair
    #[clap(name = "failure")]
    Failure {
        /// Network to use
        #[clap(subcommand)]
        network: NetworkSelection,
        /// Mean time to fail of every link in hours
        #[clap(long, default_value = "10000")]
        mttf_hours: f64,
        /// Mean time to repair of every link in hours
        #[clap(long, default_value = "12")]
        mttr_hours: f64,
    },
    /// Route all demands and run the consistency checker
    #[clap(name = "check")]
    Check {
        /// Network to use
        #[clap(subcommand)]
        network: NetworkSelection,
    },
    /// Print the demands affected by failures in the IP over WDM network
    #[clap(name = "multilayer")]
    Multilayer {
        /// Use hop-by-hop routing in the IP layer
        #[clap(long)]
        hop_by_hop: bool,
    },
}
