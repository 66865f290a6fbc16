// The sigrewrite CLI.
// Reads requirement rules, runs completion, and dumps the resulting system.

use std::io::Read;

use clap::Parser;

use sigrewrite::atom::Atom;
use sigrewrite::protocol_graph::ProtocolGraph;
use sigrewrite::rewrite_system::{CompletionResult, RewriteSystem};
use sigrewrite::term::Term;

#[derive(Parser)]
#[clap(
    name = "sigrewrite",
    about = "Term rewriting for generic signatures",
    long_about = "Reads rewrite rules of the form 'lhs => rhs', one per line, \
completes them into a confluent system, and prints the result.\n\n\
Atoms: [p0] protocol, [p0:Name] associated type, τ_0_0 generic parameter, \
[AnyObject] layout, bare identifiers are names. Atoms in a term are \
separated by dots.",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// File of rules; "-" or nothing reads stdin
    #[clap(value_name = "RULES")]
    rules: Option<String>,

    /// Number of protocols, linearized as p0 < p1 < ...
    #[clap(long, default_value = "16", value_name = "N")]
    protocols: u16,

    /// Inheritance edges, e.g. "p1:p0,p2:p1"
    #[clap(long, value_name = "EDGES")]
    inherits: Option<String>,

    /// Completion iteration budget
    #[clap(long, default_value = "10000")]
    max_iterations: usize,

    /// Cap on the left-hand side length of derived rules
    #[clap(long, default_value = "12")]
    max_depth: usize,

    /// Trace every rule added
    #[clap(long)]
    debug_add: bool,

    /// Trace every simplification step
    #[clap(long)]
    debug_simplify: bool,
}

fn read_input(source: &Option<String>) -> Result<String, String> {
    match source.as_deref() {
        None | Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("error reading stdin: {}", e))?;
            Ok(buffer)
        }
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| format!("error reading {}: {}", path, e))
        }
    }
}

fn parse_term(s: &str) -> Result<Term, String> {
    let mut term = Term::new();
    for part in s.trim().split('.') {
        match Atom::parse(part) {
            Some(atom) => term.add(atom),
            None => return Err(format!("bad atom '{}' in term '{}'", part, s)),
        }
    }
    if term.is_empty() {
        return Err(format!("empty term in '{}'", s));
    }
    Ok(term)
}

fn parse_rules(input: &str) -> Result<Vec<(Term, Term)>, String> {
    let mut rules = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (lhs, rhs) = line
            .split_once("=>")
            .ok_or_else(|| format!("line {}: expected 'lhs => rhs'", number + 1))?;
        rules.push((parse_term(lhs)?, parse_term(rhs)?));
    }
    Ok(rules)
}

fn build_graph(count: u16, edges: &Option<String>) -> Result<ProtocolGraph, String> {
    let mut graph = ProtocolGraph::new();
    for proto in 0..count {
        graph.add_protocol(proto);
    }
    if let Some(edges) = edges {
        for edge in edges.split(',') {
            let (sub, sup) = edge
                .split_once(':')
                .ok_or_else(|| format!("bad inheritance edge '{}'", edge))?;
            let sub = sub
                .trim()
                .strip_prefix('p')
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("bad protocol '{}'", sub))?;
            let sup = sup
                .trim()
                .strip_prefix('p')
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("bad protocol '{}'", sup))?;
            if !graph.contains(sub) || !graph.contains(sup) {
                return Err(format!("edge '{}' names an unregistered protocol", edge));
            }
            graph.add_inheritance(sub, sup);
        }
    }
    Ok(graph)
}

fn run(args: &Args) -> Result<CompletionResult, String> {
    let input = read_input(&args.rules)?;
    let rules = parse_rules(&input)?;
    let graph = build_graph(args.protocols, &args.inherits)?;

    let mut system = RewriteSystem::new(&graph);
    system.debug_add = args.debug_add;
    system.debug_simplify = args.debug_simplify;
    system.initialize(rules);

    let result = system.compute_confluent_completion(args.max_iterations, args.max_depth);
    print!("{}", system);
    Ok(result)
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(CompletionResult::Success) => {}
        Ok(result) => {
            println!("completion failed: {:?}", result);
            std::process::exit(1);
        }
        Err(message) => {
            println!("{}", message);
            std::process::exit(1);
        }
    }
}
