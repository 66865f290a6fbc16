use crate::protocol_graph::{ProtocolGraph, ProtocolId};
use crate::rewrite_system::{CompletionResult, RewriteSystem};
use crate::term::Term;

fn graph(count: ProtocolId) -> ProtocolGraph {
    let mut graph = ProtocolGraph::new();
    for proto in 0..count {
        graph.add_protocol(proto);
    }
    graph
}

fn pair(lhs: &str, rhs: &str) -> (Term, Term) {
    (Term::parse(lhs), Term::parse(rhs))
}

fn live_rules(system: &RewriteSystem) -> Vec<String> {
    system
        .iter_rules()
        .filter(|rule| !rule.is_deleted())
        .map(|rule| rule.to_string())
        .collect()
}

/// Checks the confluence certificate the hard way: every superposition of
/// every pair of live rules must reduce to one normal form along both
/// branches.
fn assert_locally_confluent(system: &RewriteSystem) {
    for i in 0..system.num_rules() {
        if system.get_rule(i).is_deleted() {
            continue;
        }
        for j in 0..system.num_rules() {
            if system.get_rule(j).is_deleted() {
                continue;
            }
            let lhs_i = system.get_rule(i).lhs().clone();
            let lhs_j = system.get_rule(j).lhs().clone();
            for pos in 0..lhs_i.len() {
                if i == j && pos == 0 {
                    continue;
                }
                let superposition = match lhs_i.overlap_at(&lhs_j, pos) {
                    Some(term) => term,
                    None => continue,
                };
                let mut first = superposition.clone();
                first.replace_range(0, lhs_i.len(), system.get_rule(i).rhs());
                let mut second = superposition.clone();
                second.replace_range(pos, lhs_j.len(), system.get_rule(j).rhs());
                system.simplify(&mut first);
                system.simplify(&mut second);
                assert_eq!(
                    first, second,
                    "superposition {} of rules {} and {} does not join",
                    superposition, i, j
                );
            }
        }
    }
}

/// After completion the live rules must also be inter-reduced: no live
/// left-hand side contains another one.
fn assert_reduced(system: &RewriteSystem) {
    for i in 0..system.num_rules() {
        if system.get_rule(i).is_deleted() {
            continue;
        }
        for j in 0..system.num_rules() {
            if i == j || system.get_rule(j).is_deleted() {
                continue;
            }
            assert!(
                !system
                    .get_rule(i)
                    .can_reduce_left_hand_side(system.get_rule(j)),
                "rule {} is subsumed by rule {}",
                i,
                j
            );
        }
    }
}

#[test]
fn test_protocol_hierarchy_collapse() {
    // Q refines P. The requirement T: Q also implies T: P, which the
    // translator expresses as a conformance rule, together with the
    // idempotence rule every protocol gets.
    let mut graph = graph(2);
    graph.add_inheritance(1, 0);

    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("τ_0_0.[p1]", "τ_0_0.[p0]"),
        pair("[p0].[p0]", "[p0]"),
    ]);

    let mut term = Term::parse("τ_0_0.[p1].[p0]");
    assert!(system.simplify(&mut term));
    assert_eq!(term, Term::parse("τ_0_0.[p0]"));
    assert_ne!(term, Term::parse("τ_0_0.[p1]"));
}

#[test]
fn test_associated_type_sameness() {
    // T.A == T collapses any tower of A accesses.
    let graph = graph(1);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![pair("τ_0_0.[p0:A]", "τ_0_0")]);

    let mut term = Term::parse("τ_0_0.[p0:A].[p0:A].[p0:A]");
    assert!(system.simplify(&mut term));
    assert_eq!(term, Term::parse("τ_0_0"));
}

#[test]
fn test_common_lhs_merges_associated_types() {
    // Two requirements rewrite the same term to different associated type
    // atoms. Normalizing the second against the first leaves the atom
    // equation [p1:A] = [p0:A], oriented toward the earlier protocol.
    let graph = graph(2);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p1:A].[p0:A]", "[p0:A]"),
        pair("[p1:A].[p0:A]", "[p1:A]"),
    ]);

    assert_eq!(
        system.compute_confluent_completion(100, 10),
        CompletionResult::Success
    );
    let live = live_rules(&system);
    assert!(live.contains(&"[p1:A] => [p0:A]".to_string()), "{:?}", live);
    assert_locally_confluent(&system);
    assert_reduced(&system);

    let mut term = Term::parse("τ_0_0.[p1:A]");
    system.simplify(&mut term);
    assert_eq!(term, Term::parse("τ_0_0.[p0:A]"));
}

#[test]
fn test_proper_overlap_completion() {
    // The two left-hand sides overlap each other on one atom in both
    // directions. Completion closes the system with the idempotence rules
    // for each associated type atom.
    let graph = graph(2);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p0:A].[p1:A]", "[p0:A]"),
        pair("[p1:A].[p0:A]", "[p1:A]"),
    ]);

    assert_eq!(
        system.compute_confluent_completion(100, 10),
        CompletionResult::Success
    );
    let live = live_rules(&system);
    assert!(live.contains(&"[p0:A].[p0:A] => [p0:A]".to_string()), "{:?}", live);
    assert!(live.contains(&"[p1:A].[p1:A] => [p1:A]".to_string()), "{:?}", live);
    assert_locally_confluent(&system);
    assert_reduced(&system);
}

#[test]
fn test_completion_derives_transitive_conformance() {
    // A tower of protocols: p2 refines p1 refines p0. The translator only
    // emits the direct steps; completion closes the transitive one.
    let mut graph = graph(3);
    graph.add_inheritance(1, 0);
    graph.add_inheritance(2, 1);

    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p2].[p1]", "[p2]"),
        pair("[p1].[p0]", "[p1]"),
        pair("[p0].[p0]", "[p0]"),
        pair("[p1].[p1]", "[p1]"),
        pair("[p2].[p2]", "[p2]"),
    ]);

    assert_eq!(
        system.compute_confluent_completion(1000, 10),
        CompletionResult::Success
    );
    let live = live_rules(&system);
    assert!(live.contains(&"[p2].[p0] => [p2]".to_string()), "{:?}", live);
    assert_locally_confluent(&system);
    assert_reduced(&system);

    let mut term = Term::parse("τ_0_0.[p2].[p1].[p0]");
    system.simplify(&mut term);
    assert_eq!(term, Term::parse("τ_0_0.[p2]"));
}

#[test]
fn test_completed_rules_stay_oriented() {
    let graph = graph(2);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p0:A].[p1:A]", "[p0:A]"),
        pair("[p1:A].[p0:A]", "[p1:A]"),
    ]);
    system.compute_confluent_completion(100, 10);

    for rule in system.iter_rules() {
        if rule.is_deleted() {
            continue;
        }
        assert_eq!(
            rule.lhs().compare(rule.rhs(), &graph),
            std::cmp::Ordering::Greater,
            "rule {} is not oriented",
            rule
        );
    }
}

#[test]
fn test_depth_bound() {
    // The classic divergent shape: the rule overlaps itself on its last
    // atom and every critical pair grows the left-hand side by one.
    let graph = graph(1);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![pair("[p0:A].[p0:B].[p0:A]", "[p0:A].[p0:B]")]);

    assert_eq!(
        system.compute_confluent_completion(1000, 4),
        CompletionResult::MaxDepth
    );
}

#[test]
fn test_iteration_bound() {
    let graph = graph(2);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p0:A].[p1:A]", "[p0:A]"),
        pair("[p1:A].[p0:A]", "[p1:A]"),
    ]);

    assert_eq!(
        system.compute_confluent_completion(1, 10),
        CompletionResult::MaxIterations
    );
}

#[test]
fn test_completion_of_empty_system() {
    let graph = graph(1);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![]);
    assert_eq!(
        system.compute_confluent_completion(10, 10),
        CompletionResult::Success
    );
}

#[test]
fn test_rule_indices_stay_stable_across_completion() {
    let graph = graph(2);
    let mut system = RewriteSystem::new(&graph);
    system.initialize(vec![
        pair("[p1:A].[p0:A]", "[p0:A]"),
        pair("[p1:A].[p0:A]", "[p1:A]"),
    ]);
    let before: Vec<String> = (0..system.num_rules())
        .map(|index| system.get_rule(index).lhs().to_string())
        .collect();
    system.compute_confluent_completion(100, 10);
    // Completion appends and tombstones, but never moves a rule.
    for (index, lhs) in before.iter().enumerate() {
        assert_eq!(&system.get_rule(index).lhs().to_string(), lhs);
    }
}
