use lazynfa_regex::{
    Action, Ast, GuardKind, NfaTraversal, NodeId, PathElement, Quantifier, QuantifierGuard,
    Successor, SuccessorVisitor, TraversalConfig, TraversalError,
};

#[derive(Debug, Clone)]
struct Found {
    target: NodeId,
    path: Vec<PathElement>,
    guards: Vec<QuantifierGuard>,
    dollars: Vec<NodeId>,
    look_arounds: Vec<NodeId>,
    boundaries: Vec<usize>,
    conditional: bool,
}

#[derive(Debug, Default)]
struct Collect(Vec<Found>);

impl SuccessorVisitor for Collect {
    fn visit(&mut self, successor: &Successor<'_>) {
        self.0.push(Found {
            target: successor.target(),
            path: successor.path().to_vec(),
            guards: successor.guards().to_vec(),
            dollars: successor.dollars().collect(),
            look_arounds: successor.look_arounds().collect(),
            boundaries: successor.group_boundaries().iter().collect(),
            conditional: successor.has_conditions(),
        });
    }
}

fn successors(ast: &Ast, root: NodeId, config: TraversalConfig) -> Vec<Found> {
    let mut nfa = NfaTraversal::new(ast, config);
    let mut collect = Collect::default();
    nfa.run(root, &mut collect).unwrap();
    collect.0
}

fn targets(found: &[Found]) -> Vec<NodeId> {
    found.iter().map(|f| f.target).collect()
}

fn visitor<F: FnMut(&Successor<'_>)>(f: F) -> F {
    f
}

#[test]
fn empty_optional_reaches_match_only() {
    // c(?:)?
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let c = ast.add_literal(top, 'c');
    ast.add_optional(top, true);
    ast.analyze();

    let found = successors(&ast, c, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![ast.root_match_found()]);
}

#[test]
fn greedy_optional_prefers_body() {
    // c(?:a)?
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let c = ast.add_literal(top, 'c');
    let (_, body) = ast.add_optional(top, true);
    let a = ast.add_literal(body, 'a');
    ast.analyze();

    let found = successors(&ast, c, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![a, ast.root_match_found()]);
}

#[test]
fn lazy_optional_stops_at_match() {
    // c(?:a)??
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let c = ast.add_literal(top, 'c');
    let (_, body) = ast.add_optional(top, false);
    ast.add_literal(body, 'a');
    ast.analyze();

    let found = successors(&ast, c, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![ast.root_match_found()]);
}

#[test]
fn bounded_loop_guards() {
    // (?:(a)){2,4}b
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let q = Quantifier::new(2, Some(4), true);
    let (group, body) = ast.add_repeat(top, q);
    let capture = ast.add_capture_group(body, 1);
    let inner = ast.add_sequence(capture);
    let a = ast.add_literal(inner, 'a');
    let b = ast.add_literal(top, 'b');
    ast.analyze();

    let found = successors(&ast, a, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![a, b]);

    let exit = QuantifierGuard {
        node: group,
        quantifier: q,
        kind: GuardKind::Exit,
    };
    let enter = QuantifierGuard {
        kind: GuardKind::Enter,
        ..exit
    };
    assert_eq!(found[0].guards, vec![exit, enter]);
    assert_eq!(found[1].guards, vec![exit]);
    assert_eq!(found[1].boundaries, vec![3]);

    let actions: Vec<Action> = found[1].path.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            Action::Exit,
            Action::Exit,
            Action::Enter,
            Action::Exit,
            Action::Node
        ]
    );
}

#[test]
fn nested_empty_loops_terminate() {
    // (x*)*y
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let (_, outer) = ast.add_star(top, true);
    let capture = ast.add_capture_group(outer, 1);
    let inner = ast.add_sequence(capture);
    let (_, body) = ast.add_star(inner, true);
    let x = ast.add_literal(body, 'x');
    let y = ast.add_literal(top, 'y');
    ast.analyze();

    let found = successors(&ast, ast.root_group(), TraversalConfig::forward());
    assert_eq!(targets(&found), vec![x, y]);

    let found = successors(&ast, x, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![x, y]);
}

#[test]
fn look_ahead_opaque_or_traversed() {
    // (?=a)b
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let la = ast.add_look_ahead(top, false);
    let inner = ast.add_sequence(ast.look_around_group(la).unwrap());
    let a = ast.add_literal(inner, 'a');
    ast.add_literal(top, 'b');
    ast.analyze();

    let found = successors(&ast, ast.root_group(), TraversalConfig::forward());
    assert_eq!(targets(&found), vec![la]);
    assert!(found[0].look_arounds.is_empty());

    let config = TraversalConfig::forward().with_look_arounds(true);
    let found = successors(&ast, ast.root_group(), config);
    assert_eq!(targets(&found), vec![a]);
    assert_eq!(found[0].look_arounds, vec![la]);
}

#[test]
fn empty_look_ahead_continues_after_it() {
    // (?=|a)b
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let la = ast.add_look_ahead(top, false);
    let group = ast.look_around_group(la).unwrap();
    ast.add_sequence(group);
    let inner = ast.add_sequence(group);
    let a = ast.add_literal(inner, 'a');
    let b = ast.add_literal(top, 'b');
    ast.analyze();

    let config = TraversalConfig::forward().with_look_arounds(true);
    let found = successors(&ast, ast.root_group(), config);
    assert_eq!(targets(&found), vec![b, a]);
    assert!(found.iter().all(|f| f.look_arounds == vec![la]));
}

#[test]
fn negated_look_around_stays_opaque() {
    // (?!a)b
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let la = ast.add_look_ahead(top, true);
    let inner = ast.add_sequence(ast.look_around_group(la).unwrap());
    ast.add_literal(inner, 'a');
    ast.add_literal(top, 'b');
    ast.analyze();

    let config = TraversalConfig::forward().with_look_arounds(true);
    let found = successors(&ast, ast.root_group(), config);
    assert_eq!(targets(&found), vec![la]);
}

#[test]
fn look_behind_is_opaque_forward() {
    // (?<=a)b
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let lb = ast.add_look_behind(top, false);
    let inner = ast.add_sequence(ast.look_around_group(lb).unwrap());
    ast.add_literal(inner, 'a');
    ast.add_literal(top, 'b');
    ast.analyze();

    let config = TraversalConfig::forward().with_look_arounds(true);
    let found = successors(&ast, ast.root_group(), config);
    assert_eq!(targets(&found), vec![lb]);
}

#[test]
fn no_characters_after_dollar() {
    // x$(?:a)?
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let x = ast.add_literal(top, 'x');
    let dollar = ast.add_dollar(top);
    let (_, body) = ast.add_optional(top, true);
    ast.add_literal(body, 'a');
    ast.analyze();

    let found = successors(&ast, x, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![ast.root_match_found()]);
    assert_eq!(found[0].dollars, vec![dollar]);
    assert!(found[0].conditional);
}

#[test]
fn look_behind_traversed_in_reverse() {
    // (?<=a)b$
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let lb = ast.add_look_behind(top, false);
    let inner = ast.add_sequence(ast.look_around_group(lb).unwrap());
    let a = ast.add_literal(inner, 'a');
    let b = ast.add_literal(top, 'b');
    let dollar = ast.add_dollar(top);
    ast.analyze();

    let config = TraversalConfig::reverse().with_look_arounds(true);
    let found = successors(&ast, ast.root_group(), config);
    assert_eq!(targets(&found), vec![b]);
    assert_eq!(found[0].dollars, vec![dollar]);
    assert!(found[0].look_arounds.is_empty());

    let found = successors(&ast, b, config);
    assert_eq!(targets(&found), vec![a]);
    assert_eq!(found[0].look_arounds, vec![lb]);
    assert!(found[0].dollars.is_empty());
    assert!(found[0].conditional);
}

#[test]
fn dollar_passed_in_reverse() {
    // ab$, characters are not pruned after an end anchor in reverse
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let a = ast.add_literal(top, 'a');
    let b = ast.add_literal(top, 'b');
    let dollar = ast.add_dollar(top);
    ast.analyze();

    let found = successors(&ast, ast.root_group(), TraversalConfig::reverse());
    assert_eq!(targets(&found), vec![b]);
    assert_eq!(found[0].dollars, vec![dollar]);
    assert!(found[0].path.contains(&PathElement {
        node: dollar,
        action: Action::Node,
        alt_index: 0,
    }));

    let found = successors(&ast, b, TraversalConfig::reverse());
    assert_eq!(targets(&found), vec![a]);
    assert!(found[0].dollars.is_empty());
}

#[test]
fn lazy_expanded_quantifier_backtracks_into_body() {
    // a(?:b)??c with the optional copy unrolled
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let a = ast.add_literal(top, 'a');
    let q = Quantifier::new(0, Some(1), false);
    let (group, body) = ast.add_expanded_optional(top, q);
    let b = ast.add_literal(body, 'b');
    let c = ast.add_literal(top, 'c');
    ast.analyze();

    let found = successors(&ast, a, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![c, b]);

    assert_eq!(found[0].path[0].node, group);
    assert_eq!(found[0].path[0].action, Action::PassThrough);
    assert!(found[0].path[0].is_group_enter());
    assert!(found[0].guards.is_empty());

    assert_eq!(found[1].path[0].node, group);
    assert_eq!(found[1].path[0].action, Action::Enter);
    assert!(found[1].path[0].is_group_enter());
    assert!(!found[1].path[1].is_group_enter());
    assert_eq!(found[1].guards.len(), 1);
    assert_eq!(found[1].guards[0].kind, GuardKind::Enter);
}

#[test]
fn wide_group() {
    // (?:c0|c1|...) with more alternatives than fit in 16 bits
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let group = ast.add_group(top);
    let mut last = None;
    for i in 0..70_000u32 {
        let alt = ast.add_sequence(group);
        let ch = char::from_u32(0x4e00 + i % 0x5000).unwrap();
        last = Some(ast.add_literal(alt, ch));
    }
    ast.analyze();

    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    let mut count = 0;
    let mut final_target = None;
    let mut count_visits = visitor(|s| {
        count += 1;
        final_target = Some(s.target());
    });
    nfa.run(ast.root_group(), &mut count_visits).unwrap();
    assert_eq!(count, 70_000);
    assert_eq!(final_target, last);
    assert_eq!(nfa.stats().duplicates, 0);
}

#[test]
fn duplicate_explosion() {
    // (?:|) x 17 then a
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    for _ in 0..17 {
        let group = ast.add_group(top);
        ast.add_sequence(group);
        ast.add_sequence(group);
    }
    let a = ast.add_literal(top, 'a');
    ast.analyze();

    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    let mut collect = Collect::default();
    let result = nfa.run(ast.root_group(), &mut collect);
    assert!(matches!(result, Err(TraversalError::Explosion { .. })));
    assert_eq!(targets(&collect.0), vec![a]);

    // State is cleared after an error
    let mut collect = Collect::default();
    nfa.run(a, &mut collect).unwrap();
    assert_eq!(targets(&collect.0), vec![ast.root_match_found()]);
    assert_eq!(nfa.stats().runs, 2);
}

#[test]
fn duplicates_are_suppressed() {
    // (?:|)(?:|)a
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    for _ in 0..2 {
        let group = ast.add_group(top);
        ast.add_sequence(group);
        ast.add_sequence(group);
    }
    let a = ast.add_literal(top, 'a');
    ast.analyze();

    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    let mut collect = Collect::default();
    nfa.run(ast.root_group(), &mut collect).unwrap();
    assert_eq!(targets(&collect.0), vec![a]);
    assert_eq!(nfa.stats().successors, 1);
    assert_eq!(nfa.stats().duplicates, 3);
}

#[test]
fn dead_alternative_is_skipped() {
    // a^b|c
    let mut ast = Ast::new();
    let first = ast.add_sequence(ast.root_group());
    ast.add_literal(first, 'a');
    ast.add_caret(first);
    ast.add_literal(first, 'b');
    let second = ast.add_sequence(ast.root_group());
    let c = ast.add_literal(second, 'c');
    ast.analyze();

    assert!(ast.is_dead(first));
    let found = successors(&ast, ast.root_group(), TraversalConfig::forward());
    assert_eq!(targets(&found), vec![c]);
}

#[test]
fn caret_traversal_toggle() {
    // ^a
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let caret = ast.add_caret(top);
    let a = ast.add_literal(top, 'a');
    ast.analyze();

    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    let mut collect = Collect::default();
    nfa.run(ast.root_group(), &mut collect).unwrap();
    assert!(collect.0.is_empty());

    nfa.set_config(nfa.config().with_caret(true));
    assert!(nfa.config().can_traverse_caret);
    nfa.run(ast.root_group(), &mut collect).unwrap();
    let found = collect.0;
    assert_eq!(targets(&found), vec![a]);
    assert!(!found[0].conditional);
    assert!(found[0].path.contains(&PathElement {
        node: caret,
        action: Action::Node,
        alt_index: 0,
    }));
}

#[test]
fn reverse_walks_sequences_backwards() {
    // ab
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let a = ast.add_literal(top, 'a');
    let b = ast.add_literal(top, 'b');
    ast.analyze();

    let config = TraversalConfig::reverse();
    assert_eq!(targets(&successors(&ast, ast.root_group(), config)), vec![b]);
    assert_eq!(targets(&successors(&ast, b, config)), vec![a]);
    assert_eq!(
        targets(&successors(&ast, a, config)),
        vec![ast.root_match_found()]
    );
}

#[test]
fn back_reference_is_a_target() {
    // (a)\1
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let capture = ast.add_capture_group(top, 1);
    let inner = ast.add_sequence(capture);
    let a = ast.add_literal(inner, 'a');
    let backref = ast.add_back_reference(top, 1);
    ast.analyze();

    let found = successors(&ast, a, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![backref]);
    assert_eq!(found[0].boundaries, vec![3]);
}

#[test]
fn expanded_quantifier_passes_through() {
    // a(?:b){1,3} with the optional copy unrolled
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let a = ast.add_literal(top, 'a');
    let q = Quantifier::new(1, Some(3), true);
    let (group, body) = ast.add_expanded_optional(top, q);
    let b = ast.add_literal(body, 'b');
    ast.analyze();

    let found = successors(&ast, a, TraversalConfig::forward());
    assert_eq!(targets(&found), vec![b, ast.root_match_found()]);
    assert_eq!(found[0].guards.len(), 1);
    assert_eq!(found[0].guards[0].kind, GuardKind::Enter);

    assert_eq!(found[1].path[0].node, group);
    assert_eq!(found[1].path[0].action, Action::PassThrough);
    assert!(found[1].guards.is_empty());
}

#[test]
fn empty_guard_rejects_empty_iteration() {
    // (?:$|)
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let group = ast.add_group(top);
    let alt = ast.add_sequence(group);
    ast.add_dollar(alt);
    ast.add_sequence(group);
    ast.analyze();

    let found = successors(&ast, ast.root_group(), TraversalConfig::forward());
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].dollars.len(), 1);
    assert!(found[1].dollars.is_empty());

    ast.set_empty_guard(group, true);
    let found = successors(&ast, ast.root_group(), TraversalConfig::forward());
    assert_eq!(targets(&found), vec![ast.root_match_found()]);
    assert!(found[0].dollars.is_empty());
}

#[test]
fn closure_visitor() {
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    ast.add_literals(top, "abc");
    ast.analyze();

    let mut count = 0;
    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    let mut count_visits = visitor(|_| count += 1);
    nfa.run(ast.root_group(), &mut count_visits).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn invalid_roots() {
    let mut ast = Ast::new();
    let top = ast.add_sequence(ast.root_group());
    let a = ast.add_literal(top, 'a');

    let mut collect = Collect::default();
    {
        let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
        let result = nfa.run(a, &mut collect);
        assert!(matches!(result, Err(TraversalError::Invariant(_))));
    }

    ast.analyze();
    let mut nfa = NfaTraversal::new(&ast, TraversalConfig::forward());
    for root in [ast.root_match_found(), ast.root(), top] {
        let result = nfa.run(root, &mut collect);
        assert!(matches!(result, Err(TraversalError::Invariant(_))));
    }
    assert!(collect.0.is_empty());
}

#[test]
fn config_from_toml() {
    let config: TraversalConfig = toml::from_str(
        r#"
        direction = "reverse"
        can_traverse_caret = true
        "#,
    )
    .unwrap();

    assert_eq!(config, TraversalConfig::reverse().with_caret(true));
    assert!(!config.can_traverse_look_arounds);
}
