mod config;
mod path;
mod successor;

use lazynfa_utils::bitset::Bitset;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

pub use self::config::TraversalConfig;
pub use self::path::{Action, GuardKind, PathElement, QuantifierGuard};
pub use self::successor::{Successor, SuccessorVisitor};

use crate::{
    ast::{AssertionKind, Ast, Direction, Group, LookAround, LookAroundKind, NodeId, NodeKind},
    TraversalError,
};

/// Suppressed duplicate successors allowed in a single run
pub const DEDUPLICATION_LIMIT: usize = 100_000;

/// Identity of a successor, paths reaching the same target through the same
/// assertions are the same successor
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TargetKey {
    target: NodeId,
    dollars: SmallVec<[NodeId; 2]>,
    look_arounds: SmallVec<[NodeId; 2]>,
}

impl TargetKey {
    fn new(target: NodeId, dollars: &Bitset, look_arounds: &Bitset) -> TargetKey {
        let members = |set: &Bitset| set.iter().map(|i| NodeId::from(i as u32)).collect();
        TargetKey {
            target,
            dollars: members(dollars),
            look_arounds: members(look_arounds),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub runs: usize,
    pub successors: usize,
    pub duplicates: usize,
}

/// Walks an analyzed [`Ast`] as if it was an NFA and reports the successors
/// of a node without building the automaton.
///
/// The walk is a depth first search over an explicit path stack. A run
/// advances until it hits a target, reports it and then retreats to the
/// last group with untried alternatives.
///
/// An instance can be reused for many runs, all per run state is cleared
/// when a run returns.
#[derive(Debug)]
pub struct NfaTraversal<'a> {
    ast: &'a Ast,
    config: TraversalConfig,

    root: Option<NodeId>,
    root_left: bool,
    cur: Option<NodeId>,
    path: Vec<PathElement>,
    done: bool,

    /// Loop groups entered without consuming a character
    inside_loops: Bitset,
    /// Empty guarded groups entered without consuming a character
    inside_empty_guard: Bitset,
    dollars_on_path: Bitset,
    look_arounds_on_path: Bitset,

    targets_visited: FxHashSet<TargetKey>,
    duplicates: usize,
    guards: Vec<QuantifierGuard>,
    stats: TraversalStats,
}

impl<'a> NfaTraversal<'a> {
    pub fn new(ast: &'a Ast, config: TraversalConfig) -> NfaTraversal<'a> {
        let n = ast.len();
        NfaTraversal {
            ast,
            config,
            root: None,
            root_left: false,
            cur: None,
            path: Vec::new(),
            done: false,
            inside_loops: Bitset::with_capacity(n),
            inside_empty_guard: Bitset::with_capacity(n),
            dollars_on_path: Bitset::new(),
            look_arounds_on_path: Bitset::new(),
            targets_visited: FxHashSet::default(),
            duplicates: 0,
            guards: Vec::new(),
            stats: TraversalStats::default(),
        }
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Change the configuration used by the following runs
    pub fn set_config(&mut self, config: TraversalConfig) {
        self.config = config;
    }

    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    /// Report every successor of `root` to `visitor`.
    ///
    /// Running from the top-level group enters it and yields the initial
    /// successors. Any other term is left and the successors after it are
    /// reported.
    pub fn run<V>(&mut self, root: NodeId, visitor: &mut V) -> Result<(), TraversalError>
    where
        V: SuccessorVisitor + ?Sized,
    {
        debug_assert!(self.path.is_empty() && self.targets_visited.is_empty());

        self.stats.runs += 1;
        let successors = self.stats.successors;
        let result = self.traverse(root, visitor);

        log::debug!(
            "Traversal {:?} from {:?}: {} successors, {} duplicates",
            self.config.direction,
            root,
            self.stats.successors - successors,
            self.duplicates,
        );

        self.clear();
        result
    }

    fn traverse<V>(&mut self, root: NodeId, visitor: &mut V) -> Result<(), TraversalError>
    where
        V: SuccessorVisitor + ?Sized,
    {
        let ast = self.ast;
        if !ast.is_analyzed() {
            return Err(TraversalError::Invariant(
                "traversal requires an analyzed tree",
            ));
        }

        match ast.kind(root) {
            NodeKind::MatchFound => {
                return Err(TraversalError::Invariant(
                    "match found nodes are only reached, never left",
                ))
            }
            NodeKind::Root { .. } | NodeKind::Sequence(_) => {
                return Err(TraversalError::Invariant("traversal root must be a term"))
            }
            _ => {}
        }

        self.root = Some(root);
        if root == ast.root_group() {
            self.root_left = false;
            self.cur = Some(root);
        } else {
            self.root_left = true;
            self.advance_term(root)?;
        }

        loop {
            let mut found = false;
            while !self.done && !found {
                found = self.advance()?;
            }

            if self.done {
                break;
            }

            self.visit_target(visitor)?;

            if !self.done {
                self.retreat()?;
            }
        }

        Ok(())
    }

    fn clear(&mut self) {
        self.root = None;
        self.root_left = false;
        self.cur = None;
        self.path.clear();
        self.done = false;
        self.inside_loops.clear();
        self.inside_empty_guard.clear();
        self.dollars_on_path.clear();
        self.look_arounds_on_path.clear();
        self.targets_visited.clear();
        self.duplicates = 0;
        self.guards.clear();
    }

    fn can_traverse(&self, look_around: &LookAround) -> bool {
        if !self.config.can_traverse_look_arounds || look_around.negated {
            return false;
        }

        matches!(
            (look_around.kind, self.config.direction),
            (LookAroundKind::Ahead, Direction::Forward) | (LookAroundKind::Behind, Direction::Reverse)
        )
    }

    fn group(&self, id: NodeId) -> Result<&'a Group, TraversalError> {
        let ast = self.ast;
        ast.group(id).ok_or(TraversalError::Invariant("expected a group"))
    }

    /// Report the target under the cursor unless an equivalent one was
    /// already reported
    fn visit_target<V>(&mut self, visitor: &mut V) -> Result<(), TraversalError>
    where
        V: SuccessorVisitor + ?Sized,
    {
        let ast = self.ast;
        let (Some(target), Some(root)) = (self.cur, self.root) else {
            return Err(TraversalError::Invariant("target found without a cursor"));
        };

        let key = TargetKey::new(target, &self.dollars_on_path, &self.look_arounds_on_path);

        if !self.targets_visited.insert(key) {
            self.duplicates += 1;
            self.stats.duplicates += 1;
            if self.duplicates > DEDUPLICATION_LIMIT {
                log::warn!(
                    "Traversal from {root:?} exploded, more than {DEDUPLICATION_LIMIT} duplicate successors"
                );
                return Err(TraversalError::Explosion {
                    limit: DEDUPLICATION_LIMIT,
                });
            }
            return Ok(());
        }

        path::quantifier_guards(
            ast,
            root,
            self.root_left,
            &self.path,
            target,
            &mut self.guards,
        );

        let successor = Successor {
            ast,
            root,
            target,
            path: &self.path,
            guards: &self.guards,
            dollars: &self.dollars_on_path,
            look_arounds: &self.look_arounds_on_path,
        };
        log::trace!("Successor of {root:?}: {}", ast.display(target));
        visitor.visit(&successor);
        self.stats.successors += 1;

        // Nothing after an unconditional final state can be reached with a
        // higher priority
        if ast.node(target).is_match_found()
            && self.dollars_on_path.is_empty()
            && self.look_arounds_on_path.is_empty()
        {
            self.done = true;
        }

        Ok(())
    }

    /// Take one step. Returns true if the cursor is on a target.
    fn advance(&mut self) -> Result<bool, TraversalError> {
        let ast = self.ast;
        let Some(cur) = self.cur else {
            return Err(TraversalError::Invariant("advance without a cursor"));
        };

        if ast.is_dead(cur) || self.inside_loops.contains(cur.index()) {
            return self.retreat();
        }

        match ast.kind(cur) {
            NodeKind::Sequence(seq) => {
                let next = if self.config.is_reverse() {
                    seq.last()
                } else {
                    seq.first()
                };

                match next {
                    Some(term) => {
                        self.cur = Some(term);
                        Ok(false)
                    }
                    None => self.leave_empty_sequence(cur),
                }
            }
            NodeKind::Group(group) => {
                let Some(first) = group.alternatives.first() else {
                    return Err(TraversalError::Invariant("group without alternatives"));
                };

                self.path.push(PathElement::enter(cur));
                self.insert_group_state(cur, group);
                self.cur = Some(*first);
                Ok(false)
            }
            NodeKind::PositionAssertion(AssertionKind::Caret) => {
                self.path.push(PathElement::node(cur));
                if self.config.can_traverse_caret {
                    self.advance_term(cur)
                } else {
                    self.retreat()
                }
            }
            NodeKind::PositionAssertion(AssertionKind::Dollar) => {
                self.path.push(PathElement::node(cur));
                self.dollars_on_path.insert(cur.index());
                self.advance_term(cur)
            }
            NodeKind::LookAround(la) if self.can_traverse(la) => {
                self.path.push(PathElement::node(cur));
                self.look_arounds_on_path.insert(cur.index());
                self.cur = Some(la.group);
                Ok(false)
            }
            NodeKind::CharacterClass(_)
                if !self.config.is_reverse() && !self.dollars_on_path.is_empty() =>
            {
                // No characters after an end anchor
                self.retreat()
            }
            NodeKind::CharacterClass(_)
            | NodeKind::BackReference { .. }
            | NodeKind::LookAround(_)
            | NodeKind::MatchFound => {
                self.path.push(PathElement::node(cur));
                Ok(true)
            }
            NodeKind::Root { .. } => Err(TraversalError::Invariant(
                "expression root cannot be advanced into",
            )),
        }
    }

    /// The cursor is on an empty alternative, leave its group
    fn leave_empty_sequence(&mut self, seq: NodeId) -> Result<bool, TraversalError> {
        let Some(group_id) = self.ast.parent(seq) else {
            return Err(TraversalError::Invariant("sequence without a parent"));
        };
        let group = self.group(group_id)?;
        self.remove_group_state(group_id, group);

        if group.is_expanded_quantifier {
            match self.path.last_mut() {
                Some(last) if last.node == group_id && last.action == Action::Enter => {
                    last.action = Action::PassThrough;
                }
                _ => {
                    return Err(TraversalError::Invariant(
                        "pass through without a matching group enter",
                    ))
                }
            }
        } else {
            self.path.push(PathElement::exit(group_id));
        }

        self.advance_term(group_id)
    }

    /// Move the cursor to whatever follows `term`, leaving groups whose
    /// alternatives end on the way
    fn advance_term(&mut self, term: NodeId) -> Result<bool, TraversalError> {
        let ast = self.ast;
        let mut term = term;

        loop {
            let Some(parent) = ast.parent(term) else {
                return Err(TraversalError::Invariant("term without a parent"));
            };

            match ast.kind(parent) {
                NodeKind::Sequence(seq) => {
                    let index = ast.node(term).seq_index();
                    let next = if self.config.is_reverse() {
                        index.checked_sub(1)
                    } else {
                        Some(index + 1).filter(|i| *i < seq.terms.len())
                    };

                    if let Some(next) = next {
                        self.cur = Some(seq.terms[next]);
                        return Ok(false);
                    }

                    let Some(group_id) = ast.parent(parent) else {
                        return Err(TraversalError::Invariant("sequence without a parent"));
                    };
                    let group = self.group(group_id)?;

                    // Iteration matched nothing, the empty check rejects it
                    if self.inside_empty_guard.contains(group_id.index()) {
                        return self.retreat();
                    }

                    self.path.push(PathElement::exit(group_id));
                    if group.is_loop {
                        self.cur = Some(group_id);
                        return Ok(false);
                    }

                    term = group_id;
                }
                NodeKind::Root { match_found, .. } => {
                    self.cur = Some(*match_found);
                    return Ok(false);
                }
                NodeKind::LookAround(la) => {
                    if self.look_arounds_on_path.contains(parent.index()) {
                        // Continue after the look-around we descended into
                        term = parent;
                        continue;
                    }

                    self.cur = Some(la.match_found);
                    return Ok(false);
                }
                _ => {
                    return Err(TraversalError::Invariant(
                        "term parent must be a sequence or a subtree root",
                    ))
                }
            }
        }
    }

    /// Backtrack to the last group with untried alternatives. Sets done if
    /// there are none left.
    fn retreat(&mut self) -> Result<bool, TraversalError> {
        while let Some(last) = self.path.last().copied() {
            match last.action {
                Action::Enter | Action::PassThrough => {
                    let group = self.group(last.node)?;
                    let next = last.alt_index as usize;

                    if let Some(alt) = group.alternatives.get(next) {
                        if let Some(element) = self.path.last_mut() {
                            element.alt_index += 1;
                            element.action = Action::Enter;
                        }

                        if last.action == Action::PassThrough {
                            self.insert_group_state(last.node, group);
                        }

                        self.cur = Some(*alt);
                        return Ok(false);
                    }

                    if last.action == Action::Enter {
                        self.remove_group_state(last.node, group);
                    }
                }
                Action::Exit => {
                    // Left through the empty alternative, the group is
                    // entered again
                    let below = self.path.len().checked_sub(2).map(|i| self.path[i]);
                    if let Some(below) = below {
                        if below.node == last.node && below.action == Action::Enter {
                            let group = self.group(last.node)?;
                            self.insert_group_state(last.node, group);
                        }
                    }
                }
                Action::Node => {
                    let len = self.path.len();
                    let still_on_path = self.path[..len - 1].iter().any(|e| e.node == last.node);
                    if !still_on_path {
                        self.dollars_on_path.remove(last.node.index());
                        self.look_arounds_on_path.remove(last.node.index());
                    }
                }
            }

            self.path.pop();
        }

        self.done = true;
        Ok(false)
    }

    fn insert_group_state(&mut self, id: NodeId, group: &Group) {
        if group.is_loop {
            self.inside_loops.insert(id.index());
        }

        if group.has_empty_guard {
            self.inside_empty_guard.insert(id.index());
        }
    }

    fn remove_group_state(&mut self, id: NodeId, group: &Group) {
        if group.is_loop {
            self.inside_loops.remove(id.index());
        }

        if group.has_empty_guard {
            self.inside_empty_guard.remove(id.index());
        }
    }
}
