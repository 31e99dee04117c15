//! Property-based tests for the tree queries and the dispatch algorithm.
//!
//! Charts are generated as parent-index vectors: state `i` hangs off some
//! state `j < i`, with index 0 standing for the root. That shape can encode
//! every rooted tree and never produces a cycle.

use nested::builder::{Definition, DefinitionBuilder, StateDescriptor};
use nested::core::{Journal, Signal, StateTree, VertexId, ROOT};
use nested::machine::StateMachine;
use proptest::prelude::*;
use std::sync::Arc;

const TRIGGERS: [&str; 3] = ["A", "B", "C"];

#[derive(Clone, Debug)]
struct Chart {
    parents: Vec<usize>,
    defaults: Vec<bool>,
    edges: Vec<Option<(usize, usize)>>,
}

/// Host context that mirrors the active configuration from the signals it
/// receives.
#[derive(Default)]
struct Active {
    stack: Vec<String>,
    signals: usize,
    mismatched_exit: bool,
}

fn enter(active: &mut Active, signal: &Signal<'_, ()>) {
    active.stack.push(signal.state.to_string());
    active.signals += 1;
}

fn leave(active: &mut Active, signal: &Signal<'_, ()>) {
    if active.stack.pop().as_deref() != Some(signal.state) {
        active.mismatched_exit = true;
    }
    active.signals += 1;
}

fn name(index: usize) -> String {
    if index == 0 {
        ROOT.to_string()
    } else {
        format!("s{index}")
    }
}

prop_compose! {
    fn arbitrary_chart()(len in 1usize..20)(
        parents in (0..len).map(|i| 0..=i).collect::<Vec<_>>(),
        defaults in prop::collection::vec(any::<bool>(), len),
        edges in prop::collection::vec(prop::option::of((0..TRIGGERS.len(), 1..=len)), len),
    ) -> Chart {
        Chart { parents, defaults, edges }
    }
}

fn compile(chart: &Chart) -> Arc<Definition<Active>> {
    let mut has_default = vec![false; chart.parents.len() + 1];
    let states = (1..=chart.parents.len()).map(|i| {
        let parent = chart.parents[i - 1];
        let mut state = StateDescriptor::new(name(i))
            .parent(name(parent))
            .on_entry(enter)
            .on_exit(leave);
        if chart.defaults[i - 1] && !has_default[parent] {
            has_default[parent] = true;
            state = state.initial();
        }
        if let Some((trigger, dest)) = chart.edges[i - 1] {
            state = state.on(TRIGGERS[trigger], name(dest));
        }
        state
    });

    let definition = DefinitionBuilder::new()
        .states(states)
        .build()
        .expect("generated charts are well formed");
    Arc::new(definition)
}

fn ids(tree: &StateTree) -> Vec<VertexId> {
    tree.iter().map(|vertex| vertex.id()).collect()
}

fn naive_lca(tree: &StateTree, mut a: VertexId, mut b: VertexId) -> VertexId {
    while tree.depth(a) > tree.depth(b) {
        a = tree.parent(a).unwrap();
    }
    while tree.depth(b) > tree.depth(a) {
        b = tree.parent(b).unwrap();
    }
    while a != b {
        a = tree.parent(a).unwrap();
        b = tree.parent(b).unwrap();
    }
    a
}

/// Names of the states a started machine should have entered, outermost
/// first.
fn expected_stack(tree: &StateTree, leaf: VertexId) -> Vec<String> {
    let mut stack: Vec<String> = tree
        .ancestors(leaf)
        .filter(|&vertex| vertex != tree.root())
        .map(|vertex| tree.name(vertex).to_string())
        .collect();
    stack.reverse();
    stack
}

proptest! {
    #[test]
    fn lca_is_symmetric_and_absorbs_ancestors(chart in arbitrary_chart()) {
        let definition = compile(&chart);
        let tree = definition.tree();
        let vertices = ids(tree);

        for &a in &vertices {
            prop_assert_eq!(tree.lca(a, a), a);
            prop_assert_eq!(tree.lca(a, tree.root()), tree.root());
            for ancestor in tree.ancestors(a) {
                prop_assert_eq!(tree.lca(a, ancestor), ancestor);
            }
            for &b in &vertices {
                prop_assert_eq!(tree.lca(a, b), tree.lca(b, a));
            }
        }
    }

    #[test]
    fn lca_matches_parent_walk(chart in arbitrary_chart()) {
        let definition = compile(&chart);
        let tree = definition.tree();
        let vertices = ids(tree);

        for &a in &vertices {
            for &b in &vertices {
                prop_assert_eq!(tree.lca(a, b), naive_lca(tree, a, b));
            }
        }
    }

    #[test]
    fn path_fails_exactly_for_unrelated_vertices(chart in arbitrary_chart()) {
        let definition = compile(&chart);
        let tree = definition.tree();
        let vertices = ids(tree);

        for &a in &vertices {
            for &b in &vertices {
                let related = tree.is_ancestor(a, b) || tree.is_ancestor(b, a);
                match tree.path(a, b) {
                    Ok(path) => {
                        prop_assert!(related);
                        prop_assert_eq!(path.first().copied(), Some(a));
                        prop_assert_eq!(path.last().copied(), Some(b));
                        prop_assert_eq!(path.len(), tree.depth(a).abs_diff(tree.depth(b)) + 1);
                    }
                    Err(_) => prop_assert!(!related),
                }
            }
        }
    }

    #[test]
    fn start_follows_the_default_chain(chart in arbitrary_chart()) {
        let definition = compile(&chart);
        let tree = definition.tree();

        let mut expected = tree.root();
        while let Some(child) = tree.default_child(expected) {
            expected = child;
        }

        let mut first = StateMachine::new(Arc::clone(&definition), Active::default());
        let mut second = StateMachine::new(Arc::clone(&definition), Active::default());
        first.start().unwrap();
        second.start().unwrap();

        prop_assert_eq!(first.current(), Some(expected));
        prop_assert_eq!(second.current(), Some(expected));
        prop_assert!(first.isin(ROOT));
        prop_assert_eq!(&first.context().stack, &expected_stack(tree, expected));
    }

    #[test]
    fn dispatch_keeps_entries_and_exits_balanced(
        chart in arbitrary_chart(),
        events in prop::collection::vec(0..=TRIGGERS.len(), 0..30),
    ) {
        let definition = compile(&chart);
        let tree = definition.tree();
        let mut machine = StateMachine::new(Arc::clone(&definition), Active::default());
        machine.start().unwrap();

        for event in events {
            let trigger = TRIGGERS.get(event).copied().unwrap_or("UNKNOWN");
            let before = machine.current();
            let signals = machine.context().signals;

            let handled = machine.dispatch(trigger).unwrap();
            let leaf = machine.current().unwrap();

            prop_assert!(!machine.context().mismatched_exit);
            prop_assert!(machine.isin(ROOT));
            prop_assert_eq!(tree.default_child(leaf), None);
            prop_assert_eq!(&machine.context().stack, &expected_stack(tree, leaf));
            if !handled {
                prop_assert_eq!(machine.current(), before);
                prop_assert_eq!(machine.context().signals, signals);
            }
        }
    }

    #[test]
    fn unknown_trigger_is_a_no_op(chart in arbitrary_chart()) {
        let definition = compile(&chart);
        let mut machine = StateMachine::new(definition, Active::default()).with_journal();
        machine.start().unwrap();
        let before = machine.current();
        let signals = machine.context().signals;

        prop_assert_eq!(machine.dispatch("UNKNOWN"), Ok(false));
        prop_assert_eq!(machine.current(), before);
        prop_assert_eq!(machine.context().signals, signals);
        prop_assert!(machine.journal().unwrap().is_empty());
    }

    #[test]
    fn journal_tracks_the_active_leaf(
        chart in arbitrary_chart(),
        events in prop::collection::vec(0..TRIGGERS.len(), 1..20),
    ) {
        let definition = compile(&chart);
        let mut machine = StateMachine::new(definition, Active::default()).with_journal();
        machine.start().unwrap();

        let mut handled = 0;
        for event in events {
            if machine.dispatch(TRIGGERS[event]).unwrap() {
                handled += 1;
            }
        }

        let journal = machine.journal().unwrap();
        prop_assert_eq!(journal.len(), handled);
        if let Some(last) = journal.path().last() {
            prop_assert_eq!(Some(*last), machine.current_state());
        }

        let json = serde_json::to_string(journal).unwrap();
        let restored: Journal = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&restored, journal);
    }
}
