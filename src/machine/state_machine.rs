//! State machine that dispatches events through a shared definition.

use crate::builder::Definition;
use crate::core::{
    ActionInvoker, Journal, Signal, SignalKind, Transition, TransitionRecord, VertexId,
};
use crate::machine::error::MachineError;
use chrono::Utc;
use std::sync::Arc;

/// One running instance of a chart.
///
/// The machine owns the host context `C` that actions mutate and a pointer
/// to the active leaf. Everything else lives in the shared [`Definition`].
///
/// Between calls the active state is always either the root or a state
/// without a default child.
pub struct StateMachine<C, P = ()> {
    definition: Arc<Definition<C, P>>,
    context: C,
    current: Option<VertexId>,
    journal: Option<Journal>,
}

impl<C, P> StateMachine<C, P> {
    /// Create an unstarted machine.
    pub fn new(definition: Arc<Definition<C, P>>, context: C) -> Self {
        Self {
            definition,
            context,
            current: None,
            journal: None,
        }
    }

    /// Record every handled event in a [`Journal`].
    pub fn with_journal(mut self) -> Self {
        self.journal = Some(Journal::new());
        self
    }

    pub fn definition(&self) -> &Arc<Definition<C, P>> {
        &self.definition
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// The active leaf, `None` before [`start`](Self::start).
    pub fn current(&self) -> Option<VertexId> {
        self.current
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.map(|id| self.definition.tree().name(id))
    }

    /// Enter the chart: follow default children down from the root, firing
    /// their entry actions outermost first. The root's own entry never fires.
    pub fn start(&mut self) -> Result<(), MachineError> {
        if self.current.is_some() {
            return Err(MachineError::AlreadyStarted);
        }

        let definition = Arc::clone(&self.definition);
        let root = definition.tree().root();
        let leaf = descend(&definition, &mut self.context, root, None, None);
        self.current = Some(leaf);

        tracing::info!(state = definition.tree().name(leaf), "State machine started");
        Ok(())
    }

    /// Tell the host to stop routing events here.
    ///
    /// The engine keeps no resources of its own, so the active state is left
    /// untouched.
    pub fn stop(&mut self) {
        tracing::info!(state = ?self.current_state(), "State machine stopped");
    }

    /// Whether `name` is the active leaf or one of its ancestors.
    ///
    /// The root matches any started machine. Always `false` before
    /// [`start`](Self::start).
    pub fn isin(&self, name: &str) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let tree = self.definition.tree();
        tree.ancestors(current).any(|vertex| tree.name(vertex) == name)
    }

    /// Dispatch an event without a payload. See [`dispatch_with`](Self::dispatch_with).
    pub fn dispatch(&mut self, trigger: &str) -> Result<bool, MachineError> {
        self.handle(trigger, None)
    }

    /// Dispatch an event and run it to completion.
    ///
    /// Returns `Ok(true)` when some state handled the event and `Ok(false)`
    /// when nothing from the active leaf up to the root did, in which case
    /// no action ran and the active state is unchanged.
    pub fn dispatch_with(&mut self, trigger: &str, payload: &P) -> Result<bool, MachineError> {
        self.handle(trigger, Some(payload))
    }

    fn handle(&mut self, trigger: &str, payload: Option<&P>) -> Result<bool, MachineError> {
        let current = self.current.ok_or(MachineError::NotStarted)?;

        let definition = Arc::clone(&self.definition);
        let tree = definition.tree();

        let Some(transition) = definition.find_handler(trigger, current, &self.context, payload)
        else {
            tracing::debug!(trigger, state = tree.name(current), "Event not handled");
            return Ok(false);
        };

        let leaf = if transition.is_internal() {
            run_action(&definition, &mut self.context, transition, trigger, payload);
            current
        } else {
            let lca = tree.lca(current, transition.dest);

            let exit_path = tree.path(current, lca)?;
            if let Some((_, exited)) = exit_path.split_last() {
                for &vertex in exited {
                    fire(
                        &definition,
                        &mut self.context,
                        vertex,
                        SignalKind::Exit,
                        Some(trigger),
                        payload,
                    );
                }
            }

            run_action(&definition, &mut self.context, transition, trigger, payload);

            let entry_path = tree.path(lca, transition.dest)?;
            if let Some((_, entered)) = entry_path.split_first() {
                for &vertex in entered {
                    fire(
                        &definition,
                        &mut self.context,
                        vertex,
                        SignalKind::Entry,
                        Some(trigger),
                        payload,
                    );
                }
            }

            descend(
                &definition,
                &mut self.context,
                transition.dest,
                Some(trigger),
                payload,
            )
        };

        tracing::debug!(
            trigger,
            from = tree.name(current),
            to = tree.name(leaf),
            handler = tree.name(transition.source),
            internal = transition.is_internal(),
            "Transition taken"
        );

        if let Some(journal) = self.journal.as_mut() {
            journal.record(TransitionRecord {
                trigger: trigger.to_string(),
                from: tree.name(current).to_string(),
                to: tree.name(leaf).to_string(),
                timestamp: Utc::now(),
            });
        }

        self.current = Some(leaf);
        Ok(true)
    }
}

/// Run the transition's own action, if it has one.
fn run_action<C, P>(
    definition: &Definition<C, P>,
    context: &mut C,
    transition: &Transition<C, P>,
    trigger: &str,
    payload: Option<&P>,
) {
    if let Some(action) = &transition.action {
        action.invoke(
            context,
            &Signal {
                kind: SignalKind::Action,
                state: definition.tree().name(transition.source),
                trigger: Some(trigger),
                payload,
            },
        );
    }
}

/// Fire the entry or exit action of `vertex`, if it has one.
fn fire<C, P>(
    definition: &Definition<C, P>,
    context: &mut C,
    vertex: VertexId,
    kind: SignalKind,
    trigger: Option<&str>,
    payload: Option<&P>,
) {
    let state = definition.tree().name(vertex);
    tracing::trace!(%kind, state, "State signal");

    if let Some(action) = definition.actions(vertex).get(kind) {
        action.invoke(
            context,
            &Signal {
                kind,
                state,
                trigger,
                payload,
            },
        );
    }
}

/// Cascade through default children starting below `from`, entering each.
/// Returns the first vertex without a default child.
fn descend<C, P>(
    definition: &Definition<C, P>,
    context: &mut C,
    from: VertexId,
    trigger: Option<&str>,
    payload: Option<&P>,
) -> VertexId {
    let tree = definition.tree();
    let mut vertex = from;
    while let Some(child) = tree.default_child(vertex) {
        fire(definition, context, child, SignalKind::Entry, trigger, payload);
        vertex = child;
    }
    vertex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DefinitionBuilder, StateDescriptor, TransitionSpec};

    /// Log of every signal, formatted as `KIND state`.
    #[derive(Default)]
    struct Trace {
        log: Vec<String>,
    }

    type State = StateDescriptor<Trace>;

    fn traced(name: &str) -> State {
        State::new(name)
            .on_entry(|t: &mut Trace, s: &Signal<'_, ()>| t.log.push(format!("ENTRY {}", s.state)))
            .on_exit(|t: &mut Trace, s: &Signal<'_, ()>| t.log.push(format!("EXIT {}", s.state)))
    }

    /// ROOT
    /// ├── a (default)
    /// │   ├── a1 (default)
    /// │   │   └── a1x (default)
    /// │   └── a2
    /// └── b
    ///     └── b1 (default)
    fn machine() -> StateMachine<Trace> {
        let definition = DefinitionBuilder::new()
            .state(traced("a").initial().on("TO_B", "b").on("TO_A2", "a2"))
            .state(traced("a1").parent("a").initial())
            .state(traced("a1x").parent("a1").initial().on("TO_B1", "b1"))
            .state(traced("a2").parent("a").on("TO_A", "a"))
            .state(
                traced("b")
                    .on("BACK", "a1x")
                    .transition(TransitionSpec::to("LOOP", "b").action(
                        |t: &mut Trace, _: &Signal<'_, ()>| t.log.push("ACTION loop".into()),
                    )),
            )
            .state(traced("b1").parent("b").initial())
            .build()
            .unwrap();
        StateMachine::new(Arc::new(definition), Trace::default())
    }

    fn take_log(machine: &mut StateMachine<Trace>) -> Vec<String> {
        std::mem::take(&mut machine.context_mut().log)
    }

    #[test]
    fn start_cascades_through_defaults() {
        let mut machine = machine();
        machine.start().unwrap();

        assert_eq!(machine.current_state(), Some("a1x"));
        assert_eq!(take_log(&mut machine), vec!["ENTRY a", "ENTRY a1", "ENTRY a1x"]);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut machine = machine();
        machine.start().unwrap();

        assert_eq!(machine.start(), Err(MachineError::AlreadyStarted));
        assert_eq!(machine.current_state(), Some("a1x"));
    }

    #[test]
    fn dispatch_before_start_is_rejected() {
        let mut machine = machine();

        assert_eq!(machine.dispatch("TO_B"), Err(MachineError::NotStarted));
        assert!(!machine.isin("ROOT"));
        assert_eq!(machine.current_state(), None);
        assert!(machine.context().log.is_empty());
    }

    #[test]
    fn bubbled_transition_exits_innermost_first() {
        let mut machine = machine();
        machine.start().unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("TO_B"), Ok(true));
        assert_eq!(machine.current_state(), Some("b1"));
        assert_eq!(
            take_log(&mut machine),
            vec!["EXIT a1x", "EXIT a1", "EXIT a", "ENTRY b", "ENTRY b1"]
        );
    }

    #[test]
    fn transition_into_nested_target_enters_outermost_first() {
        let mut machine = machine();
        machine.start().unwrap();
        machine.dispatch("TO_B").unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("BACK"), Ok(true));
        assert_eq!(machine.current_state(), Some("a1x"));
        assert_eq!(
            take_log(&mut machine),
            vec!["EXIT b1", "EXIT b", "ENTRY a", "ENTRY a1", "ENTRY a1x"]
        );
    }

    #[test]
    fn sibling_transition_keeps_common_parent() {
        let mut machine = machine();
        machine.start().unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("TO_A2"), Ok(true));
        assert_eq!(machine.current_state(), Some("a2"));
        assert_eq!(
            take_log(&mut machine),
            vec!["EXIT a1x", "EXIT a1", "ENTRY a2"]
        );
    }

    #[test]
    fn transition_to_ancestor_recascades() {
        let mut machine = machine();
        machine.start().unwrap();
        machine.dispatch("TO_A2").unwrap();
        take_log(&mut machine);

        // a2 -> a: lca is a itself, so a is neither exited nor re-entered
        assert_eq!(machine.dispatch("TO_A"), Ok(true));
        assert_eq!(machine.current_state(), Some("a1x"));
        assert_eq!(
            take_log(&mut machine),
            vec!["EXIT a2", "ENTRY a1", "ENTRY a1x"]
        );
    }

    #[test]
    fn action_runs_between_exit_and_entry() {
        let mut machine = machine();
        machine.start().unwrap();
        machine.dispatch("TO_B").unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("LOOP"), Ok(true));
        assert_eq!(machine.current_state(), Some("b1"));
        assert_eq!(
            take_log(&mut machine),
            vec!["EXIT b1", "ACTION loop", "ENTRY b1"]
        );
    }

    #[test]
    fn unhandled_event_changes_nothing() {
        let mut machine = machine().with_journal();
        machine.start().unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("NO_SUCH_EVENT"), Ok(false));
        assert_eq!(machine.current_state(), Some("a1x"));
        assert!(machine.context().log.is_empty());
        assert!(machine.journal().unwrap().is_empty());
    }

    #[test]
    fn isin_covers_ancestors() {
        let mut machine = machine();
        machine.start().unwrap();

        for name in ["a1x", "a1", "a", "ROOT"] {
            assert!(machine.isin(name), "expected to be in {name}");
        }
        for name in ["a2", "b", "b1", "missing"] {
            assert!(!machine.isin(name), "expected not to be in {name}");
        }
    }

    #[test]
    fn internal_transition_on_composite_keeps_leaf() {
        let definition = DefinitionBuilder::new()
            .state(
                traced("outer")
                    .initial()
                    .on_action("PING", |t: &mut Trace, s: &Signal<'_, ()>| {
                        t.log.push(format!("{} {} via {:?}", s.kind, s.state, s.trigger))
                    }),
            )
            .state(traced("first").parent("outer").initial().on("NEXT", "second"))
            .state(traced("second").parent("outer"))
            .build()
            .unwrap();
        let mut machine = StateMachine::new(Arc::new(definition), Trace::default());
        machine.start().unwrap();
        machine.dispatch("NEXT").unwrap();
        take_log(&mut machine);

        assert_eq!(machine.dispatch("PING"), Ok(true));
        assert_eq!(machine.current_state(), Some("second"));
        assert_eq!(
            take_log(&mut machine),
            vec!["ACTION outer via Some(\"PING\")"]
        );
    }

    #[test]
    fn signals_carry_trigger_and_payload() {
        #[derive(Default)]
        struct Seen {
            entries: Vec<(String, Option<String>, Option<u32>)>,
        }

        let record = |seen: &mut Seen, s: &Signal<'_, u32>| {
            seen.entries.push((
                s.state.to_string(),
                s.trigger.map(str::to_string),
                s.payload.copied(),
            ))
        };
        let definition = DefinitionBuilder::new()
            .state(
                StateDescriptor::new("idle")
                    .initial()
                    .on_entry(record)
                    .on("GO", "running"),
            )
            .state(StateDescriptor::new("running").on_entry(record))
            .build()
            .unwrap();
        let mut machine = StateMachine::new(Arc::new(definition), Seen::default());
        machine.start().unwrap();
        machine.dispatch_with("GO", &42).unwrap();

        assert_eq!(
            machine.into_context().entries,
            vec![
                ("idle".to_string(), None, None),
                ("running".to_string(), Some("GO".to_string()), Some(42)),
            ]
        );
    }

    #[test]
    fn root_without_default_child_stays_at_root() {
        let definition = DefinitionBuilder::<Trace>::new()
            .state(traced("idle").on("WAKE", "idle"))
            .build()
            .unwrap();
        let mut machine = StateMachine::new(Arc::new(definition), Trace::default());
        machine.start().unwrap();

        assert_eq!(machine.current_state(), Some("ROOT"));
        assert!(machine.isin("ROOT"));
        assert!(machine.context().log.is_empty());
        assert_eq!(machine.dispatch("WAKE"), Ok(false));
    }

    #[test]
    fn journal_records_handled_events() {
        let mut machine = machine().with_journal();
        machine.start().unwrap();
        machine.dispatch("TO_A2").unwrap();
        machine.dispatch("TO_B").unwrap();
        machine.dispatch("IGNORED").unwrap();

        let journal = machine.journal().unwrap();
        assert_eq!(journal.path(), vec!["a1x", "a2", "b1"]);
        assert_eq!(journal.records()[1].trigger, "TO_B");
    }

    #[test]
    fn stop_leaves_state_untouched() {
        let mut machine = machine();
        machine.start().unwrap();
        machine.stop();

        assert_eq!(machine.current_state(), Some("a1x"));
    }
}
