//! Compiling descriptors into an immutable, shareable definition.

use crate::builder::descriptor::{StateDescriptor, TransitionSpec};
use crate::builder::error::BuildError;
use crate::core::{
    ConfigError, StateActions, StateTree, StateTreeBuilder, Transition, TransitionTable, VertexId,
};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

/// A compiled chart: the state tree, its transitions and the entry/exit
/// actions of every state.
///
/// A definition is immutable and `Send + Sync` whenever its context and
/// payload types allow it, so one `Arc<Definition>` can back any number of
/// [`StateMachine`](crate::machine::StateMachine)s.
pub struct Definition<C, P = ()> {
    tree: StateTree,
    transitions: TransitionTable<C, P>,
    actions: Vec<StateActions<C, P>>,
}

impl<C, P> Definition<C, P> {
    pub fn builder() -> DefinitionBuilder<C, P> {
        DefinitionBuilder::new()
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn transitions(&self) -> &TransitionTable<C, P> {
        &self.transitions
    }

    /// Entry and exit actions of `vertex`.
    pub fn actions(&self, vertex: VertexId) -> &StateActions<C, P> {
        &self.actions[vertex.index()]
    }

    /// Find the transition that handles `trigger` when `from` is active.
    ///
    /// Starting at `from`, each vertex up to and including the root is
    /// asked in turn; the first one with a matching transition whose guard
    /// passes wins.
    pub fn find_handler(
        &self,
        trigger: &str,
        from: VertexId,
        context: &C,
        payload: Option<&P>,
    ) -> Option<&Transition<C, P>> {
        self.tree.ancestors(from).find_map(|vertex| {
            self.transitions
                .lookup(trigger, vertex)
                .filter(|transition| transition.can_fire(context, payload))
        })
    }
}

/// Collects descriptors and compiles them into a [`Definition`].
///
/// # Example
///
/// ```rust
/// use nested::builder::{DefinitionBuilder, StateDescriptor};
///
/// let definition = DefinitionBuilder::<(), ()>::new()
///     .state(StateDescriptor::new("red").initial().on("TIMER", "green"))
///     .state(StateDescriptor::new("green").on("TIMER", "red"))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.tree().len(), 3);
/// assert_eq!(definition.transitions().len(), 2);
/// ```
pub struct DefinitionBuilder<C, P = ()> {
    states: Vec<StateDescriptor<C, P>>,
}

impl<C, P> DefinitionBuilder<C, P> {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn state(mut self, descriptor: StateDescriptor<C, P>) -> Self {
        self.states.push(descriptor);
        self
    }

    pub fn states(mut self, descriptors: impl IntoIterator<Item = StateDescriptor<C, P>>) -> Self {
        self.states.extend(descriptors);
        self
    }

    /// Compile the chart.
    ///
    /// Structure is checked first (names, parents, defaults); transitions
    /// are only registered once the tree itself is sound. Within each phase
    /// every problem is reported, not just the first.
    pub fn build(self) -> Result<Definition<C, P>, BuildError> {
        let mut builder = StateTreeBuilder::new();

        let mut checks: Vec<Check> = self
            .states
            .iter()
            .map(|state| {
                as_check(
                    builder
                        .add_vertex(&state.name, &state.parent, state.is_default)
                        .map(|_| ()),
                )
            })
            .collect();
        checks.extend(builder.unresolved().into_iter().map(Validation::fail));
        accumulate(checks)?;

        let tree = builder.finalize()?;

        let mut actions = vec![StateActions::default(); tree.len()];
        let mut transitions = TransitionTable::new();
        let mut checks: Vec<Check> = Vec::new();
        for state in self.states {
            let Some(source) = tree.find(&state.name) else {
                continue;
            };
            actions[source.index()] = StateActions {
                on_entry: state.on_entry,
                on_exit: state.on_exit,
            };
            for spec in state.transitions {
                checks.push(as_check(register(
                    &tree,
                    &mut transitions,
                    source,
                    &state.name,
                    spec,
                )));
            }
        }
        accumulate(checks)?;

        tracing::debug!(
            states = tree.len() - 1,
            transitions = transitions.len(),
            "Compiled state chart"
        );

        Ok(Definition {
            tree,
            transitions,
            actions,
        })
    }
}

impl<C, P> Default for DefinitionBuilder<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

fn register<C, P>(
    tree: &StateTree,
    table: &mut TransitionTable<C, P>,
    source: VertexId,
    state: &str,
    spec: TransitionSpec<C, P>,
) -> Result<(), ConfigError> {
    let TransitionSpec {
        trigger,
        target,
        action,
        guard,
    } = spec;

    let mut transition = match (target, action) {
        (Some(target), action) => {
            let dest = tree.find(&target).ok_or_else(|| ConfigError::UnknownState {
                name: target,
                referenced_by: state.to_string(),
            })?;
            let transition = Transition::new(trigger, source, dest);
            match action {
                Some(action) => transition.with_action(action),
                None => transition,
            }
        }
        (None, Some(action)) => Transition::internal(trigger, source, action),
        (None, None) => {
            return Err(ConfigError::MissingTarget {
                trigger,
                state: state.to_string(),
            })
        }
    };
    transition.guard = guard;

    table.register(tree, transition)
}

fn as_check(result: Result<(), ConfigError>) -> Check {
    match result {
        Ok(()) => Validation::success(()),
        Err(error) => Validation::fail(error),
    }
}

/// Collapse accumulated checks, keeping ALL failures.
fn accumulate(checks: Vec<Check>) -> Result<(), BuildError> {
    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(BuildError::new(errors.iter().cloned().collect())),
    }
}
