//! Declarative chart documents.

use crate::builder::{BuildError, Definition, DefinitionBuilder, StateDescriptor, TransitionSpec};
use crate::config::registry::ActionRegistry;
use crate::core::{Action, ConfigError, Guard, ROOT};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

fn root_name() -> String {
    ROOT.to_string()
}

fn is_root(parent: &str) -> bool {
    parent == ROOT
}

/// A whole chart, keyed by state name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    #[serde(deserialize_with = "unique_states")]
    pub states: BTreeMap<String, StateConfig>,
}

/// One state of a chart document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "root_name", skip_serializing_if = "is_root")]
    pub parent: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_entry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_exit: Option<String>,
    #[serde(
        default,
        deserialize_with = "unique_triggers",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub on: BTreeMap<String, TargetConfig>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            parent: root_name(),
            initial: false,
            on_entry: None,
            on_exit: None,
            on: BTreeMap::new(),
        }
    }
}

/// What a trigger maps to: a bare state name, or a detailed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TargetConfig {
    State(String),
    Detailed(TransitionConfig),
}

impl<'de> Deserialize<'de> for TargetConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TargetVisitor;

        impl<'de> Visitor<'de> for TargetVisitor {
            type Value = TargetConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a state name or a transition object")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TargetConfig::State(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(TargetConfig::State(value))
            }

            // Delegating keeps `deny_unknown_fields` errors naming the field.
            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                TransitionConfig::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(TargetConfig::Detailed)
            }
        }

        deserializer.deserialize_any(TargetVisitor)
    }
}

/// Detailed transition. Without `target` it is internal and needs `action`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl ChartConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Document(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::Document(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Document(e.to_string()))
    }

    /// Turn the document into descriptors, resolving every callback name
    /// against `registry`. All unknown names are reported together.
    pub fn descriptors<C, P>(
        &self,
        registry: &ActionRegistry<C, P>,
    ) -> Result<Vec<StateDescriptor<C, P>>, BuildError> {
        let mut errors = Vec::new();
        let mut descriptors = Vec::with_capacity(self.states.len());

        for (name, state) in &self.states {
            let mut descriptor =
                StateDescriptor::new(name.as_str()).parent(state.parent.as_str());
            descriptor.is_default = state.initial;
            descriptor.on_entry =
                resolve_action(registry, state.on_entry.as_deref(), name, &mut errors);
            descriptor.on_exit =
                resolve_action(registry, state.on_exit.as_deref(), name, &mut errors);

            for (trigger, target) in &state.on {
                let spec = match target {
                    TargetConfig::State(dest) => {
                        TransitionSpec::to(trigger.as_str(), dest.as_str())
                    }
                    TargetConfig::Detailed(detail) => TransitionSpec {
                        trigger: trigger.clone(),
                        target: detail.target.clone(),
                        action: resolve_action(
                            registry,
                            detail.action.as_deref(),
                            name,
                            &mut errors,
                        ),
                        guard: resolve_guard(registry, detail.guard.as_deref(), name, &mut errors),
                    },
                };
                descriptor.transitions.push(spec);
            }

            descriptors.push(descriptor);
        }

        if errors.is_empty() {
            Ok(descriptors)
        } else {
            Err(BuildError::new(errors))
        }
    }

    /// Resolve callbacks and compile the chart in one step.
    pub fn compile<C, P>(
        &self,
        registry: &ActionRegistry<C, P>,
    ) -> Result<Definition<C, P>, BuildError> {
        DefinitionBuilder::new()
            .states(self.descriptors(registry)?)
            .build()
    }
}

fn unique_states<'de, D>(deserializer: D) -> Result<BTreeMap<String, StateConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(UniqueKeys::new("State"))
}

fn unique_triggers<'de, D>(deserializer: D) -> Result<BTreeMap<String, TargetConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(UniqueKeys::new("Trigger"))
}

/// Map visitor that fails on a repeated key instead of keeping the last
/// value.
struct UniqueKeys<V> {
    what: &'static str,
    marker: PhantomData<V>,
}

impl<V> UniqueKeys<V> {
    fn new(what: &'static str) -> Self {
        Self {
            what,
            marker: PhantomData,
        }
    }
}

impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
    type Value = BTreeMap<String, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of {} names", self.what.to_lowercase())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some(key) = access.next_key::<String>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!(
                    "{} '{}' is declared more than once",
                    self.what, key
                )));
            }
            let value = access.next_value()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

fn resolve_action<C, P>(
    registry: &ActionRegistry<C, P>,
    name: Option<&str>,
    state: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<Action<C, P>> {
    let name = name?;
    let action = registry.action(name).cloned();
    if action.is_none() {
        errors.push(ConfigError::UnknownAction {
            name: name.to_string(),
            state: state.to_string(),
        });
    }
    action
}

fn resolve_guard<C, P>(
    registry: &ActionRegistry<C, P>,
    name: Option<&str>,
    state: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<Guard<C, P>> {
    let name = name?;
    let guard = registry.guard(name).cloned();
    if guard.is_none() {
        errors.push(ConfigError::UnknownGuard {
            name: name.to_string(),
            state: state.to_string(),
        });
    }
    guard
}
