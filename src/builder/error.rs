//! Build errors for chart definitions.

use crate::core::ConfigError;
use thiserror::Error;

/// Every configuration problem found while compiling one chart.
///
/// The builder keeps going after the first problem so a broken chart can be
/// fixed in a single pass.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Chart has {} configuration error(s): {}", .errors.len(), join(.errors))]
pub struct BuildError {
    errors: Vec<ConfigError>,
}

impl BuildError {
    pub fn new(errors: Vec<ConfigError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ConfigError> {
        self.errors
    }

    pub fn contains(&self, error: &ConfigError) -> bool {
        self.errors.contains(error)
    }
}

impl From<ConfigError> for BuildError {
    fn from(error: ConfigError) -> Self {
        Self::new(vec![error])
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
