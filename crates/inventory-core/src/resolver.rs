//! Layered variable resolution
//!
//! Variable contributions arrive in layers (site defaults, site globals,
//! per-project, per-site), each layer an ordered list of
//! (pattern, variables) pairs. Within a layer, every contribution whose
//! pattern matches the target's effective parent set is deep-merged in
//! declared order; across layers, later layers override earlier ones. The
//! two-level fold lets defaults be overridden by globals, globals by
//! project-specific values, and those by site-specific values, while pattern
//! applicability is respected at every layer.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::merge::deep_merge;
use crate::pattern::matching_groups;

/// One (match-pattern, variable mapping) pair
#[derive(Debug, Clone)]
pub struct Contribution {
    /// Comma/colon-delimited match-pattern expression
    pub pattern: String,
    /// Arbitrarily nested variable mapping
    pub vars: Value,
}

impl Contribution {
    pub fn new(pattern: impl Into<String>, vars: Value) -> Self {
        Self {
            pattern: pattern.into(),
            vars,
        }
    }

    /// Decode a contributions layer from its document form
    ///
    /// The on-disk form is a YAML sequence of single-entry mappings
    /// (`- pattern: {vars...}`); mappings with several entries contribute one
    /// pair per entry, in document order. A missing document (`None`/null)
    /// is an empty layer.
    pub fn layer_from_value(value: &Value) -> Result<Vec<Contribution>> {
        let mut layer = Vec::new();
        match value {
            Value::Null => {}
            Value::Sequence(items) => {
                for item in items {
                    let mapping = item.as_mapping().ok_or_else(|| {
                        Error::inventory("variable layer entries must be `pattern: vars` mappings")
                    })?;
                    for (pattern, vars) in mapping {
                        let pattern = pattern.as_str().ok_or_else(|| {
                            Error::inventory("variable layer patterns must be strings")
                        })?;
                        layer.push(Contribution::new(pattern, vars.clone()));
                    }
                }
            }
            _ => {
                return Err(Error::inventory(
                    "variable layers must be sequences of `pattern: vars` mappings",
                ));
            }
        }
        Ok(layer)
    }
}

/// Fold one layer's contributions for a target's effective parent set
///
/// Each contribution whose pattern matches at least one of `groups` is
/// deep-merged into the accumulating result, in declared order.
pub fn combine_for_groups(groups: &[String], layer: &[Contribution]) -> Value {
    let mut combined = Value::Mapping(Mapping::new());

    for contribution in layer {
        let matches = matching_groups(&contribution.pattern, groups);
        if !matches.is_empty() {
            tracing::debug!(
                pattern = contribution.pattern,
                matched = ?matches,
                "applying variable contribution"
            );
            deep_merge(&mut combined, &contribution.vars);
        }
    }

    combined
}

/// Fold several layers in precedence order (later layers override earlier)
pub fn resolve_for_groups(groups: &[String], layers: &[&[Contribution]]) -> Value {
    let mut resolved = Value::Mapping(Mapping::new());
    for layer in layers {
        let combined = combine_for_groups(groups, layer);
        deep_merge(&mut resolved, &combined);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layer(doc: &str) -> Vec<Contribution> {
        Contribution::layer_from_value(&serde_yaml::from_str(doc).unwrap()).unwrap()
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn non_matching_contributions_are_skipped() {
        let layer = layer("[{other: {x: 1}}]");
        let combined = combine_for_groups(&groups(&["p1", "all"]), &layer);
        assert_eq!(combined, serde_yaml::from_str::<Value>("{}").unwrap());
    }

    #[test]
    fn later_contributions_in_a_layer_override_earlier() {
        let layer = layer("[{all: {x: 1}}, {p1: {x: 2}}]");
        let combined = combine_for_groups(&groups(&["p1", "all"]), &layer);
        assert_eq!(combined, serde_yaml::from_str::<Value>("{x: 2}").unwrap());
    }

    #[test]
    fn later_layers_override_earlier_layers() {
        let defaults = layer("[{all: {x: 1}}]");
        let globals = layer("[{p1: {x: 2, y: 1}}]");
        let project = layer("[{p1: {y: 2}}]");

        let resolved = resolve_for_groups(
            &groups(&["p1", "development", "all", "all-projects"]),
            &[&defaults, &globals, &project],
        );

        assert_eq!(
            resolved,
            serde_yaml::from_str::<Value>("{x: 2, y: 2}").unwrap()
        );
    }

    #[test]
    fn null_document_is_an_empty_layer() {
        assert!(
            Contribution::layer_from_value(&Value::Null)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn scalar_layer_document_is_rejected() {
        let err = Contribution::layer_from_value(&serde_yaml::from_str("5").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Inventory { .. }));
    }
}
