// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! eksctl ClusterConfig document as a YAML tree.

use crate::constants::spec_keys::MANAGED_NODE_GROUPS;
use crate::error::{ProvisionerError, Result};
use serde_yaml::{Mapping, Sequence, Value};

/// Full provisioning specification handed to `eksctl create cluster -f`.
///
/// Kept as an untyped tree: eksctl owns the schema and the document must
/// round-trip fields this crate knows nothing about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSpecDocument(Mapping);

impl ClusterSpecDocument {
    /// Parse a YAML document whose root must be a mapping
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| ProvisionerError::SpecParse(format!("invalid YAML: {}", e)))?;

        match value {
            Value::Mapping(mapping) => Ok(Self(mapping)),
            Value::Null => Err(ProvisionerError::SpecParse(
                "spec document is empty".to_string(),
            )),
            _ => Err(ProvisionerError::SpecParse(
                "spec document root is not a mapping".to_string(),
            )),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0).map_err(|e| ProvisionerError::SpecParse(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Nested mapping under `key`, created (or replacing a non-mapping value) when needed
    pub fn mapping_mut(&mut self, key: &str) -> &mut Mapping {
        let entry = self
            .0
            .entry(Value::String(key.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !entry.is_mapping() {
            *entry = Value::Mapping(Mapping::new());
        }
        match entry {
            Value::Mapping(mapping) => mapping,
            _ => unreachable!("entry was just made a mapping"),
        }
    }

    pub fn managed_node_groups(&self) -> Option<&Sequence> {
        self.0.get(MANAGED_NODE_GROUPS).and_then(Value::as_sequence)
    }

    pub fn managed_node_groups_mut(&mut self) -> Option<&mut Sequence> {
        self.0
            .get_mut(MANAGED_NODE_GROUPS)
            .and_then(Value::as_sequence_mut)
    }
}
