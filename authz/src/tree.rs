//! The field-to-rule mapping consulted for every resolution.

use crate::rule::Rule;
use crate::types::FieldKey;
use std::collections::BTreeMap;
use tracing::warn;

/// Immutable mapping from schema fields to their permission rules.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct RuleTree {
    rules: BTreeMap<FieldKey, Rule>,
    fallback: Rule,
}

impl RuleTree {
    pub fn builder() -> RuleTreeBuilder {
        RuleTreeBuilder::default()
    }

    /// The rule for `field`, or the fallback when the field is not listed.
    pub fn rule_for(&self, field: &FieldKey) -> &Rule {
        match self.rules.get(field) {
            Some(rule) => rule,
            None => {
                warn!("No permission rule for {}, applying fallback", field);
                &self.fallback
            }
        }
    }

    pub fn contains(&self, field: &FieldKey) -> bool {
        self.rules.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldKey> {
        self.rules.keys()
    }

    /// The fields in `schema` that have no explicit rule.
    pub fn unlisted<'a>(&self, schema: &'a [FieldKey]) -> Vec<&'a FieldKey> {
        schema.iter().filter(|field| !self.contains(field)).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug)]
pub struct RuleTreeBuilder {
    rules: BTreeMap<FieldKey, Rule>,
    fallback: Rule,
}

impl Default for RuleTreeBuilder {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            fallback: Rule::Deny,
        }
    }
}

impl RuleTreeBuilder {
    /// Sets the rule for `type_name.field_name`, replacing any earlier one.
    pub fn field(mut self, type_name: &str, field_name: &str, rule: Rule) -> Self {
        let key = FieldKey::new(type_name, field_name);
        if self.rules.insert(key.clone(), rule).is_some() {
            warn!("Permission rule for {} defined twice, keeping the last one", key);
        }
        self
    }

    /// The rule applied to fields with no entry. Defaults to `Deny`.
    pub fn fallback(mut self, rule: Rule) -> Self {
        self.fallback = rule;
        self
    }

    pub fn build(self) -> RuleTree {
        RuleTree {
            rules: self.rules,
            fallback: self.fallback,
        }
    }
}
