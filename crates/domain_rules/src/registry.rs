//! Versioned rule registry

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::CatalogError;
use crate::rule::AuditRule;
use crate::rules::{
    CodeValidityRule, DocumentationRule, DuplicateBillingRule, FeeScheduleRule,
    MedicalNecessityRule, SameDayTimingRule, UnbundlingRule, UpcodingRule,
};

/// Ordered rule sets keyed by version
#[derive(Clone, Default)]
pub struct RuleRegistry {
    versions: BTreeMap<String, Vec<Arc<dyn AuditRule>>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let versions: BTreeMap<&str, Vec<&'static str>> = self
            .versions
            .iter()
            .map(|(v, rules)| (v.as_str(), rules.iter().map(|r| r.code()).collect()))
            .collect();
        f.debug_struct("RuleRegistry").field("versions", &versions).finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard SBS rule sets
    ///
    /// - "1.0": SBS001 to SBS003
    /// - "2.0": every standard rule
    pub fn standard() -> Self {
        let base: Vec<Arc<dyn AuditRule>> = vec![
            Arc::new(CodeValidityRule),
            Arc::new(MedicalNecessityRule),
            Arc::new(DocumentationRule),
        ];
        let mut full = base.clone();
        full.extend([
            Arc::new(UnbundlingRule) as Arc<dyn AuditRule>,
            Arc::new(UpcodingRule),
            Arc::new(DuplicateBillingRule),
            Arc::new(FeeScheduleRule),
            Arc::new(SameDayTimingRule),
        ]);

        let mut registry = Self::new();
        registry.register("1.0", base);
        registry.register("2.0", full);
        registry
    }

    /// Registers (or replaces) the rule set for a version
    pub fn register(&mut self, version: impl Into<String>, rules: Vec<Arc<dyn AuditRule>>) {
        let version = version.into();
        debug!(version = %version, rules = rules.len(), "Registered rule set");
        self.versions.insert(version, rules);
    }

    /// Ordered rules of a version
    pub fn rules_for(&self, version: &str) -> Result<Vec<Arc<dyn AuditRule>>, CatalogError> {
        self.versions
            .get(version.trim())
            .cloned()
            .ok_or_else(|| CatalogError::UnknownVersion(version.to_string()))
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(version.trim())
    }

    /// Registered versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(registry: &RuleRegistry, version: &str) -> Vec<&'static str> {
        registry
            .rules_for(version)
            .unwrap()
            .iter()
            .map(|r| r.code())
            .collect()
    }

    #[test]
    fn test_version_one_registers_base_rules() {
        let registry = RuleRegistry::standard();
        assert_eq!(codes(&registry, "1.0"), vec!["SBS001", "SBS002", "SBS003"]);
    }

    #[test]
    fn test_version_two_registers_all_rules() {
        let registry = RuleRegistry::standard();
        let all = codes(&registry, "2.0");
        assert_eq!(all.len(), 8);
        assert_eq!(all.last(), Some(&"SBS005"));
    }

    #[test]
    fn test_unknown_version() {
        let registry = RuleRegistry::standard();
        assert!(matches!(
            registry.rules_for("9.9"),
            Err(CatalogError::UnknownVersion(_))
        ));
        assert!(!registry.has_version("9.9"));
        assert_eq!(registry.versions().collect::<Vec<_>>(), vec!["1.0", "2.0"]);
    }
}
