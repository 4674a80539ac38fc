//! Auto-registration options and their serializable configuration form.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::lifetime::ServiceLifetime;

/// Suffix-based naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRule {
    pub suffix: String,
    #[serde(default)]
    pub lifetime: ServiceLifetime,
}

impl NamingRule {
    pub fn new(suffix: impl Into<String>, lifetime: ServiceLifetime) -> Self {
        Self {
            suffix: suffix.into(),
            lifetime,
        }
    }

    /// Rules used when the configured list is empty.
    pub fn fallback() -> Vec<NamingRule> {
        vec![
            NamingRule::new("Service", ServiceLifetime::Scoped),
            NamingRule::new("Repository", ServiceLifetime::Singleton),
        ]
    }
}

/// Returns `true` to keep a candidate, `false` to exclude it.
pub type TypeFilter = Arc<dyn Fn(&Candidate) -> bool + Send + Sync>;

/// Which classification strategies run, and with which rules.
#[derive(Clone)]
pub struct AutoRegisterOptions {
    pub convention_rules: Vec<NamingRule>,
    pub type_filter: TypeFilter,
    pub by_convention: bool,
    pub by_marker: bool,
    pub hosted_services: bool,
    /// Fan a marked service out to every declared capability.
    pub interfaces: bool,
}

impl Default for AutoRegisterOptions {
    fn default() -> Self {
        Self {
            convention_rules: vec![
                NamingRule::new("Service", ServiceLifetime::Singleton),
                NamingRule::new("Repository", ServiceLifetime::Singleton),
            ],
            type_filter: exclude_prefixes(vec!["Temp".to_string()]),
            by_convention: true,
            by_marker: true,
            hosted_services: true,
            interfaces: true,
        }
    }
}

impl fmt::Debug for AutoRegisterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoRegisterOptions")
            .field("convention_rules", &self.convention_rules)
            .field("by_convention", &self.by_convention)
            .field("by_marker", &self.by_marker)
            .field("hosted_services", &self.hosted_services)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

impl AutoRegisterOptions {
    /// Marker and hosted-service strategies only; no conventions, no fan-out.
    pub fn markers_only() -> Self {
        Self {
            by_convention: false,
            interfaces: false,
            ..Self::default()
        }
    }

    pub fn with_type_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Candidate) -> bool + Send + Sync + 'static,
    {
        self.type_filter = Arc::new(filter);
        self
    }

    pub fn accepts(&self, candidate: &Candidate) -> bool {
        (self.type_filter)(candidate)
    }

    /// Configured rules, or [`NamingRule::fallback`] when none are configured.
    pub fn effective_rules(&self) -> Vec<NamingRule> {
        if self.convention_rules.is_empty() {
            NamingRule::fallback()
        } else {
            self.convention_rules.clone()
        }
    }
}

/// Filter that drops candidates whose short name starts with any prefix.
pub fn exclude_prefixes(prefixes: Vec<String>) -> TypeFilter {
    Arc::new(move |c: &Candidate| {
        let name = c.short_name();
        !prefixes.iter().any(|p| name.starts_with(p.as_str()))
    })
}

/// Serializable form of [`AutoRegisterOptions`], the `services` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoRegisterConfig {
    pub by_convention: bool,
    pub by_marker: bool,
    pub hosted_services: bool,
    pub interfaces: bool,
    pub convention_rules: Vec<NamingRule>,
    pub exclude_prefixes: Vec<String>,
}

impl Default for AutoRegisterConfig {
    fn default() -> Self {
        let defaults = AutoRegisterOptions::default();
        Self {
            by_convention: defaults.by_convention,
            by_marker: defaults.by_marker,
            hosted_services: defaults.hosted_services,
            interfaces: defaults.interfaces,
            convention_rules: defaults.convention_rules,
            exclude_prefixes: vec!["Temp".to_string()],
        }
    }
}

impl From<AutoRegisterConfig> for AutoRegisterOptions {
    fn from(cfg: AutoRegisterConfig) -> Self {
        Self {
            convention_rules: cfg.convention_rules,
            type_filter: exclude_prefixes(cfg.exclude_prefixes),
            by_convention: cfg.by_convention,
            by_marker: cfg.by_marker,
            hosted_services: cfg.hosted_services,
            interfaces: cfg.interfaces,
        }
    }
}
