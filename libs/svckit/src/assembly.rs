use std::collections::BTreeMap;

use crate::candidate::Candidate;

/// Submitted by the attribute macros via `inventory::submit!`.
pub struct CandidateRegistrator {
    /// `module_path!()` of the declaring item; its first segment is the crate.
    pub module_path: &'static str,
    pub build: fn() -> Candidate,
}

impl CandidateRegistrator {
    pub const fn new(module_path: &'static str, build: fn() -> Candidate) -> Self {
        Self { module_path, build }
    }

    pub fn crate_name(&self) -> &'static str {
        crate_of(self.module_path)
    }
}

inventory::collect!(CandidateRegistrator);

fn crate_of(module_path: &str) -> &str {
    module_path.split("::").next().unwrap_or(module_path)
}

/// A named set of candidate types, the unit the registrar walks.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    name: String,
    candidates: Vec<Candidate>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Every macro-declared candidate linked into the binary, one assembly per crate.
    ///
    /// Inventory iteration order is unspecified, so assemblies are sorted by
    /// crate name and candidates by module path, then type name.
    pub fn discover() -> Vec<Assembly> {
        let mut by_crate: BTreeMap<&'static str, Vec<(&'static str, Candidate)>> =
            BTreeMap::new();
        for r in inventory::iter::<CandidateRegistrator> {
            by_crate
                .entry(r.crate_name())
                .or_default()
                .push((r.module_path, (r.build)()));
        }

        let assemblies: Vec<Assembly> = by_crate
            .into_iter()
            .map(|(name, mut entries)| {
                entries.sort_by(|(pa, a), (pb, b)| {
                    pa.cmp(pb).then_with(|| a.key().name().cmp(b.key().name()))
                });
                Assembly {
                    name: name.to_string(),
                    candidates: entries.into_iter().map(|(_, c)| c).collect(),
                }
            })
            .collect();

        tracing::debug!(
            assemblies = ?assemblies.iter().map(|a| a.name()).collect::<Vec<_>>(),
            "Discovered candidate assemblies"
        );
        assemblies
    }

    /// Candidates declared by a single crate (`env!("CARGO_CRATE_NAME")`).
    ///
    /// Returns an empty assembly when the crate declared nothing.
    pub fn discover_crate(crate_name: &str) -> Assembly {
        Self::discover()
            .into_iter()
            .find(|a| a.name == crate_name)
            .unwrap_or_else(|| Assembly::new(crate_name))
    }
}

/// Register a capability declaration (`dyn Trait`) with the inventory.
///
/// Capability declarations are candidates too, but they are only ever used
/// as registration keys.
#[macro_export]
macro_rules! declare_capability {
    ($cap:ty) => {
        const _: () = {
            fn __svckit_capability() -> $crate::Candidate {
                $crate::Candidate::capability::<$cap>()
            }
            $crate::inventory::submit! {
                $crate::assembly::CandidateRegistrator::new(module_path!(), __svckit_capability)
            }
        };
    };
}
