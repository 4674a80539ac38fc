//! Registration policy: service key and lifetime for a classified candidate.

use crate::candidate::Candidate;
use crate::classifier::Classification;
use crate::contracts::{AsyncDispose, Dispose};
use crate::key::TypeKey;
use crate::lifetime::ServiceLifetime;

/// Resolved `(service key, lifetime)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub service: TypeKey,
    pub lifetime: ServiceLifetime,
}

/// Resolve the primary registration for a convention or marker match.
///
/// Returns `None` for hosted classifications, which are not keyed.
pub fn resolve(candidate: &Candidate, classification: &Classification) -> Option<Resolution> {
    match classification {
        Classification::Marker(marker) => {
            let service = match marker.key {
                Some(key) => key,
                None if marker.as_self => candidate.key(),
                None => primary_capability(candidate),
            };
            Some(Resolution {
                service,
                lifetime: marker.lifetime,
            })
        }
        Classification::Convention(rule) => Some(Resolution {
            service: primary_capability(candidate),
            lifetime: rule.lifetime,
        }),
        Classification::Hosted { .. } => None,
    }
}

/// First declared capability, or the candidate itself.
pub fn primary_capability(candidate: &Candidate) -> TypeKey {
    candidate.first_capability().unwrap_or_else(|| candidate.key())
}

/// Disposal capabilities owned by the framework; never used as keys by fan-out.
pub fn disposal_capabilities() -> [TypeKey; 2] {
    [TypeKey::of::<dyn Dispose>(), TypeKey::of::<dyn AsyncDispose>()]
}

/// Disposal capabilities match with or without extra bounds (`dyn Dispose + Send`).
pub fn is_excluded_capability(key: TypeKey) -> bool {
    disposal_capabilities().iter().any(|d| d.same_primary(&key)) || key.is_platform()
}

/// Every declared capability eligible for fan-out registration, in order.
pub fn fan_out_keys(candidate: &Candidate) -> impl Iterator<Item = TypeKey> + '_ {
    candidate
        .capabilities()
        .iter()
        .copied()
        .filter(|k| !is_excluded_capability(*k))
}
