//! Type classifier: decides which strategy, if any, picks up a candidate.

use thiserror::Error;

use crate::candidate::{Candidate, HostedFactory, HostedServiceMarker, ServiceMarker};
use crate::contracts::HostedService;
use crate::key::TypeKey;
use crate::options::{AutoRegisterOptions, NamingRule};

/// Why a candidate was picked up.
#[derive(Clone)]
pub enum Classification {
    /// Matched a naming rule by suffix.
    Convention(NamingRule),
    /// Carries a service marker.
    Marker(ServiceMarker),
    /// Implements `HostedService` or carries a hosted-service marker.
    Hosted {
        marker: HostedServiceMarker,
        factory: HostedFactory,
    },
}

impl std::fmt::Debug for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Convention(rule) => f.debug_tuple("Convention").field(rule).finish(),
            Classification::Marker(marker) => f.debug_tuple("Marker").field(marker).finish(),
            Classification::Hosted { marker, .. } => f
                .debug_struct("Hosted")
                .field("marker", marker)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classified<'a> {
    pub candidate: &'a Candidate,
    pub classification: Classification,
}

/// Per-candidate classification failure; the candidate is skipped.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("service key '{key}' is neither '{implementation}' nor one of its declared capabilities")]
    KeyNotImplemented {
        implementation: TypeKey,
        key: TypeKey,
    },
    #[error("hosted service '{implementation}' has no factory")]
    MissingHostedFactory { implementation: TypeKey },
}

impl ClassifyError {
    pub fn candidate(&self) -> TypeKey {
        match self {
            ClassifyError::KeyNotImplemented { implementation, .. }
            | ClassifyError::MissingHostedFactory { implementation } => *implementation,
        }
    }
}

/// Classify candidates with every strategy enabled in `options`.
///
/// Results are grouped by strategy (convention, marker, hosted) and keep
/// candidate order inside each group; the registrar relies on this order
/// for first-writer-wins.
pub fn classify<'a>(
    candidates: &'a [Candidate],
    options: &AutoRegisterOptions,
) -> Vec<Result<Classified<'a>, ClassifyError>> {
    let eligible: Vec<&'a Candidate> = candidates
        .iter()
        .filter(|c| c.is_registration_target())
        .filter(|c| {
            let keep = options.accepts(c);
            if !keep {
                tracing::trace!(candidate = c.key().name(), "Excluded by type filter");
            }
            keep
        })
        .collect();

    let mut out = Vec::new();

    if options.by_convention {
        let rules = normalize_rules(&options.effective_rules());
        for &c in &eligible {
            if let Some(rule) = match_convention(c, &rules) {
                out.push(Ok(Classified {
                    candidate: c,
                    classification: Classification::Convention(rule.clone()),
                }));
            }
        }
    }

    if options.by_marker {
        for &c in &eligible {
            if let Some(marker) = c.service() {
                out.push(classify_marker(c, *marker));
            }
        }
    }

    if options.hosted_services {
        for &c in &eligible {
            if let Some(r) = classify_hosted(c) {
                out.push(r);
            }
        }
    }

    out
}

fn classify_marker(c: &Candidate, marker: ServiceMarker) -> Result<Classified<'_>, ClassifyError> {
    if let Some(key) = marker.key {
        if key != c.key() && !c.declares(key) {
            return Err(ClassifyError::KeyNotImplemented {
                implementation: c.key(),
                key,
            });
        }
    }
    Ok(Classified {
        candidate: c,
        classification: Classification::Marker(marker),
    })
}

fn classify_hosted(c: &Candidate) -> Option<Result<Classified<'_>, ClassifyError>> {
    let declares_hosted = c.declares_trait(TypeKey::of::<dyn HostedService>());
    if !declares_hosted && c.hosted().is_none() {
        return None;
    }
    let marker = c.hosted().copied().unwrap_or_default();
    let result = match c.hosted_factory() {
        Some(factory) => Ok(Classified {
            candidate: c,
            classification: Classification::Hosted {
                marker,
                factory: factory.clone(),
            },
        }),
        None => Err(ClassifyError::MissingHostedFactory {
            implementation: c.key(),
        }),
    };
    Some(result)
}

/// Drop empty suffixes and collapse case-insensitive duplicates; a later
/// rule for the same suffix replaces the earlier one in place.
fn normalize_rules(rules: &[NamingRule]) -> Vec<NamingRule> {
    let mut out: Vec<NamingRule> = Vec::with_capacity(rules.len());
    for rule in rules.iter().filter(|r| !r.suffix.is_empty()) {
        match out
            .iter_mut()
            .find(|r| r.suffix.eq_ignore_ascii_case(&rule.suffix))
        {
            Some(existing) => existing.lifetime = rule.lifetime,
            None => out.push(rule.clone()),
        }
    }
    out
}

/// Match the naming subject against `rules`; the longest matching suffix wins.
///
/// The subject is the short name of the first declared capability, or of
/// the candidate itself when it declares none.
pub fn match_convention<'r>(candidate: &Candidate, rules: &'r [NamingRule]) -> Option<&'r NamingRule> {
    let subject = candidate
        .first_capability()
        .unwrap_or_else(|| candidate.key())
        .short_name()
        .to_lowercase();

    rules
        .iter()
        .filter(|r| !r.suffix.is_empty() && subject.ends_with(&r.suffix.to_lowercase()))
        .fold(None, |best: Option<&NamingRule>, r| match best {
            Some(b) if b.suffix.chars().count() >= r.suffix.chars().count() => Some(b),
            _ => Some(r),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::HostedService;
    use crate::lifetime::ServiceLifetime;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    trait OrderRepository {}
    trait PaymentGateway {}
    trait Clock {}

    struct OrderService;
    struct SqlOrderRepository;
    struct PaymentService;
    struct AuditHandler;
    struct UserRepositoryService;
    struct Worker;

    #[async_trait::async_trait]
    impl HostedService for Worker {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn only<'a>(results: Vec<Result<Classified<'a>, ClassifyError>>) -> Vec<Classified<'a>> {
        results
            .into_iter()
            .map(|r| r.expect("unexpected classification error"))
            .collect()
    }

    #[test]
    fn suffix_match_is_case_insensitive_and_uses_own_name_without_capabilities() {
        let candidates = vec![Candidate::of::<OrderService>()];
        let opts = AutoRegisterOptions {
            convention_rules: vec![NamingRule::new("SERVICE", ServiceLifetime::Transient)],
            ..AutoRegisterOptions::default()
        };

        let got = only(classify(&candidates, &opts));
        assert_eq!(got.len(), 1);
        match &got[0].classification {
            Classification::Convention(rule) => assert_eq!(rule.lifetime, ServiceLifetime::Transient),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn suffix_match_uses_first_declared_capability_name() {
        // Own name ends with "Repository", but the first capability does not.
        let candidates = vec![Candidate::of::<SqlOrderRepository>()
            .implements::<dyn Clock>()
            .implements::<dyn OrderRepository>()];

        let got = only(classify(&candidates, &AutoRegisterOptions::default()));
        assert!(got.is_empty());

        let candidates = vec![Candidate::of::<AuditHandler>().implements::<dyn OrderRepository>()];
        let got = only(classify(&candidates, &AutoRegisterOptions::default()));
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn longest_matching_suffix_wins_regardless_of_rule_order() {
        let c = Candidate::of::<UserRepositoryService>();
        let rules = vec![
            NamingRule::new("Service", ServiceLifetime::Singleton),
            NamingRule::new("RepositoryService", ServiceLifetime::Scoped),
        ];
        assert_eq!(match_convention(&c, &rules).unwrap().lifetime, ServiceLifetime::Scoped);

        let reversed: Vec<_> = rules.into_iter().rev().collect();
        assert_eq!(match_convention(&c, &reversed).unwrap().lifetime, ServiceLifetime::Scoped);
    }

    #[test]
    fn duplicate_suffix_rules_keep_the_last_lifetime() {
        let rules = normalize_rules(&[
            NamingRule::new("Service", ServiceLifetime::Singleton),
            NamingRule::new("", ServiceLifetime::Transient),
            NamingRule::new("service", ServiceLifetime::Scoped),
        ]);
        assert_eq!(rules, vec![NamingRule::new("Service", ServiceLifetime::Scoped)]);
    }

    #[test]
    fn abstract_capability_and_filtered_candidates_are_excluded_everywhere() {
        let marker = ServiceMarker::default();
        let candidates = vec![
            Candidate::of::<OrderService>().mark_abstract().with_service(marker),
            Candidate::capability::<dyn OrderRepository>().with_service(marker),
            Candidate::of::<PaymentService>().with_service(marker),
        ];
        let opts = AutoRegisterOptions::default()
            .with_type_filter(|c| c.short_name() != "PaymentService");

        assert!(classify(&candidates, &opts).is_empty());
    }

    #[test]
    fn marker_classification_ignores_naming() {
        let candidates = vec![Candidate::of::<Worker>().with_service(ServiceMarker::default())];
        let got = only(classify(&candidates, &AutoRegisterOptions::default()));
        assert_eq!(got.len(), 1);
        assert!(matches!(got[0].classification, Classification::Marker(_)));
    }

    #[test]
    fn explicit_key_must_be_self_or_declared() {
        let bad = vec![Candidate::of::<PaymentService>()
            .with_service(ServiceMarker::default().with_key::<dyn PaymentGateway>())];
        let markers = AutoRegisterOptions::markers_only();
        let results = classify(&bad, &markers);
        match &results[..] {
            [Err(e @ ClassifyError::KeyNotImplemented { .. })] => {
                assert_eq!(e.candidate(), TypeKey::of::<PaymentService>());
            }
            other => panic!("expected KeyNotImplemented, got {other:?}"),
        }

        let good = vec![Candidate::of::<PaymentService>()
            .implements::<dyn PaymentGateway>()
            .with_service(ServiceMarker::default().with_key::<dyn PaymentGateway>())];
        let results = classify(&good, &markers);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Ok(Classified { classification: Classification::Marker(_), .. })
        ));
    }

    #[test]
    fn key_errors_are_reported_beside_convention_matches() {
        let bad = vec![Candidate::of::<PaymentService>()
            .with_service(ServiceMarker::default().with_key::<dyn PaymentGateway>())];
        let results = classify(&bad, &AutoRegisterOptions::default());
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Ok(Classified { classification: Classification::Convention(_), .. })
        ));
        assert!(matches!(results[1], Err(ClassifyError::KeyNotImplemented { .. })));
    }

    #[test]
    fn hosted_capability_with_auto_trait_bounds_is_recognized() {
        let candidates = vec![Candidate::of::<Worker>()
            .implements::<dyn HostedService + Send + Sync>()
            .with_hosted_factory(|| Arc::new(Worker) as Arc<dyn HostedService>)];
        let got = only(classify(&candidates, &AutoRegisterOptions::markers_only()));
        assert_eq!(got.len(), 1);
        assert!(matches!(got[0].classification, Classification::Hosted { .. }));
    }

    #[test]
    fn hosted_by_capability_or_marker() {
        let factory = || Arc::new(Worker) as Arc<dyn HostedService>;
        let candidates = vec![
            Candidate::of::<Worker>()
                .implements::<dyn HostedService>()
                .with_hosted_factory(factory),
            Candidate::of::<AuditHandler>()
                .with_hosted(HostedServiceMarker { run_immediately: true })
                .with_hosted_factory(factory),
        ];

        let opts = AutoRegisterOptions {
            by_convention: false,
            ..AutoRegisterOptions::default()
        };
        let got = only(classify(&candidates, &opts));
        let markers: Vec<_> = got
            .iter()
            .map(|c| match &c.classification {
                Classification::Hosted { marker, .. } => marker.run_immediately,
                other => panic!("unexpected classification: {other:?}"),
            })
            .collect();
        assert_eq!(markers, vec![false, true]);
    }

    #[test]
    fn hosted_without_factory_is_an_error() {
        let candidates = vec![Candidate::of::<Worker>().implements::<dyn HostedService>()];
        let opts = AutoRegisterOptions {
            by_convention: false,
            ..AutoRegisterOptions::default()
        };
        let results = classify(&candidates, &opts);
        assert!(matches!(
            &results[..],
            [Err(ClassifyError::MissingHostedFactory { .. })]
        ));
    }

    #[test]
    fn strategies_can_be_disabled_independently() {
        let factory = || Arc::new(Worker) as Arc<dyn HostedService>;
        let candidates = vec![
            Candidate::of::<OrderService>(),
            Candidate::of::<PaymentService>().with_service(ServiceMarker::default()),
            Candidate::of::<Worker>()
                .implements::<dyn HostedService>()
                .with_hosted_factory(factory),
        ];
        let all = AutoRegisterOptions::default();
        // PaymentService matches the convention and the marker; Worker's first
        // capability `HostedService` ends with "Service" too.
        assert_eq!(classify(&candidates, &all).len(), 5);

        let no_hosted = AutoRegisterOptions {
            hosted_services: false,
            ..AutoRegisterOptions::default()
        };
        assert!(only(classify(&candidates, &no_hosted))
            .iter()
            .all(|c| !matches!(c.classification, Classification::Hosted { .. })));

        let none = AutoRegisterOptions {
            by_convention: false,
            by_marker: false,
            hosted_services: false,
            ..AutoRegisterOptions::default()
        };
        assert!(classify(&candidates, &none).is_empty());
    }

    #[test]
    fn results_are_grouped_by_strategy() {
        let candidates = vec![
            Candidate::of::<PaymentService>().with_service(ServiceMarker::default()),
            Candidate::of::<OrderService>(),
        ];
        let got = only(classify(&candidates, &AutoRegisterOptions::default()));
        let order: Vec<_> = got
            .iter()
            .map(|c| match c.classification {
                Classification::Convention(_) => ("convention", c.candidate.short_name()),
                Classification::Marker(_) => ("marker", c.candidate.short_name()),
                Classification::Hosted { .. } => ("hosted", c.candidate.short_name()),
            })
            .collect();
        assert_eq!(
            order,
            vec![
                ("convention", "PaymentService"),
                ("convention", "OrderService"),
                ("marker", "PaymentService"),
            ]
        );
    }
}
