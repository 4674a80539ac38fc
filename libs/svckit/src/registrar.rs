//! Registrar: applies classification and policy decisions to a collection.

use crate::assembly::Assembly;
use crate::classifier::{classify, Classification, ClassifyError};
use crate::collection::{HostedServiceDescriptor, ServiceCollection, ServiceDescriptor};
use crate::key::TypeKey;
use crate::options::AutoRegisterOptions;
use crate::policy::{fan_out_keys, resolve};

/// Outcome of one registration pass.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Descriptors actually inserted, in insertion order.
    pub registered: Vec<ServiceDescriptor>,
    /// Hosted implementations actually added.
    pub hosted: Vec<TypeKey>,
    /// Proposals dropped because their key (or hosted implementation) already existed.
    pub duplicates: usize,
    /// Candidates skipped because they could not be classified.
    pub failures: Vec<ClassifyError>,
}

impl RegistrationReport {
    fn merge(&mut self, other: RegistrationReport) {
        self.registered.extend(other.registered);
        self.hosted.extend(other.hosted);
        self.duplicates += other.duplicates;
        self.failures.extend(other.failures);
    }
}

/// Writes into a [`ServiceCollection`] with first-writer-wins semantics.
pub struct Registrar<'s> {
    services: &'s mut ServiceCollection,
    report: RegistrationReport,
}

impl<'s> Registrar<'s> {
    pub fn new(services: &'s mut ServiceCollection) -> Self {
        Self {
            services,
            report: RegistrationReport::default(),
        }
    }

    /// Idempotent insert; a second entry for the same key is a silent no-op.
    pub fn register(&mut self, entry: ServiceDescriptor) -> bool {
        let added = self.services.try_add(entry);
        if added {
            tracing::debug!(registration = %entry, "Registered service");
            self.report.registered.push(entry);
        } else {
            self.report.duplicates += 1;
        }
        added
    }

    pub fn register_hosted(&mut self, descriptor: HostedServiceDescriptor) -> bool {
        let implementation = descriptor.implementation;
        let added = self.services.add_hosted_service(descriptor);
        if added {
            tracing::debug!(implementation = implementation.name(), "Registered hosted service");
            self.report.hosted.push(implementation);
        } else {
            self.report.duplicates += 1;
        }
        added
    }

    /// Run every enabled strategy over one assembly: convention, marker, hosted.
    ///
    /// A candidate that fails classification is logged and skipped; the rest
    /// of the assembly is still processed.
    pub fn register_assembly(&mut self, assembly: &Assembly, options: &AutoRegisterOptions) {
        tracing::info!(
            assembly = assembly.name(),
            candidates = assembly.candidates().len(),
            "Registering services"
        );

        for result in classify(assembly.candidates(), options) {
            let classified = match result {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(
                        assembly = assembly.name(),
                        candidate = err.candidate().name(),
                        error = %err,
                        "Skipping candidate"
                    );
                    self.report.failures.push(err);
                    continue;
                }
            };
            let candidate = classified.candidate;

            match &classified.classification {
                Classification::Hosted { marker, factory } => {
                    self.register_hosted(HostedServiceDescriptor {
                        implementation: candidate.key(),
                        factory: factory.clone(),
                    });
                    if marker.run_immediately {
                        self.services
                            .configure_host(|opts| opts.start_concurrently = true);
                    }
                }
                classification => {
                    let Some(resolution) = resolve(candidate, classification) else {
                        continue;
                    };
                    self.register(ServiceDescriptor::new(
                        resolution.service,
                        candidate.key(),
                        resolution.lifetime,
                    ));

                    if options.interfaces && matches!(classification, Classification::Marker(_)) {
                        for key in fan_out_keys(candidate) {
                            self.register(ServiceDescriptor::new(
                                key,
                                candidate.key(),
                                resolution.lifetime,
                            ));
                        }
                    }
                }
            }
        }
    }

    pub fn finish(self) -> RegistrationReport {
        self.report
    }
}

/// Auto-registration entry points on the service collection.
pub trait SmartServices {
    /// Marker and hosted-service registration over every discovered assembly.
    fn add_smart_services(&mut self) -> RegistrationReport;

    /// Registration with explicit options; an empty `assemblies` slice means
    /// every discovered assembly.
    fn add_smart_services_with(
        &mut self,
        options: &AutoRegisterOptions,
        assemblies: &[Assembly],
    ) -> RegistrationReport;
}

impl SmartServices for ServiceCollection {
    fn add_smart_services(&mut self) -> RegistrationReport {
        self.add_smart_services_with(&AutoRegisterOptions::markers_only(), &[])
    }

    fn add_smart_services_with(
        &mut self,
        options: &AutoRegisterOptions,
        assemblies: &[Assembly],
    ) -> RegistrationReport {
        let discovered;
        let assemblies = if assemblies.is_empty() {
            discovered = Assembly::discover();
            discovered.as_slice()
        } else {
            assemblies
        };

        let mut report = RegistrationReport::default();
        for assembly in assemblies {
            let mut registrar = Registrar::new(self);
            registrar.register_assembly(assembly, options);
            report.merge(registrar.finish());
        }

        tracing::info!(
            registered = report.registered.len(),
            hosted = report.hosted.len(),
            duplicates = report.duplicates,
            failures = report.failures.len(),
            "Service registration complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, HostedServiceMarker, ServiceMarker};
    use crate::contracts::{Dispose, HostedService};
    use crate::lifetime::ServiceLifetime;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    trait OrderRepositoryApi {}
    trait PaymentGateway {}
    trait Refunds {}

    struct OrderRepository;
    struct PaymentService;
    struct TestHostService;

    #[async_trait::async_trait]
    impl HostedService for TestHostService {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn hosted_candidate() -> Candidate {
        Candidate::of::<TestHostService>()
            .implements::<dyn HostedService>()
            .implements::<dyn Dispose>()
            .with_hosted(HostedServiceMarker::default())
            .with_hosted_factory(|| Arc::new(TestHostService) as Arc<dyn HostedService>)
    }

    fn shop() -> Assembly {
        Assembly::new("shop")
            .with_candidate(Candidate::of::<OrderRepository>())
            .with_candidate(
                Candidate::of::<PaymentService>()
                    .implements::<dyn PaymentGateway>()
                    .with_service(
                        ServiceMarker::new(ServiceLifetime::Scoped)
                            .with_key::<dyn PaymentGateway>()
                            .as_self(false),
                    ),
            )
    }

    #[test]
    fn order_repository_and_payment_service_end_to_end() {
        let mut sc = ServiceCollection::new();
        let opts = AutoRegisterOptions {
            convention_rules: vec![crate::options::NamingRule::new(
                "Repository",
                ServiceLifetime::Singleton,
            )],
            ..AutoRegisterOptions::default()
        };
        let report = sc.add_smart_services_with(&opts, &[shop()]);

        assert_eq!(
            sc.descriptors(),
            &[
                ServiceDescriptor::new(
                    TypeKey::of::<OrderRepository>(),
                    TypeKey::of::<OrderRepository>(),
                    ServiceLifetime::Singleton,
                ),
                ServiceDescriptor::new(
                    TypeKey::of::<dyn PaymentGateway>(),
                    TypeKey::of::<PaymentService>(),
                    ServiceLifetime::Scoped,
                ),
            ]
        );
        assert_eq!(report.registered.len(), 2);
        // Fan-out proposed PaymentGateway again and was dropped.
        assert_eq!(report.duplicates, 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn convention_maps_to_first_declared_capability() {
        let asm = Assembly::new("shop")
            .with_candidate(Candidate::of::<OrderRepository>().implements::<dyn OrderRepositoryApi>());
        let opts = AutoRegisterOptions {
            convention_rules: vec![crate::options::NamingRule::new(
                "RepositoryApi",
                ServiceLifetime::Transient,
            )],
            ..AutoRegisterOptions::default()
        };
        let mut sc = ServiceCollection::new();
        sc.add_smart_services_with(&opts, &[asm]);

        let d = sc.get(TypeKey::of::<dyn OrderRepositoryApi>()).unwrap();
        assert_eq!(d.implementation, TypeKey::of::<OrderRepository>());
        assert_eq!(d.lifetime, ServiceLifetime::Transient);
    }

    #[test]
    fn convention_registers_before_marker_so_first_proposal_wins() {
        // PaymentService matches the "Service" convention (as itself, singleton)
        // and carries an as_self marker (scoped): the convention runs first.
        let asm = Assembly::new("shop").with_candidate(
            Candidate::of::<PaymentService>().with_service(ServiceMarker::new(ServiceLifetime::Scoped)),
        );
        let mut sc = ServiceCollection::new();
        let report = sc.add_smart_services_with(&AutoRegisterOptions::default(), &[asm]);

        assert_eq!(sc.len(), 1);
        assert_eq!(
            sc.get(TypeKey::of::<PaymentService>()).unwrap().lifetime,
            ServiceLifetime::Singleton
        );
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn fan_out_registers_every_capability_but_never_disposal() {
        let asm = Assembly::new("billing").with_candidate(
            Candidate::of::<PaymentService>()
                .implements::<dyn PaymentGateway>()
                .implements::<dyn Dispose>()
                .implements::<dyn Refunds>()
                .with_service(ServiceMarker::new(ServiceLifetime::Transient)),
        );
        let opts = AutoRegisterOptions {
            by_convention: false,
            ..AutoRegisterOptions::default()
        };
        let mut sc = ServiceCollection::new();
        sc.add_smart_services_with(&opts, &[asm.clone()]);

        let keys: Vec<_> = sc.descriptors().iter().map(|d| d.service).collect();
        assert_eq!(
            keys,
            vec![
                TypeKey::of::<PaymentService>(),
                TypeKey::of::<dyn PaymentGateway>(),
                TypeKey::of::<dyn Refunds>(),
            ]
        );
        assert!(!sc.contains(TypeKey::of::<dyn Dispose>()));
        assert!(sc
            .descriptors()
            .iter()
            .all(|d| d.lifetime == ServiceLifetime::Transient));

        let mut without = ServiceCollection::new();
        let opts = AutoRegisterOptions {
            by_convention: false,
            interfaces: false,
            ..AutoRegisterOptions::default()
        };
        without.add_smart_services_with(&opts, &[asm]);
        assert_eq!(without.len(), 1);
    }

    #[test]
    fn disabling_hosted_services_registers_none() {
        let asm = Assembly::new("host").with_candidate(hosted_candidate());
        let opts = AutoRegisterOptions {
            hosted_services: false,
            ..AutoRegisterOptions::default()
        };
        let mut sc = ServiceCollection::new();
        let report = sc.add_smart_services_with(&opts, &[asm]);

        assert!(sc.hosted_services().is_empty());
        assert!(report.hosted.is_empty());
    }

    #[test]
    fn hosted_services_registered_once_across_assemblies() {
        let asm = Assembly::new("host").with_candidate(hosted_candidate());
        let opts = AutoRegisterOptions::markers_only();
        let mut sc = ServiceCollection::new();
        let report = sc.add_smart_services_with(&opts, &[asm.clone(), asm]);

        assert_eq!(sc.hosted_services().len(), 1);
        assert_eq!(report.hosted, vec![TypeKey::of::<TestHostService>()]);
        assert!(!sc.host_options().start_concurrently);
    }

    #[test]
    fn run_immediately_switches_host_to_concurrent_start() {
        let asm = Assembly::new("host").with_candidate(
            hosted_candidate().with_hosted(HostedServiceMarker {
                run_immediately: true,
            }),
        );
        let mut sc = ServiceCollection::new();
        sc.add_smart_services_with(&AutoRegisterOptions::markers_only(), &[asm]);
        assert!(sc.host_options().start_concurrently);
    }

    #[test]
    fn failing_candidate_is_skipped_and_the_batch_continues() {
        let asm = Assembly::new("mixed")
            .with_candidate(
                // Explicit key the type does not declare.
                Candidate::of::<PaymentService>()
                    .with_service(ServiceMarker::default().with_key::<dyn PaymentGateway>()),
            )
            .with_candidate(Candidate::of::<OrderRepository>().with_service(ServiceMarker::default()))
            .with_candidate(
                // Hosted without a factory.
                Candidate::of::<TestHostService>().with_hosted(HostedServiceMarker::default()),
            );

        let mut sc = ServiceCollection::new();
        let report = sc.add_smart_services_with(&AutoRegisterOptions::markers_only(), &[asm]);

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].candidate(), TypeKey::of::<PaymentService>());
        assert_eq!(report.failures[1].candidate(), TypeKey::of::<TestHostService>());
        assert!(sc.contains(TypeKey::of::<OrderRepository>()));
        assert_eq!(sc.len(), 1);
    }

    #[test]
    fn registrar_register_is_idempotent() {
        let mut sc = ServiceCollection::new();
        let mut registrar = Registrar::new(&mut sc);
        let entry = ServiceDescriptor::new(
            TypeKey::of::<dyn PaymentGateway>(),
            TypeKey::of::<PaymentService>(),
            ServiceLifetime::Singleton,
        );
        assert!(registrar.register(entry));
        assert!(!registrar.register(entry));
        let report = registrar.finish();

        assert_eq!(report.registered, vec![entry]);
        assert_eq!(report.duplicates, 1);
        assert_eq!(sc.len(), 1);
    }
}
