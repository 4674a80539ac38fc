//! The service collection the registrar writes into.

use std::collections::HashSet;
use std::fmt;

use crate::candidate::HostedFactory;
use crate::key::TypeKey;
use crate::lifetime::ServiceLifetime;

/// One `(service, implementation, lifetime)` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service: TypeKey,
    pub implementation: TypeKey,
    pub lifetime: ServiceLifetime,
}

impl ServiceDescriptor {
    pub fn new(service: TypeKey, implementation: TypeKey, lifetime: ServiceLifetime) -> Self {
        Self {
            service,
            implementation,
            lifetime,
        }
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.service.short_name(),
            self.implementation.short_name(),
            self.lifetime
        )
    }
}

/// Hosted service registration; instantiated by the host on start.
#[derive(Clone)]
pub struct HostedServiceDescriptor {
    pub implementation: TypeKey,
    pub factory: HostedFactory,
}

impl fmt::Debug for HostedServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedServiceDescriptor")
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}

/// Host behaviour toggled by registered services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostOptions {
    /// Start hosted services concurrently instead of one after another.
    pub start_concurrently: bool,
}

/// Registration container. Written during startup only, then read.
#[derive(Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
    keys: HashSet<TypeKey>,
    hosted: Vec<HostedServiceDescriptor>,
    hosted_keys: HashSet<TypeKey>,
    host_options: HostOptions,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless a descriptor for the same service key exists.
    ///
    /// Returns `true` when inserted; an existing registration is never replaced.
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if !self.keys.insert(descriptor.service) {
            tracing::debug!(
                service = descriptor.service.name(),
                implementation = descriptor.implementation.name(),
                "Service key already registered; keeping the first registration"
            );
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    /// Add a hosted service unless the same implementation is already hosted.
    pub fn add_hosted_service(&mut self, descriptor: HostedServiceDescriptor) -> bool {
        if !self.hosted_keys.insert(descriptor.implementation) {
            tracing::debug!(
                implementation = descriptor.implementation.name(),
                "Hosted service already registered"
            );
            return false;
        }
        self.hosted.push(descriptor);
        true
    }

    pub fn configure_host(&mut self, configure: impl FnOnce(&mut HostOptions)) {
        configure(&mut self.host_options);
    }

    pub fn host_options(&self) -> HostOptions {
        self.host_options
    }

    pub fn get(&self, service: TypeKey) -> Option<&ServiceDescriptor> {
        if !self.keys.contains(&service) {
            return None;
        }
        self.descriptors.iter().find(|d| d.service == service)
    }

    pub fn contains(&self, service: TypeKey) -> bool {
        self.keys.contains(&service)
    }

    /// Registrations in insertion order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn hosted_services(&self) -> &[HostedServiceDescriptor] {
        &self.hosted
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
