//! Candidate types and the declarative markers attached to them.
//!
//! A [`Candidate`] is the metadata the registration pass works on: the type
//! itself, the capabilities (trait objects) it declares, and optional
//! service / hosted-service markers. Candidates are produced by the
//! `#[service]`, `#[hosted_service]` and `#[injectable]` macros, or built by
//! hand with the builder methods below.

use std::fmt;
use std::sync::Arc;

use crate::contracts::HostedService;
use crate::key::TypeKey;
use crate::lifetime::ServiceLifetime;

/// Constructs the instance of a hosted service when the host starts.
pub type HostedFactory = Arc<dyn Fn() -> Arc<dyn HostedService> + Send + Sync>;

/// Declarative service marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceMarker {
    /// Explicit service key; wins over every other key source.
    pub key: Option<TypeKey>,
    pub lifetime: ServiceLifetime,
    /// Register under the implementation type itself when no explicit key is set.
    pub as_self: bool,
}

impl Default for ServiceMarker {
    fn default() -> Self {
        Self {
            key: None,
            lifetime: ServiceLifetime::Singleton,
            as_self: true,
        }
    }
}

impl ServiceMarker {
    pub fn new(lifetime: ServiceLifetime) -> Self {
        Self {
            lifetime,
            ..Self::default()
        }
    }

    pub fn with_key<K: ?Sized + 'static>(mut self) -> Self {
        self.key = Some(TypeKey::of::<K>());
        self
    }

    pub fn as_self(mut self, as_self: bool) -> Self {
        self.as_self = as_self;
        self
    }
}

/// Declarative hosted-service marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostedServiceMarker {
    /// Ask the host to start hosted services concurrently.
    pub run_immediately: bool,
}

/// Metadata describing one type offered to the registration pass.
#[derive(Clone)]
pub struct Candidate {
    key: TypeKey,
    capabilities: Vec<TypeKey>,
    is_abstract: bool,
    is_capability: bool,
    service: Option<ServiceMarker>,
    hosted: Option<HostedServiceMarker>,
    hosted_factory: Option<HostedFactory>,
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("key", &self.key)
            .field("capabilities", &self.capabilities)
            .field("is_abstract", &self.is_abstract)
            .field("is_capability", &self.is_capability)
            .field("service", &self.service)
            .field("hosted", &self.hosted)
            .field("has_hosted_factory", &self.hosted_factory.is_some())
            .finish()
    }
}

impl Candidate {
    /// A concrete type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_key(TypeKey::of::<T>())
    }

    pub fn from_key(key: TypeKey) -> Self {
        Self {
            key,
            capabilities: Vec::new(),
            is_abstract: false,
            is_capability: false,
            service: None,
            hosted: None,
            hosted_factory: None,
        }
    }

    /// A capability declaration (`dyn Trait`). Usable as a key, never as a target.
    pub fn capability<T: ?Sized + 'static>() -> Self {
        Self {
            is_capability: true,
            ..Self::of::<T>()
        }
    }

    /// Declare a capability. Declaration order is kept; repeats are ignored.
    pub fn implements<C: ?Sized + 'static>(self) -> Self {
        self.implements_key(TypeKey::of::<C>())
    }

    pub fn implements_key(mut self, key: TypeKey) -> Self {
        if !self.capabilities.contains(&key) {
            self.capabilities.push(key);
        }
        self
    }

    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_service(mut self, marker: ServiceMarker) -> Self {
        self.service = Some(marker);
        self
    }

    pub fn with_hosted(mut self, marker: HostedServiceMarker) -> Self {
        self.hosted = Some(marker);
        self
    }

    pub fn with_hosted_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn HostedService> + Send + Sync + 'static,
    {
        self.hosted_factory = Some(Arc::new(factory));
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn short_name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    pub fn first_capability(&self) -> Option<TypeKey> {
        self.capabilities.first().copied()
    }

    pub fn declares(&self, key: TypeKey) -> bool {
        self.capabilities.contains(&key)
    }

    /// Like [`declares`](Self::declares), ignoring extra auto-trait bounds.
    pub fn declares_trait(&self, key: TypeKey) -> bool {
        self.capabilities.iter().any(|c| c.same_primary(&key))
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_capability(&self) -> bool {
        self.is_capability
    }

    /// Abstract types and capability declarations are keys only.
    pub fn is_registration_target(&self) -> bool {
        !self.is_abstract && !self.is_capability
    }

    pub fn service(&self) -> Option<&ServiceMarker> {
        self.service.as_ref()
    }

    pub fn hosted(&self) -> Option<&HostedServiceMarker> {
        self.hosted.as_ref()
    }

    pub fn hosted_factory(&self) -> Option<&HostedFactory> {
        self.hosted_factory.as_ref()
    }
}
