//! # svckit - Convention-Driven Service Registration
//!
//! Walks a set of candidate types and derives service registrations
//! (capability-to-implementation bindings, lifetimes, hosted services)
//! without manual wiring.
//!
//! ## Features
//!
//! - **Declarative**: `#[service(...)]`, `#[hosted_service(...)]` and `#[injectable(...)]`
//! - **Auto-discovery**: candidates are collected at link time via inventory
//! - **Conventions**: name-suffix rules map types to lifetimes
//! - **Idempotent**: the first registration for a service key wins
//! - **Hosted services**: started after registration, stopped in reverse order
//!
//! ## Example
//!
//! ```rust,ignore
//! use svckit::{service, ServiceCollection, SmartServices, ServiceLifetime};
//!
//! pub trait PaymentGateway: Send + Sync {}
//! svckit::declare_capability!(dyn PaymentGateway);
//!
//! #[service(key = dyn PaymentGateway, lifetime = scoped, as_self = false,
//!           implements = [dyn PaymentGateway])]
//! pub struct PaymentService;
//! impl PaymentGateway for PaymentService {}
//!
//! let mut services = ServiceCollection::new();
//! let report = services.add_smart_services();
//! assert!(report.failures.is_empty());
//! ```
//!
//! Candidates can also be described by hand and grouped into an
//! [`Assembly`]; see [`Candidate`].

pub use anyhow::Result;
pub use async_trait::async_trait;

// Re-export inventory for the macro-generated code
pub use inventory;

pub mod assembly;
pub mod candidate;
pub mod classifier;
pub mod collection;
pub mod contracts;
pub mod host;
pub mod key;
pub mod lifetime;
pub mod options;
pub mod policy;
pub mod registrar;
pub mod route;

pub use assembly::{Assembly, CandidateRegistrator};
pub use candidate::{Candidate, HostedFactory, HostedServiceMarker, ServiceMarker};
pub use classifier::{classify, Classification, Classified, ClassifyError};
pub use collection::{HostOptions, HostedServiceDescriptor, ServiceCollection, ServiceDescriptor};
pub use contracts::{AsyncDispose, Dispose, HostedService};
pub use host::{HostError, HostedServiceHost};
pub use key::TypeKey;
pub use lifetime::ServiceLifetime;
pub use options::{AutoRegisterConfig, AutoRegisterOptions, NamingRule, TypeFilter};
pub use policy::{resolve, Resolution};
pub use registrar::{Registrar, RegistrationReport, SmartServices};
pub use route::{lower_first, rewrite_route, CamelCaseRoute, ControllerModel, RouteConvention};

// Attribute macros
pub use svckit_macros::{hosted_service, injectable, service};
