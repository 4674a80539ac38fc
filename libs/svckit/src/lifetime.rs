//! Service lifetime definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a constructed service instance is reused by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// One instance for the whole process.
    #[default]
    Singleton,
    /// One instance per logical operation (request, job, ...).
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Scoped => "scoped",
            ServiceLifetime::Transient => "transient",
        };
        f.write_str(s)
    }
}
