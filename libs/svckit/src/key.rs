use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Crate roots owned by the Rust platform itself.
const PLATFORM_ROOTS: &[&str] = &["core", "alloc", "std"];

/// Identity of a concrete type or a trait object (`dyn Trait`).
///
/// Equality and hashing use the `TypeId` only; the name is kept for
/// diagnostics and for naming conventions.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment with `dyn`, auto-trait bounds and generics removed.
    ///
    /// `dyn app::orders::OrderStore + Send` → `OrderStore`,
    /// `alloc::vec::Vec<u8>` → `Vec`.
    pub fn short_name(&self) -> &'static str {
        let path = primary_path(self.name);
        match path.rfind("::") {
            Some(pos) => &path[pos + 2..],
            None => path,
        }
    }

    /// Module path that declares the type, empty for primitives.
    pub fn namespace(&self) -> &'static str {
        let path = primary_path(self.name);
        match path.rfind("::") {
            Some(pos) => &path[..pos],
            None => "",
        }
    }

    /// Path without `dyn`, extra bounds and generic arguments.
    pub fn primary_path(&self) -> &'static str {
        primary_path(self.name)
    }

    /// Same primary path: `dyn Dispose` matches `dyn Dispose + Send + Sync`.
    pub fn same_primary(&self, other: &TypeKey) -> bool {
        self.primary_path() == other.primary_path()
    }

    /// True when the type lives in `core`, `alloc` or `std`.
    pub fn is_platform(&self) -> bool {
        let ns = self.namespace();
        let root = ns.split("::").next().unwrap_or("");
        PLATFORM_ROOTS.contains(&root)
    }
}

/// Strip `dyn `, `+ Bound` suffixes and generic arguments.
fn primary_path(name: &'static str) -> &'static str {
    let name = name.strip_prefix("dyn ").unwrap_or(name);
    let name = match name.find(" + ") {
        Some(pos) => &name[..pos],
        None => name,
    };
    match name.find('<') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod orders {
        pub trait OrderStore {}
        pub struct Generic<T>(pub T);
    }

    #[test]
    fn short_name_strips_path_dyn_and_generics() {
        assert_eq!(TypeKey::of::<dyn orders::OrderStore>().short_name(), "OrderStore");
        assert_eq!(
            TypeKey::of::<dyn orders::OrderStore + Send + Sync>().short_name(),
            "OrderStore"
        );
        assert_eq!(TypeKey::of::<orders::Generic<Vec<u8>>>().short_name(), "Generic");
        assert_eq!(TypeKey::of::<u8>().short_name(), "u8");
    }

    #[test]
    fn namespace_and_platform_detection() {
        let debug = TypeKey::of::<dyn std::fmt::Debug>();
        assert_eq!(debug.namespace(), "core::fmt");
        assert!(debug.is_platform());

        let store = TypeKey::of::<dyn orders::OrderStore>();
        assert!(store.namespace().ends_with("key::tests::orders"));
        assert!(!store.is_platform());

        assert!(!TypeKey::of::<u8>().is_platform());
    }

    #[test]
    fn auto_trait_bounds_share_the_primary_path() {
        let plain = TypeKey::of::<dyn orders::OrderStore>();
        let bounded = TypeKey::of::<dyn orders::OrderStore + Send + Sync>();
        assert_ne!(plain, bounded);
        assert!(plain.same_primary(&bounded));
        assert!(!plain.same_primary(&TypeKey::of::<dyn std::fmt::Debug>()));
    }

    #[test]
    fn equality_ignores_name_and_uses_type_id() {
        assert_eq!(
            TypeKey::of::<dyn orders::OrderStore>(),
            TypeKey::of::<dyn orders::OrderStore>()
        );
        assert_ne!(
            TypeKey::of::<dyn orders::OrderStore>(),
            TypeKey::of::<dyn orders::OrderStore + Send>()
        );
    }
}
