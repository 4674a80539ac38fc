//! Route naming convention for controllers.
//!
//! A controller's route template may contain the `[controller]` token. The
//! camel-case convention substitutes the controller's short name with its
//! first character lower-cased:
//!
//! ```
//! # use svckit::route::rewrite_route;
//! assert_eq!(rewrite_route("OrderHistory", "api/[controller]"), "api/orderHistory");
//! ```

use crate::key::TypeKey;

/// Placeholder replaced by the controller name.
pub const CONTROLLER_TOKEN: &str = "[controller]";

const CONTROLLER_SUFFIX: &str = "Controller";

/// Lower-case the first character only; the rest is left untouched.
///
/// ```
/// # use svckit::route::lower_first;
/// assert_eq!(lower_first("TestCamelCase"), "testCamelCase");
/// assert_eq!(lower_first(""), "");
/// ```
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace every [`CONTROLLER_TOKEN`] in `template` with `lower_first(controller)`.
pub fn rewrite_route(controller: &str, template: &str) -> String {
    if !template.contains(CONTROLLER_TOKEN) {
        return template.to_string();
    }
    template.replace(CONTROLLER_TOKEN, &lower_first(controller))
}

/// One routing selector of a controller; `None` means no attribute route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub template: Option<String>,
}

impl Selector {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
        }
    }
}

/// Routing view of a controller type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerModel {
    /// Short name with the `Controller` suffix removed.
    pub name: String,
    pub selectors: Vec<Selector>,
}

impl ControllerModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selectors: Vec::new(),
        }
    }

    /// Model for `T`, named after its short type name.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let short = TypeKey::of::<T>().short_name();
        let name = short.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(short);
        Self::new(name)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.selectors.push(Selector::new(template));
        self
    }

    pub fn apply(mut self, convention: &dyn RouteConvention) -> Self {
        convention.apply(&mut self);
        self
    }

    /// Templates of every routed selector, in declaration order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().filter_map(|s| s.template.as_deref())
    }

    /// Absolute path of `action` under each selector template.
    pub fn action_paths(&self, action: &str) -> Vec<String> {
        self.templates()
            .map(|template| join_path(template, action))
            .collect()
    }
}

/// Hook that rewrites a controller's routing model at registration time.
pub trait RouteConvention: Send + Sync {
    fn apply(&self, controller: &mut ControllerModel);
}

/// Substitutes the camel-cased controller name into every selector template.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseRoute;

impl RouteConvention for CamelCaseRoute {
    fn apply(&self, controller: &mut ControllerModel) {
        let name = controller.name.clone();
        for selector in &mut controller.selectors {
            if let Some(template) = selector.template.as_mut() {
                *template = rewrite_route(&name, template);
                tracing::trace!(controller = %name, template = %template, "Rewrote route template");
            }
        }
    }
}

fn join_path(template: &str, action: &str) -> String {
    let template = template.trim_matches('/');
    let action = action.trim_matches('/');
    match (template.is_empty(), action.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{action}"),
        (false, true) => format!("/{template}"),
        (false, false) => format!("/{template}/{action}"),
    }
}
