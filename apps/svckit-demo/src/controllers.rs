use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use svckit::{CamelCaseRoute, ControllerModel};

use crate::services::TestServiceAttributeService;

const ROUTE_TEMPLATE: &str = "api/[controller]";
const DEMO_ACTION: &str = "testCamelCaseAttribute";

pub struct TestCamelCaseAttributeController {
    service: Arc<TestServiceAttributeService>,
}

impl TestCamelCaseAttributeController {
    pub fn new(service: Arc<TestServiceAttributeService>) -> Self {
        Self { service }
    }

    /// Routing model with the camel-case convention applied.
    pub fn model() -> ControllerModel {
        ControllerModel::of::<Self>()
            .with_template(ROUTE_TEMPLATE)
            .apply(&CamelCaseRoute)
    }

    pub fn router(self) -> Router {
        let mut router = Router::new();
        for path in Self::model().action_paths(DEMO_ACTION) {
            tracing::debug!(route = %path, "Mapping controller action");
            router = router.route(&path, get(demo));
        }
        router.layer(Extension(Arc::new(self)))
    }
}

async fn demo(Extension(ctrl): Extension<Arc<TestCamelCaseAttributeController>>) -> Json<Value> {
    Json(json!({ "print": ctrl.service.print() }))
}
