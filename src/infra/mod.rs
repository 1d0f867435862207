pub mod controller;
pub mod database;
pub mod service;

pub mod router {
    use std::sync::Arc;

    use salvo::{logging::Logger, routing::PathFilter, Router};
    use sqlx::PgPool;

    use super::controller::*;
    use crate::domain::service::VisionModel;

    pub const UUID_PATTERN: &str =
        "(?i)^[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}$";

    pub struct RouterConfig {
        pub max_upload_bytes: u64,
        pub history_limit: u32,
    }

    pub fn app(pool: &PgPool, vision: Arc<dyn VisionModel>, config: RouterConfig) -> Router {
        PathFilter::register_wisp_regex(
            "uuid",
            regex::Regex::new(UUID_PATTERN).expect("Expect a valid uuid regex"),
        );

        Router::new()
            .get(IndexController)
            .push(Router::with_path("upload").post(UploadController::new(
                pool.clone(),
                vision,
                config.max_upload_bytes,
            )))
            .push(
                Router::with_path("history")
                    .get(HistoryController::new(pool.clone(), config.history_limit)),
            )
            .push(
                Router::with_path("analysis/<id:uuid>")
                    .get(FindAnalysisController::new(pool.clone())),
            )
            .push(
                Router::with_path("delete/<id:uuid>")
                    .delete(DeleteAnalysisController::new(pool.clone())),
            )
            .hoop(Logger)
    }

}
