use std::sync::Arc;

use async_trait::async_trait;
use salvo::{
    http::StatusCode,
    prelude::StatusError,
    writer::{Json, Text},
    Depot, FlowCtrl, Handler, Request, Response,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    app::use_case,
    domain::{
        datatype::{validate_file_name, validate_size, ImageUpload},
        service::VisionModel,
    },
    error::{app::ApplicationError, upload::UploadError},
};

const INDEX_PAGE: &str = include_str!("../../static/index.html");

macro_rules! map_res_err {
    ($result:ident, $response:ident) => {
        match $result {
            Err(err) => {
                $response.render(err);
                return;
            }
            Ok(ok) => ok,
        }
    };
}

/// Extract a uuid from a request id param
///
/// Routes only match a valid uuid, a missing or malformed param is
/// answered as not found.
fn extract_id(req: &Request, res: &mut Response) -> Option<Uuid> {
    let id = req.params().get("id").and_then(|id| id.parse().ok());
    if id.is_none() {
        res.set_status_error(StatusError::not_found());
    }
    id
}

/// Address of the client, preferring the first hop of `x-forwarded-for`.
fn client_address(req: &Request) -> Option<String> {
    let forwarded: Option<&str> = req.header("x-forwarded-for");
    forwarded
        .and_then(|hops| hops.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(String::from)
        .or_else(|| req.remote_addr().map(|addr| addr.to_string()))
}

/// Reads the `file` part of a multipart upload.
async fn extract_upload(req: &mut Request, max_bytes: u64) -> Result<ImageUpload, UploadError> {
    let file = req.file("file").await.ok_or(UploadError::NoFile)?;

    let (name, format) = validate_file_name(file.name().unwrap_or_default())?;
    let path = file.path().clone();

    let size = tokio::fs::metadata(&path)
        .await
        .map_err(UploadError::Unreadable)?
        .len();
    validate_size(size, max_bytes)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(UploadError::Unreadable)?;

    Ok(ImageUpload::new(name, format, bytes))
}

pub struct IndexController;

#[async_trait]
impl Handler for IndexController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        res.render(Text::Html(INDEX_PAGE));
    }
}

pub struct UploadController {
    pool: PgPool,
    vision: Arc<dyn VisionModel>,
    max_upload_bytes: u64,
}

impl UploadController {
    pub fn new(pool: PgPool, vision: Arc<dyn VisionModel>, max_upload_bytes: u64) -> Self {
        Self {
            pool,
            vision,
            max_upload_bytes,
        }
    }
}

#[async_trait]
impl Handler for UploadController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_upload(req, self.max_upload_bytes)
            .await
            .map_err(ApplicationError::from);
        let upload = map_res_err!(result, res);

        let user_session = client_address(req);
        let response =
            use_case::analysis::analyze_upload(&self.pool, self.vision.as_ref(), upload, user_session)
                .await;

        res.render(Json(response));
        res.set_status_code(StatusCode::OK);
    }
}

pub struct HistoryController {
    pool: PgPool,
    limit: u32,
}

impl HistoryController {
    pub fn new(pool: PgPool, limit: u32) -> Self {
        Self { pool, limit }
    }
}

#[async_trait]
impl Handler for HistoryController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = use_case::analysis::list_history(&self.pool, self.limit).await;
        let history = map_res_err!(result, res);

        res.render(Json(history));
        res.set_status_code(StatusCode::OK);
    }
}

pub struct FindAnalysisController {
    pool: PgPool,
}

impl FindAnalysisController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Handler for FindAnalysisController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let Some(id) = extract_id(req, res) else {
            return;
        };

        let result = use_case::analysis::find_analysis(&self.pool, id).await;
        let analysis = map_res_err!(result, res);

        res.render(Json(analysis));
        res.set_status_code(StatusCode::OK);
    }
}

pub struct DeleteAnalysisController {
    pool: PgPool,
}

impl DeleteAnalysisController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Handler for DeleteAnalysisController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let Some(id) = extract_id(req, res) else {
            return;
        };

        let result = use_case::analysis::delete_analysis(&self.pool, id).await;
        let deleted = map_res_err!(result, res);

        res.render(Json(deleted));
        res.set_status_code(StatusCode::OK);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use salvo::http::HeaderValue;

    use super::*;

    fn forwarded_for(value: &'static str) -> Request {
        let mut req = Request::default();
        req.headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static(value));
        req
    }

    #[test]
    fn client_address_prefers_first_forwarded_hop() {
        let req = forwarded_for("203.0.113.7, 10.0.0.1");
        assert_eq!(client_address(&req).as_deref(), Some("203.0.113.7"));

        let req = forwarded_for(" 198.51.100.2 ");
        assert_eq!(client_address(&req).as_deref(), Some("198.51.100.2"));
    }

    #[test]
    fn client_address_ignores_blank_forwarded_header() {
        let req = forwarded_for("");
        assert_eq!(client_address(&req), None);
        assert_eq!(client_address(&Request::default()), None);
    }
}
