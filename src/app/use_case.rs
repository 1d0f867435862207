pub mod analysis {
    use serde_json::Value;
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::{
        app::resource::{
            AnalysisRecord, AnalysisResponse, DeleteResponse, HistoryResponse, UploadResponse,
        },
        domain::{
            datatype::{
                data_url,
                report::{FoodReport, ANALYSIS_PROMPT},
                ImageUpload,
            },
            entity::{analysis::FoodAnalysis, Entity},
            service::VisionModel,
        },
        error::{app::ApplicationError, resource::NotFoundError},
        infra::database::repository,
    };

    /// Asks the vision model about the image and coerces its reply into a report.
    ///
    /// Never fails: an unreachable model yields a failed report and an
    /// unparsable reply yields a placeholder report.
    pub async fn analyze_image<VM>(vision: &VM, upload: &ImageUpload) -> FoodReport
    where
        VM: VisionModel + ?Sized,
    {
        tracing::info!(file = %upload.file_name(), "analyzing image");
        match vision.analyze(ANALYSIS_PROMPT, upload).await {
            Ok(reply) => {
                let report = FoodReport::from_model_reply(&reply);
                if report.is_parsing_error() {
                    tracing::warn!(file = %upload.file_name(), "model reply holds no JSON object");
                } else {
                    tracing::info!(file = %upload.file_name(), food = report.food_name(), "food identified");
                }
                report
            }
            Err(err) => {
                tracing::error!(file = %upload.file_name(), "error analyzing food image: {err}");
                FoodReport::failed(err)
            }
        }
    }

    pub fn upload_response(upload: &ImageUpload, food_data: Value) -> UploadResponse {
        UploadResponse {
            success: true,
            food_data,
            image_base64: data_url(upload.format(), &upload.base64()),
            original_filename: upload.file_name().to_string(),
        }
    }

    /// Analyzes an uploaded image and stores the outcome.
    ///
    /// A failed insert is logged and the analysis is still returned, without
    /// an `analysis_id`.
    pub async fn analyze_upload<VM>(
        pool: &PgPool,
        vision: &VM,
        upload: ImageUpload,
        user_session: Option<String>,
    ) -> UploadResponse
    where
        VM: VisionModel + ?Sized,
    {
        let report = analyze_image(vision, &upload).await;
        let analysis = FoodAnalysis::new(&upload, report, user_session);

        let mut food_data = analysis.food_data().clone();
        match repository::insert_analysis(pool, &analysis).await {
            Ok(()) => {
                tracing::info!(id = %analysis.ident(), "analysis stored");
                if let Value::Object(map) = &mut food_data {
                    map.insert("analysis_id".into(), analysis.ident().to_string().into());
                }
            }
            Err(err) => tracing::error!("error storing analysis: {err}"),
        }

        upload_response(&upload, food_data)
    }

    pub async fn list_history(pool: &PgPool, limit: u32) -> Result<HistoryResponse, ApplicationError> {
        let analyses = repository::list_analyses(pool, limit).await?;
        Ok(HistoryResponse {
            success: true,
            analyses: analyses.into_iter().map(AnalysisRecord::from).collect(),
        })
    }

    pub async fn find_analysis(pool: &PgPool, id: Uuid) -> Result<AnalysisResponse, ApplicationError> {
        let analysis = repository::find_analysis(pool, id)
            .await?
            .ok_or_else(|| NotFoundError::from_resource::<AnalysisRecord>(id))?;
        Ok(AnalysisResponse {
            success: true,
            analysis: analysis.into(),
        })
    }

    pub async fn delete_analysis(pool: &PgPool, id: Uuid) -> Result<DeleteResponse, ApplicationError> {
        if !repository::delete_analysis(pool, id).await? {
            return Err(NotFoundError::from_resource::<AnalysisRecord>(id).into());
        }
        tracing::info!(%id, "analysis deleted");
        Ok(DeleteResponse {
            success: true,
            message: "Analysis deleted successfully".into(),
        })
    }

}
