use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{base::resource_id, domain::datatype::ImageFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub food_data: Value,
    /// Uploaded image as a data URL
    pub image_base64: String,
    pub original_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub timestamp: String,
    pub original_filename: String,
    pub image_format: ImageFormat,
    pub image_base64: String,
    pub image_preview: String,
    pub food_data: Value,
    pub analysis_date: String,
    pub user_session: Option<String>,
}

resource_id!(AnalysisRecord, "Analysis");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: AnalysisRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}
