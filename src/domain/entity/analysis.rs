use serde_json::Value;

use super::{impl_entity, state_ref, Entity, EntityData};
use crate::domain::datatype::{report::FoodReport, ImageFormat, ImageUpload};

pub const ANALYSIS_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct FoodAnalysisState {
    pub(in crate::domain) original_filename: String,
    pub(in crate::domain) image_format: ImageFormat,
    pub(in crate::domain) image_base64: String,
    pub(in crate::domain) food_data: Value,
    pub(in crate::domain) analysis_date: String,
    pub(in crate::domain) user_session: Option<String>,
}

/// Stored analysis of one uploaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodAnalysis {
    pub(in crate::domain) data: EntityData,
    pub(in crate::domain) state: FoodAnalysisState,
}

impl_entity!(FoodAnalysis);

impl FoodAnalysis {
    state_ref!(original_filename, String);
    state_ref!(image_base64, String);
    state_ref!(food_data, Value);
    state_ref!(analysis_date, String);
    state_ref!(user_session, Option<String>);

    pub fn image_format(&self) -> ImageFormat {
        self.state.image_format
    }

    pub fn new(upload: &ImageUpload, report: FoodReport, user_session: Option<String>) -> Self {
        let data = EntityData::new();
        let analysis_date = data.created.format(ANALYSIS_DATE_FORMAT).to_string();
        Self {
            data,
            state: FoodAnalysisState {
                original_filename: upload.file_name().to_string(),
                image_format: upload.format(),
                image_base64: upload.base64(),
                food_data: report.into_value(),
                analysis_date,
                user_session,
            },
        }
    }

    pub fn restore(data: EntityData, state: FoodAnalysisState) -> Self {
        Self { data, state }
    }

    /// Creation instant in the display format used by the API.
    pub fn timestamp(&self) -> String {
        self.created().format(ANALYSIS_DATE_FORMAT).to_string()
    }
}

impl FoodAnalysisState {
    pub fn new(
        original_filename: String,
        image_format: ImageFormat,
        image_base64: String,
        food_data: Value,
        analysis_date: String,
        user_session: Option<String>,
    ) -> Self {
        Self {
            original_filename,
            image_format,
            image_base64,
            food_data,
            analysis_date,
            user_session,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::datatype::validate_file_name;

    #[test]
    fn new_analysis_encodes_image_and_dates() {
        let (name, format) = validate_file_name("soup bowl.webp").unwrap();
        let upload = ImageUpload::new(name, format, vec![0xff, 0x00, 0x10]);
        let analysis = FoodAnalysis::new(
            &upload,
            FoodReport::from_model_reply(r#"{"food_name": "Soup"}"#),
            Some("127.0.0.1:40000".into()),
        );

        assert_eq!(analysis.original_filename(), "soup_bowl.webp");
        assert_eq!(analysis.image_format(), ImageFormat::Webp);
        assert_eq!(analysis.image_base64(), "/wAQ");
        assert_eq!(analysis.food_data()["food_name"], "Soup");
        assert_eq!(analysis.analysis_date(), &analysis.timestamp());
        assert_eq!(analysis.user_session().as_deref(), Some("127.0.0.1:40000"));
    }

    #[test]
    fn restored_timestamp_uses_display_format() {
        let created = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let analysis = FoodAnalysis::restore(
            EntityData::restore(uuid::Uuid::nil(), created),
            FoodAnalysisState::new(
                "a.png".into(),
                ImageFormat::Png,
                String::new(),
                Value::Null,
                "2024-03-09 07:05:01".into(),
                None,
            ),
        );

        assert_eq!(analysis.timestamp(), "2024-03-09 07:05:01");
        assert_eq!(analysis.ident(), uuid::Uuid::nil());
    }
}
