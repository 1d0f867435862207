pub mod resource;
pub mod use_case;

pub mod transform {
    use crate::{
        app::resource::AnalysisRecord,
        domain::{
            datatype::data_url,
            entity::{analysis::FoodAnalysis, Entity},
        },
    };

    impl From<FoodAnalysis> for AnalysisRecord {
        fn from(analysis: FoodAnalysis) -> Self {
            Self {
                id: analysis.ident(),
                timestamp: analysis.timestamp(),
                original_filename: analysis.original_filename().clone(),
                image_format: analysis.image_format(),
                image_preview: data_url(analysis.image_format(), analysis.image_base64()),
                image_base64: analysis.image_base64().clone(),
                food_data: analysis.food_data().clone(),
                analysis_date: analysis.analysis_date().clone(),
                user_session: analysis.user_session().clone(),
            }
        }
    }
}
