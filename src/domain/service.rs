use async_trait::async_trait;

use super::datatype::ImageUpload;
use crate::error::service::DispatchError;

/// Hosted model able to answer a text prompt about an image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Returns the raw text reply of the model.
    async fn analyze(&self, prompt: &str, image: &ImageUpload) -> Result<String, DispatchError>;
}
