pub mod vision {
    use std::{io, time::Duration};

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use url::Url;

    use crate::{
        domain::{datatype::ImageUpload, service::VisionModel},
        error::{service::DispatchError, UnknownError},
    };

    const API_KEY_HEADER: &str = "x-goog-api-key";

    #[derive(Debug, Clone, Serialize)]
    pub struct GenerateContentRequest<'a> {
        pub contents: [Content<'a>; 1],
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Content<'a> {
        pub parts: [Part<'a>; 2],
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Part<'a> {
        Text(&'a str),
        #[serde(rename_all = "camelCase")]
        InlineData {
            mime_type: &'static str,
            data: String,
        },
    }

    impl<'a> GenerateContentRequest<'a> {
        pub fn new(prompt: &'a str, image: &ImageUpload) -> Self {
            Self {
                contents: [Content {
                    parts: [
                        Part::Text(prompt),
                        Part::InlineData {
                            mime_type: image.format().mime_type(),
                            data: image.base64(),
                        },
                    ],
                }],
            }
        }
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GenerateContentResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Candidate {
        pub content: Option<ReplyContent>,
        pub finish_reason: Option<String>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct ReplyContent {
        #[serde(default)]
        pub parts: Vec<ReplyPart>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct ReplyPart {
        pub text: Option<String>,
    }

    impl GenerateContentResponse {
        /// Concatenated text parts of the first candidate.
        pub fn text(&self) -> Result<String, DispatchError> {
            let candidate = self
                .candidates
                .first()
                .ok_or_else(|| DispatchError::InvalidReply("reply holds no candidates".into()))?;

            let text: String = candidate
                .content
                .iter()
                .flat_map(|content| content.parts.iter())
                .filter_map(|part| part.text.as_deref())
                .collect();

            if text.is_empty() {
                let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
                return Err(DispatchError::InvalidReply(format!(
                    "candidate holds no text, finish reason {reason}"
                )));
            }
            Ok(text)
        }
    }

    /// Gemini client over the Generative Language REST API.
    pub struct GeminiVisionService {
        client: reqwest::Client,
        endpoint: Url,
        api_key: String,
    }

    impl GeminiVisionService {
        pub fn new(
            api_url: &Url,
            model: &str,
            api_key: String,
            timeout: Duration,
        ) -> Result<Self, DispatchError> {
            let client = reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(timeout)
                .build()
                .map_err(|err| DispatchError::Unknown(UnknownError::from(err)))?;

            Ok(Self {
                client,
                endpoint: Self::endpoint(api_url, model)?,
                api_key,
            })
        }

        pub fn endpoint(api_url: &Url, model: &str) -> Result<Url, DispatchError> {
            api_url
                .join(&format!("v1beta/models/{model}:generateContent"))
                .map_err(|err| {
                    DispatchError::IO(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid model endpoint: {err}"),
                    ))
                })
        }
    }

    #[async_trait]
    impl VisionModel for GeminiVisionService {
        async fn analyze(&self, prompt: &str, image: &ImageUpload) -> Result<String, DispatchError> {
            let body = GenerateContentRequest::new(prompt, image);

            let response = self
                .client
                .post(self.endpoint.clone())
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(DispatchError::Status(status.as_u16(), detail));
            }

            let reply: GenerateContentResponse = response.json().await?;
            tracing::debug!(candidates = reply.candidates.len(), "vision model replied");
            reply.text()
        }
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;
        use serde_json::json;

        use super::*;
        use crate::domain::datatype::validate_file_name;

        #[test]
        fn request_body_inlines_image() {
            let (name, format) = validate_file_name("cake.jpg").unwrap();
            let image = ImageUpload::new(name, format, b"hello".to_vec());

            let body = serde_json::to_value(GenerateContentRequest::new("describe", &image)).unwrap();

            assert_eq!(
                body,
                json!({
                    "contents": [{
                        "parts": [
                            { "text": "describe" },
                            { "inlineData": { "mimeType": "image/jpeg", "data": "aGVsbG8=" } }
                        ]
                    }]
                })
            );
        }

        #[test]
        fn reply_text_joins_parts_of_first_candidate() {
            let reply: GenerateContentResponse = serde_json::from_value(json!({
                "candidates": [
                    {
                        "content": { "parts": [{ "text": "```json\n{" }, { "text": "}\n```" }], "role": "model" },
                        "finishReason": "STOP"
                    },
                    { "content": { "parts": [{ "text": "ignored" }] } }
                ],
                "usageMetadata": { "totalTokenCount": 12 }
            }))
            .unwrap();

            assert_eq!(reply.text().unwrap(), "```json\n{}\n```");
        }

        #[test]
        fn reply_without_text_is_invalid() {
            let blocked: GenerateContentResponse = serde_json::from_value(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            }))
            .unwrap();
            let err = blocked.text().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid reply from remote service: candidate holds no text, finish reason SAFETY"
            );

            let empty: GenerateContentResponse =
                serde_json::from_value(json!({ "promptFeedback": {} })).unwrap();
            assert!(matches!(empty.text(), Err(DispatchError::InvalidReply(_))));
        }

        #[test]
        fn builds_model_endpoint() {
            let base: Url = "https://generativelanguage.googleapis.com".parse().unwrap();
            let endpoint = GeminiVisionService::endpoint(&base, "gemini-1.5-flash").unwrap();
            assert_eq!(
                endpoint.as_str(),
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
            );
            assert_eq!(endpoint.query(), None);
        }
    }
}
