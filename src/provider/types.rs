//! Request body for the provider's task-creation endpoint.

use serde::Serialize;

use crate::config::DispatchConfig;
use crate::queue::Job;

/// `POST /contents/generations/tasks` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub content: Vec<ContentPart>,
    pub parameters: GenerationParameters,
}

/// A prompt fragment. Serialized with a `"type"` tag, e.g.
/// `{"type": "image_url", "image_url": {"url": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationParameters {
    pub duration: u32,
    pub resolution: String,
    pub audio: bool,
}

impl GenerationRequest {
    /// Build the request for a queued job, filling blanks from config.
    pub fn for_job(job: &Job, config: &DispatchConfig) -> Self {
        let model = job
            .video_model
            .clone()
            .unwrap_or_else(|| config.default_model.clone());
        let prompt = job
            .video_prompt
            .clone()
            .unwrap_or_else(|| config.default_prompt.clone());

        Self {
            model,
            content: vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: config.image_url(&job.id),
                    },
                },
            ],
            parameters: GenerationParameters {
                duration: config.duration_secs,
                resolution: config.resolve_resolution(job.video_resolution.as_deref()),
                audio: false,
            },
        }
    }
}
