//! Veo request and operation types.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use vgen_models::{AspectRatio, ModelVariant, Resolution};

/// Image passed as the first frame of the generated clip.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png".to_string(),
        }
    }
}

/// A clip generation request.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub model: ModelVariant,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub duration_secs: u32,
    pub reference_image: Option<ReferenceImage>,
}

impl VideoRequest {
    pub(crate) fn to_body(&self) -> PredictRequest {
        PredictRequest {
            instances: vec![Instance {
                prompt: self.prompt.clone(),
                image: self.reference_image.as_ref().map(|img| InlineImage {
                    bytes_base64_encoded: BASE64.encode(&img.bytes),
                    mime_type: img.mime_type.clone(),
                }),
            }],
            parameters: Parameters {
                aspect_ratio: self.aspect_ratio.as_str().to_string(),
                // Veo 2 has a single output resolution and rejects the field.
                resolution: (self.model != ModelVariant::Veo2)
                    .then(|| self.resolution.as_str().to_string()),
                duration_seconds: self.duration_secs,
                negative_prompt: self
                    .negative_prompt
                    .as_ref()
                    .filter(|p| !p.trim().is_empty())
                    .cloned(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct Instance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Parameters {
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub duration_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

/// Long-running operation as returned by submit and poll.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSample {
    pub video: SampleVideo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleVideo {
    pub uri: String,
}

/// A finished clip downloaded to local disk.
#[derive(Debug, Clone)]
pub struct GeneratedVideo {
    pub operation_name: String,
    /// Provider URI the clip was downloaded from
    pub uri: String,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(model: ModelVariant) -> VideoRequest {
        VideoRequest {
            model,
            prompt: "A lighthouse in a storm".into(),
            negative_prompt: Some("  ".into()),
            aspect_ratio: AspectRatio::Portrait,
            resolution: Resolution::P720,
            duration_secs: 6,
            reference_image: Some(ReferenceImage::png(vec![1, 2, 3])),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(request(ModelVariant::Veo3).to_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "instances": [{
                    "prompt": "A lighthouse in a storm",
                    "image": {"bytesBase64Encoded": "AQID", "mimeType": "image/png"}
                }],
                "parameters": {"aspectRatio": "9:16", "resolution": "720p", "durationSeconds": 6}
            })
        );
    }

    #[test]
    fn test_veo2_omits_resolution() {
        let body = serde_json::to_value(request(ModelVariant::Veo2).to_body()).unwrap();
        assert!(body["parameters"].get("resolution").is_none());
    }

    #[test]
    fn test_parse_finished_operation() {
        let op: Operation = serde_json::from_value(json!({
            "name": "models/veo-3.0-generate-001/operations/abc",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://example.com/files/abc:download?alt=media"}}]
                }
            }
        }))
        .unwrap();
        let samples = op.response.unwrap().generate_video_response.unwrap().generated_samples;
        assert_eq!(samples[0].video.uri, "https://example.com/files/abc:download?alt=media");
    }
}
