use std::env;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::{mime_for_path, non_empty_env, response_json_or_error};

pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One call to an image model.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Reference images, sent after the prompt in this order.
    pub references: Vec<PathBuf>,
    /// Aspect-ratio hint such as `1:1` or `9:16`.
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

pub trait ImageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the model has what it needs to authenticate a call.
    fn has_credential(&self) -> bool;

    /// `Ok(None)` means the model answered without producing an image.
    fn generate(&self, request: &ImageRequest) -> Result<Option<GeneratedImage>>;
}

/// Gemini `generateContent` with image output.
pub struct GeminiImageModel {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: HttpClient,
}

impl GeminiImageModel {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            api_base: env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            api_key: api_key
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            model: model
                .or_else(|| non_empty_env("GEMINI_IMAGE_MODEL"))
                .unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string()),
            http: HttpClient::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_payload(request: &ImageRequest) -> Result<Value> {
        let mut parts = vec![json!({ "text": request.prompt })];
        for reference in &request.references {
            parts.push(image_part_from_path(reference)?);
        }

        let mut generation_config = Map::new();
        generation_config.insert("responseModalities".to_string(), json!(["IMAGE"]));
        if !request.aspect_ratio.trim().is_empty() {
            generation_config.insert(
                "imageConfig".to_string(),
                json!({ "aspectRatio": request.aspect_ratio.trim() }),
            );
        }

        Ok(json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": Value::Object(generation_config),
        }))
    }

    /// First inline image of the response, if any.
    fn extract_image(response_payload: &Value) -> Result<Option<GeneratedImage>> {
        let candidates = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for part in parts {
                let Some(inline) = part
                    .get("inlineData")
                    .or_else(|| part.get("inline_data"))
                    .and_then(Value::as_object)
                else {
                    continue;
                };
                let data = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if data.is_empty() {
                    continue;
                }
                let bytes = BASE64
                    .decode(data.as_bytes())
                    .context("Gemini image base64 decode failed")?;
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                return Ok(Some(GeneratedImage { bytes, mime_type }));
            }
        }
        Ok(None)
    }
}

impl ImageModel for GeminiImageModel {
    fn name(&self) -> &str {
        "gemini"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate(&self, request: &ImageRequest) -> Result<Option<GeneratedImage>> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("GOOGLE_API_KEY or GEMINI_API_KEY not set");
        };
        let endpoint = self.endpoint();
        let payload = Self::build_payload(request)?;
        tracing::debug!(
            endpoint = %endpoint,
            references = request.references.len(),
            aspect_ratio = %request.aspect_ratio,
            "sending Gemini image request"
        );

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(GEMINI_REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let response_payload = response_json_or_error("Gemini", response)?;
        Self::extract_image(&response_payload)
    }
}

/// Offline model that paints a flat color derived from the prompt.
pub struct DryrunImageModel;

impl DryrunImageModel {
    fn dims(aspect_ratio: &str) -> (u32, u32) {
        match aspect_ratio.trim() {
            "9:16" => (144, 256),
            "16:9" => (256, 144),
            _ => (256, 256),
        }
    }
}

impl ImageModel for DryrunImageModel {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn has_credential(&self) -> bool {
        true
    }

    fn generate(&self, request: &ImageRequest) -> Result<Option<GeneratedImage>> {
        let (width, height) = Self::dims(&request.aspect_ratio);
        let bytes = render_flat_png(width, height, &request.prompt, request.references.len())?;
        Ok(Some(GeneratedImage {
            bytes,
            mime_type: Some("image/png".to_string()),
        }))
    }
}

/// Resolves a model by provider name.
pub fn image_model_for(
    provider: &str,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Box<dyn ImageModel>> {
    match provider.trim().to_ascii_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiImageModel::new(api_key, model))),
        "dryrun" => Ok(Box::new(DryrunImageModel)),
        other => bail!("unknown image provider '{other}' (available: [dryrun, gemini])"),
    }
}

fn image_part_from_path(path: &Path) -> Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    let mime = mime_for_path(path).unwrap_or("image/png");
    Ok(json!({
        "inlineData": {
            "mimeType": mime,
            "data": BASE64.encode(bytes),
        }
    }))
}

fn render_flat_png(width: u32, height: u32, prompt: &str, salt: usize) -> Result<Vec<u8>> {
    let (r, g, b) = color_from_prompt(prompt, salt as u64);
    let mut image = RgbImage::new(width, height);
    for pixel in image.pixels_mut() {
        *pixel = Rgb([r, g, b]);
    }
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .context("failed encoding dryrun image")?;
    Ok(out.into_inner())
}

fn color_from_prompt(prompt: &str, seed: u64) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(seed.to_be_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}
