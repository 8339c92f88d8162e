use std::time::Duration;

use anyhow::{bail, Context, Result};
use creative_contracts::campaign::Translation;
use creative_contracts::catalog::{Language, Region};
use indexmap::IndexMap;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use crate::{error_chain_text, response_json_or_error, STATUS_ERROR_CHARS};

const GOOGLE_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Language code whose translation is the original message itself.
const SOURCE_LANGUAGE_CODE: &str = "en";

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_code: &str) -> Result<String>;
}

/// Google's public `translate_a/single` endpoint with automatic source
/// detection.
pub struct GoogleTranslator {
    endpoint: String,
    http: HttpClient,
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self {
            endpoint: GOOGLE_TRANSLATE_ENDPOINT.to_string(),
            http: HttpClient::new(),
        }
    }

    /// Joins the translated segments of a `dt=t` response.
    fn parse_response(payload: &Value) -> Result<String> {
        let Some(segments) = payload.get(0).and_then(Value::as_array) else {
            bail!("translation response has no segments");
        };
        let text = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect::<String>();
        if text.trim().is_empty() {
            bail!("translation response was empty");
        }
        Ok(text)
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, target_code: &str) -> Result<String> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(TRANSLATE_TIMEOUT)
            .send()
            .with_context(|| format!("translation request failed ({target_code})"))?;
        let payload = response_json_or_error("Google Translate", response)?;
        Self::parse_response(&payload)
    }
}

/// The message in every top language of the region.
///
/// Empty when the message is blank or the region is unknown or has no
/// languages. A language whose translation fails keeps the original text.
pub fn message_translations(
    translator: &dyn Translator,
    regions: &IndexMap<String, Region>,
    message: &str,
    region_key: &str,
) -> Vec<Translation> {
    if message.trim().is_empty() || region_key.trim().is_empty() {
        return Vec::new();
    }
    let Some(region) = regions.get(region_key) else {
        return Vec::new();
    };

    region
        .top_languages
        .iter()
        .map(|language| {
            let text = match translate_one(translator, message, language) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(
                        language = %language.name,
                        code = %language.code,
                        "could not translate message: {err:#}"
                    );
                    message.to_string()
                }
            };
            Translation {
                language: language.name.clone(),
                code: language.code.clone(),
                text,
            }
        })
        .collect()
}

/// Markdown listing of the message in each of the region's languages, with
/// per-language errors inline.
pub fn translation_preview(
    translator: &dyn Translator,
    regions: &IndexMap<String, Region>,
    message: &str,
    region_key: Option<&str>,
) -> String {
    if message.trim().is_empty() {
        return "Please enter a campaign message first".to_string();
    }
    let Some(region_key) = region_key.filter(|key| !key.trim().is_empty()) else {
        return "Please select a target region first".to_string();
    };
    let Some(region) = regions.get(region_key) else {
        return "Invalid region selected".to_string();
    };
    if region.top_languages.is_empty() {
        return "No languages configured for this region".to_string();
    }

    let region_name = if region.name.trim().is_empty() {
        region_key
    } else {
        region.name.as_str()
    };
    let mut out = format!("## Translations for {region_name}\n\n");
    out.push_str(&format!("**Original Message:**\n{message}\n\n---\n\n"));
    for language in &region.top_languages {
        match translate_one(translator, message, language) {
            Ok(text) => out.push_str(&format!("**{}:**\n{text}\n\n", language.name)),
            Err(err) => out.push_str(&format!(
                "**{}:**\nTranslation error: {}\n\n",
                language.name,
                error_chain_text(&err, STATUS_ERROR_CHARS)
            )),
        }
    }
    out
}

fn translate_one(translator: &dyn Translator, message: &str, language: &Language) -> Result<String> {
    if language.code == SOURCE_LANGUAGE_CODE {
        return Ok(message.to_string());
    }
    translator.translate(message, &language.code)
}
