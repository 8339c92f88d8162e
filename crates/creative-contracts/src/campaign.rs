use std::path::PathBuf;

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Digits and capitals without the look-alikes `0`, `1`, `I` and `O`.
pub const CAMPAIGN_ID_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const CAMPAIGN_ID_LEN: usize = 6;

pub fn generate_campaign_id() -> String {
    generate_campaign_id_with(&mut rand::thread_rng())
}

pub fn generate_campaign_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CAMPAIGN_ID_LEN)
        .map(|_| CAMPAIGN_ID_ALPHABET[rng.gen_range(0..CAMPAIGN_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_campaign_id(value: &str) -> bool {
    value.len() == CAMPAIGN_ID_LEN
        && value
            .bytes()
            .all(|byte| CAMPAIGN_ID_ALPHABET.contains(&byte))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AspectRatio {
    Square,
    Vertical,
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Square,
        AspectRatio::Vertical,
        AspectRatio::Landscape,
    ];

    /// Ratio as sent to the image model and recorded in manifests.
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Vertical => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Folder name under `ads/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            AspectRatio::Square => "1_1",
            AspectRatio::Vertical => "9_16",
            AspectRatio::Landscape => "16_9",
        }
    }

    pub fn size_label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1 square",
            AspectRatio::Vertical => "9:16 vertical",
            AspectRatio::Landscape => "16:9 landscape",
        }
    }

    pub fn dimensions(self) -> &'static str {
        match self {
            AspectRatio::Square => "1080x1080",
            AspectRatio::Vertical => "1080x1920",
            AspectRatio::Landscape => "1920x1080",
        }
    }

    pub fn placement(self) -> &'static str {
        match self {
            AspectRatio::Square => "Instagram feed and Facebook posts",
            AspectRatio::Vertical => "Instagram Stories, TikTok, and Reels",
            AspectRatio::Landscape => "YouTube and desktop ads",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1:1" | "1_1" | "square" => Some(AspectRatio::Square),
            "9:16" | "9_16" | "vertical" | "portrait" => Some(AspectRatio::Vertical),
            "16:9" | "16_9" | "landscape" | "wide" => Some(AspectRatio::Landscape),
            _ => None,
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A campaign message rendered in one of a region's top languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub code: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSettings {
    pub include_logo: bool,
    pub localize: bool,
}

/// Per-ratio settings for one ad composition batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatPlan {
    square: FormatSettings,
    vertical: FormatSettings,
    landscape: FormatSettings,
}

impl FormatPlan {
    pub fn uniform(settings: FormatSettings) -> Self {
        Self {
            square: settings,
            vertical: settings,
            landscape: settings,
        }
    }

    pub fn get(&self, ratio: AspectRatio) -> FormatSettings {
        match ratio {
            AspectRatio::Square => self.square,
            AspectRatio::Vertical => self.vertical,
            AspectRatio::Landscape => self.landscape,
        }
    }

    pub fn get_mut(&mut self, ratio: AspectRatio) -> &mut FormatSettings {
        match ratio {
            AspectRatio::Square => &mut self.square,
            AspectRatio::Vertical => &mut self.vertical,
            AspectRatio::Landscape => &mut self.landscape,
        }
    }

    pub fn any_localized(&self) -> bool {
        AspectRatio::ALL
            .iter()
            .any(|ratio| self.get(*ratio).localize)
    }
}

/// Working state of one campaign, owned by whoever drives the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSession {
    pub campaign_id: String,
    pub created_at: String,
    pub region: Option<String>,
    pub audience: Option<String>,
    pub message: String,
    pub environments: Vec<PathBuf>,
    pub products: Vec<PathBuf>,
    pub logos: Vec<PathBuf>,
    pub formats: FormatPlan,
}

impl CampaignSession {
    pub fn new() -> Self {
        Self::with_id(generate_campaign_id())
    }

    pub fn with_id(campaign_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            created_at: now_local_iso(),
            region: None,
            audience: None,
            message: String::new(),
            environments: Vec::new(),
            products: Vec::new(),
            logos: Vec::new(),
            formats: FormatPlan::default(),
        }
    }

    pub fn regenerate_id(&mut self) -> &str {
        self.campaign_id = generate_campaign_id();
        &self.campaign_id
    }

    /// Region key when one is selected and non-blank.
    pub fn region_key(&self) -> Option<&str> {
        non_blank(self.region.as_deref())
    }

    pub fn audience_key(&self) -> Option<&str> {
        non_blank(self.audience.as_deref())
    }
}

impl Default for CampaignSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp embedded in generated file names; millisecond resolution.
pub fn asset_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

pub fn export_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn now_local_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_use_alphabet_and_fixed_length() {
        for _ in 0..1_000 {
            let id = generate_campaign_id();
            assert_eq!(id.len(), CAMPAIGN_ID_LEN);
            assert!(is_valid_campaign_id(&id), "unexpected id {id}");
        }
    }

    #[test]
    fn alphabet_excludes_ambiguous_characters() {
        for ambiguous in [b'0', b'1', b'I', b'O'] {
            assert!(!CAMPAIGN_ID_ALPHABET.contains(&ambiguous));
        }
        assert!(!is_valid_campaign_id("ABC10O"));
        assert!(!is_valid_campaign_id("ABCDE"));
    }

    #[test]
    fn regenerate_replaces_id_in_place() {
        let mut session = CampaignSession::with_id("AAAAAA");
        let next = session.regenerate_id().to_string();
        assert_eq!(session.campaign_id, next);
        assert!(is_valid_campaign_id(&next));
    }

    #[test]
    fn aspect_ratio_parse_accepts_label_and_dir_forms() {
        assert_eq!(AspectRatio::parse("1:1"), Some(AspectRatio::Square));
        assert_eq!(AspectRatio::parse("9_16"), Some(AspectRatio::Vertical));
        assert_eq!(AspectRatio::parse(" Landscape "), Some(AspectRatio::Landscape));
        assert_eq!(AspectRatio::parse("4:3"), None);
        assert_eq!(AspectRatio::Landscape.dir_name(), "16_9");
    }

    #[test]
    fn format_plan_tracks_localization_per_ratio() {
        let mut plan = FormatPlan::default();
        assert!(!plan.any_localized());
        plan.get_mut(AspectRatio::Vertical).localize = true;
        assert!(plan.any_localized());
        assert!(!plan.get(AspectRatio::Square).localize);
    }

    #[test]
    fn blank_region_is_treated_as_unselected() {
        let mut session = CampaignSession::with_id("ABCDEF");
        session.region = Some("  ".to_string());
        assert_eq!(session.region_key(), None);
        session.region = Some("europe".to_string());
        assert_eq!(session.region_key(), Some("europe"));
    }
}
