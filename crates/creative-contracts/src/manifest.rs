use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::campaign::{export_timestamp, AspectRatio, CampaignSession, Translation};

pub const MANIFEST_FILE: &str = "campaign_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignManifest {
    pub campaign: CampaignInfo,
    pub targeting: Targeting,
    /// Duplicate of `targeting.region` for readers of the older layout.
    pub region: Option<String>,
    pub messaging: Messaging,
    pub assets: AssetSelection,
    pub generation_settings: GenerationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub name: String,
    pub id: String,
    pub created_at: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    pub region: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Messaging {
    pub primary_message: String,
    pub localizations_enabled: IndexMap<String, bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSelection {
    pub environments: Vec<String>,
    pub products: Vec<String>,
    pub logos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub aspect_ratios: IndexMap<String, RatioSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioSettings {
    pub enabled: bool,
    pub include_logo: bool,
    pub localize: bool,
}

pub fn build_manifest(session: &CampaignSession, translations: &[Translation]) -> CampaignManifest {
    let region = session.region_key().map(str::to_string);
    let audience = session.audience_key().map(str::to_string);

    let mut localizations_enabled = IndexMap::new();
    let mut aspect_ratios = IndexMap::new();
    for ratio in AspectRatio::ALL {
        let settings = session.formats.get(ratio);
        localizations_enabled.insert(ratio.label().to_string(), settings.localize);
        aspect_ratios.insert(
            ratio.label().to_string(),
            RatioSettings {
                enabled: true,
                include_logo: settings.include_logo,
                localize: settings.localize,
            },
        );
    }

    CampaignManifest {
        campaign: CampaignInfo {
            name: format!("Campaign {}", session.campaign_id),
            id: session.campaign_id.clone(),
            created_at: session.created_at.clone(),
            source: "manual".to_string(),
            kind: "manual_generation".to_string(),
        },
        targeting: Targeting {
            region: region.clone(),
            audience,
        },
        region,
        messaging: Messaging {
            primary_message: session.message.clone(),
            localizations_enabled,
            translations: translations.to_vec(),
        },
        assets: AssetSelection {
            environments: path_strings(&session.environments),
            products: path_strings(&session.products),
            logos: path_strings(&session.logos),
        },
        generation_settings: GenerationSettings { aspect_ratios },
    }
}

pub fn manifest_json(manifest: &CampaignManifest) -> Result<String> {
    Ok(serde_json::to_string_pretty(manifest)?)
}

/// Writes `<campaign_dir>/campaign_config.json`, replacing any previous copy.
pub fn write_manifest(manifest: &CampaignManifest, campaign_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(campaign_dir)
        .with_context(|| format!("failed creating {}", campaign_dir.display()))?;
    let path = campaign_dir.join(MANIFEST_FILE);
    std::fs::write(&path, manifest_json(manifest)?)
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}

/// Snapshot of the session into `<exports_dir>/campaign_<timestamp>.json`.
pub fn export_campaign(
    exports_dir: &Path,
    session: &CampaignSession,
    translations: &[Translation],
) -> Result<PathBuf> {
    let mut manifest = build_manifest(session, translations);
    manifest.campaign.kind = "export".to_string();
    std::fs::create_dir_all(exports_dir)
        .with_context(|| format!("failed creating {}", exports_dir.display()))?;
    let path = exports_dir.join(format!("campaign_{}.json", export_timestamp()));
    std::fs::write(&path, manifest_json(&manifest)?)
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSchema {
    /// `campaign_config.json` written next to generated assets.
    Campaign,
    /// Flat export with `campaign_config` / `selected_assets` sections.
    LegacyExport,
}

/// Campaign selections recovered from a manifest file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCampaign {
    pub schema: ManifestSchema,
    pub campaign_id: Option<String>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub audience: Option<String>,
    pub message: String,
    pub environments: Vec<PathBuf>,
    pub products: Vec<PathBuf>,
    pub logos: Vec<PathBuf>,
}

impl LoadedCampaign {
    /// Copies the recovered selections into a session. The session keeps its
    /// own ID unless the manifest carried a valid one.
    pub fn apply_to(&self, session: &mut CampaignSession) {
        if let Some(id) = self
            .campaign_id
            .as_deref()
            .filter(|id| crate::campaign::is_valid_campaign_id(id))
        {
            session.campaign_id = id.to_string();
        }
        session.region = self.region.clone();
        session.audience = self.audience.clone();
        session.message = self.message.clone();
        session.environments = self.environments.clone();
        session.products = self.products.clone();
        session.logos = self.logos.clone();
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Loaded campaign: {} (ID: {})\n",
            self.name.as_deref().unwrap_or("Campaign"),
            self.campaign_id.as_deref().unwrap_or("Unknown")
        );
        out.push_str(&format!(
            "- Region: {}\n",
            self.region.as_deref().unwrap_or("Not specified")
        ));
        out.push_str(&format!(
            "- Audience: {}\n",
            self.audience.as_deref().unwrap_or("Not specified")
        ));
        out.push_str(&format!("- Message: {} characters\n", self.message.chars().count()));
        out.push_str(&format!("- Environments: {} asset(s)\n", self.environments.len()));
        out.push_str(&format!("- Products: {} asset(s)\n", self.products.len()));
        out
    }
}

/// Reads either manifest layout.
pub fn load_campaign(path: &Path) -> Result<LoadedCampaign> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    let Some(obj) = payload.as_object() else {
        anyhow::bail!("{} is not a JSON object", path.display());
    };
    if obj.contains_key("campaign_config") || obj.contains_key("selected_assets") {
        return Ok(load_legacy(obj));
    }

    let campaign = object_at(obj, "campaign");
    let targeting = obj.get("targeting").and_then(Value::as_object);
    let region = match targeting {
        Some(targeting) => string_at(targeting, "region"),
        None => string_at(obj, "region"),
    };
    let audience = targeting.and_then(|targeting| string_at(targeting, "audience"));
    let messaging = object_at(obj, "messaging");
    let assets = object_at(obj, "assets");

    Ok(LoadedCampaign {
        schema: ManifestSchema::Campaign,
        campaign_id: string_at(&campaign, "id"),
        name: string_at(&campaign, "name"),
        region,
        audience,
        message: string_at(&messaging, "primary_message").unwrap_or_default(),
        environments: paths_at(&assets, "environments"),
        products: paths_at(&assets, "products"),
        logos: paths_at(&assets, "logos"),
    })
}

fn load_legacy(obj: &Map<String, Value>) -> LoadedCampaign {
    let config = object_at(obj, "campaign_config");
    let key_of = |section: &str| {
        config
            .get(section)
            .and_then(Value::as_object)
            .and_then(|entry| string_at(entry, "key"))
    };
    let messaging = object_at(obj, "messaging");
    let selected = object_at(obj, "selected_assets");

    LoadedCampaign {
        schema: ManifestSchema::LegacyExport,
        campaign_id: None,
        name: None,
        region: key_of("region"),
        audience: key_of("audience"),
        message: string_at(&messaging, "original_message").unwrap_or_default(),
        environments: paths_at(&selected, "environments"),
        products: paths_at(&selected, "product_views"),
        logos: Vec::new(),
    }
}

fn object_at(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn string_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

fn paths_at(obj: &Map<String, Value>, key: &str) -> Vec<PathBuf> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_str)
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::campaign::FormatSettings;

    fn sample_session() -> CampaignSession {
        let mut session = CampaignSession::with_id("K7QX2M");
        session.region = Some("europe".to_string());
        session.audience = Some("gen_z".to_string());
        session.message = "Clean naturally.".to_string();
        session.environments = vec![PathBuf::from("outputs/K7QX2M/environments/environment_1.png")];
        session.products = vec![
            PathBuf::from("outputs/K7QX2M/products/acme-soap/front.png"),
            PathBuf::from("outputs/K7QX2M/products/acme-soap/back.png"),
        ];
        session.logos = vec![PathBuf::from("products/acme-soap/photos/logo/logo.png")];
        session.formats.get_mut(AspectRatio::Square).localize = true;
        session.formats.get_mut(AspectRatio::Landscape).include_logo = true;
        session
    }

    #[test]
    fn manifest_round_trips_selections() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let session = sample_session();
        let manifest = build_manifest(&session, &[]);
        let path = write_manifest(&manifest, &temp.path().join("K7QX2M"))?;
        assert!(path.ends_with(MANIFEST_FILE));

        let loaded = load_campaign(&path)?;
        assert_eq!(loaded.schema, ManifestSchema::Campaign);
        assert_eq!(loaded.campaign_id.as_deref(), Some("K7QX2M"));
        assert_eq!(loaded.region, session.region);
        assert_eq!(loaded.audience, session.audience);
        assert_eq!(loaded.message, session.message);
        assert_eq!(loaded.environments, session.environments);
        assert_eq!(loaded.products, session.products);
        assert_eq!(loaded.logos, session.logos);

        let mut restored = CampaignSession::with_id("AAAAAA");
        loaded.apply_to(&mut restored);
        assert_eq!(restored.campaign_id, "K7QX2M");
        assert_eq!(restored.products, session.products);
        Ok(())
    }

    #[test]
    fn manifest_json_shape() -> anyhow::Result<()> {
        let session = sample_session();
        let translations = vec![Translation {
            language: "German".to_string(),
            code: "de".to_string(),
            text: "Natürlich sauber.".to_string(),
        }];
        let value = serde_json::to_value(build_manifest(&session, &translations))?;

        assert_eq!(value["campaign"]["id"], json!("K7QX2M"));
        assert_eq!(value["campaign"]["name"], json!("Campaign K7QX2M"));
        assert_eq!(value["campaign"]["type"], json!("manual_generation"));
        assert_eq!(value["targeting"]["region"], json!("europe"));
        assert_eq!(value["region"], json!("europe"));
        assert_eq!(value["messaging"]["localizations_enabled"]["1:1"], json!(true));
        assert_eq!(value["messaging"]["translations"][0]["code"], json!("de"));

        let ratios = value["generation_settings"]["aspect_ratios"]
            .as_object()
            .cloned()
            .unwrap_or_default();
        let keys: Vec<&str> = ratios.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        for label in ["1:1", "9:16", "16:9"] {
            assert_eq!(ratios[label]["enabled"], json!(true));
        }
        assert_eq!(ratios["16:9"]["include_logo"], json!(true));
        assert_eq!(ratios["9:16"], json!({"enabled": true, "include_logo": false, "localize": false}));
        Ok(())
    }

    #[test]
    fn empty_translations_are_omitted() -> anyhow::Result<()> {
        let value = serde_json::to_value(build_manifest(&sample_session(), &[]))?;
        assert!(value["messaging"].get("translations").is_none());
        Ok(())
    }

    #[test]
    fn write_manifest_overwrites_previous_copy() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut session = sample_session();
        write_manifest(&build_manifest(&session, &[]), temp.path())?;
        session.message = "Second pass".to_string();
        session.formats = crate::campaign::FormatPlan::uniform(FormatSettings::default());
        let path = write_manifest(&build_manifest(&session, &[]), temp.path())?;

        let loaded = load_campaign(&path)?;
        assert_eq!(loaded.message, "Second pass");
        Ok(())
    }

    #[test]
    fn loads_legacy_export_layout() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("campaign_20250101_120000.json");
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&json!({
                "campaign_config": {
                    "created_at": "2025-01-01T12:00:00",
                    "region": {"key": "asia_pacific", "name": "Asia Pacific"},
                    "audience": null
                },
                "messaging": {"original_message": "Refresh naturally."},
                "selected_assets": {
                    "environments": ["env/a.png"],
                    "product_views": ["prod/front.png", "prod/back.png"]
                }
            }))?,
        )?;

        let loaded = load_campaign(&path)?;
        assert_eq!(loaded.schema, ManifestSchema::LegacyExport);
        assert_eq!(loaded.region.as_deref(), Some("asia_pacific"));
        assert_eq!(loaded.audience, None);
        assert_eq!(loaded.message, "Refresh naturally.");
        assert_eq!(loaded.products.len(), 2);
        assert!(loaded.logos.is_empty());
        Ok(())
    }

    #[test]
    fn top_level_region_used_without_targeting() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join(MANIFEST_FILE);
        std::fs::write(
            &path,
            r#"{"campaign": {"id": "ABCDEF"}, "region": "oceania", "messaging": {"primary_message": "Hi"}}"#,
        )?;
        let loaded = load_campaign(&path)?;
        assert_eq!(loaded.region.as_deref(), Some("oceania"));
        assert_eq!(loaded.audience, None);
        assert!(loaded.environments.is_empty());
        assert!(loaded.summary().contains("- Region: oceania"));
        Ok(())
    }

    #[test]
    fn export_writes_timestamped_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = export_campaign(&temp.path().join("campaigns"), &sample_session(), &[])?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        assert!(name.starts_with("campaign_") && name.ends_with(".json"));
        let loaded = load_campaign(&path)?;
        assert_eq!(loaded.schema, ManifestSchema::Campaign);
        assert_eq!(loaded.audience.as_deref(), Some("gen_z"));
        Ok(())
    }

    #[test]
    fn invalid_json_is_an_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{not json")?;
        assert!(load_campaign(&path).is_err());
        assert!(load_campaign(&temp.path().join("missing.json")).is_err());
        Ok(())
    }
}
