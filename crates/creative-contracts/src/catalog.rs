use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

pub const REGIONS_FILE: &str = "regions.yaml";
pub const AUDIENCES_FILE: &str = "audiences.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub top_languages: Vec<Language>,
    #[serde(deserialize_with = "null_as_default")]
    pub cultural_context: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub visual_preferences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audience {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub age_range: String,
    #[serde(deserialize_with = "null_as_default")]
    pub demographics: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub psychographics: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub messaging_preferences: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegionsFile {
    #[serde(deserialize_with = "null_as_default")]
    regions: IndexMap<String, Region>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AudiencesFile {
    #[serde(deserialize_with = "null_as_default")]
    audiences: IndexMap<String, Audience>,
}

/// Regions keyed as in `config/regions.yaml`, in file order.
///
/// A missing file means "no regions"; a malformed one is an error.
pub fn load_regions(config_dir: &Path) -> Result<IndexMap<String, Region>> {
    let parsed: Option<RegionsFile> = read_yaml(&config_dir.join(REGIONS_FILE))?;
    Ok(parsed.map(|file| file.regions).unwrap_or_default())
}

pub fn load_audiences(config_dir: &Path) -> Result<IndexMap<String, Audience>> {
    let parsed: Option<AudiencesFile> = read_yaml(&config_dir.join(AUDIENCES_FILE))?;
    Ok(parsed.map(|file| file.audiences).unwrap_or_default())
}

/// `(display name, key)` pairs for pickers; the key stands in for a blank name.
pub fn region_choices(regions: &IndexMap<String, Region>) -> Vec<(String, String)> {
    regions
        .iter()
        .map(|(key, region)| (display_name(&region.name, key), key.clone()))
        .collect()
}

pub fn audience_choices(audiences: &IndexMap<String, Audience>) -> Vec<(String, String)> {
    audiences
        .iter()
        .map(|(key, audience)| (display_name(&audience.name, key), key.clone()))
        .collect()
}

/// Reads a YAML document; `None` when the file is absent or blank.
pub(crate) fn read_yaml<T>(path: &Path) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let parsed = serde_yaml::from_str::<T>(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    Ok(Some(parsed))
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn display_name(name: &str, key: &str) -> String {
    if name.trim().is_empty() {
        key.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGIONS_YAML: &str = r#"
regions:
  europe:
    name: Europe
    description: Western and Northern Europe
    top_languages:
      - code: en
        name: English
      - code: de
        name: German
      - code: fr
        name: French
    cultural_context:
      - Sustainability focus
  oceania:
    name: Oceania
    cultural_context:
"#;

    #[test]
    fn missing_files_yield_empty_mappings() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        assert!(load_regions(temp.path())?.is_empty());
        assert!(load_audiences(temp.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn regions_keep_file_order_and_languages() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::write(temp.path().join(REGIONS_FILE), REGIONS_YAML)?;

        let regions = load_regions(temp.path())?;
        let keys: Vec<&str> = regions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["europe", "oceania"]);

        let europe = &regions["europe"];
        assert_eq!(europe.top_languages.len(), 3);
        assert_eq!(europe.top_languages[1].code, "de");
        assert_eq!(europe.cultural_context, vec!["Sustainability focus"]);

        let oceania = &regions["oceania"];
        assert!(oceania.top_languages.is_empty());
        assert!(oceania.cultural_context.is_empty());
        assert_eq!(oceania.description, "");
        Ok(())
    }

    #[test]
    fn listed_languages_are_never_dropped() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::write(temp.path().join(REGIONS_FILE), REGIONS_YAML)?;
        let raw: serde_yaml::Value = serde_yaml::from_str(REGIONS_YAML)?;
        let regions = load_regions(temp.path())?;

        let listed = raw["regions"]
            .as_mapping()
            .cloned()
            .unwrap_or_default();
        for (key, body) in listed {
            let key = key.as_str().unwrap_or_default();
            let has_languages = body
                .get("top_languages")
                .and_then(serde_yaml::Value::as_sequence)
                .map(|rows| !rows.is_empty())
                .unwrap_or(false);
            if has_languages {
                assert!(!regions[key].top_languages.is_empty());
            }
        }
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::write(
            temp.path().join(AUDIENCES_FILE),
            "audiences:\n  gen_z: [unterminated\n",
        )?;
        let err = load_audiences(temp.path()).err().map(|err| format!("{err:#}"));
        assert!(err.unwrap_or_default().contains("failed parsing"));
        Ok(())
    }

    #[test]
    fn choices_fall_back_to_key_for_blank_names() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::write(
            temp.path().join(AUDIENCES_FILE),
            "audiences:\n  gen_z:\n    name: Gen Z\n    age_range: 18-26\n  parents: {}\n",
        )?;
        let audiences = load_audiences(temp.path())?;
        assert_eq!(audiences["gen_z"].age_range, "18-26");
        assert_eq!(
            audience_choices(&audiences),
            vec![
                ("Gen Z".to_string(), "gen_z".to_string()),
                ("parents".to_string(), "parents".to_string()),
            ]
        );
        Ok(())
    }
}
