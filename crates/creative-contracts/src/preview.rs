use indexmap::IndexMap;

use crate::catalog::{Audience, Region};

/// Languages shown in the campaign preview.
const PREVIEW_LANGUAGE_LIMIT: usize = 4;

/// Markdown summary of the campaign targeting, or a checklist of what is
/// still missing.
pub fn campaign_preview(
    regions: &IndexMap<String, Region>,
    audiences: &IndexMap<String, Audience>,
    region_key: Option<&str>,
    audience_key: Option<&str>,
    message: &str,
) -> String {
    let (Some(region_key), Some(audience_key)) = (region_key, audience_key) else {
        return missing_preview();
    };
    if message.trim().is_empty() {
        return missing_preview();
    }

    let region_name = regions
        .get(region_key)
        .map(|region| region.name.as_str())
        .unwrap_or("Unknown");
    let audience_name = audiences
        .get(audience_key)
        .map(|audience| audience.name.as_str())
        .unwrap_or("Unknown");
    let languages: Vec<&str> = regions
        .get(region_key)
        .map(|region| {
            region
                .top_languages
                .iter()
                .take(PREVIEW_LANGUAGE_LIMIT)
                .map(|language| language.name.as_str())
                .collect()
        })
        .unwrap_or_default();

    format!(
        "### Campaign Configuration\n\n\
         **Target Region:** {region_name}\n\
         **Target Audience:** {audience_name}\n\
         **Campaign Message:** \"{message}\"\n\n\
         **Localization:** {} languages ({})\n\n\
         ---\n\n\
         *Ready to generate professional ad creatives in 3 aspect ratios*",
        languages.len(),
        languages.join(", ")
    )
}

fn missing_preview() -> String {
    "### Campaign Preview\n\n\
     *Configure the campaign targeting and message to see a preview here.*\n\n\
     **Required:**\n\
     - Target region\n\
     - Target audience\n\
     - Campaign message"
        .to_string()
}
