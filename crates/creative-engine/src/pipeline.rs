use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use creative_contracts::assets::{AssetLocator, ImageKind};
use creative_contracts::campaign::{asset_timestamp, AspectRatio, CampaignSession, Translation};
use creative_contracts::catalog::load_regions;
use creative_contracts::events::{EventPayload, EventWriter};
use creative_contracts::layout::ProjectLayout;
use creative_contracts::manifest::{
    build_manifest, export_campaign, manifest_json, write_manifest,
};
use creative_contracts::prompts::{
    ad_copy_or_fallback, ad_prompt, combined_view_prompt, environment_prompt,
    product_view_prompt, ProductView, ENVIRONMENT_VARIATIONS,
};
use image::ImageFormat;
use serde_json::{json, Value};

use crate::providers::{ImageModel, ImageRequest};
use crate::translate::{message_translations, Translator};
use crate::{error_chain_text, STATUS_ERROR_CHARS};

/// Folder and file code used for ads rendered with the untranslated message.
pub const ORIGINAL_LANGUAGE_CODE: &str = "en";
const COMBINED_DIR: &str = "combined";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Six views per product, each from that product's own photos.
    Separate,
    /// Six views showing every selected product together.
    Combined,
}

impl ViewMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "separate" => Some(ViewMode::Separate),
            "combined" | "together" => Some(ViewMode::Combined),
            _ => None,
        }
    }
}

/// One image-model call and where its result lands.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationUnit {
    pub label: String,
    pub request: ImageRequest,
    pub aspect_ratio: AspectRatio,
    pub output_dir: PathBuf,
    pub file_stem: String,
}

impl GenerationUnit {
    fn new(
        label: String,
        prompt: String,
        references: Vec<PathBuf>,
        aspect_ratio: AspectRatio,
        output_dir: PathBuf,
        file_stem: String,
    ) -> Self {
        Self {
            label,
            request: ImageRequest {
                prompt,
                references,
                aspect_ratio: aspect_ratio.label().to_string(),
            },
            aspect_ratio,
            output_dir,
            file_stem,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        operation: &'static str,
        total: usize,
    },
    UnitSucceeded {
        index: usize,
        total: usize,
        label: String,
        path: PathBuf,
    },
    UnitSkipped {
        index: usize,
        total: usize,
        label: String,
        reason: String,
    },
    Finished {
        operation: &'static str,
        written: usize,
        skipped: usize,
    },
}

impl ProgressEvent {
    /// Completed share of the run in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        match self {
            ProgressEvent::Started { total, .. } if *total > 0 => 0.0,
            ProgressEvent::UnitSucceeded { index, total, .. }
            | ProgressEvent::UnitSkipped { index, total, .. }
                if *total > 0 =>
            {
                *index as f64 / *total as f64
            }
            _ => 1.0,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ProgressEvent::Started { .. } => "generation_started",
            ProgressEvent::UnitSucceeded { .. } => "unit_succeeded",
            ProgressEvent::UnitSkipped { .. } => "unit_skipped",
            ProgressEvent::Finished { .. } => "generation_finished",
        }
    }

    fn payload(&self) -> EventPayload {
        let value = match self {
            ProgressEvent::Started { total, .. } => json!({ "total": total }),
            ProgressEvent::UnitSucceeded {
                index,
                total,
                label,
                path,
            } => json!({
                "index": index,
                "total": total,
                "label": label,
                "path": path.to_string_lossy(),
            }),
            ProgressEvent::UnitSkipped {
                index,
                total,
                label,
                reason,
            } => json!({
                "index": index,
                "total": total,
                "label": label,
                "reason": reason,
            }),
            ProgressEvent::Finished {
                written,
                skipped,
                ..
            } => json!({ "written": written, "skipped": skipped }),
        };
        match value {
            Value::Object(map) => map,
            _ => EventPayload::new(),
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started { operation, total } => {
                write!(f, "{operation}: {total} image(s) planned")
            }
            ProgressEvent::UnitSucceeded {
                index,
                total,
                label,
                path,
            } => write!(f, "[{index}/{total}] {label} -> {}", path.display()),
            ProgressEvent::UnitSkipped {
                index,
                total,
                label,
                reason,
            } => write!(f, "[{index}/{total}] {label} skipped: {reason}"),
            ProgressEvent::Finished {
                operation,
                written,
                skipped,
            } => write!(f, "{operation}: {written} written, {skipped} skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenAsset {
    pub label: String,
    pub aspect_ratio: AspectRatio,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedUnit {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub written: Vec<WrittenAsset>,
    pub skipped: Vec<SkippedUnit>,
}

impl RunReport {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.written.iter().map(|asset| asset.path.clone()).collect()
    }
}

/// Sequential execution of planned units.
///
/// Yields `Started`, one event per unit, then `Finished`. Dropping the run
/// early stops further calls; assets already written stay on disk.
pub struct GenerationRun<'a> {
    model: &'a dyn ImageModel,
    events: EventWriter,
    operation: &'static str,
    units: Vec<GenerationUnit>,
    position: usize,
    started: bool,
    finished: bool,
    report: RunReport,
}

impl<'a> GenerationRun<'a> {
    pub fn new(
        model: &'a dyn ImageModel,
        events: EventWriter,
        operation: &'static str,
        units: Vec<GenerationUnit>,
    ) -> Self {
        Self {
            model,
            events: events.with_operation(operation),
            operation,
            units,
            position: 0,
            started: false,
            finished: false,
            report: RunReport::default(),
        }
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    pub fn remaining(&self) -> usize {
        self.units.len().saturating_sub(self.position)
    }

    pub fn fraction(&self) -> f64 {
        if self.units.is_empty() {
            return 1.0;
        }
        self.position as f64 / self.units.len() as f64
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    /// Drives the run to completion, handing each event to `on_progress`.
    pub fn run(mut self, mut on_progress: impl FnMut(&ProgressEvent)) -> RunReport {
        while let Some(event) = self.next() {
            on_progress(&event);
        }
        self.report
    }

    fn execute(&self, unit: &GenerationUnit) -> Result<PathBuf> {
        let generated = self
            .model
            .generate(&unit.request)?
            .ok_or_else(|| anyhow!("{} returned no image", self.model.name()))?;
        let decoded = image::load_from_memory(&generated.bytes)
            .context("generated image could not be decoded")?;
        fs::create_dir_all(&unit.output_dir)
            .with_context(|| format!("failed creating {}", unit.output_dir.display()))?;
        let path = unit
            .output_dir
            .join(format!("{}_{}.png", unit.file_stem, asset_timestamp()));
        decoded
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("failed writing {}", path.display()))?;
        Ok(path)
    }

    fn record(&self, event: &ProgressEvent) {
        if let Err(err) = self.events.emit(event.event_type(), event.payload()) {
            tracing::warn!(
                path = %self.events.path().display(),
                "failed to append progress event: {err:#}"
            );
        }
    }
}

impl Iterator for GenerationRun<'_> {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        let total = self.units.len();
        let event = if !self.started {
            self.started = true;
            tracing::info!(operation = self.operation, total, "generation started");
            ProgressEvent::Started {
                operation: self.operation,
                total,
            }
        } else if let Some(unit) = self.units.get(self.position) {
            let index = self.position + 1;
            let outcome = self.execute(unit);
            let label = unit.label.clone();
            let aspect_ratio = unit.aspect_ratio;
            self.position += 1;
            match outcome {
                Ok(path) => {
                    tracing::info!(index, total, label = %label, path = %path.display(), "image written");
                    self.report.written.push(WrittenAsset {
                        label: label.clone(),
                        aspect_ratio,
                        path: path.clone(),
                    });
                    ProgressEvent::UnitSucceeded {
                        index,
                        total,
                        label,
                        path,
                    }
                }
                Err(err) => {
                    let reason = error_chain_text(&err, STATUS_ERROR_CHARS);
                    tracing::warn!(index, total, label = %label, "unit skipped: {reason}");
                    self.report.skipped.push(SkippedUnit {
                        label: label.clone(),
                        reason: reason.clone(),
                    });
                    ProgressEvent::UnitSkipped {
                        index,
                        total,
                        label,
                        reason,
                    }
                }
            }
        } else {
            self.finished = true;
            tracing::info!(
                operation = self.operation,
                written = self.report.written.len(),
                skipped = self.report.skipped.len(),
                "generation finished"
            );
            ProgressEvent::Finished {
                operation: self.operation,
                written: self.report.written.len(),
                skipped: self.report.skipped.len(),
            }
        };
        self.record(&event);
        Some(event)
    }
}

/// Result of checking an operation's preconditions.
pub enum Prepared<T> {
    Ready(T),
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    /// A precondition was not met; no call was made.
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    pub images: Vec<PathBuf>,
    pub skipped: Vec<SkippedUnit>,
}

impl GenerationOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Rejected,
            message: message.into(),
            images: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            message: message.into(),
            images: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn from_error(context: &str, err: &anyhow::Error) -> Self {
        Self::failed(format!(
            "{context}: {}",
            error_chain_text(err, STATUS_ERROR_CHARS)
        ))
    }

    /// Success when anything was written; a run whose every unit was skipped
    /// is a failure.
    fn from_report(report: RunReport, success_message: impl FnOnce(usize) -> String) -> Self {
        let images = report.paths();
        if images.is_empty() && !report.skipped.is_empty() {
            let first_reason = report
                .skipped
                .first()
                .map(|unit| unit.reason.clone())
                .unwrap_or_default();
            return Self {
                status: OutcomeStatus::Failed,
                message: format!(
                    "No images were generated ({} attempt(s) failed): {first_reason}",
                    report.skipped.len()
                ),
                images,
                skipped: report.skipped,
            };
        }
        Self {
            status: OutcomeStatus::Succeeded,
            message: success_message(images.len()),
            images,
            skipped: report.skipped,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenManifest {
    pub path: PathBuf,
    pub json: String,
}

/// Ad run plus the manifest written while preparing it.
pub struct AdPlan<'a> {
    pub manifest: WrittenManifest,
    pub translations: Vec<Translation>,
    pub step: Prepared<GenerationRun<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdOutcome {
    pub outcome: GenerationOutcome,
    pub by_ratio: BTreeMap<AspectRatio, Vec<PathBuf>>,
    pub manifest: Option<WrittenManifest>,
}

impl AdOutcome {
    fn without_manifest(outcome: GenerationOutcome) -> Self {
        Self {
            outcome,
            by_ratio: BTreeMap::new(),
            manifest: None,
        }
    }
}

const MISSING_CREDENTIAL: &str = "Please configure your API key first";

/// Plans and runs generation batches for one project root.
pub struct CampaignPipeline {
    layout: ProjectLayout,
    model: Box<dyn ImageModel>,
    translator: Box<dyn Translator>,
}

impl CampaignPipeline {
    pub fn new(
        layout: ProjectLayout,
        model: Box<dyn ImageModel>,
        translator: Box<dyn Translator>,
    ) -> Self {
        Self {
            layout,
            model,
            translator,
        }
    }

    pub fn locator(&self) -> AssetLocator {
        AssetLocator::new(self.layout.products_dir())
    }

    /// Translations of the session message into the selected region's
    /// languages; empty without a region or message.
    pub fn translations(&self, session: &CampaignSession) -> Result<Vec<Translation>> {
        let Some(region_key) = session.region_key() else {
            return Ok(Vec::new());
        };
        if session.message.trim().is_empty() {
            return Ok(Vec::new());
        }
        let regions = load_regions(&self.layout.config_dir())?;
        Ok(message_translations(
            self.translator.as_ref(),
            &regions,
            &session.message,
            region_key,
        ))
    }

    /// Snapshot of the session, with its translations, into
    /// `outputs/campaigns/`.
    pub fn export(&self, session: &CampaignSession) -> Result<PathBuf> {
        let translations = self.translations(session)?;
        export_campaign(&self.layout.exports_dir(), session, &translations)
    }

    fn events(&self, session: &CampaignSession) -> EventWriter {
        EventWriter::for_campaign(
            &self.layout.campaign_dir(&session.campaign_id),
            &session.campaign_id,
        )
    }

    pub fn environment_run(
        &self,
        session: &CampaignSession,
        description: &str,
    ) -> Result<Prepared<GenerationRun<'_>>> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(Prepared::Rejected(
                "Please enter an environment prompt first".to_string(),
            ));
        }
        if !self.model.has_credential() {
            return Ok(Prepared::Rejected(MISSING_CREDENTIAL.to_string()));
        }

        let output_dir = self
            .layout
            .campaign_dir(&session.campaign_id)
            .join("environments");
        create_dir(&output_dir)?;
        let units = (1..=ENVIRONMENT_VARIATIONS)
            .map(|variation| {
                GenerationUnit::new(
                    format!("environment {variation}/{ENVIRONMENT_VARIATIONS}"),
                    environment_prompt(description, variation),
                    Vec::new(),
                    AspectRatio::Square,
                    output_dir.clone(),
                    format!("environment_{variation}"),
                )
            })
            .collect();
        Ok(Prepared::Ready(GenerationRun::new(
            self.model.as_ref(),
            self.events(session),
            "environments",
            units,
        )))
    }

    /// Four background variations of one scene description.
    pub fn generate_environments(
        &self,
        session: &CampaignSession,
        description: &str,
        on_progress: impl FnMut(&ProgressEvent),
    ) -> GenerationOutcome {
        let run = match self.environment_run(session, description) {
            Ok(Prepared::Ready(run)) => run,
            Ok(Prepared::Rejected(message)) => return GenerationOutcome::rejected(message),
            Err(err) => return GenerationOutcome::from_error("Error during generation", &err),
        };
        let campaign_dir = self.layout.campaign_dir(&session.campaign_id);
        let report = run.run(on_progress);
        GenerationOutcome::from_report(report, |count| {
            format!(
                "Successfully generated {count} environment backgrounds!\n\n\
                 **Campaign Folder:** `{}/`\n\n\
                 Environments saved to: `{}/`",
                campaign_dir.display(),
                campaign_dir.join("environments").display()
            )
        })
    }

    pub fn product_view_run(
        &self,
        session: &CampaignSession,
        slugs: &[String],
        mode: ViewMode,
    ) -> Result<Prepared<GenerationRun<'_>>> {
        let slugs: Vec<&str> = slugs
            .iter()
            .map(|slug| slug.trim())
            .filter(|slug| !slug.is_empty())
            .collect();
        if slugs.is_empty() {
            return Ok(Prepared::Rejected(
                "Please select at least one product first".to_string(),
            ));
        }
        if !self.model.has_credential() {
            return Ok(Prepared::Rejected(MISSING_CREDENTIAL.to_string()));
        }

        let products_dir = self
            .layout
            .campaign_dir(&session.campaign_id)
            .join("products");
        let locator = self.locator();
        let units = match mode {
            ViewMode::Separate => {
                let mut units = Vec::new();
                for slug in &slugs {
                    let Some(product) = locator.load_product(slug)? else {
                        tracing::warn!(slug, "product has no config.yaml; skipping");
                        continue;
                    };
                    let photos = readable_images(locator.list_images(slug, ImageKind::Product));
                    if photos.is_empty() {
                        tracing::warn!(slug, "product has no readable photos; skipping");
                        continue;
                    }
                    let output_dir = products_dir.join(slug);
                    create_dir(&output_dir)?;
                    for view in ProductView::ALL {
                        units.push(GenerationUnit::new(
                            format!("{} {} view", product.name, view.name()),
                            product_view_prompt(&product.name, &product.description, view),
                            photos.clone(),
                            AspectRatio::Square,
                            output_dir.clone(),
                            view.name().to_string(),
                        ));
                    }
                }
                if units.is_empty() {
                    return Ok(Prepared::Rejected(
                        "None of the selected products has a config and readable photos"
                            .to_string(),
                    ));
                }
                units
            }
            ViewMode::Combined => {
                let mut names = Vec::new();
                let mut descriptions = Vec::new();
                let mut photos = Vec::new();
                for slug in &slugs {
                    let Some(product) = locator.load_product(slug)? else {
                        tracing::warn!(slug, "product has no config.yaml; skipping");
                        continue;
                    };
                    names.push(product.name);
                    descriptions.push(product.description);
                    photos.extend(readable_images(locator.list_images(slug, ImageKind::Product)));
                }
                if photos.is_empty() {
                    return Err(anyhow!("Could not load any product photos"));
                }
                let output_dir = products_dir.join(COMBINED_DIR);
                create_dir(&output_dir)?;
                ProductView::ALL
                    .into_iter()
                    .map(|view| {
                        GenerationUnit::new(
                            format!("combined {} view", view.name()),
                            combined_view_prompt(&names, &descriptions, view),
                            photos.clone(),
                            AspectRatio::Square,
                            output_dir.clone(),
                            format!("{COMBINED_DIR}_{}", view.name()),
                        )
                    })
                    .collect()
            }
        };
        let operation = match mode {
            ViewMode::Separate => "product_views",
            ViewMode::Combined => "combined_views",
        };
        Ok(Prepared::Ready(GenerationRun::new(
            self.model.as_ref(),
            self.events(session),
            operation,
            units,
        )))
    }

    /// Six camera angles per product, or six combined shots.
    pub fn generate_product_views(
        &self,
        session: &CampaignSession,
        slugs: &[String],
        mode: ViewMode,
        on_progress: impl FnMut(&ProgressEvent),
    ) -> GenerationOutcome {
        let run = match self.product_view_run(session, slugs, mode) {
            Ok(Prepared::Ready(run)) => run,
            Ok(Prepared::Rejected(message)) => return GenerationOutcome::rejected(message),
            Err(err) => return GenerationOutcome::from_error("Error during generation", &err),
        };
        let campaign_dir = self.layout.campaign_dir(&session.campaign_id);
        let product_count = slugs.len();
        let report = run.run(on_progress);
        GenerationOutcome::from_report(report, |count| match mode {
            ViewMode::Separate => format!(
                "Successfully generated {count} separate product views for {product_count} product(s)!\n\n\
                 **Campaign Folder:** `{}/`\n\n\
                 Products saved to: `{}/`",
                campaign_dir.display(),
                campaign_dir.join("products").display()
            ),
            ViewMode::Combined => format!(
                "Successfully generated {count} combined product views showing {product_count} product(s) together!\n\n\
                 **Campaign Folder:** `{}/`\n\n\
                 Products saved to: `{}/`",
                campaign_dir.display(),
                campaign_dir.join("products").join(COMBINED_DIR).display()
            ),
        })
    }

    /// Copies the selected assets, writes the manifest and plans one ad per
    /// ratio (or per language for localized ratios).
    pub fn ad_run(&self, session: &CampaignSession) -> Result<Prepared<AdPlan<'_>>> {
        if session.environments.is_empty() {
            return Ok(Prepared::Rejected(
                "Please select at least one environment first".to_string(),
            ));
        }
        if session.products.is_empty() {
            return Ok(Prepared::Rejected(
                "Please select at least one product view first".to_string(),
            ));
        }
        if !self.model.has_credential() {
            return Ok(Prepared::Rejected(MISSING_CREDENTIAL.to_string()));
        }

        let campaign_dir = self.layout.campaign_dir(&session.campaign_id);
        copy_into(&campaign_dir.join("environments"), &session.environments)?;
        copy_into(&campaign_dir.join("products"), &session.products)?;

        let translations = self.translations(session)?;
        let manifest = build_manifest(session, &translations);
        let manifest = WrittenManifest {
            path: write_manifest(&manifest, &campaign_dir)?,
            json: manifest_json(&manifest)?,
        };

        if session.formats.any_localized() {
            let rejection = if session.region_key().is_none() {
                Some("Please select a region to use localization.")
            } else if translations.is_empty() {
                Some("Could not get translations. Please select a region or disable localization.")
            } else {
                None
            };
            if let Some(message) = rejection {
                return Ok(Prepared::Ready(AdPlan {
                    manifest,
                    translations,
                    step: Prepared::Rejected(message.to_string()),
                }));
            }
        }

        let environment = session.environments[0].clone();
        let product = session.products[0].clone();
        let logo = session.logos.first().cloned();
        let ads_dir = campaign_dir.join("ads");
        let mut units = Vec::new();
        for ratio in AspectRatio::ALL {
            let settings = session.formats.get(ratio);
            let include_logo = settings.include_logo && logo.is_some();
            let mut references = vec![environment.clone(), product.clone()];
            if include_logo {
                references.extend(logo.clone());
            }

            let copies: Vec<(String, String, Option<String>)> =
                if settings.localize && !translations.is_empty() {
                    translations
                        .iter()
                        .map(|t| (t.text.clone(), t.code.clone(), Some(t.language.clone())))
                        .collect()
                } else {
                    vec![(
                        ad_copy_or_fallback(&session.message).to_string(),
                        ORIGINAL_LANGUAGE_CODE.to_string(),
                        None,
                    )]
                };
            for (text, code, language) in copies {
                let label = match language {
                    Some(language) => format!("{} ad ({language})", ratio.size_label()),
                    None => format!("{} ad", ratio.size_label()),
                };
                units.push(GenerationUnit::new(
                    label,
                    ad_prompt(ratio, &text, include_logo),
                    references.clone(),
                    ratio,
                    ads_dir.join(ratio.dir_name()).join(&code),
                    format!("ad_{code}"),
                ));
            }
        }

        Ok(Prepared::Ready(AdPlan {
            manifest,
            translations,
            step: Prepared::Ready(GenerationRun::new(
                self.model.as_ref(),
                self.events(session),
                "ads",
                units,
            )),
        }))
    }

    /// Final ad creatives for every aspect ratio.
    pub fn generate_ad_compositions(
        &self,
        session: &CampaignSession,
        on_progress: impl FnMut(&ProgressEvent),
    ) -> AdOutcome {
        let plan = match self.ad_run(session) {
            Ok(Prepared::Ready(plan)) => plan,
            Ok(Prepared::Rejected(message)) => {
                return AdOutcome::without_manifest(GenerationOutcome::rejected(message))
            }
            Err(err) => {
                return AdOutcome::without_manifest(GenerationOutcome::from_error(
                    "Error generating ads",
                    &err,
                ))
            }
        };
        let run = match plan.step {
            Prepared::Ready(run) => run,
            Prepared::Rejected(message) => {
                return AdOutcome {
                    outcome: GenerationOutcome::rejected(message),
                    by_ratio: BTreeMap::new(),
                    manifest: Some(plan.manifest),
                }
            }
        };

        let report = run.run(on_progress);
        let mut by_ratio: BTreeMap<AspectRatio, Vec<PathBuf>> = BTreeMap::new();
        for asset in &report.written {
            by_ratio
                .entry(asset.aspect_ratio)
                .or_default()
                .push(asset.path.clone());
        }

        let campaign_dir = self.layout.campaign_dir(&session.campaign_id);
        let campaign_id = session.campaign_id.clone();
        let outcome = GenerationOutcome::from_report(report, |count| {
            let mut lines = vec![
                format!("Successfully generated {count} AI-powered ad image(s)!"),
                format!("\n**Campaign ID:** `{campaign_id}`"),
                String::new(),
            ];
            for (ratio, images) in &by_ratio {
                let localized = if images.len() > 1 { " (localized)" } else { "" };
                lines.push(format!("- {ratio}: {} image(s){localized}", images.len()));
            }
            lines.push(format!("\n**Saved to:** `{}/`", campaign_dir.display()));
            lines.join("\n")
        });
        AdOutcome {
            outcome,
            by_ratio,
            manifest: Some(plan.manifest),
        }
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed creating {}", dir.display()))
}

/// Images whose header can be decoded; others are logged and dropped.
fn readable_images(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| match image::image_dimensions(path) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(path = %path.display(), "could not load reference image: {err}");
                false
            }
        })
        .collect()
}

/// Copies each source into `dir` under its file name. A source that already
/// is the destination is left alone.
fn copy_into(dir: &Path, sources: &[PathBuf]) -> Result<()> {
    create_dir(dir)?;
    for source in sources {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let dest = dir.join(file_name);
        if dest.exists() && same_file(source, &dest) {
            continue;
        }
        fs::copy(source, &dest).with_context(|| {
            format!("failed copying {} to {}", source.display(), dest.display())
        })?;
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
