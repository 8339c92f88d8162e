use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use creative_contracts::assets::ImageKind;
use creative_contracts::campaign::{is_valid_campaign_id, AspectRatio, CampaignSession};
use creative_contracts::catalog::{audience_choices, load_audiences, load_regions, region_choices};
use creative_contracts::layout::ProjectLayout;
use creative_contracts::manifest::load_campaign;
use creative_contracts::preview::campaign_preview;
use creative_contracts::suggestions::{random_campaign_message, random_environment_prompt};
use creative_engine::credentials::CredentialStore;
use creative_engine::pipeline::{CampaignPipeline, GenerationOutcome, OutcomeStatus, ViewMode};
use creative_engine::providers::{image_model_for, DEFAULT_GEMINI_IMAGE_MODEL};
use creative_engine::translate::{translation_preview, GoogleTranslator};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "creative=info";

#[derive(Debug, Parser)]
#[command(
    name = "creative-rs",
    version,
    about = "Campaign creative generation with Gemini image models"
)]
struct Cli {
    /// Project root holding `products/`, `config/` and `outputs/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    #[arg(long, global = true, value_enum, default_value_t = Provider::Gemini)]
    provider: Provider,
    #[arg(long, global = true, env = "GEMINI_IMAGE_MODEL", default_value = DEFAULT_GEMINI_IMAGE_MODEL)]
    model: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Gemini,
    Dryrun,
}

impl Provider {
    fn name(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Dryrun => "dryrun",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List products with their photo and logo counts.
    Products,
    Regions,
    Audiences,
    /// Print a fresh campaign ID.
    NewId,
    /// Print a random campaign message or environment prompt.
    Suggest {
        #[arg(value_enum)]
        kind: SuggestionKind,
    },
    #[command(subcommand)]
    Key(KeyCommand),
    /// Translate a message into the top languages of a region.
    Translate {
        #[arg(long)]
        region: String,
        #[arg(long)]
        message: String,
    },
    Preview {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Generate four background variations.
    Environments {
        #[arg(long)]
        campaign: Option<String>,
        #[arg(long)]
        prompt: String,
    },
    /// Generate the six camera-angle views of products.
    Views {
        #[arg(long)]
        campaign: Option<String>,
        #[arg(long = "product", required = true)]
        products: Vec<String>,
        #[arg(long, value_enum, default_value_t = ViewModeArg::Separate)]
        mode: ViewModeArg,
    },
    /// Generate ad compositions for every aspect ratio.
    Ads(CampaignArgs),
    /// Summarize a saved campaign manifest.
    Load { path: PathBuf },
    /// Snapshot a campaign into `outputs/campaigns/`.
    Export(CampaignArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SuggestionKind {
    Message,
    Environment,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewModeArg {
    Separate,
    Combined,
}

impl From<ViewModeArg> for ViewMode {
    fn from(value: ViewModeArg) -> Self {
        match value {
            ViewModeArg::Separate => ViewMode::Separate,
            ViewModeArg::Combined => ViewMode::Combined,
        }
    }
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    /// Save the API key to `.env` and the environment.
    Set { key: String },
    Status,
}

#[derive(Debug, Clone, Default, Args)]
struct CampaignArgs {
    /// Start from a saved manifest; explicit flags override its values.
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    campaign: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    audience: Option<String>,
    #[arg(long)]
    message: Option<String>,
    #[arg(long = "environment")]
    environments: Vec<PathBuf>,
    #[arg(long = "product-view")]
    product_views: Vec<PathBuf>,
    #[arg(long = "logo")]
    logos: Vec<PathBuf>,
    /// Ratios (`1:1`, `9:16`, `16:9`) that include the first logo.
    #[arg(long = "logo-on", value_delimiter = ',')]
    logo_on: Vec<String>,
    /// Ratios rendered once per regional language.
    #[arg(long = "localize", value_delimiter = ',')]
    localize: Vec<String>,
}

fn main() {
    init_logging();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("creative-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let layout = ProjectLayout::new(&cli.root);
    let credentials = CredentialStore::new(layout.env_file());
    credentials.load_env_file();

    match cli.command {
        Command::Products => list_products(&layout),
        Command::Regions => {
            let regions = load_regions(&layout.config_dir())?;
            for (display, key) in region_choices(&regions) {
                println!("{key}\t{display}");
            }
            Ok(0)
        }
        Command::Audiences => {
            let audiences = load_audiences(&layout.config_dir())?;
            for (display, key) in audience_choices(&audiences) {
                println!("{key}\t{display}");
            }
            Ok(0)
        }
        Command::NewId => {
            println!("{}", CampaignSession::new().campaign_id);
            Ok(0)
        }
        Command::Suggest { kind } => {
            match kind {
                SuggestionKind::Message => println!("{}", random_campaign_message()),
                SuggestionKind::Environment => println!("{}", random_environment_prompt()),
            }
            Ok(0)
        }
        Command::Key(KeyCommand::Set { key }) => {
            println!("{}", credentials.save(&key)?);
            Ok(0)
        }
        Command::Key(KeyCommand::Status) => {
            println!("{}", credentials.status());
            Ok(if credentials.is_configured() { 0 } else { 2 })
        }
        Command::Translate { region, message } => {
            let regions = load_regions(&layout.config_dir())?;
            let translator = GoogleTranslator::new();
            println!(
                "{}",
                translation_preview(&translator, &regions, &message, Some(region.as_str()))
            );
            Ok(0)
        }
        Command::Preview {
            region,
            audience,
            message,
        } => {
            let regions = load_regions(&layout.config_dir())?;
            let audiences = load_audiences(&layout.config_dir())?;
            println!(
                "{}",
                campaign_preview(
                    &regions,
                    &audiences,
                    region.as_deref(),
                    audience.as_deref(),
                    &message,
                )
            );
            Ok(0)
        }
        Command::Environments { campaign, prompt } => {
            let session = session_for(campaign.as_deref())?;
            let pipeline = build_pipeline(&cli.provider, &cli.model, layout, &credentials)?;
            let outcome = pipeline.generate_environments(&session, &prompt, print_progress);
            Ok(report_outcome(&session, &outcome))
        }
        Command::Views {
            campaign,
            products,
            mode,
        } => {
            let session = session_for(campaign.as_deref())?;
            let pipeline = build_pipeline(&cli.provider, &cli.model, layout, &credentials)?;
            let outcome =
                pipeline.generate_product_views(&session, &products, mode.into(), print_progress);
            Ok(report_outcome(&session, &outcome))
        }
        Command::Ads(args) => {
            let session = build_session(&args)?;
            let pipeline = build_pipeline(&cli.provider, &cli.model, layout, &credentials)?;
            let result = pipeline.generate_ad_compositions(&session, print_progress);
            if let Some(manifest) = &result.manifest {
                println!("Manifest: {}", manifest.path.display());
            }
            Ok(report_outcome(&session, &result.outcome))
        }
        Command::Load { path } => {
            let loaded = load_campaign(&path)?;
            print!("{}", loaded.summary());
            Ok(0)
        }
        Command::Export(args) => {
            let session = build_session(&args)?;
            let pipeline = build_pipeline(&cli.provider, &cli.model, layout, &credentials)?;
            let path = pipeline.export(&session)?;
            println!("Campaign exported to {}", path.display());
            Ok(0)
        }
    }
}

fn list_products(layout: &ProjectLayout) -> Result<i32> {
    let locator = creative_contracts::assets::AssetLocator::new(layout.products_dir());
    let slugs = locator.list_products();
    if slugs.is_empty() {
        println!("No products found under {}", locator.products_dir().display());
        return Ok(0);
    }
    for slug in slugs {
        let name = locator
            .load_product(&slug)?
            .map(|product| product.name)
            .unwrap_or_else(|| "(no config.yaml)".to_string());
        println!(
            "{slug}\t{name}\tphotos={}\tlogos={}",
            locator.list_images(&slug, ImageKind::Product).len(),
            locator.list_images(&slug, ImageKind::Logo).len()
        );
    }
    Ok(0)
}

fn build_pipeline(
    provider: &Provider,
    model: &str,
    layout: ProjectLayout,
    credentials: &CredentialStore,
) -> Result<CampaignPipeline> {
    let image_model = image_model_for(
        provider.name(),
        credentials.api_key(),
        Some(model.to_string()),
    )?;
    tracing::debug!(provider = image_model.name(), model, "image model ready");
    Ok(CampaignPipeline::new(
        layout,
        image_model,
        Box::new(GoogleTranslator::new()),
    ))
}

fn session_for(campaign: Option<&str>) -> Result<CampaignSession> {
    match campaign.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if is_valid_campaign_id(id) => Ok(CampaignSession::with_id(id)),
        Some(id) => bail!("invalid campaign ID '{id}' (expected 6 characters from 2-9 and A-Z without I and O)"),
        None => Ok(CampaignSession::new()),
    }
}

fn build_session(args: &CampaignArgs) -> Result<CampaignSession> {
    let mut session = session_for(args.campaign.as_deref())?;
    if let Some(path) = &args.from {
        let explicit_id = args.campaign.is_some().then(|| session.campaign_id.clone());
        load_campaign(path)?.apply_to(&mut session);
        if let Some(id) = explicit_id {
            session.campaign_id = id;
        }
    }
    if args.region.is_some() {
        session.region = args.region.clone();
    }
    if args.audience.is_some() {
        session.audience = args.audience.clone();
    }
    if let Some(message) = &args.message {
        session.message = message.clone();
    }
    if !args.environments.is_empty() {
        session.environments = args.environments.clone();
    }
    if !args.product_views.is_empty() {
        session.products = args.product_views.clone();
    }
    if !args.logos.is_empty() {
        session.logos = args.logos.clone();
    }
    for raw in &args.logo_on {
        session.formats.get_mut(parse_ratio(raw)?).include_logo = true;
    }
    for raw in &args.localize {
        session.formats.get_mut(parse_ratio(raw)?).localize = true;
    }
    Ok(session)
}

fn parse_ratio(raw: &str) -> Result<AspectRatio> {
    match AspectRatio::parse(raw) {
        Some(ratio) => Ok(ratio),
        None => bail!("unknown aspect ratio '{raw}' (expected 1:1, 9:16 or 16:9)"),
    }
}

fn print_progress(event: &creative_engine::pipeline::ProgressEvent) {
    println!("{:>3.0}% {event}", event.fraction() * 100.0);
}

fn report_outcome(session: &CampaignSession, outcome: &GenerationOutcome) -> i32 {
    println!("{}", outcome.message);
    println!("Campaign ID: {}", session.campaign_id);
    match outcome.status {
        OutcomeStatus::Succeeded => 0,
        OutcomeStatus::Rejected => 2,
        OutcomeStatus::Failed => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_ads_flags() {
        let cli = Cli::try_parse_from([
            "creative-rs",
            "--provider",
            "dryrun",
            "ads",
            "--campaign",
            "K7QX2M",
            "--environment",
            "env.png",
            "--product-view",
            "front.png",
            "--localize",
            "1:1,9:16",
        ]);
        let Ok(cli) = cli else {
            panic!("ads flags should parse");
        };
        assert_eq!(cli.provider, Provider::Dryrun);
        let Command::Ads(args) = cli.command else {
            panic!("expected ads command");
        };
        assert_eq!(args.localize, vec!["1:1", "9:16"]);
        assert_eq!(args.environments, vec![PathBuf::from("env.png")]);
    }

    #[test]
    fn build_session_applies_flags() -> anyhow::Result<()> {
        let args = CampaignArgs {
            campaign: Some("K7QX2M".to_string()),
            region: Some("europe".to_string()),
            message: Some("Clean naturally.".to_string()),
            environments: vec![PathBuf::from("env.png")],
            logo_on: vec!["16:9".to_string()],
            localize: vec!["1_1".to_string()],
            ..CampaignArgs::default()
        };
        let session = build_session(&args)?;
        assert_eq!(session.campaign_id, "K7QX2M");
        assert_eq!(session.region_key(), Some("europe"));
        assert!(session.formats.get(AspectRatio::Landscape).include_logo);
        assert!(session.formats.get(AspectRatio::Square).localize);
        assert!(!session.formats.get(AspectRatio::Vertical).localize);
        Ok(())
    }

    #[test]
    fn build_session_rejects_bad_input() {
        let bad_ratio = CampaignArgs {
            localize: vec!["4:3".to_string()],
            ..CampaignArgs::default()
        };
        assert!(build_session(&bad_ratio).is_err());
        assert!(session_for(Some("ABC10O")).is_err());
        assert!(session_for(None).is_ok());
    }

    #[test]
    fn build_session_overrides_loaded_manifest() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut saved = CampaignSession::with_id("ZZZZ22");
        saved.region = Some("asia".to_string());
        saved.message = "Original".to_string();
        let manifest = creative_contracts::manifest::build_manifest(&saved, &[]);
        let path = creative_contracts::manifest::write_manifest(&manifest, temp.path())?;

        let args = CampaignArgs {
            from: Some(path),
            message: Some("Replacement".to_string()),
            ..CampaignArgs::default()
        };
        let session = build_session(&args)?;
        assert_eq!(session.campaign_id, "ZZZZ22");
        assert_eq!(session.region_key(), Some("asia"));
        assert_eq!(session.message, "Replacement");
        Ok(())
    }
}
