//! Viral DNA command line client.

mod hook;

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vdna_client::{ApiClient, ClientConfig};
use vdna_models::timeframe::span_end_or_fallback;
use vdna_models::{AnalysisResult, Script, SourceInput, VideoModel};
use vdna_preview::{
    accumulated_duration, is_group_ready, reconcile_video_info, PollOutcome, PollerConfig,
    PreviewPhase, ReconciledVideo, SegmentGroup, TaskPoller, READY_THRESHOLD_SECS,
};

use crate::hook::RefreshHook;

const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(name = "vdna")]
#[command(about = "Analyse viral videos, write scripts in their style and preview them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL, including the API prefix
    #[arg(long, global = true, env = "VDNA_API_URL")]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an analysis over one or more video links
    Analyze {
        /// Video link (repeatable)
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        /// Label for the link at the same position
        #[arg(long = "label")]
        labels: Vec<String>,
    },

    /// Show the progress of an analysis
    Status {
        analysis_id: String,

        /// Keep checking until the analysis is ready or failed
        #[arg(long)]
        wait: bool,
    },

    /// List previous analyses
    History,

    /// Write a new script for a topic in the style of an analysis
    Script { analysis_id: String, topic: String },

    /// Show segment groups of a script and their preview state
    Groups {
        analysis_id: String,
        script_id: String,
    },

    /// Generate a video preview for the segment group ending at an index
    Preview {
        analysis_id: String,
        script_id: String,

        /// Index of the last segment in the group
        #[arg(long)]
        index: usize,

        /// Video model
        #[arg(long, default_value = "grok-imagine/text-to-video")]
        model: String,

        /// Extra direction for the generator
        #[arg(long, default_value = "")]
        notes: String,

        /// Ignore an existing video and submit a new job
        #[arg(long)]
        regenerate: bool,
    },

    /// Generate image, video and speech for one segment
    Media {
        script_id: String,
        segment_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let client = build_client(cli.api_url.as_deref())?;

    match cli.command {
        Commands::Analyze { urls, labels } => analyze(&client, urls, labels, cli.json).await,
        Commands::Status { analysis_id, wait } => status(&client, &analysis_id, wait, cli.json).await,
        Commands::History => history(&client, cli.json).await,
        Commands::Script { analysis_id, topic } => {
            let script = client.create_script(&analysis_id, &topic).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&script)?);
            } else {
                print_script(&script);
            }
            Ok(())
        }
        Commands::Groups {
            analysis_id,
            script_id,
        } => {
            let analysis = client.get_analysis(&analysis_id).await?;
            print_groups(find_script(&analysis, &script_id)?);
            Ok(())
        }
        Commands::Preview {
            analysis_id,
            script_id,
            index,
            model,
            notes,
            regenerate,
        } => {
            let request = PreviewArgs {
                analysis_id,
                script_id,
                index,
                model,
                notes,
                regenerate,
            };
            preview(&client, request).await
        }
        Commands::Media {
            script_id,
            segment_id,
        } => {
            let segment = client.generate_media(&script_id, &segment_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&segment)?);
            } else {
                println!("{} [{}] {}", segment.id, segment.timeframe, segment.media_status());
                if let Some(media) = &segment.media {
                    for (kind, url) in [
                        ("image", &media.image_url),
                        ("video", &media.video_url),
                        ("audio", &media.audio_url),
                    ] {
                        if let Some(url) = url {
                            println!("  {}: {}", kind, url);
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vdna=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn build_client(api_url: Option<&str>) -> Result<ApiClient> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config.base_url = ClientConfig::with_base_url(url)?.base_url;
    }
    info!("Using backend {}", config.base_url);
    Ok(ApiClient::new(config)?)
}

fn find_script<'a>(analysis: &'a AnalysisResult, script_id: &str) -> Result<&'a Script> {
    analysis
        .script(script_id)
        .ok_or_else(|| anyhow!("script {} not found in analysis {}", script_id, analysis.id))
}

async fn analyze(client: &ApiClient, urls: Vec<String>, labels: Vec<String>, json: bool) -> Result<()> {
    let mut labels = labels.into_iter();
    let sources: Vec<SourceInput> = urls
        .into_iter()
        .map(|url| match labels.next() {
            Some(label) => SourceInput::url(url).with_label(label),
            None => SourceInput::url(url),
        })
        .collect();

    let analysis = client.create_analysis(&sources).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{} {}", analysis.id, analysis.status.progress_label());
    }
    Ok(())
}

async fn status(client: &ApiClient, analysis_id: &str, wait: bool, json: bool) -> Result<()> {
    let mut ticker = tokio::time::interval(STATUS_POLL_INTERVAL);
    let mut last_status = None;

    let analysis = loop {
        ticker.tick().await;
        let analysis = client.get_analysis(analysis_id).await?;
        if !json && last_status != Some(analysis.status) {
            println!("{}", analysis.status.progress_label());
            last_status = Some(analysis.status);
        }
        if !wait || analysis.status.is_terminal() {
            break analysis;
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

async fn history(client: &ApiClient, json: bool) -> Result<()> {
    let analyses = client.history().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
        return Ok(());
    }
    if analyses.is_empty() {
        println!("No analyses yet");
    }
    for analysis in &analyses {
        let created = analysis
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<12} {}  {} source(s), {} script(s)",
            analysis.id,
            analysis.status.as_str(),
            created,
            analysis.sources.len(),
            analysis.scripts.len()
        );
    }
    Ok(())
}

struct PreviewArgs {
    analysis_id: String,
    script_id: String,
    index: usize,
    model: String,
    notes: String,
    regenerate: bool,
}

async fn preview(client: &ApiClient, args: PreviewArgs) -> Result<()> {
    let model: VideoModel = args.model.parse()?;
    let analysis = client.get_analysis(&args.analysis_id).await?;
    let script = find_script(&analysis, &args.script_id)?;

    let group = SegmentGroup::resolve(script, args.index)
        .with_context(|| format!("script has no segment at index {}", args.index))?;
    if !is_group_ready(&script.segments, args.index) {
        bail!(
            "segments up to index {} cover {}s, at least {}s are needed for a preview",
            args.index,
            accumulated_duration(&script.segments, args.index),
            READY_THRESHOLD_SECS
        );
    }

    let hook = RefreshHook::new(client.clone(), &args.analysis_id, group.clone(), script.clone());
    let poller = TaskPoller::new(client.clone(), PollerConfig::from_env()).with_settle_hook(hook.clone());

    let existing = if args.regenerate {
        None
    } else {
        reconcile_video_info(script, &group)
    };
    let handle = match poller.resume(&args.script_id, existing) {
        Some(handle) => {
            println!("Attaching to running task {}", handle.task_id());
            handle
        }
        None if poller.phase() == PreviewPhase::Succeeded => {
            if let Some(url) = poller.view().video_url {
                println!("Video already generated: {}", url);
            }
            return Ok(());
        }
        None => {
            println!("Submitting {} segment(s) to {}", group.len(), model.display_name());
            poller
                .start(&args.script_id, &group, model.as_str(), &args.notes)
                .await?
        }
    };

    let running = poller.spawn_polling(handle);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last_label = String::new();

    while !running.is_finished() {
        tokio::select! {
            _ = &mut ctrl_c => {
                running.cancel();
                println!("Cancelled");
                break;
            }
            _ = ticker.tick() => {
                let view = poller.view();
                if view.status_label != last_label {
                    println!("{}", view.status_label);
                    last_label = view.status_label;
                }
            }
        }
    }

    match running.join().await {
        PollOutcome::Succeeded { video_url } => {
            println!("Video ready: {}", video_url);
            match reconcile_video_info(&hook.script(), &group) {
                Some(ReconciledVideo::Ready { video_url, .. }) => {
                    println!("Stored on script: {}", video_url)
                }
                _ => println!("Script not updated yet; run `vdna groups` later"),
            }
            Ok(())
        }
        PollOutcome::Failed(e) => Err(e.into()),
        PollOutcome::Pending { .. } | PollOutcome::Discarded => Ok(()),
    }
}

fn print_analysis(analysis: &AnalysisResult) {
    println!("Analysis {} ({})", analysis.id, analysis.status);
    let passport = &analysis.style_passport;
    if !passport.is_empty() {
        println!("Style passport:");
        for section in &passport.structure {
            println!("  {} {}-{}: {}", section.segment, section.start, section.end, section.description);
        }
        if passport.speech_rate_wpm > 0.0 {
            println!("  Speech rate: {:.0} wpm", passport.speech_rate_wpm);
        }
        if !passport.catchphrases.is_empty() {
            println!("  Catchphrases: {}", passport.catchphrases.join(", "));
        }
        if !passport.tone_tags.is_empty() {
            println!("  Tone: {}", passport.tone_tags.join(", "));
        }
    }
    for pattern in &analysis.patterns {
        println!("Pattern: {} [{}] {}", pattern.name, pattern.impact, pattern.description);
    }
    for script in &analysis.scripts {
        println!("Script {}: {} ({} segments)", script.script_id, script.topic, script.len());
    }
}

fn print_script(script: &Script) {
    println!("Script {}: {}", script.script_id, script.topic);
    for segment in &script.segments {
        println!("  {} [{}] {}", segment.id, segment.timeframe, segment.visual);
        if !segment.audio.is_empty() {
            println!("      \"{}\"", segment.audio);
        }
    }
}

fn print_groups(script: &Script) {
    println!("Script {}: {}", script.script_id, script.topic);
    for (index, segment) in script.segments.iter().enumerate() {
        let total = accumulated_duration(&script.segments, index);
        let ready = is_group_ready(&script.segments, index);
        let preview = SegmentGroup::resolve(script, index)
            .and_then(|group| reconcile_video_info(script, &group))
            .map(|info| match info {
                ReconciledVideo::Ready { video_url, .. } => format!("video {}", video_url),
                ReconciledVideo::InFlight { task_id } => format!("generating ({})", task_id),
            })
            .unwrap_or_else(|| if ready { "ready to preview".into() } else { "-".into() });

        println!(
            "  #{:<2} {:<8} +{:>3}s  total {:>4}s  {}",
            index,
            segment.id,
            span_end_or_fallback(&segment.timeframe),
            total,
            preview
        );
    }
}
