use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use apalis::{layers::sentry::SentryLayer, prelude::*};
use apalis_cron::{CronStream, Tick};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use cron::Schedule;
use episode_store::{EpisodeDate, EpisodeStore, LocalEpisodeStore};
use techcast::{
    tracing::init_tracing_subscriber, Ffmpeg, GeminiClient, PodcastProcessor,
    PodcastProcessorBuilder, RetryPolicy, SegmentationStrategy, SpeakerLabels, TelegramNotifier,
    VoiceMapping,
};

type Processor =
    PodcastProcessor<LocalEpisodeStore, GeminiClient, Ffmpeg, Option<TelegramNotifier>>;

#[derive(Parser)]
#[command(name = "techcast", about = "Daily tech news podcast producer")]
struct Cli {
    /// Google AI Studio API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// Speech generation model
    #[arg(long, env = "TTS_MODEL", default_value = "gemini-2.5-pro-preview-tts")]
    tts_model: String,

    /// Prebuilt voice of the first host
    #[arg(long, env = "AUDIO_VOICE_1", default_value = "Zephyr")]
    voice_1: String,

    /// Prebuilt voice of the second host
    #[arg(long, env = "AUDIO_VOICE_2", default_value = "Puck")]
    voice_2: String,

    #[arg(long, env = "TTS_TEMPERATURE", default_value_t = 1.0)]
    temperature: f32,

    /// Speaker marker of the first host in the script
    #[arg(long, env = "SPEAKER_1_LABEL", default_value = "Speaker 1")]
    speaker_1: String,

    /// Speaker marker of the second host in the script
    #[arg(long, env = "SPEAKER_2_LABEL", default_value = "Speaker 2")]
    speaker_2: String,

    #[arg(long, env = "SEGMENT_STRATEGY", value_enum, default_value_t = Strategy::Turns)]
    segment_strategy: Strategy,

    /// Speaker turns per segment for the `turns` strategy
    #[arg(long, env = "SEGMENT_MAX_TURNS", default_value_t = SegmentationStrategy::DEFAULT_MAX_TURNS)]
    max_turns: usize,

    /// Number of segments for the `size` strategy
    #[arg(long, env = "SEGMENT_TARGET_COUNT", default_value_t = SegmentationStrategy::DEFAULT_TARGET_SEGMENTS)]
    target_segments: usize,

    /// Emit the turns left over after the last full segment
    #[arg(long, env = "KEEP_TRAILING_SEGMENT", default_value_t = true, action = clap::ArgAction::Set)]
    keep_trailing: bool,

    /// Root of the dated episode artifacts
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Scratch directory for segment audio
    #[arg(long, env = "TEMP_DIR", default_value = "temp_podcast_audios")]
    temp_dir: PathBuf,

    /// Still image looped over the episode video
    #[arg(long, env = "COVER_IMAGE", default_value = "TechCast.png")]
    cover_image: PathBuf,

    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    ffmpeg_path: PathBuf,

    /// IANA zone the episode date is taken in
    #[arg(long, env = "CRON_TIMEZONE", default_value = "America/Sao_Paulo")]
    timezone: String,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Close a segment every N speaker turns
    Turns,
    /// Cut the script into N parts of similar length
    Size,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the episode audio from the day's script
    Audio {
        /// Episode date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<EpisodeDate>,
    },
    /// Merge the day's audio with the cover image
    Video {
        #[arg(long)]
        date: Option<EpisodeDate>,
    },
    /// Generate audio, then video
    Run {
        #[arg(long)]
        date: Option<EpisodeDate>,
    },
    /// Show which artifacts exist for a date
    Status {
        #[arg(long)]
        date: Option<EpisodeDate>,
    },
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 21 * * *")]
        schedule: String,
    },
}

#[derive(Clone)]
struct CronContext {
    processor: Arc<Processor>,
    timezone: Tz,
}

fn build_processor(cli: &Cli) -> Processor {
    let segmentation = match cli.segment_strategy {
        Strategy::Turns => SegmentationStrategy::turn_count(cli.max_turns, cli.keep_trailing),
        Strategy::Size => SegmentationStrategy::size(cli.target_segments),
    };

    let gemini = GeminiClient::new(cli.google_api_key.clone().unwrap_or_default())
        .with_model(&cli.tts_model);
    let notifier =
        TelegramNotifier::from_credentials(cli.telegram_bot_token.clone(), cli.telegram_chat_id.clone());

    PodcastProcessorBuilder::new(&cli.temp_dir)
        .store(LocalEpisodeStore::new(&cli.output_dir))
        .synthesizer(gemini)
        .transcoder(Ffmpeg::new(&cli.ffmpeg_path))
        .notifier(notifier)
        .speaker_labels(SpeakerLabels::new(&cli.speaker_1, &cli.speaker_2))
        .voices(VoiceMapping::new(&cli.voice_1, &cli.voice_2))
        .temperature(cli.temperature)
        .retry_policy(RetryPolicy::new(3, Duration::from_secs(5)))
        .segmentation(segmentation)
        .with_video(&cli.cover_image)
        .build()
}

async fn print_status(store: &LocalEpisodeStore, date: EpisodeDate) {
    let status = store.status(date).await;
    println!("Episode {date}: {}/{} artifacts", status.completed(), status.total());
    for (kind, present) in &status.present {
        let mark = if *present { "✅" } else { "❌" };
        println!("  {mark} {kind}: {}", store.artifact_path(*kind, date).display());
    }
}

async fn handle_tick(_tick: Tick, ctx: Data<CronContext>) -> anyhow::Result<()> {
    let date = EpisodeDate::today_in(ctx.timezone);
    tracing::info!(%date, "Running scheduled episode...");
    ctx.processor.produce_episode(date).await.map(|_| ())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let timezone = Tz::from_str(&cli.timezone)
        .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {e}", cli.timezone))?;
    let today = || EpisodeDate::today_in(timezone);

    if matches!(
        cli.command,
        Command::Audio { .. } | Command::Run { .. } | Command::Cron { .. }
    ) {
        cli.google_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("GOOGLE_API_KEY not set")?;
    }

    let processor = build_processor(&cli);

    match cli.command {
        Command::Audio { date } => {
            let path = processor.generate_audio(date.unwrap_or_else(today)).await?;
            tracing::info!(path = ?path, "Audio ready");
        }
        Command::Video { date } => {
            let path = processor.generate_video(date.unwrap_or_else(today)).await?;
            tracing::info!(path = ?path, "Video ready");
        }
        Command::Run { date } => {
            let output = processor.produce_episode(date.unwrap_or_else(today)).await?;
            tracing::info!(audio = ?output.audio, video = ?output.video, "Episode ready");
        }
        Command::Status { date } => {
            print_status(processor.store(), date.unwrap_or_else(today)).await;
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, %timezone, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let ctx = CronContext {
                processor: Arc::new(processor),
                timezone,
            };
            let worker = WorkerBuilder::new("techcast-cron")
                .backend(CronStream::new(schedule))
                .layer(SentryLayer::new())
                .data(ctx)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
