//! Reframe CLI: create, inspect, analyze, and export projects.
//!
//! Usage:
//!   reframe init <NAME> --screen <FILE>   Create a project from recorded media
//!   reframe info <PATH>                   Show project information
//!   reframe validate <PATH>               Validate a project bundle
//!   reframe analyze <PATH>                Generate auto-zoom from clicks
//!   reframe export <PATH>                 Export a project to video

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reframe_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Turn screen recordings into polished, zoomed edits",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project from recorded media
    Init {
        /// Project name
        name: String,

        /// Parent directory for the project
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Screen recording (primary video)
        #[arg(long)]
        screen: Option<PathBuf>,

        /// Webcam recording
        #[arg(long)]
        webcam: Option<PathBuf>,

        /// Microphone recording
        #[arg(long)]
        mic: Option<PathBuf>,

        /// System audio recording
        #[arg(long)]
        system_audio: Option<PathBuf>,

        /// Cursor stream (JSONL)
        #[arg(long)]
        cursor: Option<PathBuf>,

        /// Recording duration in seconds, when ffprobe cannot tell
        #[arg(long)]
        duration: Option<f64>,

        /// Capture width, when ffprobe cannot tell
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Capture height, when ffprobe cannot tell
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Recording frame rate
        #[arg(long, default_value = "60")]
        fps: u32,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Validate a project bundle
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Generate auto-zoom keyframes from recorded clicks
    Analyze {
        /// Path to the project directory
        path: PathBuf,

        /// Zoom level of generated holds
        #[arg(long, default_value = "2.0")]
        zoom_level: f64,

        /// Clicks closer together than this share one zoom (seconds)
        #[arg(long, default_value = "1.5")]
        dwell_secs: f64,

        /// Ease duration around each zoom (seconds)
        #[arg(long, default_value = "0.6")]
        transition_secs: f64,

        /// Print the detector report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a project to video
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (mp4-h264, mp4-h265, webm, gif)
        #[arg(long)]
        format: Option<String>,

        /// Output width
        #[arg(long)]
        width: Option<u32>,

        /// Output height
        #[arg(long)]
        height: Option<u32>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Skip writing SRT/VTT files next to the video
        #[arg(long)]
        no_subtitles: bool,

        /// Write the ffmpeg command and filter graph next to the output
        #[arg(long)]
        debug_report: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            screen,
            webcam,
            mic,
            system_audio,
            cursor,
            duration,
            width,
            height,
            fps,
        } => commands::init::run(
            commands::init::InitArgs {
                name,
                output,
                screen,
                webcam,
                mic,
                system_audio,
                cursor,
                duration,
                width,
                height,
                fps,
            },
            &config,
        ),
        Commands::Info { path } => commands::info::run(path, &config),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Analyze {
            path,
            zoom_level,
            dwell_secs,
            transition_secs,
            json,
        } => commands::analyze::run(path, &config, zoom_level, dwell_secs, transition_secs, json),
        Commands::Export {
            path,
            output,
            format,
            width,
            height,
            fps,
            no_subtitles,
            debug_report,
        } => {
            commands::export::run(
                path,
                &config,
                commands::export::ExportOverrides {
                    output,
                    format,
                    width,
                    height,
                    fps,
                    no_subtitles,
                    debug_report,
                },
            )
            .await
        }
    }
}
