//! Local transcription using Whisper.
//!
//! Runs speech-to-text locally through the whisper.cpp command-line tool and
//! reads back its JSON output (`-oj`).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::project::Caption;

use crate::jobs::JobContext;

/// Whisper model size selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    /// Fastest, least accurate (~39 MB).
    Tiny,
    /// Good balance of speed and accuracy (~142 MB).
    Base,
    /// Better accuracy, slower (~466 MB).
    Small,
    /// High accuracy (~1.5 GB).
    Medium,
    /// Best accuracy, slowest (~2.9 GB).
    Large,
}

impl WhisperModel {
    /// Approximate model file size in bytes.
    pub fn size_bytes(&self) -> u64 {
        match self {
            WhisperModel::Tiny => 39_000_000,
            WhisperModel::Base => 142_000_000,
            WhisperModel::Small => 466_000_000,
            WhisperModel::Medium => 1_500_000_000,
            WhisperModel::Large => 2_900_000_000,
        }
    }

    /// Model filename.
    pub fn filename(&self) -> &str {
        match self {
            WhisperModel::Tiny => "ggml-tiny.bin",
            WhisperModel::Base => "ggml-base.bin",
            WhisperModel::Small => "ggml-small.bin",
            WhisperModel::Medium => "ggml-medium.bin",
            WhisperModel::Large => "ggml-large.bin",
        }
    }
}

/// Configuration for transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Model to use.
    pub model: WhisperModel,

    /// Language hint (ISO 639-1 code, e.g., "en").
    pub language: Option<String>,

    /// Whether to translate to English.
    pub translate: bool,

    /// Number of CPU threads for inference.
    pub threads: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: WhisperModel::Base,
            language: Some("en".to_string()),
            translate: false,
            threads: 4,
        }
    }
}

/// A single transcribed segment with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
    /// Transcribed text.
    pub text: String,
}

impl From<TranscriptionSegment> for Caption {
    fn from(segment: TranscriptionSegment) -> Self {
        Caption {
            start_secs: segment.start_secs,
            end_secs: segment.end_secs,
            text: segment.text,
        }
    }
}

/// Result of a transcription job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Detected language.
    pub language: String,
    /// Transcribed segments, ordered by start time.
    pub segments: Vec<TranscriptionSegment>,
    /// Processing time in seconds.
    pub processing_time_secs: f64,
}

impl TranscriptionResult {
    /// Segments as timeline captions.
    pub fn into_captions(self) -> Vec<Caption> {
        self.segments.into_iter().map(Caption::from).collect()
    }
}

/// Speech-to-text engine.
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn transcribe(
        &self,
        audio_path: &Path,
        config: &TranscriptionConfig,
        ctx: &JobContext,
    ) -> ReframeResult<TranscriptionResult>;
}

/// whisper.cpp CLI (`whisper-cli`) driver.
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    binary: PathBuf,
    models_dir: PathBuf,
}

impl WhisperCliTranscriber {
    pub fn new(binary: impl Into<PathBuf>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            models_dir: models_dir.into(),
        }
    }

    pub fn model_path(&self, model: WhisperModel) -> PathBuf {
        self.models_dir.join(model.filename())
    }

    /// Command-line arguments; whisper writes `<output_prefix>.json`.
    pub fn build_args(
        model_path: &Path,
        audio_path: &Path,
        output_prefix: &Path,
        config: &TranscriptionConfig,
    ) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            model_path.display().to_string(),
            "-f".to_string(),
            audio_path.display().to_string(),
            "-t".to_string(),
            config.threads.max(1).to_string(),
            "-oj".to_string(),
            "-of".to_string(),
            output_prefix.display().to_string(),
            "-np".to_string(),
        ];
        if let Some(lang) = &config.language {
            args.push("-l".to_string());
            args.push(lang.clone());
        }
        if config.translate {
            args.push("-tr".to_string());
        }
        args
    }
}

impl Default for WhisperCliTranscriber {
    fn default() -> Self {
        Self::new("whisper-cli", "models")
    }
}

impl Transcriber for WhisperCliTranscriber {
    fn name(&self) -> &str {
        "whisper.cpp"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn transcribe(
        &self,
        audio_path: &Path,
        config: &TranscriptionConfig,
        ctx: &JobContext,
    ) -> ReframeResult<TranscriptionResult> {
        tracing::info!(
            path = %audio_path.display(),
            model = ?config.model,
            "Starting transcription"
        );

        if !audio_path.exists() {
            return Err(ReframeError::FileNotFound {
                path: audio_path.to_path_buf(),
            });
        }
        let model_path = self.model_path(config.model);
        if !model_path.exists() {
            return Err(ReframeError::FileNotFound { path: model_path });
        }

        let started = Instant::now();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let output_prefix = std::env::temp_dir().join(format!(
            "reframe-whisper-{}-{unique}",
            std::process::id()
        ));
        let json_path = output_prefix.with_extension("json");

        let mut child = Command::new(&self.binary)
            .args(Self::build_args(&model_path, audio_path, &output_prefix, config))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReframeError::audio(format!("failed to start whisper: {e}")))?;

        // whisper logs heavily to stderr; drain it so the child never blocks.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let status = loop {
            if ctx.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                let _ = std::fs::remove_file(&json_path);
                return Err(ReframeError::Cancelled);
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            std::thread::sleep(Duration::from_millis(100));
        };

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(ReframeError::audio(format!(
                "whisper exited with {status}: {}",
                stderr.trim()
            )));
        }

        let json = std::fs::read_to_string(&json_path)?;
        let _ = std::fs::remove_file(&json_path);

        let mut result = parse_whisper_json(&json)?;
        result.processing_time_secs = started.elapsed().as_secs_f64();
        ctx.report(1.0);

        tracing::info!(
            segments = result.segments.len(),
            language = %result.language,
            elapsed_secs = result.processing_time_secs,
            "Transcription finished"
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    result: Option<WhisperResultInfo>,
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperResultInfo {
    language: String,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

/// Millisecond offsets.
#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// Parse whisper.cpp `-oj` output into ordered, non-empty segments.
pub fn parse_whisper_json(json: &str) -> ReframeResult<TranscriptionResult> {
    let output: WhisperOutput = serde_json::from_str(json)?;

    let mut segments: Vec<TranscriptionSegment> = output
        .transcription
        .into_iter()
        .filter_map(|s| {
            let text = s.text.trim();
            (!text.is_empty()).then(|| TranscriptionSegment {
                start_secs: s.offsets.from as f64 / 1000.0,
                end_secs: s.offsets.to.max(s.offsets.from) as f64 / 1000.0,
                text: text.to_string(),
            })
        })
        .collect();
    segments.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    Ok(TranscriptionResult {
        language: output
            .result
            .map(|r| r.language)
            .unwrap_or_else(|| "unknown".to_string()),
        segments,
        processing_time_secs: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "systeminfo": "AVX = 1",
        "model": {"type": "base"},
        "params": {"model": "models/ggml-base.bin", "language": "en", "translate": false},
        "result": {"language": "en"},
        "transcription": [
            {
                "timestamps": {"from": "00:00:03,000", "to": "00:00:05,000"},
                "offsets": {"from": 3000, "to": 5000},
                "text": " This is a test"
            },
            {
                "timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
                "offsets": {"from": 0, "to": 2500},
                "text": " Hello world"
            },
            {
                "timestamps": {"from": "00:00:05,000", "to": "00:00:06,000"},
                "offsets": {"from": 5000, "to": 6000},
                "text": "   "
            }
        ]
    }"#;

    #[test]
    fn test_parse_whisper_json_orders_and_trims() {
        let result = parse_whisper_json(SAMPLE).unwrap();
        assert_eq!(result.language, "en");
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].text, "Hello world");
        assert_eq!(result.segments[0].end_secs, 2.5);
        assert_eq!(result.segments[1].start_secs, 3.0);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_whisper_json("not json").is_err());
    }

    #[test]
    fn test_segments_become_captions() {
        let captions = parse_whisper_json(SAMPLE).unwrap().into_captions();
        assert_eq!(captions[1].text, "This is a test");
        assert_eq!(captions[1].end_secs, 5.0);
    }

    #[test]
    fn test_build_args() {
        let config = TranscriptionConfig {
            translate: true,
            ..TranscriptionConfig::default()
        };
        let args = WhisperCliTranscriber::build_args(
            Path::new("models/ggml-base.bin"),
            Path::new("mic.wav"),
            Path::new("/tmp/out"),
            &config,
        );
        assert!(args.windows(2).any(|w| w[0] == "-of" && w[1] == "/tmp/out"));
        assert!(args.windows(2).any(|w| w[0] == "-l" && w[1] == "en"));
        assert!(args.contains(&"-oj".to_string()));
        assert!(args.contains(&"-tr".to_string()));
    }

    #[test]
    fn test_missing_model_is_reported() {
        let dir = std::env::temp_dir().join(format!("reframe_whisper_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let audio = dir.join("mic.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let transcriber = WhisperCliTranscriber::new("whisper-cli", dir.join("models"));
        let err = transcriber
            .transcribe(&audio, &TranscriptionConfig::default(), &JobContext::detached())
            .unwrap_err();
        assert!(matches!(err, ReframeError::FileNotFound { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
