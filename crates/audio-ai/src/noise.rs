//! Noise reduction for the microphone track.
//!
//! The shipped implementation shells out to ffmpeg's `afftdn` filter.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use reframe_common::error::{ReframeError, ReframeResult};

use crate::jobs::JobContext;

/// Noise reduction settings.
#[derive(Debug, Clone)]
pub struct NoiseReductionConfig {
    /// Reduction strength in `[0.0, 1.0]`.
    pub intensity: f64,

    /// Estimated noise floor in dB.
    pub noise_floor_db: f64,

    /// Input duration, used to turn ffmpeg's time output into a fraction.
    pub duration_secs: Option<f64>,
}

impl Default for NoiseReductionConfig {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            noise_floor_db: -25.0,
            duration_secs: None,
        }
    }
}

impl NoiseReductionConfig {
    /// `afftdn` noise reduction amount for the configured intensity.
    ///
    /// Maps `[0, 1]` onto `[6, 40]` dB; `afftdn` itself accepts `0.01..=97`.
    pub fn noise_reduction_db(&self) -> f64 {
        let intensity = if self.intensity.is_nan() {
            0.0
        } else {
            self.intensity.clamp(0.0, 1.0)
        };
        6.0 + intensity * 34.0
    }
}

/// Something that can clean up an audio file.
pub trait NoiseReducer: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Write a denoised copy of `input` to `output`.
    fn reduce(
        &self,
        input: &Path,
        output: &Path,
        config: &NoiseReductionConfig,
        ctx: &JobContext,
    ) -> ReframeResult<PathBuf>;
}

/// `afftdn`-based noise reduction via the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegDenoiser {
    ffmpeg: PathBuf,
}

impl Default for FfmpegDenoiser {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegDenoiser {
    pub fn with_binary(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Command-line arguments for one denoise pass.
    pub fn build_args(input: &Path, output: &Path, config: &NoiseReductionConfig) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-vn".to_string(),
            "-af".to_string(),
            format!(
                "afftdn=nr={:.2}:nf={:.1}",
                config.noise_reduction_db(),
                config.noise_floor_db.clamp(-80.0, -20.0)
            ),
            output.display().to_string(),
        ]
    }
}

impl NoiseReducer for FfmpegDenoiser {
    fn name(&self) -> &str {
        "ffmpeg-afftdn"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn reduce(
        &self,
        input: &Path,
        output: &Path,
        config: &NoiseReductionConfig,
        ctx: &JobContext,
    ) -> ReframeResult<PathBuf> {
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            intensity = config.intensity,
            "Applying noise reduction"
        );

        if !input.exists() {
            return Err(ReframeError::FileNotFound {
                path: input.to_path_buf(),
            });
        }
        ctx.check_cancelled()?;

        let mut child = Command::new(&self.ffmpeg)
            .args(Self::build_args(input, output, config))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReframeError::audio(format!("failed to start ffmpeg: {e}")))?;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                if ctx.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = std::fs::remove_file(output);
                    return Err(ReframeError::Cancelled);
                }
                if let (Some(duration), Some(secs)) = (config.duration_secs, progress_secs(&line)) {
                    if duration > 0.0 {
                        ctx.report(secs / duration);
                    }
                }
            }
        }

        let result = child.wait_with_output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let _ = std::fs::remove_file(output);
            return Err(ReframeError::audio(format!(
                "ffmpeg noise reduction failed: {}",
                stderr.trim()
            )));
        }

        ctx.report(1.0);
        Ok(output.to_path_buf())
    }
}

/// Output position from one ffmpeg `-progress` line, in seconds.
pub fn progress_secs(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value.parse::<f64>().ok().map(|us| us / 1_000_000.0),
        _ => None,
    }
}

/// Where the denoised copy of `input` lives inside a project's cache dir.
pub fn denoised_output_path(cache_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    cache_dir.join(format!("{stem}_denoised.wav"))
}
