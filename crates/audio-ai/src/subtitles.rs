//! Subtitle generation in SRT and VTT formats.

use std::path::{Path, PathBuf};

use reframe_common::error::ReframeResult;
use reframe_project_model::project::Caption;

/// Subtitle file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    /// Format implied by a file extension; anything unknown is SRT.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => SubtitleFormat::Vtt,
            _ => SubtitleFormat::Srt,
        }
    }

    pub fn render(&self, captions: &[Caption]) -> String {
        match self {
            SubtitleFormat::Srt => generate_srt(captions),
            SubtitleFormat::Vtt => generate_vtt(captions),
        }
    }
}

/// Generate SRT subtitle content from captions.
pub fn generate_srt(captions: &[Caption]) -> String {
    let mut output = String::new();

    for (i, caption) in captions.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(caption.start_secs),
            format_srt_time(caption.end_secs),
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content from captions.
pub fn generate_vtt(captions: &[Caption]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for caption in captions {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(caption.start_secs),
            format_vtt_time(caption.end_secs),
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save subtitles to a file, picking the format from its extension.
pub fn save_subtitles(captions: &[Caption], path: &Path) -> ReframeResult<()> {
    std::fs::write(path, SubtitleFormat::from_path(path).render(captions))?;
    Ok(())
}

/// Sibling subtitle path for a video: `talk.mp4` -> `talk.srt`.
pub fn sibling_path(video: &Path, format: SubtitleFormat) -> PathBuf {
    video.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(start_secs: f64, end_secs: f64, text: &str) -> Caption {
        Caption {
            start_secs,
            end_secs,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_srt_generation() {
        let captions = vec![
            caption(0.0, 2.5, "Hello world"),
            caption(3.0, 5.0, "This is a test"),
        ];

        let srt = generate_srt(&captions);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500\nHello world"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test"));
    }

    #[test]
    fn test_vtt_generation() {
        let vtt = generate_vtt(&[caption(61.5, 63.0, "One minute in")]);
        assert!(vtt.starts_with("WEBVTT\n"));
        assert!(vtt.contains("00:01:01.500 --> 00:01:03.000"));
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
        assert_eq!(format_vtt_time(3661.5), "01:01:01.500");
        assert_eq!(format_srt_time(0.1 + 0.2), "00:00:00,300");
    }

    #[test]
    fn test_save_picks_format_from_extension() {
        let dir = std::env::temp_dir().join(format!("reframe_subs_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let video = dir.join("talk.mp4");

        let vtt_path = sibling_path(&video, SubtitleFormat::Vtt);
        save_subtitles(&[caption(0.0, 1.0, "Hi")], &vtt_path).unwrap();
        let content = std::fs::read_to_string(&vtt_path).unwrap();
        assert!(content.starts_with("WEBVTT"));
        assert_eq!(vtt_path.file_name().unwrap(), "talk.vtt");

        std::fs::remove_dir_all(&dir).ok();
    }
}
