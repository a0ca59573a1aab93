//! Files written next to a finished export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use reframe_audio_ai::subtitles::{save_subtitles, sibling_path, SubtitleFormat};
use reframe_project_model::project::Caption;

const SIDECAR_FORMATS: [SubtitleFormat; 2] = [SubtitleFormat::Srt, SubtitleFormat::Vtt];

/// Subtitle files that accompany `output`.
pub fn sidecar_paths(output: &Path) -> Vec<PathBuf> {
    SIDECAR_FORMATS
        .iter()
        .map(|format| sibling_path(output, *format))
        .collect()
}

/// Write SRT and VTT captions next to `output`, one blocking task per file.
///
/// Failures are logged and never propagated. Callers may drop the handles.
pub fn spawn_subtitle_sidecars(output: &Path, captions: Vec<Caption>) -> Vec<JoinHandle<()>> {
    let captions: Arc<[Caption]> = captions.into();
    SIDECAR_FORMATS
        .iter()
        .map(|format| {
            let path = sibling_path(output, *format);
            let captions = captions.clone();
            tokio::task::spawn_blocking(move || match save_subtitles(&captions, &path) {
                Ok(()) => tracing::info!(
                    path = %path.display(),
                    captions = captions.len(),
                    "Wrote subtitle sidecar"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to write subtitle sidecar"
                ),
            })
        })
        .collect()
}
