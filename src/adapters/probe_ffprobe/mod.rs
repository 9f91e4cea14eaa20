//! FFprobe adapter for reading video dimensions and duration

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Default probe executable name, resolved through `PATH`
pub const DEFAULT_PROBE: &str = "ffprobe";

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    program: String,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfprobeAdapter {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Parse `ffprobe -print_format json` output for the first video stream
    pub fn parse_output(json: &[u8]) -> Result<VideoMeta, DomainError> {
        let output: ProbeOutput = serde_json::from_slice(json)
            .map_err(|e| DomainError::ProbeFail(format!("Unreadable probe output: {}", e)))?;

        let stream = output
            .streams
            .first()
            .ok_or_else(|| DomainError::ProbeFail("No video stream found".to_string()))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(width), Some(height)) => (width, height),
            _ => {
                return Err(DomainError::ProbeFail(
                    "Video stream has no frame size".to_string(),
                ))
            }
        };

        // Stream duration is missing for some containers; fall back to the format's
        let duration_ms = stream
            .duration
            .as_deref()
            .or_else(|| output.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|text| text.trim().parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .map(|seconds| (seconds * 1000.0).round() as u64)
            .unwrap_or_default();

        VideoMeta::new(width, height, duration_ms)
    }
}

impl Default for FfprobeAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE)
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe_video(&self, path: &Path) -> Result<VideoMeta, DomainError> {
        debug!("Probing {}", path.display());

        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DomainError::ProbeFail(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(DomainError::ProbeFail(format!(
                "{} failed on {}: {}",
                self.program,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let meta = Self::parse_output(&output.stdout)?;
        debug!(width = meta.width, height = meta.height, duration_ms = meta.duration_ms, "Probe complete");
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_reads_first_stream() {
        let json = br#"{
            "streams": [{"index": 0, "codec_name": "h264", "width": 1920, "height": 1080, "duration": "12.500000"}],
            "format": {"duration": "13.000000"}
        }"#;
        let meta = FfprobeAdapter::parse_output(json).unwrap();
        assert_eq!(meta, VideoMeta::new(1920, 1080, 12_500).unwrap());
    }

    #[test]
    fn test_parse_output_falls_back_to_format_duration() {
        let json = br#"{"streams": [{"width": 640, "height": 360}], "format": {"duration": "3.25"}}"#;
        assert_eq!(FfprobeAdapter::parse_output(json).unwrap().duration_ms, 3250);
    }

    #[test]
    fn test_parse_output_without_video_stream() {
        let json = br#"{"streams": [], "format": {"duration": "3.25"}}"#;
        assert!(matches!(
            FfprobeAdapter::parse_output(json),
            Err(DomainError::ProbeFail(_))
        ));
    }

    #[test]
    fn test_parse_output_rejects_zero_size() {
        let json = br#"{"streams": [{"width": 0, "height": 1080}]}"#;
        assert!(matches!(
            FfprobeAdapter::parse_output(json),
            Err(DomainError::InvalidVideoBounds { .. })
        ));
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(FfprobeAdapter::parse_output(b"not json").is_err());
    }
}
