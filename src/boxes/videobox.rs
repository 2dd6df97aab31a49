//! Videobox: asynchronous video analysis using Facebox, Tagbox and Nudebox.
//!
//! A video is submitted with [`Videobox::check`], which returns immediately
//! with an id. Progress is read with [`Videobox::status`] and, once the video
//! is complete, the findings with [`Videobox::results`].

use crate::config::DEFAULT_TEXT_TIMEOUT;
use crate::error::BoxError;
use crate::input::Input;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

box_client!(
    /// Client for a Videobox instance.
    Videobox,
    "videobox",
    DEFAULT_TEXT_TIMEOUT
);

/// Processing state of a submitted video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Pending,
    Downloading,
    Processing,
    Complete,
    Failed,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A video being processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub status: VideoStatus,
    /// Set when `status` is [`VideoStatus::Failed`].
    pub error: String,
    pub download_total: i64,
    pub download_complete: i64,
    /// RFC 3339 timestamp.
    pub download_complete_estimate: Option<String>,
    pub frames_count: i64,
    pub frames_complete: i64,
    pub last_frame_base64: String,
    pub milliseconds_complete: i64,
    /// RFC 3339 timestamp after which the results are deleted.
    pub expires: Option<String>,
}

/// Findings for a processed video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoAnalysis {
    pub ready: bool,
    pub facebox: Option<FaceboxResults>,
    pub tagbox: Option<TagboxResults>,
    pub nudebox: Option<NudeboxResults>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceboxResults {
    pub faces: Vec<Item>,
    #[serde(rename = "errorsCount")]
    pub errors_count: u64,
    #[serde(rename = "lastError")]
    pub last_error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagboxResults {
    pub tags: Vec<Item>,
    #[serde(rename = "errorsCount")]
    pub errors_count: u64,
    #[serde(rename = "lastError")]
    pub last_error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudeboxResults {
    pub nudity: Vec<Item>,
    #[serde(rename = "errorsCount")]
    pub errors_count: u64,
    #[serde(rename = "lastError")]
    pub last_error: String,
}

/// Something found in the video, with every stretch of frames it appears in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub key: String,
    pub instances: Vec<Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    /// First frame.
    pub start: u64,
    /// Last frame.
    pub end: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    pub confidence: f64,
}

/// Optional processing settings for [`Videobox::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    fields: BTreeMap<&'static str, String>,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long the results are kept after processing.
    pub fn results_duration(self, duration: Duration) -> Self {
        self.set("resultsDuration", format_duration(duration))
    }

    /// Process one frame in every `frames`.
    pub fn skip_frames(self, frames: u32) -> Self {
        self.set("skipframes", frames.to_string())
    }

    pub fn skip_seconds(self, seconds: u32) -> Self {
        self.set("skipseconds", seconds.to_string())
    }

    pub fn frame_width(self, width: u32) -> Self {
        self.set("frameWidth", width.to_string())
    }

    pub fn frame_height(self, height: u32) -> Self {
        self.set("frameHeight", height.to_string())
    }

    pub fn facebox_threshold(self, threshold: f64) -> Self {
        self.set("faceboxThreshold", threshold.to_string())
    }

    /// Report every Tagbox tag.
    pub fn tagbox_include_all(self) -> Self {
        self.set("tagboxInclude", "all".to_string())
    }

    /// Report only custom Tagbox tags.
    pub fn tagbox_include_custom(self) -> Self {
        self.set("tagboxInclude", "custom".to_string())
    }

    pub fn tagbox_threshold(self, threshold: f64) -> Self {
        self.set("tagboxThreshold", threshold.to_string())
    }

    pub fn nudebox_threshold(self, threshold: f64) -> Self {
        self.set("nudeboxThreshold", threshold.to_string())
    }

    /// Form fields in key order.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    fn set(mut self, key: &'static str, value: String) -> Self {
        self.fields.insert(key, value);
        self
    }
}

/// Formats a duration the way the box parses it, e.g. `1h0m0s` or `1.5s`.
fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total = duration.as_secs();
    let (hours, minutes) = (total / 3600, total / 60 % 60);
    let seconds = decimal(
        u128::from(total % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos()),
        1_000_000_000,
    );
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// `value / unit` as a decimal without trailing zeros.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{rem:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl Videobox {
    /// Submit a video for processing.
    pub async fn check(
        &self,
        input: Input,
        options: Option<&CheckOptions>,
    ) -> Result<Video, BoxError> {
        let fields = options.map(CheckOptions::fields).unwrap_or_default();
        let builder =
            input.apply(&self.client, self.client.post(&["videobox", "check"])?, &fields)?;
        let video: Video = self.client.send_or_default(builder).await?;
        debug!(video_id = %video.id, "Video submitted");
        Ok(video)
    }

    /// Processing progress of the video `id`.
    pub async fn status(&self, id: &str) -> Result<Video, BoxError> {
        self.client.require(id, "id")?;
        let builder = self.client.get(&["videobox", "status", id])?;
        self.client.send_or_default(builder).await
    }

    pub async fn results(&self, id: &str) -> Result<VideoAnalysis, BoxError> {
        self.client.require(id, "id")?;
        let builder = self.client.get(&["videobox", "results", id])?;
        self.client.send_or_default(builder).await
    }

    /// Delete the results of the video `id`.
    pub async fn delete(&self, id: &str) -> Result<(), BoxError> {
        self.client.require(id, "id")?;
        let builder = self.client.delete(&["videobox", "results", id])?;
        self.client.send_unit(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::Url;

    const VIDEO_ID: &str = "5a50b8067eced76bad103c53dd0f5226";

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_nanos(2500)), "2.5µs");
        assert_eq!(format_duration(Duration::from_nanos(12)), "12ns");
    }

    #[test]
    fn test_check_options_fields() {
        let options = CheckOptions::new()
            .results_duration(Duration::from_secs(3600))
            .skip_frames(10)
            .skip_seconds(5)
            .frame_width(100)
            .frame_height(60)
            .facebox_threshold(0.5)
            .tagbox_include_custom()
            .tagbox_threshold(0.25)
            .nudebox_threshold(1.0);
        assert_eq!(
            options.fields(),
            vec![
                ("faceboxThreshold", "0.5"),
                ("frameHeight", "60"),
                ("frameWidth", "100"),
                ("nudeboxThreshold", "1"),
                ("resultsDuration", "1h0m0s"),
                ("skipframes", "10"),
                ("skipseconds", "5"),
                ("tagboxInclude", "custom"),
                ("tagboxThreshold", "0.25"),
            ]
        );
    }

    #[test]
    fn test_check_url_with_options() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/videobox/check")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "url".to_string(),
                    "https://test.machinebox.io/video.mp4".to_string(),
                ),
                Matcher::UrlEncoded("skipframes".to_string(), "10".to_string()),
                Matcher::UrlEncoded("tagboxInclude".to_string(), "all".to_string()),
                Matcher::UrlEncoded("resultsDuration".to_string(), "1m30s".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true,"id":"5a50b8067eced76bad103c53dd0f5226"}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let videobox = Videobox::new(&server.url()).unwrap();
            let options = CheckOptions::new()
                .skip_frames(10)
                .tagbox_include_all()
                .results_duration(Duration::from_secs(90));
            let url = Url::parse("https://test.machinebox.io/video.mp4").unwrap();
            let video = videobox
                .check(Input::url(url), Some(&options))
                .await
                .unwrap();
            assert_eq!(video.id, VIDEO_ID);
            assert_eq!(video.status, VideoStatus::Pending);
        });

        mock.assert();
    }

    #[test]
    fn test_check_file_error() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/videobox/check")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"success":false,"error":"something went wrong"}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let videobox = Videobox::new(&server.url()).unwrap();
            let err = videobox
                .check(Input::file(b"mp4".to_vec(), "video.mp4"), None)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "videobox: something went wrong");
        });

        mock.assert();
    }

    #[test]
    fn test_status() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/videobox/status/5a50b8067eced76bad103c53dd0f5226")
            .match_header("accept", "application/json; charset=utf-8")
            .with_status(200)
            .with_body(
                r#"{
                "success": true,
                "id": "5a50b8067eced76bad103c53dd0f5226",
                "status": "processing",
                "framesCount": 720,
                "framesComplete": 100,
                "millisecondsComplete": 4000,
                "expires": "2018-01-08T10:00:00Z"
            }"#,
            )
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let videobox = Videobox::new(&server.url()).unwrap();
            let video = videobox.status(VIDEO_ID).await.unwrap();
            assert_eq!(video.id, VIDEO_ID);
            assert_eq!(video.status, VideoStatus::Processing);
            assert_eq!(video.frames_count, 720);
            assert_eq!(video.frames_complete, 100);
            assert_eq!(video.milliseconds_complete, 4000);
            assert_eq!(video.expires.as_deref(), Some("2018-01-08T10:00:00Z"));
            assert_eq!(video.download_complete_estimate, None);
        });

        mock.assert();
    }

    #[test]
    fn test_results_and_delete() {
        let mut server = Server::new();
        let results = server
            .mock("GET", "/videobox/results/5a50b8067eced76bad103c53dd0f5226")
            .with_status(200)
            .with_body(
                r#"{
                "success": true,
                "ready": true,
                "facebox": {
                    "faces": [
                        {
                            "key": "Unknown faces",
                            "instances": [
                                {"start": 24, "end": 144, "start_ms": 1000, "end_ms": 6006},
                                {"start": 336, "end": 528, "start_ms": 14013, "end_ms": 22022}
                            ]
                        }
                    ],
                    "errorsCount": 0
                },
                "tagbox": {
                    "tags": [
                        {"key": "candle", "instances": [{"start": 168, "end": 168, "start_ms": 7006, "end_ms": 7006}]},
                        {"key": "crutch", "instances": [{"start": 504, "end": 504, "start_ms": 21021, "end_ms": 21021}]},
                        {"key": "miniskirt", "instances": [{"start": 72, "end": 72, "start_ms": 3003, "end_ms": 3003, "confidence": 0.6}]}
                    ],
                    "errorsCount": 1,
                    "lastError": "timeout"
                }
            }"#,
            )
            .create();
        let delete = server
            .mock("DELETE", "/videobox/results/5a50b8067eced76bad103c53dd0f5226")
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let videobox = Videobox::new(&server.url()).unwrap();
            let analysis = videobox.results(VIDEO_ID).await.unwrap();
            assert!(analysis.ready);

            let facebox = analysis.facebox.unwrap();
            assert_eq!(facebox.faces.len(), 1);
            assert_eq!(facebox.faces[0].instances[1].end_ms, 22022);

            let tagbox = analysis.tagbox.unwrap();
            assert_eq!(tagbox.tags.len(), 3);
            assert_eq!(tagbox.errors_count, 1);
            assert_eq!(tagbox.last_error, "timeout");
            assert_eq!(tagbox.tags[2].instances[0].confidence, 0.6);

            assert!(analysis.nudebox.is_none());

            videobox.delete(VIDEO_ID).await.unwrap();
        });

        results.assert();
        delete.assert();
    }
}
