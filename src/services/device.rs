// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device service client: connectivity status, snapshot capture, HLS stream.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CaptureResponse, StatusResponse};
use serde::Deserialize;
use std::time::Duration;

/// Per-request limit; a hung device reads as a failed request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Device HTTP service client.
#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
    stream_path: String,
}

impl DeviceClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.device_base_url.clone(),
            stream_path: config.stream_path.clone(),
        }
    }

    /// `GET /status`
    pub async fn status(&self) -> Result<StatusResponse, AppError> {
        self.get_json("/status").await
    }

    /// `GET /capture`: ask the device to store a screenshot.
    pub async fn capture(&self) -> Result<CaptureResponse, AppError> {
        self.get_json("/capture").await
    }

    /// URL of the live HLS manifest.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    /// Self-contained HTML page playing the stream in an embedded web view.
    ///
    /// Uses hls.js where Media Source Extensions exist and falls back to
    /// native HLS playback otherwise.
    pub fn player_html(&self) -> String {
        let url = self.stream_url();
        format!(
            r#"<html>
  <head>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <script src="https://cdn.jsdelivr.net/npm/hls.js@latest"></script>
  </head>
  <body style="margin:0; background:black;">
    <video id="video" controls autoplay playsinline style="width:100%;height:100%;object-fit:cover;"></video>
    <script>
      var video = document.getElementById('video');
      if (Hls.isSupported()) {{
        var hls = new Hls();
        hls.loadSource('{url}');
        hls.attachMedia(video);
      }} else if (video.canPlayType('application/vnd.apple.mpegurl')) {{
        video.src = '{url}';
      }}
    </script>
  </body>
</html>
"#
        )
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::Device(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Device(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Device(format!("JSON parse error: {}", e)))
    }
}
