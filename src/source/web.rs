//! Web video host detection (YouTube, TikTok).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static YOUTUBE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches the common YouTube URL formats
    Regex::new(
        r"(?x)
        ^(?:https?://)?
        (?:www\.|m\.|music\.)?
        (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
        ([a-zA-Z0-9_-]{11})
    ",
    )
    .expect("Invalid regex")
});

static TIKTOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:https?://)?
        (?:www\.|m\.)?
        tiktok\.com/@[A-Za-z0-9_.-]+/video/
        ([0-9]+)
    ",
    )
    .expect("Invalid regex")
});

/// A web video hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebHost {
    YouTube,
    TikTok,
}

impl std::fmt::Display for WebHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebHost::YouTube => write!(f, "youtube"),
            WebHost::TikTok => write!(f, "tiktok"),
        }
    }
}

/// Extract the host and video ID from a web video URL.
pub fn detect_web_video(input: &str) -> Option<(WebHost, String)> {
    let input = input.trim();

    if let Some(caps) = YOUTUBE.captures(input) {
        return caps
            .get(1)
            .map(|m| (WebHost::YouTube, m.as_str().to_string()));
    }

    TIKTOK
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| (WebHost::TikTok, m.as_str().to_string()))
}
