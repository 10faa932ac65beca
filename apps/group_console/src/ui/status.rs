//! Device state labels and the badge severity they render with.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStatus {
    Success,
    Error,
    Processing,
}

impl BadgeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for BadgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State label as delivered by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
    NotActive,
    /// Any label outside the fixed set. Renders without a badge class.
    Other(String),
}

impl DeviceStatus {
    pub fn from_label(text: &str) -> Self {
        match text {
            "在线" => Self::Online,
            "离线" => Self::Offline,
            "未激活" => Self::NotActive,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn badge(&self) -> Option<BadgeStatus> {
        match self {
            Self::Online => Some(BadgeStatus::Success),
            Self::Offline => Some(BadgeStatus::Error),
            Self::NotActive => Some(BadgeStatus::Processing),
            // Unmapped labels stay unclassified rather than defaulting.
            Self::Other(_) => None,
        }
    }
}

pub fn badge_for_label(text: &str) -> Option<BadgeStatus> {
    DeviceStatus::from_label(text).badge()
}
