//! Tracking state reported by the AR session for frames, planes and anchors.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// Tracking state of a session-owned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    /// Pose is being estimated and is safe to read.
    Tracking,
    /// Tracking is temporarily lost; it may resume later.
    Paused,
    /// Tracking ended for good (e.g. the anchor was removed).
    Stopped,
}

impl TrackingState {
    #[inline]
    pub fn is_tracking(self) -> bool {
        self == Self::Tracking
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tracking => "TRACKING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

impl FromStr for TrackingState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracking" => Ok(Self::Tracking),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            other => bail!("unknown tracking state '{}'", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_tracking_is_tracking() {
        assert!(TrackingState::Tracking.is_tracking());
        assert!(!TrackingState::Paused.is_tracking());
        assert!(!TrackingState::Stopped.is_tracking());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("TRACKING".parse::<TrackingState>().unwrap(), TrackingState::Tracking);
        assert_eq!(" paused ".parse::<TrackingState>().unwrap(), TrackingState::Paused);
        assert!("lost".parse::<TrackingState>().is_err());
    }
}
