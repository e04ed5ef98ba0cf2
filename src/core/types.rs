//! Pose, drive parameters, and match types.

use serde::{Deserialize, Serialize};

/// Normalize a heading in degrees to `[0, 360)`.
#[inline]
pub fn normalize_heading(deg: f32) -> f32 {
    let h = deg % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Robot pose in field coordinates.
///
/// Position is in field units. Heading is in degrees, normalized to
/// `[0, 360)`; which rotational direction reaches a heading is the
/// chassis follower's decision, not ours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// X position in field units
    pub x: f32,
    /// Y position in field units
    pub y: f32,
    /// Heading in degrees, normalized to `[0, 360)`
    pub heading: f32,
}

impl Pose {
    /// Create a new pose with the heading normalized.
    #[inline]
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self {
            x,
            y,
            heading: normalize_heading(heading),
        }
    }

    /// Pose at the field origin facing heading zero.
    #[inline]
    pub fn origin() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            heading: 0.0,
        }
    }

    /// Planar distance to another pose.
    #[inline]
    pub fn distance(&self, other: &Pose) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::origin()
    }
}

/// Per-segment drive configuration forwarded to the chassis follower.
///
/// Every field has a conventional default so routine steps only name the
/// parameters they override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveParams {
    /// Drive the segment facing forwards (false = reverse)
    pub forwards: bool,
    /// Maximum follower speed (0-127 scale)
    pub max_speed: f32,
    /// Minimum follower speed, used to keep momentum through chained segments
    pub min_speed: f32,
    /// Lateral drift allowance for the follower
    pub horizontal_drift: f32,
    /// Carrot-point lead for pose-targeting motions
    pub lead: f32,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            forwards: true,
            max_speed: 127.0,
            min_speed: 0.0,
            horizontal_drift: 2.0,
            lead: 0.6,
        }
    }
}

/// Outcome of a blocking chassis motion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The chassis reported the motion settled within its timeout
    Settled,
    /// The timeout elapsed first; the pose may be unsettled
    TimedOut,
}

impl Settle {
    /// True if the motion ran out its timeout.
    #[inline]
    pub fn timed_out(&self) -> bool {
        matches!(self, Settle::TimedOut)
    }
}

/// Alliance colour for the current match. Immutable after config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    Blue,
}

impl Alliance {
    /// The opposing alliance, whose rings are the impostors.
    #[inline]
    pub fn opponent(&self) -> Alliance {
        match self {
            Alliance::Red => Alliance::Blue,
            Alliance::Blue => Alliance::Red,
        }
    }

    /// Lowercase name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Alliance::Red => "red",
            Alliance::Blue => "blue",
        }
    }
}

/// A hue window in degrees. Containment is strict interior: boundary
/// values do not match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueWindow {
    /// Lower bound in degrees (exclusive)
    pub min_deg: f32,
    /// Upper bound in degrees (exclusive)
    pub max_deg: f32,
}

impl HueWindow {
    /// Create a new window.
    pub fn new(min_deg: f32, max_deg: f32) -> Self {
        Self { min_deg, max_deg }
    }

    /// Strict interior containment test.
    #[inline]
    pub fn contains(&self, hue: f32) -> bool {
        hue > self.min_deg && hue < self.max_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-70.0), 290.0);
        assert_eq!(normalize_heading(450.0), 90.0);
    }

    #[test]
    fn test_pose_normalizes_heading() {
        let pose = Pose::new(1.0, 2.0, -70.0);
        assert_eq!(pose.heading, 290.0);
    }

    #[test]
    fn test_drive_params_defaults() {
        let params = DriveParams::default();
        assert!(params.forwards);
        assert_eq!(params.max_speed, 127.0);
        assert_eq!(params.min_speed, 0.0);
    }

    #[test]
    fn test_hue_window_is_strict() {
        let window = HueWindow::new(190.0, 240.0);
        assert!(window.contains(210.0));
        assert!(!window.contains(190.0));
        assert!(!window.contains(240.0));
        assert!(!window.contains(0.0));
    }

    #[test]
    fn test_alliance_opponent() {
        assert_eq!(Alliance::Red.opponent(), Alliance::Blue);
        assert_eq!(Alliance::Blue.opponent(), Alliance::Red);
    }
}
