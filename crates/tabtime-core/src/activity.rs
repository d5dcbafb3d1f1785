//! Activity labels as the single source of truth for tab strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The `to` payload value that marks end-of-session. Never an activity.
pub const PHASE_COMPLETE: &str = "phase_complete";

/// The fixed vocabulary of activities a segment can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Activity {
    Reading,
    Chat,
    Video,
    Audio,
    Infographics,
}

impl Activity {
    /// Every activity, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Reading,
        Self::Chat,
        Self::Video,
        Self::Audio,
        Self::Infographics,
    ];

    /// String representation as it appears in the event log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Chat => "chat",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Infographics => "infographics",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Activity {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(Self::Reading),
            "chat" => Ok(Self::Chat),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "infographics" => Ok(Self::Infographics),
            _ => Err(UnknownActivity(s.to_string())),
        }
    }
}

impl Serialize for Activity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for labels outside the activity vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActivity(pub String);

impl fmt::Display for UnknownActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activity: {}", self.0)
    }
}

impl std::error::Error for UnknownActivity {}

/// Parsed `to` field of a switch event.
///
/// Only [`SwitchTarget::Tab`] retags the session; everything else is a
/// no-op switch whose timestamp still advances the segment boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTarget {
    /// Switch into a known activity.
    Tab(Activity),
    /// End-of-session sentinel.
    PhaseComplete,
    /// Empty or missing `to`.
    Blank,
    /// A label outside the vocabulary, kept raw for diagnostics.
    Unrecognized(String),
}

impl SwitchTarget {
    /// Parses a raw `to` value from the event log.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::Blank,
            Some(s) if s == PHASE_COMPLETE => Self::PhaseComplete,
            Some(s) => s
                .parse()
                .map_or_else(|_| Self::Unrecognized(s.to_string()), Self::Tab),
        }
    }

    /// The activity to retag with, if this target carries one.
    #[must_use]
    pub const fn tab(&self) -> Option<Activity> {
        match self {
            Self::Tab(activity) => Some(*activity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for activity in Activity::ALL {
            let s = activity.to_string();
            let parsed: Activity = s.parse().expect("should parse");
            assert_eq!(parsed, activity, "roundtrip failed for {activity:?}");
        }
    }

    #[test]
    fn phase_complete_is_not_an_activity() {
        let result: Result<Activity, _> = PHASE_COMPLETE.parse();
        assert!(result.is_err());
        assert_eq!(
            SwitchTarget::parse(Some(PHASE_COMPLETE)),
            SwitchTarget::PhaseComplete
        );
    }

    #[test]
    fn switch_target_parses_known_tabs() {
        assert_eq!(
            SwitchTarget::parse(Some("chat")),
            SwitchTarget::Tab(Activity::Chat)
        );
        assert_eq!(SwitchTarget::parse(Some("chat")).tab(), Some(Activity::Chat));
    }

    #[test]
    fn switch_target_blank_and_unrecognized_carry_no_tab() {
        assert_eq!(SwitchTarget::parse(None), SwitchTarget::Blank);
        assert_eq!(SwitchTarget::parse(Some("")), SwitchTarget::Blank);
        assert_eq!(
            SwitchTarget::parse(Some("minimap")),
            SwitchTarget::Unrecognized("minimap".to_string())
        );
        assert_eq!(SwitchTarget::parse(Some("minimap")).tab(), None);
        assert_eq!(SwitchTarget::PhaseComplete.tab(), None);
    }

    #[test]
    fn activity_serde_uses_log_strings() {
        let json = serde_json::to_string(&Activity::Infographics).unwrap();
        assert_eq!(json, "\"infographics\"");
        let parsed: Activity = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(parsed, Activity::Audio);
    }
}
