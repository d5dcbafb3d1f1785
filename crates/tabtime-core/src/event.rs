//! Interaction events from the instrumentation export.

use std::fmt;
use std::str::FromStr;

use crate::activity::SwitchTarget;

/// Canonical event types logged by the reading interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    FocusSwitch,
    ResourceTabSwitch,
    ScrollAction,
    Selection,
    VideoPlay,
    VideoPause,
    VideoEnded,
    AudioPlay,
    AudioPause,
    AudioEnded,
    LlmActivity,
}

impl EventType {
    /// Whether this event delimits attention segments.
    #[must_use]
    pub const fn is_switch(self) -> bool {
        matches!(self, Self::FocusSwitch | Self::ResourceTabSwitch)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FocusSwitch => "focus_switch",
            Self::ResourceTabSwitch => "resource_tab_switch",
            Self::ScrollAction => "scroll_action",
            Self::Selection => "selection",
            Self::VideoPlay => "video_play",
            Self::VideoPause => "video_pause",
            Self::VideoEnded => "video_ended",
            Self::AudioPlay => "audio_play",
            Self::AudioPause => "audio_pause",
            Self::AudioEnded => "audio_ended",
            Self::LlmActivity => "llm_activity",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus_switch" => Ok(Self::FocusSwitch),
            "resource_tab_switch" => Ok(Self::ResourceTabSwitch),
            "scroll_action" => Ok(Self::ScrollAction),
            "selection" => Ok(Self::Selection),
            "video_play" => Ok(Self::VideoPlay),
            "video_pause" => Ok(Self::VideoPause),
            "video_ended" => Ok(Self::VideoEnded),
            "audio_play" => Ok(Self::AudioPlay),
            "audio_pause" => Ok(Self::AudioPause),
            "audio_ended" => Ok(Self::AudioEnded),
            "llm_activity" => Ok(Self::LlmActivity),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// One observed interaction at an instant in time.
///
/// Built once by the tables layer and never mutated afterwards; all
/// derived state lives in the reconstructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Milliseconds since epoch. `None` when the exported field was
    /// missing or unparseable; such events are excluded from ordering
    /// and segmenting but still scanned for other fields.
    pub timestamp: Option<f64>,
    /// `None` when the exported type string is outside the vocabulary.
    /// Events without a known type are passive.
    pub kind: Option<EventType>,
    /// Parsed `to` field. Meaningful only on switch events.
    pub to: SwitchTarget,
    /// Dwell time on a section before a scroll, when recorded.
    pub pause_duration: Option<f64>,
    /// Milliseconds since the previous event, when recorded.
    pub time_since_last: Option<f64>,
}

impl Event {
    /// Whether this event delimits attention segments.
    #[must_use]
    pub fn is_switch(&self) -> bool {
        self.kind.is_some_and(EventType::is_switch)
    }
}

/// Sorts events by timestamp ascending.
///
/// Events without a parseable timestamp sort first; they never
/// contribute to the session window or to segment boundaries.
pub fn sort_by_timestamp(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.timestamp
            .unwrap_or(0.0)
            .total_cmp(&b.timestamp.unwrap_or(0.0))
    });
}
