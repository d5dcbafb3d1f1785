//! Core domain logic for the tab time pipeline.
//!
//! This crate contains the fundamental types and logic for:
//! - Segment reconstruction: rebuilding a session's attention timeline
//!   from switch events, anchored to the recorded session duration
//! - Aggregation: per-activity duration totals and ratios
//! - Verification: invariant checks against the recorded ground truth
//! - Statistics: the numerical routines the analysis reports consume

pub mod activity;
pub mod aggregate;
pub mod batch;
pub mod event;
pub mod segment;
pub mod stats;
pub mod types;
pub mod verify;

pub use activity::{Activity, SwitchTarget, UnknownActivity};
pub use aggregate::ActivityTotals;
pub use batch::{BatchResult, BatchSummary, ParticipantOutcome, reconstruct_all};
pub use event::{Event, EventType, UnknownEventType, sort_by_timestamp};
pub use segment::{
    ReconstructError, Reconstruction, ReconstructionMode, Segment, SessionAnchor, reconstruct,
};
pub use types::{ParticipantId, ValidationError};
pub use verify::{GapRecord, SegmentCheck, VerifyConfig};
