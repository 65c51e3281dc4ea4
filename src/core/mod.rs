//! Geofence presence and attendance core.
//!
//! Nothing in here touches the terminal or the database: storage is reached
//! through [`recorder::RecordSink`] and positions through
//! [`source::PositionSource`].

pub mod geo;
pub mod presence;
pub mod recorder;
pub mod source;
pub mod stats;
pub mod tracker;
pub mod zones;

pub use presence::PresenceStateMachine;
pub use recorder::{AttendanceRecorder, NullSink, RecordSink};
pub use source::{ChannelSource, JsonLinesSource, PositionSource};
pub use stats::{AttendanceStats, StatsPolicy};
pub use tracker::{PositionTracker, TrackerState, TrackerStatus};
pub use zones::ZoneRegistry;
