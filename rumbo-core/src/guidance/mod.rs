//! Turn-by-turn guidance engine
//!
//! Contains the per-session state machine tracking progress along a
//! planned route and the selector that turns progress updates into
//! authored instructions.

mod bearing;
mod config;
mod progress;
mod selector;
mod session;

pub use bearing::bearing_change;
pub use config::EngineConfig;
pub use progress::{ProgressState, ProgressUpdate, RouteProgress, RouteState};
pub use selector::{
    Instruction, InstructionSelector, REORIENTATION_TEXT, Selection, SilentReason,
};
pub use session::{
    GuidanceEvent, GuidanceSession, InstructionSink, PositionSource, SessionEnd, run_session,
};
