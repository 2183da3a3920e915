//! CSV traces of guidance sessions
//!
//! One row per event, with the tracker state at the moment the event
//! fired. Traces are meant to be diffed between engine revisions and
//! loaded into spreadsheets by venue survey teams.

use std::fs::File;
use std::path::Path;

use rumbo_core::guidance::{GuidanceEvent, RouteState};
use rumbo_core::model::InstructionPhase;

use crate::error::Error;

pub struct TraceWriter {
    writer: csv::Writer<File>,
    seq: u64,
}

impl TraceWriter {
    pub fn create(path: &Path) -> Result<Self, Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "seq",
            "elapsed_ms",
            "event",
            "segment",
            "phase",
            "text",
            "current",
            "destination",
            "remaining_legs",
            "distance_m",
        ])?;
        Ok(Self { writer, seq: 0 })
    }

    pub fn record(
        &mut self,
        elapsed_ms: u128,
        event: &GuidanceEvent,
        state: &RouteState,
    ) -> Result<(), Error> {
        let (kind, segment, phase, text) = match event {
            GuidanceEvent::Instruction(instruction) => (
                "instruction",
                instruction.segment.clone(),
                phase_label(instruction.phase).to_string(),
                instruction.text.clone(),
            ),
            GuidanceEvent::Silent(reason) => {
                ("silent", String::new(), String::new(), format!("{reason:?}"))
            }
            GuidanceEvent::Rerouted { from, to } => (
                "rerouted",
                String::new(),
                String::new(),
                format!("{from} -> {to}"),
            ),
            GuidanceEvent::RouteUnavailable { from, to } => (
                "route_unavailable",
                String::new(),
                String::new(),
                format!("{from} -> {to}"),
            ),
            GuidanceEvent::Arrived { at } => {
                ("arrived", String::new(), String::new(), at.clone())
            }
        };

        self.writer.write_record([
            self.seq.to_string(),
            elapsed_ms.to_string(),
            kind.to_string(),
            segment,
            phase,
            text,
            state.current.clone(),
            state.destination.clone(),
            state.remaining_legs.to_string(),
            state
                .distance_to_target
                .map_or_else(String::new, |d| format!("{d:.1}")),
        ])?;
        self.seq += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

fn phase_label(phase: InstructionPhase) -> &'static str {
    match phase {
        InstructionPhase::Start => "start",
        InstructionPhase::MidCourse => "mid_course",
        InstructionPhase::Arrival => "arrival",
        InstructionPhase::StartingOnly => "starting_only",
    }
}
