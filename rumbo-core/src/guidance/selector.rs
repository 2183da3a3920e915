//! Instruction selection
//!
//! Decides which authored text, if any, each progress update warrants.
//! Start fires on edge entry, mid-course and arrival fire once per
//! edge inside their distance windows, and a session that has been
//! recalculated gets a generic re-orientation text instead of the
//! edge's authored start.

use log::debug;

use super::config::EngineConfig;
use super::progress::{ProgressUpdate, RouteProgress};
use crate::SegmentId;
use crate::model::InstructionPhase;

/// Spoken when guidance resumes after the traveller left the plan;
/// authored edge text would be contextually wrong at that point.
pub const REORIENTATION_TEXT: &str =
    "You seem to have left the route. Turn around and head back to the previous waypoint.";

/// Text chosen for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub segment: SegmentId,
    pub phase: InstructionPhase,
    pub text: String,
}

/// Why a progress update produced no instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentReason {
    /// Both distance phases for this leg already fired.
    AlreadyGiven,
    /// Distance to target is outside every firing window.
    NotInRange,
    /// No usable distance estimate for this leg.
    NoDistance,
    /// A phase fired but the leg carries no authored text for it.
    NoAuthoredText,
    /// Candidate text equals the previous delivery on this leg.
    RepeatSuppressed,
    /// The update carries no guidance consequence.
    Unchanged,
}

/// Outcome of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Deliver(Vec<Instruction>),
    Silent(SilentReason),
}

pub struct InstructionSelector {
    config: EngineConfig,
    /// Last delivered segment/text pair, for back-to-back dedup.
    last_delivered: Option<(SegmentId, String)>,
}

impl InstructionSelector {
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self {
            config,
            last_delivered: None,
        }
    }

    /// Opening instruction of a fresh session: the first leg's Start,
    /// or its StartingOnly when that is all the leg carries.
    pub(crate) fn begin(&mut self, progress: &RouteProgress) -> Selection {
        let Some(leg) = progress.current_segment() else {
            return Selection::Silent(SilentReason::Unchanged);
        };
        let segment = leg.id.clone();
        if let Some(text) = leg.instructions.text(InstructionPhase::Start) {
            let text = text.to_string();
            return self.deliver(vec![Instruction {
                segment,
                phase: InstructionPhase::Start,
                text,
            }]);
        }
        if progress.is_first_edge() {
            if let Some(text) = leg.instructions.text(InstructionPhase::StartingOnly) {
                let text = text.to_string();
                return self.deliver(vec![Instruction {
                    segment,
                    phase: InstructionPhase::StartingOnly,
                    text,
                }]);
            }
        }
        Selection::Silent(SilentReason::NoAuthoredText)
    }

    /// Selection for one progress update.
    pub(crate) fn select(
        &mut self,
        progress: &mut RouteProgress,
        update: &ProgressUpdate,
    ) -> Selection {
        match update {
            ProgressUpdate::Unchanged | ProgressUpdate::OffRoute { .. } => {
                Selection::Silent(SilentReason::Unchanged)
            }
            ProgressUpdate::Noise { .. } | ProgressUpdate::Refined => {
                self.distance_phase(progress)
            }
            ProgressUpdate::Rerouted => {
                let Some(leg) = progress.current_segment() else {
                    return Selection::Silent(SilentReason::NoAuthoredText);
                };
                let segment = leg.id.clone();
                progress.take_recalculated();
                self.deliver(vec![Instruction {
                    segment,
                    phase: InstructionPhase::Start,
                    text: REORIENTATION_TEXT.to_string(),
                }])
            }
            ProgressUpdate::Advanced {
                completed,
                arrival_already_given,
                arrived,
                ..
            } => {
                let mut batch = Vec::new();
                if !arrival_already_given {
                    if let Some(text) = completed.instructions.text(InstructionPhase::Arrival) {
                        batch.push(Instruction {
                            segment: completed.id.clone(),
                            phase: InstructionPhase::Arrival,
                            text: text.to_string(),
                        });
                    }
                }
                if !arrived {
                    let recalculated = progress.take_recalculated();
                    if let Some(leg) = progress.current_segment() {
                        if recalculated {
                            batch.push(Instruction {
                                segment: leg.id.clone(),
                                phase: InstructionPhase::Start,
                                text: REORIENTATION_TEXT.to_string(),
                            });
                        } else if let Some(text) = leg.instructions.text(InstructionPhase::Start) {
                            batch.push(Instruction {
                                segment: leg.id.clone(),
                                phase: InstructionPhase::Start,
                                text: text.to_string(),
                            });
                        }
                    }
                }
                if batch.is_empty() {
                    Selection::Silent(SilentReason::NoAuthoredText)
                } else {
                    self.deliver(batch)
                }
            }
        }
    }

    /// Mid-course / arrival evaluation against the distance windows.
    /// Phase flags are set the moment a window fires, even when the
    /// leg carries no authored text for the phase, so a later text
    /// cannot fire out of order.
    fn distance_phase(&mut self, progress: &mut RouteProgress) -> Selection {
        if progress.mid_course_given() && progress.arrival_given() {
            return Selection::Silent(SilentReason::AlreadyGiven);
        }
        let Some(distance) = progress.distance_to_target() else {
            return Selection::Silent(SilentReason::NoDistance);
        };
        let Some(leg) = progress.current_segment() else {
            return Selection::Silent(SilentReason::NotInRange);
        };
        let segment = leg.id.clone();
        let mid_text = leg
            .instructions
            .text(InstructionPhase::MidCourse)
            .map(str::to_string);
        let arrival_text = leg
            .instructions
            .text(InstructionPhase::Arrival)
            .map(str::to_string);

        let mid_limit = self.config.mid_course_limit();
        let arrival_limit = self.config.arrival_limit();

        if !progress.mid_course_given() && distance <= mid_limit && distance > arrival_limit {
            progress.mark_mid_course_given();
            return match mid_text {
                Some(text) => self.deliver(vec![Instruction {
                    segment,
                    phase: InstructionPhase::MidCourse,
                    text,
                }]),
                None => Selection::Silent(SilentReason::NoAuthoredText),
            };
        }

        if !progress.arrival_given() && distance <= arrival_limit {
            progress.mark_arrival_given();
            return match arrival_text {
                Some(text) => self.deliver(vec![Instruction {
                    segment,
                    phase: InstructionPhase::Arrival,
                    text,
                }]),
                None => Selection::Silent(SilentReason::NoAuthoredText),
            };
        }

        Selection::Silent(SilentReason::NotInRange)
    }

    fn deliver(&mut self, batch: Vec<Instruction>) -> Selection {
        let mut kept = Vec::with_capacity(batch.len());
        for instruction in batch {
            let repeat = self
                .last_delivered
                .as_ref()
                .is_some_and(|(segment, text)| {
                    *segment == instruction.segment && *text == instruction.text
                });
            if repeat {
                debug!(
                    "suppressing repeat of '{}' on segment {}",
                    instruction.text, instruction.segment
                );
                continue;
            }
            self.last_delivered = Some((instruction.segment.clone(), instruction.text.clone()));
            kept.push(instruction);
        }
        if kept.is_empty() {
            Selection::Silent(SilentReason::RepeatSuppressed)
        } else {
            Selection::Deliver(kept)
        }
    }
}
