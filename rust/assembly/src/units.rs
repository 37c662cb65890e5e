// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolving an undeclared plane angle unit.
//!
//! Some models carry angle parameters without declaring whether they are
//! radians or degrees. The conversion is then run once per hypothesis, each
//! run on its own copy of the arena with its own report buffer, and the
//! better result is kept:
//!
//! 1. if only one hypothesis succeeds, it wins;
//! 2. if both succeed and exactly one result is closed, the closed one wins;
//! 3. otherwise radians win.
//!
//! Nothing from the losing run reaches the caller's arena or sink.

use std::panic::{self, AssertUnwindSafe};

use ifc_wire_topology::TopologyArena;

use crate::config::{AngleUnit, WireConfig};
use crate::error::{Error, Result};
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::Loop;

struct Trial {
    unit: AngleUnit,
    arena: TopologyArena,
    reports: Vec<Report>,
    outcome: std::result::Result<Loop, String>,
}

pub struct UnitAmbiguityResolver<'a> {
    config: &'a WireConfig,
    entity: EntityRef,
}

impl<'a> UnitAmbiguityResolver<'a> {
    pub fn new(config: &'a WireConfig, entity: EntityRef) -> Self {
        Self { config, entity }
    }

    /// Runs `convert` under each hypothesis and commits the winner.
    ///
    /// `convert` receives a scratch arena, a configuration with the angle
    /// unit set, and a buffering sink. Errors and panics inside it count as
    /// a failed trial.
    pub fn resolve<F>(
        &self,
        arena: &mut TopologyArena,
        sink: &mut dyn ReportSink,
        convert: F,
    ) -> Result<Loop>
    where
        F: Fn(&mut TopologyArena, &WireConfig, &mut dyn ReportSink) -> Result<Loop>,
    {
        sink.report(Report::new(ReportKind::UndeclaredAngleUnit, self.entity));

        let mut trials: Vec<Trial> = AngleUnit::TRIAL_ORDER
            .iter()
            .map(|&unit| self.run_trial(arena, unit, &convert))
            .collect();

        for trial in &trials {
            if let Err(reason) = &trial.outcome {
                sink.report(Report::new(
                    ReportKind::AngleUnitTrialFailed {
                        unit: trial.unit,
                        reason: reason.clone(),
                    },
                    self.entity,
                ));
            }
        }

        let closedness: Vec<Option<bool>> = trials
            .iter()
            .map(|t| t.outcome.as_ref().ok().map(|l| l.closed))
            .collect();
        let Some(index) = select_hypothesis(&closedness) else {
            sink.report(Report::new(ReportKind::AngleUnitUnresolved, self.entity));
            return Err(Error::UnitResolutionFailed(self.entity));
        };

        let winner = trials.swap_remove(index);
        tracing::debug!(entity = %self.entity, unit = %winner.unit, "angle unit resolved");
        *arena = winner.arena;
        for report in winner.reports {
            sink.report(report);
        }
        sink.report(Report::new(
            ReportKind::AngleUnitResolved { unit: winner.unit },
            self.entity,
        ));
        winner
            .outcome
            .map_err(|_| Error::UnitResolutionFailed(self.entity))
    }

    fn run_trial<F>(&self, arena: &TopologyArena, unit: AngleUnit, convert: &F) -> Trial
    where
        F: Fn(&mut TopologyArena, &WireConfig, &mut dyn ReportSink) -> Result<Loop>,
    {
        let config = self.config.assuming(unit);
        let mut scratch = arena.clone();
        let mut reports: Vec<Report> = Vec::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            convert(&mut scratch, &config, &mut reports)
        }));
        let outcome = match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(err.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };
        if let Err(reason) = &outcome {
            tracing::debug!(
                entity = %self.entity,
                unit = %unit,
                reason = %reason,
                "angle unit trial failed"
            );
        }

        Trial {
            unit,
            arena: scratch,
            reports,
            outcome,
        }
    }
}

/// Picks a hypothesis from per-trial outcomes: `Some(closed)` for success.
fn select_hypothesis(outcomes: &[Option<bool>]) -> Option<usize> {
    let succeeded: Vec<usize> = (0..outcomes.len()).filter(|&i| outcomes[i].is_some()).collect();
    let closed: Vec<usize> = succeeded
        .iter()
        .copied()
        .filter(|&i| outcomes[i] == Some(true))
        .collect();
    match (succeeded.as_slice(), closed.as_slice()) {
        ([], _) => None,
        (_, [single]) => Some(*single),
        ([first, ..], _) => Some(*first),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during conversion".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rules() {
        // Only one succeeds
        assert_eq!(select_hypothesis(&[None, Some(false)]), Some(1));
        assert_eq!(select_hypothesis(&[Some(false), None]), Some(0));
        // Closed wins
        assert_eq!(select_hypothesis(&[Some(false), Some(true)]), Some(1));
        assert_eq!(select_hypothesis(&[Some(true), Some(false)]), Some(0));
        // Tie keeps radians
        assert_eq!(select_hypothesis(&[Some(true), Some(true)]), Some(0));
        assert_eq!(select_hypothesis(&[Some(false), Some(false)]), Some(0));
        // Nothing works
        assert_eq!(select_hypothesis(&[None, None]), None);
    }

    #[test]
    fn panicking_trial_is_a_failure() {
        let mut arena = TopologyArena::new();
        let config = WireConfig::new(1e-5);
        let mut reports: Vec<Report> = Vec::new();

        let result = UnitAmbiguityResolver::new(&config, EntityRef(8)).resolve(
            &mut arena,
            &mut reports,
            |arena, config, _| {
                if config.plane_angle_unit == Some(1.0) {
                    panic!("kernel failure");
                }
                let v0 = arena.add_vertex(0.0, 0.0, 0.0);
                let v1 = arena.add_vertex(1.0, 0.0, 0.0);
                let edge = arena.add_line(v0, v1)?;
                Ok(Loop::from_edges(arena, vec![edge], config.precision))
            },
        );

        let result = result.unwrap();
        assert_eq!(result.len(), 1);
        assert!(reports.iter().any(|r| r.kind
            == ReportKind::AngleUnitTrialFailed {
                unit: AngleUnit::Radians,
                reason: "kernel failure".into()
            }));
        assert!(reports.iter().any(|r| r.kind
            == ReportKind::AngleUnitResolved {
                unit: AngleUnit::Degrees
            }));
    }

    #[test]
    fn both_failing_is_an_error() {
        let mut arena = TopologyArena::new();
        let config = WireConfig::new(1e-5);
        let mut reports: Vec<Report> = Vec::new();

        let result = UnitAmbiguityResolver::new(&config, EntityRef(8)).resolve(
            &mut arena,
            &mut reports,
            |_, _, _| Err(Error::EmptyCurve(EntityRef(8))),
        );
        assert!(matches!(result, Err(Error::UnitResolutionFailed(EntityRef(8)))));
        assert_eq!(reports.last().unwrap().kind, ReportKind::AngleUnitUnresolved);
        assert_eq!(arena.edge_count(), 0);
    }
}
