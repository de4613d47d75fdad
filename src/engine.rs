// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The adaptive escape-time engine.
//!
//! A fixed iteration limit is either too small, leaving the boundary a
//! black smear, or too large, spending most of a frame on points that
//! are never going to escape.  This engine instead works in passes:
//! every still-unresolved point gets iterations `[current, budget)`,
//! then the budget doubles.  The orbit of each point is carried from
//! pass to pass, so no iteration is ever computed twice.
//!
//! The engine stops refining the whole batch when it hits the optional
//! cap, when every point has escaped, or when enough of the batch has
//! settled and the last pass resolved only a negligible share of what
//! was left.  Anything unresolved at that moment is reported as `None`
//! and colored as if it were in the set, even though only some of those
//! points actually are.

use log::{debug, trace};
use num::Complex;

use crate::errors::RenderError;

/// The iteration at which a point's orbit reached magnitude 2, or
/// `None` if it never did within the iterations it was given.
pub type Escape = Option<usize>;

/// The ceiling of the first refinement pass.
pub const FIRST_BUDGET: usize = 128;

/// The squared escape radius.
const ESCAPE_NORM_SQR: f64 = 4.0;

/// The knobs of the early-stop heuristic and the optional hard cap.
/// Fields are private so that only validated configurations exist.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    precision: f64,
    min_diverged_fraction: f64,
    max_iterations: Option<usize>,
}

fn unit_interval(name: &'static str, value: f64) -> Result<f64, RenderError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(RenderError::OutOfRange { name, value })
    }
}

impl EngineConfig {
    /// `precision`: once the share of remaining points resolved by a
    /// pass falls below this, refinement is considered done.
    /// `min_diverged_fraction`: the share of the batch that must have
    /// escaped before that judgement is allowed.  Both must lie in
    /// (0, 1].  `max_iterations` of `None` means no cap.
    pub fn new(
        precision: f64,
        min_diverged_fraction: f64,
        max_iterations: Option<usize>,
    ) -> Result<EngineConfig, RenderError> {
        Ok(EngineConfig {
            precision: unit_interval("precision", precision)?,
            min_diverged_fraction: unit_interval("min_diverged_fraction", min_diverged_fraction)?,
            max_iterations,
        })
    }

    /// The early-stop rate threshold.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// The settled share required before an early stop.
    pub fn min_diverged_fraction(&self) -> f64 {
        self.min_diverged_fraction
    }

    /// The hard iteration cap, if any.
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            precision: 0.01,
            min_diverged_fraction: 0.05,
            max_iterations: None,
        }
    }
}

/// Why the engine stopped refining a batch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopReason {
    /// There was nothing to do.
    Empty,
    /// The doubled budget reached the configured cap.
    Cap,
    /// Every point escaped.
    AllEscaped,
    /// Enough points had settled and too few were still resolving.
    Converged,
}

/// A summary of one `resolve` call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Refinement {
    /// Refinement passes run.
    pub passes: usize,
    /// Every point was iterated up to (but not including) this index,
    /// unless it escaped first.
    pub iterations: usize,
    /// Points that escaped.
    pub resolved: usize,
    /// What ended the refinement.
    pub stop: StopReason,
}

// Continuation state for one point: the orbit so far and, once it has
// left the radius, where it did so.
#[derive(Copy, Clone, Debug)]
struct Orbit {
    z: Complex<f64>,
    escape: Escape,
}

impl Orbit {
    /// Advances the orbit through absolute iterations `from..to`.  Returns
    /// true if the point escaped during this stretch.
    #[inline]
    fn advance(&mut self, c: Complex<f64>, from: usize, to: usize) -> bool {
        let mut z = self.z;
        for i in from..to {
            z = z * z + c;
            if z.norm_sqr() >= ESCAPE_NORM_SQR {
                self.z = z;
                self.escape = Some(i);
                return true;
            }
        }
        self.z = z;
        false
    }
}

/// Resolves batches of points.  Holds nothing but its configuration, so
/// one engine can be shared by reference among all the region workers.
#[derive(Copy, Clone, Debug, Default)]
pub struct EscapeTimeEngine {
    config: EngineConfig,
}

impl EscapeTimeEngine {
    /// Constructor.
    pub fn new(config: EngineConfig) -> Self {
        EscapeTimeEngine { config }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns one `Escape` per point, in the order given.
    pub fn resolve(&self, points: &[Complex<f64>]) -> Vec<Escape> {
        self.resolve_with_stats(points).0
    }

    /// As `resolve`, but also reports how the refinement went.
    pub fn resolve_with_stats(&self, points: &[Complex<f64>]) -> (Vec<Escape>, Refinement) {
        let total = points.len();
        if total == 0 {
            let refinement = Refinement {
                passes: 0,
                iterations: 0,
                resolved: 0,
                stop: StopReason::Empty,
            };
            return (vec![], refinement);
        }

        let mut orbits = vec![
            Orbit {
                z: Complex::new(0.0, 0.0),
                escape: None,
            };
            total
        ];

        let mut current = 0;
        let mut budget = FIRST_BUDGET;
        let mut resolved = 0;
        let mut passes = 0;

        let stop = loop {
            let mut resolved_this_pass = 0;
            for (orbit, &c) in orbits.iter_mut().zip(points) {
                if orbit.escape.is_none() && orbit.advance(c, current, budget) {
                    resolved_this_pass += 1;
                }
            }
            let unresolved_before = total - resolved;
            resolved += resolved_this_pass;
            passes += 1;
            trace!(
                "pass {} to {}: {} resolved, {} of {} total",
                passes,
                budget,
                resolved_this_pass,
                resolved,
                total
            );

            current = budget;
            budget = budget.saturating_mul(2);

            if let Some(cap) = self.config.max_iterations {
                if budget >= cap {
                    break StopReason::Cap;
                }
            }

            if resolved == total {
                break StopReason::AllEscaped;
            }

            let settled = resolved as f64 / total as f64;
            let rate = resolved_this_pass as f64 / unresolved_before as f64;
            if settled > self.config.min_diverged_fraction && rate < self.config.precision {
                break StopReason::Converged;
            }
        };

        debug!(
            "resolved {} of {} points in {} passes up to iteration {} ({:?})",
            resolved, total, passes, current, stop
        );

        let refinement = Refinement {
            passes,
            iterations: current,
            resolved,
            stop,
        };
        (orbits.into_iter().map(|o| o.escape).collect(), refinement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped(cap: usize) -> EscapeTimeEngine {
        EscapeTimeEngine::new(EngineConfig::new(0.01, 0.05, Some(cap)).unwrap())
    }

    #[test]
    fn config_rejects_thresholds_outside_unit_interval() {
        assert!(EngineConfig::new(0.0, 0.5, None).is_err());
        assert!(EngineConfig::new(1.5, 0.5, None).is_err());
        assert!(EngineConfig::new(0.5, -0.1, None).is_err());
        assert!(EngineConfig::new(std::f64::NAN, 0.5, None).is_err());
        assert_eq!(
            EngineConfig::new(0.5, 2.0, None),
            Err(RenderError::OutOfRange {
                name: "min_diverged_fraction",
                value: 2.0
            })
        );
        assert!(EngineConfig::new(1.0, 1.0, Some(0)).is_ok());
    }

    #[test]
    fn empty_batch_resolves_immediately() {
        let (escapes, refinement) = EscapeTimeEngine::default().resolve_with_stats(&[]);
        assert!(escapes.is_empty());
        assert_eq!(refinement.stop, StopReason::Empty);
        assert_eq!(refinement.passes, 0);
    }

    #[test]
    fn origin_never_escapes() {
        for &cap in &[1, 128, 129, 1000, 5000] {
            assert_eq!(capped(cap).resolve(&[Complex::new(0.0, 0.0)]), vec![None]);
        }
    }

    #[test]
    fn far_point_escapes_at_once() {
        let escapes = capped(1000).resolve(&[Complex::new(2.0, 2.0)]);
        assert_eq!(escapes, vec![Some(0)]);
    }

    #[test]
    fn escape_index_is_absolute_across_passes() {
        // Just past the cardioid cusp: escapes after a few hundred
        // iterations, so it resolves in a later pass.
        let c = Complex::new(0.2501, 0.0);
        let mut z = Complex::new(0.0, 0.0);
        let mut expected = None;
        for i in 0..100_000 {
            z = z * z + c;
            if z.norm_sqr() >= 4.0 {
                expected = Some(i);
                break;
            }
        }
        let expected = expected.unwrap();
        assert!(expected >= FIRST_BUDGET);

        let (escapes, refinement) = capped(1 << 20).resolve_with_stats(&[c]);
        assert_eq!(escapes, vec![Some(expected)]);
        assert_eq!(refinement.stop, StopReason::AllEscaped);
        assert!(refinement.passes > 1);
    }

    #[test]
    fn cap_is_checked_after_each_pass() {
        // Even a tiny cap lets the first pass run its full 128 iterations.
        let (_, refinement) = capped(1).resolve_with_stats(&[Complex::new(0.0, 0.0)]);
        assert_eq!(refinement.stop, StopReason::Cap);
        assert_eq!(refinement.passes, 1);
        assert_eq!(refinement.iterations, FIRST_BUDGET);

        let (_, refinement) = capped(1000).resolve_with_stats(&[Complex::new(0.0, 0.0)]);
        // 128 -> 256 -> 512 -> 1024 >= 1000
        assert_eq!(refinement.passes, 3);
        assert_eq!(refinement.iterations, 512);
    }

    #[test]
    fn heuristic_stops_once_few_points_resolve() {
        let engine = EscapeTimeEngine::new(EngineConfig::new(0.5, 0.5, None).unwrap());
        // Three points escape at once; the origin never will.
        let points = [
            Complex::new(2.0, 2.0),
            Complex::new(-2.0, 2.0),
            Complex::new(2.0, -2.0),
            Complex::new(0.0, 0.0),
        ];
        let (escapes, refinement) = engine.resolve_with_stats(&points);
        assert_eq!(escapes, vec![Some(0), Some(0), Some(0), None]);
        assert_eq!(refinement.stop, StopReason::Converged);
        // The first pass resolved 3 of 4, too many to stop; the second
        // resolved none of the remaining one.
        assert_eq!(refinement.passes, 2);
        assert_eq!(refinement.resolved, 3);
    }

    #[test]
    fn heuristic_waits_for_enough_settled_points() {
        // Only a quarter of the batch escapes, below min_diverged_fraction,
        // so only the cap can end this batch.
        let engine = EscapeTimeEngine::new(EngineConfig::new(0.5, 0.5, Some(4096)).unwrap());
        let points = [
            Complex::new(2.0, 2.0),
            Complex::new(0.0, 0.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.0, 0.5),
        ];
        let (escapes, refinement) = engine.resolve_with_stats(&points);
        assert_eq!(escapes, vec![Some(0), None, None, None]);
        assert_eq!(refinement.stop, StopReason::Cap);
    }

    #[test]
    fn results_keep_input_order() {
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(2.0, 2.0),
            Complex::new(-1.0, 0.0),
            Complex::new(1.0, 1.0),
        ];
        let escapes = capped(512).resolve(&points);
        assert_eq!(escapes[0], None);
        assert_eq!(escapes[1], Some(0));
        assert_eq!(escapes[2], None);
        assert_eq!(escapes[3], Some(1));
    }
}
