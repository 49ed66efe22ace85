//! Turning-point history and Preisach branch selection.
//!
//! The stack starts with an origin entry recorded at the first voltage sample.
//! It carries the initial major-loop polarity and is never popped. Every
//! direction reversal pushes one more entry. The active branch runs from the
//! newest entry back towards the entry below it. When the origin is the entry
//! below, the branch runs towards saturation instead.
//!
//! Wipeout: once the voltage meets or passes the stored extremum the active
//! branch was heading for, that extremum and the newest entry are both
//! removed, and the trajectory continues on the enclosing branch.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::branch::Direction;
use crate::charge::{BranchContext, ChargeModel};
use crate::constants::SEGMENT_EPSILON;
use crate::error::{Error, Result};
use crate::params::ParameterSet;
use crate::segment::{Segment, SegmentPoint};

/// A voltage extremum at which the polarization trajectory reversed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    /// Voltage of the extremum (V).
    pub voltage: f64,
    /// Direction of travel leaving this point.
    pub direction: Direction,
    /// Polarization reached at this point.
    pub polarization: f64,
}

/// Ordered turning points, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryStack {
    points: Vec<TurningPoint>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stack from stored points, checking the nesting invariant.
    pub fn from_points(points: Vec<TurningPoint>) -> Result<Self> {
        let stack = Self { points };
        stack.validate()?;
        Ok(stack)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TurningPoint] {
        &self.points
    }

    /// The newest entry, where the active branch started.
    pub fn top(&self) -> Option<&TurningPoint> {
        self.points.last()
    }

    /// The extremum the active branch is heading for, if it is a real
    /// reversal rather than the origin.
    pub fn target(&self) -> Option<&TurningPoint> {
        if self.points.len() >= 3 {
            self.points.get(self.points.len() - 2)
        } else {
            None
        }
    }

    /// Push a turning point, applying the wipeout rule first.
    ///
    /// The first point pushed becomes the origin. Later points must reverse
    /// the direction of the current top. A point at the same voltage as the
    /// current top is ignored and reported as `None`. Otherwise returns the
    /// number of entries popped.
    pub fn push(&mut self, point: TurningPoint) -> Result<Option<usize>> {
        let Some(top) = self.top().copied() else {
            self.points.push(point);
            return Ok(Some(0));
        };

        if point.direction != top.direction.reversed() {
            return Err(Error::InvalidHistory(format!(
                "turning point at {} V leaves {} but the top entry already leaves {}",
                point.voltage, point.direction, top.direction
            )));
        }

        if self.points.len() >= 2 && point.voltage == top.voltage {
            trace!("ignoring repeated turning point at {} V", point.voltage);
            return Ok(None);
        }

        let popped = self.wipe_to(point.voltage);
        self.points.push(point);
        Ok(Some(popped))
    }

    /// Apply wipeout for travel along the current top's direction up to `v`.
    pub fn wipe_to(&mut self, v: f64) -> usize {
        self.wipe_while(|dir, target| dir.reaches(v, target.voltage))
    }

    /// Pop pairs while `reached(direction, target)` holds for the current
    /// target extremum.
    pub(crate) fn wipe_while<F>(&mut self, mut reached: F) -> usize
    where
        F: FnMut(Direction, &TurningPoint) -> bool,
    {
        let mut popped = 0;
        loop {
            let wiped = match (self.top(), self.target()) {
                (Some(top), Some(target)) => reached(top.direction, target),
                _ => false,
            };
            if !wiped {
                break;
            }
            self.points.truncate(self.points.len() - 2);
            popped += 2;
        }
        popped
    }

    /// Check that entries alternate in direction and nest without crossing.
    pub fn validate(&self) -> Result<()> {
        for (i, p) in self.points.iter().enumerate() {
            if !p.voltage.is_finite() || !p.polarization.is_finite() {
                return Err(Error::InvalidHistory(format!(
                    "entry {} is not finite: {:?}",
                    i, p
                )));
            }
            if i == 0 {
                continue;
            }

            let prev = &self.points[i - 1];
            if p.direction != prev.direction.reversed() {
                return Err(Error::InvalidHistory(format!(
                    "entry {} does not reverse the direction of entry {}",
                    i,
                    i - 1
                )));
            }
            if !prev.direction.reaches(p.voltage, prev.voltage) {
                return Err(Error::InvalidHistory(format!(
                    "entry {} at {} V lies behind entry {} at {} V",
                    i,
                    p.voltage,
                    i - 1,
                    prev.voltage
                )));
            }
            if i >= 2 && p.voltage == prev.voltage {
                return Err(Error::InvalidHistory(format!(
                    "entries {} and {} share voltage {} V",
                    i - 1,
                    i,
                    p.voltage
                )));
            }
            if i >= 3 && prev.direction.reaches(p.voltage, self.points[i - 2].voltage) {
                return Err(Error::InvalidHistory(format!(
                    "entry {} at {} V crosses the enclosing extremum at {} V",
                    i,
                    p.voltage,
                    self.points[i - 2].voltage
                )));
            }
        }
        Ok(())
    }
}

/// What one accepted sample did to the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryUpdate {
    /// A direction reversal was recorded.
    pub reversed: bool,
    /// Entries removed by wipeout.
    pub wiped: usize,
}

/// Owns the turning-point history of one device instance.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    model: ChargeModel,
    polarity: Direction,
    stack: HistoryStack,
    last_voltage: Option<f64>,
    reversals: usize,
}

impl HistoryManager {
    /// Create an empty history whose major loop starts out travelling in
    /// `polarity`.
    pub fn new(params: &ParameterSet, polarity: Direction) -> Self {
        Self {
            model: ChargeModel::new(params),
            polarity,
            stack: HistoryStack::new(),
            last_voltage: None,
            reversals: 0,
        }
    }

    /// Restore a history from a stored stack and last accepted sample.
    ///
    /// The last sample must sit where live tracking could have left it: on
    /// the travel side of the newest entry and short of the extremum the
    /// active branch heads for. `reversals` defaults to one per stored
    /// reversal and may not be smaller than that.
    pub fn from_parts(
        params: &ParameterSet,
        polarity: Direction,
        stack: HistoryStack,
        last_voltage: Option<f64>,
        reversals: Option<usize>,
    ) -> Result<Self> {
        stack.validate()?;
        match (stack.is_empty(), last_voltage) {
            (false, None) => {
                return Err(Error::InvalidHistory(
                    "non-empty history without a last sample".to_string(),
                ))
            }
            (true, Some(_)) => {
                return Err(Error::InvalidHistory(
                    "last sample recorded without an origin entry".to_string(),
                ))
            }
            (_, Some(v)) if !v.is_finite() => {
                return Err(Error::InvalidTarget {
                    quantity: "voltage",
                    value: v,
                })
            }
            _ => {}
        }

        if let Some(origin) = stack.points().first() {
            if origin.direction != polarity {
                return Err(Error::InvalidHistory(format!(
                    "origin leaves {} but the polarity is {}",
                    origin.direction, polarity
                )));
            }
        }
        if let (Some(top), Some(v)) = (stack.top(), last_voltage) {
            let behind = !top.direction.reaches(v, top.voltage)
                || (stack.len() >= 2 && v == top.voltage);
            if behind {
                return Err(Error::InvalidHistory(format!(
                    "last sample {} V does not lie past the newest entry at {} V travelling {}",
                    v, top.voltage, top.direction
                )));
            }
            if let Some(target) = stack.target() {
                if top.direction.reaches(v, target.voltage) {
                    return Err(Error::InvalidHistory(format!(
                        "last sample {} V has passed the stored extremum at {} V",
                        v, target.voltage
                    )));
                }
            }
        }

        let stored = stack.len().saturating_sub(1);
        let reversals = match reversals {
            Some(n) if n < stored => {
                return Err(Error::InvalidHistory(format!(
                    "{} reversals recorded but {} are stored",
                    n, stored
                )))
            }
            Some(n) => n,
            None => stored,
        };
        Ok(Self {
            model: ChargeModel::new(params),
            polarity,
            stack,
            last_voltage,
            reversals,
        })
    }

    pub fn model(&self) -> &ChargeModel {
        &self.model
    }

    pub fn stack(&self) -> &HistoryStack {
        &self.stack
    }

    /// Initial major-loop polarity.
    pub fn polarity(&self) -> Direction {
        self.polarity
    }

    /// Direction of the branch currently being travelled.
    pub fn direction(&self) -> Direction {
        self.stack.top().map_or(self.polarity, |p| p.direction)
    }

    /// The last accepted voltage sample.
    pub fn last_voltage(&self) -> Option<f64> {
        self.last_voltage
    }

    /// Number of direction reversals recorded since the last reset.
    pub fn reversals(&self) -> usize {
        self.reversals
    }

    /// Forget all history, as at the start of a new analysis.
    pub fn reset(&mut self) {
        self.stack = HistoryStack::new();
        self.last_voltage = None;
        self.reversals = 0;
    }

    /// The branch context for the current history.
    pub fn active_context(&self) -> Result<BranchContext> {
        let dir = self.direction();
        let points = self.stack.points();
        let n = points.len();
        if n < 2 {
            return Ok(BranchContext::major(dir));
        }

        let branch = self.model.branch();
        let start = points[n - 1];
        let a = SegmentPoint {
            voltage: start.voltage,
            polarization: start.polarization,
            branch: branch.value(start.voltage, dir),
        };
        let b = match self.stack.target() {
            Some(t) => SegmentPoint {
                voltage: t.voltage,
                polarization: t.polarization,
                branch: branch.value(t.voltage, dir),
            },
            None => {
                let sat = branch.saturation(dir);
                SegmentPoint {
                    voltage: dir.sign() * f64::INFINITY,
                    polarization: sat,
                    branch: sat,
                }
            }
        };

        let tolerance = SEGMENT_EPSILON * branch.saturation_charge();
        match Segment::between(a, b, tolerance) {
            Ok(segment) => Ok(BranchContext::on_segment(dir, segment)),
            Err(Error::DegenerateSegment { .. }) if a.voltage != b.voltage => {
                // Both ends sit on a saturated stretch of this branch.
                debug!(
                    "flat {} leg from {} V: branch saturated up to {} V",
                    dir, a.voltage, b.voltage
                );
                Ok(BranchContext::on_segment(dir, Segment::flat(a.polarization)))
            }
            Err(e) => Err(e),
        }
    }

    /// Accept a new voltage sample.
    ///
    /// Records a reversal at the previous sample if the direction changed,
    /// then applies wipeout up to `v`. Repeating the previous voltage is a
    /// no-op.
    pub fn observe(&mut self, v: f64) -> Result<HistoryUpdate> {
        if !v.is_finite() {
            return Err(Error::InvalidTarget {
                quantity: "voltage",
                value: v,
            });
        }

        let Some(last) = self.last_voltage else {
            self.seed(v);
            return Ok(HistoryUpdate::default());
        };

        let Some(dir) = Direction::between(last, v) else {
            return Ok(HistoryUpdate::default());
        };

        let mut update = HistoryUpdate::default();
        if dir != self.direction() {
            if let Some(popped) = self.turn(last, dir)? {
                update.wiped += popped;
                update.reversed = true;
            }
        }

        let wiped = self.stack.wipe_to(v);
        if wiped > 0 {
            debug!(
                "wipeout at {} V removed {} turning points, depth now {}",
                v,
                wiped,
                self.stack.len()
            );
        }
        update.wiped += wiped;
        self.last_voltage = Some(v);
        Ok(update)
    }

    /// The branch context of the leg that reaches charge `q` from the last
    /// accepted sample, without modifying this history.
    ///
    /// Returns the context together with the voltage the leg starts from.
    pub fn context_for_charge(&self, q: f64) -> Result<(BranchContext, f64)> {
        if !q.is_finite() {
            return Err(Error::InvalidTarget {
                quantity: "charge",
                value: q,
            });
        }

        let mut scratch = self.clone();
        let last = match scratch.last_voltage {
            Some(v) => v,
            None => {
                scratch.seed(0.0);
                0.0
            }
        };

        let ctx = scratch.active_context()?;
        let q_last = scratch.model.charge(last, &ctx);
        let dir = if q > q_last {
            Direction::Up
        } else if q < q_last {
            Direction::Down
        } else {
            return Ok((ctx, last));
        };

        if dir != scratch.direction() {
            scratch.turn(last, dir)?;
        }

        let model = scratch.model;
        scratch.stack.wipe_while(|dir, target| {
            let q_target = target.polarization + model.dielectric_charge(target.voltage);
            match dir {
                Direction::Up => q >= q_target,
                Direction::Down => q <= q_target,
            }
        });

        Ok((scratch.active_context()?, last))
    }

    fn seed(&mut self, v: f64) {
        let ctx = BranchContext::major(self.polarity);
        let origin = TurningPoint {
            voltage: v,
            direction: self.polarity,
            polarization: self.model.polarization(v, &ctx),
        };
        trace!("history origin at {} V travelling {}", v, self.polarity);
        self.stack = HistoryStack::new();
        self.stack.points.push(origin);
        self.last_voltage = Some(v);
    }

    /// Record a reversal at `at`, leaving in `dir`. `None` if the stack
    /// ignored it as a repeat of its newest entry.
    fn turn(&mut self, at: f64, dir: Direction) -> Result<Option<usize>> {
        let ctx = self.active_context()?;
        let point = TurningPoint {
            voltage: at,
            direction: dir,
            polarization: self.model.polarization(at, &ctx),
        };
        let Some(popped) = self.stack.push(point)? else {
            return Ok(None);
        };
        self.reversals += 1;
        debug!(
            "reversal at {} V (P = {:e}), now travelling {}, depth {}",
            at,
            point.polarization,
            dir,
            self.stack.len()
        );
        Ok(Some(popped))
    }
}
