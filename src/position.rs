use std::fmt::{Display, Formatter};

use Direction::*;

/// BCM2835 PWM oscillator.
const OSCILLATOR_HZ: f64 = 19_200_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// One step toward the upper bound.
    Left,
    /// One step toward the lower bound.
    Right,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Left => f.write_str("left"),
            Right => f.write_str("right"),
        }
    }
}

/// What a pin driver is asked to output.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Signal {
    /// Duty-cycle fraction for a register-level PWM channel.
    Duty { numerator: u64, denominator: u64 },
    /// Normalized PWM value for the pi-blaster daemon.
    Level(f64),
}

impl Signal {
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Duty { .. } => "duty-cycle",
            Signal::Level(_) => "level",
        }
    }
}

/// The logical position of a servo and its bounds.
///
/// Implementations never leave their bounds, whatever sequence of
/// directions they are fed.
pub trait Positioner: Send {
    fn advance(&mut self, direction: Direction);

    fn signal(&self) -> Signal;

    fn position(&self) -> f64;

    fn bounds(&self) -> (f64, f64);
}

/// Integer step index over a duty-cycle range given in percent.
#[derive(Clone, Debug)]
pub struct StepIndex {
    index: u64,
    min: u64,
    max: u64,
    steps: u64,
    scale: u64,
}

impl StepIndex {
    /// `min` and `max` are percentages of the duty cycle; the caller has
    /// already checked `min < max <= 100` and `steps > 0`.
    pub fn new(frequency: f64, steps: u32, min: u32, max: u32) -> Self {
        let (min, max) = index_bounds(steps, min, max);
        let steps = u64::from(steps);

        Self {
            index: min,
            min,
            max,
            steps,
            scale: scale_for(frequency, steps),
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn scale(&self) -> u64 {
        self.scale
    }

    pub fn denominator(&self) -> u64 {
        self.steps * self.scale
    }
}

/// Step indices for percentage bounds, rounded down.
pub fn index_bounds(steps: u32, min: u32, max: u32) -> (u64, u64) {
    let steps = u64::from(steps);
    (steps * u64::from(min) / 100, steps * u64::from(max) / 100)
}

/// Counter units per step so that one full PWM period spans `steps * scale`
/// oscillator ticks. `None` when that period does not fit in a `u64`.
pub fn checked_scale(frequency: f64, steps: u64) -> Option<u64> {
    let steps = steps.max(1);
    let scale = (OSCILLATOR_HZ / (frequency * steps as f64)).floor();
    if scale.is_nan() || scale < 1.0 {
        return Some(1);
    }
    if scale >= (u64::MAX / steps) as f64 {
        return None;
    }
    Some(scale as u64)
}

/// [`checked_scale`], saturated so `steps * scale` never overflows.
pub fn scale_for(frequency: f64, steps: u64) -> u64 {
    checked_scale(frequency, steps).unwrap_or(u64::MAX / steps.max(1))
}

impl Positioner for StepIndex {
    fn advance(&mut self, direction: Direction) {
        match direction {
            Left if self.index < self.max => self.index += 1,
            Right if self.index > self.min => self.index -= 1,
            _ => {}
        }
    }

    fn signal(&self) -> Signal {
        Signal::Duty {
            numerator: self.index * self.scale,
            denominator: self.denominator(),
        }
    }

    fn position(&self) -> f64 {
        self.index as f64
    }

    fn bounds(&self) -> (f64, f64) {
        (self.min as f64, self.max as f64)
    }
}

/// Continuous value in `[min, max]` moved in `(max - min) / steps` increments.
#[derive(Clone, Debug)]
pub struct Span {
    value: f64,
    min: f64,
    max: f64,
    step: f64,
}

impl Span {
    /// The caller has already checked `min < max` and `steps > 0`.
    pub fn new(min: f64, max: f64, steps: u32) -> Self {
        Self {
            value: 0f64.clamp(min, max),
            min,
            max,
            step: (max - min) / f64::from(steps),
        }
    }
}

impl Positioner for Span {
    // clamp after mutating so the driver never sees an out-of-range value
    fn advance(&mut self, direction: Direction) {
        let next = match direction {
            Left => self.value + self.step,
            Right => self.value - self.step,
        };
        self.value = next.clamp(self.min, self.max);
    }

    fn signal(&self) -> Signal {
        Signal::Level(self.value)
    }

    fn position(&self) -> f64 {
        self.value
    }

    fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}
