use std::sync::Mutex;

use tracing::debug;

use crate::cli::{Driver, Opts};
use crate::driver::{BlasterDriver, PinDriver, PwmDriver};
use crate::position::{Direction, Positioner, Signal, Span, StepIndex};
use crate::{Error, Result};

/// Open-loop servo controller.
///
/// The lock covers the whole advance-and-apply sequence, so concurrent
/// commands reach the driver one at a time and in the order they mutated the
/// position. A failed apply does not roll the position back: the next
/// successful command brings the hardware in line again.
pub struct Servo {
    inner: Mutex<Inner>,
}

struct Inner {
    positioner: Box<dyn Positioner>,
    driver: Box<dyn PinDriver>,
}

impl Servo {
    pub fn new(positioner: impl Positioner + 'static, driver: impl PinDriver + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                positioner: Box::new(positioner),
                driver: Box::new(driver),
            }),
        }
    }

    /// Assemble the positioner and driver selected on the command line.
    /// Acquiring a PWM channel fails here, before anything is served.
    pub fn from_opts(opts: &Opts) -> Result<Self> {
        opts.validate()?;

        let servo = match &opts.driver {
            Driver::Pwm {
                frequency,
                steps,
                min,
                max,
            } => {
                let positioner = StepIndex::new(*frequency, *steps, *min, *max);
                let mut driver = PwmDriver::open(opts.pin, *frequency)?;
                driver.apply(positioner.signal())?;
                Self::new(positioner, driver)
            }
            Driver::Blaster {
                min,
                max,
                steps,
                path,
            } => Self::new(Span::new(*min, *max, *steps), BlasterDriver::new(opts.pin, path)),
        };
        Ok(servo)
    }

    pub fn move_left(&self) -> Result<Signal> {
        self.step(Direction::Left)
    }

    pub fn move_right(&self) -> Result<Signal> {
        self.step(Direction::Right)
    }

    /// Move one step and push the resulting signal to the driver. Returns
    /// the signal that was applied.
    pub fn step(&self, direction: Direction) -> Result<Signal> {
        let mut inner = self.inner.lock().map_err(|_| Error::LockPoisoned)?;

        inner.positioner.advance(direction);
        let signal = inner.positioner.signal();
        debug!(%direction, position = inner.positioner.position(), "stepping");

        inner.driver.apply(signal)?;
        Ok(signal)
    }

    pub fn position(&self) -> Result<f64> {
        let inner = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(inner.positioner.position())
    }

    pub fn bounds(&self) -> Result<(f64, f64)> {
        let inner = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(inner.positioner.bounds())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        applied: Arc<Mutex<Vec<Signal>>>,
        fail: bool,
    }

    impl PinDriver for Recorder {
        fn apply(&mut self, signal: Signal) -> Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "daemon gone").into());
            }
            self.applied.lock().unwrap().push(signal);
            Ok(())
        }
    }

    #[test]
    fn blaster_servo_from_opts_writes_to_the_configured_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("pi-blaster");
        std::fs::write(&fifo, "").unwrap();

        let opts = Opts {
            pin: 17,
            driver: Driver::Blaster {
                min: 0.0,
                max: 1.0,
                steps: 4,
                path: fifo.clone(),
            },
            ..Opts::default()
        };
        let servo = Servo::from_opts(&opts).unwrap();
        // nothing is written until the first command
        assert_eq!(std::fs::read_to_string(&fifo).unwrap(), "");

        servo.move_left().unwrap();
        assert_eq!(std::fs::read_to_string(&fifo).unwrap(), "17=0.250000\n");
    }

    #[test]
    fn from_opts_rejects_invalid_bounds() {
        let opts = Opts {
            driver: Driver::Blaster {
                min: 2.0,
                max: 1.0,
                steps: 4,
                path: "/nonexistent".into(),
            },
            ..Opts::default()
        };
        assert!(matches!(Servo::from_opts(&opts), Err(Error::InvalidBounds { .. })));
    }

    #[test]
    fn from_opts_rejects_pwm_configs_before_touching_hardware() {
        let collapsed = Opts {
            driver: Driver::Pwm {
                frequency: 50.0,
                steps: 20,
                min: 2,
                max: 4,
            },
            ..Opts::default()
        };
        assert!(matches!(
            Servo::from_opts(&collapsed),
            Err(Error::EmptyStepRange { .. })
        ));

        let overflowing = Opts {
            driver: Driver::Pwm {
                frequency: 1e-13,
                steps: 100,
                min: 2,
                max: 13,
            },
            ..Opts::default()
        };
        assert!(matches!(
            Servo::from_opts(&overflowing),
            Err(Error::InvalidFrequency(_))
        ));
    }

    #[test]
    fn left_applies_the_advanced_position() {
        let rec = Recorder::default();
        let servo = Servo::new(Span::new(0.0, 1.0, 20), rec.clone());

        let signal = servo.move_left().unwrap();
        assert_eq!(signal, Signal::Level(0.05));
        assert_eq!(*rec.applied.lock().unwrap(), vec![Signal::Level(0.05)]);
    }

    #[test]
    fn moves_at_the_bound_still_reach_the_driver() {
        let rec = Recorder::default();
        let servo = Servo::new(StepIndex::new(50.0, 100, 2, 13), rec.clone());

        for _ in 0..3 {
            servo.move_right().unwrap();
        }
        assert_eq!(servo.position().unwrap(), 2.0);
        assert_eq!(rec.applied.lock().unwrap().len(), 3);
    }

    #[test]
    fn failed_apply_keeps_the_mutated_position() {
        let rec = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let servo = Servo::new(Span::new(0.0, 1.0, 20), rec);

        assert!(matches!(servo.move_left(), Err(Error::IoError(_))));
        assert!((servo.position().unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn concurrent_steps_are_serialized() {
        let rec = Recorder::default();
        let servo = Arc::new(Servo::new(StepIndex::new(50.0, 100, 0, 100), rec.clone()));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let servo = servo.clone();
                std::thread::spawn(move || servo.move_left().unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let applied = rec.applied.lock().unwrap();
        assert_eq!(applied.len(), 32);

        let numerators: Vec<u64> = applied
            .iter()
            .map(|s| match s {
                Signal::Duty { numerator, .. } => *numerator,
                other => panic!("unexpected signal {:?}", other),
            })
            .collect();
        // every apply saw a distinct position, in lock order
        assert!(numerators.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(servo.position().unwrap(), 32.0);
    }
}
