use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::{info, warn};

use crate::position::Signal;
use crate::Error::{SignalMismatch, UnsupportedPwmPin};
use crate::Result;

pub const PI_BLASTER: &str = "/dev/pi-blaster";

/// Something that puts a [`Signal`] on a physical pin.
pub trait PinDriver: Send {
    fn apply(&mut self, signal: Signal) -> Result<()>;
}

/// Hardware PWM channel programmed through the BCM2835 registers.
pub struct PwmDriver {
    pwm: Pwm,
}

impl Drop for PwmDriver {
    fn drop(&mut self) {
        info!("disabling pwm channel");
        if let Err(e) = self.pwm.disable() {
            warn!(error = %e, "pwm failed to disable on drop");
        }
    }
}

impl PwmDriver {
    /// Acquire the channel wired to `pin` and start it at the given
    /// frequency with a zero duty cycle.
    pub fn open(pin: u8, frequency: f64) -> Result<Self> {
        let pwm = Pwm::with_frequency(channel(pin)?, frequency, 0.0, Polarity::Normal, true)?;
        Ok(Self { pwm })
    }
}

impl PinDriver for PwmDriver {
    fn apply(&mut self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Duty {
                numerator,
                denominator,
            } => {
                self.pwm
                    .set_duty_cycle(numerator as f64 / denominator as f64)?;
                Ok(())
            }
            other => Err(SignalMismatch(other.kind())),
        }
    }
}

/// Map a BCM pin number onto the PWM channel it is muxed to.
pub fn channel(pin: u8) -> Result<Channel> {
    match pin {
        12 | 18 => Ok(Channel::Pwm0),
        13 | 19 => Ok(Channel::Pwm1),
        unsupported => Err(UnsupportedPwmPin(unsupported)),
    }
}

/// Writes `<pin>=<value>` lines to the pi-blaster command FIFO.
///
/// The FIFO is opened and closed on every call so that a daemon restart only
/// fails the requests issued while it is down.
pub struct BlasterDriver {
    pin: u8,
    path: PathBuf,
}

impl BlasterDriver {
    pub fn new(pin: u8, path: impl AsRef<Path>) -> Self {
        Self {
            pin,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PinDriver for BlasterDriver {
    fn apply(&mut self, signal: Signal) -> Result<()> {
        let value = match signal {
            Signal::Level(v) => v,
            other => return Err(SignalMismatch(other.kind())),
        };

        let mut f = OpenOptions::new().append(true).open(&self.path)?;
        f.write_all(command_line(self.pin, value).as_bytes())?;
        Ok(())
    }
}

pub fn command_line(pin: u8, value: f64) -> String {
    format!("{}={:.6}\n", pin, value)
}
