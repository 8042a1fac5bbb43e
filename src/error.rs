use core::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

/// An Error that can occur in this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    PwmError(#[from] rppal::pwm::Error),

    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("--min must be less than --max; got {min} and {max}, respectively")]
    InvalidBounds { min: f64, max: f64 },

    #[error("--max must not exceed 100 percent; got {0}")]
    BoundOutOfRange(u32),

    #[error("--steps {steps} leaves no step between --min {min}% and --max {max}%")]
    EmptyStepRange { steps: u32, min: u32, max: u32 },

    #[error("--steps must be greater than zero")]
    ZeroSteps,

    #[error("--frequency must be a positive number; got {0}")]
    InvalidFrequency(f64),

    #[error("BCM pin {0} has no hardware PWM channel")]
    UnsupportedPwmPin(u8),

    #[error("Driver cannot apply a {0} signal")]
    SignalMismatch(&'static str),

    #[error("Servo lock poisoned by a panicked request")]
    LockPoisoned,

    #[error("{0}")]
    ServerError(#[from] warp::Error),

    #[error("{0}")]
    SignalError(#[from] ctrlc::Error),

    #[error("{0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Server did not shut down within {0:?}")]
    ShutdownTimeout(std::time::Duration),
}
