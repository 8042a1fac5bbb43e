//! # Servoman
//! HTTP control surface for a single hobby servo on a Raspberry Pi.
//!
//! The servo is stepped left or right one increment at a time through either
//! a hardware PWM channel or the pi-blaster daemon. Positions are open-loop:
//! what was last sent to the pin is assumed to be where the servo is.

pub mod api;
pub mod cli;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod position;
pub mod servo;
pub mod supervisor;

pub use error::{Error, Result};
