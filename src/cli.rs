use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use git_version::git_version;

use crate::driver::{self, PI_BLASTER};
use crate::position::{checked_scale, index_bounds};
use crate::Error::{BoundOutOfRange, EmptyStepRange, InvalidBounds, InvalidFrequency, ZeroSteps};
use crate::Result;

pub const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// HTTP controller for a single servo.
#[derive(Parser, Debug)]
#[clap(name = "Servoman", version = GIT_VERSION)]
pub struct Opts {
    #[clap(long, default_value = "0.0.0.0")]
    pub address: IpAddr,

    #[clap(long, default_value = "8080")]
    pub port: u16,

    /// BCM number of the pin the servo is wired to
    #[clap(long, default_value = "18")]
    pub pin: u8,

    #[clap(subcommand)]
    pub driver: Driver,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Driver {
    /// Drive the servo from a hardware PWM channel
    Pwm {
        #[clap(short, long, default_value = "50")]
        frequency: f64,

        /// Number of steps across the full duty cycle
        #[clap(long, default_value = "100")]
        steps: u32,

        /// Lowest duty cycle, in percent
        #[clap(long, default_value = "2")]
        min: u32,

        /// Highest duty cycle, in percent
        #[clap(long, default_value = "13")]
        max: u32,
    },
    /// Drive the servo through the pi-blaster daemon
    Blaster {
        /// Lowest PWM value; must be less than --max
        #[clap(long, default_value = "0")]
        min: f64,

        /// Highest PWM value; must be more than --min
        #[clap(long, default_value = "1")]
        max: f64,

        /// Number of steps between --min and --max
        #[clap(long, default_value = "20")]
        steps: u32,

        /// pi-blaster command FIFO
        #[clap(long, default_value = PI_BLASTER)]
        path: PathBuf,
    },
}

impl Opts {
    pub fn listen(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Reject configurations the servo cannot be started with.
    pub fn validate(&self) -> Result<()> {
        match &self.driver {
            Driver::Pwm {
                frequency,
                steps,
                min,
                max,
            } => {
                if !frequency.is_finite() || *frequency <= 0.0 {
                    return Err(InvalidFrequency(*frequency));
                }
                if *steps == 0 {
                    return Err(ZeroSteps);
                }
                if min >= max {
                    return Err(InvalidBounds {
                        min: f64::from(*min),
                        max: f64::from(*max),
                    });
                }
                if *max > 100 {
                    return Err(BoundOutOfRange(*max));
                }
                let (min_index, max_index) = index_bounds(*steps, *min, *max);
                if min_index >= max_index {
                    return Err(EmptyStepRange {
                        steps: *steps,
                        min: *min,
                        max: *max,
                    });
                }
                if checked_scale(*frequency, u64::from(*steps)).is_none() {
                    return Err(InvalidFrequency(*frequency));
                }
                driver::channel(self.pin)?;
            }
            Driver::Blaster {
                min, max, steps, ..
            } => {
                if *steps == 0 {
                    return Err(ZeroSteps);
                }
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(InvalidBounds {
                        min: *min,
                        max: *max,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            pin: 18,
            driver: Driver::Blaster {
                min: 0.0,
                max: 1.0,
                steps: 20,
                path: PathBuf::from(PI_BLASTER),
            },
        }
    }
}
