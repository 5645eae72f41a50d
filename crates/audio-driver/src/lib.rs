//! I2C-attached audio peripherals: the WM8758 codec and the PCF50605
//! power management IC.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod pcf50605;
pub mod wm8758;

pub use pcf50605::{BatteryState, ChargingState, Pcf50605, PowerSource};
pub use wm8758::Wm8758;

/// Errors shared by both I2C peripheral drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioDriverError {
    /// The underlying HAL I2C transaction failed.
    #[error("hal error")]
    Hal(hal::HalError),
    /// A requested sample rate is not in the WM8758's supported table.
    #[error("unsupported sample rate")]
    UnsupportedSampleRate,
}

impl From<hal::HalError> for AudioDriverError {
    fn from(e: hal::HalError) -> Self {
        Self::Hal(e)
    }
}
