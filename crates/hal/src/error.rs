//! HAL error kinds shared by every capability.

/// Error returned by any [`crate::Hal`] method.
///
/// `#[non_exhaustive]` so the silicon backend can grow new variants (e.g.
/// a codec-specific NACK code) without breaking host code that matches on
/// this enum exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum HalError {
    /// A busy-wait exceeded its bounded timeout.
    #[error("operation timed out")]
    Timeout,
    /// The addressed device did not respond / is not present.
    #[error("device not ready")]
    DeviceNotReady,
    /// A DMA or block transfer failed mid-flight.
    #[error("transfer error")]
    TransferError,
    /// An argument was out of the valid range for this capability.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The capability is not implemented on this backend.
    #[error("not supported")]
    NotSupported,
    /// I2C arbitration was lost to another bus master.
    #[error("arbitration lost")]
    ArbitrationLost,
    /// I2C addressed device responded with NACK.
    #[error("nack")]
    Nack,
    /// A FIFO or ring buffer overflowed.
    #[error("buffer overflow")]
    BufferOverflow,
    /// An unclassified hardware fault (e.g. a fault status register bit).
    #[error("hardware error")]
    HardwareError,
}
