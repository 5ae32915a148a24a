//! Error type shared by every host interface operation.
//!
//! Validation failures are detected before any exchange with the module is attempted.
//! Failures reported by the transport are carried through untouched in
//! [`Error::Transport`]; when such a code is one of the module's NACK reasons it can be
//! decoded with [`Error::nack`].

use thiserror::Error;

use crate::consts::*;

/// Errors returned by the Ensemble, LoRaWAN and Symphony Link operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// A caller-supplied argument was rejected before anything was sent.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The response length does not match the length implied by its own contents.
    #[error("incorrect message size")]
    IncorrectMessageSize,
    /// The response is too short to carry meaningful data.
    #[error("no data")]
    NoData,
    /// A valid response does not fit into the caller's buffer.
    #[error("buffer too small")]
    BufferTooSmall,
    /// The module refused the LoRaWAN activation or reported an unknown status.
    #[error("activation rejected")]
    ActivationRejected,
    /// A polled operation did not complete in time.
    #[error("timeout")]
    Timeout,
    /// The transport failed the exchange with the given (negative) code.
    #[error("host interface error {0}")]
    Transport(i32),
}

impl Error {
    /// Numeric status code of this error in the module host interface code space.
    pub fn code(&self) -> i32 {
        match *self {
            Error::InvalidParameter => LL_IFC_ERROR_INCORRECT_PARAMETER,
            Error::IncorrectMessageSize => LL_IFC_ERROR_INCORRECT_MESSAGE_SIZE,
            Error::NoData => -LL_IFC_NACK_NODATA,
            Error::BufferTooSmall => LL_IFC_ERROR_BUFFER_TOO_SMALL,
            Error::ActivationRejected => -LL_IFC_NACK_OTHER,
            Error::Timeout => LL_IFC_ERROR_TIMEOUT,
            Error::Transport(code) => code,
        }
    }

    /// Decodes a transport code into the module's NACK reason, if it is one.
    pub fn nack(&self) -> Option<Nack> {
        match *self {
            Error::Transport(code) => Nack::from_code(code),
            _ => None,
        }
    }
}

/// Reasons the module gives when it refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Nack {
    /// The command is not supported by the firmware.
    CommandNotSupported,
    /// The frame checksum did not match.
    IncorrectChecksum,
    /// The payload length is out of range.
    PayloadLengthOutOfRange,
    /// A payload value is out of range.
    PayloadOutOfRange,
    /// The module is still booting.
    BootupInProgress,
    /// The module is busy; retry later.
    BusyTryAgain,
    /// The application token is not registered.
    AppTokenNotRegistered,
    /// The payload is longer than allowed.
    PayloadLengthExceeded,
    /// The operation requires mailbox downlink mode.
    NotInMailboxMode,
    /// The property is unknown or not accessible.
    BadProperty,
    /// There is no data to return.
    NoData,
    /// The transmit queue is full.
    QueueFull,
    /// Unspecified failure.
    Other,
}

impl Nack {
    /// Maps a negative transport code onto a NACK reason.
    pub fn from_code(code: i32) -> Option<Self> {
        let nack = match code.checked_neg()? {
            LL_IFC_NACK_CMD_NOT_SUPPORTED => Nack::CommandNotSupported,
            LL_IFC_NACK_INCORRECT_CHKSUM => Nack::IncorrectChecksum,
            LL_IFC_NACK_PAYLOAD_LEN_OOR => Nack::PayloadLengthOutOfRange,
            LL_IFC_NACK_PAYLOAD_OOR => Nack::PayloadOutOfRange,
            LL_IFC_NACK_BOOTUP_IN_PROGRESS => Nack::BootupInProgress,
            LL_IFC_NACK_BUSY_TRY_AGAIN => Nack::BusyTryAgain,
            LL_IFC_NACK_APP_TOKEN_REG => Nack::AppTokenNotRegistered,
            LL_IFC_NACK_PAYLOAD_LEN_EXCEEDED => Nack::PayloadLengthExceeded,
            LL_IFC_NACK_NOT_IN_MAILBOX_MODE => Nack::NotInMailboxMode,
            LL_IFC_NACK_PAYLOAD_BAD_PROPERTY => Nack::BadProperty,
            LL_IFC_NACK_NODATA => Nack::NoData,
            LL_IFC_NACK_QUEUE_FULL => Nack::QueueFull,
            LL_IFC_NACK_OTHER => Nack::Other,
            _ => return None,
        };
        Some(nack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_code_passes_through() {
        assert_eq!(Error::Transport(-6).code(), -6);
        assert_eq!(Error::Transport(-6).nack(), Some(Nack::BusyTryAgain));
        assert_eq!(Error::Transport(-104).nack(), None);
    }

    #[test]
    fn test_local_errors_have_no_nack() {
        assert_eq!(Error::NoData.code(), -11);
        assert_eq!(Error::NoData.nack(), None);
        assert_eq!(Error::ActivationRejected.code(), -99);
        assert_eq!(Error::Timeout.code(), LL_IFC_ERROR_TIMEOUT);
    }
}
