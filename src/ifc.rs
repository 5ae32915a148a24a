//! Host interface transport boundary and the commands shared by every MAC mode.
//!
//! The module speaks a strict request-then-response protocol: one request frame is
//! written, one response frame is read back. How those frames travel (UART framing,
//! checksums, read timeouts) is the business of the [`HostInterface`] implementation
//! supplied by the application. This crate only decides *what* goes into a frame and
//! how the response is interpreted.
//!
//! ## Contract
//!
//! [`HostInterface::exchange`] performs exactly one blocking round trip. It returns the
//! number of response bytes written into `response` (never more than `response.len()`),
//! or a negative error code. Error codes are opaque to this crate and are surfaced to
//! callers unchanged as [`Error::Transport`].

use crate::encoding::{decode_u32_be, encode_u32_be};
use crate::error::Error;

/// Operation tags understood by the module.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum OpCode {
    /// Query the module (MAC) state.
    State = 2,
    /// Query the transmit state.
    TxState = 3,
    /// Query the receive state.
    RxState = 4,
    /// Read and clear interrupt flags.
    IrqFlags = 15,
    /// Retrieve a received Symphony Link downlink.
    MsgRecv = 40,
    /// Select the MAC mode (the module reboots afterwards).
    MacModeSet = 70,
    /// Read the MAC mode.
    MacModeGet = 71,
    /// Queue an acknowledged Symphony Link uplink.
    MsgSendAck = 90,
    /// Select the downlink mode.
    RxModeSet = 110,
    /// Request a quality-of-service level.
    QosRequest = 112,
    /// Select the antenna.
    AntennaSet = 114,
    /// Set the network token.
    NetTokenSet = 116,
    /// Set the application token.
    AppTokenSet = 124,
    /// Set an Ensemble property.
    EnsemblePropSet = 140,
    /// Get an Ensemble property.
    EnsemblePropGet = 141,
    /// Count stored Ensemble messages.
    EnsembleGetMsgCount = 142,
    /// Retrieve the next stored Ensemble message.
    EnsembleGetNextMsg = 143,
    /// Set the Ensemble UTC time.
    EnsembleSetTime = 144,
    /// Get the Ensemble UTC time.
    EnsembleGetTime = 145,
    /// Read (and optionally reset) the lost message count.
    EnsembleLostMsg = 146,
    /// Send a payload from an endpoint to its gateway.
    EnsembleSendToGateway = 147,
    /// Send mail from a gateway to an endpoint.
    EnsembleSendMailToEndpoint = 148,
    /// Retrieve mail received from the gateway.
    EnsembleGetMail = 149,
    /// Dump module debug information.
    EnsembleDebugDump = 150,
    /// Start a LoRaWAN activation or query its status.
    LoraWanActivate = 160,
    /// Get or set a LoRaWAN parameter.
    LoraWanParam = 161,
    /// Queue a LoRaWAN uplink.
    LoraWanMsgSend = 162,
    /// Retrieve a LoRaWAN downlink.
    LoraWanMsgReceive = 163,
}

/// Blocking request/response access to the module.
pub trait HostInterface {
    /// Sends `request` tagged with `op` and reads at most `response.len()` bytes back.
    ///
    /// Returns the number of response bytes read, or a negative error code.
    fn exchange(&mut self, op: OpCode, request: &[u8], response: &mut [u8]) -> Result<usize, i32>;
}

impl<T: HostInterface + ?Sized> HostInterface for &mut T {
    fn exchange(&mut self, op: OpCode, request: &[u8], response: &mut [u8]) -> Result<usize, i32> {
        (**self).exchange(op, request, response)
    }
}

/// Runs one exchange, logging the frames and lifting transport codes into [`Error`].
pub(crate) fn read_write<I: HostInterface + ?Sized>(
    ifc: &mut I,
    op: OpCode,
    request: &[u8],
    response: &mut [u8],
) -> Result<usize, Error> {
    log::trace!("{:?} -> {:02x?}", op, request);
    match ifc.exchange(op, request, response) {
        Ok(len) => {
            let len = len.min(response.len());
            log::trace!("{:?} <- {:02x?}", op, &response[..len]);
            Ok(len)
        }
        Err(code) => {
            log::debug!("{:?} failed with code {}", op, code);
            Err(Error::Transport(code))
        }
    }
}

/// Module interrupt flags.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct IrqFlags(pub u32);

impl IrqFlags {
    /// No flags.
    pub const NONE: IrqFlags = IrqFlags(0);
    /// Every flag, used to clear them all.
    pub const ALL: IrqFlags = IrqFlags(0xffff_ffff);
    /// The module was reset by its watchdog.
    pub const WDOG_RESET: IrqFlags = IrqFlags(0x0000_0001);
    /// The module was reset.
    pub const RESET: IrqFlags = IrqFlags(0x0000_0002);
    /// An uplink finished successfully.
    pub const TX_DONE: IrqFlags = IrqFlags(0x0000_0010);
    /// An uplink failed.
    pub const TX_ERROR: IrqFlags = IrqFlags(0x0000_0020);
    /// A downlink was received.
    pub const RX_DONE: IrqFlags = IrqFlags(0x0000_0100);
    /// The gateway mailbox is empty.
    pub const MAILBOX_EMPTY: IrqFlags = IrqFlags(0x0000_0200);
    /// The module connected to a network.
    pub const CONNECTED: IrqFlags = IrqFlags(0x0000_1000);
    /// The module lost its network.
    pub const DISCONNECTED: IrqFlags = IrqFlags(0x0000_2000);
    /// Enrollment was granted.
    pub const ENROLL_GRANT: IrqFlags = IrqFlags(0x0000_4000);
    /// Link encryption is established.
    pub const CRYPTO_ESTABLISHED: IrqFlags = IrqFlags(0x0001_0000);
    /// The application token was confirmed by the network.
    pub const APP_TOKEN_CONFIRMED: IrqFlags = IrqFlags(0x0002_0000);
    /// A downlink request was acknowledged.
    pub const DOWNLINK_REQUEST_ACK: IrqFlags = IrqFlags(0x0004_0000);
    /// Module initialization completed.
    pub const INITIALIZATION_COMPLETE: IrqFlags = IrqFlags(0x0008_0000);
    /// Link encryption failed.
    pub const CRYPTO_ERROR: IrqFlags = IrqFlags(0x0010_0000);
    /// The application token was rejected.
    pub const APP_TOKEN_ERROR: IrqFlags = IrqFlags(0x0020_0000);
    /// The module firmware hit an assertion.
    pub const ASSERT: IrqFlags = IrqFlags(0x8000_0000);

    /// Whether every flag in `other` is set in `self`.
    pub fn contains(self, other: IrqFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags set in either operand.
    pub fn union(self, other: IrqFlags) -> IrqFlags {
        IrqFlags(self.0 | other.0)
    }
}

/// Reads the interrupt flags, clearing those in `flags_to_clear`.
///
/// The returned flags are the ones that were set before clearing.
pub fn irq_flags<I: HostInterface + ?Sized>(
    ifc: &mut I,
    flags_to_clear: IrqFlags,
) -> Result<IrqFlags, Error> {
    let mut rsp = [0u8; 4];
    let len = read_write(ifc, OpCode::IrqFlags, &encode_u32_be(flags_to_clear.0), &mut rsp)?;
    if len != rsp.len() {
        return Err(Error::IncorrectMessageSize);
    }
    Ok(IrqFlags(decode_u32_be(rsp)))
}

/// MAC protocol the module runs.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MacMode {
    /// Raw radio, no MAC.
    NoMac,
    /// Symphony Link.
    SymphonyLink,
    /// LoRaWAN, EU band plan.
    LoraWanEu,
    /// LoRaWAN, FCC band plan.
    LoraWanFcc,
    /// A mode this crate does not know.
    Other(u8),
}

impl From<u8> for MacMode {
    fn from(raw: u8) -> Self {
        match raw {
            0 => MacMode::NoMac,
            1 => MacMode::SymphonyLink,
            2 => MacMode::LoraWanEu,
            3 => MacMode::LoraWanFcc,
            other => MacMode::Other(other),
        }
    }
}

impl From<MacMode> for u8 {
    fn from(mode: MacMode) -> u8 {
        match mode {
            MacMode::NoMac => 0,
            MacMode::SymphonyLink => 1,
            MacMode::LoraWanEu => 2,
            MacMode::LoraWanFcc => 3,
            MacMode::Other(raw) => raw,
        }
    }
}

/// Reads the MAC mode of the module.
pub fn mac_mode_get<I: HostInterface + ?Sized>(ifc: &mut I) -> Result<MacMode, Error> {
    let mut rsp = [0u8; 1];
    let len = read_write(ifc, OpCode::MacModeGet, &[], &mut rsp)?;
    if len != rsp.len() {
        return Err(Error::IncorrectMessageSize);
    }
    Ok(MacMode::from(rsp[0]))
}

/// Selects the MAC mode. The module reboots to apply it.
pub fn mac_mode_set<I: HostInterface + ?Sized>(ifc: &mut I, mode: MacMode) -> Result<(), Error> {
    let _ = read_write(ifc, OpCode::MacModeSet, &[u8::from(mode)], &mut [])?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted host interface for unit tests.

    use super::{HostInterface, OpCode};
    use embedded_hal_mock::common::Generic;

    /// One expected exchange and the transport's answer to it.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Transaction {
        op: OpCode,
        request: Vec<u8>,
        response: Result<Vec<u8>, i32>,
    }

    impl Transaction {
        /// Expect `request` under `op` and answer with `response`.
        pub(crate) fn exchange(op: OpCode, request: &[u8], response: &[u8]) -> Self {
            Self {
                op,
                request: request.to_vec(),
                response: Ok(response.to_vec()),
            }
        }

        /// Expect `request` under `op` and fail the exchange with `code`.
        pub(crate) fn error(op: OpCode, request: &[u8], code: i32) -> Self {
            Self {
                op,
                request: request.to_vec(),
                response: Err(code),
            }
        }
    }

    /// Host interface that replays a fixed list of transactions in order.
    pub(crate) type Mock = Generic<Transaction>;

    impl HostInterface for Mock {
        fn exchange(
            &mut self,
            op: OpCode,
            request: &[u8],
            response: &mut [u8],
        ) -> Result<usize, i32> {
            let expected = self
                .next()
                .unwrap_or_else(|| panic!("unexpected {:?} exchange {:02x?}", op, request));
            assert_eq!(expected.op, op, "wrong operation");
            assert_eq!(expected.request.as_slice(), request, "wrong request for {:?}", op);
            let bytes = expected.response?;
            let len = bytes.len().min(response.len());
            response[..len].copy_from_slice(&bytes[..len]);
            Ok(len)
        }
    }
}
