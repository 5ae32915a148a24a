//! Symphony Link commands.
//!
//! These are the single-exchange building blocks the connection state machine in
//! [`crate::driver`] is made of: network configuration, status queries, acknowledged
//! uplinks and downlink retrieval. They can also be used on their own by applications
//! that drive the module without the state machine.

use crate::consts::{APP_TOKEN_LEN, MAX_QOS, MAX_SYMPHONY_PAYLOAD_LEN, SYMPHONY_RX_HEADER_LEN};
use crate::encoding::{encode_u32_be, read_i16_be};
use crate::error::Error;
use crate::ifc::{HostInterface, OpCode, read_write};

/// When the module listens for downlinks.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DownlinkMode {
    /// Downlink disabled.
    #[default]
    Off = 0,
    /// Always listening.
    AlwaysOn = 1,
    /// Downlink is fetched from the gateway mailbox.
    Mailbox = 2,
}

/// Antenna port.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Antenna {
    /// U.FL connector.
    UFl = 1,
    /// PCB trace antenna.
    Trace = 2,
}

/// Network configuration applied when the connection is (re)established.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SymphonyConfig {
    /// Network token of the gateway network to join.
    pub net_token: u32,
    /// Application token registered with the network.
    pub app_token: [u8; APP_TOKEN_LEN],
    /// Downlink mode.
    pub downlink_mode: DownlinkMode,
    /// Quality of service, `0..=15`.
    pub qos: u8,
}

/// Module (MAC) state.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ModuleState {
    /// Connected to a gateway and idle.
    IdleConnected,
    /// Not connected and idle.
    IdleDisconnected,
    /// Searching for or joining a gateway.
    Initializing,
    /// The module hit an error.
    Error,
    /// A value this crate does not know.
    Unknown(u8),
}

impl From<u8> for ModuleState {
    fn from(raw: u8) -> Self {
        match raw {
            1 => ModuleState::IdleConnected,
            2 => ModuleState::IdleDisconnected,
            3 => ModuleState::Initializing,
            0xff => ModuleState::Error,
            other => ModuleState::Unknown(other),
        }
    }
}

/// Transmit state.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TxState {
    /// Nothing queued.
    Idle,
    /// An uplink is in flight.
    Transmitting,
    /// The last uplink was acknowledged.
    Success,
    /// The last uplink failed.
    Error,
    /// A value this crate does not know.
    Unknown(u8),
}

impl From<u8> for TxState {
    fn from(raw: u8) -> Self {
        match raw {
            0 => TxState::Idle,
            1 => TxState::Transmitting,
            2 => TxState::Success,
            0xff => TxState::Error,
            other => TxState::Unknown(other),
        }
    }
}

/// Receive state.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RxState {
    /// No downlink waiting.
    NoMessage,
    /// A downlink is waiting to be retrieved.
    ReceivedMessage,
    /// A value this crate does not know.
    Unknown(u8),
}

impl From<u8> for RxState {
    fn from(raw: u8) -> Self {
        match raw {
            0 => RxState::NoMessage,
            1 => RxState::ReceivedMessage,
            other => RxState::Unknown(other),
        }
    }
}

/// A retrieved downlink.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ReceivedMessage {
    /// Payload bytes copied into the caller's buffer.
    pub len: usize,
    /// RSSI of the downlink.
    pub rssi: i16,
    /// SNR of the downlink.
    pub snr: u8,
}

/// Sets the network token.
pub fn net_token_set<I: HostInterface + ?Sized>(ifc: &mut I, net_token: u32) -> Result<(), Error> {
    let _ = read_write(ifc, OpCode::NetTokenSet, &encode_u32_be(net_token), &mut [])?;
    Ok(())
}

/// Sets the application token.
pub fn app_token_set<I: HostInterface + ?Sized>(
    ifc: &mut I,
    app_token: &[u8; APP_TOKEN_LEN],
) -> Result<(), Error> {
    let _ = read_write(ifc, OpCode::AppTokenSet, app_token, &mut [])?;
    Ok(())
}

/// Selects the downlink mode.
pub fn receive_mode_set<I: HostInterface + ?Sized>(
    ifc: &mut I,
    mode: DownlinkMode,
) -> Result<(), Error> {
    let _ = read_write(ifc, OpCode::RxModeSet, &[mode as u8], &mut [])?;
    Ok(())
}

/// Requests a quality-of-service level, at most 15.
pub fn qos_request<I: HostInterface + ?Sized>(ifc: &mut I, qos: u8) -> Result<(), Error> {
    if qos > MAX_QOS {
        return Err(Error::InvalidParameter);
    }
    let _ = read_write(ifc, OpCode::QosRequest, &[qos], &mut [])?;
    Ok(())
}

/// Applies a complete network configuration.
///
/// The network token, application token, downlink mode and QoS are sent in that order;
/// the first failure aborts the rest.
pub fn config_set<I: HostInterface + ?Sized>(
    ifc: &mut I,
    config: &SymphonyConfig,
) -> Result<(), Error> {
    if config.qos > MAX_QOS {
        return Err(Error::InvalidParameter);
    }
    net_token_set(ifc, config.net_token)?;
    app_token_set(ifc, &config.app_token)?;
    receive_mode_set(ifc, config.downlink_mode)?;
    qos_request(ifc, config.qos)
}

fn read_state_byte<I: HostInterface + ?Sized>(ifc: &mut I, op: OpCode) -> Result<u8, Error> {
    let mut rsp = [0u8; 1];
    let len = read_write(ifc, op, &[], &mut rsp)?;
    if len != rsp.len() {
        return Err(Error::IncorrectMessageSize);
    }
    Ok(rsp[0])
}

/// Reads the module, transmit and receive states.
pub fn get_state<I: HostInterface + ?Sized>(
    ifc: &mut I,
) -> Result<(ModuleState, TxState, RxState), Error> {
    let module = ModuleState::from(read_state_byte(ifc, OpCode::State)?);
    let tx = TxState::from(read_state_byte(ifc, OpCode::TxState)?);
    let rx = RxState::from(read_state_byte(ifc, OpCode::RxState)?);

    if let ModuleState::Unknown(raw) = module {
        log::warn!("module reported unknown state {:#04x}", raw);
    }
    if let TxState::Unknown(raw) = tx {
        log::warn!("module reported unknown tx state {:#04x}", raw);
    }
    if let RxState::Unknown(raw) = rx {
        log::warn!("module reported unknown rx state {:#04x}", raw);
    }
    Ok((module, tx, rx))
}

/// Queues an acknowledged uplink of 1 to 256 bytes.
pub fn message_send_ack<I: HostInterface + ?Sized>(
    ifc: &mut I,
    payload: &[u8],
) -> Result<(), Error> {
    if payload.is_empty() || payload.len() > MAX_SYMPHONY_PAYLOAD_LEN {
        return Err(Error::InvalidParameter);
    }
    let _ = read_write(ifc, OpCode::MsgSendAck, payload, &mut [])?;
    Ok(())
}

/// Retrieves a pending downlink into `buf`, truncating it to `buf.len()`.
pub fn retrieve_message<I: HostInterface + ?Sized>(
    ifc: &mut I,
    buf: &mut [u8],
) -> Result<ReceivedMessage, Error> {
    let mut rsp = [0u8; SYMPHONY_RX_HEADER_LEN + MAX_SYMPHONY_PAYLOAD_LEN];
    let len = read_write(ifc, OpCode::MsgRecv, &[], &mut rsp)?;
    if len < SYMPHONY_RX_HEADER_LEN {
        return Err(Error::IncorrectMessageSize);
    }

    let payload = &rsp[SYMPHONY_RX_HEADER_LEN..len];
    let copied = payload.len().min(buf.len());
    buf[..copied].copy_from_slice(&payload[..copied]);
    Ok(ReceivedMessage {
        len: copied,
        rssi: read_i16_be(&rsp, 0),
        snr: rsp[2],
    })
}

/// Selects the antenna port.
pub fn antenna_set<I: HostInterface + ?Sized>(ifc: &mut I, antenna: Antenna) -> Result<(), Error> {
    let _ = read_write(ifc, OpCode::AntennaSet, &[antenna as u8], &mut [])?;
    Ok(())
}
