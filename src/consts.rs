//! Constants used across the host interface implementation.
//!
//! This module defines the buffer sizes, timing values and numeric status codes
//! shared by the Ensemble, LoRaWAN and Symphony Link layers.
//!
//! ## Key Concepts
//!
//! - **Transfer sizes**: Every frame exchanged with the module has a fixed upper bound.
//!   Request frames are built in `heapless::Vec`s sized from these values.
//! - **Status codes**: The module reports failures as negative integers. Codes in the
//!   `LL_IFC_NACK_*` range are module-side refusals, `LL_IFC_ERROR_*` codes are host-side
//!   failures.
//! - **Timing**: Polling cadences and settle times used by the blocking operations.

/// Length (in bytes) of a Symphony Link application token.
pub const APP_TOKEN_LEN: usize = 10;

/// Length (in bytes) of the Ensemble AES-128 traffic key.
pub const ENSEMBLE_AES_KEY_LENGTH: usize = 16;

/// Size of the largest Ensemble property (currently the traffic key).
pub const MAX_ENSEMBLE_PROPERTY_LENGTH: usize = ENSEMBLE_AES_KEY_LENGTH;

/// Maximum length of any Ensemble message that can cross the host interface,
/// payload and header overhead included.
pub const MAX_ENSEMBLE_TRANSFER_SIZE: usize = 255;

/// Maximum payload a module can be configured to carry over the air in Ensemble mode.
pub const MAX_ENSEMBLE_PAYLOAD_LENGTH: usize = 128;

/// Size of the Ensemble debug dump returned by the module.
pub const ENSEMBLE_DBG_BUFFER_SIZE: usize = 32;

/// Byte offset of `msginfo` inside a serialized Ensemble message descriptor.
pub const ENSEMBLE_OFFSET_MSGINFO: usize = 0;
/// Byte offset of `rssi` inside a serialized Ensemble message descriptor.
pub const ENSEMBLE_OFFSET_RSSI: usize = ENSEMBLE_OFFSET_MSGINFO + 2;
/// Byte offset of `utc_time` inside a serialized Ensemble message descriptor.
pub const ENSEMBLE_OFFSET_UTC_TIME: usize = ENSEMBLE_OFFSET_RSSI + 2;
/// Byte offset of `mui` inside a serialized Ensemble message descriptor.
pub const ENSEMBLE_OFFSET_MUI: usize = ENSEMBLE_OFFSET_UTC_TIME + 8;
/// Byte offset of the payload following a serialized Ensemble message descriptor.
///
/// This is also the minimum length of a stored-message response.
pub const ENSEMBLE_OFFSET_PAYLOAD: usize = ENSEMBLE_OFFSET_MUI + 8;

/// Largest Symphony Link uplink payload accepted by the module.
pub const MAX_SYMPHONY_PAYLOAD_LEN: usize = 256;

/// Length of the `[rssi:2][snr:1]` header preceding a retrieved Symphony Link downlink.
pub const SYMPHONY_RX_HEADER_LEN: usize = 3;

/// Largest LoRaWAN payload: the length travels in a single byte.
pub const LORAWAN_MAX_PAYLOAD_LEN: usize = 255;

/// Length of the `[flags][port][retries][length]` header of a LoRaWAN send frame.
pub const LORAWAN_TX_HEADER_LEN: usize = 4;

/// Length of the fixed metadata header of a LoRaWAN receive frame.
pub const LORAWAN_RX_HEADER_LEN: usize = 8;

/// Size of the response buffer used for a LoRaWAN receive exchange.
pub const LORAWAN_RX_BUFFER_LEN: usize = 256;

/// Largest network identifier accepted by activation by personalization (24 bits).
pub const LORAWAN_MAX_NET_ID: u32 = 0x00ff_ffff;

/// Seconds after which a pending LoRaWAN activation is abandoned.
pub const LORAWAN_ACTIVATE_TIMEOUT_S: u64 = 60;

/// Interval between LoRaWAN activation status queries.
pub const LORAWAN_ACTIVATE_POLL_MS: u32 = 1_000;

/// Time the module needs to reboot after a MAC mode change.
pub const MAC_MODE_SWITCH_DELAY_MS: u32 = 2_000;

/// Settle time between storing the Symphony Link configuration and the first update.
pub const BEGIN_SETTLE_DELAY_MS: u32 = 100;

/// Interval between state machine updates while waiting on the module.
pub const SEND_POLL_INTERVAL_MS: u32 = 100;

/// Highest quality-of-service level a module accepts.
pub const MAX_QOS: u8 = 15;

/// Module NACK: command not supported.
pub const LL_IFC_NACK_CMD_NOT_SUPPORTED: i32 = 1;
/// Module NACK: frame checksum mismatch.
pub const LL_IFC_NACK_INCORRECT_CHKSUM: i32 = 2;
/// Module NACK: payload length out of range.
pub const LL_IFC_NACK_PAYLOAD_LEN_OOR: i32 = 3;
/// Module NACK: payload value out of range.
pub const LL_IFC_NACK_PAYLOAD_OOR: i32 = 4;
/// Module NACK: the module is still booting.
pub const LL_IFC_NACK_BOOTUP_IN_PROGRESS: i32 = 5;
/// Module NACK: busy, try again later.
pub const LL_IFC_NACK_BUSY_TRY_AGAIN: i32 = 6;
/// Module NACK: application token not registered.
pub const LL_IFC_NACK_APP_TOKEN_REG: i32 = 7;
/// Module NACK: payload longer than allowed.
pub const LL_IFC_NACK_PAYLOAD_LEN_EXCEEDED: i32 = 8;
/// Module NACK: the operation requires mailbox downlink mode.
pub const LL_IFC_NACK_NOT_IN_MAILBOX_MODE: i32 = 9;
/// Module NACK: unknown or forbidden property.
pub const LL_IFC_NACK_PAYLOAD_BAD_PROPERTY: i32 = 10;
/// Module NACK: no data available.
pub const LL_IFC_NACK_NODATA: i32 = 11;
/// Module NACK: transmit queue full.
pub const LL_IFC_NACK_QUEUE_FULL: i32 = 12;
/// Module NACK: unspecified failure.
pub const LL_IFC_NACK_OTHER: i32 = 99;

/// Host error: a caller-supplied argument was rejected.
pub const LL_IFC_ERROR_INCORRECT_PARAMETER: i32 = -101;
/// Host error: the caller buffer cannot hold the response.
pub const LL_IFC_ERROR_BUFFER_TOO_SMALL: i32 = -107;
/// Host error: an operation did not complete in time.
pub const LL_IFC_ERROR_TIMEOUT: i32 = -110;
/// Host error: the response length contradicts its own header.
pub const LL_IFC_ERROR_INCORRECT_MESSAGE_SIZE: i32 = -111;
