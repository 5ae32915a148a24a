//! Ensemble configuration property registry.
//!
//! Properties are addressed by a dense identifier `0..PROPERTY_COUNT`. Each one has a
//! single fixed encoded size, looked up by indexing [`PROPERTY_SIZES`]. The traffic
//! key is write-only: it can be set but never read back.
//!
//! Both validators run before a frame is built, so a rejected identifier never reaches
//! the transport.

use heapless::Vec;

use crate::consts::{ENSEMBLE_AES_KEY_LENGTH, MAX_ENSEMBLE_PROPERTY_LENGTH};
use crate::encoding::{decode_u32_be, encode_u32_be};
use crate::error::Error;

/// Number of defined Ensemble properties.
pub const PROPERTY_COUNT: u8 = 15;

/// Encoded size of each property, indexed by identifier.
///
/// The order must match the [`Property`] discriminants.
pub static PROPERTY_SIZES: [usize; PROPERTY_COUNT as usize] = [
    4,                       // Frequency
    4,                       // Bandwidth
    4,                       // Spreading factor
    4,                       // Coding rate
    4,                       // Node role
    4,                       // Tx power
    4,                       // Preamble length
    4,                       // Max tx attempts
    4,                       // Max payload size
    4,                       // Gateway max message count
    4,                       // Tx fail retry delay
    4,                       // Message available notify mode
    4,                       // Mail ack delay
    4,                       // Repeater available
    ENSEMBLE_AES_KEY_LENGTH, // Traffic key
];

/// Ensemble configuration properties.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum Property {
    /// Carrier frequency in Hz.
    Frequency = 0,
    /// Enumerated bandwidth.
    Bandwidth = 1,
    /// Enumerated spreading factor.
    SpreadingFactor = 2,
    /// Enumerated coding rate.
    CodingRate = 3,
    /// Role of the module, see [`Role`].
    NodeRole = 4,
    /// Transmit power in dBm.
    TxPower = 5,
    /// Preamble length in symbols.
    PreambleLength = 6,
    /// Maximum transmit attempts per message.
    MaxTxAttempts = 7,
    /// Maximum application payload per message.
    MaxPayloadSize = 8,
    /// Maximum number of messages buffered in a gateway.
    GatewayMaxMsgCount = 9,
    /// Delay between transmit attempts after an error, in seconds.
    TxFailRetryDelay = 10,
    /// How a gateway notifies the host that messages are available.
    MsgAvailNotifyMode = 11,
    /// Time a gateway waits for host mail before acknowledging an endpoint.
    MailAckDelay = 12,
    /// Whether a repeater is available to endpoints.
    RepeaterAvailable = 13,
    /// AES-128 traffic key. Write-only.
    TrafficKey = 14,
}

impl Property {
    /// Encoded size of this property in bytes.
    pub fn size(self) -> usize {
        PROPERTY_SIZES[self as usize]
    }

    /// Whether the property may be read back from the module.
    pub fn is_readable(self) -> bool {
        self != Property::TrafficKey
    }
}

impl From<Property> for u8 {
    fn from(property: Property) -> u8 {
        property as u8
    }
}

impl TryFrom<u8> for Property {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        let property = match id {
            0 => Property::Frequency,
            1 => Property::Bandwidth,
            2 => Property::SpreadingFactor,
            3 => Property::CodingRate,
            4 => Property::NodeRole,
            5 => Property::TxPower,
            6 => Property::PreambleLength,
            7 => Property::MaxTxAttempts,
            8 => Property::MaxPayloadSize,
            9 => Property::GatewayMaxMsgCount,
            10 => Property::TxFailRetryDelay,
            11 => Property::MsgAvailNotifyMode,
            12 => Property::MailAckDelay,
            13 => Property::RepeaterAvailable,
            14 => Property::TrafficKey,
            _ => return Err(Error::InvalidParameter),
        };
        Ok(property)
    }
}

/// Returns the encoded size of property `id`, or 0 if `id` is not a defined property.
pub fn size_of(id: u8) -> usize {
    PROPERTY_SIZES.get(id as usize).copied().unwrap_or(0)
}

/// Checks that `id` names a property that may be read.
pub fn validate_readable(id: u8) -> Result<Property, Error> {
    let property = Property::try_from(id)?;
    if !property.is_readable() {
        return Err(Error::InvalidParameter);
    }
    Ok(property)
}

/// Checks that `id` names a property that may be written.
pub fn validate_writable(id: u8) -> Result<Property, Error> {
    Property::try_from(id)
}

/// Module role, the value of [`Property::NodeRole`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Role {
    /// Endpoint node.
    Endpoint = 0,
    /// Gateway node.
    Gateway = 1,
    /// Repeater node.
    Repeater = 2,
}

impl From<Role> for PropertyValue {
    fn from(role: Role) -> Self {
        PropertyValue::U32(role as u32)
    }
}

/// Value of an Ensemble property.
///
/// Four-byte properties travel big-endian; the key is a byte string copied verbatim.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PropertyValue {
    /// A 32-bit numeric property.
    U32(u32),
    /// The 16-byte traffic key.
    Key([u8; ENSEMBLE_AES_KEY_LENGTH]),
}

impl PropertyValue {
    /// Encoded size of the value in bytes.
    pub fn size(&self) -> usize {
        match self {
            PropertyValue::U32(_) => 4,
            PropertyValue::Key(key) => key.len(),
        }
    }

    /// Wire encoding of the value.
    pub fn encode(&self) -> Vec<u8, MAX_ENSEMBLE_PROPERTY_LENGTH> {
        let mut out = Vec::new();
        // Neither encoding exceeds the capacity.
        let _ = match self {
            PropertyValue::U32(value) => out.extend_from_slice(&encode_u32_be(*value)),
            PropertyValue::Key(key) => out.extend_from_slice(key),
        };
        out
    }

    /// Decodes a value of `size` bytes from the front of `bytes`.
    ///
    /// Returns `None` when `bytes` is shorter than `size` or `size` is not a property size.
    pub fn decode(size: usize, bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..size)?;
        match size {
            4 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                Some(PropertyValue::U32(decode_u32_be(raw)))
            }
            ENSEMBLE_AES_KEY_LENGTH => {
                let mut key = [0u8; ENSEMBLE_AES_KEY_LENGTH];
                key.copy_from_slice(bytes);
                Some(PropertyValue::Key(key))
            }
            _ => None,
        }
    }

    /// The numeric value, if this is a 32-bit property.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropertyValue::U32(value) => Some(*value),
            PropertyValue::Key(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_table() {
        for id in 0..14 {
            assert_eq!(size_of(id), 4);
        }
        assert_eq!(size_of(14), 16);
        assert_eq!(size_of(PROPERTY_COUNT), 0);
        assert_eq!(size_of(u8::MAX), 0);
        assert_eq!(size_of(3), size_of(3));
    }

    #[test]
    fn test_property_ids_match_table_order() {
        for id in 0..PROPERTY_COUNT {
            let property = Property::try_from(id).unwrap();
            assert_eq!(u8::from(property), id);
            assert_eq!(property.size(), size_of(id));
        }
    }

    #[test]
    fn test_traffic_key_is_write_only() {
        assert_eq!(validate_readable(14), Err(Error::InvalidParameter));
        assert_eq!(validate_writable(14), Ok(Property::TrafficKey));
        assert_eq!(validate_readable(0), Ok(Property::Frequency));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(validate_readable(15), Err(Error::InvalidParameter));
        assert_eq!(validate_writable(200), Err(Error::InvalidParameter));
    }

    #[test]
    fn test_value_encoding() {
        assert_eq!(
            PropertyValue::U32(0x0036_B000).encode().as_slice(),
            &[0x00, 0x36, 0xB0, 0x00]
        );
        let key = [0xA5; 16];
        assert_eq!(PropertyValue::Key(key).encode().as_slice(), &key);
        assert_eq!(
            PropertyValue::decode(4, &[0x00, 0x00, 0x00, 0x02, 0xff]),
            Some(PropertyValue::U32(2))
        );
        assert_eq!(PropertyValue::decode(16, &[0u8; 4]), None);
        assert_eq!(PropertyValue::from(Role::Repeater).as_u32(), Some(2));
    }
}
