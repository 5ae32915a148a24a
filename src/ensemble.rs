//! Ensemble mode: keyed configuration properties and stored-message retrieval.
//!
//! Ensemble lets the module act as gateway, repeater or endpoint of a small
//! low-power network. The host configures the module through numbered properties
//! (see [`crate::property`]) and pulls messages the module has buffered.
//!
//! ## Truncation
//!
//! Retrieval calls ([`Ensemble::get_stored_message`], [`Ensemble::get_mail_message`],
//! [`Ensemble::get_debug_info`]) copy at most the caller's buffer length and report how
//! many bytes were copied. A payload larger than the buffer is silently truncated;
//! it is not an error.

use heapless::Vec;

use crate::consts::{
    ENSEMBLE_DBG_BUFFER_SIZE, ENSEMBLE_OFFSET_MSGINFO, ENSEMBLE_OFFSET_MUI,
    ENSEMBLE_OFFSET_PAYLOAD, ENSEMBLE_OFFSET_RSSI, ENSEMBLE_OFFSET_UTC_TIME,
    MAX_ENSEMBLE_PROPERTY_LENGTH, MAX_ENSEMBLE_TRANSFER_SIZE,
};
use crate::encoding::{
    decode_u32_be, decode_utc_time, encode_utc_time, read_i16_be, read_u16_be, read_u64_be,
    write_u64_be,
};
use crate::error::Error;
use crate::ifc::{HostInterface, OpCode, read_write};
use crate::property::{PropertyValue, validate_readable, validate_writable};

/// Bit of [`MessageDescriptor::msginfo`] set when the message arrived through a repeater.
pub const MSG_ROUTED_VIA_REPEATER: u16 = 0x8000;

/// Metadata the gateway recorded for a stored message.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct MessageDescriptor {
    /// Message characteristics, see [`MSG_ROUTED_VIA_REPEATER`].
    pub msginfo: u16,
    /// RSSI of the received message.
    pub rssi: i16,
    /// UTC time (seconds) at which the gateway received the message.
    pub utc_time: u64,
    /// Module unique identifier of the sending endpoint.
    pub mui: u64,
}

impl MessageDescriptor {
    /// Parses the descriptor fields from the front of a stored-message response.
    ///
    /// Returns `None` when `frame` is shorter than the descriptor.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        if frame.len() < ENSEMBLE_OFFSET_PAYLOAD {
            return None;
        }
        Some(Self {
            msginfo: read_u16_be(frame, ENSEMBLE_OFFSET_MSGINFO),
            rssi: read_i16_be(frame, ENSEMBLE_OFFSET_RSSI),
            utc_time: read_u64_be(frame, ENSEMBLE_OFFSET_UTC_TIME),
            mui: read_u64_be(frame, ENSEMBLE_OFFSET_MUI),
        })
    }

    /// Whether the message was relayed by a repeater rather than heard directly.
    pub fn routed_via_repeater(&self) -> bool {
        self.msginfo & MSG_ROUTED_VIA_REPEATER != 0
    }
}

/// Ensemble operations over a host interface.
#[derive(Debug)]
pub struct Ensemble<I> {
    ifc: I,
}

impl<I: HostInterface> Ensemble<I> {
    /// Wraps a host interface.
    pub fn new(ifc: I) -> Self {
        Self { ifc }
    }

    /// Returns the wrapped host interface.
    pub fn release(self) -> I {
        self.ifc
    }

    /// Sets property `id` to `value`.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if `id` is not a property or `value` does not have
    ///   the property's size. Nothing is sent in that case.
    /// - [`Error::Transport`] if the exchange fails.
    pub fn set_property(&mut self, id: impl Into<u8>, value: &PropertyValue) -> Result<(), Error> {
        let property = validate_writable(id.into())?;
        if value.size() != property.size() {
            return Err(Error::InvalidParameter);
        }

        let mut frame: Vec<u8, { MAX_ENSEMBLE_PROPERTY_LENGTH + 1 }> = Vec::new();
        frame
            .push(u8::from(property))
            .map_err(|_| Error::InvalidParameter)?;
        frame
            .extend_from_slice(&value.encode())
            .map_err(|_| Error::InvalidParameter)?;

        let _ = read_write(&mut self.ifc, OpCode::EnsemblePropSet, &frame, &mut [])?;
        log::debug!("property {:?} set", property);
        Ok(())
    }

    /// Reads property `id` from the module.
    ///
    /// The response echoes the identifier in its first byte, followed by the value.
    /// The returned value's [`size`](PropertyValue::size) is the number of bytes decoded.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if `id` is not a property or is write-only.
    /// - [`Error::IncorrectMessageSize`] if the response is shorter than `size + 1`.
    /// - [`Error::Transport`] if the exchange fails.
    pub fn get_property(&mut self, id: impl Into<u8>) -> Result<PropertyValue, Error> {
        let property = validate_readable(id.into())?;
        let size = property.size();

        let mut rsp = [0u8; MAX_ENSEMBLE_PROPERTY_LENGTH + 1];
        let len = read_write(
            &mut self.ifc,
            OpCode::EnsemblePropGet,
            &[u8::from(property)],
            &mut rsp[..size + 1],
        )?;
        if len < size + 1 {
            return Err(Error::IncorrectMessageSize);
        }
        PropertyValue::decode(size, &rsp[1..]).ok_or(Error::IncorrectMessageSize)
    }

    /// Number of messages the gateway currently holds.
    pub fn stored_message_count(&mut self) -> Result<u32, Error> {
        self.read_count(OpCode::EnsembleGetMsgCount, &[])
    }

    /// Number of messages the gateway dropped, optionally resetting the counter.
    pub fn lost_message_count(&mut self, reset: bool) -> Result<u32, Error> {
        self.read_count(OpCode::EnsembleLostMsg, &[u8::from(reset)])
    }

    fn read_count(&mut self, op: OpCode, request: &[u8]) -> Result<u32, Error> {
        let mut rsp = [0u8; 4];
        let len = read_write(&mut self.ifc, op, request, &mut rsp)?;
        if len < rsp.len() {
            return Err(Error::IncorrectMessageSize);
        }
        Ok(decode_u32_be(rsp))
    }

    /// Retrieves the next stored message into `buf`.
    ///
    /// Returns the message descriptor and the number of payload bytes copied, which is
    /// `min(payload length, buf.len())`.
    ///
    /// # Errors
    /// - [`Error::NoData`] if the response does not extend past the descriptor.
    /// - [`Error::Transport`] if the exchange fails.
    pub fn get_stored_message(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(MessageDescriptor, usize), Error> {
        let mut rsp = [0u8; MAX_ENSEMBLE_TRANSFER_SIZE];
        let len = read_write(&mut self.ifc, OpCode::EnsembleGetNextMsg, &[], &mut rsp)?;
        if len <= ENSEMBLE_OFFSET_PAYLOAD {
            return Err(Error::NoData);
        }

        let payload = &rsp[ENSEMBLE_OFFSET_PAYLOAD..len];
        let copied = payload.len().min(buf.len());
        buf[..copied].copy_from_slice(&payload[..copied]);
        if copied < payload.len() {
            log::debug!("stored message truncated from {} to {} bytes", payload.len(), copied);
        }

        let descriptor = MessageDescriptor::parse(&rsp[..len]).ok_or(Error::NoData)?;
        Ok((descriptor, copied))
    }

    /// Retrieves mail the gateway sent to this endpoint into `buf`.
    ///
    /// Returns the number of bytes copied, truncated to `buf.len()`.
    pub fn get_mail_message(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut rsp = [0u8; MAX_ENSEMBLE_TRANSFER_SIZE];
        let len = read_write(&mut self.ifc, OpCode::EnsembleGetMail, &[], &mut rsp)?;
        let copied = len.min(buf.len());
        buf[..copied].copy_from_slice(&rsp[..copied]);
        Ok(copied)
    }

    /// Retrieves module debug information into `buf`.
    ///
    /// Returns the number of bytes copied, truncated to `buf.len()`.
    pub fn get_debug_info(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut rsp = [0u8; ENSEMBLE_DBG_BUFFER_SIZE];
        let len = read_write(&mut self.ifc, OpCode::EnsembleDebugDump, &[], &mut rsp)?;
        let copied = len.min(buf.len());
        buf[..copied].copy_from_slice(&rsp[..copied]);
        Ok(copied)
    }

    /// Sets the module's UTC time in seconds. Zero is rejected.
    pub fn set_utc_time(&mut self, seconds: u64) -> Result<(), Error> {
        if seconds == 0 {
            return Err(Error::InvalidParameter);
        }
        let _ = read_write(
            &mut self.ifc,
            OpCode::EnsembleSetTime,
            &encode_utc_time(seconds),
            &mut [],
        )?;
        Ok(())
    }

    /// Reads the module's UTC time in seconds.
    pub fn get_utc_time(&mut self) -> Result<u64, Error> {
        let mut rsp = [0u8; 8];
        let len = read_write(&mut self.ifc, OpCode::EnsembleGetTime, &[], &mut rsp)?;
        if len < rsp.len() {
            return Err(Error::IncorrectMessageSize);
        }
        Ok(decode_utc_time(rsp))
    }

    /// Queues `payload` for transmission from this endpoint to its gateway.
    ///
    /// An empty payload is valid and acknowledges without data.
    pub fn send_payload_to_gateway(&mut self, payload: &[u8]) -> Result<(), Error> {
        let size = u8::try_from(payload.len()).map_err(|_| Error::InvalidParameter)?;

        let mut frame: Vec<u8, { MAX_ENSEMBLE_TRANSFER_SIZE + 1 }> = Vec::new();
        frame.push(size).map_err(|_| Error::InvalidParameter)?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| Error::InvalidParameter)?;

        let _ = read_write(&mut self.ifc, OpCode::EnsembleSendToGateway, &frame, &mut [])?;
        Ok(())
    }

    /// Queues mail for the endpoint with MAC address `mac`.
    ///
    /// Frame layout: `[size:1][mac:8 BE][payload]`. An empty payload is valid.
    pub fn send_mail_to_endpoint(&mut self, mac: u64, payload: &[u8]) -> Result<(), Error> {
        let size = u8::try_from(payload.len()).map_err(|_| Error::InvalidParameter)?;

        let mut frame: Vec<u8, { MAX_ENSEMBLE_TRANSFER_SIZE + 1 + 8 }> = Vec::new();
        frame
            .resize_default(1 + 8)
            .map_err(|_| Error::InvalidParameter)?;
        frame[0] = size;
        write_u64_be(&mut frame, 1, mac);
        frame
            .extend_from_slice(payload)
            .map_err(|_| Error::InvalidParameter)?;

        let _ = read_write(
            &mut self.ifc,
            OpCode::EnsembleSendMailToEndpoint,
            &frame,
            &mut [],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ifc::mock::{Mock, Transaction};
    use crate::property::Property;

    fn stored_message_frame(payload: &[u8]) -> std::vec::Vec<u8> {
        let mut frame = vec![
            0x80, 0x00, // msginfo
            0xff, 0x85, // rssi -123
            0x00, 0x00, 0x00, 0x00, 0x5f, 0x5e, 0x10, 0x00, // utc_time
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, // mui
        ];
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn test_get_property_frequency() {
        let ifc = Mock::new(&[Transaction::exchange(
            OpCode::EnsemblePropGet,
            &[0x00],
            &[0x00, 0x00, 0x36, 0xB0, 0x00],
        )]);
        let mut ensemble = Ensemble::new(ifc);

        let value = ensemble.get_property(Property::Frequency).unwrap();
        assert_eq!(value, PropertyValue::U32(0x0036_B000));
        assert_eq!(value.size(), 4);
        ensemble.release().done();
    }

    #[test]
    fn test_get_traffic_key_never_reaches_transport() {
        let mut ensemble = Ensemble::new(Mock::new(&[]));

        assert_eq!(
            ensemble.get_property(Property::TrafficKey),
            Err(Error::InvalidParameter)
        );
        assert_eq!(ensemble.get_property(15u8), Err(Error::InvalidParameter));
        ensemble.release().done();
    }

    #[test]
    fn test_get_property_short_response() {
        let ifc = Mock::new(&[Transaction::exchange(
            OpCode::EnsemblePropGet,
            &[0x05],
            &[0x05, 0x00],
        )]);
        let mut ensemble = Ensemble::new(ifc);

        assert_eq!(
            ensemble.get_property(Property::TxPower),
            Err(Error::IncorrectMessageSize)
        );
        ensemble.release().done();
    }

    #[test]
    fn test_set_property_frames() {
        let key = [0x2b; 16];
        let mut key_frame = vec![0x0e];
        key_frame.extend_from_slice(&key);
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsemblePropSet, &[0x05, 0x00, 0x00, 0x00, 0x14], &[]),
            Transaction::exchange(OpCode::EnsemblePropSet, &key_frame, &[]),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        ensemble
            .set_property(Property::TxPower, &PropertyValue::U32(20))
            .unwrap();
        ensemble
            .set_property(Property::TrafficKey, &PropertyValue::Key(key))
            .unwrap();
        ensemble.release().done();
    }

    #[test]
    fn test_set_property_rejects_mismatched_value() {
        let mut ensemble = Ensemble::new(Mock::new(&[]));

        assert_eq!(
            ensemble.set_property(Property::TrafficKey, &PropertyValue::U32(1)),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            ensemble.set_property(99u8, &PropertyValue::U32(1)),
            Err(Error::InvalidParameter)
        );
        ensemble.release().done();
    }

    #[test]
    fn test_set_property_propagates_transport_code() {
        let ifc = Mock::new(&[Transaction::error(
            OpCode::EnsemblePropSet,
            &[0x04, 0x00, 0x00, 0x00, 0x01],
            -10,
        )]);
        let mut ensemble = Ensemble::new(ifc);

        assert_eq!(
            ensemble.set_property(Property::NodeRole, &PropertyValue::U32(1)),
            Err(Error::Transport(-10))
        );
        ensemble.release().done();
    }

    #[test]
    fn test_stored_message_descriptor_fields() {
        let frame = stored_message_frame(&[0xde, 0xad, 0xbe, 0xef]);
        let ifc = Mock::new(&[Transaction::exchange(OpCode::EnsembleGetNextMsg, &[], &frame)]);
        let mut ensemble = Ensemble::new(ifc);

        let mut buf = [0u8; 16];
        let (descriptor, copied) = ensemble.get_stored_message(&mut buf).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(&buf[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(descriptor.msginfo, 0x8000);
        assert!(descriptor.routed_via_repeater());
        assert_eq!(descriptor.rssi, -123);
        assert_eq!(descriptor.utc_time, 1_600_000_000);
        assert_eq!(descriptor.mui, 0x0011_2233_4455_6677);
        ensemble.release().done();
    }

    #[test]
    fn test_stored_message_truncates_to_buffer() {
        let frame = stored_message_frame(&[1, 2, 3, 4, 5, 6]);
        let ifc = Mock::new(&[Transaction::exchange(OpCode::EnsembleGetNextMsg, &[], &frame)]);
        let mut ensemble = Ensemble::new(ifc);

        let mut buf = [0u8; 4];
        let (_, copied) = ensemble.get_stored_message(&mut buf).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        ensemble.release().done();
    }

    #[test]
    fn test_stored_message_header_only_is_no_data() {
        let frame = stored_message_frame(&[]);
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsembleGetNextMsg, &[], &frame),
            Transaction::exchange(OpCode::EnsembleGetNextMsg, &[], &[0x00; 7]),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        let mut buf = [0u8; 8];
        assert_eq!(ensemble.get_stored_message(&mut buf), Err(Error::NoData));
        assert_eq!(ensemble.get_stored_message(&mut buf), Err(Error::NoData));
        ensemble.release().done();
    }

    #[test]
    fn test_mail_and_debug_truncate() {
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsembleGetMail, &[], &[9, 8, 7, 6, 5]),
            Transaction::exchange(OpCode::EnsembleDebugDump, &[], &[0x42; 32]),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        let mut buf = [0u8; 3];
        assert_eq!(ensemble.get_mail_message(&mut buf), Ok(3));
        assert_eq!(buf, [9, 8, 7]);
        let mut dbg = [0u8; 64];
        assert_eq!(ensemble.get_debug_info(&mut dbg), Ok(32));
        ensemble.release().done();
    }

    #[test]
    fn test_utc_time() {
        let wire = [0x00, 0x00, 0x00, 0x00, 0x5f, 0x5e, 0x10, 0x00];
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsembleSetTime, &wire, &[]),
            Transaction::exchange(OpCode::EnsembleGetTime, &[], &wire),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        assert_eq!(ensemble.set_utc_time(0), Err(Error::InvalidParameter));
        ensemble.set_utc_time(1_600_000_000).unwrap();
        assert_eq!(ensemble.get_utc_time(), Ok(1_600_000_000));
        ensemble.release().done();
    }

    #[test]
    fn test_counts() {
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsembleLostMsg, &[0x01], &[0x00, 0x00, 0x01, 0x02]),
            Transaction::exchange(OpCode::EnsembleGetMsgCount, &[], &[0x00, 0x00, 0x00, 0x07]),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        assert_eq!(ensemble.lost_message_count(true), Ok(0x0102));
        assert_eq!(ensemble.stored_message_count(), Ok(7));
        ensemble.release().done();
    }

    #[test]
    fn test_send_frames() {
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::EnsembleSendToGateway, &[0x02, 0xaa, 0xbb], &[]),
            Transaction::exchange(OpCode::EnsembleSendToGateway, &[0x00], &[]),
            Transaction::exchange(
                OpCode::EnsembleSendMailToEndpoint,
                &[0x01, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0xcc],
                &[],
            ),
            Transaction::exchange(
                OpCode::EnsembleSendMailToEndpoint,
                &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2a],
                &[],
            ),
        ]);
        let mut ensemble = Ensemble::new(ifc);

        ensemble.send_payload_to_gateway(&[0xaa, 0xbb]).unwrap();
        ensemble.send_payload_to_gateway(&[]).unwrap();
        ensemble
            .send_mail_to_endpoint(0x0011_2233_4455_6677, &[0xcc])
            .unwrap();
        ensemble.send_mail_to_endpoint(0x2a, &[]).unwrap();
        assert_eq!(
            ensemble.send_payload_to_gateway(&[0u8; 256]),
            Err(Error::InvalidParameter)
        );
        ensemble.release().done();
    }
}
