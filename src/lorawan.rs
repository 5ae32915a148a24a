//! LoRaWAN activation, parameters and messaging.
//!
//! Activation is the only long-running operation: once the module accepts an activation
//! request, [`LoRaWan::activate`] blocks, querying the activation status every second
//! until the module reports a result or 60 seconds have passed.
//!
//! Sending only enqueues a frame. The module transmits on its own schedule and the call
//! returns as soon as the module has accepted the frame.
//!
//! ```ignore
//! let mut lorawan = LoRaWan::new(uart, delay, StdClock::new());
//! lorawan.activate(&Activation::OverTheAir {
//!     network: NetworkType::Public,
//!     class: DeviceClass::A,
//!     dev_eui,
//!     app_eui,
//!     app_key,
//! })?;
//! lorawan.send_unconfirmed(0, 1, b"hello")?;
//! ```

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::consts::{
    LORAWAN_ACTIVATE_POLL_MS, LORAWAN_ACTIVATE_TIMEOUT_S, LORAWAN_MAX_NET_ID,
    LORAWAN_MAX_PAYLOAD_LEN, LORAWAN_RX_BUFFER_LEN, LORAWAN_RX_HEADER_LEN, LORAWAN_TX_HEADER_LEN,
};
use crate::encoding::{encode_u32_be, read_u32_be};
use crate::error::Error;
use crate::ifc::{HostInterface, IrqFlags, OpCode, irq_flags, read_write};
use crate::timer::{Clock, elapsed_secs};

/// Flag bit requesting an acknowledged (confirmed) uplink.
pub const SEND_CONFIRMED: u8 = 0x01;

/// Interrupt flags cleared once an activation completes.
const ACTIVATION_FLAGS_TO_CLEAR: IrqFlags = IrqFlags(
    IrqFlags::CONNECTED.0 | IrqFlags::RX_DONE.0 | IrqFlags::TX_ERROR.0 | IrqFlags::TX_DONE.0,
);

const ACTIVATION_QUERY: u8 = 0;
const ACTIVATION_OVER_THE_AIR: u8 = 1;
const ACTIVATION_PERSONALIZATION: u8 = 2;

const PARAM_GET_MARKER: u8 = 3;
const PARAM_SET_MARKER: u8 = 7;
const PARAM_FRAME_LEN: usize = 7;

/// Largest activation frame (personalization).
pub const ACTIVATION_FRAME_LEN: usize = 3 + 4 + 4 + 16 + 16;

/// Network the device joins.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum NetworkType {
    /// Public network (public sync word).
    Public = 0,
    /// Private network.
    Private = 1,
}

/// LoRaWAN device class.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DeviceClass {
    /// Class A: receive windows only after an uplink.
    A = 0,
    /// Class B: scheduled receive slots.
    B = 1,
    /// Class C: continuously listening.
    C = 2,
}

/// How the device obtains its session keys.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Activation {
    /// Over-the-air activation: session keys are negotiated with the network.
    OverTheAir {
        /// Network type.
        network: NetworkType,
        /// Device class.
        class: DeviceClass,
        /// Device EUI.
        dev_eui: [u8; 8],
        /// Application EUI.
        app_eui: [u8; 8],
        /// Application key.
        app_key: [u8; 16],
    },
    /// Activation by personalization: session keys are provisioned up front.
    Personalization {
        /// Network type.
        network: NetworkType,
        /// Device class.
        class: DeviceClass,
        /// Network identifier, at most 24 bits.
        net_id: u32,
        /// Device address.
        dev_addr: u32,
        /// Network session key.
        net_s_key: [u8; 16],
        /// Application session key.
        app_s_key: [u8; 16],
    },
}

impl Activation {
    /// Builds the activation request frame.
    ///
    /// Fails with [`Error::InvalidParameter`] when the network identifier exceeds 24 bits.
    pub fn encode(&self) -> Result<Vec<u8, ACTIVATION_FRAME_LEN>, Error> {
        let mut frame = Vec::new();
        match *self {
            Activation::OverTheAir {
                network,
                class,
                dev_eui,
                app_eui,
                app_key,
            } => {
                frame
                    .extend_from_slice(&[ACTIVATION_OVER_THE_AIR, network as u8, class as u8])
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&dev_eui)
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&app_eui)
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&app_key)
                    .map_err(|_| Error::InvalidParameter)?;
            }
            Activation::Personalization {
                network,
                class,
                net_id,
                dev_addr,
                net_s_key,
                app_s_key,
            } => {
                if net_id > LORAWAN_MAX_NET_ID {
                    return Err(Error::InvalidParameter);
                }
                frame
                    .extend_from_slice(&[ACTIVATION_PERSONALIZATION, network as u8, class as u8])
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&encode_u32_be(net_id))
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&encode_u32_be(dev_addr))
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&net_s_key)
                    .map_err(|_| Error::InvalidParameter)?;
                frame
                    .extend_from_slice(&app_s_key)
                    .map_err(|_| Error::InvalidParameter)?;
            }
        }
        Ok(frame)
    }
}

/// Activation status reported by the module.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ActivationStatus {
    /// The device is activated.
    Completed,
    /// Activation is in progress.
    Pending,
    /// The network refused the activation.
    Failed,
}

impl TryFrom<u8> for ActivationStatus {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ActivationStatus::Completed),
            1 => Ok(ActivationStatus::Pending),
            2 => Ok(ActivationStatus::Failed),
            other => {
                log::warn!("unknown activation status {}", other);
                Err(Error::ActivationRejected)
            }
        }
    }
}

/// Metadata of a received LoRaWAN downlink.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RxMetadata {
    /// Downlink flags.
    pub flags: u8,
    /// Number of retries the last uplink needed.
    pub tx_nb_retries: u8,
    /// Demodulation margin reported by the network.
    pub demod_margin: u8,
    /// Number of gateways that heard the last uplink.
    pub nb_gateways: u8,
    /// RSSI in dBm.
    pub rssi: i16,
    /// Raw SNR.
    pub snr: u8,
    /// Port the downlink arrived on.
    pub port: u8,
    /// Number of payload bytes.
    pub bytes_received: u8,
}

impl RxMetadata {
    fn parse(header: &[u8; LORAWAN_RX_HEADER_LEN]) -> Self {
        Self {
            flags: header[0],
            tx_nb_retries: header[1],
            demod_margin: header[2],
            nb_gateways: header[3],
            rssi: rssi_from_packet(header[4]),
            snr: header[5],
            port: header[6],
            bytes_received: header[7],
        }
    }
}

/// Converts the raw RSSI byte of a receive frame to dBm.
pub fn rssi_from_packet(raw: u8) -> i16 {
    -i16::from(raw)
}

/// LoRaWAN operations over a host interface.
///
/// `D` paces the activation poll and `C` measures its timeout.
#[derive(Debug)]
pub struct LoRaWan<I, D, C> {
    ifc: I,
    delay: D,
    clock: C,
}

impl<I, D, C> LoRaWan<I, D, C>
where
    I: HostInterface,
    D: DelayNs,
    C: Clock,
{
    /// Wraps a host interface with a delay provider and a clock.
    pub fn new(ifc: I, delay: D, clock: C) -> Self {
        Self { ifc, delay, clock }
    }

    /// Returns the wrapped host interface, delay and clock.
    pub fn release(self) -> (I, D, C) {
        (self.ifc, self.delay, self.clock)
    }

    /// Activates the device and blocks until the module reports the result.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if the request is malformed.
    /// - [`Error::ActivationRejected`] if the module reports failure or an unknown status.
    /// - [`Error::Timeout`] if the activation is still pending after 60 seconds.
    /// - [`Error::IncorrectMessageSize`] if a status response is not exactly one byte.
    pub fn activate(&mut self, activation: &Activation) -> Result<(), Error> {
        let frame = activation.encode()?;
        match self.activation_status(&frame)? {
            ActivationStatus::Completed => {
                log::info!("activation completed immediately");
                Ok(())
            }
            ActivationStatus::Pending => self.poll_activation(),
            ActivationStatus::Failed => {
                log::warn!("activation refused");
                Err(Error::ActivationRejected)
            }
        }
    }

    /// Polls the activation status once per second until it leaves `Pending`.
    ///
    /// On completion the connection, receive and transmit interrupt flags are cleared.
    pub fn poll_activation(&mut self) -> Result<(), Error> {
        let start = self.clock.now();
        loop {
            match self.activation_status(&[ACTIVATION_QUERY])? {
                ActivationStatus::Completed => {
                    if let Err(e) = irq_flags(&mut self.ifc, ACTIVATION_FLAGS_TO_CLEAR) {
                        log::warn!("could not clear flags after activation: {}", e);
                    }
                    log::info!("activation completed");
                    return Ok(());
                }
                ActivationStatus::Pending => {}
                ActivationStatus::Failed => {
                    log::warn!("activation failed");
                    return Err(Error::ActivationRejected);
                }
            }

            let elapsed = elapsed_secs(start, self.clock.now());
            if elapsed > LORAWAN_ACTIVATE_TIMEOUT_S {
                log::warn!("activation still pending after {} s", elapsed);
                return Err(Error::Timeout);
            }
            log::debug!("activation pending ({} s)", elapsed);
            self.delay.delay_ms(LORAWAN_ACTIVATE_POLL_MS);
        }
    }

    fn activation_status(&mut self, request: &[u8]) -> Result<ActivationStatus, Error> {
        let mut rsp = [0u8; 1];
        let len = read_write(&mut self.ifc, OpCode::LoraWanActivate, request, &mut rsp)?;
        if len != rsp.len() {
            return Err(Error::IncorrectMessageSize);
        }
        ActivationStatus::try_from(rsp[0])
    }

    /// Reads a 32-bit LoRaWAN parameter.
    pub fn param_get_i32(&mut self, param: u8) -> Result<i32, Error> {
        if param == u8::MAX {
            return Err(Error::InvalidParameter);
        }
        let mut rsp = [0u8; PARAM_FRAME_LEN];
        let len = read_write(
            &mut self.ifc,
            OpCode::LoraWanParam,
            &[PARAM_GET_MARKER, param, 0],
            &mut rsp,
        )?;
        if len != rsp.len() {
            return Err(Error::IncorrectMessageSize);
        }
        Ok(read_u32_be(&rsp, 3) as i32)
    }

    /// Writes a 32-bit LoRaWAN parameter.
    pub fn param_set_i32(&mut self, param: u8, value: i32) -> Result<(), Error> {
        if param == u8::MAX {
            return Err(Error::InvalidParameter);
        }
        let mut request = [0u8; PARAM_FRAME_LEN];
        request[..3].copy_from_slice(&[PARAM_SET_MARKER, param, 4]);
        request[3..].copy_from_slice(&value.to_be_bytes());

        let mut rsp = [0u8; PARAM_FRAME_LEN];
        let len = read_write(&mut self.ifc, OpCode::LoraWanParam, &request, &mut rsp)?;
        if len != rsp.len() {
            return Err(Error::IncorrectMessageSize);
        }
        Ok(())
    }

    /// Enqueues an unacknowledged uplink on `port`. The confirmed flag is forced off.
    pub fn send_unconfirmed(&mut self, flags: u8, port: u8, payload: &[u8]) -> Result<(), Error> {
        self.send(flags & !SEND_CONFIRMED, port, payload, 0)
    }

    /// Enqueues an acknowledged uplink on `port`, retried up to `retries` times.
    pub fn send_confirmed(
        &mut self,
        flags: u8,
        port: u8,
        payload: &[u8],
        retries: u8,
    ) -> Result<(), Error> {
        self.send(flags | SEND_CONFIRMED, port, payload, retries)
    }

    fn send(&mut self, flags: u8, port: u8, payload: &[u8], retries: u8) -> Result<(), Error> {
        if port == 0 || payload.is_empty() || payload.len() > LORAWAN_MAX_PAYLOAD_LEN {
            return Err(Error::InvalidParameter);
        }
        let len = u8::try_from(payload.len()).map_err(|_| Error::InvalidParameter)?;

        let mut frame: Vec<u8, { LORAWAN_TX_HEADER_LEN + LORAWAN_MAX_PAYLOAD_LEN }> = Vec::new();
        frame
            .extend_from_slice(&[flags, port, retries, len])
            .map_err(|_| Error::InvalidParameter)?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| Error::InvalidParameter)?;

        let mut rsp = [0u8; 1];
        let _ = read_write(&mut self.ifc, OpCode::LoraWanMsgSend, &frame, &mut rsp)?;
        log::debug!("queued {} byte uplink on port {}", len, port);
        Ok(())
    }

    /// Retrieves a downlink into `buf`.
    ///
    /// # Errors
    /// - [`Error::IncorrectMessageSize`] if the response is shorter than the metadata
    ///   header or its length disagrees with the advertised byte count.
    /// - [`Error::BufferTooSmall`] if the payload does not fit into `buf`. Unlike the
    ///   Ensemble retrieval calls, nothing is copied in that case.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<RxMetadata, Error> {
        if buf.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let mut rsp = [0u8; LORAWAN_RX_BUFFER_LEN];
        let len = read_write(&mut self.ifc, OpCode::LoraWanMsgReceive, &[], &mut rsp)?;
        if len < LORAWAN_RX_HEADER_LEN {
            return Err(Error::IncorrectMessageSize);
        }

        let mut header = [0u8; LORAWAN_RX_HEADER_LEN];
        header.copy_from_slice(&rsp[..LORAWAN_RX_HEADER_LEN]);
        let rx = RxMetadata::parse(&header);

        let count = usize::from(rx.bytes_received);
        if len != LORAWAN_RX_HEADER_LEN + count {
            return Err(Error::IncorrectMessageSize);
        }
        if count > buf.len() {
            return Err(Error::BufferTooSmall);
        }
        buf[..count].copy_from_slice(&rsp[LORAWAN_RX_HEADER_LEN..len]);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ifc::mock::{Mock, Transaction};
    use core::cell::Cell;
    use core::time::Duration;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use std::rc::Rc;

    /// Simulated time: advances only when something sleeps on it.
    #[derive(Debug, Clone, Default)]
    struct SimTime(Rc<Cell<u64>>);

    impl DelayNs for SimTime {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + u64::from(ns));
        }
    }

    impl Clock for SimTime {
        fn now(&mut self) -> Duration {
            Duration::from_nanos(self.0.get())
        }
    }

    const QUERY: &[u8] = &[ACTIVATION_QUERY];

    fn otaa() -> Activation {
        Activation::OverTheAir {
            network: NetworkType::Public,
            class: DeviceClass::A,
            dev_eui: [0x11; 8],
            app_eui: [0x22; 8],
            app_key: [0x33; 16],
        }
    }

    fn otaa_frame() -> std::vec::Vec<u8> {
        let mut frame = vec![0x01, 0x00, 0x00];
        frame.extend_from_slice(&[0x11; 8]);
        frame.extend_from_slice(&[0x22; 8]);
        frame.extend_from_slice(&[0x33; 16]);
        frame
    }

    #[test]
    fn test_personalization_frame() {
        let frame = Activation::Personalization {
            network: NetworkType::Private,
            class: DeviceClass::C,
            net_id: 0x0012_3456,
            dev_addr: 0xdead_beef,
            net_s_key: [0xaa; 16],
            app_s_key: [0xbb; 16],
        }
        .encode()
        .unwrap();

        assert_eq!(frame.len(), ACTIVATION_FRAME_LEN);
        assert_eq!(
            &frame[..11],
            &[0x02, 0x01, 0x02, 0x00, 0x12, 0x34, 0x56, 0xde, 0xad, 0xbe, 0xef]
        );
        assert_eq!(&frame[11..27], &[0xaa; 16]);
        assert_eq!(&frame[27..], &[0xbb; 16]);
    }

    #[test]
    fn test_net_id_over_24_bits_rejected() {
        let mut lorawan = LoRaWan::new(Mock::new(&[]), NoopDelay::new(), SimTime::default());
        let activation = Activation::Personalization {
            network: NetworkType::Public,
            class: DeviceClass::A,
            net_id: 0x0100_0000,
            dev_addr: 1,
            net_s_key: [0; 16],
            app_s_key: [0; 16],
        };

        assert_eq!(lorawan.activate(&activation), Err(Error::InvalidParameter));
        lorawan.release().0.done();
    }

    #[test]
    fn test_activate_completes_immediately() {
        let ifc = Mock::new(&[Transaction::exchange(
            OpCode::LoraWanActivate,
            &otaa_frame(),
            &[0x00],
        )]);
        let mut lorawan = LoRaWan::new(ifc, NoopDelay::new(), SimTime::default());

        lorawan.activate(&otaa()).unwrap();
        lorawan.release().0.done();
    }

    #[test]
    fn test_activate_pending_then_completed() {
        const PENDING_POLLS: u64 = 3;
        let mut transactions = vec![Transaction::exchange(
            OpCode::LoraWanActivate,
            &otaa_frame(),
            &[0x01],
        )];
        for _ in 0..PENDING_POLLS {
            transactions.push(Transaction::exchange(OpCode::LoraWanActivate, QUERY, &[0x01]));
        }
        transactions.push(Transaction::exchange(OpCode::LoraWanActivate, QUERY, &[0x00]));
        transactions.push(Transaction::exchange(
            OpCode::IrqFlags,
            &[0x00, 0x00, 0x11, 0x30],
            &[0x00, 0x00, 0x10, 0x00],
        ));

        let time = SimTime::default();
        let mut lorawan = LoRaWan::new(Mock::new(&transactions), time.clone(), time.clone());

        lorawan.activate(&otaa()).unwrap();
        assert!(time.0.get() >= PENDING_POLLS * 1_000_000_000);
        lorawan.release().0.done();
    }

    #[test]
    fn test_activate_times_out_after_sixty_seconds() {
        let mut transactions = vec![Transaction::exchange(
            OpCode::LoraWanActivate,
            &otaa_frame(),
            &[0x01],
        )];
        // Polls at 0 s ..= 61 s; the one at 61 s exceeds the limit.
        for _ in 0..62 {
            transactions.push(Transaction::exchange(OpCode::LoraWanActivate, QUERY, &[0x01]));
        }

        let time = SimTime::default();
        let mut lorawan = LoRaWan::new(Mock::new(&transactions), time.clone(), time.clone());

        assert_eq!(lorawan.activate(&otaa()), Err(Error::Timeout));
        assert_eq!(time.0.get(), 61 * 1_000_000_000);
        lorawan.release().0.done();
    }

    #[test]
    fn test_activate_rejections() {
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::LoraWanActivate, &otaa_frame(), &[0x02]),
            Transaction::exchange(OpCode::LoraWanActivate, &otaa_frame(), &[0x07]),
            Transaction::exchange(OpCode::LoraWanActivate, &otaa_frame(), &[0x01]),
            Transaction::exchange(OpCode::LoraWanActivate, QUERY, &[0x02]),
            Transaction::exchange(OpCode::LoraWanActivate, &otaa_frame(), &[]),
        ]);
        let mut lorawan = LoRaWan::new(ifc, NoopDelay::new(), SimTime::default());

        assert_eq!(lorawan.activate(&otaa()), Err(Error::ActivationRejected));
        assert_eq!(lorawan.activate(&otaa()), Err(Error::ActivationRejected));
        assert_eq!(lorawan.activate(&otaa()), Err(Error::ActivationRejected));
        assert_eq!(lorawan.activate(&otaa()), Err(Error::IncorrectMessageSize));
        lorawan.release().0.done();
    }

    #[test]
    fn test_send_frames() {
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::LoraWanMsgSend, &[0x00, 0x01, 0x00, 0x01, 0xAA], &[0x00]),
            Transaction::exchange(OpCode::LoraWanMsgSend, &[0x02, 0x02, 0x00, 0x01, 0xBB], &[0x00]),
            Transaction::exchange(OpCode::LoraWanMsgSend, &[0x01, 0x0a, 0x05, 0x02, 0x01, 0x02], &[]),
        ]);
        let mut lorawan = LoRaWan::new(ifc, NoopDelay::new(), SimTime::default());

        lorawan.send_unconfirmed(0x00, 1, &[0xAA]).unwrap();
        lorawan.send_unconfirmed(0x03, 2, &[0xBB]).unwrap();
        lorawan.send_confirmed(0x00, 10, &[0x01, 0x02], 5).unwrap();
        lorawan.release().0.done();
    }

    #[test]
    fn test_send_validation() {
        let mut lorawan = LoRaWan::new(Mock::new(&[]), NoopDelay::new(), SimTime::default());

        assert_eq!(lorawan.send_unconfirmed(0, 0, &[1]), Err(Error::InvalidParameter));
        assert_eq!(lorawan.send_unconfirmed(0, 1, &[]), Err(Error::InvalidParameter));
        assert_eq!(
            lorawan.send_confirmed(0, 1, &[0u8; 256], 1),
            Err(Error::InvalidParameter)
        );
        lorawan.release().0.done();
    }

    #[test]
    fn test_params() {
        let ifc = Mock::new(&[
            Transaction::exchange(
                OpCode::LoraWanParam,
                &[0x03, 0x05, 0x00],
                &[0x03, 0x05, 0x04, 0xff, 0xff, 0xff, 0xfe],
            ),
            Transaction::exchange(
                OpCode::LoraWanParam,
                &[0x07, 0x05, 0x04, 0x00, 0x00, 0x01, 0x00],
                &[0x07, 0x05, 0x04, 0x00, 0x00, 0x01, 0x00],
            ),
            Transaction::exchange(OpCode::LoraWanParam, &[0x03, 0x06, 0x00], &[0x03, 0x06]),
        ]);
        let mut lorawan = LoRaWan::new(ifc, NoopDelay::new(), SimTime::default());

        assert_eq!(lorawan.param_get_i32(5), Ok(-2));
        lorawan.param_set_i32(5, 256).unwrap();
        assert_eq!(lorawan.param_get_i32(6), Err(Error::IncorrectMessageSize));
        assert_eq!(lorawan.param_get_i32(0xff), Err(Error::InvalidParameter));
        lorawan.release().0.done();
    }

    #[test]
    fn test_receive() {
        let header = [0x01, 0x02, 0x0a, 0x03, 0x50, 0x07, 0x0c, 0x03];
        let mut frame = header.to_vec();
        frame.extend_from_slice(&[0xca, 0xfe, 0x42]);
        let ifc = Mock::new(&[
            Transaction::exchange(OpCode::LoraWanMsgReceive, &[], &frame),
            Transaction::exchange(OpCode::LoraWanMsgReceive, &[], &frame),
            Transaction::exchange(OpCode::LoraWanMsgReceive, &[], &frame[..10]),
            Transaction::exchange(OpCode::LoraWanMsgReceive, &[], &header[..5]),
        ]);
        let mut lorawan = LoRaWan::new(ifc, NoopDelay::new(), SimTime::default());

        let mut buf = [0u8; 8];
        let rx = lorawan.receive(&mut buf).unwrap();
        assert_eq!(rx.flags, 0x01);
        assert_eq!(rx.tx_nb_retries, 0x02);
        assert_eq!(rx.demod_margin, 0x0a);
        assert_eq!(rx.nb_gateways, 0x03);
        assert_eq!(rx.rssi, -80);
        assert_eq!(rx.snr, 0x07);
        assert_eq!(rx.port, 0x0c);
        assert_eq!(rx.bytes_received, 3);
        assert_eq!(&buf[..3], &[0xca, 0xfe, 0x42]);

        let mut small = [0u8; 2];
        assert_eq!(lorawan.receive(&mut small), Err(Error::BufferTooSmall));
        assert_eq!(lorawan.receive(&mut buf), Err(Error::IncorrectMessageSize));
        assert_eq!(lorawan.receive(&mut buf), Err(Error::IncorrectMessageSize));
        lorawan.release().0.done();
    }
}
