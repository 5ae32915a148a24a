//! Symphony Link connection driver.
//!
//! This module provides [`SymphonyLink`], which brings a module onto a Symphony Link
//! network and keeps track of whether it can accept an uplink. The driver is polled:
//! nothing happens unless [`update()`](SymphonyLink::update) (or an operation that calls
//! it) is invoked, and every call performs a handful of blocking host interface exchanges.
//!
//! ## State machine
//!
//! ```text
//!   Init ──configure ok──▶ Connecting ──Initializing──▶ LinkInit
//!    ▲                        │  ▲                        │
//!    │                        │  └──IdleDisconnected──────┘
//!    ├──────Error─────────────┴───────────────────────────┤
//!    │                                        IdleConnected
//!    │                                                    ▼
//!    └──────connection lost────────────────────────── ReadyToSend
//!                                                     │      ▲
//!                                         Transmitting│      │Tx done
//!                                                     ▼      │
//!                                                   SendingFrame ⟲ Tx error
//! ```
//!
//! Each update first reads the interrupt flags with a clear-all mask and refreshes the
//! module, transmit and receive states, then feeds that [`Status`] to the pure
//! transition function [`ConnectionState::next`]. The transition may ask the driver to
//! apply the network configuration or to clear the Tx-error flag.
//!
//! ## Example
//!
//! ```ignore
//! use ll_ifc::driver::{ConnectionState, SymphonyLink};
//! use ll_ifc::symphony::{DownlinkMode, SymphonyConfig};
//!
//! let mut link = SymphonyLink::new(uart, delay);
//! link.begin(SymphonyConfig {
//!     net_token: 0x4f50454e,
//!     app_token,
//!     downlink_mode: DownlinkMode::Mailbox,
//!     qos: 0,
//! })?;
//! link.wait_for(ConnectionState::ReadyToSend, 600)?;
//! nb::block!(link.write(b"hello"))?;
//! ```
//!
//! ## Failures
//!
//! Any failed exchange while refreshing the status drops the driver back to
//! [`ConnectionState::Init`] and returns the error; the next update starts over by
//! reconfiguring the module. A rejected configuration is only logged, and the driver
//! retries it on the next update.

use embedded_hal::delay::DelayNs;

use crate::consts::{
    BEGIN_SETTLE_DELAY_MS, MAC_MODE_SWITCH_DELAY_MS, MAX_QOS, MAX_SYMPHONY_PAYLOAD_LEN,
    SEND_POLL_INTERVAL_MS,
};
use crate::error::Error;
use crate::ifc::{HostInterface, IrqFlags, MacMode, irq_flags, mac_mode_get, mac_mode_set};
use crate::symphony::{
    Antenna, ModuleState, ReceivedMessage, RxState, SymphonyConfig, TxState, antenna_set,
    config_set, get_state, message_send_ack, retrieve_message,
};

/// Connection state of the [`SymphonyLink`] driver.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ConnectionState {
    /// The module has not been configured yet, or lost its configuration.
    #[default]
    Init,
    /// Configuration was applied; waiting for the module to start joining.
    Connecting,
    /// The module is joining a gateway.
    LinkInit,
    /// Connected and idle: an uplink may be queued.
    ReadyToSend,
    /// An uplink is in flight.
    SendingFrame,
}

/// Snapshot of the module status registers taken at the start of an update.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Status {
    /// Module state.
    pub module: ModuleState,
    /// Transmit state.
    pub tx: TxState,
    /// Receive state.
    pub rx: RxState,
    /// Interrupt flags that were set before they were cleared.
    pub irq: IrqFlags,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            module: ModuleState::IdleDisconnected,
            tx: TxState::Idle,
            rx: RxState::NoMessage,
            irq: IrqFlags::NONE,
        }
    }
}

/// Side effect a transition asks the driver to perform.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Action {
    /// Nothing to do.
    None,
    /// Apply the stored network configuration. The transition only takes effect if
    /// the configuration is accepted.
    Configure,
    /// Clear the Tx-error interrupt flag.
    ClearTxError,
}

/// Result of [`ConnectionState::next`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Transition {
    /// State to move to.
    pub next: ConnectionState,
    /// Side effect to perform first.
    pub action: Action,
}

impl Transition {
    fn to(next: ConnectionState) -> Self {
        Self {
            next,
            action: Action::None,
        }
    }

    fn with(next: ConnectionState, action: Action) -> Self {
        Self { next, action }
    }
}

impl ConnectionState {
    /// Computes the transition out of `self` for the given status snapshot.
    ///
    /// Pure: performs no I/O.
    ///
    /// ```rust
    /// use ll_ifc::driver::{Action, ConnectionState, Status};
    /// use ll_ifc::ifc::IrqFlags;
    /// use ll_ifc::symphony::{ModuleState, RxState, TxState};
    ///
    /// let status = Status {
    ///     module: ModuleState::IdleConnected,
    ///     tx: TxState::Success,
    ///     rx: RxState::NoMessage,
    ///     irq: IrqFlags::TX_DONE,
    /// };
    /// let transition = ConnectionState::SendingFrame.next(&status);
    /// assert_eq!(transition.next, ConnectionState::ReadyToSend);
    /// assert_eq!(transition.action, Action::ClearTxError);
    /// ```
    pub fn next(self, status: &Status) -> Transition {
        match self {
            ConnectionState::Init => {
                Transition::with(ConnectionState::Connecting, Action::Configure)
            }
            ConnectionState::Connecting | ConnectionState::LinkInit => match status.module {
                ModuleState::Initializing => Transition::to(ConnectionState::LinkInit),
                ModuleState::IdleConnected => Transition::to(ConnectionState::ReadyToSend),
                ModuleState::Error => Transition::to(ConnectionState::Init),
                ModuleState::IdleDisconnected | ModuleState::Unknown(_) => Transition::to(self),
            },
            ConnectionState::ReadyToSend => {
                if status.module != ModuleState::IdleConnected {
                    Transition::to(ConnectionState::Init)
                } else if status.tx == TxState::Transmitting {
                    Transition::to(ConnectionState::SendingFrame)
                } else {
                    Transition::to(self)
                }
            }
            ConnectionState::SendingFrame => {
                if status.irq.contains(IrqFlags::TX_DONE) {
                    Transition::with(ConnectionState::ReadyToSend, Action::ClearTxError)
                } else if status.irq.contains(IrqFlags::TX_ERROR) {
                    Transition::with(ConnectionState::SendingFrame, Action::ClearTxError)
                } else {
                    Transition::to(self)
                }
            }
        }
    }
}

/// A Symphony Link module driven through its host interface.
///
/// ## Type Parameters
///
/// - `I`: the [`HostInterface`] carrying frames to the module
/// - `D`: an [`embedded_hal::delay::DelayNs`] used for the settle and poll delays
///
/// ## Notes
///
/// - The cached status is only as fresh as the last [`update()`](SymphonyLink::update).
/// - [`write()`](SymphonyLink::write) polls until the module reports the uplink in flight
///   and has no internal time limit; use [`wait_for()`](SymphonyLink::wait_for) where a
///   bound is needed.
#[derive(Debug)]
pub struct SymphonyLink<I, D> {
    ifc: I,
    delay: D,
    config: SymphonyConfig,
    state: ConnectionState,
    status: Status,
}

impl<I, D> SymphonyLink<I, D>
where
    I: HostInterface,
    D: DelayNs,
{
    /// Creates a driver in [`ConnectionState::Init`] with a default configuration.
    ///
    /// No exchange takes place until [`begin()`](SymphonyLink::begin) or
    /// [`update()`](SymphonyLink::update) is called.
    pub fn new(ifc: I, delay: D) -> Self {
        Self {
            ifc,
            delay,
            config: SymphonyConfig::default(),
            state: ConnectionState::Init,
            status: Status::default(),
        }
    }

    /// Puts the module into Symphony Link mode, stores `config` and runs the first update.
    ///
    /// If the module runs another MAC it is switched over, which reboots it; the driver
    /// then waits two seconds for the host interface to come back.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if `config.qos` exceeds 15. Nothing is sent.
    /// - Any error from reading the flags, the MAC mode, switching it, or the first update.
    pub fn begin(&mut self, config: SymphonyConfig) -> Result<ConnectionState, Error> {
        if config.qos > MAX_QOS {
            return Err(Error::InvalidParameter);
        }

        self.status.irq = irq_flags(&mut self.ifc, IrqFlags::NONE)?;

        let mode = mac_mode_get(&mut self.ifc)?;
        if mode != MacMode::SymphonyLink {
            log::info!("switching module from {:?} to Symphony Link", mode);
            mac_mode_set(&mut self.ifc, MacMode::SymphonyLink)?;
            self.delay.delay_ms(MAC_MODE_SWITCH_DELAY_MS);
        }

        self.config = config;
        self.state = ConnectionState::Init;
        self.delay.delay_ms(BEGIN_SETTLE_DELAY_MS);
        self.update()
    }

    /// Clears every interrupt flag and refreshes the cached status registers.
    pub fn update_status(&mut self) -> Result<Status, Error> {
        let irq = irq_flags(&mut self.ifc, IrqFlags::ALL)?;
        let (module, tx, rx) = get_state(&mut self.ifc)?;
        self.status = Status {
            module,
            tx,
            rx,
            irq,
        };
        log::debug!("status {:?}", self.status);
        Ok(self.status)
    }

    /// Refreshes the status and advances the state machine by one step.
    ///
    /// Returns the state after the step.
    pub fn update(&mut self) -> Result<ConnectionState, Error> {
        if let Err(e) = self.update_status() {
            log::warn!("status refresh failed: {}", e);
            self.state = ConnectionState::Init;
            return Err(e);
        }

        let transition = self.state.next(&self.status);
        match transition.action {
            Action::None => {}
            Action::Configure => {
                if let Err(e) = config_set(&mut self.ifc, &self.config) {
                    log::warn!("configuration rejected: {}", e);
                    return Ok(self.state);
                }
                log::info!("configuration applied");
            }
            Action::ClearTxError => {
                if self.status.irq.contains(IrqFlags::TX_ERROR) {
                    log::warn!("uplink failed");
                }
                if let Err(e) = irq_flags(&mut self.ifc, IrqFlags::TX_ERROR) {
                    self.state = ConnectionState::Init;
                    return Err(e);
                }
            }
        }

        self.enter(transition.next);
        Ok(self.state)
    }

    fn enter(&mut self, next: ConnectionState) {
        if next == self.state {
            return;
        }
        match (self.state, next) {
            (ConnectionState::ReadyToSend, ConnectionState::Init) => {
                log::warn!("connection lost")
            }
            (_, ConnectionState::Init) => log::warn!("module error, reinitializing"),
            (_, ConnectionState::ReadyToSend) => log::info!("ready to send"),
            (from, to) => log::debug!("{:?} -> {:?}", from, to),
        }
        self.state = next;
    }

    /// Queues an acknowledged uplink and waits until the module starts sending it.
    ///
    /// The payload must hold 1 to 256 bytes; anything else fails with
    /// [`Error::InvalidParameter`] before the module is contacted.
    ///
    /// Returns [`nb::Error::WouldBlock`] when the driver is not in
    /// [`ConnectionState::ReadyToSend`] after a fresh update.
    ///
    /// Once the uplink is queued this polls until the driver reaches
    /// [`ConnectionState::SendingFrame`], with no time limit. If the module finishes the
    /// uplink between two updates, or the driver falls back to
    /// [`ConnectionState::Init`], that state is never observed and the call does not
    /// return. Callers that need a bound should queue with
    /// [`message_send_ack`](crate::symphony::message_send_ack) and poll with
    /// [`wait_for()`](SymphonyLink::wait_for) instead.
    pub fn write(&mut self, payload: &[u8]) -> nb::Result<(), Error> {
        if payload.is_empty() || payload.len() > MAX_SYMPHONY_PAYLOAD_LEN {
            return Err(nb::Error::Other(Error::InvalidParameter));
        }
        if self.update()? != ConnectionState::ReadyToSend {
            return Err(nb::Error::WouldBlock);
        }

        if let Err(e) = message_send_ack(&mut self.ifc, payload) {
            log::warn!("uplink not queued: {}", e);
            let _ = self.update()?;
            return Err(nb::Error::Other(e));
        }

        while self.update()? != ConnectionState::SendingFrame {
            self.delay.delay_ms(SEND_POLL_INTERVAL_MS);
        }
        Ok(())
    }

    /// Retrieves a downlink into `buf` if the last update reported one waiting.
    ///
    /// Returns [`nb::Error::WouldBlock`] otherwise. The payload is truncated to `buf.len()`.
    pub fn read(&mut self, buf: &mut [u8]) -> nb::Result<ReceivedMessage, Error> {
        if self.status.rx != RxState::ReceivedMessage {
            return Err(nb::Error::WouldBlock);
        }
        retrieve_message(&mut self.ifc, buf).map_err(|e| {
            log::warn!("downlink retrieval failed: {}", e);
            nb::Error::Other(e)
        })
    }

    /// Selects the antenna port.
    pub fn set_antenna(&mut self, antenna: Antenna) -> Result<(), Error> {
        antenna_set(&mut self.ifc, antenna)
    }

    /// Updates until `target` is reached, at most `max_polls` times.
    ///
    /// Fails with [`Error::Timeout`] if the state never matched.
    pub fn wait_for(&mut self, target: ConnectionState, max_polls: u32) -> Result<(), Error> {
        for _ in 0..max_polls {
            if self.update()? == target {
                return Ok(());
            }
            self.delay.delay_ms(SEND_POLL_INTERVAL_MS);
        }
        Err(Error::Timeout)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Status registers read by the last update.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Module state read by the last update.
    pub fn module_state(&self) -> ModuleState {
        self.status.module
    }

    /// Transmit state read by the last update.
    pub fn tx_state(&self) -> TxState {
        self.status.tx
    }

    /// Receive state read by the last update.
    pub fn rx_state(&self) -> RxState {
        self.status.rx
    }

    /// Interrupt flags read by the last update.
    pub fn irq_flags(&self) -> IrqFlags {
        self.status.irq
    }

    /// Network configuration applied on (re)connection.
    pub fn config(&self) -> &SymphonyConfig {
        &self.config
    }

    /// Returns the host interface and delay.
    pub fn release(self) -> (I, D) {
        (self.ifc, self.delay)
    }
}
