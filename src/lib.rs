//! # ll-ifc
//!
//! A portable, no_std Rust driver for the host interface of Link Labs radio modules.
//!
//! The module is reached through a byte transport (usually a UART) and speaks a private
//! request/response protocol. This crate turns typed calls into frames and validates the
//! module's answers for the three protocols the module carries:
//!
//! - **Symphony Link**: [`driver::SymphonyLink`] brings the module onto a network and
//!   sends acknowledged uplinks; [`symphony`] holds the individual commands.
//! - **Ensemble**: [`ensemble::Ensemble`] configures numbered properties and pulls stored
//!   messages and mail.
//! - **LoRaWAN**: [`lorawan::LoRaWan`] activates the device and sends and receives frames.
//!
//! The transport itself is supplied by the application through [`ifc::HostInterface`].
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and provides `timer::StdClock` |
//! | `defmt-0-3` | Derives `defmt::Format` on the protocol types |
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade.
//!
//! ## Usage
//!
//! ```rust
//! use ll_ifc::ensemble::Ensemble;
//! use ll_ifc::ifc::{HostInterface, OpCode};
//! use ll_ifc::property::{Property, PropertyValue};
//!
//! # struct Uart;
//! # impl HostInterface for Uart {
//! #     fn exchange(&mut self, _op: OpCode, _req: &[u8], rsp: &mut [u8]) -> Result<usize, i32> {
//! #         let frame = [0x00, 0x00, 0x36, 0xb0, 0x00];
//! #         rsp[..frame.len()].copy_from_slice(&frame);
//! #         Ok(frame.len())
//! #     }
//! # }
//! # fn main() -> Result<(), ll_ifc::Error> {
//! # let uart = Uart;
//! let mut ensemble = Ensemble::new(uart);
//! let frequency = ensemble.get_property(Property::Frequency)?;
//! assert_eq!(frequency, PropertyValue::U32(0x0036_b000));
//! # Ok(())
//! # }
//! ```
//!
//! ```ignore
//! use ll_ifc::driver::SymphonyLink;
//!
//! let mut link = SymphonyLink::new(uart, delay);
//! link.begin(config)?;
//! loop {
//!     link.update()?;
//!     delay.delay_ms(100);
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - Every operation blocks for at least one transport round trip.
//! - LoRaWAN activation blocks for up to a minute while it polls the module.
//! - The driver types own their transport; only one exchange is ever in flight.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub use heapless;

pub mod consts;
pub mod driver;
pub mod encoding;
pub mod ensemble;
pub mod error;
pub mod ifc;
pub mod lorawan;
pub mod property;
pub mod symphony;
pub mod timer;

pub use error::{Error, Nack};
