//! Virtual dual Intel 8259A programmable interrupt controller for HVM guests.
//!
//! A [`Vpic`] models the master/slave pair of a PC: the slave's output feeds master input 2,
//! giving 16 ISA lines. Device models drive lines through [`Vpic::raise_or_lower`] (or the
//! [`IsaIrqSink`] trait), the guest programs the chips through the ports in [`ports`], and the
//! vCPU takes the next vector with [`Vpic::take_pending_interrupt`].
//!
//! ```
//! use hvm_vpic::{ports, Vpic};
//!
//! let pic = Vpic::default();
//! for byte in [0x11, 0x08, 0x04, 0x01] {
//!     let port = if byte == 0x11 { ports::MASTER_CMD } else { ports::MASTER_DATA };
//!     pic.write_u8(port, byte).unwrap();
//! }
//! pic.raise_or_lower(0, true).unwrap();
//!
//! let ack = pic.take_pending_interrupt(&true).unwrap();
//! assert_eq!(ack.vector, 0x08);
//! ```

#![forbid(unsafe_code)]

pub mod chip;
pub mod config;
pub mod error;
pub mod inject;
pub mod line;
pub mod ports;
mod priority;
pub mod state;
mod vpic;

pub use chip::{Chip, ChipSelect, InitStep, CASCADE_LINE, SPURIOUS_LINE};
pub use config::VpicConfig;
pub use error::{Result, UnsupportedMode, VpicError};
pub use inject::{DeliveryMode, ExtIntGate, ExtIntVector, RedirectionTable};
pub use line::{IsaIrqSink, NUM_ISA_IRQS};
pub use ports::{PortAccess, PortRegister};
pub use state::VpicState;
pub use vpic::Vpic;
