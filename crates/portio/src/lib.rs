//! Guest I/O port routing for HVM device models.
//!
//! [`IoPortBus`] maps trapped port accesses to [`PortIoHandler`]s. The virtual 8259 pair from
//! `hvm-vpic` is wired in with [`register_vpic_ports`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use hvm_portio::{register_vpic_ports, IoPortBus};
//! use hvm_vpic::Vpic;
//!
//! let vpic = Arc::new(Vpic::default());
//! let mut bus = IoPortBus::new();
//! register_vpic_ports(&mut bus, vpic.clone()).unwrap();
//!
//! bus.write_u8(0x21, 0xFB).unwrap();
//! assert_eq!(bus.read_u8(0x21).unwrap(), 0xFB);
//! ```

#![forbid(unsafe_code)]

mod bus;
mod error;
mod pic;

pub use bus::{IoDirection, IoPortBus, IoRequest, PortIoHandler};
pub use error::{PortIoError, Result};
pub use pic::{register_vpic_ports, VpicPorts};
