//! Guest port bindings for the virtual 8259 pair.
//!
//! This is the guest boundary: every error the controller reports is logged here and the
//! access is absorbed, so the guest never sees a fault from PIC port I/O.

use std::sync::Arc;

use hvm_vpic::ports::{MASTER_CMD, MASTER_ELCR, SLAVE_CMD, SLAVE_ELCR};
use hvm_vpic::{PortAccess, Vpic, VpicError};
use tracing::{error, warn};

use crate::bus::{IoDirection, IoPortBus, IoRequest, PortIoHandler};
use crate::error::Result;

/// Port handler for 0x20/0x21, 0xA0/0xA1, 0x4D0 and 0x4D1.
pub struct VpicPorts {
    vpic: Arc<Vpic>,
}

impl VpicPorts {
    pub fn new(vpic: Arc<Vpic>) -> Self {
        Self { vpic }
    }
}

fn report(err: &VpicError) {
    match err {
        VpicError::UnsupportedInitMode { .. } => error!("i8259: {err}"),
        _ => warn!("i8259: {err}"),
    }
}

impl PortIoHandler for VpicPorts {
    fn handle(&self, req: &mut IoRequest) {
        let access = PortAccess {
            port: req.port,
            size: req.size,
            count: req.count,
        };

        match req.direction {
            IoDirection::Write => {
                if let Err(err) = self.vpic.port_write(access, req.data & 0xFF) {
                    report(&err);
                }
            }
            IoDirection::Read => {
                req.data = match self.vpic.port_read(access) {
                    Ok(value) => u32::from(value),
                    Err(err) => {
                        report(&err);
                        0
                    }
                };
            }
        }
    }
}

/// Claims the PIC's command/data pairs and both ELCR ports on `bus` for `vpic`.
pub fn register_vpic_ports(bus: &mut IoPortBus, vpic: Arc<Vpic>) -> Result<()> {
    let handler: Arc<dyn PortIoHandler> = Arc::new(VpicPorts::new(vpic));
    bus.register_range(MASTER_CMD, 2, handler.clone())?;
    bus.register_range(SLAVE_CMD, 2, handler.clone())?;
    bus.register_range(MASTER_ELCR, 1, handler.clone())?;
    bus.register_range(SLAVE_ELCR, 1, handler)?;
    Ok(())
}
