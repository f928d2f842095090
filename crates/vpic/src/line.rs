//! IRQ input lines as seen by device backends.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, VpicError};
use crate::vpic::Vpic;

/// Number of ISA lines behind the cascaded pair.
pub const NUM_ISA_IRQS: u8 = 16;

impl Vpic {
    /// Drives global ISA line `irq` (0..16) to `level`.
    ///
    /// This is the only state change device models can make; everything else goes through the
    /// guest's port accesses.
    pub fn raise_or_lower(&self, irq: u8, level: bool) -> Result<()> {
        if irq >= NUM_ISA_IRQS {
            return Err(VpicError::InvalidIrq(irq));
        }
        trace!(irq, level, "i8259 line");
        self.lock().set_irq(irq, level);
        Ok(())
    }
}

/// Something device models can signal ISA interrupts into.
pub trait IsaIrqSink {
    fn set_irq(&self, irq: u8, level: bool) -> Result<()>;

    fn raise_irq(&self, irq: u8) -> Result<()> {
        self.set_irq(irq, true)
    }

    fn lower_irq(&self, irq: u8) -> Result<()> {
        self.set_irq(irq, false)
    }

    /// One edge: high then low. A level-triggered line ends up deasserted.
    fn pulse_irq(&self, irq: u8) -> Result<()> {
        self.set_irq(irq, true)?;
        self.set_irq(irq, false)
    }
}

impl IsaIrqSink for Vpic {
    fn set_irq(&self, irq: u8, level: bool) -> Result<()> {
        self.raise_or_lower(irq, level)
    }
}

impl<T: IsaIrqSink + ?Sized> IsaIrqSink for Arc<T> {
    fn set_irq(&self, irq: u8, level: bool) -> Result<()> {
        (**self).set_irq(irq, level)
    }
}
