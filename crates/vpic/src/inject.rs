//! CPU-facing side: handing the next vector to the interrupt injection path, and the few
//! queries the rest of the platform makes against PIC state.

use crate::chip::ChipSelect;
use crate::error::{Result, VpicError};
use crate::line::NUM_ISA_IRQS;
use crate::vpic::Vpic;

/// How a vector reaches the local APIC: from a redirection entry, or from an INTA cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    Fixed,
    /// Externally vectored: the vector comes from an 8259 INTA cycle.
    ExtInt,
}

/// Result of an INTA cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtIntVector {
    pub vector: u8,
    /// Global ISA line the vector belongs to (7 or 15 for spurious acknowledges).
    pub irq: u8,
    pub mode: DeliveryMode,
}

/// Local APIC view used to decide whether PIC output may be taken at all (LINT0 unmasked and
/// programmed for ExtINT, or the APIC globally disabled).
pub trait ExtIntGate {
    fn accepts_pic_interrupt(&self) -> bool;
}

impl ExtIntGate for bool {
    fn accepts_pic_interrupt(&self) -> bool {
        *self
    }
}

/// Read-only view of the IO-APIC redirection table.
pub trait RedirectionTable {
    fn is_masked(&self, gsi: u8) -> bool;
    fn vector(&self, gsi: u8) -> u8;
}

impl Vpic {
    /// Entry used by the vCPU before a VM entry.
    ///
    /// Returns `None` when the local APIC refuses ExtINT, or when nothing has been flagged since
    /// the last call. Taking the flag and acknowledging are separate steps, so a request that
    /// went away in between acknowledges as spurious.
    pub fn take_pending_interrupt(&self, gate: &impl ExtIntGate) -> Option<ExtIntVector> {
        if !gate.accepts_pic_interrupt() {
            return None;
        }
        if !self.take_irq_pending() {
            return None;
        }
        Some(self.acknowledge())
    }

    /// Whether ISA line `irq` can currently reach a CPU through either controller.
    pub fn is_irq_enabled(&self, irq: u8, ioapic: &impl RedirectionTable) -> Result<bool> {
        if irq >= NUM_ISA_IRQS {
            return Err(VpicError::InvalidIrq(irq));
        }
        if !ioapic.is_masked(irq) {
            return Ok(true);
        }
        let imr = self.lock().chip(ChipSelect::for_irq(irq)).imr;
        Ok(imr & (1 << (irq & 7)) == 0)
    }

    /// Whether `vector`, delivered with `mode`, is the periodic timer's interrupt.
    ///
    /// Only a timer wired to IRQ 0 is recognised. Its vector is the master's base when it
    /// arrives through the PIC and redirection entry 0's vector otherwise.
    pub fn is_periodic_irq(
        &self,
        timer_irq: u8,
        vector: u8,
        mode: DeliveryMode,
        ioapic: &impl RedirectionTable,
    ) -> bool {
        if timer_irq != 0 {
            return false;
        }
        let timer_vector = match mode {
            DeliveryMode::ExtInt => self.lock().chip(ChipSelect::Master).vector_base,
            _ => ioapic.vector(0),
        };
        vector == timer_vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MASTER_CMD, MASTER_DATA, SLAVE_DATA};

    struct Table {
        masked: u16,
        vectors: [u8; 16],
    }

    impl RedirectionTable for Table {
        fn is_masked(&self, gsi: u8) -> bool {
            self.masked & (1 << gsi) != 0
        }

        fn vector(&self, gsi: u8) -> u8 {
            self.vectors[usize::from(gsi)]
        }
    }

    fn all_masked() -> Table {
        Table {
            masked: 0xFFFF,
            vectors: [0; 16],
        }
    }

    fn init_master(pic: &Vpic, base: u8) {
        pic.write_u8(MASTER_CMD, 0x11).unwrap();
        pic.write_u8(MASTER_DATA, base).unwrap();
        pic.write_u8(MASTER_DATA, 0x04).unwrap();
        pic.write_u8(MASTER_DATA, 0x01).unwrap();
    }

    #[test]
    fn gate_and_flag_both_required() {
        let pic = Vpic::default();
        init_master(&pic, 0x08);
        pic.raise_or_lower(0, true).unwrap();

        assert_eq!(pic.take_pending_interrupt(&false), None);
        assert!(pic.irq_pending(), "a refused gate must not consume the flag");

        let ack = pic.take_pending_interrupt(&true).unwrap();
        assert_eq!(ack.vector, 0x08);
        assert_eq!(ack.mode, DeliveryMode::ExtInt);

        assert_eq!(pic.take_pending_interrupt(&true), None);
    }

    #[test]
    fn irq_enabled_falls_back_to_pic_mask() {
        let pic = Vpic::default();
        pic.write_u8(MASTER_DATA, 0x02).unwrap();
        pic.write_u8(SLAVE_DATA, 0x01).unwrap();
        let table = all_masked();

        assert_eq!(pic.is_irq_enabled(0, &table), Ok(true));
        assert_eq!(pic.is_irq_enabled(1, &table), Ok(false));
        assert_eq!(pic.is_irq_enabled(8, &table), Ok(false));
        assert_eq!(pic.is_irq_enabled(9, &table), Ok(true));

        let open = Table {
            masked: 0,
            vectors: [0; 16],
        };
        assert_eq!(pic.is_irq_enabled(1, &open), Ok(true));
        assert_eq!(pic.is_irq_enabled(16, &open), Err(VpicError::InvalidIrq(16)));
    }

    #[test]
    fn periodic_irq_matches_per_delivery_path() {
        let pic = Vpic::default();
        init_master(&pic, 0x20);
        let mut table = all_masked();
        table.vectors[0] = 0x30;

        assert!(pic.is_periodic_irq(0, 0x20, DeliveryMode::ExtInt, &table));
        assert!(!pic.is_periodic_irq(0, 0x30, DeliveryMode::ExtInt, &table));
        assert!(pic.is_periodic_irq(0, 0x30, DeliveryMode::Fixed, &table));
        assert!(!pic.is_periodic_irq(8, 0x20, DeliveryMode::ExtInt, &table));
    }
}
