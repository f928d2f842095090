//! Guest-visible I/O ports and the ICW/OCW command protocol.

use tracing::{debug, trace};

use crate::chip::{ChipSelect, InitStep, CASCADE_LINE, SPURIOUS_LINE};
use crate::error::{Result, UnsupportedMode, VpicError};
use crate::priority::{line_for_priority, priority_of};
use crate::vpic::{Locked, Vpic};

pub const MASTER_CMD: u16 = 0x20;
pub const MASTER_DATA: u16 = 0x21;
pub const SLAVE_CMD: u16 = 0xA0;
pub const SLAVE_DATA: u16 = 0xA1;
pub const MASTER_ELCR: u16 = 0x4D0;
pub const SLAVE_ELCR: u16 = 0x4D1;

/// Every port the controller answers on.
pub const PIC_PORTS: [u16; 6] = [
    MASTER_CMD,
    MASTER_DATA,
    SLAVE_CMD,
    SLAVE_DATA,
    MASTER_ELCR,
    SLAVE_ELCR,
];

// ICW1
const ICW1: u8 = 0x10;
const ICW1_IC4: u8 = 0x01;
const ICW1_SNGL: u8 = 0x02;
const ICW1_LTIM: u8 = 0x08;
// ICW2
const ICW2_VECTOR_MASK: u8 = 0xF8;
// ICW4
const ICW4_AEOI: u8 = 0x02;
const ICW4_SFNM: u8 = 0x10;
// OCW3
const OCW3: u8 = 0x08;
const OCW3_POLL: u8 = 0x04;
const OCW3_RR: u8 = 0x02;
const OCW3_RIS: u8 = 0x01;
const OCW3_ESMM: u8 = 0x40;
const OCW3_SMM: u8 = 0x20;
// OCW2
const OCW2_LEVEL_MASK: u8 = 0x07;

/// Register reached through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRegister {
    /// ICW1/OCW2/OCW3 on write, IRR/ISR/poll on read.
    Command,
    /// ICW2..ICW4 during initialization, IMR otherwise.
    Data,
    /// Edge/level control register.
    Elcr,
}

/// Maps a port number to the chip and register it addresses.
pub fn decode_port(port: u16) -> Option<(ChipSelect, PortRegister)> {
    let decoded = match port {
        MASTER_CMD => (ChipSelect::Master, PortRegister::Command),
        MASTER_DATA => (ChipSelect::Master, PortRegister::Data),
        MASTER_ELCR => (ChipSelect::Master, PortRegister::Elcr),
        SLAVE_CMD => (ChipSelect::Slave, PortRegister::Command),
        SLAVE_DATA => (ChipSelect::Slave, PortRegister::Data),
        SLAVE_ELCR => (ChipSelect::Slave, PortRegister::Elcr),
        _ => return None,
    };
    Some(decoded)
}

/// Shape of a guest port access: width in bytes and repeat count (`rep ins/outs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAccess {
    pub port: u16,
    pub size: u8,
    pub count: u32,
}

impl PortAccess {
    /// A single `in al`/`out al` access.
    pub fn byte(port: u16) -> Self {
        Self {
            port,
            size: 1,
            count: 1,
        }
    }

    fn decode(self) -> Result<(ChipSelect, PortRegister)> {
        if self.size != 1 || self.count != 1 {
            return Err(VpicError::InvalidAccess {
                port: self.port,
                size: self.size,
                count: self.count,
            });
        }
        decode_port(self.port).ok_or(VpicError::UnmappedPort(self.port))
    }
}

impl Vpic {
    /// Guest write. Only the low byte of `value` reaches the chip.
    pub fn port_write(&self, access: PortAccess, value: u32) -> Result<()> {
        let (select, reg) = access.decode()?;
        let value = value as u8;
        trace!(port = access.port, value, "i8259 write");

        let mut locked = self.lock();
        match reg {
            PortRegister::Command => locked.write_command(select, value),
            PortRegister::Data => {
                locked.write_data(select, value);
                Ok(())
            }
            PortRegister::Elcr => {
                let chip = locked.chip_mut(select);
                chip.elcr = value & chip.elcr_mask;
                Ok(())
            }
        }
    }

    /// Guest read.
    pub fn port_read(&self, access: PortAccess) -> Result<u8> {
        let (select, reg) = access.decode()?;

        let mut locked = self.lock();
        let value = match reg {
            PortRegister::Command => locked.read_command(select),
            PortRegister::Data => locked.chip(select).imr,
            PortRegister::Elcr => locked.chip(select).elcr,
        };
        trace!(port = access.port, value, "i8259 read");
        Ok(value)
    }

    pub fn write_u8(&self, port: u16, value: u8) -> Result<()> {
        self.port_write(PortAccess::byte(port), u32::from(value))
    }

    pub fn read_u8(&self, port: u16) -> Result<u8> {
        self.port_read(PortAccess::byte(port))
    }
}

impl Locked<'_> {
    fn write_command(&mut self, select: ChipSelect, value: u8) -> Result<()> {
        if value & ICW1 != 0 {
            self.write_icw1(select, value)
        } else if value & OCW3 != 0 {
            self.write_ocw3(select, value);
            Ok(())
        } else {
            self.write_ocw2(select, value);
            Ok(())
        }
    }

    /// ICW1 always resets the chip and starts the sequence. Single mode and chip-wide level
    /// sensitivity are not emulated: the chip carries on as a cascaded edge-mode pair and the
    /// request is reported back as a configuration error.
    fn write_icw1(&mut self, select: ChipSelect, value: u8) -> Result<()> {
        let chip = self.chip_mut(select);
        chip.reset();
        chip.init_step = InitStep::VectorBase;
        chip.expect_icw4 = value & ICW1_IC4 != 0;
        // Whatever was being signalled is gone with the reset.
        self.set_irq_pending(false);

        let mode = if value & ICW1_SNGL != 0 {
            UnsupportedMode::Single
        } else if value & ICW1_LTIM != 0 {
            UnsupportedMode::LevelSensitive
        } else {
            return Ok(());
        };
        Err(VpicError::UnsupportedInitMode { chip: select, mode })
    }

    fn write_ocw3(&mut self, select: ChipSelect, value: u8) {
        let chip = self.chip_mut(select);
        if value & OCW3_POLL != 0 {
            chip.poll = true;
        }
        if value & OCW3_RR != 0 {
            chip.read_isr = value & OCW3_RIS != 0;
        }
        if value & OCW3_ESMM != 0 {
            chip.special_mask = value & OCW3_SMM != 0;
        }
    }

    fn write_ocw2(&mut self, select: ChipSelect, value: u8) {
        let level = value & OCW2_LEVEL_MASK;
        let chip = self.chip_mut(select);

        match value >> 5 {
            // Rotate in automatic EOI mode: clear (0) / set (4).
            cmd @ (0 | 4) => chip.rotate_on_auto_eoi = cmd == 4,
            // Non-specific EOI (1), with rotation (5).
            cmd @ (1 | 5) => {
                let Some(priority) = priority_of(chip, chip.isr) else {
                    return;
                };
                let line = line_for_priority(chip, priority);
                chip.isr &= !(1 << line);
                if cmd == 5 {
                    chip.priority_base = (line + 1) & 7;
                }
                self.propagate();
            }
            // Specific EOI.
            3 => {
                chip.isr &= !(1 << level);
                self.propagate();
            }
            // Set priority: `level` becomes the lowest priority line.
            6 => {
                chip.priority_base = (level + 1) & 7;
                self.propagate();
            }
            // Rotate on specific EOI.
            7 => {
                chip.isr &= !(1 << level);
                chip.priority_base = (level + 1) & 7;
                self.propagate();
            }
            // 2: no operation.
            _ => {}
        }
    }

    fn write_data(&mut self, select: ChipSelect, value: u8) {
        let chip = self.chip_mut(select);
        match chip.init_step {
            InitStep::Idle => {
                chip.imr = value;
                self.propagate();
            }
            InitStep::VectorBase => {
                chip.vector_base = value & ICW2_VECTOR_MASK;
                chip.init_step = InitStep::CascadeWiring;
            }
            InitStep::CascadeWiring => {
                // ICW3 describes board wiring that is fixed in this model.
                chip.init_step = if chip.expect_icw4 {
                    InitStep::Mode
                } else {
                    debug!(chip = ?select, vector_base = chip.vector_base, "i8259 initialized");
                    InitStep::Idle
                };
            }
            InitStep::Mode => {
                chip.special_fully_nested = value & ICW4_SFNM != 0;
                chip.auto_eoi = value & ICW4_AEOI != 0;
                chip.init_step = InitStep::Idle;
                debug!(
                    chip = ?select,
                    vector_base = chip.vector_base,
                    auto_eoi = chip.auto_eoi,
                    sfnm = chip.special_fully_nested,
                    "i8259 initialized"
                );
            }
        }
    }

    fn read_command(&mut self, select: ChipSelect) -> u8 {
        if self.chip(select).poll {
            let line = self.poll_read(select);
            self.chip_mut(select).poll = false;
            return line;
        }

        let chip = self.chip(select);
        if chip.read_isr {
            chip.isr
        } else {
            chip.irr
        }
    }

    /// Poll command: the read acts as an interrupt acknowledge that clears the winning line
    /// outright and returns its number instead of a vector.
    ///
    /// A master poll that lands on the cascade input resolves through the slave and returns the
    /// global line (8..16). A slave poll returns the slave-local line. Either way a result that
    /// came through the cascade also clears the master's cascade bits.
    fn poll_read(&mut self, select: ChipSelect) -> u8 {
        let resolved = match (select, self.pending_irq(select)) {
            (_, None) => None,
            (ChipSelect::Master, Some(CASCADE_LINE)) => {
                self.clear_cascade_in_master();
                self.pending_irq(ChipSelect::Slave).map(|line| {
                    self.clear_line(ChipSelect::Slave, line);
                    8 + line
                })
            }
            (ChipSelect::Master, Some(line)) => {
                self.clear_line(ChipSelect::Master, line);
                Some(line)
            }
            (ChipSelect::Slave, Some(line)) => {
                self.clear_cascade_in_master();
                self.clear_line(ChipSelect::Slave, line);
                Some(line)
            }
        };

        self.propagate();
        resolved.unwrap_or(SPURIOUS_LINE)
    }

    fn clear_line(&mut self, select: ChipSelect, line: u8) {
        let chip = self.chip_mut(select);
        chip.irr &= !(1 << line);
        chip.isr &= !(1 << line);
    }

    fn clear_cascade_in_master(&mut self) {
        self.clear_line(ChipSelect::Master, CASCADE_LINE);
    }
}
