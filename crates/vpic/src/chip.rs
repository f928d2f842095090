//! Register file of a single 8259A.

use serde::{Deserialize, Serialize};

/// Master input that the slave's INT output is wired to.
pub const CASCADE_LINE: u8 = 2;
pub(crate) const CASCADE_BIT: u8 = 1 << CASCADE_LINE;

/// Line reported by a poll or acknowledge that found nothing to deliver.
pub const SPURIOUS_LINE: u8 = 7;

#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChipSelect {
    Master = 0,
    Slave = 1,
}

impl ChipSelect {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Chip that owns global ISA line `irq` (0..16).
    pub fn for_irq(irq: u8) -> Self {
        if irq < 8 {
            ChipSelect::Master
        } else {
            ChipSelect::Slave
        }
    }
}

/// Position in the ICW1..ICW4 initialization sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitStep {
    /// Not initializing; data port writes go to the IMR.
    #[default]
    Idle,
    /// ICW1 seen, waiting for ICW2 (vector base).
    VectorBase,
    /// Waiting for ICW3 (cascade wiring).
    CascadeWiring,
    /// Waiting for ICW4 (mode). Only reached when ICW1 asked for it.
    Mode,
}

impl InitStep {
    pub fn as_u8(self) -> u8 {
        match self {
            InitStep::Idle => 0,
            InitStep::VectorBase => 1,
            InitStep::CascadeWiring => 2,
            InitStep::Mode => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    pub(crate) irr: u8,
    /// Raw level last presented on each input, for edge detection.
    pub(crate) last_level: u8,
    pub(crate) imr: u8,
    pub(crate) isr: u8,
    /// Line that currently has the lowest priority is `priority_base - 1`.
    pub(crate) priority_base: u8,
    pub(crate) vector_base: u8,
    pub(crate) read_isr: bool,
    pub(crate) poll: bool,
    pub(crate) special_mask: bool,
    pub(crate) auto_eoi: bool,
    pub(crate) rotate_on_auto_eoi: bool,
    pub(crate) special_fully_nested: bool,
    pub(crate) init_step: InitStep,
    pub(crate) expect_icw4: bool,
    pub(crate) elcr: u8,
    pub(crate) elcr_mask: u8,
}

impl Chip {
    pub(crate) fn new(elcr_mask: u8, power_on_elcr: u8) -> Self {
        let mut chip = Self {
            irr: 0,
            last_level: 0,
            imr: 0,
            isr: 0,
            priority_base: 0,
            vector_base: 0,
            read_isr: false,
            poll: false,
            special_mask: false,
            auto_eoi: false,
            rotate_on_auto_eoi: false,
            special_fully_nested: false,
            init_step: InitStep::Idle,
            expect_icw4: false,
            elcr: power_on_elcr & elcr_mask,
            elcr_mask,
        };
        chip.reset();
        chip
    }

    /// Soft reset. ELCR wiring survives.
    pub(crate) fn reset(&mut self) {
        self.last_level = 0;
        self.irr = 0;
        self.imr = 0;
        self.isr = 0;
        self.priority_base = 0;
        self.vector_base = 0;
        self.read_isr = false;
        self.poll = false;
        self.special_mask = false;
        self.init_step = InitStep::Idle;
        self.auto_eoi = false;
        self.rotate_on_auto_eoi = false;
        self.special_fully_nested = false;
        self.expect_icw4 = false;
    }

    pub(crate) fn is_level_triggered(&self, line: u8) -> bool {
        self.elcr & (1 << line) != 0
    }

    /// Presents `level` on input `line`.
    ///
    /// Level-triggered inputs mirror the level into IRR. Edge-triggered inputs latch IRR on a
    /// low-to-high transition only; the latch is cleared by acknowledge, EOI or reset.
    pub(crate) fn update_line(&mut self, line: u8, level: bool) {
        debug_assert!(line < 8);
        let bit = 1u8 << line;

        if self.is_level_triggered(line) {
            if level {
                self.irr |= bit;
                self.last_level |= bit;
            } else {
                self.irr &= !bit;
                self.last_level &= !bit;
            }
        } else if level {
            if self.last_level & bit == 0 {
                self.irr |= bit;
            }
            self.last_level |= bit;
        } else {
            self.last_level &= !bit;
        }
    }

    /// Drives a full low-high-low pulse into `line` as an edge, whatever its ELCR setting.
    pub(crate) fn pulse_edge(&mut self, line: u8) {
        let bit = 1u8 << line;
        if self.last_level & bit == 0 {
            self.irr |= bit;
        }
        self.last_level &= !bit;
    }

    /// INTA cycle for `line`: mark it in service (or auto-EOI it) and drop an edge latch.
    pub(crate) fn intack(&mut self, line: u8) {
        let bit = 1u8 << line;
        if self.auto_eoi {
            if self.rotate_on_auto_eoi {
                self.priority_base = (line + 1) & 7;
            }
        } else {
            self.isr |= bit;
        }

        // A level-triggered request stays asserted until the device drops it.
        if !self.is_level_triggered(line) {
            self.irr &= !bit;
        }
    }

    pub fn irr(&self) -> u8 {
        self.irr
    }

    pub fn isr(&self) -> u8 {
        self.isr
    }

    pub fn imr(&self) -> u8 {
        self.imr
    }

    pub fn elcr(&self) -> u8 {
        self.elcr
    }

    pub fn elcr_mask(&self) -> u8 {
        self.elcr_mask
    }

    pub fn priority_base(&self) -> u8 {
        self.priority_base
    }

    pub fn vector_base(&self) -> u8 {
        self.vector_base
    }

    pub fn init_step(&self) -> InitStep {
        self.init_step
    }

    pub fn expects_icw4(&self) -> bool {
        self.expect_icw4
    }

    pub fn reads_isr(&self) -> bool {
        self.read_isr
    }

    pub fn poll_mode(&self) -> bool {
        self.poll
    }

    pub fn special_mask_mode(&self) -> bool {
        self.special_mask
    }

    pub fn auto_eoi(&self) -> bool {
        self.auto_eoi
    }

    pub fn rotate_on_auto_eoi(&self) -> bool {
        self.rotate_on_auto_eoi
    }

    pub fn special_fully_nested(&self) -> bool {
        self.special_fully_nested
    }
}
