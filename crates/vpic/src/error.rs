use thiserror::Error;

use crate::chip::ChipSelect;

pub type Result<T> = std::result::Result<T, VpicError>;

/// ICW1 modes the emulated controller does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedMode {
    /// ICW1.SNGL: no slave present.
    Single,
    /// ICW1.LTIM: level-sensitive inputs for the whole chip.
    LevelSensitive,
}

impl std::fmt::Display for UnsupportedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedMode::Single => f.write_str("single mode"),
            UnsupportedMode::LevelSensitive => f.write_str("level sensitive irq"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VpicError {
    #[error("{chip:?} i8259: {mode} not supported")]
    UnsupportedInitMode {
        chip: ChipSelect,
        mode: UnsupportedMode,
    },

    #[error("wrong PIC access size at port {port:#x} (size={size}, count={count})")]
    InvalidAccess { port: u16, size: u8, count: u32 },

    #[error("port {0:#x} is not a PIC port")]
    UnmappedPort(u16),

    #[error("ISA irq {0} out of range (expected 0..16)")]
    InvalidIrq(u8),

    #[error("invalid PIC state: {0}")]
    InvalidState(&'static str),
}
