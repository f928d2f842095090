use serde::{Deserialize, Serialize};

/// ELCR bits software may set on the master: lines 0 (timer), 1 (keyboard) and 2 (cascade) are
/// wired edge-triggered.
pub const MASTER_ELCR_MASK: u8 = 0xF8;
/// ELCR bits software may set on the slave: lines 8 (RTC) and 13 (FPU) are wired edge-triggered.
pub const SLAVE_ELCR_MASK: u8 = 0xDE;

/// Construction-time wiring of a [`crate::Vpic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpicConfig {
    /// Per-chip writable ELCR mask, indexed master then slave.
    pub elcr_mask: [u8; 2],
    /// ELCR value each chip starts with. Masked by `elcr_mask` before use.
    pub power_on_elcr: [u8; 2],
}

impl Default for VpicConfig {
    fn default() -> Self {
        Self {
            elcr_mask: [MASTER_ELCR_MASK, SLAVE_ELCR_MASK],
            // Everything configurable starts level-triggered; firmware narrows it to the PCI
            // lines it actually routes.
            power_on_elcr: [0xFF, 0xFF],
        }
    }
}

impl VpicConfig {
    /// Config with every line edge-triggered at power-on (ELCR still writable).
    pub fn all_edge() -> Self {
        Self {
            power_on_elcr: [0x00, 0x00],
            ..Self::default()
        }
    }
}
