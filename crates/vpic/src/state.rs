//! Whole-controller register snapshot.

use serde::{Deserialize, Serialize};

use crate::chip::{Chip, ChipSelect, InitStep};
use crate::error::{Result, VpicError};
use crate::vpic::Vpic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpicState {
    pub chips: [Chip; 2],
    pub irq_pending: bool,
}

impl VpicState {
    pub fn chip(&self, select: ChipSelect) -> &Chip {
        &self.chips[select.index()]
    }

    pub fn master(&self) -> &Chip {
        self.chip(ChipSelect::Master)
    }

    pub fn slave(&self) -> &Chip {
        self.chip(ChipSelect::Slave)
    }
}

fn validate(saved: &Chip, live: &Chip) -> Result<()> {
    if saved.elcr_mask != live.elcr_mask {
        return Err(VpicError::InvalidState("ELCR mask differs from controller wiring"));
    }
    if saved.elcr & !saved.elcr_mask != 0 {
        return Err(VpicError::InvalidState("ELCR has bits outside its mask"));
    }
    if saved.priority_base > 7 {
        return Err(VpicError::InvalidState("priority base out of range"));
    }
    if saved.vector_base & 0x07 != 0 {
        return Err(VpicError::InvalidState("vector base not 8-aligned"));
    }
    if saved.init_step == InitStep::Mode && !saved.expect_icw4 {
        return Err(VpicError::InvalidState("ICW4 step without ICW4 requested"));
    }
    Ok(())
}

impl Vpic {
    pub fn save_state(&self) -> VpicState {
        // Read under the lock so no propagation lands between registers and flag. The CPU side
        // clears the flag without the lock, so a concurrent take can still race this read.
        let locked = self.lock();
        VpicState {
            chips: locked.chips().clone(),
            irq_pending: self.irq_pending(),
        }
    }

    /// Replaces all register state. Nothing is modified if `state` fails validation.
    pub fn load_state(&self, state: &VpicState) -> Result<()> {
        let mut locked = self.lock();
        for (saved, live) in state.chips.iter().zip(locked.chips().iter()) {
            validate(saved, live)?;
        }
        *locked.chips_mut() = state.chips.clone();
        locked.set_irq_pending(state.irq_pending);
        Ok(())
    }
}
