//! Priority resolution over a chip's IRR/ISR/IMR.
//!
//! Priorities are numbered 0 (highest) to 7 (lowest) relative to the chip's rotation base:
//! priority `k` belongs to line `(k + priority_base) & 7`.

use crate::chip::{Chip, ChipSelect, CASCADE_BIT};

/// Highest priority present in `mask`, or `None` for an empty mask.
pub(crate) fn priority_of(chip: &Chip, mask: u8) -> Option<u8> {
    if mask == 0 {
        return None;
    }
    // Rotating right by the base moves the highest-priority line to bit 0.
    Some(mask.rotate_right(u32::from(chip.priority_base)).trailing_zeros() as u8)
}

pub(crate) fn line_for_priority(chip: &Chip, priority: u8) -> u8 {
    (priority + chip.priority_base) & 7
}

/// Line the chip wants to raise INT for, if any.
///
/// An unmasked request wins only if it strictly outranks everything in service. In special
/// fully nested mode the master ignores its own in-service cascade line here, so a second
/// slave request can nest on top of the first.
pub(crate) fn pending_irq(chip: &Chip, select: ChipSelect) -> Option<u8> {
    let requested = priority_of(chip, chip.irr & !chip.imr)?;

    let mut in_service = chip.isr;
    if select == ChipSelect::Master && chip.special_fully_nested {
        in_service &= !CASCADE_BIT;
    }
    let current = priority_of(chip, in_service).unwrap_or(8);

    (requested < current).then(|| line_for_priority(chip, requested))
}
