//! The cascaded master/slave pair behind a single lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::chip::{Chip, ChipSelect, CASCADE_LINE, SPURIOUS_LINE};
use crate::config::VpicConfig;
use crate::inject::{DeliveryMode, ExtIntVector};
use crate::priority::pending_irq;

/// Virtual dual 8259A owned by one guest domain.
///
/// Every entry point takes the one internal lock for its whole duration, so port accesses,
/// line changes and acknowledges are totally ordered. The lock is not re-entrant: nothing
/// running under it may call back into the same `Vpic`, and callers on an interrupt path must
/// not be able to preempt a holder on the same thread.
///
/// `irq_pending` lives outside the lock. Propagation sets it under the lock; the CPU side
/// test-and-clears it without the lock before deciding whether to acknowledge.
#[derive(Debug)]
pub struct Vpic {
    chips: Mutex<[Chip; 2]>,
    irq_pending: AtomicBool,
}

/// A held lock on the chip pair, plus the pending flag that propagation may raise.
pub(crate) struct Locked<'a> {
    chips: MutexGuard<'a, [Chip; 2]>,
    irq_pending: &'a AtomicBool,
}

impl Vpic {
    pub fn new(config: VpicConfig) -> Self {
        let chips = [
            Chip::new(config.elcr_mask[0], config.power_on_elcr[0]),
            Chip::new(config.elcr_mask[1], config.power_on_elcr[1]),
        ];
        Self {
            chips: Mutex::new(chips),
            irq_pending: AtomicBool::new(false),
        }
    }

    pub(crate) fn lock(&self) -> Locked<'_> {
        // Register state is plain bytes; a panic elsewhere cannot leave it half-written in a
        // way later operations depend on.
        let chips = self.chips.lock().unwrap_or_else(PoisonError::into_inner);
        Locked {
            chips,
            irq_pending: &self.irq_pending,
        }
    }

    /// Whether propagation has flagged a deliverable interrupt since the flag was last taken.
    pub fn irq_pending(&self) -> bool {
        self.irq_pending.load(Ordering::Acquire)
    }

    /// Test-and-clear of the pending flag, as done by the interrupt injection path.
    pub fn take_irq_pending(&self) -> bool {
        self.irq_pending.swap(false, Ordering::AcqRel)
    }

    /// Runs an INTA cycle: resolves the next vector, updates in-service state and
    /// re-propagates.
    ///
    /// Callers are expected to have taken the pending flag first. If nothing is deliverable
    /// any more, the hardware answer is the spurious IRQ7 vector of the master (or of the
    /// slave, if the master had already committed to the cascade line).
    pub fn acknowledge(&self) -> ExtIntVector {
        self.lock().acknowledge()
    }

    /// Domain reset: both chips return to their post-reset state and the pending flag drops.
    pub fn reset(&self) {
        let mut locked = self.lock();
        for chip in locked.chips.iter_mut() {
            chip.reset();
        }
        locked.irq_pending.store(false, Ordering::Release);
    }

    /// Copy of one chip's registers.
    pub fn chip(&self, select: ChipSelect) -> Chip {
        self.lock().chip(select).clone()
    }
}

impl Default for Vpic {
    fn default() -> Self {
        Self::new(VpicConfig::default())
    }
}

impl Locked<'_> {
    pub(crate) fn chip(&self, select: ChipSelect) -> &Chip {
        &self.chips[select.index()]
    }

    pub(crate) fn chip_mut(&mut self, select: ChipSelect) -> &mut Chip {
        &mut self.chips[select.index()]
    }

    pub(crate) fn chips(&self) -> &[Chip; 2] {
        &self.chips
    }

    pub(crate) fn chips_mut(&mut self) -> &mut [Chip; 2] {
        &mut self.chips
    }

    pub(crate) fn pending_irq(&self, select: ChipSelect) -> Option<u8> {
        pending_irq(self.chip(select), select)
    }

    pub(crate) fn set_irq_pending(&self, pending: bool) {
        self.irq_pending.store(pending, Ordering::Release);
    }

    /// Recomputes the INT outputs. Must run after anything that can change which line wins.
    pub(crate) fn propagate(&mut self) {
        if self.pending_irq(ChipSelect::Slave).is_some() {
            // The slave's INT output is hard-wired to the master's IR2 and behaves as an edge.
            self.chip_mut(ChipSelect::Master).pulse_edge(CASCADE_LINE);
        }

        if let Some(line) = self.pending_irq(ChipSelect::Master) {
            trace!(line, "i8259 INT asserted");
            self.set_irq_pending(true);
        }
    }

    /// Applies a new level to global ISA line `irq` (0..16).
    pub(crate) fn set_irq(&mut self, irq: u8, level: bool) {
        let select = ChipSelect::for_irq(irq);
        self.chip_mut(select).update_line(irq & 7, level);
        self.propagate();
    }

    pub(crate) fn acknowledge(&mut self) -> ExtIntVector {
        let (vector, irq) = match self.pending_irq(ChipSelect::Master) {
            Some(CASCADE_LINE) => {
                self.chip_mut(ChipSelect::Master).intack(CASCADE_LINE);
                let line = match self.pending_irq(ChipSelect::Slave) {
                    Some(line) => {
                        self.chip_mut(ChipSelect::Slave).intack(line);
                        line
                    }
                    None => {
                        warn!("Spurious irq on slave i8259");
                        SPURIOUS_LINE
                    }
                };
                let base = self.chip(ChipSelect::Slave).vector_base;
                (base.wrapping_add(line), 8 + line)
            }
            Some(line) => {
                self.chip_mut(ChipSelect::Master).intack(line);
                let base = self.chip(ChipSelect::Master).vector_base;
                (base.wrapping_add(line), line)
            }
            None => {
                warn!("Spurious irq on master i8259");
                let base = self.chip(ChipSelect::Master).vector_base;
                (base.wrapping_add(SPURIOUS_LINE), SPURIOUS_LINE)
            }
        };

        self.propagate();
        trace!(vector, irq, "i8259 INTA");

        ExtIntVector {
            vector,
            irq,
            mode: DeliveryMode::ExtInt,
        }
    }
}
