mod common;

use common::init_pc;
use hvm_vpic::ports::{
    MASTER_CMD, MASTER_DATA, MASTER_ELCR, SLAVE_CMD, SLAVE_DATA, SLAVE_ELCR,
};
use hvm_vpic::{ChipSelect, Vpic, VpicConfig};
use proptest::prelude::*;

fn chip_bit(irq: u8) -> (ChipSelect, u8) {
    (ChipSelect::for_irq(irq), 1 << (irq & 7))
}

proptest! {
    #[test]
    fn level_lines_mirror_the_input(levels in prop::collection::vec(any::<bool>(), 1..64)) {
        // IRQ10: level-triggered in the default wiring.
        let pic = Vpic::default();
        init_pc(&pic, 0x20, 0x28);
        let (select, bit) = chip_bit(10);

        for level in levels {
            pic.raise_or_lower(10, level).unwrap();
            let irr = pic.chip(select).irr() & bit;
            prop_assert_eq!(irr != 0, level);
        }
    }

    #[test]
    fn edge_lines_latch_only_rising_edges(
        irq in prop::sample::select(vec![0u8, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
        levels in prop::collection::vec(any::<bool>(), 1..64),
    ) {
        let pic = Vpic::new(VpicConfig::all_edge());
        init_pc(&pic, 0x20, 0x28);
        let (select, bit) = chip_bit(irq);

        let mut previous = false;
        let mut latched = false;
        for level in levels {
            pic.raise_or_lower(irq, level).unwrap();
            latched |= level && !previous;
            previous = level;
            prop_assert_eq!(pic.chip(select).irr() & bit != 0, latched);
        }
    }

    #[test]
    fn masked_line_never_delivers(irq in 0u8..16, rotation in 0u8..8) {
        prop_assume!(irq != 2);
        let pic = Vpic::new(VpicConfig::all_edge());
        init_pc(&pic, 0x20, 0x28);
        // Set-priority command: rotate so `rotation` is the lowest priority line on both chips.
        pic.write_u8(MASTER_CMD, 0xC0 | rotation).unwrap();
        pic.write_u8(SLAVE_CMD, 0xC0 | rotation).unwrap();

        let (select, bit) = chip_bit(irq);
        let port = match select {
            ChipSelect::Master => MASTER_DATA,
            ChipSelect::Slave => SLAVE_DATA,
        };
        pic.write_u8(port, bit).unwrap();
        pic.raise_or_lower(irq, true).unwrap();

        prop_assert!(!pic.irq_pending());
        prop_assert_eq!(pic.take_pending_interrupt(&true), None);
    }
}

#[test]
fn elcr_survives_reinitialization() {
    let pic = Vpic::new(VpicConfig::all_edge());
    pic.write_u8(MASTER_ELCR, 0x20).unwrap();
    pic.write_u8(SLAVE_ELCR, 0x0C).unwrap();

    init_pc(&pic, 0x20, 0x28);

    assert_eq!(pic.read_u8(MASTER_ELCR).unwrap(), 0x20);
    assert_eq!(pic.read_u8(SLAVE_ELCR).unwrap(), 0x0C);
}
