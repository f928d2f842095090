#![allow(dead_code)]

use hvm_vpic::ports::{MASTER_CMD, MASTER_DATA, SLAVE_CMD, SLAVE_DATA};
use hvm_vpic::Vpic;

/// BIOS-style setup: master at `master_base` with the slave on IR2, slave at `slave_base`,
/// 8086 mode, normal EOI.
pub fn init_pc(pic: &Vpic, master_base: u8, slave_base: u8) {
    init_pc_with_icw4(pic, master_base, slave_base, 0x01);
}

pub fn init_pc_with_icw4(pic: &Vpic, master_base: u8, slave_base: u8, icw4: u8) {
    pic.write_u8(MASTER_CMD, 0x11).unwrap();
    pic.write_u8(MASTER_DATA, master_base).unwrap();
    pic.write_u8(MASTER_DATA, 0x04).unwrap();
    pic.write_u8(MASTER_DATA, icw4).unwrap();

    pic.write_u8(SLAVE_CMD, 0x11).unwrap();
    pic.write_u8(SLAVE_DATA, slave_base).unwrap();
    pic.write_u8(SLAVE_DATA, 0x02).unwrap();
    pic.write_u8(SLAVE_DATA, icw4).unwrap();
}

pub fn read_isr(pic: &Vpic, cmd_port: u16) -> u8 {
    pic.write_u8(cmd_port, 0x0B).unwrap();
    let isr = pic.read_u8(cmd_port).unwrap();
    pic.write_u8(cmd_port, 0x0A).unwrap();
    isr
}
