use std::sync::Arc;
use std::thread;

use hvm_portio::{register_vpic_ports, IoPortBus, IoRequest, PortIoError};
use hvm_vpic::{ChipSelect, IsaIrqSink, Vpic, VpicConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn machine() -> (IoPortBus, Arc<Vpic>) {
    init_tracing();
    let vpic = Arc::new(Vpic::new(VpicConfig::default()));
    let mut bus = IoPortBus::new();
    register_vpic_ports(&mut bus, vpic.clone()).unwrap();
    (bus, vpic)
}

/// The sequence a PC BIOS runs: remap to 0x20/0x28, slave on IR2, 8086 mode.
fn bios_init(bus: &IoPortBus) {
    for (port, value) in [
        (0x20, 0x11),
        (0x21, 0x20),
        (0x21, 0x04),
        (0x21, 0x01),
        (0xA0, 0x11),
        (0xA1, 0x28),
        (0xA1, 0x02),
        (0xA1, 0x01),
    ] {
        bus.write_u8(port, value).unwrap();
    }
}

#[test]
fn bios_bring_up_through_the_bus() {
    let (bus, vpic) = machine();
    bios_init(&bus);

    // Power-on ELCR is every maskable line level-triggered; a BIOS rewrites it from the ACPI
    // tables. Leave only IRQ9 and IRQ11 level-triggered.
    bus.write_u8(0x4D0, 0x00).unwrap();
    bus.write_u8(0x4D1, 0x0A).unwrap();
    assert_eq!(bus.read_u8(0x4D0).unwrap(), 0x00);
    assert_eq!(bus.read_u8(0x4D1).unwrap(), 0x0A);

    // Mask everything but the timer and the cascade.
    bus.write_u8(0x21, 0xFA).unwrap();
    bus.write_u8(0xA1, 0xFF).unwrap();
    assert_eq!(bus.read_u8(0x21).unwrap(), 0xFA);

    vpic.pulse_irq(0).unwrap();
    let ack = vpic.take_pending_interrupt(&true).unwrap();
    assert_eq!(ack.vector, 0x20);

    // ISR readback through OCW3.
    bus.write_u8(0x20, 0x0B).unwrap();
    assert_eq!(bus.read_u8(0x20).unwrap(), 0x01);
    bus.write_u8(0x20, 0x20).unwrap();
    assert_eq!(bus.read_u8(0x20).unwrap(), 0x00);
}

#[test]
fn level_triggered_slave_line_redelivers_until_lowered() {
    let (bus, vpic) = machine();
    bios_init(&bus);
    bus.write_u8(0x4D0, 0x00).unwrap();
    bus.write_u8(0x4D1, 0x02).unwrap();

    vpic.raise_irq(9).unwrap();
    let ack = vpic.take_pending_interrupt(&true).unwrap();
    assert_eq!(ack.vector, 0x29);
    assert_eq!(ack.irq, 9);

    bus.write_u8(0xA0, 0x20).unwrap();
    bus.write_u8(0x20, 0x20).unwrap();
    let again = vpic.take_pending_interrupt(&true).unwrap();
    assert_eq!(again.vector, 0x29);

    // Deasserting before the EOIs leaves nothing to re-request through the cascade.
    vpic.lower_irq(9).unwrap();
    bus.write_u8(0xA0, 0x20).unwrap();
    bus.write_u8(0x20, 0x20).unwrap();
    assert_eq!(vpic.take_pending_interrupt(&true), None);
}

#[test]
fn malformed_accesses_never_reach_the_guest_as_faults() {
    let (bus, vpic) = machine();
    bios_init(&bus);
    bus.write_u8(0x21, 0x3C).unwrap();

    let mut word = IoRequest::read(0x21, 2);
    bus.dispatch(&mut word).unwrap();
    assert_eq!(word.data, 0);

    let mut rep = IoRequest::write(0x21, 1, 0xFF).with_count(4);
    bus.dispatch(&mut rep).unwrap();
    assert_eq!(vpic.chip(ChipSelect::Master).imr(), 0x3C);

    // Single mode and level-triggered ICW1 are logged, not propagated.
    bus.write_u8(0x20, 0x1B).unwrap();
    assert_eq!(vpic.chip(ChipSelect::Master).imr(), 0x00);

    assert_eq!(bus.read_u8(0x22), Err(PortIoError::Unclaimed(0x22)));
}

#[test]
fn devices_and_guest_share_the_bus() {
    let (bus, vpic) = machine();
    bios_init(&bus);
    bus.write_u8(0x4D0, 0x00).unwrap();
    bus.write_u8(0x4D1, 0x00).unwrap();

    thread::scope(|s| {
        for irq in [1u8, 12] {
            let vpic = Arc::clone(&vpic);
            s.spawn(move || vpic.pulse_irq(irq).unwrap());
        }
    });

    let first = vpic.take_pending_interrupt(&true).unwrap();
    assert_eq!(first.vector, 0x21);
    bus.write_u8(0x20, 0x20).unwrap();

    let second = vpic.take_pending_interrupt(&true).unwrap();
    assert_eq!(second.vector, 0x2C);
    bus.write_u8(0xA0, 0x20).unwrap();
    bus.write_u8(0x20, 0x20).unwrap();

    assert_eq!(vpic.take_pending_interrupt(&true), None);
    assert_eq!(vpic.chip(ChipSelect::Slave).isr(), 0);
}
