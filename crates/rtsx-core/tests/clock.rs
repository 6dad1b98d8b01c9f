//! Clock-switch integration tests against the simulated device.

mod common;

use common::{setup, spawn_irq_pump};
use rtsx_core::clock::SscDepth;
use rtsx_core::regs;
use rtsx_hal::DriverError;

#[test]
fn switch_programs_ssc_registers() {
    let (dev, ctrl) = setup();
    let _pump = spawn_irq_pump(&ctrl);

    ctrl.switch_card_clock(200_000_000, SscDepth::D1M, false, false, false)
        .unwrap();

    // 200 MHz on the default formula: n = 198, divider 1, mcu = 125/200 + 3.
    assert_eq!(dev.chip_reg(regs::SSC_DIV_N_0), 198);
    assert_eq!(dev.chip_reg(regs::CLK_DIV), (0x01 << 4) | 3);
    assert_eq!(
        dev.chip_reg(regs::SSC_CTL2) & regs::SSC_DEPTH_MASK,
        regs::SSC_DEPTH_1M
    );
    // SSC released from reset, low-frequency mode exited.
    assert_eq!(dev.chip_reg(regs::SSC_CTL1) & regs::SSC_RSTB, regs::SSC_RSTB);
    assert_eq!(dev.chip_reg(regs::CLK_CTL) & regs::CLK_LOW_FREQ, 0);
    // Steady-state divider on SD_CFG1.
    assert_eq!(
        dev.chip_reg(regs::SD_CFG1) & regs::SD_CLK_DIVIDE_MASK,
        regs::SD_CLK_DIVIDE_0
    );
}

#[test]
fn redundant_switch_short_circuits() {
    let (dev, ctrl) = setup();
    let _pump = spawn_irq_pump(&ctrl);

    ctrl.switch_card_clock(200_000_000, SscDepth::D1M, false, false, false)
        .unwrap();
    let batches = dev.cmd_batches();

    ctrl.switch_card_clock(200_000_000, SscDepth::D1M, false, false, false)
        .unwrap();
    assert_eq!(dev.cmd_batches(), batches);

    // A different clock programs the hardware again.
    ctrl.switch_card_clock(100_000_000, SscDepth::D1M, false, false, false)
        .unwrap();
    assert_eq!(dev.cmd_batches(), batches + 1);
}

#[test]
fn initial_mode_forces_bring_up_rate() {
    let (dev, ctrl) = setup();
    let _pump = spawn_irq_pump(&ctrl);

    // The requested 200 MHz is ignored in initial mode.
    ctrl.switch_card_clock(200_000_000, SscDepth::D500K, true, false, false)
        .unwrap();

    assert_eq!(
        dev.chip_reg(regs::SD_CFG1) & regs::SD_CLK_DIVIDE_MASK,
        regs::SD_CLK_DIVIDE_128
    );
    // 30 MHz effective: n walks up from 28 with the clock divider.
    assert_eq!(dev.chip_reg(regs::SSC_DIV_N_0), 118);
    assert_eq!(dev.chip_reg(regs::CLK_DIV) >> 4, 0x03);
}

#[test]
fn doubled_clock_does_not_double_in_initial_mode() {
    let (dev, ctrl) = setup();
    let _pump = spawn_irq_pump(&ctrl);

    ctrl.switch_card_clock(200_000_000, SscDepth::D500K, true, true, false)
        .unwrap();
    // Still the 30 MHz bring-up parameters.
    assert_eq!(dev.chip_reg(regs::SSC_DIV_N_0), 118);
}

#[test]
fn vpclk_phase_toggles_in_batch() {
    let (dev, ctrl) = setup();
    let _pump = spawn_irq_pump(&ctrl);

    ctrl.switch_card_clock(100_000_000, SscDepth::D1M, false, false, true)
        .unwrap();
    assert_eq!(
        dev.chip_reg(regs::SD_VPCLK0_CTL) & regs::PHASE_NOT_RESET,
        regs::PHASE_NOT_RESET
    );
}

#[test]
fn out_of_range_clock_rejected_without_hardware_access() {
    let (dev, ctrl) = setup();

    assert_eq!(
        ctrl.switch_card_clock(2_000_000, SscDepth::D1M, false, false, false),
        Err(DriverError::InvalidClock)
    );
    assert_eq!(
        ctrl.switch_card_clock(250_000_000, SscDepth::D1M, false, false, false),
        Err(DriverError::InvalidClock)
    );
    assert_eq!(dev.cmd_batches(), 0);
}
