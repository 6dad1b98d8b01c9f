//! RTS5249 support.
//!
//! First generation with the tuned PHY: voltage switching is a masked
//! update of the PHY tune register rather than a whole-register write.

use rtsx_hal::DriverResult;

use super::{ChipAccess, ChipOps, ChipParams, ClockLimits, DrivingEntry, OcpParams, OutputVoltage};
use crate::clock::CLK_DIV_8;
use crate::regs;

/// PHY tune register.
pub(super) const PHY_TUNE: u8 = 0x08;
/// PHY_TUNE: signaling voltage field.
pub(super) const PHY_TUNE_VOLTAGE_MASK: u16 = 0x07C0;
/// Voltage field: 3.3 V signaling.
pub(super) const PHY_TUNE_VOLTAGE_3V3: u16 = 0x07C0;
/// Voltage field: 1.8 V signaling.
pub(super) const PHY_TUNE_VOLTAGE_1V8: u16 = 0x05C0;

/// PETXCFG value routing a reverse-mounted socket.
const PETXCFG_REVERSE: u8 = 0xB0;
/// PETXCFG value for normal routing.
const PETXCFG_NORMAL: u8 = 0x80;

/// RTS5249 strategy singleton.
pub(super) struct Rts5249;

pub(super) fn power_on(acc: &dyn ChipAccess) -> DriverResult {
    acc.write_chip_batch(
        &[
            (
                regs::CARD_PWR_CTL,
                regs::SD_POWER_MASK,
                regs::SD_PARTIAL_POWER_ON,
            ),
            (
                regs::PWR_GATE_CTRL,
                regs::LDO3318_PWR_MASK,
                regs::LDO_SUSPEND,
            ),
        ],
        100,
    )?;
    acc.delay_ms(5);
    acc.write_chip_batch(
        &[
            (regs::CARD_PWR_CTL, regs::SD_POWER_MASK, regs::SD_POWER_ON),
            (regs::PWR_GATE_CTRL, regs::LDO3318_PWR_MASK, regs::LDO_ON),
        ],
        100,
    )?;
    // Strengthen the PMOS switch only after the rail is stable.
    acc.delay_ms(1);
    acc.write_chip_register(regs::CARD_PWR_CTL, regs::PMOS_STRG_MASK, regs::PMOS_STRG_800MA)
}

pub(super) fn power_off(acc: &dyn ChipAccess) -> DriverResult {
    acc.write_chip_batch(
        &[
            (
                regs::CARD_PWR_CTL,
                regs::SD_POWER_MASK | regs::PMOS_STRG_MASK,
                regs::SD_POWER_OFF | regs::PMOS_STRG_400MA,
            ),
            (regs::PWR_GATE_CTRL, regs::LDO3318_PWR_MASK, regs::LDO_OFF),
        ],
        100,
    )
}

pub(super) fn switch_voltage(
    acc: &dyn ChipAccess,
    params: &ChipParams,
    voltage: OutputVoltage,
) -> DriverResult {
    let (table, sel, field) = match voltage {
        OutputVoltage::V330 => (
            &params.driving_3v3,
            params.drive_sel_3v3,
            PHY_TUNE_VOLTAGE_3V3,
        ),
        OutputVoltage::V180 => (
            &params.driving_1v8,
            params.drive_sel_1v8,
            PHY_TUNE_VOLTAGE_1V8,
        ),
    };
    let drive = &table[usize::from(sel)];
    acc.write_chip_batch(
        &[
            (regs::SD30_CLK_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.clk),
            (regs::SD30_CMD_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.cmd),
            (regs::SD30_DAT_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.dat),
        ],
        100,
    )?;
    let tune = acc.read_phy_register(PHY_TUNE)?;
    acc.write_phy_register(PHY_TUNE, (tune & !PHY_TUNE_VOLTAGE_MASK) | field)
}

impl ChipOps for Rts5249 {
    fn name(&self) -> &'static str {
        "RTS5249"
    }

    fn default_params(&self) -> ChipParams {
        ChipParams {
            device_id: 0x5249,
            ssc: ClockLimits {
                min_n: 80,
                max_n: 208,
                max_div: CLK_DIV_8,
            },
            driving_3v3: [
                DrivingEntry { clk: 0x11, cmd: 0x11, dat: 0x11 },
                DrivingEntry { clk: 0x55, cmd: 0x55, dat: 0x55 },
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x99 },
                DrivingEntry { clk: 0x92, cmd: 0x92, dat: 0x92 },
            ],
            driving_1v8: [
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x99 },
                DrivingEntry { clk: 0xAA, cmd: 0xAA, dat: 0xAA },
                DrivingEntry { clk: 0xFE, cmd: 0xFE, dat: 0xFE },
                DrivingEntry { clk: 0xB3, cmd: 0xB3, dat: 0xB3 },
            ],
            drive_sel_3v3: 1,
            drive_sel_1v8: 1,
            tx_phase: 27,
            sample_phase: 11,
            ocp: OcpParams {
                threshold: 0x64,
                glitch: 0x7D,
            },
            reverse_socket: false,
        }
    }

    fn extra_init(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult {
        let petxcfg = if params.reverse_socket {
            PETXCFG_REVERSE
        } else {
            PETXCFG_NORMAL
        };
        acc.write_chip_batch(
            &[
                (regs::GPIO_CTL, regs::GPIO_LED_ON, 0x00),
                (regs::CARD_AUTO_BLINK, regs::BLINK_EN, regs::BLINK_EN),
                (regs::PETXCFG, 0xB0, petxcfg),
                (regs::PWR_GATE_CTRL, regs::PWR_GATE_EN, regs::PWR_GATE_EN),
                (regs::CD_PAD_CTL, regs::CD_DISABLE_MASK, 0x00),
            ],
            100,
        )
    }

    fn power_on_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        power_on(acc)
    }

    fn power_off_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        power_off(acc)
    }

    fn switch_output_voltage(
        &self,
        acc: &dyn ChipAccess,
        params: &ChipParams,
        voltage: OutputVoltage,
    ) -> DriverResult {
        switch_voltage(acc, params, voltage)
    }
}
