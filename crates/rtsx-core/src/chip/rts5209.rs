//! RTS5209 support.
//!
//! Oldest supported generation: LED on the card GPIO pad, voltage switch
//! through PHY register 0x12, narrow SSC divider range.

use rtsx_hal::DriverResult;

use super::{ChipAccess, ChipOps, ChipParams, ClockLimits, DrivingEntry, OcpParams, OutputVoltage};
use crate::clock::CLK_DIV_8;
use crate::regs;

/// Voltage-select PHY register on this generation.
const PHY_VOLTAGE_CTL: u8 = 0x12;
/// PHY_VOLTAGE_CTL value for 3.3 V signaling.
const PHY_VOLTAGE_3V3: u16 = 0x4FC0;
/// PHY_VOLTAGE_CTL value for 1.8 V signaling.
const PHY_VOLTAGE_1V8: u16 = 0x4C40 | 0x24;

/// RTS5209 strategy singleton.
pub(super) struct Rts5209;

impl ChipOps for Rts5209 {
    fn name(&self) -> &'static str {
        "RTS5209"
    }

    fn default_params(&self) -> ChipParams {
        ChipParams {
            device_id: 0x5209,
            ssc: ClockLimits {
                min_n: 80,
                max_n: 128,
                max_div: CLK_DIV_8,
            },
            driving_3v3: [
                DrivingEntry { clk: 0x11, cmd: 0x11, dat: 0x18 },
                DrivingEntry { clk: 0x55, cmd: 0x55, dat: 0x5C },
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x92 },
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x92 },
            ],
            driving_1v8: [
                DrivingEntry { clk: 0x55, cmd: 0x55, dat: 0x5C },
                DrivingEntry { clk: 0x55, cmd: 0x55, dat: 0x5C },
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x92 },
                DrivingEntry { clk: 0x99, cmd: 0x99, dat: 0x92 },
            ],
            drive_sel_3v3: 0,
            drive_sel_1v8: 0,
            tx_phase: 27,
            sample_phase: 16,
            ocp: OcpParams {
                threshold: 0x00,
                glitch: 0x00,
            },
            reverse_socket: false,
        }
    }

    fn extra_init(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        acc.write_chip_batch(
            &[
                // LED pad is a plain GPIO here; direct it out, LED off.
                (regs::CARD_GPIO_DIR, 0xFF, 0x03),
                (regs::CARD_GPIO, 0xFF, 0x03),
                (regs::CD_PAD_CTL, regs::CD_DISABLE_MASK, 0x00),
            ],
            100,
        )
    }

    fn power_on_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
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
        // Inrush limit before full power.
        acc.delay_us(150);
        acc.write_chip_batch(
            &[
                (regs::CARD_PWR_CTL, regs::SD_POWER_MASK, regs::SD_POWER_ON),
                (regs::PWR_GATE_CTRL, regs::LDO3318_PWR_MASK, regs::LDO_ON),
            ],
            100,
        )
    }

    fn power_off_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
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

    fn switch_output_voltage(
        &self,
        acc: &dyn ChipAccess,
        params: &ChipParams,
        voltage: OutputVoltage,
    ) -> DriverResult {
        let (table, sel, phy) = match voltage {
            OutputVoltage::V330 => (&params.driving_3v3, params.drive_sel_3v3, PHY_VOLTAGE_3V3),
            OutputVoltage::V180 => (&params.driving_1v8, params.drive_sel_1v8, PHY_VOLTAGE_1V8),
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
        acc.write_phy_register(PHY_VOLTAGE_CTL, phy)
    }

    // LED sits on the card GPIO pad, active low.
    fn turn_on_led(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(regs::CARD_GPIO, regs::CARD_GPIO_LED_MASK, 0x00)
    }

    fn turn_off_led(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(
            regs::CARD_GPIO,
            regs::CARD_GPIO_LED_MASK,
            regs::CARD_GPIO_LED_MASK,
        )
    }

    // No per-rail OCP block on this generation; the shared overcurrent
    // interrupt is the only protection.
    fn enable_ocp(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        acc.write_chip_register(regs::FPDCTL, regs::OC_POWER_DOWN, 0x00)
    }

    fn disable_ocp(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(regs::FPDCTL, regs::OC_POWER_DOWN, regs::OC_POWER_DOWN)
    }
}
