//! RTS525A support.
//!
//! A-series derivative of the RTS5249: same power sequencing and PHY tune
//! path, but the card LDO moved into its own configuration register and the
//! SSC pipeline runs off a pre-divided source, which changes the clock/N
//! conversion.

use rtsx_hal::DriverResult;

use super::{ChipAccess, ChipOps, ChipParams, ConvDir, OutputVoltage, rts5249};

/// Card LDO configuration register.
const LDO_VCC_CFG1: u16 = 0xFE78;
/// LDO_VCC_CFG1: output voltage field.
const LDO_VCC_TUNE_MASK: u8 = 0x30;
/// Voltage field: 3.3 V.
const LDO_VCC_3V3: u8 = 0x10;
/// LDO_VCC_CFG1: LDO enable.
const LDO_VCC_EN: u8 = 0x08;

/// RTS525A strategy singleton.
pub(super) struct Rts525a;

impl ChipOps for Rts525a {
    fn name(&self) -> &'static str {
        "RTS525A"
    }

    fn default_params(&self) -> ChipParams {
        let mut params = rts5249::Rts5249.default_params();
        params.device_id = 0x525A;
        params.ocp.threshold = 0x78;
        params
    }

    fn extra_init(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult {
        rts5249::Rts5249.extra_init(acc, params)?;
        acc.write_chip_batch(
            &[
                (LDO_VCC_CFG1, LDO_VCC_TUNE_MASK, LDO_VCC_3V3),
                (LDO_VCC_CFG1, LDO_VCC_EN, LDO_VCC_EN),
            ],
            100,
        )
    }

    fn power_on_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        rts5249::power_on(acc)
    }

    fn power_off_card(&self, acc: &dyn ChipAccess, _params: &ChipParams) -> DriverResult {
        rts5249::power_off(acc)
    }

    fn switch_output_voltage(
        &self,
        acc: &dyn ChipAccess,
        params: &ChipParams,
        voltage: OutputVoltage,
    ) -> DriverResult {
        let vcc = match voltage {
            OutputVoltage::V330 => LDO_VCC_3V3,
            OutputVoltage::V180 => 0x00,
        };
        acc.write_chip_register(LDO_VCC_CFG1, LDO_VCC_TUNE_MASK, vcc)?;
        rts5249::switch_voltage(acc, params, voltage)
    }

    // The SSC source is pre-divided by 5/4 on this part.
    fn conv_clk_and_div_n(&self, input: u32, dir: ConvDir) -> u32 {
        match dir {
            ConvDir::ClockToDivN => (input * 4 / 5).saturating_sub(2),
            ConvDir::DivNToClock => (input + 2) * 5 / 4,
        }
    }
}
