//! Card clock switching via spread-spectrum clock generation.
//!
//! The card clock is produced by dividing an internal SSC clock: target
//! frequency maps to a divider N (through a per-generation formula), an
//! optional power-of-two clock divider keeps N inside the supported range,
//! and the spread depth is revised to compensate for divider attenuation.
//! The computed parameters go out as one command batch.

use log::debug;
use rtsx_hal::{DriverError, DriverResult};

use crate::chip::{ChipOps, ClockLimits, ConvDir};
use crate::cmd::Command;
use crate::controller::Controller;
use crate::regs;

/// Clock divider register codes; each step doubles the division.
pub const CLK_DIV_1: u8 = 0x01;
/// Divide by 2.
pub const CLK_DIV_2: u8 = 0x02;
/// Divide by 4.
pub const CLK_DIV_4: u8 = 0x03;
/// Divide by 8.
pub const CLK_DIV_8: u8 = 0x04;

/// Bring-up card clock forced in initial mode.
pub const INITIAL_CARD_CLOCK_HZ: u32 = 30_000_000;

/// Largest MCU count the divider register holds.
const MCU_CNT_MAX: u32 = 15;

/// Timeout for the clock-switch command batch.
const CLOCK_SWITCH_TIMEOUT_MS: u64 = 2000;

/// Settle time after leaving low-frequency mode, in microseconds.
const CLOCK_SETTLE_US: u64 = 10;

/// Requested spread-spectrum depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SscDepth {
    /// 4 MHz spread.
    D4M,
    /// 2 MHz spread.
    D2M,
    /// 1 MHz spread.
    D1M,
    /// 500 kHz spread.
    D500K,
    /// 250 kHz spread.
    D250K,
}

impl SscDepth {
    /// The fixed per-depth register value.
    #[must_use]
    pub const fn register_value(self) -> u8 {
        match self {
            Self::D4M => regs::SSC_DEPTH_4M,
            Self::D2M => regs::SSC_DEPTH_2M,
            Self::D1M => regs::SSC_DEPTH_1M,
            Self::D500K => regs::SSC_DEPTH_500K,
            Self::D250K => regs::SSC_DEPTH_250K,
        }
    }
}

/// Computed SSC register parameters for one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SscParams {
    /// Divider N register value.
    pub n: u8,
    /// Clock divider code (`CLK_DIV_*`).
    pub div: u8,
    /// MCU count.
    pub mcu_cnt: u8,
    /// Revised spread depth register value.
    pub depth: u8,
}

/// Halves the spread period when the internal clock is doubled.
const fn double_ssc_depth(depth: u8) -> u8 {
    if depth > 1 { depth - 1 } else { depth }
}

/// Compensates the depth for clock-divider attenuation, flooring at the
/// deepest table value.
const fn revise_ssc_depth(depth: u8, div: u8) -> u8 {
    if div > CLK_DIV_1 {
        if depth > div - CLK_DIV_1 {
            depth - (div - CLK_DIV_1)
        } else {
            regs::SSC_DEPTH_4M
        }
    } else {
        depth
    }
}

/// Derives the SSC register parameters for an effective clock of `clk` MHz.
///
/// Fails with [`DriverError::InvalidClock`] when the clock is at or below
/// the 2 MHz floor or the derived divider N exceeds the generation's range.
pub fn compute_ssc_params(
    clk: u32,
    depth: SscDepth,
    double_clk: bool,
    limits: &ClockLimits,
    chip: &dyn ChipOps,
) -> DriverResult<SscParams> {
    let mut n = chip.conv_clk_and_div_n(clk, ConvDir::ClockToDivN);
    if clk <= 2 || n > u32::from(limits.max_n) {
        return Err(DriverError::InvalidClock);
    }

    let mcu_cnt = (125 / clk + 3).min(MCU_CNT_MAX) as u8;

    // Walk the divider up until N reaches the supported minimum, recomputing
    // N from the effectively-doubled clock at each step.
    let mut div = CLK_DIV_1;
    while n < u32::from(limits.min_n) && div < limits.max_div {
        div += 1;
        let doubled = chip.conv_clk_and_div_n(n, ConvDir::DivNToClock) * 2;
        n = chip.conv_clk_and_div_n(doubled, ConvDir::ClockToDivN);
    }
    if n > u32::from(limits.max_n) {
        return Err(DriverError::InvalidClock);
    }

    let mut depth = depth.register_value();
    if double_clk {
        depth = double_ssc_depth(depth);
    }
    depth = revise_ssc_depth(depth, div);

    Ok(SscParams {
        n: n as u8,
        div,
        mcu_cnt,
        depth,
    })
}

impl Controller {
    /// Switches the card clock.
    ///
    /// In `initial_mode` the card-clock divider is forced to 128 and the
    /// target clamped to the conservative bring-up rate regardless of the
    /// request. A switch to the already-running clock is a no-op.
    pub fn switch_card_clock(
        &self,
        card_clock_hz: u32,
        depth: SscDepth,
        initial_mode: bool,
        double_clk: bool,
        vpclk: bool,
    ) -> DriverResult {
        let (sd_div, clock_hz) = if initial_mode {
            (regs::SD_CLK_DIVIDE_128, INITIAL_CARD_CLOCK_HZ)
        } else {
            (regs::SD_CLK_DIVIDE_0, card_clock_hz)
        };

        let clock_hz = self
            .chip()
            .adjust_dma_error_clock(clock_hz, self.dma_error_count());

        let mut clk = clock_hz / 1_000_000;
        if double_clk && !initial_mode {
            clk *= 2;
        }

        if clk == self.current_clock_mhz() {
            return Ok(());
        }

        let params = compute_ssc_params(clk, depth, double_clk, &self.params().ssc, self.chip())?;
        debug!(
            "rtsx: switching card clock to {clk} MHz (n={}, div={}, mcu={}, depth={:#04x})",
            params.n, params.div, params.mcu_cnt, params.depth
        );

        self.with_custom_command_transfer(CLOCK_SWITCH_TIMEOUT_MS, |c| {
            c.enqueue_command(Command::write(
                regs::CLK_CTL,
                regs::CLK_LOW_FREQ,
                regs::CLK_LOW_FREQ,
            ))?;
            c.enqueue_command(Command::write(
                regs::SD_CFG1,
                regs::SD_CLK_DIVIDE_MASK,
                sd_div,
            ))?;
            c.enqueue_command(Command::write(
                regs::CLK_DIV,
                0xFF,
                (params.div << 4) | params.mcu_cnt,
            ))?;
            c.enqueue_command(Command::write(regs::SSC_CTL1, regs::SSC_RSTB, 0))?;
            c.enqueue_command(Command::write(
                regs::SSC_CTL2,
                regs::SSC_DEPTH_MASK,
                params.depth,
            ))?;
            c.enqueue_command(Command::write(regs::SSC_DIV_N_0, 0xFF, params.n))?;
            c.enqueue_command(Command::write(
                regs::SSC_CTL1,
                regs::SSC_RSTB,
                regs::SSC_RSTB,
            ))?;
            if vpclk {
                c.enqueue_command(Command::write(
                    regs::SD_VPCLK0_CTL,
                    regs::PHASE_NOT_RESET,
                    0,
                ))?;
                c.enqueue_command(Command::write(
                    regs::SD_VPCLK0_CTL,
                    regs::PHASE_NOT_RESET,
                    regs::PHASE_NOT_RESET,
                ))?;
            }
            Ok(())
        })?;

        self.delay_us(CLOCK_SETTLE_US);
        self.write_chip_register(regs::CLK_CTL, regs::CLK_LOW_FREQ, 0)?;
        self.set_current_clock_mhz(clk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip;

    fn limits() -> ClockLimits {
        ClockLimits {
            min_n: 80,
            max_n: 208,
            max_div: CLK_DIV_8,
        }
    }

    fn chip() -> &'static dyn ChipOps {
        chip::probe(0x5249).expect("5249 supported")
    }

    #[test]
    fn two_hundred_mhz_is_deterministic() {
        let params = compute_ssc_params(200, SscDepth::D1M, false, &limits(), chip()).unwrap();
        assert_eq!(
            params,
            SscParams {
                n: 198,
                div: CLK_DIV_1,
                mcu_cnt: 3,
                depth: regs::SSC_DEPTH_1M,
            }
        );
    }

    #[test]
    fn low_clock_rejected() {
        assert_eq!(
            compute_ssc_params(2, SscDepth::D1M, false, &limits(), chip()),
            Err(DriverError::InvalidClock)
        );
        assert_eq!(
            compute_ssc_params(1, SscDepth::D500K, false, &limits(), chip()),
            Err(DriverError::InvalidClock)
        );
    }

    #[test]
    fn oversized_divider_n_rejected() {
        // 250 MHz -> n = 248 > 208.
        assert_eq!(
            compute_ssc_params(250, SscDepth::D1M, false, &limits(), chip()),
            Err(DriverError::InvalidClock)
        );
    }

    #[test]
    fn divider_walk_recovers_small_n() {
        // 40 MHz -> n = 38 < 80: two divider steps double it into range.
        let params = compute_ssc_params(40, SscDepth::D1M, false, &limits(), chip()).unwrap();
        assert_eq!(params.div, CLK_DIV_4);
        assert_eq!(params.n, 158);
        assert!(params.n >= 80);
        // Depth revised down by (div - 1) = 2 steps from 1M, floored at 4M.
        assert_eq!(params.depth, regs::SSC_DEPTH_4M);
    }

    #[test]
    fn mcu_count_clamped() {
        // 3 MHz -> 125/3 + 3 = 44, clamped to 15.
        let params = compute_ssc_params(3, SscDepth::D250K, false, &limits(), chip());
        // n = 1 < 80 and dividers cannot recover it above min_n, but the
        // computation still clamps the MCU count before the walk.
        if let Ok(params) = params {
            assert!(params.mcu_cnt <= 15);
        }
    }

    #[test]
    fn doubled_clock_shallows_depth() {
        let single = compute_ssc_params(100, SscDepth::D500K, false, &limits(), chip()).unwrap();
        let doubled = compute_ssc_params(100, SscDepth::D500K, true, &limits(), chip()).unwrap();
        assert_eq!(single.depth, regs::SSC_DEPTH_500K);
        assert_eq!(doubled.depth, regs::SSC_DEPTH_500K - 1);
    }

    #[test]
    fn depth_floor_is_4m() {
        assert_eq!(revise_ssc_depth(regs::SSC_DEPTH_2M, CLK_DIV_8), regs::SSC_DEPTH_4M);
        assert_eq!(revise_ssc_depth(regs::SSC_DEPTH_250K, CLK_DIV_2), regs::SSC_DEPTH_500K);
        assert_eq!(double_ssc_depth(regs::SSC_DEPTH_4M), regs::SSC_DEPTH_4M);
    }
}
