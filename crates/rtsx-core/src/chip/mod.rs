//! Chip-variant registry.
//!
//! Each supported chip generation contributes a parameter bundle
//! ([`ChipParams`]) and a strategy object ([`ChipOps`]). The shared engines
//! never branch on the chip model; everything generation-specific — power
//! bring-up sequencing, voltage switching, LED wiring, OCP thresholds, SSC
//! formula quirks — goes through these two. Adding a chip means adding a
//! module and a [`probe`] entry, never touching the engines.

use rtsx_hal::DriverResult;

use crate::regs;

mod rts5209;
mod rts5227;
mod rts5229;
mod rts5249;
mod rts525a;

// ---------------------------------------------------------------------------
// Controller capabilities exposed to strategy hooks
// ---------------------------------------------------------------------------

/// The slice of the controller a chip hook may use.
///
/// Hooks run device-specific register sequences; they get chip-register and
/// PHY access plus delays, never the transport internals.
pub trait ChipAccess {
    /// Reads a chip register through the mailbox.
    fn read_chip_register(&self, addr: u16) -> DriverResult<u8>;
    /// Masked write to a chip register through the mailbox.
    fn write_chip_register(&self, addr: u16, mask: u8, value: u8) -> DriverResult;
    /// Sends a batch of masked writes as one command transfer.
    fn write_chip_batch(&self, writes: &[(u16, u8, u8)], timeout_ms: u64) -> DriverResult;
    /// Reads a PHY register through the two-level indirection.
    fn read_phy_register(&self, addr: u8) -> DriverResult<u16>;
    /// Writes a PHY register through the two-level indirection.
    fn write_phy_register(&self, addr: u8, value: u16) -> DriverResult;
    /// Busy-delays for `us` microseconds.
    fn delay_us(&self, us: u64);
    /// Sleeps for `ms` milliseconds.
    fn delay_ms(&self, ms: u64);
}

// ---------------------------------------------------------------------------
// Parameter bundle
// ---------------------------------------------------------------------------

/// SSC divider limits of a chip generation.
#[derive(Debug, Clone, Copy)]
pub struct ClockLimits {
    /// Smallest supported divider N.
    pub min_n: u8,
    /// Largest supported divider N.
    pub max_n: u8,
    /// Largest clock divider step (a `CLK_DIV_*` code).
    pub max_div: u8,
}

/// Pad driving strengths for one drive-select setting: clock, command, data.
#[derive(Debug, Clone, Copy)]
pub struct DrivingEntry {
    /// Clock pad strength.
    pub clk: u8,
    /// Command pad strength.
    pub cmd: u8,
    /// Data pad strength.
    pub dat: u8,
}

/// Driving table indexed by the 2-bit vendor drive-select field.
pub type DrivingTable = [DrivingEntry; 4];

/// Overcurrent protection tuning.
#[derive(Debug, Clone, Copy)]
pub struct OcpParams {
    /// Trip threshold register value.
    pub threshold: u8,
    /// Glitch filter register value.
    pub glitch: u8,
}

/// Per-chip configuration, immutable once the controller is constructed.
///
/// Defaults come from the chip module; the vendor-programmed fields
/// (drive selects, reverse socket) are overlaid from the settings dwords
/// fused into the device.
#[derive(Debug, Clone)]
pub struct ChipParams {
    /// PCI device ID of the generation.
    pub device_id: u16,
    /// SSC divider limits.
    pub ssc: ClockLimits,
    /// 3.3 V signaling driving table.
    pub driving_3v3: DrivingTable,
    /// 1.8 V signaling driving table.
    pub driving_1v8: DrivingTable,
    /// Selected 3.3 V driving entry.
    pub drive_sel_3v3: u8,
    /// Selected 1.8 V driving entry.
    pub drive_sel_1v8: u8,
    /// Default command push-point (tx) phase.
    pub tx_phase: u8,
    /// Default sample-point (rx) phase.
    pub sample_phase: u8,
    /// Overcurrent protection tuning.
    pub ocp: OcpParams,
    /// Card socket is mounted reversed on this board.
    pub reverse_socket: bool,
}

// ---------------------------------------------------------------------------
// Vendor settings decoding
// ---------------------------------------------------------------------------

/// Whether the vendor settings dwords were programmed at manufacture.
#[must_use]
pub(crate) const fn vendor_setting_valid(reg1: u32) -> bool {
    reg1 & (1 << 24) == 0
}

/// 1.8 V drive-select field of settings dword 1.
#[must_use]
pub(crate) const fn vendor_drive_sel_1v8(reg1: u32) -> u8 {
    ((reg1 >> 26) & 0x03) as u8
}

/// 3.3 V drive-select field of settings dword 2.
#[must_use]
pub(crate) const fn vendor_drive_sel_3v3(reg2: u32) -> u8 {
    ((reg2 >> 5) & 0x03) as u8
}

/// Reverse-socket flag of settings dword 2.
#[must_use]
pub(crate) const fn vendor_reverse_socket(reg2: u32) -> bool {
    reg2 & (1 << 14) != 0
}

/// Applies the vendor-programmed fields shared by every generation.
pub(crate) fn apply_common_vendor_settings(reg1: u32, reg2: u32, params: &mut ChipParams) {
    if !vendor_setting_valid(reg1) {
        return;
    }
    params.drive_sel_1v8 = vendor_drive_sel_1v8(reg1);
    params.drive_sel_3v3 = vendor_drive_sel_3v3(reg2);
    params.reverse_socket = vendor_reverse_socket(reg2);
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// Direction of the clock/divider-N conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvDir {
    /// Card clock in MHz to divider N.
    ClockToDivN,
    /// Divider N to card clock in MHz.
    DivNToClock,
}

/// Card signaling voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputVoltage {
    /// 3.3 V signaling.
    V330,
    /// 1.8 V signaling.
    V180,
}

/// Generation-specific behavior of one chip family member.
///
/// The power sequences are hardware bring-up quirks; each implementation
/// preserves its silicon's exact step/delay order.
pub trait ChipOps: Send + Sync {
    /// Marketing name of the generation.
    fn name(&self) -> &'static str;

    /// Factory defaults for the parameter bundle.
    fn default_params(&self) -> ChipParams;

    /// Overlays the vendor settings dwords onto the defaults.
    fn fetch_vendor_settings(&self, reg1: u32, reg2: u32, params: &mut ChipParams) {
        apply_common_vendor_settings(reg1, reg2, params);
    }

    /// Generation-specific hardware init, run at the end of `start()`.
    fn extra_init(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult {
        let _ = (acc, params);
        Ok(())
    }

    /// Powers the card rail up.
    fn power_on_card(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult;

    /// Powers the card rail down.
    fn power_off_card(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult;

    /// Switches the card signaling voltage.
    fn switch_output_voltage(
        &self,
        acc: &dyn ChipAccess,
        params: &ChipParams,
        voltage: OutputVoltage,
    ) -> DriverResult;

    /// Turns the activity LED on.
    fn turn_on_led(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(regs::GPIO_CTL, regs::GPIO_LED_ON, regs::GPIO_LED_ON)
    }

    /// Turns the activity LED off.
    fn turn_off_led(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(regs::GPIO_CTL, regs::GPIO_LED_ON, 0)
    }

    /// Arms overcurrent protection with the generation's thresholds.
    fn enable_ocp(&self, acc: &dyn ChipAccess, params: &ChipParams) -> DriverResult {
        acc.write_chip_register(regs::REG_OCPPARA2, 0xFF, params.ocp.threshold)?;
        acc.write_chip_register(regs::REG_OCPGLITCH, 0xFF, params.ocp.glitch)?;
        acc.write_chip_register(
            regs::REG_OCPCTL,
            regs::SD_OCP_DETECT_EN | regs::SD_OCP_INT_EN,
            regs::SD_OCP_DETECT_EN | regs::SD_OCP_INT_EN,
        )
    }

    /// Disarms overcurrent protection and clears any latched trip.
    fn disable_ocp(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(
            regs::REG_OCPCTL,
            regs::SD_OCP_DETECT_EN | regs::SD_OCP_INT_EN | regs::SD_OCP_CLEAR,
            regs::SD_OCP_CLEAR,
        )
    }

    /// Converts between card clock (MHz) and SSC divider N.
    ///
    /// The default pair is exact inverses; generations with a different
    /// divider pipeline override both directions together.
    fn conv_clk_and_div_n(&self, input: u32, dir: ConvDir) -> u32 {
        match dir {
            ConvDir::ClockToDivN => input.saturating_sub(2),
            ConvDir::DivNToClock => input + 2,
        }
    }

    /// Lets a generation throttle the requested clock after repeated DMA
    /// failures. Identity by default.
    fn adjust_dma_error_clock(&self, clock_hz: u32, dma_errors: u32) -> u32 {
        let _ = dma_errors;
        clock_hz
    }

    /// Drops every function into its lowest power state.
    fn force_power_down(&self, acc: &dyn ChipAccess) -> DriverResult {
        acc.write_chip_register(regs::FPDCTL, regs::ALL_POWER_DOWN, regs::ALL_POWER_DOWN)
    }

    /// Reads the silicon revision.
    fn ic_version(&self, acc: &dyn ChipAccess) -> DriverResult<u8> {
        Ok(acc.read_chip_register(regs::DUMMY_REG_RESET_0)? & regs::IC_VERSION_MASK)
    }
}

// ---------------------------------------------------------------------------
// Probe table
// ---------------------------------------------------------------------------

/// Maps a PCI device ID to its generation singleton.
#[must_use]
pub fn probe(device_id: u16) -> Option<&'static dyn ChipOps> {
    match device_id {
        0x5209 => Some(&rts5209::Rts5209),
        0x5227 => Some(&rts5227::Rts5227),
        0x5229 => Some(&rts5229::Rts5229),
        0x5249 => Some(&rts5249::Rts5249),
        0x525A => Some(&rts525a::Rts525a),
        _ => None,
    }
}
