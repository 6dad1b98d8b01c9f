//! Register offsets and bit layouts for the card-reader controller family.
//!
//! The BAR window holds the host transport registers (command/data buffer
//! doorbells, the chip-register mailbox, and the interrupt block). Everything
//! else lives in the 14-bit "chip register" space reached through the
//! mailbox; the conventional 16-bit addresses below carry two high bits the
//! wire drops. Addresses and thresholds that vary between chip generations
//! are carried in the per-chip parameter bundles, not here.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// BAR registers
// ---------------------------------------------------------------------------

/// Host command buffer bus address.
pub const HCBAR: u32 = 0x00;
/// Host command buffer control (doorbell).
pub const HCBCTLR: u32 = 0x04;
/// Host data buffer bus address.
pub const HDBAR: u32 = 0x08;
/// Host data buffer control (doorbell).
pub const HDBCTLR: u32 = 0x0C;
/// Host access internal memory register (chip-register mailbox).
pub const HAIMR: u32 = 0x10;
/// Bus interrupt pending register.
pub const BIPR: u32 = 0x14;
/// Bus interrupt enable register.
pub const BIER: u32 = 0x18;

// ---------------------------------------------------------------------------
// Doorbell encodings
// ---------------------------------------------------------------------------

/// HCBCTLR: start executing the staged command batch.
pub const START_CMD: u32 = 1 << 31;
/// HCBCTLR: abort the command state machine.
pub const STOP_CMD: u32 = 1 << 28;
/// HCBCTLR: byte count of the staged batch (low 24 bits).
pub const CMD_BYTE_LEN_MASK: u32 = 0x00FF_FFFF;

/// HDBCTLR: trigger the staged DMA transfer.
pub const TRIG_DMA: u32 = 1 << 31;
/// HDBCTLR: transfer direction is card-to-host.
pub const DMA_DIR_FROM_CARD: u32 = 1 << 29;
/// HDBCTLR: abort the DMA state machine.
pub const STOP_DMA: u32 = 1 << 28;
/// HDBCTLR: scatter/gather ("advanced") DMA mode.
pub const ADMA_MODE: u32 = 0b10 << 26;

// ---------------------------------------------------------------------------
// Mailbox (HAIMR) encoding
// ---------------------------------------------------------------------------

/// Transfer in progress; hardware clears it on completion.
pub const HAIMR_BUSY: u32 = 1 << 31;
/// Request is a write (read otherwise).
pub const HAIMR_WRITE: u32 = 1 << 30;
/// Bounded poll count for the busy bit.
pub const MAX_MAILBOX_POLLS: u32 = 1024;

/// Encodes a mailbox read request.
#[must_use]
pub const fn haimr_read_request(addr: u16) -> u32 {
    HAIMR_BUSY | ((addr as u32 & 0x3FFF) << 16)
}

/// Encodes a mailbox write request.
#[must_use]
pub const fn haimr_write_request(addr: u16, mask: u8, value: u8) -> u32 {
    HAIMR_BUSY | HAIMR_WRITE | ((addr as u32 & 0x3FFF) << 16) | ((mask as u32) << 8) | value as u32
}

// ---------------------------------------------------------------------------
// Interrupt bitflags
// ---------------------------------------------------------------------------

bitflags! {
    /// Bus interrupt pending (BIPR) flags.
    ///
    /// The event bits (31..20 and the OC bit) are write-one-to-clear; the
    /// presence/write-protect bits reflect pad state and are read-only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Bipr: u32 {
        /// Command batch finished executing.
        const CMD_DONE = 1 << 31;
        /// Data transfer finished moving bytes.
        const DATA_DONE = 1 << 30;
        /// Transfer completed successfully.
        const TRANS_OK = 1 << 29;
        /// Transfer completed with failure.
        const TRANS_FAIL = 1 << 28;
        /// SD card event (insertion/removal edge).
        const SD_INT = 1 << 25;
        /// SD card write-protect switch state.
        const SD_WRITE_PROTECT = 1 << 19;
        /// SD card present.
        const SD_EXIST = 1 << 16;
        /// Overcurrent detected on the card power rail.
        const SD_OC_INT = 1 << 11;
    }
}

bitflags! {
    /// Bus interrupt enable (BIER) flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Bier: u32 {
        /// Command-done interrupt enable.
        const CMD_DONE_EN = 1 << 31;
        /// Data-done interrupt enable.
        const DATA_DONE_EN = 1 << 30;
        /// Transfer-ok interrupt enable.
        const TRANS_OK_EN = 1 << 29;
        /// Transfer-fail interrupt enable.
        const TRANS_FAIL_EN = 1 << 28;
        /// SD card event interrupt enable.
        const SD_INT_EN = 1 << 25;
        /// Overcurrent interrupt enable.
        const SD_OC_INT_EN = 1 << 11;
    }
}

/// BIPR bits cleared by writing them back (the event bits).
pub const BIPR_CLEARABLE: u32 = Bipr::CMD_DONE.bits()
    | Bipr::DATA_DONE.bits()
    | Bipr::TRANS_OK.bits()
    | Bipr::TRANS_FAIL.bits()
    | Bipr::SD_INT.bits()
    | Bipr::SD_OC_INT.bits();

// ---------------------------------------------------------------------------
// Scatter/gather entry option bits
// ---------------------------------------------------------------------------

/// Entry is valid.
pub const SG_VALID: u64 = 0x01;
/// Entry is the last of the table.
pub const SG_END: u64 = 0x02;
/// Function field: move data for this entry.
pub const SG_TRANS_DATA: u64 = 0b0010 << 4;

// ---------------------------------------------------------------------------
// Chip registers — clock block
// ---------------------------------------------------------------------------

/// Function power-down control.
pub const FPDCTL: u16 = 0xFC00;
/// FPDCTL: power down every function.
pub const ALL_POWER_DOWN: u8 = 0x07;
/// FPDCTL: power down the overcurrent block.
pub const OC_POWER_DOWN: u8 = 0x02;

/// Clock control.
pub const CLK_CTL: u16 = 0xFC02;
/// CLK_CTL: run the card clock from the low-frequency source.
pub const CLK_LOW_FREQ: u8 = 0x01;

/// Clock divider / MCU count.
pub const CLK_DIV: u16 = 0xFC03;
/// Clock source select.
pub const CLK_SEL: u16 = 0xFC04;

/// SSC divider N (low byte).
pub const SSC_DIV_N_0: u16 = 0xFC0F;
/// SSC divider N (high byte).
pub const SSC_DIV_N_1: u16 = 0xFC10;

/// SSC control 1.
pub const SSC_CTL1: u16 = 0xFC11;
/// SSC_CTL1: release the SSC block from reset.
pub const SSC_RSTB: u8 = 0x80;

/// SSC control 2.
pub const SSC_CTL2: u16 = 0xFC12;
/// SSC_CTL2: spread depth field.
pub const SSC_DEPTH_MASK: u8 = 0x07;

/// SSC depth register values, indexed by nominal spread.
pub const SSC_DEPTH_4M: u8 = 0x01;
/// 2 MHz nominal spread.
pub const SSC_DEPTH_2M: u8 = 0x02;
/// 1 MHz nominal spread.
pub const SSC_DEPTH_1M: u8 = 0x03;
/// 500 kHz nominal spread.
pub const SSC_DEPTH_500K: u8 = 0x04;
/// 250 kHz nominal spread.
pub const SSC_DEPTH_250K: u8 = 0x05;

/// SD variable-phase clock 0 control.
pub const SD_VPCLK0_CTL: u16 = 0xFC2A;
/// SD variable-phase clock 1 control.
pub const SD_VPCLK1_CTL: u16 = 0xFC2B;
/// VPCLK control: phase circuit out of reset.
pub const PHASE_NOT_RESET: u8 = 0x40;

/// Card clock source select.
pub const CARD_CLK_SOURCE: u16 = 0xFC2E;
/// GPIO control (LED on the 5227/5229/5249 generations).
pub const GPIO_CTL: u16 = 0xFC1F;
/// GPIO_CTL: LED drive bit.
pub const GPIO_LED_ON: u8 = 0x02;

// ---------------------------------------------------------------------------
// Chip registers — card block
// ---------------------------------------------------------------------------

/// Card power control.
pub const CARD_PWR_CTL: u16 = 0xFD50;
/// CARD_PWR_CTL: SD power field.
pub const SD_POWER_MASK: u8 = 0x03;
/// SD power field: fully on.
pub const SD_POWER_ON: u8 = 0x00;
/// SD power field: partial (inrush-limited) power.
pub const SD_PARTIAL_POWER_ON: u8 = 0x01;
/// SD power field: off.
pub const SD_POWER_OFF: u8 = 0x03;
/// CARD_PWR_CTL: PMOS strength field.
pub const PMOS_STRG_MASK: u8 = 0x10;
/// PMOS strength: 800 mA.
pub const PMOS_STRG_800MA: u8 = 0x10;
/// PMOS strength: 400 mA.
pub const PMOS_STRG_400MA: u8 = 0x00;

/// Card share mode.
pub const CARD_SHARE_MODE: u16 = 0xFD52;
/// CARD_SHARE_MODE: share field.
pub const CARD_SHARE_MASK: u8 = 0x0F;
/// Share field: route the 48-pin package to SD.
pub const CARD_SHARE_48_SD: u8 = 0x04;

/// Card stop/clear control.
pub const CARD_STOP: u16 = 0xFD54;
/// CARD_STOP: stop the SD module.
pub const SD_STOP: u8 = 0x04;
/// CARD_STOP: clear latched SD errors.
pub const SD_CLR_ERR: u8 = 0x40;

/// Card output enable.
pub const CARD_OE: u16 = 0xFD55;
/// CARD_OE: drive the SD outputs.
pub const SD_OUTPUT_EN: u8 = 0x04;

/// Card auto-blink control (LED blinking on transfers).
pub const CARD_AUTO_BLINK: u16 = 0xFD56;
/// CARD_AUTO_BLINK: enable blinking.
pub const BLINK_EN: u8 = 0x08;

/// Card GPIO direction.
pub const CARD_GPIO_DIR: u16 = 0xFD57;
/// Card GPIO data (LED on the 5209 generation).
pub const CARD_GPIO: u16 = 0xFD58;
/// CARD_GPIO: LED drive bit (active low).
pub const CARD_GPIO_LED_MASK: u8 = 0x01;

/// SD 3.0 clock pad driving selector.
pub const SD30_CLK_DRIVE_SEL: u16 = 0xFD5A;
/// SD 3.0 command pad driving selector.
pub const SD30_CMD_DRIVE_SEL: u16 = 0xFD5E;
/// SD 3.0 data pad driving selector.
pub const SD30_DAT_DRIVE_SEL: u16 = 0xFD5F;
/// Drive-select registers: driver strength field.
pub const DRIVER_TYPE_MASK: u8 = 0x07;

/// Card data source (ring buffer vs. ping-pong buffer).
pub const CARD_DATA_SOURCE: u16 = 0xFD5B;
/// Data source: 512-byte ping-pong buffer.
pub const PINGPONG_BUFFER: u8 = 0x01;
/// Data source: DMA ring buffer.
pub const RING_BUFFER: u8 = 0x00;

/// Card module select.
pub const CARD_SELECT: u16 = 0xFD5C;
/// Module select: SD.
pub const SD_MOD_SEL: u8 = 0x02;

/// Card clock enable.
pub const CARD_CLK_EN: u16 = 0xFD69;
/// CARD_CLK_EN: SD clock enable.
pub const SD_CLK_EN: u8 = 0x04;

/// Card-detect pad control.
pub const CD_PAD_CTL: u16 = 0xFD73;
/// CD_PAD_CTL: disable card-detect debounce.
pub const CD_DISABLE_MASK: u8 = 0x07;

// ---------------------------------------------------------------------------
// Chip registers — overcurrent protection
// ---------------------------------------------------------------------------

/// OCP control.
pub const REG_OCPCTL: u16 = 0xFD6A;
/// OCP parameter 1 (glitch filter time base).
pub const REG_OCPPARA1: u16 = 0xFD6B;
/// OCP glitch width.
pub const REG_OCPGLITCH: u16 = 0xFD6C;
/// OCP parameter 2 (trip threshold).
pub const REG_OCPPARA2: u16 = 0xFD6D;
/// OCP status (latched trip bits).
pub const REG_OCPSTAT: u16 = 0xFD6E;
/// REG_OCPCTL: detection enable.
pub const SD_OCP_DETECT_EN: u8 = 0x08;
/// REG_OCPCTL: interrupt enable.
pub const SD_OCP_INT_EN: u8 = 0x04;
/// REG_OCPCTL: clear the latched trip state.
pub const SD_OCP_CLEAR: u8 = 0x01;

// ---------------------------------------------------------------------------
// Chip registers — SD configuration
// ---------------------------------------------------------------------------

/// SD configuration 1 (bus width, initial-mode clock divider).
pub const SD_CFG1: u16 = 0xFDA0;
/// SD_CFG1: initial-mode clock divider field.
pub const SD_CLK_DIVIDE_MASK: u8 = 0xC0;
/// Divider field: no division.
pub const SD_CLK_DIVIDE_0: u8 = 0x00;
/// Divider field: divide by 128.
pub const SD_CLK_DIVIDE_128: u8 = 0x80;
/// Divider field: divide by 256.
pub const SD_CLK_DIVIDE_256: u8 = 0xC0;

/// SD command push-point (tx phase) control.
pub const SD_PUSH_POINT_CTL: u16 = 0xFDA6;
/// SD sample-point (rx phase) control.
pub const SD_SAMPLE_POINT_CTL: u16 = 0xFDA7;

// ---------------------------------------------------------------------------
// Chip registers — PCIe/DMA block
// ---------------------------------------------------------------------------

/// DMA engine control.
pub const DMACTL: u16 = 0xFE2C;
/// DMACTL: reset the DMA engine.
pub const DMA_RST: u8 = 0x80;

/// Ring buffer control.
pub const RBCTL: u16 = 0xFE34;
/// RBCTL: flush the internal ring buffer.
pub const RB_FLUSH: u8 = 0x80;

/// Host sleep state.
pub const HOST_SLEEP_STATE: u16 = 0xFE60;
/// HOST_SLEEP_STATE: sleep state field (0 = awake).
pub const HOST_SLEEP_MASK: u8 = 0x03;

/// LDO power gate control.
pub const PWR_GATE_CTRL: u16 = 0xFE75;
/// PWR_GATE_CTRL: enable the power gate.
pub const PWR_GATE_EN: u8 = 0x01;
/// PWR_GATE_CTRL: LDO3318 state field.
pub const LDO3318_PWR_MASK: u8 = 0x06;
/// LDO3318 state: on.
pub const LDO_ON: u8 = 0x00;
/// LDO3318 state: suspended.
pub const LDO_SUSPEND: u8 = 0x02;
/// LDO3318 state: off.
pub const LDO_OFF: u8 = 0x06;

/// PCIe TX configuration (reverse-socket routing).
pub const PETXCFG: u16 = 0xFE49;

/// Reset/version scratch register.
pub const DUMMY_REG_RESET_0: u16 = 0xFE90;
/// DUMMY_REG_RESET_0: silicon revision field.
pub const IC_VERSION_MASK: u8 = 0x0F;

// ---------------------------------------------------------------------------
// Chip registers — PHY indirection
// ---------------------------------------------------------------------------

/// PHY read/write control.
pub const PHY_RWCTL: u16 = 0xFE28;
/// PHY_RWCTL: access in progress.
pub const PHY_BUSY: u8 = 0x80;
/// PHY_RWCTL: request is a write (read otherwise).
pub const PHY_WRITE: u8 = 0x01;
/// PHY data (low half).
pub const PHY_DATA0: u16 = 0xFE29;
/// PHY data (high half).
pub const PHY_DATA1: u16 = 0xFE2A;
/// PHY register address.
pub const PHY_ADDR: u16 = 0xFE2B;
/// Bounded poll count for the PHY busy bit (each poll is a mailbox read).
pub const MAX_PHY_POLLS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Chip registers — ping-pong buffer
// ---------------------------------------------------------------------------

/// First byte of the on-device ping-pong staging buffer.
pub const PPBUF_BASE: u16 = 0xF800;
/// Ping-pong buffer length in bytes.
pub const PPBUF_LEN: usize = 512;

// ---------------------------------------------------------------------------
// PCI configuration space
// ---------------------------------------------------------------------------

/// Vendor settings dword 1.
pub const PCR_SETTING_REG1: u16 = 0x724;
/// Vendor settings dword 2.
pub const PCR_SETTING_REG2: u16 = 0x814;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_request_layout() {
        let req = haimr_write_request(0x3FFF, 0xAA, 0x55);
        assert_eq!(req & HAIMR_BUSY, HAIMR_BUSY);
        assert_eq!(req & HAIMR_WRITE, HAIMR_WRITE);
        assert_eq!((req >> 16) & 0x3FFF, 0x3FFF);
        assert_eq!((req >> 8) & 0xFF, 0xAA);
        assert_eq!(req & 0xFF, 0x55);

        // Address is truncated to 14 bits.
        let req = haimr_read_request(0xFFFF);
        assert_eq!((req >> 16) & 0x3FFF, 0x3FFF);
        assert_eq!(req & HAIMR_WRITE, 0);
    }

    #[test]
    fn clearable_mask_excludes_presence_bits() {
        assert_eq!(BIPR_CLEARABLE & Bipr::SD_EXIST.bits(), 0);
        assert_eq!(BIPR_CLEARABLE & Bipr::SD_WRITE_PROTECT.bits(), 0);
        assert_ne!(BIPR_CLEARABLE & Bipr::TRANS_OK.bits(), 0);
    }
}
