//! The shared controller engine.
//!
//! One [`Controller`] drives one card-reader function: the chip-register
//! mailbox and PHY indirection, command-transfer sessions over the host
//! buffer, the scatter/gather DMA path, the interrupt service routine, and
//! the recovery sequence after a failed transfer. Generation-specific
//! behavior is delegated to the chip's [`ChipOps`] strategy object.
//!
//! Locking: one session mutex serializes the host buffer, the per-session
//! counter, and the cached card clock. The transfer completion has its own
//! mutex so the interrupt path never contends with a blocked client thread;
//! the client releases the session mutex before blocking.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rtsx_hal::{DmaDescriptor, DriverError, DriverResult, HostBuffer, HostBus};

use crate::chip::{self, ChipAccess, ChipOps, ChipParams, OutputVoltage};
use crate::cmd::{CMD_BUF_OFFSET, Command, CommandCounter, HOST_BUF_LEN, MAX_HOST_COMMANDS, SG_TBL_OFFSET};
use crate::dma::{self, DmaDirection};
use crate::regs::{self, Bier, Bipr};
use crate::xfer::{TransferCompletion, TransferStatus};

/// Saturation cap for the DMA error counter.
const DMA_ERROR_COUNT_MAX: u32 = 16;

/// Timeout for ping-pong buffer command batches.
const PPBUF_TIMEOUT_MS: u64 = 250;

/// Card slot notifications raised from the interrupt path.
pub trait CardEventHandler: Send + Sync {
    /// A card was inserted.
    fn card_inserted(&self);
    /// The card was removed.
    fn card_removed(&self);
}

/// Per-session state guarded by the serialization gate.
struct Session {
    /// Command tally of the current session.
    counter: CommandCounter,
    /// Effective SSC clock of the last successful switch, in MHz.
    /// Zero until the first switch.
    cur_clock_mhz: u32,
}

/// A Realtek PCIe card-reader controller function.
pub struct Controller {
    bus: Arc<dyn HostBus>,
    buf: Arc<dyn HostBuffer>,
    chip: &'static dyn ChipOps,
    params: ChipParams,
    session: Mutex<Session>,
    completion: TransferCompletion,
    dma_errors: AtomicU32,
    ocp_tripped: AtomicBool,
    events: Mutex<Option<Box<dyn CardEventHandler>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Controller {
    /// Creates a controller for the chip identified by its PCI device ID.
    ///
    /// Returns `None` for an unsupported device.
    pub fn probe(
        bus: Arc<dyn HostBus>,
        buf: Arc<dyn HostBuffer>,
        device_id: u16,
    ) -> Option<Self> {
        let chip = chip::probe(device_id)?;
        info!("rtsx: probing {} ({:#06x})", chip.name(), device_id);
        Some(Self::new(bus, buf, chip))
    }

    /// Creates a controller for a known chip generation.
    ///
    /// Reads the vendor settings dwords and freezes the parameter bundle.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is smaller than the host buffer layout requires.
    pub fn new(
        bus: Arc<dyn HostBus>,
        buf: Arc<dyn HostBuffer>,
        chip: &'static dyn ChipOps,
    ) -> Self {
        assert!(buf.len() >= HOST_BUF_LEN, "host buffer too small");

        let mut params = chip.default_params();
        let reg1 = bus.read_config32(regs::PCR_SETTING_REG1);
        let reg2 = bus.read_config32(regs::PCR_SETTING_REG2);
        chip.fetch_vendor_settings(reg1, reg2, &mut params);

        Self {
            bus,
            buf,
            chip,
            params,
            session: Mutex::new(Session {
                counter: CommandCounter::new(),
                cur_clock_mhz: 0,
            }),
            completion: TransferCompletion::new(),
            dma_errors: AtomicU32::new(0),
            ocp_tripped: AtomicBool::new(false),
            events: Mutex::new(None),
        }
    }

    /// The frozen parameter bundle.
    #[must_use]
    pub fn params(&self) -> &ChipParams {
        &self.params
    }

    /// The generation's strategy object.
    #[must_use]
    pub(crate) fn chip(&self) -> &'static dyn ChipOps {
        self.chip
    }

    /// Brings the hardware up: interrupt enables, common defaults, then the
    /// generation's extra init.
    pub fn start(&self) -> DriverResult {
        info!("rtsx: starting {}", self.chip.name());

        let enable =
            Bier::TRANS_OK_EN | Bier::TRANS_FAIL_EN | Bier::SD_INT_EN | Bier::SD_OC_INT_EN;
        self.bus.write32(regs::BIER, enable.bits());

        let drive = &self.params.driving_3v3[usize::from(self.params.drive_sel_3v3)];
        self.transfer_write_register_commands(
            &[
                (regs::HOST_SLEEP_STATE, regs::HOST_SLEEP_MASK, 0x00),
                (regs::CARD_SELECT, 0x07, regs::SD_MOD_SEL),
                (
                    regs::CARD_SHARE_MODE,
                    regs::CARD_SHARE_MASK,
                    regs::CARD_SHARE_48_SD,
                ),
                (regs::CARD_DATA_SOURCE, 0x01, regs::RING_BUFFER),
                (regs::SD30_CLK_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.clk),
                (regs::SD30_CMD_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.cmd),
                (regs::SD30_DAT_DRIVE_SEL, regs::DRIVER_TYPE_MASK, drive.dat),
                (regs::SD_PUSH_POINT_CTL, 0xFF, self.params.tx_phase),
                (regs::SD_SAMPLE_POINT_CTL, 0xFF, self.params.sample_phase),
            ],
            100,
        )?;

        self.chip.extra_init(self, &self.params)
    }

    // -----------------------------------------------------------------------
    // Direct register access
    // -----------------------------------------------------------------------

    /// Reads an 8-bit BAR register.
    #[must_use]
    pub fn read_register8(&self, offset: u32) -> u8 {
        self.bus.read8(offset)
    }

    /// Reads a 16-bit BAR register.
    #[must_use]
    pub fn read_register16(&self, offset: u32) -> u16 {
        self.bus.read16(offset)
    }

    /// Reads a 32-bit BAR register.
    #[must_use]
    pub fn read_register32(&self, offset: u32) -> u32 {
        self.bus.read32(offset)
    }

    /// Writes an 8-bit BAR register.
    pub fn write_register8(&self, offset: u32, value: u8) {
        self.bus.write8(offset, value);
    }

    /// Writes a 16-bit BAR register.
    pub fn write_register16(&self, offset: u32, value: u16) {
        self.bus.write16(offset, value);
    }

    /// Writes a 32-bit BAR register.
    pub fn write_register32(&self, offset: u32, value: u32) {
        self.bus.write32(offset, value);
    }

    // -----------------------------------------------------------------------
    // Chip-register mailbox
    // -----------------------------------------------------------------------

    /// Reads a chip register through the mailbox.
    pub fn read_chip_register(&self, addr: u16) -> DriverResult<u8> {
        let _gate = lock(&self.session);
        self.bus.write32(regs::HAIMR, regs::haimr_read_request(addr));
        for _ in 0..regs::MAX_MAILBOX_POLLS {
            let val = self.bus.read32(regs::HAIMR);
            if val & regs::HAIMR_BUSY == 0 {
                return Ok(val as u8);
            }
        }
        warn!("rtsx: mailbox read {addr:#06x} timed out");
        Err(DriverError::Timeout)
    }

    /// Masked write to a chip register through the mailbox.
    ///
    /// Distinguishes a write the hardware never finished
    /// ([`DriverError::Timeout`]) from one it finished but did not apply
    /// ([`DriverError::DeviceError`], echo mismatch).
    pub fn write_chip_register(&self, addr: u16, mask: u8, value: u8) -> DriverResult {
        let _gate = lock(&self.session);
        self.bus
            .write32(regs::HAIMR, regs::haimr_write_request(addr, mask, value));
        for _ in 0..regs::MAX_MAILBOX_POLLS {
            let val = self.bus.read32(regs::HAIMR);
            if val & regs::HAIMR_BUSY == 0 {
                if val as u8 != value {
                    warn!("rtsx: chip register {addr:#06x} write not applied");
                    return Err(DriverError::DeviceError);
                }
                return Ok(());
            }
        }
        warn!("rtsx: mailbox write {addr:#06x} timed out");
        Err(DriverError::Timeout)
    }

    /// Applies a sequence of masked writes, failing fast on the first error.
    ///
    /// The register file may be left partially updated on failure.
    pub fn write_chip_registers(&self, writes: &[(u16, u8, u8)]) -> DriverResult {
        for &(addr, mask, value) in writes {
            self.write_chip_register(addr, mask, value)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // PHY registers (indirection through chip registers)
    // -----------------------------------------------------------------------

    /// Reads a PHY register.
    pub fn read_phy_register(&self, addr: u8) -> DriverResult<u16> {
        self.write_chip_register(regs::PHY_ADDR, 0xFF, addr)?;
        self.write_chip_register(regs::PHY_RWCTL, 0xFF, regs::PHY_BUSY)?;
        self.wait_phy_idle()?;
        let lo = self.read_chip_register(regs::PHY_DATA0)?;
        let hi = self.read_chip_register(regs::PHY_DATA1)?;
        Ok(u16::from(hi) << 8 | u16::from(lo))
    }

    /// Writes a PHY register.
    pub fn write_phy_register(&self, addr: u8, value: u16) -> DriverResult {
        self.write_chip_register(regs::PHY_DATA0, 0xFF, value as u8)?;
        self.write_chip_register(regs::PHY_DATA1, 0xFF, (value >> 8) as u8)?;
        self.write_chip_register(regs::PHY_ADDR, 0xFF, addr)?;
        self.write_chip_register(regs::PHY_RWCTL, 0xFF, regs::PHY_BUSY | regs::PHY_WRITE)?;
        self.wait_phy_idle()
    }

    fn wait_phy_idle(&self) -> DriverResult {
        for _ in 0..regs::MAX_PHY_POLLS {
            if self.read_chip_register(regs::PHY_RWCTL)? & regs::PHY_BUSY == 0 {
                return Ok(());
            }
        }
        warn!("rtsx: PHY access timed out");
        Err(DriverError::Timeout)
    }

    // -----------------------------------------------------------------------
    // Command-transfer sessions
    // -----------------------------------------------------------------------

    /// Opens a session: resets the command tally. Must precede enqueues.
    pub fn begin_command_transfer(&self) {
        lock(&self.session).counter.reset();
    }

    /// Stages one command, failing with [`DriverError::Busy`] when the
    /// session already holds [`MAX_HOST_COMMANDS`] commands.
    pub fn enqueue_command(&self, cmd: Command) -> DriverResult {
        let mut session = lock(&self.session);
        let idx = session.counter.total();
        session.counter.record(cmd.kind())?;
        self.buf.write(CMD_BUF_OFFSET + idx * 4, &cmd.encode());
        Ok(())
    }

    /// Stages a read command per address, failing fast.
    pub fn enqueue_read_register_commands(&self, addrs: &[u16]) -> DriverResult {
        for &addr in addrs {
            self.enqueue_command(Command::read(addr))?;
        }
        Ok(())
    }

    /// Stages a masked write command per tuple, failing fast.
    pub fn enqueue_write_register_commands(&self, writes: &[(u16, u8, u8)]) -> DriverResult {
        for &(addr, mask, value) in writes {
            self.enqueue_command(Command::write(addr, mask, value))?;
        }
        Ok(())
    }

    /// Flushes the session to hardware and blocks until it resolves.
    ///
    /// On [`DriverError::Timeout`] or [`DriverError::DeviceError`] the
    /// command/DMA state machines are stale; run [`Self::stop_transfer`] and
    /// [`Self::clear_error`] before the next session.
    pub fn end_command_transfer(&self, timeout_ms: u64) -> DriverResult {
        let byte_len = (lock(&self.session).counter.total() * 4) as u32;
        self.completion.arm();
        self.bus.write32(regs::HCBAR, self.buf.bus_addr() as u32);
        self.bus
            .write32(regs::HCBCTLR, regs::START_CMD | (byte_len & regs::CMD_BYTE_LEN_MASK));
        self.finish_transfer(timeout_ms, "command")
    }

    /// Reads response slot `idx` of the last completed session.
    #[must_use]
    pub fn response(&self, idx: usize) -> u32 {
        self.buf.read_u32(CMD_BUF_OFFSET + idx * 4)
    }

    /// Response slots the last session produced (reads + checks).
    #[must_use]
    pub fn response_len(&self) -> usize {
        lock(&self.session).counter.response_len()
    }

    /// One-shot session reading `addrs`.
    pub fn transfer_read_register_commands(
        &self,
        addrs: &[u16],
        timeout_ms: u64,
    ) -> DriverResult {
        self.with_custom_command_transfer(timeout_ms, |c| c.enqueue_read_register_commands(addrs))
    }

    /// One-shot session applying `writes`.
    pub fn transfer_write_register_commands(
        &self,
        writes: &[(u16, u8, u8)],
        timeout_ms: u64,
    ) -> DriverResult {
        self.with_custom_command_transfer(timeout_ms, |c| {
            c.enqueue_write_register_commands(writes)
        })
    }

    /// Runs `enqueue` inside one session, so several logical operations can
    /// share a single hardware round trip.
    pub fn with_custom_command_transfer<F>(&self, timeout_ms: u64, enqueue: F) -> DriverResult
    where
        F: FnOnce(&Self) -> DriverResult,
    {
        self.begin_command_transfer();
        enqueue(self)?;
        self.end_command_transfer(timeout_ms)
    }

    fn finish_transfer(&self, timeout_ms: u64, what: &str) -> DriverResult {
        match self.completion.wait(Duration::from_millis(timeout_ms)) {
            TransferStatus::Success => Ok(()),
            TransferStatus::Error => {
                warn!("rtsx: {what} transfer failed");
                Err(DriverError::DeviceError)
            }
            TransferStatus::Timeout | TransferStatus::NotReady => {
                warn!("rtsx: {what} transfer timed out after {timeout_ms} ms");
                Err(DriverError::Timeout)
            }
        }
    }

    // -----------------------------------------------------------------------
    // DMA transfers
    // -----------------------------------------------------------------------

    /// Stages the scatter/gather table for `desc` in the host buffer.
    pub fn enqueue_dma_command(&self, desc: &DmaDescriptor) -> DriverResult {
        let _gate = lock(&self.session);
        dma::write_sg_table(&*self.buf, desc)
    }

    /// Runs one scatter/gather transfer to completion.
    ///
    /// On failure the bounded DMA error counter is bumped (the clock-switch
    /// throttle hook consumes it) and the host error-clear recovery runs
    /// before the error is returned.
    pub fn perform_dma_transfer(
        &self,
        desc: &DmaDescriptor,
        timeout_ms: u64,
        dir: DmaDirection,
    ) -> DriverResult {
        self.enqueue_dma_command(desc)?;

        self.completion.arm();
        self.bus
            .write32(regs::HDBAR, (self.buf.bus_addr() + SG_TBL_OFFSET as u64) as u32);
        let mut ctl = regs::TRIG_DMA | regs::ADMA_MODE;
        if dir == DmaDirection::FromCard {
            ctl |= regs::DMA_DIR_FROM_CARD;
        }
        self.bus.write32(regs::HDBCTLR, ctl);

        match self.finish_transfer(timeout_ms, "DMA") {
            Ok(()) => Ok(()),
            Err(err) => {
                let count = self.note_dma_error();
                warn!("rtsx: DMA error #{count}, running recovery");
                self.stop_transfer();
                if let Err(recovery) = self.clear_error() {
                    warn!("rtsx: error recovery failed: {recovery}");
                }
                Err(err)
            }
        }
    }

    /// Card-to-host transfer.
    pub fn perform_dma_read(&self, desc: &DmaDescriptor, timeout_ms: u64) -> DriverResult {
        self.perform_dma_transfer(desc, timeout_ms, DmaDirection::FromCard)
    }

    /// Host-to-card transfer.
    pub fn perform_dma_write(&self, desc: &DmaDescriptor, timeout_ms: u64) -> DriverResult {
        self.perform_dma_transfer(desc, timeout_ms, DmaDirection::ToCard)
    }

    /// Failed DMA transfers since start, saturating at the counter cap.
    #[must_use]
    pub fn dma_error_count(&self) -> u32 {
        self.dma_errors.load(Ordering::Acquire)
    }

    fn note_dma_error(&self) -> u32 {
        let _ = self
            .dma_errors
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < DMA_ERROR_COUNT_MAX).then_some(count + 1)
            });
        self.dma_errors.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    /// Aborts the command and DMA state machines.
    pub fn stop_transfer(&self) {
        self.bus.write32(regs::HCBCTLR, regs::STOP_CMD);
        self.bus.write32(regs::HDBCTLR, regs::STOP_DMA);
    }

    /// Resets the DMA engine and flushes the internal ring buffer.
    ///
    /// Mandatory after a session resolves with Timeout or DeviceError.
    pub fn clear_error(&self) -> DriverResult {
        self.write_chip_register(regs::DMACTL, regs::DMA_RST, regs::DMA_RST)?;
        self.write_chip_register(regs::RBCTL, regs::RB_FLUSH, regs::RB_FLUSH)
    }

    /// Stops the SD module and clears its latched error state.
    pub fn clear_card_error(&self) -> DriverResult {
        self.write_chip_register(
            regs::CARD_STOP,
            regs::SD_STOP | regs::SD_CLR_ERR,
            regs::SD_STOP | regs::SD_CLR_ERR,
        )
    }

    // -----------------------------------------------------------------------
    // Interrupt service
    // -----------------------------------------------------------------------

    /// Services a hardware interrupt.
    ///
    /// Reads and acknowledges the pending causes, dispatches card events,
    /// latches overcurrent trips, and resolves the in-flight transfer. A
    /// completion arriving after the waiter timed out is a no-op.
    pub fn handle_interrupt(&self) {
        let pending = Bipr::from_bits_retain(self.bus.read32(regs::BIPR));
        if pending.is_empty() {
            return;
        }
        self.bus
            .write32(regs::BIPR, pending.bits() & regs::BIPR_CLEARABLE);

        if pending.contains(Bipr::SD_OC_INT) {
            self.ocp_tripped.store(true, Ordering::Release);
            warn!("rtsx: overcurrent on card power rail");
        }

        if pending.contains(Bipr::SD_INT) {
            let inserted = pending.contains(Bipr::SD_EXIST);
            info!(
                "rtsx: card {}",
                if inserted { "inserted" } else { "removed" }
            );
            if let Some(handler) = &*lock(&self.events) {
                if inserted {
                    handler.card_inserted();
                } else {
                    handler.card_removed();
                }
            }
        }

        if pending.intersects(Bipr::TRANS_OK | Bipr::TRANS_FAIL) {
            let status = if pending.contains(Bipr::TRANS_FAIL) {
                TransferStatus::Error
            } else {
                TransferStatus::Success
            };
            if !self.completion.resolve(status) {
                debug!("rtsx: late completion ignored");
            }
        }
    }

    /// Registers the card event sink invoked from the interrupt path.
    pub fn set_card_event_handler(&self, handler: Box<dyn CardEventHandler>) {
        *lock(&self.events) = Some(handler);
    }

    // -----------------------------------------------------------------------
    // Slot queries
    // -----------------------------------------------------------------------

    /// Whether a card is in the slot.
    #[must_use]
    pub fn card_present(&self) -> bool {
        Bipr::from_bits_retain(self.bus.read32(regs::BIPR)).contains(Bipr::SD_EXIST)
    }

    /// Whether the card's write-protect switch is set.
    #[must_use]
    pub fn card_write_protected(&self) -> bool {
        Bipr::from_bits_retain(self.bus.read32(regs::BIPR)).contains(Bipr::SD_WRITE_PROTECT)
    }

    /// Whether an overcurrent trip has been latched since the last
    /// [`Self::enable_ocp`].
    #[must_use]
    pub fn ocp_tripped(&self) -> bool {
        self.ocp_tripped.load(Ordering::Acquire)
    }

    /// Command push-point phase used during tuning.
    #[must_use]
    pub fn tx_phase(&self) -> u8 {
        self.params.tx_phase
    }

    /// Sample-point phase used during tuning.
    #[must_use]
    pub fn sample_phase(&self) -> u8 {
        self.params.sample_phase
    }

    // -----------------------------------------------------------------------
    // Ping-pong buffer
    // -----------------------------------------------------------------------

    /// Reads from the 512-byte on-device staging buffer.
    pub fn read_ppbuf(&self, offset: usize, out: &mut [u8]) -> DriverResult {
        if out.is_empty() || offset.checked_add(out.len()).is_none_or(|end| end > regs::PPBUF_LEN) {
            return Err(DriverError::BadArgument);
        }
        let mut pos = offset;
        for chunk in out.chunks_mut(MAX_HOST_COMMANDS) {
            self.begin_command_transfer();
            for i in 0..chunk.len() {
                self.enqueue_command(Command::read(regs::PPBUF_BASE + (pos + i) as u16))?;
            }
            self.end_command_transfer(PPBUF_TIMEOUT_MS)?;
            for (i, byte) in chunk.iter_mut().enumerate() {
                *byte = self.response(i) as u8;
            }
            pos += chunk.len();
        }
        Ok(())
    }

    /// Writes into the 512-byte on-device staging buffer.
    pub fn write_ppbuf(&self, offset: usize, data: &[u8]) -> DriverResult {
        if data.is_empty() || offset.checked_add(data.len()).is_none_or(|end| end > regs::PPBUF_LEN)
        {
            return Err(DriverError::BadArgument);
        }
        let mut pos = offset;
        for chunk in data.chunks(MAX_HOST_COMMANDS) {
            self.begin_command_transfer();
            for (i, &byte) in chunk.iter().enumerate() {
                self.enqueue_command(Command::write(
                    regs::PPBUF_BASE + (pos + i) as u16,
                    0xFF,
                    byte,
                ))?;
            }
            self.end_command_transfer(PPBUF_TIMEOUT_MS)?;
            pos += chunk.len();
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Device-specific operations (chip strategy dispatch)
    // -----------------------------------------------------------------------

    /// Powers the card rail up using the generation's bring-up sequence.
    pub fn power_on_card(&self) -> DriverResult {
        self.chip.power_on_card(self, &self.params)
    }

    /// Powers the card rail down.
    pub fn power_off_card(&self) -> DriverResult {
        self.chip.power_off_card(self, &self.params)
    }

    /// Switches the card signaling voltage.
    pub fn switch_output_voltage(&self, voltage: OutputVoltage) -> DriverResult {
        self.chip.switch_output_voltage(self, &self.params, voltage)
    }

    /// Turns the activity LED on.
    pub fn turn_on_led(&self) -> DriverResult {
        self.chip.turn_on_led(self)
    }

    /// Turns the activity LED off.
    pub fn turn_off_led(&self) -> DriverResult {
        self.chip.turn_off_led(self)
    }

    /// Arms overcurrent protection and clears any latched trip.
    pub fn enable_ocp(&self) -> DriverResult {
        self.ocp_tripped.store(false, Ordering::Release);
        self.chip.enable_ocp(self, &self.params)
    }

    /// Disarms overcurrent protection.
    pub fn disable_ocp(&self) -> DriverResult {
        self.chip.disable_ocp(self)
    }

    /// Drops every function into its lowest power state.
    pub fn force_power_down(&self) -> DriverResult {
        self.chip.force_power_down(self)
    }

    /// Reads the silicon revision through the generation's detection hook.
    pub fn ic_version(&self) -> DriverResult<u8> {
        self.chip.ic_version(self)
    }

    // -----------------------------------------------------------------------
    // Clock cache (used by the switch algorithm)
    // -----------------------------------------------------------------------

    pub(crate) fn current_clock_mhz(&self) -> u32 {
        lock(&self.session).cur_clock_mhz
    }

    pub(crate) fn set_current_clock_mhz(&self, clk: u32) {
        lock(&self.session).cur_clock_mhz = clk;
    }

    pub(crate) fn delay_us(&self, us: u64) {
        thread::sleep(Duration::from_micros(us));
    }

    pub(crate) fn delay_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

impl ChipAccess for Controller {
    fn read_chip_register(&self, addr: u16) -> DriverResult<u8> {
        Controller::read_chip_register(self, addr)
    }

    fn write_chip_register(&self, addr: u16, mask: u8, value: u8) -> DriverResult {
        Controller::write_chip_register(self, addr, mask, value)
    }

    fn write_chip_batch(&self, writes: &[(u16, u8, u8)], timeout_ms: u64) -> DriverResult {
        self.transfer_write_register_commands(writes, timeout_ms)
    }

    fn read_phy_register(&self, addr: u8) -> DriverResult<u16> {
        Controller::read_phy_register(self, addr)
    }

    fn write_phy_register(&self, addr: u8, value: u16) -> DriverResult {
        Controller::write_phy_register(self, addr, value)
    }

    fn delay_us(&self, us: u64) {
        Controller::delay_us(self, us);
    }

    fn delay_ms(&self, ms: u64) {
        Controller::delay_ms(self, ms);
    }
}
