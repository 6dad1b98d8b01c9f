//! Simulated card-reader device for integration tests.
//!
//! Models the device end of the transport: a chip-register file behind the
//! mailbox, the PHY indirection, a command-batch interpreter that walks the
//! host buffer exactly as the hardware does, and a scatter/gather walker.
//! Completion behavior is scripted through [`CompletionMode`].

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rtsx_core::chip;
use rtsx_core::cmd::{Command, CommandKind, HOST_BUF_LEN, SG_TBL_OFFSET};
use rtsx_core::controller::Controller;
use rtsx_core::dma::SgEntry;
use rtsx_core::regs;
use rtsx_hal::{HostBuffer, HostBus};

/// Bus address the simulated buffer reports.
pub const SIM_BUF_BUS_ADDR: u64 = 0x0010_0000;

/// How the simulated device resolves transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Execute and raise `TRANS_OK`.
    AutoOk,
    /// Execute and raise `TRANS_FAIL`.
    AutoFail,
    /// Execute but never raise a completion.
    Never,
}

struct SimState {
    chip_regs: Vec<u8>,
    phy_regs: Vec<u16>,
    haimr: u32,
    bipr: u32,
    bier: u32,
    hcbar: u32,
    hdbar: u32,
    buffer: Vec<u8>,
    mode: CompletionMode,
    cmd_batches: u32,
    dma_triggers: u32,
    cmd_stops: u32,
    dma_stops: u32,
    last_dma_ctl: u32,
    sg_entries: Vec<SgEntry>,
    vendor_reg1: u32,
    vendor_reg2: u32,
}

/// The device end of the transport.
pub struct SimDevice {
    state: Mutex<SimState>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Chip-register index: the transport carries only the low 14 address bits.
fn reg_index(addr: u16) -> usize {
    (addr & 0x3FFF) as usize
}

impl SimDevice {
    pub fn new() -> Arc<Self> {
        Self::with_mode(CompletionMode::AutoOk)
    }

    pub fn with_mode(mode: CompletionMode) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimState {
                chip_regs: vec![0; 0x4000],
                phy_regs: vec![0; 0x100],
                haimr: 0,
                bipr: 0,
                bier: 0,
                hcbar: 0,
                hdbar: 0,
                buffer: vec![0; HOST_BUF_LEN],
                mode,
                cmd_batches: 0,
                dma_triggers: 0,
                cmd_stops: 0,
                dma_stops: 0,
                last_dma_ctl: 0,
                sg_entries: Vec::new(),
                vendor_reg1: 0xFFFF_FFFF,
                vendor_reg2: 0xFFFF_FFFF,
            }),
        })
    }

    pub fn set_mode(&self, mode: CompletionMode) {
        lock(&self.state).mode = mode;
    }

    pub fn set_chip_reg(&self, addr: u16, value: u8) {
        lock(&self.state).chip_regs[reg_index(addr)] = value;
    }

    pub fn chip_reg(&self, addr: u16) -> u8 {
        lock(&self.state).chip_regs[reg_index(addr)]
    }

    pub fn set_phy_reg(&self, addr: u8, value: u16) {
        lock(&self.state).phy_regs[addr as usize] = value;
    }

    pub fn phy_reg(&self, addr: u8) -> u16 {
        lock(&self.state).phy_regs[addr as usize]
    }

    pub fn set_vendor_settings(&self, reg1: u32, reg2: u32) {
        let mut state = lock(&self.state);
        state.vendor_reg1 = reg1;
        state.vendor_reg2 = reg2;
    }

    pub fn cmd_batches(&self) -> u32 {
        lock(&self.state).cmd_batches
    }

    pub fn dma_triggers(&self) -> u32 {
        lock(&self.state).dma_triggers
    }

    pub fn cmd_stops(&self) -> u32 {
        lock(&self.state).cmd_stops
    }

    pub fn dma_stops(&self) -> u32 {
        lock(&self.state).dma_stops
    }

    pub fn last_dma_ctl(&self) -> u32 {
        lock(&self.state).last_dma_ctl
    }

    pub fn sg_entries(&self) -> Vec<SgEntry> {
        lock(&self.state).sg_entries.clone()
    }

    pub fn bier(&self) -> u32 {
        lock(&self.state).bier
    }

    /// Sets slot presence and raises the card-event interrupt.
    pub fn set_card_present(&self, present: bool) {
        let mut state = lock(&self.state);
        if present {
            state.bipr |= regs::Bipr::SD_EXIST.bits();
        } else {
            state.bipr &= !regs::Bipr::SD_EXIST.bits();
        }
        state.bipr |= regs::Bipr::SD_INT.bits();
    }

    /// Sets the write-protect pad state.
    pub fn set_write_protected(&self, protected: bool) {
        let mut state = lock(&self.state);
        if protected {
            state.bipr |= regs::Bipr::SD_WRITE_PROTECT.bits();
        } else {
            state.bipr &= !regs::Bipr::SD_WRITE_PROTECT.bits();
        }
    }

    /// Raises a (possibly late) transfer-ok interrupt.
    pub fn raise_transfer_ok(&self) {
        lock(&self.state).bipr |= regs::Bipr::TRANS_OK.bits();
    }

    /// Raises the overcurrent interrupt.
    pub fn raise_overcurrent(&self) {
        lock(&self.state).bipr |= regs::Bipr::SD_OC_INT.bits();
    }

    fn exec_mailbox(state: &mut SimState, request: u32) {
        let addr = ((request >> 16) & 0x3FFF) as usize;
        if request & regs::HAIMR_WRITE != 0 {
            let mask = (request >> 8) as u8;
            let data = request as u8;
            let old = state.chip_regs[addr];
            state.chip_regs[addr] = (old & !mask) | (data & mask);
            if addr == reg_index(regs::PHY_RWCTL) && state.chip_regs[addr] & regs::PHY_BUSY != 0 {
                Self::exec_phy(state);
            }
            // Echo the requested value with the busy bit cleared.
            state.haimr = request & !regs::HAIMR_BUSY;
        } else {
            state.haimr =
                (request & !regs::HAIMR_BUSY & 0xFFFF_FF00) | u32::from(state.chip_regs[addr]);
        }
    }

    fn exec_phy(state: &mut SimState) {
        let ctl = state.chip_regs[reg_index(regs::PHY_RWCTL)];
        let addr = state.chip_regs[reg_index(regs::PHY_ADDR)] as usize;
        if ctl & regs::PHY_WRITE != 0 {
            let lo = u16::from(state.chip_regs[reg_index(regs::PHY_DATA0)]);
            let hi = u16::from(state.chip_regs[reg_index(regs::PHY_DATA1)]);
            state.phy_regs[addr] = hi << 8 | lo;
        } else {
            let value = state.phy_regs[addr];
            state.chip_regs[reg_index(regs::PHY_DATA0)] = value as u8;
            state.chip_regs[reg_index(regs::PHY_DATA1)] = (value >> 8) as u8;
        }
        state.chip_regs[reg_index(regs::PHY_RWCTL)] &= !regs::PHY_BUSY;
    }

    fn exec_command_batch(state: &mut SimState, byte_len: u32) {
        state.cmd_batches += 1;
        if state.mode == CompletionMode::Never {
            return;
        }

        let count = (byte_len / 4) as usize;
        let mut failed = false;
        let mut responses = Vec::new();

        for i in 0..count {
            let mut word = [0u8; 4];
            word.copy_from_slice(&state.buffer[i * 4..i * 4 + 4]);
            let Some(cmd) = Command::decode(word) else {
                failed = true;
                break;
            };
            let addr = cmd.addr() as usize;
            match cmd.kind() {
                CommandKind::ReadRegister => {
                    responses.push(u32::from(state.chip_regs[addr]));
                }
                CommandKind::WriteRegister => {
                    let old = state.chip_regs[addr];
                    state.chip_regs[addr] = (old & !cmd.mask()) | (cmd.value() & cmd.mask());
                }
                CommandKind::CheckRegister => {
                    if state.chip_regs[addr] & cmd.mask() == cmd.value() & cmd.mask() {
                        responses.push(u32::from(state.chip_regs[addr]));
                    } else {
                        failed = true;
                        break;
                    }
                }
            }
        }

        // Responses overwrite the command region from slot 0.
        for (i, response) in responses.iter().enumerate() {
            state.buffer[i * 4..i * 4 + 4].copy_from_slice(&response.to_le_bytes());
        }

        if failed || state.mode == CompletionMode::AutoFail {
            state.bipr |= regs::Bipr::TRANS_FAIL.bits();
        } else {
            state.bipr |= regs::Bipr::CMD_DONE.bits() | regs::Bipr::TRANS_OK.bits();
        }
    }

    fn exec_dma(state: &mut SimState, ctl: u32) {
        state.dma_triggers += 1;
        state.last_dma_ctl = ctl;
        state.sg_entries.clear();

        for i in 0..(state.buffer.len() - SG_TBL_OFFSET) / 8 {
            let off = SG_TBL_OFFSET + i * 8;
            let mut word = [0u8; 8];
            word.copy_from_slice(&state.buffer[off..off + 8]);
            let entry = SgEntry::from_raw(u64::from_le_bytes(word));
            state.sg_entries.push(entry);
            if entry.is_end() {
                break;
            }
        }

        match state.mode {
            CompletionMode::AutoOk => {
                state.bipr |= regs::Bipr::DATA_DONE.bits() | regs::Bipr::TRANS_OK.bits();
            }
            CompletionMode::AutoFail => {
                state.bipr |= regs::Bipr::TRANS_FAIL.bits();
            }
            CompletionMode::Never => {}
        }
    }
}

impl HostBus for SimDevice {
    fn read8(&self, _offset: u32) -> u8 {
        0
    }

    fn read16(&self, _offset: u32) -> u16 {
        0
    }

    fn read32(&self, offset: u32) -> u32 {
        let state = lock(&self.state);
        match offset {
            regs::HCBAR => state.hcbar,
            regs::HDBAR => state.hdbar,
            regs::HAIMR => state.haimr,
            regs::BIPR => state.bipr,
            regs::BIER => state.bier,
            _ => 0,
        }
    }

    fn write8(&self, _offset: u32, _value: u8) {}

    fn write16(&self, _offset: u32, _value: u16) {}

    fn write32(&self, offset: u32, value: u32) {
        let mut state = lock(&self.state);
        match offset {
            regs::HCBAR => state.hcbar = value,
            regs::HDBAR => state.hdbar = value,
            regs::HAIMR => Self::exec_mailbox(&mut state, value),
            regs::BIPR => state.bipr &= !(value & regs::BIPR_CLEARABLE),
            regs::BIER => state.bier = value,
            regs::HCBCTLR => {
                if value & regs::STOP_CMD != 0 {
                    state.cmd_stops += 1;
                }
                if value & regs::START_CMD != 0 {
                    Self::exec_command_batch(&mut state, value & regs::CMD_BYTE_LEN_MASK);
                }
            }
            regs::HDBCTLR => {
                if value & regs::STOP_DMA != 0 {
                    state.dma_stops += 1;
                }
                if value & regs::TRIG_DMA != 0 {
                    Self::exec_dma(&mut state, value);
                }
            }
            _ => {}
        }
    }

    fn read_config32(&self, offset: u16) -> u32 {
        let state = lock(&self.state);
        match offset {
            regs::PCR_SETTING_REG1 => state.vendor_reg1,
            regs::PCR_SETTING_REG2 => state.vendor_reg2,
            _ => 0xFFFF_FFFF,
        }
    }
}

impl HostBuffer for SimDevice {
    fn bus_addr(&self) -> u64 {
        SIM_BUF_BUS_ADDR
    }

    fn len(&self) -> usize {
        HOST_BUF_LEN
    }

    fn write(&self, offset: usize, bytes: &[u8]) {
        lock(&self.state).buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn read(&self, offset: usize, out: &mut [u8]) {
        out.copy_from_slice(&lock(&self.state).buffer[offset..offset + out.len()]);
    }
}

// ---------------------------------------------------------------------------
// Harness helpers
// ---------------------------------------------------------------------------

/// Controller over a fresh simulated RTS5249.
pub fn setup() -> (Arc<SimDevice>, Arc<Controller>) {
    setup_chip(0x5249, CompletionMode::AutoOk)
}

/// Controller over a fresh simulated device of the given generation.
pub fn setup_chip(device_id: u16, mode: CompletionMode) -> (Arc<SimDevice>, Arc<Controller>) {
    let dev = SimDevice::with_mode(mode);
    let ctrl = Controller::new(
        Arc::clone(&dev) as Arc<dyn HostBus>,
        Arc::clone(&dev) as Arc<dyn HostBuffer>,
        chip::probe(device_id).expect("supported chip"),
    );
    (dev, Arc::new(ctrl))
}

/// Background thread delivering interrupts while a test blocks in a
/// transfer. Stops and joins on drop.
pub struct IrqPump {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_irq_pump(ctrl: &Arc<Controller>) -> IrqPump {
    let stop = Arc::new(AtomicBool::new(false));
    let handle = {
        let ctrl = Arc::clone(ctrl);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                ctrl.handle_interrupt();
                thread::sleep(Duration::from_millis(1));
            }
        })
    };
    IrqPump {
        stop,
        handle: Some(handle),
    }
}

impl Drop for IrqPump {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
