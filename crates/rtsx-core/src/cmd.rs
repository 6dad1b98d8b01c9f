//! Host command words and session accounting.
//!
//! The controller executes register operations in batches: the driver
//! serializes up to [`MAX_HOST_COMMANDS`] packed command words into the host
//! buffer, rings the doorbell, and the device walks the batch in order.
//! Responses to read/check commands land back in the same region, one 32-bit
//! slot per responding command.
//!
//! Wire layout of a command word (little-endian):
//!
//! ```text
//! 31:30  operation (0 = read, 1 = write, 2 = check)
//! 29:16  register address (14-bit chip-register space)
//! 15:8   mask
//!  7:0   value
//! ```

use rtsx_hal::{DriverError, DriverResult};

/// Maximum commands per session.
pub const MAX_HOST_COMMANDS: usize = 256;
/// Byte offset of the command region in the host buffer.
pub const CMD_BUF_OFFSET: usize = 0;
/// Byte offset of the scatter/gather table in the host buffer.
pub const SG_TBL_OFFSET: usize = MAX_HOST_COMMANDS * 4;
/// Maximum scatter/gather entries per transfer.
pub const MAX_SG_ENTRIES: usize = 384;
/// Required host buffer length in bytes.
pub const HOST_BUF_LEN: usize = SG_TBL_OFFSET + MAX_SG_ENTRIES * 8;

const KIND_SHIFT: u32 = 30;
const ADDR_SHIFT: u32 = 16;
const ADDR_MASK: u32 = 0x3FFF;
const MASK_SHIFT: u32 = 8;

/// Operation carried by a command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Read a chip register; produces a response slot.
    ReadRegister = 0,
    /// Masked write to a chip register.
    WriteRegister = 1,
    /// Poll a chip register until the masked value matches; produces a
    /// response slot.
    CheckRegister = 2,
}

impl CommandKind {
    /// Decodes the 2-bit operation field.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::ReadRegister),
            1 => Some(Self::WriteRegister),
            2 => Some(Self::CheckRegister),
            _ => None,
        }
    }
}

/// One register operation, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    addr: u16,
    mask: u8,
    value: u8,
}

impl Command {
    /// Builds a command; the address is truncated to the 14-bit register
    /// space.
    #[must_use]
    pub const fn new(kind: CommandKind, addr: u16, mask: u8, value: u8) -> Self {
        Self {
            kind,
            addr: addr & ADDR_MASK as u16,
            mask,
            value,
        }
    }

    /// A register read.
    #[must_use]
    pub const fn read(addr: u16) -> Self {
        Self::new(CommandKind::ReadRegister, addr, 0, 0)
    }

    /// A masked register write.
    #[must_use]
    pub const fn write(addr: u16, mask: u8, value: u8) -> Self {
        Self::new(CommandKind::WriteRegister, addr, mask, value)
    }

    /// A register check (device-side poll until `reg & mask == value & mask`).
    #[must_use]
    pub const fn check(addr: u16, mask: u8, value: u8) -> Self {
        Self::new(CommandKind::CheckRegister, addr, mask, value)
    }

    /// Operation type.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Target register address.
    #[must_use]
    pub const fn addr(&self) -> u16 {
        self.addr
    }

    /// Operation mask.
    #[must_use]
    pub const fn mask(&self) -> u8 {
        self.mask
    }

    /// Operation value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Serializes to the little-endian wire form.
    #[must_use]
    pub const fn encode(&self) -> [u8; 4] {
        let word = ((self.kind as u32) << KIND_SHIFT)
            | ((self.addr as u32) << ADDR_SHIFT)
            | ((self.mask as u32) << MASK_SHIFT)
            | self.value as u32;
        word.to_le_bytes()
    }

    /// Decodes a wire-form word; `None` for a reserved operation encoding.
    #[must_use]
    pub const fn decode(bytes: [u8; 4]) -> Option<Self> {
        let word = u32::from_le_bytes(bytes);
        let kind = match CommandKind::from_bits(word >> KIND_SHIFT) {
            Some(kind) => kind,
            None => return None,
        };
        Some(Self {
            kind,
            addr: ((word >> ADDR_SHIFT) & ADDR_MASK) as u16,
            mask: (word >> MASK_SHIFT) as u8,
            value: word as u8,
        })
    }
}

/// Per-session tally of enqueued commands.
///
/// Each operation type keeps its own count; `total` is their sum and
/// `response_len` the number of response slots the device will fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCounter {
    /// Read commands enqueued this session.
    pub reads: usize,
    /// Write commands enqueued this session.
    pub writes: usize,
    /// Check commands enqueued this session.
    pub checks: usize,
}

impl CommandCounter {
    /// An empty counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reads: 0,
            writes: 0,
            checks: 0,
        }
    }

    /// Clears every count.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records one enqueued command, failing with [`DriverError::Busy`]
    /// once the session is full.
    pub fn record(&mut self, kind: CommandKind) -> DriverResult {
        if self.total() >= MAX_HOST_COMMANDS {
            return Err(DriverError::Busy);
        }
        match kind {
            CommandKind::ReadRegister => self.reads += 1,
            CommandKind::WriteRegister => self.writes += 1,
            CommandKind::CheckRegister => self.checks += 1,
        }
        Ok(())
    }

    /// Commands enqueued this session.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.reads + self.writes + self.checks
    }

    /// Response slots the device will produce (reads + checks).
    #[must_use]
    pub const fn response_len(&self) -> usize {
        self.reads + self.checks
    }
}
