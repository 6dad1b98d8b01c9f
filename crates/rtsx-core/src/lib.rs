//! Command/DMA transport engine for Realtek PCIe SD/SDXC card readers.
//!
//! The controller executes register operations in doorbell-triggered batches
//! staged in a host-resident buffer, moves card data through a scatter/gather
//! DMA engine, and synchronizes both with the completion interrupt under a
//! caller-supplied timeout. Generation differences (power sequencing,
//! voltage switching, LED wiring, SSC quirks) live behind the chip-variant
//! registry in [`chip`].
//!
//! The embedding environment supplies register access and DMA-coherent
//! memory through the `rtsx-hal` traits; the SD protocol layer drives the
//! controller through [`Controller`].

pub mod chip;
pub mod clock;
pub mod cmd;
pub mod controller;
pub mod dma;
pub mod regs;
pub mod xfer;

pub use chip::{ChipOps, ChipParams, OutputVoltage};
pub use clock::SscDepth;
pub use cmd::{Command, CommandKind, MAX_HOST_COMMANDS};
pub use controller::{CardEventHandler, Controller};
pub use dma::DmaDirection;
pub use xfer::TransferStatus;
