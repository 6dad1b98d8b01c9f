//! Host abstraction layer for Realtek PCIe card-reader controllers.
//!
//! Defines the narrow waist between the controller core and the embedding
//! environment: memory-mapped register access ([`HostBus`]), DMA-coherent
//! staging memory shared with the device ([`HostBuffer`]), prepared DMA
//! descriptors ([`DmaDescriptor`]), and the driver error taxonomy
//! ([`DriverError`]).

pub mod buffer;
pub mod bus;
pub mod dma;
pub mod error;

pub use buffer::{DmaRegion, HostBuffer};
pub use bus::{HostBus, MmioBus};
pub use dma::{DmaDescriptor, DmaSegment};
pub use error::{DriverError, DriverResult};
