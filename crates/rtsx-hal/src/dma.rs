//! Prepared DMA descriptors.
//!
//! The platform's DMA-mapping facility pins and maps client memory, then
//! hands the resulting bus-address segments to the driver as a
//! [`DmaDescriptor`]. The descriptor is owned by the caller for the duration
//! of the transfer; the engine only reads it.

/// One contiguous (bus address, length) span of a mapped transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaSegment {
    /// Bus address of the span.
    pub addr: u64,
    /// Span length in bytes.
    pub len: u32,
}

impl DmaSegment {
    /// Creates a segment.
    #[must_use]
    pub const fn new(addr: u64, len: u32) -> Self {
        Self { addr, len }
    }
}

/// A prepared (pinned and bus-mapped) memory descriptor.
///
/// Invariant: the memory behind every segment stays mapped until the
/// transfer using this descriptor has resolved.
#[derive(Debug, Clone)]
pub struct DmaDescriptor {
    segments: Vec<DmaSegment>,
}

impl DmaDescriptor {
    /// Builds a descriptor from mapped segments.
    #[must_use]
    pub fn new(segments: Vec<DmaSegment>) -> Self {
        Self { segments }
    }

    /// The mapped segments, in transfer order.
    #[must_use]
    pub fn segments(&self) -> &[DmaSegment] {
        &self.segments
    }

    /// Total transfer length in bytes.
    #[must_use]
    pub fn total_len(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.len)).sum()
    }
}
