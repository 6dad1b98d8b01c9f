//! Memory-mapped register access.
//!
//! [`HostBus`] is the controller core's view of the device's BAR window plus
//! the two PCI configuration dwords carrying vendor settings. A failed bus
//! access is a hardware/bus failure, not a recoverable error, so the
//! accessors are infallible by contract.

use core::ptr;

/// Raw access to the device's memory-mapped register window.
///
/// All offsets are byte offsets from the start of the BAR. Implementations
/// must be safe to call concurrently from client threads and the interrupt
/// path; each access is a single volatile load/store.
pub trait HostBus: Send + Sync {
    /// Reads an 8-bit register.
    fn read8(&self, offset: u32) -> u8;
    /// Reads a 16-bit register.
    fn read16(&self, offset: u32) -> u16;
    /// Reads a 32-bit register.
    fn read32(&self, offset: u32) -> u32;
    /// Writes an 8-bit register.
    fn write8(&self, offset: u32, value: u8);
    /// Writes a 16-bit register.
    fn write16(&self, offset: u32, value: u16);
    /// Writes a 32-bit register.
    fn write32(&self, offset: u32, value: u32);

    /// Reads a dword from PCI configuration space.
    ///
    /// Used once at probe time to fetch the vendor settings fused into the
    /// device. The default returns all-ones (the unclaimed-read pattern),
    /// which decodes as "not programmed".
    fn read_config32(&self, offset: u16) -> u32 {
        let _ = offset;
        0xFFFF_FFFF
    }
}

/// [`HostBus`] over a raw mapped BAR pointer.
///
/// Production implementation for an embedding that has already mapped the
/// device's register window into the driver's address space.
pub struct MmioBus {
    /// Virtual base address of the mapped BAR.
    base: *mut u8,
    /// Size of the mapped window in bytes.
    len: u32,
}

// SAFETY: MmioBus only performs volatile accesses through a pointer into
// device MMIO space, which is inherently shared-state safe; the base pointer
// itself is never mutated.
unsafe impl Send for MmioBus {}
unsafe impl Sync for MmioBus {}

impl MmioBus {
    /// Creates a bus over a mapped BAR window.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapped, uncached MMIO region of at least `len`
    /// bytes that remains valid for the lifetime of the bus, and no other
    /// code may access the same window except through this bus.
    #[must_use]
    pub const unsafe fn new(base: *mut u8, len: u32) -> Self {
        Self { base, len }
    }

    fn reg_ptr(&self, offset: u32, width: u32) -> *mut u8 {
        assert!(
            offset + width <= self.len,
            "register access out of BAR window"
        );
        self.base.wrapping_add(offset as usize)
    }
}

impl HostBus for MmioBus {
    fn read8(&self, offset: u32) -> u8 {
        // SAFETY: reg_ptr bounds-checked the access against the mapped window.
        unsafe { ptr::read_volatile(self.reg_ptr(offset, 1)) }
    }

    fn read16(&self, offset: u32) -> u16 {
        // SAFETY: As above.
        unsafe { ptr::read_volatile(self.reg_ptr(offset, 2).cast::<u16>()) }
    }

    fn read32(&self, offset: u32) -> u32 {
        // SAFETY: As above.
        unsafe { ptr::read_volatile(self.reg_ptr(offset, 4).cast::<u32>()) }
    }

    fn write8(&self, offset: u32, value: u8) {
        // SAFETY: As above.
        unsafe { ptr::write_volatile(self.reg_ptr(offset, 1), value) };
    }

    fn write16(&self, offset: u32, value: u16) {
        // SAFETY: As above.
        unsafe { ptr::write_volatile(self.reg_ptr(offset, 2).cast::<u16>(), value) };
    }

    fn write32(&self, offset: u32, value: u32) {
        // SAFETY: As above.
        unsafe { ptr::write_volatile(self.reg_ptr(offset, 4).cast::<u32>(), value) };
    }
}
