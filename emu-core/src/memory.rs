/// The memory subsystem an AVR8 core executes against.
///
/// AVR8 is a Harvard-architecture part: program memory is a separate,
/// word-addressed space (up to 22 bits of word address) from the
/// byte-addressed data space (which also hosts the I/O register window
/// and, indirectly, SRAM). Implementations decide what backs each space
/// (flash image, RAM array, memory-mapped peripherals, open-bus
/// behavior) and report inaccessibility rather than panicking.
///
/// All three methods take `&mut self` because a real backend (a UART
/// data register, a timer capture register) can have read side effects;
/// a plain flat-array implementation is free to ignore that and just
/// index in.
pub trait MemorySpace {
    /// Read one 16-bit program word at a word address.
    ///
    /// Returns `None` when the address is outside anything backed by
    /// this memory space (e.g. past the end of flash).
    fn read_program_memory(&mut self, addr: u32) -> Option<u16>;

    /// Read one byte from the data address space (SRAM or I/O window).
    ///
    /// Returns `None` when nothing is mapped at `addr`.
    fn read_data_memory(&mut self, addr: u16) -> Option<u8>;

    /// Write one byte to the data address space.
    ///
    /// Returns `false` when the write was refused (read-only region,
    /// nothing mapped).
    fn write_data_memory(&mut self, addr: u16, value: u8) -> bool;
}
