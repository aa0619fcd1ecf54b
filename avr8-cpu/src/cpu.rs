//! CPU state: registers, flags, program counter, stack pointer, extended
//! pointer registers, cycle counter, sleep state, and the memory-access
//! helpers every instruction routes through.

use emu_core::MemorySpace;

use crate::error::AvrError;
use crate::tracer::Tracer;

/// Program-counter width, fixed for the CPU's lifetime: once set at
/// construction, it is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcWidth {
    /// Programs up to 128 KiB (64K words); `EIND`/`RAMPZ`-dependent
    /// instructions (EIJMP, EICALL, ELPM) are unavailable.
    Bits16,
    /// Large program space; `PC` and jump/call targets use the full
    /// 22 bits.
    Bits22,
}

impl PcWidth {
    fn mask(self) -> u32 {
        match self {
            PcWidth::Bits16 => 0x0000_FFFF,
            PcWidth::Bits22 => 0x003F_FFFF,
        }
    }

    fn is_22(self) -> bool {
        matches!(self, PcWidth::Bits22)
    }
}

/// What to do with an opcode word the decoder does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidOpcodePolicy {
    /// Raise `AvrError::UnknownOpcode` and leave PC at the offending word.
    ThrowException,
    /// Silently treat the word as a one-cycle NOP; PC has already moved
    /// past it.
    DoNop,
    /// Reserved; has no defined behavior in this core. Treated
    /// identically to `ThrowException`.
    EmulatePhysical,
}

/// The AVR8 CPU core. Owns register and flag state only; program and data
/// memory live behind the caller-supplied [`MemorySpace`] passed to
/// [`Cpu::step`]/[`Cpu::run`].
pub struct Cpu {
    pub(crate) regs: [u8; 32],
    pub(crate) sreg_bits: u8,
    pc: u32,
    sp: u16,
    pub eind: u8,
    pub rampx: u8,
    pub rampy: u8,
    pub rampz: u8,
    cycles: u64,
    asleep: bool,
    pub invalid_opcode_policy: InvalidOpcodePolicy,
    pc_width: PcWidth,
    tracer: Option<Box<dyn Tracer>>,
}

impl Cpu {
    /// A fresh CPU in the reset state, with the given PC width.
    pub fn new(pc_width: PcWidth) -> Self {
        Cpu {
            regs: [0; 32],
            sreg_bits: 0,
            pc: 0,
            sp: 0,
            eind: 0,
            rampx: 0,
            rampy: 0,
            rampz: 0,
            cycles: 0,
            asleep: false,
            invalid_opcode_policy: InvalidOpcodePolicy::ThrowException,
            pc_width,
            tracer: None,
        }
    }

    pub fn pc_width(&self) -> PcWidth {
        self.pc_width
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u32) {
        self.pc = value & self.pc_width.mask();
    }

    pub(crate) fn advance_pc(&mut self, words: u32) {
        self.set_pc(self.pc.wrapping_add(words));
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    pub fn elapsed_cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Forces the sleep state directly — a read/write property of the
    /// public CPU surface (e.g. a debugger waking a sleeping core, or
    /// simulating an external wake interrupt).
    pub fn set_asleep(&mut self, value: bool) {
        self.asleep = value;
    }

    pub fn set_tracer(&mut self, tracer: Option<Box<dyn Tracer>>) {
        self.tracer = tracer;
    }

    pub fn has_tracer(&self) -> bool {
        self.tracer.is_some()
    }

    /// Resets to the documented post-reset state: `PC=0`, `SP=0`, all
    /// flags clear, `cycles=0`, `asleep=false`. General registers and the
    /// extended-pointer registers are left untouched — real hardware
    /// leaves them in an unspecified state after reset, and this core
    /// does not load a reset vector either.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.sp = 0;
        self.sreg_bits = 0;
        self.cycles = 0;
        self.asleep = false;
        if let Some(tracer) = &mut self.tracer {
            tracer.reset_marker();
        }
    }

    /// Requires a 22-bit PC; used by EIJMP/EICALL/ELPM.
    pub(crate) fn require_22bit(&self) -> Result<(), AvrError> {
        if self.pc_width.is_22() {
            Ok(())
        } else {
            Err(AvrError::InvalidOperation)
        }
    }

    /// Fetches the opcode word at the current PC and advances PC by one
    /// word. Charges 1 cycle.
    pub(crate) fn fetch_opcode(&mut self, mem: &mut dyn MemorySpace) -> Result<u16, AvrError> {
        let word = self.read_prog_word(mem, self.pc)?;
        self.advance_pc(1);
        Ok(word)
    }

    /// Reads a program-memory word at `addr` without moving PC. Charges
    /// 1 cycle. Used for long-opcode second words and for
    /// skip-instruction lookaheads.
    pub(crate) fn read_prog_word(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u32,
    ) -> Result<u16, AvrError> {
        let word = mem
            .read_program_memory(addr)
            .ok_or(AvrError::AddressUnreadable(addr))?;
        self.cycles += 1;
        Ok(word)
    }

    /// Reads a data-memory byte. Charges 1 cycle.
    pub(crate) fn read_data_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u16,
    ) -> Result<u8, AvrError> {
        let value = mem
            .read_data_memory(addr)
            .ok_or(AvrError::AddressUnreadable(u32::from(addr)))?;
        self.cycles += 1;
        Ok(value)
    }

    /// Writes a data-memory byte. Charges 1 cycle.
    pub(crate) fn write_data_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u16,
        value: u8,
    ) -> Result<(), AvrError> {
        if mem.write_data_memory(addr, value) {
            self.cycles += 1;
            Ok(())
        } else {
            Err(AvrError::AddressUnwritable(addr, value))
        }
    }

    /// Reads a byte from the I/O window. Nets 0 extra cycles: the shared
    /// data-memory helper's 1-cycle charge is corrected back down,
    /// because I/O reads share their cycle with the opcode fetch on real
    /// hardware.
    pub(crate) fn read_io_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u16,
    ) -> Result<u8, AvrError> {
        let value = self.read_data_byte(mem, addr)?;
        self.cycles -= 1;
        Ok(value)
    }

    /// Writes a byte to the I/O window with the same correction as
    /// [`Cpu::read_io_byte`].
    pub(crate) fn write_io_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u16,
        value: u8,
    ) -> Result<(), AvrError> {
        self.write_data_byte(mem, addr, value)?;
        self.cycles -= 1;
        Ok(())
    }

    /// Pushes one byte onto the stack: write at `SP`, then `SP -= 1`.
    pub(crate) fn push_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        value: u8,
    ) -> Result<(), AvrError> {
        self.write_data_byte(mem, self.sp, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    /// Pops one byte off the stack: `SP += 1`, then read at `SP`.
    pub(crate) fn pop_byte(&mut self, mem: &mut dyn MemorySpace) -> Result<u8, AvrError> {
        self.sp = self.sp.wrapping_add(1);
        self.read_data_byte(mem, self.sp)
    }

    /// Atomic read-modify-write of a data-memory byte, for XCH/LAS/LAC/LAT.
    /// Charges a single cycle for the pair rather than one per access —
    /// these are real 2-cycle instructions, not two independent accesses.
    /// Returns the value that was there *before* `f` was applied.
    pub(crate) fn read_modify_write_data_byte(
        &mut self,
        mem: &mut dyn MemorySpace,
        addr: u16,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<u8, AvrError> {
        let old = mem
            .read_data_memory(addr)
            .ok_or(AvrError::AddressUnreadable(u32::from(addr)))?;
        let new = f(old);
        if !mem.write_data_memory(addr, new) {
            return Err(AvrError::AddressUnwritable(addr, new));
        }
        self.cycles += 1;
        Ok(old)
    }

    pub(crate) fn add_extra_cycles(&mut self, n: u64) {
        self.cycles += n;
    }

    /// Runs one fetch-decode-execute cycle. Returns the
    /// number of cycles this step consumed (0 if asleep).
    pub fn step(&mut self, mem: &mut dyn MemorySpace) -> Result<u64, AvrError> {
        if self.asleep {
            return Ok(0);
        }

        let cycles_before = self.cycles;
        let pc_of_instruction = self.pc;

        if self.tracer.is_some() {
            let line = crate::disassemble::disassemble_instruction_at(mem, self.pc);
            if let Some(tracer) = &mut self.tracer {
                tracer.before_execute(&line);
            }
        }

        let op1 = self.fetch_opcode(mem)?;
        let op2 = if crate::decode::is_long(op1) {
            let word = self.read_prog_word(mem, self.pc)?;
            self.advance_pc(1);
            Some(word)
        } else {
            None
        };

        let instruction = crate::decode::decode(op1, op2);
        let result = if matches!(instruction, crate::decode::Instruction::Unknown) {
            self.handle_unknown_opcode(pc_of_instruction, op1)
        } else {
            crate::execute::execute(self, mem, instruction, pc_of_instruction)
        };

        if self.tracer.is_some() {
            let snapshot = crate::tracer::snapshot(self);
            // Safe to re-borrow: disassembly above already released its
            // borrow of `self` before this point.
            if let Some(tracer) = &mut self.tracer {
                tracer.after_execute(&snapshot);
            }
        }

        result?;
        Ok(self.cycles - cycles_before)
    }

    fn handle_unknown_opcode(&mut self, pc: u32, opcode: u16) -> Result<(), AvrError> {
        match self.invalid_opcode_policy {
            InvalidOpcodePolicy::DoNop => Ok(()),
            InvalidOpcodePolicy::ThrowException | InvalidOpcodePolicy::EmulatePhysical => {
                Err(AvrError::UnknownOpcode(pc, opcode))
            }
        }
    }

    /// Repeats [`Cpu::step`] until at least `n` cycles have elapsed or the
    /// CPU falls asleep. Returns the actual cycle total
    /// consumed by this call.
    pub fn run(&mut self, mem: &mut dyn MemorySpace, n: u64) -> Result<u64, AvrError> {
        let mut total = 0;
        while total < n && !self.asleep {
            total += self.step(mem)?;
        }
        Ok(total)
    }
}
