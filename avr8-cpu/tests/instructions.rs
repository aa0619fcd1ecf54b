//! Black-box instruction tests, driven entirely through the public
//! `Cpu`/`MemorySpace` surface — no access to crate-internal types.
//!
//! A small hand-rolled in-memory `MemorySpace` test double, direct
//! register assertions, no test framework beyond `#[test]`.

use avr8_cpu::{AvrError, Cpu, InvalidOpcodePolicy, PcWidth};
use emu_core::MemorySpace;

/// Flat program ROM plus flat 64 KiB data RAM, always accessible.
struct FlatBoard {
    prog: Vec<u16>,
    ram: Vec<u8>,
}

impl FlatBoard {
    fn new(prog: &[u16]) -> Self {
        FlatBoard { prog: prog.to_vec(), ram: vec![0; 0x1_0000] }
    }
}

impl MemorySpace for FlatBoard {
    fn read_program_memory(&mut self, addr: u32) -> Option<u16> {
        self.prog.get(addr as usize).copied()
    }
    fn read_data_memory(&mut self, addr: u16) -> Option<u8> {
        self.ram.get(addr as usize).copied()
    }
    fn write_data_memory(&mut self, addr: u16, value: u8) -> bool {
        match self.ram.get_mut(addr as usize) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[test]
fn sreg_round_trips_every_byte_value() {
    let mut cpu = Cpu::new(PcWidth::Bits16);
    for b in 0..=u8::MAX {
        cpu.set_sreg(b);
        assert_eq!(cpu.sreg(), b);
    }
}

#[test]
fn ldi_sets_register_with_no_flag_changes() {
    let mut board = FlatBoard::new(&[0xE0A5]); // LDI R16, 0xA5
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_sreg(0xFF);
    cpu.step(&mut board).unwrap();
    assert_eq!(cpu.r(16), 0xA5);
    assert_eq!(cpu.sreg(), 0xFF);
}

#[test]
fn inc_sets_overflow_only_at_0x80() {
    let mut board = FlatBoard::new(&[0x9403 | (16 << 4)]); // INC R16
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_r(16, 0x7F);
    cpu.step(&mut board).unwrap();
    assert_eq!(cpu.r(16), 0x80);
    assert!(cpu.overflow());
    assert!(cpu.negative());
    assert!(!cpu.zero());
}

#[test]
fn dec_sets_overflow_only_at_0x7f() {
    let mut board = FlatBoard::new(&[0x940A | (16 << 4)]); // DEC R16
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_r(16, 0x80);
    cpu.step(&mut board).unwrap();
    assert_eq!(cpu.r(16), 0x7F);
    assert!(cpu.overflow());
    assert!(!cpu.negative());
}

#[test]
fn conditional_branch_taken_costs_one_extra_cycle() {
    // CPI R16, 5 ; BREQ +2
    let mut board = FlatBoard::new(&[0x3005 | (0 << 4), 0xF011]);
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_r(16, 5);
    cpu.step(&mut board).unwrap(); // CPI sets Z
    assert!(cpu.zero());
    let cycles = cpu.step(&mut board).unwrap(); // BREQ, taken
    assert_eq!(cycles, 2);
    assert_eq!(cpu.pc(), 2 + 2);
}

#[test]
fn conditional_branch_not_taken_costs_one_cycle() {
    let mut board = FlatBoard::new(&[0x3006 | (0 << 4), 0xF011]); // CPI R16,6 ; BREQ +2
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_r(16, 5);
    cpu.step(&mut board).unwrap();
    assert!(!cpu.zero());
    let cycles = cpu.step(&mut board).unwrap();
    assert_eq!(cycles, 1);
    assert_eq!(cpu.pc(), 2);
}

#[test]
fn unknown_opcode_throws_by_default() {
    let mut board = FlatBoard::new(&[0xFFFF]);
    let mut cpu = Cpu::new(PcWidth::Bits16);
    let err = cpu.step(&mut board).unwrap_err();
    assert!(matches!(err, AvrError::UnknownOpcode(0, 0xFFFF)));
}

#[test]
fn unknown_opcode_is_silently_skipped_under_do_nop() {
    let mut board = FlatBoard::new(&[0xFFFF, 0x0000]);
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.invalid_opcode_policy = InvalidOpcodePolicy::DoNop;
    let cycles = cpu.step(&mut board).unwrap();
    assert_eq!(cycles, 1);
    assert_eq!(cpu.pc(), 1);
}

#[test]
fn sleep_halts_stepping_until_reset() {
    let mut board = FlatBoard::new(&[0x9588, 0x0000]); // SLEEP ; NOP
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.step(&mut board).unwrap();
    assert!(cpu.is_asleep());
    let cycles = cpu.step(&mut board).unwrap();
    assert_eq!(cycles, 0);
    assert_eq!(cpu.pc(), 1);
    cpu.reset();
    assert!(!cpu.is_asleep());
}

#[test]
fn run_stops_at_or_past_the_requested_cycle_budget() {
    let mut board = FlatBoard::new(&[0x0000, 0x0000, 0x0000, 0x0000]); // NOP x4
    let mut cpu = Cpu::new(PcWidth::Bits16);
    let total = cpu.run(&mut board, 3).unwrap();
    assert!(total >= 3);
    assert_eq!(cpu.pc(), total as u32);
}

#[test]
fn jmp_to_call_site_then_ret_restores_pc() {
    // At word 0: JMP 4 ; at word 2: filler ; at word 4: CALL 6 ; at word 6: RET.
    let mut prog = vec![0u16; 8];
    prog[0] = 0x940C; // JMP
    prog[1] = 4;
    prog[4] = 0x940E; // CALL
    prog[5] = 6;
    prog[6] = 0x9508; // RET
    let mut board = FlatBoard::new(&prog);
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_sp(0x0FFF);

    cpu.step(&mut board).unwrap(); // JMP -> pc=4
    assert_eq!(cpu.pc(), 4);
    cpu.step(&mut board).unwrap(); // CALL -> pc=6, pushes return addr 6
    assert_eq!(cpu.pc(), 6);
    cpu.step(&mut board).unwrap(); // RET -> pops back to 6 (the word after CALL's 2 words)
    assert_eq!(cpu.pc(), 6);
    assert_eq!(cpu.sp(), 0x0FFF);
}

#[test]
fn elpm_rejected_on_16bit_pc_cpu() {
    let mut board = FlatBoard::new(&[0x95D8]); // ELPM
    let mut cpu = Cpu::new(PcWidth::Bits16);
    let err = cpu.step(&mut board).unwrap_err();
    assert_eq!(err, AvrError::InvalidOperation);
}

#[test]
fn spm_and_des_report_not_implemented() {
    let mut board = FlatBoard::new(&[0x95E8, 0x940B]); // SPM ; DES 0
    let mut cpu = Cpu::new(PcWidth::Bits16);
    let err = cpu.step(&mut board).unwrap_err();
    assert_eq!(err, AvrError::NotImplemented);
    let err = cpu.step(&mut board).unwrap_err();
    assert_eq!(err, AvrError::NotImplemented);
}

#[test]
fn lpm_reads_high_and_low_half_by_z_bit_zero() {
    let mut board = FlatBoard::new(&[0x95C8, 0x95C8]); // LPM ; LPM (program word at 0 is itself the data)
    board.prog[0] = 0x95C8;
    board.prog.push(0xABCD); // word address 1: the byte pair we'll read via Z
    let mut cpu = Cpu::new(PcWidth::Bits16);
    cpu.set_z(2); // byte address 2 -> word 1, low byte (bit0=0)
    cpu.step(&mut board).unwrap();
    assert_eq!(cpu.r(0), 0xCD);

    cpu.set_pc(0);
    cpu.set_z(3); // byte address 3 -> word 1, high byte
    cpu.step(&mut board).unwrap();
    assert_eq!(cpu.r(0), 0xAB);
}
