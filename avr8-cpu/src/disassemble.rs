//! Textual disassembly.
//!
//! Shares the decoder's classification so mnemonic output can never
//! drift from what the executor actually does with the same opcode —
//! the disassembler's job is purely to format an already-decoded
//! [`Instruction`], plus apply the handful of alias spellings real
//! assemblers use (`ADD Rd,Rd` prints as `LSL Rd`, etc).

use std::fmt::Write as _;

use emu_core::MemorySpace;

use crate::decode::{self, Instruction};

/// Pure predicate: does `word` start a two-word instruction? A thin
/// public re-export of [`decode::is_long`] as a pure static helper.
pub fn is_long_opcode(word: u16) -> bool {
    decode::is_long(word)
}

/// Disassembles the single instruction at program-memory word address
/// `pc`, returning one formatted line.
///
/// Reads through `mem` directly rather than through a [`crate::Cpu`] —
/// disassembly is a pure function of the opcode stream, not of CPU
/// register state, and exposing it this way lets `Cpu::step` call it
/// while a tracer sink is already mutably borrowed out of the CPU.
pub fn disassemble_instruction_at(mem: &mut dyn MemorySpace, pc: u32) -> String {
    let Some(op1) = mem.read_program_memory(pc) else {
        return format!("{pc:05X} : ---- : *** UNREADABLE ***");
    };
    let is_long = decode::is_long(op1);
    let op2 = if is_long { mem.read_program_memory(pc + 1) } else { None };

    let mut line = format!("{pc:05X} : {op1:04X}");
    if is_long {
        match op2 {
            Some(w) => {
                let _ = write!(line, " {w:04X}");
            }
            None => line.push_str(" ????"),
        }
    }
    while line.len() < 18 {
        line.push(' ');
    }
    line.push_str(": ");

    let pc_after = pc + if is_long { 2 } else { 1 };
    let instr = decode::decode(op1, op2);
    line.push_str(&format_instruction(instr, pc_after));
    line
}

/// Disassembles `n` consecutive instructions starting at `pc`, one line
/// each, newline-joined.
pub fn disassemble_many_instructions_at(mem: &mut dyn MemorySpace, pc: u32, n: u32) -> String {
    let mut out = String::new();
    let mut addr = pc;
    for i in 0..n {
        if i > 0 {
            out.push('\n');
        }
        let Some(op1) = mem.read_program_memory(addr) else {
            out.push_str(&disassemble_instruction_at(mem, addr));
            addr += 1;
            continue;
        };
        out.push_str(&disassemble_instruction_at(mem, addr));
        addr += if decode::is_long(op1) { 2 } else { 1 };
    }
    out
}

/// Disassembles every instruction from word address `from` up to (and
/// including the start of) `to`. May read one word past `to` when the
/// final instruction is long.
pub fn disassemble_memory(mem: &mut dyn MemorySpace, from: u32, to: u32) -> String {
    let mut out = String::new();
    let mut addr = from;
    let mut first = true;
    while addr <= to {
        if !first {
            out.push('\n');
        }
        first = false;
        let Some(op1) = mem.read_program_memory(addr) else {
            out.push_str(&disassemble_instruction_at(mem, addr));
            break;
        };
        out.push_str(&disassemble_instruction_at(mem, addr));
        addr += if decode::is_long(op1) { 2 } else { 1 };
    }
    out
}

fn reg(n: u8) -> String {
    format!("R{n}")
}

fn pair(lo: u8) -> String {
    format!("R{}:R{}", lo + 1, lo)
}

fn imm8(k: u8) -> String {
    format!("#${k:02X}")
}

fn data_addr(a: u16) -> String {
    format!("${a:04X}")
}

fn io_addr(a: u8) -> String {
    format!("${a:02X}")
}

fn prog_target(pc_word_addr: u32) -> String {
    format!("->${pc_word_addr:05X}")
}

fn rel_target(pc_after: u32, k: i32) -> String {
    let target = pc_after.wrapping_add(k as u32);
    format!("{k} {}", prog_target(target))
}

/// `s` (0..7) to the `BRBS`/`BRBC`-family mnemonic pair
/// `(set-name, clear-name)`, in SREG bit order.
const BRANCH_NAMES: [(&str, &str); 8] = [
    ("BRCS", "BRCC"),
    ("BREQ", "BRNE"),
    ("BRMI", "BRPL"),
    ("BRVS", "BRVC"),
    ("BRLT", "BRGE"),
    ("BRHS", "BRHC"),
    ("BRTS", "BRTC"),
    ("BRIE", "BRID"),
];

const BSET_NAMES: [&str; 8] = ["SEC", "SEZ", "SEN", "SEV", "SES", "SEH", "SET", "SEI"];
const BCLR_NAMES: [&str; 8] = ["CLC", "CLZ", "CLN", "CLV", "CLS", "CLH", "CLT", "CLI"];

fn format_instruction(instr: Instruction, pc_after: u32) -> String {
    match instr {
        Instruction::Nop => "NOP".to_string(),
        Instruction::Movw { d, r } => format!("MOVW {}, {}", pair(d), pair(r)),
        Instruction::Muls { d, r } => format!("MULS {}, {}", reg(d), reg(r)),
        Instruction::Mulsu { d, r } => format!("MULSU {}, {}", reg(d), reg(r)),
        Instruction::Fmul { d, r } => format!("FMUL {}, {}", reg(d), reg(r)),
        Instruction::Fmuls { d, r } => format!("FMULS {}, {}", reg(d), reg(r)),
        Instruction::Fmulsu { d, r } => format!("FMULSU {}, {}", reg(d), reg(r)),
        Instruction::Cpc { d, r } => format!("CPC {}, {}", reg(d), reg(r)),
        Instruction::Sbc { d, r } => format!("SBC {}, {}", reg(d), reg(r)),
        Instruction::Add { d, r } if d == r => format!("LSL {}", reg(d)),
        Instruction::Add { d, r } => format!("ADD {}, {}", reg(d), reg(r)),
        Instruction::Cpse { d, r } => format!("CPSE {}, {}", reg(d), reg(r)),
        Instruction::Cp { d, r } => format!("CP {}, {}", reg(d), reg(r)),
        Instruction::Sub { d, r } => format!("SUB {}, {}", reg(d), reg(r)),
        Instruction::Adc { d, r } if d == r => format!("ROL {}", reg(d)),
        Instruction::Adc { d, r } => format!("ADC {}, {}", reg(d), reg(r)),
        Instruction::And { d, r } if d == r => format!("TST {}", reg(d)),
        Instruction::And { d, r } => format!("AND {}, {}", reg(d), reg(r)),
        Instruction::Eor { d, r } if d == r => format!("CLR {}", reg(d)),
        Instruction::Eor { d, r } => format!("EOR {}, {}", reg(d), reg(r)),
        Instruction::Or { d, r } => format!("OR {}, {}", reg(d), reg(r)),
        Instruction::Mov { d, r } => format!("MOV {}, {}", reg(d), reg(r)),
        Instruction::Cpi { d, k } => format!("CPI {}, {}", reg(d), imm8(k)),
        Instruction::Sbci { d, k } => format!("SBCI {}, {}", reg(d), imm8(k)),
        Instruction::Subi { d, k } => format!("SUBI {}, {}", reg(d), imm8(k)),
        Instruction::Ori { d, k } => format!("ORI {}, {}", reg(d), imm8(k)),
        Instruction::Andi { d, k } => format!("ANDI {}, {}", reg(d), imm8(k)),
        Instruction::LddZ { d, q: 0 } => format!("LD {}, Z", reg(d)),
        Instruction::LddZ { d, q } => format!("LDD {}, Z+{q}", reg(d)),
        Instruction::StdZ { r, q: 0 } => format!("ST Z, {}", reg(r)),
        Instruction::StdZ { r, q } => format!("STD Z+{q}, {}", reg(r)),
        Instruction::LddY { d, q: 0 } => format!("LD {}, Y", reg(d)),
        Instruction::LddY { d, q } => format!("LDD {}, Y+{q}", reg(d)),
        Instruction::StdY { r, q: 0 } => format!("ST Y, {}", reg(r)),
        Instruction::StdY { r, q } => format!("STD Y+{q}, {}", reg(r)),
        Instruction::Lds { d, k } => format!("LDS {}, {}", reg(d), data_addr(k)),
        Instruction::Sts { k, r } => format!("STS {}, {}", data_addr(k), reg(r)),
        Instruction::LdZPostInc { d } => format!("LD {}, Z+", reg(d)),
        Instruction::LdZPreDec { d } => format!("LD {}, -Z", reg(d)),
        Instruction::LdYPostInc { d } => format!("LD {}, Y+", reg(d)),
        Instruction::LdYPreDec { d } => format!("LD {}, -Y", reg(d)),
        Instruction::LdX { d } => format!("LD {}, X", reg(d)),
        Instruction::LdXPostInc { d } => format!("LD {}, X+", reg(d)),
        Instruction::LdXPreDec { d } => format!("LD {}, -X", reg(d)),
        Instruction::StZPostInc { r } => format!("ST Z+, {}", reg(r)),
        Instruction::StZPreDec { r } => format!("ST -Z, {}", reg(r)),
        Instruction::StYPostInc { r } => format!("ST Y+, {}", reg(r)),
        Instruction::StYPreDec { r } => format!("ST -Y, {}", reg(r)),
        Instruction::StX { r } => format!("ST X, {}", reg(r)),
        Instruction::StXPostInc { r } => format!("ST X+, {}", reg(r)),
        Instruction::StXPreDec { r } => format!("ST -X, {}", reg(r)),
        Instruction::Lpm => "LPM".to_string(),
        Instruction::LpmReg { d } => format!("LPM {}, Z", reg(d)),
        Instruction::LpmPostInc { d } => format!("LPM {}, Z+", reg(d)),
        Instruction::Elpm => "ELPM".to_string(),
        Instruction::ElpmReg { d } => format!("ELPM {}, Z", reg(d)),
        Instruction::ElpmPostInc { d } => format!("ELPM {}, Z+", reg(d)),
        Instruction::Xch { r } => format!("XCH Z, {}", reg(r)),
        Instruction::Las { r } => format!("LAS Z, {}", reg(r)),
        Instruction::Lac { r } => format!("LAC Z, {}", reg(r)),
        Instruction::Lat { r } => format!("LAT Z, {}", reg(r)),
        Instruction::Pop { d } => format!("POP {}", reg(d)),
        Instruction::Push { r } => format!("PUSH {}", reg(r)),
        Instruction::Bset { s } => BSET_NAMES[s as usize].to_string(),
        Instruction::Bclr { s } => BCLR_NAMES[s as usize].to_string(),
        Instruction::Ijmp => "IJMP".to_string(),
        Instruction::Eijmp => "EIJMP".to_string(),
        Instruction::Ret => "RET".to_string(),
        Instruction::Reti => "RETI".to_string(),
        Instruction::Icall => "ICALL".to_string(),
        Instruction::Eicall => "EICALL".to_string(),
        Instruction::Sleep => "SLEEP".to_string(),
        Instruction::Break => "BREAK".to_string(),
        Instruction::Wdr => "WDR".to_string(),
        Instruction::Spm => "SPM".to_string(),
        Instruction::SpmPostInc => "SPM Z+".to_string(),
        Instruction::Des { k } => format!("DES {k:#X}"),
        Instruction::Com { d } => format!("COM {}", reg(d)),
        Instruction::Neg { d } => format!("NEG {}", reg(d)),
        Instruction::Swap { d } => format!("SWAP {}", reg(d)),
        Instruction::Inc { d } => format!("INC {}", reg(d)),
        Instruction::Asr { d } => format!("ASR {}", reg(d)),
        Instruction::Lsr { d } => format!("LSR {}", reg(d)),
        Instruction::Ror { d } => format!("ROR {}", reg(d)),
        Instruction::Dec { d } => format!("DEC {}", reg(d)),
        Instruction::Jmp { k } => format!("JMP {}", prog_target(k)),
        Instruction::Call { k } => format!("CALL {}", prog_target(k)),
        Instruction::Adiw { d, k } => format!("ADIW {}, {}", pair(d), imm8(k)),
        Instruction::Sbiw { d, k } => format!("SBIW {}, {}", pair(d), imm8(k)),
        Instruction::Cbi { a, b } => format!("CBI {}, {b}", io_addr(a)),
        Instruction::Sbic { a, b } => format!("SBIC {}, {b}", io_addr(a)),
        Instruction::Sbi { a, b } => format!("SBI {}, {b}", io_addr(a)),
        Instruction::Sbis { a, b } => format!("SBIS {}, {b}", io_addr(a)),
        Instruction::Mul { d, r } => format!("MUL {}, {}", reg(d), reg(r)),
        Instruction::In { d, a } => format!("IN {}, {}", reg(d), io_addr(a)),
        Instruction::Out { a, r } => format!("OUT {}, {}", io_addr(a), reg(r)),
        Instruction::Rjmp { k } => format!("RJMP {}", rel_target(pc_after, i32::from(k))),
        Instruction::Rcall { k } => format!("RCALL {}", rel_target(pc_after, i32::from(k))),
        Instruction::Ldi { d, k } => format!("LDI {}, {}", reg(d), imm8(k)),
        Instruction::Brbs { s, k } => {
            format!("{} {}", BRANCH_NAMES[s as usize].0, rel_target(pc_after, i32::from(k)))
        }
        Instruction::Brbc { s, k } => {
            format!("{} {}", BRANCH_NAMES[s as usize].1, rel_target(pc_after, i32::from(k)))
        }
        Instruction::Bld { d, b } => format!("BLD {}, {b}", reg(d)),
        Instruction::Bst { d, b } => format!("BST {}, {b}", reg(d)),
        Instruction::Sbrc { r, b } => format!("SBRC {}, {b}", reg(r)),
        Instruction::Sbrs { r, b } => format!("SBRS {}, {b}", reg(r)),
        Instruction::Unknown => "*** ?!?".to_string(),
    }
}
