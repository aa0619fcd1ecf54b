//! The optional per-step trace sink.
//!
//! A `Tracer` owns a disassembler instance implicitly (it's handed the
//! already-disassembled line for the instruction about to execute) and
//! writes through an injected line-writer, a plain `io::Write` sink
//! rather than a logging facade.

use std::fmt::Write as _;
use std::io::Write;

use crate::Cpu;

/// Receives one record per executed [`Cpu::step`], plus a marker on
/// [`Cpu::reset`].
pub trait Tracer {
    /// Called with the disassembly of the instruction about to execute,
    /// before any state changes.
    fn before_execute(&mut self, disassembly: &str);

    /// Called with a full register/flag snapshot after the instruction
    /// has executed.
    fn after_execute(&mut self, snapshot: &str);

    /// Called by `Cpu::reset`, before any subsequent `before_execute`.
    fn reset_marker(&mut self);
}

/// A [`Tracer`] that writes the canonical text format to any
/// `io::Write` sink.
pub struct WriterTracer<W: Write> {
    sink: W,
}

impl<W: Write> WriterTracer<W> {
    pub fn new(sink: W) -> Self {
        WriterTracer { sink }
    }

    /// Releases the sink back to the caller.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Tracer for WriterTracer<W> {
    fn before_execute(&mut self, disassembly: &str) {
        let _ = writeln!(self.sink, "{disassembly}");
    }

    fn after_execute(&mut self, snapshot: &str) {
        let _ = writeln!(self.sink, "{snapshot}");
    }

    fn reset_marker(&mut self) {
        let _ = writeln!(self.sink, "*** RESET! ***");
    }
}

/// Builds the post-execution snapshot record: `PC`, `SP`, all 32
/// registers, SREG as a byte, and the bit dump.
pub(crate) fn snapshot(cpu: &Cpu) -> String {
    let mut out = String::new();
    let _ = write!(out, "=> PC=${:05X}\n", cpu.pc());
    let _ = write!(out, "   SP=${:04X}\n", cpu.sp());
    out.push_str("    ");
    for r in 0..32u8 {
        let _ = write!(out, "R{r}=${:02X} ", cpu.r(r));
    }
    out.push('\n');
    let _ = write!(
        out,
        "   SREG=${:02X} (I={} T={} H={} S={} V={} N={} Z={} C={})",
        cpu.sreg(),
        u8::from(cpu.interrupt_enable()),
        u8::from(cpu.t_bit()),
        u8::from(cpu.half_carry()),
        u8::from(cpu.sign()),
        u8::from(cpu.overflow()),
        u8::from(cpu.negative()),
        u8::from(cpu.zero()),
        u8::from(cpu.carry()),
    );
    out
}
