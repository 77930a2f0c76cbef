//! Intermediate representation types for the assembly pipeline.
//!
//! The register and instruction tables live here as `const` lookups: they are
//! built into the binary, never mutated, and safe to share between any number
//! of concurrent assembly runs.

use alloc::string::String;
use core::fmt;

use crate::error::Span;

/// Program register, including the `none` sentinel used to pad unused
/// register slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Register {
    /// Register 0.
    Rax,
    /// Register 1.
    Rcx,
    /// Register 2.
    Rdx,
    /// Register 3.
    Rbx,
    /// Register 4, the stack pointer.
    Rsp,
    /// Register 5.
    Rbp,
    /// Register 6.
    Rsi,
    /// Register 7.
    Rdi,
    /// Register 8.
    R8,
    /// Register 9.
    R9,
    /// Register 10.
    R10,
    /// Register 11.
    R11,
    /// Register 12.
    R12,
    /// Register 13.
    R13,
    /// Register 14.
    R14,
    /// No register (code `0xf`).
    None,
}

impl Register {
    /// All registers in code order.
    pub const ALL: [Register; 16] = [
        Register::Rax,
        Register::Rcx,
        Register::Rdx,
        Register::Rbx,
        Register::Rsp,
        Register::Rbp,
        Register::Rsi,
        Register::Rdi,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::R13,
        Register::R14,
        Register::None,
    ];

    /// Look up a register by name. Accepts `nil` for the sentinel.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Register> {
        let reg = match name {
            "rax" => Register::Rax,
            "rcx" => Register::Rcx,
            "rdx" => Register::Rdx,
            "rbx" => Register::Rbx,
            "rsp" => Register::Rsp,
            "rbp" => Register::Rbp,
            "rsi" => Register::Rsi,
            "rdi" => Register::Rdi,
            "r8" => Register::R8,
            "r9" => Register::R9,
            "r10" => Register::R10,
            "r11" => Register::R11,
            "r12" => Register::R12,
            "r13" => Register::R13,
            "r14" => Register::R14,
            "none" | "nil" => Register::None,
            _ => return None,
        };
        Some(reg)
    }

    /// 4-bit register code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Register::Rax => "rax",
            Register::Rcx => "rcx",
            Register::Rdx => "rdx",
            Register::Rbx => "rbx",
            Register::Rsp => "rsp",
            Register::Rbp => "rbp",
            Register::Rsi => "rsi",
            Register::Rdi => "rdi",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::R12 => "r12",
            Register::R13 => "r13",
            Register::R14 => "r14",
            Register::None => "none",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand shape of an instruction.
///
/// The shape decides both how many bytes a statement occupies and how the
/// encoder lays out its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// No operands.
    None,
    /// Two register operands.
    RegReg,
    /// One 8-byte target (label or immediate).
    Control,
    /// Two registers followed by an 8-byte immediate or label.
    RegRegImm,
}

impl Shape {
    /// Encoded length in bytes, counting the opcode byte only when present.
    #[must_use]
    pub const fn length(self, has_opcode: bool) -> u64 {
        let operands = match self {
            Shape::None => 0,
            Shape::RegReg => 1,
            Shape::Control => 8,
            Shape::RegRegImm => 9,
        };
        if has_opcode {
            operands + 1
        } else {
            operands
        }
    }

    /// Whether the shape carries two register nibbles.
    #[must_use]
    pub const fn has_registers(self) -> bool {
        matches!(self, Shape::RegReg | Shape::RegRegImm)
    }

    /// Whether the shape ends in an 8-byte little-endian field.
    #[must_use]
    pub const fn has_field(self) -> bool {
        matches!(self, Shape::Control | Shape::RegRegImm)
    }
}

/// Static description of an opcode: its shape and opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Operand shape.
    pub shape: Shape,
    /// Opcode byte; `None` for the `quad` data directive.
    pub opcode: Option<u8>,
}

impl Descriptor {
    /// Encoded length in bytes.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.shape.length(self.opcode.is_some())
    }
}

macro_rules! mnemonics {
    ($($variant:ident => $name:literal, $shape:ident, $opcode:literal;)*) => {
        /// Instruction mnemonic.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Mnemonic {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl Mnemonic {
            /// Every mnemonic, in opcode order.
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$variant),*];

            /// Look up a mnemonic by its source spelling.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Mnemonic> {
                match name {
                    $($name => Some(Mnemonic::$variant),)*
                    _ => None,
                }
            }

            /// Source spelling.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Mnemonic::$variant => $name,)*
                }
            }

            /// Table entry: shape and opcode byte.
            #[must_use]
            pub const fn descriptor(self) -> Descriptor {
                match self {
                    $(Mnemonic::$variant => Descriptor {
                        shape: Shape::$shape,
                        opcode: Some($opcode),
                    },)*
                }
            }
        }
    };
}

mnemonics! {
    Halt => "halt", None, 0x00;
    Nop => "nop", None, 0x10;
    Rrmovq => "rrmovq", RegReg, 0x20;
    Cmovle => "cmovle", RegReg, 0x21;
    Cmovl => "cmovl", RegReg, 0x22;
    Cmove => "cmove", RegReg, 0x23;
    Cmovne => "cmovne", RegReg, 0x24;
    Cmovge => "cmovge", RegReg, 0x25;
    Cmovg => "cmovg", RegReg, 0x26;
    Irmovq => "irmovq", RegRegImm, 0x30;
    Rmmovq => "rmmovq", RegRegImm, 0x40;
    Mrmovq => "mrmovq", RegRegImm, 0x50;
    Addq => "addq", RegReg, 0x60;
    Subq => "subq", RegReg, 0x61;
    Andq => "andq", RegReg, 0x62;
    Xorq => "xorq", RegReg, 0x63;
    Jmp => "jmp", Control, 0x70;
    Jle => "jle", Control, 0x71;
    Jl => "jl", Control, 0x72;
    Je => "je", Control, 0x73;
    Jne => "jne", Control, 0x74;
    Jge => "jge", Control, 0x75;
    Jg => "jg", Control, 0x76;
    Call => "call", Control, 0x80;
    Ret => "ret", None, 0x90;
    Pushq => "pushq", RegReg, 0xa0;
    Popq => "popq", RegReg, 0xb0;
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Directive {
    /// `.pos N`: move the location counter to absolute address `N`.
    Pos,
    /// `.align N`: pad up to the next multiple of `N`.
    Align,
    /// `.quad V`: emit a raw 8-byte value.
    Quad,
}

impl Directive {
    /// Look up a directive; the leading `.` is optional.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Directive> {
        match name.strip_prefix('.').unwrap_or(name) {
            "pos" => Some(Directive::Pos),
            "align" => Some(Directive::Align),
            "quad" => Some(Directive::Quad),
            _ => None,
        }
    }

    /// Name without the leading `.`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Directive::Pos => "pos",
            Directive::Align => "align",
            Directive::Quad => "quad",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.name())
    }
}

/// The `quad` directive shares the control shape but has no opcode byte.
pub const QUAD: Descriptor = Descriptor {
    shape: Shape::Control,
    opcode: None,
};

/// What an encodable statement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    /// A machine instruction.
    Instruction(Mnemonic),
    /// Raw 8-byte data from `.quad`.
    Quad,
}

impl Op {
    /// Table entry for this operation.
    #[must_use]
    pub const fn descriptor(self) -> Descriptor {
        match self {
            Op::Instruction(m) => m.descriptor(),
            Op::Quad => QUAD,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Instruction(m) => write!(f, "{}", m),
            Op::Quad => write!(f, "{}", Directive::Quad),
        }
    }
}

/// Value carried in the 8-byte field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// The shape has no field.
    None,
    /// A literal 64-bit value.
    Immediate(i64),
    /// A label resolved during encoding.
    Label(String),
}

/// An addressed instruction (or filler / `.quad` data).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// Opcode.
    pub op: Op,
    /// First register slot.
    pub reg1: Register,
    /// Second register slot.
    pub reg2: Register,
    /// 8-byte field contents.
    pub target: Target,
}

impl Instruction {
    /// The one-byte `nop` used to realize `.pos`/`.align` padding.
    #[must_use]
    pub fn filler() -> Self {
        Self {
            op: Op::Instruction(Mnemonic::Nop),
            reg1: Register::None,
            reg2: Register::None,
            target: Target::None,
        }
    }
}

/// Statement body: a label definition or something that encodes to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatementBody {
    /// Label definition (name without the trailing `:`).
    Label(String),
    /// Encodable statement.
    Instruction(Instruction),
}

/// One resolved unit of the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    /// Address of the first byte.
    pub start_address: u64,
    /// Size in bytes (0 for labels).
    pub length: u64,
    /// Label or instruction.
    pub body: StatementBody,
    /// Source location of the statement head; fillers carry their directive's.
    pub span: Span,
}

impl Statement {
    /// Address one past the last byte.
    #[must_use]
    pub fn end_address(&self) -> u64 {
        self.start_address + self.length
    }

    /// Whether this statement defines a label.
    #[must_use]
    pub fn is_label(&self) -> bool {
        matches!(self.body, StatementBody::Label(_))
    }

    /// The label defined here, or the label this instruction references.
    #[must_use]
    pub fn label_name(&self) -> Option<&str> {
        match &self.body {
            StatementBody::Label(name) => Some(name),
            StatementBody::Instruction(Instruction {
                target: Target::Label(name),
                ..
            }) => Some(name),
            StatementBody::Instruction(_) => None,
        }
    }

    /// Operation of an encodable statement.
    #[must_use]
    pub fn op(&self) -> Option<Op> {
        match &self.body {
            StatementBody::Instruction(instr) => Some(instr.op),
            StatementBody::Label(_) => None,
        }
    }

    /// Mnemonic of an instruction statement (`None` for labels and `.quad`).
    #[must_use]
    pub fn mnemonic(&self) -> Option<Mnemonic> {
        match self.op()? {
            Op::Instruction(m) => Some(m),
            Op::Quad => None,
        }
    }

    /// Literal field value; 0 for labels, label references, and fieldless shapes.
    #[must_use]
    pub fn immediate(&self) -> i64 {
        match &self.body {
            StatementBody::Instruction(Instruction {
                target: Target::Immediate(v),
                ..
            }) => *v,
            _ => 0,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            StatementBody::Label(name) => write!(f, "{}:", name),
            StatementBody::Instruction(instr) => {
                let shape = instr.op.descriptor().shape;
                write!(f, "{}", instr.op)?;
                let mut sep = " ";
                if shape.has_registers() {
                    write!(f, " {}, {}", instr.reg1, instr.reg2)?;
                    sep = ", ";
                }
                match &instr.target {
                    Target::None => Ok(()),
                    Target::Immediate(v) => write!(f, "{}{:#x}", sep, v),
                    Target::Label(name) => write!(f, "{}{}", sep, name),
                }
            }
        }
    }
}
