//! # y86-asm: Y86-64 Assembler
//!
//! `y86-asm` turns Y86-64 assembly text into the textual hex image consumed by
//! Y86 simulators: one line of lowercase hex per encoded statement, with long
//! `nop` padding runs folded into lines of sixteen.
//!
//! ## Quick Start
//!
//! ```rust
//! use y86_asm::assemble;
//!
//! let lines = assemble("irmovq $10, %rax\nrrmovq %rax, %rbx\nhalt").unwrap();
//! assert_eq!(lines, vec!["30f00a00000000000000", "2003", "00"]);
//! ```
//!
//! ## Pipeline
//!
//! 1. [`lexer`]: source text to a flat token stream.
//! 2. [`normalizer`]: tokens to statements in canonical operand order.
//! 3. [`layout`]: addresses, `.pos`/`.align` padding, label table.
//! 4. [`encoder`]: hex words, with labels resolved.
//! 5. [`compact`]: `nop` runs grouped into output lines.
//!
//! The crate is `no_std` + `alloc` when the default `std` feature is off.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Addresses move between u64, i64 and i128 for range checks, and register
// codes are narrowed to nibbles. The lints below are expected here.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::manual_let_else,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::needless_continue
)]

extern crate alloc;

/// Public assembler API: builder pattern, resource limits, and `AssemblyResult`.
pub mod assembler;
/// Output compaction of `nop` runs.
pub mod compact;
/// Y86-64 instruction encoder (opcode byte, register nibbles, little-endian field).
pub mod encoder;
/// Error types and source-span diagnostics.
pub mod error;
/// Intermediate representation: registers, mnemonics, directives, statements.
pub mod ir;
/// Layout resolver: addresses, padding, label table.
pub mod layout;
/// Zero-copy lexer (tokenizer) with span tracking.
pub mod lexer;
/// Operand normalizer producing canonical statements.
pub mod normalizer;

// Re-exports
pub use assembler::{Assembler, AssemblyResult, ResourceLimits};
pub use compact::compact;
pub use encoder::LabelPolicy;
pub use error::{AsmError, Span};
pub use ir::{Directive, Instruction, Mnemonic, Op, Register, Shape, Statement, StatementBody, Target};
pub use layout::LabelTable;

use alloc::string::String;
use alloc::vec::Vec;

/// Assemble source text into compacted hex output lines.
///
/// Newlines and whitespace separate tokens; `#` starts a comment. Labels are
/// defined with a trailing colon: `loop:`.
///
/// # Errors
///
/// Returns [`AsmError`] for unknown mnemonics or registers, missing operands,
/// out-of-range literals, malformed directives, undefined or duplicate
/// labels, or a backward `.pos`.
///
/// # Examples
///
/// ```rust
/// use y86_asm::assemble;
///
/// let lines = assemble("loop: jmp loop").unwrap();
/// assert_eq!(lines, vec!["700000000000000000"]);
/// ```
pub fn assemble(source: &str) -> Result<Vec<String>, AsmError> {
    let mut asm = Assembler::new();
    asm.emit(source)?;
    Ok(asm.finish()?.into_lines())
}

/// Assemble a pre-split token stream (operand punctuation already removed).
///
/// # Errors
///
/// Returns [`AsmError`] on assembly failure (see [`assemble`] for details).
/// Error spans name the token index.
///
/// # Examples
///
/// ```rust
/// use y86_asm::assemble_tokens;
///
/// let lines = assemble_tokens(&["irmovq", "-1", "rax", "halt"]).unwrap();
/// assert_eq!(lines, vec!["30f0ffffffffffffffff", "00"]);
/// ```
pub fn assemble_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<String>, AsmError> {
    let mut asm = Assembler::new();
    asm.emit_tokens(tokens);
    Ok(asm.finish()?.into_lines())
}
