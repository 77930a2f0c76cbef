//! Instruction encoder.
//!
//! Renders addressed statements into lowercase hexadecimal machine words:
//! the opcode byte, the register nibbles for shapes that carry them, and the
//! 8-byte little-endian field for shapes that end in one.

use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};
use crate::ir::*;
use crate::layout::LabelTable;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// What the encoder does with a reference to an undefined label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelPolicy {
    /// Fail the run with [`AsmError::UndefinedLabel`].
    #[default]
    Strict,
    /// Substitute address 0, keep going, and report each miss as a diagnostic.
    BestEffort,
}

/// Encoder output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    /// One hex word per non-label statement, in program order.
    pub words: Vec<String>,
    /// Non-fatal problems (undefined labels under [`LabelPolicy::BestEffort`]).
    pub diagnostics: Vec<AsmError>,
}

/// Encode every non-label statement.
///
/// Under [`LabelPolicy::Strict`], undefined labels are collected (at most
/// `max_errors` of them) and returned together.
///
/// # Errors
///
/// Returns [`AsmError::ImmediateOverflow`] for a resolved address that does not
/// fit the signed 64-bit field, and [`AsmError::UndefinedLabel`] (or
/// [`AsmError::Multiple`]) for undefined labels under the strict policy.
pub fn encode(
    statements: &[Statement],
    labels: &LabelTable,
    policy: LabelPolicy,
    max_errors: usize,
) -> Result<Encoded, AsmError> {
    let mut out = Encoded {
        words: Vec::with_capacity(statements.len()),
        diagnostics: Vec::new(),
    };
    let mut errors = Vec::new();

    for stmt in statements {
        let StatementBody::Instruction(instr) = &stmt.body else {
            continue;
        };
        let value = match field_value(instr, stmt.span, labels) {
            Ok(value) => value,
            Err(err @ AsmError::UndefinedLabel { .. }) => match policy {
                LabelPolicy::Strict => {
                    errors.push(err);
                    if errors.len() >= max_errors {
                        break;
                    }
                    continue;
                }
                LabelPolicy::BestEffort => {
                    log::warn!("{}; substituting 0", err);
                    out.diagnostics.push(err);
                    0
                }
            },
            Err(err) => return Err(err),
        };
        out.words.push(encode_instruction(instr, value));
    }

    if let Some(err) = AsmError::collect(errors) {
        return Err(err);
    }
    log::debug!(
        "encoded {} words ({} diagnostics)",
        out.words.len(),
        out.diagnostics.len()
    );
    Ok(out)
}

/// Value of the 8-byte field: label address or literal (0 when fieldless).
///
/// # Errors
///
/// Returns [`AsmError::UndefinedLabel`] for an unknown label and
/// [`AsmError::ImmediateOverflow`] for an address above `i64::MAX`.
pub fn field_value(instr: &Instruction, span: Span, labels: &LabelTable) -> Result<i64, AsmError> {
    match &instr.target {
        Target::None => Ok(0),
        Target::Immediate(v) => Ok(*v),
        Target::Label(name) => {
            let addr = labels.get(name).ok_or_else(|| AsmError::UndefinedLabel {
                label: name.clone(),
                span,
            })?;
            i64::try_from(addr).map_err(|_| AsmError::ImmediateOverflow {
                value: addr as i128,
                min: i64::MIN as i128,
                max: i64::MAX as i128,
                span,
            })
        }
    }
}

/// Encode one instruction with an already-resolved field value.
pub fn encode_instruction(instr: &Instruction, value: i64) -> String {
    let desc = instr.op.descriptor();
    let mut word = String::with_capacity(2 * desc.length() as usize);
    if let Some(opcode) = desc.opcode {
        push_byte(&mut word, opcode);
    }
    match desc.shape {
        Shape::None => {}
        Shape::RegReg => push_registers(&mut word, instr),
        Shape::Control => push_field(&mut word, value),
        Shape::RegRegImm => {
            push_registers(&mut word, instr);
            push_field(&mut word, value);
        }
    }
    word
}

/// Two's-complement little-endian rendering of a 64-bit value (16 digits).
pub fn little_endian_hex(value: i64) -> String {
    let mut out = String::with_capacity(16);
    push_field(&mut out, value);
    out
}

#[inline]
fn push_nibble(out: &mut String, nibble: u8) {
    out.push(HEX_DIGITS[(nibble & 0xf) as usize] as char);
}

#[inline]
fn push_byte(out: &mut String, byte: u8) {
    push_nibble(out, byte >> 4);
    push_nibble(out, byte);
}

#[inline]
fn push_registers(out: &mut String, instr: &Instruction) {
    push_nibble(out, instr.reg1.code());
    push_nibble(out, instr.reg2.code());
}

#[inline]
fn push_field(out: &mut String, value: i64) {
    for byte in value.to_le_bytes() {
        push_byte(out, byte);
    }
}
