//! Layout resolution: address assignment, directive expansion, label table.
//!
//! One left-to-right pass over the canonical statements assigns every
//! statement its start address and length. `.pos` and `.align` are realized as
//! runs of one-byte `nop` fillers, so the statement list always covers the
//! address space contiguously. Labels are only collected here; references are
//! resolved by the encoder once the whole program is laid out.

use alloc::collections::BTreeMap;
#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::assembler::ResourceLimits;
use crate::error::{AsmError, Span};
use crate::ir::{Directive, Instruction, Op, Register, Statement, StatementBody, Target};
use crate::lexer::{parse_numeral, Token};
use crate::normalizer::Canonical;

/// A label definition in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelDef {
    /// Resolved byte address.
    pub address: u64,
    /// Where the label was defined.
    pub span: Span,
}

/// Mapping from label name to resolved address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelTable {
    entries: BTreeMap<String, LabelDef>,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from every label statement.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::DuplicateLabel`] if a name is defined twice.
    pub fn from_statements(statements: &[Statement]) -> Result<Self, AsmError> {
        let mut table = Self::new();
        for stmt in statements {
            if let StatementBody::Label(name) = &stmt.body {
                table.insert(name, stmt.start_address, stmt.span)?;
            }
        }
        Ok(table)
    }

    /// Define `name` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::DuplicateLabel`] if the label was already defined.
    pub fn insert(&mut self, name: &str, address: u64, span: Span) -> Result<(), AsmError> {
        if let Some(existing) = self.entries.get(name) {
            return Err(AsmError::DuplicateLabel {
                label: String::from(name),
                span,
                first_span: existing.span,
            });
        }
        self.entries
            .insert(String::from(name), LabelDef { address, span });
        Ok(())
    }

    /// Address of `name`, if defined.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|def| def.address)
    }

    /// Full definition of `name`, if defined.
    pub fn definition(&self, name: &str) -> Option<&LabelDef> {
        self.entries.get(name)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no label is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|(name, def)| (name.as_str(), def.address))
    }
}

/// Output of [`resolve`]: addressed statements plus the label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Statements in program order, fillers included.
    pub statements: Vec<Statement>,
    /// Every label's resolved address.
    pub labels: LabelTable,
}

impl Layout {
    /// One past the highest address covered.
    pub fn end_address(&self) -> u64 {
        self.statements.last().map_or(0, Statement::end_address)
    }
}

/// Lay out a normalized program starting at address 0.
///
/// # Errors
///
/// - [`AsmError::MalformedDirectiveArgument`] for a non-numeral directive argument.
/// - [`AsmError::BackwardPosition`] for a `.pos` behind the current address.
/// - [`AsmError::InvalidAlignment`] for `.align 0`.
/// - [`AsmError::ImmediateOverflow`] for a literal outside the 64-bit signed range.
/// - [`AsmError::UnknownRegister`] for a register slot naming no register.
/// - [`AsmError::DuplicateLabel`] for a label defined twice.
/// - [`AsmError::ResourceLimitExceeded`] when `limits` are exceeded.
pub fn resolve(program: &[Canonical<'_>], limits: &ResourceLimits) -> Result<Layout, AsmError> {
    let mut resolver = Resolver {
        limits,
        statements: Vec::with_capacity(program.len()),
        cur: 0,
        label_count: 0,
    };

    for stmt in program {
        resolver.statement(stmt)?;
    }

    let labels = LabelTable::from_statements(&resolver.statements)?;
    log::debug!(
        "layout: {} statements, {} labels, {} bytes",
        resolver.statements.len(),
        labels.len(),
        resolver.cur
    );
    Ok(Layout {
        statements: resolver.statements,
        labels,
    })
}

struct Resolver<'l> {
    limits: &'l ResourceLimits,
    statements: Vec<Statement>,
    cur: u64,
    label_count: usize,
}

impl Resolver<'_> {
    fn statement(&mut self, stmt: &Canonical<'_>) -> Result<(), AsmError> {
        match stmt {
            Canonical::Label { name, span } => {
                self.label_count += 1;
                if self.label_count > self.limits.max_labels {
                    return Err(AsmError::ResourceLimitExceeded {
                        resource: String::from("labels"),
                        limit: self.limits.max_labels,
                    });
                }
                self.push(0, StatementBody::Label(name.to_string()), *span)
            }
            Canonical::Directive {
                directive,
                argument,
                span,
            } => self.directive(*directive, argument, *span),
            Canonical::Instruction {
                mnemonic,
                reg1,
                reg2,
                value,
                span,
            } => {
                let op = Op::Instruction(*mnemonic);
                let desc = op.descriptor();
                let target = match value {
                    Some(tok) if desc.shape.has_field() => operand_target(tok)?,
                    _ => Target::None,
                };
                let instr = Instruction {
                    op,
                    reg1: register(reg1.as_ref())?,
                    reg2: register(reg2.as_ref())?,
                    target,
                };
                self.push(desc.length(), StatementBody::Instruction(instr), *span)
            }
        }
    }

    fn directive(
        &mut self,
        directive: Directive,
        argument: &Token<'_>,
        span: Span,
    ) -> Result<(), AsmError> {
        let value = parse_numeral(argument.text()).ok_or_else(|| {
            AsmError::MalformedDirectiveArgument {
                directive: directive.name().to_string(),
                text: argument.text().to_string(),
                span: argument.span,
            }
        })?;

        match directive {
            Directive::Pos => {
                let target = address_value(value, argument.span)?;
                if target < self.cur {
                    return Err(AsmError::BackwardPosition {
                        target,
                        current: self.cur,
                        span,
                    });
                }
                self.pad_to(target, span)
            }
            Directive::Align => {
                let alignment = address_value(value, argument.span)?;
                if alignment == 0 {
                    return Err(AsmError::InvalidAlignment { alignment, span });
                }
                let target = self
                    .cur
                    .div_ceil(alignment)
                    .checked_mul(alignment)
                    .ok_or_else(|| self.image_limit())?;
                self.pad_to(target, span)
            }
            Directive::Quad => {
                let instr = Instruction {
                    op: Op::Quad,
                    reg1: Register::None,
                    reg2: Register::None,
                    target: Target::Immediate(immediate_value(value, argument.span)?),
                };
                self.push(
                    Op::Quad.descriptor().length(),
                    StatementBody::Instruction(instr),
                    span,
                )
            }
        }
    }

    /// Emit one filler per byte between `cur` and `target`.
    fn pad_to(&mut self, target: u64, span: Span) -> Result<(), AsmError> {
        if target > self.limits.max_image_bytes as u64 {
            return Err(self.image_limit());
        }
        let padding = target - self.cur;
        for _ in 0..padding {
            self.push(1, StatementBody::Instruction(Instruction::filler()), span)?;
        }
        Ok(())
    }

    fn push(&mut self, length: u64, body: StatementBody, span: Span) -> Result<(), AsmError> {
        if self.statements.len() >= self.limits.max_statements {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("statements"),
                limit: self.limits.max_statements,
            });
        }
        let end = self.cur + length;
        if end > self.limits.max_image_bytes as u64 {
            return Err(self.image_limit());
        }
        self.statements.push(Statement {
            start_address: self.cur,
            length,
            body,
            span,
        });
        self.cur = end;
        Ok(())
    }

    fn image_limit(&self) -> AsmError {
        AsmError::ResourceLimitExceeded {
            resource: String::from("image bytes"),
            limit: self.limits.max_image_bytes,
        }
    }
}

fn register(slot: Option<&Token<'_>>) -> Result<Register, AsmError> {
    match slot {
        None => Ok(Register::None),
        Some(tok) => Register::from_name(tok.text()).ok_or_else(|| AsmError::UnknownRegister {
            name: tok.text().to_string(),
            span: tok.span,
        }),
    }
}

/// A value operand is a literal when it parses as a numeral, else a label.
fn operand_target(tok: &Token<'_>) -> Result<Target, AsmError> {
    match parse_numeral(tok.text()) {
        Some(value) => Ok(Target::Immediate(immediate_value(value, tok.span)?)),
        None => Ok(Target::Label(tok.text().to_string())),
    }
}

fn immediate_value(value: i128, span: Span) -> Result<i64, AsmError> {
    i64::try_from(value).map_err(|_| AsmError::ImmediateOverflow {
        value,
        min: i64::MIN as i128,
        max: i64::MAX as i128,
        span,
    })
}

/// Addresses are non-negative and must stay encodable as signed 64-bit fields.
fn address_value(value: i128, span: Span) -> Result<u64, AsmError> {
    if (0..=i64::MAX as i128).contains(&value) {
        Ok(value as u64)
    } else {
        Err(AsmError::ImmediateOverflow {
            value,
            min: 0,
            max: i64::MAX as i128,
            span,
        })
    }
}
