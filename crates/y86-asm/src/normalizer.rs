//! Operand normalizer: splits the flat token stream into statements and
//! rewrites every instruction into the canonical `(mnemonic, reg1, reg2, value)`
//! slot order.
//!
//! The concrete syntax is irregular: `irmovq` names its immediate first,
//! `pushq`/`popq` take a single register, and the memory moves put the
//! displacement on either side and may omit it. After this pass, the layout
//! resolver sees exactly one slot arrangement per [`Shape`].

use alloc::borrow::Cow;
#[allow(unused_imports)]
use alloc::format;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};
use crate::ir::{Directive, Mnemonic, Register, Shape};
use crate::lexer::Token;

/// A statement in canonical slot order.
///
/// Absent register slots are `None` and read as the `none` sentinel register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical<'src> {
    /// Label definition; `name` excludes the trailing `:`.
    Label {
        /// Label name.
        name: Cow<'src, str>,
        /// Location of the defining token.
        span: Span,
    },
    /// Layout directive with its single argument.
    Directive {
        /// Which directive.
        directive: Directive,
        /// Unparsed argument.
        argument: Token<'src>,
        /// Location of the directive token.
        span: Span,
    },
    /// Machine instruction.
    Instruction {
        /// Opcode.
        mnemonic: Mnemonic,
        /// First register slot.
        reg1: Option<Token<'src>>,
        /// Second register slot.
        reg2: Option<Token<'src>>,
        /// Immediate, displacement, or label slot.
        value: Option<Token<'src>>,
        /// Location of the mnemonic token.
        span: Span,
    },
}

impl Canonical<'_> {
    /// Location of the statement head.
    pub fn span(&self) -> Span {
        match self {
            Canonical::Label { span, .. }
            | Canonical::Directive { span, .. }
            | Canonical::Instruction { span, .. } => *span,
        }
    }
}

struct Cursor<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
}

impl<'t, 'src> Cursor<'t, 'src> {
    fn next(&mut self) -> Option<&'t Token<'src>> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn operand(&mut self, head: &Token<'_>) -> Result<Token<'src>, AsmError> {
        self.next().cloned().ok_or_else(|| AsmError::MissingOperand {
            mnemonic: head.text().to_string(),
            span: head.span,
        })
    }

    fn peek_is_register(&self) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| Register::from_name(t.text()).is_some())
    }
}

/// Normalize a whole token stream.
///
/// # Errors
///
/// Returns [`AsmError::UnknownMnemonic`] for a statement head that is not a
/// label, directive, or mnemonic, and [`AsmError::MissingOperand`] when the
/// stream ends inside a statement.
pub fn normalize<'src>(tokens: &[Token<'src>]) -> Result<Vec<Canonical<'src>>, AsmError> {
    let mut cursor = Cursor { tokens, pos: 0 };
    let mut out = Vec::new();

    while let Some(head) = cursor.next() {
        if let Some(name) = head.label_def() {
            out.push(Canonical::Label {
                name: label_name(head, name.len()),
                span: head.span,
            });
            continue;
        }

        if let Some(directive) = Directive::from_name(head.text()) {
            let argument = cursor.operand(head)?;
            out.push(Canonical::Directive {
                directive,
                argument,
                span: head.span,
            });
            continue;
        }

        let mnemonic =
            Mnemonic::from_name(head.text()).ok_or_else(|| AsmError::UnknownMnemonic {
                mnemonic: head.text().to_string(),
                span: head.span,
            })?;
        out.push(normalize_instruction(mnemonic, head, &mut cursor)?);
    }

    log::debug!("normalized {} tokens into {} statements", tokens.len(), out.len());
    Ok(out)
}

fn normalize_instruction<'src>(
    mnemonic: Mnemonic,
    head: &Token<'src>,
    cursor: &mut Cursor<'_, 'src>,
) -> Result<Canonical<'src>, AsmError> {
    let (reg1, reg2, value) = match mnemonic {
        // `irmovq V, rB`
        Mnemonic::Irmovq => {
            let value = cursor.operand(head)?;
            let rb = cursor.operand(head)?;
            (None, Some(rb), Some(value))
        }
        // `rmmovq rA, D(rB)` or `rmmovq rA, (rB)`
        Mnemonic::Rmmovq => {
            let ra = cursor.operand(head)?;
            let (disp, rb) = displaced_base(head, cursor)?;
            (Some(ra), Some(rb), Some(disp))
        }
        // `mrmovq D(rB), rA` or `mrmovq (rB), rA`
        // The base register takes the high nibble (`50 rB rA`), unlike the
        // textbook `50 rA rB` layout.
        Mnemonic::Mrmovq => {
            let (disp, rb) = displaced_base(head, cursor)?;
            let ra = cursor.operand(head)?;
            (Some(rb), Some(ra), Some(disp))
        }
        Mnemonic::Pushq | Mnemonic::Popq => {
            let ra = cursor.operand(head)?;
            (Some(ra), None, None)
        }
        _ => match mnemonic.descriptor().shape {
            Shape::None => (None, None, None),
            Shape::RegReg => {
                let ra = cursor.operand(head)?;
                let rb = cursor.operand(head)?;
                (Some(ra), Some(rb), None)
            }
            Shape::Control => (None, None, Some(cursor.operand(head)?)),
            Shape::RegRegImm => {
                let ra = cursor.operand(head)?;
                let rb = cursor.operand(head)?;
                let value = cursor.operand(head)?;
                (Some(ra), Some(rb), Some(value))
            }
        },
    };

    Ok(Canonical::Instruction {
        mnemonic,
        reg1,
        reg2,
        value,
        span: head.span,
    })
}

/// Read `D rB` or a bare `rB`; a missing displacement reads as `0`.
fn displaced_base<'src>(
    head: &Token<'src>,
    cursor: &mut Cursor<'_, 'src>,
) -> Result<(Token<'src>, Token<'src>), AsmError> {
    if cursor.peek_is_register() {
        let base = cursor.operand(head)?;
        Ok((Token::new("0", base.span), base))
    } else {
        let disp = cursor.operand(head)?;
        let base = cursor.operand(head)?;
        Ok((disp, base))
    }
}

fn label_name<'src>(head: &Token<'src>, len: usize) -> Cow<'src, str> {
    match &head.text {
        Cow::Borrowed(s) => Cow::Borrowed(&s[..len]),
        Cow::Owned(s) => Cow::Owned(s[..len].to_string()),
    }
}
