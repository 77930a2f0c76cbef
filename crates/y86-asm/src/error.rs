//! Error types and source span tracking for diagnostics.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// Source location for diagnostics.
///
/// Tokens produced by [`tokenize`](crate::lexer::tokenize) carry their line,
/// column, and byte offset. Tokens handed in pre-split through
/// [`Assembler::emit_tokens`](crate::Assembler::emit_tokens) have no source
/// text behind them; their span has line 0 and `offset` holds the token index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// 1-based line number (0 for pre-split tokens).
    pub line: u32,
    /// 1-based column number (byte offset within line).
    pub col: u32,
    /// 0-based byte offset from start of source, or token index.
    pub offset: usize,
    /// Byte length of the spanned region.
    pub len: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub fn new(line: u32, col: u32, offset: usize, len: usize) -> Self {
        Self {
            line,
            col,
            offset,
            len,
        }
    }

    /// An all-zero span for hand-built statements with no source location.
    #[must_use]
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Span for the `index`-th token of a pre-split token stream.
    #[must_use]
    pub fn token(index: usize, len: usize) -> Self {
        Self {
            line: 0,
            col: 0,
            offset: index,
            len,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "token {}", self.offset)
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

/// Assembly error with source location and descriptive message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// Statement head is neither a mnemonic, a directive, nor a label.
    UnknownMnemonic {
        /// The mnemonic that was not recognized.
        mnemonic: String,
        /// Source location of the unknown mnemonic.
        span: Span,
    },

    /// A register operand names no register in the register table.
    UnknownRegister {
        /// The offending operand text.
        name: String,
        /// Source location of the operand.
        span: Span,
    },

    /// The token stream ended before a statement received all its operands.
    MissingOperand {
        /// Mnemonic or directive of the truncated statement.
        mnemonic: String,
        /// Source location of the statement head.
        span: Span,
    },

    /// A literal or resolved address does not fit the 64-bit signed field.
    ImmediateOverflow {
        /// The value that overflowed.
        value: i128,
        /// Minimum allowed value.
        min: i128,
        /// Maximum allowed value.
        max: i128,
        /// Source location of the value.
        span: Span,
    },

    /// Referenced label was never defined.
    UndefinedLabel {
        /// The undefined label name.
        label: String,
        /// Source location of the reference.
        span: Span,
    },

    /// Label was defined more than once.
    DuplicateLabel {
        /// The duplicated label name.
        label: String,
        /// Source location of the duplicate definition.
        span: Span,
        /// Source location of the first definition.
        first_span: Span,
    },

    /// A directive argument is not a decimal or `0x` hex numeral.
    MalformedDirectiveArgument {
        /// Directive name (`pos`, `align`, `quad`).
        directive: String,
        /// The argument text that failed to parse.
        text: String,
        /// Source location of the argument.
        span: Span,
    },

    /// `.pos` target lies behind the current address.
    BackwardPosition {
        /// Requested absolute address.
        target: u64,
        /// Address already reached when the directive was seen.
        current: u64,
        /// Source location of the directive.
        span: Span,
    },

    /// `.align` with a zero boundary.
    InvalidAlignment {
        /// The requested alignment.
        alignment: u64,
        /// Source location of the directive.
        span: Span,
    },

    /// Malformed source text.
    Syntax {
        /// The syntax error message.
        msg: String,
        /// Source location of the syntax error.
        span: Span,
    },

    /// A configurable resource limit was exceeded.
    ResourceLimitExceeded {
        /// Human-readable name of the resource (e.g. "statements", "labels").
        resource: String,
        /// The configured limit that was exceeded.
        limit: usize,
    },

    /// Multiple errors collected during assembly.
    Multiple {
        /// The collected assembly errors.
        errors: Vec<AsmError>,
    },
}

impl AsmError {
    /// Fold a list of collected errors into one value.
    ///
    /// Returns `None` for an empty list, the error itself for a single entry,
    /// and [`AsmError::Multiple`] otherwise.
    #[must_use]
    pub fn collect(mut errors: Vec<AsmError>) -> Option<AsmError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(AsmError::Multiple { errors }),
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::UnknownMnemonic { mnemonic, span } => {
                write!(f, "{}: unknown mnemonic '{}'", span, mnemonic)
            }
            AsmError::UnknownRegister { name, span } => {
                write!(f, "{}: unknown register '{}'", span, name)
            }
            AsmError::MissingOperand { mnemonic, span } => {
                write!(f, "{}: missing operand for '{}'", span, mnemonic)
            }
            AsmError::ImmediateOverflow {
                value,
                min,
                max,
                span,
            } => {
                write!(
                    f,
                    "{}: immediate value {} out of range [{}..{}]",
                    span, value, min, max
                )
            }
            AsmError::UndefinedLabel { label, span } => {
                write!(f, "{}: undefined label '{}'", span, label)
            }
            AsmError::DuplicateLabel {
                label,
                span,
                first_span,
            } => {
                write!(
                    f,
                    "{}: duplicate label '{}' (first defined at {})",
                    span, label, first_span
                )
            }
            AsmError::MalformedDirectiveArgument {
                directive,
                text,
                span,
            } => {
                write!(
                    f,
                    "{}: malformed argument '{}' for .{}",
                    span, text, directive
                )
            }
            AsmError::BackwardPosition {
                target,
                current,
                span,
            } => {
                write!(
                    f,
                    "{}: .pos 0x{:x} is behind the current address 0x{:x}",
                    span, target, current
                )
            }
            AsmError::InvalidAlignment { alignment, span } => {
                write!(f, "{}: invalid alignment {}", span, alignment)
            }
            AsmError::Syntax { msg, span } => {
                write!(f, "{}: {}", span, msg)
            }
            AsmError::ResourceLimitExceeded { resource, limit } => {
                write!(
                    f,
                    "resource limit exceeded: {} (limit: {})",
                    resource, limit
                )
            }
            AsmError::Multiple { errors } => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsmError {}
