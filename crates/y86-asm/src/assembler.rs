//! Public assembler API: builder pattern and one-shot assembly.
//!
//! This module ties together the lexer, normalizer, layout resolver, encoder,
//! and compactor into a fluent API.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::compact::compact;
use crate::encoder::{self, LabelPolicy};
use crate::error::AsmError;
use crate::ir::{Statement, StatementBody};
use crate::layout::{self, LabelTable};
use crate::lexer::{self, Token};
use crate::normalizer;

/// The result of a successful assembly operation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct AssemblyResult {
    /// Addressed statements, fillers and labels included.
    statements: Vec<Statement>,
    /// Label addresses.
    labels: LabelTable,
    /// One hex word per non-label statement.
    words: Vec<String>,
    /// Non-fatal problems reported under [`LabelPolicy::BestEffort`].
    diagnostics: Vec<AsmError>,
}

impl AssemblyResult {
    /// Addressed statements in program order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// The label table.
    #[must_use]
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Look up a label address by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use y86_asm::Assembler;
    ///
    /// let mut asm = Assembler::new();
    /// asm.emit("start: nop\nnop\nend: halt")?;
    /// let result = asm.finish()?;
    /// assert_eq!(result.label_address("start"), Some(0));
    /// assert_eq!(result.label_address("end"), Some(2));
    /// assert_eq!(result.label_address("missing"), None);
    /// # Ok::<(), y86_asm::AsmError>(())
    /// ```
    #[must_use]
    pub fn label_address(&self, name: &str) -> Option<u64> {
        self.labels.get(name)
    }

    /// Uncompacted hex words, one per non-label statement.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Output lines with `nop` runs compacted.
    ///
    /// # Examples
    ///
    /// ```
    /// use y86_asm::Assembler;
    ///
    /// let mut asm = Assembler::new();
    /// asm.emit(".pos 20\nhalt")?;
    /// let result = asm.finish()?;
    /// assert_eq!(result.words().len(), 21);
    /// assert_eq!(result.lines(), vec!["10".repeat(16), "10".repeat(4), "00".into()]);
    /// # Ok::<(), y86_asm::AsmError>(())
    /// ```
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        compact(&self.words)
    }

    /// Consume the result and return the compacted lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        compact(&self.words)
    }

    /// The image as text: one line per compacted output line, each
    /// newline-terminated.
    #[must_use]
    pub fn image_text(&self) -> String {
        render_lines(&self.lines())
    }

    /// Image size in bytes.
    #[must_use]
    pub fn image_len(&self) -> u64 {
        self.statements.last().map_or(0, Statement::end_address)
    }

    /// Whether the program produced no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image_len() == 0
    }

    /// Non-fatal diagnostics (undefined labels under best-effort mode).
    #[must_use]
    pub fn diagnostics(&self) -> &[AsmError] {
        &self.diagnostics
    }

    /// Produce a human-readable listing: address, hex word, statement.
    ///
    /// Labels are shown on their own line with their resolved address.
    ///
    /// # Example output
    ///
    /// ```text
    /// 00000000                        main:
    /// 00000000  30f40001000000000000  irmovq none, rsp, 0x100
    /// 0000000a  00                    halt
    /// ```
    #[must_use]
    pub fn listing(&self) -> String {
        use core::fmt::Write;

        let mut out = String::new();
        let mut words = self.words.iter();
        for stmt in &self.statements {
            let word = match stmt.body {
                StatementBody::Label(_) => "",
                StatementBody::Instruction(_) => words.next().map_or("", String::as_str),
            };
            let _ = writeln!(out, "{:08x}  {:<20}  {}", stmt.start_address, word, stmt);
        }
        out
    }
}

/// Join output lines into image text, newline-terminating each line.
pub fn render_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Configurable resource limits for defense against pathological input.
///
/// A single `.pos 0x7fffffffffffffff` would otherwise request quintillions of
/// filler statements. All limits default to values far above any realistic
/// program for this instruction set.
///
/// # Examples
///
/// ```rust
/// use y86_asm::{Assembler, AsmError, ResourceLimits};
///
/// let mut asm = Assembler::new();
/// asm.limits(ResourceLimits {
///     max_image_bytes: 0x100,
///     ..ResourceLimits::default()
/// });
/// asm.emit(".pos 0x1000\nhalt")?;
/// assert!(matches!(asm.finish(), Err(AsmError::ResourceLimitExceeded { .. })));
/// # Ok::<(), AsmError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimits {
    /// Maximum source text accepted per `emit()` call. Default: 64 MiB.
    pub max_source_bytes: usize,
    /// Maximum number of tokens. Default: 4,000,000.
    pub max_tokens: usize,
    /// Maximum number of statements, fillers included. Default: 4,000,000.
    pub max_statements: usize,
    /// Maximum number of labels. Default: 100,000.
    pub max_labels: usize,
    /// Maximum image size in bytes. Default: 4 MiB.
    pub max_image_bytes: usize,
    /// Maximum number of collected errors reported at once. Default: 64.
    pub max_errors: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 64 * 1024 * 1024,
            max_tokens: 4_000_000,
            max_statements: 4_000_000,
            max_labels: 100_000,
            max_image_bytes: 4 * 1024 * 1024,
            max_errors: 64,
        }
    }
}

/// Builder-pattern assembler.
///
/// # Examples
///
/// ```rust
/// use y86_asm::Assembler;
///
/// let mut asm = Assembler::new();
/// asm.emit("irmovq $10, %rax").unwrap();
/// asm.emit_tokens(["rrmovq", "rax", "rbx", "halt"]);
/// let result = asm.finish().unwrap();
/// assert_eq!(result.words(), ["30f00a00000000000000", "2003", "00"]);
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    tokens: Vec<Token<'static>>,
    limits: ResourceLimits,
    policy: LabelPolicy,
}

impl Assembler {
    /// Create an assembler with default limits and the strict label policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set resource limits.
    pub fn limits(&mut self, limits: ResourceLimits) -> &mut Self {
        self.limits = limits;
        self
    }

    /// Choose how undefined labels are handled.
    ///
    /// # Examples
    ///
    /// ```
    /// use y86_asm::{Assembler, LabelPolicy};
    ///
    /// let mut asm = Assembler::new();
    /// asm.label_policy(LabelPolicy::BestEffort);
    /// asm.emit("call nowhere")?;
    /// let result = asm.finish()?;
    /// assert_eq!(result.words(), ["800000000000000000"]);
    /// assert_eq!(result.diagnostics().len(), 1);
    /// # Ok::<(), y86_asm::AsmError>(())
    /// ```
    pub fn label_policy(&mut self, policy: LabelPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Tokenize and append assembly source text. Can be called multiple times.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::Syntax`] for malformed text and
    /// [`AsmError::ResourceLimitExceeded`] for oversized input.
    pub fn emit(&mut self, source: &str) -> Result<&mut Self, AsmError> {
        if source.len() > self.limits.max_source_bytes {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("source bytes"),
                limit: self.limits.max_source_bytes,
            });
        }
        let tokens = lexer::tokenize(source)?;
        self.check_token_limit(tokens.len())?;
        self.tokens.extend(tokens.into_iter().map(Token::into_owned));
        Ok(self)
    }

    /// Append pre-split tokens, bypassing the lexer.
    ///
    /// Spans of these tokens record their index in the overall token stream.
    pub fn emit_tokens<I, S>(&mut self, words: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words.into_iter().map(|w| String::from(w.as_ref()));
        let tokens = lexer::from_words(words, self.tokens.len());
        self.tokens.extend(tokens);
        self
    }

    /// Number of tokens queued so far.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Drop queued tokens, keeping configuration.
    pub fn reset(&mut self) -> &mut Self {
        self.tokens.clear();
        self
    }

    fn check_token_limit(&self, additional: usize) -> Result<(), AsmError> {
        if self.tokens.len() + additional > self.limits.max_tokens {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("tokens"),
                limit: self.limits.max_tokens,
            });
        }
        Ok(())
    }

    /// Run the pipeline: normalize, lay out, encode.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`AsmError`] of any stage. No partial output
    /// is produced on error.
    pub fn finish(self) -> Result<AssemblyResult, AsmError> {
        self.check_token_limit(0)?;
        let program = normalizer::normalize(&self.tokens)?;
        let layout = layout::resolve(&program, &self.limits)?;
        let encoded = encoder::encode(
            &layout.statements,
            &layout.labels,
            self.policy,
            self.limits.max_errors.max(1),
        )?;
        Ok(AssemblyResult {
            statements: layout.statements,
            labels: layout.labels,
            words: encoded.words,
            diagnostics: encoded.diagnostics,
        })
    }
}
