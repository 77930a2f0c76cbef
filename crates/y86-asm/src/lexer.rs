//! Lexer for assembly source text.
//!
//! The lexer turns source text into the flat token stream the rest of the
//! pipeline consumes: `#` comments are dropped, the punctuation of the concrete
//! syntax (`,` `(` `)` `$` `%`) acts as a separator, and every remaining word
//! becomes a [`Token`] carrying its [`Span`](crate::error::Span).

use alloc::borrow::Cow;
#[allow(unused_imports)]
use alloc::format;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};

/// A token: one whitespace/punctuation-delimited word of source text.
///
/// Token text is borrowed from the source string in the common case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// Source text of the token.
    pub text: Cow<'src, str>,
    /// Source location.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Create a token.
    pub fn new(text: impl Into<Cow<'src, str>>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    /// Returns the token text as a `&str`.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Label name if this token defines a label (`name:`).
    #[inline]
    pub fn label_def(&self) -> Option<&str> {
        self.text
            .strip_suffix(':')
            .filter(|name| !name.is_empty())
    }

    /// Detach the token from the source buffer.
    pub fn into_owned(self) -> Token<'static> {
        Token {
            text: Cow::Owned(self.text.into_owned()),
            span: self.span,
        }
    }
}

/// Build tokens from pre-split words, numbering spans by stream position
/// starting at `first`.
pub fn from_words<'s, I, S>(words: I, first: usize) -> Vec<Token<'s>>
where
    I: IntoIterator<Item = S>,
    S: Into<Cow<'s, str>>,
{
    words
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let text: Cow<'s, str> = w.into();
            let len = text.len();
            Token::new(text, Span::token(first + i, len))
        })
        .collect()
}

#[inline]
fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | '(' | ')' | '$' | '%')
}

/// Tokenize assembly source text into a vector of tokens.
///
/// # Errors
///
/// Returns `Err(AsmError::Syntax)` if the input contains a control character
/// other than tab, carriage return, or newline.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, AsmError> {
    let mut tokens = Vec::with_capacity(source.len() / 4 + 1);
    let mut line: u32 = 1;
    let mut line_start = 0usize;
    let mut start: Option<usize> = None;
    let mut in_comment = false;

    for (pos, ch) in source.char_indices() {
        if ch == '\n' {
            if let Some(s) = start.take() {
                tokens.push(make_token(source, s, pos, line, line_start));
            }
            in_comment = false;
            line += 1;
            line_start = pos + 1;
            continue;
        }
        if in_comment {
            continue;
        }
        if ch.is_control() && ch != '\t' && ch != '\r' {
            return Err(AsmError::Syntax {
                msg: format!("unexpected control character {:?}", ch),
                span: Span::new(line, (pos - line_start) as u32 + 1, pos, ch.len_utf8()),
            });
        }
        if ch == '#' {
            if let Some(s) = start.take() {
                tokens.push(make_token(source, s, pos, line, line_start));
            }
            in_comment = true;
            continue;
        }
        if is_separator(ch) {
            if let Some(s) = start.take() {
                tokens.push(make_token(source, s, pos, line, line_start));
            }
        } else if start.is_none() {
            start = Some(pos);
        }
    }
    if let Some(s) = start {
        tokens.push(make_token(source, s, source.len(), line, line_start));
    }

    Ok(tokens)
}

#[inline]
fn make_token(source: &str, from: usize, to: usize, line: u32, line_start: usize) -> Token<'_> {
    Token {
        text: Cow::Borrowed(&source[from..to]),
        span: Span::new(line, (from - line_start) as u32 + 1, from, to - from),
    }
}

/// Parse a numeral: optional sign, then decimal digits or `0x` + hex digits.
///
/// Returns `None` when `text` is not a numeral (it is then a label name).
/// Values beyond the `i128` range saturate; the 64-bit range checks
/// downstream reject them either way.
pub fn parse_numeral(text: &str) -> Option<i128> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, body),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: i128 = 0;
    for ch in digits.chars() {
        let digit = ch.to_digit(radix)? as i128;
        value = value.saturating_mul(radix as i128).saturating_add(digit);
    }
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn texts(src: &str) -> Vec<String> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.text.into_owned())
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn only_whitespace_and_comment() {
        assert!(tokenize("   \t\n  # nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(
            texts("irmovq $10, %rax"),
            vec!["irmovq", "10", "rax"]
        );
        assert_eq!(
            texts("rmmovq %rcx, -8(%rbp)"),
            vec!["rmmovq", "rcx", "-8", "rbp"]
        );
        assert_eq!(texts("mrmovq (%rdi), %r10"), vec!["mrmovq", "rdi", "r10"]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            texts("addq %rax, %rbx # sum\nhalt#stop"),
            vec!["addq", "rax", "rbx", "halt"]
        );
    }

    #[test]
    fn labels_and_directives_survive() {
        assert_eq!(
            texts("main: .pos 0x100\nstack:"),
            vec!["main:", ".pos", "0x100", "stack:"]
        );
    }

    #[test]
    fn span_tracking() {
        let tokens = tokenize("nop\n  jmp loop").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 0, 3));
        assert_eq!(tokens[1].span, Span::new(2, 3, 6, 3));
        assert_eq!(tokens[2].span, Span::new(2, 7, 10, 4));
    }

    #[test]
    fn crlf_line_endings() {
        let tokens = tokenize("nop\r\nhalt\r\n").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text(), "halt");
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn control_character_error() {
        let err = tokenize("nop\u{0}").unwrap_err();
        assert!(matches!(err, AsmError::Syntax { span, .. } if span.col == 4));
    }

    #[test]
    fn label_def_detection() {
        let t = Token::new("loop:", Span::dummy());
        assert_eq!(t.label_def(), Some("loop"));
        assert_eq!(Token::new(":", Span::dummy()).label_def(), None);
        assert_eq!(Token::new("loop", Span::dummy()).label_def(), None);
    }

    #[test]
    fn from_words_numbers_spans() {
        let tokens = from_words(["halt", "nop"], 0);
        assert_eq!(tokens[1].span, Span::token(1, 3));
        let tokens = from_words(["ret"], 5);
        assert_eq!(tokens[0].span, Span::token(5, 3));
    }

    #[test]
    fn numerals() {
        assert_eq!(parse_numeral("0"), Some(0));
        assert_eq!(parse_numeral("42"), Some(42));
        assert_eq!(parse_numeral("-1"), Some(-1));
        assert_eq!(parse_numeral("+7"), Some(7));
        assert_eq!(parse_numeral("0x1F"), Some(31));
        assert_eq!(parse_numeral("0XfF"), Some(255));
        assert_eq!(parse_numeral("-0x10"), Some(-16));
    }

    #[test]
    fn non_numerals() {
        assert_eq!(parse_numeral(""), None);
        assert_eq!(parse_numeral("-"), None);
        assert_eq!(parse_numeral("0x"), None);
        assert_eq!(parse_numeral("beef"), None);
        assert_eq!(parse_numeral("loop"), None);
        assert_eq!(parse_numeral("12ab"), None);
    }

    #[test]
    fn numeral_saturates() {
        let huge = "9".repeat(60);
        assert_eq!(parse_numeral(&huge), Some(i128::MAX));
    }
}
