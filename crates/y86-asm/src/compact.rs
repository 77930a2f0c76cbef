//! Output compaction.
//!
//! Long `.pos`/`.align` gaps produce one `nop` word per padding byte. This pass
//! folds runs of the `nop` word into lines of [`GROUP_SIZE`] words so the image
//! text stays short. Concatenating the output lines yields exactly the
//! concatenation of the input words.

use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

/// Hex encoding of the one-byte `nop` instruction.
pub const NOP_WORD: &str = "10";

/// Number of `nop` words per grouped line.
pub const GROUP_SIZE: usize = 16;

/// Collapse consecutive `nop` words into grouped lines.
///
/// Every other word is copied to its own line and ends the current run.
pub fn compact<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut lines = Vec::with_capacity(words.len());
    let mut run = 0usize;

    for word in words {
        let word = word.as_ref();
        if word == NOP_WORD {
            run += 1;
            continue;
        }
        flush_run(&mut lines, run);
        run = 0;
        lines.push(String::from(word));
    }
    flush_run(&mut lines, run);

    lines
}

fn flush_run(lines: &mut Vec<String>, run: usize) {
    if run == 0 {
        return;
    }
    let full = NOP_WORD.repeat(GROUP_SIZE);
    for _ in 0..run / GROUP_SIZE {
        lines.push(full.clone());
    }
    let rest = run % GROUP_SIZE;
    if rest > 0 {
        lines.push(NOP_WORD.repeat(rest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn nops(n: usize) -> Vec<String> {
        (0..n).map(|_| NOP_WORD.to_string()).collect()
    }

    #[test]
    fn empty_input() {
        let words: [&str; 0] = [];
        assert!(compact(&words).is_empty());
    }

    #[test]
    fn twenty_nops_make_full_and_partial_group() {
        let lines = compact(&nops(20));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "10".repeat(16));
        assert_eq!(lines[1], "10".repeat(4));
    }

    #[test]
    fn exact_multiple_has_no_remainder_line() {
        let lines = compact(&nops(32));
        assert_eq!(lines, vec!["10".repeat(16), "10".repeat(16)]);
    }

    #[test]
    fn no_nops_passes_through() {
        let words = ["00", "2001", "90"];
        assert_eq!(compact(&words), vec!["00", "2001", "90"]);
    }

    #[test]
    fn other_words_interrupt_runs() {
        let words = ["10", "10", "00", "10", "6001", "10", "10", "10"];
        assert_eq!(
            compact(&words),
            vec!["1010", "00", "10", "6001", "101010"]
        );
    }

    #[test]
    fn payload_is_preserved() {
        let mut words = nops(37);
        words.insert(5, "30f40a00000000000000".to_string());
        words.push("00".to_string());
        assert_eq!(compact(&words).concat(), words.concat());
    }
}
