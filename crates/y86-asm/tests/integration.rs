//! Integration tests for y86_asm.
//!
//! These tests exercise the public API end-to-end, verifying that assembly
//! source text is correctly translated into the expected hex image.

use y86_asm::{assemble, assemble_tokens, AsmError, Assembler, LabelPolicy, Mnemonic, Shape};

const SUM_PROGRAM: &str = "\
# Execution begins at address 0
    .pos 0
    irmovq stack, %rsp      # Set up stack pointer
    call main               # Execute main program
    halt                    # Terminate program

# Array of 4 elements
    .align 8
array:
    .quad 0x000d000d000d
    .quad 0x00c000c000c0
    .quad 0x0b000b000b00
    .quad 0xa000a000a000

main:
    irmovq array,%rdi
    irmovq $4,%rsi
    call sum                # sum(array, 4)
    ret

# long sum(long *start, long count)
sum:
    irmovq $8,%r8
    irmovq $1,%r9
    xorq %rax,%rax
    andq %rsi,%rsi
    jmp test
loop:
    mrmovq (%rdi),%r10
    addq %r10,%rax
    addq %r8,%rdi
    subq %r9,%rsi
test:
    jne loop
    ret

# Stack starts here and grows to lower addresses
    .pos 0x200
stack:
";

fn words(src: &str) -> Vec<String> {
    let mut asm = Assembler::new();
    asm.emit(src).unwrap();
    asm.finish().unwrap().words().to_vec()
}

// ============================================================================
// One-Shot API
// ============================================================================

#[test]
fn one_shot_halt() {
    assert_eq!(assemble("halt").unwrap(), vec!["00"]);
}

#[test]
fn one_shot_empty() {
    assert!(assemble("").unwrap().is_empty());
    assert!(assemble("# only a comment\n\n").unwrap().is_empty());
}

#[test]
fn end_to_end_move_sequence() {
    let lines = assemble("irmovq $10, %rax\nrrmovq %rax, %rbx\nhalt").unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(&lines[0][..2], "30");
    assert_eq!(&lines[1][..2], "20");
    assert_eq!(lines[2], "00");

    let field = &lines[0][4..];
    let mut bytes = [0u8; 8];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = u8::from_str_radix(&field[2 * i..2 * i + 2], 16).unwrap();
    }
    assert_eq!(i64::from_le_bytes(bytes), 10);
}

#[test]
fn tokens_api_matches_text_api() {
    let from_text = assemble("irmovq $10, %rax\nrrmovq %rax, %rbx\nhalt").unwrap();
    let from_tokens =
        assemble_tokens(&["irmovq", "10", "rax", "rrmovq", "rax", "rbx", "halt"]).unwrap();
    assert_eq!(from_text, from_tokens);
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn every_fieldless_mnemonic_is_one_byte() {
    for m in Mnemonic::ALL {
        if m.descriptor().shape != Shape::None {
            continue;
        }
        let lines = assemble(m.name()).unwrap();
        assert_eq!(lines.len(), 1);
        let opcode = u8::from_str_radix(&lines[0], 16).unwrap();
        assert_eq!(Some(opcode), m.descriptor().opcode, "{}", m);
    }
}

#[test]
fn negative_one_is_all_ones() {
    assert_eq!(
        assemble("irmovq $-1, %rax").unwrap(),
        vec!["30f0ffffffffffffffff"]
    );
    assert_eq!(assemble(".quad -1").unwrap(), vec!["ffffffffffffffff"]);
}

#[test]
fn memory_moves_with_displacement() {
    assert_eq!(
        words("rmmovq %rcx, 8(%rdx)\nmrmovq -8(%rbp), %rax"),
        vec!["40120800000000000000", "5050f8ffffffffffffff"]
    );
}

#[test]
fn memory_moves_without_displacement() {
    assert_eq!(
        words("rmmovq %rsp, (%rbx)\nmrmovq (%rdi), %r10"),
        vec!["40430000000000000000", "507a0000000000000000"]
    );
}

#[test]
fn push_pop_pad_with_sentinel() {
    assert_eq!(words("pushq %rbp\npopq %r14"), vec!["a05f", "b0ef"]);
}

#[test]
fn conditional_moves_and_alu() {
    assert_eq!(
        words("cmovle %rax, %rcx\ncmovg %r8, %r9\nsubq %rsi, %rdi\nxorq %rax, %rax"),
        vec!["2101", "2689", "6167", "6300"]
    );
}

#[test]
fn jumps_encode_absolute_targets() {
    let w = words("start: nop\njle start\njg 0x1234\ncall start");
    assert_eq!(w[1], "710000000000000000");
    assert_eq!(w[2], "763412000000000000");
    assert_eq!(w[3], "800000000000000000");
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn sum_program_layout() {
    let mut asm = Assembler::new();
    asm.emit(SUM_PROGRAM).unwrap();
    let result = asm.finish().unwrap();

    assert_eq!(result.label_address("array"), Some(0x18));
    assert_eq!(result.label_address("main"), Some(0x38));
    assert_eq!(result.label_address("sum"), Some(0x56));
    assert_eq!(result.label_address("loop"), Some(0x77));
    assert_eq!(result.label_address("test"), Some(0x87));
    assert_eq!(result.label_address("stack"), Some(0x200));
    assert_eq!(result.image_len(), 0x200);

    let stmts = result.statements();
    for pair in stmts.windows(2) {
        assert_eq!(pair[0].end_address(), pair[1].start_address);
    }
}

#[test]
fn sum_program_image() {
    let lines = assemble(SUM_PROGRAM).unwrap();
    assert_eq!(lines[0], "30f40002000000000000");
    assert_eq!(lines[1], "803800000000000000");
    assert_eq!(lines[2], "00");
    assert_eq!(lines[3], "10101010");
    assert_eq!(lines[4], "0d000d000d000000");
    assert_eq!(lines[7], "00a000a000a00000");
    assert_eq!(lines[8], "30f71800000000000000");
    assert_eq!(lines[10], "805600000000000000");
    assert_eq!(lines[16], "708700000000000000");
    assert_eq!(lines[17], "507a0000000000000000");
    assert_eq!(lines[21], "747700000000000000");
    assert_eq!(lines[22], "90");

    // 0x91..0x200 is 367 fillers: 22 full groups and one of 15.
    let padding = &lines[23..];
    assert_eq!(padding.len(), 23);
    assert!(padding[..22].iter().all(|l| *l == "10".repeat(16)));
    assert_eq!(padding[22], "10".repeat(15));
}

#[test]
fn labels_resolve_forward_and_backward() {
    let w = words("jmp fwd\nback: nop\nfwd: jmp back");
    assert_eq!(w[0], "700a00000000000000");
    assert_eq!(w[2], "700900000000000000");
}

#[test]
fn label_equals_next_statement_start() {
    let mut asm = Assembler::new();
    asm.emit("irmovq $1, %rax\nfirst: second: addq %rax, %rax").unwrap();
    let result = asm.finish().unwrap();
    assert_eq!(result.label_address("first"), Some(10));
    assert_eq!(result.label_address("second"), Some(10));
}

#[test]
fn align_from_three_reaches_eight() {
    let mut asm = Assembler::new();
    asm.emit("nop\nnop\nnop\n.align 8\nend:").unwrap();
    let result = asm.finish().unwrap();
    assert_eq!(result.words().len(), 8);
    assert_eq!(result.label_address("end"), Some(8));
    assert_eq!(result.lines(), vec!["10".repeat(8)]);
}

#[test]
fn directives_accept_missing_dot() {
    assert_eq!(assemble("pos 2\nquad 1").unwrap(), assemble(".pos 2\n.quad 1").unwrap());
}

// ============================================================================
// Compaction
// ============================================================================

#[test]
fn twenty_nops_compact_to_two_lines() {
    let src = "nop\n".repeat(20);
    let lines = assemble(&src).unwrap();
    assert_eq!(lines, vec!["10".repeat(16), "10".repeat(4)]);
}

#[test]
fn compaction_preserves_payload() {
    let mut asm = Assembler::new();
    asm.emit(SUM_PROGRAM).unwrap();
    let result = asm.finish().unwrap();
    assert_eq!(result.lines().concat(), result.words().concat());
    assert_eq!(result.words().concat().len() as u64, 2 * result.image_len());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn error_undefined_label_is_fatal_by_default() {
    let err = assemble("jmp nowhere").unwrap_err();
    assert!(matches!(err, AsmError::UndefinedLabel { ref label, .. } if label == "nowhere"));
    assert_eq!(err.to_string(), "1:1: undefined label 'nowhere'");
}

#[test]
fn error_multiple_undefined_labels_are_collected() {
    let err = assemble("jmp a\ncall b\nirmovq c, %rax").unwrap_err();
    match err {
        AsmError::Multiple { errors } => assert_eq!(errors.len(), 3),
        other => panic!("expected Multiple, got {:?}", other),
    }
}

#[test]
fn best_effort_reports_and_continues() {
    let mut asm = Assembler::new();
    asm.label_policy(LabelPolicy::BestEffort);
    asm.emit("irmovq missing, %rax\nhalt").unwrap();
    let result = asm.finish().unwrap();
    assert_eq!(result.words(), ["30f00000000000000000", "00"]);
    assert_eq!(result.diagnostics().len(), 1);
}

#[test]
fn error_backward_pos() {
    let err = assemble(".pos 0x20\nhalt\n.pos 0x10").unwrap_err();
    assert_eq!(
        err.to_string(),
        "3:1: .pos 0x10 is behind the current address 0x21"
    );
}

#[test]
fn error_duplicate_label() {
    let err = assemble("dup: nop\ndup: halt").unwrap_err();
    assert!(matches!(err, AsmError::DuplicateLabel { ref label, .. } if label == "dup"));
}

#[test]
fn error_unknown_mnemonic_and_register() {
    assert!(matches!(
        assemble("mov %rax, %rbx").unwrap_err(),
        AsmError::UnknownMnemonic { .. }
    ));
    assert!(matches!(
        assemble("addq %rax, %eax").unwrap_err(),
        AsmError::UnknownRegister { ref name, .. } if name == "eax"
    ));
}

#[test]
fn error_immediate_overflow() {
    let err = assemble("irmovq $0x10000000000000000, %rax").unwrap_err();
    assert!(matches!(err, AsmError::ImmediateOverflow { .. }));
}

#[test]
fn error_malformed_directive() {
    let err = assemble(".align eight").unwrap_err();
    assert!(matches!(
        err,
        AsmError::MalformedDirectiveArgument { ref text, .. } if text == "eight"
    ));
}

#[test]
fn error_missing_operand_at_end() {
    let err = assemble("halt\njmp").unwrap_err();
    assert!(matches!(err, AsmError::MissingOperand { ref mnemonic, .. } if mnemonic == "jmp"));
}

#[test]
fn token_api_errors_name_token_index() {
    let err = assemble_tokens(&["nop", "nop", "frob"]).unwrap_err();
    assert_eq!(err.to_string(), "token 2: unknown mnemonic 'frob'");
}
