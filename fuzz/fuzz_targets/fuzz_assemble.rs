#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = y86_asm::assemble(data);

    // Pre-split path sees the same words without spans from the lexer.
    let words: Vec<&str> = data.split_whitespace().collect();
    let _ = y86_asm::assemble_tokens(&words);

    let mut asm = y86_asm::Assembler::new();
    asm.label_policy(y86_asm::LabelPolicy::BestEffort)
        .limits(y86_asm::ResourceLimits {
            max_image_bytes: 1 << 16,
            ..y86_asm::ResourceLimits::default()
        });
    for line in data.lines() {
        if asm.emit(line).is_err() {
            return;
        }
    }
    if let Ok(result) = asm.finish() {
        assert_eq!(result.lines().concat(), result.words().concat());
        let _ = result.listing();
    }
});
