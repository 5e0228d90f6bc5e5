//! End-to-end compilation scenarios, driving [`ilcart::compile`] from a
//! hand-assembled container rather than a real assembled binary (this crate
//! has no IL assembler of its own to produce one from source).

mod common;

use common::{build_assembly, Method};
use ilcart::codegen::CODE_START;
use ilcart::config::CompileConfig;
use ilcart::error::{CodegenError, CompileError, EmitError};

#[test]
fn empty_module_produces_a_32kib_image_with_the_boot_jump_chain() {
    let bytes = build_assembly(&[]);
    let config = CompileConfig::default();
    let image = ilcart::compile(&bytes, &config).unwrap();

    assert_eq!(image.len(), 32768);
    assert_eq!(&image[0x0100..=0x0103], &[0x00, 0xC3, 0x50, 0x01]);
    assert_eq!(&image[CODE_START as usize..CODE_START as usize + 4], &[0x31, 0xFE, 0xFF, 0xF3]);
}

#[test]
fn default_title_is_encoded_into_the_header() {
    let bytes = build_assembly(&[]);
    let config = CompileConfig::default();
    let image = ilcart::compile(&bytes, &config).unwrap();

    assert_eq!(&image[0x0134..=0x013E], b"HELLO WORLD");
    assert_eq!(&image[0x013F..=0x0142], &[0, 0, 0, 0]);
}

#[test]
fn title_is_truncated_uppercased_and_non_ascii_is_dropped() {
    let bytes = build_assembly(&[]);
    let config = CompileConfig {
        title: "a café with a very long name".to_string(),
        ..Default::default()
    };
    let image = ilcart::compile(&bytes, &config).unwrap();

    // "a café with a very long name" -> ASCII-only, uppercased, truncated to
    // 15 bytes: "A CAF WITH A VE" (the non-ASCII 'é' is dropped, not replaced).
    assert_eq!(&image[0x0134..=0x0142], b"A CAF WITH A VE");
    assert_eq!(image[0x0143], 0x00); // CGB flag, independent of the title field
}

#[test]
fn main_returning_a_constant_lowers_to_push_then_return() {
    let bytes = build_assembly(&[Method {
        name: "Main",
        il: vec![0x19, 0x2A], // ldc.i4.3; ret
    }]);
    let config = CompileConfig::default();
    let image = ilcart::compile(&bytes, &config).unwrap();

    let code_start = CODE_START as usize;
    // stub (4) + ld bc,3 (3) + push bc (1) + ret (1), then the entry jump (3)
    assert_eq!(&image[code_start + 4..code_start + 9], &[0x01, 0x03, 0x00, 0xC5, 0xC9]);
    assert_eq!(&image[code_start + 9..code_start + 12], &[0xC3, 0x54, 0x01]);
}

#[test]
fn main_adding_two_constants_lowers_to_two_pushes_then_add() {
    let bytes = build_assembly(&[Method {
        name: "Main",
        il: vec![0x17, 0x18, 0x58, 0x2A], // ldc.i4.1; ldc.i4.2; add; ret
    }]);
    let config = CompileConfig::default();
    let image = ilcart::compile(&bytes, &config).unwrap();

    let code_start = CODE_START as usize;
    assert_eq!(
        &image[code_start + 4..code_start + 16],
        &[
            0x01, 0x01, 0x00, 0xC5, // ld bc,1 ; push bc
            0x01, 0x02, 0x00, 0xC5, // ld bc,2 ; push bc
            0xD1, 0xE1, 0x19, 0xE5, // pop de  ; pop hl ; add hl,de ; push hl
        ]
    );
    assert_eq!(image[code_start + 16], 0xC9); // ret
}

#[test]
fn an_out_of_range_short_branch_is_rejected_before_a_cartridge_is_assembled() {
    // `ldc.i4.3` (1 IL byte) lowers to 4 machine bytes, so a forward branch
    // whose IL displacement stays within `i8` range can still land the
    // machine-code target well outside `JR`'s +-127 reach.
    let mut il = vec![0x2D, 100]; // brtrue.s +100
    il.extend(std::iter::repeat(0x19).take(120)); // ldc.i4.3, 120 times

    let bytes = build_assembly(&[Method { name: "Main", il }]);
    let config = CompileConfig::default();

    let err = ilcart::compile(&bytes, &config).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Codegen(CodegenError::Emit(EmitError::RelocationOutOfRange { .. }))
    ));
}
