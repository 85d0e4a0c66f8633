//! File-based round trip exercising the same read-source/write-output path
//! `main::run` drives, using a real temp directory the way the teacher's
//! `compiler::resolver` tests do (`tempfile::tempdir`) rather than mocking
//! the filesystem.

use std::fs;

use sysyc::compile_to_riscv;

#[test]
fn compiles_a_source_file_on_disk_to_an_assembly_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.sysy");
    let output = dir.path().join("main.s");

    fs::write(&input, "int main() { return 1 + 2 * 3; }\n").unwrap();

    let src = fs::read_to_string(&input).unwrap();
    let asm = compile_to_riscv(&src).unwrap();
    fs::write(&output, &asm).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains(".globl main"));
    assert!(written.contains("li a0, 7"));
}
