//! End-to-end execution tests.

use std::{
    cell::RefCell,
    io::{self, Cursor, Write},
    rc::Rc,
};

use chip64_core::{
    devices::ConsoleIO,
    emulator::{Emulator, EmulatorContext, TerminalStatus},
    program::Program,
};

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run a program with the console wired to the given stdin contents.
fn run_with_console(bytes: &[u8], stdin: &str) -> (Emulator, TerminalStatus, SharedBuffer) {
    let program = Program::load_from_bytes("test", bytes).unwrap();
    let buffer = SharedBuffer::default();
    let console = ConsoleIO::with_streams(
        Box::new(Cursor::new(stdin.to_string())),
        Box::new(buffer.clone()),
    );

    let mut emulator = Emulator::new();
    emulator.cpu.bus.attach(0, Box::new(console)).unwrap();
    emulator.load_program(&program);

    let mut ctx = EmulatorContext::new();
    let status = emulator.run(&mut ctx);

    (emulator, status, buffer)
}

fn run(bytes: &[u8]) -> (Emulator, TerminalStatus) {
    let (emulator, status, _) = run_with_console(bytes, "");
    (emulator, status)
}

#[test]
fn test_console_echo() {
    // Read two bytes from the console into memory, write them back.
    let (emulator, status, output) = run_with_console(&[0xF0, 0x02, 0xD0, 0x02], "42\n");

    assert_eq!(output.contents(), "42");
    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.memory.read_word_at_address(0), 42);
}

#[test]
fn test_console_hex_roundtrip() {
    // Switch the console to hexadecimal before reading and writing.
    // ACR RF, 01 ; DPS D0 ; READ D0, 02 ; WRITE D0, 02
    let program = [0x6F, 0x01, 0xE0, 0x00, 0xF0, 0x02, 0xD0, 0x02];
    let (_, status, output) = run_with_console(&program, "BEEF\n");

    assert_eq!(output.contents(), "BEEF");
    assert_eq!(status, TerminalStatus::HaltedCleanly);
}

#[test]
fn test_arithmetic_with_carry() {
    // ACR R0, FF ; ACR R1, FF ; SHL R0, 8 ; ADD R0, R1 ; ADD R0, R1
    // R0 = 0xFF00 + 0xFF + 0xFF overflows on the second ADD.
    let program = [0x60, 0xFF, 0x61, 0xFF, 0x80, 0x8E, 0x80, 0x14, 0x80, 0x14, 0x00, 0x00];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.registers.get_register(0), 0x00FE);
    assert_eq!(emulator.cpu.registers.get_flag_register(), 1);
}

#[test]
fn test_subroutine_roundtrip() {
    // 0x000: CALL 008 ; WRITE D0, 02 ; HALT
    // 0x008: ACR R0, 07 ; SPL R0 ; RET
    let program = [
        0x20, 0x08, 0xD0, 0x02, 0x00, 0x00, 0x00, 0x00, // main
        0x60, 0x07, 0xE0, 0x55, 0x01, 0xEE, // subroutine
    ];
    let (emulator, status, output) = run_with_console(&program, "");

    assert_eq!(output.contents(), "7");
    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert!(emulator.cpu.stack.empty());
}

#[test]
fn test_conditional_skip() {
    // ACR R0, 05 ; SNEC R0, 05 ; ACR R0, 09 (skipped) ; SPL R0 ;
    // WRITE D0, 02 ; HALT
    let program = [
        0x60, 0x05, 0x30, 0x05, 0x60, 0x09, 0xE0, 0x55, 0xD0, 0x02, 0x00, 0x00,
    ];
    let (emulator, status, output) = run_with_console(&program, "");

    assert_eq!(emulator.cpu.registers.get_register(0), 5);
    assert_eq!(output.contents(), "5");
    assert_eq!(status, TerminalStatus::HaltedCleanly);
}

#[test]
fn test_computed_jump() {
    // ACR R0, 02 ; CPAC 004: PC = 2 + 4 = 6, lands on AR R0, R0 ; HALT.
    let program = [0x60, 0x02, 0xB0, 0x04, 0x23, 0x65, 0x80, 0x00, 0x00, 0x00];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert!(!emulator.cpu.alert);
    assert_eq!(emulator.cpu.registers.get_register(0), 2);
    assert_eq!(emulator.cpu.pc, 8);
}

#[test]
fn test_shift_capture() {
    // ACR R5, AB ; SHR R5, 3: bit 3 of 0xAB is 1.
    let program = [0x65, 0xAB, 0x85, 0x36, 0x00, 0x00];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.registers.get_register(5), 0x15);
    assert_eq!(emulator.cpu.registers.get_flag_register(), 1);
}

#[test]
fn test_subroutine_at_start_convention() {
    // 0x000: GOTO 006 jumps over the subroutine at 0x002.
    // 0x006: CALL 002 ; HALT.
    let program = [
        0x10, 0x06, // GOTO 006
        0x60, 0x2A, // ACR R0, 2A
        0x01, 0xEE, // RET
        0x20, 0x02, // CALL 002
        0x00, 0x00, // HALT
    ];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.registers.get_register(0), 0x2A);
}

#[test]
fn test_console_parse_failure_alerts() {
    // READ D0, 02 with garbage on stdin: the read is dropped, the machine
    // keeps running and halts with the alert flag raised.
    let program = [0xF0, 0x02, 0x00, 0x00];
    let (emulator, status, output) = run_with_console(&program, "garbage\n");

    assert_eq!(status, TerminalStatus::HaltedWithAlert);
    assert!(emulator.cpu.alert);
    assert_eq!(output.contents(), "");
    assert_eq!(emulator.cpu.memory.read_word_at_address(0), 0xF002);
}

#[test]
fn test_memory_pointer_protocol() {
    // SMP 200 ; ACR R0, 2A ; SPL R0 ; MPAR R0: MP = 0x200 + 0x2A ; RMP R1.
    let program = [
        0xA2, 0x00, 0x60, 0x2A, 0xE0, 0x55, 0xE0, 0x1E, 0xE1, 0x1D, 0x00, 0x00,
    ];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.memory.read_word_at_address(0x200), 0x2A);
    assert_eq!(emulator.cpu.memory.get_pointer(), 0x22A);
    assert_eq!(emulator.cpu.registers.get_register(1), 0x22A);
}

#[test]
fn test_spl_ld_roundtrip_single_register() {
    // SMP 200 ; ACR R0, 2A ; SPL R0 ; ACR R0, 00 ; LD R0 ; HALT.
    let program = [
        0xA2, 0x00, 0x60, 0x2A, 0xE0, 0x55, 0x60, 0x00, 0xE0, 0x65, 0x00, 0x00,
    ];
    let (emulator, status) = run(&program);

    assert_eq!(status, TerminalStatus::HaltedCleanly);
    assert_eq!(emulator.cpu.registers.get_register(0), 0x2A);
}

#[test]
fn test_infinite_loop_detection_is_not_done() {
    // A GOTO to itself never terminates; bound the check by stepping.
    let program = Program::load_from_bytes("loop", &[0x10, 0x00]).unwrap();
    let mut emulator = Emulator::new();
    emulator.load_program(&program);

    let mut ctx = EmulatorContext::new();
    for _ in 0..100 {
        emulator.step(&mut ctx);
    }

    assert_eq!(emulator.cpu.pc, 0);
    assert_eq!(emulator.cpu.instruction_count, 100);
}
