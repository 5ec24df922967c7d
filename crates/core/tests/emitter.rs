use std::cell::Cell;
use std::fmt;

use objtool_core::diag::{DiagOptions, Emitter, Severity};
use objtool_core::elf::ObjectFile;
use objtool_core::model::{
    Instruction, ObjectLookup, Section, SectionId, Symbol, SymbolId, SymbolLookup,
};
use objtool_core::{bt_insn, objwarn, warn_elf, warn_func, warn_insn};

fn fixture() -> (ObjectFile, SectionId) {
    let mut obj = ObjectFile::new("vmlinux.o");
    obj.add_section("", 0, 0);
    let text = obj.add_section(".text", 0x6, 0x200);
    obj.add_symbol(Symbol::func("foo", text, 0x100, 0x40));
    (obj, text)
}

fn capture(opts: DiagOptions) -> Emitter<Vec<u8>> {
    Emitter::new(Vec::new(), "vmlinux.o", opts)
}

fn output(emitter: Emitter<Vec<u8>>) -> String {
    String::from_utf8(emitter.into_inner()).expect("utf8 output")
}

#[test]
fn plain_warning_line_format() {
    let mut em = capture(DiagOptions::default());
    objwarn!(em, "unsupported stack pointer realignment {}", 7);
    assert_eq!(em.emitted(), 1);
    assert_eq!(
        output(em),
        "vmlinux.o: warning: objtool: unsupported stack pointer realignment 7\n"
    );
}

#[test]
fn werror_switches_severity_only() {
    let mut warn = capture(DiagOptions::default());
    let mut err = capture(DiagOptions { werror: true, ..Default::default() });
    objwarn!(warn, "same message");
    objwarn!(err, "same message");
    assert_eq!(warn.severity(), Severity::Warning);
    assert_eq!(err.severity(), Severity::Error);
    assert_eq!(output(warn), "vmlinux.o: warning: objtool: same message\n");
    assert_eq!(output(err), "vmlinux.o: error: objtool: same message\n");
}

#[test]
fn located_warning_prefixes_location() {
    let (obj, text) = fixture();
    let sec = obj.section(text).unwrap();
    let mut em = capture(DiagOptions::default());
    warn_func!(em, &obj, sec, 0x110, "call without frame pointer save/setup");
    warn_func!(em, &obj, sec, 0x10, "unreachable instruction");
    assert_eq!(
        output(em),
        "vmlinux.o: warning: objtool: foo+0x10: call without frame pointer save/setup\n\
         vmlinux.o: warning: objtool: .text+0x10: unreachable instruction\n"
    );
}

#[test]
fn located_warning_honours_sec_address() {
    let (obj, text) = fixture();
    let sec = obj.section(text).unwrap();
    let mut em = capture(DiagOptions { sec_address: true, werror: true, ..Default::default() });
    warn_func!(em, &obj, sec, 0x104, "return with modified stack frame");
    assert_eq!(
        output(em),
        "vmlinux.o: error: objtool: foo+0x4 (.text+0x104): return with modified stack frame\n"
    );
}

struct FakeElfError;

impl fmt::Display for FakeElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid section header")
    }
}

#[test]
fn elf_variant_appends_library_error() {
    let mut em = capture(DiagOptions::default());
    warn_elf!(em, FakeElfError, "elf_getshdrnum {}", "vmlinux.o");
    assert_eq!(
        output(em),
        "vmlinux.o: warning: objtool: elf_getshdrnum vmlinux.o: invalid section header\n"
    );
}

#[test]
fn backtrace_is_silent_unless_enabled() {
    let (obj, text) = fixture();
    let insn = obj.instruction_at(text, 0x110);
    let mut em = capture(DiagOptions::default());
    bt_insn!(em, &obj, &insn, "call to {}", "bar");
    assert_eq!(em.emitted(), 0);
    assert!(output(em).is_empty());
}

#[test]
fn backtrace_lines_are_indented_in_verbose_mode() {
    let (obj, text) = fixture();
    let insn = obj.instruction_at(text, 0x110);
    for opts in [
        DiagOptions { verbose: true, ..Default::default() },
        DiagOptions { backtrace: true, ..Default::default() },
    ] {
        let mut em = capture(opts);
        bt_insn!(em, &obj, &insn, "call to {}", "bar");
        assert_eq!(output(em), "vmlinux.o: warning: objtool:   foo+0x10: call to bar\n");
    }
}

#[test]
fn backtrace_never_consumes_warning_budget() {
    let (obj, text) = fixture();
    let insn = obj.instruction_at(text, 0x110);
    let mut em = capture(DiagOptions { backtrace: true, ..Default::default() });
    for _ in 0..5 {
        bt_insn!(em, &obj, &insn, "frame");
    }
    assert_eq!(em.emitted(), 5);
    let (_, foo) = obj.symbols().find_by_name("foo").unwrap();
    assert_eq!(foo.warnings(), 0);
}

#[test]
fn backtrace_lines_are_not_reported_findings() {
    let (obj, text) = fixture();
    let insn = obj.instruction_at(text, 0x110);
    let mut em = capture(DiagOptions { backtrace: true, werror: true, ..Default::default() });
    bt_insn!(em, &obj, &insn, "frame");
    assert_eq!((em.emitted(), em.reported()), (1, 0));
    warn_insn!(em, &obj, &insn, "finding");
    assert_eq!((em.emitted(), em.reported()), (2, 1));
}

/// Forwards to an [`ObjectFile`] and counts containment lookups.
struct CountingLookup {
    obj: ObjectFile,
    searches: Cell<usize>,
}

impl SymbolLookup for CountingLookup {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.obj.symbol(id)
    }

    fn find_func_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.searches.set(self.searches.get() + 1);
        self.obj.find_func_containing(sec, offset)
    }

    fn find_symbol_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.searches.set(self.searches.get() + 1);
        self.obj.find_symbol_containing(sec, offset)
    }
}

impl ObjectLookup for CountingLookup {
    fn section(&self, id: SectionId) -> Option<&Section> {
        self.obj.section(id)
    }
}

#[test]
fn backtrace_skips_location_lookup_when_disabled() {
    let (obj, text) = fixture();
    let insn = obj.instruction_at(text, 0x110);
    let lookup = CountingLookup { obj, searches: Cell::new(0) };

    let mut quiet = capture(DiagOptions { werror: true, sec_address: true, ..Default::default() });
    bt_insn!(quiet, &lookup, &insn, "call to {}", "bar");
    assert_eq!(lookup.searches.get(), 0);
    assert!(output(quiet).is_empty());

    for opts in [
        DiagOptions { verbose: true, ..Default::default() },
        DiagOptions { backtrace: true, ..Default::default() },
    ] {
        lookup.searches.set(0);
        let mut em = capture(opts);
        bt_insn!(em, &lookup, &insn, "call to {}", "bar");
        assert!(lookup.searches.get() >= 1);
        assert_eq!(output(em), "vmlinux.o: warning: objtool:   foo+0x10: call to bar\n");
    }
}

#[test]
fn instruction_with_unknown_section_still_reports() {
    let (obj, _) = fixture();
    let insn = Instruction::new(SectionId(42), 0x8, None);
    let mut em = capture(DiagOptions::default());
    em.warn_insn(&obj, &insn, format_args!("stray"));
    assert_eq!(output(em), "vmlinux.o: warning: objtool: stray\n");
}

struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failures_are_swallowed() {
    let mut em = Emitter::new(BrokenPipe, "x.o", DiagOptions::default());
    objwarn!(em, "lost");
    assert_eq!(em.emitted(), 0);
}
