use std::fmt::{self, Write};

use crate::model::{Section, SymbolLookup};

/// Rendered `sym+0xoff` (or `sec+0xoff`) location for one diagnostic line.
///
/// Created per call and dropped right after the line is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location(String);

impl Location {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve `offset` in `sec` to a display location.
///
/// Executable sections prefer the enclosing function; anything else (or a
/// miss) falls back to any containing symbol, then to the bare section.
/// With `sec_address` the section-relative form is appended in parentheses.
pub fn offstr(lookup: &dyn SymbolLookup, sec: &Section, offset: u64, sec_address: bool) -> Location {
    let func = if sec.is_executable() { lookup.find_func_containing(sec, offset) } else { None };
    let sym = func.or_else(|| lookup.find_symbol_containing(sec, offset));

    // fmt::Write for String is infallible.
    let rendered = match sym {
        Some(sym) => {
            let mut buf = String::with_capacity(sym.name.len() + sec.name.len() + 40);
            // Containment is the lookup's job; wrap like unsigned arithmetic would.
            let _ = write!(buf, "{}+0x{:x}", sym.name, offset.wrapping_sub(sym.offset));
            if sec_address {
                let _ = write!(buf, " ({}+0x{:x})", sec.name, offset);
            }
            buf
        }
        None => {
            log::trace!("no symbol covers {}+0x{:x}", sec.name, offset);
            let mut buf = String::with_capacity(sec.name.len() + 20);
            let _ = write!(buf, "{}+0x{:x}", sec.name, offset);
            buf
        }
    };
    Location(rendered)
}
