use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::cpu::{CpuState, Flag};

#[macro_export]
macro_rules! dprint {
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Diagnostic($cond).print_str(&s);
    }};
    // Trigger type error if missing condition
    ( $fmt:literal $($tt:tt)* ) => {{
        $crate::output::Output::Diagnostic($fmt);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Diagnostic($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Diagnostic($cond).print_str(&s);
    }};
    // Trigger type error if missing condition
    ( $fmt:literal $($tt:tt)* ) => {{
        $crate::output::Output::Diagnostic($fmt);
    }};
}

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Program results, written to stdout.
    Normal,
    /// Errors, warnings and progress, written to stderr.
    Diagnostic(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Errors and warnings.
    Always,
    /// Progress messages, hidden with `--minimal`.
    Sometimes,
    /// Per-instruction execution trace, only shown when tracing is enabled.
    Trace,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
        static IS_TRACE: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }
    pub fn set_trace(new_value: bool) -> bool {
        Self::IS_TRACE.with(|value| value.replace(new_value))
    }
    pub fn is_trace() -> bool {
        Self::IS_TRACE.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        let last = Decolored::new(string).last();
        if let Some(ch) = last {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }
            Self::Diagnostic(condition) => match (Self::is_minimal(), *condition) {
                (_, Condition::Trace) if !Self::is_trace() => (),
                (false, Condition::Always) => {
                    eprint!("{}", ColoredString::from(string).red());
                    Self::set_line_start_from_str(string);
                }
                (false, _) => {
                    eprint!("{}", ColoredString::from(string).blue());
                    Self::set_line_start_from_str(string);
                }
                // Always remove color if `--minimal`
                (true, Condition::Always | Condition::Trace) => {
                    eprint_colorless(string);
                    Self::set_line_start_from_str(string);
                }
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_str("\n");
        }
    }

    pub fn print_registers(&self, state: &CpuState) {
        if Self::is_minimal() {
            self.print_str(&format!("PC {:04X}\n", state.pc));
            self.print_str(&format!("SP {:04X}\n", state.sp));
            self.print_str(&format!("IX {:04X}\n", state.ix));
            self.print_str(&format!("A {:02X}\n", state.acc_a));
            self.print_str(&format!("B {:02X}\n", state.acc_b));
            self.print_str(&format!("CCR {:08b}\n", state.ccr));
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│       \x1b[3mhex      int   uint  char\x1b[0m\x1b[2m │\x1b[0m\n");
        for (name, value) in [("A ", state.acc_a), ("B ", state.acc_b)] {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m   ", name));
            self.print_byte(value);
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        for (name, value) in [("PC", state.pc), ("SP", state.sp), ("IX", state.ix)] {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m   0x{:04x}", name, value));
            self.print_str("                    \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(" \x1b[1mCC\x1b[0m   ");
        for flag in Flag::ALL {
            if state.flag(flag) {
                self.print_str(&format!("\x1b[1m{}\x1b[0m", flag.name()));
            } else {
                self.print_str(&format!("\x1b[2m{}\x1b[0m", flag.name().to_ascii_lowercase()));
            }
        }
        self.print_str(&format!("  0x{:02x}", state.ccr));
        self.print_str("              \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└──────────────────────────────────┘\x1b[0m\n");
    }

    fn print_byte(&self, value: u8) {
        self.print_str(&format!("0x{:02x}  ", value));
        self.print_str(&format!("{:-5}  ", value as i8));
        self.print_str(&format!("{:-5}  ", value));
        match value {
            0x20 => self.print_str("[_]"),
            0x21..=0x7e => self.print_str(&format!("{:<3}", value as char)),
            _ => self.print_str("\x1b[2m───\x1b[0m"),
        }
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    for ch in Decolored::new(string) {
        eprint!("{}", ch);
    }
}
