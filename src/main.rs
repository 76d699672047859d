use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, IntoDiagnostic, Result};

use m6800::literal::parse_hex_address;
use m6800::output::Output;
use m6800::{from_bit_text, Air, Catalog, Emulator, Stop};

/// m6800 is a small assembler and emulator toolchain for a Motorola 6800 style CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm`, bit text `.txt` or raw `.bin` file and print the final registers
    Run {
        /// File to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Stop after this many instructions
        #[arg(short, long, default_value_t = DEFAULT_STEPS)]
        steps: usize,
        /// Load address for `.txt` and `.bin` files, in hex
        #[arg(short, long, value_parser = hex_address, default_value = "0")]
        origin: u16,
        /// Print memory starting at this hex address once stopped
        #[arg(short, long, value_parser = hex_address)]
        dump: Option<u16>,
        /// Lines of 16 bytes to print with `--dump`
        #[arg(short, long, default_value_t = 4)]
        lines: usize,
    },
    /// Assemble a `.asm` file into an object file and print its listing
    Assemble {
        /// `.asm` file to assemble
        name: PathBuf,
        /// Destination of the object file
        dest: Option<PathBuf>,
        /// Write raw bytes (`.bin`) instead of one binary byte per line (`.txt`)
        #[arg(short, long)]
        raw: bool,
        /// Do not print the listing
        #[arg(short, long)]
        quiet: bool,
    },
    /// Check a `.asm` file without running or outputting an object file
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Place a watch on a `.asm` file to receive constant assembler updates
    Watch {
        /// `.asm` file to watch
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    m6800::env::init();
    Output::set_trace(m6800::env::is_trace_enabled());

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(m6800::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let catalog = load_catalog()?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                steps,
                origin,
                dump,
                lines,
            } => {
                let options = RunOptions {
                    minimal,
                    steps,
                    origin,
                    dump: dump.map(|start| (start, lines)),
                };
                run(&name, &catalog, &options)
            }
            Command::Assemble {
                name,
                dest,
                raw,
                quiet,
            } => {
                file_message(Green, "Assembling", &name);
                let air = assemble(&name, &catalog)?;
                if !quiet {
                    Output::Normal.print_str(&air.listing());
                }

                let out_file_name =
                    dest.unwrap_or_else(|| name.with_extension(if raw { "bin" } else { "txt" }));
                let contents = if raw {
                    air.bytes().to_vec()
                } else {
                    air.to_bit_text().into_bytes()
                };
                fs::write(&out_file_name, contents).into_diagnostic()?;

                summarize(&air);
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let air = assemble(&name, &catalog)?;
                summarize(&air);
                Ok(())
            }
            Command::Watch { name } => {
                if !name.exists() {
                    bail!("File does not exist. Exiting...")
                }
                // Vim breaks if watching a single file
                let folder_path = match name.parent() {
                    Some(pth) if pth.is_dir() => pth.to_path_buf(),
                    _ => Path::new(".").to_path_buf(),
                };

                // Clear screen and move cursor to top left
                print!("\x1B[2J\x1B[2;1H");
                file_message(Green, "Watching", &name);
                message(Cyan, "Help", "press CTRL+C to exit");

                let mut watcher = Hotwatch::new_with_custom_delay(Duration::from_millis(500))
                    .into_diagnostic()?;

                watcher
                    .watch(folder_path, move |event: Event| match event.kind {
                        // Watch remove for vim changes
                        EventKind::Modify(_) | EventKind::Remove(_) => {
                            // Clear screen
                            print!("\x1B[2J\x1B[2;1H");
                            file_message(Green, "Watching", &name);
                            message(Green, "Re-checking", "file change detected");
                            message(Cyan, "Help", "press CTRL+C to exit");

                            // Now we are developing software (makes reruns more obvious)
                            sleep(Duration::from_millis(50));

                            let contents = match fs::read_to_string(&name) {
                                Ok(cts) => cts,
                                Err(e) => {
                                    eprintln!("{e}. Exiting...");
                                    std::process::exit(1)
                                }
                            };
                            let air = m6800::assemble(&contents, &catalog);
                            summarize(&air);
                            Flow::Continue
                        }
                        _ => Flow::Continue,
                    })
                    .into_diagnostic()?;
                watcher.run();
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, &catalog, &RunOptions::default())
    } else {
        println!("\n~ m6800 v{VERSION} ~");
        println!("{}", LOGO.truecolor(255, 183, 197).bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn hex_address(text: &str) -> std::result::Result<u16, String> {
    parse_hex_address(text).ok_or_else(|| format!("'{text}' is not a 16-bit hex address"))
}

/// Descriptor from `M6800_CATALOG` if set, otherwise the built-in one.
fn load_catalog() -> Result<Catalog> {
    match m6800::env::catalog_path() {
        Some(path) => {
            let descriptor = fs::read_to_string(&path).into_diagnostic()?;
            let catalog = Catalog::load(&descriptor);
            if catalog.is_empty() {
                bail!("Instruction descriptor {} has no usable lines", path.display());
            }
            Ok(catalog)
        }
        None => Ok(Catalog::builtin()),
    }
}

/// Assemble a source file. Line errors are reported as they are found and never fail this.
fn assemble(name: &Path, catalog: &Catalog) -> Result<Air> {
    if name.extension().and_then(|ext| ext.to_str()) != Some("asm") {
        bail!("Expected a `.asm` file. Exiting...");
    }
    let contents = fs::read_to_string(name).into_diagnostic()?;
    Ok(m6800::assemble(&contents, catalog))
}

fn summarize(air: &Air) {
    match air.error_count() {
        0 => message(MsgColor::Green, "Success", "no errors found!"),
        1 => message(MsgColor::Red, "Failed", "1 error found"),
        n => message(MsgColor::Red, "Failed", &format!("{n} errors found")),
    }
}

#[derive(Default)]
struct RunOptions {
    minimal: bool,
    /// Zero means the default limit
    steps: usize,
    origin: u16,
    dump: Option<(u16, usize)>,
}

const DEFAULT_STEPS: usize = 100_000;

fn run(name: &Path, catalog: &Catalog, options: &RunOptions) -> Result<()> {
    Output::set_minimal(options.minimal);
    let mut emulator = Emulator::new();

    let Some(ext) = name.extension().and_then(|ext| ext.to_str()) else {
        bail!("File has no extension. Exiting...");
    };
    // Truncation is already reported by the emulator
    match ext {
        "asm" => {
            file_message(MsgColor::Green, "Assembling", name);
            let air = assemble(name, catalog)?;
            summarize(&air);
            let _ = emulator.load_air(&air);
        }
        "txt" => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            let bytes = from_bit_text(&contents).into_diagnostic()?;
            let _ = emulator.load_program(&bytes, options.origin);
        }
        "bin" => {
            let bytes = fs::read(name).into_diagnostic()?;
            let _ = emulator.load_program(&bytes, options.origin);
        }
        _ => bail!("File has unknown extension. Exiting..."),
    }

    message(MsgColor::Green, "Running", "loaded program");
    let limit = match options.steps {
        0 => DEFAULT_STEPS,
        n => n,
    };
    let summary = emulator.run(limit);
    let state = emulator.state();
    Output::Normal.start_new_line();
    match summary.stop {
        Stop::Halted => message(
            MsgColor::Cyan,
            "Halted",
            &format!("software interrupt after {} steps", summary.steps),
        ),
        Stop::EndOfMemory => message(
            MsgColor::Cyan,
            "Stopped",
            &format!("end of memory after {} steps", summary.steps),
        ),
        Stop::Fault(fault) => message(MsgColor::Red, "Stopped", &fault.to_string()),
        Stop::StepLimit => message(
            MsgColor::Red,
            "Stopped",
            &format!("step limit of {} reached at ${:04X}", limit, state.pc),
        ),
    }

    Output::Normal.print_registers(&state);
    if let Some((start, lines)) = options.dump {
        Output::Normal.print_str(&emulator.dump(start, lines));
    }

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const LOGO: &str = r#"
                __    ___    ___    ___
  _ __ ___    / /_  ( _ )  / _ \  / _ \
 | '_ ` _ \  | '_ \ / _ \ | | | || | | |
 | | | | | | | (_) | (_) || |_| || |_| |
 |_| |_| |_|  \___/ \___/  \___/  \___/"#;

const SHORT_INFO: &str = r"
Welcome to m6800, an assembler and emulator for a small Motorola 6800 style
accumulator machine.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
