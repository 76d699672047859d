use crate::catalog::{AddressingMode, Catalog};
use crate::error::ErrorKind;
use crate::literal::{decimal_to_hex, hex_to_bytes};
use crate::symbol::SymbolTable;

/// Mnemonic whose operand is always an extended jump target.
pub const JUMP: &str = "JMP";

/// Stands in for jump target bytes that could not be resolved.
pub const PLACEHOLDER: u8 = 0xEE;

/// Addressing mode and encoded bytes of an operand.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Operand {
    pub mode: AddressingMode,
    pub bytes: Vec<u8>,
    /// Set when `bytes` are placeholders. The line still assembles, but this is reported.
    pub unresolved: Option<ResolveError>,
}

impl Operand {
    fn new(mode: AddressingMode, bytes: Vec<u8>) -> Self {
        Operand {
            mode,
            bytes,
            unresolved: None,
        }
    }

    fn placeholder(error: ResolveError) -> Self {
        Operand {
            mode: AddressingMode::Extended,
            bytes: vec![PLACEHOLDER; 2],
            unresolved: Some(error),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolveError {
    /// [`ErrorKind::InvalidOperand`] or [`ErrorKind::UnresolvedSymbol`]
    pub kind: ErrorKind,
    pub message: String,
}

impl ResolveError {
    fn invalid(message: String) -> Self {
        ResolveError {
            kind: ErrorKind::InvalidOperand,
            message,
        }
    }

    fn unresolved(label: &str) -> Self {
        ResolveError {
            kind: ErrorKind::UnresolvedSymbol,
            message: format!("Unresolved symbol '{label}'"),
        }
    }
}

/// Work out the addressing mode of `operand` for a mnemonic known to the catalog, and encode it.
///
/// | operand        | mode                                   | bytes       |
/// |----------------|----------------------------------------|-------------|
/// | none           | implied                                | 0           |
/// | `#12`, `#$0C`  | immediate                              | 1           |
/// | `$0C`          | direct                                 | 1           |
/// | `$1000`        | extended                               | 2           |
/// | `LABEL`        | direct if it fits and exists, extended | 1 or 2      |
///
/// `JMP` always resolves to extended. Targets that cannot be resolved give placeholder bytes
/// instead of an error, see [`Operand::unresolved`].
pub fn resolve(
    mnemonic: &str,
    operand: Option<&str>,
    catalog: &Catalog,
    symbols: &SymbolTable,
) -> Result<Operand, ResolveError> {
    if mnemonic == JUMP {
        return Ok(resolve_jump(operand, symbols));
    }

    let Some(text) = operand else {
        return Ok(Operand::new(AddressingMode::Implied, Vec::new()));
    };

    if let Some(value) = text.strip_prefix('#') {
        return resolve_immediate(text, value);
    }
    if let Some(address) = text.strip_prefix('$') {
        return resolve_address(text, address);
    }

    let address = symbols
        .resolve(text)
        .ok_or_else(|| ResolveError::unresolved(text))?;
    Ok(label_operand(mnemonic, address, catalog))
}

fn resolve_immediate(text: &str, value: &str) -> Result<Operand, ResolveError> {
    let hex = match value.strip_prefix('$') {
        Some(hex) => {
            if hex.len() > 2 {
                return Err(ResolveError::invalid(format!(
                    "Immediate value '{text}' does not fit in a byte"
                )));
            }
            hex.to_string()
        }
        None => decimal_to_hex(value).ok_or_else(|| {
            ResolveError::invalid(format!("Immediate value '{text}' is not a number"))
        })?,
    };
    let bytes = hex_to_bytes(&hex);
    if bytes.is_empty() {
        return Err(ResolveError::invalid(format!(
            "Immediate value '{text}' has no hex digits"
        )));
    }
    Ok(Operand::new(AddressingMode::Immediate, bytes))
}

fn resolve_address(text: &str, address: &str) -> Result<Operand, ResolveError> {
    let bytes = hex_to_bytes(address);
    match bytes.len() {
        1 => Ok(Operand::new(AddressingMode::Direct, bytes)),
        2 => Ok(Operand::new(AddressingMode::Extended, bytes)),
        0 => Err(ResolveError::invalid(format!(
            "Address '{text}' has no hex digits"
        ))),
        _ => Err(ResolveError::invalid(format!(
            "Address '{text}' is wider than 16 bits"
        ))),
    }
}

fn label_operand(mnemonic: &str, address: u16, catalog: &Catalog) -> Operand {
    if address <= 0xFF && catalog.has_mode(mnemonic, AddressingMode::Direct) {
        Operand::new(AddressingMode::Direct, vec![address as u8])
    } else {
        // Without an extended variant either, the catalog lookup reports the mismatch
        Operand::new(AddressingMode::Extended, address.to_be_bytes().to_vec())
    }
}

fn resolve_jump(operand: Option<&str>, symbols: &SymbolTable) -> Operand {
    let Some(text) = operand else {
        return Operand::placeholder(ResolveError::invalid("Missing jump target".to_string()));
    };
    if let Some(address) = symbols.resolve(text) {
        return Operand::new(AddressingMode::Extended, address.to_be_bytes().to_vec());
    }
    match text.strip_prefix('$') {
        Some(address) => {
            let bytes = hex_to_bytes(address);
            if bytes.len() == 2 {
                Operand::new(AddressingMode::Extended, bytes)
            } else {
                Operand::placeholder(ResolveError::invalid(format!(
                    "Jump target '{text}' must be a two byte address"
                )))
            }
        }
        None if text.starts_with('#') => Operand::placeholder(ResolveError::invalid(format!(
            "Jump target '{text}' cannot be immediate"
        ))),
        None => Operand::placeholder(ResolveError::unresolved(text)),
    }
}
