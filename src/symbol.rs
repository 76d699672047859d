use fxhash::FxBuildHasher;
use indexmap::IndexMap;

// Symbol table of label -> location counter value
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Label was already defined. Carries the address it was first defined at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DuplicateSymbol {
    pub existing: u16,
}

/// Labels defined so far, in definition order.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: FxMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a label. A label is never redefined.
    pub fn define(&mut self, label: &str, address: u16) -> Result<(), DuplicateSymbol> {
        if let Some(&existing) = self.symbols.get(label) {
            return Err(DuplicateSymbol { existing });
        }
        self.symbols.insert(label.to_string(), address);
        Ok(())
    }

    /// Address of a label, if it has been defined.
    pub fn resolve(&self, label: &str) -> Option<u16> {
        self.symbols.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.symbols.iter().map(|(label, &addr)| (label.as_str(), addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_resolve() {
        let mut table = SymbolTable::new();
        assert!(table.define("START", 0x0100).is_ok());
        assert!(table.define("LOOP", 0x0105).is_ok());
        assert_eq!(table.resolve("START"), Some(0x0100));
        assert_eq!(table.resolve("LOOP"), Some(0x0105));
        assert_eq!(table.resolve("UNDEFINED"), None);
    }

    #[test]
    fn duplicate_is_not_overwritten() {
        let mut table = SymbolTable::new();
        table.define("LOOP", 0x0010).unwrap();
        assert_eq!(
            table.define("LOOP", 0x0020),
            Err(DuplicateSymbol { existing: 0x0010 })
        );
        assert_eq!(table.resolve("LOOP"), Some(0x0010));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let mut table = SymbolTable::new();
        table.define("loop", 1).unwrap();
        assert!(table.define("LOOP", 2).is_ok());
    }

    #[test]
    fn iterates_in_definition_order() {
        let mut table = SymbolTable::new();
        table.define("B", 2).unwrap();
        table.define("A", 1).unwrap();
        let labels: Vec<_> = table.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["B", "A"]);
    }
}
