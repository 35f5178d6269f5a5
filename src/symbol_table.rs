use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    Function,
}

/// A resolved reference: where a name lives and which slot it occupies.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    free_symbols: Vec<Symbol>,
    store: BTreeMap<String, Symbol>,
    num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            outer: None,
            free_symbols: Vec::new(),
            store: BTreeMap::new(),
            num_definitions: 0,
        }
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            free_symbols: Vec::new(),
            store: BTreeMap::new(),
            num_definitions: 0,
        }
    }

    pub fn is_enclosed(&self) -> bool {
        self.outer.is_some()
    }

    /// Hands back the enclosing table when a scope is left.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|outer| *outer)
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };

        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;

        symbol
    }

    /// Builtins carry an explicit registry index and never consume a
    /// storage slot.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Binds a function's own name inside its scope so the compiler can
    /// emit OpCurrentClosure for self-references.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let symbol = self.outer.as_mut()?.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            // anything reachable but not global must be captured
            _ => Some(self.define_free(symbol)),
        }
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());

        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };

        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

    fn global(name: &str, index: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope: SymbolScope::Global,
            index,
        }
    }

    fn local(name: &str, index: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope: SymbolScope::Local,
            index,
        }
    }

    fn free(name: &str, index: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope: SymbolScope::Free,
            index,
        }
    }

    #[test]
    fn test_define() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a"), global("a", 0));
        assert_eq!(table.define("b"), global("b", 1));

        let mut first_local = SymbolTable::new_enclosed(table);
        assert_eq!(first_local.define("c"), local("c", 0));
        assert_eq!(first_local.define("d"), local("d", 1));

        let mut second_local = SymbolTable::new_enclosed(first_local);
        assert_eq!(second_local.define("e"), local("e", 0));
        assert_eq!(second_local.define("f"), local("f", 1));
    }

    #[test]
    fn test_resolve_global() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");

        for expected in [global("a", 0), global("b", 1)] {
            assert_eq!(table.resolve(&expected.name), Some(expected));
        }
        assert_eq!(table.resolve("c"), None);
    }

    #[test]
    fn test_resolve_local() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");

        let mut inner = SymbolTable::new_enclosed(table);
        inner.define("c");
        inner.define("d");

        for expected in [global("a", 0), global("b", 1), local("c", 0), local("d", 1)] {
            assert_eq!(inner.resolve(&expected.name), Some(expected));
        }
    }

    #[test]
    fn test_resolve_nested_local_and_free() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");

        let mut first_local = SymbolTable::new_enclosed(table);
        first_local.define("c");
        first_local.define("d");

        let mut second_local = SymbolTable::new_enclosed(first_local);
        second_local.define("e");
        second_local.define("f");

        // globals resolve straight through; outer locals become free
        for expected in [
            global("a", 0),
            global("b", 1),
            free("c", 0),
            free("d", 1),
            local("e", 0),
            local("f", 1),
        ] {
            assert_eq!(second_local.resolve(&expected.name), Some(expected));
        }
        assert_eq!(
            second_local.free_symbols(),
            &[local("c", 0), local("d", 1)]
        );
    }

    #[test]
    fn test_repeated_free_resolution_is_stable() {
        let mut table = SymbolTable::new_enclosed({
            let mut outer = SymbolTable::new_enclosed(SymbolTable::new());
            outer.define("x");
            outer
        });

        let first = table.resolve("x");
        let second = table.resolve("x");
        assert_eq!(first, Some(free("x", 0)));
        assert_eq!(second, Some(free("x", 0)));
        // captured once, not once per resolution
        assert_eq!(table.free_symbols().len(), 1);
    }

    #[test]
    fn test_resolve_unresolvable_free() {
        let mut table = SymbolTable::new();
        table.define("a");

        let mut first_local = SymbolTable::new_enclosed(table);
        first_local.define("c");

        let mut second_local = SymbolTable::new_enclosed(first_local);
        second_local.define("e");
        second_local.define("f");

        for expected in [global("a", 0), free("c", 0), local("e", 0), local("f", 1)] {
            assert_eq!(second_local.resolve(&expected.name), Some(expected));
        }
        for unresolvable in ["b", "d"] {
            assert_eq!(second_local.resolve(unresolvable), None);
        }
    }

    #[test]
    fn test_define_resolve_builtins() {
        let mut table = SymbolTable::new();
        let expected = vec![
            Symbol {
                name: "a".to_string(),
                scope: SymbolScope::Builtin,
                index: 0,
            },
            Symbol {
                name: "c".to_string(),
                scope: SymbolScope::Builtin,
                index: 1,
            },
            Symbol {
                name: "e".to_string(),
                scope: SymbolScope::Builtin,
                index: 2,
            },
        ];

        for (i, symbol) in expected.iter().enumerate() {
            table.define_builtin(i, &symbol.name);
        }
        // builtins never consume storage slots
        assert_eq!(table.num_definitions(), 0);

        for symbol in &expected {
            assert_eq!(table.resolve(&symbol.name), Some(symbol.clone()));
        }

        let mut first_local = SymbolTable::new_enclosed(table);
        for symbol in &expected {
            assert_eq!(first_local.resolve(&symbol.name), Some(symbol.clone()));
        }

        let mut second_local = SymbolTable::new_enclosed(first_local);
        for symbol in &expected {
            assert_eq!(second_local.resolve(&symbol.name), Some(symbol.clone()));
        }
    }

    #[test]
    fn test_define_and_resolve_function_name() {
        let mut table = SymbolTable::new();
        table.define_function_name("a");

        assert_eq!(
            table.resolve("a"),
            Some(Symbol {
                name: "a".to_string(),
                scope: SymbolScope::Function,
                index: 0,
            })
        );
    }

    #[test]
    fn test_shadowing_function_name() {
        let mut table = SymbolTable::new();
        table.define_function_name("a");
        table.define("a");

        assert_eq!(table.resolve("a"), Some(global("a", 0)));
    }
}
