//! Interned identifiers.
//!
//! Every name in the engine (class names, member names, parameter names, actor
//! identities) is a `Symbol`: an index into a process-wide intern table. Equality
//! and hashing are id comparisons; the string is only touched for display.
//!
//! The engine is single-threaded per mind (see the runtime crate), so the table
//! lives in a thread local rather than behind a lock.
use std::cell::RefCell;
use std::fmt;

use ahash::RandomState;
use hashbrown::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u32);

struct SymbolTable {
    map: HashMap<Box<str>, u32, RandomState>,
    rev: Vec<Box<str>>,
}

impl SymbolTable {
    fn new() -> Self {
        let mut this = Self {
            map: HashMap::with_capacity_and_hasher(256, RandomState::with_seeds(0, 0, 0, 0)),
            rev: Vec::with_capacity(256),
        };
        // Id 0 is the empty symbol so `Symbol::default()` is always valid.
        this.intern("");
        this
    }

    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let id = self.rev.len() as u32;
        let boxed: Box<str> = name.into();
        self.rev.push(boxed.clone());
        self.map.insert(boxed, id);
        id
    }
}

thread_local! {
    static TABLE: RefCell<SymbolTable> = RefCell::new(SymbolTable::new());
}

impl Symbol {
    pub fn intern(name: &str) -> Symbol {
        TABLE.with(|t| Symbol(t.borrow_mut().intern(name)))
    }

    pub fn none() -> Symbol {
        Symbol(0)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Resolve back to the interned string. Clones; intended for display and
    /// diagnostics, not hot paths.
    pub fn as_str(self) -> String {
        TABLE.with(|t| {
            let t = t.borrow();
            t.rev
                .get(self.0 as usize)
                .map(|s| s.to_string())
                .unwrap_or_default()
        })
    }

    /// Look up an already-interned name without creating it.
    pub fn find(name: &str) -> Option<Symbol> {
        TABLE.with(|t| t.borrow().map.get(name).map(|&id| Symbol(id)))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TABLE.with(|t| {
            let t = t.borrow();
            match t.rev.get(self.0 as usize) {
                Some(s) => write!(f, "{}", s),
                None => write!(f, "<sym#{}>", self.0),
            }
        })
    }
}
