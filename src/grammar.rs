/*!

The grammar model: productions over a dense symbol space in which terminals
occupy `[0, nterminals)` and nonterminals `[nterminals, nsymbols)`. Before
table construction the grammar is augmented with a synthetic end-of-input
terminal and an accept production `ACCEPT ::= START EOF`.

*/

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{ProductionId, SymbolId};

pub type RhsString = SmallVec<[SymbolId; 4]>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Production {
  pub lhs: SymbolId,
  pub rhs: RhsString,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Grammar {
  pub nsymbols: usize,
  pub nterminals: usize,
  pub productions: Vec<Production>,
  pub symbol_names: Vec<String>,       //< for diagnostics only
  pub ignored_terminals: Vec<SymbolId>, //< terminals the tables must skip
}

pub type GrammarPtr = Arc<Grammar>;

impl Grammar {
  pub fn is_terminal(&self, symbol: SymbolId) -> bool {
    symbol < self.nterminals
  }

  pub fn is_nonterminal(&self, symbol: SymbolId) -> bool {
    !self.is_terminal(symbol)
  }

  /// Nonterminal ordinal of a symbol, for indexing GOTO tables.
  pub fn as_nonterminal(&self, symbol: SymbolId) -> usize {
    assert!(self.is_nonterminal(symbol));
    symbol - self.nterminals
  }

  pub fn nnonterminals(&self) -> usize {
    self.nsymbols - self.nterminals
  }

  pub fn symbol_name(&self, symbol: SymbolId) -> &str {
    &self.symbol_names[symbol]
  }

  /// Appends the end-of-input terminal. Nonterminal indices all shift up by
  /// one to keep the terminal range contiguous.
  pub fn add_end_terminal(&mut self) {
    let old_nterminals = self.nterminals;
    for production in &mut self.productions {
      if production.lhs >= old_nterminals {
        production.lhs += 1;
      }
      for symbol in &mut production.rhs {
        if *symbol >= old_nterminals {
          *symbol += 1;
        }
      }
    }
    self.symbol_names.insert(old_nterminals, "EOF".into());
    self.nterminals += 1;
    self.nsymbols += 1;
  }

  pub fn end_terminal(&self) -> SymbolId {
    self.nterminals - 1
  }

  /// Appends the accept nonterminal with its single production
  /// `ACCEPT ::= START EOF`, where START is the first production's LHS.
  pub fn add_accept_production(&mut self) {
    let start_symbol = self.productions[0].lhs;
    let accept_symbol = self.nsymbols;
    let mut rhs = RhsString::new();
    rhs.push(start_symbol);
    rhs.push(self.end_terminal());
    self.productions.push(Production { lhs: accept_symbol, rhs });
    self.symbol_names.push("ACCEPT".into());
    self.nsymbols += 1;
  }

  pub fn accept_production(&self) -> ProductionId {
    self.productions.len() - 1
  }

  pub fn accept_nonterminal(&self) -> SymbolId {
    self.nsymbols - 1
  }

  /// `lhs ::= rhs ...` rendering for conflict diagnostics.
  pub fn production_string(&self, production: ProductionId) -> String {
    let prod = &self.productions[production];
    let mut out = format!("{} ::=", self.symbol_name(prod.lhs));
    for &symbol in &prod.rhs {
      out.push(' ');
      out.push_str(self.symbol_name(symbol));
    }
    out
  }
}
