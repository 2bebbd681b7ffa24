/*!

FIRST sets: for every symbol, the set of terminals that can begin one of its
derivations, plus a `Nullable` entry when the symbol derives the empty
string. Computed as an event-driven fixpoint: terminal seeds and empty
productions enqueue events, and each insertion re-examines the productions
of every symbol that depends on the one that grew.

*/

use std::collections::{BTreeSet, VecDeque};

use log::trace;

use crate::builder::graph::ParserGraph;
use crate::grammar::Grammar;
use crate::SymbolId;

/// One element of a FIRST set. Terminals sort before the nullable marker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum FirstEntry {
  Terminal(SymbolId),
  Nullable,
}

pub type FirstSet = BTreeSet<FirstEntry>;

/// Does the set witness a non-null terminal descendant?
pub fn has_terminal(first_set: &FirstSet) -> bool {
  first_set.iter().any(|e| matches!(e, FirstEntry::Terminal(_)))
}

pub fn has_nullable(first_set: &FirstSet) -> bool {
  first_set.contains(&FirstEntry::Nullable)
}

/// The terminals of a FIRST set, with the nullable marker stripped.
pub fn terminals_of(first_set: &FirstSet) -> BTreeSet<SymbolId> {
  first_set
    .iter()
    .filter_map(|e| match e {
      FirstEntry::Terminal(t) => Some(*t),
      FirstEntry::Nullable => None,
    })
    .collect()
}

/// FIRST of a symbol string: walk left to right, collecting terminals and
/// stopping at the first symbol that is not nullable. A fully nullable
/// string (the empty string included) contributes `Nullable`.
pub fn first_of_string(string: &[SymbolId], first_sets: &[FirstSet]) -> FirstSet {
  let mut out = FirstSet::new();
  let mut i = 0;
  while i < string.len() {
    let symbol = string[i];
    let mut has_null = false;
    for entry in &first_sets[symbol] {
      match entry {
        FirstEntry::Nullable => has_null = true,
        FirstEntry::Terminal(_) => {
          out.insert(*entry);
        }
      }
    }
    if !has_null {
      break;
    }
    i += 1;
  }
  if i == string.len() {
    out.insert(FirstEntry::Nullable);
  }
  out
}

/// Symbol graph: an edge (A, B) exists when B appears in the RHS of a
/// production whose LHS is A.
fn symbol_graph(grammar: &Grammar, lhs2prods: &ParserGraph) -> ParserGraph {
  let mut out = ParserGraph::with_nnodes(grammar.nsymbols);
  for lhs in 0..grammar.nsymbols {
    let mut dependees = BTreeSet::new();
    for &prod_i in lhs2prods.edges(lhs) {
      for &rhs_symbol in &grammar.productions[prod_i].rhs {
        dependees.insert(rhs_symbol);
      }
    }
    out.set_edges(lhs, dependees.into_iter().collect());
  }
  out
}

pub fn compute_first_sets(grammar: &Grammar, lhs2prods: &ParserGraph) -> Vec<FirstSet> {
  struct Event {
    added: FirstEntry,
    dependee: SymbolId,
  }
  let mut event_q: VecDeque<Event> = VecDeque::new();
  let mut first_sets = vec![FirstSet::new(); grammar.nsymbols];
  for symbol in 0..grammar.nsymbols {
    if grammar.is_terminal(symbol) {
      event_q.push_back(Event { added: FirstEntry::Terminal(symbol), dependee: symbol });
    } else {
      for &prod_i in lhs2prods.edges(symbol) {
        if grammar.productions[prod_i].rhs.is_empty() {
          event_q.push_back(Event { added: FirstEntry::Nullable, dependee: symbol });
          break;
        }
      }
    }
  }
  let dependers2dependees = symbol_graph(grammar, lhs2prods);
  let dependees2dependers = dependers2dependees.transpose();
  while let Some(event) = event_q.pop_front() {
    let dependee_firsts = &mut first_sets[event.dependee];
    if !dependee_firsts.insert(event.added) {
      continue; // duplicate events do pile up
    }
    for &depender in dependees2dependers.edges(event.dependee) {
      debug_assert!(grammar.is_nonterminal(depender));
      for &prod_i in lhs2prods.edges(depender) {
        let rhs_first = first_of_string(&grammar.productions[prod_i].rhs, &first_sets);
        for entry in rhs_first {
          if !first_sets[depender].contains(&entry) {
            event_q.push_back(Event { added: entry, dependee: depender });
          }
        }
      }
    }
  }
  for symbol in 0..grammar.nsymbols {
    trace!(
      "FIRST({}) = {:?}",
      grammar.symbol_name(symbol),
      first_sets[symbol]
        .iter()
        .map(|e| match e {
          FirstEntry::Terminal(t) => grammar.symbol_name(*t),
          FirstEntry::Nullable => "null",
        })
        .collect::<Vec<_>>()
    );
  }
  first_sets
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::lr0::productions_by_lhs;
  use crate::grammar::{Production, RhsString};
  use smallvec::SmallVec;

  /// S ::= a S b | <empty>, augmented.
  fn nullable_grammar() -> Grammar {
    let mut g = Grammar {
      nsymbols: 3,
      nterminals: 2,
      productions: vec![
        Production { lhs: 2, rhs: SmallVec::from_slice(&[0, 2, 1]) },
        Production { lhs: 2, rhs: RhsString::new() },
      ],
      symbol_names: vec!["a".into(), "b".into(), "S".into()],
      ignored_terminals: vec![],
    };
    g.add_end_terminal();
    g.add_accept_production();
    g
  }

  #[test]
  fn nullable_nonterminal() {
    let g = nullable_grammar();
    let lhs2prods = productions_by_lhs(&g);
    let first = compute_first_sets(&g, &lhs2prods);
    let s = 3; // S after augmentation
    assert!(first[s].contains(&FirstEntry::Terminal(0)));
    assert!(first[s].contains(&FirstEntry::Nullable));
    assert!(!first[s].contains(&FirstEntry::Terminal(1)));
    // ACCEPT ::= S EOF: FIRST is {a, EOF}, not nullable
    let accept = g.accept_nonterminal();
    assert!(first[accept].contains(&FirstEntry::Terminal(0)));
    assert!(first[accept].contains(&FirstEntry::Terminal(g.end_terminal())));
    assert!(!has_nullable(&first[accept]));
  }

  #[test]
  fn first_of_string_stops_at_non_nullable() {
    let g = nullable_grammar();
    let lhs2prods = productions_by_lhs(&g);
    let first = compute_first_sets(&g, &lhs2prods);
    // "S b": S is nullable so b's first joins in, but the string is not nullable
    let fs = first_of_string(&[3, 1], &first);
    assert!(fs.contains(&FirstEntry::Terminal(0)));
    assert!(fs.contains(&FirstEntry::Terminal(1)));
    assert!(!has_nullable(&fs));
    // the empty string is nullable
    let fs = first_of_string(&[], &first);
    assert_eq!(fs.len(), 1);
    assert!(has_nullable(&fs));
  }
}
