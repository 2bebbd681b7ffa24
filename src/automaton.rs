/*!

A `FiniteAutomaton` is a dense transition table plus an accept-token vector.
While the automaton is nondeterministic it carries two extra "epsilon"
columns after the real symbol columns; the union, concatenation, `+`, `?`
and `*` combinators wire their bypass edges through those. Determinization
drops them.

Conventions the combinators maintain:

  - state `0` is the start state of a recognizer;
  - a state accepts at most one token;
  - accepting states have no outgoing epsilon transitions (the combinators
    clear the accept mark whenever they add one).

*/

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

use log::debug;

use crate::chartab::{self, NCHARS};
use crate::{StateId, SymbolId, TokenId, NO_STATE, NO_TOKEN};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FiniteAutomaton {
  nsymbols: usize,             //< real alphabet size, without epsilons
  is_deterministic: bool,
  table: Vec<StateId>,         //< nstates x ncols, row-major, -1 is "none"
  accepted_tokens: Vec<TokenId>, //< per state, -1 is non-accepting
}

impl FiniteAutomaton {
  pub fn new(nsymbols: usize, is_deterministic: bool, nstates_reserve: usize) -> Self {
    let ncols = nsymbols + if is_deterministic { 0 } else { 2 };
    FiniteAutomaton {
      nsymbols,
      is_deterministic,
      table: Vec::with_capacity(nstates_reserve * ncols),
      accepted_tokens: Vec::with_capacity(nstates_reserve),
    }
  }

  pub fn nstates(&self) -> usize {
    self.accepted_tokens.len()
  }

  pub fn nsymbols(&self) -> usize {
    self.nsymbols
  }

  pub fn is_deterministic(&self) -> bool {
    self.is_deterministic
  }

  /// Column count including the epsilon columns, when present.
  fn ncols(&self) -> usize {
    self.nsymbols + if self.is_deterministic { 0 } else { 2 }
  }

  fn epsilon0(&self) -> usize {
    assert!(!self.is_deterministic);
    self.ncols() - 2
  }

  fn epsilon1(&self) -> usize {
    assert!(!self.is_deterministic);
    self.ncols() - 1
  }

  pub fn add_state(&mut self) -> usize {
    let state = self.nstates();
    self.table.resize(self.table.len() + self.ncols(), NO_STATE);
    self.accepted_tokens.push(NO_TOKEN);
    state
  }

  pub fn add_transition(&mut self, from_state: usize, at_symbol: usize, to_state: usize) {
    assert!(to_state < self.nstates());
    assert!(at_symbol < self.ncols()); // allow setting epsilon transitions
    let ncols = self.ncols();
    let cell = &mut self.table[from_state * ncols + at_symbol];
    assert!(*cell == NO_STATE, "transition already set");
    *cell = to_state as StateId;
  }

  pub fn add_accept(&mut self, state: usize, token: TokenId) {
    assert!(token >= 0);
    self.accepted_tokens[state] = token;
  }

  pub fn remove_accept(&mut self, state: usize) {
    self.accepted_tokens[state] = NO_TOKEN;
  }

  /// Next state on `symbol`, or `-1`. Epsilon columns are reachable here on
  /// purpose.
  pub fn step(&self, state: usize, symbol: usize) -> StateId {
    assert!(state < self.nstates());
    assert!(symbol < self.ncols());
    self.table[state * self.ncols() + symbol]
  }

  /// Token accepted by `state`, or `-1`.
  pub fn accepts(&self, state: usize) -> TokenId {
    self.accepted_tokens[state]
  }

  /// Runs the whole string through a DFA from state `0` and returns the
  /// token accepted at the end, or `-1` if the automaton gets stuck or
  /// finishes in a non-accepting state.
  pub fn accepts_string(&self, text: &str) -> TokenId {
    assert!(self.is_deterministic);
    if self.nstates() == 0 {
      return NO_TOKEN;
    }
    let mut state = 0usize;
    for c in text.chars() {
      if !chartab::is_symbol(c) {
        return NO_TOKEN;
      }
      let next = self.step(state, chartab::get_symbol(c));
      if next == NO_STATE {
        return NO_TOKEN;
      }
      state = next as usize;
    }
    self.accepts(state)
  }

  /// Copies all of `other`'s states into `self`, offsetting state indices.
  fn append_states(&mut self, other: &FiniteAutomaton) {
    assert_eq!(other.nsymbols(), self.nsymbols());
    if !other.is_deterministic {
      assert!(!self.is_deterministic);
    }
    let offset = self.nstates();
    for other_state in 0..other.nstates() {
      let my_state = self.add_state();
      let token = other.accepts(other_state);
      if token >= 0 {
        self.add_accept(my_state, token);
      }
    }
    for other_state in 0..other.nstates() {
      let my_state = other_state + offset;
      for symbol in 0..other.ncols() {
        let other_next = other.step(other_state, symbol);
        if other_next < 0 {
          continue;
        }
        self.add_transition(my_state, symbol, other_next as usize + offset);
      }
    }
  }

  // region Primitive constructors

  pub fn make_single_nfa(nsymbols: usize, symbol: usize, token: TokenId) -> Self {
    Self::make_range_nfa(nsymbols, symbol, symbol, token)
  }

  pub fn make_range_nfa(
    nsymbols: usize, range_start: usize, range_end: usize, token: TokenId,
  ) -> Self {
    assert!(range_start <= range_end);
    assert!(range_end <= nsymbols);
    let mut out = FiniteAutomaton::new(nsymbols, true, 2);
    let start_state = out.add_state();
    let accept_state = out.add_state();
    for symbol in range_start..=range_end {
      out.add_transition(start_state, symbol, accept_state);
    }
    out.add_accept(accept_state, token);
    out
  }

  pub fn make_set_nfa(nsymbols: usize, accepted: &BTreeSet<SymbolId>, token: TokenId) -> Self {
    let mut out = FiniteAutomaton::new(nsymbols, true, 2);
    let start_state = out.add_state();
    let accept_state = out.add_state();
    for &symbol in accepted {
      out.add_transition(start_state, symbol, accept_state);
    }
    out.add_accept(accept_state, token);
    out
  }

  // endregion

  // region Combinators

  /// `a | b`: a fresh non-accepting start with epsilon edges into both.
  pub fn unite(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Self {
    let nsymbols = a.nsymbols();
    let mut out = FiniteAutomaton::new(nsymbols, false, 1 + a.nstates() + b.nstates());
    let start_state = out.add_state();
    let a_offset = out.nstates();
    out.append_states(a);
    let b_offset = out.nstates();
    out.append_states(b);
    let epsilon0 = out.epsilon0();
    let epsilon1 = out.epsilon1();
    out.add_transition(start_state, epsilon0, a_offset);
    out.add_transition(start_state, epsilon1, b_offset);
    out
  }

  /// `a b`: a's accepting states lose their mark and gain an epsilon into
  /// b's start; b's accepting states are restamped with `token`.
  pub fn concat(a: &FiniteAutomaton, b: &FiniteAutomaton, token: TokenId) -> Self {
    let nsymbols = a.nsymbols();
    let mut out = FiniteAutomaton::new(nsymbols, false, a.nstates() + b.nstates());
    out.append_states(a);
    let b_offset = out.nstates();
    out.append_states(b);
    let epsilon0 = out.epsilon0();
    for i in 0..a.nstates() {
      if a.accepts(i) != NO_TOKEN {
        out.add_transition(i, epsilon0, b_offset);
        out.remove_accept(i);
      }
    }
    for i in 0..b.nstates() {
      if b.accepts(i) != NO_TOKEN {
        out.add_accept(i + b_offset, token);
      }
    }
    out
  }

  /// `a+`: a fresh accept state; old accepting states point at it and loop
  /// back to the start, losing their own mark. Accepting states keep no
  /// epsilon edges.
  pub fn plus(a: &FiniteAutomaton, token: TokenId) -> Self {
    let mut out = FiniteAutomaton::new(a.nsymbols(), false, a.nstates() + 1);
    out.append_states(a);
    let new_accept_state = out.add_state();
    out.add_accept(new_accept_state, token);
    let epsilon0 = out.epsilon0();
    let epsilon1 = out.epsilon1();
    for i in 0..a.nstates() {
      if a.accepts(i) != NO_TOKEN {
        out.add_transition(i, epsilon0, new_accept_state);
        out.add_transition(i, epsilon1, 0);
        out.remove_accept(i);
      }
    }
    out
  }

  /// `a?`: fresh start and accept; the start bypasses `a` through an
  /// epsilon0 chain threaded through every old accepting state.
  pub fn maybe(a: &FiniteAutomaton, token: TokenId) -> Self {
    let mut out = FiniteAutomaton::new(a.nsymbols(), false, a.nstates() + 2);
    let new_start_state = out.add_state();
    let offset = out.nstates();
    out.append_states(a);
    let new_accept_state = out.add_state();
    let epsilon0 = out.epsilon0();
    let epsilon1 = out.epsilon1();
    out.add_transition(new_start_state, epsilon1, offset);
    /* every state has a single epsilon0 slot, so the new start, the old
       accepting states and the new accept form an epsilon0 linked list */
    let mut last = new_start_state;
    for i in 0..a.nstates() {
      if a.accepts(i) != NO_TOKEN {
        out.add_transition(last, epsilon0, i + offset);
        out.remove_accept(i + offset);
        last = i + offset;
      }
    }
    out.add_transition(last, epsilon0, new_accept_state);
    out.add_accept(new_accept_state, token);
    out
  }

  /// `a*` is `(a+)?`.
  pub fn star(a: &FiniteAutomaton, token: TokenId) -> Self {
    Self::maybe(&Self::plus(a, token), token)
  }

  // endregion

  // region Determinization and minimization

  /// Powerset construction, NFA -> DFA. Each DFA state is the epsilon
  /// closure of a set of NFA states; when several member states accept,
  /// the minimum token id wins.
  pub fn make_deterministic(nfa: &FiniteAutomaton) -> Self {
    if nfa.is_deterministic {
      return nfa.clone();
    }
    let mut out = FiniteAutomaton::new(nfa.nsymbols(), true, 0);
    let mut sets: Vec<Vec<usize>> = Vec::new();
    let mut set2state: HashMap<Vec<usize>, usize> = HashMap::new();
    let start_set = nfa.epsilon_closure([0].into_iter().collect());
    let start_vec: Vec<usize> = start_set.into_iter().collect();
    set2state.insert(start_vec.clone(), out.add_state());
    sets.push(start_vec);
    let mut front = 0;
    while front < sets.len() {
      let state = front;
      front += 1;
      for symbol in 0..nfa.nsymbols() {
        let mut next_set = BTreeSet::new();
        for &nfa_state in &sets[state] {
          let next = nfa.step(nfa_state, symbol);
          if next != NO_STATE {
            next_set.insert(next as usize);
          }
        }
        if next_set.is_empty() {
          continue;
        }
        let next_vec: Vec<usize> = nfa.epsilon_closure(next_set).into_iter().collect();
        let next_state = match set2state.get(&next_vec) {
          Some(&existing) => existing,
          None => {
            let fresh = out.add_state();
            set2state.insert(next_vec.clone(), fresh);
            sets.push(next_vec);
            fresh
          }
        };
        out.add_transition(state, symbol, next_state);
      }
      let mut min_accepted = NO_TOKEN;
      for &nfa_state in &sets[state] {
        let nfa_token = nfa.accepts(nfa_state);
        if nfa_token == NO_TOKEN {
          continue;
        }
        if min_accepted == NO_TOKEN || nfa_token < min_accepted {
          min_accepted = nfa_token;
        }
      }
      if min_accepted != NO_TOKEN {
        out.add_accept(state, min_accepted);
      }
    }
    out
  }

  fn epsilon_closure(&self, mut set: BTreeSet<usize>) -> BTreeSet<usize> {
    let mut queue: Vec<usize> = set.iter().copied().collect();
    while let Some(state) = queue.pop() {
      for epsilon in [self.epsilon0(), self.epsilon1()] {
        let next = self.step(state, epsilon);
        if next == NO_STATE {
          continue;
        }
        if set.insert(next as usize) {
          queue.push(next as usize);
        }
      }
    }
    set
  }

  /// One pass of partition refinement: states whose accept token and entire
  /// transition row coincide collapse into one.
  fn simplify_once(fa: &FiniteAutomaton) -> Self {
    let mut row2simple: HashMap<(TokenId, Vec<StateId>), usize> = HashMap::new();
    let mut state2simple = vec![0usize; fa.nstates()];
    let mut representatives: Vec<usize> = Vec::new();
    for state in 0..fa.nstates() {
      let ncols = fa.ncols();
      let row = fa.table[state * ncols..(state + 1) * ncols].to_vec();
      let key = (fa.accepts(state), row);
      let next_id = representatives.len();
      let simple = *row2simple.entry(key).or_insert_with(|| {
        representatives.push(state);
        next_id
      });
      state2simple[state] = simple;
    }
    let mut out = FiniteAutomaton::new(fa.nsymbols(), fa.is_deterministic, representatives.len());
    for _ in 0..representatives.len() {
      out.add_state();
    }
    for (simple, &state) in representatives.iter().enumerate() {
      for symbol in 0..fa.ncols() {
        let next_state = fa.step(state, symbol);
        if next_state == NO_STATE {
          continue;
        }
        out.add_transition(simple, symbol, state2simple[next_state as usize]);
      }
      let token = fa.accepts(state);
      if token != NO_TOKEN {
        out.add_accept(simple, token);
      }
    }
    out
  }

  /// Fixpoint of `simplify_once`. Terminates because the state count
  /// strictly decreases; one or two passes suffice in practice.
  pub fn simplify(fa: &FiniteAutomaton) -> Self {
    let mut out = Self::simplify_once(fa);
    let mut passes = 1;
    let mut nstates = fa.nstates();
    while out.nstates() < nstates {
      nstates = out.nstates();
      out = Self::simplify_once(&out);
      passes += 1;
    }
    if passes > 2 {
      debug!("simplify took {} passes", passes);
    }
    out
  }

  // endregion

  /// Clears every outgoing transition of every accepting state. Used when
  /// synthesizing a regex for the first occurrence of a pattern.
  pub fn remove_transitions_from_accepting(fa: &FiniteAutomaton) -> Self {
    let mut out = fa.clone();
    let ncols = out.ncols();
    for state in 0..out.nstates() {
      if out.accepts(state) == NO_TOKEN {
        continue;
      }
      for symbol in 0..ncols {
        out.table[state * ncols + symbol] = NO_STATE;
      }
    }
    out
  }
}

// region Character-level helpers

pub fn make_char_single_nfa(c: char, token: TokenId) -> FiniteAutomaton {
  let symbol = chartab::get_symbol(c);
  FiniteAutomaton::make_range_nfa(NCHARS, symbol, symbol, token)
}

pub fn make_char_range_nfa(range_start: char, range_end: char, token: TokenId) -> FiniteAutomaton {
  FiniteAutomaton::make_range_nfa(
    NCHARS,
    chartab::get_symbol(range_start),
    chartab::get_symbol(range_end),
    token,
  )
}

pub fn make_char_set_nfa(accepted: &BTreeSet<char>, token: TokenId) -> FiniteAutomaton {
  let symbol_set: BTreeSet<SymbolId> = accepted.iter().map(|&c| chartab::get_symbol(c)).collect();
  FiniteAutomaton::make_set_nfa(NCHARS, &symbol_set, token)
}

// endregion

impl Display for FiniteAutomaton {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.is_deterministic {
      write!(f, "dfa ")?;
    } else {
      write!(f, "nfa ")?;
    }
    writeln!(f, "{} states {} symbols", self.nstates(), self.nsymbols())?;
    for state in 0..self.nstates() {
      for symbol in 0..self.nsymbols() {
        let next_state = self.step(state, symbol);
        if next_state != NO_STATE {
          writeln!(f, "({}, {}) -> {}", state, symbol, next_state)?;
        }
      }
      if !self.is_deterministic {
        for (i, epsilon) in [self.epsilon0(), self.epsilon1()].into_iter().enumerate() {
          let next_state = self.step(state, epsilon);
          if next_state != NO_STATE {
            writeln!(f, "({}, eps{}) -> {}", state, i, next_state)?;
          }
        }
      }
      let token = self.accepts(state);
      if token != NO_TOKEN {
        writeln!(f, "{} accepts {}", state, token)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dfa_for(fa: &FiniteAutomaton) -> FiniteAutomaton {
    FiniteAutomaton::simplify(&FiniteAutomaton::make_deterministic(fa))
  }

  #[test]
  fn single_char() {
    let fa = make_char_single_nfa('a', 7);
    assert_eq!(fa.accepts_string("a"), 7);
    assert_eq!(fa.accepts_string("b"), NO_TOKEN);
    assert_eq!(fa.accepts_string(""), NO_TOKEN);
    assert_eq!(fa.accepts_string("aa"), NO_TOKEN);
  }

  #[test]
  fn concat_restamps_token() {
    let a = make_char_single_nfa('a', 0);
    let b = make_char_single_nfa('b', 0);
    let ab = dfa_for(&FiniteAutomaton::concat(&a, &b, 3));
    assert_eq!(ab.accepts_string("ab"), 3);
    assert_eq!(ab.accepts_string("a"), NO_TOKEN);
    assert_eq!(ab.accepts_string("ba"), NO_TOKEN);
  }

  #[test]
  fn union_prefers_lowest_token() {
    let a = make_char_single_nfa('x', 2);
    let b = make_char_single_nfa('x', 5);
    let dfa = dfa_for(&FiniteAutomaton::unite(&a, &b));
    assert_eq!(dfa.accepts_string("x"), 2);
  }

  #[test]
  fn star_accepts_empty_and_repeats() {
    let a = make_char_single_nfa('a', 0);
    let dfa = dfa_for(&FiniteAutomaton::star(&a, 0));
    assert_eq!(dfa.accepts_string(""), 0);
    assert_eq!(dfa.accepts_string("a"), 0);
    assert_eq!(dfa.accepts_string("aaaa"), 0);
    assert_eq!(dfa.accepts_string("b"), NO_TOKEN);
  }

  #[test]
  fn plus_rejects_empty() {
    let a = make_char_single_nfa('a', 0);
    let dfa = dfa_for(&FiniteAutomaton::plus(&a, 0));
    assert_eq!(dfa.accepts_string(""), NO_TOKEN);
    assert_eq!(dfa.accepts_string("aaa"), 0);
  }

  #[test]
  fn maybe_accepts_zero_or_one() {
    let a = make_char_single_nfa('a', 0);
    let dfa = dfa_for(&FiniteAutomaton::maybe(&a, 0));
    assert_eq!(dfa.accepts_string(""), 0);
    assert_eq!(dfa.accepts_string("a"), 0);
    assert_eq!(dfa.accepts_string("aa"), NO_TOKEN);
  }

  #[test]
  fn determinize_removes_epsilons_and_preserves_language() {
    let a = make_char_single_nfa('a', 0);
    let b = make_char_single_nfa('b', 0);
    let nfa = FiniteAutomaton::unite(&a, &b);
    assert!(!nfa.is_deterministic());
    let dfa = FiniteAutomaton::make_deterministic(&nfa);
    assert!(dfa.is_deterministic());
    assert_eq!(dfa.accepts_string("a"), 0);
    assert_eq!(dfa.accepts_string("b"), 0);
    assert_eq!(dfa.accepts_string("ab"), NO_TOKEN);
  }

  #[test]
  fn simplify_is_idempotent() {
    let a = make_char_single_nfa('a', 0);
    let b = make_char_single_nfa('a', 0);
    let dfa = FiniteAutomaton::make_deterministic(&FiniteAutomaton::unite(&a, &b));
    let once = FiniteAutomaton::simplify(&dfa);
    assert!(once.nstates() <= dfa.nstates());
    let twice = FiniteAutomaton::simplify(&once);
    assert_eq!(once.nstates(), twice.nstates());
    assert_eq!(once.accepts_string("a"), 0);
  }

  #[test]
  fn removing_accept_transitions_freezes_matches() {
    let a = make_char_single_nfa('a', 0);
    let plus = dfa_for(&FiniteAutomaton::plus(&a, 0));
    let frozen = FiniteAutomaton::remove_transitions_from_accepting(&plus);
    assert_eq!(frozen.accepts_string("a"), 0);
    assert_eq!(frozen.accepts_string("aa"), NO_TOKEN);
  }
}
