/*!

The compact output of LALR(1) construction: a per-state, per-terminal action
table and a per-state, per-nonterminal GOTO table, both dense and row-major.

*/

use crate::grammar::GrammarPtr;
use crate::{ProductionId, StateId, NO_STATE};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
  Shift { next_state: usize },
  Reduce { production: ProductionId },
  /// Discard the token; emitted for ignored terminals.
  Skip,
  /// The reduce of the accept production: parsing finished.
  Accept,
}

#[derive(Debug, Clone)]
pub struct ShiftReduceTables {
  grammar: GrammarPtr,
  nstates: usize,
  terminal_actions: Vec<Option<Action>>, //< nstates x nterminals
  nonterminal_gotos: Vec<StateId>,       //< nstates x nnonterminals, -1 is "none"
}

impl ShiftReduceTables {
  pub fn new(grammar: GrammarPtr, nstates: usize) -> Self {
    let nterminals = grammar.nterminals;
    let nnonterminals = grammar.nnonterminals();
    ShiftReduceTables {
      grammar,
      nstates,
      terminal_actions: vec![None; nstates * nterminals],
      nonterminal_gotos: vec![NO_STATE; nstates * nnonterminals],
    }
  }

  pub fn grammar(&self) -> &GrammarPtr {
    &self.grammar
  }

  pub fn nstates(&self) -> usize {
    self.nstates
  }

  pub fn terminal_action(&self, state: usize, terminal: usize) -> Option<Action> {
    self.terminal_actions[state * self.grammar.nterminals + terminal]
  }

  pub fn nonterminal_goto(&self, state: usize, nonterminal: usize) -> StateId {
    self.nonterminal_gotos[state * self.grammar.nnonterminals() + nonterminal]
  }

  pub(crate) fn add_terminal_action(&mut self, state: usize, terminal: usize, action: Action) {
    let cell = &mut self.terminal_actions[state * self.grammar.nterminals + terminal];
    assert!(cell.is_none(), "duplicate action for state {} terminal {}", state, terminal);
    *cell = Some(action);
  }

  /// Skips shadow whatever the LR(0) default contexts put on an ignored
  /// terminal, so this overwrite is deliberate.
  pub(crate) fn set_skip(&mut self, state: usize, terminal: usize) {
    self.terminal_actions[state * self.grammar.nterminals + terminal] = Some(Action::Skip);
  }

  pub(crate) fn add_nonterminal_action(
    &mut self, state: usize, nonterminal: usize, next_state: usize,
  ) {
    let cell = &mut self.nonterminal_gotos[state * self.grammar.nnonterminals() + nonterminal];
    assert!(*cell == NO_STATE, "duplicate GOTO for state {} nonterminal {}", state, nonterminal);
    *cell = next_state as StateId;
  }
}
