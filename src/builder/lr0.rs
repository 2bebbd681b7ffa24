/*!

LR(0) machine construction. A configuration is a production with a dot
position; a state is the closure of a set of configurations, identified by
its sorted configuration list. Shift actions carry a singleton context (the
transition symbol, possibly a nonterminal, which later becomes a GOTO);
reduce actions start out with the LR(0) default context of every terminal,
except the accept production which reduces only on end-of-input.

*/

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::builder::graph::ParserGraph;
use crate::grammar::Grammar;
use crate::{ProductionId, SymbolId};

/// A marked production: `0 <= dot <= |rhs|`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Config {
  pub production: ProductionId,
  pub dot: usize,
}

pub type Configs = Vec<Config>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StateAction {
  Shift { next_state: usize },
  Reduce { production: ProductionId },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActionInProgress {
  pub action: StateAction,
  pub context: BTreeSet<SymbolId>, //< terminals (or the transition symbol, for shifts)
}

#[derive(Debug, Clone, Default)]
pub struct StateInProgress {
  pub configs: Vec<usize>, //< sorted indices into the flat config list
  pub actions: Vec<ActionInProgress>,
}

/// Expands every production into its `|rhs| + 1` configurations. Configs of
/// one production are consecutive, so the one-step advance of config `i` is
/// config `i + 1`.
pub fn make_configs(grammar: &Grammar) -> Configs {
  let mut configs = Configs::new();
  for (i, production) in grammar.productions.iter().enumerate() {
    for dot in 0..=production.rhs.len() {
      configs.push(Config { production: i, dot });
    }
  }
  configs
}

/// Graph from each LHS symbol to the dot-0 configs of its productions.
pub fn lhs_to_start_configs(configs: &Configs, grammar: &Grammar) -> ParserGraph {
  let mut lhs2sc = ParserGraph::with_nnodes(grammar.nsymbols);
  for (c_i, config) in configs.iter().enumerate() {
    if config.dot > 0 {
      continue;
    }
    let production = &grammar.productions[config.production];
    lhs2sc.add_edge(production.lhs, c_i);
  }
  lhs2sc
}

/// Graph from each LHS symbol to its production indices.
pub fn productions_by_lhs(grammar: &Grammar) -> ParserGraph {
  let mut lhs2prods = ParserGraph::with_nnodes(grammar.nsymbols);
  for (prod_i, production) in grammar.productions.iter().enumerate() {
    lhs2prods.add_edge(production.lhs, prod_i);
  }
  lhs2prods
}

/// Epsilon closure over configurations: whenever a nonterminal follows the
/// dot, all of its start configs join the state.
fn close(state: &mut StateInProgress, configs: &Configs, grammar: &Grammar, lhs2sc: &ParserGraph) {
  let mut config_q: VecDeque<usize> = VecDeque::new();
  let mut config_set: BTreeSet<usize> = BTreeSet::new();
  for &config_i in &state.configs {
    config_q.push_back(config_i);
    assert!(config_set.insert(config_i));
  }
  while let Some(config_i) = config_q.pop_front() {
    let config = &configs[config_i];
    let production = &grammar.productions[config.production];
    if config.dot == production.rhs.len() {
      continue;
    }
    let symbol_after_dot = production.rhs[config.dot];
    if grammar.is_terminal(symbol_after_dot) {
      continue;
    }
    for &sc in lhs2sc.edges(symbol_after_dot) {
      if config_set.insert(sc) {
        config_q.push_back(sc);
      }
    }
  }
  state.configs = config_set.into_iter().collect();
}

fn add_reduction_actions(states: &mut [StateInProgress], configs: &Configs, grammar: &Grammar) {
  for state in states.iter_mut() {
    for &config_i in &state.configs {
      let config = &configs[config_i];
      let production = &grammar.productions[config.production];
      if config.dot != production.rhs.len() {
        continue;
      }
      state.actions.push(ActionInProgress {
        action: StateAction::Reduce { production: config.production },
        context: BTreeSet::new(),
      });
    }
  }
}

fn set_lr0_contexts(states: &mut [StateInProgress], grammar: &Grammar) {
  for state in states.iter_mut() {
    for action in &mut state.actions {
      let production = match action.action {
        StateAction::Reduce { production } => production,
        StateAction::Shift { .. } => continue,
      };
      if production == grammar.accept_production() {
        action.context.insert(grammar.end_terminal());
      } else {
        for terminal in 0..grammar.nterminals {
          action.context.insert(terminal);
        }
      }
    }
  }
}

pub fn build_lr0_parser(
  configs: &Configs, grammar: &Grammar, lhs2sc: &ParserGraph,
) -> Vec<StateInProgress> {
  let mut states: Vec<StateInProgress> = Vec::new();
  let mut configs2state: HashMap<Vec<usize>, usize> = HashMap::new();
  let mut state_q: VecDeque<usize> = VecDeque::new();
  {
    // there is exactly one start config for the accept symbol
    let start_accept_config = lhs2sc.edges(grammar.accept_nonterminal())[0];
    let mut start_state = StateInProgress::default();
    start_state.configs.push(start_accept_config);
    close(&mut start_state, configs, grammar, lhs2sc);
    configs2state.insert(start_state.configs.clone(), 0);
    state_q.push_back(0);
    states.push(start_state);
  }
  while let Some(state_i) = state_q.pop_front() {
    let mut transition_symbols: BTreeSet<SymbolId> = BTreeSet::new();
    for &config_i in &states[state_i].configs {
      let config = &configs[config_i];
      let production = &grammar.productions[config.production];
      if config.dot == production.rhs.len() {
        continue;
      }
      transition_symbols.insert(production.rhs[config.dot]);
    }
    for transition_symbol in transition_symbols {
      let mut next_state = StateInProgress::default();
      for &config_i in &states[state_i].configs {
        let config = &configs[config_i];
        let production = &grammar.productions[config.production];
        if config.dot == production.rhs.len() {
          continue;
        }
        if production.rhs[config.dot] != transition_symbol {
          continue;
        }
        next_state.configs.push(config_i + 1);
      }
      close(&mut next_state, configs, grammar, lhs2sc);
      let next_state_i = match configs2state.get(&next_state.configs) {
        Some(&existing) => existing,
        None => {
          let fresh = states.len();
          configs2state.insert(next_state.configs.clone(), fresh);
          state_q.push_back(fresh);
          states.push(next_state);
          fresh
        }
      };
      let mut context = BTreeSet::new();
      context.insert(transition_symbol);
      states[state_i].actions.push(ActionInProgress {
        action: StateAction::Shift { next_state: next_state_i },
        context,
      });
    }
  }
  add_reduction_actions(&mut states, configs, grammar);
  set_lr0_contexts(&mut states, grammar);
  states
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Production;
  use smallvec::SmallVec;

  /// S ::= a S b | <empty>, augmented.
  fn toy_grammar() -> Grammar {
    let mut g = Grammar {
      nsymbols: 3,
      nterminals: 2,
      productions: vec![
        Production { lhs: 2, rhs: SmallVec::from_slice(&[0, 2, 1]) },
        Production { lhs: 2, rhs: SmallVec::new() },
      ],
      symbol_names: vec!["a".into(), "b".into(), "S".into()],
      ignored_terminals: vec![],
    };
    g.add_end_terminal();
    g.add_accept_production();
    g
  }

  #[test]
  fn config_expansion() {
    let g = toy_grammar();
    let configs = make_configs(&g);
    // 4 + 1 + 3 configs for rhs lengths 3, 0, 2
    assert_eq!(configs.len(), 9);
    assert_eq!(configs[0], Config { production: 0, dot: 0 });
    assert_eq!(configs[3], Config { production: 0, dot: 3 });
    assert_eq!(configs[4], Config { production: 1, dot: 0 });
  }

  #[test]
  fn start_state_closes_over_start_symbol() {
    let g = toy_grammar();
    let configs = make_configs(&g);
    let lhs2sc = lhs_to_start_configs(&configs, &g);
    let states = build_lr0_parser(&configs, &g, &lhs2sc);
    // start state holds ACCEPT ::= . S EOF plus both S start configs
    let start = &states[0];
    assert_eq!(start.configs.len(), 3);
    // dedup: shifting `a` twice in a row reuses the same successor
    let mut shift_targets = Vec::new();
    for state in &states {
      for action in &state.actions {
        if let StateAction::Shift { next_state } = action.action {
          shift_targets.push(next_state);
        }
      }
    }
    assert!(!shift_targets.is_empty());
  }

  #[test]
  fn lr0_reduce_contexts_default_to_all_terminals() {
    let g = toy_grammar();
    let configs = make_configs(&g);
    let lhs2sc = lhs_to_start_configs(&configs, &g);
    let states = build_lr0_parser(&configs, &g, &lhs2sc);
    for state in &states {
      for action in &state.actions {
        if let StateAction::Reduce { production } = action.action {
          if production == g.accept_production() {
            assert_eq!(action.context.len(), 1);
            assert!(action.context.contains(&g.end_terminal()));
          } else {
            assert_eq!(action.context.len(), g.nterminals);
          }
        }
      }
    }
  }
}
