/*!

Top level of LALR(1) table construction: build the LR(0) machine, test every
state for adequacy, and when inadequate states exist resolve their reduce
lookaheads by lane tracing. A grammar whose machine is adequate straight
away is LR(0) and keeps its default contexts.

*/

pub mod first;
pub mod graph;
pub mod lanes;
pub mod lr0;

use std::fmt::Write;

use log::debug;

use crate::builder::first::compute_first_sets;
use crate::builder::graph::ParserGraph;
use crate::builder::lanes::{
  form_state_configs, form_states_to_state_configs, make_originator_graph, LaneTracer, StateConfig,
};
use crate::builder::lr0::{
  build_lr0_parser, lhs_to_start_configs, make_configs, productions_by_lhs, Configs, StateAction,
  StateInProgress,
};
use crate::error::BuildError;
use crate::grammar::GrammarPtr;
use crate::tables::{Action, ShiftReduceTables};

pub struct ParserInProgress {
  pub grammar: GrammarPtr,
  pub configs: Configs,
  pub states: Vec<StateInProgress>,
  pub state_configs: Vec<StateConfig>,
  pub states2state_configs: ParserGraph,
}

/// A state is adequate when its actions have pairwise disjoint contexts.
/// Shifts on nonterminals are GOTO entries and never conflict. When a
/// summary sink is given, each state's first conflict is described into it.
fn determine_adequate_states(
  states: &[StateInProgress], grammar: &GrammarPtr, mut summary: Option<&mut String>,
) -> Vec<bool> {
  let mut out = vec![true; states.len()];
  for (s_i, state) in states.iter().enumerate() {
    'state: for (a_i, action) in state.actions.iter().enumerate() {
      if let StateAction::Shift { .. } = action.action {
        if grammar.is_nonterminal(*action.context.iter().next().unwrap()) {
          continue;
        }
      }
      for action2 in &state.actions[a_i + 1..] {
        if let StateAction::Shift { .. } = action2.action {
          if grammar.is_nonterminal(*action2.context.iter().next().unwrap()) {
            continue;
          }
        }
        if action.context.intersection(&action2.context).next().is_none() {
          continue;
        }
        if let Some(sink) = summary.as_deref_mut() {
          let describe = |a: &StateAction| match a {
            StateAction::Shift { .. } => "shift".to_string(),
            StateAction::Reduce { production } => {
              format!("reduce {}", grammar.production_string(*production))
            }
          };
          let witness = *action.context.intersection(&action2.context).next().unwrap();
          let _ = writeln!(
            sink,
            "conflict in state {} on {}: {} vs {}",
            s_i,
            grammar.symbol_name(witness),
            describe(&action.action),
            describe(&action2.action),
          );
        }
        out[s_i] = false;
        break 'state;
      }
    }
  }
  out
}

pub fn build_lalr1_parser(grammar: GrammarPtr) -> Result<ParserInProgress, BuildError> {
  let configs = make_configs(&grammar);
  let lhs2cs = lhs_to_start_configs(&configs, &grammar);
  debug!("building the LR(0) machine");
  let mut states = build_lr0_parser(&configs, &grammar, &lhs2cs);
  let state_configs = form_state_configs(&states);
  let states2scs = form_states_to_state_configs(&state_configs, &states);
  debug!("checking adequacy of the LR(0) machine");
  let adequate = determine_adequate_states(&states, &grammar, None);
  if adequate.iter().all(|&a| a) {
    debug!("the grammar is LR(0)");
    return Ok(ParserInProgress {
      grammar,
      configs,
      states,
      state_configs,
      states2state_configs: states2scs,
    });
  }
  let (contexts, complete) = {
    let first_sets = compute_first_sets(&grammar, &productions_by_lhs(&grammar));
    let og =
      make_originator_graph(&state_configs, &states, &states2scs, &configs, &grammar);
    let mut tracer =
      LaneTracer::new(&state_configs, &states, &states2scs, &configs, &grammar, &first_sets);
    /* accepting state-configs are born complete, with end-of-input as their
       whole context */
    let accept_production = grammar.accept_production();
    for (sc_i, sc) in state_configs.iter().enumerate() {
      let config_i = states[sc.state].configs[sc.config_in_state];
      if configs[config_i].production == accept_production {
        tracer.complete[sc_i] = true;
        tracer.contexts[sc_i].insert(grammar.end_terminal());
      }
    }
    /* trace a lane for every reduction inside an inadequate state */
    for (s_i, state) in states.iter().enumerate() {
      if adequate[s_i] {
        continue;
      }
      for (cis_i, &config_i) in state.configs.iter().enumerate() {
        let config = &configs[config_i];
        if config.dot != grammar.productions[config.production].rhs.len() {
          continue;
        }
        let zeta_j_addr = states2scs.edges(s_i)[cis_i];
        tracer.compute_context_set(zeta_j_addr, &og)?;
      }
    }
    (tracer.contexts, tracer.complete)
  };
  /* push the traced contexts back into every completed reduction, even in
     states that were already adequate */
  for (s_i, state) in states.iter_mut().enumerate() {
    for (cis_i, &config_i) in state.configs.iter().enumerate() {
      let sc_i = states2scs.edges(s_i)[cis_i];
      if !complete[sc_i] {
        continue;
      }
      let config = &configs[config_i];
      if config.dot != grammar.productions[config.production].rhs.len() {
        continue;
      }
      for action in &mut state.actions {
        if let StateAction::Reduce { production } = action.action {
          if production == config.production {
            action.context = contexts[sc_i].clone();
          }
        }
      }
    }
  }
  debug!("checking adequacy of the LALR(1) machine");
  let mut summary = String::new();
  let adequate = determine_adequate_states(&states, &grammar, Some(&mut summary));
  if !adequate.iter().all(|&a| a) {
    return Err(BuildError::NotLalr1 { summary });
  }
  debug!("the grammar is LALR(1)");
  Ok(ParserInProgress {
    grammar,
    configs,
    states,
    state_configs,
    states2state_configs: states2scs,
  })
}

/// Flattens the resolved states into the dense shift-reduce tables. The
/// reduce of the accept production becomes the accept action, and every
/// ignored terminal gets a skip entry in every state, shadowing whatever an
/// LR(0) default context put there.
pub fn accept_parser(pip: &ParserInProgress) -> ShiftReduceTables {
  let grammar = &pip.grammar;
  let mut out = ShiftReduceTables::new(grammar.clone(), pip.states.len());
  for (s_i, state) in pip.states.iter().enumerate() {
    for action in &state.actions {
      let context_symbol = *action.context.iter().next().unwrap();
      match action.action {
        StateAction::Shift { next_state } if grammar.is_nonterminal(context_symbol) => {
          out.add_nonterminal_action(s_i, grammar.as_nonterminal(context_symbol), next_state);
        }
        _ => {
          for &terminal in &action.context {
            assert!(grammar.is_terminal(terminal));
            let table_action = match action.action {
              StateAction::Shift { next_state } => Action::Shift { next_state },
              StateAction::Reduce { production } => {
                if production == grammar.accept_production() {
                  Action::Accept
                } else {
                  Action::Reduce { production }
                }
              }
            };
            out.add_terminal_action(s_i, terminal, table_action);
          }
        }
      }
    }
    for &terminal in &grammar.ignored_terminals {
      assert!(grammar.is_terminal(terminal));
      out.set_skip(s_i, terminal);
    }
  }
  out
}
