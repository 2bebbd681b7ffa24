/*!

Lookahead resolution by David Pager's lane-tracing algorithm:

  Pager, David.
  "The lane-tracing algorithm for constructing LR(k) parsers
   and ways of enhancing its efficiency."
  Information Sciences 12.1 (1977): 19-42.

The identifiers here follow the terminology of that paper, except where
FIRST-set terminology comes in (Pager does not go into detail about it).

Everything operates on state-configurations: a specific configuration
occurrence inside a specific state, addressed by a flat integer. Lookahead
contexts flow backward along a configuration's originators, discovered
through the transition-predecessor and immediate-predecessor graphs.

*/

use std::collections::{BTreeSet, VecDeque};

use log::trace;

use crate::builder::first::{
  first_of_string, has_nullable, has_terminal, terminals_of, FirstSet,
};
use crate::builder::graph::ParserGraph;
use crate::builder::lr0::{Config, Configs, StateAction, StateInProgress};
use crate::error::BuildError;
use crate::grammar::{Grammar, RhsString};
use crate::SymbolId;

/// A configuration occurrence: `config_in_state` indexes the state's sorted
/// config list.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StateConfig {
  pub state: usize,
  pub config_in_state: usize,
}

pub fn form_state_configs(states: &[StateInProgress]) -> Vec<StateConfig> {
  let mut out = Vec::new();
  for (i, state) in states.iter().enumerate() {
    for j in 0..state.configs.len() {
      out.push(StateConfig { state: i, config_in_state: j });
    }
  }
  out
}

pub fn form_states_to_state_configs(
  scs: &[StateConfig], states: &[StateInProgress],
) -> ParserGraph {
  let mut out = ParserGraph::with_nnodes(states.len());
  for (i, sc) in scs.iter().enumerate() {
    out.add_edge(sc.state, i);
  }
  out
}

/// Within a single state: if a nonterminal S follows some config's dot, each
/// dot-0 config of an S-production is an immediate predecessor of it.
fn make_immediate_predecessor_graph(
  scs: &[StateConfig], states: &[StateInProgress], states2scs: &ParserGraph, configs: &Configs,
  grammar: &Grammar,
) -> ParserGraph {
  let mut out = ParserGraph::with_nnodes(scs.len());
  for (s_i, state) in states.iter().enumerate() {
    for (cis_i, &config_i) in state.configs.iter().enumerate() {
      let config = &configs[config_i];
      let production = &grammar.productions[config.production];
      if config.dot == production.rhs.len() {
        continue;
      }
      let s = production.rhs[config.dot];
      if grammar.is_terminal(s) {
        continue;
      }
      for (cis_j, &config_j) in state.configs.iter().enumerate() {
        let config2 = &configs[config_j];
        if config2.dot != 0 {
          continue;
        }
        if grammar.productions[config2.production].lhs == s {
          let sc_i = states2scs.edges(s_i)[cis_i];
          let sc_j = states2scs.edges(s_i)[cis_j];
          out.add_edge(sc_j, sc_i);
        }
      }
    }
  }
  out
}

/// Across a shift edge `state --X--> state'`: the one-step advance of a
/// config is its transition predecessor.
fn find_transition_predecessors(
  scs: &[StateConfig], states: &[StateInProgress], states2scs: &ParserGraph, configs: &Configs,
  grammar: &Grammar,
) -> ParserGraph {
  let mut out = ParserGraph::with_nnodes(scs.len());
  for (state_i, state) in states.iter().enumerate() {
    for action in &state.actions {
      let state_j = match action.action {
        StateAction::Shift { next_state } => next_state,
        StateAction::Reduce { .. } => continue,
      };
      assert_eq!(action.context.len(), 1);
      let symbol = *action.context.iter().next().unwrap();
      let state2 = &states[state_j];
      for (cis_i, &config_i) in state.configs.iter().enumerate() {
        let config = &configs[config_i];
        for (cis_j, &config_j) in state2.configs.iter().enumerate() {
          let config2 = &configs[config_j];
          if config.production == config2.production && config.dot + 1 == config2.dot {
            let production = &grammar.productions[config.production];
            if production.rhs[config.dot] == symbol {
              let sc_i = states2scs.edges(state_i)[cis_i];
              let sc_j = states2scs.edges(state_j)[cis_j];
              out.add_edge(sc_j, sc_i);
            }
          }
        }
      }
    }
  }
  out
}

/// Breadth-first search through the transition predecessor graph, followed
/// by a single hop along the immediate predecessor graph.
pub fn make_originator_graph(
  scs: &[StateConfig], states: &[StateInProgress], states2scs: &ParserGraph, configs: &Configs,
  grammar: &Grammar,
) -> ParserGraph {
  let ipg = make_immediate_predecessor_graph(scs, states, states2scs, configs, grammar);
  let tpg = find_transition_predecessors(scs, states, states2scs, configs, grammar);
  let mut out = ParserGraph::with_nnodes(scs.len());
  for sc_i in 0..scs.len() {
    let mut originators: BTreeSet<usize> = BTreeSet::new();
    let mut tpq: VecDeque<usize> = VecDeque::new();
    let mut tps: BTreeSet<usize> = BTreeSet::new();
    tpq.push_back(sc_i);
    tps.insert(sc_i);
    while let Some(tpp) = tpq.pop_front() {
      for &tpc in tpg.edges(tpp) {
        if tps.insert(tpc) {
          tpq.push_back(tpc);
        }
      }
      for &ip_i in ipg.edges(tpp) {
        originators.insert(ip_i);
      }
    }
    out.set_edges(sc_i, originators.into_iter().collect());
  }
  out
}

/// Entries of the LANE and STACK containers. Markers and zeros are
/// bookkeeping; only real state-config addresses carry contexts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LaneEntry {
  Sc(usize),
  Marker,
  Zero,
}

pub struct LaneTracer<'a> {
  pub scs: &'a [StateConfig],
  pub states: &'a [StateInProgress],
  pub states2scs: &'a ParserGraph,
  pub configs: &'a Configs,
  pub grammar: &'a Grammar,
  pub first_sets: &'a [FirstSet],
  pub contexts: Vec<BTreeSet<SymbolId>>, //< lookahead per state-config
  pub complete: Vec<bool>,
}

impl<'a> LaneTracer<'a> {
  pub fn new(
    scs: &'a [StateConfig], states: &'a [StateInProgress], states2scs: &'a ParserGraph,
    configs: &'a Configs, grammar: &'a Grammar, first_sets: &'a [FirstSet],
  ) -> Self {
    LaneTracer {
      scs,
      states,
      states2scs,
      configs,
      grammar,
      first_sets,
      contexts: vec![BTreeSet::new(); scs.len()],
      complete: vec![false; scs.len()],
    }
  }

  fn config_of(&self, sc_addr: usize) -> &Config {
    let sc = &self.scs[sc_addr];
    let config_i = self.states[sc.state].configs[sc.config_in_state];
    &self.configs[config_i]
  }

  /// The production symbols after the dot, skipping the symbol the dot
  /// sits on.
  fn follow_string(&self, sc_addr: usize) -> RhsString {
    let config = self.config_of(sc_addr);
    let rhs = &self.grammar.productions[config.production].rhs;
    if config.dot + 1 >= rhs.len() {
      return RhsString::new();
    }
    RhsString::from_slice(&rhs[config.dot + 1..])
  }

  /// Walks the lane backward from `zeta_pointer`, draining
  /// `contexts_generated` into every real state-config it passes; what a
  /// config already has is subtracted before moving on.
  fn context_adding_routine(
    &mut self, lane: &[LaneEntry], zeta_pointer: usize,
    contexts_generated: &mut BTreeSet<SymbolId>,
  ) {
    let mut r = zeta_pointer as isize;
    while r >= 0 && !contexts_generated.is_empty() {
      if let LaneEntry::Sc(tau_r) = lane[r as usize] {
        let existing = &self.contexts[tau_r];
        contexts_generated.retain(|t| !existing.contains(t));
        self.contexts[tau_r].extend(contexts_generated.iter().copied());
      }
      r -= 1;
    }
  }

  /// When a config that is already in the lane is revisited, markers
  /// between its position and the current top turn to zeros and reappear
  /// at the top (under the in-flight entry if the tests failed).
  fn move_markers(
    lane: &mut Vec<LaneEntry>, zeta_prime_addr: usize, zeta_pointer: usize, tests_failed: bool,
  ) {
    let loc = lane
      .iter()
      .position(|e| *e == LaneEntry::Sc(zeta_prime_addr))
      .expect("moved config must be in the lane");
    let mut r = 0;
    for i in (loc + 1)..zeta_pointer {
      if lane[i] == LaneEntry::Marker {
        r += 1;
        lane[i] = LaneEntry::Zero;
      }
    }
    if tests_failed {
      let top = lane.pop().expect("lane cannot be empty while moving markers");
      for _ in 0..r {
        lane.push(LaneEntry::Marker);
      }
      lane.push(top);
    } else {
      for _ in 0..r {
        lane.push(LaneEntry::Marker);
      }
    }
  }

  /// TRACE_FURTHER: the first failing originator continues the lane, the
  /// second displaces it behind a marker, any later ones wait on the stack.
  #[allow(clippy::too_many_arguments)]
  fn deal_with_tests_failed(
    num_originators_failed: &mut usize, first_originator_failed: &mut Option<usize>,
    zeta_prime_addr: usize, tests_failed: &mut bool, lane: &mut Vec<LaneEntry>,
    in_lane: &mut [bool], zeta_addr: usize, stack: &mut Vec<LaneEntry>,
  ) {
    match *num_originators_failed {
      0 => {
        *first_originator_failed = Some(zeta_prime_addr);
        lane.push(LaneEntry::Sc(zeta_prime_addr));
        in_lane[zeta_prime_addr] = true;
        *tests_failed = true;
      }
      1 => {
        let zeta_double_prime_addr =
          first_originator_failed.expect("a first failure must precede the second");
        debug_assert_eq!(lane[lane.len() - 1], LaneEntry::Sc(zeta_double_prime_addr));
        debug_assert_eq!(lane[lane.len() - 2], LaneEntry::Sc(zeta_addr));
        lane.pop();
        lane.push(LaneEntry::Marker);
        lane.push(LaneEntry::Sc(zeta_double_prime_addr));
        stack.push(LaneEntry::Marker);
        stack.push(LaneEntry::Sc(zeta_prime_addr));
      }
      _ => {
        stack.push(LaneEntry::Sc(zeta_prime_addr));
      }
    }
    *num_originators_failed += 1;
  }

  /// When a dot-0 config completes, its siblings for the same LHS in the
  /// same state get the same contexts without their own trace.
  fn heuristic_propagation_of_context_sets(&mut self, tau_addr: usize) {
    let tau = self.scs[tau_addr];
    let state = &self.states[tau.state];
    let config_i = state.configs[tau.config_in_state];
    let config = &self.configs[config_i];
    if config.dot != 0 {
      return;
    }
    let lhs = self.grammar.productions[config.production].lhs;
    let propagated = self.contexts[tau_addr].clone();
    for (cis_j, &config_j) in state.configs.iter().enumerate() {
      if config_j == config_i {
        continue;
      }
      let config2 = &self.configs[config_j];
      if config2.dot != 0 {
        continue;
      }
      if self.grammar.productions[config2.production].lhs != lhs {
        continue;
      }
      let tau_prime_addr = self.states2scs.edges(tau.state)[cis_j];
      self.contexts[tau_prime_addr] = propagated.clone();
      self.complete[tau_prime_addr] = true;
    }
  }

  /// The program described by the flowchart in Figure 7 of Pager's paper.
  pub fn compute_context_set(
    &mut self, zeta_j_addr: usize, originator_graph: &ParserGraph,
  ) -> Result<(), BuildError> {
    trace!("computing context set for state-config {}", zeta_j_addr);
    if self.complete[zeta_j_addr] {
      trace!("{} was already complete", zeta_j_addr);
      return Ok(());
    }
    let mut stack: Vec<LaneEntry> = Vec::new();
    // the lane needs random access and mid-insertion, so it is a plain
    // vector rather than a stack
    let mut lane: Vec<LaneEntry> = Vec::new();
    let mut in_lane = vec![false; self.scs.len()];
    lane.push(LaneEntry::Sc(zeta_j_addr));
    in_lane[zeta_j_addr] = true;
    let mut tests_failed = false;
    'outer: loop {
      let zeta_addr = match lane.last() {
        Some(LaneEntry::Sc(addr)) => *addr,
        _ => unreachable!("top of lane is always a real state-config here"),
      };
      let zeta_pointer = lane.len() - 1;
      let mut num_originators_failed = 0usize;
      let mut first_originator_failed: Option<usize> = None;
      /* DO_LOOP */
      for &zeta_prime_addr in originator_graph.edges(zeta_addr) {
        let gamma = self.follow_string(zeta_prime_addr);
        let gamma_first = first_of_string(&gamma, self.first_sets);
        if has_terminal(&gamma_first) {
          // test A
          let mut contexts_generated = terminals_of(&gamma_first);
          if has_nullable(&gamma_first) {
            if self.complete[zeta_prime_addr] {
              contexts_generated.extend(self.contexts[zeta_prime_addr].iter().copied());
              self.context_adding_routine(&lane, zeta_pointer, &mut contexts_generated);
            } else if !in_lane[zeta_prime_addr] {
              self.context_adding_routine(&lane, zeta_pointer, &mut contexts_generated);
              /* TRACE_FURTHER */
              Self::deal_with_tests_failed(
                &mut num_originators_failed,
                &mut first_originator_failed,
                zeta_prime_addr,
                &mut tests_failed,
                &mut lane,
                &mut in_lane,
                zeta_addr,
                &mut stack,
              );
            } else {
              let sc = &self.scs[zeta_prime_addr];
              return Err(BuildError::Ambiguous(format!(
                "configuration {} of state {} needs lookahead from a lane it is already part of",
                sc.config_in_state, sc.state
              )));
            }
          } else {
            self.context_adding_routine(&lane, zeta_pointer, &mut contexts_generated);
          }
        } else if self.complete[zeta_prime_addr] {
          // test B
          let mut contexts_generated = self.contexts[zeta_prime_addr].clone();
          self.context_adding_routine(&lane, zeta_pointer, &mut contexts_generated);
        } else if in_lane[zeta_prime_addr] {
          // test C
          Self::move_markers(&mut lane, zeta_prime_addr, zeta_pointer, tests_failed);
          let mut contexts_generated = self.contexts[zeta_prime_addr].clone();
          self.context_adding_routine(&lane, zeta_pointer, &mut contexts_generated);
        } else {
          Self::deal_with_tests_failed(
            &mut num_originators_failed,
            &mut first_originator_failed,
            zeta_prime_addr,
            &mut tests_failed,
            &mut lane,
            &mut in_lane,
            zeta_addr,
            &mut stack,
          );
        }
      } /* END DO_LOOP */
      if tests_failed {
        tests_failed = false;
        continue 'outer;
      }
      // LANE popping
      loop {
        match *lane.last().expect("lane cannot drain before the program ends") {
          LaneEntry::Marker => {
            // STACK popping
            loop {
              match *stack.last().expect("a marker on the lane implies a non-empty stack") {
                LaneEntry::Marker => {
                  stack.pop();
                  lane.pop();
                  break; // out of STACK popping, back into LANE popping
                }
                LaneEntry::Sc(addr) if self.complete[addr] => {
                  stack.pop();
                }
                LaneEntry::Sc(addr) => {
                  stack.pop();
                  lane.push(LaneEntry::Sc(addr));
                  in_lane[addr] = true;
                  continue 'outer;
                }
                LaneEntry::Zero => {
                  unreachable!("zeros never enter the stack")
                }
              }
            }
          }
          LaneEntry::Zero => {
            lane.pop();
          }
          LaneEntry::Sc(tau_addr) => {
            in_lane[tau_addr] = false;
            self.complete[tau_addr] = true;
            self.heuristic_propagation_of_context_sets(tau_addr);
            if lane.len() == 1 && lane[0] == LaneEntry::Sc(zeta_j_addr) {
              return Ok(());
            }
            lane.pop();
          }
        }
      }
    }
  }
}
