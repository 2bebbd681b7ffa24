/*!

DFA-to-regex synthesis by state elimination:

  Brzozowski, Janusz A., and Edward J. McCluskey.
  "Signal flow graph techniques for sequential circuit state diagrams."
  IEEE Transactions on Electronic Computers 2 (1963): 67-76.

with the vertex-ordering heuristic of:

  Delgado, Manuel, and Jose Morais.
  "Approximation to the smallest regular expression for a given regular
   language." CIAA 2004.

The output is best-effort: equivalent to the input automaton, not minimal.

*/

use crate::automaton::FiniteAutomaton;
use crate::chartab;
use crate::error::BuildError;
use crate::regex::ast::{concat, either, star, RegexTerm};
use crate::NO_TOKEN;

fn update_path(i: usize, j: usize, k: usize, l: &mut [Vec<RegexTerm>]) {
  l[i][j] = either(&l[i][j], &concat(&l[i][k], &concat(&star(&l[k][k]), &l[k][j])));
}

/// A regex accepting exactly the language of the given DFA.
pub fn from_automaton(fa: &FiniteAutomaton) -> String {
  assert!(fa.is_deterministic());
  let nstates = fa.nstates();
  let nnodes = nstates + 1; // one synthetic accepting node past the real states
  let mut l: Vec<Vec<RegexTerm>> = (0..nnodes)
    .map(|i| {
      (0..nnodes)
        .map(|j| if i == j { RegexTerm::Epsilon } else { RegexTerm::Null })
        .collect()
    })
    .collect();
  for i in 0..nstates {
    for s in 0..fa.nsymbols() {
      let j = fa.step(i, s);
      if j < 0 {
        continue;
      }
      l[i][j as usize] =
        either(&l[i][j as usize], &RegexTerm::single(chartab::get_char(s)));
    }
  }
  for i in 0..nstates {
    if fa.accepts(i) != NO_TOKEN {
      l[i][nstates] = RegexTerm::Epsilon;
    }
  }
  let mut vertex_exists = vec![true; nnodes];
  for _ in 0..nstates.saturating_sub(1) {
    /* never the start state, never the synthetic acceptor; among the rest,
       the Delgado-Morais weight estimates the growth caused by removal */
    let mut min_weight_state = None;
    let mut min_weight = 0isize;
    for i in 1..nstates {
      if !vertex_exists[i] {
        continue;
      }
      let mut fan_in = 0isize;
      let mut fan_out = 0isize;
      for j in 0..nnodes {
        if !matches!(l[i][j], RegexTerm::Null) {
          fan_out += 1;
        }
        if !matches!(l[j][i], RegexTerm::Null) {
          fan_in += 1;
        }
      }
      let mut weight = 0isize;
      if !matches!(l[i][i], RegexTerm::Null) {
        weight += l[i][i].to_string().len() as isize * (fan_in * fan_out - 1);
      }
      for j in 0..nnodes {
        if !matches!(l[i][j], RegexTerm::Null) {
          weight += l[i][j].to_string().len() as isize * (fan_in - 1);
        }
        if !matches!(l[j][i], RegexTerm::Null) {
          weight += l[j][i].to_string().len() as isize * (fan_out - 1);
        }
      }
      if min_weight_state.is_none() || weight < min_weight {
        min_weight_state = Some(i);
        min_weight = weight;
      }
    }
    let k = min_weight_state.expect("an eliminable state remains at every step");
    for i in 0..nnodes {
      if !vertex_exists[i] {
        continue;
      }
      for j in 0..nnodes {
        if !vertex_exists[j] {
          continue;
        }
        update_path(i, i, k, &mut l);
        update_path(j, j, k, &mut l);
        update_path(i, j, k, &mut l);
        update_path(j, i, k, &mut l);
      }
    }
    vertex_exists[k] = false;
  }
  let f = nstates;
  let s = 0;
  concat(
    &star(&l[s][s]),
    &concat(
      &l[s][f],
      &star(&either(&concat(&l[f][s], &concat(&star(&l[s][s]), &l[s][f])), &l[f][f])),
    ),
  )
  .to_string()
}

/// A regex matching any string whose first occurrence of `pattern` just
/// ended: build the DFA of `.*pattern`, then freeze its accepting states.
pub fn for_first_occurrence_of(pattern: &str) -> Result<String, BuildError> {
  let fa = super::build_dfa("ends-with", &format!(".*{}", pattern), 0)?;
  let fa = FiniteAutomaton::remove_transitions_from_accepting(&fa);
  Ok(from_automaton(&fa))
}

/// Expands every letter of `pattern` into a two-character class.
pub fn for_case_insensitive(pattern: &str) -> String {
  let mut result = String::new();
  for c in pattern.chars() {
    if c.is_ascii_lowercase() {
      result.push('[');
      result.push(c);
      result.push(c.to_ascii_uppercase());
      result.push(']');
    } else if c.is_ascii_uppercase() {
      result.push('[');
      result.push(c.to_ascii_lowercase());
      result.push(c);
      result.push(']');
    } else {
      result.push(c);
    }
  }
  result
}
