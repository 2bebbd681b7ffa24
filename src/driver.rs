/*!

The table-driven runtime: a longest-match tokenizer over the lexer DFA and a
shift-reduce loop over the parser tables. Callers supply the semantic
actions through the [`Parser`] trait; each shift and each reduction produce
a value, and the value of the start symbol is the parse result.

A tracing variant writes every step into a `fmt::Write` sink; the regex
frontend uses it to attach a step-by-step diagnostic to a failed parse.

*/

use std::fmt;
use std::fmt::Write as _;

use crate::chartab;
use crate::language::ParserTables;
use crate::{ProductionId, SymbolId, TokenId, NO_STATE, NO_TOKEN};
use crate::automaton::FiniteAutomaton;
use crate::error::ParseError;

/// Semantic actions of a parse. `shift` sees every terminal, including the
/// synthetic end-of-input one (with empty text); `reduce` folds the values
/// of a production's right-hand side into the value of its left-hand side.
pub trait Parser {
  type Value;
  fn shift(&mut self, token: TokenId, text: &str) -> Self::Value;
  fn reduce(&mut self, production: ProductionId, rhs: Vec<Self::Value>) -> Self::Value;
}

/// A recognized token: byte range into the input.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Lexeme {
  pub token: TokenId,
  pub start: usize,
  pub end: usize,
}

/// Longest-match tokenization. On equal-length matches the DFA's accept
/// vector already carries the lowest-numbered token. A match must consume
/// at least one byte.
pub fn tokenize(
  lexer: &FiniteAutomaton, text: &str, name: &str,
) -> Result<Vec<Lexeme>, ParseError> {
  let bytes = text.as_bytes();
  let mut out = Vec::new();
  let mut pos = 0;
  while pos < bytes.len() {
    let mut state = 0usize;
    let mut last_accept: Option<(TokenId, usize)> = None;
    let mut i = pos;
    while i < bytes.len() {
      let c = bytes[i] as char;
      if !chartab::is_symbol(c) {
        break;
      }
      let next = lexer.step(state, chartab::get_symbol(c));
      if next == NO_STATE {
        break;
      }
      state = next as usize;
      i += 1;
      let token = lexer.accepts(state);
      if token != NO_TOKEN {
        last_accept = Some((token, i));
      }
    }
    match last_accept {
      Some((token, end)) => {
        out.push(Lexeme { token, start: pos, end });
        pos = end;
      }
      None => {
        return Err(ParseError::Lex { name: name.into(), position: pos });
      }
    }
  }
  Ok(out)
}

pub fn parse_string<P: Parser>(
  tables: &ParserTables, parser: &mut P, text: &str, name: &str,
) -> Result<P::Value, ParseError> {
  parse_with(tables, parser, text, name, None)
}

/// Same parse, narrating each step into `trace`.
pub fn parse_string_traced<P: Parser>(
  tables: &ParserTables, parser: &mut P, text: &str, name: &str, trace: &mut dyn fmt::Write,
) -> Result<P::Value, ParseError> {
  parse_with(tables, parser, text, name, Some(trace))
}

fn parse_with<P: Parser>(
  tables: &ParserTables, parser: &mut P, text: &str, name: &str,
  mut trace: Option<&mut dyn fmt::Write>,
) -> Result<P::Value, ParseError> {
  use crate::tables::Action;
  let lexemes = tokenize(&tables.lexer, text, name)?;
  let grammar = tables.parser.grammar().clone();
  let end = grammar.end_terminal();
  let mut state_stack: Vec<usize> = vec![0];
  let mut value_stack: Vec<P::Value> = Vec::new();
  /* the first synthetic end lexeme gets shifted; the second drives the
     trailing reductions down to the accept action */
  let feed = lexemes
    .iter()
    .map(|l| (l.token as SymbolId, l.start, l.end))
    .chain([(end, text.len(), text.len()), (end, text.len(), text.len())]);
  for (terminal, start, end_pos) in feed {
    let lexeme = &text[start..end_pos];
    loop {
      let top = *state_stack.last().expect("state stack holds at least the start state");
      match tables.parser.terminal_action(top, terminal) {
        None => {
          return Err(if terminal == end {
            ParseError::UnexpectedEnd { name: name.into() }
          } else {
            ParseError::UnexpectedToken {
              name: name.into(),
              position: start,
              text: lexeme.into(),
            }
          });
        }
        Some(Action::Shift { next_state }) => {
          if let Some(t) = trace.as_deref_mut() {
            let _ = writeln!(t, "shift {} \"{}\"", grammar.symbol_name(terminal), lexeme);
          }
          state_stack.push(next_state);
          value_stack.push(parser.shift(terminal as TokenId, lexeme));
          break;
        }
        Some(Action::Reduce { production }) => {
          if let Some(t) = trace.as_deref_mut() {
            let _ = writeln!(t, "reduce {}", grammar.production_string(production));
          }
          let arity = grammar.productions[production].rhs.len();
          let rhs_values = value_stack.split_off(value_stack.len() - arity);
          state_stack.truncate(state_stack.len() - arity);
          let value = parser.reduce(production, rhs_values);
          let lhs = grammar.productions[production].lhs;
          let top = *state_stack.last().expect("reduction cannot empty the state stack");
          let next = tables.parser.nonterminal_goto(top, grammar.as_nonterminal(lhs));
          assert!(next != NO_STATE, "missing GOTO entry after reduction");
          state_stack.push(next as usize);
          value_stack.push(value);
        }
        Some(Action::Skip) => {
          if let Some(t) = trace.as_deref_mut() {
            let _ = writeln!(t, "skip {} \"{}\"", grammar.symbol_name(terminal), lexeme);
          }
          break;
        }
        Some(Action::Accept) => {
          if let Some(t) = trace.as_deref_mut() {
            let _ = writeln!(t, "accept");
          }
          /* the stacks hold the start symbol's value and the end-of-input
             placeholder above it */
          value_stack.pop();
          return Ok(value_stack.pop().expect("accepted parse yields the start value"));
        }
      }
    }
  }
  Err(ParseError::UnexpectedEnd { name: name.into() })
}
