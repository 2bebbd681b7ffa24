/*!

The user-facing descriptor and the facade that turns it into tables. A
`Language` is an ordered token list (order decides ties: on equal-length
matches the lowest-numbered token wins), an ordered production list whose
first left-hand side is the start symbol, and the names of tokens the
parser should skip.

Token names `NEWLINE`, `INDENT` and `DEDENT` are reserved: declaring
`INDENT` makes the language indentation-sensitive, which requires all three
and requires `NEWLINE` to come before the other two so the lexer prefers it
on equal match length.

*/

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::automaton::FiniteAutomaton;
use crate::builder::{accept_parser, build_lalr1_parser};
use crate::error::BuildError;
use crate::grammar::{Grammar, GrammarPtr, Production, RhsString};
use crate::regex;
use crate::tables::ShiftReduceTables;
use crate::{SymbolId, TokenId, NO_TOKEN};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
  pub name: String,
  pub regex: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LanguageProduction {
  pub lhs: String,
  pub rhs: Vec<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Language {
  pub tokens: Vec<Token>,
  pub productions: Vec<LanguageProduction>,
  pub ignored_tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Indentation {
  pub is_sensitive: bool,
  pub indent_token: TokenId,
  pub dedent_token: TokenId,
  pub newline_token: TokenId,
}

impl Indentation {
  pub fn insensitive() -> Self {
    Indentation {
      is_sensitive: false,
      indent_token: NO_TOKEN,
      dedent_token: NO_TOKEN,
      newline_token: NO_TOKEN,
    }
  }
}

/// Everything a runtime driver needs: parser actions, the lexer DFA, and
/// the indentation metadata.
#[derive(Debug)]
pub struct ParserTables {
  pub parser: ShiftReduceTables,
  pub lexer: FiniteAutomaton,
  pub indentation: Indentation,
}

pub type ParserTablesPtr = Arc<ParserTables>;

/// Maps names to dense symbol ids (tokens first, then each new production
/// LHS) and augments with the end terminal and the accept production.
pub fn build_grammar(language: &Language) -> Result<GrammarPtr, BuildError> {
  if language.productions.is_empty() {
    return Err(BuildError::Config("the language declares no productions".into()));
  }
  let mut symbol_map: HashMap<&str, SymbolId> = HashMap::new();
  let mut nterminals = 0;
  for token in &language.tokens {
    symbol_map.insert(&token.name, nterminals);
    nterminals += 1;
  }
  let mut nsymbols = nterminals;
  for (i, production) in language.productions.iter().enumerate() {
    if production.lhs.is_empty() {
      return Err(BuildError::Config(format!("production {} has an empty left-hand side", i)));
    }
    symbol_map.entry(&production.lhs).or_insert_with(|| {
      let symbol = nsymbols;
      nsymbols += 1;
      symbol
    });
  }
  let mut out = Grammar {
    nsymbols,
    nterminals,
    ..Grammar::default()
  };
  for production in &language.productions {
    let lhs = symbol_map[production.lhs.as_str()];
    let mut rhs = RhsString::new();
    for symbol_name in &production.rhs {
      let symbol = symbol_map.get(symbol_name.as_str()).ok_or_else(|| {
        BuildError::Config(format!(
          "RHS entry \"{}\" is neither a nonterminal (the LHS of a production) nor a token",
          symbol_name
        ))
      })?;
      rhs.push(*symbol);
    }
    out.productions.push(Production { lhs, rhs });
  }
  out.symbol_names = vec![String::new(); nsymbols];
  for (name, &symbol) in &symbol_map {
    out.symbol_names[symbol] = (*name).into();
  }
  out.add_end_terminal();
  out.add_accept_production();
  for name in &language.ignored_tokens {
    match symbol_map.get(name.as_str()) {
      Some(&symbol) if symbol < nterminals => out.ignored_terminals.push(symbol),
      _ => {
        return Err(BuildError::Config(format!("ignored token {} does not exist", name)));
      }
    }
  }
  Ok(Arc::new(out))
}

/// One DFA per token regex, united, determinized, minimized. The accept
/// merge rule of subset construction is what makes the earliest-declared
/// token win length ties.
pub fn build_lexer(language: &Language) -> Result<FiniteAutomaton, BuildError> {
  let mut lexer: Option<FiniteAutomaton> = None;
  for (i, token) in language.tokens.iter().enumerate() {
    if token.name.is_empty() {
      return Err(BuildError::Config(format!("token {} has an empty name", i)));
    }
    if token.regex.is_empty() {
      return Err(BuildError::Config(format!("token {} has an empty regex", i)));
    }
    let dfa = regex::build_dfa(&token.name, &token.regex, i as TokenId)?;
    lexer = Some(match lexer {
      Some(sofar) => FiniteAutomaton::unite(&sofar, &dfa),
      None => dfa,
    });
  }
  let lexer =
    lexer.ok_or_else(|| BuildError::Config("the language declares no tokens".into()))?;
  Ok(FiniteAutomaton::simplify(&FiniteAutomaton::make_deterministic(&lexer)))
}

fn build_indentation(language: &Language) -> Result<Indentation, BuildError> {
  let mut out = Indentation::insensitive();
  for (tok_i, token) in language.tokens.iter().enumerate() {
    let tok_i = tok_i as TokenId;
    match token.name.as_str() {
      "INDENT" => {
        if out.indent_token != NO_TOKEN {
          return Err(BuildError::Config("the language has two or more INDENT tokens".into()));
        }
        out.indent_token = tok_i;
        out.is_sensitive = true;
      }
      "DEDENT" => {
        if out.dedent_token != NO_TOKEN {
          return Err(BuildError::Config("the language has two or more DEDENT tokens".into()));
        }
        out.dedent_token = tok_i;
      }
      "NEWLINE" => {
        if out.newline_token != NO_TOKEN {
          return Err(BuildError::Config("the language has two or more NEWLINE tokens".into()));
        }
        out.newline_token = tok_i;
      }
      _ => {}
    }
  }
  if out.is_sensitive {
    if out.indent_token == NO_TOKEN {
      return Err(BuildError::Config(
        "this indentation-sensitive language has no INDENT token".into(),
      ));
    }
    if out.dedent_token == NO_TOKEN {
      return Err(BuildError::Config(
        "this indentation-sensitive language has no DEDENT token".into(),
      ));
    }
    if out.newline_token == NO_TOKEN {
      return Err(BuildError::Config(
        "this indentation-sensitive language has no NEWLINE token".into(),
      ));
    }
    if out.indent_token < out.newline_token || out.dedent_token < out.newline_token {
      return Err(BuildError::Config(
        "NEWLINE needs to come before all other indentation tokens".into(),
      ));
    }
  }
  Ok(out)
}

/// The whole pipeline: lexer DFA, indentation metadata, grammar, LALR(1)
/// tables.
pub fn build_parser_tables(language: &Language) -> Result<ParserTablesPtr, BuildError> {
  let lexer = build_lexer(language)?;
  let indentation = build_indentation(language)?;
  let grammar = build_grammar(language)?;
  let parser = accept_parser(&build_lalr1_parser(grammar)?);
  Ok(Arc::new(ParserTables { parser, lexer, indentation }))
}

impl Display for Language {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for token in &self.tokens {
      writeln!(f, "token {} regex '{}'", token.name, token.regex)?;
    }
    let mut nonterminal_list: Vec<&str> = Vec::new();
    for production in &self.productions {
      if !nonterminal_list.contains(&production.lhs.as_str()) {
        nonterminal_list.push(&production.lhs);
      }
    }
    for nonterminal in nonterminal_list {
      let lead = format!("{} ::=", nonterminal);
      write!(f, "{}", lead)?;
      let indent = " ".repeat(lead.len());
      let mut first = true;
      for production in &self.productions {
        if production.lhs != nonterminal {
          continue;
        }
        if first {
          first = false;
        } else {
          write!(f, " |\n{}", indent)?;
        }
        for symbol in &production.rhs {
          if symbol == "|" {
            write!(f, " '|'")?;
          } else {
            write!(f, " {}", symbol)?;
          }
        }
      }
      writeln!(f)?;
    }
    writeln!(f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn token(name: &str, regex: &str) -> Token {
    Token { name: name.into(), regex: regex.into() }
  }

  fn production(lhs: &str, rhs: &[&str]) -> LanguageProduction {
    LanguageProduction { lhs: lhs.into(), rhs: rhs.iter().map(|s| s.to_string()).collect() }
  }

  #[test]
  fn grammar_symbols_cover_tokens_then_nonterminals() {
    let lang = Language {
      tokens: vec![token("a", "a"), token("b", "b")],
      productions: vec![
        production("S", &["a", "S", "b"]),
        production("S", &[]),
      ],
      ignored_tokens: vec![],
    };
    let g = build_grammar(&lang).unwrap();
    assert_eq!(g.nterminals, 3); // a, b, EOF
    assert_eq!(g.nsymbols, 5); // + S, ACCEPT
    assert_eq!(g.symbol_name(0), "a");
    assert_eq!(g.symbol_name(2), "EOF");
    assert_eq!(g.symbol_name(3), "S");
  }

  #[test]
  fn unknown_rhs_symbol_is_rejected() {
    let lang = Language {
      tokens: vec![token("a", "a")],
      productions: vec![production("S", &["a", "T"])],
      ignored_tokens: vec![],
    };
    assert!(matches!(build_grammar(&lang), Err(BuildError::Config(_))));
  }

  #[test]
  fn unknown_ignored_token_is_rejected() {
    let lang = Language {
      tokens: vec![token("a", "a")],
      productions: vec![production("S", &["a"])],
      ignored_tokens: vec!["WS".into()],
    };
    assert!(matches!(build_grammar(&lang), Err(BuildError::Config(_))));
  }

  #[test]
  fn empty_token_fields_are_rejected() {
    let lang = Language {
      tokens: vec![token("", "a")],
      productions: vec![],
      ignored_tokens: vec![],
    };
    assert!(matches!(build_lexer(&lang), Err(BuildError::Config(_))));
    let lang = Language {
      tokens: vec![token("a", "")],
      productions: vec![],
      ignored_tokens: vec![],
    };
    assert!(matches!(build_lexer(&lang), Err(BuildError::Config(_))));
  }

  #[test]
  fn indentation_requires_all_three_tokens_in_order() {
    let ok = Language {
      tokens: vec![
        token("NEWLINE", "\n"),
        token("INDENT", ">"),
        token("DEDENT", "<"),
        token("x", "x"),
      ],
      productions: vec![production("S", &["x"])],
      ignored_tokens: vec![],
    };
    let indentation = build_indentation(&ok).unwrap();
    assert!(indentation.is_sensitive);
    assert_eq!(indentation.newline_token, 0);
    assert_eq!(indentation.indent_token, 1);
    assert_eq!(indentation.dedent_token, 2);

    let missing_dedent = Language {
      tokens: vec![token("NEWLINE", "\n"), token("INDENT", ">")],
      productions: vec![],
      ignored_tokens: vec![],
    };
    assert!(matches!(build_indentation(&missing_dedent), Err(BuildError::Config(_))));

    let out_of_order = Language {
      tokens: vec![
        token("INDENT", ">"),
        token("DEDENT", "<"),
        token("NEWLINE", "\n"),
      ],
      productions: vec![],
      ignored_tokens: vec![],
    };
    assert!(matches!(build_indentation(&out_of_order), Err(BuildError::Config(_))));

    // a NEWLINE token alone does not make the language sensitive
    let newline_only = Language {
      tokens: vec![token("NEWLINE", "\n"), token("x", "x")],
      productions: vec![],
      ignored_tokens: vec![],
    };
    let indentation = build_indentation(&newline_only).unwrap();
    assert!(!indentation.is_sensitive);
    assert_eq!(indentation.newline_token, 0);
  }

  #[test]
  fn language_display_groups_alternatives() {
    let lang = Language {
      tokens: vec![token("a", "a")],
      productions: vec![production("S", &["a", "S"]), production("S", &[])],
      ignored_tokens: vec![],
    };
    let text = lang.to_string();
    assert!(text.contains("token a regex 'a'"));
    assert!(text.contains("S ::= a S |"));
  }
}
