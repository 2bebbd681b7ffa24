//! End-to-end LALR(1) construction and parsing scenarios.

use lanegen::driver::{parse_string, Parser};
use lanegen::language::{build_parser_tables, Language, LanguageProduction, ParserTables, Token};
use lanegen::{BuildError, ParseError, ProductionId, TokenId};

fn init_logging() {
  let _ = env_logger::builder().is_test(true).try_init();
}

fn token(name: &str, regex: &str) -> Token {
  Token { name: name.into(), regex: regex.into() }
}

fn production(lhs: &str, rhs: &[&str]) -> LanguageProduction {
  LanguageProduction { lhs: lhs.into(), rhs: rhs.iter().map(|s| s.to_string()).collect() }
}

/// Rebuilds the parse as a bracketed string, one bracket per reduction.
struct TreePrinter;

impl Parser for TreePrinter {
  type Value = String;

  fn shift(&mut self, _token: TokenId, text: &str) -> String {
    text.to_string()
  }

  fn reduce(&mut self, _production: ProductionId, rhs: Vec<String>) -> String {
    format!("[{}]", rhs.join(""))
  }
}

fn parse(tables: &ParserTables, text: &str) -> Result<String, ParseError> {
  parse_string(tables, &mut TreePrinter, text, "test input")
}

fn matched_pairs_language() -> Language {
  // S ::= a S b | <empty>
  Language {
    tokens: vec![token("a", "a"), token("b", "b")],
    productions: vec![production("S", &["a", "S", "b"]), production("S", &[])],
    ignored_tokens: vec![],
  }
}

#[test]
fn trivial_lalr1_language() {
  init_logging();
  let tables = build_parser_tables(&matched_pairs_language()).unwrap();
  assert_eq!(parse(&tables, "ab").unwrap(), "[a[]b]");
  assert_eq!(parse(&tables, "aabb").unwrap(), "[a[a[]b]b]");
  assert_eq!(parse(&tables, "").unwrap(), "[]");
  match parse(&tables, "aab").unwrap_err() {
    ParseError::UnexpectedEnd { .. } => {}
    other => panic!("expected an unexpected-end error, got {:?}", other),
  }
  match parse(&tables, "ba").unwrap_err() {
    ParseError::UnexpectedToken { position, .. } => assert_eq!(position, 0),
    other => panic!("expected an unexpected-token error, got {:?}", other),
  }
}

#[test]
fn lr0_language_needs_no_tracing() {
  // S ::= ( S ) | x is LR(0): every state is adequate from the start
  let lang = Language {
    tokens: vec![token("lp", "\\("), token("rp", "\\)"), token("x", "x")],
    productions: vec![production("S", &["lp", "S", "rp"]), production("S", &["x"])],
    ignored_tokens: vec![],
  };
  let tables = build_parser_tables(&lang).unwrap();
  assert_eq!(parse(&tables, "((x))").unwrap(), "[([([x])])]");
  assert!(parse(&tables, "((x)").is_err());
}

#[test]
fn ignored_tokens_are_skipped() {
  let mut lang = matched_pairs_language();
  lang.tokens.push(token("WS", "[ \t]+"));
  lang.ignored_tokens.push("WS".into());
  let tables = build_parser_tables(&lang).unwrap();
  assert_eq!(parse(&tables, " a a  b b ").unwrap(), "[a[a[]b]b]");
}

#[test]
fn dangling_else_is_not_lalr1() {
  let lang = Language {
    tokens: vec![token("i", "i"), token("e", "e"), token("x", "x")],
    productions: vec![
      production("S", &["i", "S", "e", "S"]),
      production("S", &["i", "S"]),
      production("S", &["x"]),
    ],
    ignored_tokens: vec![],
  };
  match build_parser_tables(&lang).unwrap_err() {
    BuildError::NotLalr1 { summary } => {
      assert!(summary.contains("conflict"));
      assert!(summary.contains("e"));
    }
    other => panic!("expected a not-LALR(1) error, got {:?}", other),
  }
}

#[test]
fn expression_grammar_with_lookahead() {
  init_logging();
  // classic left-recursive expression grammar: needs real LALR(1) contexts
  let lang = Language {
    tokens: vec![
      token("plus", "\\+"),
      token("times", "\\*"),
      token("num", "[0-9]+"),
      token("lp", "\\("),
      token("rp", "\\)"),
    ],
    productions: vec![
      production("E", &["E", "plus", "T"]),
      production("E", &["T"]),
      production("T", &["T", "times", "F"]),
      production("T", &["F"]),
      production("F", &["lp", "E", "rp"]),
      production("F", &["num"]),
    ],
    ignored_tokens: vec![],
  };
  let tables = build_parser_tables(&lang).unwrap();
  // precedence falls out of the grammar shape: 1+2*3 groups the product
  assert_eq!(parse(&tables, "1+2*3").unwrap(), "[[[[1]]]+[[[2]]*[3]]]");
  assert!(parse(&tables, "(1+2)*3").is_ok());
  assert!(parse(&tables, "1+*3").is_err());
}

#[test]
fn rebuilding_yields_identical_tables() {
  let lang = matched_pairs_language();
  let first = build_parser_tables(&lang).unwrap();
  let second = build_parser_tables(&lang).unwrap();
  assert_eq!(first.parser.nstates(), second.parser.nstates());
  let grammar = first.parser.grammar();
  assert_eq!(grammar.nsymbols, second.parser.grammar().nsymbols);
  for state in 0..first.parser.nstates() {
    for terminal in 0..grammar.nterminals {
      assert_eq!(
        first.parser.terminal_action(state, terminal),
        second.parser.terminal_action(state, terminal),
      );
    }
    for nonterminal in 0..grammar.nnonterminals() {
      assert_eq!(
        first.parser.nonterminal_goto(state, nonterminal),
        second.parser.nonterminal_goto(state, nonterminal),
      );
    }
  }
}
