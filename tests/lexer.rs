//! End-to-end lexer construction scenarios.

use lanegen::driver::tokenize;
use lanegen::language::{build_lexer, Language, Token};
use lanegen::NO_TOKEN;

fn token(name: &str, regex: &str) -> Token {
  Token { name: name.into(), regex: regex.into() }
}

#[test]
fn identifier_token() {
  let lang = Language {
    tokens: vec![token("ID", "[_a-zA-Z][_a-zA-Z0-9]*")],
    productions: vec![],
    ignored_tokens: vec![],
  };
  let lexer = build_lexer(&lang).unwrap();
  assert_eq!(lexer.accepts_string("foo"), 0);
  assert_eq!(lexer.accepts_string("_x1"), 0);
  assert_eq!(lexer.accepts_string(""), NO_TOKEN);
  assert_eq!(lexer.accepts_string("1a"), NO_TOKEN);
}

#[test]
fn declaration_order_breaks_ties() {
  let lang = Language {
    tokens: vec![token("IF", "if"), token("ID", "[a-z]+")],
    productions: vec![],
    ignored_tokens: vec![],
  };
  let lexer = build_lexer(&lang).unwrap();
  // equal-length match: the lower-numbered token wins
  let lexemes = tokenize(&lexer, "if", "test").unwrap();
  assert_eq!(lexemes.len(), 1);
  assert_eq!(lexemes[0].token, 0);
  // longest match beats declaration order
  let lexemes = tokenize(&lexer, "iffy", "test").unwrap();
  assert_eq!(lexemes.len(), 1);
  assert_eq!(lexemes[0].token, 1);
  assert_eq!(lexemes[0].end, 4);
}

#[test]
fn longest_match_resumes_cleanly() {
  let lang = Language {
    tokens: vec![
      token("NUM", "[0-9]+"),
      token("PLUS", "\\+"),
      token("WS", "[ ]+"),
    ],
    productions: vec![],
    ignored_tokens: vec![],
  };
  let lexer = build_lexer(&lang).unwrap();
  let lexemes = tokenize(&lexer, "12 + 345", "test").unwrap();
  let tokens: Vec<_> = lexemes.iter().map(|l| l.token).collect();
  assert_eq!(tokens, vec![0, 2, 1, 2, 0]);
  assert_eq!(lexemes[4].start, 5);
  assert_eq!(lexemes[4].end, 8);
}

#[test]
fn unlexable_input_reports_position() {
  let lang = Language {
    tokens: vec![token("A", "a+")],
    productions: vec![],
    ignored_tokens: vec![],
  };
  let lexer = build_lexer(&lang).unwrap();
  let err = tokenize(&lexer, "aab", "test").unwrap_err();
  match err {
    lanegen::ParseError::Lex { position, .. } => assert_eq!(position, 2),
    other => panic!("expected a lex error, got {:?}", other),
  }
}
