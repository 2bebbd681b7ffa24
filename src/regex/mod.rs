/*!

The regex engine's public surface. `build_dfa` turns a pattern into a
minimized DFA whose accepting states carry a caller-chosen token id;
`matches` answers membership directly; [`synthesis::from_automaton`] goes
the other way.

The metalanguage understood here is the traditional grep subset: the twelve
metacharacters `. [ ] ( ) | - ^ * + ?`, `\c` escaping any character, classes
`[...]` and `[^...]` with `a-z` ranges, and nothing more. The tables that
parse it are built by this crate itself on first use and cached for the
life of the process.

*/

pub mod ast;
mod grammar;
pub mod synthesis;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::automaton::FiniteAutomaton;
use crate::builder::{accept_parser, build_lalr1_parser};
use crate::driver;
use crate::error::BuildError;
use crate::language::{build_grammar, Indentation, Language, ParserTables, ParserTablesPtr};
use crate::{TokenId, NO_TOKEN};

pub use ast::from_charset;
pub use grammar::{RegexParser, RegexValue};
pub use synthesis::{for_case_insensitive, for_first_occurrence_of, from_automaton};

static BOOTSTRAP_LANGUAGE: Lazy<Arc<Language>> =
  Lazy::new(|| Arc::new(grammar::build_language()));

static BOOTSTRAP_TABLES: Lazy<ParserTablesPtr> = Lazy::new(|| {
  let lang = language();
  let g = build_grammar(lang.as_ref()).expect("the bootstrap regex grammar is well formed");
  let pip = build_lalr1_parser(g).expect("the bootstrap regex grammar is LALR(1)");
  Arc::new(ParserTables {
    parser: accept_parser(&pip),
    lexer: grammar::build_lexer(),
    indentation: Indentation::insensitive(),
  })
});

/// The regex metalanguage description, built once per process.
pub fn language() -> Arc<Language> {
  BOOTSTRAP_LANGUAGE.clone()
}

/// The compiled tables for the regex metalanguage, built once per process.
pub fn parser_tables() -> ParserTablesPtr {
  BOOTSTRAP_TABLES.clone()
}

/// Parses `regex` and returns the minimized DFA of its language, every
/// accepting state stamped with `token`. On failure the parse is repeated
/// with the tracing driver and the step log rides along in the error.
pub fn build_dfa(name: &str, regex: &str, token: TokenId) -> Result<FiniteAutomaton, BuildError> {
  let tables = parser_tables();
  let mut parser = RegexParser::new(token);
  match driver::parse_string(&tables, &mut parser, regex, name) {
    Ok(grammar::RegexValue::Automaton(fa)) => Ok(fa),
    Ok(_) => Err(BuildError::Invariant(format!(
      "regex parse of \"{}\" produced a non-automaton value",
      regex
    ))),
    Err(parse_error) => {
      let mut diagnostic = format!("{}\nrepeating with the tracing driver:\n", parse_error);
      let mut retry = RegexParser::new(token);
      let _ = driver::parse_string_traced(&tables, &mut retry, regex, name, &mut diagnostic);
      Err(BuildError::RegexParse {
        name: name.into(),
        regex: regex.into(),
        diagnostic,
      })
    }
  }
}

/// Does `text` belong to the language of `regex`?
pub fn matches(regex: &str, text: &str) -> Result<bool, BuildError> {
  let dfa = build_dfa("first arg of matches", regex, 0)?;
  Ok(dfa.accepts_string(text) != NO_TOKEN)
}

// region Stock patterns

pub fn maybe_sign() -> String {
  r"[\-\+]?".into()
}

pub fn leading_digits() -> String {
  "(0|([1-9][0-9]*))".into()
}

pub fn trailing_digits() -> String {
  "[0-9]+".into()
}

pub fn unsigned_integer() -> String {
  leading_digits()
}

pub fn signed_integer() -> String {
  maybe_sign() + &unsigned_integer()
}

/// Floats that an integer pattern would not already match: a dot with
/// digits on at least one side, or an exponent on a bare integer.
pub fn unsigned_floating_point_not_integer() -> String {
  let b = leading_digits();
  let d = r"\.".to_string();
  let a = trailing_digits();
  let e = format!("([eE]{}{})", maybe_sign(), trailing_digits());
  let maybe_a = a.clone() + "?";
  let maybe_e = e.clone() + "?";
  let form1 = format!("({}{}{})", d, a, maybe_e);
  let form2 = format!("({}{})", b, e);
  let form3 = format!("({}{}{}{})", b, d, maybe_a, maybe_e);
  format!("({}|{}|{})", form1, form2, form3)
}

pub fn unsigned_floating_point() -> String {
  format!("({}|{})", unsigned_floating_point_not_integer(), unsigned_integer())
}

pub fn signed_floating_point_not_integer() -> String {
  maybe_sign() + &unsigned_floating_point_not_integer()
}

pub fn signed_floating_point() -> String {
  maybe_sign() + &unsigned_floating_point()
}

pub fn whitespace() -> String {
  "[ \t\n\r]+".into()
}

pub fn newline() -> String {
  "\r?\n".into()
}

pub fn identifier() -> String {
  "[_a-zA-Z][_a-zA-Z0-9]*".into()
}

pub fn c_style_comment() -> String {
  let slash = "/";
  let asterisk = r"\*";
  let comment_start = format!("{}{}", slash, asterisk);
  let not_asterisk = r"[^\*]";
  let neither_slash_nor_asterisk = r"[^/\*]";
  let zero_or_more_not_asterisks = format!("{}*", not_asterisk);
  let one_or_more_asterisks = format!("{}+", asterisk);
  let comment_head = format!("{}{}", zero_or_more_not_asterisks, one_or_more_asterisks);
  let comment_repeatee = format!(
    "{}{}{}",
    neither_slash_nor_asterisk, zero_or_more_not_asterisks, one_or_more_asterisks
  );
  let comment_repeater = format!("({})*", comment_repeatee);
  format!("{}{}{}{}", comment_start, comment_head, comment_repeater, slash)
}

pub fn double_quoted_string() -> String {
  "\"([^\"\\\\]|\\\\.)*\"".into()
}

// endregion

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches_simple_patterns() {
    assert!(matches("a", "a").unwrap());
    assert!(!matches("a", "b").unwrap());
    assert!(matches("a|b", "b").unwrap());
    assert!(matches("ab*", "abbb").unwrap());
    assert!(matches("ab*", "a").unwrap());
    assert!(!matches("ab+", "a").unwrap());
    assert!(matches("ab?", "ab").unwrap());
    assert!(matches("(ab)+", "abab").unwrap());
    assert!(!matches("(ab)+", "aba").unwrap());
  }

  #[test]
  fn dot_matches_any_symbol() {
    assert!(matches(".", "a").unwrap());
    assert!(matches(".", " ").unwrap());
    assert!(matches(".", "\t").unwrap());
    assert!(!matches(".", "ab").unwrap());
  }

  #[test]
  fn classes_and_ranges() {
    assert!(matches("[abc]", "b").unwrap());
    assert!(!matches("[abc]", "d").unwrap());
    assert!(matches("[a-z]+", "hello").unwrap());
    assert!(!matches("[a-z]+", "Hello").unwrap());
    assert!(matches("[^a-z]", "A").unwrap());
    assert!(!matches("[^a-z]", "a").unwrap());
    assert!(matches("[_a-zA-Z][_a-zA-Z0-9]*", "_x1").unwrap());
  }

  #[test]
  fn escapes_are_literal() {
    assert!(matches(r"\*", "*").unwrap());
    assert!(!matches(r"\*", "a").unwrap());
    assert!(matches(r"a\.b", "a.b").unwrap());
    assert!(!matches(r"a\.b", "axb").unwrap());
    // escaping an ordinary character is allowed and means the character
    assert!(matches(r"\n", "n").unwrap());
  }

  #[test]
  fn malformed_regex_reports_a_trace() {
    let err = build_dfa("broken", "a|", 0).unwrap_err();
    match err {
      BuildError::RegexParse { name, regex, diagnostic } => {
        assert_eq!(name, "broken");
        assert_eq!(regex, "a|");
        assert!(diagnostic.contains("tracing driver"));
        assert!(diagnostic.contains("shift"));
      }
      other => panic!("expected a regex parse error, got {:?}", other),
    }
  }

  #[test]
  fn stock_patterns() {
    assert!(matches(&identifier(), "foo_bar9").unwrap());
    assert!(!matches(&identifier(), "9foo").unwrap());
    assert!(matches(&whitespace(), " \t\n").unwrap());
    assert!(matches(&unsigned_integer(), "0").unwrap());
    assert!(matches(&unsigned_integer(), "907").unwrap());
    assert!(!matches(&unsigned_integer(), "007").unwrap());
    assert!(matches(&signed_integer(), "-42").unwrap());
    assert!(matches(&signed_floating_point(), "-1.5e+10").unwrap());
    assert!(matches(&unsigned_floating_point(), ".5").unwrap());
    assert!(matches(&unsigned_floating_point(), "2e8").unwrap());
    assert!(!matches(&unsigned_floating_point_not_integer(), "12").unwrap());
    assert!(matches(&c_style_comment(), "/* a comment */").unwrap());
    assert!(matches(&c_style_comment(), "/**/").unwrap());
    assert!(!matches(&c_style_comment(), "/* unterminated").unwrap());
    assert!(matches(&double_quoted_string(), "\"hi there\"").unwrap());
    assert!(matches(&double_quoted_string(), "\"say \\\"hi\\\"\"").unwrap());
  }
}
