/*!

The bootstrap: the regex metalanguage described as a `Language`, the
hand-built lexer that recognizes it, and the reducer that folds parse
reductions into automata.

The lexer here is assembled from automaton combinators rather than from the
token regexes below, because those regexes can only be parsed by the parser
this module is busy creating. The combinator-built DFA is authoritative;
the token patterns are carried for documentation and pretty-printing.

*/

use std::collections::BTreeSet;

use crate::automaton::{make_char_set_nfa, make_char_single_nfa, FiniteAutomaton};
use crate::chartab::{self, negate_set, NCHARS};
use crate::driver::Parser;
use crate::language::{Language, LanguageProduction, Token};
use crate::{ProductionId, SymbolId, TokenId};

pub const TOK_CHAR: TokenId = 0;
pub const TOK_DOT: TokenId = 1;
pub const TOK_LRANGE: TokenId = 2;
pub const TOK_RRANGE: TokenId = 3;
pub const TOK_LPAREN: TokenId = 4;
pub const TOK_RPAREN: TokenId = 5;
pub const TOK_UNION: TokenId = 6;
pub const TOK_RANGE: TokenId = 7;
pub const TOK_NEGATE: TokenId = 8;
pub const TOK_STAR: TokenId = 9;
pub const TOK_PLUS: TokenId = 10;
pub const TOK_MAYBE: TokenId = 11;
pub const NTOKS: usize = 12;

const META_CHARS: &str = ".[]()|-^*+?";

pub const PROD_REGEX: ProductionId = 0;
pub const PROD_UNION_DECAY: ProductionId = 1;
pub const PROD_UNION: ProductionId = 2;
pub const PROD_CONCAT_DECAY: ProductionId = 3;
pub const PROD_CONCAT: ProductionId = 4;
pub const PROD_QUAL_DECAY: ProductionId = 5;
pub const PROD_STAR: ProductionId = 6;
pub const PROD_PLUS: ProductionId = 7;
pub const PROD_MAYBE: ProductionId = 8;
pub const PROD_SINGLE_CHAR: ProductionId = 9;
pub const PROD_ANY: ProductionId = 10;
pub const PROD_SINGLE_SET: ProductionId = 11;
pub const PROD_PARENS_UNION: ProductionId = 12;
pub const PROD_SET_POSITIVE: ProductionId = 13;
pub const PROD_SET_NEGATIVE: ProductionId = 14;
pub const PROD_POSITIVE_SET: ProductionId = 15;
pub const PROD_NEGATIVE_SET: ProductionId = 16;
pub const PROD_SET_ITEMS_DECAY: ProductionId = 17;
pub const PROD_SET_ITEMS_ADD: ProductionId = 18;
pub const PROD_SET_ITEM_CHAR: ProductionId = 19;
pub const PROD_SET_ITEM_RANGE: ProductionId = 20;
pub const PROD_RANGE: ProductionId = 21;
pub const NPRODS: usize = 22;

/* The union/concat/qualifier productions follow the YACC grammar of Plan
   9's grep; the set productions follow a Prolog teaching grammar for
   Perl-style classes. */
pub fn build_language() -> Language {
  let prod = |lhs: &str, rhs: &[&str]| LanguageProduction {
    lhs: lhs.into(),
    rhs: rhs.iter().map(|s| s.to_string()).collect(),
  };
  let token = |name: &str, regex: &str| Token { name: name.into(), regex: regex.into() };
  let mut productions = vec![prod("", &[]); NPRODS];
  productions[PROD_REGEX] = prod("regex", &["union"]);
  productions[PROD_UNION_DECAY] = prod("union", &["concat"]);
  productions[PROD_UNION] = prod("union", &["union", "|", "concat"]);
  productions[PROD_CONCAT_DECAY] = prod("concat", &["qualified"]);
  productions[PROD_CONCAT] = prod("concat", &["concat", "qualified"]);
  productions[PROD_QUAL_DECAY] = prod("qualified", &["single"]);
  productions[PROD_STAR] = prod("qualified", &["qualified", "*"]);
  productions[PROD_PLUS] = prod("qualified", &["qualified", "+"]);
  productions[PROD_MAYBE] = prod("qualified", &["qualified", "?"]);
  productions[PROD_SINGLE_CHAR] = prod("single", &["char"]);
  productions[PROD_ANY] = prod("single", &["."]);
  productions[PROD_SINGLE_SET] = prod("single", &["set"]);
  productions[PROD_PARENS_UNION] = prod("single", &["(", "union", ")"]);
  productions[PROD_SET_POSITIVE] = prod("set", &["positive-set"]);
  productions[PROD_SET_NEGATIVE] = prod("set", &["negative-set"]);
  productions[PROD_POSITIVE_SET] = prod("positive-set", &["[", "set-items", "]"]);
  productions[PROD_NEGATIVE_SET] = prod("negative-set", &["[", "^", "set-items", "]"]);
  productions[PROD_SET_ITEMS_DECAY] = prod("set-items", &["set-item"]);
  productions[PROD_SET_ITEMS_ADD] = prod("set-items", &["set-items", "set-item"]);
  productions[PROD_SET_ITEM_CHAR] = prod("set-item", &["char"]);
  productions[PROD_SET_ITEM_RANGE] = prod("set-item", &["range"]);
  productions[PROD_RANGE] = prod("range", &["char", "-", "char"]);
  let mut tokens = vec![token("", ""); NTOKS];
  // any non-meta character, or anything preceded by the escape slash
  tokens[TOK_CHAR as usize] =
    token("char", r"[^\\\.\[\]\(\)\|\-\^\*\+\?]|\\.");
  tokens[TOK_DOT as usize] = token(".", r"\.");
  tokens[TOK_LRANGE as usize] = token("[", r"\[");
  tokens[TOK_RRANGE as usize] = token("]", r"\]");
  tokens[TOK_LPAREN as usize] = token("(", r"\(");
  tokens[TOK_RPAREN as usize] = token(")", r"\)");
  tokens[TOK_UNION as usize] = token("|", r"\|");
  tokens[TOK_RANGE as usize] = token("-", r"\-");
  tokens[TOK_NEGATE as usize] = token("^", r"\^");
  tokens[TOK_STAR as usize] = token("*", r"\*");
  tokens[TOK_PLUS as usize] = token("+", r"\+");
  tokens[TOK_MAYBE as usize] = token("?", r"\?");
  Language { tokens, productions, ignored_tokens: Vec::new() }
}

/// Builds the metalanguage lexer by hand. The parser tables that read
/// regular expressions are built from this lexer, so it cannot itself come
/// from a regular expression.
pub fn build_lexer() -> FiniteAutomaton {
  let all_chars: BTreeSet<SymbolId> = (0..NCHARS).collect();
  let mut nonmeta_chars = all_chars.clone();
  for meta_char in META_CHARS.chars() {
    nonmeta_chars.remove(&chartab::get_symbol(meta_char));
  }
  let lex_nonmeta = FiniteAutomaton::make_set_nfa(NCHARS, &nonmeta_chars, TOK_CHAR);
  let lex_slash = make_char_single_nfa('\\', 0);
  let lex_any = FiniteAutomaton::make_set_nfa(NCHARS, &all_chars, 0);
  let lex_escaped = FiniteAutomaton::concat(&lex_slash, &lex_any, TOK_CHAR);
  let lex_char = FiniteAutomaton::unite(&lex_nonmeta, &lex_escaped);
  let mut lex_metachars: Option<FiniteAutomaton> = None;
  for (i, meta_char) in META_CHARS.chars().enumerate() {
    let token = TOK_CHAR + i as TokenId + 1;
    let lex_metachar = make_char_single_nfa(meta_char, token);
    lex_metachars = Some(match lex_metachars {
      Some(sofar) => FiniteAutomaton::unite(&sofar, &lex_metachar),
      None => lex_metachar,
    });
  }
  let out = FiniteAutomaton::unite(&lex_char, &lex_metachars.expect("there are metacharacters"));
  FiniteAutomaton::simplify(&FiniteAutomaton::make_deterministic(&out))
}

/// Values flowing through a regex parse: characters from the lexer, char
/// sets from class items, automata everywhere above.
pub enum RegexValue {
  None,
  Char(char),
  Charset(BTreeSet<char>),
  Automaton(FiniteAutomaton),
}

fn take_char(value: RegexValue) -> char {
  match value {
    RegexValue::Char(c) => c,
    _ => unreachable!("expected a character value"),
  }
}

fn take_charset(value: RegexValue) -> BTreeSet<char> {
  match value {
    RegexValue::Charset(set) => set,
    _ => unreachable!("expected a charset value"),
  }
}

fn take_automaton(value: RegexValue) -> FiniteAutomaton {
  match value {
    RegexValue::Automaton(fa) => fa,
    _ => unreachable!("expected an automaton value"),
  }
}

/// Folds reductions of the bootstrap grammar into an automaton whose every
/// accept is stamped with `result_token`.
pub struct RegexParser {
  result_token: TokenId,
}

impl RegexParser {
  pub fn new(result_token: TokenId) -> Self {
    RegexParser { result_token }
  }
}

impl Parser for RegexParser {
  type Value = RegexValue;

  fn shift(&mut self, token: TokenId, text: &str) -> RegexValue {
    if token != TOK_CHAR {
      return RegexValue::None;
    }
    let chars: Vec<char> = text.chars().collect();
    match chars.as_slice() {
      [c] => RegexValue::Char(*c),
      ['\\', c] => RegexValue::Char(*c),
      _ => unreachable!("regex char lexeme is {:?}", text),
    }
  }

  fn reduce(&mut self, production: ProductionId, rhs: Vec<RegexValue>) -> RegexValue {
    let mut rhs = rhs.into_iter();
    let mut next = || rhs.next().expect("reduction arity matches the production");
    match production {
      PROD_REGEX => RegexValue::Automaton(FiniteAutomaton::simplify(
        &FiniteAutomaton::make_deterministic(&take_automaton(next())),
      )),
      PROD_UNION_DECAY | PROD_CONCAT_DECAY | PROD_QUAL_DECAY | PROD_SET_ITEMS_DECAY
      | PROD_SET_ITEM_RANGE | PROD_SET_POSITIVE => next(),
      PROD_UNION => {
        let a = take_automaton(next());
        next(); // the | token
        let b = take_automaton(next());
        RegexValue::Automaton(FiniteAutomaton::unite(&a, &b))
      }
      PROD_CONCAT => {
        let a = take_automaton(next());
        let b = take_automaton(next());
        RegexValue::Automaton(FiniteAutomaton::concat(&a, &b, self.result_token))
      }
      PROD_STAR => {
        RegexValue::Automaton(FiniteAutomaton::star(&take_automaton(next()), self.result_token))
      }
      PROD_PLUS => {
        RegexValue::Automaton(FiniteAutomaton::plus(&take_automaton(next()), self.result_token))
      }
      PROD_MAYBE => {
        RegexValue::Automaton(FiniteAutomaton::maybe(&take_automaton(next()), self.result_token))
      }
      PROD_SINGLE_CHAR => {
        RegexValue::Automaton(make_char_single_nfa(take_char(next()), self.result_token))
      }
      PROD_ANY => RegexValue::Automaton(FiniteAutomaton::make_range_nfa(
        NCHARS,
        0,
        NCHARS - 1,
        self.result_token,
      )),
      PROD_SINGLE_SET => {
        RegexValue::Automaton(make_char_set_nfa(&take_charset(next()), self.result_token))
      }
      PROD_PARENS_UNION => {
        next(); // (
        let union = next();
        union
      }
      PROD_SET_NEGATIVE => RegexValue::Charset(negate_set(&take_charset(next()))),
      PROD_POSITIVE_SET => {
        next(); // [
        next()
      }
      PROD_NEGATIVE_SET => {
        next(); // [
        next(); // ^
        next()
      }
      PROD_SET_ITEMS_ADD => {
        let mut set = take_charset(next());
        set.extend(take_charset(next()));
        RegexValue::Charset(set)
      }
      PROD_SET_ITEM_CHAR => {
        let mut set = BTreeSet::new();
        set.insert(take_char(next()));
        RegexValue::Charset(set)
      }
      PROD_RANGE => {
        /* ranges run over the symbol index space between the endpoints,
           inclusive, in increasing symbol order */
        let first = take_char(next());
        next(); // -
        let last = take_char(next());
        let mut set = BTreeSet::new();
        for symbol in chartab::get_symbol(first)..=chartab::get_symbol(last) {
          set.insert(chartab::get_char(symbol));
        }
        RegexValue::Charset(set)
      }
      _ => unreachable!("unexpected production {}", production),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::driver::tokenize;
  use crate::NO_TOKEN;

  #[test]
  fn lexer_splits_meta_and_plain() {
    let lexer = build_lexer();
    let lexemes = tokenize(&lexer, "a.b*", "test").unwrap();
    let tokens: Vec<TokenId> = lexemes.iter().map(|l| l.token).collect();
    assert_eq!(tokens, vec![TOK_CHAR, TOK_DOT, TOK_CHAR, TOK_STAR]);
  }

  #[test]
  fn lexer_handles_escapes() {
    let lexer = build_lexer();
    let lexemes = tokenize(&lexer, r"\*x", "test").unwrap();
    assert_eq!(lexemes.len(), 2);
    assert_eq!(lexemes[0].token, TOK_CHAR);
    assert_eq!(lexemes[0].end - lexemes[0].start, 2);
    assert_eq!(lexemes[1].token, TOK_CHAR);
  }

  #[test]
  fn lexer_rejects_nothing_printable() {
    let lexer = build_lexer();
    for c in [' ', 'a', 'Z', '0', '~', '[', ']'] {
      assert_ne!(lexer.accepts_string(&c.to_string()), NO_TOKEN, "{:?}", c);
    }
  }

  #[test]
  fn language_shape() {
    let lang = build_language();
    assert_eq!(lang.tokens.len(), NTOKS);
    assert_eq!(lang.productions.len(), NPRODS);
    assert_eq!(lang.productions[0].lhs, "regex");
    assert!(lang.ignored_tokens.is_empty());
  }
}
