//! Regex -> DFA -> regex round trips: the synthesized pattern must accept
//! exactly the language of the original.

use once_cell::sync::Lazy;
use proptest::prelude::*;

use lanegen::regex::{build_dfa, from_automaton, matches};

static ROUND_TRIPPED: Lazy<Vec<(String, String)>> = Lazy::new(|| {
  ["(ab|c)*", "a(b|c)+", "[0-9]+", "(a|b)(a|b)?", "x?y*z"]
    .iter()
    .map(|pattern| {
      let dfa = build_dfa("round-trip", pattern, 0).unwrap();
      (pattern.to_string(), from_automaton(&dfa))
    })
    .collect()
});

#[test]
fn known_strings() {
  let dfa = build_dfa("round-trip", "(ab|c)*", 0).unwrap();
  let synthesized = from_automaton(&dfa);
  for accepted in ["", "c", "ab", "cc", "abab", "abc", "cab", "ababc"] {
    assert!(matches(&synthesized, accepted).unwrap(), "should accept {:?}", accepted);
  }
  for rejected in ["a", "b", "ac", "ba", "cba", "abca"] {
    assert!(!matches(&synthesized, rejected).unwrap(), "should reject {:?}", rejected);
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(20))]

  #[test]
  fn random_strings_agree(s in "[abcxyz0-9]{0,8}") {
    for (original, synthesized) in ROUND_TRIPPED.iter() {
      let expected = matches(original, &s).unwrap();
      let got = matches(synthesized, &s).unwrap();
      prop_assert_eq!(
        expected, got,
        "pattern {:?} round-tripped to {:?} disagrees on {:?}", original, synthesized, &s
      );
    }
  }
}
