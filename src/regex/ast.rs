/*!

The regex-in-progress ADT used by DFA-to-regex synthesis: a tagged variant
with smart constructors. Nothing builds the variants directly; `either`,
`concat` and `star` are the only entry points, and they apply the algebraic
simplifications eagerly so the intermediate terms of state elimination stay
small.

The simplifications, by constructor:

  - `either`: `x|x = x`, null is the identity, charsets merge, a star
    absorbs its body and its body's `?` form, concatenations factor out a
    common prefix or suffix, alternative lists merge with deduplication;
  - `concat`: null annihilates, epsilon is the identity, `s* s* = s*`,
    `s* s? = s? s* = s*`, concatenation lists splice and try to merge at
    the boundary;
  - `star`: `null* = epsilon* = epsilon`, `(s*)* = s*`, and an epsilon
    alternative is dropped before starring.

*/

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::chartab;

/// Rendering of the empty charset: a byte no chartab symbol covers, so the
/// resulting pattern can never match.
pub const IMPOSSIBLE: char = '\u{8}';

const META_CHARS: &str = ".[]()|-^*+?";

#[derive(Debug, Clone)]
pub enum RegexTerm {
  /// The empty language.
  Null,
  /// The empty string.
  Epsilon,
  Charset(BTreeSet<char>),
  Either(Vec<RegexTerm>),
  Concat(Vec<RegexTerm>),
  Star(Box<RegexTerm>),
}

impl RegexTerm {
  pub fn single(c: char) -> RegexTerm {
    let mut set = BTreeSet::new();
    set.insert(c);
    RegexTerm::Charset(set)
  }

  fn needs_parentheses(&self) -> bool {
    match self {
      RegexTerm::Null | RegexTerm::Charset(_) | RegexTerm::Star(_) => false,
      RegexTerm::Epsilon | RegexTerm::Concat(_) => true,
      RegexTerm::Either(subs) => {
        if has_epsilon(subs) {
          false // renders as a ? form
        } else {
          internal_needs_parentheses(subs)
        }
      }
    }
  }
}

/// Alternative lists compare as sets; concatenations in order.
impl PartialEq for RegexTerm {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (RegexTerm::Null, RegexTerm::Null) => true,
      (RegexTerm::Epsilon, RegexTerm::Epsilon) => true,
      (RegexTerm::Charset(a), RegexTerm::Charset(b)) => a == b,
      (RegexTerm::Either(a), RegexTerm::Either(b)) => {
        a.len() == b.len() && b.iter().all(|x| a.iter().any(|y| x == y))
      }
      (RegexTerm::Concat(a), RegexTerm::Concat(b)) => a == b,
      (RegexTerm::Star(a), RegexTerm::Star(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for RegexTerm {}

fn has_epsilon(subs: &[RegexTerm]) -> bool {
  subs.iter().any(|se| matches!(se, RegexTerm::Epsilon))
}

/// An `x?` in disguise: exactly one alternative plus epsilon.
fn is_question(subs: &[RegexTerm]) -> bool {
  subs.len() == 2 && has_epsilon(subs)
}

fn only_subexpression(subs: &[RegexTerm]) -> Option<RegexTerm> {
  subs.iter().find(|se| !matches!(se, RegexTerm::Epsilon)).cloned()
}

fn remove_epsilon(subs: &[RegexTerm]) -> RegexTerm {
  if subs.len() == 2 {
    return only_subexpression(subs).unwrap_or(RegexTerm::Epsilon);
  }
  RegexTerm::Either(
    subs.iter().filter(|se| !matches!(se, RegexTerm::Epsilon)).cloned().collect(),
  )
}

fn internal_needs_parentheses(subs: &[RegexTerm]) -> bool {
  let mut non_epsilon_count = 0;
  let mut single_needs_parens = false;
  for se in subs {
    if !matches!(se, RegexTerm::Epsilon) {
      single_needs_parens = se.needs_parentheses();
      non_epsilon_count += 1;
    }
  }
  non_epsilon_count > 1 || single_needs_parens
}

fn insert_unique(subs: &mut Vec<RegexTerm>, term: RegexTerm) {
  if !subs.iter().any(|existing| *existing == term) {
    subs.push(term);
  }
}

// region either

pub fn either(a: &RegexTerm, b: &RegexTerm) -> RegexTerm {
  if a == b {
    return a.clone();
  }
  if matches!(a, RegexTerm::Null) {
    return b.clone();
  }
  if matches!(b, RegexTerm::Null) {
    return a.clone();
  }
  if let RegexTerm::Star(sub) = a {
    if let Some(result) = star_either_with(sub, b) {
      return result;
    }
  }
  if let RegexTerm::Star(sub) = b {
    if let Some(result) = star_either_with(sub, a) {
      return result;
    }
  }
  if let RegexTerm::Concat(parts) = a {
    if let Some(result) = concat_either_with(parts, b) {
      return result;
    }
  }
  if let RegexTerm::Concat(parts) = b {
    if let Some(result) = concat_either_with(parts, a) {
      return result;
    }
  }
  if let RegexTerm::Either(parts) = a {
    return either_merge(parts, b);
  }
  if let RegexTerm::Either(parts) = b {
    return either_merge(parts, a);
  }
  if let (RegexTerm::Charset(x), RegexTerm::Charset(y)) = (a, b) {
    return RegexTerm::Charset(x | y);
  }
  let mut subs = Vec::new();
  insert_unique(&mut subs, a.clone());
  insert_unique(&mut subs, b.clone());
  RegexTerm::Either(subs)
}

/// `s* | s = s* | s? = s* | epsilon = s*`.
fn star_either_with(sub: &RegexTerm, other: &RegexTerm) -> Option<RegexTerm> {
  match other {
    RegexTerm::Epsilon => Some(RegexTerm::Star(Box::new(sub.clone()))),
    RegexTerm::Star(other_sub) if **other_sub == *sub => {
      Some(RegexTerm::Star(Box::new(sub.clone())))
    }
    RegexTerm::Either(parts) if is_question(parts) => {
      let question_sub = only_subexpression(parts)?;
      if question_sub == *sub {
        Some(RegexTerm::Star(Box::new(sub.clone())))
      } else {
        None
      }
    }
    _ => None,
  }
}

fn common_prefix_len(a: &[RegexTerm], b: &[RegexTerm]) -> usize {
  let max = a.len().min(b.len());
  let mut size = 0;
  while size < max && a[size] == b[size] {
    size += 1;
  }
  size
}

fn common_suffix_len(a: &[RegexTerm], b: &[RegexTerm]) -> usize {
  let max = a.len().min(b.len());
  let mut size = 0;
  while size < max && a[a.len() - 1 - size] == b[b.len() - 1 - size] {
    size += 1;
  }
  size
}

fn first_n(parts: &[RegexTerm], n: usize) -> RegexTerm {
  match n {
    0 => RegexTerm::Epsilon,
    1 => parts[0].clone(),
    _ => RegexTerm::Concat(parts[..n].to_vec()),
  }
}

fn last_n(parts: &[RegexTerm], n: usize) -> RegexTerm {
  match n {
    0 => RegexTerm::Epsilon,
    1 => parts[parts.len() - 1].clone(),
    _ => RegexTerm::Concat(parts[parts.len() - n..].to_vec()),
  }
}

/// Factor a common prefix or suffix out of two alternatives, or absorb a
/// lone term that this concatenation starts or ends with.
fn concat_either_with(this: &[RegexTerm], other: &RegexTerm) -> Option<RegexTerm> {
  if let RegexTerm::Concat(other_parts) = other {
    if other_parts.len() > this.len() {
      return concat_either_with(other_parts, &RegexTerm::Concat(this.to_vec()));
    }
    let suffix = common_suffix_len(this, other_parts);
    if suffix > 0 {
      let my_prefix = first_n(this, this.len() - suffix);
      let other_prefix = first_n(other_parts, other_parts.len() - suffix);
      let shared = last_n(this, suffix);
      return Some(concat(&either(&my_prefix, &other_prefix), &shared));
    }
    let prefix = common_prefix_len(this, other_parts);
    if prefix > 0 {
      let my_suffix = last_n(this, this.len() - prefix);
      let other_suffix = last_n(other_parts, other_parts.len() - prefix);
      let shared = first_n(this, prefix);
      return Some(concat(&shared, &either(&my_suffix, &other_suffix)));
    }
    return None;
  }
  if this.last() == Some(other) {
    let prefix = first_n(this, this.len() - 1);
    return Some(concat(&either(&prefix, &RegexTerm::Epsilon), other));
  }
  if this.first() == Some(other) {
    let suffix = last_n(this, this.len() - 1);
    return Some(concat(other, &either(&suffix, &RegexTerm::Epsilon)));
  }
  None
}

/// Union into an alternative list: try to combine the incoming term with
/// each existing alternative, deduplicating along the way.
fn either_merge(parts: &[RegexTerm], other: &RegexTerm) -> RegexTerm {
  if let RegexTerm::Either(other_parts) = other {
    let mut result = RegexTerm::Either(parts.to_vec());
    for se in other_parts {
      result = either(&result, se);
    }
    return result;
  }
  let mut result = Vec::new();
  let mut did_combine = false;
  for se in parts {
    let combined = either(se, other);
    if !matches!(combined, RegexTerm::Either(_)) {
      insert_unique(&mut result, combined);
      did_combine = true;
    } else {
      insert_unique(&mut result, se.clone());
    }
  }
  if !did_combine {
    insert_unique(&mut result, other.clone());
  }
  RegexTerm::Either(result)
}

// endregion

// region concat

pub fn concat(a: &RegexTerm, b: &RegexTerm) -> RegexTerm {
  if matches!(a, RegexTerm::Null) || matches!(b, RegexTerm::Null) {
    return RegexTerm::Null;
  }
  if matches!(a, RegexTerm::Epsilon) {
    return b.clone();
  }
  if matches!(b, RegexTerm::Epsilon) {
    return a.clone();
  }
  if let RegexTerm::Star(sub) = a {
    if let Some(result) = star_concat_with(sub, b) {
      return result;
    }
  }
  if let RegexTerm::Star(sub) = b {
    if let Some(result) = star_concat_with(sub, a) {
      return result;
    }
  }
  if let RegexTerm::Concat(parts) = a {
    return concat_append(parts, b);
  }
  if let RegexTerm::Concat(parts) = b {
    return concat_prepend(parts, a);
  }
  RegexTerm::Concat(vec![a.clone(), b.clone()])
}

/// `s* s* = s*` and `s* s? = s? s* = s*`. Note `s* s = s+` is not in the
/// vocabulary of this ADT.
fn star_concat_with(sub: &RegexTerm, other: &RegexTerm) -> Option<RegexTerm> {
  match other {
    RegexTerm::Star(other_sub) if **other_sub == *sub => {
      Some(RegexTerm::Star(Box::new(sub.clone())))
    }
    RegexTerm::Either(parts) if is_question(parts) => {
      let question_sub = only_subexpression(parts)?;
      if question_sub == *sub {
        Some(RegexTerm::Star(Box::new(question_sub)))
      } else {
        None
      }
    }
    _ => None,
  }
}

fn push_flat(out: &mut Vec<RegexTerm>, term: RegexTerm) {
  if let RegexTerm::Concat(parts) = term {
    out.extend(parts);
  } else {
    out.push(term);
  }
}

/// Append to a concatenation list, attempting to merge the boundary terms.
fn concat_append(parts: &[RegexTerm], other: &RegexTerm) -> RegexTerm {
  if let RegexTerm::Concat(other_parts) = other {
    let mut result = RegexTerm::Concat(parts.to_vec());
    for se in other_parts {
      result = concat(&result, se);
    }
    return result;
  }
  let all_but_last = first_n(parts, parts.len() - 1);
  let last = &parts[parts.len() - 1];
  let combined = concat(last, other);
  if matches!(combined, RegexTerm::Concat(_)) {
    // the boundary terms did not merge into anything smaller
    let mut result = Vec::new();
    push_flat(&mut result, all_but_last);
    push_flat(&mut result, combined);
    RegexTerm::Concat(result)
  } else {
    concat(&all_but_last, &combined)
  }
}

fn concat_prepend(parts: &[RegexTerm], other: &RegexTerm) -> RegexTerm {
  if let RegexTerm::Concat(other_parts) = other {
    let mut result = RegexTerm::Concat(parts.to_vec());
    for se in other_parts.iter().rev() {
      result = concat(se, &result);
    }
    return result;
  }
  let all_but_first = last_n(parts, parts.len() - 1);
  let first = &parts[0];
  let combined = concat(other, first);
  if matches!(combined, RegexTerm::Concat(_)) {
    let mut result = Vec::new();
    push_flat(&mut result, combined);
    push_flat(&mut result, all_but_first);
    RegexTerm::Concat(result)
  } else {
    concat(&combined, &all_but_first)
  }
}

// endregion

pub fn star(a: &RegexTerm) -> RegexTerm {
  match a {
    RegexTerm::Null | RegexTerm::Epsilon => RegexTerm::Epsilon,
    RegexTerm::Star(_) => a.clone(),
    RegexTerm::Either(parts) if has_epsilon(parts) => star(&remove_epsilon(parts)),
    _ => RegexTerm::Star(Box::new(a.clone())),
  }
}

// region rendering

impl Display for RegexTerm {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      RegexTerm::Null => write!(f, "NULL"),
      RegexTerm::Epsilon => write!(f, "epsilon"),
      RegexTerm::Charset(set) => write!(f, "{}", from_charset(set)),
      RegexTerm::Either(subs) => {
        let mut body = String::new();
        let mut had_non_epsilon = false;
        for se in subs {
          if matches!(se, RegexTerm::Epsilon) {
            continue;
          }
          if had_non_epsilon {
            body.push('|');
          }
          body.push_str(&se.to_string());
          had_non_epsilon = true;
        }
        if has_epsilon(subs) {
          if internal_needs_parentheses(subs) {
            body = format!("({})", body);
          }
          body.push('?');
        }
        write!(f, "{}", body)
      }
      RegexTerm::Concat(subs) => {
        for se in subs {
          if se.needs_parentheses() {
            write!(f, "({})", se)?;
          } else {
            write!(f, "{}", se)?;
          }
        }
        Ok(())
      }
      RegexTerm::Star(sub) => {
        if sub.needs_parentheses() {
          write!(f, "({})*", sub)
        } else {
          write!(f, "{}*", sub)
        }
      }
    }
  }
}

fn has_range(set: &BTreeSet<char>, first: char, last: char) -> bool {
  (first..=last).all(|c| set.contains(&c))
}

fn remove_range(set: &mut BTreeSet<char>, first: char, last: char) {
  for c in first..=last {
    set.remove(&c);
  }
}

fn charset_contents(mut set: BTreeSet<char>) -> String {
  let mut result = String::new();
  for (first, last, label) in [('a', 'z', "a-z"), ('A', 'Z', "A-Z"), ('0', '9', "0-9")] {
    if has_range(&set, first, last) {
      remove_range(&mut set, first, last);
      result.push_str(label);
    }
  }
  for c in set {
    if META_CHARS.contains(c) {
      result.push('\\');
    }
    result.push(c);
  }
  result
}

/// Renders a character set as regex source. The empty set becomes the
/// impossible sentinel; a single character stands alone (escaped if it is a
/// metacharacter); otherwise whichever of the positive and negated class
/// forms is shorter wins, with `a-z`-style runs compressed.
pub fn from_charset(set: &BTreeSet<char>) -> String {
  if set.is_empty() {
    return IMPOSSIBLE.to_string();
  }
  if set.len() == 1 {
    let c = *set.iter().next().unwrap();
    if META_CHARS.contains(c) {
      return format!("\\{}", c);
    }
    return c.to_string();
  }
  let positive_contents = charset_contents(set.clone());
  let negative_contents = charset_contents(chartab::negate_set(set));
  if positive_contents.len() <= negative_contents.len() {
    format!("[{}]", positive_contents)
  } else {
    format!("[^{}]", negative_contents)
  }
}

// endregion

#[cfg(test)]
mod tests {
  use super::*;

  fn cs(chars: &str) -> RegexTerm {
    RegexTerm::Charset(chars.chars().collect())
  }

  #[test]
  fn either_identities() {
    let a = cs("a");
    assert_eq!(either(&a, &a), a);
    assert_eq!(either(&RegexTerm::Null, &a), a);
    assert_eq!(either(&a, &RegexTerm::Null), a);
    assert_eq!(either(&cs("ab"), &cs("bc")), cs("abc"));
    assert_eq!(either(&RegexTerm::Epsilon, &RegexTerm::Epsilon), RegexTerm::Epsilon);
  }

  #[test]
  fn star_absorbs_its_body() {
    let a = cs("a");
    let a_star = star(&a);
    assert_eq!(either(&a_star, &a), a_star);
    assert_eq!(either(&a_star, &RegexTerm::Epsilon), a_star);
    let a_question = either(&a, &RegexTerm::Epsilon);
    assert_eq!(either(&a_star, &a_question), a_star);
    assert_eq!(concat(&a_star, &a_star), a_star);
    assert_eq!(concat(&a_star, &a_question), a_star);
    assert_eq!(concat(&a_question, &a_star), a_star);
  }

  #[test]
  fn concat_identities() {
    let a = cs("a");
    let b = cs("b");
    assert_eq!(concat(&RegexTerm::Null, &a), RegexTerm::Null);
    assert_eq!(concat(&a, &RegexTerm::Null), RegexTerm::Null);
    assert_eq!(concat(&RegexTerm::Epsilon, &a), a);
    assert_eq!(concat(&a, &RegexTerm::Epsilon), a);
    assert_eq!(concat(&a, &b).to_string(), "ab");
  }

  #[test]
  fn star_identities() {
    assert_eq!(star(&RegexTerm::Null), RegexTerm::Epsilon);
    assert_eq!(star(&RegexTerm::Epsilon), RegexTerm::Epsilon);
    let a_star = star(&cs("a"));
    assert_eq!(star(&a_star), a_star);
    // (a|epsilon)* = a*
    let a_question = either(&cs("a"), &RegexTerm::Epsilon);
    assert_eq!(star(&a_question), a_star);
  }

  #[test]
  fn common_suffix_is_factored() {
    // ac | bc = (a|b)c
    let ac = concat(&cs("a"), &cs("c"));
    let bc = concat(&cs("b"), &cs("c"));
    let merged = either(&ac, &bc);
    assert_eq!(merged.to_string(), "[ab]c");
  }

  #[test]
  fn question_rendering() {
    let a_question = either(&cs("a"), &RegexTerm::Epsilon);
    assert_eq!(a_question.to_string(), "a?");
    let ab = concat(&cs("a"), &cs("b"));
    let ab_question = either(&ab, &RegexTerm::Epsilon);
    assert_eq!(ab_question.to_string(), "(ab)?");
  }

  #[test]
  fn charset_rendering() {
    assert_eq!(from_charset(&BTreeSet::new()), IMPOSSIBLE.to_string());
    assert_eq!(from_charset(&"a".chars().collect()), "a");
    assert_eq!(from_charset(&"*".chars().collect()), "\\*");
    assert_eq!(from_charset(&('a'..='z').collect()), "[a-z]");
    let all_but_a = chartab::negate_set(&"a".chars().collect());
    assert_eq!(from_charset(&all_but_a), "[^a]");
  }
}
