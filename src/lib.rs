/*!

`lanegen` turns a declarative description of a language, a list of named
tokens with regular-expression patterns plus a context-free grammar, into the
deterministic tables needed to lex and LALR(1)-parse inputs in that language.

The crate is three tightly coupled subsystems:

  1. a regular-expression engine: regex strings are parsed into NFAs,
     determinized by powerset construction, minimized, and optionally turned
     back into regex strings by state elimination;
  2. lexer construction: the per-token NFAs are united into a single DFA
     whose accept vector emits the lowest-numbered matching token;
  3. LALR(1) table construction: the LR(0) machine is built, inadequate
     states are found, and lookahead contexts are resolved with David
     Pager's lane-tracing algorithm.

The regex metalanguage is itself described as a grammar whose parser is built
by this very crate on first use; see [`regex`].

Everything operates on in-memory values. There is no I/O, no internal
concurrency, and for identical inputs the output tables are identical.

*/

pub mod error;
pub mod chartab;
pub mod automaton;
pub mod grammar;
pub mod builder;
pub mod tables;
pub mod driver;
pub mod regex;
pub mod language;

pub use automaton::FiniteAutomaton;
pub use error::{BuildError, ParseError};
pub use grammar::{Grammar, GrammarPtr, Production};
pub use language::{
  build_parser_tables, Indentation, Language, LanguageProduction, ParserTables, ParserTablesPtr,
  Token,
};
pub use tables::{Action, ShiftReduceTables};

// We alias the index types to make the role of each integer explicit.

/// A state in an automaton or in a shift-reduce table. `-1` means "none".
pub type StateId = i32;
/// Index into a language's token list. `-1` marks a non-accepting state.
pub type TokenId = i32;
/// A chartab symbol or a grammar symbol, depending on context.
pub type SymbolId = usize;
/// Index into a grammar's production list.
pub type ProductionId = usize;

/// Sentinel for a missing transition or GOTO entry.
pub const NO_STATE: StateId = -1;
/// Sentinel for a non-accepting automaton state.
pub const NO_TOKEN: TokenId = -1;
