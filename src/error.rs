use std::fmt::{Display, Formatter};

/// Errors surfaced while building tables from a language description.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BuildError {
  /// Malformed `Language` descriptor: empty names, unknown symbols,
  /// inconsistent indentation tokens.
  Config(String),
  /// A token's regular expression failed to parse. The diagnostic holds a
  /// step-by-step trace of the failing parse.
  RegexParse {
    name: String,       //< token the regex belongs to
    regex: String,      //< the offending pattern
    diagnostic: String, //< trace from the second, instrumented parse
  },
  /// Conflicts survived lane tracing; the grammar is not LALR(1).
  NotLalr1 {
    summary: String, //< shift-reduce summary per conflicting state
  },
  /// Lane tracing found a configuration that requires contexts from a lane
  /// it is already part of; the grammar is ambiguous.
  Ambiguous(String),
  /// A self-check failed. Indicates a bug in this crate, not in the input.
  Invariant(String),
}

impl Display for BuildError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      BuildError::Config(msg) => write!(f, "configuration error: {}", msg),
      BuildError::RegexParse { name, regex, diagnostic } => {
        write!(
          f,
          "couldn't build DFA for token \"{}\" regex \"{}\"\n{}",
          name, regex, diagnostic
        )
      }
      BuildError::NotLalr1 { summary } => {
        write!(f, "the grammar is not LALR(1)\n{}", summary)
      }
      BuildError::Ambiguous(msg) => write!(f, "the grammar is ambiguous: {}", msg),
      BuildError::Invariant(msg) => write!(f, "internal invariant violated: {}", msg),
    }
  }
}

impl std::error::Error for BuildError {}

/// Errors produced by the table-driven driver while lexing or parsing an
/// input string.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
  /// No token matches at the given byte offset.
  Lex {
    name: String,    //< caller-supplied name of the input
    position: usize, //< byte offset where lexing got stuck
  },
  /// A token was recognized but no action exists for it in the current
  /// parser state.
  UnexpectedToken {
    name: String,
    position: usize,
    text: String, //< the lexeme that had no action
  },
  /// Input ended while the parser still expected more.
  UnexpectedEnd { name: String },
}

impl Display for ParseError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ParseError::Lex { name, position } => {
        write!(f, "{}: no token matches at byte {}", name, position)
      }
      ParseError::UnexpectedToken { name, position, text } => {
        write!(f, "{}: unexpected \"{}\" at byte {}", name, text, position)
      }
      ParseError::UnexpectedEnd { name } => {
        write!(f, "{}: unexpected end of input", name)
      }
    }
  }
}

impl std::error::Error for ParseError {}
