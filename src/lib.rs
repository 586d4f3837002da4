//! bnf-gen compiles a BNF/ABNF-like grammar and generates random
//! messages conforming to it.
//!
//! A grammar is written one rule per line. Each rule body is compiled to
//! an expression tree, and messages are produced by walking that tree
//! with a random source: alternations pick one variant, repetitions pick
//! a count within their bounds, and character ranges pick one scalar.
//!
//! # Example
//!
//! ```rust
//! use bnf_gen::Grammar;
//!
//! let source = r#"
//!     greeting ::= "Hello, " name "!"
//!     name     ::= "world" | "Rust"
//! "#;
//! let grammar = Grammar::from_source(source, "greeting.bnf").unwrap();
//! let text = grammar.generate("greeting").unwrap();
//! assert!(text == "Hello, world!" || text == "Hello, Rust!");
//! ```

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod utils;

pub use ast::{Expr, Rule};
pub use grammar::{Grammar, GrammarBuilder};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{DEFAULT_MAX_REPETITION, RuleForm};
pub use utils::{Diagnostic, GrammarError, Loc, Result};
