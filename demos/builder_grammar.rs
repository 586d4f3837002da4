use std::error::Error;

use bnf_gen::GrammarBuilder;

/// Builds a grammar rule by rule and runs both static checks before
/// generating from it.
fn main() -> Result<(), Box<dyn Error>> {
    let grammar = GrammarBuilder::new()
        .rule(r#"sentence  ::= subject " " verb [" " adverb] "." "#)
        .rule(r#"subject   ::= "the parser" | "the generator" | "the lexer""#)
        .rule(r#"verb      ::= "halts" | "recurses" | {"really "} "works""#)
        .rule(r#"adverb    ::= "eventually" | "loudly""#)
        .rule(r#"leftover  ::= "never printed""#)
        .build()?;

    for diagnostic in grammar.validate_defined() {
        eprintln!("{diagnostic}");
    }
    // Reports <leftover> as defined but never used.
    for diagnostic in grammar.validate_reachable("sentence") {
        eprintln!("{diagnostic}");
    }

    for i in 1..=8 {
        println!("{i}. {}", grammar.generate("sentence")?);
    }

    Ok(())
}
