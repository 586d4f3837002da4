use std::error::Error;

use rand::SeedableRng;
use rand::rngs::StdRng;

use bnf_gen::Grammar;

/// Generates serial-number-like identifiers from a small grammar, once
/// with the thread-local generator and once reproducibly from a seed.
fn main() -> Result<(), Box<dyn Error>> {
    let source = r#"
        // PRODUCT-AB12-3456 style serial numbers
        serial   ::= family "-" 2 upper 2 digit "-" 4 digit [revision]
        family   ::= "CORE" | "EDGE" | "NANO"
        upper    ::= "A" ... "Z"
        digit    ::= %x30-39
        revision ::= "/r" ("1" | "2" | "3")
    "#;

    let grammar = Grammar::from_source(source, "serials.bnf")?;

    println!("Fresh serial numbers:");
    for i in 1..=5 {
        println!("{i}. {}", grammar.generate("serial")?);
    }

    println!("\nReproducible serial numbers (seed 42):");
    let mut rng = StdRng::seed_from_u64(42);
    for i in 1..=5 {
        println!("{i}. {}", grammar.generate_with("serial", &mut rng)?);
    }

    Ok(())
}
