use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use bnf_gen::{Grammar, GrammarError};

/// Grammar-based random message generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file
    #[arg(short, long)]
    file: PathBuf,

    /// Rule name to start generating from; pass '!' to list all rule
    /// names in the file
    #[arg(short, long)]
    entry: String,

    /// How many messages to generate
    #[arg(short, long, default_value_t = 1)]
    count: usize,

    /// Check that every referenced symbol is defined
    #[arg(long)]
    verify: bool,

    /// Report rules that are not reachable from the entry rule
    #[arg(long)]
    unused: bool,

    /// Print the entry rule's definition instead of generating
    #[arg(long)]
    dump: bool,

    /// With --dump, print the rule as JSON
    #[arg(long)]
    json: bool,

    /// Seed for the random generator, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let grammar = Grammar::from_file(&cli.file)?;

    if cli.entry == "!" {
        for name in grammar.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(rule) = grammar.lookup(&cli.entry) else {
        return Err(GrammarError::UndefinedEntry(cli.entry.clone()).into());
    };

    let mut diagnostics = Vec::new();
    if cli.verify {
        diagnostics.extend(grammar.validate_defined());
    }
    if cli.unused {
        diagnostics.extend(grammar.validate_reachable(&cli.entry));
    }
    if !diagnostics.is_empty() {
        return Err(GrammarError::Source(diagnostics).into());
    }

    if cli.dump {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(rule)?);
        } else {
            println!("{rule}");
        }
        return Ok(());
    }

    let mut rng: StdRng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for _ in 0..cli.count {
        println!("{}", grammar.generate_with(&cli.entry, &mut rng)?);
    }

    Ok(())
}
