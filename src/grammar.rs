use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use rand::Rng;

use crate::ast::{Expr, Rule};
use crate::lexer::{Lexer, TokenKind};
use crate::parser::{self, RuleForm};
use crate::utils::{Diagnostic, GrammarError, Result};

/// The complete rule table for a grammar.
///
/// Built once, one source line at a time, then read-only for validation
/// and generation. Insertion order carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: HashMap<String, Rule>,
}

impl Grammar {
    /// Create a new empty grammar
    pub fn new() -> Self {
        Grammar {
            rules: HashMap::new(),
        }
    }

    /// Parse a grammar from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Self::from_source(&source, &path.display().to_string())
    }

    /// Parse a grammar from source text, one rule per line.
    ///
    /// Every line is lexed and parsed independently: an error on one line
    /// does not stop the lines after it from being ingested, and all
    /// collected diagnostics are returned together.
    pub fn from_source(source: &str, file: &str) -> Result<Self> {
        let mut grammar = Grammar::new();
        let mut diagnostics = Vec::new();

        for (row, line) in source.lines().enumerate() {
            if let Err(diagnostic) = grammar.add_line(line, file, row) {
                diagnostics.push(diagnostic);
            }
        }

        if diagnostics.is_empty() {
            Ok(grammar)
        } else {
            Err(GrammarError::Source(diagnostics))
        }
    }

    /// Lex and parse one source line and merge it into the grammar.
    /// Blank and comment-only lines are accepted and ignored.
    pub fn add_line(
        &mut self,
        line: &str,
        file: &str,
        row: usize,
    ) -> std::result::Result<(), Diagnostic> {
        let mut lexer = Lexer::new(line, file, row);

        if lexer.peek()?.kind == TokenKind::Eol {
            return Ok(());
        }

        let (rule, form) = parser::parse_rule(&mut lexer)?;
        parser::expect_token(&mut lexer, TokenKind::Eol)?;

        match form {
            RuleForm::Define => self.define(rule),
            RuleForm::Extend => self.extend(rule),
        }
    }

    /// Insert a fresh rule. Redefining an existing name is an error that
    /// cites both definitions.
    pub fn define(&mut self, rule: Rule) -> std::result::Result<(), Diagnostic> {
        let name = rule.head.text.clone();
        if let Some(existing) = self.rules.get(&name) {
            return Err(Diagnostic::new(
                rule.head.loc,
                format!(
                    "redefinition of symbol <{name}> which is already defined at {}",
                    existing.head.loc
                ),
            ));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Append the rule's body as one more alternative of an existing rule
    /// (the `=/` form). A non-alternation body is promoted to a
    /// two-variant alternation first.
    pub fn extend(&mut self, rule: Rule) -> std::result::Result<(), Diagnostic> {
        let name = rule.head.text.clone();
        let Some(mut existing) = self.rules.remove(&name) else {
            return Err(Diagnostic::new(
                rule.head.loc,
                format!("cannot add an alternative to symbol <{name}> which is not defined yet"),
            ));
        };

        existing.body = match existing.body {
            Expr::Alternation { loc, mut variants } => {
                variants.push(rule.body);
                Expr::Alternation { loc, variants }
            }
            old => {
                let loc = old.loc().clone();
                Expr::Alternation {
                    loc,
                    variants: vec![old, rule.body],
                }
            }
        };
        self.rules.insert(name, existing);
        Ok(())
    }

    /// Look up a rule by name
    pub fn lookup(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// All rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get a reference to the grammar's rules
    pub fn rules(&self) -> &HashMap<String, Rule> {
        &self.rules
    }

    /// Report every symbol reference whose name has no rule, across every
    /// rule body in the grammar.
    pub fn validate_defined(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for rule in self.rules.values() {
            self.check_defined(&rule.body, &mut diagnostics);
        }
        sort_by_loc(&mut diagnostics);
        diagnostics
    }

    fn check_defined(&self, expr: &Expr, diagnostics: &mut Vec<Diagnostic>) {
        match expr {
            Expr::Symbol { loc, name } => {
                if !self.rules.contains_key(name) {
                    diagnostics.push(Diagnostic::new(
                        loc.clone(),
                        format!("symbol <{name}> is not defined"),
                    ));
                }
            }
            Expr::String { .. } | Expr::Range { .. } => {}
            Expr::Concat {
                elements: children, ..
            }
            | Expr::Alternation {
                variants: children, ..
            } => {
                for child in children {
                    self.check_defined(child, diagnostics);
                }
            }
            Expr::Repetition { body, .. } => self.check_defined(body, diagnostics),
        }
    }

    /// Report every rule that is not reachable from `entry` through
    /// symbol references. The walk keeps a visited set keyed by rule
    /// name, so mutually recursive grammars terminate.
    pub fn validate_reachable(&self, entry: &str) -> Vec<Diagnostic> {
        let mut visited = HashSet::new();
        let mut stack = vec![entry.to_string()];

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(rule) = self.rules.get(&name) {
                collect_symbols(&rule.body, &mut stack);
            }
        }

        let mut diagnostics: Vec<Diagnostic> = self
            .rules
            .values()
            .filter(|rule| !visited.contains(&rule.head.text))
            .map(|rule| {
                Diagnostic::new(
                    rule.head.loc.clone(),
                    format!("symbol <{}> is defined but never used", rule.head.text),
                )
            })
            .collect();
        sort_by_loc(&mut diagnostics);
        diagnostics
    }

    /// Generate one message starting from the rule named `entry`, using
    /// the thread-local random generator.
    pub fn generate(&self, entry: &str) -> Result<String> {
        self.generate_with(entry, &mut rand::thread_rng())
    }

    /// Generate one message with an explicitly supplied random source, so
    /// the output is reproducible under a fixed seed.
    pub fn generate_with<R: Rng + ?Sized>(&self, entry: &str, rng: &mut R) -> Result<String> {
        let rule = self
            .lookup(entry)
            .ok_or_else(|| GrammarError::UndefinedEntry(entry.to_string()))?;

        let mut out = String::new();
        self.expand(&rule.body, rng, &mut out)?;
        Ok(out)
    }

    /// Recursively expand `expr`, appending the produced text to `out`.
    ///
    /// There is no depth cap: a grammar whose every expansion path
    /// re-enters itself recurses until the stack runs out. Bounding such
    /// grammars is the caller's responsibility.
    fn expand<R: Rng + ?Sized>(
        &self,
        expr: &Expr,
        rng: &mut R,
        out: &mut String,
    ) -> Result<()> {
        match expr {
            Expr::String { text, .. } => out.push_str(text),
            Expr::Symbol { loc, name } => {
                // The definedness validator is optional, so the lookup
                // can still fail here.
                let rule = self.rules.get(name).ok_or_else(|| {
                    Diagnostic::new(loc.clone(), format!("symbol <{name}> is not defined"))
                })?;
                self.expand(&rule.body, rng, out)?;
            }
            Expr::Concat { elements, .. } => {
                for element in elements {
                    self.expand(element, rng, out)?;
                }
            }
            Expr::Alternation { variants, .. } => {
                let pick = rng.gen_range(0..variants.len());
                self.expand(&variants[pick], rng, out)?;
            }
            Expr::Repetition {
                loc,
                body,
                lower,
                upper,
            } => {
                if lower > upper {
                    return Err(Diagnostic::new(
                        loc.clone(),
                        format!(
                            "repetition lower bound {lower} is greater than its upper bound {upper}"
                        ),
                    )
                    .into());
                }
                let count = rng.gen_range(*lower..=*upper);
                for _ in 0..count {
                    self.expand(body, rng, out)?;
                }
            }
            Expr::Range { loc, lower, upper } => {
                if lower > upper {
                    return Err(Diagnostic::new(
                        loc.clone(),
                        format!(
                            "range lower bound {lower:?} is greater than its upper bound {upper:?}"
                        ),
                    )
                    .into());
                }
                out.push(rng.gen_range(*lower..=*upper));
            }
        }
        Ok(())
    }
}

fn collect_symbols(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Symbol { name, .. } => out.push(name.clone()),
        Expr::String { .. } | Expr::Range { .. } => {}
        Expr::Concat {
            elements: children, ..
        }
        | Expr::Alternation {
            variants: children, ..
        } => {
            for child in children {
                collect_symbols(child, out);
            }
        }
        Expr::Repetition { body, .. } => collect_symbols(body, out),
    }
}

fn sort_by_loc(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (&a.loc.file, a.loc.row, a.loc.col).cmp(&(&b.loc.file, b.loc.row, b.loc.col))
    });
}

/// Builder assembling a [`Grammar`] from source lines, collecting every
/// diagnostic instead of failing on the first one.
pub struct GrammarBuilder {
    grammar: Grammar,
    diagnostics: Vec<Diagnostic>,
    row: usize,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder {
            grammar: Grammar::new(),
            diagnostics: Vec::new(),
            row: 0,
        }
    }

    /// Ingest one grammar source line. Errors are collected and surfaced
    /// by [`GrammarBuilder::build`].
    pub fn rule(mut self, line: &str) -> Self {
        if let Err(diagnostic) = self.grammar.add_line(line, "<builder>", self.row) {
            self.diagnostics.push(diagnostic);
        }
        self.row += 1;
        self
    }

    /// Build the grammar, failing with every collected diagnostic.
    pub fn build(self) -> Result<Grammar> {
        if self.diagnostics.is_empty() {
            Ok(self.grammar)
        } else {
            Err(GrammarError::Source(self.diagnostics))
        }
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}
