use crate::ast::{Expr, Rule};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::utils::Diagnostic;

/// Upper bound used for repetitions that do not spell one out: `{...}`,
/// `*expr` and `n*expr`. A policy choice, not something the grammar
/// expresses.
pub const DEFAULT_MAX_REPETITION: u32 = 20;

/// Which separator introduced a parsed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleForm {
    /// `::=` or `=`: a fresh definition.
    Define,
    /// `=/`: an additional alternative for an already-defined rule.
    Extend,
}

/// Consume the next token, requiring it to be of the given kind.
pub fn expect_token(lexer: &mut Lexer, kind: TokenKind) -> Result<Token, Diagnostic> {
    let token = lexer.next_token()?;
    if token.kind != kind {
        return Err(Diagnostic::new(
            token.loc.clone(),
            format!("expected {} but got {}", kind.name(), token.kind.name()),
        ));
    }
    Ok(token)
}

/// Token kinds that may begin a primary expression. Concatenation keeps
/// consuming primaries for as long as this holds for the lookahead.
pub fn is_primary_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Symbol
            | TokenKind::String
            | TokenKind::BracketOpen
            | TokenKind::CurlyOpen
            | TokenKind::ParenOpen
            | TokenKind::Number
            | TokenKind::Asterisk
            | TokenKind::ValueRange
    )
}

fn single_char(token: &Token, which: &str) -> Result<char, Diagnostic> {
    let mut chars = token.text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(Diagnostic::new(
            token.loc.clone(),
            format!(
                "the {which} boundary of the range is expected to be a one character string, but it has {} characters",
                token.text.chars().count()
            ),
        )),
    }
}

fn parse_primary(lexer: &mut Lexer) -> Result<Expr, Diagnostic> {
    let token = lexer.next_token()?;
    match token.kind {
        TokenKind::ParenOpen => {
            let expr = parse_expr(lexer)?;
            expect_token(lexer, TokenKind::ParenClose)?;
            Ok(expr)
        }
        TokenKind::CurlyOpen => {
            let body = parse_expr(lexer)?;
            expect_token(lexer, TokenKind::CurlyClose)?;
            Ok(Expr::Repetition {
                loc: token.loc,
                body: Box::new(body),
                lower: 0,
                upper: DEFAULT_MAX_REPETITION,
            })
        }
        TokenKind::BracketOpen => {
            let body = parse_expr(lexer)?;
            expect_token(lexer, TokenKind::BracketClose)?;
            Ok(Expr::Repetition {
                loc: token.loc,
                body: Box::new(body),
                lower: 0,
                upper: 1,
            })
        }
        TokenKind::Symbol => Ok(Expr::Symbol {
            loc: token.loc,
            name: token.text,
        }),
        TokenKind::String => {
            // A string followed by `...` is a character range, not a
            // literal; both boundaries must be one character long.
            let ellipsis = lexer.peek()?;
            if ellipsis.kind != TokenKind::Ellipsis {
                return Ok(Expr::String {
                    loc: token.loc,
                    text: token.text,
                });
            }

            let lower = single_char(&token, "lower")?;
            lexer.reset_peek();

            let upper_token = expect_token(lexer, TokenKind::String)?;
            let upper = single_char(&upper_token, "upper")?;

            Ok(Expr::Range {
                loc: ellipsis.loc,
                lower,
                upper,
            })
        }
        TokenKind::ValueRange => {
            let mut bounds = token.text.chars();
            match (bounds.next(), bounds.next()) {
                (Some(lower), Some(upper)) => Ok(Expr::Range {
                    loc: token.loc,
                    lower,
                    upper,
                }),
                _ => Err(Diagnostic::new(token.loc, "malformed value range token")),
            }
        }
        TokenKind::Asterisk => {
            let mut upper = DEFAULT_MAX_REPETITION;
            if lexer.peek()?.kind == TokenKind::Number {
                upper = lexer.next_token()?.number;
            }
            let body = parse_primary(lexer)?;
            Ok(Expr::Repetition {
                loc: token.loc,
                body: Box::new(body),
                lower: 0,
                upper,
            })
        }
        TokenKind::Number => {
            let lower = token.number;
            if lexer.peek()?.kind == TokenKind::Asterisk {
                lexer.reset_peek();
                let mut upper = DEFAULT_MAX_REPETITION;
                if lexer.peek()?.kind == TokenKind::Number {
                    upper = lexer.next_token()?.number;
                }
                let body = parse_primary(lexer)?;
                Ok(Expr::Repetition {
                    loc: token.loc,
                    body: Box::new(body),
                    lower,
                    upper,
                })
            } else {
                // A bare count repeats the following primary exactly.
                let body = parse_primary(lexer)?;
                Ok(Expr::Repetition {
                    loc: token.loc,
                    body: Box::new(body),
                    lower,
                    upper: lower,
                })
            }
        }
        _ => Err(Diagnostic::new(
            token.loc,
            format!(
                "expected start of an expression, but got {}",
                token.kind.name()
            ),
        )),
    }
}

fn parse_concat(lexer: &mut Lexer) -> Result<Expr, Diagnostic> {
    let primary = parse_primary(lexer)?;

    if !is_primary_start(lexer.peek()?.kind) {
        return Ok(primary);
    }

    let loc = primary.loc().clone();
    let mut elements = vec![primary];
    while is_primary_start(lexer.peek()?.kind) {
        elements.push(parse_primary(lexer)?);
    }

    Ok(Expr::Concat { loc, elements })
}

fn parse_alternation(lexer: &mut Lexer) -> Result<Expr, Diagnostic> {
    let concat = parse_concat(lexer)?;

    if lexer.peek()?.kind != TokenKind::Alternation {
        return Ok(concat);
    }

    let loc = concat.loc().clone();
    let mut variants = vec![concat];
    while lexer.peek()?.kind == TokenKind::Alternation {
        expect_token(lexer, TokenKind::Alternation)?;
        variants.push(parse_concat(lexer)?);
    }

    Ok(Expr::Alternation { loc, variants })
}

/// Parse a full rule body: alternation binds loosest, then concatenation,
/// then the primary forms.
pub fn parse_expr(lexer: &mut Lexer) -> Result<Expr, Diagnostic> {
    parse_alternation(lexer)
}

/// Parse one `SYMBOL (::= | = | =/) EXPRESSION` line. Checking that
/// nothing follows the expression is the per-line driver's job.
pub fn parse_rule(lexer: &mut Lexer) -> Result<(Rule, RuleForm), Diagnostic> {
    let head = expect_token(lexer, TokenKind::Symbol)?;

    let sep = lexer.next_token()?;
    let form = match sep.kind {
        TokenKind::Definition => RuleForm::Define,
        TokenKind::IncrementalAlternative => RuleForm::Extend,
        _ => {
            return Err(Diagnostic::new(
                sep.loc,
                format!(
                    "expected {} or {} but got {}",
                    TokenKind::Definition.name(),
                    TokenKind::IncrementalAlternative.name(),
                    sep.kind.name()
                ),
            ));
        }
    };

    let body = parse_expr(lexer)?;
    Ok((Rule { head, body }, form))
}
