//! Condition parser
//!
//! Turns the raw token list of a rule premise into a `Vec<Condition>`.
//!
//! Grammar, one production per token shape:
//! - bare operator word: retroactively sets the trailing operator of the
//!   previously pushed condition
//! - token starting with `(`: opens a group that extends over as many tokens
//!   as it takes for the parenthesis depth to return to zero
//! - anything else: an atomic fact, optionally suffixed with an operator word
//!
//! The last condition never carries a trailing operator.

use crate::error::{EngineError, EngineResult};

use super::ast::{Condition, Operator};

/// Delimiter the caller split the raw premise on
const DELIMITER: char = ',';

/// Parse a token list into conditions.
///
/// Tokens are expected to be the comma-separated pieces of a premise. A group
/// may arrive as one token (`"(A, B, OR)"`) or spread over several
/// (`"(A"`, `"B"`, `"OR)"`).
pub fn parse_conditions<S: AsRef<str>>(tokens: &[S]) -> EngineResult<Vec<Condition>> {
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref().trim()).collect();
    Parser::new(&tokens).parse()
}

/// Parse a single premise string, splitting on top-level commas first
pub fn parse_condition_text(text: &str) -> EngineResult<Vec<Condition>> {
    parse_conditions(&split_top_level(text))
}

/// Split on commas that are not inside parentheses.
///
/// Empty pieces are dropped. An unbalanced string is still split; the parser
/// reports the imbalance.
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;

    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if c == DELIMITER && depth <= 0 {
            push_piece(&mut pieces, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_piece(&mut pieces, &current);
    pieces
}

fn push_piece(pieces: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
}

/// Split `"runny nose OR"` into `("runny nose", Some(Or))`.
///
/// The operator is only stripped when something remains in front of it.
pub fn split_trailing_operator(item: &str) -> (&str, Option<Operator>) {
    let item = item.trim();
    if let Some((head, last)) = item.rsplit_once(char::is_whitespace) {
        let head = head.trim_end();
        if !head.is_empty() {
            if let Some(op) = Operator::from_word(last) {
                return (head, Some(op));
            }
        }
    }
    (item, None)
}

/// Every ')' closes an earlier '(' and none is left open
fn is_balanced(text: &str) -> bool {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn paren_balance(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Cursor-driven parser state
struct Parser<'t> {
    tokens: &'t [&'t str],
    cursor: usize,
    conditions: Vec<Condition>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [&'t str]) -> Self {
        Self {
            tokens,
            cursor: 0,
            conditions: Vec::with_capacity(tokens.len()),
        }
    }

    fn parse(mut self) -> EngineResult<Vec<Condition>> {
        while let Some(token) = self.peek() {
            if token.is_empty() {
                return Err(EngineError::empty_condition(format!(
                    "Empty condition at position {}",
                    self.cursor
                )));
            }

            if let Some(op) = Operator::from_word(token) {
                self.assign_retroactive(op, token)?;
                self.cursor += 1;
            } else if token.starts_with('(') {
                self.parse_group()?;
            } else {
                self.parse_atomic(token)?;
            }
        }

        self.normalize()
    }

    fn peek(&self) -> Option<&'t str> {
        self.tokens.get(self.cursor).copied()
    }

    /// True when the token under the cursor is an operator word on its own
    fn next_is_bare_operator(&self) -> Option<Operator> {
        self.peek().and_then(Operator::from_word)
    }

    /// Trailing operator for a condition that did not spell one out
    fn default_trailing(&self) -> Option<Operator> {
        match self.peek() {
            None => None,
            // The bare operator will be assigned retroactively
            Some(_) if self.next_is_bare_operator().is_some() => None,
            Some(_) => Some(Operator::And),
        }
    }

    /// A bare operator word applies to the condition pushed before it
    fn assign_retroactive(&mut self, op: Operator, token: &str) -> EngineResult<()> {
        match self.conditions.last_mut() {
            Some(previous) => {
                previous.set_trailing(Some(op));
                Ok(())
            }
            None => Err(EngineError::malformed(
                token,
                "operator has no preceding condition",
            )),
        }
    }

    fn parse_atomic(&mut self, token: &str) -> EngineResult<()> {
        if !is_balanced(token) {
            return Err(EngineError::malformed(token, "unbalanced parenthesis"));
        }

        let (fact, explicit) = split_trailing_operator(token);
        if fact.is_empty() {
            return Err(EngineError::empty_condition(format!(
                "Empty fact name in '{}'",
                token
            )));
        }
        self.cursor += 1;

        let trailing = explicit.or_else(|| self.default_trailing());
        self.conditions.push(Condition::Atomic {
            fact: fact.to_string(),
            operator: trailing,
        });
        Ok(())
    }

    fn parse_group(&mut self) -> EngineResult<()> {
        let mut text = String::new();
        let mut depth: i64 = 0;

        loop {
            let Some(piece) = self.peek() else {
                return Err(EngineError::malformed(text, "unterminated group"));
            };
            if !text.is_empty() {
                text.push(DELIMITER);
                text.push(' ');
            }
            text.push_str(piece);
            depth += paren_balance(piece);
            self.cursor += 1;

            if depth < 0 {
                return Err(EngineError::malformed(text, "unbalanced ')'"));
            }
            if depth == 0 {
                break;
            }
        }

        // depth returned to zero, so at least one ')' exists
        let close = text.rfind(')').unwrap_or(text.len());
        let body = &text[..close];
        let tail = text.get(close + 1..).unwrap_or("").trim();

        let mut trailing = None;
        if !tail.is_empty() {
            match Operator::from_word(tail) {
                Some(op) => trailing = Some(op),
                None => {
                    return Err(EngineError::malformed(
                        text.as_str(),
                        "unexpected text after group",
                    ))
                }
            }
        }

        let stripped: String = body.chars().filter(|c| *c != '(' && *c != ')').collect();
        let mut facts = Vec::new();
        let mut group_operator = None;

        for item in stripped.split(DELIMITER).map(str::trim) {
            if item.is_empty() {
                return Err(EngineError::empty_condition(format!(
                    "Empty fact name in group '{}'",
                    text
                )));
            }
            if let Some(op) = Operator::from_word(item) {
                group_operator = Some(op);
                continue;
            }
            let (fact, op) = split_trailing_operator(item);
            if op.is_some() {
                group_operator = op;
            }
            facts.push(fact.to_string());
        }

        if facts.is_empty() {
            return Err(EngineError::empty_condition(format!(
                "Group '{}' has no facts",
                text
            )));
        }

        if trailing.is_none() {
            if let Some(op) = self.next_is_bare_operator() {
                trailing = Some(op);
                self.cursor += 1;
            }
        }
        let trailing = trailing.or_else(|| self.default_trailing());

        self.conditions.push(Condition::Group {
            facts,
            group_operator: group_operator.unwrap_or(Operator::And),
            operator: trailing,
        });
        Ok(())
    }

    fn normalize(mut self) -> EngineResult<Vec<Condition>> {
        match self.conditions.last_mut() {
            Some(last) => last.set_trailing(None),
            None => return Err(EngineError::empty_condition("Condition list is empty")),
        }
        Ok(self.conditions)
    }
}
