// SPDX-License-Identifier: MIT

//! `$[ expr ]` template expansion, pluggable via registered [`Evaluator`]s.
//!
//! Tokens are scanned left to right; for each one, evaluators are tried
//! in registration order and the first to return `Some` wins. Its value
//! is coerced to a string and spliced in verbatim — the substituted text
//! is never itself rescanned for further tokens. A token none of the
//! evaluators resolve is left untouched.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `$[ <expr> ]` where `<expr>` contains neither `$`, `[`, `]`
/// nor a newline.
#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\[([^$\[\]\n]+)\]").expect("constant regex pattern is valid"));

/// Resolves a token's expression to a value, or declines by returning
/// `None` so the next evaluator in line gets a turn.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expr: &str) -> Option<String>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn evaluate(&self, expr: &str) -> Option<String> {
        self(expr)
    }
}

/// Holds a set of evaluators, tried in registration order.
#[derive(Default)]
pub struct TemplateEngine {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evaluator after every evaluator already registered.
    pub fn register(&mut self, evaluator: impl Evaluator + 'static) -> &mut Self {
        self.evaluators.push(Box::new(evaluator));
        self
    }

    /// Rewrite every `$[ expr ]` token in `input`, leaving tokens no
    /// evaluator resolves verbatim. Pure: the same input and evaluator
    /// set always produce the same output, and text with no tokens
    /// passes through unchanged.
    pub fn expand(&self, input: &str) -> String {
        TOKEN_PATTERN
            .replace_all(input, |caps: &regex::Captures| {
                let expr = caps[1].trim();
                for evaluator in &self.evaluators {
                    if let Some(value) = evaluator.evaluate(expr) {
                        return value;
                    }
                }
                caps[0].to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
