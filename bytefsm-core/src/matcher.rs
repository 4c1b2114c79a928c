//! Input matchers.
//!
//! A [`Matcher`] is a predicate over the unconsumed input: it either rejects
//! the input or accepts it and reports how many bytes it consumed. Entries
//! carrying predicates accept on the first predicate that does.
//!
//! A [`LiteralMatcher`] compares a literal transition key against the input.
//! Each machine owns one; [`ExactBytes`] is the default.

use std::sync::Arc;

/// Predicate over the remaining input.
///
/// Returns `Some(n)` to accept while consuming `n` bytes, `None` to reject.
/// `n` must not exceed `input.len()`.
pub trait Matcher {
    fn matches(&self, input: &[u8]) -> Option<usize>;
}

impl<F> Matcher for F
where
    F: Fn(&[u8]) -> Option<usize>,
{
    fn matches(&self, input: &[u8]) -> Option<usize> {
        self(input)
    }
}

/// Shared predicate handle; one predicate is often registered on many entries.
///
/// Predicates are `Send + Sync` so a finished [`StateGraph`] can be shared
/// between threads that each drive their own machine.
///
/// [`StateGraph`]: crate::state::StateGraph
pub type Predicate = Arc<dyn Matcher + Send + Sync>;

/// Wraps a closure as a [`Predicate`].
pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&[u8]) -> Option<usize> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compares a literal key against an input prefix of the same length.
///
/// The engine only calls this once the input is known to be at least as long
/// as the key, so `prefix.len() == key.len()` always holds.
pub trait LiteralMatcher {
    fn compare(&self, key: &[u8], prefix: &[u8]) -> bool;
}

/// Case-sensitive byte equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactBytes;

impl LiteralMatcher for ExactBytes {
    fn compare(&self, key: &[u8], prefix: &[u8]) -> bool {
        key == prefix
    }
}

/// ASCII case-insensitive comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCaseInsensitive;

impl LiteralMatcher for AsciiCaseInsensitive {
    fn compare(&self, key: &[u8], prefix: &[u8]) -> bool {
        key.eq_ignore_ascii_case(prefix)
    }
}

fn one_byte(input: &[u8], accept: impl Fn(u8) -> bool) -> Option<usize> {
    input.first().copied().filter(|b| accept(*b)).map(|_| 1)
}

/// Accepts any single byte. The default wildcard predicate.
pub fn any_byte(input: &[u8]) -> Option<usize> {
    one_byte(input, |_| true)
}

/// `0`-`9`
pub fn ascii_digit(input: &[u8]) -> Option<usize> {
    one_byte(input, |b| b.is_ascii_digit())
}

/// `a`-`z`
pub fn ascii_lower(input: &[u8]) -> Option<usize> {
    one_byte(input, |b| b.is_ascii_lowercase())
}

/// `A`-`Z`
pub fn ascii_upper(input: &[u8]) -> Option<usize> {
    one_byte(input, |b| b.is_ascii_uppercase())
}

/// ASCII letters and digits
pub fn ascii_alphanumeric(input: &[u8]) -> Option<usize> {
    one_byte(input, |b| b.is_ascii_alphanumeric())
}

/// Builds a predicate accepting one byte from `set`.
pub fn byte_in(set: &[u8]) -> Predicate {
    let set = set.to_vec();
    predicate(move |input: &[u8]| one_byte(input, |b| set.contains(&b)))
}
