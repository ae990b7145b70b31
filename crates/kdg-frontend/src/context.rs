//! Whitespace-token cursor threaded through the list parser.

/// A cursor over the whitespace-separated tokens of one entry line.
/// Parsing routines take this by `&mut` so the consumed position is
/// explicit at every call site.
#[derive(Debug, Clone)]
pub(crate) struct TokenCursor<'a> {
    rest: &'a str,
}

impl<'a> TokenCursor<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self { rest: line.trim() }
    }

    /// Consume and return the next token.
    pub(crate) fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                self.rest = &rest[end..];
                Some(&rest[..end])
            }
            None => {
                self.rest = "";
                Some(rest)
            }
        }
    }

    /// Look at the next token without consuming it.
    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.clone().next()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rest.trim_start().is_empty()
    }
}
