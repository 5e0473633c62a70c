//! A token cursor with checkpoint/restore.
//!
//! Backtracking is a named capability here: grammar disambiguation saves a
//! [`Checkpoint`] and restores it instead of fiddling with raw indices.

use crate::lexer::Token;
use std::ops::Range;

/// An opaque saved cursor position.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint(usize);

/// Forward cursor over a lexed token sequence.
pub struct TokenCursor {
    tokens: Vec<Token>,
    spans: Vec<Range<usize>>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>, spans: Vec<Range<usize>>) -> Self {
        debug_assert_eq!(tokens.len(), spans.len());
        Self {
            tokens,
            spans,
            pos: 0,
        }
    }

    /// The token under the cursor, or [`Token::Eof`] past the end.
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    /// The byte span of the token under the cursor. Past the end, an empty
    /// span at the end of input.
    pub fn span(&self) -> Range<usize> {
        match self.spans.get(self.pos) {
            Some(span) => span.clone(),
            None => {
                let end = self.spans.last().map(|span| span.end).unwrap_or(0);
                end..end
            }
        }
    }

    /// Moves past the current token and returns the new current token.
    pub fn advance(&mut self) -> Token {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.current().clone()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Index of the current token. Only for progress checks during error
    /// recovery; backtracking goes through [`TokenCursor::checkpoint`].
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Saves the current position for a later [`TokenCursor::restore`].
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    /// Rewinds to a previously saved position.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_spanned;

    fn cursor(source: &str) -> TokenCursor {
        let (tokens, spans) = lex_spanned(source).unwrap();
        TokenCursor::new(tokens, spans)
    }

    #[test]
    fn advance_and_eof() {
        let mut cursor = cursor("1 + 2");
        assert_eq!(*cursor.current(), Token::Number("1".to_string()));
        cursor.advance();
        assert_eq!(*cursor.current(), Token::Plus);
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_at_end());
        assert_eq!(*cursor.current(), Token::Eof);
        // advancing past the end stays at Eof
        cursor.advance();
        assert_eq!(*cursor.current(), Token::Eof);
    }

    #[test]
    fn checkpoint_restore() {
        let mut cursor = cursor("int x = 5;");
        let start = cursor.checkpoint();
        cursor.advance();
        cursor.advance();
        assert_eq!(*cursor.current(), Token::Equals);
        cursor.restore(start);
        assert_eq!(
            *cursor.current(),
            Token::Type(crate::ast::DataType::Int)
        );
    }

    #[test]
    fn span_at_end() {
        let mut cursor = cursor("ab cd");
        cursor.advance();
        assert_eq!(cursor.span(), 3..5);
        cursor.advance();
        assert_eq!(cursor.span(), 5..5);
    }
}
