//! Lexer implementation

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer for the tag section of a documentation block.
///
/// Whitespace is significant (it ends plain tags), so it is emitted as a
/// token. A quote that is never closed is an ordinary word character.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    // Earliest offset known to start an unterminated `'` / `"` string.
    unterminated: [Option<usize>; 2],
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            unterminated: [None, None],
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Token {
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '@' => self.single(TokenKind::At),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                '=' => self.single(TokenKind::Equals),
                ':' if self.is_lone_colon(self.pos) => self.single(TokenKind::Colon),
                c if c.is_whitespace() => self.scan_whitespace(),
                '\'' | '"' if self.closes_quote(self.pos, c) => self.scan_quoted(c),
                _ => self.scan_word(),
            },
        };

        Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn scan_whitespace(&mut self) -> TokenKind {
        let mut newline = false;
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            newline |= c == '\n';
            self.advance();
        }
        TokenKind::Whitespace { newline }
    }

    /// Scan a quoted string. The caller has checked that it is terminated.
    fn scan_quoted(&mut self, quote: char) -> TokenKind {
        self.advance(); // opening quote
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == quote {
                break;
            }
            self.advance();
            if c == '\\' {
                self.advance();
            }
        }
        let content = self.source[start..self.pos].to_string();
        self.advance(); // closing quote
        TokenKind::Quoted(content)
    }

    fn scan_word(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            let delimiter = match c {
                '@' | '(' | ')' | '{' | '}' | ',' | '=' => true,
                ':' => self.is_lone_colon(self.pos),
                '\'' | '"' => self.closes_quote(self.pos, c),
                c => c.is_whitespace(),
            };
            if delimiter {
                break;
            }
            self.advance();
        }
        TokenKind::Word(self.source[start..self.pos].to_string())
    }

    /// A colon is a symbol only when neither neighbour is a colon.
    fn is_lone_colon(&self, at: usize) -> bool {
        let bytes = self.source.as_bytes();
        let before = at > 0 && bytes[at - 1] == b':';
        let after = bytes.get(at + 1) == Some(&b':');
        !before && !after
    }

    /// Whether the quote at `at` has a matching unescaped closing quote.
    fn closes_quote(&mut self, at: usize, quote: char) -> bool {
        let slot = usize::from(quote == '"');
        if matches!(self.unterminated[slot], Some(known) if known <= at) {
            return false;
        }
        let mut rest = self.source[at + 1..].chars();
        while let Some(c) = rest.next() {
            if c == '\\' {
                rest.next();
            } else if c == quote {
                return true;
            }
        }
        // Every later quote of this kind is escaped from here, so none closes.
        self.unterminated[slot] = Some(at);
        false
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    fn word(w: &str) -> TokenKind {
        TokenKind::Word(w.to_string())
    }

    #[test]
    fn test_symbols_and_words() {
        assert_eq!(
            kinds("@Foo(a: 1, {x})"),
            vec![
                TokenKind::At,
                word("Foo"),
                TokenKind::LParen,
                word("a"),
                TokenKind::Colon,
                TokenKind::Whitespace { newline: false },
                word("1"),
                TokenKind::Comma,
                TokenKind::Whitespace { newline: false },
                TokenKind::LBrace,
                word("x"),
                TokenKind::RBrace,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_double_colon_stays_in_word() {
        assert_eq!(
            kinds("Route::GET:a"),
            vec![word("Route::GET"), TokenKind::Colon, word("a"), TokenKind::Eof]
        );
        assert_eq!(kinds(":::"), vec![word(":::"), TokenKind::Eof]);
    }

    #[test]
    fn test_quoted_strings_keep_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a, b""#),
            vec![
                TokenKind::Quoted(r"it\'s".to_string()),
                TokenKind::Whitespace { newline: false },
                TokenKind::Quoted("a, b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_word_text() {
        assert_eq!(
            kinds("O'Brien x"),
            vec![
                word("O'Brien"),
                TokenKind::Whitespace { newline: false },
                word("x"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_whitespace_and_spans() {
        let tokens = tokenize("@a\n  @b");
        assert_eq!(tokens[2].kind, TokenKind::Whitespace { newline: true });
        assert_eq!(tokens[3].span.line, 2);
        assert_eq!(tokens[3].span.column, 3);
        assert_eq!(&"@a\n  @b"[tokens[4].span.start..tokens[4].span.end], "b");
    }
}
