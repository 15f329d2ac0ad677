//! Tag section parser

use crate::lexer::{Token, TokenKind};
use crate::registry::{SchemaRegistry, Scope};
use crate::resolve::{resolve_word, ListMode, Unresolved};
use quill_core::{
    AnnotationError, Comment, Error, Instance, QuillResult, SyntaxError, Target, Value, ValueList,
};
use tracing::warn;

/// A list item seen but not yet stored.
enum Pending {
    Word(String),
    Value(Value),
}

/// Cursor over the tokens of one tag section.
///
/// Nested type-tags are parsed by the same cursor; building their instances
/// goes through the registry, which may start parsers of its own.
pub struct TagParser<'a> {
    source: &'a str,
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    registry: &'a SchemaRegistry,
    scope: &'a Scope,
}

impl<'a> TagParser<'a> {
    pub fn new(
        source: &'a str,
        tokens: Vec<Token>,
        registry: &'a SchemaRegistry,
        scope: &'a Scope,
    ) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            registry,
            scope,
        }
    }

    /// Parse every tag into `comment`, building type-tags in `context`.
    pub fn parse_into(&mut self, comment: &mut Comment, context: Target) -> QuillResult<()> {
        while !self.is_at_end() {
            if self.check(&TokenKind::At) {
                self.advance();
                self.parse_tag(comment, context)?;
            } else {
                self.advance();
            }
        }
        Ok(())
    }

    fn parse_tag(&mut self, comment: &mut Comment, context: Target) -> QuillResult<()> {
        let name = match &self.current().kind {
            TokenKind::Word(name) => name.clone(),
            // A lone `@` is text.
            _ => return Ok(()),
        };
        self.advance();

        if self.check(&TokenKind::LParen) {
            self.advance();
            let instance = self.parse_type_tag(&name, context)?;
            comment.add_annotation(instance);
        } else {
            let value = self.parse_plain()?;
            comment.add(name, value);
        }
        Ok(())
    }

    /// Arguments up to `)`, then build. The `(` is already consumed.
    fn parse_type_tag(&mut self, name: &str, context: Target) -> QuillResult<Instance> {
        let arguments = self.parse_list(TokenKind::RParen, ListMode::Arguments, true)?;
        let type_id = self
            .registry
            .resolve_name(name, self.scope)
            .ok_or_else(|| AnnotationError::UnknownType {
                type_id: name.to_string(),
            })?;
        self.registry
            .build_instance(&type_id, arguments, context)
            .map_err(|e| {
                warn!(type_id = %type_id, context = %context, error = %e, "annotation rejected");
                e
            })
    }

    /// Raw text up to a line break or the next `@`, or a `{...}` list.
    ///
    /// A `{` discards the text read so far and the list becomes the value;
    /// anything after the list on the same line is skipped.
    fn parse_plain(&mut self) -> QuillResult<Value> {
        let start = self.current().span.start;
        let mut end = start;
        let mut list: Option<ValueList> = None;

        loop {
            match &self.current().kind {
                TokenKind::Eof | TokenKind::At => break,
                kind if kind.is_newline() => break,
                TokenKind::LBrace if list.is_none() => {
                    self.advance();
                    list = Some(self.parse_list(TokenKind::RBrace, ListMode::Plain, false)?);
                }
                TokenKind::Whitespace { .. } => self.advance(),
                _ => {
                    if list.is_none() {
                        end = self.current().span.end;
                    }
                    self.advance();
                }
            }
        }

        if let Some(list) = list {
            return Ok(Value::List(list));
        }
        let text = self.source[start..end].trim();
        if text.is_empty() {
            Ok(Value::Flag)
        } else {
            Ok(Value::string(text))
        }
    }

    /// Parse list entries up to `closing`; the opening delimiter is consumed.
    ///
    /// In a type-tag's own argument list only the first entry may be unnamed.
    fn parse_list(
        &mut self,
        closing: TokenKind,
        mode: ListMode,
        arguments: bool,
    ) -> QuillResult<ValueList> {
        let mut list = ValueList::new();
        let mut key: Option<String> = None;
        let mut pending: Option<Pending> = None;

        loop {
            let kind = self.current().kind.clone();
            match kind {
                TokenKind::Eof => return Err(self.error("Unexpected end of comment").into()),
                TokenKind::Whitespace { .. } => self.advance(),
                ref k if *k == closing => {
                    match pending.take() {
                        Some(item) => self.store(&mut list, key.take(), item, mode, arguments)?,
                        None if key.is_some() => {
                            return Err(self.error("Missing value after key").into())
                        }
                        None => {}
                    }
                    self.advance();
                    return Ok(list);
                }
                TokenKind::Comma => {
                    let item = pending
                        .take()
                        .ok_or_else(|| self.error("Unexpected ,"))?;
                    self.store(&mut list, key.take(), item, mode, arguments)?;
                    self.advance();
                }
                TokenKind::Colon => {
                    if key.is_some() {
                        return Err(self.error("Unexpected :").into());
                    }
                    match pending.take() {
                        Some(Pending::Word(word))
                            if !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()) =>
                        {
                            key = Some(word);
                        }
                        Some(_) => return Err(self.error("Keys must be alphabetic").into()),
                        None => return Err(self.error("Unexpected :").into()),
                    }
                    self.advance();
                }
                TokenKind::LBrace => {
                    if pending.is_some() {
                        return Err(self.error("Unexpected {").into());
                    }
                    self.advance();
                    let inner = self.parse_list(TokenKind::RBrace, mode, false)?;
                    pending = Some(Pending::Value(Value::List(inner)));
                }
                TokenKind::At => {
                    if pending.is_some() {
                        return Err(self.error("Unexpected @").into());
                    }
                    self.advance();
                    let instance = self.parse_nested_tag()?;
                    pending = Some(Pending::Value(Value::Instance(instance)));
                }
                TokenKind::Word(word) => {
                    if pending.is_some() {
                        return Err(self.error("Unexpected data").into());
                    }
                    pending = Some(Pending::Word(word));
                    self.advance();
                }
                TokenKind::Quoted(content) => {
                    if pending.is_some() {
                        return Err(self.error("Unexpected data").into());
                    }
                    pending = Some(Pending::Value(Value::string(content)));
                    self.advance();
                }
                other => return Err(self.error(&format!("Unexpected {}", other)).into()),
            }
        }
    }

    /// `@Name(...)` inside a list, built in the annotation context.
    fn parse_nested_tag(&mut self) -> QuillResult<Instance> {
        let name = match &self.current().kind {
            TokenKind::Word(name) => name.clone(),
            _ => return Err(self.error("Expected annotation name after @").into()),
        };
        self.advance();
        if !self.check(&TokenKind::LParen) {
            return Err(AnnotationError::NestedPlainTag { name }.into());
        }
        self.advance();
        self.parse_type_tag(&name, Target::ANNOTATION)
    }

    fn store(
        &self,
        list: &mut ValueList,
        key: Option<String>,
        item: Pending,
        mode: ListMode,
        arguments: bool,
    ) -> QuillResult<()> {
        if arguments && key.is_none() && !list.is_empty() {
            return Err(self.error("Only the first argument may be unnamed").into());
        }
        let value = match item {
            Pending::Value(value) => value,
            Pending::Word(word) => match resolve_word(&word, mode, self.registry, self.scope) {
                Ok(value) => value,
                Err(Unresolved::Syntax(message)) => {
                    return Err(self.error(&message).with_fragment(word).into())
                }
                Err(Unresolved::Annotation(e)) => return Err(Error::from(e)),
            },
        };
        list.append(key, value);
        Ok(())
    }

    // ========================================================================
    // CURSOR
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn error(&self, msg: &str) -> SyntaxError {
        let span = self.current().span;
        let fragment: String = self.source[span.start..].chars().take(24).collect();
        let error = SyntaxError::new(msg, span.line, span.column);
        if fragment.is_empty() {
            error
        } else {
            error.with_fragment(fragment)
        }
    }
}
