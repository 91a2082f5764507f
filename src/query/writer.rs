//! Query-language tokens - the atomic units of query-string output.
//!
//! Tokens serialize to the canonical query-language surface. Adding a new
//! variant here will cause compile errors everywhere it needs to be handled
//! (exhaustive matching).

use crate::error::{QueryError, QueryResult};
use crate::value::quote_string;

/// A query-language token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    Where,
    GroupBy,
    Pivot,
    OrderBy,
    Asc,
    Desc,
    Skipping,
    Limit,
    Offset,
    Label,
    Format,
    Options,
    NoValues,
    NoFormat,

    // === Punctuation ===
    Comma,
    Space,

    // === Dynamic content ===
    /// Column id, backtick-quoted on output.
    Ident(String),
    /// Text literal, quote-selected on output.
    LitString(String),
    /// Integer literal (SKIPPING / LIMIT / OFFSET counts).
    LitInt(u64),
    /// An already-rendered fragment (column forms, filters, value literals).
    Raw(String),
}

impl Token {
    /// Serialize this token to its surface form.
    pub fn serialize(&self) -> QueryResult<String> {
        Ok(match self {
            Token::Select => "SELECT".into(),
            Token::Where => "WHERE".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Pivot => "PIVOT".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Skipping => "SKIPPING".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::Label => "LABEL".into(),
            Token::Format => "FORMAT".into(),
            Token::Options => "OPTIONS".into(),
            Token::NoValues => "NO_VALUES".into(),
            Token::NoFormat => "NO_FORMAT".into(),

            Token::Comma => ",".into(),
            Token::Space => " ".into(),

            Token::Ident(id) => {
                if id.contains('`') {
                    return Err(QueryError::Internal(format!(
                        "column id '{id}' contains a backtick and cannot be quoted"
                    )));
                }
                format!("`{id}`")
            }
            Token::LitString(s) => quote_string(s)?,
            Token::LitInt(n) => n.to_string(),
            Token::Raw(s) => s.clone(),
        })
    }
}

/// A stream of tokens that serializes to a query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens.
    pub fn serialize(&self) -> QueryResult<String> {
        let mut out = String::new();
        for token in &self.tokens {
            out.push_str(&token.serialize()?);
        }
        Ok(out)
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn raw(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.push(Token::Raw(fragment.into()))
    }

    /// Push `, `-separated raw fragments.
    pub fn raw_list(&mut self, fragments: impl IntoIterator<Item = String>) -> &mut Self {
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.raw(fragment);
        }
        self
    }
}
