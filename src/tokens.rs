//! Command line tokens
//!
//! The engine consumes tokens through [`TokenSource`]. [`ShellTokenizer`]
//! is the default source: whitespace separated words with single/double
//! quotes and backslash escapes, enough for completion purposes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::prefix::floor_char_boundary;

/// One lexical unit of the command line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unquoted text of the token
    pub text: String,
    /// Byte offset of the first raw character
    pub start: usize,
    /// Byte offset one past the last raw character
    pub end: usize,
}

/// Whether the cursor token is the command name or a later word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Command,
    Other,
}

/// A tokenized command line up to the cursor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub line: String,
    pub cursor: usize,
    /// Tokens left of the cursor. The last token is the cursor token; it is
    /// empty when the cursor follows whitespace.
    pub tokens: Vec<Token>,
}

impl CommandLine {
    /// Index of the token under or left of the cursor
    pub fn cursor_index(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub fn token_type(&self) -> TokenType {
        if self.cursor_index() == 0 {
            TokenType::Command
        } else {
            TokenType::Other
        }
    }

    /// The leading command word, if one has been typed
    pub fn command_word(&self) -> Option<&str> {
        self.tokens.first().map(|t| t.text.as_str())
    }

    /// Completed tokens between the command word and the cursor token
    pub fn argument_tokens(&self) -> &[Token] {
        let end = self.cursor_index();
        if end <= 1 {
            &[]
        } else {
            &self.tokens[1..end]
        }
    }

    pub fn token_texts(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.text.clone()).collect()
    }
}

/// Produces tokens for a raw command line
pub trait TokenSource: Send + Sync {
    fn tokenize(&self, line: &str, cursor: usize) -> Result<CommandLine>;
}

/// Default shell-like tokenizer
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellTokenizer;

impl TokenSource for ShellTokenizer {
    fn tokenize(&self, line: &str, cursor: usize) -> Result<CommandLine> {
        let end = floor_char_boundary(line, cursor);
        let text = &line[..end];

        let mut tokens = Vec::new();
        let mut current: Option<Token> = None;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (idx, c) in text.char_indices() {
            if escaped {
                push_char(&mut current, c, idx);
                escaped = false;
                continue;
            }
            match quote {
                Some(q) if c == q => {
                    quote = None;
                    extend_raw(&mut current, c, idx);
                }
                Some(_) => push_char(&mut current, c, idx),
                None if c == '\\' && !cfg!(windows) => {
                    escaped = true;
                    extend_raw(&mut current, c, idx);
                }
                None if c == '"' || c == '\'' => {
                    quote = Some(c);
                    extend_raw(&mut current, c, idx);
                }
                None if c.is_whitespace() => {
                    if let Some(token) = current.take() {
                        tokens.push(token);
                    }
                }
                None => push_char(&mut current, c, idx),
            }
        }

        match current {
            Some(token) => tokens.push(token),
            None => tokens.push(Token {
                text: String::new(),
                start: end,
                end,
            }),
        }

        Ok(CommandLine {
            line: line.to_string(),
            cursor,
            tokens,
        })
    }
}

fn push_char(current: &mut Option<Token>, c: char, idx: usize) {
    let token = current.get_or_insert_with(|| Token {
        text: String::new(),
        start: idx,
        end: idx,
    });
    token.text.push(c);
    token.end = idx + c.len_utf8();
}

// Quote and escape characters extend the raw span without adding text
fn extend_raw(current: &mut Option<Token>, c: char, idx: usize) {
    let token = current.get_or_insert_with(|| Token {
        text: String::new(),
        start: idx,
        end: idx,
    });
    token.end = idx + c.len_utf8();
}
