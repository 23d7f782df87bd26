//! HTML handling: tokenizing, block segmentation and safe link injection
//!
//! Nothing here builds a DOM. Documents are scanned into byte-ranged tokens so
//! that any block the engine does not rewrite comes back byte-identical.

mod blocks;
mod entities;
mod inject;
mod scanner;

pub use blocks::{BlockKind, Document, Exclusion, ExistingLink, TextBlock};
pub use entities::{decode, escape_attribute};
pub use inject::{InjectionConflict, SafeInjector};
pub use scanner::{tokenize, MarkupError, Token, TokenKind};
