//! Text normalization shared by candidate extraction, scoring and injection
//!
//! Every component that compares spans of text goes through the same
//! tokenizer so that term overlap is symmetric.

mod normalize;

pub use normalize::{
    is_stopword, normalize, normalize_phrase, split_words, strip_edge_punctuation, term_set,
    WordSpan, STOPWORDS,
};
