//! Router module.

mod trie;

pub use trie::TrieRouter;
