//! Shared token vocabulary
//!
//! Maps location codes to dense integer indices in first-seen order. The
//! vocabulary only ever grows, so an index handed out once stays valid.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Code string to token index mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenVocabulary {
    codes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TokenVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every code to its index, appending unseen codes
    pub fn tokenize<S: AsRef<str>>(&mut self, codes: &[S]) -> Result<Vec<usize>> {
        if codes.is_empty() {
            return Err(Error::EmptyInput("no codes to tokenize".to_string()));
        }

        let before = self.len();
        let tokens = codes.iter().map(|c| self.insert(c.as_ref())).collect();
        debug!(
            "Tokenized {} codes, vocabulary {} -> {}",
            codes.len(),
            before,
            self.len()
        );
        Ok(tokens)
    }

    /// Index of `code`, inserting it if unseen
    pub fn insert(&mut self, code: &str) -> usize {
        if let Some(&idx) = self.index.get(code) {
            return idx;
        }
        let idx = self.codes.len();
        self.codes.push(code.to_string());
        self.index.insert(code.to_string(), idx);
        idx
    }

    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn code_of(&self, index: usize) -> Option<&str> {
        self.codes.get(index).map(String::as_str)
    }

    /// Map indices back to their codes
    pub fn decode(&self, indices: &[usize]) -> Result<Vec<&str>> {
        indices
            .iter()
            .map(|&i| self.code_of(i).ok_or(Error::UnknownToken(i)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in index order
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut vocab: TokenVocabulary = serde_json::from_str(&content)?;
        vocab.rebuild_index();
        Ok(vocab)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
    }
}

/// Tokenize `codes` into a fresh vocabulary
pub fn tokenize<S: AsRef<str>>(codes: &[S]) -> Result<(Vec<usize>, TokenVocabulary)> {
    let mut vocab = TokenVocabulary::new();
    let tokens = vocab.tokenize(codes)?;
    Ok((tokens, vocab))
}
