//! Fixed-table tokenizer.
//!
//! This is not byte-pair encoding: the vocabulary is a fixed table built once
//! at construction (special tokens, printable characters, curated keywords and
//! common words), and `encode` runs a longest-greedy-match scan over it. The
//! tie-break always prefers the longest candidate, scanning lengths from long
//! to short, so tokenization is deterministic.

#[cfg(test)]
#[path = "../tests/unit/tokenizer_test.rs"]
mod tokenizer_test;

use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Special tokens, registered first so their ids are stable.
const SPECIAL_TOKENS: [&str; 8] = [
    "<pad>",
    "<unk>",
    "<start>",
    "<end>",
    "<code>",
    "<query>",
    "<analysis>",
    "<reasoning>",
];

pub(crate) const SPECIAL_TOKEN_COUNT: usize = SPECIAL_TOKENS.len();

/// Longest multi-character candidate considered during matching.
const MAX_CANDIDATE_LEN: usize = 10;

/// Ids reserved at the top of the vocabulary; multi-character registration
/// stops once `vocab_size - RESERVED_MARGIN` is reached.
const RESERVED_MARGIN: usize = 100;

/// Bounded size of the encode cache.
const CACHE_CAPACITY: usize = 1000;

/// Rendered for ids that have no string mapping.
const PLACEHOLDER: char = '?';

/// Tokenizer with a bidirectional fixed vocabulary and a bounded encode cache.
///
/// The vocabulary is immutable after construction; the cache is a performance
/// aid guarded by a mutex so `encode` can take `&self`.
pub struct Tokenizer {
    token_to_id: HashMap<String, usize>,
    id_to_token: Vec<String>,
    vocab_size: usize,
    cache: Mutex<EncodeCache>,
}

impl Tokenizer {
    /// Deterministically builds the id space: special tokens, then printable
    /// single characters, then curated multi-character tokens until the
    /// reserved margin is reached.
    pub fn build(vocab_size: usize) -> Result<Self> {
        if vocab_size < SPECIAL_TOKEN_COUNT {
            anyhow::bail!(
                "vocab_size ({}) too small to hold the {} special tokens",
                vocab_size,
                SPECIAL_TOKEN_COUNT
            );
        }

        let mut token_to_id = HashMap::new();
        let mut id_to_token = Vec::new();

        for token in SPECIAL_TOKENS {
            id_to_token.push(token.to_string());
            token_to_id.insert(token.to_string(), id_to_token.len() - 1);
        }

        // Printable single characters, lowercase letters first so they stay
        // reachable even under very small vocabularies.
        for ch in single_characters() {
            if id_to_token.len() >= vocab_size {
                break;
            }
            let token = ch.to_string();
            id_to_token.push(token.clone());
            token_to_id.insert(token, id_to_token.len() - 1);
        }

        let multi_char_limit = vocab_size.saturating_sub(RESERVED_MARGIN);
        for word in keywords().iter().chain(common_words().iter()) {
            if id_to_token.len() >= multi_char_limit {
                break;
            }
            if token_to_id.contains_key(*word) {
                continue;
            }
            id_to_token.push(word.to_string());
            token_to_id.insert(word.to_string(), id_to_token.len() - 1);
        }

        Ok(Self {
            token_to_id,
            id_to_token,
            vocab_size,
            cache: Mutex::new(EncodeCache::new(CACHE_CAPACITY)),
        })
    }

    pub fn pad_id(&self) -> usize {
        0
    }

    pub fn unknown_id(&self) -> usize {
        1
    }

    pub fn start_id(&self) -> usize {
        2
    }

    pub fn end_id(&self) -> usize {
        3
    }

    /// Number of ids that actually carry a string mapping.
    pub fn mapped_len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Encodes `text` into exactly `max_length` token ids, right-padded with
    /// the pad id or truncated. Never fails on arbitrary input.
    pub fn encode(&self, text: &str, max_length: usize) -> Vec<usize> {
        let normalized = text.to_lowercase();

        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&normalized, max_length) {
                return hit;
            }
        }

        let result = self.encode_uncached(&normalized, max_length);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(normalized, max_length, result.clone());
        }

        result
    }

    fn encode_uncached(&self, normalized: &str, max_length: usize) -> Vec<usize> {
        let chars: Vec<char> = normalized.chars().collect();
        let mut tokens = Vec::with_capacity(max_length);

        let mut i = 0;
        while i < chars.len() && tokens.len() < max_length {
            let mut matched = false;

            // Longest candidate first.
            let limit = MAX_CANDIDATE_LEN.min(chars.len() - i);
            for length in (2..=limit).rev() {
                let candidate: String = chars[i..i + length].iter().collect();
                if let Some(&id) = self.token_to_id.get(&candidate) {
                    tokens.push(id);
                    i += length;
                    matched = true;
                    break;
                }
            }

            if !matched {
                let single = chars[i].to_string();
                let id = self
                    .token_to_id
                    .get(&single)
                    .copied()
                    .unwrap_or_else(|| self.unknown_id());
                tokens.push(id);
                i += 1;
            }
        }

        tokens.resize(max_length, self.pad_id());
        tokens
    }

    /// Decodes ids back to text, skipping pad. Ids without a mapping render
    /// as a placeholder character rather than failing.
    pub fn decode(&self, token_ids: &[usize]) -> String {
        let mut text = String::new();
        for &id in token_ids {
            if id == self.pad_id() {
                continue;
            }
            match self.id_to_token.get(id) {
                Some(token) => text.push_str(token),
                None => text.push(PLACEHOLDER),
            }
        }
        text
    }

    #[cfg(test)]
    pub(crate) fn cached_entries(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("vocab_size", &self.vocab_size)
            .field("mapped_len", &self.id_to_token.len())
            .field("pad_id", &self.pad_id())
            .field("end_id", &self.end_id())
            .finish_non_exhaustive()
    }
}

/// Bounded `(normalized text, max_length) -> ids` mapping with FIFO eviction.
/// Oldest-entry eviction is a deliberate simplification, not true LRU.
struct EncodeCache {
    entries: HashMap<(String, usize), Vec<usize>>,
    order: VecDeque<(String, usize)>,
    capacity: usize,
}

impl EncodeCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, text: &str, max_length: usize) -> Option<Vec<usize>> {
        self.entries.get(&(text.to_string(), max_length)).cloned()
    }

    fn insert(&mut self, text: String, max_length: usize, tokens: Vec<usize>) {
        let key = (text, max_length);
        if self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, tokens);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn single_characters() -> Vec<char> {
    let mut chars: Vec<char> = ('a'..='z').collect();
    chars.extend('A'..='Z');
    chars.extend('0'..='9');
    chars.extend(r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##.chars());
    chars.extend([' ', '\n', '\t']);
    chars
}

fn keywords() -> &'static [&'static str] {
    &[
        "def", "class", "import", "from", "return", "if", "else", "elif", "for", "while", "try",
        "except", "finally", "with", "as", "lambda", "yield", "pass", "break", "continue",
        "global", "nonlocal", "function", "const", "let", "var", "async", "await", "public",
        "private", "protected", "static", "interface", "abstract", "extends", "implements",
        "throw", "throws", "new", "delete", "struct", "impl", "trait", "match", "enum",
    ]
}

fn common_words() -> &'static [&'static str] {
    &[
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what",
        "so", "up", "out", "about", "who", "get", "which", "go", "me", "when", "make", "can",
        "like", "time", "no", "just", "him", "know", "take", "people", "into", "year", "your",
        "good", "some", "could", "them", "see", "other", "than", "then", "now", "look", "only",
        "come", "its", "over", "think", "also", "back", "after", "use", "two", "how", "our",
        "work", "first", "well", "way", "even", "want", "because", "any", "these", "give", "day",
        "most", "us", "is", "was", "are", "been", "being",
    ]
}
