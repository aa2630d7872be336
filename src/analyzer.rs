use porter_stemmer::stem;
use std::collections::HashSet;
use std::sync::OnceLock;

static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();

fn get_stop_words() -> &'static HashSet<String> {
    STOP_WORDS.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .map(|x| x.to_string())
            .collect()
    })
}

/// A term produced by the analysis pipeline.
///
/// `start` and `end` are byte offsets into the text that was analyzed, so a
/// token can always be traced back to the words it came from (highlighting
/// relies on this). Filters may rewrite `term` freely but only the
/// punctuation filter narrows the offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextToken {
    pub term: String,
    pub pos: usize,
    pub start: usize,
    pub end: usize,
}

impl std::ops::Deref for TextToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.term
    }
}

/// A tokenizer receives a stream of characters, breaks it up into individual tokens (usually individual words),
/// and outputs a stream of tokens.
/// For instance, a whitespace tokenizer breaks text into tokens whenever it sees any whitespace.
/// It would convert the text "Quick brown fox!" into the terms [Quick, brown, fox!].
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<TextToken>;
}

pub struct WhiteSpaceTokenizer;

impl Tokenizer for WhiteSpaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<TextToken> {
        let mut tokens = Vec::new();
        let mut word_start: Option<usize> = None;

        for (idx, c) in text.char_indices() {
            match (c.is_whitespace(), word_start) {
                (true, Some(start)) => {
                    tokens.push(TextToken {
                        term: text[start..idx].to_string(),
                        pos: tokens.len(),
                        start,
                        end: idx,
                    });
                    word_start = None;
                }
                (false, None) => word_start = Some(idx),
                _ => {}
            }
        }
        if let Some(start) = word_start {
            tokens.push(TextToken {
                term: text[start..].to_string(),
                pos: tokens.len(),
                start,
                end: text.len(),
            });
        }
        tokens
    }
}

/// A token filter receives the token stream and may add, remove, or change tokens.
/// For example, a lowercase token filter converts all tokens to lowercase, a stop token
/// filter removes common words (stop words) like the from the token stream,
/// and a synonym token filter introduces synonyms into the token stream.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken>;
}

pub struct LowerCaseTokenFilter;

impl TokenFilter for LowerCaseTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .map(|mut t| {
                t.term = t.term.to_lowercase();
                t
            })
            .collect()
    }
}

pub struct StopWordTokenFilter;

impl TokenFilter for StopWordTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        let stop_words = get_stop_words();
        tokens.retain(|w| !stop_words.contains(&w.term));
        tokens
    }
}

pub struct PorterStemmerTokenFilter;

impl TokenFilter for PorterStemmerTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .map(|mut w| {
                w.term = stem(&w.term);
                w
            })
            .collect::<Vec<TextToken>>()
    }
}

/// Removes a trailing possessive ("king's" -> "king").
pub struct PossessiveTokenFilter;

impl TokenFilter for PossessiveTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .map(|mut t| {
                for suffix in ["'s", "'S", "\u{2019}s", "\u{2019}S"] {
                    if t.term.len() > suffix.len() && t.term.ends_with(suffix) {
                        t.term.truncate(t.term.len() - suffix.len());
                        break;
                    }
                }
                t
            })
            .collect()
    }
}

/// Strips leading and trailing punctuation and drops tokens that end up shorter than `min_length` characters.
/// Must run before any filter that changes the byte length of a term, since it moves the token offsets.
pub struct PunctuationStripFilter {
    min_length: usize,
}

impl PunctuationStripFilter {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for PunctuationStripFilter {
    fn default() -> Self {
        Self { min_length: 1 }
    }
}

impl TokenFilter for PunctuationStripFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        let is_punct = |c: char| !c.is_alphanumeric();
        tokens
            .into_iter()
            .filter_map(|mut token| {
                let leading = token.term.len() - token.term.trim_start_matches(is_punct).len();
                let trimmed = token.term.trim_matches(is_punct);

                if trimmed.chars().count() < self.min_length {
                    return None;
                }
                token.start += leading;
                token.end = token.start + trimmed.len();
                token.term = trimmed.to_string();
                Some(token)
            })
            .collect()
    }
}

/// Pure text analysis pipeline: a tokenizer followed by token filters, applied in order.
/// The same analyzer must be used for indexing and for querying.
pub struct TextAnalyzer {
    tokenizer: Box<dyn Tokenizer>,
    token_filters: Vec<Box<dyn TokenFilter>>,
}

impl TextAnalyzer {
    pub fn new(tokenizer: Box<dyn Tokenizer>, token_filters: Vec<Box<dyn TokenFilter>>) -> Self {
        Self {
            tokenizer,
            token_filters,
        }
    }

    /// Whitespace tokens, punctuation stripped, possessives removed, lowercased,
    /// English stop words dropped and Porter-stemmed.
    pub fn english() -> Self {
        Self::new(
            Box::new(WhiteSpaceTokenizer),
            vec![
                Box::new(PunctuationStripFilter::default()),
                Box::new(PossessiveTokenFilter),
                Box::new(LowerCaseTokenFilter),
                Box::new(StopWordTokenFilter),
                Box::new(PorterStemmerTokenFilter),
            ],
        )
    }

    pub fn tokenize(&self, content: &str) -> Vec<TextToken> {
        self.tokenizer.tokenize(content)
    }

    pub fn token_filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        for filter in self.token_filters.iter() {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    /// Analyzes raw content and returns a list of tokens
    pub fn analyze(&self, raw_content: &str) -> Vec<TextToken> {
        let tokens = self.tokenize(raw_content);
        self.token_filter(tokens)
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::english()
    }
}
