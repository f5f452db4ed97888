use std::collections::HashMap;

/// Domain terms collapsed to one canonical token before headers are compared.
pub const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("group", "company"),
    ("client", "company"),
    ("organization", "company"),
    ("organisation", "company"),
    ("employer", "company"),
    ("earned", "commission"),
    ("comm", "commission"),
    ("paid", "payment"),
    ("payment", "payment"),
    ("pmt", "payment"),
    ("no", "number"),
    ("num", "number"),
    ("nbr", "number"),
    ("adj", "adjustment"),
    ("adjust", "adjustment"),
    ("amt", "amount"),
    ("prem", "premium"),
    ("eff", "effective"),
    ("dt", "date"),
    ("desc", "description"),
    ("qty", "quantity"),
    ("pct", "percent"),
    ("percentage", "percent"),
    ("acct", "account"),
    ("inv", "invoice"),
];

#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, String>,
}

impl SynonymTable {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .map(|(term, canonical)| (term.to_lowercase(), canonical.to_lowercase()))
            .collect::<HashMap<String, String>>();
        Self { entries }
    }

    pub fn canonical<'a>(&'a self, word: &'a str) -> &'a str {
        self.entries.get(word).map(String::as_str).unwrap_or(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    synonyms: SynonymTable,
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::new(SynonymTable::from_pairs(DEFAULT_SYNONYMS))
    }
}

impl HeaderNormalizer {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let lowered = raw.to_lowercase();
        let substituted = self.substitute_words(lowered.trim());

        let stripped = substituted
            .chars()
            .filter(|ch| is_word_char(*ch) || ch.is_whitespace())
            .collect::<String>();

        condense_whitespace(&stripped)
    }

    pub fn normalize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|value| self.normalize(value)).unwrap_or_default()
    }

    pub fn normalize_all(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|header| self.normalize(header)).collect()
    }

    fn substitute_words(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut word = String::new();

        for ch in input.chars() {
            if is_word_char(ch) {
                word.push(ch);
                continue;
            }

            if !word.is_empty() {
                out.push_str(self.synonyms.canonical(&word));
                word.clear();
            }
            out.push(ch);
        }

        if !word.is_empty() {
            out.push_str(self.synonyms.canonical(&word));
        }

        out
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}
