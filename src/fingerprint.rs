use regex::Regex;
use tracing::warn;

use crate::model::{ColumnPattern, ColumnType};

#[derive(Debug, Clone, Copy)]
pub struct PatternFamily {
    pub column_type: ColumnType,
    pub patterns: &'static [&'static str],
}

pub const DEFAULT_PATTERN_FAMILIES: &[PatternFamily] = &[
    PatternFamily {
        column_type: ColumnType::Date,
        patterns: &[
            r"^\d{1,2}/\d{1,2}/\d{2,4}$",
            r"^\d{4}/\d{1,2}/\d{1,2}$",
            r"^\d{4}-\d{1,2}-\d{1,2}$",
            r"^\d{1,2}-\d{1,2}-\d{2,4}$",
            r"^\d{1,2}\.\d{1,2}\.\d{2,4}$",
            r"^[A-Za-z]{3,9}\.? \d{1,2},? \d{4}$",
        ],
    },
    PatternFamily {
        column_type: ColumnType::Currency,
        patterns: &[
            r"^-?\$\s?\d{1,3}(,\d{3})*(\.\d{1,2})?$",
            r"^-?\$\s?\d+(\.\d{1,2})?$",
            r"^-?\$?\d{1,3}(,\d{3})+(\.\d{2})?$",
            r"^-?\d+\.\d{2}$",
            r"^\(\$?\d{1,3}(,\d{3})*(\.\d{2})?\)$",
        ],
    },
    PatternFamily {
        column_type: ColumnType::Percentage,
        patterns: &[r"^-?\d+(\.\d+)?\s?%$"],
    },
    PatternFamily {
        column_type: ColumnType::Phone,
        patterns: &[r"^\d{3}-\d{3}-\d{4}$", r"^\(\d{3}\)\s?\d{3}-\d{4}$", r"^\d{10}$"],
    },
    PatternFamily {
        column_type: ColumnType::Ssn,
        patterns: &[r"^\d{3}-\d{2}-\d{4}$", r"^\d{9}$"],
    },
];

const MAX_GENERATED_SAMPLE_CHARS: usize = 64;

/// Compiles one family's patterns, skipping any that fail to parse.
pub fn compile_family(family: &PatternFamily) -> Vec<Regex> {
    family
        .patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(
                    column_type = family.column_type.as_str(),
                    pattern = %pattern,
                    error = %err,
                    "skipping invalid type pattern"
                );
                None
            }
        })
        .collect()
}

/// All compiled patterns for `column_type` across `families`.
pub fn family_patterns(families: &[PatternFamily], column_type: ColumnType) -> Vec<Regex> {
    families
        .iter()
        .filter(|family| family.column_type == column_type)
        .flat_map(compile_family)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVotes {
    pub typed: Vec<(ColumnType, usize)>,
    pub numeric: usize,
}

impl TypeVotes {
    /// A single strongest typed vote wins; ties and empty votes fall back to
    /// `number` when anything parsed as a number, else `string`.
    pub fn winner(&self) -> ColumnType {
        let best = self.typed.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if best > 0 {
            let mut leaders = self.typed.iter().filter(|(_, count)| *count == best);
            if let (Some((column_type, _)), None) = (leaders.next(), leaders.next()) {
                return *column_type;
            }
        }

        if self.numeric > 0 {
            ColumnType::Number
        } else {
            ColumnType::String
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnFingerprinter {
    families: Vec<(ColumnType, Vec<Regex>)>,
    max_samples: usize,
}

impl Default for ColumnFingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_FAMILIES, 20)
    }
}

impl ColumnFingerprinter {
    pub fn new(families: &[PatternFamily], max_samples: usize) -> Self {
        let families = families
            .iter()
            .map(|family| (family.column_type, compile_family(family)))
            .collect::<Vec<(ColumnType, Vec<Regex>)>>();

        Self {
            families,
            max_samples: max_samples.max(1),
        }
    }

    pub fn votes(&self, samples: &[String]) -> TypeVotes {
        let values = samples
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .take(self.max_samples)
            .collect::<Vec<&str>>();

        let typed = self
            .families
            .iter()
            .map(|(column_type, patterns)| {
                let count = values
                    .iter()
                    .filter(|value| patterns.iter().any(|pattern| pattern.is_match(value)))
                    .count();
                (*column_type, count)
            })
            .collect::<Vec<(ColumnType, usize)>>();

        let numeric = values.iter().filter(|value| parses_as_number(value)).count();

        TypeVotes { typed, numeric }
    }

    pub fn infer_type(&self, samples: &[String]) -> ColumnType {
        self.votes(samples).winner()
    }

    pub fn fingerprint(&self, samples: &[String]) -> ColumnPattern {
        let column_type = self.infer_type(samples);
        let expression = if column_type == ColumnType::String {
            None
        } else {
            samples
                .iter()
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .and_then(generate_pattern)
        };

        ColumnPattern {
            column_type,
            expression,
        }
    }

    pub fn fingerprint_columns(&self, width: usize, rows: &[Vec<String>]) -> Vec<ColumnPattern> {
        (0..width)
            .map(|column| {
                let samples = column_values(rows, column, self.max_samples);
                self.fingerprint(&samples)
            })
            .collect()
    }
}

/// Up to `limit` non-blank values of one column, in row order.
pub fn column_values(rows: &[Vec<String>], column: usize, limit: usize) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

pub fn parses_as_number(value: &str) -> bool {
    let stripped = value
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | '%' | '(' | ')') && !ch.is_whitespace())
        .collect::<String>();
    !stripped.is_empty() && stripped.parse::<f64>().is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Digit,
    Alpha,
    Space,
    Literal(char),
}

fn classify(ch: char) -> CharClass {
    if ch.is_ascii_digit() {
        CharClass::Digit
    } else if ch.is_alphabetic() {
        CharClass::Alpha
    } else if ch.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Literal(ch)
    }
}

/// Derives an anchored expression from one sample value. Best effort: long or
/// empty samples yield nothing.
pub fn generate_pattern(sample: &str) -> Option<String> {
    let trimmed = sample.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_GENERATED_SAMPLE_CHARS {
        return None;
    }

    let mut expression = String::from("^");
    let mut previous: Option<CharClass> = None;

    for class in trimmed.chars().map(classify) {
        let repeats_class = previous == Some(class) && !matches!(class, CharClass::Literal(_));
        if repeats_class {
            continue;
        }

        match class {
            CharClass::Digit => expression.push_str(r"\d+"),
            CharClass::Alpha => expression.push_str(r"\p{L}+"),
            CharClass::Space => expression.push_str(r"\s+"),
            CharClass::Literal(ch) => expression.push_str(&regex::escape(&ch.to_string())),
        }
        previous = Some(class);
    }
    expression.push('$');

    Regex::new(&expression).ok().map(|_| expression)
}
