mod fragment;
mod profile;
mod text;

pub use fragment::{
    FragmentScorer, FragmentSimilarity, SplitRules, column_count_similarity,
    row_format_conformance, structure_similarity as fragment_structure_similarity,
};
pub use profile::{
    HeaderMatch, HeaderPairing, ProfileScorer, ProfileSimilarity,
    structure_similarity as profile_structure_similarity,
};
pub use text::{char_set_jaccard, sequence_ratio, word_jaccard};

#[cfg(test)]
mod tests;
