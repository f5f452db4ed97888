mod grouping;
mod merge;

use tracing::{debug, info};

use crate::config::StitchConfig;
use crate::model::{MergedTable, TableFragment};
use crate::normalize::HeaderNormalizer;
use crate::similarity::FragmentScorer;

pub use grouping::{FragmentGroup, GroupFormation, canonical_header};
pub use merge::merge_fragments;

/// Groups the fragments of one document and merges every group into one
/// canonical table.
#[derive(Debug, Clone)]
pub struct FragmentStitcher {
    scorer: FragmentScorer,
    config: StitchConfig,
}

impl Default for FragmentStitcher {
    fn default() -> Self {
        Self::new(HeaderNormalizer::default(), StitchConfig::default())
    }
}

impl FragmentStitcher {
    pub fn new(normalizer: HeaderNormalizer, config: StitchConfig) -> Self {
        Self {
            scorer: FragmentScorer::new(normalizer, config),
            config,
        }
    }

    pub fn scorer(&self) -> &FragmentScorer {
        &self.scorer
    }

    pub fn group(&self, fragments: &[TableFragment]) -> Vec<FragmentGroup> {
        let canonical = canonical_header(fragments);
        grouping::group_fragments(&self.scorer, &self.config, fragments, &canonical)
    }

    /// Merges one group; `canonical` is the document-wide header used when no
    /// member of the group has one.
    pub fn merge_group(
        &self,
        fragments: &[TableFragment],
        group: &FragmentGroup,
        canonical: &[String],
    ) -> MergedTable {
        let members = group
            .members
            .iter()
            .filter_map(|index| fragments.get(*index))
            .collect::<Vec<&TableFragment>>();
        let source_ids = group
            .members
            .iter()
            .filter_map(|index| fragments.get(*index).map(|fragment| fragment.source_id(*index)))
            .collect::<Vec<String>>();

        merge_fragments(&members, source_ids, canonical)
    }

    pub fn stitch(&self, fragments: &[TableFragment]) -> Vec<MergedTable> {
        if fragments.is_empty() {
            return Vec::new();
        }

        let canonical = canonical_header(fragments);
        let groups = grouping::group_fragments(&self.scorer, &self.config, fragments, &canonical);
        let merged = groups
            .iter()
            .map(|group| {
                let table = self.merge_group(fragments, group, &canonical);
                debug!(
                    formation = ?group.formation,
                    members = ?group.members,
                    rows = table.row_count,
                    "merged fragment group"
                );
                table
            })
            .collect::<Vec<MergedTable>>();

        info!(
            fragments = fragments.len(),
            tables = merged.len(),
            rows = merged.iter().map(|table| table.row_count).sum::<usize>(),
            "stitched fragments"
        );
        merged
    }
}

#[cfg(test)]
mod tests;
