use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::{ClusteringMode, StitchConfig};
use crate::model::{TableFragment, placeholder_header};
use crate::similarity::FragmentScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFormation {
    ExactHeaders,
    Similarity,
    Singleton,
}

/// Indices into the input fragment list, in original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentGroup {
    pub members: Vec<usize>,
    pub formation: GroupFormation,
}

impl FragmentGroup {
    fn from_members(mut members: Vec<usize>, formation: GroupFormation) -> Self {
        members.sort_unstable();
        let formation = if members.len() == 1 {
            GroupFormation::Singleton
        } else {
            formation
        };
        Self { members, formation }
    }

    pub fn first(&self) -> usize {
        self.members.first().copied().unwrap_or(0)
    }
}

/// Longest non-empty header across all fragments, or placeholders sized to
/// the widest row when no fragment carries one.
pub fn canonical_header(fragments: &[TableFragment]) -> Vec<String> {
    let mut best: Option<&Vec<String>> = None;
    for fragment in fragments.iter().filter(|fragment| fragment.has_headers()) {
        if best.is_none_or(|current| fragment.headers.len() > current.len()) {
            best = Some(&fragment.headers);
        }
    }

    if let Some(headers) = best {
        return headers.clone();
    }

    let widest = fragments
        .iter()
        .map(TableFragment::widest_row)
        .max()
        .unwrap_or(0);
    (1..=widest).map(placeholder_header).collect()
}

pub(crate) fn group_fragments(
    scorer: &FragmentScorer,
    config: &StitchConfig,
    fragments: &[TableFragment],
    canonical: &[String],
) -> Vec<FragmentGroup> {
    let canonical_width = canonical.len();
    let mut groups = Vec::<FragmentGroup>::new();
    let mut grouped = vec![false; fragments.len()];

    for members in exact_header_buckets(scorer, fragments) {
        for index in &members {
            grouped[*index] = true;
        }
        debug!(members = ?members, "grouped fragments by identical headers");
        groups.push(FragmentGroup::from_members(members, GroupFormation::ExactHeaders));
    }

    let remaining = (0..fragments.len())
        .filter(|index| !grouped[*index])
        .collect::<Vec<usize>>();

    let clustered = match config.clustering {
        ClusteringMode::SeedGreedy => {
            seed_greedy_clusters(scorer, config, fragments, &remaining, canonical_width)
        }
        ClusteringMode::Transitive => {
            transitive_clusters(scorer, config, fragments, &remaining, canonical_width)
        }
    };
    groups.extend(
        clustered
            .into_iter()
            .map(|members| FragmentGroup::from_members(members, GroupFormation::Similarity)),
    );

    groups.sort_by_key(FragmentGroup::first);
    groups
}

fn exact_header_buckets(scorer: &FragmentScorer, fragments: &[TableFragment]) -> Vec<Vec<usize>> {
    let mut order = Vec::<Vec<String>>::new();
    let mut buckets = HashMap::<Vec<String>, Vec<usize>>::new();

    for (index, fragment) in fragments.iter().enumerate() {
        let key = scorer.normalizer().normalize_all(&fragment.headers);
        let bucket = buckets.entry(key.clone()).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(index);
    }

    order
        .into_iter()
        .filter_map(|key| buckets.remove(&key))
        .filter(|members| members.len() >= 2)
        .collect()
}

fn seed_greedy_clusters(
    scorer: &FragmentScorer,
    config: &StitchConfig,
    fragments: &[TableFragment],
    remaining: &[usize],
    canonical_width: usize,
) -> Vec<Vec<usize>> {
    let mut processed = vec![false; remaining.len()];
    let mut clusters = Vec::<Vec<usize>>::new();

    for seed_position in 0..remaining.len() {
        if processed[seed_position] {
            continue;
        }
        processed[seed_position] = true;

        let seed = remaining[seed_position];
        let mut members = vec![seed];
        for candidate_position in 0..remaining.len() {
            if processed[candidate_position] {
                continue;
            }

            let candidate = remaining[candidate_position];
            let similarity = scorer.score(&fragments[seed], &fragments[candidate], canonical_width);
            debug!(
                seed,
                candidate,
                score = similarity.total,
                split = similarity.split_detected,
                "scored fragment against group seed"
            );
            if similarity.total >= config.merge_threshold {
                processed[candidate_position] = true;
                members.push(candidate);
            }
        }

        clusters.push(members);
    }

    clusters
}

fn transitive_clusters(
    scorer: &FragmentScorer,
    config: &StitchConfig,
    fragments: &[TableFragment],
    remaining: &[usize],
    canonical_width: usize,
) -> Vec<Vec<usize>> {
    let mut sets = DisjointSets::new(remaining.len());

    for left in 0..remaining.len() {
        for right in (left + 1)..remaining.len() {
            let similarity = scorer.score(
                &fragments[remaining[left]],
                &fragments[remaining[right]],
                canonical_width,
            );
            if similarity.total >= config.merge_threshold {
                sets.union(left, right);
            }
        }
    }

    let mut roots = Vec::<usize>::new();
    let mut clusters = HashMap::<usize, Vec<usize>>::new();
    for (position, index) in remaining.iter().enumerate() {
        let root = sets.find(position);
        let cluster = clusters.entry(root).or_default();
        if cluster.is_empty() {
            roots.push(root);
        }
        cluster.push(*index);
    }

    roots
        .into_iter()
        .filter_map(|root| clusters.remove(&root))
        .collect()
}

struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut cursor = node;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) {
        let left_root = self.find(left);
        let right_root = self.find(right);
        if left_root == right_root {
            return;
        }

        match self.rank[left_root].cmp(&self.rank[right_root]) {
            std::cmp::Ordering::Less => self.parent[left_root] = right_root,
            std::cmp::Ordering::Greater => self.parent[right_root] = left_root,
            std::cmp::Ordering::Equal => {
                self.parent[right_root] = left_root;
                self.rank[left_root] += 1;
            }
        }
    }
}
