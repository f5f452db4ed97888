use std::collections::{HashMap, HashSet};

/// Ratcliff/Obershelp ratio: `2 * matched / (len_a + len_b)` over characters,
/// where matches come from recursively taking the longest common block.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<char>>();
    let b = b.chars().collect::<Vec<char>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matched_characters(&a, &b) as f64 / total as f64
}

fn matched_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j = HashMap::<char, Vec<usize>>::new();
    for (index, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(index);
    }

    let mut matched = 0usize;
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }

        matched += size;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            queue.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0usize);
    let mut run_lengths = HashMap::<usize, usize>::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_lengths = HashMap::<usize, usize>::new();
        if let Some(positions) = b2j.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }

                let previous = if j > 0 {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0)
                } else {
                    0
                };
                let length = previous + 1;
                next_lengths.insert(j, length);
                if length > best.2 {
                    best = (i + 1 - length, j + 1 - length, length);
                }
            }
        }
        run_lengths = next_lengths;
    }

    best
}

pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

pub fn jaccard<T: Eq + std::hash::Hash>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / union as f64
}

pub fn word_jaccard(left: &str, right: &str) -> f64 {
    jaccard(&word_set(left), &word_set(right))
}

pub fn char_set_jaccard(left: &str, right: &str) -> f64 {
    let left = left
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<HashSet<char>>();
    let right = right
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<HashSet<char>>();
    jaccard(&left, &right)
}
