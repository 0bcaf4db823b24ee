// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, VecDeque};

use crate::chaining::{BreakendIndex, LinkedPair, MinTiLength, PloidyLimits, UnlinkedBreakends};
use crate::cluster::Cluster;
use crate::variants::{BreakendId, Orientation, SvId};

/// Candidate templated insertions of every live original breakend, nearest first.
///
/// Built once per run; afterwards it only shrinks, apart from deferred pairs
/// being put back.
#[derive(Debug, Clone, Default)]
pub struct PossibleLinkIndex {
    links: BTreeMap<BreakendId, Vec<LinkedPair>>,
    foldback_candidates: Vec<SvId>,
    complex_dup_candidates: Vec<SvId>,
    adjacent_matching_pairs: VecDeque<LinkedPair>,
}

impl PossibleLinkIndex {
    /// Scan each chromosome left to right, pairing every live reverse facing breakend
    /// with all live forward facing breakends of other SVs further along its arm.
    ///
    /// With `ploidy_limits` given, the scan stops at the first segment lacking the
    /// allele ploidy to carry a templated insertion.
    pub fn build(
        cluster: &Cluster,
        index: &BreakendIndex,
        unlinked: &UnlinkedBreakends,
        min_ti_length: &dyn MinTiLength,
        ploidy_limits: Option<(&PloidyLimits, f64)>,
    ) -> Self {
        let mut possible_links = PossibleLinkIndex::default();
        let has_replication = cluster.has_replicated_svs();

        for (chrom, breakends) in index.chromosomes() {
            for (i, &lower_id) in breakends.iter().enumerate() {
                let lower = match cluster.breakend(lower_id) {
                    Some(lower) => lower,
                    None => continue,
                };
                if lower.orientation() != Orientation::Reverse || !unlinked.is_live(lower_id) {
                    continue;
                }

                let mut is_adjacent = true;
                for (j, &upper_id) in breakends.iter().enumerate().skip(i + 1) {
                    if let Some((limits, min_allele_ploidy)) = ploidy_limits {
                        if !limits.allows_link_across(chrom, j - 1, min_allele_ploidy) {
                            break;
                        }
                    }
                    let upper = match cluster.breakend(upper_id) {
                        Some(upper) => upper,
                        None => continue,
                    };
                    if upper.arm() != lower.arm() {
                        break;
                    }
                    if !unlinked.is_live(upper_id) {
                        continue;
                    }
                    let adjacent = is_adjacent;
                    is_adjacent = false;

                    if upper.orientation() != Orientation::Forward || upper_id.sv == lower_id.sv {
                        continue;
                    }
                    let length = lower.distance(upper);
                    if length < min_ti_length.min_length(lower, upper) {
                        continue;
                    }

                    let pair = LinkedPair::candidate(lower_id, upper_id, length);
                    if adjacent
                        && cluster.sv(lower_id.sv).replication_count()
                            == cluster.sv(upper_id.sv).replication_count()
                    {
                        possible_links.adjacent_matching_pairs.push_back(pair.clone());
                    }
                    if has_replication {
                        possible_links.check_complex_dup(cluster, index, &pair);
                    }
                    possible_links.add_link(pair);
                }
            }
        }

        for links in possible_links.links.values_mut() {
            links.sort_by_key(|link| link.sort_key());
        }

        possible_links.foldback_candidates = cluster
            .foldbacks()
            .into_iter()
            .filter(|sv| {
                cluster
                    .sv(*sv)
                    .breakend_ids()
                    .iter()
                    .all(|breakend| unlinked.is_live(*breakend))
            })
            .collect();

        possible_links
    }

    /// Mark the lower replicated SV of a new pair as complex duplication if both of its
    /// breakends run into the higher replicated SV.
    fn check_complex_dup(&mut self, cluster: &Cluster, index: &BreakendIndex, pair: &LinkedPair) {
        let first_count = cluster.sv(pair.first().sv).replication_count();
        let second_count = cluster.sv(pair.second().sv).replication_count();
        let (low, high) = if first_count < second_count {
            (pair.first(), pair.second())
        } else if second_count < first_count {
            (pair.second(), pair.first())
        } else {
            return;
        };

        let low_sv = cluster.sv(low.sv);
        let high_sv = cluster.sv(high.sv);
        if low_sv.is_foldback()
            || self.complex_dup_candidates.contains(&low.sv)
            || low_sv.ploidy_min() * 2.0 > high_sv.ploidy_max()
        {
            return;
        }

        let other = low.other();
        let (other_breakend, mut pos) = match (cluster.breakend(other), index.index_of(other)) {
            (Some(breakend), Some(pos)) => (breakend, pos),
            _ => return,
        };
        let breakends = index.breakends(other_breakend.chrom());
        let traverse_up = other_breakend.orientation() == Orientation::Reverse;

        loop {
            pos = match (traverse_up, pos) {
                (true, pos) if pos + 1 < breakends.len() => pos + 1,
                (false, pos) if pos > 0 => pos - 1,
                _ => return,
            };
            let next = breakends[pos];
            if next == low {
                return;
            }
            let breakend = match cluster.breakend(next) {
                Some(breakend) => breakend,
                None => return,
            };
            if breakend.is_assembled_link() {
                continue;
            }
            if next.sv == high.sv && breakend.orientation() != other_breakend.orientation() {
                debug!(
                    "cluster({}) SV {} is a complex duplication candidate of SV {}",
                    cluster.id(),
                    low_sv.name(),
                    high_sv.name()
                );
                self.complex_dup_candidates.push(low.sv);
            }
            return;
        }
    }

    fn add_link(&mut self, pair: LinkedPair) {
        self.links
            .entry(pair.second())
            .or_default()
            .push(pair.clone());
        self.links.entry(pair.first()).or_default().push(pair);
    }

    /// Put a pair back, keeping both lists ordered.
    pub(crate) fn restore(&mut self, pair: LinkedPair) {
        if self.contains(&pair) {
            return;
        }
        for breakend in pair.breakends().iter() {
            let links = self.links.entry(*breakend).or_default();
            let pos = links
                .binary_search_by_key(&pair.sort_key(), |link| link.sort_key())
                .unwrap_or_else(|pos| pos);
            links.insert(pos, pair.clone());
        }
    }

    pub fn links(&self, breakend: BreakendId) -> &[LinkedPair] {
        self.links.get(&breakend).map_or(&[], |links| links.as_slice())
    }

    pub fn link_count(&self, breakend: BreakendId) -> usize {
        self.links(breakend).len()
    }

    pub fn contains(&self, pair: &LinkedPair) -> bool {
        self.links(pair.first())
            .iter()
            .any(|link| link.same_link(pair))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BreakendId, &[LinkedPair])> {
        self.links
            .iter()
            .map(|(breakend, links)| (*breakend, links.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Total number of distinct candidate pairs.
    pub fn pair_count(&self) -> usize {
        self.links.values().map(|links| links.len()).sum::<usize>() / 2
    }

    /// Drop an exhausted original breakend and every pair referring to it.
    pub(crate) fn remove_breakend(&mut self, breakend: BreakendId) {
        let removed = match self.links.remove(&breakend) {
            Some(removed) => removed,
            None => return,
        };
        for pair in removed {
            if let Some(other) = pair.other_breakend(breakend) {
                self.remove_from(other, &pair);
            }
        }
    }

    pub(crate) fn remove_pair(&mut self, pair: &LinkedPair) {
        for breakend in pair.breakends().iter() {
            self.remove_from(*breakend, pair);
        }
    }

    fn remove_from(&mut self, breakend: BreakendId, pair: &LinkedPair) {
        let now_empty = match self.links.get_mut(&breakend) {
            Some(links) => {
                links.retain(|link| !link.same_link(pair));
                links.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.links.remove(&breakend);
        }
    }

    pub fn foldback_candidates(&self) -> &[SvId] {
        &self.foldback_candidates
    }

    pub fn complex_dup_candidates(&self) -> &[SvId] {
        &self.complex_dup_candidates
    }

    /// Remove an SV from foldback and complex duplication candidacy.
    pub(crate) fn remove_candidate_sv(&mut self, sv: SvId) {
        self.foldback_candidates.retain(|candidate| *candidate != sv);
        self.complex_dup_candidates.retain(|candidate| *candidate != sv);
    }

    pub(crate) fn pop_adjacent_matching_pair(&mut self) -> Option<LinkedPair> {
        self.adjacent_matching_pairs.pop_front()
    }

    pub fn adjacent_matching_pairs(&self) -> impl Iterator<Item = &LinkedPair> {
        self.adjacent_matching_pairs.iter()
    }
}
