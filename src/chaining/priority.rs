// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Prioritisation rules selecting the next candidate pairs to link.
//!
//! Rules are tried in a fixed order until one yields pairs: single options,
//! foldbacks and complex duplications, adjacent matching pairs, ploidy matches,
//! highest replication and finally the shortest pairs of the most constrained
//! breakends. Every returned pair carries the reason of the rule that chose it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use itertools::Itertools;

use crate::chaining::{
    LinkReason, LinkedPair, PossibleLinkIndex, ReplicationLedger, UnlinkedBreakends,
};
use crate::cluster::Cluster;
use crate::variants::{BreakendId, Ends, SvId};

/// Number of link slots left on a pair, i.e. the lower live count of its two sides.
fn available_slots(pair: &LinkedPair, unlinked: &UnlinkedBreakends) -> usize {
    unlinked
        .live_count(pair.first())
        .min(unlinked.live_count(pair.second()))
}

fn push_unique(pairs: &mut Vec<LinkedPair>, pair: &LinkedPair, reason: LinkReason) {
    if !pairs.iter().any(|existing| existing.same_link(pair)) {
        pairs.push(pair.clone().with_reason(reason));
    }
}

/// Pairs that are the only option of at least one of their breakends.
///
/// Conflicting pairs (sharing a breakend or mirroring each other) are resolved in
/// favour of more available slots, then shorter length.
pub fn single_option_pairs(
    possible_links: &PossibleLinkIndex,
    unlinked: &UnlinkedBreakends,
) -> Vec<LinkedPair> {
    let mut selected: Vec<LinkedPair> = Vec::new();

    for (_, links) in possible_links.iter() {
        if links.len() != 1 {
            continue;
        }
        let pair = &links[0];
        if selected.iter().any(|existing| existing.same_link(pair)) {
            continue;
        }

        let conflicts = selected
            .iter()
            .enumerate()
            .filter(|(_, existing)| {
                existing.has_shared_breakend(pair) || existing.opposite_match(pair)
            })
            .map(|(i, _)| i)
            .collect_vec();
        let supersedes = conflicts.iter().all(|&i| {
            let existing = &selected[i];
            match available_slots(pair, unlinked).cmp(&available_slots(existing, unlinked)) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => pair.length() < existing.length(),
            }
        });
        if supersedes {
            for i in conflicts.into_iter().rev() {
                selected.remove(i);
            }
            selected.push(pair.clone().with_reason(LinkReason::SingleOption));
        }
    }

    selected.sort_by_key(|pair| pair.sort_key());
    selected
}

#[derive(Debug)]
struct DuplicationOption {
    sv: SvId,
    pairs: [LinkedPair; 2],
    slots: usize,
    length: u64,
}

impl DuplicationOption {
    fn new(sv: SvId, pairs: [LinkedPair; 2], unlinked: &UnlinkedBreakends) -> Self {
        let slots =
            available_slots(&pairs[0], unlinked).min(available_slots(&pairs[1], unlinked));
        let length = pairs[0].length() + pairs[1].length();
        DuplicationOption {
            sv,
            pairs,
            slots,
            length,
        }
    }
}

/// Options of a duplicating SV: pairs of links from its start and end breakends whose
/// partners satisfy `targets`.
fn duplication_options<F>(
    sv: SvId,
    cluster: &Cluster,
    possible_links: &PossibleLinkIndex,
    unlinked: &UnlinkedBreakends,
    targets: F,
) -> Vec<DuplicationOption>
where
    F: Fn(BreakendId, BreakendId) -> bool,
{
    let start = BreakendId::new(sv, Ends::Start);
    let end = BreakendId::new(sv, Ends::End);
    if !unlinked.is_live(start) || !unlinked.is_live(end) {
        return Vec::new();
    }
    let replication_count = cluster.sv(sv).replication_count();

    let mut options = Vec::new();
    for start_pair in possible_links.links(start) {
        let start_target = match start_pair.other_breakend(start) {
            Some(target) => target,
            None => continue,
        };
        if cluster.sv(start_target.sv).replication_count() < replication_count {
            continue;
        }
        for end_pair in possible_links.links(end) {
            match end_pair.other_breakend(end) {
                Some(end_target) if targets(start_target, end_target) => {
                    options.push(DuplicationOption::new(
                        sv,
                        [start_pair.clone(), end_pair.clone()],
                        unlinked,
                    ));
                }
                _ => (),
            }
        }
    }
    options
}

/// Links of foldbacks onto a common breakend and of complex duplications onto both
/// breakends of a higher replicated SV.
///
/// Only applies to clusters with replicated SVs.
pub fn duplication_pairs(
    cluster: &Cluster,
    possible_links: &PossibleLinkIndex,
    unlinked: &UnlinkedBreakends,
) -> Vec<LinkedPair> {
    if !cluster.has_replicated_svs() {
        return Vec::new();
    }

    let mut options = Vec::new();
    for &sv in possible_links.foldback_candidates() {
        let mut sv_options =
            duplication_options(sv, cluster, possible_links, unlinked, |start, end| {
                start == end && unlinked.live_count(start) >= 2
            });
        options.append(&mut sv_options);
    }
    let foldback_count = options.len();
    for &sv in possible_links.complex_dup_candidates() {
        let mut sv_options =
            duplication_options(sv, cluster, possible_links, unlinked, |start, end| {
                start.sv == end.sv && start.end != end.end
            });
        options.append(&mut sv_options);
    }

    let mut ranked = options.into_iter().enumerate().collect_vec();
    ranked.sort_by(|(_, a), (_, b)| b.slots.cmp(&a.slots).then(a.length.cmp(&b.length)));

    let mut selected: Vec<LinkedPair> = Vec::new();
    let mut resolved_svs = BTreeSet::new();
    for (i, option) in ranked {
        if resolved_svs.contains(&option.sv) {
            continue;
        }
        let overlaps = option.pairs.iter().any(|pair| {
            selected
                .iter()
                .any(|existing| existing.same_link(pair) || existing.opposite_match(pair))
        });
        if overlaps {
            continue;
        }
        let reason = if i < foldback_count {
            LinkReason::Foldback
        } else {
            LinkReason::ComplexDuplication
        };
        debug!(
            "cluster({}) {} SV {} via {} and {}",
            cluster.id(),
            reason,
            cluster.sv(option.sv).name(),
            option.pairs[0],
            option.pairs[1]
        );
        resolved_svs.insert(option.sv);
        for pair in option.pairs.iter() {
            push_unique(&mut selected, pair, reason);
        }
    }
    selected
}

/// Next adjacent pair of equally replicated SVs that is still linkable.
///
/// Consumes entries from the queue of adjacent pairs until one qualifies.
pub fn adjacent_pair(
    possible_links: &mut PossibleLinkIndex,
    unlinked: &UnlinkedBreakends,
    committed: &BTreeSet<(BreakendId, BreakendId)>,
) -> Option<LinkedPair> {
    while let Some(pair) = possible_links.pop_adjacent_matching_pair() {
        if !unlinked.is_live(pair.first()) || !unlinked.is_live(pair.second()) {
            continue;
        }
        if !possible_links.contains(&pair) {
            continue;
        }
        if committed.contains(&(pair.first(), pair.second())) {
            continue;
        }
        return Some(pair.with_reason(LinkReason::AdjacentMatch));
    }
    None
}

fn sv_breakends(svs: &[SvId]) -> impl Iterator<Item = BreakendId> + Clone + '_ {
    svs.iter()
        .flat_map(|sv| Ends::BOTH.iter().map(move |end| BreakendId::new(*sv, *end)))
}

/// Pairs joining two SVs that both share the highest remaining replication count.
pub fn ploidy_match_pairs(
    possible_links: &PossibleLinkIndex,
    ledger: &ReplicationLedger,
) -> Vec<LinkedPair> {
    let max_count = match ledger.max_count() {
        Some(count) if count > 1 => count,
        _ => return Vec::new(),
    };
    let svs = ledger.svs_with_count(max_count);

    let mut pairs = Vec::new();
    for breakend in sv_breakends(&svs) {
        for pair in possible_links.links(breakend) {
            let other = match pair.other_breakend(breakend) {
                Some(other) => other,
                None => continue,
            };
            if svs.contains(&other.sv) {
                push_unique(&mut pairs, pair, LinkReason::PloidyMatch);
            }
        }
    }
    pairs.sort_by_key(|pair| pair.sort_key());
    pairs
}

/// All pairs of the breakends with the fewest options among the given breakends.
fn fewest_option_pairs<I>(
    breakends: I,
    possible_links: &PossibleLinkIndex,
    reason: LinkReason,
) -> Vec<LinkedPair>
where
    I: Iterator<Item = BreakendId> + Clone,
{
    let min_count = match breakends
        .clone()
        .map(|breakend| possible_links.link_count(breakend))
        .filter(|count| *count > 0)
        .min()
    {
        Some(count) => count,
        None => return Vec::new(),
    };

    let mut pairs = Vec::new();
    for breakend in breakends {
        if possible_links.link_count(breakend) == min_count {
            for pair in possible_links.links(breakend) {
                push_unique(&mut pairs, pair, reason);
            }
        }
    }
    pairs.sort_by_key(|pair| pair.sort_key());
    pairs
}

/// Fewest-option pairs of the SVs with the highest remaining replication.
///
/// If none of these SVs has a candidate left, they are evicted from the ledger and no
/// pairs are returned.
pub fn ploidy_max_pairs(
    possible_links: &PossibleLinkIndex,
    ledger: &mut ReplicationLedger,
) -> Vec<LinkedPair> {
    let max_count = match ledger.max_count() {
        Some(count) => count,
        None => return Vec::new(),
    };
    let svs = ledger.svs_with_count(max_count);
    let pairs = fewest_option_pairs(sv_breakends(&svs), possible_links, LinkReason::PloidyMax);
    if pairs.is_empty() {
        debug!(
            "evicting {} SVs with replication {} without candidate links",
            svs.len(),
            max_count
        );
        ledger.evict(&svs);
    }
    pairs
}

/// Fewest-option pairs over all breakends.
pub fn shortest_pairs(possible_links: &PossibleLinkIndex) -> Vec<LinkedPair> {
    let breakends = possible_links.iter().map(|(breakend, _)| breakend).collect_vec();
    fewest_option_pairs(breakends.into_iter(), possible_links, LinkReason::Shortest)
}
