// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeSet;
use std::mem;

use anyhow::Result;

use crate::chaining::{
    Chain, LinkedPair, PossibleLinkIndex, ReplicationLedger, UnlinkedBreakends,
};
use crate::cluster::Cluster;
use crate::errors::Error;
use crate::variants::{BreakendId, Ends};

/// Where a candidate pair ends up.
#[derive(Debug)]
enum Placement {
    Extend {
        chain: usize,
        end: Ends,
        link: LinkedPair,
    },
    Close {
        chain: usize,
        link: LinkedPair,
    },
    NewChain(LinkedPair),
    Defer,
}

/// Working set of a chain finding run: the chains built so far and the bookkeeping
/// of live breakend instances.
#[derive(Debug, Clone, Default, Getters, CopyGetters)]
pub struct ChainAssembler {
    #[getset(get = "pub")]
    pub(crate) chains: Vec<Chain>,
    #[getset(get = "pub")]
    pub(crate) unlinked: UnlinkedBreakends,
    #[getset(get = "pub")]
    pub(crate) ledger: ReplicationLedger,
    #[getset(get = "pub")]
    pub(crate) possible_links: PossibleLinkIndex,
    #[getset(get = "pub")]
    skipped: Vec<LinkedPair>,
    // candidate pairs committed at least once
    pub(crate) committed: BTreeSet<(BreakendId, BreakendId)>,
    #[getset(get_copy = "pub")]
    link_index: usize,
    next_chain_id: usize,
    #[getset(get_copy = "pub")]
    allow_closure: bool,
}

impl ChainAssembler {
    pub fn new(cluster: &Cluster) -> Self {
        ChainAssembler {
            unlinked: UnlinkedBreakends::new(cluster),
            ledger: ReplicationLedger::new(cluster),
            ..Default::default()
        }
    }

    pub(crate) fn set_possible_links(&mut self, possible_links: PossibleLinkIndex) {
        self.possible_links = possible_links;
    }

    /// Allow pairs joining both ends of a chain to close it.
    pub(crate) fn set_allow_closure(&mut self, allow_closure: bool) {
        self.allow_closure = allow_closure;
    }

    pub fn has_skipped_pairs(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Return deferred pairs to the possible links if both sides are still live.
    pub(crate) fn restore_skipped_pairs(&mut self) {
        for pair in mem::take(&mut self.skipped) {
            if self.unlinked.is_live(pair.first()) && self.unlinked.is_live(pair.second()) {
                self.possible_links.restore(pair);
            }
        }
    }

    pub(crate) fn into_chains(self) -> Vec<Chain> {
        self.chains
    }

    /// Commit a candidate pair of original breakends between live instances.
    ///
    /// Returns `false` if the pair was deferred because it would close a chain, or if
    /// an assembled pair had to be dropped.
    pub fn add_pair_to_chain(&mut self, cluster: &Cluster, pair: &LinkedPair) -> Result<bool> {
        let unresolvable = || -> anyhow::Error {
            Error::UnresolvableLinkedPair {
                lower: pair.first(),
                upper: pair.second(),
            }
            .into()
        };

        if !self.unlinked.is_live(pair.first()) || !self.unlinked.is_live(pair.second()) {
            if pair.is_assembled() {
                warn!(
                    "cluster({}) dropping assembled link {}-{}: no unlinked instances left",
                    cluster.id(),
                    cluster.breakend_name(pair.first()),
                    cluster.breakend_name(pair.second())
                );
                return Ok(false);
            }
            return Err(unresolvable());
        }

        let link = match self.place(cluster, pair).ok_or_else(unresolvable)? {
            Placement::Defer => {
                trace!("cluster({}) deferring {} to keep chain open", cluster.id(), pair);
                self.possible_links.remove_pair(pair);
                self.skipped.push(pair.clone());
                return Ok(false);
            }
            Placement::Extend { chain, end, link } => {
                let link = self.next_link(link);
                self.chains[chain].add_link(link.clone(), end);
                link
            }
            Placement::Close { chain, link } => {
                let link = self.next_link(link);
                debug!(
                    "cluster({}) closing chain {} with {}",
                    cluster.id(),
                    self.chains[chain].id(),
                    link
                );
                self.chains[chain].close(link.clone());
                link
            }
            Placement::NewChain(link) => {
                let link = self.next_link(link);
                self.chains.push(Chain::new(self.next_chain_id, link.clone()));
                self.next_chain_id += 1;
                link
            }
        };
        trace!("cluster({}) link {}", cluster.id(), link);

        self.register_commit(cluster, pair, &link);
        self.reconcile_chains(cluster);
        self.restore_skipped_pairs();

        Ok(true)
    }

    fn next_link(&mut self, mut link: LinkedPair) -> LinkedPair {
        self.link_index += 1;
        link.set_link_index(self.link_index);
        link
    }

    fn place(&self, cluster: &Cluster, pair: &LinkedPair) -> Option<Placement> {
        for (i, chain) in self.chains.iter().enumerate() {
            let (start_open, end_open) =
                match (chain.open_breakend(Ends::Start), chain.open_breakend(Ends::End)) {
                    (Some(start_open), Some(end_open)) => (start_open, end_open),
                    _ => continue,
                };

            match (
                self.matching_side(cluster, pair, start_open),
                self.matching_side(cluster, pair, end_open),
            ) {
                (Some(start_side), Some(end_side)) if start_side != end_side => {
                    // linking these instances would turn the chain into a loop
                    if let Some(alternative) =
                        self.alternative_instance(pair.breakend(start_side), start_open)
                    {
                        return Some(Placement::Extend {
                            chain: i,
                            end: Ends::End,
                            link: pair.with_breakends(end_open, alternative),
                        });
                    }
                    if let Some(alternative) =
                        self.alternative_instance(pair.breakend(end_side), end_open)
                    {
                        return Some(Placement::Extend {
                            chain: i,
                            end: Ends::Start,
                            link: pair.with_breakends(start_open, alternative),
                        });
                    }
                    if self.allow_closure {
                        return Some(Placement::Close {
                            chain: i,
                            link: pair.with_breakends(end_open, start_open),
                        });
                    }
                    return Some(Placement::Defer);
                }
                (Some(side), _) => {
                    let partner =
                        self.partner_instance(cluster, pair.breakend(side.other()), i)?;
                    return Some(Placement::Extend {
                        chain: i,
                        end: Ends::Start,
                        link: pair.with_breakends(start_open, partner),
                    });
                }
                (None, Some(side)) => {
                    let partner =
                        self.partner_instance(cluster, pair.breakend(side.other()), i)?;
                    return Some(Placement::Extend {
                        chain: i,
                        end: Ends::End,
                        link: pair.with_breakends(end_open, partner),
                    });
                }
                (None, None) => (),
            }
        }

        Some(Placement::NewChain(pair.with_breakends(
            self.unlinked.first(pair.first())?,
            self.unlinked.first(pair.second())?,
        )))
    }

    /// The side of the candidate pair whose original breakend the given live instance
    /// belongs to.
    fn matching_side(
        &self,
        cluster: &Cluster,
        pair: &LinkedPair,
        instance: BreakendId,
    ) -> Option<Ends> {
        let original = cluster.original_breakend(instance);
        if !self.unlinked.is_live_instance(original, instance) {
            return None;
        }
        Ends::BOTH
            .iter()
            .copied()
            .find(|side| pair.breakend(*side) == original)
    }

    fn alternative_instance(
        &self,
        original: BreakendId,
        exclude: BreakendId,
    ) -> Option<BreakendId> {
        self.unlinked
            .instances(original)
            .find(|instance| *instance != exclude)
    }

    /// Instance to link to a chain end: preferably the open breakend of another chain,
    /// so that both chains can be merged, otherwise the oldest live instance.
    fn partner_instance(
        &self,
        cluster: &Cluster,
        original: BreakendId,
        chain: usize,
    ) -> Option<BreakendId> {
        let open_instance = self
            .chains
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != chain)
            .flat_map(|(_, other)| {
                Ends::BOTH
                    .iter()
                    .filter_map(move |end| other.open_breakend(*end))
            })
            .find(|open| {
                cluster.original_breakend(*open) == original
                    && self.unlinked.is_live_instance(original, *open)
            });
        open_instance.or_else(|| self.unlinked.first(original))
    }

    fn register_commit(&mut self, cluster: &Cluster, pair: &LinkedPair, link: &LinkedPair) {
        for instance in link.breakends().iter() {
            let original = cluster.original_breakend(*instance);
            if self.unlinked.consume(original, *instance) {
                trace!(
                    "cluster({}) breakend {} exhausted",
                    cluster.id(),
                    cluster.breakend_name(original)
                );
                self.possible_links.remove_breakend(original);
                self.possible_links.remove_candidate_sv(original.sv);
            }
            self.ledger.decrement(original.sv);
        }
        self.committed.insert((pair.first(), pair.second()));
    }

    /// Merge chains that share an SV instance at their ends until no merge is left.
    fn reconcile_chains(&mut self, cluster: &Cluster) {
        loop {
            let mut merge = None;
            'search: for i in 0..self.chains.len() {
                for j in i + 1..self.chains.len() {
                    if let Some(merged) = self.chains[i].merge(&self.chains[j]) {
                        merge = Some((i, j, merged));
                        break 'search;
                    }
                }
            }
            match merge {
                Some((i, j, merged)) => {
                    debug!(
                        "cluster({}) merged chain {} into chain {}",
                        cluster.id(),
                        self.chains[j].id(),
                        merged.id()
                    );
                    self.chains[i] = merged;
                    self.chains.remove(j);
                }
                None => break,
            }
        }
    }
}
