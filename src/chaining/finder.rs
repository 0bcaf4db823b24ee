// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::VecDeque;
use std::mem;

use anyhow::Result;

use crate::chaining::{
    priority, BreakendIndex, Chain, ChainAssembler, ChainDiagnostics, HomologyTiLength,
    LinkedPair, MinTiLength, PloidyLimits, PossibleLinkIndex,
};
use crate::cluster::Cluster;
use crate::config::ChainingConfig;
use crate::errors::Error;

/// Chains and diagnostics of a chain finding run.
#[derive(Debug, Clone, Getters, new)]
pub struct ChainingOutcome {
    #[getset(get = "pub")]
    chains: Vec<Chain>,
    #[getset(get = "pub")]
    diagnostics: ChainDiagnostics,
}

impl ChainingOutcome {
    pub fn into_parts(self) -> (Vec<Chain>, ChainDiagnostics) {
        (self.chains, self.diagnostics)
    }
}

/// Greedy chain finder for the SVs of one cluster.
///
/// Assembled links are committed first. Afterwards, each iteration asks the rule
/// cascade in `priority` for candidate pairs and commits them shortest first, until
/// no candidates are left. A finder can be reused for any number of clusters, its
/// working set is reset at the start of every run.
pub struct ChainFinder {
    config: ChainingConfig,
    min_ti_length: Box<dyn MinTiLength + Send + Sync>,
    assembler: ChainAssembler,
    iterations: usize,
}

impl ChainFinder {
    pub fn new(config: ChainingConfig) -> Self {
        let min_ti_length = Box::new(HomologyTiLength::new(config.min_ti_length()));
        ChainFinder {
            config,
            min_ti_length,
            assembler: ChainAssembler::default(),
            iterations: 0,
        }
    }

    /// Replace the minimum templated insertion length rule.
    pub fn with_min_ti_length<M>(mut self, min_ti_length: M) -> Self
    where
        M: MinTiLength + Send + Sync + 'static,
    {
        self.min_ti_length = Box::new(min_ti_length);
        self
    }

    pub fn config(&self) -> &ChainingConfig {
        &self.config
    }

    /// Drop the working set of the last run.
    pub fn clear(&mut self) {
        self.assembler = ChainAssembler::default();
        self.iterations = 0;
    }

    /// Find the chains of the given cluster.
    ///
    /// With `assembled_links_only`, the run stops after committing the assembled links.
    /// Invalid runs yield no chains; the reason is reported via the diagnostics.
    pub fn form_chains(
        &mut self,
        cluster: &Cluster,
        assembled_links_only: bool,
    ) -> ChainingOutcome {
        self.clear();

        if cluster.sv_count() > self.config.max_cluster_svs() {
            warn!(
                "cluster({}) has {} SVs, more than the maximum of {}; skipping chaining",
                cluster.id(),
                cluster.sv_count(),
                self.config.max_cluster_svs()
            );
            let diagnostics = ChainDiagnostics::skipped(cluster);
            diagnostics.log_summary();
            return ChainingOutcome::new(Vec::new(), diagnostics);
        }

        debug!(
            "cluster({}) chaining {} SVs ({} unique), {} assembled links",
            cluster.id(),
            cluster.sv_count(),
            cluster.unique_sv_count(),
            cluster.assembled_links().len()
        );
        self.assembler = ChainAssembler::new(cluster);
        let index = BreakendIndex::new(cluster);
        trace!("cluster({}) breakends {}", cluster.id(), index.describe(cluster));
        let ploidy_limits =
            PloidyLimits::new(cluster, &index, self.config.allele_ploidy_tolerance());

        let mut diagnostics = ChainDiagnostics::new(cluster);
        diagnostics.set_valid_allele_ploidy_perc(ploidy_limits.valid_segment_perc());
        diagnostics.set_max_cluster_ploidy(ploidy_limits.max_cluster_ploidy());

        let result = self
            .run(cluster, &index, &ploidy_limits, assembled_links_only)
            .and_then(|()| {
                ChainDiagnostics::check_consistency(cluster, self.assembler.chains())
            });
        if let Err(e) = result {
            diagnostics.invalidate(&e);
        }

        diagnostics.set_iterations(self.iterations);
        diagnostics.set_unlinked_breakend_count(self.assembler.unlinked().total());
        let chains = if diagnostics.is_valid() {
            mem::take(&mut self.assembler).into_chains()
        } else {
            self.clear();
            Vec::new()
        };
        diagnostics.record_chains(cluster, &chains);
        diagnostics.log_summary();

        ChainingOutcome::new(chains, diagnostics)
    }

    fn run(
        &mut self,
        cluster: &Cluster,
        index: &BreakendIndex,
        ploidy_limits: &PloidyLimits,
        assembled_links_only: bool,
    ) -> Result<()> {
        self.seed_assembled_links(cluster)?;
        if assembled_links_only {
            return Ok(());
        }

        let pruning = if self.config.use_allele_ploidies() {
            Some((ploidy_limits, self.config.min_allele_ploidy()))
        } else {
            None
        };
        let possible_links = PossibleLinkIndex::build(
            cluster,
            index,
            self.assembler.unlinked(),
            self.min_ti_length.as_ref(),
            pruning,
        );
        debug!(
            "cluster({}) {} candidate links, {} foldback and {} complex duplication candidates",
            cluster.id(),
            possible_links.pair_count(),
            possible_links.foldback_candidates().len(),
            possible_links.complex_dup_candidates().len()
        );
        self.assembler.set_possible_links(possible_links);

        let mut no_progress = 0;
        loop {
            self.iterations += 1;
            let last_link_index = self.assembler.link_index();

            let pairs = self.find_possible_pairs(cluster);
            if pairs.is_empty() {
                if self.assembler.has_skipped_pairs() && !self.assembler.allow_closure() {
                    debug!(
                        "cluster({}) retrying {} deferred pairs, allowing chains to close",
                        cluster.id(),
                        self.assembler.skipped().len()
                    );
                    self.assembler.restore_skipped_pairs();
                    self.assembler.set_allow_closure(true);
                    continue;
                }
                break;
            }

            self.process_possible_pairs(cluster, pairs)?;

            if self.assembler.link_index() == last_link_index {
                no_progress += 1;
                if no_progress >= self.config.max_no_progress_iterations() {
                    return Err(Error::ChainingStalled {
                        iterations: no_progress,
                    }
                    .into());
                }
            } else {
                no_progress = 0;
                self.assembler.set_allow_closure(false);
            }
        }

        Ok(())
    }

    /// Commit each assembled link as often as both of its SVs are replicated.
    fn seed_assembled_links(&mut self, cluster: &Cluster) -> Result<()> {
        for link in cluster.assembled_links() {
            let repeats = cluster
                .sv(link.first().sv)
                .replication_count()
                .min(cluster.sv(link.second().sv).replication_count());
            for _ in 0..repeats {
                self.assembler.add_pair_to_chain(cluster, link)?;
            }
        }
        Ok(())
    }

    /// Ask the rules in order of priority for the next pairs to link.
    fn find_possible_pairs(&mut self, cluster: &Cluster) -> Vec<LinkedPair> {
        let assembler = &mut self.assembler;
        let has_replication = cluster.has_replicated_svs();

        let pairs =
            priority::single_option_pairs(&assembler.possible_links, &assembler.unlinked);
        if !pairs.is_empty() {
            return pairs;
        }

        if has_replication {
            let pairs = priority::duplication_pairs(
                cluster,
                &assembler.possible_links,
                &assembler.unlinked,
            );
            if !pairs.is_empty() {
                return pairs;
            }
        }

        if let Some(pair) = priority::adjacent_pair(
            &mut assembler.possible_links,
            &assembler.unlinked,
            &assembler.committed,
        ) {
            return vec![pair];
        }

        if has_replication {
            let pairs =
                priority::ploidy_match_pairs(&assembler.possible_links, &assembler.ledger);
            if !pairs.is_empty() {
                return pairs;
            }
            let pairs =
                priority::ploidy_max_pairs(&assembler.possible_links, &mut assembler.ledger);
            if !pairs.is_empty() {
                return pairs;
            }
        }

        priority::shortest_pairs(&assembler.possible_links)
    }

    /// Commit the given pairs shortest first.
    ///
    /// After each commit, pairs that became the single option of a breakend take
    /// precedence, except over the partner links of a foldback or complex duplication.
    /// Mirror images of committed links are dropped from the remaining pairs.
    fn process_possible_pairs(
        &mut self,
        cluster: &Cluster,
        mut pairs: Vec<LinkedPair>,
    ) -> Result<()> {
        pairs.sort_by_key(|pair| pair.sort_key());
        let mut pairs: VecDeque<_> = pairs.into_iter().collect();
        let mut single_options = VecDeque::new();

        loop {
            let duplication_first = pairs.front().map_or(false, is_duplication_link);
            let next = if duplication_first {
                pairs.pop_front()
            } else {
                single_options.pop_front().or_else(|| pairs.pop_front())
            };
            let pair = match next {
                Some(pair) => pair,
                None => break,
            };

            let assembler = &self.assembler;
            if !assembler.unlinked.is_live(pair.first())
                || !assembler.unlinked.is_live(pair.second())
                || !assembler.possible_links.contains(&pair)
            {
                continue;
            }

            if !self.assembler.add_pair_to_chain(cluster, &pair)? {
                continue;
            }

            let assembler = &self.assembler;
            pairs.retain(|other| {
                (is_duplication_link(other) || !other.opposite_match(&pair))
                    && assembler.unlinked.is_live(other.first())
                    && assembler.unlinked.is_live(other.second())
            });
            single_options =
                priority::single_option_pairs(&assembler.possible_links, &assembler.unlinked)
                    .into_iter()
                    .collect();
        }

        Ok(())
    }
}

fn is_duplication_link(pair: &LinkedPair) -> bool {
    pair.link_reason()
        .map_or(false, |reason| reason.is_duplication())
}
