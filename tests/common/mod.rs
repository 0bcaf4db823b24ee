// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::Path;

use anyhow::Result;
use approx::assert_relative_eq;
use itertools::Itertools;
use serde_derive::Deserialize;

use svchain::chaining::{Chain, ChainDiagnostics, ChainFinder, ChainingOutcome};
use svchain::{Cluster, ChainingConfig, ClusterDescription};

pub(crate) fn load_testcase(path: impl AsRef<Path>) -> Result<Testcase> {
    let content = fs::read_to_string(path.as_ref().join("testcase.yaml"))?;
    Ok(serde_yaml::from_str(&content)?)
}

#[derive(Debug, Deserialize)]
pub(crate) struct Testcase {
    #[serde(default)]
    config: ChainingConfig,
    cluster: ClusterDescription,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    #[serde(default = "default_true")]
    valid: bool,
    #[serde(default)]
    skipped: bool,
    #[serde(default)]
    unlinked_svs: Option<usize>,
    #[serde(default)]
    valid_allele_ploidy_perc: Option<f64>,
    #[serde(default)]
    max_cluster_ploidy: Option<f64>,
    #[serde(default)]
    chains: Vec<ExpectedChain>,
}

/// Links are given as `sv:end-sv:end(REASON)` on original breakends, names sorted.
#[derive(Debug, Deserialize)]
struct ExpectedChain {
    links: Vec<String>,
    #[serde(default)]
    closed: bool,
}

fn default_true() -> bool {
    true
}

impl Testcase {
    pub(crate) fn cluster(&self) -> Cluster {
        self.cluster.to_cluster().unwrap()
    }

    pub(crate) fn config(&self) -> &ChainingConfig {
        &self.config
    }

    pub(crate) fn run(&self) -> Result<(Cluster, ChainingOutcome)> {
        self.config.validate()?;
        let cluster = self.cluster.to_cluster()?;
        let outcome = ChainFinder::new(self.config.clone()).form_chains(&cluster, false);
        Ok((cluster, outcome))
    }

    pub(crate) fn check(&self, cluster: &Cluster, outcome: &ChainingOutcome) {
        let diagnostics = outcome.diagnostics();
        assert_eq!(
            diagnostics.is_valid(),
            self.expected.valid,
            "{:?}",
            diagnostics.invalid_reason()
        );
        assert_eq!(diagnostics.is_skipped(), self.expected.skipped);
        if let Some(unlinked) = self.expected.unlinked_svs {
            assert_eq!(diagnostics.unlinked_sv_count(), unlinked);
        }
        if let Some(perc) = self.expected.valid_allele_ploidy_perc {
            assert_relative_eq!(diagnostics.valid_allele_ploidy_perc(), perc);
        }
        if let Some(ploidy) = self.expected.max_cluster_ploidy {
            assert_relative_eq!(diagnostics.max_cluster_ploidy(), ploidy);
        }
        ChainDiagnostics::check_consistency(cluster, outcome.chains()).unwrap();

        let mut actual = outcome
            .chains()
            .iter()
            .map(|chain| (describe_links(cluster, chain), chain.is_closed()))
            .collect_vec();
        assert_eq!(
            actual.len(),
            self.expected.chains.len(),
            "unexpected chains: {:?}",
            actual
        );
        for expected in &self.expected.chains {
            let found = actual.iter().position(|(links, closed)| {
                *closed == expected.closed
                    && (links == &expected.links
                        || links.iter().rev().eq(expected.links.iter()))
            });
            match found {
                Some(i) => {
                    actual.remove(i);
                }
                None => panic!(
                    "expected chain {:?} not found in {:?}",
                    expected.links, actual
                ),
            }
        }
    }
}

pub(crate) fn describe_links(cluster: &Cluster, chain: &Chain) -> Vec<String> {
    chain
        .links()
        .iter()
        .map(|link| {
            let names = link
                .breakends()
                .iter()
                .map(|breakend| cluster.breakend_name(cluster.original_breakend(*breakend)))
                .sorted()
                .join("-");
            let reason = link
                .link_reason()
                .map_or("NONE".to_owned(), |reason| reason.to_string());
            format!("{}({})", names, reason)
        })
        .collect()
}
