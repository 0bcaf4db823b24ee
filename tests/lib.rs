// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::{Path, PathBuf};

use itertools::Itertools;

use svchain::chaining::LinkReason;
use svchain::{chain_cluster, chain_clusters, ChainFinder, ChainingConfig};

mod common;

use common::{describe_links, load_testcase, Testcase};

fn testcase_path(name: &str) -> PathBuf {
    Path::new(file!())
        .parent()
        .unwrap()
        .join("resources/testcases")
        .join(name)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

macro_rules! testcase {
    ($name:ident) => {
        #[test]
        fn $name() {
            init_logging();
            let name = stringify!($name);
            let testcase = load_testcase(&testcase_path(name)).unwrap();
            let (cluster, outcome) = testcase.run().unwrap();
            testcase.check(&cluster, &outcome);
        }
    };
}

// deletion followed by a duplication, one option only
testcase!(test01);
// foldback linking twice into a duplicated breakend
testcase!(test02);
// closure postponed via a replicate
testcase!(test03);
// oversized cluster
testcase!(test04);
// assembled chains merged by a later link
testcase!(test05);
// complex duplication
testcase!(test06);
// candidate link across a low allele ploidy segment
testcase!(test07);
// same, with allele ploidy pruning
testcase!(test08);
// equally replicated SVs linked first
testcase!(test09);
// highest replicated SV linked first
testcase!(test10);

fn all_testcases() -> Vec<Testcase> {
    [
        "test01", "test02", "test03", "test04", "test05", "test06", "test07", "test08",
        "test09", "test10",
    ]
    .iter()
    .map(|name| load_testcase(&testcase_path(name)).unwrap())
    .collect()
}

#[test]
fn test_deterministic_chains() {
    init_logging();
    for testcase in all_testcases() {
        let cluster = testcase.cluster();
        let mut finder = ChainFinder::new(testcase.config().clone());
        let first = finder.form_chains(&cluster, false);
        let second = finder.form_chains(&cluster, false);
        assert_eq!(first.chains(), second.chains());
        assert_eq!(first.diagnostics(), second.diagnostics());
    }
}

#[test]
fn test_reason_counts() {
    init_logging();
    let testcase = load_testcase(&testcase_path("test03")).unwrap();
    let (_, outcome) = testcase.run().unwrap();
    let diagnostics = outcome.diagnostics();

    assert_eq!(diagnostics.link_count(), 4);
    assert_eq!(diagnostics.reason_count(LinkReason::AdjacentMatch), 1);
    assert_eq!(diagnostics.reason_count(LinkReason::SingleOption), 2);
    assert_eq!(diagnostics.reason_count(LinkReason::Shortest), 1);
    assert_eq!(diagnostics.unlinked_breakend_count(), 0);
}

#[test]
fn test_chain_cluster() {
    init_logging();
    let testcase = load_testcase(&testcase_path("test05")).unwrap();
    let mut cluster = testcase.cluster();
    let diagnostics = chain_cluster(&mut cluster, testcase.config()).unwrap();

    assert_eq!(diagnostics.chain_count(), 1);
    assert_eq!(cluster.chains().len(), 1);
    assert_eq!(
        describe_links(&cluster, &cluster.chains()[0]),
        vec![
            "a:end-b:start(ASMB)",
            "b:end-c:start(ONLY)",
            "c:end-d:start(ASMB)"
        ]
    );
}

#[test]
fn test_chain_clusters_in_parallel() {
    init_logging();
    let testcases = all_testcases();
    let expected = testcases
        .iter()
        .map(|testcase| {
            let cluster = testcase.cluster();
            ChainFinder::new(testcase.config().clone())
                .form_chains(&cluster, false)
                .diagnostics()
                .chain_count()
        })
        .collect_vec();

    // testcases with custom settings are left out
    let config = ChainingConfig::default();
    let mut clusters = testcases
        .iter()
        .filter(|testcase| testcase.config() == &config)
        .map(|testcase| testcase.cluster())
        .collect_vec();
    let diagnostics = chain_clusters(&mut clusters, &config).unwrap();

    let expected = testcases
        .iter()
        .zip(expected)
        .filter(|(testcase, _)| testcase.config() == &config)
        .map(|(_, count)| count)
        .collect_vec();
    assert_eq!(
        diagnostics.iter().map(|d| d.chain_count()).collect_vec(),
        expected
    );
    for (cluster, count) in clusters.iter().zip(expected) {
        assert_eq!(cluster.chains().len(), count);
    }
}

#[test]
fn test_ploidy_reason_counts() {
    init_logging();
    let reason_counts = |name: &str| {
        let (_, outcome) = load_testcase(&testcase_path(name)).unwrap().run().unwrap();
        (
            outcome.diagnostics().reason_count(LinkReason::PloidyMatch),
            outcome.diagnostics().reason_count(LinkReason::PloidyMax),
        )
    };
    assert_eq!(reason_counts("test09"), (1, 0));
    assert_eq!(reason_counts("test10"), (0, 1));
}
