use proptest::prelude::*;
use tardis::{
    exec::Executor,
    signals::{
        self,
        crosstab::{CrossTable, Report},
        llr::{self, LlrOutcome},
        montecarlo::{self, SamplerConfig},
    },
};

fn reports_from_counts(counts: &[(&str, &str, usize)]) -> Vec<Report> {
    let mut out = Vec::new();
    for &(drug, event, n) in counts {
        for i in 0..n {
            out.push(Report::new(format!("{drug}/{event}/{i}"), drug, event));
        }
    }
    out
}

fn reference_reports() -> Vec<Report> {
    reports_from_counts(&[
        ("D1", "A1", 10),
        ("D1", "A2", 1),
        ("D2", "A1", 1),
        ("D2", "A2", 10),
        ("D3", "A1", 5),
        ("D3", "A2", 5),
    ])
}

#[test]
fn reference_example_margins() {
    let table = CrossTable::from_reports(&reference_reports()).unwrap();
    assert_eq!(table.events().collect::<Vec<_>>(), vec!["A1", "A2"]);
    assert_eq!(table.drugs().collect::<Vec<_>>(), vec!["D1", "D2", "D3"]);
    assert_eq!((table.event_total(0), table.event_total(1)), (16, 16));
    assert_eq!(table.drug_total(0), 11);
    assert_eq!(table.drug_total(1), 11);
    assert_eq!(table.drug_total(2), 10);
    assert_eq!(table.grand_total(), 32);
}

#[test]
fn reference_example_scores() {
    let score = |x| llr::log_likelihood_ratio(x, 16, 11, 32).unwrap().value().unwrap();
    assert!((score(10) - 0.010_344_256_271_775).abs() < 1e-12);
    assert!((score(1) - 2.117_504_532_136_750).abs() < 1e-12);
}

#[test]
fn unobserved_pairs_are_undefined_and_dropped() {
    let reports = reports_from_counts(&[("d1", "a1", 3), ("d2", "a2", 4), ("d1", "a2", 1)]);
    let table = CrossTable::from_reports(&reports).unwrap();
    let exec = Executor::new(2).unwrap();
    let (scores, undefined) = llr::score_grid(&table, &exec).unwrap();
    assert_eq!(undefined, 1);
    assert_eq!(scores.len(), 3);
    let d2 = table.drugs().position(|d| d == "d2").unwrap();
    let a1 = table.events().position(|e| e == "a1").unwrap();
    assert_eq!(
        llr::log_likelihood_ratio(
            table.count(d2, a1),
            table.event_total(a1),
            table.drug_total(d2),
            table.grand_total()
        )
        .unwrap(),
        LlrOutcome::Undefined
    );
}

fn bits(v: &[montecarlo::NullThreshold]) -> Vec<(String, u64)> {
    v.iter()
        .map(|t| (t.drug.clone(), t.threshold.to_bits()))
        .collect()
}

#[test]
fn thresholds_do_not_depend_on_worker_count() {
    let reports = reports_from_counts(&[
        ("aspirin", "bleeding", 40),
        ("aspirin", "nausea", 12),
        ("imatinib", "rash", 25),
        ("imatinib", "nausea", 30),
        ("warfarin", "bleeding", 60),
        ("warfarin", "rash", 3),
        ("zolpidem", "amnesia", 9),
    ]);
    let table = CrossTable::from_reports(&reports).unwrap();
    let cfg = SamplerConfig::default();
    let one = montecarlo::sample_thresholds(&table, &cfg, &Executor::new(1).unwrap()).unwrap();
    let many = montecarlo::sample_thresholds(&table, &cfg, &Executor::new(4).unwrap()).unwrap();
    let again = montecarlo::sample_thresholds(&table, &cfg, &Executor::new(3).unwrap()).unwrap();
    assert_eq!(bits(&one), bits(&many));
    assert_eq!(bits(&one), bits(&again));

    let other = SamplerConfig {
        seed: 7,
        ..cfg
    };
    let reseeded =
        montecarlo::sample_thresholds(&table, &other, &Executor::new(1).unwrap()).unwrap();
    assert_ne!(bits(&one), bits(&reseeded));
}

#[test]
fn threshold_sits_below_null_mean() {
    let reports = reports_from_counts(&[
        ("a", "x", 200),
        ("a", "y", 100),
        ("a", "z", 50),
        ("b", "x", 20),
        ("b", "w", 30),
    ]);
    let table = CrossTable::from_reports(&reports).unwrap();
    let exec = Executor::new(2).unwrap();
    let thresholds =
        montecarlo::sample_thresholds(&table, &SamplerConfig::default(), &exec).unwrap();
    for t in &thresholds {
        assert!(t.sigma > 0.0);
        assert!(t.threshold < t.mu, "{t:?}");
    }
    // the draw spreads the drug's reports over every event
    let a = &thresholds[0];
    assert!((a.mu - 350.0 / 4.0).abs() < 1e-9);
}

#[test]
fn pipeline_tags_and_sorts_records() {
    let exec = Executor::new(2).unwrap();
    let records =
        signals::analyse(&reference_reports(), &SamplerConfig::default(), &exec, "MEDEFFECT")
            .unwrap();
    assert_eq!(records.len(), 6);
    let keys: Vec<_> = records
        .iter()
        .map(|r| (r.drug.as_str(), r.adverse_event.as_str()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    for r in &records {
        assert_eq!(r.verdict.is_significant(), r.log_lr >= r.threshold);
        assert_eq!(r.database, "MEDEFFECT");
    }
}

proptest! {
    #[test]
    fn margins_equal_interior_sums(
        cells in prop::collection::vec((0usize..6, 0usize..5, 1usize..20), 1..30)
    ) {
        let names_d = ["d0", "d1", "d2", "d3", "d4", "d5"];
        let names_e = ["e0", "e1", "e2", "e3", "e4"];
        let counts: Vec<(&str, &str, usize)> = cells
            .iter()
            .map(|&(d, e, n)| (names_d[d], names_e[e], n))
            .collect();
        let table = CrossTable::from_reports(&reports_from_counts(&counts)).unwrap();
        prop_assert!(table.check_margins().is_ok());

        let expected: usize = counts.iter().map(|c| c.2).sum();
        prop_assert_eq!(table.grand_total(), expected as u64);
        for d in 0..table.n_drugs() {
            let row: u64 = (0..table.n_events()).map(|e| table.count(d, e)).sum();
            prop_assert_eq!(row, table.drug_total(d));
        }
        for e in 0..table.n_events() {
            let col: u64 = (0..table.n_drugs()).map(|d| table.count(d, e)).sum();
            prop_assert_eq!(col, table.event_total(e));
        }
    }

    #[test]
    fn llr_increases_with_joint_count(n_a in 1u64..50, n_d in 1u64..50, extra in 0u64..500) {
        // N > n_a (1 + n_d) keeps every step in the disproportionate regime.
        let n = n_a * (n_d + 1) + 1 + extra;
        let top = n_a.min(n_d);
        let mut previous = f64::NEG_INFINITY;
        for x in 1..=top {
            let v = llr::log_likelihood_ratio(x, n_a, n_d, n).unwrap().value().unwrap();
            prop_assert!(v > previous, "x={} v={} prev={}", x, v, previous);
            previous = v;
        }
    }

    #[test]
    fn zero_joint_count_never_scores(n_a in 1u64..100, n_d in 1u64..100, extra in 1u64..100) {
        let n = n_a + n_d + extra;
        prop_assert_eq!(llr::log_likelihood_ratio(0, n_a, n_d, n).unwrap(), LlrOutcome::Undefined);
    }
}
