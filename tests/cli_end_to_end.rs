use std::{fs, path::Path};

use assert_cmd::Command;

fn write(path: &Path, body: &str) {
    fs::write(path, body).expect("write fixture");
}

fn tardis(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tardis").expect("binary exists");
    cmd.env("DATA_DIR", dir.join("data"))
        .env("OUTPUTS_DIR", dir.join("outputs"))
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn llr_writes_full_and_significant_tables() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("faers_pairwise.tsv");
    let mut body = String::from("FAERS_ID\tlookup_value\treac_pt_list\n");
    let mut id = 0;
    for (drug, event, n) in [
        ("IMATINIB", "Oedema", 40),
        ("IMATINIB", "Nausea", 5),
        ("WARFARIN", "Haemorrhage", 50),
        ("WARFARIN", "Nausea", 4),
        ("ZOLPIDEM", "Amnesia", 12),
        ("ZOLPIDEM", "Nausea", 6),
    ] {
        for _ in 0..n {
            id += 1;
            body.push_str(&format!("{id}\t{drug}\t{event}\n"));
        }
    }
    write(&reports, &body);

    tardis(dir.path())
        .args(["llr", "--database", "FAERS", "--samples", "500", "--seed", "11"])
        .arg("--input")
        .arg(&reports)
        .assert()
        .success();

    let full = fs::read_to_string(dir.path().join("outputs/llr_FAERS.tsv")).unwrap();
    let mut lines = full.lines();
    assert_eq!(
        lines.next().unwrap(),
        "drug\tadverse_event\tlogLR\tthreshold_5th_percentile\tsignificant\tsource_database"
    );
    // six observed pairs out of a 3 x 4 grid
    assert_eq!(lines.count(), 6);
    assert!(full.contains("imatinib\tOedema\t"));

    let significant = fs::read_to_string(dir.path().join("outputs/significant_FAERS.tsv")).unwrap();
    assert!(significant.starts_with("drug\tadverse_event\tlogLR\tthreshold_5th_percentile\tdatabase"));
    assert!(dir.path().join("outputs/llr_FAERS.parquet").exists());
}

#[test]
fn enrich_writes_association_tables() {
    let dir = tempfile::tempdir().unwrap();
    let adr = dir.path().join("sider.tsv");
    let targets = dir.path().join("dtc.tsv");
    let mut adr_body = String::from("drug\tse\n");
    let mut tg_body = String::from("drug\ttarget\n");
    for i in 0..20 {
        if i < 10 {
            adr_body.push_str(&format!("Drug{i}\tHepatitis\n"));
            tg_body.push_str(&format!("drug{i}\tP08684\n"));
        } else {
            adr_body.push_str(&format!("Drug{i}\tRash\n"));
            tg_body.push_str(&format!("drug{i}\tP00533\n"));
        }
    }
    write(&adr, &adr_body);
    write(&targets, &tg_body);

    tardis(dir.path())
        .args(["enrich", "--label", "controlled", "--fdr", "benjamini-hochberg"])
        .arg("--adr")
        .arg(format!("{}:SIDER", adr.display()))
        .arg("--target")
        .arg(format!("{}:DTC", targets.display()))
        .assert()
        .success();

    let out = dir.path().join("outputs");
    let accepted = fs::read_to_string(out.join("accepted_controlled.tsv")).unwrap();
    let mut lines = accepted.lines();
    assert_eq!(lines.next().unwrap(), "adverse_event\ttarget\tp_value\tq_value");
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.starts_with("Hepatitis\tP08684\t")));

    let trace = fs::read_to_string(out.join("traceability_controlled.tsv")).unwrap();
    assert_eq!(trace.lines().count(), 1 + 20);
    assert!(trace.contains("drug0\tHepatitis\tP08684\t"));
    assert!(trace.lines().skip(1).all(|l| l.ends_with("\tSIDER\tDTC")));

    assert!(out.join("pvalues_controlled.tsv").exists());
    assert!(out.join("qvalues_controlled.tsv").exists());
}
