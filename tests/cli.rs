use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const REVENUE: &str = "company,period,metric,value\n\
                       A,Q1,revenue,100\n\
                       A,Q2,revenue,110\n\
                       A,Q3,revenue,90\n\
                       A,Q4,revenue,105\n\
                       B,Q1,revenue,80\n\
                       B,Q2,revenue,85\n\
                       B,Q3,revenue,95\n\
                       B,Q4,revenue,78\n";

const INDEX: &str = "ticker,year,in_index6,ROE (%)\n\
                     ALV.DE,2014,1,10\n\
                     ALV.DE,2015,1,11\n\
                     ALV.DE,2016,1,14\n\
                     ALV.DE,2017,1,15\n\
                     SAP.DE,2014,0,20\n\
                     SAP.DE,2015,0,21\n\
                     SAP.DE,2016,0,19\n\
                     SAP.DE,2017,0,22\n\
                     BAS.DE,2014,0,5\n\
                     BAS.DE,2015,0,6\n\
                     BAS.DE,2016,0,7\n\
                     BAS.DE,2017,0,NA\n";

/// Runs the binary inside `dir` so no stray perfstat.toml or .env is picked up.
fn perfstat(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_perfstat"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn workspace(name: &str, contents: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(name), contents).unwrap();
    dir
}

#[test]
fn compare_prints_json_result() {
    let dir = workspace("revenue.csv", REVENUE);
    let output = perfstat(
        dir.path(),
        &[
            "--data", "revenue.csv", "--format", "json", "compare", "--metric", "revenue",
            "--a", "company=A", "--b", "company=B", "--equal-variance",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["method"], "Student");
    assert_eq!(json["degrees_of_freedom"], 6.0);
    let t = json["t_statistic"].as_f64().unwrap();
    let p = json["p_value"].as_f64().unwrap();
    assert!((t - 2.931574476069612).abs() < 1e-6);
    assert!((p - 0.0262333159680154).abs() < 1e-6);
}

#[test]
fn missing_group_exits_with_failure() {
    let dir = workspace("revenue.csv", REVENUE);
    let output = perfstat(
        dir.path(),
        &["--data", "revenue.csv", "compare", "--metric", "revenue", "--a", "company=A", "--b", "company=C"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("company=C"));
}

#[test]
fn malformed_key_is_an_argument_error() {
    let dir = workspace("revenue.csv", REVENUE);
    let output = perfstat(
        dir.path(),
        &["--data", "revenue.csv", "compare", "--metric", "revenue", "--a", "sector=X", "--b", "company=B"],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn versus_others_writes_one_csv_per_metric() {
    let dir = workspace("index.csv", INDEX);
    let output = perfstat(
        dir.path(),
        &[
            "--data", "index.csv", "--layout", "wide", "--format", "csv", "--output-dir", "out",
            "versus-others", "--focus", "ALV.DE", "--correction", "holm",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let written = fs::read_to_string(dir.path().join("out").join("versus_others_ROE_(pct).csv")).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("company,group b,method"));
    assert!(lines[1].starts_with("ALV.DE,others (excl. ALV.DE),Welch,4,7"));
}

#[test]
fn pre_post_fits_each_company() {
    let dir = workspace("index.csv", INDEX);
    let output = perfstat(
        dir.path(),
        &["--data", "index.csv", "--layout", "wide", "--format", "json", "pre-post", "--split-year", "2016"],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["subject"], "ALV.DE");
    assert_eq!(entries[0]["outcome"]["status"], "computed");
    assert_eq!(entries[0]["outcome"]["slope"], 4.0);
    // BAS.DE has three usable years, enough for one residual degree of freedom.
    assert_eq!(entries[2]["outcome"]["n"], 3);
}

#[test]
fn metrics_lists_the_table() {
    let dir = workspace("index.csv", INDEX);
    let output = perfstat(dir.path(), &["--data", "index.csv", "--layout", "wide", "--format", "json", "metrics"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metrics"], serde_json::json!(["ROE (%)"]));
    assert_eq!(json["companies"], serde_json::json!(["ALV.DE", "SAP.DE", "BAS.DE"]));
}
