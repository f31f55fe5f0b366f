use configuration::{DataConfig, Layout};
use core_types::Observation;
use dataset::{DataLoadError, load_table, read_table};
use pretty_assertions::assert_eq;
use std::io::Write;

fn wide_config() -> DataConfig {
    DataConfig {
        layout: Layout::Wide,
        ..DataConfig::default()
    }
}

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn long_layout_from_file() {
    let file = write_csv(
        "company,period,metric,value\n\
         A,Q1,revenue,100\n\
         A,Q1,revenue,110\n\
         B,Q1,revenue,80\n",
    );

    let table = load_table(file.path(), &DataConfig::default()).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(
        table.observations()[2],
        Observation::new("B", "Q1", "revenue", 80.0)
    );
}

#[test]
fn wide_layout_is_melted_and_ignores_index_column() {
    let csv = "ticker,year,in_index6,ROE (%),Net Profit Margin (%)\n\
               ALV.DE,2015,1,10.5,6.1\n\
               TTE.PA,2016,0,,4.2\n";

    let table = read_table(csv.as_bytes(), &wide_config()).unwrap();

    assert_eq!(table.metrics(), vec!["ROE (%)", "Net Profit Margin (%)"]);
    assert_eq!(table.companies(), vec!["ALV.DE", "TTE.PA"]);
    assert_eq!(table.len(), 4);

    let missing = &table.observations()[2];
    assert_eq!(missing.company, "TTE.PA");
    assert_eq!(missing.metric, "ROE (%)");
    assert!(missing.value.is_nan());
    assert!(!missing.is_valid());
}

#[test]
fn whitespace_is_trimmed() {
    let csv = "company , period , metric , value\n A , Q1 , revenue , 12.5 \n";
    let table = read_table(csv.as_bytes(), &DataConfig::default()).unwrap();
    assert_eq!(
        table.observations()[0],
        Observation::new("A", "Q1", "revenue", 12.5)
    );
}

#[test]
fn custom_column_names() {
    let config = DataConfig {
        company_column: Some("firm".to_string()),
        period_column: Some("quarter".to_string()),
        metric_column: "kpi".to_string(),
        value_column: "amount".to_string(),
        ..DataConfig::default()
    };
    let csv = "firm,quarter,kpi,amount\nA,2020Q1,margin,0.2\n";
    let table = read_table(csv.as_bytes(), &config).unwrap();
    assert_eq!(table.periods(), vec!["2020Q1"]);
}

#[test]
fn missing_column_is_reported() {
    let csv = "company,period,value\nA,Q1,1\n";
    let err = read_table(csv.as_bytes(), &DataConfig::default()).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingColumn(ref c) if c == "metric"), "{err}");
}

#[test]
fn malformed_value_reports_line() {
    let csv = "company,period,metric,value\nA,Q1,revenue,100\nA,Q2,revenue,lots\n";
    let err = read_table(csv.as_bytes(), &DataConfig::default()).unwrap_err();
    match err {
        DataLoadError::MalformedValue { line, value, .. } => {
            assert_eq!(line, 3);
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_company_is_rejected() {
    let csv = "company,period,metric,value\n,Q1,revenue,100\n";
    let err = read_table(csv.as_bytes(), &DataConfig::default()).unwrap_err();
    assert!(matches!(err, DataLoadError::EmptyField { line: 2, .. }), "{err}");
}

#[test]
fn ragged_rows_are_csv_errors() {
    let csv = "company,period,metric,value\nA,Q1,revenue\n";
    let err = read_table(csv.as_bytes(), &DataConfig::default()).unwrap_err();
    assert!(matches!(err, DataLoadError::Csv(_)), "{err}");
}

#[test]
fn header_only_file_has_no_observations() {
    let csv = "company,period,metric,value\n";
    let err = read_table(csv.as_bytes(), &DataConfig::default()).unwrap_err();
    assert!(matches!(err, DataLoadError::NoObservations));
}

#[test]
fn wide_layout_without_metrics_is_rejected() {
    let csv = "ticker,year,in_index6\nA,2015,1\n";
    let err = read_table(csv.as_bytes(), &wide_config()).unwrap_err();
    assert!(matches!(err, DataLoadError::NoMetricColumns));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_table(
        std::path::Path::new("/nonexistent/data.csv"),
        &DataConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DataLoadError::Io { .. }));
}
