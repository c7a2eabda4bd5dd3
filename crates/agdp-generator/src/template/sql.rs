pub(super) fn render(prompt: &str) -> String {
    format!(
        r#"-- Generated SQL pipeline: {prompt}
-- DuckDB dialect

CREATE OR REPLACE TABLE source_data AS
SELECT * FROM read_csv_auto('data/input.csv');

CREATE OR REPLACE TABLE transformed_data AS
SELECT
    *,
    value * 2 AS value_doubled
FROM source_data
WHERE value > 0;

COPY transformed_data TO 'data/output.parquet' (FORMAT PARQUET);
"#
    )
}
