pub(super) fn render(prompt: &str) -> String {
    format!(
        r#"# Soda data quality checks
# Generated for: {prompt}

checks for transformed_data:
  - row_count > 0
  - missing_count(value) = 0
  - invalid_count(value) = 0:
      valid min: 0
  - duplicate_count(id) = 0
  - schema:
      fail:
        when required column missing: [id, value, value_doubled]
"#
    )
}
