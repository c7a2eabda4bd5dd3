use super::Dataframe;

pub(super) fn render(prompt: &str, dataframe: Dataframe) -> String {
    let (import, read, filter, write) = match dataframe {
        Dataframe::Polars => (
            "import polars as pl",
            "pl.read_csv(\"data/input.csv\")",
            "df.filter(pl.col(\"value\") > 0)",
            "df.write_parquet(\"data/output.parquet\")",
        ),
        Dataframe::Pandas => (
            "import pandas as pd",
            "pd.read_csv(\"data/input.csv\")",
            "df[df[\"value\"] > 0]",
            "df.to_parquet(\"data/output.parquet\", index=False)",
        ),
    };

    format!(
        r#"# Prefect flow: {prompt}
from prefect import flow, task
{import}


@task(name="Extract Data", retries=2)
def extract():
    return {read}


@task(name="Transform Data")
def transform(df):
    return {filter}


@task(name="Load Data")
def load(df):
    {write}
    return "Success"


@flow(name="ETL Pipeline")
def etl_pipeline():
    return load(transform(extract()))


if __name__ == "__main__":
    etl_pipeline()
"#
    )
}
