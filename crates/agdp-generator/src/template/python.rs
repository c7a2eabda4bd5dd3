use super::Dataframe;

pub(super) fn render(prompt: &str, dataframe: Dataframe) -> String {
    match dataframe {
        Dataframe::Polars => format!(
            r#"# Generated pipeline: {prompt}
import polars as pl


def extract() -> pl.DataFrame:
    """Extract data from the source."""
    return pl.read_csv("data/input.csv")


def transform(df: pl.DataFrame) -> pl.DataFrame:
    """Transform data for: {prompt}"""
    df = df.filter(pl.col("value") > 0)
    return df.with_columns((pl.col("value") * 2).alias("value_doubled"))


def load(df: pl.DataFrame) -> None:
    """Load data into the destination."""
    df.write_parquet("data/output.parquet")
    print(f"Processed {{df.height}} rows")


if __name__ == "__main__":
    load(transform(extract()))
    print("Pipeline completed successfully!")
"#
        ),
        Dataframe::Pandas => format!(
            r#"# Generated pipeline: {prompt}
import pandas as pd


def extract() -> pd.DataFrame:
    """Extract data from the source."""
    return pd.read_csv("data/input.csv")


def transform(df: pd.DataFrame) -> pd.DataFrame:
    """Transform data for: {prompt}"""
    df = df[df["value"] > 0].copy()
    df["value_doubled"] = df["value"] * 2
    return df


def load(df: pd.DataFrame) -> None:
    """Load data into the destination."""
    df.to_parquet("data/output.parquet", index=False)
    print(f"Processed {{len(df)}} rows")


if __name__ == "__main__":
    load(transform(extract()))
    print("Pipeline completed successfully!")
"#
        ),
    }
}
