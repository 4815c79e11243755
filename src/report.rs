use crate::balance::balance_from_rows;
use crate::output::{output_balance, output_summary, read_volumes, Thresholds};
use anyhow::Context;
use std::path::Path;

pub fn exec(volumes_csv: &Path, thresholds: Thresholds, json: bool) -> anyhow::Result<()> {
    let rows = read_volumes(volumes_csv)
        .with_context(|| format!("Failed to read {}", volumes_csv.display()))?;
    let balance = balance_from_rows(&rows);

    if json {
        println!("{}", serde_json::to_string_pretty(&balance)?);
    } else {
        output_summary(&rows, &balance, &thresholds)?;
        output_balance(&balance)?;
    }
    Ok(())
}
