//! Config command implementation

use crate::output::OutputWriter;
use anyhow::Result;
use serde::Serialize;
use tablebuilder_core::config::{
    ConfigSource, LayeredConfig, CROPPED_TABLE_MAX_ROWS_VAR, MAX_TABLE_CELLS_ALLOWED_VAR,
};
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: &'static str,
}

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let rows: Vec<SettingRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| SettingRow { key, value, source: source_name(source) })
        .collect();

    if output.is_json() {
        return output.result(&rows);
    }

    output.section("Settings");
    output.table(rows);

    if let Err(e) = config.table_builder_options() {
        output.warning(e);
    }

    output.section("Sources");
    output.info(format!(
        "--max-table-cells / --cropped-max-rows, then {} / {}, then tablebuilder.toml, then defaults",
        MAX_TABLE_CELLS_ALLOWED_VAR, CROPPED_TABLE_MAX_ROWS_VAR
    ));

    Ok(())
}

fn source_name(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "environment",
        ConfigSource::Cli => "command line",
    }
}
