use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tablebuilder_core::models::GeographicLevel;
use tablebuilder_core::time_period::{PeriodFamily, TimePeriod};
use uuid::Uuid;

/// Table Builder - Statistics table queries over a dataset file
#[derive(Parser, Debug)]
#[command(name = "tablebuilder")]
#[command(about = "Statistics table builder", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ceiling on estimated table cells before a query is cropped
    #[arg(long, global = true, value_name = "CELLS")]
    pub max_table_cells: Option<u64>,

    /// Number of time periods kept when a query is cropped
    #[arg(long, global = true, value_name = "ROWS")]
    pub cropped_max_rows: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a table query against a dataset
    Query(QueryArgs),

    /// Build location options from a dataset's locations
    Locations(LocationsArgs),

    /// List time-period identifiers in canonical order
    Periods(PeriodsArgs),

    /// Show effective configuration values and their sources
    Config,
}

/// Location nesting and geometry options shared by commands that render locations
#[derive(Args, Debug)]
pub struct HierarchyArgs {
    /// Nesting for a level, e.g. `localAuthority=country,region` (repeatable)
    #[arg(long = "hierarchy", value_name = "LEVEL=ANCESTORS", value_parser = parse_hierarchy)]
    pub hierarchies: Vec<(GeographicLevel, Vec<GeographicLevel>)>,

    /// Boundary level whose geometry decorates matching leaves
    #[arg(long, value_name = "ID")]
    pub boundary_level: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Dataset file (JSON)
    pub dataset: PathBuf,

    /// Subject to query
    #[arg(long)]
    pub subject: Uuid,

    /// Indicator to include (repeatable)
    #[arg(long = "indicator", value_name = "ID")]
    pub indicators: Vec<Uuid>,

    /// Location id to include (repeatable)
    #[arg(long = "location", value_name = "ID", conflicts_with = "location_codes")]
    pub locations: Vec<Uuid>,

    /// Location code to include, e.g. `region:E12000007` (repeatable)
    #[arg(long = "location-code", value_name = "LEVEL:CODE", value_parser = parse_location_code)]
    pub location_codes: Vec<(GeographicLevel, String)>,

    /// First time period, e.g. `2010_AY`
    #[arg(long, requires = "to")]
    pub from: Option<TimePeriod>,

    /// Last time period, e.g. `2015_AY`
    #[arg(long, requires = "from")]
    pub to: Option<TimePeriod>,

    /// Filter item to include (repeatable)
    #[arg(long = "filter-item", value_name = "ID")]
    pub filter_items: Vec<Uuid>,

    #[command(flatten)]
    pub hierarchy: HierarchyArgs,
}

#[derive(Parser, Debug)]
pub struct LocationsArgs {
    /// Dataset file (JSON)
    pub dataset: PathBuf,

    /// Only include locations at this level (repeatable)
    #[arg(long = "level", value_name = "LEVEL")]
    pub levels: Vec<GeographicLevel>,

    #[command(flatten)]
    pub hierarchy: HierarchyArgs,
}

#[derive(Parser, Debug)]
pub struct PeriodsArgs {
    /// Period family, e.g. `months` or `academic-quarters` (all families when omitted)
    pub family: Option<PeriodFamily>,

    /// First period of a range to enumerate, e.g. `2019_W50`
    #[arg(long, requires = "to")]
    pub from: Option<TimePeriod>,

    /// Last period of a range to enumerate
    #[arg(long, requires = "from")]
    pub to: Option<TimePeriod>,
}

fn parse_level(value: &str) -> Result<GeographicLevel, String> {
    value.trim().parse().map_err(|e| format!("{}", e))
}

/// Parse `level=ancestor,ancestor`
fn parse_hierarchy(value: &str) -> Result<(GeographicLevel, Vec<GeographicLevel>), String> {
    let (level, ancestors) = value
        .split_once('=')
        .ok_or_else(|| format!("expected LEVEL=ANCESTORS, got '{}'", value))?;

    let ancestors = ancestors
        .split(',')
        .filter(|ancestor| !ancestor.trim().is_empty())
        .map(parse_level)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((parse_level(level)?, ancestors))
}

/// Parse `level:code`
fn parse_location_code(value: &str) -> Result<(GeographicLevel, String), String> {
    let (level, code) = value
        .split_once(':')
        .ok_or_else(|| format!("expected LEVEL:CODE, got '{}'", value))?;

    if code.trim().is_empty() {
        return Err(format!("missing location code in '{}'", value));
    }

    Ok((parse_level(level)?, code.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hierarchy() {
        let (level, ancestors) = parse_hierarchy("localAuthority=country, region").unwrap();
        assert_eq!(level, GeographicLevel::LocalAuthority);
        assert_eq!(ancestors, vec![GeographicLevel::Country, GeographicLevel::Region]);

        assert_eq!(parse_hierarchy("region=").unwrap().1, Vec::new());
        assert!(parse_hierarchy("localAuthority").is_err());
        assert!(parse_hierarchy("localAuthority=county").is_err());
    }

    #[test]
    fn test_parse_location_code() {
        assert_eq!(
            parse_location_code("region:E12000007").unwrap(),
            (GeographicLevel::Region, "E12000007".to_string())
        );
        assert!(parse_location_code("region:").is_err());
        assert!(parse_location_code("E12000007").is_err());
    }

    #[test]
    fn test_query_args() {
        let cli = Cli::try_parse_from([
            "tablebuilder",
            "query",
            "data.json",
            "--subject",
            "0b5a3c1e-4d2f-4a8b-9c6d-7e8f9a0b1c2d",
            "--from",
            "2010_AY",
            "--to",
            "2012_AY",
            "--hierarchy",
            "localAuthority=region",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.from.unwrap().year, 2010);
        assert_eq!(args.hierarchy.hierarchies.len(), 1);
    }

    #[test]
    fn test_period_range_requires_both_ends() {
        assert!(Cli::try_parse_from(["tablebuilder", "periods", "--from", "2010_AY"]).is_err());
    }
}
