//! Terminal output
//!
//! Human mode prints styled text, rounded tables and indented location trees
//! to stdout. JSON mode prints one envelope per result to stdout. In both
//! modes warnings go to stderr.

use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};
use tablebuilder_core::models::{
    LocationChildren, LocationGroupViewModel, LocationLeafViewModel, LocationViewModel,
};

/// JSON output wrapper
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope<'a, T: Serialize> {
    Success { data: &'a T },
    Warning { message: String },
}

pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn info(&self, message: impl Display) {
        if !self.json {
            println!("{} {}", style("ℹ").blue().bold(), message);
        }
    }

    pub fn warning(&self, message: impl Display) {
        if self.json {
            let envelope: Envelope<'_, ()> = Envelope::Warning { message: message.to_string() };
            if let Ok(line) = serde_json::to_string(&envelope) {
                eprintln!("{}", line);
            }
        } else {
            eprintln!("{} {}", style("⚠").yellow().bold(), message);
        }
    }

    pub fn result<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(&Envelope::Success { data })?);
        Ok(())
    }

    pub fn table<T: Tabled>(&self, rows: impl IntoIterator<Item = T>) {
        let rows: Vec<T> = rows.into_iter().collect();
        if rows.is_empty() {
            println!("{}", style("(no rows)").dim());
            return;
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        println!("{}: {}", style(key).bold(), value);
    }

    pub fn section(&self, title: impl Display) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Location options as an indented tree; `◆` marks leaves with geometry
    pub fn location_tree(&self, options: &[LocationViewModel]) {
        for option in options {
            match option {
                LocationViewModel::Leaf(leaf) => print_leaf(0, leaf),
                LocationViewModel::Group(group) => print_group(0, group),
            }
        }
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn print_group(depth: usize, group: &LocationGroupViewModel) {
    println!(
        "{}{} {} {}",
        indent(depth),
        style(&group.label).bold(),
        style(format!("({})", group.value)).dim(),
        style(format!("[{}]", group.level)).cyan()
    );

    match &group.options {
        LocationChildren::Groups(groups) => {
            groups.iter().for_each(|child| print_group(depth + 1, child))
        }
        LocationChildren::Leaves(leaves) => {
            leaves.iter().for_each(|leaf| print_leaf(depth + 1, leaf))
        }
    }
}

fn print_leaf(depth: usize, leaf: &LocationLeafViewModel) {
    let marker = if leaf.geo_json.is_some() { style(" ◆").green().to_string() } else { String::new() };
    println!("{}{} {}{}", indent(depth), leaf.label, style(format!("({})", leaf.value)).dim(), marker);
}
