//! Chart side channel.
//!
//! The router emits a chart spec alongside some text responses; actual
//! rendering belongs to the UI shell. The spec carries the sector-wise
//! pipeline distribution from the deal table, descending by value. Building
//! it silently yields `None` when the sector or value column is
//! undetectable. An ASCII renderer is provided for the CLI front end.

use crate::columns::{ColumnRole, RoleMap};
use crate::insights::grouped_totals;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<ChartBar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
}

/// Sector-wise pipeline distribution bar chart over the deal table.
pub fn sector_chart(deals: &DataFrame, roles: &RoleMap) -> Option<ChartSpec> {
    let sector_col = roles.resolve(deals, ColumnRole::Sector)?;
    let value_col = roles.resolve(deals, ColumnRole::Value)?;

    let bars = grouped_totals(deals, &sector_col, &value_col)
        .into_iter()
        .map(|(label, value)| ChartBar { label, value })
        .collect();

    Some(ChartSpec {
        title: "Sector-wise Pipeline Distribution".to_string(),
        y_label: "Pipeline Value".to_string(),
        bars,
    })
}

/// Render a chart spec as a fixed-width ASCII bar chart for terminal use.
pub fn render_ascii(spec: &ChartSpec) -> String {
    const WIDTH: usize = 40;

    let max = spec
        .bars
        .iter()
        .map(|b| b.value)
        .fold(0.0_f64, f64::max);
    let label_width = spec
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!("{} ({})\n", spec.title, spec.y_label);
    for bar in &spec.bars {
        let filled = if max > 0.0 {
            ((bar.value / max) * WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<label_width$}  {} {}\n",
            bar.label,
            "█".repeat(filled),
            bar.value,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn chart_orders_sectors_by_value_desc() {
        let deals = df!(
            "Item Name" => ["a", "b", "c"],
            "Sector" => ["Infra", "Energy", "Infra"],
            "Amount" => [200.0, 700.0, 100.0]
        )
        .unwrap();

        let spec = sector_chart(&deals, &RoleMap::new()).unwrap();
        assert_eq!(spec.title, "Sector-wise Pipeline Distribution");
        assert_eq!(spec.bars.len(), 2);
        assert_eq!(spec.bars[0].label, "Energy");
        assert_eq!(spec.bars[0].value, 700.0);
        assert_eq!(spec.bars[1].label, "Infra");
        assert_eq!(spec.bars[1].value, 300.0);
    }

    #[test]
    fn chart_is_none_without_sector_or_value_column() {
        let no_sector = df!("Item Name" => ["a"], "Amount" => [1.0]).unwrap();
        assert!(sector_chart(&no_sector, &RoleMap::new()).is_none());

        let no_value = df!("Item Name" => ["a"], "Sector" => ["Energy"]).unwrap();
        assert!(sector_chart(&no_value, &RoleMap::new()).is_none());
    }

    #[test]
    fn ascii_render_handles_zero_max() {
        let spec = ChartSpec {
            title: "t".into(),
            y_label: "y".into(),
            bars: vec![ChartBar {
                label: "A".into(),
                value: 0.0,
            }],
        };
        let out = render_ascii(&spec);
        assert!(out.contains("A"));
    }
}
