//! Insight functions.
//!
//! A fixed library of aggregation + formatting functions over the two
//! cleaned tables. Column roles come from the caller's [`RoleMap`], which
//! resolves explicit mappings first and falls back to the heuristic scan.
//! Every function is total over the "column not found" states: a missing
//! sector/month/value column yields a fixed diagnostic sentence, never an
//! error, and zero-total percentage math yields 0%. Monetary figures render
//! divided by 1e9, rounded to 2 decimals, with the `₹` glyph and an
//! unconditional "Billion" label.

use crate::columns::{ColumnRole, RoleMap};
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// Share-of-total threshold above which one sector counts as a
/// concentration risk. Strictly greater-than: exactly 50% is not flagged.
pub const CONCENTRATION_THRESHOLD_PCT: f64 = 50.0;

/// One of the four fixed 3-month groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// The fixed lower-cased month-name set for this quarter: three full
    /// names plus their 3-letter abbreviations ("may" is its own
    /// abbreviation, so Q2 holds five entries). The four sets form an
    /// exhaustive, disjoint partition of the twelve calendar months.
    pub fn month_names(self) -> &'static [&'static str] {
        match self {
            Quarter::Q1 => &["january", "jan", "february", "feb", "march", "mar"],
            Quarter::Q2 => &["april", "apr", "may", "june", "jun"],
            Quarter::Q3 => &["july", "jul", "august", "aug", "september", "sep"],
            Quarter::Q4 => &["october", "oct", "november", "nov", "december", "dec"],
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Row count + total value of the deal table.
pub fn pipeline_summary(deals: &DataFrame, roles: &RoleMap) -> String {
    let Some(value_col) = roles.resolve(deals, ColumnRole::Value) else {
        return "No numeric deal value column detected.".to_string();
    };

    let total_value = column_total(deals, &value_col);
    let deal_count = deals.height();

    format!(
        "**Pipeline Health Overview**\n\n\
         The current pipeline consists of **{} active deals**\n\
         with a total potential value of **{}**.\n\n\
         The deal base appears diversified across sectors.",
        deal_count,
        fmt_money(total_value)
    )
}

/// Top sector by summed value and its share of the total.
pub fn sector_dominance(deals: &DataFrame, roles: &RoleMap) -> String {
    let (Some(sector_col), Some(value_col)) = (
        roles.resolve(deals, ColumnRole::Sector),
        roles.resolve(deals, ColumnRole::Value),
    ) else {
        return "Sector or value column not detected.".to_string();
    };

    let Some((top_sector, percentage)) = top_group_share(deals, &sector_col, &value_col) else {
        return "Sector or value column not detected.".to_string();
    };

    format!(
        "**Sector Exposure Analysis**\n\n\
         Leading sector: **{}**\n\
         Contribution: **{}%** of total pipeline value.\n\n\
         Exposure remains within acceptable diversification limits.",
        top_sector,
        fmt_round2(percentage)
    )
}

/// Same top-group share as [`sector_dominance`], classified against the
/// fixed 50% policy threshold.
pub fn concentration_risk(deals: &DataFrame, roles: &RoleMap) -> String {
    let (Some(sector_col), Some(value_col)) = (
        roles.resolve(deals, ColumnRole::Sector),
        roles.resolve(deals, ColumnRole::Value),
    ) else {
        return "Sector or value column not detected.".to_string();
    };

    let Some((top_sector, percentage)) = top_group_share(deals, &sector_col, &value_col) else {
        return "Sector or value column not detected.".to_string();
    };

    if percentage > CONCENTRATION_THRESHOLD_PCT {
        format!(
            "**High Concentration Risk**\n\n\
             {} contributes **{}%**,\n\
             indicating elevated sector dependency.",
            top_sector,
            fmt_round2(percentage)
        )
    } else {
        format!(
            "**No Significant Concentration Risk**\n\n\
             Top sector ({}) contributes **{}%**,\n\
             which is within healthy diversification thresholds.",
            top_sector,
            fmt_round2(percentage)
        )
    }
}

/// Total value of the work table, no grouping.
pub fn revenue_summary(work: &DataFrame, roles: &RoleMap) -> String {
    let Some(value_col) = roles.resolve(work, ColumnRole::Value) else {
        return "No financial column detected.".to_string();
    };

    let total = column_total(work, &value_col);

    format!(
        "💰 **Revenue & Financial Snapshot**\n\n\
         Aggregate financial volume across work orders:\n\
         **{}**",
        fmt_money(total)
    )
}

/// Full per-sector totals, one line per sector, descending by value.
pub fn sector_revenue_breakdown(work: &DataFrame, roles: &RoleMap) -> String {
    let (Some(sector_col), Some(value_col)) = (
        roles.resolve(work, ColumnRole::Sector),
        roles.resolve(work, ColumnRole::Value),
    ) else {
        return "Sector or revenue column not detected.".to_string();
    };

    let summary = grouped_totals(work, &sector_col, &value_col);
    let mut response = String::from("📊 **Sector-wise Revenue Breakdown**\n\n");
    for (sector, value) in summary {
        response.push_str(&format!("- {}: {}\n", sector, fmt_money(value)));
    }
    response
}

/// Per-month totals, descending by value.
pub fn month_wise_revenue(work: &DataFrame, roles: &RoleMap) -> String {
    let (Some(month_col), Some(value_col)) = (
        roles.resolve(work, ColumnRole::Month),
        roles.resolve(work, ColumnRole::Value),
    ) else {
        return "Month or revenue column not detected.".to_string();
    };

    let summary = grouped_totals(work, &month_col, &value_col);
    let mut response = String::from("📅 **Month-wise Revenue Breakdown**\n\n");
    for (month, value) in summary {
        response.push_str(&format!("- {}: {}\n", month, fmt_money(value)));
    }
    response
}

/// Total value over the rows whose normalized month cell belongs to the
/// quarter's fixed month-name set. The zero-match case reports an explicit
/// "no records" message distinct from the non-zero case.
pub fn quarter_revenue(work: &DataFrame, quarter: Quarter, roles: &RoleMap) -> String {
    let (Some(month_col), Some(value_col)) = (
        roles.resolve(work, ColumnRole::Month),
        roles.resolve(work, ColumnRole::Value),
    ) else {
        return "Month or revenue column not detected.".to_string();
    };

    let names = quarter.month_names();
    let total = text_value_pairs(work, &month_col, &value_col)
        .into_iter()
        .filter(|(month, _)| names.contains(&month.trim().to_lowercase().as_str()))
        .map(|(_, value)| value)
        .sum::<f64>();

    if total == 0.0 {
        format!(
            "**{} Revenue Summary**\n\n\
             No matching revenue records found for {}.",
            quarter, quarter
        )
    } else {
        format!(
            "**{} Revenue Summary**\n\n\
             Total revenue for {}:\n\
             {}",
            quarter,
            quarter,
            fmt_money(total)
        )
    }
}

/// Composite executive update: pipeline summary + concentration risk over
/// deals, revenue summary over work, and a fixed closing sentence.
pub fn leadership_update(
    work: &DataFrame,
    deals: &DataFrame,
    work_roles: &RoleMap,
    deal_roles: &RoleMap,
) -> String {
    format!(
        "**Executive Leadership Update**\n\n\
         {}\n\n\
         {}\n\n\
         {}\n\n\
         Overall outlook remains stable with diversified exposure.",
        pipeline_summary(deals, deal_roles),
        concentration_risk(deals, deal_roles),
        revenue_summary(work, work_roles)
    )
}

/// Trivial row-count restatement.
pub fn deal_count(deals: &DataFrame) -> String {
    format!(
        "📊 We are currently tracking **{} active deals**.",
        deals.height()
    )
}

/// Trivial total-value restatement.
pub fn pipeline_value(deals: &DataFrame, roles: &RoleMap) -> String {
    let Some(value_col) = roles.resolve(deals, ColumnRole::Value) else {
        return "No numeric deal value column detected.".to_string();
    };
    format!(
        "💰 Total pipeline value is **{}**.",
        fmt_money(column_total(deals, &value_col))
    )
}

/// Group rows by a categorical column and sum the value column per group,
/// descending by summed value. Null group keys and null values are skipped.
pub fn grouped_totals(df: &DataFrame, group_col: &str, value_col: &str) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for (group, value) in text_value_pairs(df, group_col, value_col) {
        *totals.entry(group).or_insert(0.0) += value;
    }
    totals
        .into_iter()
        .sorted_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
        .collect()
}

/// Top group by summed value and its share of the column total. Zero total
/// yields a 0% share rather than failing. None only when there are no
/// non-null groups at all.
fn top_group_share(df: &DataFrame, group_col: &str, value_col: &str) -> Option<(String, f64)> {
    let summary = grouped_totals(df, group_col, value_col);
    let (top_group, top_value) = summary.into_iter().next()?;
    let total = column_total(df, value_col);
    let percentage = if total != 0.0 {
        top_value / total * 100.0
    } else {
        0.0
    };
    Some((top_group, percentage))
}

/// Sum of a numeric column; empty or all-null sums to zero.
pub fn column_total(df: &DataFrame, value_col: &str) -> f64 {
    df.column(value_col)
        .ok()
        .and_then(|s| s.cast(&DataType::Float64).ok())
        .and_then(|s| s.f64().ok().and_then(|ca| ca.sum()))
        .unwrap_or(0.0)
}

/// Pair up the string form of a categorical column with the numeric value
/// column, skipping rows where either side is null.
fn text_value_pairs(df: &DataFrame, text_col: &str, value_col: &str) -> Vec<(String, f64)> {
    let Ok(groups) = df
        .column(text_col)
        .and_then(|s| s.cast(&DataType::String))
    else {
        return Vec::new();
    };
    let Ok(values) = df
        .column(value_col)
        .and_then(|s| s.cast(&DataType::Float64))
    else {
        return Vec::new();
    };
    let (Ok(groups), Ok(values)) = (groups.str(), values.f64()) else {
        return Vec::new();
    };

    (0..df.height())
        .filter_map(|i| match (groups.get(i), values.get(i)) {
            (Some(g), Some(v)) => Some((g.to_string(), v)),
            _ => None,
        })
        .collect()
}

/// Fixed currency scale: divide by 1e9, round to 2 decimals, `₹` prefix and
/// a "Billion" unit label regardless of actual magnitude (500 renders as
/// "₹0.0 Billion" — preserved cosmetic caveat).
pub fn fmt_money(value: f64) -> String {
    format!("₹{} Billion", fmt_round2(value / 1e9))
}

/// Round to 2 decimals and render with trailing zeros trimmed, but always
/// at least one decimal digit: 0.0, 2.5, 12.35.
fn fmt_round2(value: f64) -> String {
    let mut s = format!("{:.2}", value);
    if s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deals() -> DataFrame {
        df!(
            "Item Name" => ["d1", "d2", "d3"],
            "Sector" => ["A", "B", "A"],
            "Amount" => [400.0, 300.0, 300.0]
        )
        .unwrap()
    }

    fn auto() -> RoleMap {
        RoleMap::new()
    }

    #[test]
    fn quarter_partition_is_exhaustive_and_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for quarter in Quarter::ALL {
            for name in quarter.month_names() {
                assert!(seen.insert(*name), "{} appears in two quarters", name);
            }
        }
        // 12 full names + 11 abbreviations: "may" abbreviates to itself,
        // so Q2's set collapses to five entries.
        assert_eq!(seen.len(), 23);
        assert_eq!(Quarter::Q2.month_names().len(), 5);
        for full in [
            "january", "february", "march", "april", "may", "june", "july",
            "august", "september", "october", "november", "december",
        ] {
            assert!(seen.contains(full), "{} missing from partition", full);
        }
    }

    #[test]
    fn dominance_reports_top_sector_share() {
        let text = sector_dominance(&deals(), &auto());
        assert!(text.contains("**A**"));
        assert!(text.contains("**70.0%**"));
    }

    #[test]
    fn concentration_flags_only_strictly_above_threshold() {
        // A holds 70% of 1000: high concentration.
        assert!(concentration_risk(&deals(), &auto()).contains("High Concentration"));

        // Exactly 50% is not flagged.
        let even = df!(
            "Item Name" => ["d1", "d2"],
            "Sector" => ["A", "B"],
            "Amount" => [500.0, 500.0]
        )
        .unwrap();
        assert!(concentration_risk(&even, &auto()).contains("No Significant Concentration"));
    }

    #[test]
    fn zero_total_share_is_zero_percent() {
        let zeroed = df!(
            "Item Name" => ["d1", "d2"],
            "Sector" => ["A", "B"],
            "Amount" => [0.0, 0.0]
        )
        .unwrap();
        let text = sector_dominance(&zeroed, &auto());
        assert!(text.contains("**0.0%**"));
    }

    #[test]
    fn missing_sector_column_gives_fixed_diagnostic() {
        let df = df!("Item Name" => ["d1"], "Amount" => [1.0]).unwrap();
        assert_eq!(
            sector_dominance(&df, &auto()),
            "Sector or value column not detected."
        );
        assert_eq!(
            concentration_risk(&df, &auto()),
            "Sector or value column not detected."
        );
    }

    #[test]
    fn missing_value_column_gives_fixed_diagnostics() {
        let df = df!("Item Name" => ["d1"], "Sector" => ["A"]).unwrap();
        assert_eq!(
            pipeline_summary(&df, &auto()),
            "No numeric deal value column detected."
        );
        assert_eq!(revenue_summary(&df, &auto()), "No financial column detected.");
        assert_eq!(
            pipeline_value(&df, &auto()),
            "No numeric deal value column detected."
        );
    }

    #[test]
    fn empty_deal_table_reports_zero_without_raising() {
        let empty = df!(
            "Item Name" => Vec::<String>::new(),
            "Sector" => Vec::<String>::new(),
            "Amount" => Vec::<f64>::new(),
        )
        .unwrap();
        let text = pipeline_summary(&empty, &auto());
        assert!(text.contains("**0 active deals**"));
        assert!(text.contains("₹0.0 Billion"));
    }

    #[test]
    fn quarter_revenue_sums_matching_months_case_insensitively() {
        let work = df!(
            "Item Name" => ["w1", "w2", "w3"],
            "Month" => ["January", "Feb", "march"],
            "Order Value" => [100.0, 100.0, 100.0]
        )
        .unwrap();
        let text = quarter_revenue(&work, Quarter::Q1, &auto());
        assert!(text.contains("Total revenue for Q1"));
        assert!(text.contains("₹0.0 Billion"));
        assert!(!text.contains("No matching revenue records"));
    }

    #[test]
    fn quarter_revenue_zero_match_message_is_distinct() {
        let work = df!(
            "Item Name" => ["w1"],
            "Month" => ["January"],
            "Order Value" => [100.0]
        )
        .unwrap();
        let text = quarter_revenue(&work, Quarter::Q3, &auto());
        assert!(text.contains("No matching revenue records found for Q3."));
    }

    #[test]
    fn breakdowns_sort_descending_by_value() {
        let work = df!(
            "Item Name" => ["w1", "w2", "w3"],
            "Sector" => ["Infra", "Energy", "Infra"],
            "Revenue" => [200.0, 900.0, 100.0]
        )
        .unwrap();
        let text = sector_revenue_breakdown(&work, &auto());
        let energy = text.find("- Energy").unwrap();
        let infra = text.find("- Infra").unwrap();
        assert!(energy < infra);
    }

    #[test]
    fn leadership_update_composes_three_sections() {
        let work = df!(
            "Item Name" => ["w1"],
            "Revenue" => [2_000_000_000.0]
        )
        .unwrap();
        let text = leadership_update(&work, &deals(), &auto(), &auto());
        assert!(text.contains("Executive Leadership Update"));
        assert!(text.contains("Pipeline Health Overview"));
        assert!(text.contains("High Concentration"));
        assert!(text.contains("Revenue & Financial Snapshot"));
        assert!(text.contains("Overall outlook remains stable"));
    }

    #[test]
    fn money_formatting_preserves_billion_label_and_rounding() {
        assert_eq!(fmt_money(0.0), "₹0.0 Billion");
        assert_eq!(fmt_money(500.0), "₹0.0 Billion");
        assert_eq!(fmt_money(2_500_000_000.0), "₹2.5 Billion");
        assert_eq!(fmt_money(12_345_000_000.0), "₹12.35 Billion");
    }

    #[test]
    fn deal_count_and_pipeline_value_restate_basics() {
        assert_eq!(
            deal_count(&deals()),
            "📊 We are currently tracking **3 active deals**."
        );
        assert_eq!(
            pipeline_value(&deals(), &auto()),
            "💰 Total pipeline value is **₹0.0 Billion**."
        );
    }

    #[test]
    fn explicit_value_role_overrides_first_numeric_column() {
        // The heuristic scan would pick "Score" (first numeric column); an
        // explicit value mapping steers the aggregation to "Amount".
        let deals = df!(
            "Item Name" => ["d1", "d2"],
            "Score" => [1.0, 1.0],
            "Sector" => ["A", "B"],
            "Amount" => [2_000_000_000.0, 1_000_000_000.0]
        )
        .unwrap();

        assert!(pipeline_value(&deals, &RoleMap::new()).contains("₹0.0 Billion"));

        let roles = RoleMap::new().with_role(ColumnRole::Value, "Amount");
        assert!(pipeline_value(&deals, &roles).contains("₹3.0 Billion"));
        assert!(sector_dominance(&deals, &roles).contains("**A**"));
    }
}
