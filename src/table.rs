//! Table construction and cleaning.
//!
//! Raw board items are flattened into a rectangular `DataFrame`: one row per
//! item, one column per distinct column title in first-seen order, with
//! "Item Name" always present as the first column. Cleaning then trims
//! column names, strips currency/percent/thousands noise from text cells and
//! applies best-effort per-column numeric and date coercion. Cleaning is
//! pure and total: a column that refuses to coerce simply stays text.

use crate::board_client::BoardItem;
use crate::error::Result;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;

/// Name of the leading column carrying each item's display name.
pub const ITEM_NAME_COLUMN: &str = "Item Name";

/// Substrings removed from every text cell during cleaning. Plain substring
/// removal, not locale-aware.
const STRIP_PATTERNS: [&str; 3] = [",", "₹", "%"];

lazy_static! {
    static ref NUMERIC_SHAPE: Regex =
        Regex::new(r"^-?\d+(\.\d+)?([Ee][+-]?\d+)?$").unwrap();
}

/// Per-column inferred type after cleaning. Inference is per column, not per
/// cell: a column containing any non-numeric text stays [`InferredType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Text,
    Numeric,
    Date,
}

/// Flatten raw board items into a table.
///
/// The column set is the union of all titles encountered, in first-seen
/// order across items. Rows missing a title get a null cell. A duplicate
/// title within one item is not validated: last write wins.
pub fn build_table(items: &[BoardItem]) -> Result<DataFrame> {
    let mut column_order: Vec<String> = vec![ITEM_NAME_COLUMN.to_string()];
    let mut rows: Vec<HashMap<String, String>> = Vec::with_capacity(items.len());

    for item in items {
        let mut row = HashMap::new();
        row.insert(ITEM_NAME_COLUMN.to_string(), item.name.clone());

        for cv in &item.column_values {
            let title = cv.column.title.clone();
            if !column_order.contains(&title) {
                column_order.push(title.clone());
            }
            row.insert(title, cv.text.clone().unwrap_or_default());
        }

        rows.push(row);
    }

    let mut series = Vec::with_capacity(column_order.len());
    for name in &column_order {
        let cells: Vec<Option<String>> = rows.iter().map(|r| r.get(name).cloned()).collect();
        series.push(Series::new(name, cells));
    }

    Ok(DataFrame::new(series)?)
}

/// Clean a table in place of the raw text-only form. Order-sensitive:
/// column names are trimmed first, then text cells are stripped of noise,
/// then numeric coercion runs, then date coercion for date/month-named
/// columns. Idempotent.
pub fn clean_table(mut df: DataFrame) -> Result<DataFrame> {
    df = trim_column_names(df)?;
    df = strip_text_noise(df)?;
    df = coerce_numeric_columns(df)?;
    df = coerce_date_columns(df)?;
    Ok(df)
}

/// Report the inferred type tag of every column, in declaration order.
pub fn column_types(df: &DataFrame) -> Vec<(String, InferredType)> {
    df.get_columns()
        .iter()
        .map(|s| {
            let tag = match s.dtype() {
                dt if dt.is_numeric() => InferredType::Numeric,
                DataType::Date | DataType::Datetime(_, _) => InferredType::Date,
                _ => InferredType::Text,
            };
            (s.name().to_string(), tag)
        })
        .collect()
}

fn trim_column_names(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for name in names {
        let trimmed = name.trim();
        if trimmed != name {
            df.rename(&name, trimmed)?;
        }
    }
    Ok(df)
}

fn strip_text_noise(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for name in &names {
        let column = df.column(name)?;
        if !matches!(column.dtype(), DataType::String) {
            continue;
        }

        let ca = column.str()?;
        let stripped: Vec<Option<String>> = ca
            .into_iter()
            .map(|cell| {
                cell.map(|text| {
                    let mut out = text.to_string();
                    for pat in STRIP_PATTERNS {
                        out = out.replace(pat, "");
                    }
                    out
                })
            })
            .collect();

        df.with_column(Series::new(name, stripped))?;
    }
    Ok(df)
}

/// Retype a string column to Float64 when every non-empty cell parses as a
/// number. Failures are tolerated silently: the column just stays text.
fn coerce_numeric_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for name in &names {
        let column = df.column(name)?;
        if !matches!(column.dtype(), DataType::String) {
            continue;
        }

        let ca = column.str()?;
        let mut parsed: Vec<Option<f64>> = Vec::with_capacity(ca.len());
        let mut seen_value = false;
        let mut all_numeric = true;

        for cell in ca.into_iter() {
            match cell.map(str::trim) {
                None | Some("") => parsed.push(None),
                Some(text) => {
                    seen_value = true;
                    if NUMERIC_SHAPE.is_match(text) {
                        match text.parse::<f64>() {
                            Ok(v) => parsed.push(Some(v)),
                            Err(_) => {
                                all_numeric = false;
                                break;
                            }
                        }
                    } else {
                        all_numeric = false;
                        break;
                    }
                }
            }
        }

        if seen_value && all_numeric {
            df.with_column(Series::new(name, parsed))?;
        }
    }
    Ok(df)
}

/// Retype date-like columns (name contains "date" or "month") to Date.
/// Column-uniform like numeric coercion: the column is retyped only when at
/// least one non-empty cell parses, with unparseable cells going null. A
/// month column holding month names has no parseable cell and stays text,
/// which keeps it matchable by the quarter filter.
fn coerce_date_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for name in &names {
        let lower = name.to_lowercase();
        if !lower.contains("date") && !lower.contains("month") {
            continue;
        }

        let column = df.column(name)?;
        if !matches!(column.dtype(), DataType::String) {
            continue;
        }

        let ca = column.str()?;
        let parsed: Vec<Option<NaiveDate>> = ca
            .into_iter()
            .map(|cell| cell.and_then(parse_date))
            .collect();

        if parsed.iter().any(Option::is_some) {
            df.with_column(Series::new(name, parsed))?;
        }
    }
    Ok(df)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_client::{ColumnMeta, ColumnValue};

    fn item(name: &str, cols: &[(&str, &str)]) -> BoardItem {
        BoardItem {
            name: name.to_string(),
            column_values: cols
                .iter()
                .map(|(title, text)| ColumnValue {
                    column: ColumnMeta {
                        title: title.to_string(),
                    },
                    text: Some(text.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn builds_one_row_per_item_with_union_of_columns() {
        let items = vec![
            item("A", &[("Sector", "Energy"), ("Amount", "700")]),
            item("B", &[("Amount", "300"), ("Stage", "Open")]),
        ];
        let df = build_table(&items).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec!["Item Name", "Sector", "Amount", "Stage"]
        );

        // Row order matches item order; missing cells are null.
        let names = df.column("Item Name").unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("A"));
        assert_eq!(names.get(1), Some("B"));
        let stages = df.column("Stage").unwrap().str().unwrap();
        assert_eq!(stages.get(0), None);
        assert_eq!(stages.get(1), Some("Open"));
    }

    #[test]
    fn duplicate_title_within_an_item_last_write_wins() {
        let items = vec![item("A", &[("Amount", "1"), ("Amount", "2")])];
        let df = build_table(&items).unwrap();
        let amounts = df.column("Amount").unwrap().str().unwrap();
        assert_eq!(amounts.get(0), Some("2"));
    }

    #[test]
    fn empty_item_set_still_carries_item_name_column() {
        let df = build_table(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.get_column_names(), vec![ITEM_NAME_COLUMN]);
    }

    #[test]
    fn cleaning_strips_noise_and_coerces_numeric() {
        let items = vec![
            item("A", &[(" Amount ", "₹1,000"), ("Margin", "12%")]),
            item("B", &[(" Amount ", "2,500"), ("Margin", "8%")]),
        ];
        let df = clean_table(build_table(&items).unwrap()).unwrap();

        assert_eq!(df.get_column_names(), vec!["Item Name", "Amount", "Margin"]);
        let amounts = df.column("Amount").unwrap().f64().unwrap();
        assert_eq!(amounts.get(0), Some(1000.0));
        assert_eq!(amounts.get(1), Some(2500.0));
        let margins = df.column("Margin").unwrap().f64().unwrap();
        assert_eq!(margins.get(0), Some(12.0));
    }

    #[test]
    fn mixed_text_column_stays_text() {
        let items = vec![
            item("A", &[("Code", "100")]),
            item("B", &[("Code", "X-2")]),
        ];
        let df = clean_table(build_table(&items).unwrap()).unwrap();
        assert!(matches!(
            df.column("Code").unwrap().dtype(),
            DataType::String
        ));
    }

    #[test]
    fn date_column_gets_date_type_with_null_for_unparseable() {
        let items = vec![
            item("A", &[("Start Date", "2024-01-15")]),
            item("B", &[("Start Date", "soon")]),
        ];
        let df = clean_table(build_table(&items).unwrap()).unwrap();
        let col = df.column("Start Date").unwrap();
        assert!(matches!(col.dtype(), DataType::Date));
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn month_name_column_stays_text() {
        let items = vec![
            item("A", &[("Month", "January")]),
            item("B", &[("Month", "Feb")]),
        ];
        let df = clean_table(build_table(&items).unwrap()).unwrap();
        assert!(matches!(
            df.column("Month").unwrap().dtype(),
            DataType::String
        ));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let items = vec![
            item("A", &[(" Amount ", "₹1,000"), ("Month", "January")]),
            item("B", &[(" Amount ", "2,500"), ("Month", "march")]),
        ];
        let once = clean_table(build_table(&items).unwrap()).unwrap();
        let twice = clean_table(once.clone()).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn type_tags_reflect_inference() {
        let items = vec![item(
            "A",
            &[("Amount", "700"), ("Sector", "Energy"), ("Due Date", "2024-02-01")],
        )];
        let df = clean_table(build_table(&items).unwrap()).unwrap();
        let tags = column_types(&df);
        assert_eq!(
            tags,
            vec![
                ("Item Name".to_string(), InferredType::Text),
                ("Amount".to_string(), InferredType::Numeric),
                ("Sector".to_string(), InferredType::Text),
                ("Due Date".to_string(), InferredType::Date),
            ]
        );
    }
}
