//! Column role resolution.
//!
//! Every aggregation needs to know which column plays which role: the sector
//! (categorical grouping) column, the month column and the value column.
//! Roles can be supplied explicitly through a [`RoleMap`] validated against
//! the table, or resolved heuristically: first name containing "sector",
//! first name containing "month" (both case-insensitive), first numeric
//! column in declaration order. Absence is a valid state — every lookup
//! returns an `Option` and callers branch on it before computing.

use polars::prelude::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Sector,
    Month,
    Value,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Sector => write!(f, "sector"),
            ColumnRole::Month => write!(f, "month"),
            ColumnRole::Value => write!(f, "value"),
        }
    }
}

/// Typed failure from validating an explicit role mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The mapped column does not exist in the table.
    NotInTable { role: ColumnRole, column: String },
    /// The value role maps to a column that is not numeric.
    NotNumeric { column: String },
}

impl fmt::Display for RoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleError::NotInTable { role, column } => {
                write!(f, "{} role maps to missing column '{}'", role, column)
            }
            RoleError::NotNumeric { column } => {
                write!(f, "value role maps to non-numeric column '{}'", column)
            }
        }
    }
}

/// Explicit role → column mapping, overriding the heuristic scan where set.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    sector: Option<String>,
    month: Option<String>,
    value: Option<String>,
}

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: ColumnRole, column: impl Into<String>) -> Self {
        let column = Some(column.into());
        match role {
            ColumnRole::Sector => self.sector = column,
            ColumnRole::Month => self.month = column,
            ColumnRole::Value => self.value = column,
        }
        self
    }

    /// Check every explicit mapping against the table. Intended to run at
    /// table-construction time so a bad mapping surfaces once, up front,
    /// rather than as a missing-column diagnostic on every query.
    pub fn validate(&self, df: &DataFrame) -> Result<(), RoleError> {
        for (role, column) in [
            (ColumnRole::Sector, &self.sector),
            (ColumnRole::Month, &self.month),
            (ColumnRole::Value, &self.value),
        ] {
            let Some(column) = column else { continue };
            match df.column(column) {
                Err(_) => {
                    return Err(RoleError::NotInTable {
                        role,
                        column: column.clone(),
                    })
                }
                Ok(series) => {
                    if role == ColumnRole::Value && !series.dtype().is_numeric() {
                        return Err(RoleError::NotNumeric {
                            column: column.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve a role against a table: explicit mapping first, heuristic
    /// scan otherwise.
    pub fn resolve(&self, df: &DataFrame, role: ColumnRole) -> Option<String> {
        let explicit = match role {
            ColumnRole::Sector => &self.sector,
            ColumnRole::Month => &self.month,
            ColumnRole::Value => &self.value,
        };
        if let Some(column) = explicit {
            return df.column(column).ok().map(|s| s.name().to_string());
        }
        match role {
            ColumnRole::Sector => sector_column(df),
            ColumnRole::Month => month_column(df),
            ColumnRole::Value => value_column(df),
        }
    }
}

/// First column whose name contains "sector", case-insensitive.
pub fn sector_column(df: &DataFrame) -> Option<String> {
    name_containing(df, "sector")
}

/// First column whose name contains "month", case-insensitive.
pub fn month_column(df: &DataFrame) -> Option<String> {
    name_containing(df, "month")
}

/// First numeric-typed column in declaration order.
pub fn value_column(df: &DataFrame) -> Option<String> {
    df.get_columns()
        .iter()
        .find(|s| s.dtype().is_numeric())
        .map(|s| s.name().to_string())
}

fn name_containing(df: &DataFrame, needle: &str) -> Option<String> {
    df.get_column_names()
        .iter()
        .find(|name| name.to_lowercase().contains(needle))
        .map(|name| name.to_string())
}
