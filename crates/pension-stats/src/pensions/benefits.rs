//! Server-side paging for the benefit drill-down table.
//!
//! Requests follow the DataTables server-side protocol: `draw`, `start`,
//! `length`, `search[value]` and `order[i][column]`/`order[i][dir]`, plus the
//! required `fund` and `data_year` filters.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::domain::Benefit;
use super::store::BenefitPage;

/// Largest page a single request may pull.
pub const MAX_DISPLAY_LENGTH: i64 = 500;
pub const DEFAULT_DISPLAY_LENGTH: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenefitColumn {
    FirstName,
    LastName,
    Amount,
    YearsOfService,
    FinalSalary,
    StartDate,
    Status,
}

impl BenefitColumn {
    /// Display order of the table columns; `order[i][column]` indexes into it.
    pub const fn ordered() -> [Self; 7] {
        [
            Self::FirstName,
            Self::LastName,
            Self::Amount,
            Self::YearsOfService,
            Self::FinalSalary,
            Self::StartDate,
            Self::Status,
        ]
    }

    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Amount => "amount",
            Self::YearsOfService => "years_of_service",
            Self::FinalSalary => "final_salary",
            Self::StartDate => "start_date",
            Self::Status => "status",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ordered().get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnOrder {
    pub column: BenefitColumn,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenefitTableQuery {
    pub fund: String,
    pub data_year: i32,
    pub search: Option<String>,
    pub start: i64,
    pub length: i64,
    pub draw: i64,
    pub ordering: Vec<ColumnOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableRequestError {
    #[error("missing required query parameter '{0}'")]
    Missing(&'static str),
    #[error("query parameter '{name}' must be an integer, got '{value}'")]
    NotAnInteger { name: &'static str, value: String },
}

impl BenefitTableQuery {
    pub fn new(fund: impl Into<String>, data_year: i32) -> Self {
        Self {
            fund: fund.into(),
            data_year,
            search: None,
            start: 0,
            length: DEFAULT_DISPLAY_LENGTH,
            draw: 0,
            ordering: Vec::new(),
        }
    }

    /// Parses raw query-string pairs. Repeated keys keep the last value.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, TableRequestError> {
        let lookup = |name: &str| {
            pairs
                .iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let fund = lookup("fund").ok_or(TableRequestError::Missing("fund"))?;
        let data_year = lookup("data_year").ok_or(TableRequestError::Missing("data_year"))?;
        let data_year = parse_integer::<i32>("data_year", data_year)?;

        let search = lookup("search[value]")
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let start = lookup("start")
            .map(|raw| parse_integer::<i64>("start", raw))
            .transpose()?
            .unwrap_or(0)
            .max(0);

        let length = lookup("length")
            .map(|raw| parse_integer::<i64>("length", raw))
            .transpose()?
            .unwrap_or(DEFAULT_DISPLAY_LENGTH);
        let length = if length <= 0 || length > MAX_DISPLAY_LENGTH {
            MAX_DISPLAY_LENGTH
        } else {
            length
        };

        // Echoed back to the client, so only ever an integer.
        let draw = lookup("draw")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);

        Ok(Self {
            fund: fund.to_string(),
            data_year,
            search,
            start,
            length,
            draw,
            ordering: parse_ordering(pairs),
        })
    }

    /// Lowercased LIKE pattern for the name prefix search, with wildcards
    /// escaped. Matched against `casefold` of each name column.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|search| {
            let search = search.to_lowercase();
            let mut pattern = String::with_capacity(search.len() + 1);
            for ch in search.chars() {
                if matches!(ch, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }

    pub fn order_clause(&self) -> String {
        let mut terms: Vec<String> = self
            .ordering
            .iter()
            .map(|order| {
                format!(
                    "benefit.{} {}",
                    order.column.sql_name(),
                    order.direction.sql()
                )
            })
            .collect();
        terms.push("benefit.id ASC".to_string());
        terms.join(", ")
    }
}

fn parse_integer<T: FromStr>(name: &'static str, raw: &str) -> Result<T, TableRequestError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| TableRequestError::NotAnInteger {
            name,
            value: raw.to_string(),
        })
}

fn parse_ordering(pairs: &[(String, String)]) -> Vec<ColumnOrder> {
    let mut slots: BTreeMap<usize, (Option<usize>, SortDirection)> = BTreeMap::new();

    for (key, value) in pairs {
        let Some(rest) = key.strip_prefix("order[") else {
            continue;
        };
        let Some((index, field)) = rest.split_once("][") else {
            continue;
        };
        let Ok(index) = index.parse::<usize>() else {
            continue;
        };
        let slot = slots.entry(index).or_insert((None, SortDirection::Asc));
        match field {
            "column]" => slot.0 = value.trim().parse::<usize>().ok(),
            "dir]" => {
                slot.1 = if value.trim().eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                }
            }
            _ => {}
        }
    }

    slots
        .into_values()
        .filter_map(|(column, direction)| {
            column
                .and_then(BenefitColumn::from_index)
                .map(|column| ColumnOrder { column, direction })
        })
        .collect()
}

/// One table row, serialized as a positional array in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitRow(
    pub String,
    pub String,
    pub f64,
    pub Option<i32>,
    pub Option<f64>,
    pub Option<NaiveDate>,
    pub String,
);

impl From<Benefit> for BenefitRow {
    fn from(benefit: Benefit) -> Self {
        Self(
            benefit.first_name,
            benefit.last_name,
            benefit.amount,
            benefit.years_of_service,
            benefit.final_salary,
            benefit.start_date,
            benefit.status,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitTableResponse {
    pub draw: i64,
    pub records_total: i64,
    pub records_filtered: i64,
    pub data: Vec<BenefitRow>,
    pub result: &'static str,
}

impl BenefitTableResponse {
    pub fn from_page(query: &BenefitTableQuery, page: BenefitPage) -> Self {
        Self {
            draw: query.draw,
            records_total: page.total,
            records_filtered: page.filtered,
            data: page
                .rows
                .into_iter()
                .take(MAX_DISPLAY_LENGTH as usize)
                .map(BenefitRow::from)
                .collect(),
            result: "ok",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn requires_fund_and_data_year() {
        let err = BenefitTableQuery::from_pairs(&pairs(&[("data_year", "2015")]))
            .expect_err("fund missing");
        assert_eq!(err, TableRequestError::Missing("fund"));

        let err = BenefitTableQuery::from_pairs(&pairs(&[("fund", "Example Fund")]))
            .expect_err("year missing");
        assert_eq!(err, TableRequestError::Missing("data_year"));

        let err = BenefitTableQuery::from_pairs(&pairs(&[
            ("fund", "Example Fund"),
            ("data_year", "last year"),
        ]))
        .expect_err("year malformed");
        assert!(matches!(
            err,
            TableRequestError::NotAnInteger {
                name: "data_year",
                ..
            }
        ));

        let err = BenefitTableQuery::from_pairs(&pairs(&[
            ("fund", "Example Fund"),
            ("data_year", "4294969311"),
        ]))
        .expect_err("year out of range");
        assert_eq!(
            err,
            TableRequestError::NotAnInteger {
                name: "data_year",
                value: "4294969311".to_string(),
            }
        );
    }

    #[test]
    fn search_value_is_kept_verbatim() {
        let query = BenefitTableQuery::from_pairs(&pairs(&[
            ("fund", "Example Fund"),
            ("data_year", "2015"),
            ("search[value]", "Smith "),
        ]))
        .expect("query parses");

        assert_eq!(query.search.as_deref(), Some("Smith "));
        assert_eq!(query.search_pattern().as_deref(), Some("smith %"));
    }

    #[test]
    fn caps_length_at_maximum_display_length() {
        for requested in ["-1", "0", "501", "100000"] {
            let query = BenefitTableQuery::from_pairs(&pairs(&[
                ("fund", "Example Fund"),
                ("data_year", "2015"),
                ("length", requested),
            ]))
            .expect("query parses");
            assert_eq!(query.length, MAX_DISPLAY_LENGTH, "length {requested}");
        }

        let query = BenefitTableQuery::from_pairs(&pairs(&[
            ("fund", "Example Fund"),
            ("data_year", "2015"),
        ]))
        .expect("query parses");
        assert_eq!(query.length, DEFAULT_DISPLAY_LENGTH);
        assert_eq!(query.start, 0);
        assert!(query.search.is_none());
    }

    #[test]
    fn parses_ordering_and_ignores_unknown_columns() {
        let query = BenefitTableQuery::from_pairs(&pairs(&[
            ("fund", "Example Fund"),
            ("data_year", "2015"),
            ("order[1][column]", "2"),
            ("order[1][dir]", "desc"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "asc"),
            ("order[2][column]", "42"),
            ("draw", "7"),
            ("search[value]", ""),
        ]))
        .expect("query parses");

        assert_eq!(
            query.ordering,
            vec![
                ColumnOrder {
                    column: BenefitColumn::LastName,
                    direction: SortDirection::Asc,
                },
                ColumnOrder {
                    column: BenefitColumn::Amount,
                    direction: SortDirection::Desc,
                },
            ]
        );
        assert_eq!(
            query.order_clause(),
            "benefit.last_name ASC, benefit.amount DESC, benefit.id ASC"
        );
        assert_eq!(query.draw, 7);
        assert!(query.search.is_none());
    }

    #[test]
    fn search_pattern_escapes_like_wildcards() {
        let mut query = BenefitTableQuery::new("Example Fund", 2015);
        query.search = Some("O_b%".to_string());
        assert_eq!(query.search_pattern().as_deref(), Some(r"o\_b\%%"));

        query.search = Some("ÓS".to_string());
        assert_eq!(query.search_pattern().as_deref(), Some("ós%"));
    }

    #[test]
    fn rows_serialize_as_positional_arrays() {
        let row = BenefitRow(
            "Ada".to_string(),
            "Smith".to_string(),
            1250.5,
            Some(12),
            None,
            NaiveDate::from_ymd_opt(2001, 7, 1),
            "Active".to_string(),
        );
        let value = serde_json::to_value(&row).expect("row serializes");
        assert_eq!(
            value,
            serde_json::json!(["Ada", "Smith", 1250.5, 12, null, "2001-07-01", "Active"])
        );
    }
}
