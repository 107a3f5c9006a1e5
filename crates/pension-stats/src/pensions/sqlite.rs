use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, Row};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::benefits::{BenefitTableQuery, MAX_DISPLAY_LENGTH};
use super::domain::{AnnualReport, Benefit, FundType, PensionFund};
use super::store::{
    BenefitPage, BenefitSummaryRow, BinSpec, FundTypeFunding, HistogramRow, PensionStore,
    StoreError,
};

/// DDL matching the tables the import jobs populate. Used for local
/// databases, the demo command, and tests.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pensions_pensionfund (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    fund_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pensions_annualreport (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fund_id INTEGER NOT NULL REFERENCES pensions_pensionfund (id),
    data_year INTEGER NOT NULL,
    assets REAL NOT NULL,
    total_liability REAL NOT NULL,
    employer_normal_cost REAL NOT NULL,
    amortization_cost REAL NOT NULL,
    employer_contribution REAL NOT NULL,
    UNIQUE (fund_id, data_year)
);

CREATE TABLE IF NOT EXISTS pensions_benefit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fund_id INTEGER NOT NULL REFERENCES pensions_pensionfund (id),
    data_year INTEGER NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    amount REAL NOT NULL,
    years_of_service INTEGER,
    final_salary REAL,
    start_date TEXT,
    status TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS pensions_benefit_fund_year
    ON pensions_benefit (fund_id, data_year);
"#;

const BENEFIT_FILTER: &str = r"
FROM pensions_benefit AS benefit
JOIN pensions_pensionfund AS fund ON benefit.fund_id = fund.id
WHERE fund.name = ?1
  AND benefit.data_year = ?2
  AND (?3 IS NULL
       OR casefold(benefit.first_name) LIKE ?3 ESCAPE '\'
       OR casefold(benefit.last_name) LIKE ?3 ESCAPE '\')";

/// Median via the two middle rows of each (fund, year) partition, which
/// matches a continuous 50th percentile.
const BENEFIT_SUMMARY: &str = r"
WITH ranked AS (
    SELECT
      benefit.data_year AS data_year,
      fund.name AS fund_name,
      benefit.amount AS amount,
      ROW_NUMBER() OVER (
        PARTITION BY benefit.fund_id, benefit.data_year ORDER BY benefit.amount
      ) AS position,
      COUNT(*) OVER (PARTITION BY benefit.fund_id, benefit.data_year) AS total
    FROM pensions_benefit AS benefit
    JOIN pensions_pensionfund AS fund ON benefit.fund_id = fund.id
)
SELECT data_year, fund_name, AVG(amount) AS median, MAX(total) AS count
FROM ranked
WHERE position IN ((total + 1) / 2, (total + 2) / 2)
GROUP BY data_year, fund_name
ORDER BY data_year, fund_name";

/// Same bucketing as `width_bucket(amount, 0, max, bins)`, except negative
/// amounts land in the first bucket instead of bucket zero.
const BENEFIT_HISTOGRAM: &str = r"
SELECT data_year, fund_name, bucket_index, MAX(amount) AS max_value, COUNT(*)
FROM (
    SELECT
      benefit.data_year AS data_year,
      fund.name AS fund_name,
      benefit.amount AS amount,
      CASE
        WHEN benefit.amount < 0 THEN 1
        WHEN benefit.amount >= ?1 THEN ?2 + 1
        ELSE CAST(benefit.amount * ?2 / ?1 AS INTEGER) + 1
      END AS bucket_index
    FROM pensions_benefit AS benefit
    JOIN pensions_pensionfund AS fund ON benefit.fund_id = fund.id
)
GROUP BY data_year, fund_name, bucket_index
ORDER BY data_year, fund_name, bucket_index";

const FUNDING_BY_FUND_TYPE: &str = r"
SELECT
  report.data_year,
  fund.fund_type,
  SUM(report.assets) AS funded_liability,
  SUM(report.total_liability - report.assets) AS unfunded_liability
FROM pensions_pensionfund AS fund
JOIN pensions_annualreport AS report ON fund.id = report.fund_id
GROUP BY report.data_year, fund.fund_type
ORDER BY report.data_year, fund.fund_type";

/// SQLite-backed store holding a single connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens `sqlite://<path>`, `sqlite:<path>`, a bare path, or `:memory:`.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let target = url.trim();
        let conn = if target == ":memory:" || target == "sqlite::memory:" {
            Connection::open_in_memory()?
        } else if let Some(path) = target
            .strip_prefix("sqlite://")
            .or_else(|| target.strip_prefix("sqlite:"))
        {
            Connection::open(path)?
        } else if target.is_empty() || target.contains("://") {
            return Err(StoreError::UnsupportedUrl(target.to_string()));
        } else {
            Connection::open(target)?
        };
        register_casefold(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    pub fn bootstrap_schema(&self) -> Result<(), StoreError> {
        self.connection()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert_fund(&self, name: &str, fund_type: FundType) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO pensions_pensionfund (name, fund_type) VALUES (?1, ?2)",
            params![name, fund_type.code()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_annual_report(&self, report: &AnnualReport) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO pensions_annualreport (
                fund_id, data_year, assets, total_liability,
                employer_normal_cost, amortization_cost, employer_contribution
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.fund_id,
                report.data_year,
                report.assets,
                report.total_liability,
                report.employer_normal_cost,
                report.amortization_cost,
                report.employer_contribution,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Inserts benefits in one transaction. Ids on the input are ignored.
    pub fn insert_benefits(&self, benefits: &[Benefit]) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pensions_benefit (
                    fund_id, data_year, first_name, last_name, amount,
                    years_of_service, final_salary, start_date, status
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for benefit in benefits {
                stmt.execute(params![
                    benefit.fund_id,
                    benefit.data_year,
                    benefit.first_name,
                    benefit.last_name,
                    benefit.amount,
                    benefit.years_of_service,
                    benefit.final_salary,
                    benefit.start_date,
                    benefit.status,
                ])?;
            }
        }
        tx.commit()?;
        Ok(benefits.len())
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// `casefold(text)`: Unicode lowercase, since SQLite's LIKE folds ASCII only.
fn register_casefold(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(())
}

fn benefit_from_row(row: &Row<'_>) -> rusqlite::Result<Benefit> {
    Ok(Benefit {
        id: row.get(0)?,
        fund_id: row.get(1)?,
        data_year: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        amount: row.get(5)?,
        years_of_service: row.get(6)?,
        final_salary: row.get(7)?,
        start_date: row.get(8)?,
        status: row.get(9)?,
    })
}

impl PensionStore for SqliteStore {
    fn funds(&self) -> Result<Vec<PensionFund>, StoreError> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT id, name, fund_type FROM pensions_pensionfund ORDER BY name, id")?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, name, fund_type)| {
                let fund_type = FundType::from_code(&fund_type)
                    .ok_or_else(|| StoreError::UnknownFundType(fund_type.clone()))?;
                Ok(PensionFund {
                    id,
                    name,
                    fund_type,
                })
            })
            .collect()
    }

    fn annual_reports(&self) -> Result<Vec<AnnualReport>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT fund_id, data_year, assets, total_liability,
                    employer_normal_cost, amortization_cost, employer_contribution
             FROM pensions_annualreport
             ORDER BY fund_id, data_year",
        )?;
        let reports = stmt
            .query_map([], |row| {
                Ok(AnnualReport {
                    fund_id: row.get(0)?,
                    data_year: row.get(1)?,
                    assets: row.get(2)?,
                    total_liability: row.get(3)?,
                    employer_normal_cost: row.get(4)?,
                    amortization_cost: row.get(5)?,
                    employer_contribution: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    fn funding_by_fund_type(&self) -> Result<Vec<FundTypeFunding>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(FUNDING_BY_FUND_TYPE)?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(data_year, fund_type, funded, unfunded)| {
                let fund_type = FundType::from_code(&fund_type)
                    .ok_or_else(|| StoreError::UnknownFundType(fund_type.clone()))?;
                Ok(FundTypeFunding {
                    data_year,
                    fund_type,
                    funded_liability: funded,
                    unfunded_liability: unfunded,
                })
            })
            .collect()
    }

    fn benefit_summaries(&self) -> Result<Vec<BenefitSummaryRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(BENEFIT_SUMMARY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BenefitSummaryRow {
                    data_year: row.get(0)?,
                    fund_name: row.get(1)?,
                    median: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn benefit_histogram(&self, spec: BinSpec) -> Result<Vec<HistogramRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(BENEFIT_HISTOGRAM)?;
        let rows = stmt
            .query_map(params![spec.max, spec.bins], |row| {
                Ok(HistogramRow {
                    data_year: row.get(0)?,
                    fund_name: row.get(1)?,
                    bucket_index: row.get(2)?,
                    max_value: row.get(3)?,
                    count: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn benefit_page(&self, query: &BenefitTableQuery) -> Result<BenefitPage, StoreError> {
        let conn = self.connection()?;
        let pattern = query.search_pattern();
        let length = query.length.clamp(1, MAX_DISPLAY_LENGTH);

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM pensions_benefit", [], |row| row.get(0))?;

        let filtered: i64 = conn.query_row(
            &format!("SELECT COUNT(*) {BENEFIT_FILTER}"),
            params![query.fund, query.data_year, pattern],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT benefit.id, benefit.fund_id, benefit.data_year, benefit.first_name,
                    benefit.last_name, benefit.amount, benefit.years_of_service,
                    benefit.final_salary, benefit.start_date, benefit.status
             {BENEFIT_FILTER}
             ORDER BY {}
             LIMIT ?4 OFFSET ?5",
            query.order_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![query.fund, query.data_year, pattern, length, query.start],
                benefit_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            fund = %query.fund,
            data_year = query.data_year,
            filtered,
            returned = rows.len(),
            "benefit page loaded"
        );

        Ok(BenefitPage {
            total,
            filtered,
            rows,
        })
    }
}
