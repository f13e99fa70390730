use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgConnection, PgRow, PgValueFormat};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo, ValueRef};

use crate::errors::{Result, WarehouseError};

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

/// Bound parameter for a tracked query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl SqlParam {
    fn bind<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(value) => query.bind(*value),
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Float(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::Date(value) => query.bind(*value),
        }
    }
}

/// Seam between the warehouse collaborators and a database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run every statement inside one transaction.
    async fn execute_batch(&self, statements: &[String]) -> Result<()>;

    /// Run a query and return its rows.
    async fn fetch_rows(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>>;
}

/// Executor backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        {
            let conn: &mut PgConnection = &mut tx;
            for statement in statements {
                sqlx::query(statement.as_str()).execute(&mut *conn).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_rows(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = param.bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn row_to_json(row: &PgRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.name(), column.type_info().name())?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn decode_column(row: &PgRow, idx: usize, name: &str, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::from)
        }
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|d| Value::from(d.format("%Y-%m-%d").to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|ts| Value::from(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|ts| Value::from(ts.to_rfc3339())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
        "NUMERIC" => decode_numeric(row, idx)?,
        other => {
            return Err(WarehouseError::UnsupportedColumn {
                column: name.to_string(),
                type_name: other.to_string(),
            });
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn decode_numeric(row: &PgRow, idx: usize) -> Result<Option<Value>> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(None);
    }
    let text = match raw.format() {
        PgValueFormat::Text => raw.as_str().ok().map(str::to_string),
        PgValueFormat::Binary => raw.as_bytes().ok().and_then(numeric_to_string),
    };
    Ok(text.map(|text| match text.parse::<f64>() {
        Ok(number) if number.is_finite() => Value::from(number),
        _ => Value::from(text),
    }))
}

/// Render a binary NUMERIC (base-10000 digit groups) as a decimal string.
fn numeric_to_string(bytes: &[u8]) -> Option<String> {
    const NEGATIVE: u16 = 0x4000;
    const NAN: u16 = 0xC000;

    let word = |at: usize| -> Option<[u8; 2]> { Some([*bytes.get(at)?, *bytes.get(at + 1)?]) };
    let ndigits = usize::try_from(i16::from_be_bytes(word(0)?)).ok()?;
    let weight = i32::from(i16::from_be_bytes(word(2)?));
    let sign = u16::from_be_bytes(word(4)?);
    let dscale = usize::from(u16::from_be_bytes(word(6)?));
    if sign == NAN {
        return Some("NaN".to_string());
    }
    let digits = (0..ndigits)
        .map(|i| word(8 + 2 * i).map(i16::from_be_bytes))
        .collect::<Option<Vec<_>>>()?;
    let group = |index: i32| -> i16 {
        usize::try_from(index)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NEGATIVE {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&group(0).to_string());
        for index in 1..=weight {
            out.push_str(&format!("{:04}", group(index)));
        }
    }
    if dscale > 0 {
        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group(index)));
            index += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::numeric_to_string;

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(digits.len() as i16).to_be_bytes());
        bytes.extend_from_slice(&weight.to_be_bytes());
        bytes.extend_from_slice(&sign.to_be_bytes());
        bytes.extend_from_slice(&dscale.to_be_bytes());
        for digit in digits {
            bytes.extend_from_slice(&digit.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn numeric_decodes_integer_and_fraction_groups() {
        assert_eq!(numeric_to_string(&numeric(0, 0, 1, &[12, 5000])).unwrap(), "12.5");
        assert_eq!(numeric_to_string(&numeric(1, 0, 0, &[1])).unwrap(), "10000");
        assert_eq!(numeric_to_string(&numeric(0, 0, 0, &[])).unwrap(), "0");
    }

    #[test]
    fn numeric_decodes_small_and_negative_values() {
        assert_eq!(numeric_to_string(&numeric(-1, 0, 2, &[500])).unwrap(), "0.05");
        assert_eq!(numeric_to_string(&numeric(-2, 0, 5, &[1000])).unwrap(), "0.00001");
        assert_eq!(
            numeric_to_string(&numeric(0, 0x4000, 4, &[1234, 5678])).unwrap(),
            "-1234.5678"
        );
        assert_eq!(numeric_to_string(&numeric(0, 0xC000, 0, &[])).unwrap(), "NaN");
    }

    #[test]
    fn truncated_numeric_is_rejected() {
        assert!(numeric_to_string(&[0, 2, 0, 0]).is_none());
        assert!(numeric_to_string(&numeric(0, 0, 0, &[1])[..9]).is_none());
    }
}
