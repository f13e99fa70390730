//! Columnar encoding of sales transactions.
//!
//! Monetary columns are `Float64`, `quantity` is `Int64` and
//! `transaction_date` is `Date32` (days since the Unix epoch).

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use grime_core::{DatasetKind, Region, SalesTransaction};

use crate::errors::GenerationError;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn transaction_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new("user_id", DataType::Utf8, false),
        Field::new("product_id", DataType::Utf8, false),
        Field::new("product_name", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("unit_price", DataType::Float64, false),
        Field::new("total_amount", DataType::Float64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("transaction_date", DataType::Date32, false),
    ]))
}

pub fn encode_transactions(records: &[SalesTransaction]) -> Result<Vec<u8>, GenerationError> {
    let schema = transaction_schema();
    let strings = |field: fn(&SalesTransaction) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(
            records.iter().map(field).collect::<Vec<&str>>(),
        ))
    };
    let columns: Vec<ArrayRef> = vec![
        strings(|row| row.transaction_id.as_str()),
        strings(|row| row.user_id.as_str()),
        strings(|row| row.product_id.as_str()),
        strings(|row| row.product_name.as_str()),
        strings(|row| row.category.as_str()),
        Arc::new(Int64Array::from(
            records.iter().map(|row| row.quantity).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|row| row.unit_price).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|row| row.total_amount).collect::<Vec<_>>(),
        )),
        strings(|row| row.region.as_str()),
        Arc::new(Date32Array::from(
            records
                .iter()
                .map(|row| days_since_epoch(row.transaction_date))
                .collect::<Vec<_>>(),
        )),
    ];
    let batch = RecordBatch::try_new(Arc::clone(&schema), columns)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

pub fn decode_transactions(data: &[u8]) -> Result<Vec<SalesTransaction>, GenerationError> {
    let bytes = bytes::Bytes::copy_from_slice(data);
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let transaction_id = column::<StringArray>(&batch, "transaction_id")?;
        let user_id = column::<StringArray>(&batch, "user_id")?;
        let product_id = column::<StringArray>(&batch, "product_id")?;
        let product_name = column::<StringArray>(&batch, "product_name")?;
        let category = column::<StringArray>(&batch, "category")?;
        let quantity = column::<Int64Array>(&batch, "quantity")?;
        let unit_price = column::<Float64Array>(&batch, "unit_price")?;
        let total_amount = column::<Float64Array>(&batch, "total_amount")?;
        let region = column::<StringArray>(&batch, "region")?;
        let transaction_date = column::<Date32Array>(&batch, "transaction_date")?;

        for idx in 0..batch.num_rows() {
            let region = Region::parse(region.value(idx))
                .ok_or_else(|| malformed(format!("unknown region '{}'", region.value(idx))))?;
            let date = date_from_days(transaction_date.value(idx)).ok_or_else(|| {
                malformed(format!("date out of range in row {idx}"))
            })?;
            records.push(SalesTransaction {
                transaction_id: transaction_id.value(idx).to_string(),
                user_id: user_id.value(idx).to_string(),
                product_id: product_id.value(idx).to_string(),
                product_name: product_name.value(idx).to_string(),
                category: category.value(idx).to_string(),
                quantity: quantity.value(idx),
                unit_price: unit_price.value(idx),
                total_amount: total_amount.value(idx),
                region,
                transaction_date: date,
            });
        }
    }
    Ok(records)
}

/// Column names of an encoded file, in schema order.
pub fn column_names(data: &[u8]) -> Result<Vec<String>, GenerationError> {
    let bytes = bytes::Bytes::copy_from_slice(data);
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    Ok(builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect())
}

fn column<'b, A: Array + 'static>(
    batch: &'b RecordBatch,
    name: &str,
) -> Result<&'b A, GenerationError> {
    batch
        .column_by_name(name)
        .and_then(|array| array.as_any().downcast_ref::<A>())
        .ok_or_else(|| malformed(format!("missing or mistyped column '{name}'")))
}

fn malformed(message: String) -> GenerationError {
    GenerationError::Malformed {
        dataset: DatasetKind::Transactions,
        message,
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
