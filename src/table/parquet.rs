//! Whole-file Parquet read/write for the pipeline's tables.
//!
//! Columns are read through `arrow::compute::cast`, so files written by
//! other tools with `LargeUtf8` strings or narrower integer types still load.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::models::{GroupAggregate, GroupKey, Orientation, ScoredRecord, Score, StatementRecord};
use super::TableError;
use crate::analysis::aggregate::normalized_score;

const STATEMENT_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "date",
    "source",
    "read_more_link",
    "author",
    "party",
    "verdict",
];

fn statement_fields() -> Vec<Field> {
    STATEMENT_COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, false))
        .collect()
}

fn statement_arrays(rows: &[StatementRecord]) -> Vec<ArrayRef> {
    let column = |f: fn(&StatementRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    vec![
        column(|r| r.id.as_str()),
        column(|r| r.title.as_str()),
        column(|r| r.date.as_str()),
        column(|r| r.source.as_str()),
        column(|r| r.read_more_link.as_str()),
        column(|r| r.author.as_str()),
        column(|r| r.party.as_str()),
        column(|r| r.verdict.as_str()),
    ]
}

fn statements_from_batch(batch: &RecordBatch) -> Result<Vec<StatementRecord>, TableError> {
    let id = string_column(batch, "id")?;
    let title = string_column(batch, "title")?;
    let date = string_column(batch, "date")?;
    let source = string_column(batch, "source")?;
    let link = string_column(batch, "read_more_link")?;
    let author = string_column(batch, "author")?;
    let party = string_column(batch, "party")?;
    let verdict = string_column(batch, "verdict")?;

    Ok((0..batch.num_rows())
        .map(|i| StatementRecord {
            id: string_at(&id, i),
            title: string_at(&title, i),
            date: string_at(&date, i),
            source: string_at(&source, i),
            read_more_link: string_at(&link, i),
            author: string_at(&author, i),
            party: string_at(&party, i),
            verdict: string_at(&verdict, i),
        })
        .collect())
}

pub fn statement_schema() -> SchemaRef {
    Arc::new(Schema::new(statement_fields()))
}

pub fn write_statements(path: &Path, rows: &[StatementRecord]) -> Result<(), TableError> {
    let batch = RecordBatch::try_new(statement_schema(), statement_arrays(rows))?;
    write_batch(path, &batch)
}

pub fn read_statements(path: &Path) -> Result<Vec<StatementRecord>, TableError> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        rows.extend(statements_from_batch(&batch)?);
    }
    Ok(rows)
}

/// Like [`read_statements`], but a missing file is an empty table.
pub fn read_statements_or_empty(path: &Path) -> Result<Vec<StatementRecord>, TableError> {
    match read_statements(path) {
        Err(TableError::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

pub fn scored_schema() -> SchemaRef {
    let mut fields = statement_fields();
    fields.push(Field::new("score", DataType::Int64, false));
    fields.push(Field::new("orientation", DataType::Utf8, true));
    Arc::new(Schema::new(fields))
}

pub fn write_scored(path: &Path, rows: &[ScoredRecord]) -> Result<(), TableError> {
    let statements: Vec<StatementRecord> = rows.iter().map(|r| r.statement.clone()).collect();
    let mut arrays = statement_arrays(&statements);
    arrays.push(Arc::new(Int64Array::from(
        rows.iter().map(|r| r.score.value()).collect::<Vec<_>>(),
    )));
    arrays.push(Arc::new(StringArray::from(
        rows.iter()
            .map(|r| r.orientation.map(Orientation::as_str))
            .collect::<Vec<_>>(),
    )));

    let batch = RecordBatch::try_new(scored_schema(), arrays)?;
    write_batch(path, &batch)
}

pub fn read_scored(path: &Path) -> Result<Vec<ScoredRecord>, TableError> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let statements = statements_from_batch(&batch)?;
        let scores = int_column(&batch, "score")?;
        let orientation = optional_string_column(&batch, "orientation")?;

        for (i, statement) in statements.into_iter().enumerate() {
            let raw = scores.value(i);
            let score = Score::from_value(raw).ok_or(TableError::InvalidValue {
                column: "score",
                value: raw.to_string(),
            })?;
            let orientation = orientation
                .as_ref()
                .and_then(|col| optional_string_at(col, i))
                .and_then(|label| Orientation::parse(&label));

            rows.push(ScoredRecord {
                statement,
                score,
                orientation,
            });
        }
    }
    Ok(rows)
}

pub fn aggregate_schema(key: GroupKey) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(key.column(), DataType::Utf8, false),
        Field::new("average_score", DataType::Float64, false),
        Field::new("count", DataType::Int64, false),
        Field::new("orientation", DataType::Utf8, true),
        Field::new("image_url", DataType::Utf8, true),
    ]))
}

pub fn write_aggregates(
    path: &Path,
    rows: &[GroupAggregate],
    key: GroupKey,
) -> Result<(), TableError> {
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.average_score).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.count as i64).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter()
                .map(|r| r.orientation.map(Orientation::as_str))
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.image_url.as_deref()).collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(aggregate_schema(key), arrays)?;
    write_batch(path, &batch)
}

pub fn read_aggregates(path: &Path, key: GroupKey) -> Result<Vec<GroupAggregate>, TableError> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let keys = string_column(&batch, key.column())?;
        let average = float_column(&batch, "average_score")?;
        let count = int_column(&batch, "count")?;
        let orientation = optional_string_column(&batch, "orientation")?;
        let image_url = optional_string_column(&batch, "image_url")?;

        for i in 0..batch.num_rows() {
            rows.push(GroupAggregate {
                key: string_at(&keys, i),
                average_score: average.value(i),
                count: count.value(i).max(0) as u64,
                normalized_score: 0.0,
                orientation: orientation
                    .as_ref()
                    .and_then(|col| optional_string_at(col, i))
                    .and_then(|label| Orientation::parse(&label)),
                image_url: image_url.as_ref().and_then(|col| optional_string_at(col, i)),
            });
        }
    }

    let max_count = rows.iter().map(|r| r.count).max().unwrap_or(0);
    for row in &mut rows {
        row.normalized_score = normalized_score(row.average_score, row.count, max_count);
    }
    Ok(rows)
}

// --- Helpers ---

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, TableError> {
    if !path.exists() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

fn cast_column(
    batch: &RecordBatch,
    name: &'static str,
    to: &DataType,
) -> Result<ArrayRef, TableError> {
    let col = batch
        .column_by_name(name)
        .ok_or(TableError::MissingColumn(name))?;
    cast(col, to).map_err(|_| TableError::ColumnType {
        column: name,
        found: col.data_type().to_string(),
    })
}

fn string_column(batch: &RecordBatch, name: &'static str) -> Result<StringArray, TableError> {
    let col = cast_column(batch, name, &DataType::Utf8)?;
    col.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or(TableError::ColumnType {
            column: name,
            found: col.data_type().to_string(),
        })
}

/// A nullable column that older tables may not have at all.
fn optional_string_column(
    batch: &RecordBatch,
    name: &'static str,
) -> Result<Option<StringArray>, TableError> {
    if batch.column_by_name(name).is_none() {
        return Ok(None);
    }
    string_column(batch, name).map(Some)
}

fn int_column(batch: &RecordBatch, name: &'static str) -> Result<Int64Array, TableError> {
    let col = cast_column(batch, name, &DataType::Int64)?;
    col.as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or(TableError::ColumnType {
            column: name,
            found: col.data_type().to_string(),
        })
}

fn float_column(batch: &RecordBatch, name: &'static str) -> Result<Float64Array, TableError> {
    let col = cast_column(batch, name, &DataType::Float64)?;
    col.as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or(TableError::ColumnType {
            column: name,
            found: col.data_type().to_string(),
        })
}

/// Nulls in required string columns read back as empty strings.
fn string_at(col: &StringArray, i: usize) -> String {
    if col.is_null(i) {
        String::new()
    } else {
        col.value(i).to_string()
    }
}

fn optional_string_at(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) {
        None
    } else {
        Some(col.value(i).to_string())
    }
}
