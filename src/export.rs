use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use serde_json::Value;
use tracing::info;

use crate::error::BuildError;
use crate::schema::{CorpusStore, Document, Metadata, Passage, QaDataset, QaRecord, RawStore};

/// The three persisted tables are flat row-oriented parquet files. Nested
/// values (metadata maps, ground-truth lists) are stored as JSON-encoded
/// UTF-8 columns so QA rows stay resolvable against the corpus table by
/// plain id comparison.
const RAW_SCHEMA: &str = "
    message raw {
        REQUIRED BINARY doc_id (UTF8);
        REQUIRED BINARY source (UTF8);
        REQUIRED BINARY texts (UTF8);
        REQUIRED BINARY metadata (UTF8);
        REQUIRED INT64 page;
        REQUIRED BINARY last_modified (UTF8);
    }
";

const CORPUS_SCHEMA: &str = "
    message corpus {
        REQUIRED BINARY doc_id (UTF8);
        REQUIRED BINARY parent_doc_id (UTF8);
        REQUIRED BINARY contents (UTF8);
        REQUIRED INT64 page;
        REQUIRED BINARY metadata (UTF8);
    }
";

const QA_SCHEMA: &str = "
    message qa {
        REQUIRED BINARY qid (UTF8);
        REQUIRED BINARY query (UTF8);
        REQUIRED BINARY retrieval_gt (UTF8);
        REQUIRED BINARY generation_gt (UTF8);
        REQUIRED BINARY language (UTF8);
    }
";

enum Column {
    Utf8(Vec<ByteArray>),
    Int64(Vec<i64>),
}

fn utf8_column<I, S>(values: I) -> Column
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Column::Utf8(
        values
            .into_iter()
            .map(|v| ByteArray::from(v.as_ref().as_bytes().to_vec()))
            .collect(),
    )
}

fn json_column<I, T>(values: I, path: &Path) -> Result<Column, BuildError>
where
    I: IntoIterator<Item = T>,
    T: serde::Serialize,
{
    let mut encoded = Vec::new();
    for value in values {
        let text = serde_json::to_string(&value).map_err(|err| {
            BuildError::parquet(path, ParquetError::General(format!("encoding column: {err}")))
        })?;
        encoded.push(ByteArray::from(text.into_bytes()));
    }
    Ok(Column::Utf8(encoded))
}

fn write_table(path: &Path, schema: &str, columns: Vec<Column>) -> Result<(), BuildError> {
    let schema = Arc::new(parse_message_type(schema).map_err(|err| BuildError::parquet(path, err))?);
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).map_err(|err| BuildError::io(path, err))?;
    let mut writer = SerializedFileWriter::new(file, schema, props)
        .map_err(|err| BuildError::parquet(path, err))?;

    let mut row_group = writer
        .next_row_group()
        .map_err(|err| BuildError::parquet(path, err))?;
    for column in columns {
        let mut col = row_group
            .next_column()
            .map_err(|err| BuildError::parquet(path, err))?
            .ok_or_else(|| {
                BuildError::parquet(
                    path,
                    ParquetError::General("schema has fewer columns than data".to_string()),
                )
            })?;
        match &column {
            Column::Utf8(values) => col
                .typed::<ByteArrayType>()
                .write_batch(values, None, None)
                .map(|_| ()),
            Column::Int64(values) => col
                .typed::<Int64Type>()
                .write_batch(values, None, None)
                .map(|_| ()),
        }
        .map_err(|err| BuildError::parquet(path, err))?;
        col.close().map_err(|err| BuildError::parquet(path, err))?;
    }
    row_group
        .close()
        .map_err(|err| BuildError::parquet(path, err))?;
    writer
        .close()
        .map_err(|err| BuildError::parquet(path, err))?;
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<Value>, BuildError> {
    let file = File::open(path).map_err(|err| BuildError::io(path, err))?;
    let reader = SerializedFileReader::new(file).map_err(|err| BuildError::parquet(path, err))?;
    let iter = reader
        .get_row_iter(None)
        .map_err(|err| BuildError::parquet(path, err))?;

    let mut rows = Vec::new();
    for row in iter {
        let row = row.map_err(|err| BuildError::parquet(path, err))?;
        rows.push(row.to_json_value());
    }
    Ok(rows)
}

fn field_str<'a>(row: &'a Value, key: &str, path: &Path) -> Result<&'a str, BuildError> {
    row.get(key).and_then(Value::as_str).ok_or_else(|| {
        BuildError::parquet(
            path,
            ParquetError::General(format!("missing string column `{key}`")),
        )
    })
}

fn field_i64(row: &Value, key: &str, path: &Path) -> Result<i64, BuildError> {
    row.get(key).and_then(Value::as_i64).ok_or_else(|| {
        BuildError::parquet(
            path,
            ParquetError::General(format!("missing int64 column `{key}`")),
        )
    })
}

fn field_json<T: serde::de::DeserializeOwned>(
    row: &Value,
    key: &str,
    path: &Path,
) -> Result<T, BuildError> {
    let text = field_str(row, key, path)?;
    serde_json::from_str(text).map_err(|err| {
        BuildError::parquet(
            path,
            ParquetError::General(format!("decoding column `{key}`: {err}")),
        )
    })
}

pub fn write_raw(store: &RawStore, path: &Path) -> Result<(), BuildError> {
    let metadata = json_column(store.iter().map(|d| &d.metadata), path)?;
    let columns = vec![
        utf8_column(store.iter().map(|d| d.id.as_str())),
        utf8_column(store.iter().map(|d| d.source.as_str())),
        utf8_column(store.iter().map(|d| d.text.as_str())),
        metadata,
        Column::Int64(store.iter().map(|d| d.page).collect()),
        utf8_column(store.iter().map(|d| d.last_modified.to_rfc3339())),
    ];
    write_table(path, RAW_SCHEMA, columns)?;
    info!(rows = store.len(), path = %path.display(), "wrote raw table");
    Ok(())
}

pub fn read_raw(path: &Path) -> Result<RawStore, BuildError> {
    let mut store = RawStore::new();
    for row in read_rows(path)? {
        let last_modified = field_str(&row, "last_modified", path)?;
        let last_modified = DateTime::parse_from_rfc3339(last_modified)
            .map_err(|err| {
                BuildError::parquet(
                    path,
                    ParquetError::General(format!("decoding column `last_modified`: {err}")),
                )
            })?
            .with_timezone(&Utc);
        store.push(Document {
            id: field_str(&row, "doc_id", path)?.to_string(),
            source: field_str(&row, "source", path)?.to_string(),
            text: field_str(&row, "texts", path)?.to_string(),
            metadata: field_json::<Metadata>(&row, "metadata", path)?,
            page: field_i64(&row, "page", path)?,
            last_modified,
        });
    }
    Ok(store)
}

pub fn write_corpus(store: &CorpusStore, path: &Path) -> Result<(), BuildError> {
    let metadata = json_column(store.iter().map(|p| &p.metadata), path)?;
    let columns = vec![
        utf8_column(store.iter().map(|p| p.id.as_str())),
        utf8_column(store.iter().map(|p| p.doc_id.as_str())),
        utf8_column(store.iter().map(|p| p.contents.as_str())),
        Column::Int64(store.iter().map(|p| p.page).collect()),
        metadata,
    ];
    write_table(path, CORPUS_SCHEMA, columns)?;
    info!(rows = store.len(), path = %path.display(), "wrote corpus table");
    Ok(())
}

pub fn read_corpus(path: &Path) -> Result<CorpusStore, BuildError> {
    let mut store = CorpusStore::new();
    for row in read_rows(path)? {
        store.push(Passage {
            id: field_str(&row, "doc_id", path)?.to_string(),
            doc_id: field_str(&row, "parent_doc_id", path)?.to_string(),
            contents: field_str(&row, "contents", path)?.to_string(),
            page: field_i64(&row, "page", path)?,
            metadata: field_json::<Metadata>(&row, "metadata", path)?,
        });
    }
    Ok(store)
}

pub fn write_qa(records: &[QaRecord], path: &Path) -> Result<(), BuildError> {
    let retrieval_gt = json_column(records.iter().map(|r| &r.retrieval_gt), path)?;
    let generation_gt = json_column(records.iter().map(|r| &r.generation_gt), path)?;
    let columns = vec![
        utf8_column(records.iter().map(|r| r.qid.as_str())),
        utf8_column(records.iter().map(|r| r.query.as_str())),
        retrieval_gt,
        generation_gt,
        utf8_column(records.iter().map(|r| r.language.as_str())),
    ];
    write_table(path, QA_SCHEMA, columns)?;
    info!(rows = records.len(), path = %path.display(), "wrote qa table");
    Ok(())
}

pub fn read_qa(path: &Path) -> Result<Vec<QaRecord>, BuildError> {
    let mut records = Vec::new();
    for row in read_rows(path)? {
        records.push(QaRecord {
            qid: field_str(&row, "qid", path)?.to_string(),
            query: field_str(&row, "query", path)?.to_string(),
            retrieval_gt: field_json(&row, "retrieval_gt", path)?,
            generation_gt: field_json(&row, "generation_gt", path)?,
            language: field_str(&row, "language", path)?.to_string(),
        });
    }
    Ok(records)
}

impl QaDataset {
    /// Writes the QA table and the corpus snapshot it was derived from as
    /// two correlated tables. Runs only after the full chain has
    /// succeeded, so a present QA file is always complete.
    pub fn to_parquet(&self, qa_path: &Path, corpus_path: &Path) -> Result<(), BuildError> {
        self.validate()?;
        write_qa(&self.qa, qa_path)?;
        write_corpus(&self.corpus, corpus_path)?;
        Ok(())
    }
}
