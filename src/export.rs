//! Columnar export sink for extraction results

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::Error;
use crate::record::OwnedRecord;

/// Writes `(header, extracted)` rows to a parquet file, one batch per
/// chunk of results.
pub(crate) struct ParquetSink {
    writer: ArrowWriter<File>,
    schema: SchemaRef,
}

impl ParquetSink {
    pub fn create(path: &Path) -> Result<ParquetSink, Error> {
        let schema: SchemaRef = Arc::new(Schema::new(vec![
            Field::new("header", DataType::Utf8, false),
            Field::new("extracted", DataType::Utf8, false),
        ]));
        let file = File::create(path)?;
        let props = WriterProperties::builder().build();
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        Ok(ParquetSink { writer, schema })
    }

    pub fn write_records(&mut self, records: &[OwnedRecord]) -> Result<(), Error> {
        if records.is_empty() {
            return Ok(());
        }
        let headers: StringArray = records
            .iter()
            .map(|r| Some(String::from_utf8_lossy(&r.head)))
            .collect();
        let extracted: StringArray = records
            .iter()
            .map(|r| Some(String::from_utf8_lossy(&r.seq)))
            .collect();
        let batch = RecordBatch::try_new(
            self.schema.clone(),
            vec![Arc::new(headers) as ArrayRef, Arc::new(extracted) as ArrayRef],
        )?;
        self.writer.write(&batch)?;
        Ok(())
    }

    pub fn finish(self) -> Result<(), Error> {
        self.writer.close()?;
        Ok(())
    }
}
