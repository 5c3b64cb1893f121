use std::fs::File;
use std::sync::Arc;

use arrow::array::{Array, StringArray, TimestampMicrosecondArray, UInt32Array, UInt64Array};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::tempdir;

use tabout::arrow::SEMANTIC_TYPE_KEY;
use tabout::codec::Timestamp;
use tabout::config::CompressionCodec;
use tabout::output::MemoryBatchSink;
use tabout::termination::Registry;
use tabout::{
    ColumnDescriptor, EnumValue, OutputError, OutputOptions, Schema, SemanticType, TableOutput,
    TableWriter,
};

fn name_size() -> Schema {
    Schema::new(vec![
        ColumnDescriptor::new("name", SemanticType::Utf8Text),
        ColumnDescriptor::new("size", SemanticType::UInt64),
    ])
    .unwrap()
}

fn options(batch_size: Option<usize>) -> OutputOptions {
    OutputOptions {
        batch_size,
        ..Default::default()
    }
}

#[test]
fn test_two_batches_to_parquet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("files.parquet");
    let registry = Registry::new();

    let mut writer = TableWriter::with_registry(options(Some(2)), &registry).unwrap();
    writer.set_schema(name_size()).unwrap();
    writer.write_to_file(&path).unwrap();
    for (name, size) in [("a", 1u64), ("b", 2), ("c", 3)] {
        writer.write_str(name).unwrap();
        writer.write_u64(size).unwrap();
        writer.end_of_row().unwrap();
    }
    writer.close().unwrap();
    assert_eq!(writer.total_rows(), 3);

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 3);

    let mut names = Vec::new();
    for batch in &batches {
        let column = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        names.extend(column.iter().map(|v| v.unwrap().to_string()));
    }
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn test_batches_reach_sink_in_order() {
    let registry = Registry::new();
    let memory = MemoryBatchSink::new();
    let mut writer = TableWriter::with_registry(options(Some(2)), &registry).unwrap();
    writer.set_schema(name_size()).unwrap();
    writer.write_to_sink(Box::new(memory.clone())).unwrap();

    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        writer.write_str(name).unwrap();
        writer.write_u64(i as u64).unwrap();
        writer.end_of_row().unwrap();
        if i == 1 {
            // Auto flush fires on the second row.
            assert_eq!(writer.batch_rows(), 0);
        }
    }
    writer.close().unwrap();

    let sizes: Vec<usize> = memory.batches().iter().map(|b| b.num_rows()).collect();
    assert_eq!(sizes, [2, 1]);
    let last = memory.batches()[1].clone();
    let values = last.column(1).as_any().downcast_ref::<UInt64Array>().unwrap();
    assert_eq!(values.value(0), 2);
}

#[test]
fn test_schema_metadata_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kinds.parquet");
    let schema = Schema::new(vec![
        ColumnDescriptor::new(
            "kind",
            SemanticType::Enum(Some(EnumValue::table(["File", "Directory"]))),
        ),
        ColumnDescriptor::new("modified", SemanticType::Timestamp),
    ])
    .unwrap();

    let mut writer = TableWriter::with_registry(
        OutputOptions {
            parquet: tabout::config::ParquetOptions {
                compression: CompressionCodec::Uncompressed,
                ..Default::default()
            },
            ..Default::default()
        },
        &Registry::new(),
    )
    .unwrap();
    writer.set_schema(schema).unwrap();
    writer.write_to_stream(File::create(&path).unwrap()).unwrap();
    writer.write_enum(1).unwrap();
    writer.write_file_time(116_444_736_000_000_000 + 10).unwrap();
    writer.end_of_row().unwrap();
    writer.close().unwrap();

    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap();
    let field = builder.schema().field(0).clone();
    assert_eq!(
        field.metadata().get(SEMANTIC_TYPE_KEY).map(String::as_str),
        Some("enum")
    );
    assert_eq!(field.metadata().get("0x000001").map(String::as_str), Some("Directory"));

    let batch = builder.build().unwrap().next().unwrap().unwrap();
    let kinds = batch.column(0).as_any().downcast_ref::<UInt32Array>().unwrap();
    assert_eq!(kinds.value(0), 1);
    let times = batch
        .column(1)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(times.value(0), Timestamp::from_micros(1).as_micros());
}

#[test]
fn test_rejected_schema_keeps_previous() {
    let registry = Registry::new();
    let mut writer = TableWriter::with_registry(options(None), &registry).unwrap();
    writer.set_schema(name_size()).unwrap();

    let huge = Schema::new(vec![ColumnDescriptor::new(
        "blob",
        SemanticType::FixedBinary(u32::MAX),
    )])
    .unwrap();
    assert!(matches!(
        writer.set_schema(huge),
        Err(OutputError::UnsupportedType { .. })
    ));
    assert_eq!(writer.schema().unwrap(), name_size());
}

#[test]
fn test_bad_options_rejected() {
    assert!(matches!(
        TableWriter::with_registry(options(Some(0)), &Registry::new()),
        Err(OutputError::InvalidArgument(_))
    ));
}

#[test]
fn test_termination_finishes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.parquet");
    let registry = Arc::new(Registry::default());

    let mut writer = TableWriter::with_registry(options(None), &registry).unwrap();
    writer.set_schema(name_size()).unwrap();
    writer.write_to_file(&path).unwrap();
    writer.write_str("a").unwrap();
    writer.write_u64(1).unwrap();
    writer.end_of_row().unwrap();
    writer.write_str("half").unwrap();

    assert_eq!(registry.run_handlers(), 1);

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batch = reader.map(|b| b.unwrap()).next().unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert!(batch.column(1).is_null(1));
}
