use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use arrow_array::StringArray;
use flate2::write::GzEncoder;
use flate2::Compression;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fq_io::{Error, OwnedRecord, Reader, Record};

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(content).unwrap();
    path
}

fn write_gz(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap();
    path
}

/// generates `n` records with seeded random sequences and qualities
fn gen_fastq(n: usize, seed: u64) -> (Vec<u8>, Vec<OwnedRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::new();
    let mut records = Vec::new();
    for i in 0..n {
        let len = rng.gen_range(1..80);
        let seq: Vec<u8> = (0..len).map(|_| b"ACGTN"[rng.gen_range(0..5)]).collect();
        let qual: Vec<u8> = (0..len).map(|_| rng.gen_range(b'!'..=b'I')).collect();
        let record = OwnedRecord {
            head: format!("read{}", i).into_bytes(),
            seq,
            qual,
        };
        record.write(&mut data).unwrap();
        records.push(record);
    }
    (data, records)
}

const SAMPLE: &[u8] = b"@read1
ACGTACGTACGT
+
IIIIIIIIIIII
@read2
TGCAAGCTTGCA
+
JJJJJJJJJJJJ
";

#[test]
fn test_count_reads() {
    let dir = tempfile::tempdir().unwrap();

    let empty = write_file(dir.path(), "empty.fastq", b"");
    assert_eq!(Reader::from_path(&empty).unwrap().count_reads().unwrap(), 0);

    let single = write_file(dir.path(), "single.fastq", b"@r\nACGT\n+\nIIII\n");
    assert_eq!(Reader::from_path(&single).unwrap().count_reads().unwrap(), 1);

    let (data, records) = gen_fastq(2000, 1);
    let many = write_file(dir.path(), "many.fastq", &data);
    let reader = Reader::from_path(&many).unwrap().with_chunk_size(512);
    assert_eq!(reader.count_reads().unwrap(), records.len() as u64);
}

#[test]
fn test_missing_file() {
    assert!(Reader::from_path("no/such/file.fastq").is_err());
}

#[test]
fn test_iteration_order_any_thread_count() {
    let dir = tempfile::tempdir().unwrap();
    let (data, expected) = gen_fastq(1000, 2);
    let path = write_file(dir.path(), "reads.fastq", &data);

    for n_threads in [1, 2, 4, 8] {
        let reader = Reader::from_path(&path)
            .unwrap()
            .with_threads(n_threads)
            .with_chunk_size(256);
        let records: Result<Vec<_>, _> = reader.records().collect();
        assert_eq!(records.unwrap(), expected, "{} threads", n_threads);
    }
}

#[test]
fn test_iteration_restarts_from_the_beginning() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "reads.fastq", SAMPLE);
    let reader = Reader::from_path(&path).unwrap();

    let first: Result<Vec<_>, _> = reader.records().collect();
    let second: Result<Vec<_>, _> = reader.records().collect();
    assert_eq!(first.unwrap(), second.unwrap());
}

#[test]
fn test_dropping_iterator_stops_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = gen_fastq(5000, 3);
    let path = write_file(dir.path(), "reads.fastq", &data);
    let reader = Reader::from_path(&path).unwrap().with_chunk_size(256);

    let mut records = reader.records();
    let first = records.next().unwrap().unwrap();
    assert_eq!(first.head, b"read0");
    drop(records);
}

#[test]
fn test_gzip_matches_plain() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = gen_fastq(500, 4);
    let plain = write_file(dir.path(), "reads.fastq", &data);
    let gz = write_gz(dir.path(), "reads.fastq.gz", &data);

    let plain_reader = Reader::from_path(&plain).unwrap().with_chunk_size(512);
    let gz_reader = Reader::from_path(&gz).unwrap().with_chunk_size(512);

    assert_eq!(
        plain_reader.count_reads().unwrap(),
        gz_reader.count_reads().unwrap()
    );
    let plain_records: Result<Vec<_>, _> = plain_reader.records().collect();
    let gz_records: Result<Vec<_>, _> = gz_reader.records().collect();
    assert_eq!(plain_records.unwrap(), gz_records.unwrap());
}

#[test]
fn test_gzip_detected_by_magic_bytes() {
    // gzip content without the .gz extension
    let dir = tempfile::tempdir().unwrap();
    let path = write_gz(dir.path(), "reads.fastq", SAMPLE);
    let reader = Reader::from_path(&path).unwrap();
    assert_eq!(reader.count_reads().unwrap(), 2);
}

#[test]
fn test_trim() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "reads.fastq", SAMPLE);
    let reader = Reader::from_path(&path).unwrap();

    let trimmed = reader.trim(2, 2).unwrap();
    assert_eq!(trimmed.len(), 2);
    assert_eq!(trimmed[0].seq, b"GTACGTAC");
    assert_eq!(trimmed[1].seq, b"CAAGCTTG");
    assert_eq!(trimmed[0].qual.len(), trimmed[0].seq.len());

    // over-trimming yields empty records, never an error
    let emptied = reader.trim(10, 10).unwrap();
    assert_eq!(emptied.len(), 2);
    assert!(emptied[0].seq.is_empty());
    assert!(emptied[0].qual.is_empty());
    assert_eq!(emptied[0].head, b"read1");
}

#[test]
fn test_filter_quality() {
    let dir = tempfile::tempdir().unwrap();
    let content = b"@low\nACGTACGTACGT\n+\n!!!!!!!!!!!!\n@high\nTGCAAGCTTGCA\n+\nJJJJJJJJJJJJ\n";
    let path = write_file(dir.path(), "reads.fastq", content);
    let reader = Reader::from_path(&path).unwrap();

    let kept = reader.filter_quality(30).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].head, b"high");

    // '?' encodes exactly Phred 30; the threshold is inclusive
    let boundary = write_file(
        dir.path(),
        "boundary.fastq",
        b"@exact\nACGT\n+\n????\n",
    );
    let kept = Reader::from_path(&boundary)
        .unwrap()
        .filter_quality(30)
        .unwrap();
    assert_eq!(kept.len(), 1);
}

#[test]
fn test_extract() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "reads.fastq", SAMPLE);
    let reader = Reader::from_path(&path).unwrap();

    let extracted = reader.extract(2, 6).unwrap();
    assert_eq!(extracted[0].seq, b"GTAC");
    assert_eq!(extracted[1].seq, b"CAAG");
    assert_eq!(extracted[0].head, b"read1");
}

#[test]
fn test_extract_to_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = gen_fastq(300, 5);
    let path = write_file(dir.path(), "reads.fastq", &data);
    let reader = Reader::from_path(&path).unwrap().with_chunk_size(512);

    let expected = reader.extract(2, 10).unwrap();

    let prefix = dir.path().join("extracted");
    let parquet_path = reader
        .extract_to_parquet(2, 10, prefix.to_str().unwrap())
        .unwrap();
    assert!(parquet_path.exists());

    let file = File::open(&parquet_path).unwrap();
    let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();

    let mut headers = Vec::new();
    let mut extracted = Vec::new();
    for batch in parquet_reader {
        let batch = batch.unwrap();
        let header_col = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        let extracted_col = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        for i in 0..batch.num_rows() {
            headers.push(header_col.value(i).to_string());
            extracted.push(extracted_col.value(i).to_string());
        }
    }

    assert_eq!(headers.len(), expected.len());
    for (record, (header, cut)) in expected.iter().zip(headers.iter().zip(&extracted)) {
        assert_eq!(header.as_bytes(), &record.head[..]);
        assert_eq!(cut.as_bytes(), &record.seq[..]);
    }
}

#[test]
fn test_truncated_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "truncated.fastq", b"@r1\nACGT\n+\nIIII\n@r2\nACGT\n");
    let reader = Reader::from_path(&path).unwrap();

    assert!(matches!(
        reader.count_reads(),
        Err(Error::UnexpectedEnd { .. })
    ));

    // iteration yields the complete record before failing
    let mut iter = reader.records();
    assert_eq!(iter.next().unwrap().unwrap().head, b"r1");
    assert!(matches!(
        iter.next(),
        Some(Err(Error::UnexpectedEnd { .. }))
    ));
    assert!(iter.next().is_none());
}

#[test]
fn test_malformed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.fastq", b"@r1\nACGT\n+\nIII\n");
    let reader = Reader::from_path(&path).unwrap();
    assert!(matches!(
        reader.count_reads(),
        Err(Error::UnequalLengths { .. })
    ));
}
