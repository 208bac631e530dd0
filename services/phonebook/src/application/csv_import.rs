//! CSV 批量导入
//!
//! 表头必须为 `area code,phone number,cost`；之后每一行独立校验并按
//! (area_code, local_number) upsert。单行错误只记录在汇总里，不中断导入。

use std::sync::Arc;

use csv::{ByteRecord, ReaderBuilder};
use metrics::counter;
use phonebook_errors::{AppError, FieldErrors};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::entities::NewPhoneNumber;
use crate::domain::repositories::{PhoneNumberRepository, UpsertOutcome};
use crate::domain::value_objects::{AreaCode, Cost, LocalNumber};

pub const EXPECTED_HEADER: [&str; 3] = ["area code", "phone number", "cost"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 文件级错误，整次导入放弃
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV file is empty.")]
    Empty,

    #[error("CSV header must be exactly: area code,phone number,cost")]
    InvalidHeader,

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Storage(e) => e,
            other => AppError::InvalidFields(FieldErrors::single("csv_file", other.to_string())),
        }
    }
}

/// 单行校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid { line: u64, number: NewPhoneNumber },
    Skipped { line: u64, detail: String },
}

impl RowOutcome {
    pub fn line(&self) -> u64 {
        match self {
            Self::Valid { line, .. } | Self::Skipped { line, .. } => *line,
        }
    }

    fn skipped(line: u64, reason: impl std::fmt::Display) -> Self {
        Self::Skipped {
            line,
            detail: line_detail(line, reason),
        }
    }
}

fn line_detail(line: u64, reason: impl std::fmt::Display) -> String {
    format!("Line {}: {}", line, reason)
}

/// 导入汇总，details 按行号顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub details: Vec<String>,
}

impl ImportSummary {
    pub fn message(&self) -> &'static str {
        if self.skipped > 0 {
            "CSV processed with some skipped rows."
        } else {
            "CSV processed successfully."
        }
    }

    fn skip(&mut self, detail: String) {
        self.skipped += 1;
        self.details.push(detail);
    }
}

/// 按记录切分原始字节
///
/// 引号内的换行属于字段内容；空行作为 0 列记录返回，不会被吞掉。
/// 结尾换行之后的空串不算记录。
struct RawRecords<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RawRecords<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl<'a> Iterator for RawRecords<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        if rest.is_empty() {
            return None;
        }

        let mut in_quotes = false;
        let mut field_start = true;
        let mut i = 0;
        while i < rest.len() {
            let b = rest[i];
            if in_quotes {
                if b == b'"' {
                    if rest.get(i + 1) == Some(&b'"') {
                        i += 1;
                    } else {
                        in_quotes = false;
                    }
                }
                field_start = false;
            } else {
                match b {
                    b'"' if field_start => in_quotes = true,
                    b',' => {
                        field_start = true;
                        i += 1;
                        continue;
                    }
                    b'\n' | b'\r' => {
                        let terminator = if b == b'\r' && rest.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                        self.pos += i + terminator;
                        return Some(&rest[..i]);
                    }
                    _ => {}
                }
                field_start = false;
            }
            i += 1;
        }

        self.pos = bytes.len();
        Some(rest)
    }
}

/// 把一条原始记录拆成字段；空记录得到 0 个字段
fn read_fields(raw: &[u8]) -> csv::Result<ByteRecord> {
    let mut reader = ReaderBuilder::new().has_headers(false).flexible(true).from_reader(raw);
    let mut record = ByteRecord::new();
    reader.read_byte_record(&mut record)?;
    Ok(record)
}

/// 表头之后的逐行迭代器；行号按记录序号计，表头为第 1 行
struct CsvRows<'a> {
    records: RawRecords<'a>,
    line: u64,
}

impl<'a> CsvRows<'a> {
    fn open(bytes: &'a [u8]) -> Result<Self, ImportError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut records = RawRecords::new(bytes);

        let raw_header = records.next().ok_or(ImportError::Empty)?;
        let header = read_fields(raw_header).map_err(|_| ImportError::InvalidHeader)?;
        if !header_matches(&header) {
            return Err(ImportError::InvalidHeader);
        }

        Ok(Self { records, line: 1 })
    }
}

impl Iterator for CsvRows<'_> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<RowOutcome> {
        let raw = self.records.next()?;
        self.line += 1;
        Some(match read_fields(raw) {
            Ok(record) => validate_record(self.line, &record),
            Err(_) => RowOutcome::skipped(self.line, "unreadable row."),
        })
    }
}

fn header_matches(header: &ByteRecord) -> bool {
    header.len() == EXPECTED_HEADER.len()
        && header
            .iter()
            .zip(EXPECTED_HEADER)
            .all(|(field, expected)| std::str::from_utf8(field).is_ok_and(|f| f.trim() == expected))
}

fn validate_record(line: u64, record: &ByteRecord) -> RowOutcome {
    let fields = match record.iter().map(std::str::from_utf8).collect::<Result<Vec<&str>, _>>() {
        Ok(fields) => fields,
        Err(_) => return RowOutcome::skipped(line, "unreadable row."),
    };

    let [area_code, local_number, cost] = fields.as_slice() else {
        return RowOutcome::skipped(line, format!("expected 3 columns, found {}.", fields.len()));
    };

    let Ok(area_code) = AreaCode::new(area_code.trim()) else {
        return RowOutcome::skipped(line, "invalid area code.");
    };
    let Ok(local_number) = LocalNumber::new(local_number.trim()) else {
        return RowOutcome::skipped(line, "invalid phone number.");
    };
    let Ok(cost) = Cost::parse(cost) else {
        return RowOutcome::skipped(line, "invalid cost value.");
    };

    RowOutcome::Valid {
        line,
        number: NewPhoneNumber::new(area_code, local_number, cost),
    }
}

/// 只做校验，不写库
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RowOutcome>, ImportError> {
    Ok(CsvRows::open(bytes)?.collect())
}

/// CSV 导入服务
pub struct CsvImporter {
    repository: Arc<dyn PhoneNumberRepository>,
}

impl CsvImporter {
    pub fn new(repository: Arc<dyn PhoneNumberRepository>) -> Self {
        Self { repository }
    }

    /// 逐行 upsert；每行独立提交，存储故障直接上抛
    pub async fn import(&self, bytes: &[u8]) -> Result<ImportSummary, ImportError> {
        let rows = match CsvRows::open(bytes) {
            Ok(rows) => rows,
            Err(e) => {
                counter!("phonebook_import_files_total", "result" => "rejected").increment(1);
                warn!(error = %e, "CSV upload rejected");
                return Err(e);
            }
        };

        let mut summary = ImportSummary::default();
        for row in rows {
            match row {
                RowOutcome::Skipped { detail, .. } => summary.skip(detail),
                RowOutcome::Valid { line, number } => match self.upsert_row(&number).await? {
                    Some(UpsertOutcome::Inserted(_)) => summary.inserted += 1,
                    Some(UpsertOutcome::Updated(_)) => summary.updated += 1,
                    None => summary.skip(line_detail(line, "conflicting concurrent write.")),
                },
            }
        }

        counter!("phonebook_import_rows_total", "outcome" => "inserted").increment(summary.inserted);
        counter!("phonebook_import_rows_total", "outcome" => "updated").increment(summary.updated);
        counter!("phonebook_import_rows_total", "outcome" => "skipped").increment(summary.skipped);
        counter!("phonebook_import_files_total", "result" => "processed").increment(1);

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "CSV import finished"
        );
        Ok(summary)
    }

    /// 并发写入导致的唯一键冲突重试一次，仍冲突则返回 None
    async fn upsert_row(&self, number: &NewPhoneNumber) -> Result<Option<UpsertOutcome>, AppError> {
        match self.repository.upsert(number).await {
            Err(e) if e.is_conflict() => {
                warn!(
                    area_code = %number.area_code,
                    local_number = %number.local_number,
                    "Upsert conflicted, retrying once"
                );
                match self.repository.upsert(number).await {
                    Err(e) if e.is_conflict() => Ok(None),
                    other => other.map(Some),
                }
            }
            other => other.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(rows: &[RowOutcome]) -> Vec<String> {
        rows.iter()
            .filter_map(|r| match r {
                RowOutcome::Skipped { detail, .. } => Some(detail.clone()),
                RowOutcome::Valid { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse_csv(b""), Err(ImportError::Empty)));
        assert!(matches!(parse_csv(UTF8_BOM), Err(ImportError::Empty)));
    }

    #[test]
    fn test_header_mismatch() {
        assert!(matches!(parse_csv(b"foo,bar,baz\n123,5551234,1.00\n"), Err(ImportError::InvalidHeader)));
        assert!(matches!(parse_csv(b"area code,phone number\n"), Err(ImportError::InvalidHeader)));
        assert!(matches!(
            parse_csv(b"area code,phone number,cost,extra\n"),
            Err(ImportError::InvalidHeader)
        ));
    }

    #[test]
    fn test_header_cells_are_trimmed_and_bom_stripped() {
        let rows = parse_csv(b"\xEF\xBB\xBF area code , phone number,cost \n123,5551234,2.50\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], RowOutcome::Valid { line: 2, .. }));
    }

    #[test]
    fn test_row_validation_messages() {
        let csv = b"area code,phone number,cost\n\
            12a,5551234,1.00\n\
            123,555123,1.00\n\
            123,5551234,free\n\
            123,5551234\n\
            123,5551234,1.00,extra\n\
            123 , 5551234 , 1.5 \n";
        let rows = parse_csv(csv).unwrap();

        assert_eq!(
            details(&rows),
            vec![
                "Line 2: invalid area code.",
                "Line 3: invalid phone number.",
                "Line 4: invalid cost value.",
                "Line 5: expected 3 columns, found 2.",
                "Line 6: expected 3 columns, found 4.",
            ]
        );
        match rows.last() {
            Some(RowOutcome::Valid { line, number }) => {
                assert_eq!(*line, 7);
                assert_eq!(number.cost.to_string(), "1.50");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let rows = parse_csv(b"area code,phone number,cost\n123,555\xFF234,1.00\n123,5551234,1.00\n").unwrap();
        assert_eq!(details(&rows), vec!["Line 2: unreadable row."]);
        assert_eq!(rows[1].line(), 3);
    }

    #[test]
    fn test_quoted_fields() {
        let rows = parse_csv(b"area code,phone number,cost\n\"123\",\"5551234\",\"2.50\"\n").unwrap();
        assert!(matches!(&rows[0], RowOutcome::Valid { .. }));
    }

    #[test]
    fn test_summary_message() {
        let mut summary = ImportSummary::default();
        assert_eq!(summary.message(), "CSV processed successfully.");
        summary.skip("Line 2: invalid area code.".to_string());
        assert_eq!(summary.message(), "CSV processed with some skipped rows.");
    }

    #[test]
    fn test_file_level_error_maps_to_csv_file_field() {
        let err: AppError = ImportError::Empty.into();
        match err {
            AppError::InvalidFields(fields) => assert_eq!(fields.get("csv_file"), Some("CSV file is empty.")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_blank_row_is_reported() {
        let rows = parse_csv(b"area code,phone number,cost\n123,5551234,1.00\n\n123,5551235,1.00\n").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(details(&rows), vec!["Line 3: expected 3 columns, found 0."]);
        assert_eq!(rows[2].line(), 4);
    }

    #[test]
    fn test_blank_rows_with_crlf_endings() {
        let rows = parse_csv(b"area code,phone number,cost\r\n\r\n123,5551234,1.00\r\n").unwrap();

        assert_eq!(details(&rows), vec!["Line 2: expected 3 columns, found 0."]);
        assert!(matches!(&rows[1], RowOutcome::Valid { line: 3, .. }));
    }

    #[test]
    fn test_blank_first_line_is_invalid_header() {
        assert!(matches!(
            parse_csv(b"\narea code,phone number,cost\n123,5551234,1.00\n"),
            Err(ImportError::InvalidHeader)
        ));
        assert!(matches!(parse_csv(b"\n"), Err(ImportError::InvalidHeader)));
    }

    #[test]
    fn test_trailing_newline_adds_no_row() {
        let rows = parse_csv(b"area code,phone number,cost\n123,5551234,1.00\n").unwrap();
        assert_eq!(rows.len(), 1);

        let rows = parse_csv(b"area code,phone number,cost\n123,5551234,1.00").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_quoted_newline_stays_in_one_row() {
        let rows = parse_csv(b"area code,phone number,cost\n\"12\n3\",5551234,1.00\n123,5551235,1.00\n").unwrap();

        assert_eq!(details(&rows), vec!["Line 2: invalid area code."]);
        assert!(matches!(&rows[1], RowOutcome::Valid { line: 3, .. }));
    }

    mod concurrent_writes {
        use std::sync::atomic::{AtomicU32, Ordering};

        use async_trait::async_trait;
        use phonebook_common::Pagination;
        use phonebook_errors::AppResult;

        use super::super::*;
        use crate::domain::entities::{PhoneNumber, PhoneNumberId};
        use crate::domain::value_objects::ListOrdering;
        use crate::infrastructure::persistence::InMemoryPhoneNumberRepository;

        /// 前 `remaining` 次 upsert 返回 Conflict，其余交给内存实现
        struct ConflictingRepository {
            inner: InMemoryPhoneNumberRepository,
            remaining: AtomicU32,
            upserts: AtomicU32,
        }

        impl ConflictingRepository {
            fn new(conflicts: u32) -> Self {
                Self {
                    inner: InMemoryPhoneNumberRepository::new(),
                    remaining: AtomicU32::new(conflicts),
                    upserts: AtomicU32::new(0),
                }
            }
        }

        #[async_trait]
        impl PhoneNumberRepository for ConflictingRepository {
            async fn find_by_id(&self, id: PhoneNumberId) -> AppResult<Option<PhoneNumber>> {
                self.inner.find_by_id(id).await
            }

            async fn insert(&self, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
                self.inner.insert(number).await
            }

            async fn update(&self, id: PhoneNumberId, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
                self.inner.update(id, number).await
            }

            async fn upsert(&self, number: &NewPhoneNumber) -> AppResult<UpsertOutcome> {
                self.upserts.fetch_add(1, Ordering::SeqCst);
                let conflicted = self
                    .remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if conflicted {
                    return Err(AppError::conflict("duplicate key value violates unique constraint"));
                }
                self.inner.upsert(number).await
            }

            async fn delete(&self, id: PhoneNumberId) -> AppResult<bool> {
                self.inner.delete(id).await
            }

            async fn delete_all(&self) -> AppResult<u64> {
                self.inner.delete_all().await
            }

            async fn count(&self) -> AppResult<u64> {
                self.inner.count().await
            }

            async fn list(&self, ordering: ListOrdering, pagination: &Pagination) -> AppResult<Vec<PhoneNumber>> {
                self.inner.list(ordering, pagination).await
            }

            async fn distinct_area_codes(&self) -> AppResult<Vec<AreaCode>> {
                self.inner.distinct_area_codes().await
            }

            async fn search_nearest(
                &self,
                area_code: &AreaCode,
                target: &LocalNumber,
                limit: u32,
            ) -> AppResult<Vec<PhoneNumber>> {
                self.inner.search_nearest(area_code, target, limit).await
            }
        }

        const TWO_ROWS: &[u8] = b"area code,phone number,cost\n123,5551234,1.00\n123,5551235,2.00\n";

        #[tokio::test]
        async fn test_single_conflict_is_retried() {
            let repository = Arc::new(ConflictingRepository::new(1));
            let summary = CsvImporter::new(repository.clone()).import(TWO_ROWS).await.unwrap();

            assert_eq!(summary.inserted, 2);
            assert_eq!(summary.skipped, 0);
            assert!(summary.details.is_empty());
            assert_eq!(repository.upserts.load(Ordering::SeqCst), 3);
            assert_eq!(repository.count().await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_repeated_conflict_is_reported() {
            let repository = Arc::new(ConflictingRepository::new(2));
            let summary = CsvImporter::new(repository.clone()).import(TWO_ROWS).await.unwrap();

            assert_eq!(summary.inserted, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.details, vec!["Line 2: conflicting concurrent write."]);
            assert_eq!(summary.message(), "CSV processed with some skipped rows.");
            assert_eq!(repository.count().await.unwrap(), 1);
        }
    }
}
