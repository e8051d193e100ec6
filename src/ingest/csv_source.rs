/// CSV exports as a bulk import source.
///
/// The first line is the header row. Field sheets exported from Turkish
/// locale spreadsheets use `;` as the separator, so the delimiter is
/// picked from the header line unless one is given.

use super::tabular::{import_rows, ImportSummary, TabularRow};
use crate::model::NestError;
use crate::store::RecordStore;
use std::fs;
use std::path::Path;

/// Picks `;` when the header line has more semicolons than commas.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

/// Reads CSV text into rows. A short row simply lacks its trailing
/// columns; blank lines are skipped.
pub fn read_rows(text: &str, delimiter: u8) -> Result<Vec<TabularRow>, NestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(TabularRow::from_pairs(headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

/// Reads a CSV file, sniffing its delimiter.
pub fn read_path(path: &Path) -> Result<Vec<TabularRow>, NestError> {
    let text = fs::read_to_string(path)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    read_rows(text, sniff_delimiter(text))
}

/// Imports a CSV file into the store.
pub fn import_path<S>(store: &mut S, path: &Path) -> Result<ImportSummary, NestError>
where
    S: RecordStore + ?Sized,
{
    let rows = read_path(path)?;
    import_rows(store, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NestKey;
    use crate::store::MemoryStore;
    use std::io::Write;

    const SHEET: &str = "\
Yuva Sıra No;Yuva Tarihi;Toplam Yumurta Sayısı;Yuva İçi Canlı Yavru;Predasyon Durumu
1;01.06.2024;100;80;yok
2;15.06.2024;90;;tam
3;2024-13-01;70;10;
";

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(SHEET), b';');
        assert_eq!(sniff_delimiter("id,yuva_tarihi\n1,2024-06-01\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_read_rows_normalizes_headers() {
        let rows = read_rows(SHEET, b';').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("yuva_sira_no"), Some("1"));
        assert_eq!(rows[1].get("Predasyon Durumu"), Some("tam"));
    }

    #[test]
    fn test_import_path_reports_bad_date_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yuvalar.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all("\u{feff}".as_bytes()).unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();
        drop(file);

        let mut store = MemoryStore::new();
        let summary = import_path(&mut store, &path).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.malformed, 1);
        assert_eq!(store.get(NestKey::new(1, 2024)).unwrap().success_rate, Some(80.0));
        assert_eq!(store.get(NestKey::new(2, 2024)).unwrap().success_rate, None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_path(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(NestError::Io(_))));
    }
}
