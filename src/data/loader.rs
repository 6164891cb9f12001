use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use calamine::{Data, Range, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable, SurveyDataset};
use super::normalize::normalize;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and clean a survey file in one step.
///
/// A missing required column surfaces as a [`super::normalize::SchemaError`]
/// inside the returned `anyhow::Error`.
pub fn load_dataset(path: &Path) -> Result<SurveyDataset> {
    let raw = load_file(path)?;
    log::info!(
        "Read {} rows with columns {:?} from {}",
        raw.rows.len(),
        raw.headers,
        path.display()
    );
    let dataset = normalize(&raw)?;
    Ok(dataset)
}

/// Read a survey table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row, comma separated
/// * `.json`    – `[{ "Nationalité": "...", "Age": 34, ... }, ...]`
/// * `.parquet` – flat string / numeric columns
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_workbook(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheet")?
        .context("reading first worksheet")?;
    table_from_range(&range)
}

/// First row is the header, the rest are data rows.
fn table_from_range(range: &Range<Data>) -> Result<RawTable> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("worksheet is empty")?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for row in rows {
        table.rows.push(row.iter().map(spreadsheet_cell).collect());
    }
    Ok(table)
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`).
/// Headers are taken in first-seen order across all records.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(headers);
    for rec in records {
        let row = table
            .headers
            .iter()
            .map(|h| rec.get(h).map(json_cell).unwrap_or(CellValue::Null))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(table)
}

/// CSV cells stay text: codes such as `007` must survive untouched.
/// Ages are parsed later by [`CellValue::as_f64`].
fn csv_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
/// Every column is read; the normalizer picks the ones it needs.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = RawTable::new(headers);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&table.headers)
            .map(|(col, name)| {
                plain_column(col).with_context(|| format!("decoding parquet column '{name}'"))
            })
            .collect::<Result<Vec<ArrayRef>>>()?;
        for row in 0..batch.num_rows() {
            let cells = columns.iter().map(|col| extract_cell(col, row)).collect();
            table.rows.push(cells);
        }
    }
    Ok(table)
}

/// Cast a column to one of the types [`extract_cell`] reads.
///
/// Dictionary columns (Pandas `category`) are decoded to their value type,
/// narrow and unsigned integers widen to `Int64`.
fn plain_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Dictionary(_, value) => value.as_ref().clone(),
        DataType::Utf8View => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 => DataType::Float64,
        _ => return Ok(col.clone()),
    };
    let decoded = cast(col, &target)?;
    // A dictionary of narrow ints still needs widening.
    plain_column(&decoded)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => match any.downcast_ref::<StringArray>() {
            Some(s) => CellValue::String(s.value(row).to_string()),
            None => CellValue::Null,
        },
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => {
            log::warn!("Unsupported parquet column type {other:?}, reading as null");
            CellValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::SchemaError;
    use std::fs;

    const CSV_HEADER: &str = "Nationalité,Sexe,Projet,Région,Localité,Variété,Age\n";

    #[test]
    fn csv_loads_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        let body = format!(
            "{CSV_HEADER}\
             Sénégalaise,Homme,P1,Thiès,Mbour,\"Riz, Mil\",34\n\
             Étrangère,Femme,P2,Kolda,Kolda,Maïs,\n\
             Malienne,,P2,Kolda,Kolda,Maïs,50\n"
        );
        fs::write(&path, body).unwrap();

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[0].variety, "riz");
        assert_eq!(ds.records[1].variety, "mil");
        assert_eq!(ds.records[0].age, Some(34.0));
        assert_eq!(ds.records[2].nationality, "etranger");
        assert_eq!(ds.records[2].age, None);
    }

    #[test]
    fn json_records_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let body = r#"[
            {"Nationality": "Gambienne", "Gender": "M", "Project": "P3",
             "Region": "Kolda", "Locality": "Dabo", "Variety": "Sorgho", "Age": 61},
            {"Nationality": "Gambienne", "Gender": "femme", "Project": "P3",
             "Region": "Kolda", "Locality": "Dabo", "Variety": "Sorgho", "Age": null}
        ]"#;
        fs::write(&path, body).unwrap();

        let raw = load_file(&path).unwrap();
        assert_eq!(raw.headers.len(), 7);
        assert_eq!(raw.rows.len(), 2);

        let ds = normalize(&raw).unwrap();
        assert_eq!(ds.options(crate::data::model::Column::Gender), vec!["female", "male"]);
    }

    #[test]
    fn missing_column_reports_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        fs::write(&path, "Nationalité,Sexe,Projet,Région,Localité,Age\nx,m,p,r,l,3\n").unwrap();

        let err = load_dataset(&path).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().expect("schema error");
        assert_eq!(schema.to_string(), "missing required column 'Variety'");
    }

    #[test]
    fn csv_codes_keep_leading_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.csv");
        let body = format!(
            "{CSV_HEADER}\
             Malienne,Homme,007,Kolda,Dabo,Riz, 41.5 \n\
             Malienne,Femme,1.50,Kolda,Dabo,Riz,inconnu\n"
        );
        fs::write(&path, body).unwrap();

        let raw = load_file(&path).unwrap();
        assert_eq!(raw.cell(0, 2), &CellValue::String("007".into()));
        assert_eq!(raw.cell(1, 2), &CellValue::String("1.50".into()));

        let ds = normalize(&raw).unwrap();
        assert_eq!(ds.options(crate::data::model::Column::Project), vec!["007", "1.50"]);
        assert_eq!(ds.records[0].age, Some(41.5));
        assert_eq!(ds.records[1].age, None);
    }

    fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_string_columns_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.parquet");
        let text = |a: [Option<&str>; 2]| -> ArrayRef { Arc::new(StringArray::from(a.to_vec())) };
        write_parquet(
            &path,
            vec![
                ("Nationalité", text([Some("Sénégalaise"), Some("Étrangère")])),
                ("Sexe", text([Some("Homme"), Some("Féminin")])),
                ("Projet", text([Some("PAPSEN"), Some("ProDAC")])),
                ("Région", text([Some("Thiès"), Some("Kolda")])),
                ("Localité", text([Some("Mbour"), Some("Dabo")])),
                ("Variété", text([Some("Riz et Maïs"), None])),
                ("Age", Arc::new(Float64Array::from(vec![Some(29.0), None])) as ArrayRef),
            ],
        );

        let raw = load_file(&path).unwrap();
        assert_eq!(raw.headers[0], "Nationalité");
        assert_eq!(raw.cell(1, 5), &CellValue::Null);

        // The second row has no variety and is dropped.
        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.records.iter().all(|r| r.region == "thies"));
        assert_eq!(ds.records[0].variety, "riz");
        assert_eq!(ds.records[1].variety, "mais");
        assert_eq!(ds.records[0].age, Some(29.0));
    }

    #[test]
    fn parquet_category_columns_are_decoded() {
        use arrow::array::{DictionaryArray, UInt8Array};
        use arrow::datatypes::Int32Type;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.parquet");
        let category = |a: [&str; 2]| -> ArrayRef {
            Arc::new(a.into_iter().collect::<DictionaryArray<Int32Type>>())
        };
        write_parquet(
            &path,
            vec![
                ("Nationalité", category(["Malienne", "Malienne"])),
                ("Sexe", category(["M", "Femme"])),
                ("Projet", category(["007", "007"])),
                ("Région", category(["Fatick", "Fatick"])),
                ("Localité", category(["Gossas", "Diakhao"])),
                ("Variété", category(["Mil", "Sorgho"])),
                ("Age", Arc::new(UInt8Array::from(vec![35, 62])) as ArrayRef),
            ],
        );

        let raw = load_file(&path).unwrap();
        assert_eq!(raw.cell(0, 2), &CellValue::String("007".into()));
        assert_eq!(raw.cell(1, 6), &CellValue::Integer(62));

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].gender, "male");
        assert_eq!(ds.records[1].gender, "female");
        assert_eq!(ds.records[1].locality, "diakhao");
        assert_eq!(ds.records[0].age, Some(35.0));
    }

    #[test]
    fn spreadsheet_cells_map_to_values() {
        assert_eq!(spreadsheet_cell(&Data::Empty), CellValue::Null);
        assert_eq!(spreadsheet_cell(&Data::String("  ".into())), CellValue::Null);
        assert_eq!(
            spreadsheet_cell(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Null
        );
        assert_eq!(spreadsheet_cell(&Data::Float(41.0)).as_f64(), Some(41.0));
        assert_eq!(spreadsheet_cell(&Data::Int(7)), CellValue::Integer(7));
        assert_eq!(
            spreadsheet_cell(&Data::String("Thiès".into())),
            CellValue::String("Thiès".into())
        );
    }

    #[test]
    fn worksheet_range_becomes_table() {
        let header = ["Nationalité", "Sexe", "Projet", "Région", "Localité", "Variété", "Age"];
        let row = ["Gambienne", "masculin", "P3", "Kolda", "Dabo", "Riz, Mil"];
        let mut range = Range::new((0, 0), (1, 6));
        for (c, h) in header.iter().enumerate() {
            range.set_value((0, c as u32), Data::String(h.to_string()));
        }
        for (c, v) in row.iter().enumerate() {
            range.set_value((1, c as u32), Data::String(v.to_string()));
        }
        range.set_value((1, 6), Data::Float(44.0));

        let raw = table_from_range(&range).unwrap();
        assert_eq!(raw.headers[5], "Variété");
        assert_eq!(raw.rows.len(), 1);

        let ds = normalize(&raw).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].gender, "male");
        assert_eq!(ds.records[1].age, Some(44.0));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("survey.txt")).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }
}
