use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use ratatui::style::Stylize;
use ratatui::text::{Line, Text};

use crate::domain::TableError;
use crate::model::{CellValue, ColumnDef};

/// Cells added to a column's content width when it is fitted to its data.
pub const COLUMN_WIDTH_MARGIN: usize = 1;

static EMPTY_CELL: CellValue = CellValue::Empty;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One row of a loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    /// The record as one CSV line, quoting cells where needed.
    pub fn as_csv_line(&self) -> String {
        self.cells
            .iter()
            .map(|c| match c {
                CellValue::Empty => String::new(),
                c => wrap_cell_content(&c.to_string()),
            })
            .collect::<Vec<String>>()
            .join(",")
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.chars().any(|c| c == '"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',' || c == '"');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

struct LoadedColumn {
    name: String,
    max_width: usize,
    values: Vec<CellValue>,
}

/// A tabular file loaded into memory as rows.
#[derive(Debug)]
pub struct DataSet {
    pub name: String,
    headers: Arc<Vec<String>>,
    max_widths: Vec<usize>,
    rows: Vec<Record>,
}

impl DataSet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Record>) -> Self {
        let max_widths = (0..headers.len())
            .map(|idx| {
                rows.iter()
                    .map(|r| r.get(idx).to_string().chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        Self {
            name: name.into(),
            headers: Arc::new(headers),
            max_widths,
            rows,
        }
    }

    #[instrument]
    pub fn load(path: PathBuf) -> Result<Self, TableError> {
        let file_info = Self::get_file_info(path)?;
        debug!("Loading {:?} ({} bytes)", file_info.path, file_info.file_size);
        let frame = match file_info.file_type {
            FileType::CSV => Self::load_csv(&file_info.path)?,
            FileType::PARQUET => Self::load_parquet(&file_info.path)?,
            FileType::ARROW => Self::load_arrow(&file_info.path)?,
        };

        // Each column is converted in its own rayon task
        let start_time = Instant::now();
        let df = Arc::new(frame.collect()?);
        let columns: Result<Vec<LoadedColumn>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect();
        let columns = columns?;

        let nrows = df.height();
        let mut rows = (0..nrows)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect::<Vec<Vec<CellValue>>>();
        let mut headers = Vec::with_capacity(columns.len());
        let mut max_widths = Vec::with_capacity(columns.len());
        for column in columns {
            for (row, value) in rows.iter_mut().zip(column.values) {
                row.push(value);
            }
            headers.push(column.name);
            max_widths.push(column.max_width);
        }
        info!(
            "Loading {} rows x {} columns took {}ms ...",
            nrows,
            headers.len(),
            start_time.elapsed().as_millis()
        );

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Self {
            name,
            headers: Arc::new(headers),
            max_widths,
            rows: rows.into_iter().map(Record::new).collect(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    /// One column per header. With `fit_to` each column gets a width hint
    /// from its content, capped at `fit_to` cells.
    pub fn columns(&self, fit_to: Option<usize>) -> Vec<ColumnDef<Record>> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let column = ColumnDef::new(name.clone(), name.clone(), move |r: &Record| {
                    r.get(idx).clone()
                });
                match fit_to {
                    Some(max_column_width) => {
                        let content = std::cmp::max(name.chars().count(), self.max_widths[idx]);
                        column.width(std::cmp::min(
                            content + COLUMN_WIDTH_MARGIN,
                            max_column_width,
                        ))
                    }
                    None => column,
                }
            })
            .collect()
    }

    /// Detail panel listing every field of a record, one per line.
    pub fn record_view(&self) -> Box<dyn Fn(&Record) -> Text<'static>> {
        let headers = Arc::clone(&self.headers);
        Box::new(move |record: &Record| {
            let header_width = headers.iter().map(|h| h.chars().count()).max().unwrap_or(0);
            let lines = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    Line::from(vec![
                        format!("{header:>header_width$}: ").bold(),
                        record.get(idx).to_string().into(),
                    ])
                })
                .collect::<Vec<Line>>();
            Text::from(lines)
        })
    }

    fn is_integer_type(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    fn is_numeric_type(dtype: &DataType) -> bool {
        Self::is_integer_type(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
    }

    /// Whether every value of an integer column fits into an i64.
    fn fits_i64(column: &Column) -> Result<bool, PolarsError> {
        if column.dtype() != &DataType::UInt64 {
            return Ok(true);
        }
        Ok(column
            .u64()?
            .max()
            .is_none_or(|max| max <= i64::MAX as u64))
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
        let column = df.column(col_name)?;
        let mut values = Vec::with_capacity(column.len());

        if Self::is_integer_type(column.dtype()) && Self::fits_i64(column)? {
            let col = column.cast(&DataType::Int64)?;
            for value in col.i64()?.into_iter() {
                values.push(CellValue::from(value));
            }
        } else if Self::is_numeric_type(column.dtype()) {
            let col = column.cast(&DataType::Float64)?;
            for value in col.f64()?.into_iter() {
                values.push(CellValue::from(value));
            }
        } else {
            let col = column.cast(&DataType::String)?;
            for value in col.str()?.into_iter() {
                values.push(CellValue::from(
                    value.map(|s| s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                ));
            }
        }

        let max_width = values
            .iter()
            .map(|v| v.to_string().chars().count())
            .max()
            .unwrap_or(0);

        Ok(LoadedColumn {
            name: col_name.to_string(),
            max_width,
            values,
        })
    }

    fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(TableError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, TableError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TableError::FileNotFound,
            ErrorKind::PermissionDenied => TableError::PermissionDenied,
            _ => TableError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(TableError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Self::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}
