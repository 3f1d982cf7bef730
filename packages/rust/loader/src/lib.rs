//! Spreadsheet ingestion: reads tower identities (CID, LAC) from a workbook.
//!
//! The first worksheet is read; its first row is a header and is skipped.
//! Every following row must carry the CID in column A and the LAC in column B.
//! Any workbook format `calamine` understands (xlsx, xlsm, xlsb, xls, ods) is accepted.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, info, instrument};

use towermap_shared::{Result, TowerMapError, TowerRecord};

/// Column holding the cell ID (0-based).
const CID_COLUMN: usize = 0;

/// Column holding the location area code (0-based).
const LAC_COLUMN: usize = 1;

/// Load all tower records from the first worksheet of `path`, in row order.
///
/// Fails with [`TowerMapError::Load`] if the file cannot be opened or parsed,
/// if the workbook has no worksheet, or if any data row lacks a valid CID or LAC.
/// Rows whose cells are all empty are ignored.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<TowerRecord>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| TowerMapError::load(path, format!("cannot open workbook: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TowerMapError::load(path, "workbook has no worksheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| TowerMapError::load(path, format!("cannot read sheet '{sheet_name}': {e}")))?;

    // Spreadsheet row number (1-based) of the first row in the used range.
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let records = parse_rows(range.rows(), first_row)
        .map_err(|message| TowerMapError::load(path, message))?;

    info!(sheet = %sheet_name, records = records.len(), "tower records loaded");
    Ok(records)
}

/// Convert worksheet rows (header included) into tower records.
///
/// `first_row` is the 1-based spreadsheet row number of the header, used in
/// error messages.
fn parse_rows<'a, I>(rows: I, first_row: usize) -> std::result::Result<Vec<TowerRecord>, String>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut records = Vec::new();

    for (idx, row) in rows.into_iter().enumerate().skip(1) {
        let row_number = first_row + idx;

        if row.iter().all(is_blank) {
            debug!(row = row_number, "skipping blank row");
            continue;
        }

        let cid = cell_to_integer(row.get(CID_COLUMN))
            .map_err(|e| format!("row {row_number}: invalid CID: {e}"))?
            .ok_or_else(|| format!("row {row_number}: missing CID"))?;

        let lac = cell_to_integer(row.get(LAC_COLUMN))
            .map_err(|e| format!("row {row_number}: invalid LAC: {e}"))?
            .ok_or_else(|| format!("row {row_number}: missing LAC"))?;

        let lac = u32::try_from(lac)
            .map_err(|_| format!("row {row_number}: LAC {lac} is out of range"))?;

        records.push(TowerRecord::new(cid, lac));
    }

    Ok(records)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Read a cell as a non-negative integer. `Ok(None)` means the cell is empty.
fn cell_to_integer(cell: Option<&Data>) -> std::result::Result<Option<u64>, String> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Int(n)) => u64::try_from(*n)
            .map(Some)
            .map_err(|_| format!("{n} is negative")),
        Some(Data::Float(f)) => float_to_integer(*f).map(Some),
        Some(Data::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = s.parse::<u64>() {
                return Ok(Some(n));
            }
            s.parse::<f64>()
                .map_err(|_| format!("'{s}' is not a number"))
                .and_then(float_to_integer)
                .map(Some)
        }
        Some(other) => Err(format!("unsupported cell value {other:?}")),
    }
}

fn float_to_integer(f: f64) -> std::result::Result<u64, String> {
    if !f.is_finite() || f.fract() != 0.0 || f < 0.0 || f > u64::MAX as f64 {
        return Err(format!("{f} is not a non-negative whole number"));
    }
    Ok(f as u64)
}
