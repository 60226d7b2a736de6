//! Flattening of report lists into the two download artifacts: a paginated
//! PDF table and a single-sheet workbook.

use std::fmt;
use std::path::PathBuf;

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::style::{Color, Style};
use genpdf::Element as _;
use rust_xlsxwriter::Workbook;
use thiserror::Error;

use crate::models::InstitutionReport;

pub const PDF_FILE_NAME: &str = "laporan_padaelo.pdf";
pub const XLSX_FILE_NAME: &str = "laporan_padaelo.xlsx";
pub const PDF_TITLE: &str = "Laporan Lembaga Pendidikan Al Qur'an - Kemenag Gowa";
pub const SHEET_NAME: &str = "Laporan";

pub const DOCUMENT_COLUMNS: [&str; 11] = [
    "ID",
    "Jenis",
    "Nama Lembaga",
    "Alamat",
    "Operator",
    "Pembina",
    "Telepon",
    "Izin",
    "Santri L",
    "Santri P",
    "Bulan",
];

pub const SPREADSHEET_COLUMNS: [&str; 12] = [
    "ID Laporan",
    "Jenis Lembaga",
    "Nama Lembaga",
    "Alamat",
    "Nama Operator",
    "Nama Pembina",
    "No. HP/WA",
    "No. Izin Operasional",
    "Santri Laki-laki",
    "Santri Perempuan",
    "Total Santri",
    "Bulan Laporan",
];

/// Minimum spreadsheet column width, in characters.
pub const MIN_COLUMN_WIDTH: usize = 10;

const DOCUMENT_COLUMN_WEIGHTS: [usize; 11] = [3, 3, 4, 5, 3, 3, 3, 4, 1, 1, 2];
const KEMENAG_GREEN: Color = Color::Rgb(0, 100, 0);

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot load font family '{family}' from {dir}: {source}")]
    Font {
        family: String,
        dir: String,
        #[source]
        source: genpdf::error::Error,
    },
    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),
    #[error("spreadsheet writing failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Number(i64),
    Text(String),
}

impl Cell {
    fn char_len(&self) -> usize {
        match self {
            Cell::Number(n) => n.to_string().len(),
            Cell::Text(s) => s.chars().count(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTable {
    pub header: [&'static str; 11],
    pub rows: Vec<Vec<Cell>>,
}

/// One body row per report, in input order, values taken verbatim.
pub fn document_table(reports: &[InstitutionReport]) -> DocumentTable {
    let rows = reports
        .iter()
        .map(|r| {
            vec![
                Cell::Number(r.id),
                text(r.institution_type.label()),
                text(&r.institution_name),
                text(&r.address),
                text(&r.operator_name),
                text(&r.supervisor_name),
                text(&r.phone),
                text(&r.permit_number),
                Cell::Number(i64::from(r.male_students)),
                Cell::Number(i64::from(r.female_students)),
                text(&r.report_month),
            ]
        })
        .collect();
    DocumentTable { header: DOCUMENT_COLUMNS, rows }
}

/// A report as one spreadsheet record, including the derived total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRow {
    pub id: i64,
    pub institution_type: String,
    pub institution_name: String,
    pub address: String,
    pub operator_name: String,
    pub supervisor_name: String,
    pub phone: String,
    pub permit_number: String,
    pub male_students: u32,
    pub female_students: u32,
    pub total_students: u64,
    pub report_month: String,
}

impl SpreadsheetRow {
    /// Cells in [`SPREADSHEET_COLUMNS`] order.
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Number(self.id),
            text(&self.institution_type),
            text(&self.institution_name),
            text(&self.address),
            text(&self.operator_name),
            text(&self.supervisor_name),
            text(&self.phone),
            text(&self.permit_number),
            Cell::Number(i64::from(self.male_students)),
            Cell::Number(i64::from(self.female_students)),
            Cell::Number(i64::try_from(self.total_students).unwrap_or(i64::MAX)),
            text(&self.report_month),
        ]
    }
}

impl From<&InstitutionReport> for SpreadsheetRow {
    fn from(r: &InstitutionReport) -> Self {
        SpreadsheetRow {
            id: r.id,
            institution_type: r.institution_type.label().to_string(),
            institution_name: r.institution_name.clone(),
            address: r.address.clone(),
            operator_name: r.operator_name.clone(),
            supervisor_name: r.supervisor_name.clone(),
            phone: r.phone.clone(),
            permit_number: r.permit_number.clone(),
            male_students: r.male_students,
            female_students: r.female_students,
            total_students: r.total_students(),
            report_month: r.report_month.clone(),
        }
    }
}

pub fn spreadsheet_rows(reports: &[InstitutionReport]) -> Vec<SpreadsheetRow> {
    reports.iter().map(SpreadsheetRow::from).collect()
}

/// Longest cell value across every row, never below [`MIN_COLUMN_WIDTH`].
/// Applied uniformly to all columns.
pub fn column_width(rows: &[SpreadsheetRow]) -> usize {
    rows.iter()
        .flat_map(|r| r.cells())
        .map(|c| c.char_len())
        .fold(MIN_COLUMN_WIDTH, usize::max)
}

/// Where the PDF renderer finds its TrueType font family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub dir: PathBuf,
    pub family: String,
}

impl FontSource {
    fn load(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ExportError> {
        genpdf::fonts::from_files(&self.dir, &self.family, None).map_err(|source| ExportError::Font {
            family: self.family.clone(),
            dir: self.dir.display().to_string(),
            source,
        })
    }
}

/// Renders the table as a landscape A4 document with the office title on
/// every page.
pub fn render_pdf(table: &DocumentTable, fonts: &FontSource) -> Result<Vec<u8>, ExportError> {
    let mut doc = genpdf::Document::new(fonts.load()?);
    doc.set_title(PDF_TITLE);
    doc.set_font_size(8);
    let a4 = genpdf::Size::from(genpdf::PaperSize::A4);
    doc.set_paper_size(genpdf::Size::new(a4.height, a4.width));

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    decorator.set_header(|_page| {
        let mut layout = LinearLayout::vertical();
        layout.push(Paragraph::new(PDF_TITLE).styled(Style::new().bold().with_font_size(11)));
        layout.push(Break::new(1));
        layout
    });
    doc.set_page_decorator(decorator);

    let mut layout = TableLayout::new(DOCUMENT_COLUMN_WEIGHTS.to_vec());
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let head_style = Style::new().bold().with_color(KEMENAG_GREEN);
    let mut head = layout.row();
    for label in table.header {
        head = head.element(Paragraph::new(label).styled(head_style).padded(1));
    }
    head.push()?;

    for cells in &table.rows {
        let mut row = layout.row();
        for cell in cells {
            row = row.element(Paragraph::new(cell.to_string()).padded(1));
        }
        row.push()?;
    }
    doc.push(layout);

    let mut out = Vec::new();
    doc.render(&mut out)?;
    Ok(out)
}

/// Writes the rows to the "Laporan" sheet. With no rows the sheet stays empty.
pub fn render_xlsx(rows: &[SpreadsheetRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    if !rows.is_empty() {
        for (col, label) in SPREADSHEET_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *label)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.cells().into_iter().enumerate() {
                match cell {
                    Cell::Number(n) => sheet.write_number(r, col as u16, n as f64)?,
                    Cell::Text(s) => sheet.write_string(r, col as u16, s)?,
                };
            }
        }
        let width = column_width(rows) as f64;
        for col in 0..SPREADSHEET_COLUMNS.len() {
            sheet.set_column_width(col as u16, width)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstitutionType, ReportDraft};

    fn report(id: i64, name: &str, male: u32, female: u32) -> InstitutionReport {
        ReportDraft {
            institution_type: InstitutionType::Mdt,
            institution_name: name.into(),
            address: "Jl. A".into(),
            operator_name: "Budi".into(),
            supervisor_name: "Siti".into(),
            phone: "0812".into(),
            permit_number: "001".into(),
            male_students: male,
            female_students: female,
            report_month: "2024-05".into(),
        }
        .into_report(id)
    }

    #[test]
    fn document_table_keeps_input_order_and_literal_values() {
        let table = document_table(&[report(2, "B", 1, 2), report(1, "A", 3, 4)]);
        assert_eq!(table.header[0], "ID");
        assert_eq!(table.header.len(), 11);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Number(2));
        assert_eq!(table.rows[0][1], Cell::Text("Madrasah Diniyah Takmiliyah (MDT)".into()));
        assert_eq!(table.rows[1][2], Cell::Text("A".into()));
        assert_eq!(table.rows[1][8], Cell::Number(3));
        assert_eq!(table.rows[1][10], Cell::Text("2024-05".into()));
    }

    #[test]
    fn empty_input_gives_header_only_table() {
        let table = document_table(&[]);
        assert_eq!(table.header, DOCUMENT_COLUMNS);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn spreadsheet_total_is_sum_of_counts() {
        let rows = spreadsheet_rows(&[report(1, "A", 10, 8), report(2, "B", 0, 0)]);
        assert_eq!(rows[0].total_students, 18);
        assert_eq!(rows[0].cells()[10], Cell::Number(18));
        assert_eq!(rows[1].total_students, 0);
        assert_eq!(rows[0].cells().len(), SPREADSHEET_COLUMNS.len());
    }

    #[test]
    fn column_width_is_longest_value_with_floor() {
        assert_eq!(column_width(&[]), MIN_COLUMN_WIDTH);
        let rows = spreadsheet_rows(&[report(1, "A", 1, 1)]);
        // the type label is the longest value
        assert_eq!(column_width(&rows), "Madrasah Diniyah Takmiliyah (MDT)".len());
    }

    #[test]
    fn column_width_counts_chars_not_bytes() {
        let mut r = report(1, "A", 1, 1);
        r.institution_type = InstitutionType::Tpq;
        r.address = "é".repeat(12);
        assert_eq!(column_width(&spreadsheet_rows(&[r])), 12);
    }

    #[test]
    fn xlsx_is_a_zip_container_even_when_empty() {
        let empty = render_xlsx(&[]).unwrap();
        assert_eq!(&empty[..2], b"PK");
        let full = render_xlsx(&spreadsheet_rows(&[report(1, "A", 1, 2)])).unwrap();
        assert_eq!(&full[..2], b"PK");
    }

    fn bundled_fonts() -> FontSource {
        FontSource { dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts")), family: "DejaVuSans".into() }
    }

    // page dictionaries are written uncompressed as `/Type/Page`
    fn page_count(pdf: &[u8]) -> usize {
        let tag = b"/Type/Page";
        pdf.windows(tag.len() + 1).filter(|w| &w[..tag.len()] == tag && w[tag.len()] != b's').count()
    }

    #[test]
    fn pdf_renders_header_only_table_for_empty_input() {
        let bytes = render_pdf(&document_table(&[]), &bundled_fonts()).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn pdf_spreads_long_tables_over_several_pages() {
        let reports: Vec<_> = (0..300).map(|i| report(i, &format!("TPQ Nomor {i}"), 10, 12)).collect();
        let one_page = render_pdf(&document_table(&reports[..1]), &bundled_fonts()).unwrap();
        let many = render_pdf(&document_table(&reports), &bundled_fonts()).unwrap();
        assert_eq!(&many[..4], b"%PDF");
        assert!(many.len() > one_page.len());
        assert_eq!(page_count(&one_page), 1);
        assert!(page_count(&many) > 1);
    }

    #[test]
    fn pdf_without_fonts_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontSource { dir: dir.path().to_path_buf(), family: "DejaVuSans".into() };
        let err = render_pdf(&document_table(&[]), &fonts).unwrap_err();
        assert!(matches!(err, ExportError::Font { .. }));
    }
}
