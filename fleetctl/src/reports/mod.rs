//! PDF reports.
//!
//! A [`Report`] is a titled table. [`render`] wraps cell text to the column widths, measures each
//! row, splits the rows into pages with [`layout::paginate`] and draws them with printpdf using the
//! built-in Helvetica faces. Every page repeats the title and column headings and carries a
//! "Page n of N" footer.

pub mod layout;

use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::models::evaluations::EvaluationSummaryResponse;
use crate::db::models::{fuel_records::FuelRecordDBResponse, trip_records::TripRecordDBResponse};
use layout::{PageLayout, page_label, paginate, wrap_text};

const TITLE_SIZE: f32 = 14.0;
const SUBTITLE_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 8.0;
/// Line advance for body text
const LINE_HEIGHT: f32 = 4.2;
const ROW_PADDING: f32 = 1.6;
/// Average Helvetica glyph width at `BODY_SIZE`, used for wrapping
const CHAR_WIDTH: f32 = 1.6;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to render PDF: {0}")]
    Pdf(String),
}

impl From<ReportError> for crate::errors::Error {
    fn from(err: ReportError) -> Self {
        crate::errors::Error::Other(anyhow::Error::new(err))
    }
}

fn pdf_error(err: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{err:?}"))
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: &'static str,
    pub width: f32,
}

impl Column {
    const fn new(title: &'static str, width: f32) -> Self {
        Self { title, width }
    }

    fn max_chars(&self) -> usize {
        ((self.width - 1.0) / CHAR_WIDTH).floor().max(1.0) as usize
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    /// Printed after the last row in bold
    pub totals: Option<Vec<String>>,
}

/// A row with its cells already wrapped
struct LaidOutRow {
    cells: Vec<Vec<String>>,
    height: f32,
    bold: bool,
}

fn lay_out(columns: &[Column], cells: &[String], bold: bool) -> LaidOutRow {
    let cells: Vec<Vec<String>> = columns
        .iter()
        .zip(cells)
        .map(|(column, text)| wrap_text(text, column.max_chars()))
        .collect();
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
    LaidOutRow {
        cells,
        height: lines as f32 * LINE_HEIGHT + ROW_PADDING,
        bold,
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn draw_header(layer: &PdfLayerReference, fonts: &Fonts, report: &Report, page: &PageLayout) {
    let top = |offset: f32| Mm(page.page_height - page.margin_top - offset);

    layer.use_text(report.title.clone(), TITLE_SIZE, Mm(page.margin_left), top(6.0), &fonts.bold);
    layer.use_text(report.subtitle.clone(), SUBTITLE_SIZE, Mm(page.margin_left), top(12.0), &fonts.regular);

    let mut x = page.margin_left;
    for column in &report.columns {
        layer.use_text(column.title, BODY_SIZE, Mm(x), top(page.header_height - 3.0), &fonts.bold);
        x += column.width;
    }
}

fn draw_row(layer: &PdfLayerReference, fonts: &Fonts, columns: &[Column], row: &LaidOutRow, page: &PageLayout, y: f32) {
    let font = if row.bold { &fonts.bold } else { &fonts.regular };
    let mut x = page.margin_left;
    for (column, lines) in columns.iter().zip(&row.cells) {
        for (i, line) in lines.iter().enumerate() {
            let baseline = y + ROW_PADDING / 2.0 + (i as f32 + 0.8) * LINE_HEIGHT;
            layer.use_text(line.clone(), BODY_SIZE, Mm(x), Mm(page.page_height - baseline), font);
        }
        x += column.width;
    }
}

/// Render `report` to PDF bytes on A4 portrait pages.
#[instrument(skip(report), fields(title = %report.title, rows = report.rows.len()), err)]
pub fn render(report: &Report) -> Result<Vec<u8>, ReportError> {
    let page = PageLayout::A4_PORTRAIT;

    let mut rows: Vec<LaidOutRow> = report.rows.iter().map(|cells| lay_out(&report.columns, cells, false)).collect();
    if let Some(totals) = &report.totals {
        rows.push(lay_out(&report.columns, totals, true));
    }
    let heights: Vec<f32> = rows.iter().map(|row| row.height).collect();
    let pages = paginate(&heights, page.content_height());
    debug!(pages = pages.len(), "Paginated report");

    let (doc, first_page, first_layer) = PdfDocument::new(&report.title, Mm(page.page_width), Mm(page.page_height), "Table");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    for (n, range) in pages.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(Mm(page.page_width), Mm(page.page_height), "Table");
            doc.get_page(page_index).get_layer(layer_index)
        };

        draw_header(&layer, &fonts, report, &page);

        let mut y = page.content_top();
        for row in &rows[range.clone()] {
            draw_row(&layer, &fonts, &report.columns, row, &page, y);
            y += row.height;
        }
        if rows.is_empty() {
            layer.use_text("No records", BODY_SIZE, Mm(page.margin_left), Mm(page.page_height - y - LINE_HEIGHT), &fonts.regular);
        }

        layer.use_text(
            page_label(n + 1, pages.len()),
            BODY_SIZE,
            Mm(page.page_width - page.margin_left - 22.0),
            Mm(page.margin_bottom),
            &fonts.regular,
        );
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    match (from, to) {
        (Some(from), Some(to)) => format!("{from} to {to}"),
        (Some(from), None) => format!("From {from}"),
        (None, Some(to)) => format!("Up to {to}"),
        (None, None) => "All dates".to_string(),
    }
}

/// Monthly subcontractor evaluation summary
pub fn evaluation_report(month: &str, max_total: i64, summaries: &[EvaluationSummaryResponse]) -> Report {
    const COLUMNS: [Column; 7] = [
        Column::new("Subcontractor", 46.0),
        Column::new("Vehicle", 26.0),
        Column::new("Trips", 14.0),
        Column::new("Total", 18.0),
        Column::new("Average", 22.0),
        Column::new("Damage", 40.0),
        Column::new("Grade", 20.0),
    ];

    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.subcontractor_name.clone(),
                s.vehicle_plate.clone(),
                s.trip_count.to_string(),
                s.total_score.to_string(),
                format!("{:.1}", s.average_score),
                format!("{} incident(s), {}", s.incidents, money(s.total_damage)),
                format!("{:?}", s.grade).to_uppercase(),
            ]
        })
        .collect();

    Report {
        title: "Subcontractor Evaluation Summary".to_string(),
        subtitle: format!("Month {month}; maximum {max_total} points per trip"),
        columns: COLUMNS.to_vec(),
        rows,
        totals: None,
    }
}

/// Fuel purchases with liters and cost totals
pub fn fuel_report(from: Option<NaiveDate>, to: Option<NaiveDate>, records: &[FuelRecordDBResponse]) -> Report {
    const COLUMNS: [Column; 7] = [
        Column::new("Date", 22.0),
        Column::new("Vehicle", 24.0),
        Column::new("Driver", 34.0),
        Column::new("Station", 40.0),
        Column::new("Liters", 20.0),
        Column::new("Price/L", 20.0),
        Column::new("Cost", 26.0),
    ];

    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.fuel_date.to_string(),
                r.vehicle_plate.clone(),
                r.driver_name.clone().unwrap_or_default(),
                r.station.clone().unwrap_or_default(),
                format!("{:.2}", r.liters),
                money(r.price_per_liter),
                money(r.total_cost),
            ]
        })
        .collect();

    let liters: f64 = records.iter().map(|r| r.liters).sum();
    let cost: f64 = records.iter().map(|r| r.total_cost).sum();

    Report {
        title: "Fuel Report".to_string(),
        subtitle: date_range(from, to),
        columns: COLUMNS.to_vec(),
        rows,
        totals: Some(vec![
            "Total".to_string(),
            String::new(),
            String::new(),
            format!("{} record(s)", records.len()),
            format!("{liters:.2}"),
            String::new(),
            money(cost),
        ]),
    }
}

/// Trips with distance and expense totals
pub fn trip_report(from: Option<NaiveDate>, to: Option<NaiveDate>, trips: &[TripRecordDBResponse]) -> Report {
    const COLUMNS: [Column; 7] = [
        Column::new("Date", 22.0),
        Column::new("Vehicle", 22.0),
        Column::new("Driver", 30.0),
        Column::new("Customer", 40.0),
        Column::new("Km", 18.0),
        Column::new("Rate", 22.0),
        Column::new("Expenses", 32.0),
    ];

    let rows = trips
        .iter()
        .map(|t| {
            vec![
                t.trip_date.to_string(),
                t.vehicle_plate.clone(),
                t.driver_name.clone(),
                t.customer_name.clone(),
                format!("{:.1}", t.distance_km),
                money(t.distance_rate),
                money(t.total_expense()),
            ]
        })
        .collect();

    let distance: f64 = trips.iter().map(|t| t.distance_km).sum();
    let rates: f64 = trips.iter().map(|t| t.distance_rate).sum();
    let expenses: f64 = trips.iter().map(TripRecordDBResponse::total_expense).sum();

    Report {
        title: "Trip Report".to_string(),
        subtitle: date_range(from, to),
        columns: COLUMNS.to_vec(),
        rows,
        totals: Some(vec![
            "Total".to_string(),
            String::new(),
            String::new(),
            format!("{} trip(s)", trips.len()),
            format!("{distance:.1}"),
            money(rates),
            money(expenses),
        ]),
    }
}
