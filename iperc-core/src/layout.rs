//! Report layout: turns one evaluation record into positioned draw commands
//!
//! Global invariants enforced:
//! - Every input row is drawn exactly once, in input order
//! - A row never straddles a page break: the break happens before the row
//!   (a row taller than a whole page is drawn alone and overflows)
//! - A continuation page leaves out the repeated header row when the header
//!   is the only thing keeping the next row from fitting
//! - Row heights are measured with the same `TextStyle` and box width the
//!   encoder draws with
//! - Coordinates use a top-left origin in PDF points
//!
//! Table schema (column widths are configurable, see `TableSchema`):
//!
//! | N° | Actividad | Peligro | Consecuencia | Medidas Existentes | P | S | Mr | Medidas a Implementar | Responsable |

use crate::error::RecordError;
use crate::font::{Align, TextStyle};
use crate::record::{EvaluationRecord, HazardRow};
use crate::risk::RiskLevel;
use serde::Serialize;

pub const REPORT_TITLE: &str =
    "MATRIZ DE IDENTIFICACIÓN DE PELIGROS Y EVALUACIÓN DE RIESGOS (IPERC)";
pub const REPORT_SUBTITLE: &str = "Según Normativa Peruana - MTPE";
pub const LEGEND_TITLE: &str = "LEYENDA DE VALORACIÓN DE RIESGOS";

/// Height of the column header row
pub const HEADER_ROW_HEIGHT: f64 = 25.0;
/// Vertical offset of the header titles inside the header row
const HEADER_TEXT_OFFSET: f64 = 8.0;
/// Total vertical padding added to the tallest cell of a row
pub const CELL_PADDING: f64 = 6.0;
/// Horizontal inset of cell text on each side
pub const CELL_INSET: f64 = 2.0;
/// Font size of header titles and body cells
pub const BODY_FONT_SIZE: f64 = 7.0;

const LEGEND_WIDTH: f64 = 600.0;
const LEGEND_SLOT: f64 = 150.0;
const LEGEND_SWATCH: f64 = 15.0;
const LEGEND_TEXT_GAP: f64 = 20.0;
const LEGEND_TEXT_WIDTH: f64 = 120.0;
const LEGEND_LINE_OFFSET: f64 = 8.0;
const LEGEND_FONT_SIZE: f64 = 8.0;

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const HEADER_FILL: Color = Color {
        r: 0xe0,
        g: 0xe0,
        b: 0xe0,
    };
    /// Fill for magnitudes outside every defined band
    pub const NEUTRAL: Color = Color {
        r: 0xcc,
        g: 0xcc,
        b: 0xcc,
    };

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Color> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to 0.0..=1.0
    pub fn unit_rgb(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

/// Page size and margins, in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
}

impl PageGeometry {
    /// A4 landscape with the report margins (top/bottom 40, left/right 30)
    pub const A4_LANDSCAPE: PageGeometry = PageGeometry {
        width: 841.89,
        height: 595.28,
        margin_top: 40.0,
        margin_bottom: 40.0,
        margin_left: 30.0,
        margin_right: 30.0,
    };

    pub fn content_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest y a row may reach
    pub fn printable_bottom(&self) -> f64 {
        self.height - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4_LANDSCAPE
    }
}

/// Which value a table column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    Number,
    Activity,
    Hazard,
    Consequence,
    ExistingControls,
    Probability,
    Severity,
    Magnitude,
    NewControls,
    Responsible,
}

impl ColumnKind {
    /// Text shown for `row` (1-based `number`) in this column
    pub fn cell_text(&self, row: &HazardRow, number: usize) -> String {
        match self {
            ColumnKind::Number => number.to_string(),
            ColumnKind::Activity => row.activity().to_string(),
            ColumnKind::Hazard => row.hazard().to_string(),
            ColumnKind::Consequence => row.consequence().to_string(),
            ColumnKind::ExistingControls => row.existing_controls().unwrap_or("").to_string(),
            ColumnKind::Probability => row.probability().to_string(),
            ColumnKind::Severity => row.severity().to_string(),
            ColumnKind::Magnitude => row.magnitude().to_string(),
            ColumnKind::NewControls => row.new_controls().unwrap_or("").to_string(),
            ColumnKind::Responsible => row.responsible().unwrap_or("").to_string(),
        }
    }

    /// Style used to both measure and draw body cells of this column
    pub fn cell_style(&self) -> TextStyle {
        match self {
            ColumnKind::Magnitude => TextStyle::bold(BODY_FONT_SIZE).centered().single_line(),
            ColumnKind::Number | ColumnKind::Probability | ColumnKind::Severity => {
                TextStyle::regular(BODY_FONT_SIZE).centered()
            }
            _ => TextStyle::regular(BODY_FONT_SIZE),
        }
    }
}

/// One column of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub title: &'static str,
    pub width: f64,
}

impl ColumnSpec {
    /// Width available to the cell text
    pub fn text_width(&self) -> f64 {
        self.width - 2.0 * CELL_INSET
    }
}

/// Ordered table columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// The IPERC matrix columns with their standard widths
    pub fn iperc() -> Self {
        let columns = [
            (ColumnKind::Number, "N°", 25.0),
            (ColumnKind::Activity, "Actividad", 90.0),
            (ColumnKind::Hazard, "Peligro", 90.0),
            (ColumnKind::Consequence, "Consecuencia", 110.0),
            (ColumnKind::ExistingControls, "Medidas Existentes", 85.0),
            (ColumnKind::Probability, "P", 20.0),
            (ColumnKind::Severity, "S", 20.0),
            (ColumnKind::Magnitude, "Mr", 30.0),
            (ColumnKind::NewControls, "Medidas a Implementar", 90.0),
            (ColumnKind::Responsible, "Responsable", 75.0),
        ]
        .into_iter()
        .map(|(kind, title, width)| ColumnSpec { kind, title, width })
        .collect();
        TableSchema { columns }
    }

    /// Standard columns with replacement widths (same count and order)
    pub fn with_widths(widths: &[f64]) -> Result<Self, String> {
        let mut schema = TableSchema::iperc();
        if widths.len() != schema.columns.len() {
            return Err(format!(
                "expected {} column widths (got {})",
                schema.columns.len(),
                widths.len()
            ));
        }
        for (column, &width) in schema.columns.iter_mut().zip(widths) {
            if !width.is_finite() || width <= 2.0 * CELL_INSET {
                return Err(format!(
                    "column `{}` width must be greater than {} (got {})",
                    column.title,
                    2.0 * CELL_INSET,
                    width
                ));
            }
            column.width = width;
        }
        Ok(schema)
    }

    pub fn total_width(&self) -> f64 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.width).collect()
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        TableSchema::iperc()
    }
}

/// Layout parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOptions {
    pub page: PageGeometry,
    pub schema: TableSchema,
    /// Draw the column header row again at the top of continuation pages
    pub repeat_header: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            page: PageGeometry::A4_LANDSCAPE,
            schema: TableSchema::iperc(),
            repeat_header: true,
        }
    }
}

/// What a text command represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextRole {
    Title,
    Subtitle,
    RecordInfo,
    ColumnHeader,
    Cell { row: usize, column: ColumnKind },
    LegendTitle,
    LegendLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectCommand {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
}

/// Text drawn in a box starting at (`x`, `y`) with the given width
///
/// `y` is the top of the first line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCommand {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub text: String,
    pub style: TextStyle,
    pub color: Color,
    pub role: TextRole,
}

impl TextCommand {
    /// Lines exactly as the encoder will draw them
    pub fn lines(&self) -> Vec<String> {
        self.style.lines(&self.text, self.width)
    }

    /// Horizontal start of a drawn line, honoring alignment
    pub fn line_x(&self, line: &str) -> f64 {
        match self.style.align {
            Align::Left => self.x,
            Align::Center => self.x + (self.width - self.style.width_of(line)) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Rect(RectCommand),
    Text(TextCommand),
}

/// One output page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub commands: Vec<DrawCommand>,
}

impl Page {
    fn new(number: usize) -> Self {
        Page {
            number,
            commands: Vec::new(),
        }
    }

    /// Row numbers read back from the N° cells drawn on this page
    pub fn row_numbers(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text(text) => match text.role {
                    TextRole::Cell {
                        column: ColumnKind::Number,
                        ..
                    } => text.text.parse().ok(),
                    _ => None,
                },
                DrawCommand::Rect(_) => None,
            })
            .collect()
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            DrawCommand::Rect(_) => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &RectCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Rect(rect) => Some(rect),
            DrawCommand::Text(_) => None,
        })
    }
}

/// Where a body row ended up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowPlacement {
    /// 1-based row number (the N° column)
    pub number: usize,
    /// 0-based page index
    pub page: usize,
    pub y: f64,
    pub height: f64,
}

/// Complete layout of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub page: PageGeometry,
    pub pages: Vec<Page>,
    pub placements: Vec<RowPlacement>,
}

impl ReportLayout {
    /// Row numbers across all pages, in drawing order
    pub fn row_numbers(&self) -> Vec<usize> {
        self.pages.iter().flat_map(Page::row_numbers).collect()
    }
}

/// Lay out a record as pages of draw commands
///
/// Rejects records with no rows or an empty header before any layout work.
pub fn layout(
    record: &EvaluationRecord,
    options: &LayoutOptions,
) -> Result<ReportLayout, RecordError> {
    record.validate()?;

    let mut composer = Composer::new(options);
    draw_page_header(&mut composer, record);
    draw_table_header(&mut composer);

    for (idx, row) in record.rows.iter().enumerate() {
        let number = idx + 1;
        let cells = measure_row(row, number, &options.schema);

        let bottom = options.page.printable_bottom();
        if composer.cursor + cells.height > bottom {
            let fits_empty_page = options.page.margin_top + cells.height <= bottom;
            if composer.page_has_rows() || fits_empty_page {
                log::debug!(
                    "page break before row {} (cursor {:.2}, row height {:.2})",
                    number,
                    composer.cursor,
                    cells.height
                );
                composer.start_page();
                if options.repeat_header {
                    let fits_under_header =
                        composer.cursor + HEADER_ROW_HEIGHT + cells.height <= bottom;
                    if fits_under_header || !fits_empty_page {
                        draw_table_header(&mut composer);
                    } else {
                        log::debug!("header row left out above row {}", number);
                    }
                }
            }
        }

        if composer.cursor + cells.height > bottom {
            log::warn!(
                "row {} is {:.1} units tall and overflows an empty page",
                number,
                cells.height
            );
        }

        draw_row(&mut composer, row, number, &cells);
    }

    draw_legend(&mut composer);

    Ok(composer.finish())
}

/// Measured cell texts of one row
struct MeasuredRow {
    texts: Vec<String>,
    height: f64,
}

fn measure_row(row: &HazardRow, number: usize, schema: &TableSchema) -> MeasuredRow {
    let texts: Vec<String> = schema
        .columns
        .iter()
        .map(|column| column.kind.cell_text(row, number))
        .collect();

    let tallest = schema
        .columns
        .iter()
        .zip(&texts)
        .map(|(column, text)| column.kind.cell_style().height_of(text, column.text_width()))
        .fold(0.0, f64::max);

    MeasuredRow {
        texts,
        height: tallest + CELL_PADDING,
    }
}

/// Accumulates pages and tracks the vertical cursor
struct Composer<'a> {
    options: &'a LayoutOptions,
    done: Vec<Page>,
    page: Page,
    cursor: f64,
    placements: Vec<RowPlacement>,
}

impl<'a> Composer<'a> {
    fn new(options: &'a LayoutOptions) -> Self {
        Composer {
            options,
            done: Vec::new(),
            page: Page::new(1),
            cursor: options.page.margin_top,
            placements: Vec::new(),
        }
    }

    fn start_page(&mut self) {
        let next = Page::new(self.page.number + 1);
        self.done.push(std::mem::replace(&mut self.page, next));
        self.cursor = self.options.page.margin_top;
    }

    fn page_index(&self) -> usize {
        self.done.len()
    }

    /// True once a body row has been drawn on the current page
    fn page_has_rows(&self) -> bool {
        self.placements
            .last()
            .is_some_and(|p| p.page == self.page_index())
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Option<Color>) {
        self.page.commands.push(DrawCommand::Rect(RectCommand {
            x,
            y,
            width,
            height,
            fill,
            stroke: Some(Color::BLACK),
        }));
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        text: String,
        style: TextStyle,
        color: Color,
        role: TextRole,
    ) {
        self.page.commands.push(DrawCommand::Text(TextCommand {
            x,
            y,
            width,
            text,
            style,
            color,
            role,
        }));
    }

    /// Text across the full content width at the cursor; advances the cursor
    fn flow_text(&mut self, text: &str, style: TextStyle, role: TextRole) {
        let x = self.options.page.margin_left;
        let width = self.options.page.content_width();
        let height = style.height_of(text, width);
        self.text(
            x,
            self.cursor,
            width,
            text.to_string(),
            style,
            Color::BLACK,
            role,
        );
        self.cursor += height;
    }

    /// Advance by a fraction of the style's line height
    fn move_down(&mut self, lines: f64, style: &TextStyle) {
        self.cursor += lines * style.line_height();
    }

    fn finish(mut self) -> ReportLayout {
        self.done.push(self.page);
        ReportLayout {
            page: self.options.page,
            pages: self.done,
            placements: self.placements,
        }
    }
}

fn draw_page_header(composer: &mut Composer<'_>, record: &EvaluationRecord) {
    composer.flow_text(
        REPORT_TITLE,
        TextStyle::bold(14.0).centered(),
        TextRole::Title,
    );

    let subtitle = TextStyle::regular(10.0).centered();
    composer.flow_text(REPORT_SUBTITLE, subtitle, TextRole::Subtitle);
    composer.move_down(0.5, &subtitle);

    let info = TextStyle::regular(9.0).centered();
    let line = format!(
        "Razón Social: {}    |    Área: {}    |    Proceso: {}",
        record.company, record.area, record.process
    );
    composer.flow_text(&line, info, TextRole::RecordInfo);
    composer.move_down(0.8, &info);
}

fn draw_table_header(composer: &mut Composer<'_>) {
    let y = composer.cursor;
    let options = composer.options;
    let mut x = options.page.margin_left;
    let style = TextStyle::bold(BODY_FONT_SIZE).centered();

    for column in &options.schema.columns {
        composer.rect(x, y, column.width, HEADER_ROW_HEIGHT, Some(Color::HEADER_FILL));
        composer.text(
            x + CELL_INSET,
            y + HEADER_TEXT_OFFSET,
            column.text_width(),
            column.title.to_string(),
            style,
            Color::BLACK,
            TextRole::ColumnHeader,
        );
        x += column.width;
    }

    composer.cursor = y + HEADER_ROW_HEIGHT;
}

fn draw_row(composer: &mut Composer<'_>, row: &HazardRow, number: usize, cells: &MeasuredRow) {
    let y = composer.cursor;
    let height = cells.height;
    let mut x = composer.options.page.margin_left;
    let risk_fill = Color::from_hex(row.risk_color()).unwrap_or(Color::NEUTRAL);
    let options = composer.options;

    for (column, text) in options.schema.columns.iter().zip(&cells.texts) {
        let role = TextRole::Cell {
            row: number,
            column: column.kind,
        };
        let style = column.kind.cell_style();

        if column.kind == ColumnKind::Magnitude {
            composer.rect(x, y, column.width, height, Some(risk_fill));
            composer.text(
                x + CELL_INSET,
                y + height / 2.0 - CELL_PADDING / 2.0,
                column.text_width(),
                text.clone(),
                style,
                Color::WHITE,
                role,
            );
        } else {
            composer.rect(x, y, column.width, height, None);
            composer.text(
                x + CELL_INSET,
                y + CELL_PADDING / 2.0,
                column.text_width(),
                text.clone(),
                style,
                Color::BLACK,
                role,
            );
        }
        x += column.width;
    }

    let page = composer.page_index();
    composer.placements.push(RowPlacement {
        number,
        page,
        y,
        height,
    });
    composer.cursor = y + height;
}

fn draw_legend(composer: &mut Composer<'_>) {
    let body = TextStyle::regular(BODY_FONT_SIZE);
    let title = TextStyle::bold(9.0).centered();
    let label = TextStyle::regular(LEGEND_FONT_SIZE);

    let items_height = LEGEND_SWATCH.max(LEGEND_LINE_OFFSET + label.line_height());
    let block_height = 1.5 * body.line_height() + 1.5 * title.line_height() + items_height;

    if composer.cursor + block_height > composer.options.page.printable_bottom() {
        log::debug!("legend moved to a new page");
        composer.start_page();
    } else {
        composer.move_down(1.5, &body);
    }

    composer.flow_text(LEGEND_TITLE, title, TextRole::LegendTitle);
    composer.move_down(0.5, &title);

    let y = composer.cursor;
    let x0 = (composer.options.page.width - LEGEND_WIDTH) / 2.0;

    for (i, level) in RiskLevel::defined().iter().enumerate() {
        let x = x0 + i as f64 * LEGEND_SLOT;
        let fill = Color::from_hex(level.color_hex());
        composer.rect(x, y, LEGEND_SWATCH, LEGEND_SWATCH, fill);
        composer.text(
            x + LEGEND_TEXT_GAP,
            y,
            LEGEND_TEXT_WIDTH,
            level.legend_label(),
            label,
            Color::BLACK,
            TextRole::LegendLabel,
        );
        composer.text(
            x + LEGEND_TEXT_GAP,
            y + LEGEND_LINE_OFFSET,
            LEGEND_TEXT_WIDTH,
            format!("({})", level.range_label()),
            label,
            Color::BLACK,
            TextRole::LegendLabel,
        );
    }

    composer.cursor = y + items_height;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordDraft, RowInput};
    use chrono::{TimeZone, Utc};

    fn record(rows: Vec<RowInput>) -> EvaluationRecord {
        let draft = RecordDraft {
            company: "Minera Sur".to_string(),
            area: "Planta".to_string(),
            process: "Chancado".to_string(),
            rows,
        };
        EvaluationRecord::create(&draft, Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_color_hex_round_trip() {
        let c = Color::from_hex("#ffa500").unwrap();
        assert_eq!((c.r, c.g, c.b), (255, 165, 0));
        assert_eq!(c.to_hex(), "#ffa500");
        assert!(Color::from_hex("ffa500").is_none());
        assert!(Color::from_hex("#ffa50").is_none());
        assert!(Color::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_standard_widths() {
        let schema = TableSchema::iperc();
        assert_eq!(
            schema.widths(),
            vec![25.0, 90.0, 90.0, 110.0, 85.0, 20.0, 20.0, 30.0, 90.0, 75.0]
        );
        assert!(schema.total_width() <= PageGeometry::A4_LANDSCAPE.content_width());
    }

    #[test]
    fn test_with_widths_validates_count_and_size() {
        assert!(TableSchema::with_widths(&[10.0; 3]).is_err());
        let mut widths = TableSchema::iperc().widths();
        widths[0] = 1.0;
        assert!(TableSchema::with_widths(&widths).is_err());
        widths[0] = 40.0;
        assert_eq!(TableSchema::with_widths(&widths).unwrap().columns[0].width, 40.0);
    }

    #[test]
    fn test_single_row_record_is_one_page() {
        let r = record(vec![RowInput::new("Perforar", "Ruido", "Hipoacusia", 3, 10)]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        assert_eq!(out.pages.len(), 1);
        assert_eq!(out.row_numbers(), vec![1]);
        assert_eq!(out.placements.len(), 1);
    }

    #[test]
    fn test_header_only_on_first_page_top() {
        let r = record(vec![RowInput::new("a", "b", "c", 1, 1)]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        let titles: Vec<_> = out.pages[0]
            .texts()
            .filter(|t| t.role == TextRole::Title)
            .collect();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].y, 40.0);
        assert_eq!(titles[0].text, REPORT_TITLE);
    }

    #[test]
    fn test_header_row_cells() {
        let r = record(vec![RowInput::new("a", "b", "c", 1, 1)]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        let headers: Vec<_> = out.pages[0]
            .texts()
            .filter(|t| t.role == TextRole::ColumnHeader)
            .collect();
        assert_eq!(headers.len(), 10);
        assert_eq!(headers[0].text, "N°");
        assert_eq!(headers[7].text, "Mr");
        assert!(headers.iter().all(|h| h.style.face == crate::font::FontFace::Bold));

        let filled: Vec<_> = out.pages[0]
            .rects()
            .filter(|r| r.fill == Some(Color::HEADER_FILL))
            .collect();
        assert_eq!(filled.len(), 10);
        assert!(filled.iter().all(|r| r.height == HEADER_ROW_HEIGHT));
        assert_eq!(filled[0].x, 30.0);
    }

    #[test]
    fn test_magnitude_cell_is_filled_with_risk_color() {
        let r = record(vec![RowInput::new("a", "b", "c", 5, 50)]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        let page = &out.pages[0];

        let mr = page
            .texts()
            .find(|t| {
                matches!(
                    t.role,
                    TextRole::Cell {
                        column: ColumnKind::Magnitude,
                        ..
                    }
                )
            })
            .unwrap();
        assert_eq!(mr.text, "250");
        assert_eq!(mr.color, Color::WHITE);
        assert!(!mr.style.wrap);
        assert_eq!(mr.lines(), vec!["250".to_string()]);
        assert!(mr.style.width_of("250") <= mr.width);

        let red = Color::from_hex("#ff6b6b").unwrap();
        assert_eq!(page.rects().filter(|r| r.fill == Some(red)).count(), 2); // cell + legend swatch
    }

    #[test]
    fn test_row_height_follows_tallest_cell() {
        let long = "Trabajos en altura sobre andamios sin barandas perimetrales ni rodapiés \
                    en la zona de descarga de materiales";
        let r = record(vec![
            RowInput::new("a", "b", "c", 1, 1),
            RowInput::new("a", "b", long, 1, 1),
        ]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        let short = out.placements[0].height;
        let tall = out.placements[1].height;

        // the single-line Mr cell is bold, so it sets the floor of every row
        let line = TextStyle::regular(BODY_FONT_SIZE).line_height();
        let mr_line = TextStyle::bold(BODY_FONT_SIZE).line_height();
        assert!(mr_line > line);
        assert!((short - (mr_line + CELL_PADDING)).abs() < 1e-9);

        let expected_lines = TextStyle::regular(BODY_FONT_SIZE).lines(long, 110.0 - 4.0).len();
        assert!(expected_lines > 1);
        let tallest = (expected_lines as f64 * line).max(mr_line);
        assert!((tall - (tallest + CELL_PADDING)).abs() < 1e-9);
        assert!((out.placements[1].y - (out.placements[0].y + short)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_record_is_rejected() {
        let mut r = record(vec![RowInput::new("a", "b", "c", 1, 1)]);
        r.rows.clear();
        assert_eq!(
            layout(&r, &LayoutOptions::default()),
            Err(RecordError::NoRows)
        );
    }

    #[test]
    fn test_legend_lists_four_bands_in_order() {
        let r = record(vec![RowInput::new("a", "b", "c", 1, 1)]);
        let out = layout(&r, &LayoutOptions::default()).unwrap();
        let labels: Vec<_> = out.pages[0]
            .texts()
            .filter(|t| t.role == TextRole::LegendLabel)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(
            labels,
            vec![
                "RIESGO BAJO",
                "(X <= 3)",
                "RIESGO MEDIO",
                "(3 < X <= 10)",
                "RIESGO ALTO",
                "(10 < X <= 50)",
                "RIESGO CRÍTICO",
                "(50 < X <= 250)",
            ]
        );
    }

    #[test]
    fn test_centered_columns() {
        assert_eq!(ColumnKind::Number.cell_style().align, Align::Center);
        assert_eq!(ColumnKind::Probability.cell_style().align, Align::Center);
        assert_eq!(ColumnKind::Severity.cell_style().align, Align::Center);
        assert_eq!(ColumnKind::Hazard.cell_style().align, Align::Left);
    }
}
