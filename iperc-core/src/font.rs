//! Text measurement for the standard Helvetica faces
//!
//! Global invariants enforced:
//! - Measurement and rendering share `TextStyle`; wrapping is a pure function of
//!   (text, face, size, width) so the layout and the PDF encoder always agree
//! - Widths come from the Adobe core-font metrics (units of 1/1000 em)

use serde::{Deserialize, Serialize};

/// Standard PDF font faces used by the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    /// PostScript base font name
    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used inside page content streams
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }

    /// Ascender in 1/1000 em
    pub fn ascender(&self) -> f64 {
        718.0
    }

    /// Ascender - descender + line gap, in 1/1000 em
    fn line_height_units(&self) -> f64 {
        match self {
            // bbox [-166 -225 1000 931]
            FontFace::Regular => 1156.0,
            // bbox [-170 -228 1003 962]
            FontFace::Bold => 1190.0,
        }
    }

    /// Distance between consecutive baselines at `size`
    pub fn line_height(&self, size: f64) -> f64 {
        self.line_height_units() * size / 1000.0
    }

    /// Advance width of a single character at `size`
    pub fn char_width(&self, c: char, size: f64) -> f64 {
        f64::from(glyph_units(*self, c)) * size / 1000.0
    }

    /// Advance width of a string at `size`
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().map(|c| self.char_width(c, size)).sum()
    }
}

/// Horizontal alignment inside a text box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
}

/// Everything needed to both measure and draw a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f64,
    pub align: Align,
    /// When false the text is drawn on a single line regardless of width
    pub wrap: bool,
}

impl TextStyle {
    pub fn regular(size: f64) -> Self {
        TextStyle {
            face: FontFace::Regular,
            size,
            align: Align::Left,
            wrap: true,
        }
    }

    pub fn bold(size: f64) -> Self {
        TextStyle {
            face: FontFace::Bold,
            ..TextStyle::regular(size)
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn single_line(mut self) -> Self {
        self.wrap = false;
        self
    }

    pub fn line_height(&self) -> f64 {
        self.face.line_height(self.size)
    }

    /// Split `text` into the lines it occupies in a box of `width`
    ///
    /// CRLF and lone CR end a line like LF; other control characters become
    /// spaces.
    pub fn lines(&self, text: &str, width: f64) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let text = normalize_controls(text);
        if !self.wrap {
            return vec![text.replace('\n', " ")];
        }
        text.split('\n')
            .flat_map(|paragraph| wrap_paragraph(paragraph, self.face, self.size, width))
            .collect()
    }

    /// Height `text` occupies in a box of `width`
    pub fn height_of(&self, text: &str, width: f64) -> f64 {
        self.lines(text, width).len() as f64 * self.line_height()
    }

    pub fn width_of(&self, text: &str) -> f64 {
        self.face.text_width(text, self.size)
    }
}

fn normalize_controls(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\n' | '\r' => '\n',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}

/// Greedy word wrap; words wider than the box are broken between characters
fn wrap_paragraph(paragraph: &str, face: FontFace, size: f64, width: f64) -> Vec<String> {
    let space = face.char_width(' ', size);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0.0;

    for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
        let word_width = face.text_width(word, size);

        if !line.is_empty() && line_width + space + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += space + word_width;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_width = 0.0;
        }

        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }

        // Break an over-long word; every piece keeps at least one character
        for c in word.chars() {
            let w = face.char_width(c, size);
            if !line.is_empty() && line_width + w > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
            }
            line.push(c);
            line_width += w;
        }
    }

    // Blank paragraphs still take a line (explicit empty line in the text)
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Map a character to the WinAnsi byte the standard fonts can show
///
/// Characters outside WinAnsi become `?`.
pub fn win_ansi_byte(c: char) -> u8 {
    match c {
        '€' => 0x80,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        _ => match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            _ => b'?',
        },
    }
}

/// Encode a string as WinAnsi bytes
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

// Advance widths for code points 32..=126
const REGULAR_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

// Advance widths for code points 0xA0..=0xFF
const REGULAR_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // nbsp..macron
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // '°'..'¿'
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 'À'..'Ï'
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 'Ð'..'ß'
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 'à'..'ï'
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 'ð'..'ÿ'
];

const BOLD_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // nbsp..macron
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // '°'..'¿'
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 'À'..'Ï'
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 'Ð'..'ß'
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // 'à'..'ï'
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // 'ð'..'ÿ'
];

fn glyph_units(face: FontFace, c: char) -> u16 {
    let (ascii, latin1) = match face {
        FontFace::Regular => (&REGULAR_ASCII, &REGULAR_LATIN1),
        FontFace::Bold => (&BOLD_ASCII, &BOLD_LATIN1),
    };
    match win_ansi_byte(c) {
        byte @ 0x20..=0x7e => ascii[usize::from(byte - 0x20)],
        byte @ 0xa0..=0xff => latin1[usize::from(byte - 0xa0)],
        0x80 | 0x96 => 556,
        0x95 => 350,
        0x97 => 1000,
        byte => match (face, byte) {
            (FontFace::Regular, 0x91 | 0x92) => 222,
            (FontFace::Regular, _) => 333,
            (FontFace::Bold, 0x91 | 0x92) => 278,
            (FontFace::Bold, _) => 500,
        },
    }
}
