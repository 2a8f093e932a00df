// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate writer — renders a `CertificateDocument` to PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.  Only the built-in PDF fonts are used, so output is
// limited to characters those fonts can encode.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};

use wipewerk_core::error::{Result, WipewerkError};

use crate::layout::{CertificateDocument, Line};

/// Supported page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl PageSize {
    /// Width and height in millimetres.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            Self::Letter => (215.9, 279.4),
            Self::A4 => (210.0, 297.0),
        }
    }
}

const MARGIN_MM: f32 = 20.0;
/// Offset of the value column in label/value tables.
const VALUE_COLUMN_MM: f32 = 50.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.50;
/// Courier is exactly 0.6 em per glyph.
const MONO_GLYPH_WIDTH: f32 = 0.60;
const PT_TO_MM: f32 = 0.3528;

/// One positioned run of text on a page.
#[derive(Debug, Clone)]
struct Run {
    x_mm: f32,
    font: BuiltinFont,
    size_pt: f32,
    text: String,
}

/// Runs sharing a baseline, with the vertical space they occupy.
#[derive(Debug, Clone)]
struct Row {
    runs: Vec<Run>,
    height_pt: f32,
}

/// Renders certificate documents to PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct CertificateWriter {
    page_size: PageSize,
}

impl CertificateWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self { page_size }
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w, h) = self.page_size.dimensions_mm();
        (Mm(w), Mm(h))
    }

    /// Render `doc` to PDF bytes, breaking pages as needed.
    #[instrument(skip_all, fields(title = %doc.title, lines = doc.lines.len()))]
    pub fn render(&self, doc: &CertificateDocument) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let usable_w_mm = page_w.0 - 2.0 * MARGIN_MM;
        let rows = layout_rows(&doc.lines, usable_w_mm);

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let bottom_pt = margin_pt;

        let mut pages: Vec<PdfPage> = Vec::new();
        let mut ops: Vec<Op> = Vec::new();
        let mut y_pt = page_h_pt - margin_pt;

        for row in &rows {
            if y_pt - row.height_pt < bottom_pt && !ops.is_empty() {
                pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                y_pt = page_h_pt - margin_pt;
            }
            y_pt -= row.height_pt;
            for run in &row.runs {
                push_text(&mut ops, run, Mm(MARGIN_MM + run.x_mm).into_pt().0, y_pt);
            }
        }
        if !ops.is_empty() || pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        let mut pdf = PdfDocument::new(&doc.title);
        pdf.with_pages(pages);
        debug!(rows = rows.len(), pages = pdf.pages.len(), "certificate layout complete");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(pdf.save(&PdfSaveOptions::default(), &mut warnings))
    }

    /// Render `doc` and write it to `path`.
    pub fn write_to_file(&self, doc: &CertificateDocument, path: impl AsRef<Path>) -> Result<()> {
        self.write_staged(doc, StagedFile::create(path.as_ref())?)
    }

    /// Render `doc` into a file reserved earlier with [`StagedFile::create`].
    pub fn write_staged(&self, doc: &CertificateDocument, staged: StagedFile) -> Result<()> {
        let bytes = self.render(doc)?;
        let path = staged.commit(&bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "certificate written");
        Ok(())
    }
}

/// A document file opened before its content exists.
///
/// The bytes go to a hidden `.partial` sibling and are renamed into place
/// on [`commit`](Self::commit).  Dropping an uncommitted file removes the
/// partial.
#[derive(Debug)]
pub struct StagedFile {
    file: Option<File>,
    partial: PathBuf,
    dest: PathBuf,
}

impl StagedFile {
    /// Open the partial file for `dest`.  Fails if its directory is missing
    /// or not writable.
    pub fn create(dest: impl Into<PathBuf>) -> Result<Self> {
        let dest = dest.into();
        let name = dest
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                WipewerkError::Document(format!("no file name in {}", dest.display()))
            })?;
        let partial = dest.with_file_name(format!(".{name}.partial"));
        let file = File::create(&partial)?;
        Ok(Self {
            file: Some(file),
            partial,
            dest,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Write `bytes`, flush them to disk, and move the file into place.
    pub fn commit(mut self, bytes: &[u8]) -> Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&self.partial, &self.dest)?;
        Ok(std::mem::take(&mut self.dest))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.dest.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.partial);
        }
    }
}

fn push_text(ops: &mut Vec<Op>, run: &Run, x_pt: f32, y_pt: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x_pt),
            y: Pt(y_pt),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(run.size_pt),
        font: run.font,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(run.text.clone())],
        font: run.font,
    });
    ops.push(Op::EndTextSection);
}

// -- Layout -------------------------------------------------------------------

fn chars_that_fit(width_mm: f32, size_pt: f32, glyph_width: f32) -> usize {
    let per_char_mm = glyph_width * size_pt * PT_TO_MM;
    ((width_mm / per_char_mm) as usize).max(1)
}

fn single(x_mm: f32, font: BuiltinFont, size_pt: f32, text: String, height_pt: f32) -> Row {
    Row {
        runs: vec![Run {
            x_mm,
            font,
            size_pt,
            text,
        }],
        height_pt,
    }
}

/// Flatten document lines into wrapped, positioned rows.
fn layout_rows(lines: &[Line], usable_w_mm: f32) -> Vec<Row> {
    let mut rows = Vec::new();

    for line in lines {
        match line {
            Line::Title(text) => {
                let width = chars_that_fit(usable_w_mm, 18.0, AVG_GLYPH_WIDTH);
                for part in wrap_text(text, width) {
                    rows.push(single(0.0, BuiltinFont::HelveticaBold, 18.0, part, 26.0));
                }
            }
            Line::Banner(text) => {
                rows.push(single(0.0, BuiltinFont::HelveticaBold, 11.0, text.clone(), 18.0));
            }
            Line::Heading(text) => {
                rows.push(single(0.0, BuiltinFont::HelveticaBold, 13.0, text.clone(), 20.0));
            }
            Line::Field { label, value } => {
                let width = chars_that_fit(usable_w_mm - VALUE_COLUMN_MM, 10.0, AVG_GLYPH_WIDTH);
                for (i, part) in wrap_text(value, width).into_iter().enumerate() {
                    let mut runs = Vec::with_capacity(2);
                    if i == 0 {
                        runs.push(Run {
                            x_mm: 0.0,
                            font: BuiltinFont::HelveticaBold,
                            size_pt: 10.0,
                            text: label.clone(),
                        });
                    }
                    runs.push(Run {
                        x_mm: VALUE_COLUMN_MM,
                        font: BuiltinFont::Helvetica,
                        size_pt: 10.0,
                        text: part,
                    });
                    rows.push(Row {
                        runs,
                        height_pt: 14.0,
                    });
                }
            }
            Line::Row(cells) => {
                let column_mm = usable_w_mm / cells.len().max(1) as f32;
                let width = chars_that_fit(column_mm - 2.0, 9.0, AVG_GLYPH_WIDTH);
                let runs = cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| Run {
                        x_mm: i as f32 * column_mm,
                        font: BuiltinFont::Helvetica,
                        size_pt: 9.0,
                        text: cell.chars().take(width).collect(),
                    })
                    .collect();
                rows.push(Row {
                    runs,
                    height_pt: 13.0,
                });
            }
            Line::Text(text) => {
                let width = chars_that_fit(usable_w_mm, 10.0, AVG_GLYPH_WIDTH);
                for part in wrap_text(text, width) {
                    rows.push(single(0.0, BuiltinFont::Helvetica, 10.0, part, 14.0));
                }
            }
            Line::Mono(text) => {
                let width = chars_that_fit(usable_w_mm, 8.0, MONO_GLYPH_WIDTH);
                for part in wrap_text(text, width) {
                    rows.push(single(0.0, BuiltinFont::Courier, 8.0, part, 11.0));
                }
            }
            Line::Small(text) => {
                let width = chars_that_fit(usable_w_mm, 8.0, AVG_GLYPH_WIDTH);
                for part in wrap_text(text, width) {
                    rows.push(single(0.0, BuiltinFont::HelveticaOblique, 8.0, part, 11.0));
                }
            }
            Line::Blank => rows.push(Row {
                runs: Vec::new(),
                height_pt: 8.0,
            }),
        }
    }

    rows
}

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph.  Words
/// longer than `max_width` are force-broken on character boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_len = chunk.len();
                        current = piece;
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}
