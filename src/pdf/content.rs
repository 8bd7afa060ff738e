// src/pdf/content.rs
//! Walks a page's content stream and records where each string is drawn.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::fonts::{self, dict_get, name_of, number, resolve, FontInfo, FontTable, FALLBACK_FONT};
use super::models::TextSpan;

// Form XObjects may nest; stop following them past this depth.
const MAX_FORM_DEPTH: usize = 4;

type Matrix = [f64; 6];
const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn matrix_of(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    match values.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

fn pair_of(operands: &[Object]) -> Option<(f64, f64)> {
    match operands {
        [x, y] => Some((number(x)?, number(y)?)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Text-only content stream interpreter.
pub struct TextInterpreter<'a> {
    doc: &'a Document,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    depth: usize,
    spans: Vec<TextSpan>,
}

impl<'a> TextInterpreter<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            depth: 0,
            spans: Vec::new(),
        }
    }

    pub fn into_spans(self) -> Vec<TextSpan> {
        self.spans
    }

    /// Interprets one content stream drawn with the given resources.
    pub fn run(&mut self, data: &[u8], resources: Option<&'a Dictionary>) -> Result<(), lopdf::Error> {
        let content = Content::decode(data)?;
        let fonts = resources
            .map(|res| fonts::font_table(self.doc, res))
            .unwrap_or_default();

        for operation in &content.operations {
            self.execute(operation, &fonts, resources);
        }
        Ok(())
    }

    fn execute(&mut self, operation: &Operation, fonts: &FontTable, resources: Option<&'a Dictionary>) {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = matrix_of(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let [Object::Name(name), size] = operands {
                    self.state.font = Some(name.clone());
                    if let Some(size) = number(size) {
                        self.state.font_size = size;
                    }
                }
            }
            "Tc" => {
                if let Some(v) = operands.last().and_then(number) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.last().and_then(number) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.last().and_then(number) {
                    self.state.horizontal_scaling = v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = operands.last().and_then(number) {
                    self.state.leading = v;
                }
            }
            "Ts" => {
                if let Some(v) = operands.last().and_then(number) {
                    self.state.rise = v;
                }
            }
            "Td" => {
                if let Some((tx, ty)) = pair_of(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = pair_of(operands) {
                    self.state.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_of(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.move_line(0.0, -self.state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.last() {
                    self.show(bytes, fonts);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes, fonts),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0
                                        * self.state.font_size
                                        * self.state.horizontal_scaling;
                                    self.text_matrix = multiply(&translation(tx, 0.0), &self.text_matrix);
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                self.move_line(0.0, -self.state.leading);
                if let Some(Object::String(bytes, _)) = operands.last() {
                    self.show(bytes, fonts);
                }
            }
            "\"" => {
                if let [aw, ac, Object::String(bytes, _)] = operands {
                    if let Some(aw) = number(aw) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = number(ac) {
                        self.state.char_spacing = ac;
                    }
                    self.move_line(0.0, -self.state.leading);
                    self.show(bytes, fonts);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.run_form(name, resources);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Rendering matrix for the current glyph origin.
    fn rendering_matrix(&self) -> Matrix {
        let scale = [
            self.state.font_size * self.state.horizontal_scaling,
            0.0,
            0.0,
            self.state.font_size,
            0.0,
            self.state.rise,
        ];
        multiply(&scale, &multiply(&self.text_matrix, &self.state.ctm))
    }

    fn show(&mut self, bytes: &[u8], fonts: &FontTable) {
        let font: &FontInfo = self
            .state
            .font
            .as_ref()
            .and_then(|name| fonts.get(name))
            .unwrap_or(&*FALLBACK_FONT);

        let start = self.rendering_matrix();
        let mut text = String::new();

        for glyph in font.decode(bytes) {
            text.push_str(&glyph.text);
            let word_spacing = if !font.is_two_byte() && glyph.code == 32 {
                self.state.word_spacing
            } else {
                0.0
            };
            let tx = (font.width(glyph.code) / 1000.0 * self.state.font_size
                + self.state.char_spacing
                + word_spacing)
                * self.state.horizontal_scaling;
            self.text_matrix = multiply(&translation(tx, 0.0), &self.text_matrix);
        }

        if text.trim().is_empty() {
            return;
        }

        let end = self.rendering_matrix();
        self.spans.push(TextSpan {
            text,
            x: start[4].min(end[4]),
            y: start[5],
            width: (end[4] - start[4]).abs(),
            font_size: start[2].hypot(start[3]),
        });
    }

    fn run_form(&mut self, name: &[u8], resources: Option<&'a Dictionary>) {
        if self.depth >= MAX_FORM_DEPTH {
            return;
        }
        let doc = self.doc;
        let Some(res) = resources else { return };
        let Some(Object::Dictionary(xobjects)) = dict_get(doc, res, b"XObject") else {
            return;
        };
        let Some(Object::Stream(stream)) = dict_get(doc, xobjects, name) else {
            return;
        };
        if name_of(dict_get(doc, &stream.dict, b"Subtype")).as_deref() != Some("Form") {
            return;
        }

        let form_resources = match dict_get(doc, &stream.dict, b"Resources") {
            Some(Object::Dictionary(d)) => Some(d),
            _ => resources,
        };
        let form_matrix = match dict_get(doc, &stream.dict, b"Matrix") {
            Some(Object::Array(values)) => matrix_of(values),
            _ => None,
        };
        let data = fonts::stream_bytes(stream);

        let saved_state = self.state.clone();
        let saved_text = (self.text_matrix, self.line_matrix);
        if let Some(m) = form_matrix {
            self.state.ctm = multiply(&m, &self.state.ctm);
        }

        self.depth += 1;
        if let Err(e) = self.run(&data, form_resources) {
            tracing::debug!("Skipping undecodable form XObject: {}", e);
        }
        self.depth -= 1;

        self.state = saved_state;
        (self.text_matrix, self.line_matrix) = saved_text;
    }
}

/// Resources of a page, inherited through the page tree when not set locally.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(Object::Dictionary(resources)) = dict_get(doc, node, b"Resources") {
            return Some(resources);
        }
        match node.get(b"Parent").ok().map(|p| resolve(doc, p)) {
            Some(Object::Dictionary(parent)) => node = parent,
            _ => return None,
        }
    }
    None
}

/// All text spans drawn on a page.
pub fn page_spans(doc: &Document, page_id: ObjectId) -> Result<Vec<TextSpan>, lopdf::Error> {
    let data = doc.get_page_content(page_id)?;
    let mut interpreter = TextInterpreter::new(doc);
    interpreter.run(&data, page_resources(doc, page_id))?;
    Ok(interpreter.into_spans())
}
