// src/pdf/fonts.rs
use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, Stream};
use once_cell::sync::Lazy;

use super::cmap::{parse_to_unicode, UnicodeMap};

// Glyph widths are expressed in 1/1000 of the font size.
const DEFAULT_SIMPLE_WIDTH: f64 = 500.0;
const MONOSPACE_WIDTH: f64 = 600.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;
// Upper bound for `c_first c_last w` ranges in a /W array.
const MAX_WIDTH_RANGE: u32 = 0xFFFF;

/// Used when a Tf names a font missing from the resources.
pub static FALLBACK_FONT: Lazy<FontInfo> = Lazy::new(FontInfo::fallback);

/// Fonts of one resource dictionary, keyed by resource name (e.g. `F1`).
pub type FontTable = HashMap<Vec<u8>, FontInfo>;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub text: String,
}

/// What the interpreter needs to know about a font: how to turn codes into
/// text and how far each glyph advances.
#[derive(Debug, Clone)]
pub struct FontInfo {
    to_unicode: Option<UnicodeMap>,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
}

impl FontInfo {
    pub fn fallback() -> Self {
        Self {
            to_unicode: None,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_SIMPLE_WIDTH,
        }
    }

    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = name_of(dict_get(doc, font, b"Subtype"));
        let base_font = name_of(dict_get(doc, font, b"BaseFont")).unwrap_or_default();
        let to_unicode = match dict_get(doc, font, b"ToUnicode") {
            Some(Object::Stream(stream)) => Some(parse_to_unicode(&stream_bytes(stream))),
            _ => None,
        };

        let mut info = Self {
            to_unicode,
            ..Self::fallback()
        };

        if subtype.as_deref() == Some("Type0") {
            info.two_byte = true;
            info.default_width = DEFAULT_CID_WIDTH;
            if let Some(descendant) = first_descendant(doc, font) {
                if let Some(dw) = dict_get(doc, descendant, b"DW").and_then(number) {
                    info.default_width = dw;
                }
                if let Some(Object::Array(w)) = dict_get(doc, descendant, b"W") {
                    info.cid_widths = parse_cid_widths(doc, w);
                }
            }
        } else {
            if base_font.contains("Courier") {
                info.default_width = MONOSPACE_WIDTH;
            }
            info.first_char = dict_get(doc, font, b"FirstChar")
                .and_then(number)
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(0);
            if let Some(Object::Array(widths)) = dict_get(doc, font, b"Widths") {
                info.widths = widths
                    .iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(info.default_width))
                    .collect();
            }
        }

        info
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Splits a shown string into glyph codes and their Unicode text.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
                .collect()
        } else {
            bytes.iter().map(|b| *b as u32).collect()
        };

        codes
            .into_iter()
            .map(|code| {
                let text = self
                    .to_unicode
                    .as_ref()
                    .and_then(|map| map.get(&code).cloned())
                    .unwrap_or_else(|| fallback_text(code));
                Glyph { code, text }
            })
            .collect()
    }

    /// Advance width of a glyph, in 1/1000 text space units.
    pub fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self.cid_widths.get(&code).copied().unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
            .copied()
            .unwrap_or(self.default_width)
    }
}

/// Builds the font table for a resource dictionary.
pub fn font_table(doc: &Document, resources: &Dictionary) -> FontTable {
    let mut table = FontTable::new();
    if let Some(Object::Dictionary(fonts)) = dict_get(doc, resources, b"Font") {
        for (name, obj) in fonts.iter() {
            if let Object::Dictionary(font) = resolve(doc, obj) {
                table.insert(name.clone(), FontInfo::from_dict(doc, font));
            }
        }
    }
    table
}

/// Follows indirect references (bounded, to survive reference cycles).
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..8 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => current = target,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

pub fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub fn name_of(obj: Option<&Object>) -> Option<String> {
    match obj {
        Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Stream payload, decompressed when a filter is present.
pub fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn first_descendant<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    match dict_get(doc, font, b"DescendantFonts") {
        Some(Object::Array(items)) => match items.first().map(|o| resolve(doc, o)) {
            Some(Object::Dictionary(d)) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

/// Parses a CIDFont /W array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(start) = number(resolve(doc, &items[i])).map(|n| n.max(0.0) as u32) else {
            break;
        };
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(start + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(other) => {
                let end = number(other).map(|n| n.max(0.0) as u32);
                let w = items.get(i + 2).and_then(|o| number(resolve(doc, o)));
                if let (Some(end), Some(w)) = (end, w) {
                    if end >= start && end - start <= MAX_WIDTH_RANGE {
                        for code in start..=end {
                            widths.insert(code, w);
                        }
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Best guess for codes without a ToUnicode entry: treat them as Latin-1.
fn fallback_text(code: u32) -> String {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => char::from_u32(code).map(String::from).unwrap_or_default(),
        0x100.. => char::from_u32(code)
            .filter(|c| !c.is_control())
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    }
}
