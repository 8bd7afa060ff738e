// src/pdf/testutil.rs
//! Writes small but real PDFs with positioned text for tests.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const FONT_SIZE: i64 = 10;
const LEFT_MARGIN: i64 = 72;
// Courier: every glyph is 0.6 em wide.
const GLYPH_WIDTH: i64 = 6;
const COLUMN_GAP: i64 = 40;

struct TextItem {
    x: i64,
    y: i64,
    text: String,
}

#[derive(Default)]
pub struct TestPdf {
    pages: Vec<Vec<TextItem>>,
}

impl TestPdf {
    pub fn new() -> Self {
        Self { pages: vec![Vec::new()] }
    }

    /// Starts a new page; following items land on it.
    pub fn page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    pub fn text(mut self, x: i64, y: i64, text: &str) -> Self {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(TextItem {
                x,
                y,
                text: text.to_string(),
            });
        }
        self
    }

    /// One line of text drawn by a single operator at the left margin.
    pub fn line(self, y: i64, text: &str) -> Self {
        self.text(LEFT_MARGIN, y, text)
    }

    /// Cells laid out left to right with a wide gap between them.
    pub fn row(mut self, y: i64, cells: &[&str]) -> Self {
        let mut x = LEFT_MARGIN;
        for cell in cells {
            self = self.text(x, y, cell);
            x += cell.chars().count() as i64 * GLYPH_WIDTH + COLUMN_GAP;
        }
        self
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        self.save(&path);
        path
    }

    pub fn save(&self, path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for items in &self.pages {
            let mut operations = Vec::new();
            for item in items {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
                operations.push(Operation::new("Td", vec![item.x.into(), item.y.into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(item.text.as_str())],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }
}
