//! Builders for small AcroForm PDFs used by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tempfile::TempDir;

pub const FLAG_READ_ONLY: i64 = 1;
pub const FLAG_RADIO: i64 = 1 << 15;
pub const FLAG_NO_TOGGLE_TO_OFF: i64 = 1 << 14;
pub const FLAG_PUSH_BUTTON: i64 = 1 << 16;
pub const FLAG_COMBO: i64 = 1 << 17;
pub const FLAG_EDIT: i64 = 1 << 18;
pub const ANNOT_HIDDEN: i64 = 1 << 1;

/// Assembles pages, widgets and the AcroForm dictionary
pub struct FormBuilder {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    annots: Vec<Vec<Object>>,
    fields: Vec<Object>,
    appearance: ObjectId,
    next_y: i64,
}

impl FormBuilder {
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let pages: Vec<ObjectId> = (0..page_count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => pages.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );

        let appearance = doc.add_object(Stream::new(dictionary! {}, Vec::new()));

        Self {
            doc,
            pages_id,
            annots: vec![Vec::new(); page_count],
            pages,
            fields: Vec::new(),
            appearance,
            next_y: 750,
        }
    }

    fn next_rect(&mut self) -> Object {
        let y = self.next_y;
        self.next_y -= 30;
        Object::Array(vec![50.into(), (y - 20).into(), 250.into(), y.into()])
    }

    /// Add a widget annotation on a page; `entries` hold the field part
    fn widget(&mut self, page: usize, mut entries: Dictionary) -> ObjectId {
        entries.set("Type", "Annot");
        entries.set("Subtype", "Widget");
        entries.set("Rect", self.next_rect());
        entries.set("P", self.pages[page]);
        let id = self.doc.add_object(entries);
        self.annots[page].push(Object::Reference(id));
        id
    }

    fn on_off_appearance(&self, on: &str) -> Dictionary {
        dictionary! {
            "N" => dictionary! { on => self.appearance, "Off" => self.appearance },
        }
    }

    pub fn text(&mut self, page: usize, name: &str, value: &str) -> ObjectId {
        self.text_with_flags(page, name, value, 0, 0)
    }

    pub fn text_with_flags(
        &mut self,
        page: usize,
        name: &str,
        value: &str,
        field_flags: i64,
        annot_flags: i64,
    ) -> ObjectId {
        let id = self.widget(
            page,
            dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(name),
                "V" => Object::string_literal(value),
                "Ff" => field_flags,
                "F" => annot_flags | 4,
            },
        );
        self.fields.push(Object::Reference(id));
        id
    }

    /// A text field `child` below a non-terminal field `parent`
    pub fn nested_text(&mut self, page: usize, parent: &str, child: &str, value: &str) -> ObjectId {
        let parent_id = self.doc.new_object_id();
        let id = self.widget(
            page,
            dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(child),
                "V" => Object::string_literal(value),
                "Parent" => parent_id,
            },
        );
        self.doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal(parent),
                "Kids" => vec![Object::Reference(id)],
            }),
        );
        self.fields.push(Object::Reference(parent_id));
        id
    }

    pub fn checkbox(&mut self, page: usize, name: &str, checked: bool) -> ObjectId {
        let state = if checked { "Yes" } else { "Off" };
        let appearance = self.on_off_appearance("Yes");
        let id = self.widget(
            page,
            dictionary! {
                "FT" => "Btn",
                "T" => Object::string_literal(name),
                "V" => state,
                "AS" => state,
                "AP" => appearance,
            },
        );
        self.fields.push(Object::Reference(id));
        id
    }

    /// A radio group with one widget per option; returns the widget ids
    pub fn radio_group(
        &mut self,
        page: usize,
        name: &str,
        options: &[&str],
        selected: Option<&str>,
    ) -> Vec<ObjectId> {
        let group_id = self.doc.new_object_id();
        let mut kids = Vec::new();

        for option in options {
            let state = if selected == Some(*option) { *option } else { "Off" };
            let appearance = self.on_off_appearance(option);
            kids.push(self.widget(
                page,
                dictionary! {
                    "Parent" => group_id,
                    "AS" => state,
                    "AP" => appearance,
                },
            ));
        }

        self.doc.objects.insert(
            group_id,
            Object::Dictionary(dictionary! {
                "FT" => "Btn",
                "T" => Object::string_literal(name),
                "Ff" => FLAG_RADIO | FLAG_NO_TOGGLE_TO_OFF,
                "V" => selected.unwrap_or("Off"),
                "Kids" => kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            }),
        );
        self.fields.push(Object::Reference(group_id));
        kids
    }

    pub fn choice(
        &mut self,
        page: usize,
        name: &str,
        options: &[&str],
        value: Option<&str>,
        editable: bool,
    ) -> ObjectId {
        let flags = if editable { FLAG_COMBO | FLAG_EDIT } else { FLAG_COMBO };
        let mut entries = dictionary! {
            "FT" => "Ch",
            "T" => Object::string_literal(name),
            "Ff" => flags,
            "Opt" => options.iter().map(|o| Object::string_literal(*o)).collect::<Vec<_>>(),
        };
        if let Some(value) = value {
            entries.set("V", Object::string_literal(value));
        }
        let id = self.widget(page, entries);
        self.fields.push(Object::Reference(id));
        id
    }

    pub fn push_button(&mut self, page: usize, name: &str, caption: &str) -> ObjectId {
        let id = self.widget(
            page,
            dictionary! {
                "FT" => "Btn",
                "T" => Object::string_literal(name),
                "Ff" => FLAG_PUSH_BUTTON,
                "MK" => dictionary! { "CA" => Object::string_literal(caption) },
            },
        );
        self.fields.push(Object::Reference(id));
        id
    }

    pub fn signature(&mut self, page: usize, name: &str) -> ObjectId {
        let id = self.widget(
            page,
            dictionary! {
                "FT" => "Sig",
                "T" => Object::string_literal(name),
            },
        );
        self.fields.push(Object::Reference(id));
        id
    }

    /// A text widget whose `/Parent` points at a missing object
    pub fn dangling_text(&mut self, page: usize, name: &str) -> ObjectId {
        self.widget(
            page,
            dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(name),
                "V" => Object::string_literal("broken"),
                "Parent" => Object::Reference((999, 0)),
            },
        )
    }

    pub fn save(mut self, path: &Path) {
        for (page_id, annots) in self.pages.iter().zip(self.annots) {
            if let Ok(Object::Dictionary(page)) = self.doc.get_object_mut(*page_id) {
                if !annots.is_empty() {
                    page.set("Annots", Object::Array(annots));
                }
            }
        }

        let acroform_id = self.doc.add_object(dictionary! {
            "Fields" => self.fields,
        });
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
            "AcroForm" => acroform_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc.save(path).expect("Failed to save test PDF");
    }
}

/// Object ids of the fields in [`sample_form`]
pub struct SampleForm {
    pub path: PathBuf,
    pub name: ObjectId,
    pub ok: ObjectId,
    pub color: ObjectId,
    pub locked: ObjectId,
    pub secret: ObjectId,
    pub side: Vec<ObjectId>,
    pub submit: ObjectId,
    pub address: ObjectId,
    pub city: ObjectId,
    pub sig: ObjectId,
}

/// Two pages covering every field variety
///
/// Page 1: `name` (empty text), `ok` (unchecked), `color` (closed choice
/// Red/Green/Blue, nothing selected), `locked` (read-only "fixed"),
/// `secret` (hidden "hush"), `side` (radio left/right, none selected),
/// `submit` (push button).
/// Page 2: `person.address` ("Main St"), `city` (editable combo, "Rome"),
/// `sig` (signature).
pub fn sample_form(dir: &TempDir) -> SampleForm {
    let mut builder = FormBuilder::new(2);

    let name = builder.text(0, "name", "");
    let ok = builder.checkbox(0, "ok", false);
    let color = builder.choice(0, "color", &["Red", "Green", "Blue"], None, false);
    let locked = builder.text_with_flags(0, "locked", "fixed", FLAG_READ_ONLY, 0);
    let secret = builder.text_with_flags(0, "secret", "hush", 0, ANNOT_HIDDEN);
    let side = builder.radio_group(0, "side", &["left", "right"], None);
    let submit = builder.push_button(0, "submit", "Send");
    let address = builder.nested_text(1, "person", "address", "Main St");
    let city = builder.choice(1, "city", &["Berlin", "Paris"], Some("Rome"), true);
    let sig = builder.signature(1, "sig");

    let path = dir.path().join("form.pdf");
    builder.save(&path);

    SampleForm {
        path,
        name,
        ok,
        color,
        locked,
        secret,
        side,
        submit,
        address,
        city,
        sig,
    }
}

/// Two pages with one text field each
pub fn two_page_form(dir: &TempDir) -> (PathBuf, ObjectId, ObjectId) {
    let mut builder = FormBuilder::new(2);
    let first = builder.text(0, "first", "one");
    let second = builder.text(1, "second", "two");

    let path = dir.path().join("two-pages.pdf");
    builder.save(&path);
    (path, first, second)
}

pub fn scratch_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}
