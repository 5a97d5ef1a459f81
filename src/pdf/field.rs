//! Form field access on top of lopdf
//!
//! A page lists its widget annotations in `/Annots`. A widget either is the
//! terminal field itself (it carries `/T`) or is a kid of one. Inheritable
//! attributes such as `/FT`, `/Ff` and `/V` are looked up through `/Parent`.

use lopdf::{Dictionary, Object, ObjectId};

use crate::error::Result;
use crate::pdf::document::FormDocument;
use crate::pdf::text::{encode_text_string, object_text};

/// Guard against `/Parent` cycles in broken documents
const MAX_DEPTH: usize = 64;

/// Field flag: the user may not change the value
pub const FLAG_READ_ONLY: i64 = 1;
/// Button flag: a selected radio button may not be turned off
pub const FLAG_NO_TOGGLE_TO_OFF: i64 = 1 << 14;
/// Button flag: radio button group
pub const FLAG_RADIO: i64 = 1 << 15;
/// Button flag: push button
pub const FLAG_PUSH_BUTTON: i64 = 1 << 16;
/// Choice flag: combo box rather than list box
pub const FLAG_COMBO: i64 = 1 << 17;
/// Choice flag: combo box accepts free-form text
pub const FLAG_EDIT: i64 = 1 << 18;
/// Annotation flag: not displayed
pub const ANNOT_HIDDEN: i64 = 1 << 1;

/// Kind of button field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Push,
    CheckBox,
    Radio,
}

/// The variety of a form field, decided by `/FT` and the field flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variety {
    Text,
    Choice { editable: bool },
    Button(ButtonKind),
    Signature,
    /// A field type this tool does not know about
    Unknown,
}

impl Variety {
    fn from_type(field_type: &[u8], flags: i64) -> Self {
        match field_type {
            b"Tx" => Variety::Text,
            b"Ch" => Variety::Choice {
                editable: flags & FLAG_COMBO != 0 && flags & FLAG_EDIT != 0,
            },
            b"Btn" if flags & FLAG_PUSH_BUTTON != 0 => Variety::Button(ButtonKind::Push),
            b"Btn" if flags & FLAG_RADIO != 0 => Variety::Button(ButtonKind::Radio),
            b"Btn" => Variety::Button(ButtonKind::CheckBox),
            b"Sig" => Variety::Signature,
            _ => Variety::Unknown,
        }
    }
}

/// What the value codec needs from one interactive field
///
/// Getters only make sense for the matching variety and return empty values
/// otherwise. Setters mutate in-engine state; nothing is persisted until the
/// document is saved.
pub trait FormField {
    /// Dot-separated path from the root field
    fn fully_qualified_name(&self) -> &str;
    /// Object number of the widget annotation
    fn id(&self) -> u32;
    fn is_read_only(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn variety(&self) -> Variety;

    fn text(&self) -> String;
    fn set_text(&mut self, value: &str) -> Result<()>;

    /// Labels of a choice field, in `/Opt` order
    fn choices(&self) -> Vec<String>;
    /// Selected indices into [`FormField::choices`], ascending
    fn current_choices(&self) -> Vec<usize>;
    fn set_current_choices(&mut self, indices: &[usize]) -> Result<()>;
    fn edit_choice(&self) -> String;
    fn set_edit_choice(&mut self, value: &str) -> Result<()>;

    /// Whether this checkbox or radio member is on
    fn state(&self) -> bool;
    fn set_state(&mut self, on: bool) -> Result<()>;
    /// Export state name of a checkbox or radio member, label of a push button
    fn caption(&self) -> String;
}

/// One choice entry: the value stored in `/V` and the label shown to users
#[derive(Debug, Clone)]
struct ChoiceOption {
    export: String,
    label: String,
}

/// A widget annotation on a page together with its terminal field
pub struct FieldHandle<'d> {
    doc: &'d mut FormDocument,
    widget: ObjectId,
    field: ObjectId,
    name: String,
    variety: Variety,
    flags: i64,
    annotation_flags: i64,
}

impl<'d> FieldHandle<'d> {
    /// Open the field behind a widget annotation
    ///
    /// Returns `None` when the widget has no field type anywhere in its
    /// ancestry, i.e. it is not part of an interactive form.
    pub(crate) fn open(doc: &'d mut FormDocument, widget: ObjectId) -> Result<Option<Self>> {
        let widget_dict = doc.dictionary(widget)?;
        let field = if widget_dict.has(b"T") {
            widget
        } else {
            match widget_dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => *parent,
                _ => widget,
            }
        };
        let annotation_flags = widget_dict
            .get(b"F")
            .ok()
            .and_then(|flags| flags.as_i64().ok())
            .unwrap_or(0);

        let field_type = match inherited(doc, field, b"FT")? {
            Some(Object::Name(name)) => name.clone(),
            _ => return Ok(None),
        };
        let flags = inherited(doc, field, b"Ff")?
            .and_then(|flags| flags.as_i64().ok())
            .unwrap_or(0);
        let name = qualified_name(doc, field)?;

        Ok(Some(Self {
            doc,
            widget,
            field,
            name,
            variety: Variety::from_type(&field_type, flags),
            flags,
            annotation_flags,
        }))
    }

    fn lookup(&self, key: &[u8]) -> Option<&Object> {
        inherited(self.doc, self.field, key).ok().flatten()
    }

    fn value_text(&self) -> Option<String> {
        match self.lookup(b"V")? {
            Object::Array(items) => items
                .first()
                .and_then(|item| self.doc.resolve(item).ok())
                .and_then(object_text),
            other => object_text(other),
        }
    }

    fn options(&self) -> Vec<ChoiceOption> {
        let Some(Object::Array(entries)) = self.lookup(b"Opt") else {
            return Vec::new();
        };

        // Unreadable entries keep their slot so /I indices stay aligned
        entries
            .iter()
            .map(|entry| match self.doc.resolve(entry) {
                Ok(Object::Array(pair)) => {
                    let text_at = |index: usize| {
                        pair.get(index)
                            .and_then(|item| self.doc.resolve(item).ok())
                            .and_then(object_text)
                    };
                    let export = text_at(0).unwrap_or_default();
                    let label = text_at(1).unwrap_or_else(|| export.clone());
                    ChoiceOption { export, label }
                }
                Ok(other) => {
                    let text = object_text(other).unwrap_or_default();
                    ChoiceOption {
                        export: text.clone(),
                        label: text,
                    }
                }
                Err(_) => ChoiceOption {
                    export: String::new(),
                    label: String::new(),
                },
            })
            .collect()
    }

    /// Widgets that display this field, the current one included
    fn widgets(&self) -> Vec<ObjectId> {
        if self.field == self.widget {
            return vec![self.widget];
        }

        let kids = self
            .doc
            .dictionary(self.field)
            .ok()
            .and_then(|dict| dict.get(b"Kids").ok())
            .and_then(|kids| self.doc.resolve(kids).ok())
            .and_then(|kids| kids.as_array().ok());

        match kids {
            Some(kids) => kids
                .iter()
                .filter_map(|kid| kid.as_reference().ok())
                .filter(|&id| {
                    self.doc
                        .dictionary(id)
                        .map(|dict| !dict.has(b"T"))
                        .unwrap_or(false)
                })
                .collect(),
            None => vec![self.widget],
        }
    }

    /// The appearance state name that means "on" for a widget
    fn on_state_of(&self, widget: ObjectId) -> Option<Vec<u8>> {
        appearance_on_state(self.doc, widget).or_else(|| match self.variety {
            Variety::Button(ButtonKind::CheckBox) => Some(b"Yes".to_vec()),
            _ => None,
        })
    }

    fn current_state_name(&self) -> Option<Vec<u8>> {
        let raw = |object: &Object| match object {
            Object::Name(name) => Some(name.clone()),
            Object::String(bytes, _) => Some(bytes.clone()),
            _ => None,
        };
        match self.lookup(b"V") {
            Some(value) => raw(value),
            None => self
                .doc
                .dictionary(self.widget)
                .ok()
                .and_then(|dict| dict.get(b"AS").ok())
                .and_then(raw),
        }
    }

    /// Set the field's state name and every widget's appearance state
    fn select_state(&mut self, state: &[u8]) -> Result<()> {
        let widgets: Vec<(ObjectId, Option<Vec<u8>>)> = self
            .widgets()
            .into_iter()
            .map(|id| (id, self.on_state_of(id)))
            .collect();

        self.doc
            .dictionary_mut(self.field)?
            .set("V", Object::Name(state.to_vec()));

        for (id, on) in widgets {
            let appearance = match on {
                Some(on) if on == state => on,
                _ => b"Off".to_vec(),
            };
            self.doc
                .dictionary_mut(id)?
                .set("AS", Object::Name(appearance));
        }
        Ok(())
    }
}

impl FormField for FieldHandle<'_> {
    fn fully_qualified_name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.widget.0
    }

    fn is_read_only(&self) -> bool {
        self.flags & FLAG_READ_ONLY != 0
    }

    fn is_visible(&self) -> bool {
        self.annotation_flags & ANNOT_HIDDEN == 0
    }

    fn variety(&self) -> Variety {
        self.variety
    }

    fn text(&self) -> String {
        self.value_text().unwrap_or_default()
    }

    fn set_text(&mut self, value: &str) -> Result<()> {
        self.doc
            .dictionary_mut(self.field)?
            .set("V", encode_text_string(value));
        Ok(())
    }

    fn choices(&self) -> Vec<String> {
        self.options().into_iter().map(|option| option.label).collect()
    }

    fn current_choices(&self) -> Vec<usize> {
        let options = self.options();

        let mut selected: Vec<usize> = match self.doc.dictionary(self.field).ok().and_then(|d| d.get(b"I").ok()) {
            Some(Object::Array(indices)) => indices
                .iter()
                .filter_map(|index| index.as_i64().ok())
                .filter_map(|index| usize::try_from(index).ok())
                .filter(|&index| index < options.len())
                .collect(),
            _ => Vec::new(),
        };

        if selected.is_empty() {
            let values: Vec<String> = match self.lookup(b"V") {
                Some(Object::Array(items)) => items
                    .iter()
                    .filter_map(|item| self.doc.resolve(item).ok())
                    .filter_map(object_text)
                    .collect(),
                Some(other) => object_text(other).into_iter().collect(),
                None => Vec::new(),
            };
            selected = values
                .iter()
                .filter_map(|value| {
                    options
                        .iter()
                        .position(|option| &option.export == value)
                        .or_else(|| options.iter().position(|option| &option.label == value))
                })
                .collect();
        }

        selected.sort_unstable();
        selected.dedup();
        selected
    }

    fn set_current_choices(&mut self, indices: &[usize]) -> Result<()> {
        let options = self.options();
        let mut exports: Vec<Object> = indices
            .iter()
            .filter_map(|&index| options.get(index))
            .map(|option| encode_text_string(&option.export))
            .collect();

        let dict = self.doc.dictionary_mut(self.field)?;
        match exports.len() {
            0 => {
                dict.remove(b"V");
                dict.remove(b"I");
            }
            1 => {
                dict.set("V", exports.remove(0));
                dict.set("I", index_array(indices));
            }
            _ => {
                dict.set("V", Object::Array(exports));
                dict.set("I", index_array(indices));
            }
        }
        Ok(())
    }

    fn edit_choice(&self) -> String {
        self.value_text().unwrap_or_default()
    }

    fn set_edit_choice(&mut self, value: &str) -> Result<()> {
        let dict = self.doc.dictionary_mut(self.field)?;
        dict.set("V", encode_text_string(value));
        dict.remove(b"I");
        Ok(())
    }

    fn state(&self) -> bool {
        match (self.on_state_of(self.widget), self.current_state_name()) {
            (Some(on), Some(current)) => on == current,
            _ => false,
        }
    }

    fn set_state(&mut self, on: bool) -> Result<()> {
        match self.variety {
            Variety::Button(ButtonKind::CheckBox) => {
                let state = if on {
                    self.on_state_of(self.widget).unwrap_or_else(|| b"Yes".to_vec())
                } else {
                    b"Off".to_vec()
                };
                self.select_state(&state)
            }
            Variety::Button(ButtonKind::Radio) => {
                if on {
                    match self.on_state_of(self.widget) {
                        Some(state) => self.select_state(&state),
                        None => Ok(()),
                    }
                } else if self.state() && self.flags & FLAG_NO_TOGGLE_TO_OFF == 0 {
                    // Only the selected member can switch the group off
                    self.select_state(b"Off")
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn caption(&self) -> String {
        match self.variety {
            Variety::Button(ButtonKind::Push) => self
                .doc
                .dictionary(self.widget)
                .ok()
                .and_then(|dict| dict.get(b"MK").ok())
                .and_then(|mk| self.doc.resolve(mk).ok())
                .and_then(|mk| mk.as_dict().ok())
                .and_then(|mk| mk.get(b"CA").ok())
                .and_then(object_text)
                .unwrap_or_default(),
            _ => self
                .on_state_of(self.widget)
                .map(|state| String::from_utf8_lossy(&state).into_owned())
                .unwrap_or_default(),
        }
    }
}

fn index_array(indices: &[usize]) -> Object {
    Object::Array(
        indices
            .iter()
            .map(|&index| Object::Integer(index as i64))
            .collect(),
    )
}

/// Look up an inheritable attribute, walking `/Parent` links
fn inherited<'a>(doc: &'a FormDocument, start: ObjectId, key: &[u8]) -> Result<Option<&'a Object>> {
    let mut current = start;
    for _ in 0..MAX_DEPTH {
        let dict: &Dictionary = doc.dictionary(current)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(doc.resolve(value)?));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// Join the partial names from the root field down to `field`
fn qualified_name(doc: &FormDocument, field: ObjectId) -> Result<String> {
    let mut parts = Vec::new();
    let mut current = Some(field);
    let mut depth = 0;

    while let Some(id) = current {
        if depth == MAX_DEPTH {
            break;
        }
        depth += 1;

        let dict = doc.dictionary(id)?;
        if let Ok(partial) = dict.get(b"T") {
            if let Some(text) = object_text(doc.resolve(partial)?) {
                parts.push(text);
            }
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Some(*parent),
            _ => None,
        };
    }

    parts.reverse();
    Ok(parts.join("."))
}

/// First non-`Off` state in the widget's normal (or down) appearances
fn appearance_on_state(doc: &FormDocument, widget: ObjectId) -> Option<Vec<u8>> {
    let dict = doc.dictionary(widget).ok()?;
    let appearances = doc.resolve(dict.get(b"AP").ok()?).ok()?.as_dict().ok()?;

    for key in [&b"N"[..], &b"D"[..]] {
        let Some(states) = appearances
            .get(key)
            .ok()
            .and_then(|states| doc.resolve(states).ok())
            .and_then(|states| states.as_dict().ok())
        else {
            continue;
        };
        if let Some((name, _)) = states.iter().find(|(name, _)| name.as_slice() != b"Off") {
            return Some(name.clone());
        }
    }
    None
}
