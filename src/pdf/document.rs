//! Form documents opened for incremental update
//!
//! The original bytes are kept untouched. Every object that gets modified is
//! first copied into the incremental section, which is appended together with
//! a new cross-reference table when the document is saved.

use std::io::Write;
use std::path::Path;

use lopdf::{Dictionary, IncrementalDocument, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::field::FieldHandle;

/// A PDF whose form fields can be read and changed
pub struct FormDocument {
    inner: IncrementalDocument,
    modified: bool,
}

impl FormDocument {
    /// Load a PDF from disk
    ///
    /// Encrypted documents are refused: rewriting their objects would need
    /// the security handler, which this tool does not drive.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let inner = IncrementalDocument::load(path)?;
        if inner.get_prev_documents().trailer.get(b"Encrypt").is_ok() {
            return Err(Error::Encrypted(path.to_path_buf()));
        }

        debug!(path = %path.display(), pages = inner.get_prev_documents().get_pages().len(), "loaded document");

        Ok(Self {
            inner,
            modified: false,
        })
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_prev_documents().get_pages().len()
    }

    /// Page object ids in page order
    pub fn pages(&self) -> Vec<ObjectId> {
        self.inner
            .get_prev_documents()
            .get_pages()
            .into_values()
            .collect()
    }

    /// Widget annotations on a page, in `/Annots` order
    ///
    /// Only indirect annotations are returned: a field needs an object id.
    pub fn widgets_on_page(&self, page: ObjectId) -> Result<Vec<ObjectId>> {
        let page_dict = self.dictionary(page)?;
        let annots = match page_dict.get(b"Annots") {
            Ok(annots) => self.resolve(annots)?,
            Err(_) => return Ok(Vec::new()),
        };
        let Object::Array(annots) = annots else {
            return Ok(Vec::new());
        };

        let widgets = annots
            .iter()
            .filter_map(|annot| annot.as_reference().ok())
            .filter(|&id| {
                self.dictionary(id)
                    .ok()
                    .and_then(|dict| dict.get(b"Subtype").ok())
                    .and_then(|subtype| subtype.as_name().ok())
                    == Some(&b"Widget"[..])
            })
            .collect();

        Ok(widgets)
    }

    /// Open the form field displayed by a widget annotation
    pub fn field(&mut self, widget: ObjectId) -> Result<Option<FieldHandle<'_>>> {
        FieldHandle::open(self, widget)
    }

    /// Whether any object has been changed since loading
    #[cfg(test)]
    pub(crate) fn is_modified(&self) -> bool {
        self.modified
    }

    /// Serialize the document as an incremental update of the original
    pub fn save_to<W: Write>(&mut self, target: &mut W) -> Result<()> {
        if self.modified {
            self.request_appearance_regeneration()?;
        }
        self.inner.save_to(target)?;
        Ok(())
    }

    /// Serialize into memory, so a failure never leaves a partial file
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.save_to(&mut bytes)?;
        debug!(bytes = bytes.len(), "serialized incremental update");
        Ok(bytes)
    }

    /// Current version of an object, preferring the incremental section
    pub(crate) fn object(&self, id: ObjectId) -> Result<&Object> {
        if let Some(object) = self.inner.new_document.objects.get(&id) {
            return Ok(object);
        }
        Ok(self.inner.get_prev_documents().get_object(id)?)
    }

    /// Follow a reference, or return a direct object as is
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => self.object(*id),
            other => Ok(other),
        }
    }

    pub(crate) fn dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        Ok(self.object(id)?.as_dict()?)
    }

    /// Mutable access to a dictionary object, copying it into the update
    pub(crate) fn dictionary_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.inner.opt_clone_object_to_new_document(id)?;
        self.modified = true;
        Ok(self.inner.new_document.get_object_mut(id)?.as_dict_mut()?)
    }

    /// Ask viewers to rebuild field appearances from the new values
    fn request_appearance_regeneration(&mut self) -> Result<()> {
        let catalog_id = self
            .inner
            .get_prev_documents()
            .trailer
            .get(b"Root")
            .and_then(|root| root.as_reference())
            .map_err(|_| Error::Structure("trailer has no Root reference".to_string()))?;

        let acroform = match self.dictionary(catalog_id)?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => return Ok(()),
        };

        let already_set = |dict: &Dictionary| {
            matches!(dict.get(b"NeedAppearances"), Ok(Object::Boolean(true)))
        };

        match acroform {
            Some(id) => {
                if !already_set(self.dictionary(id)?) {
                    self.dictionary_mut(id)?
                        .set("NeedAppearances", Object::Boolean(true));
                }
            }
            None => {
                let inline = self.dictionary(catalog_id)?.get(b"AcroForm")?.as_dict()?;
                if !already_set(inline) {
                    self.dictionary_mut(catalog_id)?
                        .get_mut(b"AcroForm")?
                        .as_dict_mut()?
                        .set("NeedAppearances", Object::Boolean(true));
                }
            }
        }
        Ok(())
    }
}
