//! One pdffill invocation: list, name-fill and assign form fields
//!
//! The document is walked once, page by page, field by field in annotation
//! order. Listing happens before any change to a field, name-filling before
//! assignments, so an explicit assignment always wins over `-F`.

use std::io::Write;
use std::path::{Path, PathBuf};

use lopdf::ObjectId;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::pdf::{FormDocument, FormField};
use crate::resolver::Assignments;

/// Where the updated document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Stdout,
}

impl Destination {
    /// `-` selects standard output, anything else is a path
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(arg))
        }
    }
}

/// Options for one invocation
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Input PDF file path
    pub source: PathBuf,
    /// Output for the updated document, if any
    pub destination: Option<Destination>,
    /// Print every field with its value
    pub list: bool,
    /// Set every field to its own fully-qualified name
    pub fill_with_names: bool,
    /// Raw `FIELD=VALUE` operands, in command-line order
    pub assignments: Vec<String>,
}

impl FillOptions {
    /// Whether the invocation asks for changes at all
    pub fn is_mutating(&self) -> bool {
        self.fill_with_names || !self.assignments.is_empty()
    }
}

/// Summary of a completed invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub page_count: usize,
    /// Widgets visited that belong to a form field
    pub field_count: usize,
    /// Assignment keys that reached no field, ascending
    pub unmatched: Vec<String>,
    /// Whether an updated document was written
    pub written: bool,
}

/// One line of the field listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    /// 1-based page number
    pub page: usize,
    pub name: String,
    pub id: u32,
    pub value: String,
}

impl std::fmt::Display for FieldEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page {} : {} ({}) = {}", self.page, self.name, self.id, self.value)
    }
}

/// Run one invocation
///
/// The field listing and an updated document sent to standard output go to
/// `out`; every diagnostic goes to `diagnostics`.
///
/// # Example
///
/// ```no_run
/// use pdffill::fill::{fill_form, Destination, FillOptions};
/// use std::path::PathBuf;
///
/// let options = FillOptions {
///     source: PathBuf::from("form.pdf"),
///     destination: Some(Destination::parse("filled.pdf")),
///     assignments: vec!["name=Alice".to_string(), "ok=yes".to_string()],
///     ..Default::default()
/// };
///
/// let mut stdout = std::io::stdout();
/// let mut stderr = std::io::stderr();
/// fill_form(&options, &mut stdout, &mut stderr).expect("Failed to fill form");
/// ```
pub fn fill_form(
    options: &FillOptions,
    out: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<FillReport> {
    let mut assignments = Assignments::new();
    for spec in &options.assignments {
        if let Err(err) = assignments.insert_spec(spec) {
            writeln!(diagnostics, "{}", err)?;
        }
    }

    let mut doc = FormDocument::load(&options.source)?;
    let page_count = doc.page_count();

    if options.list {
        writeln!(diagnostics, "{} pages total", page_count)?;
    }

    let mut field_count = 0;
    for (index, page) in doc.pages().into_iter().enumerate() {
        for widget in page_widgets(&doc, index, page)? {
            let mut field = match doc.field(widget) {
                Ok(Some(field)) => field,
                Ok(None) => continue,
                Err(err) if is_malformed(&err) => {
                    warn!(widget = widget.0, error = %err, "skipping malformed form field");
                    continue;
                }
                Err(err) => return Err(err),
            };
            field_count += 1;

            if options.list {
                let entry = FieldEntry {
                    page: index + 1,
                    name: field.fully_qualified_name().to_string(),
                    id: field.id(),
                    value: codec::read(&field),
                };
                writeln!(out, "{}", entry)?;
            }

            if options.fill_with_names {
                let name = field.fully_qualified_name().to_string();
                codec::write(&mut field, &name, diagnostics)?;
            }

            if !assignments.is_empty() {
                if let Some(resolution) = assignments.apply(&mut field, diagnostics)? {
                    debug!(key = %resolution.key, outcome = ?resolution.outcome, "assignment matched");
                }
            }
        }
    }

    let unmatched: Vec<String> = assignments.unfulfilled().map(str::to_string).collect();
    for key in &unmatched {
        writeln!(diagnostics, "{} not found!", key)?;
    }

    let mut written = false;
    if let Some(destination) = &options.destination {
        if options.is_mutating() {
            if let Err(err) = write_document(&mut doc, destination, out) {
                writeln!(diagnostics, "failed to convert.")?;
                return Err(Error::Conversion(Box::new(err)));
            }
            written = true;
        }
    }

    info!(pages = page_count, fields = field_count, written, "done");

    Ok(FillReport {
        page_count,
        field_count,
        unmatched,
        written,
    })
}

/// Serialize completely before touching the destination
fn write_document(doc: &mut FormDocument, destination: &Destination, out: &mut dyn Write) -> Result<()> {
    let bytes = doc.to_bytes()?;
    match destination {
        Destination::File(path) => std::fs::write(path, &bytes)?,
        Destination::Stdout => {
            out.write_all(&bytes)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// List every form field of a PDF without changing anything
pub fn inspect(path: &Path) -> Result<Vec<FieldEntry>> {
    let mut doc = FormDocument::load(path)?;
    let mut entries = Vec::new();

    for (index, page) in doc.pages().into_iter().enumerate() {
        for widget in page_widgets(&doc, index, page)? {
            match doc.field(widget) {
                Ok(Some(field)) => entries.push(FieldEntry {
                    page: index + 1,
                    name: field.fully_qualified_name().to_string(),
                    id: field.id(),
                    value: codec::read(&field),
                }),
                Ok(None) => {}
                Err(err) if is_malformed(&err) => {
                    warn!(widget = widget.0, error = %err, "skipping malformed form field");
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(entries)
}

/// Widgets of one page; a page with unreadable annotations has none
fn page_widgets(doc: &FormDocument, index: usize, page: ObjectId) -> Result<Vec<ObjectId>> {
    match doc.widgets_on_page(page) {
        Ok(widgets) => Ok(widgets),
        Err(err) if is_malformed(&err) => {
            warn!(page = index + 1, error = %err, "skipping unreadable annotations");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Broken objects inside an otherwise loadable document
fn is_malformed(err: &Error) -> bool {
    matches!(err, Error::Pdf(_) | Error::Structure(_))
}
