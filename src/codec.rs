//! Flat textual representation of form field values
//!
//! Every variety maps to and from a single string:
//!
//! | Variety | read | write |
//! |---------|------|-------|
//! | text | the text | replaces the text |
//! | editable choice | the edit text | replaces the edit text |
//! | closed choice | selected labels joined by `,` | selects the first equal label |
//! | checkbox | `true` / `false` | checked iff `true`, `1` or `yes` |
//! | radio member | `true` / `false` | selected iff the caption equals the value |
//! | push button | `<button>` | nothing |
//!
//! Signatures and unknown varieties read as `<unknown-form-element>` and are
//! never written. Comparisons are exact: no case folding, no normalization.

use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::pdf::field::{ButtonKind, FormField, Variety};

/// What push buttons read as
pub const PUSH_BUTTON_TEXT: &str = "<button>";
/// What signatures and unrecognised fields read as
pub const UNKNOWN_FIELD_TEXT: &str = "<unknown-form-element>";

const CHECKED_VALUES: [&str; 3] = ["true", "1", "yes"];

/// Why a write left the field untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ReadOnly,
    Hidden,
    Signature,
    PushButton,
    Unknown,
}

/// Result of writing a value into a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The field now holds the value
    Applied,
    /// The field is never written
    Skipped(SkipReason),
    /// The value is not representable; a diagnostic was emitted
    Rejected,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        self == WriteOutcome::Applied
    }
}

/// Current value of a field as text
pub fn read<F: FormField + ?Sized>(field: &F) -> String {
    match field.variety() {
        Variety::Text => field.text(),
        Variety::Choice { editable: true } => field.edit_choice(),
        Variety::Choice { editable: false } => {
            let labels = field.choices();
            field
                .current_choices()
                .into_iter()
                .filter_map(|index| labels.get(index).map(String::as_str))
                .collect::<Vec<_>>()
                .join(",")
        }
        Variety::Button(ButtonKind::Push) => PUSH_BUTTON_TEXT.to_string(),
        Variety::Button(ButtonKind::CheckBox) | Variety::Button(ButtonKind::Radio) => {
            field.state().to_string()
        }
        Variety::Signature | Variety::Unknown => UNKNOWN_FIELD_TEXT.to_string(),
    }
}

/// Store `value` into a field
///
/// Read-only and hidden fields are left alone. A closed choice without a
/// label equal to `value` stays unchanged and `can't set <name> to <value>`
/// is written to `diagnostics`.
pub fn write<F: FormField + ?Sized>(
    field: &mut F,
    value: &str,
    diagnostics: &mut dyn Write,
) -> Result<WriteOutcome> {
    if field.is_read_only() {
        debug!(field = field.fully_qualified_name(), "skipping read-only field");
        return Ok(WriteOutcome::Skipped(SkipReason::ReadOnly));
    }
    if !field.is_visible() {
        debug!(field = field.fully_qualified_name(), "skipping hidden field");
        return Ok(WriteOutcome::Skipped(SkipReason::Hidden));
    }

    match field.variety() {
        Variety::Text => field.set_text(value)?,
        Variety::Choice { editable: true } => field.set_edit_choice(value)?,
        Variety::Choice { editable: false } => {
            match field.choices().iter().position(|label| label == value) {
                Some(index) => field.set_current_choices(&[index])?,
                None => {
                    writeln!(
                        diagnostics,
                        "can't set {} to {}",
                        field.fully_qualified_name(),
                        value
                    )?;
                    return Ok(WriteOutcome::Rejected);
                }
            }
        }
        Variety::Button(ButtonKind::Push) => {
            return Ok(WriteOutcome::Skipped(SkipReason::PushButton));
        }
        Variety::Button(ButtonKind::CheckBox) => {
            field.set_state(CHECKED_VALUES.contains(&value))?;
        }
        Variety::Button(ButtonKind::Radio) => {
            let selected = field.caption().as_bytes() == value.as_bytes();
            field.set_state(selected)?;
        }
        Variety::Signature => return Ok(WriteOutcome::Skipped(SkipReason::Signature)),
        Variety::Unknown => return Ok(WriteOutcome::Skipped(SkipReason::Unknown)),
    }

    Ok(WriteOutcome::Applied)
}
