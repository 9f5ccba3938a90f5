//! Harvesting the page-edit form

use crate::error::WikiError;
use fe_slots_core::document::EditSession;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// CSS selector of the page-edit form
pub const EDIT_FORM_SELECTOR: &str = "form#editpageform";

/// Input name that must never be submitted
const CANCEL_FIELD: &str = "cancel";

fn selector(css: &str) -> Result<Selector, WikiError> {
    Selector::parse(css).map_err(|e| WikiError::ResponseParseFailed(e.to_string()))
}

/// Parses the edit page markup into an [`EditSession`].
///
/// Every named `<input>` contributes its `value` (or `""`), except `cancel`.
/// Every named `<textarea>` contributes its text. The form's action is
/// resolved against `edit_url`: the last path segment is replaced by the
/// action, the action's own query is kept, and the edit URL's query and
/// fragment are dropped.
///
/// # Errors
///
/// Returns [`WikiError::EditFormMissing`] when the page has no edit form and
/// [`WikiError::FormActionMissing`] when its action is absent or unresolvable.
pub fn parse_edit_form(html: &str, edit_url: &Url) -> Result<EditSession, WikiError> {
    let document = Html::parse_document(html);

    let form = document
        .select(&selector(EDIT_FORM_SELECTOR)?)
        .next()
        .ok_or_else(|| WikiError::EditFormMissing(edit_url.to_string()))?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .ok_or_else(|| WikiError::FormActionMissing(edit_url.to_string()))?;

    let action_url = edit_url
        .join(action)
        .map_err(|e| WikiError::FormActionMissing(format!("{action}: {e}")))?;

    let mut fields = BTreeMap::new();

    for input in form.select(&selector("input")?) {
        let Some(name) = input.value().attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if name == CANCEL_FIELD {
            continue;
        }
        let value = input.value().attr("value").unwrap_or_default();
        fields.insert(name.to_string(), value.to_string());
    }

    for textarea in form.select(&selector("textarea")?) {
        if let Some(name) = textarea.value().attr("name").filter(|n| !n.is_empty()) {
            fields.insert(name.to_string(), textarea.text().collect());
        }
    }

    Ok(EditSession::new(action_url.to_string(), fields))
}
