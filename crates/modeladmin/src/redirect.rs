//! Where to send the browser after a form save.

use url::Url;

use crate::model_view::ModelView;
use crate::urls::AdminUrls;

/// The submit button a form was saved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    /// `Save`: back to the list.
    Save,
    /// `Save and continue editing`: stay on the edit form.
    SaveAndContinue,
    /// `Save as new`: insert a copy of the edited record.
    SaveAsNew,
    /// `Save and add another`: open an empty create form.
    SaveAndAddAnother,
}

impl SaveAction {
    /// Button label for `Save`.
    pub const SAVE: &'static str = "Save";
    /// Button label for `Save and continue editing`.
    pub const SAVE_AND_CONTINUE: &'static str = "Save and continue editing";
    /// Button label for `Save as new`.
    pub const SAVE_AS_NEW: &'static str = "Save as new";
    /// Button label for `Save and add another`.
    pub const SAVE_AND_ADD_ANOTHER: &'static str = "Save and add another";

    /// Parses the value of the `save` form field.
    ///
    /// Unknown or missing labels are treated as `Save and add another`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(Self::SAVE) => Self::Save,
            Some(Self::SAVE_AND_CONTINUE) => Self::SaveAndContinue,
            Some(Self::SAVE_AS_NEW) => Self::SaveAsNew,
            _ => Self::SaveAndAddAnother,
        }
    }

    /// The button label for this action.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Save => Self::SAVE,
            Self::SaveAndContinue => Self::SAVE_AND_CONTINUE,
            Self::SaveAsNew => Self::SAVE_AS_NEW,
            Self::SaveAndAddAnother => Self::SAVE_AND_ADD_ANOTHER,
        }
    }
}

/// Resolves the redirect target for `action` on `view`.
///
/// `pk` is the identifier of the record the save produced.
pub fn save_redirect_url(urls: &AdminUrls, action: SaveAction, view: &ModelView, pk: &str) -> Url {
    match action {
        SaveAction::Save => urls.list(&view.identity),
        SaveAction::SaveAndContinue => urls.edit(&view.identity, pk),
        SaveAction::SaveAsNew if view.save_as_continue => urls.edit(&view.identity, pk),
        SaveAction::SaveAsNew | SaveAction::SaveAndAddAnother => urls.create(&view.identity),
    }
}
