pub mod handler;
pub mod response;
pub mod types;

pub use handler::{
    CONTENT_ITEM_SELECTION_RENDERER, ContentItemSelectionHandler, canvas_course_id,
    resolve_lms_url,
};
pub use response::{ContentItem, ContentItemSelectionForm, DocumentSelection, LtiLinkItem};
pub use types::{
    CONTENT_ITEM_SELECTION_MESSAGE_TYPE, ContentItemFormFields, ContentItemSelectionContext,
    PickerCredentials, SelectionProtocolState,
};
