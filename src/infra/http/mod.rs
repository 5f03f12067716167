mod middleware;
mod public;

pub use middleware::{NotesPageContext, REQUEST_ID_HEADER, RequestContext};
pub use public::{HttpState, build_router};
