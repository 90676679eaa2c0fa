//! Display rows and the comment threads they show.

mod projector;
mod threads;

pub use projector::{
    changed_rows, project_rows, LineSource, ProjectionInput, Row, RowKey, RowProjector,
};
pub use threads::{CommentTarget, CommentThread, LineAnnotations};
