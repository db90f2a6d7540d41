//! Data model for documents, pages, and cleaning plans.

mod document;
mod page;
mod plan;

pub use document::{Document, Language};
pub use page::{BBox, Direction, ImageRegion, Page, TextBlock};
pub use plan::{
    CleaningPlan, KeepReason, KeepRegion, PlanMode, PlanToken, RemoveReason, RemoveRegion,
};
