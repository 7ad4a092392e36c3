//! Domain types for the storybook
//!
//! - `page`: story pages and the outlines they are created from

mod page;

pub use page::{AssetKind, PageOutline, StoryPage};
