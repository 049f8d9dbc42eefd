//! Software rasterizer back-end: textured vertical columns, horizontal
//! floor spans, and the far-to-near merge of see-through walls with
//! objects.

pub mod columns;
pub mod merge;
pub mod spans;
