pub mod bsp;
pub mod builder;
mod camera;
mod geometry;
mod lights;
mod objects;
mod reject;
mod texture;

pub use geometry::{
    Aabb, Level, LevelError, Line, LineFlags, LineId, Node, NodeId, Sector, SectorId,
    SectorTriggers, Segment, SegmentId, Side, SideId, SubSector, SubSectorId, Vertex, VertexId,
};

pub use bsp::BspVisitor;

pub use camera::Camera;

pub use lights::{LightAnimation, LightKind};

pub use objects::{BodyPiece, ObjectAttributes, ObjectId, ObjectList, SceneObject};

pub use reject::RejectTable;

pub use texture::{
    BlendTable, ColorizeId, NO_TEXTURE, Palette, SHADE_ROWS, ShadeTables, TRANSPARENT_INDEX,
    Texture, TextureBank, TextureError, TextureId,
};
