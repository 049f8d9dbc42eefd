use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{
    math::{Angle, Fixed},
    world::{
        geometry::{Level, SectorId},
        texture::{ColorizeId, TextureId},
    },
};

pub type ObjectId = u16;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjectAttributes: u16 {
        const INVISIBLE  = 0x0001;
        /// Drawn only through its owner's chain.
        const BODY_PART  = 0x0002;
        const NO_SHADING = 0x0004;
        const TRANSLUCENT = 0x0008;
        /// Chain members are ordered by [`BodyPiece`] and view quadrant.
        const PIECEWISE  = 0x0010;
    }
}

/// Part of a multi-piece character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyPiece {
    Legs,
    Chest,
    Head,
    LeftArm,
    RightArm,
    Weapon,
    Shield,
}

impl BodyPiece {
    pub const COUNT: usize = 7;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Live object as seen by the renderer; owned by game logic.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub type_id: u16,
    pub x: Fixed,
    pub y: Fixed,
    /// Absolute height of the picture's bottom edge.
    pub z: Fixed,
    pub angle: Angle,
    pub attributes: ObjectAttributes,
    /// Picture texels are one map unit each.
    pub picture: TextureId,
    pub colorize: Option<ColorizeId>,
    pub chained: Option<ObjectId>,
    pub piece: Option<BodyPiece>,
    /// Sectors the object's footprint touches; the first is the home sector.
    pub sectors: SmallVec<[SectorId; 4]>,
}

impl SceneObject {
    pub fn new(type_id: u16, x: Fixed, y: Fixed, z: Fixed, picture: TextureId) -> Self {
        Self {
            type_id,
            x,
            y,
            z,
            angle: 0,
            attributes: ObjectAttributes::empty(),
            picture,
            colorize: None,
            chained: None,
            piece: None,
            sectors: SmallVec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObjectList {
    objects: Vec<SceneObject>,
}

impl ObjectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        (self.objects.len() - 1) as ObjectId
    }

    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id as usize)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (i as ObjectId, o))
    }

    /// Fill every empty `sectors` list with the sector under the object.
    pub fn link_sectors(&mut self, level: &Level) {
        for obj in self.objects.iter_mut().filter(|o| o.sectors.is_empty()) {
            if let Some(sector) = level.sector_at(obj.x, obj.y) {
                obj.sectors.push(sector);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::builder::two_rooms;

    #[test]
    fn link_sectors_uses_bsp() {
        let level = two_rooms(0, 128, 1);
        let mut list = ObjectList::new();
        let a = list.push(SceneObject::new(1, 40 << 16, 40 << 16, 0, 1));
        let b = list.push(SceneObject::new(2, 400 << 16, 40 << 16, 0, 1));
        let mut pinned = SceneObject::new(3, 400 << 16, 40 << 16, 0, 1);
        pinned.sectors.push(0);
        let c = list.push(pinned);

        list.link_sectors(&level);
        assert_eq!(list.get(a).unwrap().sectors.as_slice(), &[0]);
        assert_eq!(list.get(b).unwrap().sectors.as_slice(), &[1]);
        assert_eq!(list.get(c).unwrap().sectors.as_slice(), &[0]);
        assert_eq!(list.iter().count(), 3);
    }
}
