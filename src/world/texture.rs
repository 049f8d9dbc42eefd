// Format-agnostic repository of textures decoded by the asset loader.
// The renderer and world logic interact through `TextureId` only.

use std::collections::HashMap;

use std::ops::{Index, IndexMut};

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// Handle of a palette remap table (see [`TextureBank::add_colorize`]).
pub type ColorizeId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// Number of distance/light shade rows; row 63 is full brightness.
pub const SHADE_ROWS: usize = 64;

/// Palette index that sprite and masked-wall columns never write.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Indexed-colour pixels stored **column-major**: texel `(u, v)` lives at
/// `pixels[u * height + v]`, so a wall or sprite column is one slice.
///
/// A zero-size texture marks the sky; floors and ceilings using it show
/// the bank's backdrop instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}
/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT_IDX: u8 = 8;
        const DARK_IDX: u8 = 16;
        Texture::from_fn("CHECKER", 8, 8, |u, v| {
            if (u ^ v) & 1 == 0 { LIGHT_IDX } else { DARK_IDX }
        })
    }
}

impl Texture {
    /// Build from a `(u, v) → index` function.
    pub fn from_fn(
        name: impl Into<String>,
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> u8,
    ) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for u in 0..width {
            for v in 0..height {
                pixels.push(f(u, v));
            }
        }
        Self {
            name: name.into(),
            width,
            height,
            pixels,
        }
    }

    pub fn solid(name: impl Into<String>, width: usize, height: usize, index: u8) -> Self {
        Self::from_fn(name, width, height, |_, _| index)
    }

    /// Zero-size marker texture.
    pub fn sky(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    #[inline]
    pub fn is_sky(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One vertical strip; `u` wraps at the width.
    #[inline]
    pub fn column(&self, u: usize) -> &[u8] {
        if self.is_sky() {
            return &[];
        }
        let start = (u % self.width) * self.height;
        &self.pixels[start..start + self.height]
    }

    #[inline]
    pub fn width_mask(&self) -> usize {
        self.width.saturating_sub(1)
    }

    #[inline]
    pub fn height_mask(&self) -> usize {
        self.height.saturating_sub(1)
    }

    #[inline]
    pub fn texel(&self, u: usize, v: usize) -> u8 {
        self.pixels[(u % self.width) * self.height + (v % self.height)]
    }

    fn check_pixels(&self) -> Result<(), TextureError> {
        let expected = self.width * self.height;
        if self.pixels.len() != expected {
            return Err(TextureError::PixelCount {
                name: self.name.clone(),
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Wall and flat textures wrap with a bit-mask.
    #[error("surface texture `{name}` is {width}x{height}; sides must be powers of two")]
    NotPowerOfTwo {
        name: String,
        width: usize,
        height: usize,
    },

    #[error("texture `{name}` has {actual} pixels, expected {expected}")]
    PixelCount {
        name: String,
        expected: usize,
        actual: usize,
    },
}

pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}
impl Palette {
    /// Index `i` → grey level `i` (0x00RRGGBB).
    pub fn grayscale() -> Self {
        let mut p = Palette::default();
        for i in 0..256u32 {
            p[i as usize] = (i << 16) | (i << 8) | i;
        }
        p
    }
}

/// 64 rows of `texel → output index`, indexed by shade row.
#[derive(Clone)]
pub struct ShadeTables(pub Box<[[u8; 256]; SHADE_ROWS]>);
impl Default for ShadeTables {
    fn default() -> Self {
        Self::from_fn(|_, texel| texel)
    }
}
impl Index<usize> for ShadeTables {
    type Output = [u8; 256];
    fn index(&self, row: usize) -> &Self::Output {
        &self.0[row.min(SHADE_ROWS - 1)]
    }
}
impl ShadeTables {
    /// `f(row, texel)` gives the output index.
    pub fn from_fn(f: impl Fn(usize, u8) -> u8) -> Self {
        let mut rows = Box::new([[0u8; 256]; SHADE_ROWS]);
        for (row, table) in rows.iter_mut().enumerate() {
            for (texel, out) in table.iter_mut().enumerate() {
                *out = f(row, texel as u8);
            }
        }
        Self(rows)
    }

    /// Darken towards index 0 inside a grey ramp palette.
    pub fn grayscale() -> Self {
        Self::from_fn(|row, texel| ((texel as usize * (row + 1)) / SHADE_ROWS) as u8)
    }
}

/// `table[src][dst]` → blended index, for translucent columns.
#[derive(Clone)]
pub struct BlendTable(pub Box<[[u8; 256]; 256]>);
impl Default for BlendTable {
    fn default() -> Self {
        Self::from_fn(|src, _| src)
    }
}
impl BlendTable {
    pub fn from_fn(f: impl Fn(u8, u8) -> u8) -> Self {
        let mut table = Box::new([[0u8; 256]; 256]);
        for (src, row) in table.iter_mut().enumerate() {
            for (dst, out) in row.iter_mut().enumerate() {
                *out = f(src as u8, dst as u8);
            }
        }
        Self(table)
    }

    /// 50/50 mix of two grey-ramp indices.
    pub fn average() -> Self {
        Self::from_fn(|src, dst| ((src as u16 + dst as u16) / 2) as u8)
    }

    #[inline(always)]
    pub fn blend(&self, src: u8, dst: u8) -> u8 {
        self.0[src as usize][dst as usize]
    }
}

/// A palette-agnostic, format-agnostic cache of textures.
///
/// * Does **not** know about file formats; that is the loader's job.
/// * Stores exactly one copy of every name.
/// * ID **0** is always the "missing" checkerboard.
/// * Also owns the colour tables the rasterizer needs: palette, shade rows,
///   translucency blend, colorize remaps and the sky backdrop.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
    palette: Palette,
    shades: ShadeTables,
    blend: BlendTable,
    colorize: Vec<[u8; 256]>,
    backdrop: Texture,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank with a mandatory *missing* texture used as
    /// fallback.  The texture is inserted under the fixed name `"MISSING"`
    /// and obtains the handle **0**.
    pub fn new(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex],
            palette: Palette::grayscale(),
            shades: ShadeTables::default(),
            blend: BlendTable::default(),
            colorize: Vec::new(),
            backdrop: Texture::sky("BACKDROP"),
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn set_shades(&mut self, shades: ShadeTables) {
        self.shades = shades;
    }

    pub fn set_blend(&mut self, blend: BlendTable) {
        self.blend = blend;
    }

    /// Sky picture; typically twice the screen width so a full turn
    /// scrolls through it once.
    pub fn set_backdrop(&mut self, backdrop: Texture) -> Result<(), TextureError> {
        backdrop.check_pixels()?;
        self.backdrop = backdrop;
        Ok(())
    }

    pub fn add_colorize(&mut self, table: [u8; 256]) -> ColorizeId {
        self.colorize.push(table);
        (self.colorize.len() - 1) as ColorizeId
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the "missing" one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Obtain the id for a *loaded* texture by name.
    /// Returns `None` if the name is unknown.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names resolve to the checkerboard id.
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Like [`Self::texture`], but unknown ids resolve to the checkerboard.
    #[inline]
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        self.data.get(id as usize).unwrap_or(&self.data[0])
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn shade_row(&self, row: u8) -> &[u8; 256] {
        &self.shades[row as usize]
    }

    #[inline]
    pub fn blend(&self) -> &BlendTable {
        &self.blend
    }

    #[inline]
    pub fn colorize(&self, id: ColorizeId) -> Option<&[u8; 256]> {
        self.colorize.get(id as usize)
    }

    #[inline]
    pub fn backdrop(&self) -> &Texture {
        &self.backdrop
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a wall/flat texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    /// * Sides must be powers of two, or both zero for a sky marker.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let pow2 = tex.width.is_power_of_two() && tex.height.is_power_of_two();
        if !pow2 && !(tex.width == 0 && tex.height == 0) {
            return Err(TextureError::NotPowerOfTwo {
                name: tex.name,
                width: tex.width,
                height: tex.height,
            });
        }
        self.insert_picture(name, tex)
    }

    /// Insert a sprite picture; any size is accepted.
    pub fn insert_picture<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        tex.check_pixels()?;
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tex(color: u8) -> Texture {
        Texture::solid("Dummy", 2, 2, color)
    }

    #[test]
    fn insert_and_lookup() {
        let mut bank = TextureBank::default_with_checker();
        let red = bank.insert("RED", dummy_tex(0x00)).unwrap();
        let blue = bank.insert("BLUE", dummy_tex(0xFF)).unwrap();

        assert_ne!(red, NO_TEXTURE);
        assert_ne!(blue, red);
        assert_eq!(bank.id("RED"), Some(red));
        assert_eq!(bank.id("BLUE"), Some(blue));
        assert_eq!(bank.id("NOPE"), None);
        assert_eq!(bank.id_or_missing("NOPE"), NO_TEXTURE);

        assert_eq!(bank.texture(red).unwrap().pixels[0], 0x00);
        assert_eq!(bank.texture(blue).unwrap().pixels[0], 0xFF);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut bank = TextureBank::default_with_checker();
        bank.insert("WOOD", dummy_tex(1)).unwrap();
        let err = bank.insert("WOOD", dummy_tex(2)).unwrap_err();
        assert_eq!(err, TextureError::Duplicate("WOOD".into()));
        // texture count still 2 (checker + first WOOD)
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn bad_id_guard() {
        let bank = TextureBank::default_with_checker();
        let bad = TextureId::MAX;
        assert_eq!(bank.texture(bad).unwrap_err(), TextureError::BadId(bad));
        assert_eq!(bank.texture_or_missing(bad).name, "CHECKER");
    }

    #[test]
    fn surfaces_must_be_power_of_two() {
        let mut bank = TextureBank::default_with_checker();
        let err = bank
            .insert("ODD", Texture::solid("ODD", 48, 64, 3))
            .unwrap_err();
        assert!(matches!(err, TextureError::NotPowerOfTwo { width: 48, .. }));

        // Sprites may be any size, sky markers are zero-size.
        bank.insert_picture("TROLL", Texture::solid("TROLL", 41, 57, 3))
            .unwrap();
        let sky = bank.insert("SKY", Texture::sky("SKY")).unwrap();
        assert!(bank.texture(sky).unwrap().is_sky());
    }

    #[test]
    fn pixel_count_is_checked() {
        let mut bank = TextureBank::default_with_checker();
        let mut tex = dummy_tex(1);
        tex.pixels.pop();
        assert_eq!(
            bank.insert("SHORT", tex).unwrap_err(),
            TextureError::PixelCount {
                name: "Dummy".into(),
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn columns_are_contiguous() {
        let tex = Texture::from_fn("RAMP", 4, 8, |u, v| (u * 10 + v) as u8);
        assert_eq!(tex.column(2), &[20, 21, 22, 23, 24, 25, 26, 27]);
        assert_eq!(tex.column(6), tex.column(2));
        assert_eq!(tex.texel(3, 9), 31);
    }

    #[test]
    fn shade_rows_clamp_and_map() {
        let shades = ShadeTables::from_fn(|row, _| row as u8);
        assert_eq!(shades[5][200], 5);
        assert_eq!(shades[500][0], 63);

        let grey = ShadeTables::grayscale();
        assert_eq!(grey[63][200], 200);
        assert_eq!(grey[31][200], 100);
    }

    #[test]
    fn blend_and_colorize() {
        let mut bank = TextureBank::default_with_checker();
        bank.set_blend(BlendTable::average());
        assert_eq!(bank.blend().blend(100, 200), 150);

        let mut remap = [0u8; 256];
        remap.iter_mut().enumerate().for_each(|(i, v)| *v = 255 - i as u8);
        let id = bank.add_colorize(remap);
        assert_eq!(bank.colorize(id).unwrap()[10], 245);
        assert!(bank.colorize(id + 1).is_none());
    }
}
