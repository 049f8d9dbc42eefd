use crate::world::geometry::{LevelError, SectorId};

/// Sector-pair visibility bitmask: bit `from * n + to` set means `to`
/// can never be seen from `from`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectTable {
    sectors: usize,
    bits: Vec<u8>,
}

impl RejectTable {
    /// Table with no rejected pairs.
    pub fn all_visible(sectors: usize) -> Self {
        Self {
            sectors,
            bits: vec![0; Self::byte_len(sectors)],
        }
    }

    /// Wrap a packed, LSB-first bitset as stored by map compilers.
    pub fn from_bytes(sectors: usize, bytes: Vec<u8>) -> Result<Self, LevelError> {
        let expected = Self::byte_len(sectors);
        if bytes.len() < expected {
            return Err(LevelError::RejectSize {
                expected: sectors,
                actual: Self::sectors_for(bytes.len()),
            });
        }
        Ok(Self {
            sectors,
            bits: bytes,
        })
    }

    #[inline]
    pub fn sector_count(&self) -> usize {
        self.sectors
    }

    /// Out-of-range sectors are never rejected.
    #[inline]
    pub fn is_rejected(&self, from: SectorId, to: SectorId) -> bool {
        match self.bit_index(from, to) {
            Some(i) => self.bits[i >> 3] & (1 << (i & 7)) != 0,
            None => false,
        }
    }

    pub fn set(&mut self, from: SectorId, to: SectorId, rejected: bool) {
        if let Some(i) = self.bit_index(from, to) {
            let mask = 1u8 << (i & 7);
            if rejected {
                self.bits[i >> 3] |= mask;
            } else {
                self.bits[i >> 3] &= !mask;
            }
        }
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.sectors as SectorId;
        (0..n).all(|a| (a + 1..n).all(|b| self.is_rejected(a, b) == self.is_rejected(b, a)))
    }

    #[inline]
    fn bit_index(&self, from: SectorId, to: SectorId) -> Option<usize> {
        let (from, to) = (from as usize, to as usize);
        (from < self.sectors && to < self.sectors).then_some(from * self.sectors + to)
    }

    fn byte_len(sectors: usize) -> usize {
        (sectors * sectors).div_ceil(8)
    }

    // Largest sector count a table of `bytes` bytes can cover.
    fn sectors_for(bytes: usize) -> usize {
        let bits = bytes * 8;
        let mut n = 0;
        while (n + 1) * (n + 1) <= bits {
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_indexed_from_times_count_plus_to() {
        // 3 sectors: bit 1*3+2 = 5 → byte 0, bit 5
        let table = RejectTable::from_bytes(3, vec![0b0010_0000, 0]).unwrap();
        assert!(table.is_rejected(1, 2));
        assert!(!table.is_rejected(2, 1));
        assert!(!table.is_symmetric());
    }

    #[test]
    fn set_and_clear() {
        let mut table = RejectTable::all_visible(4);
        assert!(table.is_symmetric());
        table.set(0, 3, true);
        table.set(3, 0, true);
        assert!(table.is_rejected(0, 3));
        assert!(table.is_symmetric());
        table.set(0, 3, false);
        assert!(!table.is_rejected(0, 3));
    }

    #[test]
    fn short_table_is_an_error() {
        let err = RejectTable::from_bytes(5, vec![0; 2]).unwrap_err();
        assert_eq!(
            err,
            LevelError::RejectSize {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn out_of_range_is_visible() {
        let table = RejectTable::from_bytes(2, vec![0xFF]).unwrap();
        assert!(table.is_rejected(1, 1));
        assert!(!table.is_rejected(2, 0));
    }
}
