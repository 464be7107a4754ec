//! Pixel pipeline: tile fetcher and pixel FIFO.
//!
//! The fetcher walks one row of a tile map and turns each tile into a line
//! of eight [`Dot`]s; the FIFO buffers them until the renderer shifts them
//! out one pixel at a time. Sprites are mixed into the FIFO head just
//! before their first pixel leaves.

use std::collections::VecDeque;

/// Dots a full tile line adds to the FIFO.
pub const LINE_DOTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Background,
    Sprite,
    /// Background that won over a behind-background sprite. The slot still
    /// counts as taken by that sprite.
    Covered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Bgp,
    Obp0,
    Obp1,
}

/// One pixel before palette lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dot {
    /// 2-bit color index.
    pub color: u8,
    pub palette: Palette,
    /// For sprites, 1 when the sprite is drawn behind background colors 1-3.
    pub priority: u8,
    pub source: Source,
}

impl Dot {
    pub const fn background(color: u8) -> Self {
        Self {
            color,
            palette: Palette::Bgp,
            priority: 0,
            source: Source::Background,
        }
    }

    pub const fn sprite(color: u8, palette: Palette, priority: u8) -> Self {
        Self {
            color,
            palette,
            priority,
            source: Source::Sprite,
        }
    }
}

/// Expand a pair of bit-plane bytes into eight color indices, leftmost
/// pixel first. The high plane supplies bit 1.
#[inline]
pub fn decode_tile_line(lo: u8, hi: u8) -> [u8; LINE_DOTS] {
    let mut colors = [0; LINE_DOTS];
    for (i, color) in colors.iter_mut().enumerate() {
        let bit = 7 - i;
        *color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
    }
    colors
}

/// Tile data addressing selected by LCDC bit 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileData {
    /// 0x8000-0x8FFF, tile index 0-255.
    Unsigned,
    /// 0x8800-0x97FF, tile index -128..127 around 0x9000.
    Signed,
}

impl TileData {
    /// VRAM offset (from 0x8000) of row `row` of tile `index`.
    #[inline]
    pub fn row_offset(self, index: u8, row: u8) -> usize {
        let tile = match self {
            TileData::Unsigned => index as usize * 16,
            TileData::Signed => 0x0800 + ((index as i8 as i16 + 128) as usize) * 16,
        };
        tile + (row as usize & 0x07) * 2
    }
}

/// Cursor over one row of a 32x32 tile map.
#[derive(Clone, Copy, Debug)]
pub struct Fetcher {
    /// VRAM offset of the tile map (0x1800 or 0x1C00).
    map_base: usize,
    tile_data: TileData,
    /// Pixel row within the 256-pixel map, scroll already applied.
    line: u8,
    /// Next tile column, wraps at 32.
    column: u8,
}

impl Fetcher {
    pub fn new(map_base: usize, tile_data: TileData, line: u8, column: u8) -> Self {
        Self {
            map_base,
            tile_data,
            line,
            column: column & 0x1F,
        }
    }

    /// Read the next tile and advance one column.
    pub fn fetch(&mut self, vram: &[u8]) -> [Dot; LINE_DOTS] {
        let map_addr = self.map_base + (self.line as usize / 8) * 32 + self.column as usize;
        let index = vram[map_addr];
        let row = self.tile_data.row_offset(index, self.line % 8);
        let colors = decode_tile_line(vram[row], vram[row + 1]);
        self.column = (self.column + 1) & 0x1F;
        colors.map(Dot::background)
    }
}

#[derive(Debug, Default)]
pub struct Fifo {
    dots: VecDeque<Dot>,
}

impl Fifo {
    pub fn new() -> Self {
        Self {
            dots: VecDeque::with_capacity(2 * LINE_DOTS),
        }
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    pub fn clear(&mut self) {
        self.dots.clear();
    }

    pub fn push_line(&mut self, line: [Dot; LINE_DOTS]) {
        self.dots.extend(line);
    }

    /// Keep at least one full line buffered.
    pub fn refill(&mut self, fetcher: &mut Fetcher, vram: &[u8]) {
        while self.dots.len() < LINE_DOTS {
            self.push_line(fetcher.fetch(vram));
        }
    }

    pub fn pop(&mut self) -> Option<Dot> {
        self.dots.pop_front()
    }

    /// Sprite dots currently buffered, by distance from the head.
    pub fn sprite_dots(&self) -> Vec<(usize, Dot)> {
        self.dots
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, dot)| dot.source == Source::Sprite)
            .collect()
    }

    /// Mix a sprite dot into the slot `offset` dots from the head.
    ///
    /// Color 0 is transparent. The first opaque sprite dot claims the slot,
    /// and a behind-background sprite only shows over background color 0.
    pub fn overlay(&mut self, offset: usize, dot: Dot) {
        let Some(slot) = self.dots.get_mut(offset) else {
            return;
        };
        if dot.color == 0 || slot.source != Source::Background {
            return;
        }
        if dot.priority != 0 && slot.color != 0 {
            slot.source = Source::Covered;
            return;
        }
        *slot = dot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_lines_decode_msb_first() {
        assert_eq!(decode_tile_line(0xF0, 0xCC), [3, 3, 1, 1, 2, 2, 0, 0]);
    }

    #[test]
    fn signed_tiles_frame_around_0x9000() {
        assert_eq!(TileData::Unsigned.row_offset(0x80, 0), 0x0800);
        assert_eq!(TileData::Signed.row_offset(0x00, 0), 0x1000);
        assert_eq!(TileData::Signed.row_offset(0x80, 0), 0x0800);
        assert_eq!(TileData::Signed.row_offset(0xFF, 3), 0x0FF6);
    }

    #[test]
    fn fetcher_walks_the_map_row_and_wraps() {
        let mut vram = vec![0u8; 0x2000];
        // Tile 1 row 2 is solid color 3; the map row for line 10 uses it
        // at column 31.
        vram[0x10 + 4] = 0xFF;
        vram[0x10 + 5] = 0xFF;
        vram[0x1800 + 32 + 31] = 1;

        let mut fetcher = Fetcher::new(0x1800, TileData::Unsigned, 10, 31);
        let first = fetcher.fetch(&vram);
        assert!(first.iter().all(|dot| dot.color == 3));
        let second = fetcher.fetch(&vram);
        assert!(second.iter().all(|dot| dot.color == 0));
    }

    #[test]
    fn fifo_keeps_a_full_line_buffered() {
        let vram = vec![0u8; 0x2000];
        let mut fetcher = Fetcher::new(0x1800, TileData::Unsigned, 0, 0);
        let mut fifo = Fifo::new();
        fifo.refill(&mut fetcher, &vram);
        assert_eq!(fifo.len(), 8);
        fifo.pop();
        fifo.refill(&mut fetcher, &vram);
        assert_eq!(fifo.len(), 15);
    }

    #[test]
    fn overlay_honors_transparency_and_priority() {
        let mut fifo = Fifo::new();
        fifo.push_line([
            Dot::background(0),
            Dot::background(2),
            Dot::background(0),
            Dot::background(2),
            Dot::background(1),
            Dot::background(1),
            Dot::background(1),
            Dot::background(1),
        ]);
        fifo.overlay(0, Dot::sprite(0, Palette::Obp0, 0));
        fifo.overlay(1, Dot::sprite(1, Palette::Obp0, 0));
        fifo.overlay(2, Dot::sprite(1, Palette::Obp1, 1));
        fifo.overlay(3, Dot::sprite(1, Palette::Obp1, 1));
        fifo.overlay(1, Dot::sprite(3, Palette::Obp1, 0));

        assert_eq!(fifo.pop(), Some(Dot::background(0)));
        assert_eq!(fifo.pop(), Some(Dot::sprite(1, Palette::Obp0, 0)));
        assert_eq!(fifo.pop(), Some(Dot::sprite(1, Palette::Obp1, 1)));
        assert_eq!(
            fifo.pop(),
            Some(Dot {
                source: Source::Covered,
                ..Dot::background(2)
            })
        );
    }

    #[test]
    fn background_win_still_blocks_later_sprites() {
        let mut fifo = Fifo::new();
        fifo.push_line([Dot::background(1); LINE_DOTS]);
        fifo.overlay(0, Dot::sprite(2, Palette::Obp0, 1));
        fifo.overlay(0, Dot::sprite(3, Palette::Obp1, 0));
        fifo.overlay(1, Dot::sprite(0, Palette::Obp0, 1));
        fifo.overlay(1, Dot::sprite(3, Palette::Obp1, 0));

        let first = fifo.pop().unwrap();
        assert_eq!(first.source, Source::Covered);
        assert_eq!(first.color, 1);
        assert_eq!(first.palette, Palette::Bgp);
        assert_eq!(fifo.pop(), Some(Dot::sprite(3, Palette::Obp1, 0)));
    }
}
