use crate::{interrupts::Interrupt, memory::Memory};

pub mod pipeline;

use pipeline::{Dot, Fetcher, Fifo, LINE_DOTS, Palette, Source, TileData, decode_tile_line};

// Screen resolution used by the Game Boy PPU
pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Timing constants per LCD mode in T-cycles
const MODE0_CYCLES: u32 = 204; // HBlank
const MODE1_CYCLES: u32 = 456; // One line during VBlank
const MODE2_CYCLES: u32 = 80; // OAM scan
const MODE3_CYCLES: u32 = 172; // Pixel transfer

/// Cycles for one full scanline.
pub const LINE_CYCLES: u32 = MODE2_CYCLES + MODE3_CYCLES + MODE0_CYCLES;
/// Cycles for one full frame, VBlank included.
pub const FRAME_CYCLES: u32 = LINE_CYCLES * TOTAL_LINES as u32;

// Number of lines spent in VBlank
const VBLANK_LINES: u8 = 10;
const TOTAL_LINES: u8 = SCREEN_HEIGHT as u8 + VBLANK_LINES;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Internal memory sizes
const VRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;

// Window X position is clipped if greater than this value
const WINDOW_X_MAX: u8 = 166;

// VRAM layout constants
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;

// LCD modes used in the `mode` field
pub const MODE_HBLANK: u8 = 0;
pub const MODE_VBLANK: u8 = 1;
pub const MODE_OAM: u8 = 2;
pub const MODE_TRANSFER: u8 = 3;

// LCDC bits
const LCDC_BG_ENABLE: u8 = 0x01;
const LCDC_OBJ_ENABLE: u8 = 0x02;
const LCDC_OBJ_SIZE: u8 = 0x04;
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_TILE_DATA: u8 = 0x10;
const LCDC_WINDOW_ENABLE: u8 = 0x20;
const LCDC_WINDOW_MAP: u8 = 0x40;
const LCDC_LCD_ENABLE: u8 = 0x80;

// STAT interrupt enables
const STAT_HBLANK_IRQ: u8 = 0x08;
const STAT_VBLANK_IRQ: u8 = 0x10;
const STAT_OAM_IRQ: u8 = 0x20;
const STAT_LYC_IRQ: u8 = 0x40;

// Sprite attribute bits
const ATTR_BEHIND_BG: u8 = 0x80;
const ATTR_Y_FLIP: u8 = 0x40;
const ATTR_X_FLIP: u8 = 0x20;
const ATTR_PALETTE: u8 = 0x10;

/// Default DMG palette colors in 0x00RRGGBB order.
pub const DMG_PALETTE: [u32; 4] = [0x009BBC0F, 0x008BAC0F, 0x00306230, 0x000F380F];

/// One OAM entry as selected for a scanline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sprite {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub attributes: u8,
    pub oam_index: u8,
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    pub oam: [u8; OAM_SIZE],

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    lyc_eq_ly: bool,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    /// Internal window line counter
    win_line_counter: u8,

    mode_clock: u32,
    mode: u8,

    pub framebuffer: [u32; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Sprites selected by the last OAM search
    line_sprites: [Sprite; MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    /// Sprite height in effect when `line_sprites` was filled
    line_sprite_height: u8,
    fifo: Fifo,
    /// Indicates a completed frame is available in `framebuffer`
    frame_ready: bool,
    frame_counter: u64,
}

impl Ppu {
    /// LCD off with all registers cleared.
    pub fn new() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            lyc_eq_ly: false,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            win_line_counter: 0,
            mode_clock: 0,
            mode: MODE_HBLANK,
            framebuffer: [DMG_PALETTE[0]; SCREEN_WIDTH * SCREEN_HEIGHT],
            line_sprites: [Sprite::default(); MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            line_sprite_height: 8,
            fifo: Fifo::new(),
            frame_ready: false,
            frame_counter: 0,
        }
    }

    /// LCD on at the start of a frame, with the palette the boot ROM
    /// leaves behind.
    pub fn post_boot() -> Self {
        let mut ppu = Self::new();
        ppu.lcdc = 0x91;
        ppu.bgp = 0xFC;
        ppu.mode = MODE_OAM;
        ppu.lyc_eq_ly = ppu.ly == ppu.lyc;
        ppu
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & LCDC_LCD_ENABLE != 0
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    /// Frames completed since power on.
    pub fn frames(&self) -> u64 {
        self.frame_counter
    }

    pub fn window_line_counter(&self) -> u8 {
        self.win_line_counter
    }

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.framebuffer
    }

    /// Sprites chosen for the current scanline, in OAM order.
    pub fn line_sprites(&self) -> &[Sprite] {
        &self.line_sprites[..self.sprite_count]
    }

    fn sprite_height(&self) -> u8 {
        if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 }
    }

    /// Collect up to 10 sprites whose rows cover the current scanline.
    /// OAM order is kept; X = 0 hides a sprite and it is not selected.
    pub fn oam_search(&mut self) {
        self.line_sprite_height = self.sprite_height();
        let height = self.line_sprite_height as u16;
        let target = self.ly as u16 + 16;
        self.sprite_count = 0;
        for i in 0..TOTAL_SPRITES {
            if self.sprite_count >= MAX_SPRITES_PER_LINE {
                break;
            }
            let base = i * 4;
            let y = self.oam[base];
            let x = self.oam[base + 1];
            if x == 0 || target < y as u16 || target >= y as u16 + height {
                continue;
            }
            self.line_sprites[self.sprite_count] = Sprite {
                y,
                x,
                tile: self.oam[base + 2],
                attributes: self.oam[base + 3],
                oam_index: i as u8,
            };
            self.sprite_count += 1;
        }
    }

    /// Advance by `cycles` master cycles. Returns the interrupt bits to
    /// request (see [`Interrupt::bit`]).
    pub fn step(&mut self, cycles: u32) -> u8 {
        if !self.lcd_enabled() {
            return 0;
        }

        let mut requested = 0;
        let mut remaining = cycles;
        while remaining > 0 {
            let increment = remaining.min(4);
            remaining -= increment;
            self.mode_clock += increment;

            match self.mode {
                MODE_OAM => {
                    if self.mode_clock >= MODE2_CYCLES {
                        self.mode_clock -= MODE2_CYCLES;
                        self.oam_search();
                        self.mode = MODE_TRANSFER;
                    }
                }
                MODE_TRANSFER => {
                    if self.mode_clock >= MODE3_CYCLES {
                        self.mode_clock -= MODE3_CYCLES;
                        self.render_scanline();
                        requested |= self.enter_mode(MODE_HBLANK);
                    }
                }
                MODE_HBLANK => {
                    if self.mode_clock >= MODE0_CYCLES {
                        self.mode_clock -= MODE0_CYCLES;
                        self.ly += 1;
                        if self.ly == SCREEN_HEIGHT as u8 {
                            self.frame_ready = true;
                            self.frame_counter = self.frame_counter.wrapping_add(1);
                            requested |= self.enter_mode(MODE_VBLANK);
                        } else {
                            requested |= self.enter_mode(MODE_OAM);
                        }
                    }
                }
                _ => {
                    if self.mode_clock >= MODE1_CYCLES {
                        self.mode_clock -= MODE1_CYCLES;
                        self.ly += 1;
                        if self.ly == TOTAL_LINES {
                            self.ly = 0;
                            self.win_line_counter = 0;
                            requested |= self.enter_mode(MODE_OAM);
                        }
                    }
                }
            }

            requested |= self.compare_lyc();
        }
        requested
    }

    fn enter_mode(&mut self, mode: u8) -> u8 {
        self.mode = mode;
        let (stat_enable, base) = match mode {
            MODE_HBLANK => (STAT_HBLANK_IRQ, 0),
            MODE_VBLANK => (STAT_VBLANK_IRQ, Interrupt::VBlank.bit()),
            MODE_OAM => (STAT_OAM_IRQ, 0),
            _ => (0, 0),
        };
        if self.stat & stat_enable != 0 {
            base | Interrupt::LcdStat.bit()
        } else {
            base
        }
    }

    /// Update the coincidence flag; fires on its rising edge.
    fn compare_lyc(&mut self) -> u8 {
        let equal = self.ly == self.lyc;
        let rising = equal && !self.lyc_eq_ly;
        self.lyc_eq_ly = equal;
        if rising && self.stat & STAT_LYC_IRQ != 0 {
            Interrupt::LcdStat.bit()
        } else {
            0
        }
    }

    #[inline(always)]
    fn dmg_shade(palette: u8, color_id: u8) -> u8 {
        (palette >> (color_id * 2)) & 0x03
    }

    fn resolve(&self, dot: Dot) -> u32 {
        if dot.source != Source::Sprite && self.lcdc & LCDC_BG_ENABLE == 0 {
            return DMG_PALETTE[0];
        }
        let palette = match dot.palette {
            Palette::Bgp => self.bgp,
            Palette::Obp0 => self.obp0,
            Palette::Obp1 => self.obp1,
        };
        DMG_PALETTE[Self::dmg_shade(palette, dot.color) as usize]
    }

    /// The 8 dots of `sprite` on the current line, X flip applied. Uses the
    /// height from the OAM search, since LCDC may change during mode 3.
    fn sprite_line(&self, sprite: &Sprite) -> [Dot; LINE_DOTS] {
        let height = self.line_sprite_height;
        let mut row = self.ly.wrapping_add(16).wrapping_sub(sprite.y) & (height - 1);
        if sprite.attributes & ATTR_Y_FLIP != 0 {
            row = height - 1 - row;
        }
        let tile = if height == 16 {
            sprite.tile & 0xFE
        } else {
            sprite.tile
        };
        let addr = tile as usize * 16 + row as usize * 2;
        let mut colors = decode_tile_line(self.vram[addr], self.vram[addr + 1]);
        if sprite.attributes & ATTR_X_FLIP != 0 {
            colors.reverse();
        }
        let palette = if sprite.attributes & ATTR_PALETTE != 0 {
            Palette::Obp1
        } else {
            Palette::Obp0
        };
        let priority = u8::from(sprite.attributes & ATTR_BEHIND_BG != 0);
        colors.map(|color| Dot::sprite(color, palette, priority))
    }

    /// Mix every sprite that starts at output column `x` into the FIFO head.
    /// Sprites hanging off the left edge are mixed in at column 0 with their
    /// hidden columns dropped.
    fn overlay_sprites(&mut self, x: usize) {
        for i in 0..self.sprite_count {
            let sprite = self.line_sprites[i];
            let start = sprite.x as isize - 8;
            let clipped = if x == 0 && start < 0 {
                (-start) as usize
            } else if start == x as isize {
                0
            } else {
                continue;
            };
            let dots = self.sprite_line(&sprite);
            for (offset, dot) in dots.iter().enumerate().skip(clipped) {
                self.fifo.overlay(offset - clipped, *dot);
            }
        }
    }

    fn render_scanline(&mut self) {
        let ly = self.ly as usize;
        if ly >= SCREEN_HEIGHT {
            return;
        }

        let tile_data = if self.lcdc & LCDC_TILE_DATA != 0 {
            TileData::Unsigned
        } else {
            TileData::Signed
        };
        let bg_map = if self.lcdc & LCDC_BG_MAP != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let win_map = if self.lcdc & LCDC_WINDOW_MAP != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let sprites_enabled = self.lcdc & LCDC_OBJ_ENABLE != 0;
        let window_visible = self.lcdc & LCDC_BG_ENABLE != 0
            && self.lcdc & LCDC_WINDOW_ENABLE != 0
            && self.wy <= self.ly
            && self.wx <= WINDOW_X_MAX;
        let window_start = self.wx as isize - 7;

        let mut fetcher = Fetcher::new(
            bg_map,
            tile_data,
            self.scy.wrapping_add(self.ly),
            self.scx / 8,
        );
        let mut discard = (self.scx % 8) as usize;
        let mut in_window = false;
        self.fifo.clear();

        for x in 0..SCREEN_WIDTH {
            if window_visible && !in_window && window_start.max(0) == x as isize {
                // Hard seam: background dots still queued are dropped, sprite
                // dots already mixed in survive.
                let carried = self.fifo.sprite_dots();
                self.fifo.clear();
                fetcher = Fetcher::new(win_map, tile_data, self.win_line_counter, 0);
                self.fifo.refill(&mut fetcher, &self.vram);
                for (offset, dot) in carried {
                    self.fifo.overlay(offset, dot);
                }
                discard = if window_start < 0 {
                    (-window_start) as usize
                } else {
                    0
                };
                in_window = true;
            }

            while discard > 0 {
                self.fifo.refill(&mut fetcher, &self.vram);
                self.fifo.pop();
                discard -= 1;
            }
            self.fifo.refill(&mut fetcher, &self.vram);

            if sprites_enabled {
                self.overlay_sprites(x);
            }

            let dot = self.fifo.pop().unwrap_or(Dot::background(0));
            self.framebuffer[ly * SCREEN_WIDTH + x] = self.resolve(dot);
        }

        if in_window {
            self.win_line_counter = self.win_line_counter.wrapping_add(1);
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Ppu {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize],
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],
            0xFF40 => self.lcdc,
            0xFF41 => {
                (self.stat & 0x78)
                    | 0x80
                    | (self.mode & 0x03)
                    | if self.lyc_eq_ly { 0x04 } else { 0 }
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize] = val,
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize] = val,
            0xFF40 => {
                let was_on = self.lcd_enabled();
                self.lcdc = val;
                if was_on && !self.lcd_enabled() {
                    self.mode = MODE_HBLANK;
                    self.mode_clock = 0;
                    self.win_line_counter = 0;
                    self.ly = 0;
                    log::debug!("ppu: LCD off");
                } else if !was_on && self.lcd_enabled() {
                    self.mode = MODE_OAM;
                    self.mode_clock = 0;
                    self.ly = 0;
                    self.lyc_eq_ly = false;
                    log::debug!("ppu: LCD on");
                }
            }
            0xFF41 => self.stat = val & 0x78,
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            0xFF44 => {}
            0xFF45 => self.lyc = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_sprite(ppu: &mut Ppu, slot: usize, y: u8, x: u8) {
        ppu.oam[slot * 4] = y;
        ppu.oam[slot * 4 + 1] = x;
    }

    #[test]
    fn oam_search_caps_at_ten_in_oam_order() {
        let mut ppu = Ppu::post_boot();
        for slot in 0..12 {
            place_sprite(&mut ppu, slot, 16, 80 - slot as u8);
        }
        ppu.oam_search();
        let selected: Vec<u8> = ppu.line_sprites().iter().map(|s| s.oam_index).collect();
        assert_eq!(selected, (0..10).collect::<Vec<u8>>());
    }

    #[test]
    fn oam_search_skips_hidden_and_off_line_sprites() {
        let mut ppu = Ppu::post_boot();
        place_sprite(&mut ppu, 0, 16, 0);
        place_sprite(&mut ppu, 1, 8, 8);
        place_sprite(&mut ppu, 2, 10, 8);
        place_sprite(&mut ppu, 3, 17, 8);
        ppu.oam_search();
        let selected: Vec<u8> = ppu.line_sprites().iter().map(|s| s.oam_index).collect();
        assert_eq!(selected, vec![2]);

        ppu.write_byte(0xFF40, 0x91 | LCDC_OBJ_SIZE);
        ppu.oam_search();
        assert_eq!(ppu.line_sprites().len(), 2);
    }

    #[test]
    fn scanline_visits_modes_in_order() {
        let mut ppu = Ppu::post_boot();
        assert_eq!(ppu.mode(), MODE_OAM);
        ppu.step(MODE2_CYCLES);
        assert_eq!(ppu.mode(), MODE_TRANSFER);
        ppu.step(MODE3_CYCLES);
        assert_eq!(ppu.mode(), MODE_HBLANK);
        assert_eq!(ppu.ly(), 0);
        ppu.step(MODE0_CYCLES);
        assert_eq!(ppu.mode(), MODE_OAM);
        assert_eq!(ppu.ly(), 1);
    }

    #[test]
    fn stat_read_reports_mode_and_coincidence() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF41, 0xFF);
        assert_eq!(ppu.read_byte(0xFF41), 0x80 | 0x78 | 0x04 | MODE_OAM);
        ppu.write_byte(0xFF44, 0x50);
        assert_eq!(ppu.read_byte(0xFF44), 0);
    }

    #[test]
    fn lyc_match_fires_once_per_edge() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF45, 2);
        ppu.write_byte(0xFF41, STAT_LYC_IRQ);
        assert_eq!(ppu.step(LINE_CYCLES), 0);
        assert_eq!(ppu.step(LINE_CYCLES), Interrupt::LcdStat.bit());
        assert_eq!(ppu.step(4), 0);
    }

    #[test]
    fn hblank_entry_fires_stat_when_enabled() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF41, STAT_HBLANK_IRQ);
        assert_eq!(ppu.step(MODE2_CYCLES), 0);
        assert_eq!(ppu.step(MODE3_CYCLES), Interrupt::LcdStat.bit());
        assert_eq!(ppu.step(MODE0_CYCLES), 0);
    }

    #[test]
    fn oam_entry_fires_stat_when_enabled() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF41, STAT_OAM_IRQ);
        assert_eq!(ppu.step(MODE2_CYCLES), 0);
        assert_eq!(ppu.step(MODE3_CYCLES), 0);
        assert_eq!(ppu.step(MODE0_CYCLES), Interrupt::LcdStat.bit());
        assert_eq!(ppu.mode(), MODE_OAM);
    }

    #[test]
    fn vblank_entry_fires_stat_alongside_vblank() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF41, STAT_VBLANK_IRQ);
        assert_eq!(ppu.step(LINE_CYCLES * 143), 0);
        assert_eq!(
            ppu.step(LINE_CYCLES),
            Interrupt::VBlank.bit() | Interrupt::LcdStat.bit()
        );
        assert_eq!(ppu.mode(), MODE_VBLANK);

        let mut quiet = Ppu::post_boot();
        assert_eq!(quiet.step(LINE_CYCLES * 143), 0);
        assert_eq!(quiet.step(LINE_CYCLES), Interrupt::VBlank.bit());
    }

    #[test]
    fn obj_size_change_during_transfer_keeps_search_height() {
        let mut ppu = Ppu::post_boot();
        ppu.write_byte(0xFF40, 0x91 | LCDC_OBJ_ENABLE | LCDC_OBJ_SIZE);
        ppu.write_byte(0xFF48, 0xE4);
        // Y-flipped 8x16 sprite covering row 12 on LY 0, which reads row 3.
        place_sprite(&mut ppu, 0, 4, 8);
        ppu.oam[3] = ATTR_Y_FLIP;
        ppu.vram[6] = 0xFF;
        ppu.vram[7] = 0xFF;

        ppu.step(MODE2_CYCLES);
        assert_eq!(ppu.line_sprites().len(), 1);
        ppu.write_byte(0xFF40, 0x91 | LCDC_OBJ_ENABLE);
        ppu.step(MODE3_CYCLES);

        assert_eq!(ppu.mode(), MODE_HBLANK);
        assert_eq!(ppu.framebuffer()[0], DMG_PALETTE[3]);
        assert_eq!(ppu.framebuffer()[8], DMG_PALETTE[0]);
    }

    #[test]
    fn lcd_off_parks_at_line_zero() {
        let mut ppu = Ppu::post_boot();
        ppu.step(LINE_CYCLES * 3);
        ppu.write_byte(0xFF40, 0x11);
        assert_eq!(ppu.ly(), 0);
        assert_eq!(ppu.mode(), MODE_HBLANK);
        assert_eq!(ppu.step(LINE_CYCLES * 200), 0);
        assert_eq!(ppu.ly(), 0);
    }
}
