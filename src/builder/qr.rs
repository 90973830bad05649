use std::ops::Deref;

use crate::common::iter::DataRegionIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{
    format_info, ECLevel, Module, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_MAIN,
    FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Cell {
    Empty,
    Func(Module),
    Version(Module),
    Format(Module),
    Data(Module),
}

impl Deref for Cell {
    type Target = Module;
    fn deref(&self) -> &Self::Target {
        match self {
            Cell::Empty => &Module::Light,
            Cell::Func(m) | Cell::Version(m) | Cell::Format(m) | Cell::Data(m) => m,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QRCode {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask_pattern: Option<MaskPattern>,
    grid: Vec<Cell>,
}

// QR matrix
//------------------------------------------------------------------------------

impl QRCode {
    pub(crate) fn new(version: Version, ec_level: ECLevel) -> Self {
        debug_assert!(matches!(*version, 1..=40), "Invalid version");

        let width = version.width();
        Self { version, width, ec_level, mask_pattern: None, grid: vec![Cell::Empty; width * width] }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask_pattern(&self) -> Option<MaskPattern> {
        self.mask_pattern
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&c| matches!(**c, Module::Dark)).count()
    }

    /// Row-major copy of the module grid.
    pub fn modules(&self) -> Vec<Module> {
        self.grid.iter().map(|cell| **cell).collect()
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.width as i16;
        debug_assert!(-w <= r && r < w, "row out of bounds: {r}");
        debug_assert!(-w <= c && c < w, "column out of bounds: {c}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    /// Module at the given coordinate; negative coordinates wrap around from
    /// the far edge.
    pub fn get(&self, r: i16, c: i16) -> Module {
        *self.cell(r, c)
    }

    pub(crate) fn cell(&self, r: i16, c: i16) -> Cell {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, cell: Cell) {
        let index = self.coord_to_index(r, c);
        self.grid[index] = cell;
    }

    #[cfg(test)]
    pub(crate) fn to_debug_str(&self) -> String {
        let w = self.width as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.cell(i, j) {
                    Cell::Empty => '.',
                    Cell::Func(Module::Dark) => 'f',
                    Cell::Func(Module::Light) => 'F',
                    Cell::Version(Module::Dark) => 'v',
                    Cell::Version(Module::Light) => 'V',
                    Cell::Format(Module::Dark) => 'm',
                    Cell::Format(Module::Light) => 'M',
                    Cell::Data(Module::Dark) => 'd',
                    Cell::Data(Module::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    #[cfg(test)]
    pub(crate) fn fill_data(&mut self, fill: impl Fn(i16, i16) -> Module) {
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                self.set(r, c, Cell::Data(fill(r, c)));
            }
        }
    }
}


// Finder patterns
//------------------------------------------------------------------------------

impl QRCode {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Draws the 7x7 finder with its one module separator, clipped at the
    // symbol boundary
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Cell::Func(Module::Light),
                        (3 | -3, _) | (_, 3 | -3) => Cell::Func(Module::Dark),
                        (2 | -2, _) | (_, 2 | -2) => Cell::Func(Module::Light),
                        _ => Cell::Func(Module::Dark),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod finder_pattern_tests {
    use super::QRCode;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_finder_pattern_v1() {
        let mut qr = QRCode::new(Version(1), ECLevel::L);
        qr.draw_finder_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.....Ffffffff\n\
             fFFFFFfF.....FfFFFFFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFFFFFfF.....FfFFFFFf\n\
             fffffffF.....Ffffffff\n\
             FFFFFFFF.....FFFFFFFF\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             FFFFFFFF.............\n\
             fffffffF.............\n\
             fFFFFFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFFFFFfF.............\n\
             fffffffF.............\n"
        );
    }
}

// Timing patterns
//------------------------------------------------------------------------------

impl QRCode {
    fn draw_timing_patterns(&mut self) {
        let w = self.width as i16;
        self.draw_line(6, 8, 6, w - 9);
        self.draw_line(8, 6, w - 9, 6);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                let m = if j & 1 == 0 { Cell::Func(Module::Dark) } else { Cell::Func(Module::Light) };
                self.set(r1, j, m);
            }
        } else {
            for i in r1..=r2 {
                let m = if i & 1 == 0 { Cell::Func(Module::Dark) } else { Cell::Func(Module::Light) };
                self.set(i, c1, m);
            }
        }
    }
}

#[cfg(test)]
mod timing_pattern_tests {
    use super::QRCode;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_timing_pattern_v1() {
        let mut qr = QRCode::new(Version(1), ECLevel::L);
        qr.draw_timing_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             ........fFfFf........\n\
             .....................\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n"
        );
    }
}

// Alignment patterns
//------------------------------------------------------------------------------

impl QRCode {
    fn draw_alignment_patterns(&mut self) {
        let positions = self.version.alignment_pattern();
        for &r in positions {
            for &c in positions {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.width as i16;
        // Centers whose 5x5 footprint would land on a finder corner are skipped
        if (r <= 8 && c <= 8) || (r <= 8 && c >= w - 8) || (r >= w - 8 && c <= 8) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Cell::Func(Module::Dark),
                        _ => Cell::Func(Module::Light),
                    },
                )
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QRCode {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
        self.draw_dark_module();
    }

    fn draw_dark_module(&mut self) {
        self.set(-8, 8, Cell::Func(Module::Dark));
    }
}


// Format and version info
//------------------------------------------------------------------------------

impl QRCode {
    fn reserve_format_area(&mut self) {
        self.draw_format_info(0);
    }

    fn draw_format_info(&mut self, format_info: u32) {
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Cell::Format(Module::Light),
            Cell::Format(Module::Dark),
            &FORMAT_INFO_COORDS_MAIN,
        );
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Cell::Format(Module::Light),
            Cell::Format(Module::Dark),
            &FORMAT_INFO_COORDS_SIDE,
        );
    }

    fn draw_version_info(&mut self) {
        match *self.version {
            1..=6 => {}
            7..=40 => {
                let version_info = self.version.info();
                self.draw_number(
                    version_info,
                    VERSION_INFO_BIT_LEN,
                    Cell::Version(Module::Light),
                    Cell::Version(Module::Dark),
                    &VERSION_INFO_COORDS_BL,
                );
                self.draw_number(
                    version_info,
                    VERSION_INFO_BIT_LEN,
                    Cell::Version(Module::Light),
                    Cell::Version(Module::Dark),
                    &VERSION_INFO_COORDS_TR,
                );
            }
            _ => unreachable!("Invalid version"),
        }
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_cell: Cell,
        on_cell: Cell,
        coords: &[(i16, i16)],
    ) {
        let mut mask = 1 << (bit_len - 1);
        for (r, c) in coords {
            let cell = if number & mask == 0 { off_cell } else { on_cell };
            self.set(*r, *c, cell);
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QRCode {
    pub(crate) fn draw_encoding_region(&mut self, payload: &[u8]) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Cell::Empty), "Empty cell remains after drawing");
    }

    fn draw_payload(&mut self, payload: &[u8]) {
        let mut coords = DataRegionIter::new(self.version);
        self.draw_codewords(payload, &mut coords);
        self.fill_remainder_bits(&mut coords);
    }

    fn draw_codewords(&mut self, codewords: &[u8], coords: &mut DataRegionIter) {
        for &codeword in codewords {
            for i in (0..8).rev() {
                let bit = (codeword >> i) & 1;
                let module = if bit == 0 { Module::Light } else { Module::Dark };
                for (r, c) in coords.by_ref() {
                    if matches!(self.cell(r, c), Cell::Empty) {
                        self.set(r, c, Cell::Data(module));
                        break;
                    }
                }
            }
        }
    }

    // Whatever the zigzag has left once the payload is exhausted holds the
    // remainder bits, which are always zero
    fn fill_remainder_bits(&mut self, coords: &mut DataRegionIter) {
        let empty_cells =
            coords.filter(|(r, c)| self.cell(*r, *c) == Cell::Empty).collect::<Vec<_>>();
        debug_assert!(
            self.version.remainder_bits() == empty_cells.len(),
            "Incorrect number of empty cells for remainder bits: Version {:?}, Empty cells {}",
            self.version,
            empty_cells.len()
        );
        empty_cells.iter().for_each(|(r, c)| self.set(*r, *c, Cell::Data(Module::Light)));
    }

    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask_pattern = Some(pattern);
        let mask_function = pattern.mask_function();
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_function(r, c) {
                    if let Cell::Data(module) = self.cell(r, c) {
                        self.set(r, c, Cell::Data(!module))
                    }
                }
            }
        }
        let format_info = format_info(self.ec_level, pattern);
        self.draw_format_info(format_info);
    }
}

// Render
//------------------------------------------------------------------------------

impl QRCode {
    /// Renders the symbol as text, two module rows per line, with the 4 module
    /// quiet zone on all sides.
    pub fn to_printable(&self) -> String {
        let total = self.width as i16 + 2 * QUIET_ZONE;
        let mut canvas = String::with_capacity((total as usize * 3 + 1) * total as usize / 2);
        let mut r = 0;
        while r < total {
            for c in 0..total {
                let top = self.quiet_padded(r, c);
                let bottom =
                    if r + 1 < total { self.quiet_padded(r + 1, c) } else { Module::Light };
                canvas.push(match (top, bottom) {
                    (Module::Dark, Module::Dark) => '█',
                    (Module::Dark, Module::Light) => '▀',
                    (Module::Light, Module::Dark) => '▄',
                    (Module::Light, Module::Light) => ' ',
                });
            }
            canvas.push('\n');
            r += 2;
        }
        canvas
    }

    /// Renders the symbol as an SVG with one unit per module and the 4 module
    /// quiet zone on all sides.
    pub fn to_svg(&self) -> String {
        let w = self.width as i16;
        let total = w + 2 * QUIET_ZONE;
        let mut svg =
            format!("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {total} {total}\">");
        svg.push_str(&format!("<rect width=\"{total}\" height=\"{total}\" fill=\"white\"/>"));
        svg.push_str("<g fill=\"black\" shape-rendering=\"crispEdges\">");
        for r in 0..w {
            for c in 0..w {
                if self.get(r, c) == Module::Dark {
                    svg.push_str(&format!(
                        "<rect x=\"{}\" y=\"{}\" width=\"1\" height=\"1\"/>",
                        c + QUIET_ZONE,
                        r + QUIET_ZONE
                    ));
                }
            }
        }
        svg.push_str("</g></svg>");
        svg
    }

    fn quiet_padded(&self, r: i16, c: i16) -> Module {
        let w = self.width as i16;
        let (r, c) = (r - QUIET_ZONE, c - QUIET_ZONE);
        if r < 0 || c < 0 || r >= w || c >= w {
            Module::Light
        } else {
            self.get(r, c)
        }
    }
}

// Global constants
//------------------------------------------------------------------------------

const QUIET_ZONE: i16 = 4;
