/// Bar fill, the first category10 colour
pub const BAR: (u8, u8, u8) = CATEGORY10[0];

/// The category10 palette, used for pie slices in order
pub const CATEGORY10: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4),
    (0xff, 0x7f, 0x0e),
    (0x2c, 0xa0, 0x2c),
    (0xd6, 0x27, 0x28),
    (0x94, 0x67, 0xbd),
    (0x8c, 0x56, 0x4b),
    (0xe3, 0x77, 0xc2),
    (0x7f, 0x7f, 0x7f),
    (0xbc, 0xbd, 0x22),
    (0x17, 0xbe, 0xcf),
];

/// Colour for the slice at `index`, cycling through the palette
pub fn slice_color(index: usize) -> (u8, u8, u8) {
    CATEGORY10[index % CATEGORY10.len()]
}
