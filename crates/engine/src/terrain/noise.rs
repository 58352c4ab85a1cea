//! Integer gradient noise: 2D Perlin and 3D simplex on 64.61 fixed point.
//!
//! Both noises hash lattice points through the classic 256-entry permutation
//! table, so output depends only on the inputs and the seed.

use super::fixed::Fixed;

/// Ken Perlin's reference permutation.
const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn perm(v: i64) -> u8 {
    PERM[v.rem_euclid(256) as usize]
}

/// Chain `coords` through the permutation table. Adding modulo 2^64 is
/// harmless because only the value modulo 256 is ever looked up.
#[inline]
fn chain(coords: &[i64]) -> u8 {
    coords
        .iter()
        .skip(1)
        .fold(perm(coords[0]), |acc, &c| perm(c.wrapping_add(acc as i64)))
}

/// Hash of an integer lattice point, in `0..256`.
#[inline]
pub fn hash3(a: i64, b: i64, c: i64) -> u8 {
    chain(&[a, b, c])
}

#[inline]
fn hash4(a: i64, b: i64, c: i64, d: i64) -> u8 {
    chain(&[a, b, c, d])
}

// ── Perlin 2D ────────────────────────────────────────────────────────────

/// cos(45°) in 64.61.
const HALF_SQRT: Fixed = Fixed(1_630_477_227_105_714_176);

const PERLIN_GRADIENTS: [(Fixed, Fixed); 8] = [
    (Fixed(-HALF_SQRT.0), Fixed(-HALF_SQRT.0)),
    (Fixed(-HALF_SQRT.0), HALF_SQRT),
    (HALF_SQRT, Fixed(-HALF_SQRT.0)),
    (HALF_SQRT, HALF_SQRT),
    (Fixed::ZERO, Fixed::ONE),
    (Fixed::ONE, Fixed::ZERO),
    (Fixed::ZERO, Fixed(-Fixed::ONE.0)),
    (Fixed(-Fixed::ONE.0), Fixed::ZERO),
];

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
fn fade(t: Fixed) -> Fixed {
    let t2 = t * t;
    let t3 = t2 * t;
    (t2 * t3).scale(6) - (t2 * t2).scale(15) + t3.scale(10)
}

fn lerp(a: Fixed, b: Fixed, t: Fixed) -> Fixed {
    a + (b - a) * t
}

fn perlin_corner(cx: i64, cy: i64, seed: i64, dx: Fixed, dy: Fixed) -> Fixed {
    let (gx, gy) = PERLIN_GRADIENTS[(hash3(cx, cy, seed) % 8) as usize];
    gx * dx + gy * dy
}

/// 2D Perlin noise sampled at `(x, y) / scale`. Output is roughly in
/// `[-0.71, 0.71]`.
pub fn perlin2(x: i64, y: i64, scale: i64, seed: i64) -> Fixed {
    let xs = Fixed::ratio(x, scale);
    let ys = Fixed::ratio(y, scale);
    let (cx, cy) = (xs.floor(), ys.floor());
    let (fx, fy) = (xs.fract(), ys.fract());

    let n00 = perlin_corner(cx, cy, seed, fx, fy);
    // Lattice indices only reach the hash modulo 256, so wrapping is exact.
    let (cx1, cy1) = (cx.wrapping_add(1), cy.wrapping_add(1));
    let n10 = perlin_corner(cx1, cy, seed, fx - Fixed::ONE, fy);
    let n01 = perlin_corner(cx, cy1, seed, fx, fy - Fixed::ONE);
    let n11 = perlin_corner(cx1, cy1, seed, fx - Fixed::ONE, fy - Fixed::ONE);

    let u = fade(fx);
    let v = fade(fy);
    lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
}

// ── Simplex 3D ───────────────────────────────────────────────────────────

/// Skew factor 1/3.
const SKEW: Fixed = Fixed(768_614_336_404_564_650);
/// Unskew factor 1/6.
const UNSKEW: Fixed = Fixed(384_307_168_202_282_325);
/// Kernel radius squared, 0.6.
const RADIUS_SQUARED: Fixed = Fixed(1_383_505_805_528_216_371);

/// The 12 cube-edge midpoints.
const SIMPLEX_GRADIENTS: [[i8; 3]; 12] = [
    [1, 1, 0],
    [-1, 1, 0],
    [1, -1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, 1],
    [1, 0, -1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, 1],
    [0, 1, -1],
    [0, -1, -1],
];

fn simplex_corner(cell: [i64; 3], seed: i64, d: [Fixed; 3]) -> Fixed {
    let t = RADIUS_SQUARED - d[0] * d[0] - d[1] * d[1] - d[2] * d[2];
    if t < Fixed::ZERO {
        return Fixed::ZERO;
    }
    let g = SIMPLEX_GRADIENTS[(hash4(cell[0], cell[1], cell[2], seed) % 12) as usize];
    let dot = d[0].scale(g[0] as i64) + d[1].scale(g[1] as i64) + d[2].scale(g[2] as i64);
    let t2 = t * t;
    (t2 * t2) * dot
}

/// 3D simplex noise sampled at `(x, y, z) / scale`. Output is roughly in
/// `[-1, 1]`.
pub fn simplex3(x: i64, y: i64, z: i64, scale: i64, seed: i64) -> Fixed {
    let p = [
        Fixed::ratio(x, scale),
        Fixed::ratio(y, scale),
        Fixed::ratio(z, scale),
    ];

    let skew = (p[0] + p[1] + p[2]) * SKEW;
    let cell = [
        (p[0] + skew).floor(),
        (p[1] + skew).floor(),
        (p[2] + skew).floor(),
    ];
    let unskew =
        (Fixed::from_int(cell[0]) + Fixed::from_int(cell[1]) + Fixed::from_int(cell[2])) * UNSKEW;
    let d0 = [
        p[0] - Fixed::from_int(cell[0]) + unskew,
        p[1] - Fixed::from_int(cell[1]) + unskew,
        p[2] - Fixed::from_int(cell[2]) + unskew,
    ];

    // Which of the six tetrahedra of the skewed cube the point falls in.
    let (o1, o2): ([i64; 3], [i64; 3]) = if d0[0] >= d0[1] {
        if d0[1] >= d0[2] {
            ([1, 0, 0], [1, 1, 0])
        } else if d0[0] >= d0[2] {
            ([1, 0, 0], [1, 0, 1])
        } else {
            ([0, 0, 1], [1, 0, 1])
        }
    } else if d0[1] < d0[2] {
        ([0, 0, 1], [0, 1, 1])
    } else if d0[0] < d0[2] {
        ([0, 1, 0], [0, 1, 1])
    } else {
        ([0, 1, 0], [1, 1, 0])
    };

    let corner = |offset: [i64; 3], steps: i64| -> Fixed {
        let shift = UNSKEW.scale(steps);
        let d = [
            d0[0] - Fixed::from_int(offset[0]) + shift,
            d0[1] - Fixed::from_int(offset[1]) + shift,
            d0[2] - Fixed::from_int(offset[2]) + shift,
        ];
        let c = [
            cell[0].wrapping_add(offset[0]),
            cell[1].wrapping_add(offset[1]),
            cell[2].wrapping_add(offset[2]),
        ];
        simplex_corner(c, seed, d)
    };

    let sum = corner([0, 0, 0], 0) + corner(o1, 1) + corner(o2, 2) + corner([1, 1, 1], 3);
    sum.scale(32)
}
