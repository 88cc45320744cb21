//! Portable per-lane fallback

use super::MODULUS;

#[inline]
fn lane(a: u128, i: usize) -> u32 {
    (a >> (32 * i)) as u32
}

#[inline]
fn map2(a: u128, b: u128, op: impl Fn(u32, u32) -> u32) -> u128 {
    (0..4).fold(0u128, |acc, i| {
        acc | ((op(lane(a, i), lane(b, i)) as u128) << (32 * i))
    })
}

#[inline]
pub fn add(a: u128, b: u128) -> u128 {
    map2(a, b, |x, y| {
        let c = x + y;
        if c >= MODULUS {
            c - MODULUS
        } else {
            c
        }
    })
}

#[inline]
pub fn sub(a: u128, b: u128) -> u128 {
    map2(a, b, |x, y| if x >= y { x - y } else { MODULUS - y + x })
}

#[inline]
pub fn mul(a: u128, b: u128) -> u128 {
    map2(a, b, |x, y| (x as u64 * y as u64 % MODULUS as u64) as u32)
}

pub fn hadamard_mul(x: &mut [u128], y: &[u128]) {
    for (a, &b) in x.iter_mut().zip(y) {
        *a = mul(*a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_are_independent() {
        let a = 65536u128 | (5u128 << 32);
        let b = 1u128 | (65535u128 << 32);
        assert_eq!(add(a, b), 3u128 << 32);
        assert_eq!(mul(a, b), 65536u128 | (65527u128 << 32));
    }
}
