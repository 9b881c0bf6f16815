//! Small integer helpers shared by the dispatch crates.

/// Greatest common divisor by the Euclidean algorithm.
#[inline]
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
