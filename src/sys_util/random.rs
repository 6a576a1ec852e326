use rand::Rng;

const RANDOM_STRING_SOURCE: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Random token of exactly `n` characters from a 64-symbol alphabet.
///
/// Draws from `rand::rng()`, a CSPRNG reseeded from the operating system, so
/// the output is safe to use as an unguessable file name.
pub fn random_string(n: usize) -> String {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| RANDOM_STRING_SOURCE[rng.random_range(0..RANDOM_STRING_SOURCE.len())] as char)
        .collect()
}
