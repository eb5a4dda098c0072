//! Normalised distance between base-36 perceptual hash tokens.
//!
//! Each token character is one base-36 digit and carries 6 bits. The
//! distance is the share of differing bits scaled to 0-100.

const BITS_PER_DIGIT: u32 = 6;

/// Whether `token` is a non-empty base-36 string.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_digit(36))
}

/// Hash distance with canonical-pattern suppression.
#[derive(Debug, Clone)]
pub struct HashDistance {
    canonical: Vec<String>,
}

impl HashDistance {
    pub fn new(canonical: &[String]) -> Self {
        Self {
            canonical: canonical.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// Whether `token` is one of the degenerate reference patterns.
    pub fn is_canonical(&self, token: &str) -> bool {
        self.canonical.iter().any(|c| c.eq_ignore_ascii_case(token))
    }

    /// Distance on a 0-100 scale; 0 whenever either side is canonical.
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        if self.is_canonical(a) || self.is_canonical(b) {
            return 0.0;
        }
        raw_distance(a, b)
    }
}

/// Bitwise distance on a 0-100 scale, ignoring canonical patterns.
///
/// Characters past the end of the shorter token count as fully different.
pub fn raw_distance(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let longest = len_a.max(len_b);
    if longest == 0 {
        return 0.0;
    }

    let mut differing = 0u32;
    for (ca, cb) in a.chars().zip(b.chars()) {
        differing += match (ca.to_digit(36), cb.to_digit(36)) {
            (Some(da), Some(db)) => (da ^ db).count_ones(),
            _ => BITS_PER_DIGIT,
        };
    }
    differing += (longest - len_a.min(len_b)) as u32 * BITS_PER_DIGIT;

    differing as f64 * 100.0 / (longest as f64 * BITS_PER_DIGIT as f64)
}
