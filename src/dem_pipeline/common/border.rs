//! Out-of-range index handling shared by the convolution-style filters.

/// How samples outside the grid are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// `gfedcb|abcdefgh|gfedcba`, edge sample not repeated.
    Reflect101,
    /// `fedcba|abcdefgh|hgfedcb`, edge sample repeated.
    Reflect,
}

impl BorderMode {
    /// Maps a possibly out-of-range index onto `0..len`.
    pub fn index(self, i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let n = len as isize;
        match self {
            BorderMode::Reflect101 => {
                let period = 2 * (n - 1);
                let i = i.rem_euclid(period);
                (if i >= n { period - i } else { i }) as usize
            }
            BorderMode::Reflect => {
                let period = 2 * n;
                let i = i.rem_euclid(period);
                (if i >= n { period - 1 - i } else { i }) as usize
            }
        }
    }
}
