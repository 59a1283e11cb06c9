//! Utility functions for the tree search and its dependents.

/// Returns the index of the maximum value and the value itself.
///
/// Ties break toward the earlier index.
pub fn arg_max<T: PartialOrd + Copy>(values: &[T]) -> (usize, T) {
    values.iter().enumerate().fold(
        (0, values[0]),
        |(i_max, v_max), (i, &v)| {
            if v > v_max {
                (i, v)
            } else {
                (i_max, v_max)
            }
        },
    )
}

fn gcd(mut x: u64, mut y: u64) -> u64 {
    while y > 0 {
        let t = y;
        y = x % y;
        x = t;
    }
    x
}

/// The binomial coefficient `C(n, k)`.
///
/// The running product is reduced by gcd whenever the next multiplication
/// would overflow a `u64`. Returns 0 when the overflow is unavoidable even
/// after reduction.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k == 0 {
        return 1;
    }
    if k == 1 {
        return n;
    }
    if k >= n {
        return u64::from(k == n);
    }

    let k = k.min(n - k);

    let mut n = n;
    let mut r: u64 = 1;
    let mut d: u64 = 1;

    while d <= k {
        if r >= u64::MAX / n {
            let g = gcd(n, d);
            let nr = n / g;
            let mut dr = d / g;

            let g = gcd(r, dr);
            r /= g;
            dr /= g;

            if r >= u64::MAX / nr {
                // Unavoidable overflow.
                return 0;
            }

            r *= nr;
            r /= dr;
            n -= 1;
        } else {
            r *= n;
            n -= 1;
            r /= d;
        }
        d += 1;
    }

    r
}
