//! Running-count helpers over position-indexed arrays.
//!
//! These turn a raw parenthesis sequence into the rank and select tables used by
//! [`SuccinctTree`](super::SuccinctTree): `sum_val(bits, true)` is rank1 and
//! `seq_unique_indx` over that result is select1.

/// Running count of `val`.
///
/// Element `i` of the output is the number of occurrences of `val` in
/// `array[0..=i]`. Only `val` is counted, not every element.
///
/// # Example
///
/// ```rust
/// use phylo_bp::tree::occurrence::sum_val;
///
/// let counts = sum_val([1u8, 2, 3, 1, 1, 2, 1, 3], 1);
/// assert_eq!(counts, vec![1, 1, 1, 2, 3, 3, 4, 4]);
/// ```
pub fn sum_val<I, T>(array: I, val: T) -> Vec<u32>
where
    I: IntoIterator<Item = T>,
    T: PartialEq,
{
    let iter = array.into_iter();
    let mut out = Vec::with_capacity(iter.size_hint().0);
    let mut count = 0u32;
    for x in iter {
        if x == val {
            count += 1;
        }
        out.push(count);
    }
    out
}

/// Indices where `array` hits `start_val`, `start_val + 1`, ... in order.
///
/// Scans left to right with a counter starting at `start_val`; every exact
/// match records its index and bumps the counter. Once the counter passes the
/// largest value present no more indices are produced. Applied to the output of
/// [`sum_val`] this yields the first index at which the running count reaches
/// each successive value.
pub fn seq_unique_indx(array: &[u32], start_val: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let mut expected = start_val;
    for (i, &x) in array.iter().enumerate() {
        if x == expected {
            out.push(i as u32);
            // the counter cannot pass u32::MAX, nothing further can match
            match expected.checked_add(1) {
                Some(next) => expected = next,
                None => break,
            }
        }
    }
    out
}

/// [`seq_unique_indx`] with the counter starting at 1.
pub fn seq_unique_indx_from_one(array: &[u32]) -> Vec<u32> {
    seq_unique_indx(array, 1)
}

//=======================================================================================
