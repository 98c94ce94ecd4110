use std::ops::Range;

/// Split `len` items into at most `k` contiguous ranges of near-equal size
///
/// Every item belongs to exactly one range, and ranges are returned in order.
/// The first `len % k` ranges hold one more item than the others.
pub fn partition(len: usize, k: usize) -> Vec<Range<usize>> {
    let k = k.clamp(1, len.max(1));
    let base = len / k;
    let rem = len % k;
    let mut ret = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let end = start + base + usize::from(i < rem);
        ret.push(start..end);
        start = end;
    }
    ret
}

/// Split a slice into consecutive mutable chunks of the given lengths
pub(crate) fn split_lengths<T>(
    mut data: &mut [T],
    lengths: impl IntoIterator<Item = usize>,
) -> Vec<&mut [T]> {
    let mut ret = Vec::new();
    for len in lengths {
        let (head, tail) = std::mem::take(&mut data).split_at_mut(len);
        ret.push(head);
        data = tail;
    }
    ret
}
