use std::ops::Range;

/// 把`0..len`切成`groups`段连续、非空、长度相差不超过 1 的区间
///
/// 较长的段排在前面；`groups`会被截到`1..=len`。`len`为 0 时返回空。
pub fn partition(len: usize, groups: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let groups = groups.clamp(1, len);
    let base = len / groups;
    let extra = len % groups;

    let mut ranges = Vec::with_capacity(groups);
    let mut start = 0;
    for i in 0..groups {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}
