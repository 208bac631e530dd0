//! 最近号码排序

use crate::domain::entities::PhoneNumber;
use crate::domain::value_objects::{AreaCode, LocalNumber};

/// 在候选集中选出同区号、距离 `target` 最近的 `limit` 条
///
/// 排序键为 (|local_number - target|, local_number)，与 SQL 实现一致
pub fn rank_by_distance<I>(candidates: I, area_code: &AreaCode, target: &LocalNumber, limit: usize) -> Vec<PhoneNumber>
where
    I: IntoIterator<Item = PhoneNumber>,
{
    let mut matches: Vec<PhoneNumber> = candidates
        .into_iter()
        .filter(|n| &n.area_code == area_code)
        .collect();

    matches.sort_by(|a, b| {
        a.local_number
            .distance_to(target)
            .cmp(&b.local_number.distance_to(target))
            .then_with(|| a.local_number.cmp(&b.local_number))
    });
    matches.truncate(limit);
    matches
}
