// merge.rs — 合并与去重
// 新抓取的列表在前，旧列表中没出现过的图片接在后面

use crate::record::BackgroundRecord;
use std::collections::HashSet;

/// 合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub records: Vec<BackgroundRecord>,
    /// 结果中有、旧列表中没有的图片数量
    pub net_new: usize,
}

/// 按身份键合并两个列表
///
/// 身份键相同时保留 `fresh` 中的记录（也就是新改写过的 URL），
/// 每个身份键只保留第一次出现的那条。
pub fn merge(fresh: Vec<BackgroundRecord>, previous: Vec<BackgroundRecord>) -> Merged {
    let previous_keys: HashSet<String> = previous.iter().map(|r| r.identity_key()).collect();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(fresh.len() + previous.len());

    for record in fresh.into_iter().chain(previous) {
        if seen.insert(record.identity_key()) {
            records.push(record);
        }
    }

    let net_new = seen.difference(&previous_keys).count();
    Merged { records, net_new }
}
