//! 置换缓存
//!
//! 以局面哈希（加查询参数）为键缓存计算结果，同一局面经不同走法顺序到达时可直接复用。
//! 容量有上限，超出时淘汰最久未访问的条目。

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// 默认容量（条目数）
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 16;

struct Slot<V> {
    value: V,
    stamp: u64,
}

/// 置换缓存（LRU）
pub struct TranspositionCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    /// 访问时间戳 -> 键，最小的时间戳即最久未访问
    order: BTreeMap<u64, K>,
    capacity: usize,
    tick: u64,
    hits: u64,
    probes: u64,
}

impl<K: Hash + Eq + Clone, V> TranspositionCache<K, V> {
    /// 创建指定容量的缓存
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            capacity: capacity.max(1),
            tick: 0,
            hits: 0,
            probes: 0,
        }
    }

    /// 查询条目，命中时刷新其访问时间
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.probes += 1;

        let slot = self.entries.get_mut(key)?;
        self.hits += 1;
        self.tick += 1;
        self.order.remove(&slot.stamp);
        slot.stamp = self.tick;
        self.order.insert(self.tick, key.clone());

        Some(&slot.value)
    }

    /// 存储条目
    pub fn put(&mut self, key: K, value: V) {
        self.tick += 1;

        if let Some(slot) = self.entries.get_mut(&key) {
            self.order.remove(&slot.stamp);
            slot.value = value;
            slot.stamp = self.tick;
            self.order.insert(self.tick, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.entries.remove(&oldest);
            }
        }

        self.order.insert(self.tick, key.clone());
        self.entries.insert(
            key,
            Slot {
                value,
                stamp: self.tick,
            },
        );
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空缓存
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.probes = 0;
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity,
            used: self.entries.len(),
            hits: self.hits,
            probes: self.probes,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub capacity: usize,
    pub used: usize,
    pub hits: u64,
    pub probes: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.probes == 0 {
            0.0
        } else {
            self.hits as f64 / self.probes as f64
        }
    }

    pub fn usage(&self) -> f64 {
        self.used as f64 / self.capacity as f64
    }
}
