//! 订单内存缓存
//!
//! HTTP 读路径与存储循环的写路径并发访问同一份缓存，
//! 使用 DashMap 而非 HashMap + RwLock，在读多写少场景下
//! 分段锁的性能优于全局读写锁。
//!
//! 缓存无容量上限也不逐出：订单全集在进程生命周期内常驻内存。
//! 条目以 `Arc<Order>` 存放，命中时只克隆指针不拷贝实体。

use std::sync::Arc;

use dashmap::DashMap;
use order_shared::order::Order;

/// 订单号到订单实体的进程级映射
pub struct OrderCache {
    entries: DashMap<String, Arc<Order>>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 按订单号查找
    pub fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.entries.get(order_uid).map(|entry| entry.clone())
    }

    /// 写入或整体替换一条订单，返回存入的共享引用
    pub fn insert(&self, order: Order) -> Arc<Order> {
        let entry = Arc::new(order);
        self.entries
            .insert(entry.order_uid.clone(), entry.clone());
        entry
    }

    /// 当前缓存条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OrderCache {
    fn default() -> Self {
        Self::new()
    }
}
