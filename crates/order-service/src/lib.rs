//! 订单摄取与查询服务
//!
//! 消费 Kafka 上投递的订单报文，校验后经 hand-off 通道交给存储循环，
//! 在单个事务内写入四张关联表，并维护进程内缓存供 HTTP 点查使用。
//! 读路径为 cache-aside：缓存未命中时回源数据库并回填。

pub mod api;
pub mod cache;
pub mod consumer;
pub mod dto;
pub mod error;
pub mod repository;
pub mod service;
pub mod test_support;
pub mod validator;
