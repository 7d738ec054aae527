// ==========================================
// 纺织品物流控制塔 - 集装箱数据仓储
// ==========================================
// 依据: schema container / container_activity 表
// 红线: container_number 唯一,查重与写入在同一个 IMMEDIATE 事务内完成
// 红线: 活动日志只追加
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::{ContainerRepository, StatusSwap};
