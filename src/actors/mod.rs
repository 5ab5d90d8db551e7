// Actor模块 - 使用Actor模式管理持久化写入
//
// 内存集合的修改同步完成，真正的落盘通过消息交给后台Actor

pub mod persistence;

pub use persistence::{PersistHandle, PersistenceActor, PersistenceCommand};
