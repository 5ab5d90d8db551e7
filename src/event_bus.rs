// 事件总线 - 用于模块间解耦通信
//
// 存储与持久化层通过事件报告加载、写入和失败情况
// 使用 tokio::sync::broadcast 实现高效的事件分发

use tokio::sync::broadcast;

/// 账本事件枚举 - 定义所有可能的系统事件
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    // --- 存储事件 ---

    /// 集合加载完成
    CollectionLoaded {
        collection: String,
        count: usize,
    },

    /// 持久化数据损坏，集合按空集合处理
    CollectionReset {
        collection: String,
        reason: String,
    },

    // --- 持久化事件 ---

    /// 集合已写入存储后端
    CollectionPersisted {
        collection: String,
        bytes: usize,
    },

    /// 集合写入失败（不会重试）
    PersistFailed {
        collection: String,
        error: String,
    },

    // --- 系统事件 ---

    /// 配置更新事件
    ConfigUpdated,
}

/// 事件总线 - 用于模块间解耦通信
///
/// 使用 broadcast channel 实现发布/订阅模式
/// 支持多个订阅者同时接收事件
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小,建议 100-1000
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 如果没有订阅者,事件会被丢弃(这是正常的)
    pub fn publish(&self, event: LedgerEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) => {
                tracing::trace!("事件已发布但无订阅者");
            }
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
