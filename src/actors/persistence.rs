// Persistence Actor - 使用Actor模式串行化集合写入
//
// 存储层同步调用 save()，命令进入无界队列后立即返回
// 写入失败只记录日志并发布事件，不重试

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::event_bus::{EventBus, LedgerEvent};
use crate::storage::StorageBackend;

/// 持久化命令
pub enum PersistenceCommand {
    /// 整体写入一个集合
    Save {
        collection: String,
        payload: String,
    },

    /// 等待此前所有写入完成
    Flush {
        reply: oneshot::Sender<()>,
    },

    /// 健康检查
    HealthCheck {
        reply: oneshot::Sender<bool>,
    },
}

/// 持久化Actor
pub struct PersistenceActor {
    receiver: mpsc::UnboundedReceiver<PersistenceCommand>,
    backend: Arc<dyn StorageBackend>,
    events: Arc<EventBus>,
}

impl PersistenceActor {
    /// 创建新的Actor
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        events: Arc<EventBus>,
    ) -> (Self, PersistHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self {
            receiver,
            backend,
            events,
        };
        (actor, PersistHandle { sender })
    }

    /// 运行Actor
    pub async fn run(mut self) {
        info!("Persistence Actor 已启动 ({})", self.backend.backend_type());

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                PersistenceCommand::Save {
                    collection,
                    payload,
                } => self.save(collection, payload).await,

                PersistenceCommand::Flush { reply } => {
                    let _ = reply.send(());
                }

                PersistenceCommand::HealthCheck { reply } => {
                    let _ = reply.send(true);
                }
            }
        }

        info!("Persistence Actor 已停止");
    }

    async fn save(&self, collection: String, payload: String) {
        match self.backend.save(&collection, &payload).await {
            Ok(()) => {
                debug!("集合 {} 已持久化", collection);
                self.events.publish(LedgerEvent::CollectionPersisted {
                    collection,
                    bytes: payload.len(),
                });
            }
            Err(e) => {
                error!("集合 {} 持久化失败: {:#}", collection, e);
                self.events.publish(LedgerEvent::PersistFailed {
                    collection,
                    error: format!("{:#}", e),
                });
            }
        }
    }
}

/// 持久化Handle
#[derive(Clone)]
pub struct PersistHandle {
    sender: mpsc::UnboundedSender<PersistenceCommand>,
}

impl PersistHandle {
    /// 提交写入，不等待完成
    pub fn save(&self, collection: &str, payload: String) {
        let cmd = PersistenceCommand::Save {
            collection: collection.to_string(),
            payload,
        };
        if self.sender.send(cmd).is_err() {
            error!("Persistence Actor 已停止，集合 {} 的写入被丢弃", collection);
        }
    }

    /// 等待队列中已有的写入全部完成
    ///
    /// Actor 已停止时返回 false
    pub async fn flush(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(PersistenceCommand::Flush { reply }).is_err() {
            return false;
        }
        rx.await.is_ok()
    }

    /// 健康检查（超时1秒）
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .sender
            .send(PersistenceCommand::HealthCheck { reply })
            .is_err()
        {
            return false;
        }

        matches!(
            tokio::time::timeout(std::time::Duration::from_secs(1), rx).await,
            Ok(Ok(true))
        )
    }
}
