// 记录领域管理器
//
// 持有联系人、拜访、服务记录三个集合，集合之间不做外键约束
// 删除联系人不会级联删除拜访，需要时由调用方显式调用 delete_call_with_visits

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::actors::PersistHandle;
use crate::event_bus::EventBus;
use crate::storage::{Call, Collection, ServiceRecord, StorageBackend, Visit};
use crate::utils::validate_id;

/// 记录领域管理器 - 三个持久化集合的唯一所有者
pub struct RecordDomain {
    calls: Collection<Call>,
    visits: Collection<Visit>,
    service_records: Collection<ServiceRecord>,
}

/// 某一时刻的三个集合快照
#[derive(Clone)]
pub struct RecordSnapshot {
    pub calls: Arc<Vec<Call>>,
    pub visits: Arc<Vec<Visit>>,
    pub service_records: Arc<Vec<ServiceRecord>>,
}

impl RecordDomain {
    /// 从存储后端加载全部集合
    pub async fn load(
        backend: &dyn StorageBackend,
        sink: PersistHandle,
        events: &EventBus,
    ) -> Result<Self> {
        Ok(Self {
            calls: Collection::load(backend, sink.clone(), events).await?,
            visits: Collection::load(backend, sink.clone(), events).await?,
            service_records: Collection::load(backend, sink, events).await?,
        })
    }

    /// 由给定集合组装（测试夹具）
    pub fn from_collections(
        calls: Collection<Call>,
        visits: Collection<Visit>,
        service_records: Collection<ServiceRecord>,
    ) -> Self {
        Self {
            calls,
            visits,
            service_records,
        }
    }

    pub fn calls(&self) -> &Collection<Call> {
        &self.calls
    }

    pub fn calls_mut(&mut self) -> &mut Collection<Call> {
        &mut self.calls
    }

    pub fn visits(&self) -> &Collection<Visit> {
        &self.visits
    }

    pub fn visits_mut(&mut self) -> &mut Collection<Visit> {
        &mut self.visits
    }

    pub fn service_records(&self) -> &Collection<ServiceRecord> {
        &self.service_records
    }

    pub fn service_records_mut(&mut self) -> &mut Collection<ServiceRecord> {
        &mut self.service_records
    }

    /// 当前快照
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            calls: self.calls.all(),
            visits: self.visits.all(),
            service_records: self.service_records.all(),
        }
    }

    /// 某个联系人的拜访历史（按日期升序）
    pub fn visits_for_call(&self, call_id: &str) -> Vec<Visit> {
        let mut history: Vec<Visit> = self
            .visits
            .all()
            .iter()
            .filter(|v| v.call.id == call_id)
            .cloned()
            .collect();
        history.sort_by_key(|v| v.date);
        history
    }

    /// 某个联系人最近一次拜访
    pub fn last_visit_for_call(&self, call_id: &str) -> Option<Visit> {
        self.visits_for_call(call_id).pop()
    }

    /// 记录一次拜访
    ///
    /// 联系人此前已有拜访时，把它标记为续访对象
    pub fn add_visit(&mut self, visit: Visit) -> Result<Visit> {
        validate_id(&visit.call.id)?;

        let had_history = self
            .visits
            .all()
            .iter()
            .any(|v| v.call.id == visit.call.id && v.id != visit.id);

        let stored = self.visits.upsert(visit).clone();

        if had_history {
            if let Some(call) = self.calls.get(&stored.call.id) {
                if !call.is_return_visit {
                    let mut call = call.clone();
                    call.is_return_visit = true;
                    self.calls.upsert(call);
                }
            }
        }
        Ok(stored)
    }

    /// 删除所有联系人（不影响拜访和服务记录）
    pub fn delete_all_calls(&mut self) {
        self.calls.delete_all();
    }

    /// 删除联系人及其所有拜访
    pub fn delete_call_with_visits(&mut self, call_id: &str) -> usize {
        self.calls.delete(call_id);
        let removed = self.visits.delete_where(|v| v.call.id == call_id);
        info!("已删除联系人 {} 及其 {} 次拜访", call_id, removed);
        removed
    }
}
