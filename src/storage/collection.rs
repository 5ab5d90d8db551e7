// 记录集合 - 三类实体共用的内存存储与持久化语义
//
// 集合保存在 Arc<Vec<E>> 中，写入时复制：持有旧快照的读者不受影响
// 每次修改后把整个集合序列化交给持久化 Actor（不等待写入完成）

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::models::*;
use super::repository::StorageBackend;
use crate::actors::PersistHandle;
use crate::event_bus::{EventBus, LedgerEvent};

/// 可存入集合的实体
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 部分更新类型
    type Patch;

    /// 持久化时使用的集合名
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn timestamps(&self) -> &Timestamps;

    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// 应用补丁：`Some` 字段覆盖，`None` 字段保留
    fn apply_patch(&mut self, patch: Self::Patch);
}

/// 单个实体集合
pub struct Collection<E: Record> {
    items: Arc<Vec<E>>,
    sink: Option<PersistHandle>,
}

impl<E: Record> Collection<E> {
    /// 创建空集合，修改会经由 `sink` 持久化
    pub fn new(sink: PersistHandle) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            sink: Some(sink),
        }
    }

    /// 创建不持久化的集合（测试夹具、临时计算）
    pub fn detached() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            sink: None,
        }
    }

    /// 用给定实体构建不持久化的集合
    pub fn from_items(items: Vec<E>) -> Self {
        Self {
            items: Arc::new(items),
            sink: None,
        }
    }

    /// 从存储后端加载集合
    ///
    /// 数据缺失时返回空集合；反序列化失败时同样返回空集合（不接纳部分数据），
    /// 后端本身的读取错误会向上传播
    pub async fn load(
        backend: &dyn StorageBackend,
        sink: PersistHandle,
        events: &EventBus,
    ) -> Result<Self> {
        let items = match backend.load(E::COLLECTION).await? {
            None => Vec::new(),
            Some(payload) => match serde_json::from_str::<Vec<E>>(&payload) {
                Ok(items) => items,
                Err(e) => {
                    warn!("集合 {} 数据损坏，按空集合处理: {}", E::COLLECTION, e);
                    events.publish(LedgerEvent::CollectionReset {
                        collection: E::COLLECTION.to_string(),
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            },
        };

        info!("已加载集合 {}: {} 条", E::COLLECTION, items.len());
        events.publish(LedgerEvent::CollectionLoaded {
            collection: E::COLLECTION.to_string(),
            count: items.len(),
        });

        Ok(Self {
            items: Arc::new(items),
            sink: Some(sink),
        })
    }

    /// 当前快照（插入顺序，不排序）
    pub fn all(&self) -> Arc<Vec<E>> {
        Arc::clone(&self.items)
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 插入或整体覆盖
    ///
    /// - id 不存在：追加，若 `created_at` 未设置则填为当前时间
    /// - id 已存在：以 `item` 的字段覆盖（嵌套对象整体替换），
    ///   保留原有的 `created_at`，并把 `last_updated` 设为当前时间
    pub fn upsert(&mut self, mut item: E) -> &E {
        let now = Utc::now();
        let position = self.items.iter().position(|e| e.id() == item.id());
        let items = Arc::make_mut(&mut self.items);

        let index = match position {
            Some(index) => {
                let created_at = items[index].timestamps().created_at;
                let stamps = item.timestamps_mut();
                stamps.created_at = created_at.or(stamps.created_at);
                stamps.last_updated = Some(now);
                debug!("更新 {} 记录: {}", E::COLLECTION, item.id());
                items[index] = item;
                index
            }
            None => {
                let stamps = item.timestamps_mut();
                if stamps.created_at.is_none() {
                    stamps.created_at = Some(now);
                }
                debug!("新增 {} 记录: {}", E::COLLECTION, item.id());
                items.push(item);
                items.len() - 1
            }
        };

        self.persist();
        &self.items[index]
    }

    /// 对已有实体应用补丁，id 不存在时不做任何事
    pub fn patch(&mut self, id: &str, patch: E::Patch) -> Option<E> {
        let index = self.items.iter().position(|e| e.id() == id)?;

        let mut updated = self.items[index].clone();
        updated.apply_patch(patch);
        updated.timestamps_mut().last_updated = Some(Utc::now());

        Arc::make_mut(&mut self.items)[index] = updated.clone();
        self.persist();
        Some(updated)
    }

    /// 删除实体，不存在时返回 false
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.items.iter().position(|e| e.id() == id) else {
            return false;
        };

        Arc::make_mut(&mut self.items).remove(index);
        self.persist();
        true
    }

    /// 清空集合
    pub fn delete_all(&mut self) {
        self.items = Arc::new(Vec::new());
        self.persist();
    }

    /// 删除所有满足条件的实体，返回删除数量
    pub fn delete_where(&mut self, predicate: impl Fn(&E) -> bool) -> usize {
        let before = self.items.len();
        let kept: Vec<E> = self.items.iter().filter(|e| !predicate(e)).cloned().collect();
        let removed = before - kept.len();

        if removed > 0 {
            self.items = Arc::new(kept);
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        let Some(sink) = &self.sink else {
            return;
        };

        match serde_json::to_string(&*self.items) {
            Ok(payload) => sink.save(E::COLLECTION, payload),
            Err(e) => error!("序列化集合 {} 失败: {}", E::COLLECTION, e),
        }
    }
}

// ========== 实体实现 ==========

impl Record for Call {
    type Patch = CallPatch;
    const COLLECTION: &'static str = "calls";

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn apply_patch(&mut self, patch: CallPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        if let Some(note) = patch.note {
            self.note = Some(note);
        }
        if let Some(level) = patch.interest_level {
            self.interest_level = Some(level);
        }
        if let Some(is_study) = patch.is_study {
            self.is_study = is_study;
        }
        if let Some(is_return_visit) = patch.is_return_visit {
            self.is_return_visit = is_return_visit;
        }
    }
}

impl Record for Visit {
    type Patch = VisitPatch;
    const COLLECTION: &'static str = "visits";

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn apply_patch(&mut self, patch: VisitPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(topic) = patch.topic {
            self.topic = Some(topic);
        }
        if let Some(note) = patch.note {
            self.note = Some(note);
        }
        if let Some(placement) = patch.placement {
            self.placement = Some(placement);
        }
        if let Some(video) = patch.video_placement {
            self.video_placement = Some(video);
        }
        if let Some(partners) = patch.partners {
            self.partners = Some(partners);
        }
        if let Some(next_visit) = patch.next_visit {
            self.next_visit = Some(next_visit);
        }
        if let Some(flag) = patch.do_not_include_in_monthly_report {
            self.do_not_include_in_monthly_report = flag;
        }
        if let Some(flag) = patch.do_not_count_towards_study {
            self.do_not_count_towards_study = flag;
        }
    }
}

impl Record for ServiceRecord {
    type Patch = ServiceRecordPatch;
    const COLLECTION: &'static str = "serviceRecords";

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn apply_patch(&mut self, patch: ServiceRecordPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(ldc) = patch.ldc {
            self.ldc = ldc;
        }
        if let Some(placements) = patch.placements {
            self.placements = placements;
        }
        if let Some(video) = patch.video_placements {
            self.video_placements = video;
        }
        if let Some(offset) = patch.return_visit_offset {
            self.return_visit_offset = offset;
        }
        if let Some(offset) = patch.study_offset {
            self.study_offset = offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::PersistenceActor;
    use crate::storage::repository::memory::MemoryBackend;

    fn sample_address() -> Address {
        Address {
            line1: Some("12 Elm St".to_string()),
            city: Some("Springfield".to_string()),
            postal_code: Some("12345".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_same_entity_twice_keeps_created_at() {
        let mut calls = Collection::<Call>::detached();
        let call = Call::new("Ana");

        let created = calls.upsert(call.clone()).timestamps.created_at;
        assert!(created.is_some());

        let second = calls.upsert(call.clone()).clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(second.timestamps.created_at, created);
        assert!(second.timestamps.last_updated.is_some());
    }

    #[test]
    fn test_upsert_keeps_preset_created_at_on_insert() {
        let mut calls = Collection::<Call>::detached();
        let mut call = Call::new("Ana");
        let preset = Utc::now() - chrono::Duration::days(30);
        call.timestamps.created_at = Some(preset);

        let stored = calls.upsert(call);
        assert_eq!(stored.timestamps.created_at, Some(preset));
        assert!(stored.timestamps.last_updated.is_none());
    }

    #[test]
    fn test_upsert_replaces_nested_address_wholesale() {
        let mut calls = Collection::<Call>::detached();
        let mut call = Call::new("Ana");
        call.address = Some(sample_address());
        calls.upsert(call.clone());

        call.address = Some(Address {
            line1: Some("99 Oak Ave".to_string()),
            ..Default::default()
        });
        calls.upsert(call.clone());

        let stored = calls.get(&call.id).unwrap();
        let address = stored.address.as_ref().unwrap();
        assert_eq!(address.line1.as_deref(), Some("99 Oak Ave"));
        assert!(address.city.is_none(), "嵌套对象应整体替换");
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        let mut calls = Collection::<Call>::detached();
        let call = Call::new("Ana");
        calls.upsert(call.clone());

        let snapshot = calls.all();
        calls.patch(
            &call.id,
            CallPatch {
                name: Some("Ana Maria".to_string()),
                ..Default::default()
            },
        );
        calls.upsert(Call::new("Ben"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Ana");
        assert_eq!(calls.get(&call.id).unwrap().name, "Ana Maria");
    }

    #[test]
    fn test_patch_only_overwrites_present_fields() {
        let mut calls = Collection::<Call>::detached();
        let mut call = Call::new("Ana");
        call.note = Some("Prefers mornings".to_string());
        call.address = Some(sample_address());
        calls.upsert(call.clone());

        let updated = calls
            .patch(
                &call.id,
                CallPatch {
                    is_study: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(updated.is_study);
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.note.as_deref(), Some("Prefers mornings"));
        assert_eq!(updated.address, Some(sample_address()));
        assert!(updated.timestamps.last_updated.is_some());
    }

    #[test]
    fn test_visit_patch_moves_date_and_keeps_notes() {
        let mut visits = Collection::<Visit>::detached();
        let mut visit = Visit::new("call-1", Utc::now());
        visit.note = Some("Left a tract".to_string());
        visits.upsert(visit.clone());

        let moved = Utc::now() - chrono::Duration::days(3);
        let updated = visits
            .patch(
                &visit.id,
                VisitPatch {
                    date: Some(moved),
                    placement: Some("Magazine".to_string()),
                    do_not_count_towards_study: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.date, moved);
        assert_eq!(updated.placement.as_deref(), Some("Magazine"));
        assert!(updated.do_not_count_towards_study);
        assert!(!updated.do_not_include_in_monthly_report);
        assert_eq!(updated.note.as_deref(), Some("Left a tract"));
        assert_eq!(updated.call.id, "call-1");
    }

    #[test]
    fn test_service_record_patch_updates_counts_only() {
        let mut records = Collection::<ServiceRecord>::detached();
        let mut record = ServiceRecord::new(Utc::now(), 90 * 60_000);
        record.placements = 2;
        records.upsert(record.clone());

        let updated = records
            .patch(
                &record.id,
                ServiceRecordPatch {
                    return_visit_offset: Some(3),
                    ldc: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.return_visit_offset, 3);
        assert!(updated.ldc);
        assert_eq!(updated.placements, 2);
        assert_eq!(updated.time, 90 * 60_000);
        assert_eq!(updated.date, record.date);
        assert_eq!(records.get(&record.id), Some(&updated));
    }

    #[test]
    fn test_patch_and_delete_missing_id_are_no_ops() {
        let mut records = Collection::<ServiceRecord>::detached();
        records.upsert(ServiceRecord::new(Utc::now(), 60_000));

        assert!(records.patch("missing", ServiceRecordPatch::default()).is_none());
        assert!(!records.delete("missing"));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let mut calls = Collection::<Call>::detached();
        for name in ["Carla", "Ana", "Ben"] {
            calls.upsert(Call::new(name));
        }

        let names: Vec<String> = calls.all().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Carla", "Ana", "Ben"]);

        calls.delete_all();
        assert!(calls.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_and_reloaded() {
        let backend = Arc::new(MemoryBackend::new());
        let events = Arc::new(EventBus::new(16));
        let (actor, handle) = PersistenceActor::new(backend.clone(), events.clone());
        tokio::spawn(actor.run());

        let mut calls = Collection::<Call>::load(&*backend, handle.clone(), &events)
            .await
            .unwrap();
        let call = Call::new("Ana");
        calls.upsert(call.clone());
        calls.upsert(Call::new("Ben"));
        calls.delete(&call.id);
        assert!(handle.flush().await);

        let reloaded = Collection::<Call>::load(&*backend, handle, &events)
            .await
            .unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.all()[0].name, "Ben");
    }

    #[tokio::test]
    async fn test_corrupt_payload_fails_closed() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .save(Visit::COLLECTION, r#"[{"id":"v1","call":{"id":"c1"},"date":"not a date"}]"#)
            .await
            .unwrap();

        let events = EventBus::new(16);
        let mut receiver = events.subscribe();
        let (_actor, handle) = PersistenceActor::new(backend.clone(), Arc::new(EventBus::new(4)));

        let visits = Collection::<Visit>::load(&*backend, handle, &events)
            .await
            .unwrap();
        assert!(visits.is_empty());

        match receiver.try_recv() {
            Ok(LedgerEvent::CollectionReset { collection, .. }) => {
                assert_eq!(collection, "visits");
            }
            other => panic!("未收到预期事件: {:?}", other),
        }
    }
}
