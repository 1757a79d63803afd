//! `engine`：重载请求接收、构建调度、轮询与原子换装。
//!
//! 版本不变量：
//! - `current_installed_id <= latest_requested_id` 恒成立
//! - `current_installed_id` 只增不减（完成顺序乱序也不会回退：
//!   id 不大于当前值的构建结果直接丢弃）
//! - 同时最多一个构建在途（`maybe_build_data_loader` 是唯一的启动点）
//!
//! 换装契约：先对新 `Modules` 搭好全部派生对象，再一次性替换
//! `Option<Arc<Generation>>` 句柄；任何一步失败都保持旧一代生效。
//! 拿到旧一代 `Arc` 快照的读者继续安全使用旧资源，直到释放。

use std::sync::Arc;

use thiserror::Error;

use henkan_core::converter::{Converter, DictConverter};
use henkan_core::data_manager::DataManager;
use henkan_core::dictionary::SuppressionDictionary;
use henkan_core::error::{DataError, InitError};
use henkan_core::model::Profile;
use henkan_core::modules::Modules;
use henkan_core::predictor::{Predictor, predictor_for_profile};

use crate::loader::{BackgroundLoader, DataLoader, LoaderResponse, ResponseFuture};
use crate::minimal::MinimalEngine;
use crate::request::{DataSource, ReloadRequest, ReloadResponse};

/// 同步构建路径（`Engine::with_manager`）的错误。
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Init(#[from] InitError),
}

/// 一代资源：`Modules` + 据此派生的 converter/predictor。
///
/// 整体创建、整体替换；内部字段来自同一快照，绝不跨代混用。
pub struct Generation {
    id: u64,
    profile: Profile,
    modules: Arc<Modules>,
    converter: DictConverter,
    predictor: Box<dyn Predictor>,
}

impl Generation {
    /// 先搭好全部派生对象，任何一个失败都整体放弃。
    fn build(id: u64, profile: Profile, modules: Arc<Modules>) -> Result<Self, InitError> {
        let converter = DictConverter::new(Arc::clone(&modules), profile)?;
        let predictor = predictor_for_profile(Arc::clone(&modules), profile);
        Ok(Self {
            id,
            profile,
            modules,
            converter,
            predictor,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn modules(&self) -> &Arc<Modules> {
        &self.modules
    }

    pub fn converter(&self) -> &dyn Converter {
        &self.converter
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }
}

/// 变换引擎：持有当前一代资源并驱动重载。
///
/// 控制线程独占 `&mut self` 驱动请求/轮询/安装；并发读者通过
/// [`Engine::generation`] 拿 `Arc` 快照，对快照的读取不会被重载打断。
pub struct Engine {
    minimal: MinimalEngine,
    loader: Box<dyn DataLoader>,
    generation: Option<Arc<Generation>>,
    pending: Option<ReloadRequest>,
    latest_requested_id: u64,
    current_installed_id: u64,
    response_future: Option<ResponseFuture>,
    /// 仅测试使用：让轮询路径阻塞到结果就绪
    always_wait_for_response: bool,
    /// `reload()` 的默认数据来源与 profile
    source: DataSource,
    profile: Profile,
}

impl Engine {
    /// 创建未初始化的引擎：只读接口由 `MinimalEngine` 兜底，
    /// 首次成功安装后转为已初始化（单向转换）。
    pub fn new(source: DataSource, profile: Profile) -> Self {
        Self {
            minimal: MinimalEngine::new(),
            loader: Box::new(BackgroundLoader),
            generation: None,
            pending: None,
            latest_requested_id: 0,
            current_installed_id: 0,
            response_future: None,
            always_wait_for_response: false,
            source,
            profile,
        }
    }

    /// 同步构建并立即安装（id = 1）。启动期希望拿到可用引擎时使用。
    pub fn with_manager(
        manager: Arc<dyn DataManager>,
        profile: Profile,
    ) -> Result<Self, EngineError> {
        let modules = Arc::new(Modules::build(manager.as_ref())?);
        let mut engine = Self::new(DataSource::Memory(manager), profile);
        engine.latest_requested_id = 1;
        engine.install(1, profile, modules)?;
        Ok(engine)
    }

    /// desktop 配置的便捷构造。
    pub fn desktop(manager: Arc<dyn DataManager>) -> Result<Self, EngineError> {
        Self::with_manager(manager, Profile::Desktop)
    }

    /// mobile 配置的便捷构造。
    pub fn mobile(manager: Arc<dyn DataManager>) -> Result<Self, EngineError> {
        Self::with_manager(manager, Profile::Mobile)
    }

    // ---- 只读接口（未初始化时一律路由到 MinimalEngine） ----

    pub fn is_initialized(&self) -> bool {
        self.generation.is_some()
    }

    /// 当前一代的 `Arc` 快照（并发读者持有它即可不受换装影响）。
    pub fn generation(&self) -> Option<Arc<Generation>> {
        self.generation.clone()
    }

    pub fn converter(&self) -> &dyn Converter {
        match &self.generation {
            Some(g) => g.converter(),
            None => self.minimal.converter(),
        }
    }

    pub fn predictor(&self) -> &dyn Predictor {
        match &self.generation {
            Some(g) => g.predictor(),
            None => self.minimal.predictor(),
        }
    }

    pub fn predictor_name(&self) -> &str {
        match &self.generation {
            Some(g) => g.predictor().name(),
            None => self.minimal.predictor_name(),
        }
    }

    pub fn suppression_dictionary(&self) -> &SuppressionDictionary {
        match &self.generation {
            Some(g) => g.modules().suppression_dictionary(),
            None => self.minimal.suppression_dictionary(),
        }
    }

    pub fn pos_list(&self) -> Vec<String> {
        match &self.generation {
            Some(g) => g.modules().user_dictionary().pos_list().to_vec(),
            None => self.minimal.pos_list(),
        }
    }

    pub fn data_version(&self) -> &str {
        match &self.generation {
            Some(g) => g.modules().data_version(),
            None => self.minimal.data_version(),
        }
    }

    pub fn latest_requested_id(&self) -> u64 {
        self.latest_requested_id
    }

    pub fn current_installed_id(&self) -> u64 {
        self.current_installed_id
    }

    // ---- 重载驱动 ----

    /// 受理重载请求。`id` 必须严格大于已受理的最大 id，
    /// 否则拒绝（返回 false，状态不变）——过期/重复请求是无害空操作。
    /// 受理只登记 pending，不在这里启动构建。
    pub fn send_reload_request(&mut self, request: ReloadRequest) -> bool {
        if request.id <= self.latest_requested_id {
            tracing::debug!(
                id = request.id,
                latest = self.latest_requested_id,
                "重载请求过期，拒绝"
            );
            return false;
        }
        self.latest_requested_id = request.id;
        // 后来的请求直接顶替尚未开工的 pending
        self.pending = Some(request);
        true
    }

    /// 有 pending 且无在途构建时启动一次后台构建。
    /// 返回 true 表示本次确实新启动了构建。
    ///
    /// 预期由服务循环周期性调用（例如每个 idle tick 一次），
    /// 这是唯一的构建启动点。
    pub fn maybe_build_data_loader(&mut self) -> bool {
        if self.response_future.is_some() {
            return false;
        }
        let Some(request) = self.pending.take() else {
            return false;
        };
        let future = self.loader.start_build(request);
        self.response_future = Some(future);
        true
    }

    /// 轮询在途构建。默认非阻塞：无在途构建或结果未就绪返回 None。
    /// 结果就绪时取走并作废 future（同一结果只能取走一次）。
    pub fn get_data_loader_response(&mut self) -> Option<LoaderResponse> {
        let future = self.response_future.as_mut()?;
        let response = if self.always_wait_for_response {
            Some(future.wait())
        } else {
            future.try_take()
        }?;
        self.response_future = None;
        Some(response)
    }

    /// 取一次构建结果并尝试换装。
    ///
    /// - 无结果可取 → None
    /// - 构建失败 → Some(Failed)，旧资源不动
    /// - 结果 id 不大于已安装 id（被超越/乱序完成）→ Some(Rejected)，丢弃
    /// - 其余 → 原子换装；派生对象构建失败时 Some(Failed)，旧资源不动
    pub fn maybe_reload_engine(&mut self) -> Option<ReloadResponse> {
        let response = self.get_data_loader_response()?;
        let id = response.id;
        let modules = match response.result {
            Ok(modules) => modules,
            Err(e) => {
                tracing::warn!(id, error = %e, "构建失败，保持当前资源");
                return Some(ReloadResponse::failed(id, e));
            }
        };
        if id <= self.current_installed_id {
            tracing::debug!(
                id,
                current = self.current_installed_id,
                "构建结果已被超越，丢弃"
            );
            return Some(ReloadResponse::rejected(id));
        }
        match self.install(id, response.profile, Arc::new(modules)) {
            Ok(()) => Some(ReloadResponse::installed(id)),
            Err(e) => {
                tracing::warn!(id, error = %e, "换装失败，保持当前资源");
                Some(ReloadResponse::failed(id, e))
            }
        }
    }

    /// 原子换装：新一代整体就绪后一次性替换句柄并推进已安装 id。
    fn install(&mut self, id: u64, profile: Profile, modules: Arc<Modules>) -> Result<(), InitError> {
        let generation = Generation::build(id, profile, modules)?;
        let version = generation.modules().data_version().to_string();
        self.generation = Some(Arc::new(generation));
        self.current_installed_id = id;
        tracing::info!(id, version = %version, "新一代资源已生效");
        Ok(())
    }

    /// 便捷入口：用默认数据来源与下一个 id 发起重载并尝试开工。非阻塞。
    pub fn reload(&mut self) -> ReloadResponse {
        let id = self.latest_requested_id + 1;
        let request = ReloadRequest {
            id,
            profile: self.profile,
            source: self.source.clone(),
        };
        if !self.send_reload_request(request) {
            return ReloadResponse::rejected(id);
        }
        self.maybe_build_data_loader();
        ReloadResponse::pending(id)
    }

    /// 同 `reload()`，但阻塞驱动到结果落定（安装/失败/丢弃）才返回。
    /// 启动期与测试里需要同步观察结果时使用。
    pub fn reload_and_wait(&mut self) -> ReloadResponse {
        let mut response = self.reload();
        let saved = self.always_wait_for_response;
        self.always_wait_for_response = true;
        // 可能先要消化一个更早的在途构建，再轮到本次请求
        while self.response_future.is_some() || self.pending.is_some() {
            self.maybe_build_data_loader();
            if let Some(r) = self.maybe_reload_engine() {
                response = r;
            }
        }
        self.always_wait_for_response = saved;
        response
    }

    // ---- 测试钩子 ----

    /// 换掉 loader（测试替身用）。
    pub fn set_data_loader_for_testing(&mut self, loader: Box<dyn DataLoader>) {
        self.loader = loader;
    }

    /// 强制 `get_data_loader_response` 走阻塞路径（仅测试用）。
    pub fn set_always_wait_for_testing(&mut self, value: bool) {
        self.always_wait_for_response = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ReloadStatus;
    use henkan_dict::TsvDataManager;

    const DICT: &str = "\
天気\tてんき\t1\t6000
私\tわたし\t1\t6000
";

    fn memory_source(version: &str) -> DataSource {
        let manager = TsvDataManager::from_tsv(version, DICT, "", "", "").expect("manager");
        DataSource::Memory(Arc::new(manager))
    }

    fn modules_with_version(version: &str) -> Modules {
        let manager = TsvDataManager::from_tsv(version, DICT, "", "", "").expect("manager");
        Modules::build(&manager).expect("modules")
    }

    fn empty_modules(version: &str) -> Modules {
        let manager = TsvDataManager::from_tsv(version, "", "", "", "").expect("manager");
        Modules::build(&manager).expect("modules")
    }

    fn request(id: u64) -> ReloadRequest {
        ReloadRequest {
            id,
            profile: Profile::Desktop,
            source: memory_source("vtest"),
        }
    }

    /// 替身：按预置应答交付；脚本耗尽后再开工说明测试写错了。
    struct ScriptedLoader {
        script: Vec<LoaderResponse>,
    }

    impl DataLoader for ScriptedLoader {
        fn start_build(&mut self, _request: ReloadRequest) -> ResponseFuture {
            ResponseFuture::resolved(self.script.remove(0))
        }
    }

    /// 替身：永不交付结果（发送端被持住）。
    struct StalledLoader {
        keep: Vec<std::sync::mpsc::SyncSender<LoaderResponse>>,
    }

    impl DataLoader for StalledLoader {
        fn start_build(&mut self, request: ReloadRequest) -> ResponseFuture {
            let (future, tx) = ResponseFuture::pending(request.id, request.profile);
            self.keep.push(tx);
            future
        }
    }

    fn scripted(engine: &mut Engine, script: Vec<LoaderResponse>) {
        engine.set_data_loader_for_testing(Box::new(ScriptedLoader { script }));
    }

    fn ok_response(id: u64, version: &str) -> LoaderResponse {
        LoaderResponse {
            id,
            profile: Profile::Desktop,
            result: Ok(modules_with_version(version)),
        }
    }

    #[test]
    fn send_reload_request_enforces_monotonic_ids() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        assert!(engine.send_reload_request(request(5)));
        assert_eq!(engine.latest_requested_id(), 5);
        // 重复/过期 id 是无害空操作
        assert!(!engine.send_reload_request(request(5)));
        assert!(!engine.send_reload_request(request(3)));
        assert_eq!(engine.latest_requested_id(), 5);
    }

    #[test]
    fn at_most_one_build_in_flight() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        engine.set_data_loader_for_testing(Box::new(StalledLoader { keep: Vec::new() }));
        assert!(engine.send_reload_request(request(1)));
        assert!(engine.maybe_build_data_loader());
        // 在途构建未完成：新请求受理但不开工
        assert!(engine.send_reload_request(request(2)));
        assert!(!engine.maybe_build_data_loader());
        assert!(!engine.maybe_build_data_loader());
        // 结果未就绪，非阻塞轮询拿不到东西
        assert!(engine.get_data_loader_response().is_none());
    }

    #[test]
    fn later_pending_request_supersedes_earlier() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        scripted(&mut engine, vec![ok_response(2, "v2")]);
        assert!(engine.send_reload_request(request(1)));
        assert!(engine.send_reload_request(request(2)));
        // 只会为后到的 id=2 开工
        assert!(engine.maybe_build_data_loader());
        assert!(!engine.maybe_build_data_loader());
        let response = engine.maybe_reload_engine().expect("response");
        assert_eq!(response.status, ReloadStatus::Installed);
        assert_eq!(engine.current_installed_id(), 2);
        assert_eq!(engine.data_version(), "v2");
    }

    #[test]
    fn failed_build_changes_nothing() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        scripted(
            &mut engine,
            vec![LoaderResponse {
                id: 1,
                profile: Profile::Desktop,
                result: Err(DataError::MissingVersion),
            }],
        );
        assert!(engine.send_reload_request(request(1)));
        assert!(engine.maybe_build_data_loader());
        let response = engine.maybe_reload_engine().expect("response");
        assert_eq!(response.status, ReloadStatus::Failed);
        assert!(response.error.is_some());
        assert!(!engine.is_initialized());
        assert_eq!(engine.current_installed_id(), 0);
        // 失败后读路径仍然可用（MinimalEngine 兜底）
        assert!(engine.converter().convert("てんき", 9).is_empty());
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        // 先装上 id=2
        scripted(&mut engine, vec![ok_response(2, "v2")]);
        assert!(engine.send_reload_request(request(2)));
        assert!(engine.maybe_build_data_loader());
        assert_eq!(
            engine.maybe_reload_engine().expect("install").status,
            ReloadStatus::Installed
        );
        // 乱序完成：回来的结果 id=1，不得回退
        scripted(&mut engine, vec![ok_response(1, "v1")]);
        assert!(engine.send_reload_request(request(3)));
        assert!(engine.maybe_build_data_loader());
        let response = engine.maybe_reload_engine().expect("response");
        assert_eq!(response.status, ReloadStatus::Rejected);
        assert_eq!(engine.current_installed_id(), 2);
        assert_eq!(engine.data_version(), "v2");
    }

    #[test]
    fn install_failure_keeps_previous_generation() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        scripted(&mut engine, vec![ok_response(1, "v1")]);
        assert!(engine.send_reload_request(request(1)));
        assert!(engine.maybe_build_data_loader());
        assert_eq!(
            engine.maybe_reload_engine().expect("install").status,
            ReloadStatus::Installed
        );
        // 快照有效但词典为空 -> 派生对象构建失败
        scripted(
            &mut engine,
            vec![LoaderResponse {
                id: 2,
                profile: Profile::Desktop,
                result: Ok(empty_modules("v2")),
            }],
        );
        assert!(engine.send_reload_request(request(2)));
        assert!(engine.maybe_build_data_loader());
        let response = engine.maybe_reload_engine().expect("response");
        assert_eq!(response.status, ReloadStatus::Failed);
        // 旧一代保持生效；不回退到 MinimalEngine
        assert!(engine.is_initialized());
        assert_eq!(engine.current_installed_id(), 1);
        assert_eq!(engine.data_version(), "v1");
        assert!(!engine.converter().convert("てんき", 9).is_empty());
    }

    #[test]
    fn reads_route_to_minimal_before_first_install() {
        let engine = Engine::new(memory_source("v1"), Profile::Desktop);
        assert!(!engine.is_initialized());
        assert_eq!(engine.predictor_name(), "");
        assert_eq!(engine.data_version(), "");
        assert!(engine.pos_list().is_empty());
        assert!(engine.generation().is_none());
        assert!(engine.converter().convert("てんき", 9).is_empty());
    }

    #[test]
    fn old_generation_snapshot_survives_cutover() {
        let mut engine = Engine::new(memory_source("v1"), Profile::Desktop);
        scripted(&mut engine, vec![ok_response(1, "v1"), ok_response(2, "v2")]);
        assert!(engine.send_reload_request(request(1)));
        assert!(engine.maybe_build_data_loader());
        engine.maybe_reload_engine().expect("install v1");
        let old = engine.generation().expect("snapshot");
        assert!(engine.send_reload_request(request(2)));
        assert!(engine.maybe_build_data_loader());
        engine.maybe_reload_engine().expect("install v2");
        // 旧快照完整可用，新读者看到新一代
        assert_eq!(old.modules().data_version(), "v1");
        assert_eq!(old.id(), 1);
        assert_eq!(engine.data_version(), "v2");
    }

    #[test]
    fn with_manager_installs_immediately() {
        let manager =
            TsvDataManager::from_tsv("boot", DICT, "", "", "").expect("manager");
        let engine = Engine::desktop(Arc::new(manager)).expect("engine");
        assert!(engine.is_initialized());
        assert_eq!(engine.current_installed_id(), 1);
        assert_eq!(engine.data_version(), "boot");
        assert_eq!(engine.predictor_name(), "DesktopPredictor");
    }
}
