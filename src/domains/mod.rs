// 领域模块 - 用于组织应用的业务逻辑
//
// 将 AppState 按业务领域分组,实现单一职责原则
// 包含3个领域:捕获、存储、系统

pub mod capture;
pub mod storage;
pub mod system;

pub use capture::CaptureDomain;
pub use storage::StorageDomain;
pub use system::SystemDomain;
