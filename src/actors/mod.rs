// Actor模块 - 使用Actor模式管理并发状态
//
// 用Actor模式替代Arc<Mutex<T>>，通过消息传递实现并发控制
// 每个Actor就是一个单线程任务队列，共享状态只在队列内修改

pub mod image_store;
pub mod system_status;

pub use image_store::{ImageStoreActor, ImageStoreCommand, ImageStoreHandle};
pub use system_status::{SystemStatusActor, SystemStatusCommand, SystemStatusHandle};
