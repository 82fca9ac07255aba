// 拍照定时器 - 负责定时触发拍照请求
//
// 定时器本身不拍照，只向捕获控制器的消息队列投递 Tick，
// 拍照请求始终由控制器在自己的队列中发起

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::controller::CaptureCommand;

/// 拍照定时器
///
/// Drop 时自动取消，停止后不会再投递 Tick
pub struct CaptureTimer {
    /// 定时任务句柄
    task: JoinHandle<()>,
    /// 触发间隔
    period: Duration,
}

impl CaptureTimer {
    /// 启动定时器，首次触发在一个间隔之后
    pub fn start(period: Duration, queue: mpsc::WeakSender<CaptureCommand>) -> Self {
        info!("拍照定时器已启动，间隔: {}毫秒", period.as_millis());

        let task = tokio::task::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            // 队列繁忙时不补发积压的触发
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(sender) = queue.upgrade() else {
                    debug!("捕获控制器已停止，定时器退出");
                    break;
                };

                if sender.send(CaptureCommand::Tick).await.is_err() {
                    debug!("捕获控制器队列已关闭，定时器退出");
                    break;
                }
                trace!("已投递拍照触发");
            }
        });

        Self { task, period }
    }

    /// 触发间隔
    pub fn period(&self) -> Duration {
        self.period
    }

    /// 取消定时器
    pub fn cancel(self) {
        // Drop 负责中止任务
    }
}

impl Drop for CaptureTimer {
    fn drop(&mut self) {
        self.task.abort();
        info!("拍照定时器已取消");
    }
}
