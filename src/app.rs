//! 应用程序初始化和启动
//!
//! 负责应用的完整启动流程，包括：
//! - 日志系统初始化
//! - 各领域模块初始化
//! - Actor 系统启动
//! - 控制台界面（从标准输入读取命令）

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::camera::SimulatedCamera;
use crate::commands;
use crate::event_bus::{AppEvent, GalleryChange};
use crate::logger::{self, LogBroadcaster};
use crate::settings::SettingsManager;
use crate::ui::{GalleryView, MainView};
use crate::utils;
use crate::{AppPaths, AppState};

const HELP: &str = "\
命令:
  r               开始/停止录制
  x <iso> <秒>    调节曝光（不带参数时显示当前范围）
  g               打开相册
  e               切换编辑模式
  t <下标>        编辑模式下选择，否则预览
  d [下标...]     删除选中的图片，或直接删除指定下标
  i               相册信息
  c               完成拍摄（删除全部图片）
  s               系统状态
  p               当前配置
  q               退出";

/// 应用程序入口点
///
/// 1. 日志系统初始化
/// 2. 运行时创建
/// 3. 领域模块和 Actor 初始化
/// 4. 控制台界面运行直到退出
pub fn run() -> Result<()> {
    // 创建日志广播器
    let log_broadcaster = Arc::new(LogBroadcaster::new());

    // 初始化日志系统
    logger::init_with_broadcaster(log_broadcaster.clone(), &utils::get_log_dir())
        .map_err(|e| anyhow!("初始化日志失败: {}", e))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let paths = AppPaths::from_env();
        let settings = Arc::new(SettingsManager::new(paths.config_path.clone()).await?);
        let jpeg_quality = settings.get().await.jpeg_quality;

        let camera = Arc::new(SimulatedCamera::default().with_jpeg_quality(jpeg_quality));
        let state = AppState::initialize(paths, settings, camera, log_broadcaster).await?;

        commands::setup_camera(&state).await.map_err(|e| anyhow!(e))?;

        let result = run_console(&state).await;
        state.shutdown().await;
        result
    })
}

/// 控制台界面
async fn run_console(state: &AppState) -> Result<()> {
    let mut main_view = MainView::new(state.capture_domain.get_capture_handle().clone());
    let mut gallery_view = GalleryView::new(state.storage_domain.get_gallery().clone());
    let mut events = state.event_bus.subscribe();
    let mut logs = state.system_domain.get_logger().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("标准输入已关闭");
                    break;
                };
                if !handle_line(state, &mut main_view, &mut gallery_view, line.trim()).await {
                    break;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(AppEvent::Capture(change)) => main_view.apply_change(&change),
                    Ok(AppEvent::Gallery(GalleryChange::Error(message))) => {
                        println!("相册错误: {}", message);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => warn!("界面事件落后 {} 条", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
            log = logs.recv() => {
                match log {
                    Ok(log) => println!("{} {:>5} {}: {}", log.timestamp, log.level, log.target, log.message),
                    Err(RecvError::Lagged(skipped)) => println!("日志落后 {} 条", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

/// 处理一行命令，返回 false 表示退出
async fn handle_line(
    state: &AppState,
    main_view: &mut MainView,
    gallery_view: &mut GalleryView,
    line: &str,
) -> bool {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return true;
    };
    let args: Vec<&str> = parts.collect();

    match command {
        "r" => {
            if main_view.no_camera_access() {
                println!("没有相机权限");
                return true;
            }
            let recording = main_view.toggle_record().await;
            println!("{}", if recording { "录制中..." } else { "已停止录制" });
            if let Some(preview) = main_view.last_image() {
                println!(
                    "最后一张照片: {}x{} (高宽比 {:.2})",
                    preview.width, preview.height, preview.aspect_ratio
                );
            }
        }
        "x" => {
            let mut sheet = main_view.open_settings().await;
            let (Some(iso), Some(shutter)) = (sheet.iso_slider(), sheet.shutter_slider()) else {
                println!("相机会话未就绪");
                return true;
            };
            if args.len() < 2 {
                println!(
                    "{}: {} [{} - {}]  {}: {} [{} - {}]",
                    iso.title(),
                    iso.formatted_value(),
                    iso.min(),
                    iso.max(),
                    shutter.title(),
                    shutter.formatted_value(),
                    shutter.min(),
                    shutter.max()
                );
                return true;
            }
            match (args[0].parse::<f32>(), args[1].parse::<f32>()) {
                (Ok(iso), Ok(shutter)) => {
                    sheet.set_iso(iso);
                    sheet.set_shutter(shutter);
                    if let Some(selection) = sheet.confirm() {
                        match commands::apply_exposure(state, selection).await {
                            Ok(()) => println!(
                                "曝光已调节: ISO {:.2}, 快门 {:.4}s",
                                selection.iso, selection.exposure_duration
                            ),
                            Err(e) => println!("调节曝光失败: {}", e),
                        }
                    }
                }
                _ => println!("参数格式错误"),
            }
        }
        "g" => match gallery_view.reload().await {
            Ok(count) => {
                println!("相册共 {} 张图片", count);
                for (index, path) in gallery_view.items().iter().enumerate() {
                    println!("  [{}] {}", index, path.display());
                }
            }
            Err(e) => println!("加载相册失败: {}", e),
        },
        "e" => {
            let editing = gallery_view.toggle_editing();
            println!("{}", if editing { "编辑模式" } else { "已退出编辑模式" });
        }
        "t" => {
            let Some(index) = args.first().and_then(|s| s.parse::<usize>().ok()) else {
                println!("请输入下标");
                return true;
            };
            match gallery_view.tap(index).await {
                Some(preview) => println!(
                    "预览: {} ({}x{})",
                    preview.path.display(),
                    preview.width,
                    preview.height
                ),
                None if gallery_view.is_editing() => {
                    println!("已选择: {:?}", gallery_view.selected());
                }
                None => println!("无法预览第{}张图片", index),
            }
        }
        "d" if args.is_empty() => {
            let deleted = gallery_view.delete_selected().await;
            println!("已删除 {} 张图片", deleted);
        }
        "d" => {
            let Ok(indices) = args.iter().map(|s| s.parse::<usize>()).collect::<Result<Vec<_>, _>>()
            else {
                println!("参数格式错误");
                return true;
            };
            match commands::delete_gallery_images(state, indices).await {
                Ok(report) => {
                    println!("已删除 {} 张图片", report.removed.len());
                    for failure in &report.failures {
                        println!("  第{}张删除失败: {}", failure.index, failure.error);
                    }
                }
                Err(e) => println!("{}", e),
            }
            if let Err(e) = gallery_view.reload().await {
                println!("加载相册失败: {}", e);
            }
        }
        "i" => println!("{}", gallery_view.info_message().await),
        "c" => match gallery_view.complete().await {
            Ok(()) => println!("拍摄已完成"),
            Err(e) => println!("完成拍摄失败: {}", e),
        },
        "s" => match commands::get_system_status(state).await {
            Ok(status) => println!(
                "拍摄中: {}, 已拍摄: {}, 已保存: {}, 失败: {}, 图片: {} 张",
                status.is_capturing,
                status.captured_frames,
                status.saved_frames,
                status.failed_captures,
                status.storage_usage.image_count
            ),
            Err(e) => println!("获取状态失败: {}", e),
        },
        "p" => match commands::get_app_config(state).await {
            Ok(config) => match serde_json::to_string_pretty(&config) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("序列化配置失败: {}", e),
            },
            Err(e) => println!("获取配置失败: {}", e),
        },
        "q" => {
            if let Err(e) = commands::teardown_camera(state).await {
                println!("释放相机失败: {}", e);
            }
            return false;
        }
        _ => println!("{}", HELP),
    }

    true
}
