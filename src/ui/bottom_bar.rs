// 底部操作栏 - 录制按钮状态

/// 底部操作栏
#[derive(Debug, Default)]
pub struct BottomBar {
    is_recording: bool,
}

impl BottomBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 点击录制按钮，返回是否应该开始录制
    pub fn toggle_record(&mut self) -> bool {
        let should_start_recording = !self.is_recording;
        self.is_recording = should_start_recording;
        should_start_recording
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// 录制按钮标签
    pub fn record_label(&self) -> &'static str {
        if self.is_recording {
            "停止"
        } else {
            "录制"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_record_alternates() {
        let mut bar = BottomBar::new();
        assert!(!bar.is_recording());

        assert!(bar.toggle_record());
        assert!(bar.is_recording());
        assert_eq!(bar.record_label(), "停止");

        assert!(!bar.toggle_record());
        assert!(!bar.is_recording());
    }
}
