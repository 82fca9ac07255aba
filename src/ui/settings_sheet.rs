// 曝光设置面板 - ISO 和快门时长滑块

use crate::models::{ExposureBounds, ExposureSelection};

const ISO_TITLE: &str = "ISO";
const SHUTTER_TITLE: &str = "Shutter Speed";

/// 带标题和数值标签的滑块
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSlider {
    title: String,
    min: f32,
    max: f32,
    value: f32,
}

impl RangeSlider {
    /// 创建滑块，初始值限制在范围内
    pub fn new(title: impl Into<String>, min: f32, max: f32, value: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            title: title.into(),
            min,
            max,
            value: value.clamp(min, max),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// 拖动滑块（超出范围的值被截断）
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    /// 数值标签，保留两位小数
    pub fn formatted_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// 曝光设置面板
#[derive(Debug, Clone, Default)]
pub struct SettingsSheet {
    iso: Option<RangeSlider>,
    shutter: Option<RangeSlider>,
}

impl SettingsSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用设备曝光范围初始化两个滑块，没有范围时保持原样
    pub fn configure(&mut self, bounds: Option<ExposureBounds>) {
        let Some(bounds) = bounds else {
            return;
        };

        self.iso = Some(RangeSlider::new(
            ISO_TITLE,
            bounds.min_iso,
            bounds.max_iso,
            bounds.current_iso,
        ));
        self.shutter = Some(RangeSlider::new(
            SHUTTER_TITLE,
            bounds.min_exposure_duration as f32,
            bounds.max_exposure_duration as f32,
            bounds.current_exposure_duration as f32,
        ));
    }

    pub fn is_configured(&self) -> bool {
        self.iso.is_some() && self.shutter.is_some()
    }

    pub fn iso_slider(&self) -> Option<&RangeSlider> {
        self.iso.as_ref()
    }

    pub fn shutter_slider(&self) -> Option<&RangeSlider> {
        self.shutter.as_ref()
    }

    pub fn set_iso(&mut self, value: f32) {
        if let Some(slider) = self.iso.as_mut() {
            slider.set_value(value);
        }
    }

    pub fn set_shutter(&mut self, value: f32) {
        if let Some(slider) = self.shutter.as_mut() {
            slider.set_value(value);
        }
    }

    /// 确认调节，返回滑块当前值
    pub fn confirm(&self) -> Option<ExposureSelection> {
        let iso = self.iso.as_ref()?;
        let shutter = self.shutter.as_ref()?;
        Some(ExposureSelection {
            iso: iso.value(),
            exposure_duration: shutter.value(),
        })
    }
}
