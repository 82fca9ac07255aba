// 界面状态模块 - 不负责绘制，只维护界面需要的状态并转发用户操作

pub mod bottom_bar;
pub mod gallery_view;
pub mod main_view;
pub mod settings_sheet;

pub use bottom_bar::BottomBar;
pub use gallery_view::{GalleryView, ImagePreview};
pub use main_view::{LastImagePreview, MainView};
pub use settings_sheet::{RangeSlider, SettingsSheet};
