//! # 构建器模块
//!
//! 输出文档的装配：
//!
//! - `editor` - 可编辑文档构建器（工具栏、行为脚本）
//! - `capture_surface` - 交互模式的次级捕获页面
//! - `schedule` - 编辑激活时间线状态机

pub mod capture_surface;
pub mod editor;
pub mod schedule;

// Re-export commonly used items for convenience
pub use capture_surface::build_capture_surface;
pub use editor::EditorBuilder;
pub use schedule::{EditorPhase, EditorSchedule, SETTLE_DELAY_MS};
