//! 编辑激活时间线
//!
//! 构建出的编辑器先等待一个固定的安定延迟，动态捕获再额外等待用户
//! 指定的秒数，然后才把页面标记为可编辑。原先的嵌套定时器回调在这里
//! 显式建模为一个小状态机，两个等待时长作为可测试的具名参数。

use std::time::Duration;

use crate::core::CaptureMode;

/// 文档加载完成后到开始处理前的固定安定延迟
pub const SETTLE_DELAY_MS: u64 = 500;

/// 时间线的各个阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    /// 构建出的文档尚未加载完成
    Loading,
    /// 安定延迟进行中
    SettleWait,
    /// 动态捕获的额外等待进行中
    ExtraWait,
    /// 页面已可编辑
    Editable,
}

/// 编辑激活调度：`Loading → SettleWait → [ExtraWait] → Editable`
///
/// 只有动态捕获才有 `ExtraWait` 阶段；静态与交互捕获在安定延迟后
/// 直接进入可编辑状态，用户指定的等待秒数被忽略。
#[derive(Debug, Clone)]
pub struct EditorSchedule {
    mode: CaptureMode,
    wait_seconds: u64,
    phase: EditorPhase,
}

impl EditorSchedule {
    pub fn new(mode: CaptureMode, wait_seconds: u64) -> Self {
        EditorSchedule {
            mode,
            wait_seconds,
            phase: EditorPhase::Loading,
        }
    }

    /// 固定安定延迟
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(SETTLE_DELAY_MS)
    }

    /// 额外等待：仅动态捕获非零
    pub fn extra_delay(&self) -> Duration {
        if self.mode == CaptureMode::Dynamic {
            Duration::from_secs(self.wait_seconds)
        } else {
            Duration::ZERO
        }
    }

    /// 从构建完成到页面可编辑的总时长
    pub fn editable_after(&self) -> Duration {
        self.settle_delay() + self.extra_delay()
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    /// 推进到下一阶段并返回它
    pub fn advance(&mut self) -> EditorPhase {
        self.phase = match self.phase {
            EditorPhase::Loading => EditorPhase::SettleWait,
            EditorPhase::SettleWait => {
                if self.extra_delay().is_zero() {
                    EditorPhase::Editable
                } else {
                    EditorPhase::ExtraWait
                }
            }
            EditorPhase::ExtraWait | EditorPhase::Editable => EditorPhase::Editable,
        };
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_capture_ignores_wait_seconds() {
        let schedule = EditorSchedule::new(CaptureMode::Static, 10);

        assert_eq!(schedule.extra_delay(), Duration::ZERO);
        assert_eq!(schedule.editable_after(), Duration::from_millis(500));
    }

    #[test]
    fn dynamic_capture_adds_wait_seconds() {
        let schedule = EditorSchedule::new(CaptureMode::Dynamic, 3);

        assert_eq!(schedule.extra_delay(), Duration::from_secs(3));
        assert_eq!(schedule.editable_after(), Duration::from_millis(3500));
    }

    #[test]
    fn iframe_capture_behaves_like_static() {
        let schedule = EditorSchedule::new(CaptureMode::Iframe, 7);

        assert_eq!(schedule.editable_after(), Duration::from_millis(500));
    }

    #[test]
    fn dynamic_phase_sequence() {
        let mut schedule = EditorSchedule::new(CaptureMode::Dynamic, 2);

        assert_eq!(schedule.phase(), EditorPhase::Loading);
        assert_eq!(schedule.advance(), EditorPhase::SettleWait);
        assert_eq!(schedule.advance(), EditorPhase::ExtraWait);
        assert_eq!(schedule.advance(), EditorPhase::Editable);
        assert_eq!(schedule.advance(), EditorPhase::Editable);
    }

    #[test]
    fn static_phase_sequence_skips_extra_wait() {
        let mut schedule = EditorSchedule::new(CaptureMode::Static, 2);

        assert_eq!(schedule.advance(), EditorPhase::SettleWait);
        assert_eq!(schedule.advance(), EditorPhase::Editable);
    }

    #[test]
    fn dynamic_with_zero_wait_skips_extra_wait() {
        let mut schedule = EditorSchedule::new(CaptureMode::Dynamic, 0);

        assert_eq!(schedule.advance(), EditorPhase::SettleWait);
        assert_eq!(schedule.advance(), EditorPhase::Editable);
    }
}
