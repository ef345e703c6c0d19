//! 申请向导状态机
//!
//! 纯函数：`transition(state, event, policy)` 给出下一个状态和需要执行的副作用，
//! 不接触页面。驱动器（[`super::WizardDriver`]）执行副作用，并把观察结果作为事件喂回来。
//!
//! ```text
//! NotStarted ──EntryFound──▶ EntryLocated ──ModalOpened──▶ StepActive ◀─┐
//!     │                          │                          │  │  │      │
//!  EntryMissing              ModalMissing             Submit Review Next │
//!     ▼                          ▼                          ▼  ▼  ▼      │
//!  Aborted(no entry)   Aborted(external)          Submitted Reviewing Advancing
//! ```

use std::time::Duration;

use crate::config::WizardPolicy;
use crate::models::ApplyStatus;
use crate::services::NavAction;

/// 向导状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    NotStarted,
    /// 已找到入口按钮，等待弹窗
    EntryLocated,
    /// 正在处理第 `iteration` 步（从 0 开始）
    ///
    /// `unanswered` 是本步填写后仍处理失败的字段数，大于 0 时不允许提交。
    StepActive {
        iteration: usize,
        last_action: Option<NavAction>,
        unanswered: usize,
    },
    /// 已点击 Review，等待汇总页
    Reviewing { iteration: usize },
    /// 已点击 Next，等待校验结果
    Advancing { iteration: usize },
    /// `confirmed` 为 false 表示弹窗无声关闭推断出的提交
    Submitted { confirmed: bool },
    Aborted(ApplyStatus),
}

impl WizardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WizardState::Submitted { .. } | WizardState::Aborted(_))
    }

    /// 终止状态对应的申请结果
    pub fn outcome(&self) -> Option<(ApplyStatus, bool)> {
        match *self {
            WizardState::Submitted { confirmed } => Some((ApplyStatus::Submitted, confirmed)),
            WizardState::Aborted(status) => Some((status, false)),
            _ => None,
        }
    }
}

/// 驱动器观察到的事实
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    Start,
    EntryFound,
    EntryMissing,
    ModalOpened,
    ModalMissing,
    ModalChecked { present: bool },
    StepFilled { unanswered: usize },
    NavigationLocated(Option<NavAction>),
    ValidationChecked { errors: bool },
}

/// 需要驱动器执行的动作
///
/// 观察类动作（Locate / Await / Inspect / Fill / Check）会产生下一个事件，总是排在列表最后。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEffect {
    LocateEntry,
    /// 滚动到入口、隐藏遮挡层、直接激活
    ActivateEntry,
    AwaitModal,
    InspectModal,
    FillStep,
    LocateNavigation,
    Activate(NavAction),
    Pause(Duration),
    CheckValidation,
    DismissAcknowledgement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: WizardState,
    pub effects: Vec<WizardEffect>,
}

impl Transition {
    fn to(next: WizardState, effects: Vec<WizardEffect>) -> Self {
        Self { next, effects }
    }

    fn stop(next: WizardState) -> Self {
        Self::to(next, Vec::new())
    }
}

/// 状态转移
pub fn transition(state: WizardState, event: WizardEvent, policy: &WizardPolicy) -> Transition {
    use WizardEffect::*;
    use WizardEvent::*;
    use WizardState::*;

    let unknown = Transition::stop(Aborted(ApplyStatus::FailedUnknownState));

    match (state, event) {
        (s, _) if s.is_terminal() => Transition::stop(s),

        (NotStarted, Start) => Transition::to(NotStarted, vec![LocateEntry]),
        (NotStarted, EntryFound) => Transition::to(EntryLocated, vec![ActivateEntry, AwaitModal]),
        (NotStarted, EntryMissing) => Transition::stop(Aborted(ApplyStatus::SkippedNoEntryPoint)),

        (EntryLocated, ModalOpened) => Transition::to(
            StepActive {
                iteration: 0,
                last_action: None,
                unanswered: 0,
            },
            vec![Pause(policy.step_settle), InspectModal],
        ),
        (EntryLocated, ModalMissing) => {
            Transition::stop(Aborted(ApplyStatus::SkippedExternalRedirect))
        }

        (StepActive { iteration, .. }, ModalChecked { present }) => {
            begin_step(state, iteration, present, policy)
        }
        (Reviewing { iteration }, ModalChecked { present }) => begin_step(
            StepActive {
                iteration: iteration + 1,
                last_action: Some(NavAction::Review),
                unanswered: 0,
            },
            iteration + 1,
            present,
            policy,
        ),

        (
            StepActive {
                iteration,
                last_action,
                ..
            },
            StepFilled { unanswered },
        ) => Transition::to(
            StepActive {
                iteration,
                last_action,
                unanswered,
            },
            vec![LocateNavigation],
        ),

        // 还有字段没填上时不能提交
        (StepActive { unanswered, .. }, NavigationLocated(Some(NavAction::Submit)))
            if unanswered > 0 =>
        {
            Transition::stop(Aborted(ApplyStatus::FailedUnknownState))
        }
        (StepActive { .. }, NavigationLocated(Some(NavAction::Submit))) => Transition::to(
            Submitted { confirmed: true },
            vec![
                Activate(NavAction::Submit),
                Pause(policy.confirmation_wait),
                DismissAcknowledgement,
            ],
        ),
        (StepActive { iteration, .. }, NavigationLocated(Some(NavAction::Review))) => {
            Transition::to(
                Reviewing { iteration },
                vec![
                    Activate(NavAction::Review),
                    Pause(policy.review_settle),
                    InspectModal,
                ],
            )
        }
        (StepActive { iteration, .. }, NavigationLocated(Some(NavAction::Next))) => {
            Transition::to(
                Advancing { iteration },
                vec![
                    Activate(NavAction::Next),
                    Pause(policy.next_settle),
                    CheckValidation,
                ],
            )
        }
        (StepActive { iteration, .. }, NavigationLocated(None)) => Transition::to(
            StepActive {
                iteration: iteration + 1,
                last_action: None,
                unanswered: 0,
            },
            vec![Pause(policy.step_settle), InspectModal],
        ),

        (Advancing { .. }, ValidationChecked { errors: true }) => {
            Transition::stop(Aborted(ApplyStatus::FailedValidation))
        }
        (Advancing { iteration }, ValidationChecked { errors: false }) => Transition::to(
            StepActive {
                iteration: iteration + 1,
                last_action: Some(NavAction::Next),
                unanswered: 0,
            },
            vec![Pause(policy.step_settle), InspectModal],
        ),

        _ => unknown,
    }
}

/// 新一轮循环的开头：弹窗还在就填写，步数用完则终止
fn begin_step(
    state: WizardState,
    iteration: usize,
    present: bool,
    policy: &WizardPolicy,
) -> Transition {
    if !present {
        return if policy.trust_silent_modal_close {
            Transition::stop(WizardState::Submitted { confirmed: false })
        } else {
            Transition::stop(WizardState::Aborted(ApplyStatus::FailedUnknownState))
        };
    }
    if iteration >= policy.max_steps {
        return Transition::stop(WizardState::Aborted(ApplyStatus::FailedUnknownState));
    }
    Transition::to(state, vec![WizardEffect::FillStep])
}
