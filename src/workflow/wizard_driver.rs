//! 申请向导驱动 - 流程层
//!
//! 核心职责：完成"一个职位"的一次申请尝试
//!
//! 流程顺序：
//! 1. 打开职位页 → 找入口按钮 → 激活
//! 2. 等待弹窗 → 循环 { 填写当前步骤 → Submit / Review / Next }
//! 3. 返回 [`ApplicationOutcome`]
//!
//! 决策全部交给 [`transition`]，这里只负责执行副作用并回报观察结果。

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{FallbackPolicy, WizardPolicy};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{wait_for_selector, ElementRef, PageSurface};
use crate::models::{ApplicationOutcome, ApplyStatus, JobReference, UserProfile};
use crate::services::{selectors, AnswerOracle, FieldFiller, Matchers, NavAction, NavTarget};
use crate::workflow::apply_ctx::ApplyCtx;
use crate::workflow::wizard_state::{transition, WizardEffect, WizardEvent, WizardState};

/// 一次尝试中驱动器记住的页面元素
#[derive(Default)]
struct Attempt {
    entry: Option<ElementRef>,
    modal: Option<ElementRef>,
    nav: Option<NavTarget>,
    steps: usize,
}

/// 申请向导驱动
///
/// - 不持有浏览器生命周期，只使用注入的 [`PageSurface`]
/// - 用户资料与问答能力在构造时注入，运行期间只读
pub struct WizardDriver {
    page: Arc<dyn PageSurface>,
    filler: FieldFiller,
    matchers: Matchers,
    policy: WizardPolicy,
}

impl WizardDriver {
    pub fn new(
        page: Arc<dyn PageSurface>,
        oracle: Arc<dyn AnswerOracle>,
        profile: Arc<UserProfile>,
        fallback: FallbackPolicy,
        policy: WizardPolicy,
    ) -> Self {
        Self {
            filler: FieldFiller::new(page.clone(), oracle, profile, fallback),
            page,
            matchers: Matchers::new(),
            policy,
        }
    }

    /// 打开职位页并完成一次申请尝试
    ///
    /// 界面差异（元素失效）映射为 `failedUnknownState`；
    /// 只有浏览器本身不可用之类的错误才会返回 `Err`。
    pub async fn apply(&self, job: &JobReference, ctx: &ApplyCtx) -> AppResult<ApplicationOutcome> {
        info!("{} 🌐 打开职位页: {}", ctx, job.url);
        self.page.goto(&job.url).await?;
        pause(self.policy.page_settle).await;
        self.drive(&job.id, ctx).await
    }

    /// 在已打开的职位页上驱动向导
    pub async fn drive(&self, job_id: &str, ctx: &ApplyCtx) -> AppResult<ApplicationOutcome> {
        let mut attempt = Attempt::default();
        let status = match self.run_machine(&mut attempt, ctx).await {
            Ok(state) => state,
            Err(e) if e.is_element_missing() => {
                warn!("{} ⚠️ 页面元素失效，按未知状态处理: {}", ctx, e);
                WizardState::Aborted(ApplyStatus::FailedUnknownState)
            }
            Err(e) => return Err(e),
        };

        let (status, confirmed) = status
            .outcome()
            .unwrap_or((ApplyStatus::FailedUnknownState, false));
        let outcome = ApplicationOutcome {
            confirmed,
            steps: attempt.steps,
            ..ApplicationOutcome::new(job_id, status)
        };
        self.log_outcome(ctx, &outcome);
        Ok(outcome)
    }

    async fn run_machine(&self, attempt: &mut Attempt, ctx: &ApplyCtx) -> AppResult<WizardState> {
        let mut state = WizardState::NotStarted;
        let mut event = WizardEvent::Start;

        loop {
            let next = transition(state, event, &self.policy);
            debug!("{} {:?} + {:?} -> {:?}", ctx, state, event, next.next);
            state = next.next;

            let mut observed = None;
            for effect in next.effects {
                if let Some(e) = self.execute(effect, attempt, ctx).await? {
                    observed = Some(e);
                }
            }

            if state.is_terminal() {
                return Ok(state);
            }
            match observed {
                Some(e) => event = e,
                None => {
                    warn!("{} 状态 {:?} 没有产生新的观察结果", ctx, state);
                    return Ok(WizardState::Aborted(ApplyStatus::FailedUnknownState));
                }
            }
        }
    }

    async fn execute(
        &self,
        effect: WizardEffect,
        attempt: &mut Attempt,
        ctx: &ApplyCtx,
    ) -> AppResult<Option<WizardEvent>> {
        let page = self.page.as_ref();
        match effect {
            WizardEffect::LocateEntry => {
                attempt.entry = self.matchers.entry_point.first_visible(page, None).await?;
                Ok(Some(match attempt.entry {
                    Some(_) => WizardEvent::EntryFound,
                    None => {
                        let title = page.title().await.unwrap_or_default();
                        info!("{} ⏭️ 没有找到快速申请入口，页面标题: {}", ctx, title);
                        WizardEvent::EntryMissing
                    }
                }))
            }
            WizardEffect::ActivateEntry => {
                let entry = attempt
                    .entry
                    .as_ref()
                    .ok_or_else(|| AppError::element_detached("entry"))?;
                page.scroll_into_view(entry).await?;
                let hidden = page.hide_elements(selectors::OVERLAYS).await.unwrap_or(0);
                debug!("{} 已隐藏 {} 个遮挡层", ctx, hidden);
                page.activate(entry).await?;
                info!("{} 🖱️ 已点击快速申请入口", ctx);
                Ok(None)
            }
            WizardEffect::AwaitModal => {
                let opened = wait_for_selector(
                    page,
                    selectors::MODAL_APPEAR,
                    self.policy.modal_timeout,
                    self.policy.poll_interval,
                )
                .await?;
                if !opened {
                    info!("{} ↪️ 弹窗未出现，可能是站外申请", ctx);
                }
                Ok(Some(if opened {
                    WizardEvent::ModalOpened
                } else {
                    WizardEvent::ModalMissing
                }))
            }
            WizardEffect::InspectModal => {
                attempt.modal = self.find_modal().await?;
                Ok(Some(WizardEvent::ModalChecked {
                    present: attempt.modal.is_some(),
                }))
            }
            WizardEffect::FillStep => {
                let modal = attempt
                    .modal
                    .as_ref()
                    .ok_or_else(|| AppError::element_detached("modal"))?;
                attempt.steps += 1;
                info!("{} 📝 第 {} 步", ctx, attempt.steps);
                let report = self.filler.fill_step(modal).await;
                debug!(
                    "{} 本步: 作答 {} / 保留 {} / 跳过 {} / 失败 {}",
                    ctx, report.answered, report.kept, report.skipped, report.failed
                );
                if report.failed > 0 {
                    warn!("{} ⚠️ 本步有 {} 个字段处理失败", ctx, report.failed);
                }
                Ok(Some(WizardEvent::StepFilled {
                    unanswered: report.failed,
                }))
            }
            WizardEffect::LocateNavigation => {
                let modal = attempt
                    .modal
                    .as_ref()
                    .ok_or_else(|| AppError::element_detached("modal"))?;
                attempt.nav = self.matchers.locate_navigation(page, modal).await?;
                let action = attempt.nav.as_ref().map(|nav| nav.action);
                if action.is_none() {
                    debug!("{} 本步没有可识别的导航按钮", ctx);
                }
                Ok(Some(WizardEvent::NavigationLocated(action)))
            }
            WizardEffect::Activate(action) => {
                let nav = attempt
                    .nav
                    .take()
                    .filter(|nav| nav.action == action)
                    .ok_or_else(|| AppError::element_detached(format!("{:?}", action)))?;
                info!(
                    "{} ➡️ {}{}",
                    ctx,
                    action_name(action),
                    if nav.via_fallback { "（主按钮兜底）" } else { "" }
                );
                if let Err(e) = page.click(&nav.element).await {
                    if e.is_element_missing() {
                        return Err(e);
                    }
                    debug!("{} 点击失败，改为直接激活: {}", ctx, e);
                    page.activate(&nav.element).await?;
                }
                Ok(None)
            }
            WizardEffect::Pause(duration) => {
                pause(duration).await;
                Ok(None)
            }
            WizardEffect::CheckValidation => {
                // 只看弹窗内的校验提示
                let errors = match attempt.modal.as_ref() {
                    Some(modal) => !page
                        .query(Some(modal), selectors::INLINE_ERROR)
                        .await?
                        .is_empty(),
                    None => false,
                };
                if errors {
                    warn!("{} ⚠️ 表单校验失败，放弃该职位", ctx);
                }
                Ok(Some(WizardEvent::ValidationChecked { errors }))
            }
            WizardEffect::DismissAcknowledgement => {
                match self.matchers.acknowledgement.first_visible(page, None).await {
                    Ok(Some(done)) => {
                        if let Err(e) = page.click(&done).await {
                            debug!("{} 关闭确认框失败: {}", ctx, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!("{} 查找确认框失败: {}", ctx, e),
                }
                Ok(None)
            }
        }
    }

    async fn find_modal(&self) -> AppResult<Option<ElementRef>> {
        if let Some(modal) = self.page.query(None, selectors::MODAL).await?.into_iter().next() {
            return Ok(Some(modal));
        }
        Ok(self
            .page
            .query(None, selectors::MODAL_APPEAR)
            .await?
            .into_iter()
            .next())
    }

    fn log_outcome(&self, ctx: &ApplyCtx, outcome: &ApplicationOutcome) {
        match outcome.status {
            ApplyStatus::Submitted if outcome.confirmed => {
                info!("{} ✅ 申请已提交（{} 步）", ctx, outcome.steps)
            }
            ApplyStatus::Submitted => {
                warn!("{} ⚠️ 弹窗已关闭但未确认提交，按已提交处理", ctx)
            }
            status => info!("{} 结束: {}（{} 步）", ctx, status, outcome.steps),
        }
    }
}

fn action_name(action: NavAction) -> &'static str {
    match action {
        NavAction::Submit => "Submit",
        NavAction::Review => "Review",
        NavAction::Next => "Next",
    }
}

async fn pause(duration: std::time::Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
