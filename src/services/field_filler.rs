//! 表单字段分类与填写 - 业务能力层
//!
//! 一次只处理弹窗中的一个步骤，字段按固定顺序处理：
//! 文本 → 单选组 → 下拉框 → 文件 → 复选框。
//! 单个字段失败（元素失效、操作报错）只计数，不会中断整个步骤。

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::FallbackPolicy;
use crate::error::AppResult;
use crate::infrastructure::{ElementRef, PageSurface};
use crate::models::{FieldKind, FieldOption, FormField, StepReport, UserProfile};
use crate::services::answer_oracle::AnswerOracle;
use crate::services::selectors::{self, label_for};
use crate::services::vocabulary::{is_yes_no_pair, AFFIRMATIVE_CONSENT, EXPERIENCE_LABEL, NO, YES};

/// 单个字段的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handled {
    Answered,
    Kept,
    Skipped,
}

/// 字段填写服务
///
/// 职责：
/// - 把一个步骤里的控件分类成 [`FormField`]
/// - 判断已有值是否可接受
/// - 其余字段向 [`AnswerOracle`] 要答案并写回页面
pub struct FieldFiller {
    page: Arc<dyn PageSurface>,
    oracle: Arc<dyn AnswerOracle>,
    profile: Arc<UserProfile>,
    fallback: FallbackPolicy,
}

impl FieldFiller {
    pub fn new(
        page: Arc<dyn PageSurface>,
        oracle: Arc<dyn AnswerOracle>,
        profile: Arc<UserProfile>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            page,
            oracle,
            profile,
            fallback,
        }
    }

    /// 填写当前步骤
    pub async fn fill_step(&self, scope: &ElementRef) -> StepReport {
        let mut report = StepReport::default();

        for element in self.query_or_empty(scope, selectors::TEXT_INPUTS).await {
            let result = self.fill_text(scope, &element).await;
            tally(&mut report, FieldKind::Text, &element, result);
        }
        for element in self.query_or_empty(scope, selectors::FIELDSET).await {
            let result = self.fill_radio_group(scope, &element).await;
            tally(&mut report, FieldKind::RadioGroup, &element, result);
        }
        for element in self.query_or_empty(scope, selectors::SELECT).await {
            let result = self.fill_select(scope, &element).await;
            tally(&mut report, FieldKind::Select, &element, result);
        }
        for element in self.query_or_empty(scope, selectors::FILE_INPUT).await {
            let result = self.fill_file(&element).await;
            tally(&mut report, FieldKind::File, &element, result);
        }
        for element in self.query_or_empty(scope, selectors::CHECKBOX).await {
            let result = self.fill_checkbox(scope, &element).await;
            tally(&mut report, FieldKind::Checkbox, &element, result);
        }

        debug!(
            "步骤填写完成: 作答 {} / 保留 {} / 跳过 {} / 失败 {}",
            report.answered, report.kept, report.skipped, report.failed
        );
        report
    }

    async fn query_or_empty(&self, scope: &ElementRef, selector: &str) -> Vec<ElementRef> {
        self.page
            .query(Some(scope), selector)
            .await
            .unwrap_or_else(|e| {
                debug!("查询 `{}` 失败: {}", selector, e);
                Vec::new()
            })
    }

    /// 通过 `label[for]` 读取字段的问题文本
    async fn label_text(&self, scope: &ElementRef, id: &str) -> AppResult<String> {
        let labels = self.page.query(Some(scope), &label_for(id)).await?;
        match labels.first() {
            Some(label) => Ok(self.page.inner_text(label).await.unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    // ========== 分类 ==========

    /// 文本框：必须可见、有 id、有关联标签
    async fn classify_text(
        &self,
        scope: &ElementRef,
        element: &ElementRef,
    ) -> AppResult<Option<FormField>> {
        if !self.page.is_visible(element).await.unwrap_or(false) {
            return Ok(None);
        }
        let Some(id) = self.page.attribute(element, "id").await? else {
            return Ok(None);
        };
        let question = self.label_text(scope, &id).await?.trim().to_string();
        if question.is_empty() {
            return Ok(None);
        }
        let value = self.page.input_value(element).await.unwrap_or_default();

        Ok(Some(FormField {
            kind: FieldKind::Text,
            element: element.clone(),
            identifier: Some(id),
            question_label: question,
            current_value: Some(value).filter(|v| !v.is_empty()),
            candidate_options: Vec::new(),
        }))
    }

    /// 单选组：问题取 legend，legend 为空时取可见的提示 span
    async fn classify_radio_group(
        &self,
        scope: &ElementRef,
        fieldset: &ElementRef,
    ) -> AppResult<Option<(FormField, Vec<ElementRef>)>> {
        let radios = self.page.query(Some(fieldset), selectors::RADIO).await?;
        if radios.is_empty() {
            return Ok(None);
        }

        let mut question = String::new();
        if let Some(legend) = self.page.query(Some(fieldset), selectors::LEGEND).await?.first() {
            if self.page.is_visible(legend).await.unwrap_or(false) {
                question = self.page.inner_text(legend).await.unwrap_or_default();
            }
        }
        if question.trim().is_empty() {
            if let Some(hint) = self
                .page
                .query(Some(fieldset), selectors::FIELDSET_HINT)
                .await?
                .first()
            {
                if self.page.is_visible(hint).await.unwrap_or(false) {
                    question = self.page.inner_text(hint).await.unwrap_or_default();
                }
            }
        }

        let mut current_value = None;
        let mut options = Vec::new();
        for radio in &radios {
            let id = self.page.attribute(radio, "id").await.unwrap_or(None);
            let label = match &id {
                Some(id) => self.label_text(scope, id).await.unwrap_or_default(),
                None => String::new(),
            };
            let label = label.replace('\n', " ").trim().to_string();
            if self.page.is_checked(radio).await.unwrap_or(false) {
                current_value = Some(label.clone());
            }
            if id.is_some() {
                options.push(FieldOption {
                    label,
                    element: Some(radio.clone()),
                    html_id: id,
                });
            }
        }

        let field = FormField {
            kind: FieldKind::RadioGroup,
            element: fieldset.clone(),
            identifier: self.page.attribute(fieldset, "id").await.unwrap_or(None),
            question_label: question.trim().to_string(),
            current_value,
            candidate_options: options,
        };
        Ok(Some((field, radios)))
    }

    // ========== 填写 ==========

    async fn fill_text(&self, scope: &ElementRef, element: &ElementRef) -> AppResult<Handled> {
        let Some(field) = self.classify_text(scope, element).await? else {
            return Ok(Handled::Skipped);
        };

        let refill = match field.current_value.as_deref() {
            None => false,
            Some("0") if EXPERIENCE_LABEL.is_match(&field.question_label) => {
                info!("经验字段 \"{}\" 预填了 0，重新作答", field.question_label);
                self.page.fill(element, "").await?;
                true
            }
            Some(_) => return Ok(Handled::Kept),
        };

        let mut answer = self.oracle.answer(&field.question_label, None).await;
        if refill && positive_integer(&answer).is_none() {
            let years = rand::thread_rng().gen_range(self.fallback.experience_years.clone());
            debug!("回答 \"{}\" 不是正整数，改用随机年限 {}", answer, years);
            answer = years.to_string();
        }

        self.page.fill(element, &answer).await?;
        Ok(Handled::Answered)
    }

    async fn fill_radio_group(&self, scope: &ElementRef, fieldset: &ElementRef) -> AppResult<Handled> {
        let Some((field, radios)) = self.classify_radio_group(scope, fieldset).await? else {
            return Ok(Handled::Skipped);
        };
        if field.current_value.is_some() {
            return Ok(Handled::Kept);
        }

        let labels = field.option_labels();
        let answer = self.oracle.answer(&field.question_label, Some(&labels)).await;

        let chosen = match_option(&labels, &answer)
            .or_else(|| match_yes_no(&labels, &answer))
            .and_then(|index| field.candidate_options.get(index));

        match chosen {
            Some(option) => self.select_radio(scope, option).await?,
            None => {
                debug!("单选组 \"{}\" 无法匹配答案，默认选择第一项", field.question_label);
                let first = field
                    .candidate_options
                    .first()
                    .cloned()
                    .unwrap_or_else(|| FieldOption {
                        label: String::new(),
                        element: Some(radios[0].clone()),
                        html_id: None,
                    });
                self.select_radio(scope, &first).await?;
            }
        }
        Ok(Handled::Answered)
    }

    /// 点击选项的 label；点击后未选中则直接激活 input
    async fn select_radio(&self, scope: &ElementRef, option: &FieldOption) -> AppResult<()> {
        let Some(radio) = option.element.as_ref() else {
            return Ok(());
        };

        if let Some(id) = option.html_id.as_deref() {
            if let Some(label) = self.page.query(Some(scope), &label_for(id)).await?.first() {
                if let Err(e) = self.page.click(label).await {
                    debug!("点击选项标签失败: {}", e);
                }
                if self.page.is_checked(radio).await.unwrap_or(false) {
                    return Ok(());
                }
            }
        }
        self.page.activate(radio).await
    }

    async fn fill_select(&self, scope: &ElementRef, select: &ElementRef) -> AppResult<Handled> {
        if !self.page.is_visible(select).await.unwrap_or(false) {
            return Ok(Handled::Skipped);
        }
        let Some(id) = self.page.attribute(select, "id").await? else {
            return Ok(Handled::Skipped);
        };
        let options = self.page.option_texts(select).await?;
        if options.is_empty() {
            return Ok(Handled::Skipped);
        }
        let question = self.label_text(scope, &id).await?.trim().to_string();
        if question.is_empty() {
            return Ok(Handled::Skipped);
        }
        if self.page.selected_index(select).await?.is_some_and(|i| i > 0) {
            return Ok(Handled::Kept);
        }

        let field = FormField {
            kind: FieldKind::Select,
            element: select.clone(),
            identifier: Some(id),
            question_label: question,
            current_value: None,
            candidate_options: options.into_iter().map(FieldOption::text).collect(),
        };
        let labels = field.option_labels();
        let answer = self.oracle.answer(&field.question_label, Some(&labels)).await;

        if !self.page.select_option_by_label(select, &answer).await? {
            debug!("下拉框没有选项 \"{}\"，改选第二项", answer);
            if !self.page.select_option_by_index(select, 1).await? {
                return Ok(Handled::Skipped);
            }
        }
        Ok(Handled::Answered)
    }

    async fn fill_file(&self, element: &ElementRef) -> AppResult<Handled> {
        if self.profile.resume_path.is_empty() {
            return Ok(Handled::Skipped);
        }
        info!("上传简历: {}", self.profile.resume_path);
        match self.page.set_input_files(element, &self.profile.resume_path).await {
            Ok(()) => Ok(Handled::Answered),
            Err(e) => {
                warn!("⚠️ 简历上传失败（可忽略）: {}", e);
                Ok(Handled::Skipped)
            }
        }
    }

    async fn fill_checkbox(&self, scope: &ElementRef, checkbox: &ElementRef) -> AppResult<Handled> {
        let Some(id) = self.page.attribute(checkbox, "id").await? else {
            return Ok(Handled::Skipped);
        };
        let label = self.label_text(scope, &id).await?.trim().to_string();
        if label.is_empty() {
            return Ok(Handled::Skipped);
        }
        if self.page.is_checked(checkbox).await.unwrap_or(false) {
            return Ok(Handled::Kept);
        }

        let agree = if AFFIRMATIVE_CONSENT.is_match(&label) {
            true
        } else {
            let options = ["Yes".to_string(), "No".to_string()];
            let answer = self.oracle.answer(&label, Some(&options)).await;
            answer.to_lowercase().contains("yes")
        };

        if !agree {
            return Ok(Handled::Skipped);
        }
        self.page.check(checkbox).await?;
        Ok(Handled::Answered)
    }
}

fn tally(report: &mut StepReport, kind: FieldKind, element: &ElementRef, result: AppResult<Handled>) {
    match result {
        Ok(Handled::Answered) => report.answered += 1,
        Ok(Handled::Kept) => report.kept += 1,
        Ok(Handled::Skipped) => report.skipped += 1,
        Err(e) => {
            debug!("{:?} 字段 {} 处理失败: {}", kind, element, e);
            report.failed += 1;
        }
    }
}

/// 答案与选项互相包含（不区分大小写）即视为匹配
fn match_option(options: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return None;
    }
    options.iter().position(|option| {
        let option = option.to_lowercase();
        !option.is_empty() && (option.contains(&answer) || answer.contains(&option))
    })
}

/// 是 / 否二选一时，按答案里的 yes / no 词选择
fn match_yes_no(options: &[String], answer: &str) -> Option<usize> {
    if !is_yes_no_pair(options) {
        return None;
    }
    if YES.is_match(answer) {
        options.iter().position(|o| YES.is_match(o))
    } else if NO.is_match(answer) {
        options.iter().position(|o| NO.is_match(o))
    } else {
        None
    }
}

/// 去掉非数字字符后解析为正整数
fn positive_integer(answer: &str) -> Option<u32> {
    let digits: String = answer.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}
