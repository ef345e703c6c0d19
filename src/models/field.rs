//! 表单字段分类结果（只在一次分类过程中存在）

use crate::infrastructure::ElementRef;

/// 字段类型，按填写顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 文本 / 数字输入框、多行文本
    Text,
    /// 单选组（fieldset + radio）
    RadioGroup,
    /// 下拉框
    Select,
    /// 文件上传
    File,
    /// 同意类复选框
    Checkbox,
}

/// 候选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub label: String,
    /// 单选项对应的 input；下拉框选项为 None
    pub element: Option<ElementRef>,
    /// 单选项 input 的 id，用于定位 `label[for]`
    pub html_id: Option<String>,
}

impl FieldOption {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            element: None,
            html_id: None,
        }
    }
}

/// 一个被分类的表单字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub kind: FieldKind,
    /// 字段本身（单选组时为 fieldset）
    pub element: ElementRef,
    /// DOM id
    pub identifier: Option<String>,
    /// 交给 LLM 的问题文本
    pub question_label: String,
    pub current_value: Option<String>,
    pub candidate_options: Vec<FieldOption>,
}

impl FormField {
    pub fn option_labels(&self) -> Vec<String> {
        self.candidate_options
            .iter()
            .map(|o| o.label.clone())
            .collect()
    }
}

/// 单步填写统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// 本次写入了答案
    pub answered: usize,
    /// 已有可接受的值，保持不动
    pub kept: usize,
    /// 不可见、无标签等原因跳过
    pub skipped: usize,
    /// 操作过程中出错（元素失效等）
    pub failed: usize,
}
