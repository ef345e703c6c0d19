//! 测试用的合成页面
//!
//! 一个极简的内存 DOM：支持本项目用到的 CSS 子集
//! （标签、class、`[attr="v"]`、`[attr*="v"]`、后代选择器、逗号并列），
//! 以及 label 关联、单选互斥、点击触发的显示 / 移除动作。

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quick_apply::error::{AppError, AppResult};
use quick_apply::infrastructure::{ElementRef, PageSurface};
use quick_apply::services::AnswerOracle;

pub type NodeId = usize;

/// 点击节点后对 DOM 的改动
#[derive(Debug, Clone, Default)]
pub struct Action {
    /// 这些字段没填时显示 `error`，不执行后面的改动
    pub require: Vec<NodeId>,
    pub error: Option<NodeId>,
    pub attach: Vec<NodeId>,
    pub detach: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub visible: bool,
    pub attached: bool,
    pub hidden_by_script: bool,
    pub options: Vec<String>,
    pub selected: usize,
    /// label 点击不生效（模拟被遮挡的标签）
    pub inert: bool,
    /// 写入时报"元素失效"
    pub broken: bool,
    pub on_click: Option<Action>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// 构造节点
pub fn el(tag: &str) -> Node {
    Node {
        tag: tag.to_string(),
        classes: Vec::new(),
        attrs: HashMap::new(),
        text: String::new(),
        value: String::new(),
        checked: false,
        visible: true,
        attached: true,
        hidden_by_script: false,
        options: Vec::new(),
        selected: 0,
        inert: false,
        broken: false,
        on_click: None,
        parent: None,
        children: Vec::new(),
    }
}

impl Node {
    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(String::from));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected = index;
        self
    }

    pub fn inert(mut self) -> Self {
        self.inert = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn on_click(mut self, action: Action) -> Self {
        self.on_click = Some(action);
        self
    }

    fn is_input(&self, kind: &str) -> bool {
        self.tag == "input" && self.attrs.get("type").map(String::as_str) == Some(kind)
    }
}

// ========== 选择器 ==========

#[derive(Debug, Clone)]
enum Op {
    Exists,
    Eq(String),
    Contains(String),
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Op)>,
}

/// 在方括号与引号之外按 `sep` 切分
fn split_top_level(input: &str, is_sep: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, c) if depth == 0 && is_sep(c) => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_compound(text: &str) -> Compound {
    let mut compound = Compound::default();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let read_name = |i: &mut usize| {
        let start = *i;
        while *i < chars.len() && !matches!(chars[*i], '.' | '[' | '#') {
            *i += 1;
        }
        chars[start..*i].iter().collect::<String>()
    };
    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                compound.classes.push(read_name(&mut i));
            }
            '#' => {
                i += 1;
                compound.attrs.push(("id".to_string(), Op::Eq(read_name(&mut i))));
            }
            '[' => {
                let start = i + 1;
                let mut quote = None;
                while i < chars.len() {
                    match (quote, chars[i]) {
                        (None, '"') => quote = Some('"'),
                        (Some(_), '"') => quote = None,
                        (None, ']') => break,
                        _ => {}
                    }
                    i += 1;
                }
                let inner: String = chars[start..i].iter().collect();
                i += 1;
                compound.attrs.push(parse_attr(&inner));
            }
            _ => {
                let name = read_name(&mut i);
                if name != "*" {
                    compound.tag = Some(name.to_lowercase());
                }
            }
        }
    }
    compound
}

fn parse_attr(inner: &str) -> (String, Op) {
    let unquote = |v: &str| v.trim().trim_matches('"').replace("\\\"", "\"");
    if let Some((name, value)) = inner.split_once("*=") {
        (name.trim().to_string(), Op::Contains(unquote(value)))
    } else if let Some((name, value)) = inner.split_once('=') {
        (name.trim().to_string(), Op::Eq(unquote(value)))
    } else {
        (inner.trim().to_string(), Op::Exists)
    }
}

fn parse_selector(selector: &str) -> Vec<Vec<Compound>> {
    split_top_level(selector, |c| c == ',')
        .iter()
        .map(|part| {
            split_top_level(part, char::is_whitespace)
                .iter()
                .map(|c| parse_compound(c))
                .collect()
        })
        .collect()
}

// ========== DOM ==========

#[derive(Debug, Default)]
pub struct FakeDom {
    nodes: Vec<Node>,
    pub visited: Vec<String>,
    pub clicks: Vec<NodeId>,
}

impl FakeDom {
    fn matches(&self, id: NodeId, compound: &Compound) -> bool {
        let node = &self.nodes[id];
        if let Some(tag) = &compound.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if !compound.classes.iter().all(|c| node.classes.contains(c)) {
            return false;
        }
        compound.attrs.iter().all(|(name, op)| {
            let value = node.attrs.get(name);
            match op {
                Op::Exists => value.is_some(),
                Op::Eq(v) => value == Some(v),
                Op::Contains(v) => value.is_some_and(|a| a.contains(v.as_str())),
            }
        })
    }

    fn matches_chain(&self, id: NodeId, chain: &[Compound]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches(id, last) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        let mut ancestor = self.nodes[id].parent;
        while let Some(a) = ancestor {
            if self.matches_chain(a, rest) {
                return true;
            }
            ancestor = self.nodes[a].parent;
        }
        false
    }

    fn matches_selector(&self, id: NodeId, selector: &[Vec<Compound>]) -> bool {
        selector.iter().any(|chain| self.matches_chain(id, chain))
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if !self.nodes[n].attached {
                return false;
            }
            current = self.nodes[n].parent;
        }
        true
    }

    fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            let node = &self.nodes[n];
            if !node.visible || node.hidden_by_script {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id].children {
            if self.nodes[child].attached {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }

    fn query(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = parse_selector(selector);
        let mut all = Vec::new();
        self.descendants(scope, &mut all);
        all.into_iter()
            .filter(|&id| self.matches_selector(id, &parsed))
            .collect()
    }

    fn inner_text(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        let mut parts = Vec::new();
        if !node.text.is_empty() {
            parts.push(node.text.clone());
        }
        for &child in &node.children {
            if self.nodes[child].attached {
                let text = self.inner_text(child);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        }
        parts.join("\n")
    }

    fn find_by_id(&self, html_id: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .find(|&n| self.is_attached(n) && self.nodes[n].attrs.get("id").map(String::as_str) == Some(html_id))
    }

    fn set_radio(&mut self, id: NodeId) {
        if let Some(name) = self.nodes[id].attrs.get("name").cloned() {
            for n in 0..self.nodes.len() {
                if self.nodes[n].is_input("radio")
                    && self.nodes[n].attrs.get("name") == Some(&name)
                {
                    self.nodes[n].checked = false;
                }
            }
        }
        self.nodes[id].checked = true;
    }

    fn toggle(&mut self, id: NodeId) {
        if self.nodes[id].is_input("radio") {
            self.set_radio(id);
        } else if self.nodes[id].is_input("checkbox") {
            self.nodes[id].checked = !self.nodes[id].checked;
        }
    }

    /// 字段是否已有值（用于模拟表单校验）
    pub fn is_filled(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        match node.tag.as_str() {
            "fieldset" => {
                let mut all = Vec::new();
                self.descendants(id, &mut all);
                all.iter()
                    .any(|&n| self.nodes[n].is_input("radio") && self.nodes[n].checked)
            }
            "select" => node.selected > 0,
            _ if node.is_input("checkbox") => node.checked,
            _ => !node.value.is_empty(),
        }
    }

    fn click(&mut self, id: NodeId) {
        self.clicks.push(id);
        if self.nodes[id].tag == "label" {
            if self.nodes[id].inert {
                return;
            }
            let target = self.nodes[id]
                .attrs
                .get("for")
                .cloned()
                .and_then(|for_id| self.find_by_id(&for_id));
            if let Some(target) = target {
                self.toggle(target);
            }
        } else {
            self.toggle(id);
        }

        if let Some(action) = self.nodes[id].on_click.clone() {
            if action.require.iter().any(|&r| !self.is_filled(r)) {
                if let Some(error) = action.error {
                    self.nodes[error].attached = true;
                }
                return;
            }
            for n in action.detach {
                self.nodes[n].attached = false;
            }
            for n in action.attach {
                self.nodes[n].attached = true;
            }
        }
    }
}

/// 合成页面
pub struct FakePage {
    dom: Mutex<FakeDom>,
}

pub const ROOT: NodeId = 0;

impl FakePage {
    pub fn new() -> Arc<Self> {
        let mut dom = FakeDom::default();
        dom.nodes.push(el("body"));
        Arc::new(Self {
            dom: Mutex::new(dom),
        })
    }

    /// 在 `parent` 下追加节点
    pub fn add(&self, parent: NodeId, mut node: Node) -> NodeId {
        let mut dom = self.dom.lock().unwrap();
        let id = dom.nodes.len();
        node.parent = Some(parent);
        dom.nodes.push(node);
        dom.nodes[parent].children.push(id);
        id
    }

    /// 追加一个带 label 的输入控件，返回 (input, label)
    pub fn add_labeled(&self, parent: NodeId, input: Node, label: &str) -> (NodeId, NodeId) {
        let html_id = input.attrs.get("id").cloned().unwrap_or_default();
        let label = self.add(parent, el("label").attr("for", &html_id).text(label));
        let input = self.add(parent, input);
        (input, label)
    }

    pub fn node(&self, id: NodeId) -> Node {
        self.dom.lock().unwrap().nodes[id].clone()
    }

    pub fn set_on_click(&self, id: NodeId, action: Action) {
        self.dom.lock().unwrap().nodes[id].on_click = Some(action);
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.dom.lock().unwrap().is_attached(id)
    }

    pub fn is_filled(&self, id: NodeId) -> bool {
        self.dom.lock().unwrap().is_filled(id)
    }

    pub fn visited(&self) -> Vec<String> {
        self.dom.lock().unwrap().visited.clone()
    }

    pub fn clicks(&self) -> Vec<NodeId> {
        self.dom.lock().unwrap().clicks.clone()
    }

    pub fn element(id: NodeId) -> ElementRef {
        ElementRef::new(id.to_string())
    }

    fn resolve(&self, dom: &FakeDom, element: &ElementRef) -> AppResult<NodeId> {
        element
            .as_str()
            .parse::<NodeId>()
            .ok()
            .filter(|&id| id < dom.nodes.len() && dom.is_attached(id))
            .ok_or_else(|| AppError::element_detached(element.as_str()))
    }

    fn with_node<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut FakeDom, NodeId) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut dom = self.dom.lock().unwrap();
        let id = self.resolve(&dom, element)?;
        f(&mut *dom, id)
    }

    fn with_writable<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut FakeDom, NodeId) -> T,
    ) -> AppResult<T> {
        self.with_node(element, |dom, id| {
            if dom.nodes[id].broken {
                return Err(AppError::element_detached(element.as_str()));
            }
            Ok(f(dom, id))
        })
    }
}

fn refs(ids: Vec<NodeId>) -> Vec<ElementRef> {
    ids.into_iter().map(FakePage::element).collect()
}

#[async_trait]
impl PageSurface for FakePage {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.dom.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn title(&self) -> AppResult<String> {
        Ok("Synthetic".to_string())
    }

    async fn query(&self, scope: Option<&ElementRef>, selector: &str) -> AppResult<Vec<ElementRef>> {
        let dom = self.dom.lock().unwrap();
        let scope = match scope {
            Some(element) => self.resolve(&dom, element)?,
            None => ROOT,
        };
        Ok(refs(dom.query(scope, selector)))
    }

    async fn closest(&self, element: &ElementRef, selector: &str) -> AppResult<Option<ElementRef>> {
        self.with_node(element, |dom, id| {
            let parsed = parse_selector(selector);
            let mut current = Some(id);
            while let Some(n) = current {
                if dom.matches_selector(n, &parsed) {
                    return Ok(Some(FakePage::element(n)));
                }
                current = dom.nodes[n].parent;
            }
            Ok(None)
        })
    }

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool> {
        self.with_node(element, |dom, id| Ok(dom.is_visible(id)))
    }

    async fn inner_text(&self, element: &ElementRef) -> AppResult<String> {
        self.with_node(element, |dom, id| Ok(dom.inner_text(id)))
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> AppResult<Option<String>> {
        self.with_node(element, |dom, id| Ok(dom.nodes[id].attrs.get(name).cloned()))
    }

    async fn input_value(&self, element: &ElementRef) -> AppResult<String> {
        self.with_node(element, |dom, id| Ok(dom.nodes[id].value.clone()))
    }

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool> {
        self.with_node(element, |dom, id| Ok(dom.nodes[id].checked))
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()> {
        self.with_writable(element, |dom, id| dom.nodes[id].value = value.to_string())
    }

    async fn click(&self, element: &ElementRef) -> AppResult<()> {
        self.with_writable(element, |dom, id| dom.click(id))
    }

    async fn activate(&self, element: &ElementRef) -> AppResult<()> {
        self.with_writable(element, |dom, id| {
            // 直接激活绕开 label 的遮挡
            dom.nodes[id].inert = false;
            dom.click(id)
        })
    }

    async fn check(&self, element: &ElementRef) -> AppResult<()> {
        self.with_writable(element, |dom, id| dom.nodes[id].checked = true)
    }

    async fn option_texts(&self, select: &ElementRef) -> AppResult<Vec<String>> {
        self.with_node(select, |dom, id| Ok(dom.nodes[id].options.clone()))
    }

    async fn selected_index(&self, select: &ElementRef) -> AppResult<Option<usize>> {
        self.with_node(select, |dom, id| {
            let node = &dom.nodes[id];
            Ok((!node.options.is_empty()).then_some(node.selected))
        })
    }

    async fn select_option_by_label(&self, select: &ElementRef, label: &str) -> AppResult<bool> {
        self.with_writable(select, |dom, id| {
            let node = &mut dom.nodes[id];
            match node.options.iter().position(|o| o.trim() == label.trim()) {
                Some(index) => {
                    node.selected = index;
                    true
                }
                None => false,
            }
        })
    }

    async fn select_option_by_index(&self, select: &ElementRef, index: usize) -> AppResult<bool> {
        self.with_writable(select, |dom, id| {
            let node = &mut dom.nodes[id];
            if index < node.options.len() {
                node.selected = index;
                true
            } else {
                false
            }
        })
    }

    async fn set_input_files(&self, element: &ElementRef, path: &str) -> AppResult<()> {
        self.with_writable(element, |dom, id| dom.nodes[id].value = path.to_string())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> AppResult<()> {
        self.with_node(element, |_, _| Ok(()))
    }

    async fn hide_elements(&self, selectors: &[&str]) -> AppResult<usize> {
        let mut dom = self.dom.lock().unwrap();
        let mut count = 0;
        for selector in selectors {
            for id in dom.query(ROOT, selector) {
                dom.nodes[id].hidden_by_script = true;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// 按问题关键字返回固定答案的问答实现
pub struct ScriptedOracle {
    rules: Vec<(String, String)>,
    default: String,
    asked: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(default: &str) -> Arc<Self> {
        Self::with_rules(&[], default)
    }

    pub fn with_rules(rules: &[(&str, &str)], default: &str) -> Arc<Self> {
        Arc::new(Self {
            rules: rules
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            default: default.to_string(),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerOracle for ScriptedOracle {
    async fn answer(&self, question: &str, _options: Option<&[String]>) -> String {
        self.asked.lock().unwrap().push(question.to_string());
        let lowered = question.to_lowercase();
        self.rules
            .iter()
            .find(|(key, _)| lowered.contains(key.as_str()))
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}
