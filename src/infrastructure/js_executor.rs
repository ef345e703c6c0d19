//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，暴露"执行 JS"的能力，并在其上实现 [`PageSurface`]。
//!
//! 元素句柄的实现方式：查询时给命中的节点打上 `data-autoapply-ref` 标记，
//! 之后所有操作都通过这个标记重新定位节点。节点被页面移除后定位失败，
//! 返回 `ElementDetached`。

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::surface::{ElementRef, PageSurface};

const REF_ATTR: &str = "data-autoapply-ref";

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识职位 / 表单，只认识元素
pub struct JsExecutor {
    page: Page,
}

/// 元素脚本的返回包装
#[derive(Deserialize)]
struct ElementEnvelope {
    detached: bool,
    #[serde(default)]
    value: JsonValue,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 在指定元素上执行一段脚本，脚本体内可使用变量 `el`
    async fn eval_on<T: DeserializeOwned>(&self, element: &ElementRef, body: &str) -> AppResult<T> {
        let js_code = format!(
            r#"(() => {{
                const el = document.querySelector('[{attr}="{id}"]');
                if (!el) return {{ detached: true }};
                const value = (() => {{ {body} }})();
                return {{ detached: false, value: value === undefined ? null : value }};
            }})()"#,
            attr = REF_ATTR,
            id = element.as_str(),
            body = body
        );
        let envelope: ElementEnvelope = self.eval_as(js_code).await?;
        if envelope.detached {
            return Err(AppError::element_detached(element.as_str()));
        }
        Ok(serde_json::from_value(envelope.value)?)
    }

    /// 找到对应的 chromiumoxide 元素（用于原生点击、上传文件）
    async fn native_element(&self, element: &ElementRef) -> AppResult<Element> {
        let selector = format!(r#"[{}="{}"]"#, REF_ATTR, element.as_str());
        self.page
            .find_element(selector)
            .await
            .map_err(|_| AppError::element_detached(element.as_str()))
    }
}

#[async_trait]
impl PageSurface for JsExecutor {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|source| BrowserError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;
        self.page.wait_for_navigation().await?;
        debug!("已导航到: {}", url);
        Ok(())
    }

    async fn title(&self) -> AppResult<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn query(&self, scope: Option<&ElementRef>, selector: &str) -> AppResult<Vec<ElementRef>> {
        let root = match scope {
            Some(scope) => format!(
                r#"document.querySelector('[{}="{}"]')"#,
                REF_ATTR,
                scope.as_str()
            ),
            None => "document".to_string(),
        };
        let js_code = format!(
            r#"(() => {{
                const root = {root};
                if (!root) return null;
                const refs = [];
                root.querySelectorAll({selector}).forEach((node) => {{
                    if (!node.hasAttribute('{attr}')) {{
                        window.__autoapplySeq = (window.__autoapplySeq || 0) + 1;
                        node.setAttribute('{attr}', String(window.__autoapplySeq));
                    }}
                    refs.push(node.getAttribute('{attr}'));
                }});
                return refs;
            }})()"#,
            root = root,
            selector = serde_json::to_string(selector)?,
            attr = REF_ATTR
        );
        let refs: Option<Vec<String>> = self.eval_as(js_code).await?;
        match (refs, scope) {
            (Some(refs), _) => Ok(refs.into_iter().map(ElementRef::new).collect()),
            (None, Some(scope)) => Err(AppError::element_detached(scope.as_str())),
            (None, None) => Ok(Vec::new()),
        }
    }

    async fn closest(&self, element: &ElementRef, selector: &str) -> AppResult<Option<ElementRef>> {
        let body = format!(
            r#"const found = el.closest({selector});
            if (!found) return null;
            if (!found.hasAttribute('{attr}')) {{
                window.__autoapplySeq = (window.__autoapplySeq || 0) + 1;
                found.setAttribute('{attr}', String(window.__autoapplySeq));
            }}
            return found.getAttribute('{attr}');"#,
            selector = serde_json::to_string(selector)?,
            attr = REF_ATTR
        );
        let found: Option<String> = self.eval_on(element, &body).await?;
        Ok(found.map(ElementRef::new))
    }

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool> {
        self.eval_on(
            element,
            r#"const style = window.getComputedStyle(el);
            if (style.visibility === 'hidden' || style.display === 'none') return false;
            return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);"#,
        )
        .await
    }

    async fn inner_text(&self, element: &ElementRef) -> AppResult<String> {
        let text: Option<String> = self
            .eval_on(element, "return el.innerText ?? el.textContent ?? '';")
            .await?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> AppResult<Option<String>> {
        let body = format!("return el.getAttribute({});", serde_json::to_string(name)?);
        self.eval_on(element, &body).await
    }

    async fn input_value(&self, element: &ElementRef) -> AppResult<String> {
        let value: Option<String> = self.eval_on(element, "return el.value ?? '';").await?;
        Ok(value.unwrap_or_default())
    }

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool> {
        self.eval_on(element, "return !!el.checked;").await
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()> {
        // 走原生 setter 并派发 input/change，受控组件才会感知到新值
        let body = format!(
            r#"const proto = el.tagName === 'TEXTAREA'
                ? window.HTMLTextAreaElement.prototype
                : window.HTMLInputElement.prototype;
            const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
            el.focus();
            setter.call(el, {value});
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            el.blur();
            return true;"#,
            value = serde_json::to_string(value)?
        );
        let _: bool = self.eval_on(element, &body).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> AppResult<()> {
        let native = self.native_element(element).await?;
        native.click().await?;
        Ok(())
    }

    async fn activate(&self, element: &ElementRef) -> AppResult<()> {
        let _: bool = self.eval_on(element, "el.click(); return true;").await?;
        Ok(())
    }

    async fn check(&self, element: &ElementRef) -> AppResult<()> {
        let _: bool = self
            .eval_on(element, "if (!el.checked) el.click(); return !!el.checked;")
            .await?;
        Ok(())
    }

    async fn option_texts(&self, select: &ElementRef) -> AppResult<Vec<String>> {
        self.eval_on(
            select,
            "return Array.from(el.options || []).map((o) => (o.innerText || o.text || '').trim());",
        )
        .await
    }

    async fn selected_index(&self, select: &ElementRef) -> AppResult<Option<usize>> {
        let index: i64 = self.eval_on(select, "return el.selectedIndex;").await?;
        Ok(usize::try_from(index).ok())
    }

    async fn select_option_by_label(&self, select: &ElementRef, label: &str) -> AppResult<bool> {
        let body = format!(
            r#"const wanted = {label}.trim();
            const option = Array.from(el.options || []).find((o) => (o.innerText || o.text || '').trim() === wanted);
            if (!option) return false;
            el.value = option.value;
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;"#,
            label = serde_json::to_string(label)?
        );
        self.eval_on(select, &body).await
    }

    async fn select_option_by_index(&self, select: &ElementRef, index: usize) -> AppResult<bool> {
        let body = format!(
            r#"if (!el.options || el.options.length <= {index}) return false;
            el.selectedIndex = {index};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;"#,
            index = index
        );
        self.eval_on(select, &body).await
    }

    async fn set_input_files(&self, element: &ElementRef, path: &str) -> AppResult<()> {
        let native = self.native_element(element).await?;
        let params = SetFileInputFilesParams::builder()
            .file(path)
            .backend_node_id(native.backend_node_id)
            .build()
            .map_err(BrowserError::InvalidParams)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> AppResult<()> {
        let _: bool = self
            .eval_on(
                element,
                "el.scrollIntoView({ block: 'center', inline: 'center' }); return true;",
            )
            .await?;
        Ok(())
    }

    async fn hide_elements(&self, selectors: &[&str]) -> AppResult<usize> {
        let js_code = format!(
            r#"(() => {{
                let hidden = 0;
                document.querySelectorAll({selector}).forEach((node) => {{
                    if (node instanceof HTMLElement) {{
                        node.style.display = 'none';
                        hidden += 1;
                    }}
                }});
                return hidden;
            }})()"#,
            selector = serde_json::to_string(&selectors.join(", "))?
        );
        self.eval_as(js_code).await
    }
}
