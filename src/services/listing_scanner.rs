//! 职位列表扫描 - 业务能力层
//!
//! 只负责从已加载的搜索结果页中提取职位引用，不负责翻页和申请。

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{ScanPolicy, SITE_ORIGIN};
use crate::error::AppResult;
use crate::infrastructure::{is_present, wait_for_selector, ElementRef, PageSurface};
use crate::models::JobReference;
use crate::services::selectors;

static PATH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/jobs/view/(\d+)").expect("valid regex"));
static QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"currentJobId=(\d+)").expect("valid regex"));

const UNKNOWN: &str = "Unknown";

/// 从链接中提取职位 id：先看路径，再看查询参数
pub fn extract_job_id(href: &str) -> Option<String> {
    PATH_ID
        .captures(href)
        .or_else(|| QUERY_ID.captures(href))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 相对链接补全为绝对地址
pub fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", SITE_ORIGIN, href)
    } else {
        format!("{}/{}", SITE_ORIGIN, href)
    }
}

/// 职位列表扫描服务
pub struct ListingScanner<'a> {
    page: &'a dyn PageSurface,
    policy: ScanPolicy,
}

impl<'a> ListingScanner<'a> {
    pub fn new(page: &'a dyn PageSurface, policy: ScanPolicy) -> Self {
        Self { page, policy }
    }

    /// 扫描当前页，返回去重后的职位（最多 `max_jobs` 条）
    pub async fn scan(&self, settle: Duration, poll_interval: Duration) -> AppResult<Vec<JobReference>> {
        if !wait_for_selector(self.page, "body", settle, poll_interval).await? {
            warn!("⚠️ 搜索结果页没有加载出 body");
        }
        self.log_layouts().await;

        let links = self.page.query(None, selectors::JOB_LINKS).await?;
        debug!("找到 {} 个职位链接", links.len());

        let mut seen = HashSet::new();
        let mut jobs = Vec::new();
        for link in &links {
            if jobs.len() >= self.policy.max_jobs {
                break;
            }
            match self.read_link(link).await {
                Ok(Some(job)) => {
                    if seen.insert(job.id.clone()) {
                        debug!("职位 {}: {} @ {}", job.id, job.title, job.company);
                        jobs.push(job);
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("跳过无法读取的链接 {}: {}", link, e),
            }
        }

        info!("✓ 扫描到 {} 个职位", jobs.len());
        Ok(jobs)
    }

    async fn log_layouts(&self) {
        let mut found = Vec::new();
        for (name, selector) in selectors::RESULT_LAYOUTS {
            if is_present(self.page, None, selector).await.unwrap_or(false) {
                found.push(*name);
            }
        }
        if found.is_empty() {
            warn!("⚠️ 没有识别到已知的结果页布局");
        } else {
            debug!("结果页布局: {}", found.join(", "));
        }
    }

    async fn read_link(&self, link: &ElementRef) -> AppResult<Option<JobReference>> {
        let Some(href) = self.page.attribute(link, "href").await? else {
            return Ok(None);
        };
        let Some(id) = extract_job_id(&href) else {
            return Ok(None);
        };

        let text = self.page.inner_text(link).await.unwrap_or_default();
        let mut title = text.lines().next().unwrap_or_default().trim().to_string();
        if title.chars().count() < self.policy.min_title_len {
            if let Some(inner) = self
                .page
                .query(Some(link), selectors::JOB_CARD_TITLE)
                .await?
                .first()
            {
                title = self.page.inner_text(inner).await?.trim().to_string();
            }
        }

        let (company, location) = match self.page.closest(link, selectors::JOB_CARD).await? {
            Some(card) => (
                self.card_text(&card, selectors::JOB_CARD_COMPANY).await,
                self.card_text(&card, selectors::JOB_CARD_LOCATION).await,
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };

        Ok(Some(JobReference {
            id,
            title,
            company,
            location,
            url: absolute_url(&href),
        }))
    }

    async fn card_text(&self, card: &ElementRef, selector: &str) -> String {
        let text = match self.page.query(Some(card), selector).await {
            Ok(found) => match found.first() {
                Some(element) => self.page.inner_text(element).await.unwrap_or_default(),
                None => String::new(),
            },
            Err(_) => String::new(),
        };
        let text = text.trim();
        if text.is_empty() {
            UNKNOWN.to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_job_id_prefers_path() {
        assert_eq!(
            extract_job_id("/jobs/view/3812345678/?refId=abc&currentJobId=1"),
            Some("3812345678".to_string())
        );
        assert_eq!(
            extract_job_id("https://www.linkedin.com/jobs/search/?currentJobId=42&f_AL=true"),
            Some("42".to_string())
        );
        assert_eq!(extract_job_id("/jobs/collections/recommended/"), None);
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("/jobs/view/1/"),
            "https://www.linkedin.com/jobs/view/1/"
        );
        assert_eq!(absolute_url("https://example.com/x"), "https://example.com/x");
    }
}
