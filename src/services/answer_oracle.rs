//! 问答能力 - 业务能力层
//!
//! 把表单问题 + 用户资料拼成提示词交给 LLM，再把回答清洗成可直接填入的值。
//! 调用失败不会向上抛：有候选项时回落到第一个候选，否则回答 "Yes"。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::FallbackPolicy;
use crate::error::AppResult;
use crate::models::UserProfile;
use crate::services::vocabulary::{first_digit_run, LABEL_ECHO, NUMERIC_QUESTION, SALARY_QUESTION};

/// 文本补全后端（一次请求，一段文本）
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        (**self).complete(prompt).await
    }
}

/// 问答能力
///
/// 永远返回一个答案，不返回错误。
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    async fn answer(&self, question: &str, options: Option<&[String]>) -> String;
}

/// 基于用户资料的问答实现
pub struct ProfileOracle<B> {
    backend: B,
    profile: Arc<UserProfile>,
    fallback: FallbackPolicy,
}

impl<B: CompletionBackend> ProfileOracle<B> {
    pub fn new(backend: B, profile: Arc<UserProfile>, fallback: FallbackPolicy) -> Self {
        Self {
            backend,
            profile,
            fallback,
        }
    }

    /// 构建提示词
    pub fn build_prompt(&self, question: &str, options: Option<&[String]>) -> String {
        let p = &self.profile;
        let options_line = match options {
            Some(options) if !options.is_empty() => {
                format!("Available options: {}\n", options.join(", "))
            }
            _ => String::new(),
        };
        let salary_low = self.fallback.salary.start();
        let salary_high = self.fallback.salary.end();

        format!(
            r#"You are an intelligent assistant helping a user apply for jobs.

User Profile:
First Name: {first}
Last Name: {last}
Email: {email}
Phone: {phone}
Headline: {headline}
Summary: {summary}
Experience: {experience}
Skills: {skills}
Profile URL: {url}

The user is filling out a job application form.
Question from the form: "{question}"
{options_line}
Instructions:
1. Answer the question truthfully based on the User Profile.
2. If options are provided, choose the best match from the options list strictly. Return ONLY the option text.
3. If the question asks for a number (e.g. years of experience), return ONLY the digit(s) (e.g. "5"). Do not add "years" or text.
4. Years of experience rules:
   - React, Node.js, TypeScript, JavaScript: return "8".
   - Cloud, AWS, GCP: return "5".
   - Other technology listed in the skills: return "5".
   - Technology NOT listed in the skills: return "1".
5. If the question asks for salary expectations, provide a number between {salary_low} and {salary_high}. Return ONLY the number.
6. If you don't know the answer and it's not in the profile, make a reasonable professional guess, or say "0" for numbers if unsure.
7. Keep the answer concise."#,
            first = p.first_name,
            last = p.last_name,
            email = p.email,
            phone = p.phone,
            headline = p.headline,
            summary = p.summary,
            experience = p.experience_narrative,
            skills = p.skills_line(),
            url = p.profile_url,
        )
    }

    /// 失败时的兜底答案
    fn degraded(options: Option<&[String]>) -> String {
        options
            .and_then(|options| options.first())
            .cloned()
            .unwrap_or_else(|| "Yes".to_string())
    }
}

/// 清洗模型原始回答
///
/// 去掉 "Answer:" 之类的标签回显和包裹的引号；
/// 没有候选项且问题是年限 / 薪资类时，只保留第一段数字。
pub fn post_process(question: &str, options: Option<&[String]>, raw: &str) -> String {
    let mut answer = LABEL_ECHO.replace(raw.trim(), "").trim().to_string();

    if answer.len() >= 2 && answer.starts_with('"') && answer.ends_with('"') {
        answer = answer[1..answer.len() - 1].to_string();
    }

    let has_options = options.is_some_and(|o| !o.is_empty());
    if !has_options && (NUMERIC_QUESTION.is_match(question) || SALARY_QUESTION.is_match(question)) {
        if let Some(digits) = first_digit_run(&answer) {
            answer = digits.to_string();
        }
    }
    answer
}

#[async_trait]
impl<B: CompletionBackend> AnswerOracle for ProfileOracle<B> {
    async fn answer(&self, question: &str, options: Option<&[String]>) -> String {
        let prompt = self.build_prompt(question, options);
        let answer = match self.backend.complete(&prompt).await {
            Ok(raw) => post_process(question, options, &raw),
            Err(e) => {
                warn!("⚠️ 问答调用失败，使用兜底答案: {}", e);
                Self::degraded(options)
            }
        };
        info!("[AI] Q: \"{}\" -> A: \"{}\"", question, answer);
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, LlmError};

    struct Canned(&'static str);

    #[async_trait]
    impl CompletionBackend for Canned {
        async fn complete(&self, _prompt: &str) -> AppResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl CompletionBackend for Unreachable {
        async fn complete(&self, _prompt: &str) -> AppResult<String> {
            Err(AppError::Llm(LlmError::EmptyContent {
                model: "offline".to_string(),
            }))
        }
    }

    fn profile() -> Arc<UserProfile> {
        Arc::new(UserProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            skills: ["React", "Rust"].into_iter().map(String::from).collect(),
            ..UserProfile::default()
        })
    }

    fn oracle<B: CompletionBackend>(backend: B) -> ProfileOracle<B> {
        ProfileOracle::new(backend, profile(), FallbackPolicy::default())
    }

    #[tokio::test]
    async fn test_experience_answer_is_digits_only() {
        let oracle = oracle(Canned("Answer: \"8 years\""));
        let answer = oracle
            .answer("How many years of experience with React do you have?", None)
            .await;
        assert_eq!(answer, "8");
    }

    #[tokio::test]
    async fn test_unreachable_backend_defaults_to_yes() {
        let oracle = oracle(Unreachable);
        assert_eq!(oracle.answer("Do you agree to the terms?", None).await, "Yes");
    }

    #[tokio::test]
    async fn test_unreachable_backend_picks_first_option() {
        let oracle = oracle(Unreachable);
        let options = vec!["Paris".to_string(), "Lyon".to_string()];
        assert_eq!(
            oracle.answer("Preferred office?", Some(&options)).await,
            "Paris"
        );
    }

    #[test]
    fn test_option_answer_passes_through() {
        let oracle = oracle(Canned("No"));
        let options = vec!["Yes".to_string(), "No".to_string()];
        let answer = tokio_test::block_on(oracle.answer("Do you need sponsorship?", Some(&options)));
        assert_eq!(answer, "No");
    }

    #[test]
    fn test_post_process_keeps_option_text() {
        let options = vec!["2 years".to_string(), "5 years".to_string()];
        assert_eq!(
            post_process("Years of experience?", Some(&options), "Option: 5 years"),
            "5 years"
        );
    }

    #[test]
    fn test_post_process_salary_digits() {
        assert_eq!(
            post_process("Salaire souhaité", None, "Réponse : 60000 EUR"),
            "60000"
        );
    }

    #[test]
    fn test_post_process_plain_text_untouched() {
        assert_eq!(
            post_process("Why do you want this job?", None, "\"I like Rust 2 much\""),
            "I like Rust 2 much"
        );
    }

    #[test]
    fn test_prompt_lists_profile_and_options() {
        let oracle = oracle(Canned(""));
        let options = vec!["Yes".to_string(), "No".to_string()];
        let prompt = oracle.build_prompt("Are you authorized to work?", Some(&options));
        assert!(prompt.contains("First Name: Ada"));
        assert!(prompt.contains("Skills: React, Rust"));
        assert!(prompt.contains("Available options: Yes, No"));
        assert!(prompt.contains("between 55000 and 65000"));

        let open = oracle.build_prompt("Cover letter", None);
        assert!(!open.contains("Available options"));
    }
}
