//! 多语言词表
//!
//! 界面可能是英文或法文，所有关键字匹配都用不区分大小写的正则。

use std::sync::LazyLock;

use regex::Regex;

fn vocab(pattern: &str) -> Regex {
    Regex::new(pattern).expect("vocabulary pattern is a valid regex")
}

/// 工作年限类问题（文本框标签）
pub static EXPERIENCE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)experience|expérience|years|années|\bans\b"));

/// 需要强制数字答案的问题
pub static NUMERIC_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)how many|combien|years|années|experience|expérience"));

/// 薪资类问题
pub static SALARY_QUESTION: LazyLock<Regex> = LazyLock::new(|| vocab(r"(?i)salary|salaire"));

/// 同意类复选框
pub static AFFIRMATIVE_CONSENT: LazyLock<Regex> = LazyLock::new(|| {
    vocab(r"(?i)agree|accept|confirm|compris|accepte|confirme|lu et accepté")
});

pub static YES: LazyLock<Regex> = LazyLock::new(|| vocab(r"(?i)\b(yes|oui)\b"));
pub static NO: LazyLock<Regex> = LazyLock::new(|| vocab(r"(?i)\b(no|non)\b"));

/// 前进类按钮文本
pub static FORWARD_ACTION: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)review|submit|next|suivant|vérifier|envoyer"));
pub static SUBMIT_ACTION: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)submit|envoyer"));
pub static REVIEW_ACTION: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)review|vérifier"));

/// 答案开头的标签回显
pub static LABEL_ECHO: LazyLock<Regex> =
    LazyLock::new(|| vocab(r"(?i)^(option|answer|r[eé]ponse|phone)\s*:?\s*"));

pub static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| vocab(r"\d+"));

/// 单选组是否是"是 / 否"二选一
pub fn is_yes_no_pair(options: &[String]) -> bool {
    options.len() == 2
        && options.iter().any(|o| YES.is_match(o))
        && options.iter().any(|o| NO.is_match(o))
}

/// 第一段连续数字
pub fn first_digit_run(text: &str) -> Option<&str> {
    DIGIT_RUN.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_label_locales() {
        assert!(EXPERIENCE_LABEL.is_match("Years of experience with Rust"));
        assert!(EXPERIENCE_LABEL.is_match("Combien d'années d'expérience ?"));
        assert!(EXPERIENCE_LABEL.is_match("Depuis combien d'ans"));
        assert!(!EXPERIENCE_LABEL.is_match("Mobile phone number"));
        assert!(!EXPERIENCE_LABEL.is_match("Languages spoken"));
    }

    #[test]
    fn test_yes_no_pair() {
        assert!(is_yes_no_pair(&["Yes".to_string(), "No".to_string()]));
        assert!(is_yes_no_pair(&["Oui".to_string(), "Non".to_string()]));
        assert!(!is_yes_no_pair(&["Yes".to_string(), "Maybe".to_string()]));
        assert!(!is_yes_no_pair(&[
            "Yes".to_string(),
            "No".to_string(),
            "Prefer not to say".to_string()
        ]));
    }

    #[test]
    fn test_action_vocabulary() {
        assert!(SUBMIT_ACTION.is_match("Envoyer la candidature"));
        assert!(REVIEW_ACTION.is_match("Vérifier"));
        assert!(FORWARD_ACTION.is_match("Suivant"));
        assert!(!FORWARD_ACTION.is_match("Dismiss"));
    }

    #[test]
    fn test_first_digit_run() {
        assert_eq!(first_digit_run("about 5 years, maybe 6"), Some("5"));
        assert_eq!(first_digit_run("none"), None);
    }
}
