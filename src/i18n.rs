// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::engine::audit::{AuditReport, AuditSeverity, AuditSubject};

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use roro_carrier_rules::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use roro_carrier_rules::i18n::t_with_args;
/// let msg = t_with_args("audit.subject_carrier", &[("id", "7")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 严重程度标签
pub fn severity_label(severity: AuditSeverity) -> String {
    match severity {
        AuditSeverity::Info => t("audit.severity.info"),
        AuditSeverity::Warning => t("audit.severity.warning"),
        AuditSeverity::Error => t("audit.severity.error"),
    }
}

/// 按当前语言渲染审计报告（每行一条）
pub fn render_audit_report(report: &AuditReport) -> Vec<String> {
    let subject = match report.subject {
        AuditSubject::Carrier(id) => t_with_args("audit.subject_carrier", &[("id", &id.to_string())]),
        AuditSubject::Quotation(id) => t_with_args("audit.subject_quotation", &[("id", &id.to_string())]),
    };

    let mut lines = vec![
        format!("{} - {}", t("audit.title"), subject),
        t_with_args("audit.run_id", &[("run_id", &report.run_id)]),
        t_with_args("audit.audit_date", &[("date", &report.audit_date.to_string())]),
        t_with_args(
            "audit.config",
            &[
                ("currency", &report.config_snapshot.default_currency),
                ("towing_event", &report.config_snapshot.towing_event_code),
            ],
        ),
    ];

    if report.findings.is_empty() {
        lines.push(t("audit.no_findings"));
        return lines;
    }

    for finding in &report.findings {
        lines.push(format!(
            "[{}] {} {}#{}: {}",
            severity_label(finding.severity),
            finding.code,
            finding.entity,
            finding.entity_id,
            finding.message
        ));
    }

    lines.push(t_with_args(
        "audit.summary",
        &[
            ("total", &report.findings.len().to_string()),
            ("error", &report.count(AuditSeverity::Error).to_string()),
            ("warning", &report.count(AuditSeverity::Warning).to_string()),
            ("info", &report.count(AuditSeverity::Info).to_string()),
        ],
    ));
    lines
}
