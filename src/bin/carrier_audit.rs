// Small ops utility: audit a carrier's mapping/tariff setup or a quotation's cargo structure.
//
// Usage:
//   cargo run --bin carrier_audit -- [db_path] <carrier|quotation> <id> [lang]
//
// db_path defaults to RORO_CARRIER_RULES_DB_PATH or the user data directory.
// Exit code is 1 when the report contains ERROR findings.
// Set RORO_LOG_FORMAT=json to emit JSON log lines.

use roro_carrier_rules::api::CarrierRuleApi;
use roro_carrier_rules::db::default_db_path;
use roro_carrier_rules::i18n::{render_audit_report, set_locale, t, t_with_args};
use roro_carrier_rules::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::var("RORO_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // 第一个参数不是审计对象时视为 db_path
    let db_path = match args.first().map(|s| s.as_str()) {
        Some("carrier") | Some("quotation") | None => default_db_path(),
        Some(_) => args.remove(0),
    };

    if let Some(lang) = args.get(2) {
        set_locale(lang);
    }

    let (subject, raw_id) = match (args.first(), args.get(1)) {
        (Some(subject), Some(id)) => (subject.clone(), id.clone()),
        _ => {
            eprintln!("{}", t("cli.usage"));
            std::process::exit(2);
        }
    };

    let id: i64 = match raw_id.trim().parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("{}", t_with_args("cli.invalid_id", &[("id", &raw_id)]));
            std::process::exit(2);
        }
    };

    let api = CarrierRuleApi::open(&db_path)?;
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();

    let report = match subject.as_str() {
        "carrier" => api.audit_carrier(id, &today)?,
        "quotation" => api.audit_quotation(id, &today)?,
        other => {
            eprintln!("{}", t_with_args("cli.invalid_subject", &[("subject", other)]));
            std::process::exit(2);
        }
    };

    for line in render_audit_report(&report) {
        println!("{}", line);
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
