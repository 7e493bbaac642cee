use nola_core::config::{redact_database_url, AppConfig, LoadOptions};
use nola_db::{connect_with_settings, DbPool, PgMartRepository};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\
                 \"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_warehouse(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped(
                "database_connectivity",
                "configuration did not load",
            ));
            checks.push(DoctorCheck::skipped("mart_relations", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_warehouse(config: &AppConfig) -> [DoctorCheck; 2] {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return [
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("mart_relations", "the async runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let database_url = config.database.url.expose_secret();
        let pool = match connect_with_settings(
            database_url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return [
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck::skipped("mart_relations", "the database is not reachable"),
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", redact_database_url(database_url)),
        };
        let marts = check_mart_relations(config, pool.clone()).await;
        pool.close().await;

        [connectivity, marts]
    })
}

async fn check_mart_relations(config: &AppConfig, pool: DbPool) -> DoctorCheck {
    let schema = match config.database.schema() {
        Ok(schema) => schema,
        Err(error) => {
            return DoctorCheck {
                name: "mart_relations",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    match PgMartRepository::new(pool, schema).mart_status().await {
        Ok(statuses) => {
            let missing: Vec<_> = statuses
                .iter()
                .filter(|status| !status.present)
                .map(|status| status.relation.as_str())
                .collect();
            if missing.is_empty() {
                let found: Vec<_> =
                    statuses.iter().map(|status| status.relation.as_str()).collect();
                DoctorCheck {
                    name: "mart_relations",
                    status: CheckStatus::Pass,
                    details: format!("found {}", found.join(", ")),
                }
            } else {
                DoctorCheck {
                    name: "mart_relations",
                    status: CheckStatus::Fail,
                    details: format!("missing {} (run `dbt build`)", missing.join(", ")),
                }
            }
        }
        Err(error) => DoctorCheck {
            name: "mart_relations",
            status: CheckStatus::Fail,
            details: format!("mart lookup failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn human_report_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck {
                    name: "config_validation",
                    status: CheckStatus::Pass,
                    details: "configuration loaded and validated".to_string(),
                },
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: "failed to connect to database: refused".to_string(),
                },
                DoctorCheck::skipped("mart_relations", "the database is not reachable"),
            ],
        };

        let rendered = render_human(&report);

        assert_eq!(
            rendered,
            "doctor: one or more readiness checks failed\n\
             - [ok] config_validation: configuration loaded and validated\n\
             - [fail] database_connectivity: failed to connect to database: refused\n\
             - [skip] mart_relations: skipped because the database is not reachable"
        );
    }
}
