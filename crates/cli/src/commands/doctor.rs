use serde::Serialize;

use crate::commands::CommandResult;
use cursus_agent::{LlmClient, OllamaClient};
use cursus_core::config::{AppConfig, LoadOptions};
use cursus_db::connect_with_settings;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    command: &'static str,
    status: &'static str,
    checks: Vec<DoctorCheck>,
}

pub fn run(json: bool) -> CommandResult {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                ok: true,
                detail: format!(
                    "database `{}`, nlu `{}` via {}",
                    config.database.url, config.nlu.model, config.nlu.base_url
                ),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck { name: "config", ok: false, detail: error.to_string() });
            None
        }
    };

    if let Some(config) = &config {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build();
        match runtime {
            Ok(runtime) => runtime.block_on(async {
                match connect_with_settings(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.timeout_secs,
                )
                .await
                {
                    Ok(pool) => {
                        checks.push(DoctorCheck {
                            name: "database",
                            ok: true,
                            detail: "reachable".to_string(),
                        });
                        pool.close().await;
                    }
                    Err(error) => checks.push(DoctorCheck {
                        name: "database",
                        ok: false,
                        detail: error.to_string(),
                    }),
                }

                match OllamaClient::new(config.nlu.clone()) {
                    Ok(client) => match client.health().await {
                        Ok(()) => checks.push(DoctorCheck {
                            name: "nlu",
                            ok: true,
                            detail: format!("endpoint {} reachable", config.nlu.base_url),
                        }),
                        Err(error) => checks.push(DoctorCheck {
                            name: "nlu",
                            ok: false,
                            detail: error.to_string(),
                        }),
                    },
                    Err(error) => checks.push(DoctorCheck {
                        name: "nlu",
                        ok: false,
                        detail: error.to_string(),
                    }),
                }
            }),
            Err(error) => checks.push(DoctorCheck {
                name: "runtime",
                ok: false,
                detail: error.to_string(),
            }),
        }
    }

    let all_ok = checks.iter().all(|check| check.ok);
    let report = DoctorReport {
        command: "doctor",
        status: if all_ok { "ok" } else { "error" },
        checks,
    };

    let output = if json {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| error.to_string())
    } else {
        let mut lines = vec![format!("doctor: {}", report.status)];
        for check in &report.checks {
            let marker = if check.ok { "ok" } else { "FAIL" };
            lines.push(format!("  [{marker}] {} — {}", check.name, check.detail));
        }
        lines.join("\n")
    };

    CommandResult { exit_code: u8::from(!all_ok), output }
}
