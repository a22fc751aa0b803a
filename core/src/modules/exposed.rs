use anyhow::Result;
use async_trait::async_trait;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// Probes well-known paths that should never be web-reachable. A hit is
/// only reported when the body confirms the expected content, so custom
/// 200-for-everything error pages do not produce false positives.
pub struct ExposedFilesScanner;

/// (path, markers that confirm the file is the real thing)
const PROBE_PATHS: &[(&str, &[&str])] = &[
    (".env", &["DB_PASSWORD", "APP_KEY", "DATABASE_URL", "SECRET"]),
    (".git/config", &["[core]", "repositoryformatversion"]),
    ("wp-config.php.bak", &["DB_PASSWORD", "DB_NAME"]),
    ("phpinfo.php", &["phpinfo()", "PHP Version"]),
    (".htaccess", &["RewriteEngine", "RewriteRule", "Deny from"]),
    ("server-status", &["Apache Server Status", "Scoreboard"]),
];

#[async_trait]
impl Scanner for ExposedFilesScanner {
    fn name(&self) -> &'static str {
        "exposed-files"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let mut issues = Vec::new();

        for (path, markers) in PROBE_PATHS {
            let probe_url = match ctx.target.join(path) {
                Ok(u) => u,
                Err(_) => continue,
            };

            let response = match ctx.client.probe(probe_url.as_str()).await {
                Ok(r) => r,
                // Unreachable probe paths are not findings.
                Err(_) => continue,
            };

            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            if confirms_exposure(status, &body, markers) {
                issues.push(
                    RawIssue::new(
                        "exposed-sensitive-file",
                        Severity::Critical,
                        &format!("Sensitive file is publicly reachable: /{}", path),
                    )
                    .with_location(&format!("/{}", path)),
                );
            }
        }

        Ok(ScannerOutput { issues })
    }
}

fn confirms_exposure(status: u16, body: &str, markers: &[&str]) -> bool {
    status == 200 && markers.iter().any(|m| body.contains(m))
}
