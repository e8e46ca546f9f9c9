//! Mass verification against a running server.
//!
//! Generates random point sets with unique points, records each case in the
//! test log and checks the server's hull against the local one.

use crate::client::HullClient;
use crate::codec;
use crate::config::MassTestConfig;
use crate::geometry::{self, Point};
use crate::test_log::TestLog;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassTestReport {
    pub total: usize,
    pub passed: usize,
}

impl MassTestReport {
    /// Pass rate in whole percent, rounded down.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.passed * 100 / self.total
        }
    }

    /// One-line progress after `done` cases.
    pub fn progress(&self, done: usize) -> String {
        format!("Test {}/{} | Passed: {}", done, self.total, self.passed)
    }
}

/// Draw `count` distinct points with coordinates in `[min, max]`.
///
/// The range must hold at least `count` distinct points.
pub fn generate_unique_points<R: Rng>(rng: &mut R, count: usize, min: i32, max: i32) -> Vec<Point> {
    let mut seen = HashSet::with_capacity(count);
    let mut points = Vec::with_capacity(count);

    while points.len() < count {
        let p = Point::new(rng.gen_range(min..=max), rng.gen_range(min..=max));
        if seen.insert(p) {
            points.push(p);
        }
    }
    points
}

/// Run every configured case and report how many matched.
///
/// Transport and remote errors fail the case and the run continues; only
/// test log I/O aborts it.
pub async fn run(config: &MassTestConfig, client: &HullClient) -> io::Result<MassTestReport> {
    let mut log = TestLog::create(&config.log_file)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        cases = config.clients,
        points_per_test = config.points_per_test,
        log_file = %log.path().display(),
        "Starting mass test"
    );

    let mut report = MassTestReport {
        total: config.clients,
        passed: 0,
    };

    for case in 0..config.clients {
        let points = generate_unique_points(
            &mut rng,
            config.points_per_test,
            config.min_coord,
            config.max_coord,
        );
        let hull = geometry::jarvis_hull(&points);
        log.record(&points, &hull)?;

        match client.compare(&points, codec::encode(&hull)).await {
            Ok(v) if v.matched() => report.passed += 1,
            Ok(_) => warn!(case = case + 1, "Hull mismatch"),
            Err(e) => warn!(case = case + 1, error = %e, "Test case failed"),
        }
        info!("{}", report.progress(case + 1));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, ServerConfig};
    use crate::server::Server;

    #[test]
    fn test_generate_unique_points() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = generate_unique_points(&mut rng, 9, 0, 2);

        assert_eq!(points.len(), 9);
        let distinct: HashSet<_> = points.iter().collect();
        assert_eq!(distinct.len(), 9);
        assert!(points.iter().all(|p| (0..=2).contains(&p.x) && (0..=2).contains(&p.y)));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_unique_points(&mut StdRng::seed_from_u64(42), 50, -1000, 1000);
        let b = generate_unique_points(&mut StdRng::seed_from_u64(42), 50, -1000, 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_percent() {
        assert_eq!(MassTestReport { total: 0, passed: 0 }.percent(), 0);
        assert_eq!(MassTestReport { total: 3, passed: 2 }.percent(), 66);
        assert_eq!(MassTestReport { total: 4, passed: 4 }.percent(), 100);
    }

    #[test]
    fn test_progress_line() {
        let report = MassTestReport { total: 100, passed: 41 };
        assert_eq!(report.progress(42), "Test 42/100 | Passed: 41");
    }

    #[tokio::test]
    async fn test_run_against_server() {
        let server = Server::bind(ServerConfig {
            listen: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        })
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let log_file = std::env::temp_dir().join(format!("jarvis-mass-test-{}.log", std::process::id()));
        let config = MassTestConfig {
            clients: 5,
            points_per_test: 30,
            seed: Some(9),
            log_file: log_file.clone(),
            ..MassTestConfig::default()
        };
        let client = HullClient::new(ClientConfig {
            server: addr.to_string(),
            ..ClientConfig::default()
        });

        let report = run(&config, &client).await.unwrap();
        assert_eq!(report, MassTestReport { total: 5, passed: 5 });

        let contents = std::fs::read_to_string(&log_file).unwrap();
        assert_eq!(contents.matches("---").count(), 5);
        std::fs::remove_file(&log_file).unwrap();
    }
}
