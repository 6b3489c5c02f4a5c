use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::judge::Judgment;
use crate::outcome::Outcome;
use crate::results::RunMeta;

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub runs: usize,
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
    pub avg_duration_secs: Option<f64>,
    /// `(passed, total)` per check label.
    pub check_pass_rates: BTreeMap<String, (usize, usize)>,
    /// `(sum, runs)` of the final-round mean contribution per mode.
    pub final_contribution: BTreeMap<String, (f64, usize)>,
}

impl ReportSummary {
    pub fn mean_final_contribution(&self) -> impl Iterator<Item = (&str, f64)> {
        self.final_contribution
            .iter()
            .map(|(mode, (sum, runs))| (mode.as_str(), sum / *runs as f64))
    }
}

pub fn load_run_dirs(experiment_results_dir: &Path) -> Result<Vec<PathBuf>> {
    if !experiment_results_dir.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(experiment_results_dir)
        .with_context(|| format!("read {}", experiment_results_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub fn aggregate(experiment_results_dir: &Path) -> Result<(ReportSummary, Vec<String>)> {
    let mut summary = ReportSummary::default();
    let mut warnings = Vec::new();

    for run_dir in load_run_dirs(experiment_results_dir)? {
        let meta_path = run_dir.join("meta.json");
        let checks_path = run_dir.join("checks.json");

        let meta: RunMeta = match fs::read_to_string(&meta_path)
            .with_context(|| format!("read {}", meta_path.display()))
            .and_then(|contents| serde_json::from_str(&contents).context("parse meta"))
        {
            Ok(meta) => meta,
            Err(err) => {
                warnings.push(format!(
                    "skip {}: meta.json invalid ({err})",
                    run_dir.display()
                ));
                continue;
            }
        };

        // Errored runs never ran their checks.
        let judgment: Option<Judgment> = if meta.outcome == Some(Outcome::Error) {
            None
        } else {
            match fs::read_to_string(&checks_path)
                .with_context(|| format!("read {}", checks_path.display()))
                .and_then(|contents| serde_json::from_str(&contents).context("parse checks"))
            {
                Ok(checks) => Some(checks),
                Err(err) => {
                    warnings.push(format!(
                        "skip {}: checks.json invalid ({err})",
                        run_dir.display()
                    ));
                    continue;
                }
            }
        };

        summary.runs += 1;
        match meta.outcome {
            Some(Outcome::Pass) => summary.pass += 1,
            Some(Outcome::Fail) => summary.fail += 1,
            Some(Outcome::Error) | None => summary.error += 1,
        }

        summary.avg_duration_secs = Some(match summary.avg_duration_secs {
            None => meta.duration_secs,
            Some(avg) => {
                let total = avg * (summary.runs as f64 - 1.0) + meta.duration_secs;
                total / summary.runs as f64
            }
        });

        if let Some(judgment) = &judgment {
            update_check_pass_rates(&mut summary.check_pass_rates, judgment);
        }
        for (mode, value) in &meta.final_mean_contribution {
            let entry = summary
                .final_contribution
                .entry(mode.clone())
                .or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    Ok((summary, warnings))
}

fn update_check_pass_rates(stats: &mut BTreeMap<String, (usize, usize)>, judgment: &Judgment) {
    for check in &judgment.checks {
        let entry = stats.entry(check.label()).or_insert((0, 0));
        if check.passed() {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::CheckOutcome;
    use tempfile::tempdir;

    fn write_meta(path: &Path, outcome: Outcome, duration: f64, final_none: f64) {
        let meta = RunMeta {
            experiment_id: "classroom".to_string(),
            run_name: "run".to_string(),
            experiment_hash: "hash".to_string(),
            seed: 1,
            modes: vec![pgg::core::types::Governance::None],
            outcome: Some(outcome),
            start_time: "now".to_string(),
            end_time: "later".to_string(),
            duration_secs: duration,
            final_mean_contribution: BTreeMap::from([("none".to_string(), final_none)]),
            errors: Vec::new(),
        };
        let contents = serde_json::to_string_pretty(&meta).expect("meta json");
        fs::write(path, format!("{contents}\n")).expect("write meta");
    }

    fn write_checks(path: &Path, passed: bool) {
        let judgment = Judgment {
            checks: vec![CheckOutcome::IdenticalCohorts {
                passed,
                modes: 3,
                mismatched: Vec::new(),
            }],
        };
        let contents = serde_json::to_string_pretty(&judgment).expect("checks json");
        fs::write(path, format!("{contents}\n")).expect("write checks");
    }

    #[test]
    fn aggregates_runs() {
        let temp = tempdir().expect("tempdir");
        let run1 = temp.path().join("run1");
        let run2 = temp.path().join("run2");
        fs::create_dir_all(&run1).expect("run1");
        fs::create_dir_all(&run2).expect("run2");

        write_meta(&run1.join("meta.json"), Outcome::Pass, 0.5, 4.0);
        write_checks(&run1.join("checks.json"), true);

        write_meta(&run2.join("meta.json"), Outcome::Fail, 1.5, 6.0);
        write_checks(&run2.join("checks.json"), false);

        let (summary, warnings) = aggregate(temp.path()).expect("aggregate");
        assert!(warnings.is_empty());
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.pass, 1);
        assert_eq!(summary.fail, 1);
        assert_eq!(summary.avg_duration_secs, Some(1.0));

        let key = "identical_cohorts".to_string();
        assert_eq!(summary.check_pass_rates.get(&key), Some(&(1, 2)));
        let finals: Vec<_> = summary.mean_final_contribution().collect();
        assert_eq!(finals, vec![("none", 5.0)]);
    }

    #[test]
    fn unreadable_runs_become_warnings() {
        let temp = tempdir().expect("tempdir");
        let good = temp.path().join("good");
        let broken = temp.path().join("broken");
        fs::create_dir_all(&good).expect("good");
        fs::create_dir_all(&broken).expect("broken");

        write_meta(&good.join("meta.json"), Outcome::Pass, 1.0, 5.0);
        write_checks(&good.join("checks.json"), true);
        fs::write(broken.join("meta.json"), "{not json").expect("broken meta");

        let (summary, warnings) = aggregate(temp.path()).expect("aggregate");
        assert_eq!(summary.runs, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("meta.json invalid"));
    }

    #[test]
    fn errored_runs_count_without_checks() {
        let temp = tempdir().expect("tempdir");
        let run = temp.path().join("run");
        fs::create_dir_all(&run).expect("run");
        write_meta(&run.join("meta.json"), Outcome::Error, 0.1, 0.0);

        let (summary, warnings) = aggregate(temp.path()).expect("aggregate");
        assert!(warnings.is_empty());
        assert_eq!(summary.error, 1);
        assert!(summary.check_pass_rates.is_empty());
    }

    #[test]
    fn missing_results_dir_is_empty_report() {
        let temp = tempdir().expect("tempdir");
        let (summary, warnings) = aggregate(&temp.path().join("none")).expect("aggregate");
        assert_eq!(summary.runs, 0);
        assert!(warnings.is_empty());
    }
}
