use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use posner_experiment::{
    ExperimentConfig, ExperimentRunner, HeadlessDisplay, PosnerCueingTask, ResultsSummary,
    SimulatedParticipant, save_results,
};
use posner_timing::{HighPrecisionTimer, SimulatedTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

/// Command line options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub config_path: Option<PathBuf>,
    pub realtime: bool,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
}

impl Options {
    pub const USAGE: &'static str =
        "usage: posner-cueing [CONFIG.json] [--realtime] [--seed N] [--out RESULTS.json]";

    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--realtime" => options.realtime = true,
                "--seed" => {
                    let value = args.next().context("--seed needs a value")?;
                    options.seed = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid seed '{}'", value))?,
                    );
                }
                "--out" => {
                    options.output = Some(args.next().context("--out needs a path")?.into());
                }
                flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, Self::USAGE),
                path => {
                    if options.config_path.is_some() {
                        bail!("more than one configuration file given\n{}", Self::USAGE);
                    }
                    options.config_path = Some(path.into());
                }
            }
        }
        Ok(options)
    }
}

/// Headless session: a simulated participant answers every prompt and the
/// display only keeps frames in memory.
pub struct App {
    config: ExperimentConfig,
    realtime: bool,
}

impl App {
    pub fn new(options: Options) -> Result<Self> {
        let mut config = match &options.config_path {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if options.seed.is_some() {
            config.seed = options.seed;
        }
        if let Some(output) = options.output {
            config.results_path = output;
        }
        config.validate().context("invalid configuration")?;

        Ok(Self {
            config,
            realtime: options.realtime,
        })
    }

    pub fn run(mut self) -> Result<()> {
        info!("=== POSNER CUEING TASK ===");
        info!(os = std::env::consts::OS, arch = std::env::consts::ARCH, "platform");

        let seed = *self.config.seed.get_or_insert_with(rand::random);
        info!(
            seed,
            realtime = self.realtime,
            refresh_ms = self.config.refresh_ms,
            trials_per_block = self.config.trials_per_block,
            "starting session"
        );

        if self.realtime {
            self.run_with(HighPrecisionTimer::new(), seed)
        } else {
            let clock = SimulatedTimer::default();
            self.run_with(clock.clone(), seed)?;
            info!(simulated_s = clock.peek() as f64 / 1e9, "simulated session length");
            Ok(())
        }
    }

    fn run_with<T: Timer>(&self, timer: T, seed: u64) -> Result<()> {
        let participant = SimulatedParticipant::new(StdRng::seed_from_u64(seed.wrapping_add(1)));
        let task = PosnerCueingTask::new(
            self.config.clone(),
            timer,
            participant,
            HeadlessDisplay::new(),
            StdRng::seed_from_u64(seed),
        );
        let mut runner = ExperimentRunner::new(task);

        match runner.run() {
            Ok(_) => {}
            Err(e) if e.is_quit() => warn!("session ended early by quit request"),
            Err(e) => return Err(e).context("session failed"),
        }

        info!(
            frames_presented = runner.experiment.display().frames_presented,
            "display closed"
        );
        let records = runner.results();
        save_results(records, &self.config.results_path).with_context(|| {
            format!(
                "failed to write results to {}",
                self.config.results_path.display()
            )
        })?;
        ResultsSummary::from_records(records).log();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_options() {
        let o = Options::parse(args(&["cfg.json", "--realtime", "--seed", "12", "--out", "r.json"]))
            .unwrap();
        assert_eq!(
            o,
            Options {
                config_path: Some("cfg.json".into()),
                realtime: true,
                seed: Some(12),
                output: Some("r.json".into()),
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Options::parse(args(&["--seed"])).is_err());
        assert!(Options::parse(args(&["--seed", "abc"])).is_err());
        assert!(Options::parse(args(&["--verbose"])).is_err());
        assert!(Options::parse(args(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn headless_session_writes_results() {
        let out = std::env::temp_dir().join(format!("posner_app_{}.json", std::process::id()));
        let mut app = App::new(Options {
            seed: Some(4),
            output: Some(out.clone()),
            ..Options::default()
        })
        .unwrap();
        app.config.trials_per_block = 2;
        app.run().unwrap();

        let records = posner_experiment::read_results(std::fs::File::open(&out).unwrap()).unwrap();
        std::fs::remove_file(&out).unwrap();
        assert_eq!(records.len(), 6);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = App::new(Options {
            config_path: Some("/no/such/config.json".into()),
            ..Options::default()
        })
        .err()
        .unwrap();
        assert!(format!("{:#}", err).contains("/no/such/config.json"));
    }
}
