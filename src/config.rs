// Programmatic configuration surface. No file format is parsed here --
// that belongs to an external CLI -- this is the struct a host embeds
// against directly.

use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Provenance {
    #[default]
    Off,
    Naive,
    SubtreeHeights,
}

impl Provenance {
    pub fn is_enabled(self) -> bool {
        !matches!(self, Provenance::Off)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Profile {
    #[default]
    Off,
    Path(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub provenance: Provenance,
    pub profile: Profile,
    /// Maximum worker count for `Statement::Parallel` regions; mirrors
    /// `rayon`'s own thread-pool sizing knob.
    pub jobs: usize,
    pub fact_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub debug_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provenance: Provenance::default(),
            profile: Profile::default(),
            jobs: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            fact_dir: None,
            output_dir: None,
            debug_report: false,
        }
    }
}

impl Config {
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn profiling_enabled(&self) -> bool {
        !matches!(self.profile, Profile::Off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_provenance_off() {
        let config = Config::default();
        assert!(!config.provenance.is_enabled());
        assert!(!config.profiling_enabled());
    }

    #[test]
    fn with_jobs_floors_at_one() {
        let config = Config::default().with_jobs(0);
        assert_eq!(config.jobs, 1);
    }
}
