// Run model
// A run is one executed unit of work; the graph only needs its identity and label

use crate::error::ServiceError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// One completed or executing unit of work.
///
/// The graph never mutates a run. Vertices are deduplicated by [`Run::id`],
/// and the `Display` output is the label handed to the ordering oracle, so
/// it should be unique within one pipeline.
pub trait Run: Clone + fmt::Display + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// A numbered build of a named job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildRun {
    pub job: String,
    pub number: u32,
}

impl BuildRun {
    pub fn new(job: impl Into<String>, number: u32) -> Self {
        Self {
            job: job.into(),
            number,
        }
    }
}

impl fmt::Display for BuildRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.job, self.number)
    }
}

impl Run for BuildRun {
    type Id = (String, u32);

    fn id(&self) -> Self::Id {
        (self.job.clone(), self.number)
    }
}

impl FromStr for BuildRun {
    type Err = ServiceError;

    /// Parse `job#number`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (job, number) = s
            .trim()
            .rsplit_once('#')
            .ok_or_else(|| ServiceError::InvalidRunId(s.to_string()))?;
        let job = job.trim();
        if job.is_empty() {
            return Err(ServiceError::InvalidRunId(s.to_string()));
        }
        let number = number
            .trim()
            .parse()
            .map_err(|_| ServiceError::InvalidRunId(s.to_string()))?;
        Ok(Self::new(job, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_id() {
        let run: BuildRun = "build#12".parse().unwrap();
        assert_eq!(run, BuildRun::new("build", 12));

        let run: BuildRun = "deploy-prod # 3".parse().unwrap();
        assert_eq!(run.job, "deploy-prod");
        assert_eq!(run.number, 3);
    }

    #[test]
    fn test_parse_job_name_containing_hash() {
        let run: BuildRun = "c#-lib#4".parse().unwrap();
        assert_eq!(run.job, "c#-lib");
        assert_eq!(run.number, 4);
    }

    #[test]
    fn test_parse_invalid_run_id() {
        assert!("build".parse::<BuildRun>().is_err());
        assert!("#3".parse::<BuildRun>().is_err());
        assert!("build#".parse::<BuildRun>().is_err());
        assert!("build#-1".parse::<BuildRun>().is_err());
    }

    #[test]
    fn test_display_is_label() {
        assert_eq!(BuildRun::new("test", 7).to_string(), "test #7");
    }

    #[test]
    fn test_identity_ignores_nothing_but_job_and_number() {
        assert_eq!(BuildRun::new("a", 1).id(), BuildRun::new("a", 1).id());
        assert_ne!(BuildRun::new("a", 1).id(), BuildRun::new("a", 2).id());
    }
}
