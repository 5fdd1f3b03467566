use crate::error::{CommitteeError, CommitteeResult};
use crate::resolution::ResolutionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decides a resolution's status from the committee and the votes cast so far.
///
/// Invoked after every recorded vote. Returning [`ResolutionStatus::Pending`] leaves
/// the resolution open.
pub trait TallyPolicy: Send + Sync {
    fn decide(&self, members: &[String], positive: &[String], negative: &[String]) -> ResolutionStatus;

    /// Short human readable name of the rule
    fn describe(&self) -> String;
}

/// Simple majority of the committee size.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityPolicy;

impl TallyPolicy for MajorityPolicy {
    fn decide(&self, members: &[String], positive: &[String], negative: &[String]) -> ResolutionStatus {
        let size = members.len();
        if size == 0 {
            return ResolutionStatus::Pending;
        }
        // |votes| > N/2 without going through floating point
        if positive.len() * 2 > size {
            ResolutionStatus::Approved
        } else if negative.len() * 2 > size {
            ResolutionStatus::Rejected
        } else {
            ResolutionStatus::Pending
        }
    }

    fn describe(&self) -> String {
        "majority".to_string()
    }
}

/// Approve once at least `percent` of the committee voted in favour.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    percent: u8,
}

impl ThresholdPolicy {
    pub fn new(percent: u8) -> CommitteeResult<Self> {
        if percent == 0 || percent > 100 {
            return Err(CommitteeError::Validation(format!(
                "threshold must be between 1 and 100 percent, got {}",
                percent
            )));
        }
        Ok(Self { percent })
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    fn reached(&self, votes: usize, size: usize) -> bool {
        votes * 100 >= self.percent as usize * size
    }
}

impl TallyPolicy for ThresholdPolicy {
    fn decide(&self, members: &[String], positive: &[String], negative: &[String]) -> ResolutionStatus {
        let size = members.len();
        if size == 0 {
            return ResolutionStatus::Pending;
        }
        if self.reached(positive.len(), size) {
            return ResolutionStatus::Approved;
        }
        // Even if every remaining member approves the threshold is out of reach
        let best_case = size.saturating_sub(negative.len());
        if !self.reached(best_case, size) {
            return ResolutionStatus::Rejected;
        }
        ResolutionStatus::Pending
    }

    fn describe(&self) -> String {
        format!("threshold ({}%)", self.percent)
    }
}

/// Every member must approve; a single negative vote rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnanimousPolicy;

impl TallyPolicy for UnanimousPolicy {
    fn decide(&self, members: &[String], positive: &[String], negative: &[String]) -> ResolutionStatus {
        if !negative.is_empty() {
            return ResolutionStatus::Rejected;
        }
        let approvals = members.iter().filter(|m| positive.contains(m)).count();
        if !members.is_empty() && approvals == members.len() {
            ResolutionStatus::Approved
        } else {
            ResolutionStatus::Pending
        }
    }

    fn describe(&self) -> String {
        "unanimous".to_string()
    }
}

/// Serializable selection of a tally policy, as written in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TallyRule {
    #[default]
    Majority,
    Unanimous,
    /// Percentage of the committee required to approve
    Threshold(u8),
}

impl TallyRule {
    pub fn into_policy(self) -> CommitteeResult<Box<dyn TallyPolicy>> {
        Ok(match self {
            TallyRule::Majority => Box::new(MajorityPolicy),
            TallyRule::Unanimous => Box::new(UnanimousPolicy),
            TallyRule::Threshold(percent) => Box::new(ThresholdPolicy::new(percent)?),
        })
    }
}

impl fmt::Display for TallyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TallyRule::Majority => write!(f, "majority"),
            TallyRule::Unanimous => write!(f, "unanimous"),
            TallyRule::Threshold(percent) => write!(f, "threshold={}", percent),
        }
    }
}
