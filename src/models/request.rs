//! Request parameters and their normalization

use std::fmt;

use serde::{Deserialize, Serialize};

/// Age group used when the caller supplies none
pub const DEFAULT_AGE_GROUP: &str = "office_worker";

/// Age group tag that switches prompts and fallback to the job-hunting persona
pub const JOB_HUNTING_AGE_GROUP: &str = "job_hunting";

/// Where the user currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    #[default]
    Workplace,
    Home,
    Outside,
    JobHunting,
}

impl Situation {
    pub const ALL: [Situation; 4] = [
        Situation::Workplace,
        Situation::Home,
        Situation::Outside,
        Situation::JobHunting,
    ];

    /// Parse a wire value, returning `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "workplace" => Some(Situation::Workplace),
            "home" => Some(Situation::Home),
            "outside" => Some(Situation::Outside),
            "job_hunting" => Some(Situation::JobHunting),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Situation::Workplace => "workplace",
            Situation::Home => "home",
            Situation::Outside => "outside",
            Situation::JobHunting => "job_hunting",
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested activity length. Serialized as the number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ActivityDuration {
    #[default]
    Five,
    Fifteen,
    Thirty,
}

impl ActivityDuration {
    pub const ALL: [ActivityDuration; 3] = [
        ActivityDuration::Five,
        ActivityDuration::Fifteen,
        ActivityDuration::Thirty,
    ];

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            5 => Some(ActivityDuration::Five),
            15 => Some(ActivityDuration::Fifteen),
            30 => Some(ActivityDuration::Thirty),
            _ => None,
        }
    }

    /// Parse a wire value such as `"15"`; whitespace is tolerated.
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<u32>().ok().and_then(Self::from_minutes)
    }

    pub fn minutes(&self) -> u32 {
        match self {
            ActivityDuration::Five => 5,
            ActivityDuration::Fifteen => 15,
            ActivityDuration::Thirty => 30,
        }
    }
}

impl From<ActivityDuration> for u32 {
    fn from(duration: ActivityDuration) -> Self {
        duration.minutes()
    }
}

impl TryFrom<u32> for ActivityDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| format!("unsupported duration: {minutes}"))
    }
}

impl fmt::Display for ActivityDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

/// Parameters exactly as the hosting layer received them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    pub situation: Option<String>,
    pub duration: Option<String>,
    pub age_group: Option<String>,
}

impl RawRequest {
    pub fn new(situation: &str, duration: &str, age_group: &str) -> Self {
        Self {
            situation: Some(situation.to_string()),
            duration: Some(duration.to_string()),
            age_group: Some(age_group.to_string()),
        }
    }
}

/// Normalized request parameters the pipeline works with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    pub situation: Situation,
    pub duration: ActivityDuration,
    pub age_group: String,
}

impl RequestParameters {
    pub fn new(
        situation: Situation,
        duration: ActivityDuration,
        age_group: impl Into<String>,
    ) -> Self {
        Self {
            situation,
            duration,
            age_group: age_group.into(),
        }
    }

    /// Normalize raw input: unknown situation becomes workplace, unknown
    /// duration becomes 5 minutes, the age group passes through unvalidated.
    pub fn normalize(raw: &RawRequest) -> Self {
        let situation = raw
            .situation
            .as_deref()
            .and_then(Situation::parse)
            .unwrap_or_default();
        let duration = raw
            .duration
            .as_deref()
            .and_then(ActivityDuration::parse)
            .unwrap_or_default();
        let age_group = match raw.age_group.as_deref() {
            Some(group) if !group.trim().is_empty() => group.to_string(),
            _ => DEFAULT_AGE_GROUP.to_string(),
        };

        Self {
            situation,
            duration,
            age_group,
        }
    }

    /// Parameters served when everything else has gone wrong
    pub fn baseline() -> Self {
        Self::new(
            Situation::Workplace,
            ActivityDuration::Five,
            DEFAULT_AGE_GROUP,
        )
    }

    /// Job-hunting persona applies when either the situation or the age group says so.
    pub fn is_job_hunting(&self) -> bool {
        self.situation == Situation::JobHunting || self.age_group == JOB_HUNTING_AGE_GROUP
    }
}
