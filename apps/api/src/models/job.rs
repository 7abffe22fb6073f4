use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// `applied_for` value marking a job the user dismissed as not relevant.
pub const NOT_RELEVANT_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("invalid sentinel date"),
};

/// What the user has done with a job, decoded from `finn_job_user_status.applied_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Untouched,
    Applied,
    NotRelevant,
}

impl JobStatus {
    pub fn from_applied_for(applied_for: Option<NaiveDate>) -> Self {
        match applied_for {
            None => JobStatus::Untouched,
            Some(date) if date == NOT_RELEVANT_DATE => JobStatus::NotRelevant,
            Some(_) => JobStatus::Applied,
        }
    }
}

/// A scored job joined with the user's status row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MatchedJob {
    pub finn_id: i64,
    pub matchscore: Option<i32>,
    pub frist: Option<NaiveDate>,
    pub frist_type: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub job_text_html: Option<String>,
    pub job_url: Option<String>,
    pub contact1_name: Option<String>,
    pub contact1_title: Option<String>,
    pub contact1_phone: Option<String>,
    pub contact2_name: Option<String>,
    pub contact2_title: Option<String>,
    pub contact2_phone: Option<String>,
    pub applied_for: Option<NaiveDate>,
    pub yes_1: Option<String>,
    pub yes_2: Option<String>,
    pub yes_3: Option<String>,
    pub yes_4: Option<String>,
    pub yes_5: Option<String>,
    pub no_1: Option<String>,
    pub no_2: Option<String>,
    pub no_3: Option<String>,
    pub no_4: Option<String>,
    pub no_5: Option<String>,
    pub recommend_apply: Option<String>,
}

impl MatchedJob {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_applied_for(self.applied_for)
    }
}
